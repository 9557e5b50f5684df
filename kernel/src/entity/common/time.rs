use std::marker::PhantomData;

use time::{Duration, OffsetDateTime};

/// Current UTC time cut down to microseconds, the precision PostgreSQL keeps.
pub fn stored_now() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    now - Duration::nanoseconds(i64::from(now.nanosecond() % 1_000))
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CreatedAt<T>(OffsetDateTime, PhantomData<T>);

impl<T> CreatedAt<T> {
    pub fn new(time: impl Into<OffsetDateTime>) -> Self {
        Self(time.into(), PhantomData)
    }
}

impl<T> AsRef<OffsetDateTime> for CreatedAt<T> {
    fn as_ref(&self) -> &OffsetDateTime {
        &self.0
    }
}

impl<T> From<CreatedAt<T>> for OffsetDateTime {
    fn from(value: CreatedAt<T>) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UpdatedAt<T>(OffsetDateTime, PhantomData<T>);

impl<T> UpdatedAt<T> {
    pub fn new(time: impl Into<OffsetDateTime>) -> Self {
        Self(time.into(), PhantomData)
    }
}

impl<T> AsRef<OffsetDateTime> for UpdatedAt<T> {
    fn as_ref(&self) -> &OffsetDateTime {
        &self.0
    }
}

impl<T> From<UpdatedAt<T>> for OffsetDateTime {
    fn from(value: UpdatedAt<T>) -> Self {
        value.0
    }
}
