use time::Date;
use vodca::{AsRefln, Fromln};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Fromln, AsRefln)]
pub struct BookPageCount(i32);

impl BookPageCount {
    pub fn new(count: impl Into<i32>) -> Self {
        Self(count.into())
    }
}

#[derive(Debug, Clone, Default, Eq, PartialEq, Fromln, AsRefln)]
pub struct BookPublisher(String);

impl BookPublisher {
    pub fn new(publisher: impl Into<String>) -> Self {
        Self(publisher.into())
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Fromln, AsRefln)]
pub struct BookPublicationDate(Date);

impl BookPublicationDate {
    pub fn new(date: impl Into<Date>) -> Self {
        Self(date.into())
    }
}

#[derive(Debug, Clone, Default, Eq, PartialEq, Fromln, AsRefln)]
pub struct BookDescription(String);

impl BookDescription {
    pub fn new(description: impl Into<String>) -> Self {
        Self(description.into())
    }
}
