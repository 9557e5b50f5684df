use application::service::ResolveActorService;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::RequestPartsExt;
use axum_extra::headers::{self, Header, HeaderName, HeaderValue};
use axum_extra::TypedHeader;
use error_stack::Report;
use kernel::prelude::policy::Capability;
use kernel::KernelError;
use uuid::Uuid;

use crate::error::ErrorStatus;
use crate::handler::AppModule;

static X_USER_ID: HeaderName = HeaderName::from_static("x-user-id");

/// Caller id forwarded by the authenticating gateway.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct XUserId(pub Uuid);

impl Header for XUserId {
    fn name() -> &'static HeaderName {
        &X_USER_ID
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, headers::Error>
    where
        I: Iterator<Item = &'i HeaderValue>,
    {
        let value = values.next().ok_or_else(headers::Error::invalid)?;
        if values.next().is_some() {
            return Err(headers::Error::invalid());
        }
        value
            .to_str()
            .ok()
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
            .map(XUserId)
            .ok_or_else(headers::Error::invalid)
    }

    fn encode<E: Extend<HeaderValue>>(&self, values: &mut E) {
        let value = self.0.hyphenated().to_string();
        if let Ok(value) = HeaderValue::from_str(&value) {
            values.extend(std::iter::once(value));
        }
    }
}

/// Capability of whoever sent the request. A missing header is an anonymous caller.
#[derive(Debug, Clone)]
pub struct Actor(pub Capability);

#[async_trait]
impl FromRequestParts<AppModule> for Actor {
    type Rejection = ErrorStatus;

    async fn from_request_parts(
        parts: &mut Parts,
        module: &AppModule,
    ) -> Result<Self, Self::Rejection> {
        let id = match parts.extract::<TypedHeader<XUserId>>().await {
            Ok(TypedHeader(XUserId(id))) => Some(id),
            Err(rejection) if rejection.is_missing() => None,
            Err(rejection) => {
                return Err(ErrorStatus::from(
                    Report::new(KernelError::Unauthorized).attach_printable(rejection.to_string()),
                ))
            }
        };
        let capability = module.pgpool().resolve_actor(id).await?;
        Ok(Actor(capability))
    }
}
