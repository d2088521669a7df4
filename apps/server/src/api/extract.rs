//! Request extractors.

use crate::{models::UserId, Error};
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::{request::Parts, HeaderName},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

/// Wire name of the caller id header. Header names are case-insensitive;
/// clients send `userId`.
pub const USER_ID_HEADER_NAME: HeaderName = HeaderName::from_static("userid");

/// The caller named by the required `userId` header.
#[derive(Debug, Clone)]
pub struct CallerId(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for CallerId
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(&USER_ID_HEADER_NAME)
            .and_then(|v| v.to_str().ok());
        UserId::parse(raw).map(Self)
    }
}

/// JSON body that has been deserialized and passed its `validator` rules.
///
/// Malformed JSON becomes a `body` violation; rule failures keep their field
/// paths.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Self(value))
    }
}
