//! Caller identity extractor.
//!
//! Authentication happens upstream; the gateway forwards the authenticated
//! user as `x-user-id` and `x-user-role` headers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use vetting_types::{Role, UserId};
use vetting_verification::Actor;

use crate::error::RpcError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// The authenticated caller of the current request.
#[derive(Clone, Debug)]
pub struct Caller(pub Actor);

impl Caller {
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, RpcError> {
        let id = UserId::parse(header(headers, USER_ID_HEADER)?)
            .map_err(|e| RpcError::Unauthenticated(e.to_string()))?;
        let role = header(headers, USER_ROLE_HEADER)?
            .parse::<Role>()
            .map_err(|e| RpcError::Unauthenticated(e.to_string()))?;
        Ok(Caller(Actor::new(id, role)))
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, RpcError> {
    headers
        .get(name)
        .ok_or_else(|| RpcError::Unauthenticated(format!("missing {name} header")))?
        .to_str()
        .map_err(|_| RpcError::Unauthenticated(format!("{name} is not valid text")))
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = RpcError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Caller::from_headers(&parts.headers)
    }
}
