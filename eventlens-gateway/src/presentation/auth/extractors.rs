//! Request extractors for gated routes

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::Response,
};
use std::convert::Infallible;

use eventlens_core::application::ApplicationError;
use eventlens_core::domain::auth::{AuthError, Credential};

use crate::presentation::middleware::{application_error_to_response, client_ip};

/// Credential attached by the credential gate.
///
/// Only available on routes behind the gate; elsewhere extraction fails
/// closed with `Unauthenticated`.
#[derive(Debug, Clone)]
pub struct AuthenticatedCredential(pub Credential);

impl<S> FromRequestParts<S> for AuthenticatedCredential
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedCredential>()
            .cloned()
            .ok_or_else(|| {
                application_error_to_response(ApplicationError::from(
                    AuthError::MissingCredential,
                ))
            })
    }
}

/// Originating client address, when one can be determined
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub Option<String>);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientIp(client_ip(parts)))
    }
}
