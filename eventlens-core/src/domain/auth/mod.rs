//! Credential domain

pub mod entities;
pub mod errors;
pub mod repositories;
pub mod value_objects;

pub use entities::{Credential, IssuedCredential};
pub use errors::AuthError;
pub use repositories::ICredentialRepository;
pub use value_objects::{AccessToken, CredentialId, TokenHash};
