//! Credential infrastructure

pub mod credential_repository;
pub mod token_generator;

pub use credential_repository::SqlxCredentialRepository;
pub use token_generator::TokenGenerator;
