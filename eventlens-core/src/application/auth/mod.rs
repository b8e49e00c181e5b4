//! Credential lifecycle and validation use cases

pub mod use_cases;

pub use use_cases::{
    IssueCredentialUseCase, ListCredentialsUseCase, LookupCredentialUseCase,
    RevokeCredentialUseCase, RotateCredentialUseCase, ValidateCredentialUseCase,
};
