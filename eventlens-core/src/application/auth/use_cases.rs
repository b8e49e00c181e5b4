//! Credential use cases

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::application::errors::ApplicationError;
use crate::domain::auth::{AuthError, Credential, ICredentialRepository, IssuedCredential};
use crate::domain::errors::StoreError;
use crate::infrastructure::auth::TokenGenerator;
use crate::infrastructure::resilience::with_timeout;

const DEPENDENCY: &str = "credential_store";

/// Attempts before a token hash collision is reported as a failure
const MAX_ISSUE_ATTEMPTS: usize = 3;

fn credential_not_found() -> ApplicationError {
    ApplicationError::NotFound {
        resource: "Credential",
    }
}

/// Expiry instant for a credential issued at `now`
fn expires_after(
    now: DateTime<Utc>,
    expiry: chrono::Duration,
) -> Result<DateTime<Utc>, ApplicationError> {
    now.checked_add_signed(expiry)
        .ok_or_else(|| ApplicationError::validation("credential expiry is out of range"))
}

fn required(field: &str, value: &str) -> Result<String, ApplicationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApplicationError::validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// Issue a new credential for an application
pub struct IssueCredentialUseCase {
    repository: Arc<dyn ICredentialRepository>,
    generator: Arc<TokenGenerator>,
    expiry: chrono::Duration,
    op_timeout: Duration,
}

impl IssueCredentialUseCase {
    pub fn new(
        repository: Arc<dyn ICredentialRepository>,
        generator: Arc<TokenGenerator>,
        expiry: chrono::Duration,
        op_timeout: Duration,
    ) -> Self {
        Self {
            repository,
            generator,
            expiry,
            op_timeout,
        }
    }

    #[instrument(skip(self, owner_email))]
    pub async fn execute(
        &self,
        app_name: &str,
        owner_email: &str,
    ) -> Result<IssuedCredential, ApplicationError> {
        let app_name = required("appName", app_name)?;
        let owner_email = required("ownerEmail", owner_email)?;

        for attempt in 1..=MAX_ISSUE_ATTEMPTS {
            let (token, token_hash) = self.generator.generate();
            let now = Utc::now();
            let credential = Credential::new(
                token_hash,
                self.generator.mask_token(token.expose()),
                app_name.clone(),
                owner_email.clone(),
                Some(expires_after(now, self.expiry)?),
                now,
            );

            match with_timeout(self.op_timeout, self.repository.create(&credential)).await {
                Ok(()) => {
                    info!(credential_id = %credential.id, hint = %credential.token_hint, "Issued credential");
                    return Ok(IssuedCredential { credential, token });
                }
                Err(StoreError::Duplicate) if attempt < MAX_ISSUE_ATTEMPTS => {
                    warn!(attempt, "Token hash collision, regenerating");
                }
                Err(e) => return Err(ApplicationError::store(DEPENDENCY, e)),
            }
        }

        Err(ApplicationError::store(DEPENDENCY, StoreError::Duplicate))
    }
}

/// Exact-match retrieval by token
pub struct LookupCredentialUseCase {
    repository: Arc<dyn ICredentialRepository>,
    generator: Arc<TokenGenerator>,
    op_timeout: Duration,
}

impl LookupCredentialUseCase {
    pub fn new(
        repository: Arc<dyn ICredentialRepository>,
        generator: Arc<TokenGenerator>,
        op_timeout: Duration,
    ) -> Self {
        Self {
            repository,
            generator,
            op_timeout,
        }
    }

    /// Surrounding whitespace on `token` is ignored
    #[instrument(skip_all)]
    pub async fn execute(&self, token: &str) -> Result<Credential, ApplicationError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ApplicationError::validation("key is required"));
        }

        let hash = self.generator.hash_token(token);
        with_timeout(self.op_timeout, self.repository.find_by_hash(&hash))
            .await
            .map_err(|e| ApplicationError::store(DEPENDENCY, e))?
            .ok_or_else(credential_not_found)
    }
}

/// Deactivate a credential. Repeating the call is a no-op success.
pub struct RevokeCredentialUseCase {
    repository: Arc<dyn ICredentialRepository>,
    generator: Arc<TokenGenerator>,
    op_timeout: Duration,
}

impl RevokeCredentialUseCase {
    pub fn new(
        repository: Arc<dyn ICredentialRepository>,
        generator: Arc<TokenGenerator>,
        op_timeout: Duration,
    ) -> Self {
        Self {
            repository,
            generator,
            op_timeout,
        }
    }

    #[instrument(skip_all)]
    pub async fn execute(&self, token: &str) -> Result<(), ApplicationError> {
        let hash = self.generator.hash_token(token.trim());
        let matched = with_timeout(self.op_timeout, self.repository.deactivate(&hash))
            .await
            .map_err(|e| ApplicationError::store(DEPENDENCY, e))?;

        if !matched {
            return Err(credential_not_found());
        }
        info!(token_hint = %self.generator.mask_token(token.trim()), "Revoked credential");
        Ok(())
    }
}

/// Replace a credential's token, reactivate it and restart its expiry
pub struct RotateCredentialUseCase {
    repository: Arc<dyn ICredentialRepository>,
    generator: Arc<TokenGenerator>,
    expiry: chrono::Duration,
    op_timeout: Duration,
}

impl RotateCredentialUseCase {
    pub fn new(
        repository: Arc<dyn ICredentialRepository>,
        generator: Arc<TokenGenerator>,
        expiry: chrono::Duration,
        op_timeout: Duration,
    ) -> Self {
        Self {
            repository,
            generator,
            expiry,
            op_timeout,
        }
    }

    #[instrument(skip_all)]
    pub async fn execute(&self, token: &str) -> Result<IssuedCredential, ApplicationError> {
        let current = self.generator.hash_token(token.trim());

        for attempt in 1..=MAX_ISSUE_ATTEMPTS {
            let (replacement, replacement_hash) = self.generator.generate();
            let hint = self.generator.mask_token(replacement.expose());
            let expires_at = expires_after(Utc::now(), self.expiry)?;

            let outcome = with_timeout(
                self.op_timeout,
                self.repository
                    .replace_token(&current, &replacement_hash, &hint, expires_at),
            )
            .await;

            match outcome {
                Ok(Some(credential)) => {
                    info!(credential_id = %credential.id, hint = %credential.token_hint, "Rotated credential");
                    return Ok(IssuedCredential {
                        credential,
                        token: replacement,
                    });
                }
                Ok(None) => return Err(credential_not_found()),
                Err(StoreError::Duplicate) if attempt < MAX_ISSUE_ATTEMPTS => {
                    warn!(attempt, "Token hash collision on rotation, regenerating");
                }
                Err(e) => return Err(ApplicationError::store(DEPENDENCY, e)),
            }
        }

        Err(ApplicationError::store(DEPENDENCY, StoreError::Duplicate))
    }
}

/// All credentials, newest first
pub struct ListCredentialsUseCase {
    repository: Arc<dyn ICredentialRepository>,
    op_timeout: Duration,
}

impl ListCredentialsUseCase {
    pub fn new(repository: Arc<dyn ICredentialRepository>, op_timeout: Duration) -> Self {
        Self {
            repository,
            op_timeout,
        }
    }

    pub async fn execute(&self) -> Result<Vec<Credential>, ApplicationError> {
        with_timeout(self.op_timeout, self.repository.list())
            .await
            .map_err(|e| ApplicationError::store(DEPENDENCY, e))
    }
}

/// Resolve and check a presented token. Reads only; never mutates the credential.
pub struct ValidateCredentialUseCase {
    repository: Arc<dyn ICredentialRepository>,
    generator: Arc<TokenGenerator>,
    op_timeout: Duration,
}

impl ValidateCredentialUseCase {
    pub fn new(
        repository: Arc<dyn ICredentialRepository>,
        generator: Arc<TokenGenerator>,
        op_timeout: Duration,
    ) -> Self {
        Self {
            repository,
            generator,
            op_timeout,
        }
    }

    /// `arrived_at` is the request arrival time; expiry is judged against it,
    /// not against the time the lookup completes.
    #[instrument(skip_all)]
    pub async fn execute(
        &self,
        presented: Option<&str>,
        arrived_at: DateTime<Utc>,
    ) -> Result<Credential, ApplicationError> {
        let token = presented
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingCredential)?;

        let hash = self.generator.hash_token(token);
        let credential = with_timeout(self.op_timeout, self.repository.find_by_hash(&hash))
            .await
            .map_err(|e| ApplicationError::store(DEPENDENCY, e))?
            .ok_or(AuthError::InvalidCredential)?;

        credential.check_usable(arrived_at)?;
        Ok(credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ErrorKind;
    use crate::testing::{InMemoryCredentialRepository, StalledCredentialRepository};

    const OP: Duration = Duration::from_secs(1);

    struct Fixture {
        repository: Arc<InMemoryCredentialRepository>,
        issue: IssueCredentialUseCase,
        lookup: LookupCredentialUseCase,
        revoke: RevokeCredentialUseCase,
        rotate: RotateCredentialUseCase,
        list: ListCredentialsUseCase,
        validate: ValidateCredentialUseCase,
    }

    fn fixture() -> Fixture {
        let repository = Arc::new(InMemoryCredentialRepository::new());
        let repo: Arc<dyn ICredentialRepository> = repository.clone();
        let generator = Arc::new(TokenGenerator::new());
        let expiry = chrono::Duration::days(30);

        Fixture {
            issue: IssueCredentialUseCase::new(repo.clone(), generator.clone(), expiry, OP),
            lookup: LookupCredentialUseCase::new(repo.clone(), generator.clone(), OP),
            revoke: RevokeCredentialUseCase::new(repo.clone(), generator.clone(), OP),
            rotate: RotateCredentialUseCase::new(repo.clone(), generator.clone(), expiry, OP),
            list: ListCredentialsUseCase::new(repo.clone(), OP),
            validate: ValidateCredentialUseCase::new(repo, generator, OP),
            repository,
        }
    }

    #[tokio::test]
    async fn test_issue_persists_hash_not_token() {
        let f = fixture();
        let issued = f.issue.execute("Acme", "a@acme.com").await.unwrap();

        let token = issued.token.expose();
        assert!(token.starts_with("evl_"));
        assert_ne!(issued.credential.token_hash.as_str(), token);
        assert!(issued.credential.is_active);

        let expires_in = issued.credential.expires_at.unwrap() - issued.credential.created_at;
        assert_eq!(expires_in, chrono::Duration::days(30));

        let stored = f.repository.list().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].app_name, "Acme");
    }

    #[tokio::test]
    async fn test_out_of_range_expiry_is_an_error_not_a_panic() {
        let repository = Arc::new(InMemoryCredentialRepository::new());
        let repo: Arc<dyn ICredentialRepository> = repository.clone();
        let generator = Arc::new(TokenGenerator::new());
        let expiry = chrono::Duration::days(100_000_000);

        let issue = IssueCredentialUseCase::new(repo.clone(), generator.clone(), expiry, OP);
        let err = issue.execute("Acme", "a@acme.com").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
        assert!(repository.list().await.unwrap().is_empty());

        let issued = IssueCredentialUseCase::new(
            repo.clone(),
            generator.clone(),
            chrono::Duration::days(30),
            OP,
        )
        .execute("Acme", "a@acme.com")
        .await
        .unwrap();
        let rotate = RotateCredentialUseCase::new(repo, generator, expiry, OP);
        let err = rotate.execute(issued.token.expose()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
    }

    #[tokio::test]
    async fn test_issue_rejects_blank_inputs() {
        let f = fixture();
        let err = f.issue.execute("  ", "a@acme.com").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
        let err = f.issue.execute("Acme", "").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
        assert!(f.repository.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lookup_trims_whitespace() {
        let f = fixture();
        let issued = f.issue.execute("Acme", "a@acme.com").await.unwrap();
        let padded = format!("  {}\n", issued.token.expose());

        let found = f.lookup.execute(&padded).await.unwrap();
        assert_eq!(found.id, issued.credential.id);

        let err = f.lookup.execute("evl_nope").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent_and_gate_reports_revoked() {
        let f = fixture();
        let issued = f.issue.execute("Acme", "a@acme.com").await.unwrap();
        let token = issued.token.expose();

        f.revoke.execute(token).await.unwrap();
        let after_first = f.lookup.execute(token).await.unwrap();
        f.revoke.execute(token).await.unwrap();
        let after_second = f.lookup.execute(token).await.unwrap();
        assert_eq!(after_first, after_second);

        for _ in 0..3 {
            let err = f.validate.execute(Some(token), Utc::now()).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Revoked);
        }
    }

    #[tokio::test]
    async fn test_revoke_unknown_token_is_not_found() {
        let f = fixture();
        let err = f.revoke.execute("evl_unknown").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_expired_active_credential_fails_with_expired() {
        let f = fixture();
        let issued = f.issue.execute("Acme", "a@acme.com").await.unwrap();
        f.repository
            .set_expiry(
                &issued.credential.token_hash,
                Some(Utc::now() - chrono::Duration::minutes(1)),
            )
            .await;

        let err = f
            .validate
            .execute(Some(issued.token.expose()), Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Expired);
    }

    #[tokio::test]
    async fn test_expiry_judged_at_arrival_time() {
        let f = fixture();
        let issued = f.issue.execute("Acme", "a@acme.com").await.unwrap();
        let expires_at = Utc::now() + chrono::Duration::seconds(5);
        f.repository
            .set_expiry(&issued.credential.token_hash, Some(expires_at))
            .await;

        let arrived_before = expires_at - chrono::Duration::seconds(1);
        assert!(
            f.validate
                .execute(Some(issued.token.expose()), arrived_before)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_rotation_invalidates_old_token_immediately() {
        let f = fixture();
        let issued = f.issue.execute("Acme", "a@acme.com").await.unwrap();
        let old = issued.token.expose().to_string();
        f.revoke.execute(&old).await.unwrap();

        let rotated = f.rotate.execute(&old).await.unwrap();
        assert_ne!(rotated.token.expose(), old);
        assert_eq!(rotated.credential.id, issued.credential.id);
        assert!(rotated.credential.is_active);

        let err = f.validate.execute(Some(old.as_str()), Utc::now()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCredential);
        assert!(
            f.validate
                .execute(Some(rotated.token.expose()), Utc::now())
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_rotate_unknown_token_is_not_found() {
        let f = fixture();
        let err = f.rotate.execute("evl_unknown").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let f = fixture();
        f.issue.execute("First", "a@acme.com").await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        f.issue.execute("Second", "a@acme.com").await.unwrap();

        let listed = f.list.execute().await.unwrap();
        let names: Vec<_> = listed.iter().map(|c| c.app_name.as_str()).collect();
        assert_eq!(names, vec!["Second", "First"]);
    }

    #[tokio::test]
    async fn test_gate_rejects_missing_and_blank_tokens() {
        let f = fixture();
        for presented in [None, Some(""), Some("   ")] {
            let err = f.validate.execute(presented, Utc::now()).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Unauthenticated);
        }
        let err = f
            .validate
            .execute(Some("evl_not_issued"), Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCredential);
    }

    #[tokio::test]
    async fn test_gate_does_not_mutate_credential() {
        let f = fixture();
        let issued = f.issue.execute("Acme", "a@acme.com").await.unwrap();
        let before = f.repository.list().await.unwrap();
        f.validate
            .execute(Some(issued.token.expose()), Utc::now())
            .await
            .unwrap();
        assert_eq!(before, f.repository.list().await.unwrap());
    }

    #[tokio::test]
    async fn test_stalled_store_times_out_as_unavailable() {
        let repo: Arc<dyn ICredentialRepository> = Arc::new(StalledCredentialRepository);
        let validate = ValidateCredentialUseCase::new(
            repo,
            Arc::new(TokenGenerator::new()),
            Duration::from_millis(20),
        );

        let err = validate
            .execute(Some("evl_anything"), Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unavailable);
    }
}
