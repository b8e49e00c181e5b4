//! Gateway controllers and shared application state

pub mod analytics;
pub mod health;

use axum::http::HeaderName;
use std::sync::Arc;

use eventlens_core::Config;
use eventlens_core::application::CacheStore;
use eventlens_core::application::analytics::{
    GetEventSummaryUseCase, GetUserStatsUseCase, RecordEventUseCase,
};
use eventlens_core::application::auth::{
    IssueCredentialUseCase, ListCredentialsUseCase, LookupCredentialUseCase,
    RevokeCredentialUseCase, RotateCredentialUseCase, ValidateCredentialUseCase,
};
use eventlens_core::domain::analytics::IEventRepository;
use eventlens_core::domain::auth::ICredentialRepository;
use eventlens_core::infrastructure::{QuotaLimiter, TokenGenerator};

use crate::presentation::auth::controller::CredentialAppState;
use crate::presentation::middleware::{CredentialGateState, QuotaState};

const DEFAULT_CREDENTIAL_HEADER: &str = "x-api-key";

/// Application state shared by every route
#[derive(Clone)]
pub struct GatewayState {
    pub credentials: CredentialAppState,
    pub validate_credential: Arc<ValidateCredentialUseCase>,
    pub record_event: Arc<RecordEventUseCase>,
    pub get_event_summary: Arc<GetEventSummaryUseCase>,
    pub get_user_stats: Arc<GetUserStatsUseCase>,
    pub quota_limiter: Arc<QuotaLimiter>,
    pub token_generator: Arc<TokenGenerator>,
    /// Header carrying the access token on gated routes
    pub credential_header: HeaderName,
}

impl GatewayState {
    /// Wire every use case over the given stores
    pub fn new(
        credential_repository: Arc<dyn ICredentialRepository>,
        event_repository: Arc<dyn IEventRepository>,
        cache: Arc<dyn CacheStore>,
        quota_limiter: Arc<QuotaLimiter>,
        config: &Config,
    ) -> Self {
        let op_timeout = config.stores.operation_timeout();
        let expiry = config.credentials.expiry();
        let token_generator = Arc::new(TokenGenerator::from_config(&config.credentials));

        let credentials = CredentialAppState {
            issue_credential: Arc::new(IssueCredentialUseCase::new(
                credential_repository.clone(),
                token_generator.clone(),
                expiry,
                op_timeout,
            )),
            lookup_credential: Arc::new(LookupCredentialUseCase::new(
                credential_repository.clone(),
                token_generator.clone(),
                op_timeout,
            )),
            revoke_credential: Arc::new(RevokeCredentialUseCase::new(
                credential_repository.clone(),
                token_generator.clone(),
                op_timeout,
            )),
            rotate_credential: Arc::new(RotateCredentialUseCase::new(
                credential_repository.clone(),
                token_generator.clone(),
                expiry,
                op_timeout,
            )),
            list_credentials: Arc::new(ListCredentialsUseCase::new(
                credential_repository.clone(),
                op_timeout,
            )),
        };

        Self {
            credentials,
            validate_credential: Arc::new(ValidateCredentialUseCase::new(
                credential_repository,
                token_generator.clone(),
                op_timeout,
            )),
            record_event: Arc::new(RecordEventUseCase::new(
                event_repository.clone(),
                cache.clone(),
                op_timeout,
            )),
            get_event_summary: Arc::new(GetEventSummaryUseCase::new(
                event_repository.clone(),
                cache,
                config.cache.summary_ttl(),
                op_timeout,
            )),
            get_user_stats: Arc::new(GetUserStatsUseCase::new(event_repository, op_timeout)),
            quota_limiter,
            token_generator,
            credential_header: credential_header(&config.credentials.header_name),
        }
    }

    pub(crate) fn gate_state(&self) -> CredentialGateState {
        CredentialGateState {
            validate_credential: self.validate_credential.clone(),
            header_name: self.credential_header.clone(),
        }
    }

    pub(crate) fn quota_state(&self) -> QuotaState {
        QuotaState {
            limiter: self.quota_limiter.clone(),
            token_generator: self.token_generator.clone(),
            header_name: self.credential_header.clone(),
        }
    }
}

fn credential_header(configured: &str) -> HeaderName {
    HeaderName::from_bytes(configured.trim().to_ascii_lowercase().as_bytes()).unwrap_or_else(
        |_| {
            tracing::warn!(
                header = configured,
                "Invalid credential header name; using {}",
                DEFAULT_CREDENTIAL_HEADER
            );
            HeaderName::from_static(DEFAULT_CREDENTIAL_HEADER)
        },
    )
}
