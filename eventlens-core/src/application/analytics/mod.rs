//! Event ingestion and aggregate reads

pub mod keys;
pub mod use_cases;

pub use keys::summary_cache_key;
pub use use_cases::{
    GetEventSummaryUseCase, GetUserStatsUseCase, RecordEventInput, RecordEventUseCase,
};
