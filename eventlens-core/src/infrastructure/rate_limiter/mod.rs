//! Fixed-window quota limiting
//!
//! Counts requests per identity (credential or client address) in fixed
//! windows. The counter key embeds the window start, so a new window starts
//! from an empty counter without any reset step.

pub mod service;
pub mod storage;
pub mod types;

pub use service::QuotaLimiter;
pub use storage::{DragonflyQuotaStorage, InMemoryQuotaStorage, QuotaCounterStore};
pub use types::{QuotaDecision, QuotaIdentity, current_time_secs};
