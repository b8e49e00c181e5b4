//! Event and aggregate domain

pub mod entities;
pub mod repositories;

pub use entities::{DeviceCount, Event, EventSummary, NewEvent, ReferrerCount, UserStats};
pub use repositories::IEventRepository;
