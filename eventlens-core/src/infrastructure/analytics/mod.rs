//! Event persistence

pub mod event_repository;

pub use event_repository::SqlxEventRepository;
