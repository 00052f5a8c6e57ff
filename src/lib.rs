//! Service request tracking for addresses and employees.
//!
//! This crate provides the logic behind a service desk's request forms: a
//! [`RequestManager`] that validates and persists request mutations (keeping
//! the completion time consistent with the status), and a [`HistoryService`]
//! that produces filtered, newest-first listings. Both sit on top of the
//! [`Storage`] gateway, with in-memory and PostgreSQL implementations.

pub mod config;
pub mod domain;
pub mod error;
pub mod history;
pub mod lifecycle;
mod lookup;
pub mod manager;

// Re-export commonly used types
pub use config::ServiceDeskConfig;
pub use domain::{
    Address, AddressId, Employee, EmployeeId, FilterOption, FilterOptions, HistoryFilter,
    HistoryRecord, NewRequest, Request, RequestFilter, RequestId, RequestInput, RequestStatus,
    StatusTransition,
};
pub use error::{Result, ServiceDeskError, ValidationKind};
pub use history::HistoryService;
pub use lifecycle::{DeletionPreview, RequestManager, RequestOverview, RequestRow};
pub use manager::Storage;
pub use manager::memory::InMemoryStorage;
#[cfg(feature = "postgres")]
pub use manager::postgres::{PoolProvider, PostgresStorage, TestDbPools};

/// Get the service desk database migrator
///
/// Returns a migrator that can be run against a connection pool.
#[cfg(feature = "postgres")]
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}
