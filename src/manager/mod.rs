//! Repository gateway for the service desk.
//!
//! This module defines the `Storage` trait, the only way the lifecycle and
//! history services touch persisted data. It carries no business rules:
//! validation and status handling live in [`crate::lifecycle`].

use async_trait::async_trait;

use crate::domain::{
    Address, AddressId, Employee, EmployeeId, NewRequest, Request, RequestFilter, RequestId,
};
use crate::error::Result;

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

/// CRUD access to addresses, employees and requests.
///
/// Every call is atomic at the single-record level: on error nothing has
/// been written.
///
/// # Errors
/// - `*NotFound` when an id does not resolve
/// - `Conflict` when a delete would break referential integrity
/// - `Storage` when the store is unreachable or rejects the operation
#[async_trait]
pub trait Storage: Send + Sync {
    /// Get an address by ID.
    async fn get_address(&self, id: AddressId) -> Result<Address>;

    /// Get an employee by ID.
    async fn get_employee(&self, id: EmployeeId) -> Result<Employee>;

    /// List all addresses, ordered by ID.
    async fn list_addresses(&self) -> Result<Vec<Address>>;

    /// List all employees, ordered by ID.
    async fn list_employees(&self) -> Result<Vec<Employee>>;

    /// Get a request by ID.
    async fn get_request(&self, id: RequestId) -> Result<Request>;

    /// List requests matching `filter`, ordered by ID.
    async fn list_requests(&self, filter: RequestFilter) -> Result<Vec<Request>>;

    /// Store a new request and return its assigned ID.
    async fn create_request(&self, request: NewRequest) -> Result<RequestId>;

    /// Overwrite a stored request with the same ID.
    async fn update_request(&self, request: &Request) -> Result<()>;

    /// Permanently remove a request.
    async fn delete_request(&self, id: RequestId) -> Result<()>;
}
