//! Core domain types for the service desk.
//!
//! This module contains pure domain types with no persistence dependencies:
//! - Addresses and employees (reference data)
//! - Requests, their status and the status transition rules
//! - History records and filters

pub mod address;
pub mod employee;
pub mod history;
pub mod request;

pub use address::{Address, AddressId};
pub use employee::{Employee, EmployeeId};
pub use history::{FilterOption, FilterOptions, HistoryFilter, HistoryRecord};
pub use request::{
    NewRequest, Request, RequestFilter, RequestId, RequestInput, RequestStatus, StatusTransition,
    ValidatedInput,
};
