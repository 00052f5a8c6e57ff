//! Request aggregate - domain model and status transitions.
//!
//! This module contains the core domain logic for requests:
//! - Request types and status (closed three-valued enumeration)
//! - Form input and its validation
//! - Status transition rules that keep the completion timestamp consistent

pub mod input;
pub mod state;
pub mod transitions;

// Re-export commonly used types
pub use input::{RequestInput, ValidatedInput};
pub use state::*;
pub use transitions::StatusTransition;
