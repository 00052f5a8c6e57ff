//! Error types for the service desk.

use std::fmt;

use thiserror::Error;

use crate::domain::{AddressId, EmployeeId, RequestId};

/// Result type alias using the service desk error type.
pub type Result<T> = std::result::Result<T, ServiceDeskError>;

/// Which required field was missing when validating request input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationKind {
    /// No address was selected
    MissingAddress,
    /// Applicant name is empty or whitespace
    MissingApplicantName,
    /// Problem description is empty or whitespace
    MissingDescription,
}

impl ValidationKind {
    /// Short machine-friendly tag, used as a metrics label.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationKind::MissingAddress => "missing_address",
            ValidationKind::MissingApplicantName => "missing_applicant_name",
            ValidationKind::MissingDescription => "missing_description",
        }
    }
}

impl fmt::Display for ValidationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationKind::MissingAddress => write!(f, "an address must be selected"),
            ValidationKind::MissingApplicantName => write!(f, "applicant name is required"),
            ValidationKind::MissingDescription => write!(f, "problem description is required"),
        }
    }
}

/// Main error type for the service desk.
#[derive(Error, Debug)]
pub enum ServiceDeskError {
    /// A required field was missing or blank
    #[error("Validation error: {0}")]
    Validation(ValidationKind),

    /// Request not found
    #[error("Request not found: {0}")]
    RequestNotFound(RequestId),

    /// Address not found
    #[error("Address not found: {0}")]
    AddressNotFound(AddressId),

    /// Employee not found
    #[error("Employee not found: {0}")]
    EmployeeNotFound(EmployeeId),

    /// The store refused the operation because other records depend on it
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The store was unreachable or rejected the operation
    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl ServiceDeskError {
    /// True for any of the "id does not resolve" variants.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ServiceDeskError::RequestNotFound(_)
                | ServiceDeskError::AddressNotFound(_)
                | ServiceDeskError::EmployeeNotFound(_)
        )
    }

    /// Short tag describing the error class, used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceDeskError::Validation(kind) => kind.as_str(),
            ServiceDeskError::RequestNotFound(_) => "request_not_found",
            ServiceDeskError::AddressNotFound(_) => "address_not_found",
            ServiceDeskError::EmployeeNotFound(_) => "employee_not_found",
            ServiceDeskError::Conflict(_) => "conflict",
            ServiceDeskError::Storage(_) => "storage",
        }
    }
}

impl From<ValidationKind> for ServiceDeskError {
    fn from(kind: ValidationKind) -> Self {
        ServiceDeskError::Validation(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_family() {
        assert!(ServiceDeskError::RequestNotFound(RequestId(1)).is_not_found());
        assert!(ServiceDeskError::AddressNotFound(AddressId(1)).is_not_found());
        assert!(ServiceDeskError::EmployeeNotFound(EmployeeId(1)).is_not_found());
        assert!(!ServiceDeskError::Conflict("x".into()).is_not_found());
        assert!(!ServiceDeskError::Validation(ValidationKind::MissingAddress).is_not_found());
    }

    #[test]
    fn test_messages_are_readable() {
        let err = ServiceDeskError::from(ValidationKind::MissingDescription);
        assert_eq!(
            err.to_string(),
            "Validation error: problem description is required"
        );

        let err = ServiceDeskError::RequestNotFound(RequestId(42));
        assert_eq!(err.to_string(), "Request not found: #42");

        let err = ServiceDeskError::from(anyhow::anyhow!("connection refused"));
        assert_eq!(err.to_string(), "Storage error: connection refused");
        assert_eq!(err.kind(), "storage");
    }
}
