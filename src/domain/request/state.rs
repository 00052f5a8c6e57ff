//! Core request types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{AddressId, EmployeeId};

/// Unique identifier for a request, assigned by the store on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(transparent))]
pub struct RequestId(pub i64);

impl From<i64> for RequestId {
    fn from(id: i64) -> Self {
        RequestId(id)
    }
}

impl std::ops::Deref for RequestId {
    type Target = i64;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Status of a service request.
///
/// Any status may move to any other; only the completion timestamp is tied
/// to the status (see [`super::transitions`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    #[default]
    Open,
    InProgress,
    Closed,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 3] = [
        RequestStatus::Open,
        RequestStatus::InProgress,
        RequestStatus::Closed,
    ];

    /// Token stored in the `status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Open => "open",
            RequestStatus::InProgress => "in_progress",
            RequestStatus::Closed => "closed",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            RequestStatus::Open => "Open",
            RequestStatus::InProgress => "In progress",
            RequestStatus::Closed => "Closed",
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, RequestStatus::Closed)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    /// Accepts storage tokens, English labels and the labels written by the
    /// legacy desktop forms.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_lowercase().as_str() {
            "open" | "открыта" => Ok(RequestStatus::Open),
            "in_progress" | "in progress" | "inprogress" | "в работе" => {
                Ok(RequestStatus::InProgress)
            }
            "closed" | "закрыта" => Ok(RequestStatus::Closed),
            _ => Err(format!("Invalid request status: {}", s)),
        }
    }
}

/// A tracked service request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub id: RequestId,
    pub address_id: AddressId,
    pub applicant_name: String,
    pub applicant_phone: Option<String>,
    pub problem_description: String,
    pub employee_id: Option<EmployeeId>,
    pub status: RequestStatus,
    /// Set once when the request is created
    pub created_at: DateTime<Utc>,
    /// Set if and only if the status is `Closed`
    pub completed_at: Option<DateTime<Utc>>,
}

/// A request that has been validated but not yet stored. The store assigns
/// the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRequest {
    pub address_id: AddressId,
    pub applicant_name: String,
    pub applicant_phone: Option<String>,
    pub problem_description: String,
    pub employee_id: Option<EmployeeId>,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl NewRequest {
    /// Attach the id assigned by the store.
    pub fn into_request(self, id: RequestId) -> Request {
        Request {
            id,
            address_id: self.address_id,
            applicant_name: self.applicant_name,
            applicant_phone: self.applicant_phone,
            problem_description: self.problem_description,
            employee_id: self.employee_id,
            status: self.status,
            created_at: self.created_at,
            completed_at: self.completed_at,
        }
    }
}

/// Restriction applied when listing requests. Set fields are AND-combined;
/// the default filter matches everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestFilter {
    pub employee_id: Option<EmployeeId>,
    pub address_id: Option<AddressId>,
}

impl RequestFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_employee(employee_id: EmployeeId) -> Self {
        Self {
            employee_id: Some(employee_id),
            address_id: None,
        }
    }

    pub fn by_address(address_id: AddressId) -> Self {
        Self {
            employee_id: None,
            address_id: Some(address_id),
        }
    }

    pub fn with_employee(mut self, employee_id: EmployeeId) -> Self {
        self.employee_id = Some(employee_id);
        self
    }

    pub fn with_address(mut self, address_id: AddressId) -> Self {
        self.address_id = Some(address_id);
        self
    }

    /// Scope to the employee assigned to `request`, or `None` when the
    /// request is unassigned.
    pub fn for_request_employee(request: &Request) -> Option<Self> {
        request.employee_id.map(Self::by_employee)
    }

    /// Scope to the address of `request`.
    pub fn for_request_address(request: &Request) -> Self {
        Self::by_address(request.address_id)
    }

    pub fn is_unrestricted(&self) -> bool {
        self.employee_id.is_none() && self.address_id.is_none()
    }

    pub fn matches(&self, request: &Request) -> bool {
        if let Some(employee_id) = self.employee_id
            && request.employee_id != Some(employee_id)
        {
            return false;
        }
        if let Some(address_id) = self.address_id
            && request.address_id != address_id
        {
            return false;
        }
        true
    }
}
