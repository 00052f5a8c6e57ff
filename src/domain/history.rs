//! History view types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::request::{Request, RequestFilter, RequestId, RequestStatus};
use super::{Address, AddressId, Employee, EmployeeId};
use crate::config::ServiceDeskConfig;

/// History views are scoped the same way request listings are.
pub type HistoryFilter = RequestFilter;

/// One row of the history view, with references resolved to display text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub request_id: RequestId,
    pub created_at: DateTime<Utc>,
    pub address: String,
    pub applicant_name: String,
    pub problem_description: String,
    pub employee_name: String,
    pub status: RequestStatus,
    pub completed_at: Option<DateTime<Utc>>,
}

impl HistoryRecord {
    /// Resolve a request against its (possibly missing) address and employee.
    pub fn resolve(
        request: &Request,
        address: Option<&Address>,
        employee: Option<&Employee>,
        config: &ServiceDeskConfig,
    ) -> Self {
        Self {
            request_id: request.id,
            created_at: request.created_at,
            address: address
                .map(|a| a.full_address.clone())
                .unwrap_or_else(|| config.missing_address_label.clone()),
            applicant_name: request.applicant_name.clone(),
            problem_description: request.problem_description.clone(),
            employee_name: employee
                .map(Employee::short_name)
                .unwrap_or_else(|| config.unassigned_label.clone()),
            status: request.status,
            completed_at: request.completed_at,
        }
    }
}

/// An entry in a filter picker. `id: None` is the "all" entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOption<Id> {
    pub id: Option<Id>,
    pub label: String,
}

/// Picker contents for the history view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub employees: Vec<FilterOption<EmployeeId>>,
    pub addresses: Vec<FilterOption<AddressId>>,
}
