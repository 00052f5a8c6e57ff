//! Add/edit form input and its validation.

use serde::{Deserialize, Serialize};

use super::state::{Request, RequestStatus};
use crate::domain::{AddressId, EmployeeId};
use crate::error::ValidationKind;

/// Field values submitted from the add/edit form.
///
/// Text fields are taken as typed; [`RequestInput::validate`] trims them.
/// `status: None` means "default" on create and "unchanged" on update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestInput {
    pub address_id: Option<AddressId>,
    pub applicant_name: String,
    pub applicant_phone: Option<String>,
    pub problem_description: String,
    pub employee_id: Option<EmployeeId>,
    pub status: Option<RequestStatus>,
}

/// Input that passed validation. Text is trimmed and a blank phone is
/// dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedInput {
    pub address_id: AddressId,
    pub applicant_name: String,
    pub applicant_phone: Option<String>,
    pub problem_description: String,
    pub employee_id: Option<EmployeeId>,
    pub status: Option<RequestStatus>,
}

impl RequestInput {
    /// Preload the form from an existing request.
    pub fn from_request(request: &Request) -> Self {
        Self {
            address_id: Some(request.address_id),
            applicant_name: request.applicant_name.clone(),
            applicant_phone: request.applicant_phone.clone(),
            problem_description: request.problem_description.clone(),
            employee_id: request.employee_id,
            status: Some(request.status),
        }
    }

    /// Check required fields in form order: address, applicant, description.
    pub fn validate(&self) -> Result<ValidatedInput, ValidationKind> {
        let address_id = self.address_id.ok_or(ValidationKind::MissingAddress)?;

        let applicant_name = self.applicant_name.trim();
        if applicant_name.is_empty() {
            return Err(ValidationKind::MissingApplicantName);
        }

        let problem_description = self.problem_description.trim();
        if problem_description.is_empty() {
            return Err(ValidationKind::MissingDescription);
        }

        let applicant_phone = self
            .applicant_phone
            .as_deref()
            .map(str::trim)
            .filter(|phone| !phone.is_empty())
            .map(str::to_string);

        Ok(ValidatedInput {
            address_id,
            applicant_name: applicant_name.to_string(),
            applicant_phone,
            problem_description: problem_description.to_string(),
            employee_id: self.employee_id,
            status: self.status,
        })
    }
}
