//! Status transitions for requests.
//!
//! Status moves freely between the three variants. The one rule enforced
//! here is the completion timestamp:
//!
//! ```text
//!   Open / InProgress ──close──> Closed       completed_at := now
//!   Closed            ──close──> Closed       completed_at kept
//!   Closed            ──reopen─> Open/InProg  completed_at := None
//! ```
//!
//! `created_at` is never touched after [`NewRequest::from_input`].

use chrono::{DateTime, Utc};

use super::input::ValidatedInput;
use super::state::{NewRequest, Request, RequestStatus};

/// The status before and after an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTransition {
    pub from: RequestStatus,
    pub to: RequestStatus,
}

impl StatusTransition {
    pub fn is_change(&self) -> bool {
        self.from != self.to
    }

    pub fn closes(&self) -> bool {
        !self.from.is_closed() && self.to.is_closed()
    }

    pub fn reopens(&self) -> bool {
        self.from.is_closed() && !self.to.is_closed()
    }
}

impl NewRequest {
    /// Build a request to be stored, stamped with `now`.
    pub fn from_input(input: ValidatedInput, now: DateTime<Utc>) -> Self {
        let status = input.status.unwrap_or_default();
        Self {
            address_id: input.address_id,
            applicant_name: input.applicant_name,
            applicant_phone: input.applicant_phone,
            problem_description: input.problem_description,
            employee_id: input.employee_id,
            status,
            created_at: now,
            completed_at: status.is_closed().then_some(now),
        }
    }
}

impl Request {
    /// Move to `next`, keeping `completed_at` consistent with the status.
    pub fn set_status(&mut self, next: RequestStatus, now: DateTime<Utc>) -> StatusTransition {
        let transition = StatusTransition {
            from: self.status,
            to: next,
        };

        if next.is_closed() {
            if self.completed_at.is_none() {
                self.completed_at = Some(now);
            }
        } else {
            self.completed_at = None;
        }
        self.status = next;

        transition
    }

    /// Overwrite the editable fields from validated form input. A missing
    /// status leaves the current one in place.
    pub fn apply(&mut self, input: ValidatedInput, now: DateTime<Utc>) -> StatusTransition {
        self.address_id = input.address_id;
        self.applicant_name = input.applicant_name;
        self.applicant_phone = input.applicant_phone;
        self.problem_description = input.problem_description;
        self.employee_id = input.employee_id;

        let next = input.status.unwrap_or(self.status);
        self.set_status(next, now)
    }

    /// Whether `completed_at` agrees with the status.
    pub fn is_consistent(&self) -> bool {
        self.status.is_closed() == self.completed_at.is_some()
    }
}
