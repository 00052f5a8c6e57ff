//! Request lifecycle: validated create, update and delete.
//!
//! [`RequestManager`] is what the add/edit dialog and the main grid call.
//! It validates form input, checks that references resolve, keeps the
//! completion timestamp consistent with the status and persists through the
//! [`Storage`] gateway. Each operation either fully succeeds or leaves the
//! store untouched.
//!
//! Updates are read-modify-write without cross-call locking: two concurrent
//! updates of the same request are last-writer-wins.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use metrics::counter;
use serde::Serialize;

use crate::config::ServiceDeskConfig;
use crate::domain::{NewRequest, Request, RequestFilter, RequestId, RequestInput, ValidatedInput};
use crate::error::{Result, ServiceDeskError};
use crate::lookup::ReferenceIndex;
use crate::manager::Storage;

/// Current time at the precision stores keep (microseconds), so a returned
/// request compares equal to the stored row.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// A request with its references resolved for the main grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestRow {
    pub request: Request,
    pub address: String,
    pub employee_name: String,
}

/// Contents of the main grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestOverview {
    pub rows: Vec<RequestRow>,
    pub count: usize,
}

/// What the shell shows before asking to confirm a delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionPreview {
    pub request_id: RequestId,
    pub applicant_name: String,
    pub address: String,
    pub problem_description: String,
}

impl fmt::Display for DeletionPreview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Delete request {}?", self.request_id)?;
        writeln!(f, "Applicant: {}", self.applicant_name)?;
        writeln!(f, "Address: {}", self.address)?;
        write!(f, "Description: {}", self.problem_description)
    }
}

/// Validates and persists request mutations.
///
/// # Example
/// ```
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), servicedesk::ServiceDeskError> {
/// use std::sync::Arc;
/// use servicedesk::{InMemoryStorage, RequestInput, RequestManager, RequestStatus};
///
/// let storage = Arc::new(InMemoryStorage::new());
/// let address = storage.add_address("1 Lenina St, apt 5");
/// let manager = RequestManager::new(storage);
///
/// let request = manager
///     .create_request(RequestInput {
///         address_id: Some(address.id),
///         applicant_name: "Ivanov".to_string(),
///         problem_description: "Leak".to_string(),
///         ..Default::default()
///     })
///     .await?;
/// assert_eq!(request.status, RequestStatus::Open);
/// # Ok(())
/// # }
/// ```
pub struct RequestManager<S: Storage + ?Sized> {
    storage: Arc<S>,
    config: ServiceDeskConfig,
}

impl<S: Storage + ?Sized> RequestManager<S> {
    /// Create a manager over `storage` with default display settings.
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            config: ServiceDeskConfig::default(),
        }
    }

    /// Set custom display settings.
    pub fn with_config(mut self, config: ServiceDeskConfig) -> Self {
        self.config = config;
        self
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    pub fn config(&self) -> &ServiceDeskConfig {
        &self.config
    }

    /// Validate form input and make sure the address and employee exist.
    async fn check_input(
        &self,
        input: &RequestInput,
        operation: &'static str,
    ) -> Result<ValidatedInput> {
        let checked = match input.validate() {
            Ok(validated) => self.check_references(&validated).await.map(|()| validated),
            Err(kind) => Err(ServiceDeskError::Validation(kind)),
        };

        checked.inspect_err(|e| self.record_rejection(operation, e))
    }

    async fn check_references(&self, input: &ValidatedInput) -> Result<()> {
        self.storage.get_address(input.address_id).await?;
        if let Some(employee_id) = input.employee_id {
            self.storage.get_employee(employee_id).await?;
        }
        Ok(())
    }

    fn record_rejection(&self, operation: &'static str, error: &ServiceDeskError) {
        counter!(
            "servicedesk_request_rejected_total",
            "operation" => operation,
            "reason" => error.kind()
        )
        .increment(1);
        tracing::warn!(operation, error = %error, "Request operation rejected");
    }

    /// Create a new request, stamped with the current time.
    ///
    /// # Errors
    /// - `Validation` when the address, applicant name or description is missing
    /// - `AddressNotFound` / `EmployeeNotFound` when a reference does not resolve
    /// - `Storage` when the store fails
    #[tracing::instrument(skip(self, input), fields(address_id = ?input.address_id))]
    pub async fn create_request(&self, input: RequestInput) -> Result<Request> {
        let validated = self.check_input(&input, "create").await?;

        let new_request = NewRequest::from_input(validated, now());
        let id = self.storage.create_request(new_request.clone()).await?;
        let request = new_request.into_request(id);

        counter!("servicedesk_requests_created_total").increment(1);
        tracing::info!(
            request_id = %request.id,
            status = %request.status,
            "Request created"
        );

        Ok(request)
    }

    /// Overwrite the editable fields of an existing request.
    ///
    /// Closing stamps the completion time (once); moving away from `Closed`
    /// clears it. The creation time is never changed.
    ///
    /// # Errors
    /// As [`Self::create_request`], plus `RequestNotFound` for an unknown id.
    #[tracing::instrument(skip(self, input), fields(request_id = %id))]
    pub async fn update_request(&self, id: RequestId, input: RequestInput) -> Result<Request> {
        let mut request = self
            .storage
            .get_request(id)
            .await
            .inspect_err(|e| self.record_rejection("update", e))?;
        let validated = self.check_input(&input, "update").await?;

        let transition = request.apply(validated, now());
        self.storage.update_request(&request).await?;

        counter!(
            "servicedesk_requests_updated_total",
            "status" => request.status.as_str()
        )
        .increment(1);
        if transition.is_change() {
            tracing::info!(
                request_id = %id,
                from = %transition.from,
                to = %transition.to,
                "Request status changed"
            );
        } else {
            tracing::info!(request_id = %id, "Request updated");
        }

        Ok(request)
    }

    /// Permanently remove a request.
    ///
    /// # Errors
    /// - `RequestNotFound` for an unknown id
    /// - `Conflict` when other records still reference the request
    #[tracing::instrument(skip(self), fields(request_id = %id))]
    pub async fn delete_request(&self, id: RequestId) -> Result<()> {
        self.storage
            .delete_request(id)
            .await
            .inspect_err(|e| self.record_rejection("delete", e))?;

        counter!("servicedesk_requests_deleted_total").increment(1);
        tracing::info!(request_id = %id, "Request deleted");
        Ok(())
    }

    /// Get a single request.
    pub async fn get_request(&self, id: RequestId) -> Result<Request> {
        self.storage.get_request(id).await
    }

    /// Every request with its address and employee resolved, for the main grid.
    #[tracing::instrument(skip(self))]
    pub async fn overview(&self) -> Result<RequestOverview> {
        let requests = self.storage.list_requests(RequestFilter::all()).await?;
        let index = ReferenceIndex::load(self.storage.as_ref()).await?;

        let rows: Vec<RequestRow> = requests
            .into_iter()
            .map(|request| RequestRow {
                address: index.address_label(request.address_id, &self.config),
                employee_name: index.employee_label(request.employee_id, &self.config),
                request,
            })
            .collect();

        tracing::debug!(count = rows.len(), "Loaded request overview");
        Ok(RequestOverview {
            count: rows.len(),
            rows,
        })
    }

    /// Summary of a request for the delete confirmation prompt.
    pub async fn deletion_preview(&self, id: RequestId) -> Result<DeletionPreview> {
        let request = self.storage.get_request(id).await?;
        let address = match self.storage.get_address(request.address_id).await {
            Ok(address) => address.full_address,
            Err(ServiceDeskError::AddressNotFound(_)) => self.config.missing_address_label.clone(),
            Err(e) => return Err(e),
        };

        Ok(DeletionPreview {
            request_id: request.id,
            applicant_name: request.applicant_name,
            address,
            problem_description: request.problem_description,
        })
    }
}
