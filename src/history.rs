//! History view: filtered, newest-first listings of requests.

use std::cmp::Ordering;
use std::sync::Arc;

use metrics::counter;

use crate::config::ServiceDeskConfig;
use crate::domain::{FilterOption, FilterOptions, HistoryFilter, HistoryRecord};
use crate::error::Result;
use crate::lookup::ReferenceIndex;
use crate::manager::Storage;

/// Newest first; equal timestamps fall back to id (insertion) order.
fn history_order(a: &HistoryRecord, b: &HistoryRecord) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| a.request_id.cmp(&b.request_id))
}

/// Read-only queries backing the history window.
pub struct HistoryService<S: Storage + ?Sized> {
    storage: Arc<S>,
    config: ServiceDeskConfig,
}

impl<S: Storage + ?Sized> HistoryService<S> {
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

    /// Requests matching `filter`, resolved for display and ordered by
    /// creation time, newest first. No match is an empty list, not an error.
    #[tracing::instrument(skip(self))]
    pub async fn query_history(&self, filter: HistoryFilter) -> Result<Vec<HistoryRecord>> {
        let requests = self.storage.list_requests(filter).await?;
        let index = ReferenceIndex::load(self.storage.as_ref()).await?;

        let mut records: Vec<HistoryRecord> = requests
            .iter()
            .map(|request| {
                HistoryRecord::resolve(
                    request,
                    index.address(request.address_id),
                    index.employee(request.employee_id),
                    &self.config,
                )
            })
            .collect();
        records.sort_by(history_order);

        counter!("servicedesk_history_queries_total").increment(1);
        tracing::debug!(count = records.len(), "Loaded request history");
        Ok(records)
    }

    /// Employee and address pickers, each led by an "all" entry.
    pub async fn filter_options(&self) -> Result<FilterOptions> {
        let mut employees = vec![FilterOption {
            id: None,
            label: self.config.all_employees_label.clone(),
        }];
        employees.extend(
            self.storage
                .list_employees()
                .await?
                .into_iter()
                .map(|e| FilterOption {
                    id: Some(e.id),
                    label: e.full_name(),
                }),
        );

        let mut addresses = vec![FilterOption {
            id: None,
            label: self.config.all_addresses_label.clone(),
        }];
        addresses.extend(
            self.storage
                .list_addresses()
                .await?
                .into_iter()
                .map(|a| FilterOption {
                    id: Some(a.id),
                    label: a.full_address,
                }),
        );

        Ok(FilterOptions {
            employees,
            addresses,
        })
    }

    /// Window caption for a history view scoped by `filter`.
    ///
    /// # Errors
    /// `EmployeeNotFound` / `AddressNotFound` when the filter names an
    /// unknown id.
    pub async fn title(&self, filter: HistoryFilter) -> Result<String> {
        let employee = match filter.employee_id {
            Some(id) => Some(self.storage.get_employee(id).await?),
            None => None,
        };
        let address = match filter.address_id {
            Some(id) => Some(self.storage.get_address(id).await?),
            None => None,
        };

        Ok(match (employee, address) {
            (None, None) => "Request history".to_string(),
            (Some(e), None) => format!("Request history for employee: {}", e.last_name),
            (None, Some(a)) => format!("Request history for address: {}", a.full_address),
            (Some(e), Some(a)) => format!(
                "Request history for employee: {}, address: {}",
                e.last_name, a.full_address
            ),
        })
    }
}
