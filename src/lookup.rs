//! Reference data snapshot used to turn ids into display text.

use std::collections::HashMap;

use crate::config::ServiceDeskConfig;
use crate::domain::{Address, AddressId, Employee, EmployeeId};
use crate::error::Result;
use crate::manager::Storage;

/// All addresses and employees, loaded once per view instead of one lookup
/// per row.
#[derive(Debug, Default)]
pub(crate) struct ReferenceIndex {
    addresses: HashMap<AddressId, Address>,
    employees: HashMap<EmployeeId, Employee>,
}

impl ReferenceIndex {
    pub(crate) async fn load<S: Storage + ?Sized>(storage: &S) -> Result<Self> {
        let addresses = storage
            .list_addresses()
            .await?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();
        let employees = storage
            .list_employees()
            .await?
            .into_iter()
            .map(|e| (e.id, e))
            .collect();
        Ok(Self {
            addresses,
            employees,
        })
    }

    pub(crate) fn address(&self, id: AddressId) -> Option<&Address> {
        self.addresses.get(&id)
    }

    pub(crate) fn employee(&self, id: Option<EmployeeId>) -> Option<&Employee> {
        id.and_then(|id| self.employees.get(&id))
    }

    pub(crate) fn address_label(&self, id: AddressId, config: &ServiceDeskConfig) -> String {
        self.address(id)
            .map(|a| a.full_address.clone())
            .unwrap_or_else(|| config.missing_address_label.clone())
    }

    pub(crate) fn employee_label(
        &self,
        id: Option<EmployeeId>,
        config: &ServiceDeskConfig,
    ) -> String {
        self.employee(id)
            .map(Employee::short_name)
            .unwrap_or_else(|| config.unassigned_label.clone())
    }
}
