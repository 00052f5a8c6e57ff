//! In-memory implementation of [`Storage`].
//!
//! Used by tests and by shells that do not need durable storage. Foreign
//! keys are checked the way a relational store would check them.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use parking_lot::RwLock;

use super::Storage;
use crate::domain::{
    Address, AddressId, Employee, EmployeeId, NewRequest, Request, RequestFilter, RequestId,
};
use crate::error::{Result, ServiceDeskError};

#[derive(Default)]
struct Tables {
    addresses: BTreeMap<AddressId, Address>,
    employees: BTreeMap<EmployeeId, Employee>,
    requests: BTreeMap<RequestId, Request>,
    /// Records outside this crate that reference a request (work orders,
    /// invoices). A request with dependents cannot be deleted.
    dependents: HashMap<RequestId, Vec<String>>,
    last_address_id: i64,
    last_employee_id: i64,
    last_request_id: i64,
    offline: bool,
}

impl Tables {
    fn ensure_online(&self) -> Result<()> {
        if self.offline {
            return Err(ServiceDeskError::Storage(anyhow!("store is unavailable")));
        }
        Ok(())
    }

    fn check_references(
        &self,
        address_id: AddressId,
        employee_id: Option<EmployeeId>,
    ) -> Result<()> {
        if !self.addresses.contains_key(&address_id) {
            return Err(ServiceDeskError::AddressNotFound(address_id));
        }
        if let Some(employee_id) = employee_id
            && !self.employees.contains_key(&employee_id)
        {
            return Err(ServiceDeskError::EmployeeNotFound(employee_id));
        }
        Ok(())
    }
}

/// Thread-safe in-memory store. Clones share the same tables.
///
/// # Example
/// ```
/// use servicedesk::InMemoryStorage;
///
/// let storage = InMemoryStorage::new();
/// let address = storage.add_address("1 Lenina St, apt 5");
/// let employee = storage.add_employee("Petrov", "Sergey", None);
/// assert_eq!(*address.id, 1);
/// assert_eq!(*employee.id, 1);
/// ```
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an address and return it with its assigned ID.
    pub fn add_address(&self, full_address: impl Into<String>) -> Address {
        let mut tables = self.tables.write();
        tables.last_address_id += 1;
        let address = Address {
            id: AddressId(tables.last_address_id),
            full_address: full_address.into(),
        };
        tables.addresses.insert(address.id, address.clone());
        address
    }

    /// Seed an employee and return it with its assigned ID.
    pub fn add_employee(
        &self,
        last_name: impl Into<String>,
        first_name: impl Into<String>,
        middle_name: Option<&str>,
    ) -> Employee {
        let mut tables = self.tables.write();
        tables.last_employee_id += 1;
        let employee = Employee {
            id: EmployeeId(tables.last_employee_id),
            last_name: last_name.into(),
            first_name: first_name.into(),
            middle_name: middle_name.map(str::to_string),
        };
        tables.employees.insert(employee.id, employee.clone());
        employee
    }

    /// Remove an address without touching requests that point at it, the
    /// way a store without cascading foreign keys would.
    pub fn remove_address(&self, id: AddressId) -> Option<Address> {
        self.tables.write().addresses.remove(&id)
    }

    /// Record that something outside this crate references `request_id`.
    pub fn add_dependent(&self, request_id: RequestId, label: impl Into<String>) {
        self.tables
            .write()
            .dependents
            .entry(request_id)
            .or_default()
            .push(label.into());
    }

    /// Simulate the store going away (or coming back).
    pub fn set_offline(&self, offline: bool) {
        self.tables.write().offline = offline;
    }

    pub fn request_count(&self) -> usize {
        self.tables.read().requests.len()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn get_address(&self, id: AddressId) -> Result<Address> {
        let tables = self.tables.read();
        tables.ensure_online()?;
        tables
            .addresses
            .get(&id)
            .cloned()
            .ok_or(ServiceDeskError::AddressNotFound(id))
    }

    async fn get_employee(&self, id: EmployeeId) -> Result<Employee> {
        let tables = self.tables.read();
        tables.ensure_online()?;
        tables
            .employees
            .get(&id)
            .cloned()
            .ok_or(ServiceDeskError::EmployeeNotFound(id))
    }

    async fn list_addresses(&self) -> Result<Vec<Address>> {
        let tables = self.tables.read();
        tables.ensure_online()?;
        Ok(tables.addresses.values().cloned().collect())
    }

    async fn list_employees(&self) -> Result<Vec<Employee>> {
        let tables = self.tables.read();
        tables.ensure_online()?;
        Ok(tables.employees.values().cloned().collect())
    }

    async fn get_request(&self, id: RequestId) -> Result<Request> {
        let tables = self.tables.read();
        tables.ensure_online()?;
        tables
            .requests
            .get(&id)
            .cloned()
            .ok_or(ServiceDeskError::RequestNotFound(id))
    }

    async fn list_requests(&self, filter: RequestFilter) -> Result<Vec<Request>> {
        let tables = self.tables.read();
        tables.ensure_online()?;
        Ok(tables
            .requests
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    async fn create_request(&self, request: NewRequest) -> Result<RequestId> {
        let mut tables = self.tables.write();
        tables.ensure_online()?;
        tables.check_references(request.address_id, request.employee_id)?;

        tables.last_request_id += 1;
        let id = RequestId(tables.last_request_id);
        tables.requests.insert(id, request.into_request(id));
        Ok(id)
    }

    async fn update_request(&self, request: &Request) -> Result<()> {
        let mut tables = self.tables.write();
        tables.ensure_online()?;
        if !tables.requests.contains_key(&request.id) {
            return Err(ServiceDeskError::RequestNotFound(request.id));
        }
        tables.check_references(request.address_id, request.employee_id)?;

        tables.requests.insert(request.id, request.clone());
        Ok(())
    }

    async fn delete_request(&self, id: RequestId) -> Result<()> {
        let mut tables = self.tables.write();
        tables.ensure_online()?;
        if !tables.requests.contains_key(&id) {
            return Err(ServiceDeskError::RequestNotFound(id));
        }
        if let Some(dependents) = tables.dependents.get(&id)
            && !dependents.is_empty()
        {
            return Err(ServiceDeskError::Conflict(format!(
                "request {} is referenced by {}",
                id,
                dependents.join(", ")
            )));
        }

        tables.requests.remove(&id);
        tables.dependents.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RequestStatus;
    use chrono::Utc;

    fn new_request(address_id: AddressId, employee_id: Option<EmployeeId>) -> NewRequest {
        NewRequest {
            address_id,
            applicant_name: "Ivanov".to_string(),
            applicant_phone: None,
            problem_description: "Leak".to_string(),
            employee_id,
            status: RequestStatus::Open,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    #[tokio::test]
    async fn test_ids_are_assigned_in_insertion_order() {
        let storage = InMemoryStorage::new();
        let address = storage.add_address("1 Lenina St");

        let first = storage
            .create_request(new_request(address.id, None))
            .await
            .unwrap();
        let second = storage
            .create_request(new_request(address.id, None))
            .await
            .unwrap();

        assert_eq!(first, RequestId(1));
        assert_eq!(second, RequestId(2));

        let listed = storage.list_requests(RequestFilter::all()).await.unwrap();
        let ids: Vec<_> = listed.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[tokio::test]
    async fn test_create_checks_foreign_keys() {
        let storage = InMemoryStorage::new();
        let address = storage.add_address("1 Lenina St");

        let err = storage
            .create_request(new_request(AddressId(99), None))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceDeskError::AddressNotFound(AddressId(99))));

        let err = storage
            .create_request(new_request(address.id, Some(EmployeeId(7))))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceDeskError::EmployeeNotFound(EmployeeId(7))));

        assert_eq!(storage.request_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_with_dependents_conflicts() {
        let storage = InMemoryStorage::new();
        let address = storage.add_address("1 Lenina St");
        let id = storage
            .create_request(new_request(address.id, None))
            .await
            .unwrap();
        storage.add_dependent(id, "work order 17");

        let err = storage.delete_request(id).await.unwrap_err();
        match err {
            ServiceDeskError::Conflict(message) => assert!(message.contains("work order 17")),
            other => panic!("expected conflict, got {:?}", other),
        }
        assert!(storage.get_request(id).await.is_ok());
    }

    #[tokio::test]
    async fn test_offline_store_reports_storage_error() {
        let storage = InMemoryStorage::new();
        storage.set_offline(true);

        let err = storage.list_addresses().await.unwrap_err();
        assert!(matches!(err, ServiceDeskError::Storage(_)));

        storage.set_offline(false);
        assert!(storage.list_addresses().await.unwrap().is_empty());
    }
}
