//! PostgreSQL implementation of [`Storage`].
//!
//! The schema lives in `migrations/` and is applied with
//! [`crate::migrator`]. Foreign keys on `requests` guard the address and
//! employee references and surface as `AddressNotFound` / `EmployeeNotFound`
//! on create and update; any other table that references `requests` turns a
//! delete into a [`ServiceDeskError::Conflict`].

use anyhow::anyhow;
use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;

use super::Storage;
use crate::domain::{
    Address, AddressId, Employee, EmployeeId, NewRequest, Request, RequestFilter, RequestId,
    RequestStatus,
};
use crate::error::{Result, ServiceDeskError};

mod pool_provider;

pub use pool_provider::{PoolProvider, TestDbPools};

/// SQLSTATE for foreign_key_violation.
const FOREIGN_KEY_VIOLATION: &str = "23503";

const ADDRESS_FOREIGN_KEY: &str = "requests_address_id_fkey";
const EMPLOYEE_FOREIGN_KEY: &str = "requests_employee_id_fkey";

const REQUEST_COLUMNS: &str = "id, address_id, applicant_name, applicant_phone, \
     problem_description, employee_id, status, created_at, completed_at";

/// PostgreSQL implementation of the Storage trait.
///
/// # Example
/// ```ignore
/// use servicedesk::{PostgresStorage, RequestManager};
/// use sqlx::PgPool;
///
/// let pool = PgPool::connect("postgresql://localhost/servicedesk").await?;
/// servicedesk::migrator().run(&pool).await?;
/// let manager = RequestManager::new(Arc::new(PostgresStorage::new(pool)));
/// ```
pub struct PostgresStorage<P: PoolProvider = sqlx::PgPool> {
    pools: P,
}

impl<P: PoolProvider> PostgresStorage<P> {
    pub fn new(pools: P) -> Self {
        Self { pools }
    }

    /// Get the pool provider.
    pub fn pools(&self) -> &P {
        &self.pools
    }
}

fn map_db_error(context: &str, e: sqlx::Error) -> ServiceDeskError {
    ServiceDeskError::Storage(anyhow!("{}: {}", context, e))
}

/// Name of the violated foreign key, if `e` is a foreign key violation.
fn violated_foreign_key(e: &sqlx::Error) -> Option<String> {
    match e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) => {
            Some(db.constraint().unwrap_or_default().to_string())
        }
        _ => None,
    }
}

/// On INSERT/UPDATE a foreign key violation means a reference did not resolve.
fn map_write_error(
    context: &str,
    e: sqlx::Error,
    address_id: AddressId,
    employee_id: Option<EmployeeId>,
) -> ServiceDeskError {
    match (violated_foreign_key(&e).as_deref(), employee_id) {
        (Some(ADDRESS_FOREIGN_KEY), _) => ServiceDeskError::AddressNotFound(address_id),
        (Some(EMPLOYEE_FOREIGN_KEY), Some(employee_id)) => {
            ServiceDeskError::EmployeeNotFound(employee_id)
        }
        _ => map_db_error(context, e),
    }
}

/// On DELETE a foreign key violation means another table still references
/// the row.
fn map_delete_error(context: &str, e: sqlx::Error) -> ServiceDeskError {
    if let sqlx::Error::Database(db) = &e
        && db.code().as_deref() == Some(FOREIGN_KEY_VIOLATION)
    {
        return ServiceDeskError::Conflict(format!("{}: {}", context, db.message()));
    }
    map_db_error(context, e)
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(name)
        .map_err(|e| ServiceDeskError::Storage(anyhow!("Failed to read column {}: {}", name, e)))
}

fn address_from_row(row: &PgRow) -> Result<Address> {
    Ok(Address {
        id: AddressId(column(row, "id")?),
        full_address: column(row, "full_address")?,
    })
}

fn employee_from_row(row: &PgRow) -> Result<Employee> {
    Ok(Employee {
        id: EmployeeId(column(row, "id")?),
        last_name: column(row, "last_name")?,
        first_name: column(row, "first_name")?,
        middle_name: column(row, "middle_name")?,
    })
}

fn request_from_row(row: &PgRow) -> Result<Request> {
    let status: String = column(row, "status")?;
    let status = status
        .parse::<RequestStatus>()
        .map_err(|e| ServiceDeskError::Storage(anyhow!(e)))?;
    let employee_id: Option<i64> = column(row, "employee_id")?;

    Ok(Request {
        id: RequestId(column(row, "id")?),
        address_id: AddressId(column(row, "address_id")?),
        applicant_name: column(row, "applicant_name")?,
        applicant_phone: column(row, "applicant_phone")?,
        problem_description: column(row, "problem_description")?,
        employee_id: employee_id.map(EmployeeId),
        status,
        created_at: column(row, "created_at")?,
        completed_at: column(row, "completed_at")?,
    })
}

#[async_trait]
impl<P: PoolProvider> Storage for PostgresStorage<P> {
    #[tracing::instrument(skip(self), fields(address_id = %id))]
    async fn get_address(&self, id: AddressId) -> Result<Address> {
        let row = sqlx::query("SELECT id, full_address FROM addresses WHERE id = $1")
            .bind(*id)
            .fetch_optional(self.pools.read())
            .await
            .map_err(|e| map_db_error("Failed to fetch address", e))?
            .ok_or(ServiceDeskError::AddressNotFound(id))?;

        address_from_row(&row)
    }

    #[tracing::instrument(skip(self), fields(employee_id = %id))]
    async fn get_employee(&self, id: EmployeeId) -> Result<Employee> {
        let row = sqlx::query(
            "SELECT id, last_name, first_name, middle_name FROM employees WHERE id = $1",
        )
        .bind(*id)
        .fetch_optional(self.pools.read())
        .await
        .map_err(|e| map_db_error("Failed to fetch employee", e))?
        .ok_or(ServiceDeskError::EmployeeNotFound(id))?;

        employee_from_row(&row)
    }

    async fn list_addresses(&self) -> Result<Vec<Address>> {
        let rows = sqlx::query("SELECT id, full_address FROM addresses ORDER BY id")
            .fetch_all(self.pools.read())
            .await
            .map_err(|e| map_db_error("Failed to list addresses", e))?;

        rows.iter().map(address_from_row).collect()
    }

    async fn list_employees(&self) -> Result<Vec<Employee>> {
        let rows = sqlx::query(
            "SELECT id, last_name, first_name, middle_name FROM employees ORDER BY id",
        )
        .fetch_all(self.pools.read())
        .await
        .map_err(|e| map_db_error("Failed to list employees", e))?;

        rows.iter().map(employee_from_row).collect()
    }

    #[tracing::instrument(skip(self), fields(request_id = %id))]
    async fn get_request(&self, id: RequestId) -> Result<Request> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM requests WHERE id = $1",
            REQUEST_COLUMNS
        ))
        .bind(*id)
        .fetch_optional(self.pools.read())
        .await
        .map_err(|e| map_db_error("Failed to fetch request", e))?
        .ok_or(ServiceDeskError::RequestNotFound(id))?;

        request_from_row(&row)
    }

    #[tracing::instrument(skip(self))]
    async fn list_requests(&self, filter: RequestFilter) -> Result<Vec<Request>> {
        // NULL parameters disable the corresponding restriction
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM requests
            WHERE ($1::BIGINT IS NULL OR employee_id = $1)
              AND ($2::BIGINT IS NULL OR address_id = $2)
            ORDER BY id
            "#,
            REQUEST_COLUMNS
        ))
        .bind(filter.employee_id.map(|id| id.0))
        .bind(filter.address_id.map(|id| id.0))
        .fetch_all(self.pools.read())
        .await
        .map_err(|e| map_db_error("Failed to list requests", e))?;

        rows.iter().map(request_from_row).collect()
    }

    #[tracing::instrument(skip(self, request), fields(address_id = %request.address_id))]
    async fn create_request(&self, request: NewRequest) -> Result<RequestId> {
        let row = sqlx::query(
            r#"
            INSERT INTO requests (
                address_id, applicant_name, applicant_phone, problem_description,
                employee_id, status, created_at, completed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(*request.address_id)
        .bind(&request.applicant_name)
        .bind(&request.applicant_phone)
        .bind(&request.problem_description)
        .bind(request.employee_id.map(|id| id.0))
        .bind(request.status.as_str())
        .bind(request.created_at)
        .bind(request.completed_at)
        .fetch_one(self.pools.write())
        .await
        .map_err(|e| {
            map_write_error(
                "Failed to create request",
                e,
                request.address_id,
                request.employee_id,
            )
        })?;

        Ok(RequestId(column(&row, "id")?))
    }

    #[tracing::instrument(skip(self, request), fields(request_id = %request.id))]
    async fn update_request(&self, request: &Request) -> Result<()> {
        // created_at is deliberately absent from the SET list
        let result = sqlx::query(
            r#"
            UPDATE requests
            SET
                address_id = $2,
                applicant_name = $3,
                applicant_phone = $4,
                problem_description = $5,
                employee_id = $6,
                status = $7,
                completed_at = $8
            WHERE id = $1
            "#,
        )
        .bind(*request.id)
        .bind(*request.address_id)
        .bind(&request.applicant_name)
        .bind(&request.applicant_phone)
        .bind(&request.problem_description)
        .bind(request.employee_id.map(|id| id.0))
        .bind(request.status.as_str())
        .bind(request.completed_at)
        .execute(self.pools.write())
        .await
        .map_err(|e| {
            map_write_error(
                "Failed to update request",
                e,
                request.address_id,
                request.employee_id,
            )
        })?;

        if result.rows_affected() == 0 {
            return Err(ServiceDeskError::RequestNotFound(request.id));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(request_id = %id))]
    async fn delete_request(&self, id: RequestId) -> Result<()> {
        let result = sqlx::query("DELETE FROM requests WHERE id = $1")
            .bind(*id)
            .execute(self.pools.write())
            .await
            .map_err(|e| map_delete_error("Failed to delete request", e))?;

        if result.rows_affected() == 0 {
            return Err(ServiceDeskError::RequestNotFound(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RequestInput;
    use crate::history::HistoryService;
    use crate::lifecycle::RequestManager;
    use std::sync::Arc;

    async fn seed(pool: &sqlx::PgPool) -> (AddressId, EmployeeId) {
        let address: i64 =
            sqlx::query_scalar("INSERT INTO addresses (full_address) VALUES ($1) RETURNING id")
                .bind("1 Lenina St, apt 5")
                .fetch_one(pool)
                .await
                .unwrap();
        let employee: i64 = sqlx::query_scalar(
            "INSERT INTO employees (last_name, first_name) VALUES ($1, $2) RETURNING id",
        )
        .bind("Petrov")
        .bind("Sergey")
        .fetch_one(pool)
        .await
        .unwrap();
        (AddressId(address), EmployeeId(employee))
    }

    fn input(address_id: AddressId) -> RequestInput {
        RequestInput {
            address_id: Some(address_id),
            applicant_name: "Ivanov".to_string(),
            problem_description: "Leak".to_string(),
            ..Default::default()
        }
    }

    #[sqlx::test]
    async fn test_lifecycle_round_trip(pool: sqlx::PgPool) {
        let (address_id, employee_id) = seed(&pool).await;
        let storage = Arc::new(PostgresStorage::new(TestDbPools::new(pool).await.unwrap()));
        let manager = RequestManager::new(storage.clone());

        let created = manager.create_request(input(address_id)).await.unwrap();
        assert_eq!(created.status, RequestStatus::Open);
        assert_eq!(created.completed_at, None);
        assert_eq!(storage.get_request(created.id).await.unwrap(), created);

        let closed = manager
            .update_request(
                created.id,
                RequestInput {
                    employee_id: Some(employee_id),
                    status: Some(RequestStatus::Closed),
                    ..input(address_id)
                },
            )
            .await
            .unwrap();
        assert!(closed.completed_at.is_some());
        assert_eq!(storage.get_request(created.id).await.unwrap(), closed);

        let history = HistoryService::new(storage.clone())
            .query_history(RequestFilter::by_address(address_id))
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].employee_name, "Petrov Sergey");
        assert_eq!(history[0].created_at, created.created_at);
    }

    #[sqlx::test]
    async fn test_reopened_request_matches_stored_row(pool: sqlx::PgPool) {
        let (address_id, _) = seed(&pool).await;
        let storage = Arc::new(PostgresStorage::new(pool));
        let manager = RequestManager::new(storage.clone());

        let created = manager
            .create_request(RequestInput {
                status: Some(RequestStatus::Closed),
                ..input(address_id)
            })
            .await
            .unwrap();
        assert_eq!(created.completed_at, Some(created.created_at));
        assert_eq!(storage.get_request(created.id).await.unwrap(), created);

        let reopened = manager
            .update_request(
                created.id,
                RequestInput {
                    status: Some(RequestStatus::InProgress),
                    ..input(address_id)
                },
            )
            .await
            .unwrap();
        assert_eq!(reopened.completed_at, None);
        assert_eq!(reopened.created_at, created.created_at);
        assert_eq!(storage.get_request(created.id).await.unwrap(), reopened);
    }

    #[sqlx::test]
    async fn test_unknown_references_are_not_found(pool: sqlx::PgPool) {
        let (address_id, employee_id) = seed(&pool).await;
        let storage = PostgresStorage::new(pool);
        let now = chrono::Utc::now();

        let err = storage
            .create_request(NewRequest {
                address_id: AddressId(99),
                applicant_name: "Ivanov".to_string(),
                applicant_phone: None,
                problem_description: "Leak".to_string(),
                employee_id: None,
                status: RequestStatus::Open,
                created_at: now,
                completed_at: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceDeskError::AddressNotFound(AddressId(99))));

        let err = storage
            .create_request(NewRequest {
                address_id,
                applicant_name: "Ivanov".to_string(),
                applicant_phone: None,
                problem_description: "Leak".to_string(),
                employee_id: Some(EmployeeId(99)),
                status: RequestStatus::Open,
                created_at: now,
                completed_at: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceDeskError::EmployeeNotFound(EmployeeId(99))));

        let id = storage
            .create_request(NewRequest {
                address_id,
                applicant_name: "Ivanov".to_string(),
                applicant_phone: None,
                problem_description: "Leak".to_string(),
                employee_id: Some(employee_id),
                status: RequestStatus::Open,
                created_at: now,
                completed_at: None,
            })
            .await
            .unwrap();
        let mut request = storage.get_request(id).await.unwrap();

        request.employee_id = Some(EmployeeId(99));
        let err = storage.update_request(&request).await.unwrap_err();
        assert!(matches!(err, ServiceDeskError::EmployeeNotFound(EmployeeId(99))));

        request.employee_id = Some(employee_id);
        request.address_id = AddressId(99);
        let err = storage.update_request(&request).await.unwrap_err();
        assert!(matches!(err, ServiceDeskError::AddressNotFound(AddressId(99))));

        let stored = storage.get_request(id).await.unwrap();
        assert_eq!(stored.address_id, address_id);
        assert_eq!(stored.employee_id, Some(employee_id));
    }

    #[sqlx::test]
    async fn test_missing_rows_are_not_found(pool: sqlx::PgPool) {
        let storage = PostgresStorage::new(pool);

        assert!(matches!(
            storage.get_request(RequestId(404)).await,
            Err(ServiceDeskError::RequestNotFound(_))
        ));
        assert!(matches!(
            storage.delete_request(RequestId(404)).await,
            Err(ServiceDeskError::RequestNotFound(_))
        ));
        assert!(matches!(
            storage.get_address(AddressId(404)).await,
            Err(ServiceDeskError::AddressNotFound(_))
        ));
    }

    #[sqlx::test]
    async fn test_delete_referenced_request_conflicts(pool: sqlx::PgPool) {
        let (address_id, _) = seed(&pool).await;
        let storage = PostgresStorage::new(pool.clone());
        let manager = RequestManager::new(Arc::new(PostgresStorage::new(pool.clone())));
        let created = manager.create_request(input(address_id)).await.unwrap();

        sqlx::query("CREATE TABLE work_orders (request_id BIGINT REFERENCES requests (id))")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO work_orders (request_id) VALUES ($1)")
            .bind(*created.id)
            .execute(&pool)
            .await
            .unwrap();

        let err = storage.delete_request(created.id).await.unwrap_err();
        assert!(matches!(err, ServiceDeskError::Conflict(_)));
        assert!(storage.get_request(created.id).await.is_ok());
    }
}
