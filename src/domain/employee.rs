//! Employee reference data.

use serde::{Deserialize, Serialize};

/// Unique identifier for an employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(transparent))]
pub struct EmployeeId(pub i64);

impl From<i64> for EmployeeId {
    fn from(id: i64) -> Self {
        EmployeeId(id)
    }
}

impl std::ops::Deref for EmployeeId {
    type Target = i64;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An employee who can be assigned to requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub last_name: String,
    pub first_name: String,
    pub middle_name: Option<String>,
}

impl Employee {
    /// "Last First", as shown in history rows.
    pub fn short_name(&self) -> String {
        format!("{} {}", self.last_name, self.first_name)
    }

    /// "Last First Middle", as shown in filter pickers. A missing middle
    /// name leaves no trailing space.
    pub fn full_name(&self) -> String {
        format!(
            "{} {} {}",
            self.last_name,
            self.first_name,
            self.middle_name.as_deref().unwrap_or("")
        )
        .trim()
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee(middle: Option<&str>) -> Employee {
        Employee {
            id: EmployeeId(1),
            last_name: "Petrov".to_string(),
            first_name: "Sergey".to_string(),
            middle_name: middle.map(str::to_string),
        }
    }

    #[test]
    fn test_names() {
        let e = employee(Some("Ivanovich"));
        assert_eq!(e.short_name(), "Petrov Sergey");
        assert_eq!(e.full_name(), "Petrov Sergey Ivanovich");

        let e = employee(None);
        assert_eq!(e.full_name(), "Petrov Sergey");
    }
}
