//! Configuration for the service desk views.

use serde::{Deserialize, Serialize};

/// Display settings shared by the request and history views.
///
/// Every field has a default, so a partial document deserializes cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceDeskConfig {
    /// Shown when a request's address cannot be resolved
    pub missing_address_label: String,

    /// Shown when a request has no employee assigned
    pub unassigned_label: String,

    /// First entry of the employee picker in the history view
    pub all_employees_label: String,

    /// First entry of the address picker in the history view
    pub all_addresses_label: String,
}

impl Default for ServiceDeskConfig {
    fn default() -> Self {
        Self {
            missing_address_label: "Not specified".to_string(),
            unassigned_label: "Unassigned".to_string(),
            all_employees_label: "All employees".to_string(),
            all_addresses_label: "All addresses".to_string(),
        }
    }
}
