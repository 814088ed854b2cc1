// ── Declarative state types ──
//
// The shapes a declarative engine stores for address objects. The remote
// Director is the system of record; these are rebuilt from the plan or from
// a fetch on every lifecycle call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vdirector_api::{AddressCollection, AddressObject};

use crate::error::CoreError;

/// The device + organization pair every address operation is confined to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    pub device: String,
    pub organization: String,
}

impl Scope {
    pub fn new(
        device: impl Into<String>,
        organization: impl Into<String>,
    ) -> Result<Self, CoreError> {
        let scope = Self {
            device: device.into(),
            organization: organization.into(),
        };
        scope.validate()?;
        Ok(scope)
    }

    /// Reject empty scope values before anything is sent.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.device.trim().is_empty() {
            return Err(CoreError::Config {
                message: "device name is missing or empty".into(),
            });
        }
        if self.organization.trim().is_empty() {
            return Err(CoreError::Config {
                message: "organization name is missing or empty".into(),
            });
        }
        Ok(())
    }

    /// Stable identifier for state keyed by this scope.
    pub fn id(&self) -> String {
        format!("{}/{}", self.device, self.organization)
    }
}

/// Declarative state of the address objects in one scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressesState {
    /// Bookkeeping identifier, restamped on every lifecycle call.
    pub id: String,
    pub scope: Scope,
    /// Bookkeeping timestamp, restamped on every lifecycle call.
    pub last_updated: Option<DateTime<Utc>>,
    pub addresses: Vec<AddressObject>,
}

impl AddressesState {
    pub fn new(scope: Scope, addresses: Vec<AddressObject>) -> Self {
        Self {
            id: String::new(),
            scope,
            last_updated: None,
            addresses,
        }
    }

    pub fn to_collection(&self) -> AddressCollection {
        AddressCollection::new(
            self.scope.device.clone(),
            self.scope.organization.clone(),
            self.addresses.clone(),
        )
    }

    pub(crate) fn touch(&mut self) {
        self.id = self.scope.id();
        self.last_updated = Some(Utc::now());
    }
}
