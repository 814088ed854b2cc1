//! Declarative lifecycle for Versa Director address objects.
//!
//! Sits between `vdirector-api` and whatever host drives the lifecycle
//! (a provisioning engine, a CLI, tests):
//!
//! - **[`Director`]** connects with a [`DirectorConfig`] and exposes
//!   read / refresh / create / update / delete for address objects plus
//!   the organization and appliance listings.
//! - **[`AddressesState`]** is the declarative state of one [`Scope`]
//!   (device + organization).
//! - **[`reconcile`]** merges remote lists into local state by name.

pub mod config;
pub mod director;
pub mod error;
pub mod model;
pub mod reconcile;

pub use config::{DirectorConfig, TlsVerification};
pub use director::Director;
pub use error::CoreError;
pub use model::{AddressesState, Scope};
pub use reconcile::{merge_by_name, reconcile_read, write_set};

pub use vdirector_api::{
    AddressObject, ApplianceListing, ApplianceSummary, Credential, OrganizationSummary,
};
