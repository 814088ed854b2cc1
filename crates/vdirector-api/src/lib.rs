// vdirector-api: Async Rust client for the Versa Director REST API

pub mod addresses;
pub mod appliances;
pub mod auth;
pub mod client;
pub mod error;
pub mod organizations;
pub mod transport;

pub use addresses::{AddressCollection, AddressObject};
pub use appliances::{ApplianceListing, ApplianceSummary};
pub use auth::{Credential, CredentialStore, Token, TokenCache, TokenState};
pub use client::DirectorClient;
pub use error::Error;
pub use organizations::OrganizationSummary;
pub use transport::{TlsMode, TransportConfig};
