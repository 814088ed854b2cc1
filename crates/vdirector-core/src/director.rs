// ── Address object lifecycle ──
//
// `Director` drives the declarative lifecycle (read, create, update,
// delete) of address objects against one connected Director. Every call is
// sequential and awaits its requests in order. State is never persisted
// here; callers own the `AddressesState` values they pass in.

use tracing::{debug, info, warn};
use vdirector_api::{ApplianceListing, DirectorClient, OrganizationSummary, TokenCache};

use crate::config::DirectorConfig;
use crate::error::CoreError;
use crate::model::{AddressesState, Scope};
use crate::reconcile::{merge_by_name, write_set};

/// A connected Director with an authenticated client.
pub struct Director {
    client: DirectorClient,
}

impl Director {
    /// Build the HTTP client and obtain a token (cached or fresh).
    pub async fn connect(config: DirectorConfig) -> Result<Self, CoreError> {
        let transport = config.transport();
        let cache = config.token_cache.map(TokenCache::new);
        let client = match config.base_url {
            Some(base_url) => {
                DirectorClient::connect_to(base_url, config.credential, &transport, cache).await?
            }
            None => DirectorClient::connect(config.credential, &transport, cache).await?,
        };
        info!(base_url = %client.base_url(), "connected to director");
        Ok(Self { client })
    }

    /// Wrap an already-built client.
    pub fn from_client(client: DirectorClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &DirectorClient {
        &self.client
    }

    // ── Address lifecycle ────────────────────────────────────────────

    /// Fetch the remote address list of a scope into fresh state.
    ///
    /// The list is taken as-is, in remote order.
    pub async fn read_addresses(&self, scope: &Scope) -> Result<AddressesState, CoreError> {
        scope.validate()?;
        let collection = self
            .client
            .fetch_addresses(&scope.device, &scope.organization)
            .await?;
        let mut state = AddressesState::new(scope.clone(), collection.items);
        state.touch();
        debug!(scope = %state.id, count = state.addresses.len(), "addresses read");
        Ok(state)
    }

    /// Refresh `state` from the remote list.
    ///
    /// Bookkeeping is stamped before the fetch. On failure the address list
    /// is left exactly as it was and the error is returned.
    pub async fn refresh_addresses(&self, state: &mut AddressesState) -> Result<(), CoreError> {
        state.scope.validate()?;
        state.touch();

        let remote = match self.read_addresses(&state.scope).await {
            Ok(remote) => remote,
            Err(e) => {
                warn!(scope = %state.id, error = %e, "address refresh failed");
                return Err(e);
            }
        };

        debug!(
            scope = %state.id,
            local = state.addresses.len(),
            remote = remote.addresses.len(),
            "merging remote addresses"
        );
        merge_by_name(&mut state.addresses, remote.addresses);
        Ok(())
    }

    /// Create every address in `plan` with one request.
    ///
    /// Returns the plan stamped with fresh bookkeeping.
    pub async fn create_addresses(
        &self,
        mut plan: AddressesState,
    ) -> Result<AddressesState, CoreError> {
        plan.scope.validate()?;
        self.client.create_addresses(&write_set(&plan)).await?;
        plan.touch();
        debug!(scope = %plan.id, count = plan.addresses.len(), "addresses created");
        Ok(plan)
    }

    /// Update every address in `plan`, one request per address.
    ///
    /// Stops at the first failure. Items before it stay applied remotely.
    pub async fn update_addresses(
        &self,
        mut plan: AddressesState,
    ) -> Result<AddressesState, CoreError> {
        plan.scope.validate()?;
        self.client.update_addresses(&write_set(&plan)).await?;
        plan.touch();
        debug!(scope = %plan.id, count = plan.addresses.len(), "addresses updated");
        Ok(plan)
    }

    /// Delete every address in `state`, one request per address.
    pub async fn delete_addresses(&self, state: &AddressesState) -> Result<(), CoreError> {
        state.scope.validate()?;
        self.client.delete_addresses(&write_set(state)).await?;
        debug!(
            scope = %state.scope.id(),
            count = state.addresses.len(),
            "addresses deleted"
        );
        Ok(())
    }

    // ── Listings ─────────────────────────────────────────────────────

    pub async fn list_organizations(&self) -> Result<Vec<OrganizationSummary>, CoreError> {
        Ok(self.client.list_organizations().await?)
    }

    pub async fn list_appliances(&self) -> Result<ApplianceListing, CoreError> {
        Ok(self.client.list_appliances().await?)
    }
}
