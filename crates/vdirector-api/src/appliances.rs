// Appliance listing
//
// `GET vnms/appliance/appliance` returns a page of appliances plus the total
// count across all pages. Hardware, software-pack and alarm details are
// dropped; only identity and status fields are surfaced.

use serde::Deserialize;
use tracing::debug;

use crate::client::{DirectorClient, decode};
use crate::error::Error;
use crate::organizations::PAGE_LIMIT;

/// Projection of a Director appliance record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApplianceSummary {
    #[serde(default)]
    pub uuid: String,
    pub name: String,
    #[serde(default, rename = "ping-status")]
    pub ping_status: String,
    #[serde(default, rename = "sync-status")]
    pub sync_status: String,
    #[serde(default, rename = "services-status")]
    pub services_status: String,
    #[serde(default, rename = "overall-status")]
    pub overall_status: String,
}

/// One page of appliances.
///
/// `total_count` is the server-side total and may exceed
/// `appliances.len()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApplianceListing {
    #[serde(default, rename = "totalCount")]
    pub total_count: u64,
    #[serde(default)]
    pub appliances: Vec<ApplianceSummary>,
}

impl DirectorClient {
    /// List appliances (first page only).
    ///
    /// `GET vnms/appliance/appliance?limit=10&offset=0`
    pub async fn list_appliances(&self) -> Result<ApplianceListing, Error> {
        let url = self.endpoint(&["vnms", "appliance", "appliance"])?;
        let limit = PAGE_LIMIT.to_string();
        debug!("listing appliances");
        let body = self
            .get(url, &[("limit", limit.as_str()), ("offset", "0")])
            .await?;
        let listing: ApplianceListing = decode(&body)?;
        debug!(
            total = listing.total_count,
            returned = listing.appliances.len(),
            "appliances listed"
        );
        Ok(listing)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn total_count_may_exceed_page() {
        let raw = r#"{
            "totalCount": 42,
            "appliances": [{
                "name": "Branch-1",
                "uuid": "b1",
                "ping-status": "REACHABLE",
                "sync-status": "IN_SYNC",
                "services-status": "GOOD",
                "overall-status": "POWERED_ON",
                "Hardware": {"model": "CSG350", "cpuCores": 4},
                "SPack": {"spackVersion": "1234"}
            }]
        }"#;
        let listing: ApplianceListing = serde_json::from_str(raw).unwrap();
        assert_eq!(listing.total_count, 42);
        assert_eq!(listing.appliances.len(), 1);
        let branch = &listing.appliances[0];
        assert_eq!(branch.name, "Branch-1");
        assert_eq!(branch.services_status, "GOOD");
        assert_eq!(branch.overall_status, "POWERED_ON");
        assert_eq!(branch.sync_status, "IN_SYNC");
    }
}
