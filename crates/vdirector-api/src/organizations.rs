// Organization listing
//
// `GET nextgen/organization` returns far richer records than callers need;
// only identity, parent and subscription plan are projected.

use serde::Deserialize;
use tracing::debug;

use crate::client::{DirectorClient, decode};
use crate::error::Error;

/// Page size requested from listing endpoints. Only the first page is read.
pub const PAGE_LIMIT: u32 = 10;

/// Projection of a Director organization record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrganizationSummary {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default, rename = "subscriptionPlan")]
    pub subscription_plan: String,
}

impl DirectorClient {
    /// List organizations (first page only).
    ///
    /// `GET nextgen/organization?limit=10&offset=0&uuidOnly=false`
    pub async fn list_organizations(&self) -> Result<Vec<OrganizationSummary>, Error> {
        let url = self.endpoint(&["nextgen", "organization"])?;
        let limit = PAGE_LIMIT.to_string();
        debug!("listing organizations");
        let body = self
            .get(
                url,
                &[
                    ("limit", limit.as_str()),
                    ("offset", "0"),
                    ("uuidOnly", "false"),
                ],
            )
            .await?;
        decode(&body)
    }
}
