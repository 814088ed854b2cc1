// Address object endpoints
//
// Address objects live under a device + organization scope:
// `api/config/devices/device/{device}/config/orgs/org-services/{org}/objects/addresses`.
// Creation accepts the whole list in one POST. Updates and deletes only
// exist per named item, so those walk the list one request at a time.

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, trace};
use url::Url;

use crate::client::{DirectorClient, decode};
use crate::error::Error;

/// A named address object. `name` is the natural key within a scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressObject {
    pub name: String,
    /// An empty string on the wire is the same as no value, so blank
    /// values are never sent.
    #[serde(
        default,
        skip_serializing_if = "is_blank",
        deserialize_with = "empty_as_none"
    )]
    pub fqdn: Option<String>,
}

impl AddressObject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fqdn: None,
        }
    }

    /// An empty `fqdn` is stored as `None`.
    pub fn with_fqdn(name: impl Into<String>, fqdn: impl Into<String>) -> Self {
        let fqdn = fqdn.into();
        Self {
            name: name.into(),
            fqdn: (!fqdn.is_empty()).then_some(fqdn),
        }
    }
}

#[allow(clippy::ref_option)]
fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(str::is_empty)
}

fn empty_as_none<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(de)?;
    Ok(value.filter(|s| !s.is_empty()))
}

/// Address objects scoped to one device and organization.
///
/// The scope never travels in the body; it is encoded in the URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressCollection {
    pub device_name: String,
    pub organization_name: String,
    pub items: Vec<AddressObject>,
}

impl AddressCollection {
    pub fn new(
        device_name: impl Into<String>,
        organization_name: impl Into<String>,
        items: Vec<AddressObject>,
    ) -> Self {
        Self {
            device_name: device_name.into(),
            organization_name: organization_name.into(),
            items,
        }
    }

    /// Wire envelope for the whole collection.
    pub fn envelope(&self) -> AddressEnvelope<'_> {
        AddressEnvelope {
            address: &self.items,
        }
    }

    fn ensure_not_empty(&self, op: &str) -> Result<(), Error> {
        if self.items.is_empty() {
            return Err(Error::Validation {
                message: format!(
                    "address {op} for device '{}' organization '{}' needs at least one address",
                    self.device_name, self.organization_name
                ),
            });
        }
        Ok(())
    }
}

/// `{"address": [...]}` as sent to the Director.
#[derive(Debug, Serialize)]
pub struct AddressEnvelope<'a> {
    pub address: &'a [AddressObject],
}

/// `{"address": [...]}` as returned by the Director.
#[derive(Debug, Default, Deserialize)]
pub struct AddressList {
    #[serde(default)]
    pub address: Vec<AddressObject>,
}

impl DirectorClient {
    fn addresses_url(&self, device: &str, organization: &str) -> Result<Url, Error> {
        self.endpoint(&[
            "api",
            "config",
            "devices",
            "device",
            device,
            "config",
            "orgs",
            "org-services",
            organization,
            "objects",
            "addresses",
        ])
    }

    fn address_item_url(
        &self,
        device: &str,
        organization: &str,
        name: Option<&str>,
    ) -> Result<Url, Error> {
        let mut url = self.addresses_url(device, organization)?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| Error::InvalidBaseUrl(self.base_url().to_string()))?;
            segments.push("address");
            if let Some(name) = name {
                segments.push(name);
            }
        }
        Ok(url)
    }

    /// Fetch every address object in a scope.
    ///
    /// `GET .../objects/addresses/address`
    pub async fn fetch_addresses(
        &self,
        device: &str,
        organization: &str,
    ) -> Result<AddressCollection, Error> {
        let url = self.address_item_url(device, organization, None)?;
        debug!(device, organization, "fetching addresses");
        let body = self.get(url, &[]).await?;
        let list: AddressList = decode(&body)?;
        Ok(AddressCollection::new(device, organization, list.address))
    }

    /// Create all addresses of the collection in a single request.
    ///
    /// `POST .../objects/addresses` with `{"address": [...]}`
    pub async fn create_addresses(&self, collection: &AddressCollection) -> Result<(), Error> {
        collection.ensure_not_empty("create")?;
        let url = self.addresses_url(&collection.device_name, &collection.organization_name)?;
        debug!(
            device = %collection.device_name,
            organization = %collection.organization_name,
            count = collection.items.len(),
            "creating addresses"
        );
        for (idx, item) in collection.items.iter().enumerate() {
            trace!(idx, name = %item.name, fqdn = ?item.fqdn, "address");
        }
        self.post(url, &[], &collection.envelope()).await?;
        Ok(())
    }

    /// Update addresses one by one, in order.
    ///
    /// `PUT .../objects/addresses/address/{name}` with `{"address": [item]}`.
    /// Stops at the first failure; earlier items stay applied.
    pub async fn update_addresses(&self, collection: &AddressCollection) -> Result<(), Error> {
        collection.ensure_not_empty("update")?;
        debug!(
            device = %collection.device_name,
            organization = %collection.organization_name,
            count = collection.items.len(),
            "updating addresses"
        );
        for item in &collection.items {
            let url = self.address_item_url(
                &collection.device_name,
                &collection.organization_name,
                Some(&item.name),
            )?;
            trace!(name = %item.name, fqdn = ?item.fqdn, "updating address");
            let envelope = AddressEnvelope {
                address: std::slice::from_ref(item),
            };
            self.put(url, &[], &envelope).await?;
        }
        Ok(())
    }

    /// Delete addresses one by one, in order.
    ///
    /// `DELETE .../objects/addresses/address/{name}` with `{"address": [item]}`.
    /// Stops at the first failure; earlier items stay deleted.
    pub async fn delete_addresses(&self, collection: &AddressCollection) -> Result<(), Error> {
        collection.ensure_not_empty("delete")?;
        debug!(
            device = %collection.device_name,
            organization = %collection.organization_name,
            count = collection.items.len(),
            "deleting addresses"
        );
        for item in &collection.items {
            let url = self.address_item_url(
                &collection.device_name,
                &collection.organization_name,
                Some(&item.name),
            )?;
            trace!(name = %item.name, "deleting address");
            let envelope = AddressEnvelope {
                address: std::slice::from_ref(item),
            };
            self.delete(url, &[], &envelope).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn envelope_wire_shape() {
        let collection = AddressCollection::new(
            "Branch-1",
            "ACME",
            vec![
                AddressObject::with_fqdn("web", "www.example.com"),
                AddressObject::new("lan"),
            ],
        );
        insta::assert_json_snapshot!(collection.envelope(), @r#"
        {
          "address": [
            {
              "name": "web",
              "fqdn": "www.example.com"
            },
            {
              "name": "lan"
            }
          ]
        }
        "#);
    }

    #[test]
    fn envelope_decodes_back_to_same_items() {
        let items = vec![
            AddressObject::with_fqdn("web", "www.example.com"),
            AddressObject::new("lan"),
            AddressObject::with_fqdn("blank", ""),
        ];
        let collection = AddressCollection::new("Branch-1", "ACME", items.clone());
        let raw = serde_json::to_vec(&collection.envelope()).unwrap();
        let decoded: AddressList = serde_json::from_slice(&raw).unwrap();
        assert_eq!(decoded.address, items);
    }

    #[test]
    fn absent_and_empty_fqdn_decode_the_same() {
        let absent: AddressObject = serde_json::from_str(r#"{"name":"a"}"#).unwrap();
        let empty: AddressObject = serde_json::from_str(r#"{"name":"a","fqdn":""}"#).unwrap();
        let null: AddressObject = serde_json::from_str(r#"{"name":"a","fqdn":null}"#).unwrap();
        assert_eq!(absent, empty);
        assert_eq!(absent, null);
        assert_eq!(absent.fqdn, None);
    }

    #[test]
    fn blank_fqdn_is_never_sent() {
        let built = AddressObject {
            name: "a".into(),
            fqdn: Some(String::new()),
        };
        assert_eq!(serde_json::to_string(&built).unwrap(), r#"{"name":"a"}"#);
        assert_eq!(AddressObject::with_fqdn("a", ""), AddressObject::new("a"));
    }

    #[test]
    fn missing_address_key_is_empty_list() {
        let list: AddressList = serde_json::from_str("{}").unwrap();
        assert!(list.address.is_empty());
    }

    #[test]
    fn empty_collection_fails_validation() {
        let collection = AddressCollection::new("Branch-1", "ACME", Vec::new());
        let err = collection.ensure_not_empty("create").unwrap_err();
        assert!(matches!(err, Error::Validation { .. }), "{err:?}");
    }
}
