//! Repository descriptions and AtomPub endpoint registries.

// self
use crate::{_prelude::*, links::LinkRelations};

/// AtomPub collection kinds (`cmisra:collectionType`).
pub mod collection {
	/// Root folder children.
	pub const ROOT: &str = "root";
	/// Type children.
	pub const TYPES: &str = "types";
	/// Query endpoint.
	pub const QUERY: &str = "query";
	/// Checked-out documents.
	pub const CHECKED_OUT: &str = "checkedout";
	/// Unfiled objects.
	pub const UNFILED: &str = "unfiled";
}

/// AtomPub URI template kinds (`cmisra:type`).
pub mod template {
	/// Object by id.
	pub const OBJECT_BY_ID: &str = "objectbyid";
	/// Object by path.
	pub const OBJECT_BY_PATH: &str = "objectbypath";
	/// Type by id.
	pub const TYPE_BY_ID: &str = "typebyid";
	/// Query.
	pub const QUERY: &str = "query";
}

/// AtomPub service-document endpoints for one repository.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AtomPubEndpoints {
	/// Collection URLs keyed by collection type.
	pub collections: BTreeMap<String, Url>,
	/// URI templates keyed by template type.
	pub uri_templates: BTreeMap<String, String>,
	/// Workspace-level links (changes, type descendants, ...).
	pub links: LinkRelations,
}

/// Description of one repository.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RepositoryInfo {
	/// Repository identifier.
	pub id: String,
	/// Display name.
	pub name: Option<String>,
	/// Description.
	pub description: Option<String>,
	/// Vendor name.
	pub vendor_name: Option<String>,
	/// Product name.
	pub product_name: Option<String>,
	/// Product version.
	pub product_version: Option<String>,
	/// Root folder identifier.
	pub root_folder_id: Option<String>,
	/// Capability flags keyed by their wire names (`capabilityACL`, ...).
	pub capabilities: BTreeMap<String, String>,
	/// Supported CMIS version.
	pub cmis_version_supported: Option<String>,
	/// Anonymous principal id.
	pub principal_id_anonymous: Option<String>,
	/// "Anyone" principal id.
	pub principal_id_anyone: Option<String>,
	/// Latest change-log token at the time of the call.
	pub latest_change_log_token: Option<String>,
	/// Browser-binding repository URL.
	pub repository_url: Option<Url>,
	/// Browser-binding root folder URL.
	pub root_folder_url: Option<Url>,
	/// AtomPub endpoints.
	pub endpoints: AtomPubEndpoints,
}
impl RepositoryInfo {
	/// Returns a capability value by its wire name.
	pub fn capability(&self, name: &str) -> Option<&str> {
		self.capabilities.get(name).map(String::as_str)
	}
}
