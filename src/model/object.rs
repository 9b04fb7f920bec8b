//! Object data as returned by object, navigation, and discovery calls.

// self
use crate::{
	_prelude::*,
	error::ParseError,
	links::LinkRelations,
	model::{Acl, AllowableActions, ChangeEventInfo, Properties, Rendition, property_ids},
};

/// CMIS base object types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaseType {
	/// `cmis:document`.
	#[serde(rename = "cmis:document")]
	Document,
	/// `cmis:folder`.
	#[serde(rename = "cmis:folder")]
	Folder,
	/// `cmis:relationship`.
	#[serde(rename = "cmis:relationship")]
	Relationship,
	/// `cmis:policy`.
	#[serde(rename = "cmis:policy")]
	Policy,
	/// `cmis:item`.
	#[serde(rename = "cmis:item")]
	Item,
	/// `cmis:secondary`.
	#[serde(rename = "cmis:secondary")]
	Secondary,
}
impl BaseType {
	/// Returns the base type identifier.
	pub const fn type_id(self) -> &'static str {
		match self {
			BaseType::Document => "cmis:document",
			BaseType::Folder => "cmis:folder",
			BaseType::Relationship => "cmis:relationship",
			BaseType::Policy => "cmis:policy",
			BaseType::Item => "cmis:item",
			BaseType::Secondary => "cmis:secondary",
		}
	}
}
impl FromStr for BaseType {
	type Err = ParseError;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s {
			"cmis:document" => Ok(BaseType::Document),
			"cmis:folder" => Ok(BaseType::Folder),
			"cmis:relationship" => Ok(BaseType::Relationship),
			"cmis:policy" => Ok(BaseType::Policy),
			"cmis:item" => Ok(BaseType::Item),
			"cmis:secondary" => Ok(BaseType::Secondary),
			other => Err(ParseError::new(format!("unknown base type `{other}`"))),
		}
	}
}
impl Display for BaseType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.type_id())
	}
}

/// Parsed repository object.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectData {
	/// Object identifier; always present.
	pub id: String,
	/// Base type, when the repository reported `cmis:baseTypeId`.
	pub base_type: Option<BaseType>,
	/// Properties in repository order.
	pub properties: Properties,
	/// Hypermedia links (AtomPub only).
	pub links: LinkRelations,
	/// Content stream location, when the object has one.
	pub content_url: Option<Url>,
	/// Allowable actions, when requested.
	pub allowable_actions: Option<AllowableActions>,
	/// ACL, when requested.
	pub acl: Option<Acl>,
	/// Renditions, when requested.
	pub renditions: Vec<Rendition>,
	/// Relationship objects, when requested.
	pub relationships: Vec<ObjectData>,
	/// Change information, present on change-log entries.
	pub change_event_info: Option<ChangeEventInfo>,
	/// Applied policy identifiers, when requested.
	pub policy_ids: Vec<String>,
	/// Path segment relative to the parent folder, on children listings.
	pub path_segment: Option<String>,
}
impl ObjectData {
	/// Builds object data from its properties, requiring `cmis:objectId`.
	pub fn from_properties(properties: Properties) -> std::result::Result<Self, ParseError> {
		let id = properties
			.text(property_ids::OBJECT_ID)
			.ok_or_else(|| ParseError::missing(property_ids::OBJECT_ID))?
			.to_owned();
		let base_type =
			properties.text(property_ids::BASE_TYPE_ID).map(BaseType::from_str).transpose()?;

		Ok(Self {
			id,
			base_type,
			properties,
			links: LinkRelations::default(),
			content_url: None,
			allowable_actions: None,
			acl: None,
			renditions: Vec::new(),
			relationships: Vec::new(),
			change_event_info: None,
			policy_ids: Vec::new(),
			path_segment: None,
		})
	}

	/// Object name (`cmis:name`).
	pub fn name(&self) -> Option<&str> {
		self.properties.text(property_ids::NAME)
	}

	/// Object type identifier (`cmis:objectTypeId`).
	pub fn object_type_id(&self) -> Option<&str> {
		self.properties.text(property_ids::OBJECT_TYPE_ID)
	}

	/// Change token used for optimistic locking (`cmis:changeToken`).
	pub fn change_token(&self) -> Option<&str> {
		self.properties.text(property_ids::CHANGE_TOKEN)
	}

	/// Whether the attached ACL is exact, when both ACL and flag were reported.
	pub fn is_exact_acl(&self) -> Option<bool> {
		self.acl.as_ref().and_then(|acl| acl.is_exact)
	}
}

/// Objects a tree deletion could not remove.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FailedToDelete {
	/// Identifiers of the objects left behind.
	pub ids: Vec<String>,
}
impl FailedToDelete {
	/// Returns `true` when every object was removed.
	pub fn is_empty(&self) -> bool {
		self.ids.is_empty()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::model::PropertyData;

	#[test]
	fn object_requires_object_id() {
		let err = ObjectData::from_properties(
			Properties::new().with(PropertyData::single(property_ids::NAME, "orphan")),
		)
		.expect_err("Objects without cmis:objectId must be rejected.");

		assert_eq!(err.path.as_deref(), Some(property_ids::OBJECT_ID));
	}

	#[test]
	fn base_type_is_read_from_properties() {
		let object = ObjectData::from_properties(
			Properties::new()
				.with(PropertyData::single(property_ids::OBJECT_ID, "folder-1"))
				.with(PropertyData::single(property_ids::BASE_TYPE_ID, "cmis:folder")),
		)
		.expect("Folder properties should build object data.");

		assert_eq!(object.base_type, Some(BaseType::Folder));
		assert_eq!(object.is_exact_acl(), None);
	}
}
