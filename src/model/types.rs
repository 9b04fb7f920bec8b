//! Type definitions and their property definitions.

// self
use crate::{
	_prelude::*,
	model::{BaseType, Cardinality, PropertyType, Updatability},
};

/// Definition of one property within a type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyDefinition {
	/// Property identifier.
	pub id: String,
	/// Local name.
	pub local_name: Option<String>,
	/// Display name.
	pub display_name: Option<String>,
	/// Query name.
	pub query_name: Option<String>,
	/// Description.
	pub description: Option<String>,
	/// Value type.
	pub property_type: PropertyType,
	/// Cardinality.
	pub cardinality: Cardinality,
	/// Updatability.
	pub updatability: Updatability,
	/// Whether the definition is inherited from a parent type.
	pub inherited: bool,
	/// Whether a value is required.
	pub required: bool,
	/// Whether the property is queryable.
	pub queryable: bool,
	/// Whether the property is orderable.
	pub orderable: bool,
}

/// Definition of an object type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeDefinition {
	/// Type identifier.
	pub id: String,
	/// Local name.
	pub local_name: Option<String>,
	/// Local namespace.
	pub local_namespace: Option<String>,
	/// Display name.
	pub display_name: Option<String>,
	/// Query name.
	pub query_name: Option<String>,
	/// Description.
	pub description: Option<String>,
	/// Base type.
	pub base_type: BaseType,
	/// Parent type identifier.
	pub parent_id: Option<String>,
	/// Whether objects of this type can be created.
	pub creatable: bool,
	/// Whether objects of this type can be filed.
	pub fileable: bool,
	/// Whether the type is queryable.
	pub queryable: bool,
	/// Whether the type is full-text indexed.
	pub full_text_indexed: bool,
	/// Whether the type is included in supertype queries.
	pub included_in_supertype_query: bool,
	/// Whether policies can be applied.
	pub controllable_policy: bool,
	/// Whether ACLs can be applied.
	pub controllable_acl: bool,
	/// Property definitions in repository order.
	pub property_definitions: IndexMap<String, PropertyDefinition>,
}
impl TypeDefinition {
	/// Looks up a property definition by id.
	pub fn property_definition(&self, id: &str) -> Option<&PropertyDefinition> {
		self.property_definitions.get(id)
	}
}
