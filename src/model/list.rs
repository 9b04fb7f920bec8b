//! Paged listings: children, query results.

// self
use crate::model::{AllowableActions, ObjectData, Properties, Rendition};

/// A page of objects. `num_items` is an advisory total and may disagree with `objects.len()`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjectList {
	/// Objects on this page, in repository order.
	pub objects: Vec<ObjectData>,
	/// Whether more pages exist.
	pub has_more_items: bool,
	/// Total count hint.
	pub num_items: Option<u64>,
}

/// Alias used by navigation APIs.
pub type PagedResult = ObjectList;

/// One row of a query result.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryResult {
	/// Selected properties, keyed by query name.
	pub properties: Properties,
	/// Allowable actions, when requested.
	pub allowable_actions: Option<AllowableActions>,
	/// Relationship objects, when requested.
	pub relationships: Vec<ObjectData>,
	/// Renditions, when requested.
	pub renditions: Vec<Rendition>,
}

/// A page of query results.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryResults {
	/// Rows on this page.
	pub results: Vec<QueryResult>,
	/// Whether more pages exist.
	pub has_more_items: bool,
	/// Total count hint; advisory only.
	pub num_items: Option<u64>,
}
