//! Wire codecs turning repository payloads into the typed model.
//!
//! Each binding has one [`WireCodec`] implementation, selected once per session from
//! [`BindingKind`]. Codecs are pure: they never touch the network, and every failure is a
//! [`ParseError`] rather than a partially populated value.

mod atompub;
mod browser;

pub use atompub::AtomPubCodec;
pub use browser::BrowserCodec;

pub(crate) use atompub::{ATOM_NS, CMIS_NS, CMISRA_NS};

// self
use crate::{
	_prelude::*,
	error::ParseError,
	model::{
		Acl, ChangeEvents, FailedToDelete, ObjectData, ObjectList, QueryResults, Rendition,
		RepositoryInfo, TypeDefinition,
	},
	session::BindingKind,
};

/// Codec result alias.
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Source of type definitions used to type succinct properties.
pub trait TypeResolver
where
	Self: Send + Sync,
{
	/// Returns the definition of `type_id`, if known.
	fn type_definition(&self, type_id: &str) -> Option<Arc<TypeDefinition>>;
}

/// Resolver that knows no types; succinct properties fall back to inference.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoTypes;
impl TypeResolver for NoTypes {
	fn type_definition(&self, _: &str) -> Option<Arc<TypeDefinition>> {
		None
	}
}

/// Inputs a codec needs besides the payload.
#[derive(Clone, Copy)]
pub struct ParseContext<'a> {
	/// URL the payload was fetched from; relative links resolve against it.
	pub base: &'a Url,
	/// Type definitions known to the session.
	pub types: &'a dyn TypeResolver,
}
impl<'a> ParseContext<'a> {
	/// Creates a context.
	pub fn new(base: &'a Url, types: &'a dyn TypeResolver) -> Self {
		Self { base, types }
	}

	pub(crate) fn resolve_url(&self, href: &str) -> ParseResult<Url> {
		self.base.join(href).map_err(|e| ParseError::new(format!("link `{href}` is not a valid URL ({e})")))
	}
}
impl Debug for ParseContext<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ParseContext").field("base", &self.base.as_str()).finish_non_exhaustive()
	}
}

/// One binding's payload parsers.
pub trait WireCodec
where
	Self: Send + Sync,
{
	/// Binding this codec speaks.
	fn binding(&self) -> BindingKind;

	/// Repository descriptions keyed by repository id, in document order.
	fn parse_repository_infos(
		&self,
		payload: &[u8],
		cx: ParseContext<'_>,
	) -> ParseResult<IndexMap<String, RepositoryInfo>>;

	/// One type definition.
	fn parse_type_definition(&self, payload: &[u8], cx: ParseContext<'_>) -> ParseResult<TypeDefinition>;

	/// One object.
	fn parse_object_data(&self, payload: &[u8], cx: ParseContext<'_>) -> ParseResult<ObjectData>;

	/// A page of objects (children listings).
	fn parse_object_list(&self, payload: &[u8], cx: ParseContext<'_>) -> ParseResult<ObjectList>;

	/// Renditions of one object.
	fn parse_renditions(&self, payload: &[u8], cx: ParseContext<'_>) -> ParseResult<Vec<Rendition>>;

	/// An access control list.
	fn parse_acl(&self, payload: &[u8], cx: ParseContext<'_>) -> ParseResult<Acl>;

	/// A page of change-log events.
	fn parse_change_events(&self, payload: &[u8], cx: ParseContext<'_>) -> ParseResult<ChangeEvents>;

	/// A page of query results.
	fn parse_query_results(&self, payload: &[u8], cx: ParseContext<'_>) -> ParseResult<QueryResults>;

	/// Objects a tree deletion left behind; an empty payload means none.
	fn parse_failed_to_delete(&self, payload: &[u8], cx: ParseContext<'_>) -> ParseResult<FailedToDelete>;

	/// Type ids a payload needs definitions for before it can be typed.
	///
	/// Only payloads using succinct properties report anything.
	fn referenced_type_ids(&self, payload: &[u8]) -> ParseResult<BTreeSet<String>> {
		let _ = payload;

		Ok(BTreeSet::new())
	}
}
