//! Binding services: one logical repository operation per method.
//!
//! Every method follows the same shape. It resolves the target URL (link cache, session URLs, or
//! AtomPub templates), builds the query or form parameters from typed inputs, sends the request
//! through the [`HttpRequestEngine`], parses the success payload with the session's codec, and
//! refreshes the link cache from any links the payload carried. Each call runs on its own task
//! and returns a cancellable [`RequestHandle`].

pub mod acl;
pub mod discovery;
pub mod navigation;
pub mod object;
pub mod repository;

mod atompub;
mod browser;

pub use acl::AclService;
pub use discovery::DiscoveryService;
pub use navigation::NavigationService;
pub use object::*;
pub use repository::RepositoryService;

// self
use crate::{
	_prelude::*,
	codec::ParseContext,
	error::ConfigError,
	http::{HttpRequest, HttpRequestEngine, HttpResponse, RequestHandle},
	obs::{OperationKind, OperationMeter, OperationSpan},
	session::BindingSession,
};

/// Wire parameter names shared by both bindings.
pub mod params {
	/// `changeToken`
	pub const CHANGE_TOKEN: &str = "changeToken";
	/// `overwriteFlag`
	pub const OVERWRITE_FLAG: &str = "overwriteFlag";
	/// `includeAllowableActions`
	pub const INCLUDE_ALLOWABLE_ACTIONS: &str = "includeAllowableActions";
	/// `filter`
	pub const FILTER: &str = "filter";
	/// `maxItems`
	pub const MAX_ITEMS: &str = "maxItems";
	/// `objectId`
	pub const OBJECT_ID: &str = "objectId";
	/// `orderBy`
	pub const ORDER_BY: &str = "orderBy";
	/// `includePathSegment`
	pub const INCLUDE_PATH_SEGMENT: &str = "includePathSegment";
	/// `includeRelationships`
	pub const INCLUDE_RELATIONSHIPS: &str = "includeRelationships";
	/// `includePolicyIds`
	pub const INCLUDE_POLICY_IDS: &str = "includePolicyIds";
	/// `includeACL`
	pub const INCLUDE_ACL: &str = "includeACL";
	/// `renditionFilter`
	pub const RENDITION_FILTER: &str = "renditionFilter";
	/// `skipCount`
	pub const SKIP_COUNT: &str = "skipCount";
	/// `streamId`
	pub const STREAM_ID: &str = "streamId";
	/// `allVersions`
	pub const ALL_VERSIONS: &str = "allVersions";
	/// `continueOnFailure`
	pub const CONTINUE_ON_FAILURE: &str = "continueOnFailure";
	/// `unfileObjects`
	pub const UNFILE_OBJECTS: &str = "unfileObjects";
	/// `relativePathSegment`
	pub const RELATIVE_PATH_SEGMENT: &str = "relativePathSegment";
	/// `major`
	pub const MAJOR: &str = "major";
	/// `checkin`
	pub const CHECKIN: &str = "checkin";
	/// `checkinComment`
	pub const CHECKIN_COMMENT: &str = "checkinComment";
	/// `cmisselector`
	pub const SELECTOR: &str = "cmisselector";
	/// `succinct`
	pub const SUCCINCT: &str = "succinct";
	/// `returnVersion`
	pub const RETURN_VERSION: &str = "returnVersion";
	/// `typeId`
	pub const TYPE_ID: &str = "typeId";
	/// `cmisaction`
	pub const ACTION: &str = "cmisaction";
	/// `changeLogToken`
	pub const CHANGE_LOG_TOKEN: &str = "changeLogToken";
	/// `includeProperties`
	pub const INCLUDE_PROPERTIES: &str = "includeProperties";
	/// `searchAllVersions`
	pub const SEARCH_ALL_VERSIONS: &str = "searchAllVersions";
	/// `onlyBasicPermissions`
	pub const ONLY_BASIC_PERMISSIONS: &str = "onlyBasicPermissions";
	/// `ACLPropagation`
	pub const ACL_PROPAGATION: &str = "ACLPropagation";
}

/// Which relationships to embed in returned objects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum IncludeRelationships {
	/// No relationships.
	#[default]
	None,
	/// Relationships where the object is the source.
	Source,
	/// Relationships where the object is the target.
	Target,
	/// Both directions.
	Both,
}
impl IncludeRelationships {
	/// Returns the wire label.
	pub const fn as_str(self) -> &'static str {
		match self {
			IncludeRelationships::None => "none",
			IncludeRelationships::Source => "source",
			IncludeRelationships::Target => "target",
			IncludeRelationships::Both => "both",
		}
	}
}

/// Query, paging, and inclusion options applied uniformly to retrieval calls.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OperationContext {
	/// Comma-separated property filter; `None` lets the repository decide.
	pub filter: Option<String>,
	/// Embed allowable actions.
	pub include_allowable_actions: bool,
	/// Embedded relationships.
	pub include_relationships: IncludeRelationships,
	/// Embed applied policy ids.
	pub include_policy_ids: bool,
	/// Embed the ACL.
	pub include_acl: bool,
	/// Report path segments on children listings.
	pub include_path_segment: bool,
	/// Rendition filter (`cmis:none`, `*`, kinds or MIME types).
	pub rendition_filter: Option<String>,
	/// Order-by clause for listings.
	pub order_by: Option<String>,
	/// Page size for listings.
	pub max_items: Option<u32>,
	/// Items to skip for listings.
	pub skip_count: Option<u64>,
}
impl OperationContext {
	/// Sets the property filter.
	pub fn filter(mut self, filter: impl Into<String>) -> Self {
		self.filter = Some(filter.into());

		self
	}

	/// Toggles allowable actions.
	pub fn include_allowable_actions(mut self, include: bool) -> Self {
		self.include_allowable_actions = include;

		self
	}

	/// Selects embedded relationships.
	pub fn include_relationships(mut self, include: IncludeRelationships) -> Self {
		self.include_relationships = include;

		self
	}

	/// Toggles policy ids.
	pub fn include_policy_ids(mut self, include: bool) -> Self {
		self.include_policy_ids = include;

		self
	}

	/// Toggles the ACL.
	pub fn include_acl(mut self, include: bool) -> Self {
		self.include_acl = include;

		self
	}

	/// Toggles path segments.
	pub fn include_path_segment(mut self, include: bool) -> Self {
		self.include_path_segment = include;

		self
	}

	/// Sets the rendition filter.
	pub fn rendition_filter(mut self, filter: impl Into<String>) -> Self {
		self.rendition_filter = Some(filter.into());

		self
	}

	/// Sets the order-by clause.
	pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
		self.order_by = Some(order_by.into());

		self
	}

	/// Sets the page size.
	pub fn max_items(mut self, max_items: u32) -> Self {
		self.max_items = Some(max_items);

		self
	}

	/// Sets the number of items to skip.
	pub fn skip_count(mut self, skip_count: u64) -> Self {
		self.skip_count = Some(skip_count);

		self
	}

	/// Parameters for single-object retrieval.
	pub(crate) fn object_params(&self) -> Vec<(&'static str, String)> {
		let mut pairs = Vec::new();

		if let Some(filter) = &self.filter {
			pairs.push((params::FILTER, filter.clone()));
		}

		pairs.push((params::INCLUDE_ALLOWABLE_ACTIONS, flag(self.include_allowable_actions)));
		pairs.push((params::INCLUDE_RELATIONSHIPS, self.include_relationships.as_str().to_owned()));
		pairs.push((params::INCLUDE_POLICY_IDS, flag(self.include_policy_ids)));
		pairs.push((params::INCLUDE_ACL, flag(self.include_acl)));

		if let Some(filter) = &self.rendition_filter {
			pairs.push((params::RENDITION_FILTER, filter.clone()));
		}

		pairs
	}

	/// Parameters for children listings.
	pub(crate) fn listing_params(&self) -> Vec<(&'static str, String)> {
		let mut pairs = Vec::new();

		if let Some(filter) = &self.filter {
			pairs.push((params::FILTER, filter.clone()));
		}
		if let Some(order_by) = &self.order_by {
			pairs.push((params::ORDER_BY, order_by.clone()));
		}

		pairs.push((params::INCLUDE_ALLOWABLE_ACTIONS, flag(self.include_allowable_actions)));
		pairs.push((params::INCLUDE_RELATIONSHIPS, self.include_relationships.as_str().to_owned()));
		pairs.push((params::INCLUDE_PATH_SEGMENT, flag(self.include_path_segment)));

		if let Some(filter) = &self.rendition_filter {
			pairs.push((params::RENDITION_FILTER, filter.clone()));
		}

		pairs.extend(self.paging_params());

		pairs
	}

	/// `maxItems`/`skipCount` when set.
	pub(crate) fn paging_params(&self) -> Vec<(&'static str, String)> {
		let mut pairs = Vec::new();

		if let Some(max_items) = self.max_items {
			pairs.push((params::MAX_ITEMS, max_items.to_string()));
		}
		if let Some(skip_count) = self.skip_count {
			pairs.push((params::SKIP_COUNT, skip_count.to_string()));
		}

		pairs
	}
}

/// Session plus engine: everything a service call needs.
#[derive(Clone, Debug)]
pub struct BindingContext {
	session: Arc<BindingSession>,
	engine: HttpRequestEngine,
}
impl BindingContext {
	/// Pairs a session with the engine that talks to its endpoint.
	pub fn new(session: Arc<BindingSession>, engine: HttpRequestEngine) -> Self {
		Self { session, engine }
	}

	/// Shared session.
	pub fn session(&self) -> &Arc<BindingSession> {
		&self.session
	}

	/// Request engine.
	pub fn engine(&self) -> &HttpRequestEngine {
		&self.engine
	}

	pub(crate) async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
		self.engine.send(request, &self.session).await
	}

	pub(crate) fn parse_context<'a>(&'a self, base: &'a Url) -> ParseContext<'a> {
		ParseContext::new(base, self.session.type_cache())
	}

	pub(crate) fn repository_url(&self) -> Result<Url> {
		self.session.repository_url().ok_or_else(|| missing_endpoint("repository URL"))
	}

	pub(crate) fn root_folder_url(&self) -> Result<Url> {
		self.session.root_folder_url().ok_or_else(|| missing_endpoint("root folder URL"))
	}

	pub(crate) fn collection(&self, kind: &str) -> Result<Url> {
		self.session.collection(kind).ok_or_else(|| missing_endpoint(format!("`{kind}` collection")))
	}

	pub(crate) fn uri_template(&self, kind: &str) -> Result<String> {
		self.session.uri_template(kind).ok_or_else(|| missing_endpoint(format!("`{kind}` URI template")))
	}

	/// Runs `operation` on its own task, instrumented and counted under `kind`.
	pub(crate) fn spawn<T, F>(&self, kind: OperationKind, stage: &'static str, operation: F) -> RequestHandle<T>
	where
		T: 'static + Send,
		F: 'static + Send + Future<Output = Result<T>>,
	{
		RequestHandle::spawn(async move {
			let span = OperationSpan::new(kind, stage);
			let meter = OperationMeter::start(kind, stage);
			let result = span.instrument(operation).await;

			meter.finish(&result);

			result
		})
	}
}

/// Renders a boolean wire parameter.
pub(crate) fn flag(value: bool) -> String {
	String::from(if value { "true" } else { "false" })
}

/// Appends `pairs` to the query of `url`.
pub(crate) fn with_query<K, V>(mut url: Url, pairs: &[(K, V)]) -> Url
where
	K: AsRef<str>,
	V: AsRef<str>,
{
	if !pairs.is_empty() {
		url.query_pairs_mut().extend_pairs(pairs.iter().map(|(key, value)| (key.as_ref(), value.as_ref())));
	}

	url
}

fn missing_endpoint(endpoint: impl Into<String>) -> Error {
	ConfigError::MissingSessionEndpoint { endpoint: endpoint.into() }.into()
}
