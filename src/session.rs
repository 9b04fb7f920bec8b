//! Binding session: the per-connection context shared by every service call.
//!
//! A session owns the authentication provider, the link and type caches, the repository
//! endpoints discovered while connecting, and a string-keyed value store for callers that need
//! to attach their own state.

mod type_cache;

pub use type_cache::TypeCache;

// crates.io
use serde_json::Value as JsonValue;
// self
use crate::{
	_prelude::*,
	auth::AuthenticationProvider,
	codec::{AtomPubCodec, BrowserCodec, WireCodec},
	config::SessionParameters,
	links::LinkCache,
	model::RepositoryInfo,
};

/// Wire bindings supported by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BindingKind {
	/// CMIS browser binding (JSON over form posts).
	Browser,
	/// CMIS AtomPub binding (Atom XML documents).
	AtomPub,
}
impl BindingKind {
	/// Returns a stable label.
	pub const fn as_str(self) -> &'static str {
		match self {
			BindingKind::Browser => "browser",
			BindingKind::AtomPub => "atompub",
		}
	}

	/// Returns the wire codec for this binding.
	pub fn codec(self) -> Arc<dyn WireCodec> {
		match self {
			BindingKind::Browser => Arc::new(BrowserCodec),
			BindingKind::AtomPub => Arc::new(AtomPubCodec),
		}
	}
}
impl Display for BindingKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Default)]
struct RepositoryState {
	info: Option<Arc<RepositoryInfo>>,
	repository_url: Option<Url>,
	root_folder_url: Option<Url>,
}

/// Per-connection state shared by all services.
pub struct BindingSession {
	parameters: SessionParameters,
	authentication: Arc<dyn AuthenticationProvider>,
	codec: Arc<dyn WireCodec>,
	link_cache: LinkCache,
	type_cache: TypeCache,
	repository: RwLock<RepositoryState>,
	values: RwLock<HashMap<String, JsonValue>>,
}
impl BindingSession {
	/// Creates a session that has not yet selected a repository.
	pub fn new(parameters: SessionParameters, authentication: Arc<dyn AuthenticationProvider>) -> Self {
		Self {
			codec: parameters.binding.codec(),
			link_cache: LinkCache::new(parameters.link_cache_capacity),
			type_cache: TypeCache::default(),
			repository: RwLock::new(RepositoryState::default()),
			values: RwLock::new(HashMap::new()),
			parameters,
			authentication,
		}
	}

	/// Wire binding of this session.
	pub fn binding(&self) -> BindingKind {
		self.parameters.binding
	}

	/// Parameters the session was opened with.
	pub fn parameters(&self) -> &SessionParameters {
		&self.parameters
	}

	/// Authentication provider consulted for every request.
	pub fn authentication(&self) -> &Arc<dyn AuthenticationProvider> {
		&self.authentication
	}

	/// Wire codec matching the binding.
	pub fn codec(&self) -> &dyn WireCodec {
		self.codec.as_ref()
	}

	/// Per-session link cache.
	pub fn link_cache(&self) -> &LinkCache {
		&self.link_cache
	}

	/// Per-session type definition cache.
	pub fn type_cache(&self) -> &TypeCache {
		&self.type_cache
	}

	/// Selected repository description, once connected.
	pub fn repository_info(&self) -> Option<Arc<RepositoryInfo>> {
		self.repository.read().info.clone()
	}

	/// Selected repository id, once connected.
	pub fn repository_id(&self) -> Option<String> {
		self.repository.read().info.as_ref().map(|info| info.id.clone())
	}

	/// Browser-binding repository URL.
	pub fn repository_url(&self) -> Option<Url> {
		self.repository.read().repository_url.clone()
	}

	/// Browser-binding root folder URL.
	pub fn root_folder_url(&self) -> Option<Url> {
		self.repository.read().root_folder_url.clone()
	}

	/// AtomPub collection URL by collection type.
	pub fn collection(&self, kind: &str) -> Option<Url> {
		self.repository.read().info.as_ref().and_then(|info| info.endpoints.collections.get(kind).cloned())
	}

	/// AtomPub URI template by template type.
	pub fn uri_template(&self, kind: &str) -> Option<String> {
		self.repository.read().info.as_ref().and_then(|info| info.endpoints.uri_templates.get(kind).cloned())
	}

	/// AtomPub workspace link by relation.
	pub fn repository_link(&self, rel: &str, media_type: Option<&str>) -> Option<Url> {
		self.repository
			.read()
			.info
			.as_ref()
			.and_then(|info| info.endpoints.links.resolve(rel, media_type).cloned())
	}

	/// Stores a caller value under `key`, returning the previous one.
	pub fn put_value(&self, key: impl Into<String>, value: JsonValue) -> Option<JsonValue> {
		self.values.write().insert(key.into(), value)
	}

	/// Reads a caller value.
	pub fn value(&self, key: &str) -> Option<JsonValue> {
		self.values.read().get(key).cloned()
	}

	/// Removes a caller value.
	pub fn remove_value(&self, key: &str) -> Option<JsonValue> {
		self.values.write().remove(key)
	}

	/// Drops cached links, types, and caller values.
	pub fn clear_caches(&self) {
		self.link_cache.clear();
		self.type_cache.clear();
		self.values.write().clear();
	}

	/// Installs the selected repository, deriving browser URLs the endpoint left out.
	pub(crate) fn install_repository(&self, info: RepositoryInfo) {
		let repository_url = info.repository_url.clone().or_else(|| match self.binding() {
			BindingKind::Browser => append_segment(&self.parameters.url, &info.id),
			BindingKind::AtomPub => None,
		});
		let root_folder_url = info.root_folder_url.clone().or_else(|| match self.binding() {
			BindingKind::Browser => repository_url.as_ref().and_then(|url| append_segment(url, "root")),
			BindingKind::AtomPub => None,
		});
		let mut state = self.repository.write();

		state.info = Some(Arc::new(info));
		state.repository_url = repository_url;
		state.root_folder_url = root_folder_url;
	}
}
impl Debug for BindingSession {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("BindingSession")
			.field("binding", &self.parameters.binding)
			.field("url", &self.parameters.url.as_str())
			.field("repository_id", &self.repository_id())
			.field("cached_links", &self.link_cache.len())
			.finish_non_exhaustive()
	}
}

fn append_segment(base: &Url, segment: &str) -> Option<Url> {
	let mut url = base.clone();

	url.path_segments_mut().ok()?.pop_if_empty().push(segment);

	Some(url)
}
