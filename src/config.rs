//! Session and transport configuration with validating builders.

// std
use std::time::Duration as StdDuration;
// crates.io
use reqwest::redirect::Policy;
// self
use crate::{_prelude::*, error::ConfigError, links::LinkCache, session::BindingKind};

/// HTTP transport settings shared by the request engine and the OAuth token client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportConfig {
	/// Whole-request timeout; `None` disables it.
	pub timeout: Option<StdDuration>,
	/// Connect timeout; `None` disables it.
	pub connect_timeout: Option<StdDuration>,
	/// `User-Agent` header sent with every request.
	pub user_agent: String,
	/// Maximum redirects followed by the request engine (`0` disables following).
	pub max_redirects: usize,
}
impl TransportConfig {
	/// Builds a reqwest client for repository traffic.
	pub fn build_client(&self) -> Result<ReqwestClient, ConfigError> {
		let policy = match self.max_redirects {
			0 => Policy::none(),
			limit => Policy::limited(limit),
		};

		self.builder().redirect(policy).build().map_err(ConfigError::from)
	}

	/// Builds a reqwest client for token endpoints; redirects are never followed.
	pub fn build_token_client(&self) -> Result<ReqwestClient, ConfigError> {
		self.builder().redirect(Policy::none()).build().map_err(ConfigError::from)
	}

	fn builder(&self) -> reqwest::ClientBuilder {
		let mut builder = ReqwestClient::builder().user_agent(self.user_agent.clone());

		if let Some(timeout) = self.timeout {
			builder = builder.timeout(timeout);
		}
		if let Some(timeout) = self.connect_timeout {
			builder = builder.connect_timeout(timeout);
		}

		builder
	}
}
impl Default for TransportConfig {
	fn default() -> Self {
		Self {
			timeout: Some(StdDuration::from_secs(60)),
			connect_timeout: Some(StdDuration::from_secs(30)),
			user_agent: concat!("cmis-binding/", env!("CARGO_PKG_VERSION")).into(),
			max_redirects: 10,
		}
	}
}

/// Validated parameters for opening a binding session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionParameters {
	/// Wire binding to speak.
	pub binding: BindingKind,
	/// Browser-binding endpoint or AtomPub service document URL.
	pub url: Url,
	/// Repository to select; the first advertised repository when `None`.
	pub repository_id: Option<String>,
	/// Objects remembered by the link cache.
	pub link_cache_capacity: usize,
	/// HTTP transport settings.
	pub transport: TransportConfig,
}
impl SessionParameters {
	/// Starts a builder for `binding` against `url`.
	pub fn builder(binding: BindingKind, url: Url) -> SessionParametersBuilder {
		SessionParametersBuilder::new(binding, url)
	}
}

/// Builder for [`SessionParameters`].
#[derive(Debug)]
pub struct SessionParametersBuilder {
	binding: BindingKind,
	url: Url,
	repository_id: Option<String>,
	link_cache_capacity: usize,
	transport: TransportConfig,
}
impl SessionParametersBuilder {
	fn new(binding: BindingKind, url: Url) -> Self {
		Self {
			binding,
			url,
			repository_id: None,
			link_cache_capacity: LinkCache::DEFAULT_CAPACITY,
			transport: TransportConfig::default(),
		}
	}

	/// Selects a repository by id.
	pub fn repository_id(mut self, id: impl Into<String>) -> Self {
		self.repository_id = Some(id.into());

		self
	}

	/// Overrides the link cache capacity.
	pub fn link_cache_capacity(mut self, capacity: usize) -> Self {
		self.link_cache_capacity = capacity;

		self
	}

	/// Overrides the transport settings.
	pub fn transport(mut self, transport: TransportConfig) -> Self {
		self.transport = transport;

		self
	}

	/// Overrides only the whole-request timeout.
	pub fn timeout(mut self, timeout: StdDuration) -> Self {
		self.transport.timeout = Some(timeout);

		self
	}

	/// Validates and returns the parameters.
	pub fn build(self) -> Result<SessionParameters, ConfigError> {
		match self.url.scheme() {
			"http" | "https" => {},
			scheme =>
				return Err(ConfigError::UnsupportedScheme {
					field: "repository url",
					scheme: scheme.to_owned(),
				}),
		}

		if self.link_cache_capacity == 0 {
			return Err(ConfigError::ZeroLinkCacheCapacity);
		}

		let repository_id = self.repository_id.filter(|id| !id.trim().is_empty());

		Ok(SessionParameters {
			binding: self.binding,
			url: self.url,
			repository_id,
			link_cache_capacity: self.link_cache_capacity,
			transport: self.transport,
		})
	}
}
