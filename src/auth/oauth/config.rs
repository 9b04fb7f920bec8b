// std
use std::net::IpAddr;
// crates.io
use url::Host;
// self
use crate::{_prelude::*, auth::TokenSecret, config::TransportConfig, error::ConfigError};

/// How the client authenticates against the token endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClientAuthMethod {
	/// HTTP Basic with client id and secret.
	#[default]
	ClientSecretBasic,
	/// Client id and secret in the form body.
	ClientSecretPost,
	/// Public client; PKCE only.
	None,
}

/// Validated OAuth client settings.
#[derive(Clone, Debug)]
pub struct OAuthConfig {
	/// Client identifier.
	pub client_id: String,
	/// Client secret for confidential clients.
	pub client_secret: Option<TokenSecret>,
	/// Authorization endpoint; required for the authorization-code flow.
	pub authorization_endpoint: Option<Url>,
	/// Token endpoint.
	pub token_endpoint: Url,
	/// Redirect URI registered for the client.
	pub redirect_uri: Option<Url>,
	/// Scopes requested on authorization and refresh.
	pub scopes: Vec<String>,
	/// Tokens expiring within this margin are refreshed before use.
	pub refresh_margin: Duration,
	/// Token endpoint client authentication.
	pub client_auth: ClientAuthMethod,
	/// Transport settings for the token endpoint client.
	pub transport: TransportConfig,
}
impl OAuthConfig {
	/// Default refresh margin.
	pub const DEFAULT_REFRESH_MARGIN: Duration = Duration::seconds(60);

	/// Starts a builder for `client_id`.
	pub fn builder(client_id: impl Into<String>) -> OAuthConfigBuilder {
		OAuthConfigBuilder::new(client_id.into())
	}
}

/// Builder for [`OAuthConfig`].
#[derive(Debug)]
pub struct OAuthConfigBuilder {
	client_id: String,
	client_secret: Option<TokenSecret>,
	authorization_endpoint: Option<Url>,
	token_endpoint: Option<Url>,
	redirect_uri: Option<Url>,
	scopes: Vec<String>,
	refresh_margin: Duration,
	client_auth: ClientAuthMethod,
	transport: TransportConfig,
}
impl OAuthConfigBuilder {
	fn new(client_id: String) -> Self {
		Self {
			client_id,
			client_secret: None,
			authorization_endpoint: None,
			token_endpoint: None,
			redirect_uri: None,
			scopes: Vec::new(),
			refresh_margin: OAuthConfig::DEFAULT_REFRESH_MARGIN,
			client_auth: ClientAuthMethod::default(),
			transport: TransportConfig::default(),
		}
	}

	/// Sets the client secret.
	pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(TokenSecret::new(secret));

		self
	}

	/// Sets the authorization endpoint.
	pub fn authorization_endpoint(mut self, url: Url) -> Self {
		self.authorization_endpoint = Some(url);

		self
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the redirect URI.
	pub fn redirect_uri(mut self, url: Url) -> Self {
		self.redirect_uri = Some(url);

		self
	}

	/// Adds requested scopes.
	pub fn scopes<I, S>(mut self, scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scopes.extend(scopes.into_iter().map(Into::into));

		self
	}

	/// Overrides the refresh margin; negative values clamp to zero.
	pub fn refresh_margin(mut self, margin: Duration) -> Self {
		self.refresh_margin = if margin.is_negative() { Duration::ZERO } else { margin };

		self
	}

	/// Overrides the client authentication method.
	pub fn client_auth(mut self, method: ClientAuthMethod) -> Self {
		self.client_auth = method;

		self
	}

	/// Overrides the token endpoint transport settings.
	pub fn transport(mut self, transport: TransportConfig) -> Self {
		self.transport = transport;

		self
	}

	/// Validates and returns the configuration.
	pub fn build(self) -> Result<OAuthConfig, ConfigError> {
		let token_endpoint = self.token_endpoint.ok_or(ConfigError::Missing { field: "token endpoint" })?;

		validate_endpoint("token endpoint", &token_endpoint)?;

		if let Some(url) = &self.authorization_endpoint {
			validate_endpoint("authorization endpoint", url)?;
		}
		if self.client_id.trim().is_empty() {
			return Err(ConfigError::Missing { field: "client id" });
		}

		let mut scopes = Vec::<String>::new();

		for scope in self.scopes.into_iter().map(|s| s.trim().to_owned()).filter(|s| !s.is_empty()) {
			if !scopes.contains(&scope) {
				scopes.push(scope);
			}
		}

		Ok(OAuthConfig {
			client_id: self.client_id,
			client_secret: self.client_secret,
			authorization_endpoint: self.authorization_endpoint,
			token_endpoint,
			redirect_uri: self.redirect_uri,
			scopes,
			refresh_margin: self.refresh_margin,
			client_auth: self.client_auth,
			transport: self.transport,
		})
	}
}

fn validate_endpoint(field: &'static str, url: &Url) -> Result<(), ConfigError> {
	match url.scheme() {
		"https" => Ok(()),
		"http" if is_loopback(url) => Ok(()),
		"http" => Err(ConfigError::InsecureEndpoint { field, url: url.to_string() }),
		scheme => Err(ConfigError::UnsupportedScheme { field, scheme: scheme.to_owned() }),
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(Host::Ipv4(ip)) => IpAddr::V4(ip).is_loopback(),
		Some(Host::Ipv6(ip)) => IpAddr::V6(ip).is_loopback(),
		None => false,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::url;

	#[test]
	fn build_requires_secure_token_endpoint() {
		let missing = OAuthConfig::builder("client").build();
		let insecure = OAuthConfig::builder("client").token_endpoint(url("http://idp.example.com/token")).build();
		let loopback = OAuthConfig::builder("client").token_endpoint(url("http://127.0.0.1:8080/token")).build();

		assert!(matches!(missing, Err(ConfigError::Missing { field: "token endpoint" })));
		assert!(matches!(insecure, Err(ConfigError::InsecureEndpoint { .. })));
		assert!(loopback.is_ok());
	}

	#[test]
	fn build_normalizes_scopes_and_margin() {
		let config = OAuthConfig::builder("client")
			.token_endpoint(url("https://idp.example.com/token"))
			.scopes(["openid", " openid ", "", "offline_access"])
			.refresh_margin(Duration::seconds(-5))
			.build()
			.expect("Config should build.");

		assert_eq!(config.scopes, ["openid", "offline_access"]);
		assert_eq!(config.refresh_margin, Duration::ZERO);
	}
}
