//! OAuth token values and the redacting secret wrapper.

// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

/// Redacted secret wrapper keeping tokens and passwords out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps `value`.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Errors produced by [`OAuthTokenBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum OAuthTokenBuilderError {
	/// No access token value was provided.
	#[error("OAuth token needs an access token value.")]
	MissingAccessToken,
	/// No expiry (absolute or relative) was configured.
	#[error("OAuth token needs an expiry, either absolute or relative to issuance.")]
	MissingExpiry,
}

/// Access token with its refresh secret and expiry.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthToken {
	/// Bearer access token.
	pub access_token: TokenSecret,
	/// Refresh token, if the server issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Granted scopes as reported by the token endpoint.
	pub scopes: Vec<String>,
	/// Issued-at instant.
	#[serde(with = "time::serde::rfc3339")]
	pub issued_at: OffsetDateTime,
	/// Expiry instant.
	#[serde(with = "time::serde::rfc3339")]
	pub expires_at: OffsetDateTime,
}
impl OAuthToken {
	/// Returns a builder.
	pub fn builder() -> OAuthTokenBuilder {
		OAuthTokenBuilder::default()
	}

	/// Returns `true` when the token stays valid for at least `margin` past `instant`.
	pub fn is_usable_at(&self, instant: OffsetDateTime, margin: Duration) -> bool {
		instant + margin < self.expires_at
	}

	/// Returns `true` when the token has expired at `instant`.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}

	/// Short, stable digest of the access token, safe to log.
	pub fn fingerprint(&self) -> String {
		let digest = Sha256::digest(self.access_token.expose().as_bytes());
		let mut encoded = URL_SAFE_NO_PAD.encode(digest);

		encoded.truncate(12);

		encoded
	}

	pub(crate) fn bearer_header(&self) -> (String, String) {
		("Authorization".into(), format!("Bearer {}", self.access_token.expose()))
	}
}
impl Debug for OAuthToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuthToken")
			.field("fingerprint", &self.fingerprint())
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("scopes", &self.scopes)
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Builder for [`OAuthToken`].
#[derive(Clone, Debug, Default)]
pub struct OAuthTokenBuilder {
	access_token: Option<TokenSecret>,
	refresh_token: Option<TokenSecret>,
	scopes: Vec<String>,
	issued_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
}
impl OAuthTokenBuilder {
	/// Sets the bearer token sent to the repository.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(TokenSecret::new(token));

		self
	}

	/// Sets the refresh token used once the bearer token nears expiry.
	pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(token));

		self
	}

	/// Provides the refresh token secret, if any.
	pub fn refresh_secret(mut self, token: Option<TokenSecret>) -> Self {
		self.refresh_token = token;

		self
	}

	/// Sets the granted scopes.
	pub fn scopes<I, S>(mut self, scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scopes = scopes.into_iter().map(Into::into).collect();

		self
	}

	/// Issuance instant; defaults to now.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Expires at `instant`.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Expires `duration` after issuance.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Consumes the builder and produces an [`OAuthToken`].
	pub fn build(self) -> Result<OAuthToken, OAuthTokenBuilderError> {
		let access_token = self.access_token.ok_or(OAuthTokenBuilderError::MissingAccessToken)?;
		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = match (self.expires_at, self.expires_in) {
			(Some(instant), _) => instant,
			(None, Some(delta)) => issued_at + delta,
			(None, None) => return Err(OAuthTokenBuilderError::MissingExpiry),
		};

		Ok(OAuthToken {
			access_token,
			refresh_token: self.refresh_token,
			scopes: self.scopes,
			issued_at,
			expires_at,
		})
	}
}
