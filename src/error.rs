//! Binding-level error types shared by the request engine, codecs, providers, and services.

// self
use crate::_prelude::*;

/// Binding-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const MESSAGE_PREVIEW_LIMIT: usize = 256;

/// Canonical binding error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Network-level failure before a status line arrived.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Repository answered with a status outside the success set for the request method.
	#[error(transparent)]
	Protocol(#[from] ProtocolError),
	/// A success response carried a payload the codec could not interpret.
	#[error(transparent)]
	Parse(#[from] ParseError),
	/// Authentication was cancelled, unanswerable, or the token exchange failed.
	#[error(transparent)]
	Authentication(#[from] AuthenticationError),

	/// Caller supplied an argument the binding cannot act on.
	#[error("Caller supplied an invalid argument: {reason}.")]
	InvalidArgument {
		/// Human-readable reason string.
		reason: String,
	},
	/// Request was cancelled before its outcome was delivered.
	#[error("Operation was cancelled before completion.")]
	Cancelled,
}
impl Error {
	/// Returns `true` when the error represents caller-requested cancellation.
	pub fn is_cancelled(&self) -> bool {
		matches!(self, Self::Cancelled)
	}

	/// Returns the repository error kind when the error came from a protocol response.
	pub fn protocol_kind(&self) -> Option<ProtocolErrorKind> {
		match self {
			Self::Protocol(e) => Some(e.kind),
			_ => None,
		}
	}

	pub(crate) fn invalid_argument(reason: impl Into<String>) -> Self {
		Self::InvalidArgument { reason: reason.into() }
	}
}

/// Configuration and validation failures raised by builders and connection setup.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// OAuth token request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// A configured URL could not be parsed.
	#[error("Configured {field} is not a valid URL.")]
	InvalidUrl {
		/// Name of the offending setting.
		field: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// An OAuth endpoint uses plain HTTP against a non-loopback host.
	#[error("OAuth {field} must use https (got `{url}`).")]
	InsecureEndpoint {
		/// Name of the offending setting.
		field: &'static str,
		/// Rejected URL.
		url: String,
	},
	/// An endpoint uses a scheme other than http or https.
	#[error("Configured {field} uses the unsupported scheme `{scheme}`.")]
	UnsupportedScheme {
		/// Name of the offending setting.
		field: &'static str,
		/// Rejected scheme.
		scheme: String,
	},
	/// Builder requires a value that was never provided.
	#[error("Configuration is missing the required {field}.")]
	Missing {
		/// Name of the missing setting.
		field: &'static str,
	},
	/// Link cache capacity must be positive.
	#[error("Link cache capacity must be greater than zero.")]
	ZeroLinkCacheCapacity,
	/// Repository endpoint did not list any repositories.
	#[error("Repository endpoint did not describe any repositories.")]
	NoRepositories,
	/// Configured repository identifier is unknown to the endpoint.
	#[error("Repository `{id}` is not offered by the endpoint.")]
	UnknownRepository {
		/// Requested repository identifier.
		id: String,
	},
	/// Session lacks an endpoint the operation depends on.
	#[error("Session does not expose the {endpoint} endpoint.")]
	MissingSessionEndpoint {
		/// Endpoint label (collection, template, or URL kind).
		endpoint: String,
	},
	/// Header name or value cannot be sent over HTTP.
	#[error("Header `{name}` is not a valid HTTP header.")]
	InvalidHeader {
		/// Offending header name.
		name: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<reqwest::Error> for ConfigError {
	fn from(e: reqwest::Error) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (timeout, connect, network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// The request exceeded its configured timeout.
	#[error("Request to the repository timed out.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// The connection could not be established.
	#[error("Connection to the repository could not be established.")]
	Connect {
		/// Transport-specific connect error.
		#[source]
		source: BoxError,
	},
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while talking to the repository.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while streaming a request body.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() {
			Self::Timeout { source: Box::new(e) }
		} else if e.is_connect() {
			Self::Connect { source: Box::new(e) }
		} else {
			Self::network(e)
		}
	}
}
impl From<ReqwestError> for Error {
	fn from(e: ReqwestError) -> Self {
		Self::Transport(e.into())
	}
}

/// Repository error taxonomy derived from the HTTP status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProtocolErrorKind {
	/// HTTP 400.
	InvalidArgument,
	/// HTTP 401 or 403.
	PermissionDenied,
	/// HTTP 404.
	NotFound,
	/// HTTP 405.
	NotSupported,
	/// HTTP 407.
	ProxyAuthentication,
	/// HTTP 409.
	Conflict,
	/// Any 5xx status.
	ServerError,
	/// Any other unexpected status.
	Runtime,
}
impl ProtocolErrorKind {
	/// Maps an HTTP status code onto the repository error taxonomy.
	pub const fn from_status(status: u16) -> Self {
		match status {
			400 => Self::InvalidArgument,
			401 | 403 => Self::PermissionDenied,
			404 => Self::NotFound,
			405 => Self::NotSupported,
			407 => Self::ProxyAuthentication,
			409 => Self::Conflict,
			500..=599 => Self::ServerError,
			_ => Self::Runtime,
		}
	}

	/// Returns a stable label suitable for logs and metrics.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::InvalidArgument => "invalid_argument",
			Self::PermissionDenied => "permission_denied",
			Self::NotFound => "not_found",
			Self::NotSupported => "not_supported",
			Self::ProxyAuthentication => "proxy_authentication",
			Self::Conflict => "conflict",
			Self::ServerError => "server_error",
			Self::Runtime => "runtime",
		}
	}
}
impl Display for ProtocolErrorKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Non-success response returned by the repository.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error(
	"Repository returned HTTP {status} ({kind}): {}.",
	.message.as_deref().unwrap_or("no message")
)]
pub struct ProtocolError {
	/// HTTP status code.
	pub status: u16,
	/// Classified error kind.
	pub kind: ProtocolErrorKind,
	/// Repository exception name when the body carried one (e.g. `objectNotFound`).
	pub exception: Option<String>,
	/// Repository message or a truncated preview of the response body.
	pub message: Option<String>,
}
impl ProtocolError {
	/// Builds an error for `status`, truncating the message to a safe preview length.
	pub fn new(status: u16, exception: Option<String>, message: Option<String>) -> Self {
		Self {
			status,
			kind: ProtocolErrorKind::from_status(status),
			exception,
			message: message.map(|m| truncate_preview(&m)),
		}
	}
}

/// Payload could not be interpreted by a wire codec.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Failed to parse repository payload: {reason}.")]
pub struct ParseError {
	/// Human-readable reason string.
	pub reason: String,
	/// Location inside the payload (JSON path or XML element) when known.
	pub path: Option<String>,
}
impl ParseError {
	/// Creates a parse error without location information.
	pub fn new(reason: impl Into<String>) -> Self {
		Self { reason: reason.into(), path: None }
	}

	/// Creates a parse error anchored at `path`.
	pub fn at(path: impl Into<String>, reason: impl Into<String>) -> Self {
		Self { reason: reason.into(), path: Some(path.into()) }
	}

	/// Creates a parse error for a mandatory field that is absent.
	pub fn missing(field: &str) -> Self {
		Self::at(field, format!("mandatory field `{field}` is missing"))
	}
}
impl From<serde_path_to_error::Error<serde_json::Error>> for ParseError {
	fn from(e: serde_path_to_error::Error<serde_json::Error>) -> Self {
		let path = e.path().to_string();

		Self { reason: e.into_inner().to_string(), path: Some(path) }
	}
}
impl From<serde_json::Error> for ParseError {
	fn from(e: serde_json::Error) -> Self {
		Self::new(e.to_string())
	}
}
impl From<roxmltree::Error> for ParseError {
	fn from(e: roxmltree::Error) -> Self {
		Self::new(format!("malformed XML document ({e})"))
	}
}

/// Authentication failures surfaced by the engine and providers.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum AuthenticationError {
	/// Provider cancelled an authentication challenge.
	#[error("Authentication challenge ({scheme}) was cancelled by the provider.")]
	ChallengeCancelled {
		/// Challenge scheme, e.g. `Basic`.
		scheme: String,
	},
	/// Challenge cannot be answered because the request body cannot be replayed.
	#[error("Authentication challenge cannot be answered: {reason}.")]
	ChallengeUnanswerable {
		/// Human-readable reason string.
		reason: String,
	},
	/// Token endpoint rejected or failed an exchange.
	#[error("Token exchange ({grant}) failed: {reason}.")]
	TokenExchange {
		/// Grant label (`authorization_code` or `refresh_token`).
		grant: &'static str,
		/// Provider- or binding-supplied reason string.
		reason: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// No usable token exists and none can be obtained without user interaction.
	#[error("No OAuth token is available; authorization is required.")]
	NotAuthorized,
	/// Authorization callback carried a state value that does not match the pending request.
	#[error("Authorization state does not match the pending request.")]
	StateMismatch,
	/// Provider could not produce request headers.
	#[error("Authentication provider failed to produce headers: {reason}.")]
	HeaderProvider {
		/// Human-readable reason string.
		reason: String,
	},
}

pub(crate) fn truncate_preview(text: &str) -> String {
	let trimmed = text.trim();

	if trimmed.chars().count() <= MESSAGE_PREVIEW_LIMIT {
		return trimmed.to_owned();
	}

	let mut preview = trimmed.chars().take(MESSAGE_PREVIEW_LIMIT).collect::<String>();

	preview.push('…');

	preview
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn status_codes_map_to_error_kinds() {
		assert_eq!(ProtocolErrorKind::from_status(400), ProtocolErrorKind::InvalidArgument);
		assert_eq!(ProtocolErrorKind::from_status(401), ProtocolErrorKind::PermissionDenied);
		assert_eq!(ProtocolErrorKind::from_status(403), ProtocolErrorKind::PermissionDenied);
		assert_eq!(ProtocolErrorKind::from_status(404), ProtocolErrorKind::NotFound);
		assert_eq!(ProtocolErrorKind::from_status(405), ProtocolErrorKind::NotSupported);
		assert_eq!(ProtocolErrorKind::from_status(407), ProtocolErrorKind::ProxyAuthentication);
		assert_eq!(ProtocolErrorKind::from_status(409), ProtocolErrorKind::Conflict);
		assert_eq!(ProtocolErrorKind::from_status(503), ProtocolErrorKind::ServerError);
		assert_eq!(ProtocolErrorKind::from_status(302), ProtocolErrorKind::Runtime);
	}

	#[test]
	fn protocol_error_truncates_long_messages() {
		let error = ProtocolError::new(500, None, Some("x".repeat(1_000)));
		let message = error.message.expect("Truncated message should be present.");

		assert_eq!(message.chars().count(), MESSAGE_PREVIEW_LIMIT + 1);
		assert!(message.ends_with('…'));
	}

	#[test]
	fn error_helpers_expose_kind_and_cancellation() {
		let error = Error::from(ProtocolError::new(409, Some("contentAlreadyExists".into()), None));

		assert_eq!(error.protocol_kind(), Some(ProtocolErrorKind::Conflict));
		assert!(!error.is_cancelled());
		assert!(Error::Cancelled.is_cancelled());
		assert_eq!(Error::Cancelled.protocol_kind(), None);
	}
}
