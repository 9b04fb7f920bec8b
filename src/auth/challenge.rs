//! Authentication challenges and the one-shot responder providers answer them with.

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
use tokio::sync::oneshot;
// self
use crate::{_prelude::*, auth::TokenSecret};

/// An authentication challenge raised by a `401` or `407` response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthChallenge {
	/// URL that raised the challenge.
	pub url: Url,
	/// HTTP status (`401` or `407`).
	pub status: u16,
	/// Challenge scheme (`Basic`, `Bearer`, ...).
	pub scheme: String,
	/// Realm parameter, when present.
	pub realm: Option<String>,
	/// All challenge parameters, keyed by lowercase name.
	pub parameters: BTreeMap<String, String>,
	/// Number of challenges already answered for this request.
	pub previous_failure_count: u32,
}
impl AuthChallenge {
	/// Parses a `WWW-Authenticate` or `Proxy-Authenticate` header value.
	pub fn parse(url: Url, status: u16, header: &str, previous_failure_count: u32) -> Self {
		let header = header.trim();
		let (scheme, rest) = header.split_once(char::is_whitespace).unwrap_or((header, ""));
		let parameters = split_parameters(rest)
			.into_iter()
			.filter_map(|part| {
				let (name, value) = part.split_once('=')?;

				Some((name.trim().to_ascii_lowercase(), value.trim().trim_matches('"').to_owned()))
			})
			.collect::<BTreeMap<_, _>>();

		Self {
			url,
			status,
			scheme: scheme.to_owned(),
			realm: parameters.get("realm").cloned(),
			parameters,
			previous_failure_count,
		}
	}

	/// Returns `true` when the scheme matches `scheme` case-insensitively.
	pub fn is_scheme(&self, scheme: &str) -> bool {
		self.scheme.eq_ignore_ascii_case(scheme)
	}
}

/// Credential supplied in answer to a challenge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credential {
	/// HTTP Basic credentials.
	Basic {
		/// User name.
		username: String,
		/// Password.
		password: TokenSecret,
	},
	/// Bearer token.
	Bearer(TokenSecret),
}
impl Credential {
	/// Creates Basic credentials.
	pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
		Self::Basic { username: username.into(), password: TokenSecret::new(password) }
	}

	/// Header pair carrying the credential (always `Authorization`).
	pub fn header(&self) -> (String, String) {
		let value = match self {
			Credential::Basic { username, password } =>
				format!("Basic {}", STANDARD.encode(format!("{username}:{}", password.expose()))),
			Credential::Bearer(token) => format!("Bearer {}", token.expose()),
		};

		("Authorization".into(), value)
	}

	/// Header pair for a proxy challenge (`Proxy-Authorization`).
	pub fn proxy_header(&self) -> (String, String) {
		let (_, value) = self.header();

		("Proxy-Authorization".into(), value)
	}
}

/// How a provider answers a challenge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChallengeDisposition {
	/// Retry the request with the given credential.
	UseCredential(Credential),
	/// Let the response through unchanged; the status check classifies it.
	PerformDefaultHandling,
	/// Abort the request with an authentication error.
	Cancel,
}

/// One-shot responder handed to [`crate::auth::AuthenticationProvider::handle_challenge`].
///
/// Dropping the responder without answering cancels the challenge.
#[derive(Debug)]
pub struct ChallengeResponder(oneshot::Sender<ChallengeDisposition>);
impl ChallengeResponder {
	pub(crate) fn channel() -> (Self, oneshot::Receiver<ChallengeDisposition>) {
		let (tx, rx) = oneshot::channel();

		(Self(tx), rx)
	}

	/// Answers with an explicit disposition.
	pub fn complete(self, disposition: ChallengeDisposition) {
		let _ = self.0.send(disposition);
	}

	/// Answers with a credential.
	pub fn use_credential(self, credential: Credential) {
		self.complete(ChallengeDisposition::UseCredential(credential));
	}

	/// Lets the challenge response through unchanged.
	pub fn perform_default_handling(self) {
		self.complete(ChallengeDisposition::PerformDefaultHandling);
	}

	/// Cancels the request.
	pub fn cancel(self) {
		self.complete(ChallengeDisposition::Cancel);
	}
}

fn split_parameters(raw: &str) -> Vec<&str> {
	let mut parts = Vec::new();
	let mut quoted = false;
	let mut start = 0;

	for (index, c) in raw.char_indices() {
		match c {
			'"' => quoted = !quoted,
			',' if !quoted => {
				parts.push(&raw[start..index]);
				start = index + 1;
			},
			_ => {},
		}
	}

	parts.push(&raw[start..]);

	parts.into_iter().map(str::trim).filter(|part| !part.is_empty()).collect()
}
