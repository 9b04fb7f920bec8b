//! Basic-auth provider with a session cookie jar.

// crates.io
use reqwest::header::SET_COOKIE;
// self
use crate::{
	_prelude::*,
	auth::{AuthChallenge, AuthenticationProvider, ChallengeResponder, Credential, HttpHeaders},
	http::ResponseHead,
	obs::debug_event,
};

/// Cookies learned from `Set-Cookie` headers, replayed on later requests.
#[derive(Debug, Default)]
pub struct CookieJar(RwLock<BTreeMap<String, String>>);
impl CookieJar {
	/// Records every `Set-Cookie` header of `response`.
	pub fn learn(&self, response: &ResponseHead) {
		let mut cookies = self.0.write();

		for raw in response.headers.get_all(SET_COOKIE).iter().filter_map(|v| v.to_str().ok()) {
			let mut attributes = raw.split(';').map(str::trim);
			let Some((name, value)) = attributes.next().and_then(|pair| pair.split_once('=')) else {
				continue;
			};
			let expired = attributes.any(|attribute| {
				attribute.split_once('=').is_some_and(|(key, value)| {
					key.trim().eq_ignore_ascii_case("max-age") && value.trim().starts_with(['0', '-'])
				})
			});
			let name = name.trim().to_owned();

			if expired || value.trim().is_empty() {
				cookies.remove(&name);
			} else {
				cookies.insert(name, value.trim().to_owned());
			}
		}
	}

	/// `Cookie` header value, if any cookies are known.
	pub fn header_value(&self) -> Option<String> {
		let cookies = self.0.read();

		if cookies.is_empty() {
			return None;
		}

		Some(cookies.iter().map(|(name, value)| format!("{name}={value}")).collect::<Vec<_>>().join("; "))
	}

	/// Snapshot of the known cookies.
	pub fn snapshot(&self) -> BTreeMap<String, String> {
		self.0.read().clone()
	}

	/// Forgets every cookie.
	pub fn clear(&self) {
		self.0.write().clear();
	}
}

/// Username/password provider.
///
/// By default credentials are sent preemptively. With [`StandardAuthenticationProvider::challenge_only`]
/// they are sent only in answer to the first `Basic` challenge of a request.
#[derive(Debug, Default)]
pub struct StandardAuthenticationProvider {
	credential: Option<Credential>,
	preemptive: bool,
	cookies: CookieJar,
}
impl StandardAuthenticationProvider {
	/// Anonymous provider that only tracks cookies.
	pub fn anonymous() -> Self {
		Self::default()
	}

	/// Provider sending HTTP Basic credentials.
	pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
		Self { credential: Some(Credential::basic(username, password)), preemptive: true, cookies: CookieJar::default() }
	}

	/// Sends credentials only when challenged.
	pub fn challenge_only(mut self) -> Self {
		self.preemptive = false;

		self
	}

	/// Cookie jar shared by all requests of the session.
	pub fn cookies(&self) -> &CookieJar {
		&self.cookies
	}
}
impl AuthenticationProvider for StandardAuthenticationProvider {
	fn headers_to_apply(&self) -> Option<HttpHeaders> {
		let mut headers = HttpHeaders::new();

		if let Some(credential) = self.credential.as_ref().filter(|_| self.preemptive) {
			let (name, value) = credential.header();

			headers.insert(name, value);
		}
		if let Some(cookie) = self.cookies.header_value() {
			headers.insert("Cookie".into(), cookie);
		}

		(!headers.is_empty()).then_some(headers)
	}

	fn update_from_response(&self, response: &ResponseHead) {
		self.cookies.learn(response);
	}

	fn handle_challenge(&self, challenge: AuthChallenge, responder: ChallengeResponder) {
		let Some(credential) = &self.credential else {
			responder.perform_default_handling();

			return;
		};

		if !self.preemptive && challenge.previous_failure_count == 0 && challenge.is_scheme("basic") {
			debug_event!(url = %challenge.url, "answering basic challenge");

			responder.use_credential(credential.clone());
		} else {
			debug_event!(
				url = %challenge.url,
				failures = challenge.previous_failure_count,
				"credentials rejected; cancelling challenge"
			);

			responder.cancel();
		}
	}
}
