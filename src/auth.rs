//! Authentication providers and the capability interface the request engine consumes.
//!
//! The engine asks the session's provider for headers before every request, reports every
//! response head back to it, and forwards `401`/`407` challenges to it. Providers that need to
//! do asynchronous work before a request (for example refreshing an OAuth token) expose an
//! [`AsyncHeaderProvider`] through [`AuthenticationProvider::async_headers`]; the engine prefers
//! it over the synchronous header source.

pub mod challenge;
pub mod oauth;
pub mod standard;
pub mod token;

pub use challenge::*;
pub use oauth::*;
pub use standard::*;
pub use token::*;

// self
use crate::{_prelude::*, http::ResponseHead, session::BindingSession};

/// Header map applied to outgoing requests.
pub type HttpHeaders = BTreeMap<String, String>;

/// Boxed future returned by [`AsyncHeaderProvider::async_headers_to_apply`].
pub type HeaderFuture<'a> = Pin<Box<dyn Future<Output = Result<HttpHeaders>> + 'a + Send>>;

/// Source of request headers and handler of authentication challenges.
pub trait AuthenticationProvider
where
	Self: Send + Sync,
{
	/// Headers to add to the next request, if any.
	fn headers_to_apply(&self) -> Option<HttpHeaders>;

	/// Observes every response head (cookies, rotated credentials, ...).
	fn update_from_response(&self, response: &ResponseHead) {
		let _ = response;
	}

	/// Answers a `401`/`407` challenge. The default lets the response through unchanged.
	fn handle_challenge(&self, challenge: AuthChallenge, responder: ChallengeResponder) {
		let _ = challenge;

		responder.perform_default_handling();
	}

	/// Asynchronous header source, when the provider has one.
	fn async_headers(&self) -> Option<&dyn AsyncHeaderProvider> {
		None
	}

	/// Called once the session has selected its repository.
	fn bind_session(&self, session: &BindingSession) {
		let _ = session;
	}
}

/// Asynchronous header source consulted before each request.
pub trait AsyncHeaderProvider
where
	Self: Send + Sync,
{
	/// Resolves the headers for the next request.
	fn async_headers_to_apply(&self) -> HeaderFuture<'_>;
}

/// Provider for repositories that need no credentials.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoAuthentication;
impl AuthenticationProvider for NoAuthentication {
	fn headers_to_apply(&self) -> Option<HttpHeaders> {
		None
	}
}
