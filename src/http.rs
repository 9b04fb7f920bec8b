//! Cancellable HTTP request engine.
//!
//! [`HttpRequestEngine::start`] returns a [`RequestHandle`] immediately and drives the exchange on
//! a Tokio task. Each exchange resolves the session provider's headers (awaiting the
//! [`AsyncHeaderProvider`](crate::auth::AsyncHeaderProvider) when one is exposed), streams the
//! request body, forwards every response head to the provider, routes `401`/`407` challenges
//! through [`AuthenticationProvider::handle_challenge`], buffers the response body, and finally
//! classifies the status against the method's success set.
//!
//! Services call [`HttpRequestEngine::send`] from inside their own spawned operation so a
//! multi-request operation is cancelled as one unit.

mod body;
mod context;
mod handle;
mod status;

pub use body::*;
pub use context::*;
pub use handle::*;

// crates.io
use reqwest::{
	Method,
	header::{
		CONTENT_LENGTH, HeaderMap, HeaderName, HeaderValue, PROXY_AUTHENTICATE, WWW_AUTHENTICATE,
	},
};
use tokio::sync::oneshot;
// self
use crate::{
	_prelude::*,
	auth::{AuthChallenge, AuthenticationProvider, ChallengeDisposition, ChallengeResponder, HttpHeaders},
	config::TransportConfig,
	error::{AuthenticationError, ConfigError, ParseError},
	obs::{OperationKind, OperationMeter, OperationSpan, debug_event},
	session::BindingSession,
};

const MAX_CHALLENGE_ROUNDS: u32 = 5;

/// HTTP methods the bindings use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
	/// `GET`
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `DELETE`
	Delete,
}
impl HttpMethod {
	/// Returns the method token.
	pub const fn as_str(self) -> &'static str {
		match self {
			HttpMethod::Get => "GET",
			HttpMethod::Post => "POST",
			HttpMethod::Put => "PUT",
			HttpMethod::Delete => "DELETE",
		}
	}

	fn as_reqwest(self) -> Method {
		match self {
			HttpMethod::Get => Method::GET,
			HttpMethod::Post => Method::POST,
			HttpMethod::Put => Method::PUT,
			HttpMethod::Delete => Method::DELETE,
		}
	}
}
impl Display for HttpMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// One HTTP exchange to perform.
pub struct HttpRequest {
	/// Request method.
	pub method: HttpMethod,
	/// Target URL, query included.
	pub url: Url,
	/// Extra headers; provider headers are applied first and these override them.
	pub headers: HttpHeaders,
	/// Request body.
	pub body: Option<RequestBody>,
	/// Upload progress callback.
	pub progress: Option<ProgressCallback>,
}
impl HttpRequest {
	/// Creates a request without body.
	pub fn new(method: HttpMethod, url: Url) -> Self {
		Self { method, url, headers: HttpHeaders::new(), body: None, progress: None }
	}

	/// `GET url`.
	pub fn get(url: Url) -> Self {
		Self::new(HttpMethod::Get, url)
	}

	/// `POST url` with `body`.
	pub fn post(url: Url, body: impl Into<RequestBody>) -> Self {
		Self::new(HttpMethod::Post, url).with_body(body)
	}

	/// `PUT url` with `body`.
	pub fn put(url: Url, body: impl Into<RequestBody>) -> Self {
		Self::new(HttpMethod::Put, url).with_body(body)
	}

	/// `DELETE url`.
	pub fn delete(url: Url) -> Self {
		Self::new(HttpMethod::Delete, url)
	}

	/// Adds a header.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into(), value.into());

		self
	}

	/// Sets the body.
	pub fn with_body(mut self, body: impl Into<RequestBody>) -> Self {
		self.body = Some(body.into());

		self
	}

	/// Sets the upload progress callback.
	pub fn with_progress(mut self, progress: Option<ProgressCallback>) -> Self {
		self.progress = progress;

		self
	}
}
impl Debug for HttpRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("HttpRequest")
			.field("method", &self.method)
			.field("url", &self.url.as_str())
			.field("headers", &self.headers.keys().collect::<Vec<_>>())
			.field("body", &self.body)
			.finish_non_exhaustive()
	}
}

/// Status line and headers of a response, as seen by authentication providers.
#[derive(Clone, Debug)]
pub struct ResponseHead {
	/// HTTP status code.
	pub status: u16,
	/// Final URL after redirects.
	pub url: Url,
	/// Response headers.
	pub headers: HeaderMap,
}

/// Buffered success response.
#[derive(Clone, Debug)]
pub struct HttpResponse {
	/// HTTP status code.
	pub status: u16,
	/// Final URL after redirects.
	pub url: Url,
	/// Response headers.
	pub headers: HeaderMap,
	/// Response body.
	pub body: Bytes,
}
impl HttpResponse {
	/// Value of header `name`, if present and valid UTF-8.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(name).and_then(|value| value.to_str().ok())
	}

	/// `Location` header resolved against the response URL.
	pub fn location(&self) -> Option<Url> {
		self.header("location").and_then(|location| self.url.join(location).ok())
	}

	/// Body decoded as UTF-8.
	pub fn text(&self) -> Result<&str, ParseError> {
		std::str::from_utf8(&self.body).map_err(|e| ParseError::new(format!("response body is not UTF-8 ({e})")))
	}
}

/// Issues HTTP exchanges on behalf of a [`BindingSession`].
#[derive(Clone, Debug)]
pub struct HttpRequestEngine {
	client: ReqwestClient,
}
impl HttpRequestEngine {
	/// Builds an engine whose client follows `transport`.
	pub fn new(transport: &TransportConfig) -> Result<Self> {
		Ok(Self::with_client(transport.build_client()?))
	}

	/// Wraps a caller-supplied reqwest client.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self { client }
	}

	/// Starts `request` in the background and returns its cancellable handle.
	pub fn start(&self, request: HttpRequest, session: &Arc<BindingSession>) -> RequestHandle<HttpResponse> {
		let engine = self.clone();
		let session = Arc::clone(session);

		RequestHandle::spawn(async move { engine.send(request, &session).await })
	}

	/// Performs `request` on the current task.
	pub async fn send(&self, request: HttpRequest, session: &BindingSession) -> Result<HttpResponse> {
		let span = OperationSpan::new(OperationKind::HttpRequest, request.method.as_str());
		let meter = OperationMeter::start(OperationKind::HttpRequest, request.method.as_str());
		let result = span.instrument(self.exchange(request, session.authentication().as_ref())).await;

		meter.finish(&result);

		result
	}

	async fn exchange(&self, request: HttpRequest, provider: &dyn AuthenticationProvider) -> Result<HttpResponse> {
		let provider_headers = match provider.async_headers() {
			Some(source) => source.async_headers_to_apply().await?,
			None => provider.headers_to_apply().unwrap_or_default(),
		};
		let HttpRequest { method, url, headers, body, progress } = request;
		let mut header_map = header_map(provider_headers.iter().chain(headers.iter()))?;
		let reporter = match (&body, progress) {
			(Some(body), Some(callback)) => Some(ProgressReporter::new(callback, body.length())),
			_ => None,
		};
		let _progress_guard = reporter.as_ref().map(ProgressReporter::guard);
		let mut body = body;
		let mut failures = 0;

		loop {
			let replay = match &body {
				Some(body) => body.replay().map(Some),
				None => Some(None),
			};
			let mut builder = self.client.request(method.as_reqwest(), url.clone()).headers(header_map.clone());

			if let Some(body) = body.take() {
				builder = builder.header(CONTENT_LENGTH, body.length()).body(body.into_transfer(reporter.as_ref()));
			}

			debug_event!(method = method.as_str(), url = %url, attempt = failures, "dispatching request");

			let response = builder.send().await?;
			let head = ResponseHead {
				status: response.status().as_u16(),
				url: response.url().clone(),
				headers: response.headers().clone(),
			};

			provider.update_from_response(&head);

			if let Some(challenge) = challenge_of(&head, failures) {
				let scheme = challenge.scheme.clone();
				let status = challenge.status;
				let (responder, receiver) = ChallengeResponder::channel();

				debug_event!(status, scheme = %scheme, failures, "authentication challenge received");
				provider.handle_challenge(challenge, responder);

				match receive_disposition(receiver).await {
					ChallengeDisposition::Cancel =>
						return Err(AuthenticationError::ChallengeCancelled { scheme }.into()),
					ChallengeDisposition::UseCredential(credential) => {
						let Some(replay) = replay else {
							return Err(AuthenticationError::ChallengeUnanswerable {
								reason: "a streamed request body cannot be replayed".into(),
							}
							.into());
						};
						let (name, value) =
							if status == 407 { credential.proxy_header() } else { credential.header() };

						insert_header(&mut header_map, &name, &value)?;

						body = replay;
						failures += 1;

						continue;
					},
					ChallengeDisposition::PerformDefaultHandling => {},
				}
			}

			let payload = response.bytes().await?;

			return status::classify(method, head, payload);
		}
	}
}

fn challenge_of(head: &ResponseHead, failures: u32) -> Option<AuthChallenge> {
	let header = match head.status {
		401 => WWW_AUTHENTICATE,
		407 => PROXY_AUTHENTICATE,
		_ => return None,
	};

	if failures >= MAX_CHALLENGE_ROUNDS {
		return None;
	}

	let raw = head.headers.get(header)?.to_str().ok()?;

	Some(AuthChallenge::parse(head.url.clone(), head.status, raw, failures))
}

async fn receive_disposition(receiver: oneshot::Receiver<ChallengeDisposition>) -> ChallengeDisposition {
	receiver.await.unwrap_or(ChallengeDisposition::Cancel)
}

fn header_map<'a, I>(headers: I) -> Result<HeaderMap>
where
	I: IntoIterator<Item = (&'a String, &'a String)>,
{
	let mut map = HeaderMap::new();

	for (name, value) in headers {
		insert_header(&mut map, name, value)?;
	}

	Ok(map)
}

fn insert_header(map: &mut HeaderMap, name: &str, value: &str) -> Result<()> {
	let invalid = || ConfigError::InvalidHeader { name: name.to_owned() };
	let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
	let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;

	map.insert(header_name, header_value);

	Ok(())
}
