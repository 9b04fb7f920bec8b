//! OAuth 2.0 provider with PKCE authorization and single-flight token refresh.
//!
//! The provider moves through [`OAuthState`]: `Unauthenticated` until a token is seeded or an
//! authorization completes, `Authorizing` while a PKCE request is outstanding, `Authorized`
//! once a token is held, `Refreshing` while a refresh exchange runs, and `Failed` after an
//! exchange error.
//!
//! Refreshes are single-flight: concurrent callers that find the token expiring queue behind one
//! async guard, and callers that were waiting while another caller finished an exchange take
//! that exchange's outcome (token or error) instead of starting their own. A failed refresh is
//! never retried silently; the observer is told about every exchange outcome.

mod config;
mod exchange;
mod metrics;
mod pkce;

pub use config::*;
pub use metrics::{GrantCounts, TokenGrant, TokenMetrics};
pub use pkce::AuthorizationRequest;

pub(crate) use pkce::random_string;

// std
use std::sync::Weak;
// self
use crate::{
	_prelude::*,
	auth::{
		AsyncHeaderProvider, AuthenticationProvider, CookieJar, HeaderFuture, HttpHeaders,
		OAuthToken,
	},
	error::{AuthenticationError, ConfigError},
	http::ResponseHead,
	obs::{OperationMeter, OperationOutcome, OperationSpan, debug_event},
};
use exchange::TokenExchanger;
use pkce::PendingAuthorization;

/// Receives the outcome of every token exchange.
pub trait OAuthTokenObserver
where
	Self: Send + Sync,
{
	/// Called after an authorization-code or refresh exchange finishes.
	fn token_updated(&self, outcome: std::result::Result<&OAuthToken, &AuthenticationError>);
}

/// Lifecycle state of an [`OAuthAuthenticationProvider`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OAuthState {
	/// No token and no authorization in progress.
	Unauthenticated,
	/// A PKCE authorization request is outstanding.
	Authorizing,
	/// A token is held.
	Authorized(OAuthToken),
	/// A refresh exchange is running; the previous token is attached.
	Refreshing(OAuthToken),
	/// The last exchange failed.
	Failed(AuthenticationError),
}
impl OAuthState {
	/// Returns a stable label.
	pub const fn label(&self) -> &'static str {
		match self {
			OAuthState::Unauthenticated => "unauthenticated",
			OAuthState::Authorizing => "authorizing",
			OAuthState::Authorized(_) => "authorized",
			OAuthState::Refreshing(_) => "refreshing",
			OAuthState::Failed(_) => "failed",
		}
	}
}

struct TokenSlot {
	state: OAuthState,
	last_token: Option<OAuthToken>,
	generation: u64,
}
impl TokenSlot {
	fn usable(&self, margin: Duration) -> Option<OAuthToken> {
		match &self.state {
			OAuthState::Authorized(token) | OAuthState::Refreshing(token)
				if token.is_usable_at(OffsetDateTime::now_utc(), margin) =>
				Some(token.clone()),
			_ => None,
		}
	}
}

/// OAuth bearer-token provider.
pub struct OAuthAuthenticationProvider {
	config: OAuthConfig,
	exchanger: TokenExchanger,
	slot: Mutex<TokenSlot>,
	pending: Mutex<Option<PendingAuthorization>>,
	exchange_guard: AsyncMutex<()>,
	observer: RwLock<Option<Weak<dyn OAuthTokenObserver>>>,
	cookies: CookieJar,
	metrics: TokenMetrics,
}
impl OAuthAuthenticationProvider {
	/// Creates a provider whose token client follows `config.transport`.
	pub fn new(config: OAuthConfig) -> Result<Self> {
		let http_client = config.transport.build_token_client()?;

		Self::with_http_client(config, http_client)
	}

	/// Creates a provider on a caller-supplied reqwest client.
	///
	/// Token endpoints return results directly; configure the client not to follow redirects.
	pub fn with_http_client(config: OAuthConfig, http_client: ReqwestClient) -> Result<Self> {
		let exchanger = TokenExchanger::new(&config, http_client)?;

		Ok(Self {
			config,
			exchanger,
			slot: Mutex::new(TokenSlot { state: OAuthState::Unauthenticated, last_token: None, generation: 0 }),
			pending: Mutex::new(None),
			exchange_guard: AsyncMutex::new(()),
			observer: RwLock::new(None),
			cookies: CookieJar::default(),
			metrics: TokenMetrics::default(),
		})
	}

	/// Seeds a previously persisted token.
	pub fn with_token(self, token: OAuthToken) -> Self {
		{
			let mut slot = self.slot.lock();

			slot.state = OAuthState::Authorized(token.clone());
			slot.last_token = Some(token);
			slot.generation += 1;
		}

		self
	}

	/// Registers the observer. The provider keeps only a weak reference.
	pub fn set_observer<O>(&self, observer: &Arc<O>)
	where
		O: 'static + OAuthTokenObserver,
	{
		let observer: Arc<dyn OAuthTokenObserver> = observer.clone();

		*self.observer.write() = Some(Arc::downgrade(&observer));
	}

	/// Current lifecycle state.
	pub fn state(&self) -> OAuthState {
		self.slot.lock().state.clone()
	}

	/// Most recent token, even if it has expired.
	pub fn token(&self) -> Option<OAuthToken> {
		self.slot.lock().last_token.clone()
	}

	/// Exchange counters.
	pub fn metrics(&self) -> &TokenMetrics {
		&self.metrics
	}

	/// Configuration the provider was built with.
	pub fn config(&self) -> &OAuthConfig {
		&self.config
	}

	/// Starts a PKCE authorization; any previous outstanding request is replaced.
	pub fn start_authorization(&self) -> Result<AuthorizationRequest> {
		let endpoint = self
			.config
			.authorization_endpoint
			.as_ref()
			.ok_or(ConfigError::Missing { field: "authorization endpoint" })?;
		let redirect_uri =
			self.config.redirect_uri.as_ref().ok_or(ConfigError::Missing { field: "redirect uri" })?;
		let (request, pending) = pkce::start(endpoint, &self.config.client_id, redirect_uri, &self.config.scopes);

		*self.pending.lock() = Some(pending);

		{
			let mut slot = self.slot.lock();

			if slot.last_token.is_none() {
				slot.state = OAuthState::Authorizing;
			}
		}

		Ok(request)
	}

	/// Completes the outstanding authorization with the redirect's `state` and `code`.
	pub async fn complete_authorization(&self, state: &str, code: &str) -> Result<OAuthToken> {
		let pending = {
			let mut pending = self.pending.lock();
			let state_matches = match pending.as_ref() {
				Some(outstanding) => outstanding.state == state,
				None => return Err(AuthenticationError::NotAuthorized.into()),
			};

			if !state_matches {
				return Err(AuthenticationError::StateMismatch.into());
			}

			pending.take().ok_or(AuthenticationError::NotAuthorized)?
		};
		let _exclusive = self.exchange_guard.lock().await;
		let result = self
			.observe_exchange(
				TokenGrant::AuthorizationCode,
				"complete_authorization",
				self.exchanger.exchange_code(code, &pending.verifier, &pending.redirect_uri),
			)
			.await;

		result.map_err(Error::from)
	}

	/// Returns a token that stays valid past the refresh margin, refreshing it if needed.
	pub async fn access_token(&self) -> Result<OAuthToken> {
		let observed = {
			let slot = self.slot.lock();

			if let Some(token) = slot.usable(self.config.refresh_margin) {
				return Ok(token);
			}

			slot.generation
		};

		self.refresh_after(observed, false).await
	}

	/// Refreshes the token now, even if it is still usable.
	pub async fn refresh(&self) -> Result<OAuthToken> {
		let observed = self.slot.lock().generation;

		self.refresh_after(observed, true).await
	}

	/// Forgets the token, pending authorization, and cookies.
	pub fn sign_out(&self) {
		{
			let mut slot = self.slot.lock();

			slot.state = OAuthState::Unauthenticated;
			slot.last_token = None;
			slot.generation += 1;
		}

		*self.pending.lock() = None;

		self.cookies.clear();
	}

	async fn refresh_after(&self, observed: u64, force: bool) -> Result<OAuthToken> {
		let _singleflight = self.exchange_guard.lock().await;
		let refresh_secret = {
			let mut slot = self.slot.lock();

			if slot.generation != observed {
				match &slot.state {
					OAuthState::Authorized(token) => return Ok(token.clone()),
					OAuthState::Failed(err) => return Err(err.clone().into()),
					_ => {},
				}
			}
			let still_usable = if force { None } else { slot.usable(self.config.refresh_margin) };

			if let Some(token) = still_usable {
				return Ok(token);
			}

			let Some(current) = slot.last_token.clone() else {
				return Err(AuthenticationError::NotAuthorized.into());
			};
			let Some(secret) = current.refresh_token.clone() else {
				return Err(AuthenticationError::NotAuthorized.into());
			};

			slot.state = OAuthState::Refreshing(current);

			secret
		};
		let result = self
			.observe_exchange(TokenGrant::RefreshToken, "refresh", self.exchanger.refresh(&refresh_secret))
			.await;

		result.map_err(Error::from)
	}

	async fn observe_exchange<F>(
		&self,
		grant: TokenGrant,
		stage: &'static str,
		exchange: F,
	) -> std::result::Result<OAuthToken, AuthenticationError>
	where
		F: Future<Output = std::result::Result<OAuthToken, AuthenticationError>>,
	{
		let span = OperationSpan::new(grant.operation(), stage);
		let meter = OperationMeter::start(grant.operation(), stage);

		self.metrics.record_attempt(grant);

		let result = span.instrument(exchange).await;

		self.metrics.record_outcome(grant, result.is_ok());
		meter.finish_with(if result.is_ok() { OperationOutcome::Success } else { OperationOutcome::Failure });

		{
			let mut slot = self.slot.lock();

			slot.generation += 1;

			match &result {
				Ok(token) => {
					slot.state = OAuthState::Authorized(token.clone());
					slot.last_token = Some(token.clone());
				},
				Err(err) => slot.state = OAuthState::Failed(err.clone()),
			}
		}

		match &result {
			Ok(token) => {
				debug_event!(fingerprint = %token.fingerprint(), expires_at = %token.expires_at, "token updated");
			},
			Err(err) => {
				debug_event!(error = %err, "token exchange failed");
			},
		}

		let observer = self.observer.read().as_ref().and_then(Weak::upgrade);

		if let Some(observer) = observer {
			observer.token_updated(result.as_ref());
		}

		result
	}

	fn headers_for(&self, token: Option<&OAuthToken>) -> HttpHeaders {
		let mut headers = HttpHeaders::new();

		if let Some(token) = token {
			let (name, value) = token.bearer_header();

			headers.insert(name, value);
		}
		if let Some(cookie) = self.cookies.header_value() {
			headers.insert("Cookie".into(), cookie);
		}

		headers
	}
}
impl AuthenticationProvider for OAuthAuthenticationProvider {
	fn headers_to_apply(&self) -> Option<HttpHeaders> {
		let token = self.slot.lock().usable(Duration::ZERO);
		let headers = self.headers_for(token.as_ref());

		(!headers.is_empty()).then_some(headers)
	}

	fn update_from_response(&self, response: &ResponseHead) {
		self.cookies.learn(response);
	}

	fn async_headers(&self) -> Option<&dyn AsyncHeaderProvider> {
		Some(self)
	}
}
impl AsyncHeaderProvider for OAuthAuthenticationProvider {
	fn async_headers_to_apply(&self) -> HeaderFuture<'_> {
		Box::pin(async move {
			let token = self.access_token().await?;

			Ok(self.headers_for(Some(&token)))
		})
	}
}
impl Debug for OAuthAuthenticationProvider {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuthAuthenticationProvider")
			.field("client_id", &self.config.client_id)
			.field("token_endpoint", &self.config.token_endpoint.as_str())
			.field("state", &self.slot.lock().state.label())
			.finish_non_exhaustive()
	}
}
