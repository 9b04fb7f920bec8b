//! Token endpoint client built on the `oauth2` crate over reqwest.
//!
//! Each exchange gets a fresh [`ResponseMetadataSlot`]; the reqwest adapter stores the HTTP
//! status there so failures can be reported with the status the token endpoint returned.

// std
use std::borrow::Cow;
// crates.io
use oauth2::{
	AsyncHttpClient, AuthType, AuthorizationCode, ClientId, ClientSecret, EndpointNotSet,
	EndpointSet, HttpClientError, HttpRequest, HttpResponse, PkceCodeVerifier, RedirectUrl,
	RefreshToken, RequestTokenError, Scope, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicRequestTokenError, BasicTokenResponse},
};
// self
use crate::{
	_prelude::*,
	auth::{ClientAuthMethod, OAuthConfig, OAuthToken, TokenGrant, TokenSecret},
	error::{AuthenticationError, ConfigError},
};

type ConfiguredBasicClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

const GRANT_AUTHORIZATION_CODE: &str = TokenGrant::AuthorizationCode.as_str();
const GRANT_REFRESH_TOKEN: &str = TokenGrant::RefreshToken.as_str();

/// Status captured from the most recent token endpoint response.
#[derive(Clone, Copy, Debug, Default)]
struct ResponseMetadata {
	status: Option<u16>,
}

#[derive(Clone, Debug, Default)]
struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

struct InstrumentedHttpClient {
	client: ReqwestClient,
	slot: ResponseMetadataSlot,
}

/// [`AsyncHttpClient`] adapter that records the response status in its slot.
#[derive(Clone)]
struct InstrumentedHandle(Arc<InstrumentedHttpClient>);
impl InstrumentedHandle {
	fn new(client: ReqwestClient, slot: ResponseMetadataSlot) -> Self {
		Self(Arc::new(InstrumentedHttpClient { client, slot }))
	}
}
impl<'c> AsyncHttpClient<'c> for InstrumentedHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let inner = Arc::clone(&self.0);

		Box::pin(async move {
			inner.slot.take();

			let response = inner
				.client
				.execute(request.try_into().map_err(Box::new)?)
				.await
				.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();

			inner.slot.store(ResponseMetadata { status: Some(status.as_u16()) });

			let mut converted = HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*converted.status_mut() = status;
			*converted.headers_mut() = headers;

			Ok(converted)
		})
	}
}

/// Performs authorization-code and refresh-token exchanges.
pub(super) struct TokenExchanger {
	oauth_client: ConfiguredBasicClient,
	http_client: ReqwestClient,
	scopes: Vec<String>,
}
impl TokenExchanger {
	pub(super) fn new(config: &OAuthConfig, http_client: ReqwestClient) -> Result<Self, ConfigError> {
		let token_url = TokenUrl::new(config.token_endpoint.to_string())
			.map_err(|source| ConfigError::InvalidUrl { field: "token endpoint", source })?;
		let mut oauth_client =
			BasicClient::new(ClientId::new(config.client_id.clone())).set_token_uri(token_url);

		if let Some(secret) = config.client_secret.as_ref().filter(|_| config.client_auth != ClientAuthMethod::None) {
			oauth_client = oauth_client.set_client_secret(ClientSecret::new(secret.expose().to_owned()));
		}
		if config.client_auth == ClientAuthMethod::ClientSecretPost {
			oauth_client = oauth_client.set_auth_type(AuthType::RequestBody);
		}

		Ok(Self { oauth_client, http_client, scopes: config.scopes.clone() })
	}

	pub(super) async fn exchange_code(
		&self,
		code: &str,
		verifier: &str,
		redirect_uri: &Url,
	) -> Result<OAuthToken, AuthenticationError> {
		let slot = ResponseMetadataSlot::default();
		let handle = InstrumentedHandle::new(self.http_client.clone(), slot.clone());
		let redirect_url = RedirectUrl::new(redirect_uri.to_string()).map_err(|e| {
			exchange_failure(GRANT_AUTHORIZATION_CODE, format!("redirect URI is invalid ({e})"), None)
		})?;
		let response = self
			.oauth_client
			.exchange_code(AuthorizationCode::new(code.to_owned()))
			.set_pkce_verifier(PkceCodeVerifier::new(verifier.to_owned()))
			.set_redirect_uri(Cow::Owned(redirect_url))
			.request_async(&handle)
			.await
			.map_err(|e| map_request_error(GRANT_AUTHORIZATION_CODE, slot.take(), e))?;

		token_from_response(GRANT_AUTHORIZATION_CODE, response, None)
	}

	pub(super) async fn refresh(&self, refresh_token: &TokenSecret) -> Result<OAuthToken, AuthenticationError> {
		let slot = ResponseMetadataSlot::default();
		let handle = InstrumentedHandle::new(self.http_client.clone(), slot.clone());
		let secret = RefreshToken::new(refresh_token.expose().to_owned());
		let mut request = self.oauth_client.exchange_refresh_token(&secret);

		for scope in &self.scopes {
			request = request.add_scope(Scope::new(scope.clone()));
		}

		let response = request
			.request_async(&handle)
			.await
			.map_err(|e| map_request_error(GRANT_REFRESH_TOKEN, slot.take(), e))?;

		token_from_response(GRANT_REFRESH_TOKEN, response, Some(refresh_token))
	}
}

fn token_from_response(
	grant: &'static str,
	response: BasicTokenResponse,
	previous_refresh: Option<&TokenSecret>,
) -> Result<OAuthToken, AuthenticationError> {
	let expires_in = response
		.expires_in()
		.ok_or_else(|| exchange_failure(grant, "token response is missing expires_in", None))?;
	let expires_in = i64::try_from(expires_in.as_secs())
		.ok()
		.filter(|secs| *secs > 0)
		.ok_or_else(|| exchange_failure(grant, "token response carried an unusable expires_in", None))?;
	let refresh = response
		.refresh_token()
		.map(|token| TokenSecret::new(token.secret().to_owned()))
		.or_else(|| previous_refresh.cloned());
	let scopes = response
		.scopes()
		.map(|scopes| scopes.iter().map(|scope| scope.as_str().to_owned()).collect::<Vec<_>>())
		.unwrap_or_default();

	OAuthToken::builder()
		.access_token(response.access_token().secret().to_owned())
		.refresh_secret(refresh)
		.scopes(scopes)
		.issued_at(OffsetDateTime::now_utc())
		.expires_in(Duration::seconds(expires_in))
		.build()
		.map_err(|e| exchange_failure(grant, e.to_string(), None))
}

fn map_request_error(
	grant: &'static str,
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<ReqwestError>>,
) -> AuthenticationError {
	let status = meta.and_then(|m| m.status);

	match err {
		RequestTokenError::ServerResponse(response) => {
			let reason = match response.error_description() {
				Some(description) => format!("{} ({description})", response.error().as_ref()),
				None => response.error().as_ref().to_owned(),
			};

			exchange_failure(grant, reason, status)
		},
		RequestTokenError::Request(error) =>
			exchange_failure(grant, format!("token endpoint unreachable: {}", error_chain(&error)), status),
		RequestTokenError::Parse(error, _body) => exchange_failure(
			grant,
			format!("token response is malformed at `{}`", error.path()),
			status,
		),
		RequestTokenError::Other(message) => exchange_failure(grant, message, status),
	}
}

fn exchange_failure(grant: &'static str, reason: impl Into<String>, status: Option<u16>) -> AuthenticationError {
	AuthenticationError::TokenExchange { grant, reason: reason.into(), status }
}

fn error_chain(error: &dyn StdError) -> String {
	let mut rendered = error.to_string();
	let mut source = error.source();

	while let Some(inner) = source {
		rendered.push_str(": ");
		rendered.push_str(&inner.to_string());

		source = inner.source();
	}

	rendered
}
