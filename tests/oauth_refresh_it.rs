// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use parking_lot::Mutex;
use time::{Duration, OffsetDateTime};
use url::Url;
// self
use cmis_binding::{
	auth::{
		AsyncHeaderProvider, AuthenticationProvider, ClientAuthMethod, OAuthAuthenticationProvider,
		OAuthConfig, OAuthState, OAuthToken, OAuthTokenObserver, TokenGrant,
	},
	error::{AuthenticationError, Error},
};

#[derive(Default)]
struct RecordingObserver(Mutex<Vec<Result<String, AuthenticationError>>>);
impl OAuthTokenObserver for RecordingObserver {
	fn token_updated(&self, outcome: Result<&OAuthToken, &AuthenticationError>) {
		self.0.lock().push(outcome.map(|token| token.access_token.expose().to_owned()).map_err(Clone::clone));
	}
}

fn provider(server: &MockServer, access: &str, expires_in: Duration) -> OAuthAuthenticationProvider {
	let config = OAuthConfig::builder("cmis-client")
		.client_secret("cmis-secret")
		.token_endpoint(Url::parse(&server.url("/token")).expect("Mock token endpoint should parse."))
		.client_auth(ClientAuthMethod::ClientSecretPost)
		.build()
		.expect("OAuth configuration should build.");
	let token = OAuthToken::builder()
		.access_token(access)
		.refresh_token("refresh-1")
		.issued_at(OffsetDateTime::now_utc() - Duration::hours(1))
		.expires_at(OffsetDateTime::now_utc() + expires_in)
		.build()
		.expect("Seed token should build.");

	OAuthAuthenticationProvider::new(config).expect("OAuth provider should build.").with_token(token)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_callers_share_one_refresh() {
	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token").body_includes("grant_type=refresh_token");
			then.status(200)
				.header("content-type", "application/json")
				.delay(std::time::Duration::from_millis(200))
				.body(r#"{"access_token":"access-2","token_type":"bearer","expires_in":3600,"refresh_token":"refresh-2"}"#);
		})
		.await;
	let provider = Arc::new(provider(&server, "access-1", Duration::seconds(-5)));
	let tasks = (0..8)
		.map(|_| {
			let provider = provider.clone();

			tokio::spawn(async move { provider.access_token().await })
		})
		.collect::<Vec<_>>();

	for task in tasks {
		let token = task.await.expect("Refresh task should not panic.").expect("Refresh should succeed.");

		assert_eq!(token.access_token.expose(), "access-2");
	}

	token_mock.assert_calls_async(1).await;
	assert_eq!(provider.metrics().attempts(), 1);
	assert_eq!(provider.metrics().successes(), 1);
	assert!(matches!(provider.state(), OAuthState::Authorized(_)));
}

#[tokio::test]
async fn usable_tokens_are_served_without_exchange() {
	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(500);
		})
		.await;
	let provider = provider(&server, "access-1", Duration::hours(1));
	let headers = provider
		.async_headers()
		.expect("OAuth provider should expose async headers.")
		.async_headers_to_apply()
		.await
		.expect("Headers should resolve.");

	assert_eq!(headers.get("Authorization").map(String::as_str), Some("Bearer access-1"));
	token_mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn failed_refresh_is_reported_once_and_not_retried() {
	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(400)
				.header("content-type", "application/json")
				.body(r#"{"error":"invalid_grant","error_description":"refresh token revoked"}"#);
		})
		.await;
	let observer = Arc::new(RecordingObserver::default());
	let provider = provider(&server, "access-1", Duration::seconds(-5));

	provider.set_observer(&observer);

	let err = provider.access_token().await.expect_err("Revoked refresh token should fail.");

	assert!(matches!(
		err,
		Error::Authentication(AuthenticationError::TokenExchange { grant: "refresh_token", .. })
	));
	assert!(matches!(provider.state(), OAuthState::Failed(_)));
	assert_eq!(provider.metrics().failures(), 1);
	assert_eq!(provider.metrics().grant(TokenGrant::RefreshToken).failures, 1);
	assert_eq!(provider.metrics().consecutive_failures(), 1);
	token_mock.assert_calls_async(1).await;

	let outcomes = observer.0.lock();

	assert_eq!(outcomes.len(), 1);
	assert!(outcomes[0].is_err());
}

#[tokio::test]
async fn successful_refresh_notifies_the_observer() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"access_token":"access-3","token_type":"bearer","expires_in":600}"#);
		})
		.await;

	let observer = Arc::new(RecordingObserver::default());
	let provider = provider(&server, "access-1", Duration::hours(1));

	provider.set_observer(&observer);

	let token = provider.refresh().await.expect("Forced refresh should succeed.");

	assert_eq!(token.access_token.expose(), "access-3");
	assert_eq!(observer.0.lock().as_slice(), &[Ok("access-3".to_owned())]);
	assert_eq!(
		provider.headers_to_apply().and_then(|headers| headers.get("Authorization").cloned()),
		Some("Bearer access-3".to_owned())
	);
}
