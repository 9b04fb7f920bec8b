// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use parking_lot::Mutex;
use url::Url;
// self
use cmis_binding::{
	auth::{AuthenticationProvider, NoAuthentication, StandardAuthenticationProvider},
	config::SessionParameters,
	error::{AuthenticationError, Error, ProtocolErrorKind},
	http::{HttpRequest, HttpRequestEngine, ProgressCallback, context_queue},
	session::{BindingKind, BindingSession},
};

fn session(server: &MockServer, provider: Arc<dyn AuthenticationProvider>) -> Arc<BindingSession> {
	let endpoint = Url::parse(&server.url("/browser")).expect("Mock endpoint should parse.");
	let parameters =
		SessionParameters::builder(BindingKind::Browser, endpoint).build().expect("Session parameters should build.");

	Arc::new(BindingSession::new(parameters, provider))
}

fn engine() -> HttpRequestEngine {
	HttpRequestEngine::new(&Default::default()).expect("Request engine should build.")
}

fn target(server: &MockServer, path: &str) -> Url {
	Url::parse(&server.url(path)).expect("Mock URL should parse.")
}

#[tokio::test]
async fn statuses_are_classified_per_method() -> color_eyre::Result<()> {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/partial");
			then.status(206).body("abc");
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/missing");
			then.status(404).body("<html>missing</html>");
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/conflict");
			then.status(409)
				.header("content-type", "application/json")
				.body(r#"{"exception":"contentAlreadyExists","message":"Document already exists"}"#);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(DELETE).path("/created");
			then.status(201);
		})
		.await;

	let session = session(&server, Arc::new(NoAuthentication));
	let engine = engine();
	let partial = engine.start(HttpRequest::get(target(&server, "/partial")), &session).await?;

	assert_eq!(partial.status, 206);
	assert_eq!(partial.text()?, "abc");

	let missing = engine
		.start(HttpRequest::post(target(&server, "/missing"), "x"), &session)
		.await
		.expect_err("404 should fail.");

	assert_eq!(missing.protocol_kind(), Some(ProtocolErrorKind::NotFound));

	let conflict = engine
		.start(HttpRequest::post(target(&server, "/conflict"), "x"), &session)
		.await
		.expect_err("409 should fail.");

	match conflict {
		Error::Protocol(e) => {
			assert_eq!(e.kind, ProtocolErrorKind::Conflict);
			assert_eq!(e.exception.as_deref(), Some("contentAlreadyExists"));
			assert_eq!(e.message.as_deref(), Some("Document already exists"));
		},
		other => panic!("Expected a protocol error, got {other:?}."),
	}

	let created = engine
		.start(HttpRequest::delete(target(&server, "/created")), &session)
		.await
		.expect_err("201 is not a DELETE success.");

	assert_eq!(created.protocol_kind(), Some(ProtocolErrorKind::Runtime));

	Ok(())
}

#[tokio::test]
async fn cancelled_requests_resolve_promptly() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/slow");
			then.status(200).delay(std::time::Duration::from_secs(10)).body("late");
		})
		.await;

	let session = session(&server, Arc::new(NoAuthentication));
	let handle = engine().start(HttpRequest::get(target(&server, "/slow")), &session);
	let canceller = handle.canceller();

	tokio::spawn(async move {
		tokio::time::sleep(std::time::Duration::from_millis(50)).await;
		canceller.cancel();
	});

	let outcome = tokio::time::timeout(std::time::Duration::from_secs(5), handle)
		.await
		.expect("Cancellation should resolve the handle before the response arrives.");

	assert!(outcome.expect_err("Cancelled request should fail.").is_cancelled());
}

#[tokio::test]
async fn upload_progress_reaches_the_total() {
	let server = MockServer::start_async().await;
	let upload = server
		.mock_async(|when, then| {
			when.method(POST).path("/upload");
			then.status(201);
		})
		.await;
	let session = session(&server, Arc::new(NoAuthentication));
	let reports = Arc::new(Mutex::new(Vec::new()));
	let sink = reports.clone();
	let progress: ProgressCallback = Arc::new(move |sent, total| sink.lock().push((sent, total)));
	let payload = vec![7_u8; 200 * 1024];
	let request = HttpRequest::post(target(&server, "/upload"), payload).with_progress(Some(progress));
	let response = engine().start(request, &session).await.expect("Upload should succeed.");

	assert_eq!(response.status, 201);
	upload.assert_async().await;

	let reports = reports.lock();

	assert!(reports.len() > 1);
	assert!(reports.windows(2).all(|pair| pair[0].0 < pair[1].0));
	assert_eq!(reports.last(), Some(&(200 * 1024, 200 * 1024)));
}

#[tokio::test]
async fn basic_challenge_is_answered_once() {
	let server = MockServer::start_async().await;
	let challenge = server
		.mock_async(|when, then| {
			when.method(GET).path("/secured").header_missing("authorization");
			then.status(401).header("www-authenticate", "Basic realm=\"cmis\"");
		})
		.await;
	let granted = server
		.mock_async(|when, then| {
			when.method(GET).path("/secured").header("authorization", "Basic dXNlcjpwYXNz");
			then.status(200).body("ok");
		})
		.await;
	let provider = Arc::new(StandardAuthenticationProvider::basic("user", "pass").challenge_only());
	let session = session(&server, provider);
	let response =
		engine().start(HttpRequest::get(target(&server, "/secured")), &session).await.expect("Challenge should be answered.");

	assert_eq!(response.text().expect("Body should decode."), "ok");
	challenge.assert_calls_async(1).await;
	granted.assert_calls_async(1).await;
}

#[tokio::test]
async fn rejected_credentials_surface_as_authentication_errors() {
	let server = MockServer::start_async().await;
	let challenge = server
		.mock_async(|when, then| {
			when.method(GET).path("/secured");
			then.status(401).header("www-authenticate", "Basic realm=\"cmis\"");
		})
		.await;
	let provider = Arc::new(StandardAuthenticationProvider::basic("user", "wrong").challenge_only());
	let session = session(&server, provider);
	let err = engine()
		.start(HttpRequest::get(target(&server, "/secured")), &session)
		.await
		.expect_err("Rejected credentials should fail.");

	assert!(matches!(err, Error::Authentication(AuthenticationError::ChallengeCancelled { .. })));
	challenge.assert_calls_async(2).await;
}

#[tokio::test]
async fn cookies_are_replayed_on_later_requests() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/login");
			then.status(200).header("set-cookie", "JSESSIONID=abc; Path=/; HttpOnly");
		})
		.await;

	let follow_up = server
		.mock_async(|when, then| {
			when.method(GET).path("/next").header("cookie", "JSESSIONID=abc");
			then.status(200);
		})
		.await;
	let session = session(&server, Arc::new(StandardAuthenticationProvider::anonymous()));
	let engine = engine();

	engine.start(HttpRequest::get(target(&server, "/login")), &session).await.expect("Login should succeed.");
	engine.start(HttpRequest::get(target(&server, "/next")), &session).await.expect("Cookie should be sent.");

	follow_up.assert_async().await;
}

#[tokio::test]
async fn completions_run_on_the_supplied_context() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/ping");
			then.status(200).body("pong");
		})
		.await;

	let session = session(&server, Arc::new(NoAuthentication));
	let (queue, mut runner) = context_queue();
	let seen = Arc::new(Mutex::new(None));
	let sink = seen.clone();

	engine()
		.start(HttpRequest::get(target(&server, "/ping")), &session)
		.deliver_on(Arc::new(queue), move |outcome| {
			*sink.lock() = Some(outcome.map(|response| response.body.to_vec()).map_err(|e| e.to_string()));
		});

	assert!(seen.lock().is_none());
	assert!(runner.run_next().await);
	assert_eq!(*seen.lock(), Some(Ok(b"pong".to_vec())));
}
