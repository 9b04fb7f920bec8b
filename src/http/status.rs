// self
use crate::{
	_prelude::*,
	error::ProtocolError,
	http::{HttpMethod, HttpResponse, ResponseHead},
	obs::debug_event,
};

#[derive(Deserialize)]
struct ErrorBody {
	exception: Option<String>,
	message: Option<String>,
}

/// Returns `true` when `status` is a success for `method`.
fn is_success(method: HttpMethod, status: u16) -> bool {
	match method {
		HttpMethod::Get => matches!(status, 200 | 206),
		HttpMethod::Post => matches!(status, 200 | 201),
		HttpMethod::Put => matches!(status, 200 | 201 | 204),
		HttpMethod::Delete => matches!(status, 200 | 204),
	}
}

pub(super) fn classify(method: HttpMethod, head: ResponseHead, body: Bytes) -> Result<HttpResponse> {
	if is_success(method, head.status) {
		return Ok(HttpResponse { status: head.status, url: head.url, headers: head.headers, body });
	}

	debug_event!(method = method.as_str(), status = head.status, "repository returned an error status");

	Err(protocol_error(head.status, &body).into())
}

fn protocol_error(status: u16, body: &[u8]) -> ProtocolError {
	if let Ok(ErrorBody { exception, message }) = serde_json::from_slice::<ErrorBody>(body) {
		return ProtocolError::new(status, exception, message);
	}

	let text = String::from_utf8_lossy(body);
	let message = (!text.trim().is_empty()).then(|| text.into_owned());

	ProtocolError::new(status, None, message)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::ProtocolErrorKind;

	#[test]
	fn success_sets_depend_on_method() {
		assert!(is_success(HttpMethod::Get, 206));
		assert!(!is_success(HttpMethod::Get, 201));
		assert!(is_success(HttpMethod::Post, 201));
		assert!(!is_success(HttpMethod::Post, 204));
		assert!(is_success(HttpMethod::Put, 204));
		assert!(is_success(HttpMethod::Delete, 204));
		assert!(!is_success(HttpMethod::Delete, 201));
	}

	#[test]
	fn json_error_bodies_carry_exception_and_message() {
		let error = protocol_error(409, br#"{"exception":"contentAlreadyExists","message":"Document exists"}"#);

		assert_eq!(error.kind, ProtocolErrorKind::Conflict);
		assert_eq!(error.exception.as_deref(), Some("contentAlreadyExists"));
		assert_eq!(error.message.as_deref(), Some("Document exists"));
	}

	#[test]
	fn text_error_bodies_become_previews() {
		let error = protocol_error(404, b"<html>not here</html>");
		let empty = protocol_error(500, b"  ");

		assert_eq!(error.kind, ProtocolErrorKind::NotFound);
		assert_eq!(error.exception, None);
		assert_eq!(error.message.as_deref(), Some("<html>not here</html>"));
		assert_eq!(empty.message, None);
	}
}
