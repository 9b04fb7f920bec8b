// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

const STATE_LEN: usize = 32;
const PKCE_VERIFIER_LEN: usize = 64;

/// Authorization request the caller should open in a user agent.
#[derive(Clone)]
pub struct AuthorizationRequest {
	/// Fully-formed authorize URL.
	pub authorize_url: Url,
	/// Opaque state that must come back with the redirect.
	pub state: String,
	/// Redirect URI embedded in the authorize URL.
	pub redirect_uri: Url,
	code_challenge: String,
}
impl AuthorizationRequest {
	/// PKCE code challenge (`S256`).
	pub fn code_challenge(&self) -> &str {
		&self.code_challenge
	}
}
impl Debug for AuthorizationRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizationRequest")
			.field("authorize_url", &self.authorize_url.as_str())
			.field("state", &self.state)
			.field("redirect_uri", &self.redirect_uri.as_str())
			.finish()
	}
}

/// Pending authorization kept until the redirect returns.
pub(super) struct PendingAuthorization {
	pub(super) state: String,
	pub(super) verifier: String,
	pub(super) redirect_uri: Url,
}

pub(super) fn start(
	authorization_endpoint: &Url,
	client_id: &str,
	redirect_uri: &Url,
	scopes: &[String],
) -> (AuthorizationRequest, PendingAuthorization) {
	let state = random_string(STATE_LEN);
	let verifier = random_string(PKCE_VERIFIER_LEN);
	let code_challenge = compute_pkce_challenge(&verifier);
	let mut authorize_url = authorization_endpoint.clone();

	{
		let mut pairs = authorize_url.query_pairs_mut();

		pairs.append_pair("response_type", "code");
		pairs.append_pair("client_id", client_id);
		pairs.append_pair("redirect_uri", redirect_uri.as_str());

		if !scopes.is_empty() {
			pairs.append_pair("scope", &scopes.join(" "));
		}

		pairs.append_pair("state", &state);
		pairs.append_pair("code_challenge", &code_challenge);
		pairs.append_pair("code_challenge_method", "S256");
	}

	let request = AuthorizationRequest {
		authorize_url,
		state: state.clone(),
		redirect_uri: redirect_uri.clone(),
		code_challenge,
	};

	(request, PendingAuthorization { state, verifier, redirect_uri: redirect_uri.clone() })
}

pub(crate) fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}

fn compute_pkce_challenge(verifier: &str) -> String {
	URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}
