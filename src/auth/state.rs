//! Login context round-tripped through the provider's `state` parameter.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
// self
use crate::{_prelude::*, error::ConfigError};

/// Opaque state blob carried across the provider redirect.
///
/// Encoded as base64url (no padding) JSON so the value survives any query-string handling
/// on the provider side.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginState {
	/// Where to send the user after a successful login.
	pub redirect: Option<String>,
	/// Whether the host should remember the login beyond the browser session.
	pub remember: bool,
}
impl LoginState {
	/// Creates a state for the provided redirect target and remember flag.
	pub fn new(redirect: Option<String>, remember: bool) -> Self {
		Self { redirect, remember }
	}

	/// Encodes the state for the `state` query parameter.
	pub fn encode(&self) -> Result<String, ConfigError> {
		let json =
			serde_json::to_vec(self).map_err(|source| ConfigError::StateEncoding { source })?;

		Ok(URL_SAFE_NO_PAD.encode(json))
	}

	/// Decodes a returned `state` value, accepting base64url JSON or raw JSON.
	pub fn decode(raw: &str) -> Option<Self> {
		let raw = raw.trim();

		if raw.starts_with('{') {
			return serde_json::from_str(raw).ok();
		}

		let bytes = URL_SAFE_NO_PAD.decode(raw.trim_end_matches('=')).ok()?;

		serde_json::from_slice(&bytes).ok()
	}

	/// Like [`LoginState::decode`], falling back to the default state on garbage.
	pub fn decode_lenient(raw: &str) -> Self {
		Self::decode(raw).unwrap_or_default()
	}
}
