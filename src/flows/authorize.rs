//! Authorization redirect construction.
//!
//! [`SsoBridge::authenticate`] packs the post-login context into a [`LoginState`] and returns
//! the provider URL the host should send the browser to. Nothing is stored server-side; the
//! state travels with the redirect and comes back on the callback.

// self
use crate::{
	_prelude::*,
	auth::LoginState,
	flows::SsoBridge,
	http::ProviderHttpClient,
	oauth::TransportErrorMapper,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Query keys the bridge always sets on the authorization URL.
const RESERVED_AUTHORIZE_PARAMS: [&str; 5] =
	["response_type", "client_id", "redirect_uri", "scope", "state"];

impl<C, M> SsoBridge<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Absolute callback URL the provider redirects back to.
	pub fn redirect_uri(&self) -> &Url {
		&self.callback_url
	}

	/// Builds the authorization URL carrying `state`.
	pub fn authorize_url(&self, state: &LoginState) -> Result<Url> {
		let encoded = state.encode()?;
		let mut extra = BTreeMap::new();

		self.strategy.augment_authorize_request(&mut extra);

		let mut url = self.descriptor.endpoints.authorization.clone();
		let mut pairs = url.query_pairs_mut();

		pairs.append_pair("response_type", "code");
		pairs.append_pair("client_id", &self.client_id);
		pairs.append_pair("redirect_uri", self.callback_url.as_str());

		if let Some(scope) = self.descriptor.scope.join(self.descriptor.quirks.scope_delimiter) {
			pairs.append_pair("scope", &scope);
		}

		pairs.append_pair("state", &encoded);

		for (key, value) in extra.iter() {
			if !RESERVED_AUTHORIZE_PARAMS.contains(&key.as_str()) {
				pairs.append_pair(key, value);
			}
		}

		drop(pairs);

		Ok(url)
	}

	/// Starts a login: returns the provider URL to redirect the user to.
	///
	/// `redirect` is where the member should land afterwards; it is only honored on the way
	/// back if it points at this site.
	pub fn authenticate(&self, redirect: Option<&str>, remember: bool) -> Result<Url> {
		const KIND: FlowKind = FlowKind::Authorize;

		let _guard = FlowSpan::new(KIND, "authenticate").entered();

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let state = LoginState::new(redirect.map(str::to_owned), remember);
		let result = self.authorize_url(&state);

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(err) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
				obs::log_flow_failure(KIND, err);
			},
		}

		result
	}
}
