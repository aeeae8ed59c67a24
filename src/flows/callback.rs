//! Callback handling: code exchange, identity lookup, member login, and redirect.
//!
//! Each step feeds the next and any failure aborts the rest, so a member is only logged in
//! once the provider has vouched for an email that a local account owns.

// self
use crate::{
	_prelude::*,
	auth::LoginState,
	directory::Member,
	flows::SsoBridge,
	http::ProviderHttpClient,
	identity::{self, Identity},
	oauth::{TokenFacade, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Query parameters the provider sends to the callback URL.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackParams {
	/// Authorization code, present on success.
	pub code: Option<String>,
	/// State blob produced by [`SsoBridge::authorize_url`].
	pub state: Option<String>,
	/// OAuth error code, present when the user or provider refused the request.
	pub error: Option<String>,
	/// Human-readable explanation accompanying `error`.
	pub error_description: Option<String>,
}
impl CallbackParams {
	/// Parses a raw query string (with or without the leading `?`).
	///
	/// Unknown keys are ignored; for repeated keys the first occurrence wins.
	pub fn from_query(query: &str) -> Self {
		let mut params = Self::default();

		for (key, value) in url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
			let slot = match key.as_ref() {
				"code" => &mut params.code,
				"state" => &mut params.state,
				"error" => &mut params.error,
				"error_description" => &mut params.error_description,
				_ => continue,
			};

			if slot.is_none() {
				*slot = Some(value.into_owned());
			}
		}

		params
	}
}

/// Result of a completed login.
#[derive(Clone, Debug)]
pub struct CallbackOutcome {
	/// Member that was logged in.
	pub member: Member,
	/// Identity the provider returned for the member.
	pub identity: Identity,
	/// Remember-me flag carried through the state.
	pub remember: bool,
	/// Where the host should send the browser next.
	pub redirect: Url,
}

impl<C, M> SsoBridge<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Handles a raw callback request, surfacing provider-side refusals before exchanging.
	pub async fn handle_callback(&self, params: CallbackParams) -> Result<CallbackOutcome> {
		self.observe_callback("handle_callback", async move {
			if let Some(error) = params.error.filter(|error| !error.is_empty()) {
				return Err(Error::AuthorizationDenied {
					error,
					description: params.error_description,
				});
			}

			let Some(code) = params.code.filter(|code| !code.trim().is_empty()) else {
				return Err(Error::invalid_authorization("missing authorization code"));
			};

			self.complete_login(&code, params.state.as_deref().unwrap_or_default()).await
		})
		.await
	}

	/// Completes the login for an authorization `code` and the round-tripped `state`.
	pub async fn callback(&self, code: &str, state: &str) -> Result<CallbackOutcome> {
		self.observe_callback("callback", self.complete_login(code, state)).await
	}

	async fn observe_callback<F>(&self, stage: &'static str, login: F) -> Result<CallbackOutcome>
	where
		F: Future<Output = Result<CallbackOutcome>>,
	{
		const KIND: FlowKind = FlowKind::Callback;

		let span = FlowSpan::new(KIND, stage);

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(login).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(err) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
				obs::log_flow_failure(KIND, err);
			},
		}

		result
	}

	async fn complete_login(&self, code: &str, state: &str) -> Result<CallbackOutcome> {
		let facade: TokenFacade<C, M> = TokenFacade::from_descriptor(
			&self.descriptor,
			&self.client_id,
			self.client_secret.as_ref(),
			&self.callback_url,
			self.http_client.clone(),
			self.transport_mapper.clone(),
		)?;
		let grant = facade.exchange_authorization_code(self.strategy.as_ref(), code).await?;
		let identity = identity::fetch_identity(
			self.http_client.as_ref(),
			self.transport_mapper.as_ref(),
			self.strategy.as_ref(),
			self.descriptor.quirks.identity_token_placement,
			&grant,
		)
		.await?;
		let member = self
			.directory
			.find_by_email(&identity.email)
			.await?
			.ok_or_else(|| Error::MemberNotFound { email: identity.email.clone() })?;
		let state = LoginState::decode_lenient(state);

		self.directory.log_in(&member, state.remember).await?;
		self.directory.on_identify(&member, &identity).await?;

		let redirect = self.redirect_policy.resolve(state.redirect.as_deref());

		Ok(CallbackOutcome { member, identity, remember: state.remember, redirect })
	}
}
