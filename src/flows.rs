//! Login flow orchestrators powered by the bridge facade.

pub mod authorize;
pub mod callback;

pub use callback::*;

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	directory::MemberDirectory,
	http::ProviderHttpClient,
	oauth::TransportErrorMapper,
	provider::{ProviderDescriptor, ProviderStrategy},
	redirect::RedirectPolicy,
};
#[cfg(feature = "reqwest")]
use crate::{
	config::BridgeConfig,
	http::ReqwestHttpClient,
	oauth::ReqwestTransportErrorMapper,
	provider::DefaultProviderStrategy,
};

#[cfg(feature = "reqwest")]
/// Bridge specialized for the crate's default reqwest transport stack.
pub type ReqwestSsoBridge = SsoBridge<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Coordinates the Salesforce login flow for a single site.
///
/// The bridge owns the HTTP client, member directory, provider descriptor, and strategy
/// references so the authorize and callback halves can focus on their own steps. Client
/// credentials and the callback URL are stored alongside the descriptor so the authorization
/// redirect and the code exchange always agree on them.
#[derive(Clone)]
pub struct SsoBridge<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for every outbound provider request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Host account store that resolves and logs in members.
	pub directory: Arc<dyn MemberDirectory>,
	/// Provider descriptor that defines OAuth endpoints and quirks.
	pub descriptor: ProviderDescriptor,
	/// Strategy responsible for provider-specific request adjustments and error mapping.
	pub strategy: Arc<dyn ProviderStrategy>,
	/// OAuth 2.0 client identifier (connected app consumer key).
	pub client_id: String,
	/// Client secret sent with the code exchange.
	pub client_secret: Option<TokenSecret>,
	/// Absolute callback URL registered with the provider.
	pub callback_url: Url,
	/// Post-login redirect resolution.
	pub redirect_policy: RedirectPolicy,
}
impl<C, M> SsoBridge<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a bridge that reuses the caller-provided transport + mapper pair.
	///
	/// The redirect policy defaults to the origin of `callback_url`; override it with
	/// [`SsoBridge::with_redirect_policy`] when the site lives under a sub-path.
	#[allow(clippy::too_many_arguments)]
	pub fn with_http_client(
		directory: Arc<dyn MemberDirectory>,
		descriptor: ProviderDescriptor,
		strategy: Arc<dyn ProviderStrategy>,
		client_id: impl Into<String>,
		callback_url: Url,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		let redirect_policy = RedirectPolicy::for_site(&callback_url);

		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			directory,
			descriptor,
			strategy,
			client_id: client_id.into(),
			client_secret: None,
			callback_url,
			redirect_policy,
		}
	}

	/// Sets or replaces the client secret used for the code exchange.
	pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(TokenSecret::new(secret));

		self
	}

	/// Replaces the post-login redirect policy.
	pub fn with_redirect_policy(mut self, policy: RedirectPolicy) -> Self {
		self.redirect_policy = policy;

		self
	}
}
#[cfg(feature = "reqwest")]
impl SsoBridge<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a new bridge for the provided descriptor and client identifier.
	///
	/// The bridge provisions its own reqwest-backed transport, which never follows redirects,
	/// so callers do not need to pass HTTP handles explicitly. Use
	/// [`SsoBridge::with_client_secret`] to attach the connected app's consumer secret.
	pub fn new(
		directory: Arc<dyn MemberDirectory>,
		descriptor: ProviderDescriptor,
		strategy: Arc<dyn ProviderStrategy>,
		client_id: impl Into<String>,
		callback_url: Url,
	) -> Result<Self> {
		let http_client = ReqwestHttpClient::without_redirects()?;

		Ok(Self::with_http_client(
			directory,
			descriptor,
			strategy,
			client_id,
			callback_url,
			http_client,
			Arc::new(ReqwestTransportErrorMapper),
		))
	}

	/// Builds a bridge from [`BridgeConfig`] using the default strategy and a transport that
	/// never follows redirects.
	pub fn from_config(config: &BridgeConfig, directory: Arc<dyn MemberDirectory>) -> Result<Self> {
		let descriptor = config.descriptor()?;
		let callback_url = config.callback_url()?;
		let http_client = ReqwestHttpClient::without_redirects()?;

		Ok(Self::with_http_client(
			directory,
			descriptor,
			Arc::new(DefaultProviderStrategy),
			config.client_id.clone(),
			callback_url,
			http_client,
			Arc::new(ReqwestTransportErrorMapper),
		)
		.with_client_secret(config.client_secret.expose())
		.with_redirect_policy(config.redirect_policy()))
	}
}
impl<C, M> Debug for SsoBridge<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SsoBridge")
			.field("descriptor", &self.descriptor)
			.field("client_id", &self.client_id)
			.field("client_secret_set", &self.client_secret.is_some())
			.field("callback_url", &self.callback_url)
			.field("redirect_policy", &self.redirect_policy)
			.finish()
	}
}
