//! Internal OAuth client facade for the authorization code exchange.

pub use oauth2;

// crates.io
use oauth2::{
	AuthType, AuthUrl, AuthorizationCode, Client, ClientId, ClientSecret, EndpointNotSet,
	EndpointSet, ExtraTokenFields, HttpClientError, RedirectUrl, RequestTokenError,
	StandardRevocableToken, StandardTokenResponse, TokenResponse, TokenUrl,
	basic::{
		BasicErrorResponse, BasicRequestTokenError, BasicRevocationErrorResponse,
		BasicTokenIntrospectionResponse, BasicTokenType,
	},
};
// self
use crate::{
	_prelude::*,
	auth::{AccessGrant, ScopeSet, TokenSecret, grant},
	error::{ConfigError, TransientError, TransportError},
	http::{ProviderHttpClient, ResponseMetadata, ResponseMetadataSlot},
	provider::{
		ClientAuthMethod, ProviderDescriptor, ProviderEndpoint, ProviderErrorContext,
		ProviderErrorKind, ProviderStrategy,
	},
};

/// Form keys the facade always sets itself.
const RESERVED_TOKEN_PARAMS: [&str; 5] =
	["grant_type", "code", "redirect_uri", "client_id", "client_secret"];

/// Provider-specific fields returned next to the standard token response.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderTokenFields {
	/// Identity URL for the authenticated user.
	#[serde(default)]
	pub id: Option<String>,
	/// Instance URL for subsequent API calls.
	#[serde(default)]
	pub instance_url: Option<String>,
	/// Issue instant in epoch milliseconds.
	#[serde(default)]
	pub issued_at: Option<String>,
	/// Signature over `id` and `issued_at`.
	#[serde(default)]
	pub signature: Option<String>,
}
impl ExtraTokenFields for ProviderTokenFields {}

type ProviderTokenResponse = StandardTokenResponse<ProviderTokenFields, BasicTokenType>;
type BaseClient = Client<
	BasicErrorResponse,
	ProviderTokenResponse,
	BasicTokenIntrospectionResponse,
	StandardRevocableToken,
	BasicRevocationErrorResponse,
>;
type ConfiguredClient = Client<
	BasicErrorResponse,
	ProviderTokenResponse,
	BasicTokenIntrospectionResponse,
	StandardRevocableToken,
	BasicRevocationErrorResponse,
	EndpointSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointSet,
>;

/// Maps HTTP transport failures into bridge [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a bridge error.
	fn map_transport_error(
		&self,
		strategy: &dyn ProviderStrategy,
		endpoint: ProviderEndpoint,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		strategy: &dyn ProviderStrategy,
		endpoint: ProviderEndpoint,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(strategy, endpoint, meta, *inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) =>
				transient(endpoint, meta, format!("HTTP client error: {message}")),
			_ => transient(endpoint, meta, "HTTP client error".into()),
		}
	}
}

/// Token endpoint client built from a provider descriptor.
pub(crate) struct TokenFacade<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	oauth_client: ConfiguredClient,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
}
impl<C, M> TokenFacade<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) fn from_descriptor(
		descriptor: &ProviderDescriptor,
		client_id: &str,
		client_secret: Option<&TokenSecret>,
		redirect_uri: &Url,
		http_client: Arc<C>,
		error_mapper: Arc<M>,
	) -> Result<Self> {
		let auth_url = AuthUrl::new(descriptor.endpoints.authorization.to_string())
			.map_err(|source| ConfigError::InvalidDescriptor { source })?;
		let token_url = TokenUrl::new(descriptor.endpoints.token.to_string())
			.map_err(|source| ConfigError::InvalidDescriptor { source })?;
		let redirect_url = RedirectUrl::new(redirect_uri.to_string())
			.map_err(|source| ConfigError::InvalidRedirect { source })?;
		let mut oauth_client = BaseClient::new(ClientId::new(client_id.to_owned()))
			.set_auth_uri(auth_url)
			.set_token_uri(token_url)
			.set_redirect_uri(redirect_url);

		if let Some(secret) = client_secret {
			oauth_client =
				oauth_client.set_client_secret(ClientSecret::new(secret.expose().to_owned()));
		}
		if matches!(descriptor.preferred_client_auth_method, ClientAuthMethod::ClientSecretPost) {
			oauth_client = oauth_client.set_auth_type(AuthType::RequestBody);
		}

		Ok(Self { oauth_client, http_client, error_mapper })
	}

	/// Exchanges an authorization code and validates the fields the identity lookup needs.
	pub(crate) async fn exchange_authorization_code(
		&self,
		strategy: &dyn ProviderStrategy,
		code: &str,
	) -> Result<AccessGrant> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.with_metadata(meta.clone());
		let mut form = BTreeMap::new();

		strategy.augment_token_request(&mut form);

		let mut request = self.oauth_client.exchange_code(AuthorizationCode::new(code.to_owned()));

		for (key, value) in form.iter() {
			if !RESERVED_TOKEN_PARAMS.contains(&key.as_str()) {
				request = request.add_extra_param(key.as_str(), value.as_str());
			}
		}

		let response = request.request_async(&instrumented).await.map_err(|err| {
			map_request_error(strategy, meta.take(), err, self.error_mapper.as_ref())
		})?;

		map_token_response(response)
	}
}

fn map_token_response(response: ProviderTokenResponse) -> Result<AccessGrant> {
	let access_token = response.access_token().secret();

	if access_token.is_empty() {
		return Err(Error::invalid_authorization("missing access token"));
	}

	let fields = response.extra_fields();
	let identity_url = fields
		.id
		.as_deref()
		.map(str::trim)
		.filter(|value| !value.is_empty())
		.ok_or_else(|| Error::invalid_authorization("missing identity URL"))?;
	let identity_url = Url::parse(identity_url)
		.map_err(|_| Error::invalid_authorization("identity URL is not an absolute URL"))?;
	let instance_url = fields
		.instance_url
		.as_deref()
		.map(Url::parse)
		.transpose()
		.map_err(|_| Error::invalid_authorization("instance URL is not an absolute URL"))?;
	let scope = response
		.scopes()
		.map(|scopes| ScopeSet::new(scopes.iter().map(|scope| scope.as_str())))
		.transpose()
		.map_err(|_| Error::invalid_authorization("granted scope is malformed"))?;

	Ok(AccessGrant {
		access_token: TokenSecret::new(access_token.to_owned()),
		identity_url,
		instance_url,
		issued_at: fields.issued_at.as_deref().and_then(grant::parse_issued_at),
		scope,
	})
}

fn map_request_error<E, M>(
	strategy: &dyn ProviderStrategy,
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<E>>,
	mapper: &M,
) -> Error
where
	E: 'static + Send + Sync + StdError,
	M: ?Sized + TransportErrorMapper<E>,
{
	let meta_ref = meta.as_ref();

	match err {
		RequestTokenError::ServerResponse(response) =>
			map_server_response_error(strategy, response, meta_ref),
		RequestTokenError::Request(error) =>
			mapper.map_transport_error(strategy, ProviderEndpoint::Token, meta_ref, error),
		RequestTokenError::Parse(error, _body) =>
			Error::invalid_authorization(format!("malformed body at `{}`", error.path())),
		RequestTokenError::Other(message) => Error::invalid_authorization(message),
	}
}

fn map_server_response_error(
	strategy: &dyn ProviderStrategy,
	response: BasicErrorResponse,
	meta: Option<&ResponseMetadata>,
) -> Error {
	let mut ctx = ProviderErrorContext::new(ProviderEndpoint::Token)
		.with_oauth_error(response.error().as_ref().to_string());

	if let Some(description) = response.error_description() {
		ctx = ctx.with_error_description(description.clone());
	}
	if let Some(status) = meta_status(meta) {
		ctx = ctx.with_http_status(status);
	}

	let message = match response.error_description() {
		Some(description) => format!("{} ({description})", response.error().as_ref()),
		None => response.error().as_ref().to_string(),
	};

	match strategy.classify_error(&ctx) {
		ProviderErrorKind::InvalidGrant => Error::InvalidGrant { reason: message },
		ProviderErrorKind::InvalidClient => Error::InvalidClient { reason: message },
		ProviderErrorKind::Transient => transient(ProviderEndpoint::Token, meta, message),
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(
	strategy: &dyn ProviderStrategy,
	endpoint: ProviderEndpoint,
	meta: Option<&ResponseMetadata>,
	err: ReqwestError,
) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return TransientError::ProviderEndpoint {
			endpoint,
			message: "Request timed out".into(),
			status: meta_status(meta).or_else(|| err.status().map(|code| code.as_u16())),
			retry_after: meta.and_then(|value| value.retry_after),
		}
		.into();
	}

	// Strategy reserved for provider-specific network classification.
	let _ = strategy;

	TransportError::network(endpoint, err).into()
}

fn transient(endpoint: ProviderEndpoint, meta: Option<&ResponseMetadata>, message: String) -> Error {
	TransientError::ProviderEndpoint {
		endpoint,
		message,
		status: meta_status(meta),
		retry_after: meta.and_then(|value| value.retry_after),
	}
	.into()
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}
