//! Identity endpoint client and profile model.
//!
//! After the code exchange the provider hands back an identity URL. One GET against it,
//! authenticated with the fresh access token, yields the profile whose `email` drives the
//! member lookup.

// crates.io
use oauth2::{
	AsyncHttpClient,
	http::{
		HeaderValue, Method, Request, StatusCode,
		header::{ACCEPT, AUTHORIZATION},
	},
};
// self
use crate::{
	_prelude::*,
	auth::AccessGrant,
	error::{ConfigError, TransientError},
	http::{ProviderHttpClient, ResponseMetadata, ResponseMetadataSlot},
	oauth::TransportErrorMapper,
	provider::{
		IdentityTokenPlacement, ProviderEndpoint, ProviderErrorContext, ProviderErrorKind,
		ProviderStrategy, descriptor::is_secure_endpoint,
	},
};

/// Profile returned by the identity endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Identity {
	/// Verified email used to find the local member.
	pub email: String,
	/// Provider user identifier.
	pub user_id: Option<String>,
	/// Provider organization identifier.
	pub organization_id: Option<String>,
	/// Provider login name.
	pub username: Option<String>,
	/// Human-readable name.
	pub display_name: Option<String>,
	/// Every other top-level field the provider returned.
	pub attributes: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct IdentityPayload {
	#[serde(default)]
	email: Option<String>,
	#[serde(default)]
	user_id: Option<String>,
	#[serde(default)]
	organization_id: Option<String>,
	#[serde(default)]
	username: Option<String>,
	#[serde(default)]
	display_name: Option<String>,
}
impl IdentityPayload {
	const FIELDS: [&'static str; 5] =
		["email", "user_id", "organization_id", "username", "display_name"];
}

/// Parses an identity endpoint body, requiring a non-empty `email`.
///
/// The email is kept byte-for-byte so the member lookup matches exactly what the provider sent.
pub fn parse_identity(body: &[u8]) -> Result<Identity> {
	let payload: IdentityPayload = parse_with_path(body)?;
	let mut attributes: serde_json::Map<String, serde_json::Value> = parse_with_path(body)?;
	let email = payload
		.email
		.filter(|email| !email.is_empty())
		.ok_or_else(|| Error::invalid_identity("missing email"))?;

	for field in IdentityPayload::FIELDS {
		attributes.remove(field);
	}

	Ok(Identity {
		email,
		user_id: payload.user_id,
		organization_id: payload.organization_id,
		username: payload.username,
		display_name: payload.display_name,
		attributes,
	})
}

fn parse_with_path<T>(body: &[u8]) -> Result<T>
where
	T: for<'de> Deserialize<'de>,
{
	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|err| Error::invalid_identity(format!("malformed body at `{}`", err.path())))
}

/// Fetches and parses the identity behind `grant`.
pub(crate) async fn fetch_identity<C, M>(
	http_client: &C,
	mapper: &M,
	strategy: &dyn ProviderStrategy,
	placement: IdentityTokenPlacement,
	grant: &AccessGrant,
) -> Result<Identity>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	const ENDPOINT: ProviderEndpoint = ProviderEndpoint::Identity;

	let request = build_request(placement, grant)?;
	let slot = ResponseMetadataSlot::default();
	let handle = http_client.with_metadata(slot.clone());
	let response = handle
		.call(request)
		.await
		.map_err(|err| mapper.map_transport_error(strategy, ENDPOINT, slot.take().as_ref(), err))?;
	let status = response.status();

	if !status.is_success() {
		let meta = slot.take();

		return Err(map_status_error(strategy, status, response.body(), meta.as_ref()));
	}

	parse_identity(response.body())
}

fn build_request(
	placement: IdentityTokenPlacement,
	grant: &AccessGrant,
) -> Result<Request<Vec<u8>>> {
	if !is_secure_endpoint(&grant.identity_url) {
		return Err(Error::invalid_authorization("identity URL must use HTTPS"));
	}

	let mut url = grant.identity_url.clone();
	let mut builder = Request::builder().method(Method::GET).header(ACCEPT, "application/json");

	match placement {
		IdentityTokenPlacement::AuthorizationHeader => {
			let value = HeaderValue::try_from(format!("Bearer {}", grant.access_token.expose()))
				.map_err(|_| Error::invalid_authorization("access token is not header-safe"))?;

			builder = builder.header(AUTHORIZATION, value);
		},
		IdentityTokenPlacement::QueryParameter => {
			url.query_pairs_mut().append_pair(
				IdentityTokenPlacement::QUERY_PARAMETER,
				grant.access_token.expose(),
			);
		},
	}

	builder.uri(url.as_str()).body(Vec::new()).map_err(|e| ConfigError::from(e).into())
}

fn map_status_error(
	strategy: &dyn ProviderStrategy,
	status: StatusCode,
	body: &[u8],
	meta: Option<&ResponseMetadata>,
) -> Error {
	let body = String::from_utf8_lossy(body);
	let ctx = ProviderErrorContext::new(ProviderEndpoint::Identity)
		.with_http_status(status.as_u16())
		.with_body_preview(body.as_ref());

	match strategy.classify_error(&ctx) {
		ProviderErrorKind::Transient => TransientError::ProviderEndpoint {
			endpoint: ProviderEndpoint::Identity,
			message: format!("HTTP {status}"),
			status: Some(status.as_u16()),
			retry_after: meta.and_then(|value| value.retry_after),
		}
		.into(),
		_ => Error::invalid_identity(format!("identity endpoint answered with HTTP {status}")),
	}
}
