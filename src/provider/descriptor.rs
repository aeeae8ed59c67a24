//! Provider descriptor data structures and helpers shared by all flows.

/// Builder API for assembling provider descriptors.
pub mod builder;
/// Provider-specific quirk toggles.
pub mod quirks;

pub use builder::*;
pub use quirks::*;

// self
use crate::{
	_prelude::*,
	auth::{ProviderId, ScopeSet},
};

const SALESFORCE_LOGIN_DOMAIN: &str = "login.salesforce.com";
const SALESFORCE_AUTHORIZE_PATH: &str = "/services/oauth2/authorize";
const SALESFORCE_TOKEN_PATH: &str = "/services/oauth2/token";
const SALESFORCE_SCOPE: &str = "id";

/// Preferred client authentication modes for token endpoint calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
	/// HTTP Basic with `client_id`/`client_secret`.
	ClientSecretBasic,
	#[default]
	/// Form POST body parameters for `client_id`/`client_secret`.
	ClientSecretPost,
}

/// Endpoint set declared by a provider descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Authorization endpoint users are redirected to.
	pub authorization: Url,
	/// Token endpoint used for the code exchange.
	pub token: Url,
}

/// Immutable provider descriptor consumed by flows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Descriptor identifier.
	pub id: ProviderId,
	/// Endpoint definitions exposed by the provider.
	pub endpoints: ProviderEndpoints,
	/// Preferred client authentication mechanism.
	pub preferred_client_auth_method: ClientAuthMethod,
	/// Scopes requested on the authorization URL.
	pub scope: ScopeSet,
	/// Provider-specific quirks.
	pub quirks: ProviderQuirks,
}
impl ProviderDescriptor {
	/// Creates a new builder for the provided identifier.
	pub fn builder(id: ProviderId) -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::new(id)
	}

	/// Salesforce production login (`login.salesforce.com`).
	pub fn salesforce() -> Result<Self, ProviderDescriptorError> {
		Self::salesforce_domain(SALESFORCE_LOGIN_DOMAIN)
	}

	/// Salesforce login against a sandbox (`test.salesforce.com`) or My Domain host.
	///
	/// `domain` is a bare host with an optional port; schemes, paths, queries, fragments and
	/// userinfo are rejected.
	pub fn salesforce_domain(domain: &str) -> Result<Self, ProviderDescriptorError> {
		let endpoint = |path: &str| {
			Url::parse(&format!("https://{domain}{path}"))
				.ok()
				.filter(|url| is_bare_host_endpoint(url, path))
				.ok_or_else(|| ProviderDescriptorError::InvalidDomain { domain: domain.into() })
		};
		let id = ProviderId::new("salesforce")
			.map_err(|_| ProviderDescriptorError::InvalidDomain { domain: domain.into() })?;
		let scope = ScopeSet::new([SALESFORCE_SCOPE])
			.map_err(|_| ProviderDescriptorError::InvalidDomain { domain: domain.into() })?;

		Self::builder(id)
			.authorization_endpoint(endpoint(SALESFORCE_AUTHORIZE_PATH)?)
			.token_endpoint(endpoint(SALESFORCE_TOKEN_PATH)?)
			.preferred_client_auth_method(ClientAuthMethod::ClientSecretPost)
			.scope(scope)
			.quirks(ProviderQuirks {
				identity_token_placement: IdentityTokenPlacement::QueryParameter,
				..Default::default()
			})
			.build()
	}
}

fn is_bare_host_endpoint(url: &Url, path: &str) -> bool {
	url.host_str().is_some_and(|host| !host.is_empty())
		&& url.path() == path
		&& url.query().is_none()
		&& url.fragment().is_none()
		&& url.username().is_empty()
		&& url.password().is_none()
}

/// Returns true when the URL may carry credentials: HTTPS, or plain HTTP on a loopback host.
pub(crate) fn is_secure_endpoint(url: &Url) -> bool {
	match url.scheme() {
		"https" => true,
		"http" => match url.host() {
			Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
			Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
			Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
			None => false,
		},
		_ => false,
	}
}
