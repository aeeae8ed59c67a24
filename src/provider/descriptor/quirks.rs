// self
use crate::_prelude::*;

/// Where the access token goes when calling the identity endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityTokenPlacement {
	#[default]
	/// `Authorization: Bearer <token>` header (RFC 6750).
	AuthorizationHeader,
	/// `oauth_token=<token>` query parameter.
	QueryParameter,
}
impl IdentityTokenPlacement {
	/// Query parameter name used by [`IdentityTokenPlacement::QueryParameter`].
	pub const QUERY_PARAMETER: &'static str = "oauth_token";
}

/// Provider-specific quirks that influence how flows behave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderQuirks {
	/// Character used to join scopes when constructing `scope` parameters.
	pub scope_delimiter: char,
	/// How the access token is presented to the identity endpoint.
	pub identity_token_placement: IdentityTokenPlacement,
}
impl Default for ProviderQuirks {
	fn default() -> Self {
		Self { scope_delimiter: ' ', identity_token_placement: IdentityTokenPlacement::default() }
	}
}
