//! Bridge-level error types shared across flows, providers, and directories.

// self
use crate::{_prelude::*, provider::ProviderEndpoint};

/// Bridge-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical bridge error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Member directory failure.
	#[error("{0}")]
	Directory(
		#[from]
		#[source]
		crate::directory::DirectoryError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Temporary upstream failure; retry with backoff.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// The provider redirected back with an OAuth error instead of a code.
	#[error("Identity provider denied the authorization request: {error}.")]
	AuthorizationDenied {
		/// OAuth `error` value from the callback.
		error: String,
		/// Optional `error_description` from the callback.
		description: Option<String>,
	},
	/// Token endpoint response lacked a required field or could not be read.
	#[error("An invalid authorisation response was returned: {reason}.")]
	InvalidAuthorizationResponse {
		/// What was wrong with the response.
		reason: String,
	},
	/// Identity endpoint response lacked a usable email or could not be read.
	#[error("An invalid identity response was returned: {reason}.")]
	InvalidIdentityResponse {
		/// What was wrong with the response.
		reason: String,
	},
	/// No local member owns the email returned by the provider.
	#[error("No member was found for the email \"{email}\".")]
	MemberNotFound {
		/// Email returned by the identity endpoint.
		email: String,
	},
	/// Provider rejected the grant (e.g., reused or expired code).
	#[error("Provider rejected the grant: {reason}.")]
	InvalidGrant {
		/// Provider- or bridge-supplied reason string.
		reason: String,
	},
	/// Client authentication failed or credentials are malformed.
	#[error("Client authentication failed: {reason}.")]
	InvalidClient {
		/// Provider- or bridge-supplied reason string.
		reason: String,
	},
}
impl Error {
	pub(crate) fn invalid_authorization(reason: impl Into<String>) -> Self {
		Self::InvalidAuthorizationResponse { reason: reason.into() }
	}

	pub(crate) fn invalid_identity(reason: impl Into<String>) -> Self {
		Self::InvalidIdentityResponse { reason: reason.into() }
	}
}

/// Configuration and validation failures raised by the bridge.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Provider descriptor contains an invalid URL.
	#[error("Descriptor contains an invalid URL.")]
	InvalidDescriptor {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Callback or base URL cannot be parsed or joined.
	#[error("Redirect URI is invalid.")]
	InvalidRedirect {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Provider descriptor failed validation.
	#[error(transparent)]
	Descriptor(#[from] crate::provider::ProviderDescriptorError),
	/// Configured scopes cannot be normalized.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
	/// Login state could not be serialized.
	#[error("Login state could not be encoded.")]
	StateEncoding {
		/// Underlying serialization failure.
		#[source]
		source: serde_json::Error,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Temporary failure variants (safe to retry).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Provider endpoint returned an unexpected but non-fatal response.
	#[error("The {endpoint} endpoint returned an unexpected response: {message}.")]
	ProviderEndpoint {
		/// Endpoint that failed.
		endpoint: ProviderEndpoint,
		/// Provider- or bridge-supplied message summarizing the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the {endpoint} endpoint.")]
	Network {
		/// Endpoint that was being called.
		endpoint: ProviderEndpoint,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling a provider endpoint.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(
		endpoint: ProviderEndpoint,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { endpoint, source: Box::new(src) }
	}
}
