//! Validated token-endpoint response used for the identity lookup.

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenSecret},
};

/// Access grant returned by a successful authorization code exchange.
///
/// The bridge only holds the grant for the duration of one callback; it is never persisted
/// or refreshed.
#[derive(Clone, Debug)]
pub struct AccessGrant {
	/// Bearer token presented to the identity endpoint.
	pub access_token: TokenSecret,
	/// Identity URL (`id` field) that returns the user's profile.
	pub identity_url: Url,
	/// Instance URL for subsequent API calls, when the provider returns one.
	pub instance_url: Option<Url>,
	/// Issue instant reported by the provider (`issued_at`, epoch milliseconds).
	pub issued_at: Option<OffsetDateTime>,
	/// Scopes granted, when the provider echoes them back.
	pub scope: Option<ScopeSet>,
}

/// Parses the provider's `issued_at` field (milliseconds since the Unix epoch).
pub(crate) fn parse_issued_at(raw: &str) -> Option<OffsetDateTime> {
	let millis = raw.trim().parse::<i64>().ok()?;

	OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).ok()
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	#[test]
	fn issued_at_parses_epoch_millis() {
		assert_eq!(parse_issued_at("1700000000123"), Some(datetime!(2023-11-14 22:13:20.123 UTC)));
		assert_eq!(parse_issued_at("yesterday"), None);
	}

	#[test]
	fn debug_output_redacts_the_access_token() {
		let grant = AccessGrant {
			access_token: TokenSecret::new("plain-token"),
			identity_url: Url::parse("https://login.salesforce.com/id/00D/005")
				.expect("Identity URL fixture should parse."),
			instance_url: None,
			issued_at: None,
			scope: None,
		};
		let rendered = format!("{grant:?}");

		assert!(!rendered.contains("plain-token"));
		assert!(rendered.contains("<redacted>"));
	}
}
