//! Shared helpers for integration tests.

#![allow(dead_code)]

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
// self
use salesforce_auth::{
	auth::{MemberId, ProviderId, ScopeSet},
	directory::{Member, MemoryDirectory},
	flows::{ReqwestSsoBridge, SsoBridge},
	http::ReqwestHttpClient,
	oauth::ReqwestTransportErrorMapper,
	provider::{
		ClientAuthMethod, DefaultProviderStrategy, IdentityTokenPlacement, ProviderDescriptor,
		ProviderQuirks,
	},
	redirect::RedirectPolicy,
	reqwest::Client as ReqwestClient,
	url::Url,
};

pub const CLIENT_ID: &str = "3MVG9-client-it";
pub const CLIENT_SECRET: &str = "secret-it";
pub const ACCESS_TOKEN: &str = "00Dxx!AQ-access";
pub const SITE: &str = "https://www.example.com/";
pub const IDENTITY_PATH: &str = "/id/00Dxx0000001gPL/005xx000001Sv6A";

/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
/// `httpmock` during tests.
pub fn test_reqwest_http_client() -> ReqwestHttpClient {
	let client = ReqwestClient::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.build()
		.expect("Failed to build insecure Reqwest client for tests.");

	ReqwestHttpClient::with_client(client)
}

/// Salesforce-shaped descriptor whose endpoints live on the mock server.
pub fn build_descriptor(server: &MockServer) -> ProviderDescriptor {
	let provider_id =
		ProviderId::new("mock-salesforce").expect("Provider identifier should be valid.");

	ProviderDescriptor::builder(provider_id)
		.authorization_endpoint(
			Url::parse(&server.url("/services/oauth2/authorize"))
				.expect("Mock authorization endpoint should parse successfully."),
		)
		.token_endpoint(
			Url::parse(&server.url("/services/oauth2/token"))
				.expect("Mock token endpoint should parse successfully."),
		)
		.preferred_client_auth_method(ClientAuthMethod::ClientSecretPost)
		.scope(ScopeSet::new(["id"]).expect("Scope set should be valid."))
		.quirks(ProviderQuirks {
			identity_token_placement: IdentityTokenPlacement::QueryParameter,
			..Default::default()
		})
		.build()
		.expect("Provider descriptor should build successfully.")
}

pub fn member(id: &str, email: &str) -> Member {
	Member::new(MemberId::new(id).expect("Member fixture id should be valid."), email)
}

/// Constructs a bridge backed by a [`MemoryDirectory`] seeded with `members`, the default
/// provider strategy, and the test reqwest transport.
pub fn build_bridge(
	server: &MockServer,
	members: impl IntoIterator<Item = Member>,
) -> (ReqwestSsoBridge, MemoryDirectory) {
	let directory = MemoryDirectory::with_members(members);
	let site = Url::parse(SITE).expect("Site URL should parse.");
	let callback_url =
		site.join("salesforce-auth/callback").expect("Callback URL should join successfully.");
	let bridge: ReqwestSsoBridge = SsoBridge::with_http_client(
		Arc::new(directory.clone()),
		build_descriptor(server),
		Arc::new(DefaultProviderStrategy),
		CLIENT_ID,
		callback_url,
		test_reqwest_http_client(),
		Arc::new(ReqwestTransportErrorMapper),
	)
	.with_client_secret(CLIENT_SECRET)
	.with_redirect_policy(RedirectPolicy::new(site).with_default_login_dest("/admin"));

	(bridge, directory)
}

/// Token endpoint body pointing the identity URL back at the mock server.
pub fn token_body(server: &MockServer) -> String {
	serde_json::json!({
		"access_token": ACCESS_TOKEN,
		"token_type": "Bearer",
		"id": server.url(IDENTITY_PATH),
		"instance_url": "https://acme.my.salesforce.com",
		"issued_at": "1700000000123",
		"signature": "c2lnbmF0dXJl",
		"scope": "id",
	})
	.to_string()
}

pub fn identity_body(email: &str) -> String {
	serde_json::json!({
		"id": "https://login.salesforce.com/id/00Dxx0000001gPL/005xx000001Sv6A",
		"user_id": "005xx000001Sv6A",
		"organization_id": "00Dxx0000001gPL",
		"username": "ada@acme.example",
		"display_name": "Ada Lovelace",
		"email": email,
		"locale": "en_GB",
	})
	.to_string()
}
