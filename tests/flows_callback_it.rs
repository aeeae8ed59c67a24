#![cfg(feature = "reqwest")]

mod common;

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
// self
use common::*;
use salesforce_auth::{
	auth::LoginState,
	directory::MemoryDirectory,
	error::{Error, TransientError},
	flows::{CallbackParams, ReqwestSsoBridge},
	provider::{DefaultProviderStrategy, ProviderEndpoint},
	url::Url,
};

fn state(redirect: Option<&str>, remember: bool) -> String {
	LoginState::new(redirect.map(str::to_owned), remember)
		.encode()
		.expect("Login state should encode.")
}

#[tokio::test]
async fn callback_logs_in_member_and_honors_site_redirect() {
	let server = MockServer::start_async().await;
	let (bridge, directory) = build_bridge(&server, [
		member("member-1", "ada@example.com"),
		member("member-2", "grace@example.com"),
	]);
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/services/oauth2/token")
				.header("content-type", "application/x-www-form-urlencoded");
			then.status(200).header("content-type", "application/json").body(token_body(&server));
		})
		.await;
	let identity_mock = server
		.mock_async(|when, then| {
			when.method(GET).path(IDENTITY_PATH).query_param("oauth_token", ACCESS_TOKEN);
			then.status(200)
				.header("content-type", "application/json")
				.body(identity_body("ada@example.com"));
		})
		.await;
	let outcome = bridge
		.callback("aPrxCode==", &state(Some("/admin/pages?tab=2"), true))
		.await
		.expect("Callback should log the member in.");

	token_mock.assert_calls_async(1).await;
	identity_mock.assert_calls_async(1).await;

	assert_eq!(outcome.member.id.as_ref(), "member-1");
	assert_eq!(outcome.identity.email, "ada@example.com");
	assert_eq!(outcome.identity.display_name.as_deref(), Some("Ada Lovelace"));
	assert!(outcome.remember);
	assert_eq!(outcome.redirect.as_str(), "https://www.example.com/admin/pages?tab=2");

	let logins = directory.logins();

	assert_eq!(logins.len(), 1);
	assert_eq!(logins[0].member.as_ref(), "member-1");
	assert!(logins[0].remember);
	assert_eq!(directory.identities().len(), 1, "The identify hook should run once.");
}

#[tokio::test]
async fn off_site_or_garbage_state_falls_back_to_default_destination() {
	let server = MockServer::start_async().await;
	let (bridge, directory) = build_bridge(&server, [member("member-1", "ada@example.com")]);
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/services/oauth2/token");
			then.status(200).header("content-type", "application/json").body(token_body(&server));
		})
		.await;
	let identity_mock = server
		.mock_async(|when, then| {
			when.method(GET).path(IDENTITY_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body(identity_body("ada@example.com"));
		})
		.await;
	let off_site = bridge
		.callback("code-1", &state(Some("https://evil.example/phish"), false))
		.await
		.expect("Callback with an off-site redirect should still log in.");
	let garbage = bridge
		.callback("code-2", "%%%not-a-state%%%")
		.await
		.expect("Callback with an undecodable state should still log in.");

	token_mock.assert_calls_async(2).await;
	identity_mock.assert_calls_async(2).await;

	assert_eq!(off_site.redirect.as_str(), "https://www.example.com/admin");
	assert!(!off_site.remember);
	assert_eq!(garbage.redirect.as_str(), "https://www.example.com/admin");
	assert!(!garbage.remember);
	assert_eq!(directory.logins().len(), 2);
}

#[tokio::test]
async fn unknown_email_is_rejected_without_login() {
	let server = MockServer::start_async().await;
	let (bridge, directory) = build_bridge(&server, [member("member-1", "ada@example.com")]);

	server
		.mock_async(|when, then| {
			when.method(POST).path("/services/oauth2/token");
			then.status(200).header("content-type", "application/json").body(token_body(&server));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path(IDENTITY_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body(identity_body("mallory@example.com"));
		})
		.await;

	let err = bridge
		.callback("code", &state(Some("/admin"), true))
		.await
		.expect_err("Unknown emails must not log anyone in.");

	match err {
		Error::MemberNotFound { email } => assert_eq!(email, "mallory@example.com"),
		other => panic!("Unexpected error: {other:?}."),
	}
	assert!(directory.logins().is_empty());
	assert!(directory.identities().is_empty());
}

#[tokio::test]
async fn padded_email_must_match_exactly() {
	let server = MockServer::start_async().await;
	let (bridge, directory) = build_bridge(&server, [member("member-1", "ada@example.com")]);

	server
		.mock_async(|when, then| {
			when.method(POST).path("/services/oauth2/token");
			then.status(200).header("content-type", "application/json").body(token_body(&server));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path(IDENTITY_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body(identity_body("  ada@example.com "));
		})
		.await;

	let err = bridge.callback("code", "").await.expect_err("Padded emails must not match.");

	match err {
		Error::MemberNotFound { email } => assert_eq!(email, "  ada@example.com "),
		other => panic!("Unexpected error: {other:?}."),
	}
	assert!(directory.logins().is_empty());
}

#[tokio::test]
async fn token_response_without_identity_url_is_invalid() {
	let server = MockServer::start_async().await;
	let (bridge, directory) = build_bridge(&server, [member("member-1", "ada@example.com")]);
	let identity_mock = server
		.mock_async(|when, then| {
			when.method(GET).path(IDENTITY_PATH);
			then.status(200).body(identity_body("ada@example.com"));
		})
		.await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/services/oauth2/token");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"access_token":"00Dxx!AQ-access","token_type":"Bearer"}"#);
		})
		.await;

	let err = bridge.callback("code", "").await.expect_err("Missing `id` must fail the login.");

	assert!(matches!(err, Error::InvalidAuthorizationResponse { .. }), "{err:?}");
	identity_mock.assert_calls_async(0).await;
	assert!(directory.logins().is_empty());
}

#[tokio::test]
async fn identity_without_email_is_invalid() {
	let server = MockServer::start_async().await;
	let (bridge, directory) = build_bridge(&server, [member("member-1", "ada@example.com")]);

	server
		.mock_async(|when, then| {
			when.method(POST).path("/services/oauth2/token");
			then.status(200).header("content-type", "application/json").body(token_body(&server));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path(IDENTITY_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"user_id":"005xx000001Sv6A","email":""}"#);
		})
		.await;

	let err = bridge.callback("code", "").await.expect_err("Blank email must fail the login.");

	assert!(matches!(err, Error::InvalidIdentityResponse { .. }), "{err:?}");
	assert!(directory.logins().is_empty());
}

#[tokio::test]
async fn rejected_code_maps_to_invalid_grant() {
	let server = MockServer::start_async().await;
	let (bridge, _) = build_bridge(&server, [member("member-1", "ada@example.com")]);
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/services/oauth2/token");
			then.status(400)
				.header("content-type", "application/json")
				.body(r#"{"error":"invalid_grant","error_description":"expired authorization code"}"#);
		})
		.await;
	let err = bridge.callback("stale", "").await.expect_err("Stale codes must be rejected.");

	token_mock.assert_async().await;

	match err {
		Error::InvalidGrant { reason } => assert!(reason.contains("expired authorization code")),
		other => panic!("Unexpected error: {other:?}."),
	}
}

#[tokio::test]
async fn identity_outage_is_transient_with_retry_hint() {
	let server = MockServer::start_async().await;
	let (bridge, directory) = build_bridge(&server, [member("member-1", "ada@example.com")]);

	server
		.mock_async(|when, then| {
			when.method(POST).path("/services/oauth2/token");
			then.status(200).header("content-type", "application/json").body(token_body(&server));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path(IDENTITY_PATH);
			then.status(503).header("retry-after", "7").body("maintenance");
		})
		.await;

	let err = bridge.callback("code", "").await.expect_err("Identity outages must fail.");

	match err {
		Error::Transient(TransientError::ProviderEndpoint {
			endpoint, status, retry_after, ..
		}) => {
			assert_eq!(endpoint, ProviderEndpoint::Identity);
			assert_eq!(status, Some(503));
			assert_eq!(retry_after.map(|value| value.whole_seconds()), Some(7));
		},
		other => panic!("Unexpected error: {other:?}."),
	}
	assert!(directory.logins().is_empty());
}

#[tokio::test]
async fn denied_consent_never_reaches_the_provider() {
	let server = MockServer::start_async().await;
	let (bridge, directory) = build_bridge(&server, [member("member-1", "ada@example.com")]);
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/services/oauth2/token");
			then.status(200).header("content-type", "application/json").body(token_body(&server));
		})
		.await;
	let err = bridge
		.handle_callback(CallbackParams::from_query(
			"error=access_denied&error_description=end-user+denied+authorization&state=e30",
		))
		.await
		.expect_err("Denied consent must fail.");

	assert!(matches!(err, Error::AuthorizationDenied { ref error, .. } if error == "access_denied"));
	token_mock.assert_calls_async(0).await;
	assert!(directory.logins().is_empty());
}

#[tokio::test]
async fn handle_callback_delegates_to_the_exchange() {
	let server = MockServer::start_async().await;
	let (bridge, _) = build_bridge(&server, [member("member-1", "ada@example.com")]);

	server
		.mock_async(|when, then| {
			when.method(POST).path("/services/oauth2/token");
			then.status(200).header("content-type", "application/json").body(token_body(&server));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path(IDENTITY_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body(identity_body("ada@example.com"));
		})
		.await;

	let query = format!("code=aPrx%3D%3D&state={}", state(Some("/members"), false));
	let outcome = bridge
		.handle_callback(CallbackParams::from_query(&query))
		.await
		.expect("Callback should succeed.");

	assert_eq!(outcome.redirect.as_str(), "https://www.example.com/members");
}

#[tokio::test]
async fn default_transport_does_not_follow_token_redirects() {
	let server = MockServer::start_async().await;
	let plain = |path: &str| {
		Url::parse(&format!("http://{}{path}", server.address()))
			.expect("Plain mock URL should parse.")
	};
	let descriptor = {
		let mut descriptor = build_descriptor(&server);

		descriptor.endpoints.authorization = plain("/services/oauth2/authorize");
		descriptor.endpoints.token = plain("/services/oauth2/token");

		descriptor
	};
	let directory = MemoryDirectory::with_members([member("member-1", "ada@example.com")]);
	let bridge = ReqwestSsoBridge::new(
		Arc::new(directory.clone()),
		descriptor,
		Arc::new(DefaultProviderStrategy),
		CLIENT_ID,
		Url::parse("https://www.example.com/salesforce-auth/callback")
			.expect("Callback URL should parse."),
	)
	.expect("Bridge should build.")
	.with_client_secret(CLIENT_SECRET);
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/services/oauth2/token");
			then.status(302).header("location", plain("/relay").as_str());
		})
		.await;
	let relay_mock = server
		.mock_async(|when, then| {
			when.path("/relay");
			then.status(200).header("content-type", "application/json").body(token_body(&server));
		})
		.await;

	bridge.callback("code", "").await.expect_err("Redirected token responses must fail.");

	token_mock.assert_calls_async(1).await;
	relay_mock.assert_calls_async(0).await;
	assert!(directory.logins().is_empty());
}
