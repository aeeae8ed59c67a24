//! Walks through starting a Salesforce login and parsing the callback the provider sends back.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use url::Url;
// self
use salesforce_auth::{
	auth::{LoginState, MemberId},
	config::BridgeConfig,
	directory::{Member, MemberDirectory, MemoryDirectory},
	flows::{CallbackParams, ReqwestSsoBridge},
};

fn main() -> Result<()> {
	color_eyre::install()?;

	let directory = MemoryDirectory::with_members([
		Member::new(MemberId::new("member-1")?, "ada@example.com").with_name("Ada Lovelace"),
	]);
	let directory: Arc<dyn MemberDirectory> = Arc::new(directory);
	let mut config = BridgeConfig::new(
		"demo-consumer-key",
		"demo-consumer-secret",
		Url::parse("https://www.example.com/")?,
	);

	config.default_login_dest = Some("/admin".into());

	let bridge = ReqwestSsoBridge::from_config(&config, directory)?;
	let authorize_url = bridge.authenticate(Some("/admin/pages"), true)?;

	println!("Register {} as the connected app callback.", bridge.redirect_uri());
	println!("Send your user to {authorize_url}.");

	// Simulate the provider redirecting back with a code and the state we handed out.
	let state = authorize_url
		.query_pairs()
		.find(|(key, _)| key == "state")
		.map(|(_, value)| value.into_owned())
		.unwrap_or_default();
	let params = CallbackParams::from_query(&format!("code=aPrxDemoCode&state={state}"));
	let returned = LoginState::decode_lenient(params.state.as_deref().unwrap_or_default());

	println!(
		"Callback carries code {:?}; after login the member lands on {}.",
		params.code,
		bridge.redirect_policy.resolve(returned.redirect.as_deref())
	);
	println!("Call SsoBridge::handle_callback with these params inside the real request handler.");

	Ok(())
}
