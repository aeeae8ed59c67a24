//! Serde-friendly bridge configuration.

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenSecret},
	error::ConfigError,
	provider::ProviderDescriptor,
	redirect::{self, RedirectPolicy},
};

/// Callback path appended to the base URL when none is configured.
pub const DEFAULT_CALLBACK_PATH: &str = "salesforce-auth/callback";

/// Settings needed to stand up an [`SsoBridge`](crate::flows::SsoBridge).
///
/// ```json
/// {
///   "client_id": "3MVG9...",
///   "client_secret": "...",
///   "base_url": "https://www.example.com/",
///   "default_login_dest": "/admin"
/// }
/// ```
#[derive(Clone, Debug, Deserialize)]
pub struct BridgeConfig {
	/// Connected app consumer key.
	pub client_id: String,
	/// Connected app consumer secret.
	pub client_secret: TokenSecret,
	/// Public base URL of the host site.
	pub base_url: Url,
	/// Callback path joined under `base_url`.
	#[serde(default = "default_callback_path")]
	pub callback_path: String,
	/// Where members land when no site redirect was requested.
	#[serde(default)]
	pub default_login_dest: Option<String>,
	/// Login host, e.g. `test.salesforce.com` for sandboxes. Defaults to production.
	#[serde(default)]
	pub login_domain: Option<String>,
	/// Scopes that replace the descriptor default.
	#[serde(default)]
	pub scope: Option<ScopeSet>,
}
impl BridgeConfig {
	/// Creates a configuration with the default callback path and no optional settings.
	pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>, base_url: Url) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret: TokenSecret::new(client_secret),
			base_url,
			callback_path: default_callback_path(),
			default_login_dest: None,
			login_domain: None,
			scope: None,
		}
	}

	/// Absolute callback URL registered with the provider.
	pub fn callback_url(&self) -> Result<Url, ConfigError> {
		redirect::join_links(&self.base_url, &self.callback_path)
	}

	/// Provider descriptor for the configured login domain.
	pub fn descriptor(&self) -> Result<ProviderDescriptor, ConfigError> {
		let mut descriptor = match self.login_domain.as_deref().map(str::trim) {
			Some(domain) if !domain.is_empty() => ProviderDescriptor::salesforce_domain(domain)?,
			_ => ProviderDescriptor::salesforce()?,
		};

		if let Some(scope) = &self.scope {
			descriptor.scope = scope.clone();
		}

		Ok(descriptor)
	}

	/// Redirect policy rooted at the base URL.
	pub fn redirect_policy(&self) -> RedirectPolicy {
		let policy = RedirectPolicy::new(self.base_url.clone());

		match &self.default_login_dest {
			Some(dest) => policy.with_default_login_dest(dest.clone()),
			None => policy,
		}
	}
}

fn default_callback_path() -> String {
	DEFAULT_CALLBACK_PATH.into()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::provider::ProviderDescriptorError;

	fn parse(json: &str) -> BridgeConfig {
		serde_json::from_str(json).expect("Config fixture should deserialize.")
	}

	#[test]
	fn minimal_config_uses_defaults() {
		let config = parse(
			r#"{"client_id":"cid","client_secret":"shh","base_url":"https://www.example.com/site"}"#,
		);

		assert_eq!(config.callback_path, DEFAULT_CALLBACK_PATH);
		assert_eq!(
			config.callback_url().expect("Callback URL should build.").as_str(),
			"https://www.example.com/site/salesforce-auth/callback"
		);

		let descriptor = config.descriptor().expect("Descriptor should build.");

		assert_eq!(descriptor.endpoints.token.host_str(), Some("login.salesforce.com"));
		assert_eq!(
			config.redirect_policy().resolve(None).as_str(),
			"https://www.example.com/site/"
		);
		assert!(!format!("{config:?}").contains("shh"), "Secrets must stay redacted.");
	}

	#[test]
	fn optional_settings_are_applied() {
		let config = parse(
			r#"{
				"client_id": "cid",
				"client_secret": "shh",
				"base_url": "https://www.example.com/",
				"callback_path": "/sso/return",
				"default_login_dest": "/admin",
				"login_domain": "test.salesforce.com",
				"scope": ["id", "api"]
			}"#,
		);
		let descriptor = config.descriptor().expect("Descriptor should build.");

		assert_eq!(
			config.callback_url().expect("Callback URL should build.").as_str(),
			"https://www.example.com/sso/return"
		);
		assert_eq!(descriptor.endpoints.authorization.host_str(), Some("test.salesforce.com"));
		assert_eq!(descriptor.scope.normalized(), "api id");
		assert_eq!(config.redirect_policy().resolve(None).as_str(), "https://www.example.com/admin");
	}

	#[test]
	fn invalid_login_domain_is_a_config_error() {
		let mut config = BridgeConfig::new(
			"cid",
			"shh",
			Url::parse("https://www.example.com/").expect("Base URL should parse."),
		);

		config.login_domain = Some("not a host".into());

		assert!(matches!(config.descriptor(), Err(ConfigError::Descriptor(_))));
	}

	#[test]
	fn login_domain_with_scheme_or_path_is_a_config_error() {
		for domain in ["https://test.salesforce.com", "evil.example/x?"] {
			let config = parse(&format!(
				r#"{{"client_id":"cid","client_secret":"shh","base_url":"https://www.example.com/","login_domain":"{domain}"}}"#
			));

			assert!(
				matches!(
					config.descriptor(),
					Err(ConfigError::Descriptor(ProviderDescriptorError::InvalidDomain { .. }))
				),
				"{domain:?} must be rejected."
			);
		}
	}
}
