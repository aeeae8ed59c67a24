//! Post-login redirect resolution with same-site enforcement.

// self
use crate::{_prelude::*, error::ConfigError};

/// Decides where a freshly logged-in member is sent.
///
/// Candidates are taken in order: the redirect carried in the login state (only when it is a
/// site URL), the configured default login destination, then the site's base URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RedirectPolicy {
	base_url: Url,
	default_login_dest: Option<String>,
}
impl RedirectPolicy {
	/// Creates a policy rooted at `base_url`.
	pub fn new(base_url: Url) -> Self {
		Self { base_url: as_directory(base_url), default_login_dest: None }
	}

	/// Creates a policy rooted at the origin of `url` (path, query and fragment dropped).
	pub fn for_site(url: &Url) -> Self {
		let mut base = url.clone();

		base.set_path("/");
		base.set_query(None);
		base.set_fragment(None);

		Self::new(base)
	}

	/// Sets the destination used when no acceptable redirect was requested.
	pub fn with_default_login_dest(mut self, dest: impl Into<String>) -> Self {
		let dest = dest.into();

		self.default_login_dest = if dest.trim().is_empty() { None } else { Some(dest) };

		self
	}

	/// Base URL every site URL must share an origin with.
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	/// Returns true when `candidate` resolves to the same origin as the base URL.
	///
	/// Backslashes and control characters are rejected outright because browsers normalize
	/// them in ways that can turn a path into a foreign host.
	pub fn is_site_url(&self, candidate: &str) -> bool {
		self.site_url(candidate).is_some()
	}

	/// Picks the redirect target for a completed login.
	pub fn resolve(&self, requested: Option<&str>) -> Url {
		if let Some(url) = requested.and_then(|candidate| self.site_url(candidate)) {
			return url;
		}
		if let Some(url) = self.default_login_dest.as_deref().and_then(|dest| self.join(dest)) {
			return url;
		}

		self.base_url.clone()
	}

	fn site_url(&self, candidate: &str) -> Option<Url> {
		let candidate = candidate.trim();

		if candidate.is_empty() || candidate.chars().any(|c| c == '\\' || c.is_control()) {
			return None;
		}

		self.base_url.join(candidate).ok().filter(|url| url.origin() == self.base_url.origin())
	}

	fn join(&self, dest: &str) -> Option<Url> {
		Url::parse(dest).or_else(|_| self.base_url.join(dest)).ok()
	}
}

/// Joins `path` underneath `base`, treating the base as a directory.
///
/// Unlike [`Url::join`], a base of `https://example.com/site` yields
/// `https://example.com/site/<path>` instead of replacing the last segment.
pub fn join_links(base: &Url, path: &str) -> Result<Url, ConfigError> {
	as_directory(base.clone())
		.join(path.trim_start_matches('/'))
		.map_err(|source| ConfigError::InvalidRedirect { source })
}

fn as_directory(mut url: Url) -> Url {
	if !url.path().ends_with('/') {
		let path = format!("{}/", url.path());

		url.set_path(&path);
	}

	url
}
