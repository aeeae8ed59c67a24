//! Member directory contract: the host-owned account store and login hook.
//!
//! The bridge never creates accounts or manages sessions itself. It asks the directory for the
//! member that owns a verified email and then hands that member back to the directory to be
//! logged in.

pub mod memory;

pub use memory::MemoryDirectory;

// self
use crate::{
	_prelude::*,
	auth::MemberId,
	identity::Identity,
};

/// Boxed future returned by [`MemberDirectory`] implementations.
pub type DirectoryFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<T, DirectoryError>> + 'a + Send>>;

/// Account store and session hook implemented by the host application.
pub trait MemberDirectory
where
	Self: Send + Sync,
{
	/// Returns the member whose email exactly matches `email`, if any.
	///
	/// When several members share the email, implementations return the first one in their
	/// natural ordering.
	fn find_by_email<'a>(&'a self, email: &'a str) -> DirectoryFuture<'a, Option<Member>>;

	/// Marks the member as logged in, remembering the login when `remember` is set.
	fn log_in<'a>(&'a self, member: &'a Member, remember: bool) -> DirectoryFuture<'a, ()>;

	/// Extension hook invoked after login with the provider identity that matched.
	///
	/// The default implementation does nothing.
	fn on_identify<'a>(
		&'a self,
		_member: &'a Member,
		_identity: &'a Identity,
	) -> DirectoryFuture<'a, ()> {
		Box::pin(async { Ok(()) })
	}
}

/// Local member account resolved from a provider identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
	/// Directory identifier.
	pub id: MemberId,
	/// Email used for identity matching.
	pub email: String,
	/// Optional display name.
	pub name: Option<String>,
}
impl Member {
	/// Creates a member without a display name.
	pub fn new(id: MemberId, email: impl Into<String>) -> Self {
		Self { id, email: email.into(), name: None }
	}

	/// Sets the display name.
	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());

		self
	}
}

/// Error type produced by [`MemberDirectory`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum DirectoryError {
	/// Backend-level failure for the account store.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
