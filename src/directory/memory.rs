//! Thread-safe in-memory [`MemberDirectory`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::MemberId,
	directory::{DirectoryError, DirectoryFuture, Member, MemberDirectory},
	identity::Identity,
};

/// Login recorded by [`MemoryDirectory::log_in`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoginRecord {
	/// Member that was logged in.
	pub member: MemberId,
	/// Remember-me flag passed with the login.
	pub remember: bool,
	/// When the login happened.
	pub at: OffsetDateTime,
}

#[derive(Debug, Default)]
struct DirectoryState {
	members: BTreeMap<MemberId, Member>,
	logins: Vec<LoginRecord>,
	identities: Vec<(MemberId, Identity)>,
}

/// Storage backend that keeps members and login events in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryDirectory(Arc<RwLock<DirectoryState>>);
impl MemoryDirectory {
	/// Builds a directory seeded with the provided members.
	pub fn with_members(members: impl IntoIterator<Item = Member>) -> Self {
		let directory = Self::default();

		for member in members {
			directory.insert(member);
		}

		directory
	}

	/// Inserts or replaces a member.
	pub fn insert(&self, member: Member) {
		self.0.write().members.insert(member.id.clone(), member);
	}

	/// Removes a member, returning it when present.
	pub fn remove(&self, id: &MemberId) -> Option<Member> {
		self.0.write().members.remove(id)
	}

	/// Every login recorded so far, oldest first.
	pub fn logins(&self) -> Vec<LoginRecord> {
		self.0.read().logins.clone()
	}

	/// Identities passed to [`MemberDirectory::on_identify`], oldest first.
	pub fn identities(&self) -> Vec<(MemberId, Identity)> {
		self.0.read().identities.clone()
	}

	fn find_now(&self, email: &str) -> Option<Member> {
		self.0.read().members.values().find(|member| member.email == email).cloned()
	}

	fn log_in_now(&self, member: &Member, remember: bool) -> Result<(), DirectoryError> {
		let mut state = self.0.write();

		if !state.members.contains_key(&member.id) {
			return Err(DirectoryError::Backend {
				message: format!("member {} is not in the directory", member.id),
			});
		}

		state.logins.push(LoginRecord {
			member: member.id.clone(),
			remember,
			at: OffsetDateTime::now_utc(),
		});

		Ok(())
	}
}
impl MemberDirectory for MemoryDirectory {
	fn find_by_email<'a>(&'a self, email: &'a str) -> DirectoryFuture<'a, Option<Member>> {
		Box::pin(async move { Ok(self.find_now(email)) })
	}

	fn log_in<'a>(&'a self, member: &'a Member, remember: bool) -> DirectoryFuture<'a, ()> {
		Box::pin(async move { self.log_in_now(member, remember) })
	}

	fn on_identify<'a>(
		&'a self,
		member: &'a Member,
		identity: &'a Identity,
	) -> DirectoryFuture<'a, ()> {
		Box::pin(async move {
			self.0.write().identities.push((member.id.clone(), identity.clone()));

			Ok(())
		})
	}
}
