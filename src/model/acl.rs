//! Access control entries and lists.

// self
use crate::_prelude::*;

/// One access control entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Ace {
	/// Principal the permissions apply to.
	pub principal_id: String,
	/// Granted permissions (e.g. `cmis:read`).
	pub permissions: Vec<String>,
	/// `false` when the entry was inherited rather than set on the object.
	pub is_direct: bool,
}
impl Ace {
	/// Creates a direct entry.
	pub fn new<I, S>(principal_id: impl Into<String>, permissions: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			principal_id: principal_id.into(),
			permissions: permissions.into_iter().map(Into::into).collect(),
			is_direct: true,
		}
	}

	pub(crate) fn validate(&self) -> Result<()> {
		if self.principal_id.trim().is_empty() {
			return Err(Error::invalid_argument("ACE principal id must not be empty"));
		}
		if self.permissions.is_empty() {
			return Err(Error::invalid_argument(format!(
				"ACE for `{}` must grant at least one permission",
				self.principal_id
			)));
		}

		Ok(())
	}
}

/// Access control list attached to an object.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Acl {
	/// Entries in repository order.
	pub aces: Vec<Ace>,
	/// Whether the list fully describes the permissions; `None` when unreported.
	pub is_exact: Option<bool>,
}
impl Acl {
	/// Creates a list from entries.
	pub fn new(aces: Vec<Ace>) -> Self {
		Self { aces, is_exact: None }
	}

	/// Entries set directly on the object.
	pub fn direct_aces(&self) -> impl Iterator<Item = &Ace> {
		self.aces.iter().filter(|ace| ace.is_direct)
	}

	/// Returns `true` when the list carries no entries.
	pub fn is_empty(&self) -> bool {
		self.aces.is_empty()
	}

	/// Direct entries after removing `remove` and adding `add`, merged per principal.
	pub fn merged_direct(&self, add: &[Ace], remove: &[Ace]) -> Vec<Ace> {
		let mut merged = IndexMap::<String, Vec<String>>::new();

		for ace in self.direct_aces() {
			let permissions = merged.entry(ace.principal_id.clone()).or_default();

			for permission in &ace.permissions {
				if !permissions.contains(permission) {
					permissions.push(permission.clone());
				}
			}
		}
		for ace in remove {
			if let Some(permissions) = merged.get_mut(&ace.principal_id) {
				permissions.retain(|p| !ace.permissions.contains(p));
			}
		}
		for ace in add {
			let permissions = merged.entry(ace.principal_id.clone()).or_default();

			for permission in &ace.permissions {
				if !permissions.contains(permission) {
					permissions.push(permission.clone());
				}
			}
		}

		merged
			.into_iter()
			.filter(|(_, permissions)| !permissions.is_empty())
			.map(|(principal, permissions)| Ace::new(principal, permissions))
			.collect()
	}
}

/// How an ACL change propagates to dependent objects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AclPropagation {
	/// Apply to the object only.
	ObjectOnly,
	/// Propagate to children.
	Propagate,
	/// Let the repository decide.
	#[default]
	RepositoryDetermined,
}
impl AclPropagation {
	/// Returns the wire label.
	pub const fn as_str(self) -> &'static str {
		match self {
			AclPropagation::ObjectOnly => "objectonly",
			AclPropagation::Propagate => "propagate",
			AclPropagation::RepositoryDetermined => "repositorydetermined",
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn merged_direct_removes_then_adds_per_principal() {
		let current = Acl::new(vec![
			Ace::new("alice", ["cmis:read", "cmis:write"]),
			Ace { principal_id: "GROUP_EVERYONE".into(), permissions: vec!["cmis:read".into()], is_direct: false },
			Ace::new("bob", ["cmis:read"]),
		]);
		let merged = current.merged_direct(
			&[Ace::new("carol", ["cmis:all"]), Ace::new("alice", ["cmis:all"])],
			&[Ace::new("alice", ["cmis:write"]), Ace::new("bob", ["cmis:read"])],
		);

		assert_eq!(merged, vec![
			Ace::new("alice", ["cmis:read", "cmis:all"]),
			Ace::new("carol", ["cmis:all"]),
		]);
	}

	#[test]
	fn validate_rejects_empty_entries() {
		assert!(Ace::new("", ["cmis:read"]).validate().is_err());
		assert!(Ace::new("alice", Vec::<String>::new()).validate().is_err());
		assert!(Ace::new("alice", ["cmis:read"]).validate().is_ok());
	}
}
