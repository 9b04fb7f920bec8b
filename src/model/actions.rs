//! Allowable actions reported per object.

// self
use crate::_prelude::*;

/// `canDeleteObject`.
pub const CAN_DELETE_OBJECT: &str = "canDeleteObject";
/// `canUpdateProperties`.
pub const CAN_UPDATE_PROPERTIES: &str = "canUpdateProperties";
/// `canGetProperties`.
pub const CAN_GET_PROPERTIES: &str = "canGetProperties";
/// `canGetChildren`.
pub const CAN_GET_CHILDREN: &str = "canGetChildren";
/// `canCreateDocument`.
pub const CAN_CREATE_DOCUMENT: &str = "canCreateDocument";
/// `canCreateFolder`.
pub const CAN_CREATE_FOLDER: &str = "canCreateFolder";
/// `canDeleteTree`.
pub const CAN_DELETE_TREE: &str = "canDeleteTree";
/// `canGetContentStream`.
pub const CAN_GET_CONTENT_STREAM: &str = "canGetContentStream";
/// `canGetRenditions`.
pub const CAN_GET_RENDITIONS: &str = "canGetRenditions";
/// `canGetACL`.
pub const CAN_GET_ACL: &str = "canGetACL";
/// `canApplyACL`.
pub const CAN_APPLY_ACL: &str = "canApplyACL";

/// Set of actions the current principal may perform on an object.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AllowableActions {
	actions: BTreeSet<String>,
}
impl AllowableActions {
	/// Builds the set from `(action, allowed)` pairs, keeping only allowed actions.
	pub fn from_flags<I, S>(flags: I) -> Self
	where
		I: IntoIterator<Item = (S, bool)>,
		S: Into<String>,
	{
		Self {
			actions: flags
				.into_iter()
				.filter_map(|(action, allowed)| allowed.then(|| action.into()))
				.collect(),
		}
	}

	/// Returns `true` when `action` is allowed.
	pub fn allows(&self, action: &str) -> bool {
		self.actions.contains(action)
	}

	/// Iterates allowed actions in lexical order.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.actions.iter().map(String::as_str)
	}
}
