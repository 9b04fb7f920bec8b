//! Change-log events returned by content change discovery.

// self
use crate::{
	_prelude::*,
	error::ParseError,
	model::{Acl, ObjectData, Properties},
};

/// Kind of change recorded in the change log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeType {
	/// Object was created.
	Created,
	/// Object was updated.
	Updated,
	/// Object was deleted.
	Deleted,
	/// Object security (ACL or policy) changed.
	Security,
}
impl FromStr for ChangeType {
	type Err = ParseError;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s {
			"created" => Ok(ChangeType::Created),
			"updated" => Ok(ChangeType::Updated),
			"deleted" => Ok(ChangeType::Deleted),
			"security" => Ok(ChangeType::Security),
			other => Err(ParseError::new(format!("unknown change type `{other}`"))),
		}
	}
}

/// Change metadata attached to a change-log object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeEventInfo {
	/// Kind of change.
	pub change_type: ChangeType,
	/// When the change happened, if reported.
	pub change_time: Option<OffsetDateTime>,
}

/// One change-log entry.
#[derive(Clone, Debug, PartialEq)]
pub struct ChangeEvent {
	/// Affected object.
	pub object_id: String,
	/// Kind of change.
	pub change_type: ChangeType,
	/// When the change happened, if reported.
	pub change_time: Option<OffsetDateTime>,
	/// Properties captured with the event, when requested.
	pub properties: Properties,
	/// Policy identifiers, when requested.
	pub policy_ids: Vec<String>,
	/// ACL, when requested.
	pub acl: Option<Acl>,
}
impl TryFrom<ObjectData> for ChangeEvent {
	type Error = ParseError;

	fn try_from(object: ObjectData) -> std::result::Result<Self, Self::Error> {
		let info = object.change_event_info.ok_or_else(|| ParseError::missing("changeEventInfo"))?;

		Ok(Self {
			object_id: object.id,
			change_type: info.change_type,
			change_time: info.change_time,
			properties: object.properties,
			policy_ids: object.policy_ids,
			acl: object.acl,
		})
	}
}

/// A page of change-log entries.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChangeEvents {
	/// Events in change-log order.
	pub events: Vec<ChangeEvent>,
	/// Token to resume from on the next call; `None` when the repository did not report one.
	pub latest_change_log_token: Option<String>,
	/// Whether more events are available.
	pub has_more_items: bool,
	/// Total count hint; advisory only.
	pub num_items: Option<u64>,
}
