//! Well-known CMIS property identifiers.

// self
use crate::model::{Cardinality, PropertyType};

/// `cmis:name`.
pub const NAME: &str = "cmis:name";
/// `cmis:objectId`.
pub const OBJECT_ID: &str = "cmis:objectId";
/// `cmis:objectTypeId`.
pub const OBJECT_TYPE_ID: &str = "cmis:objectTypeId";
/// `cmis:baseTypeId`.
pub const BASE_TYPE_ID: &str = "cmis:baseTypeId";
/// `cmis:secondaryObjectTypeIds`.
pub const SECONDARY_OBJECT_TYPE_IDS: &str = "cmis:secondaryObjectTypeIds";
/// `cmis:description`.
pub const DESCRIPTION: &str = "cmis:description";
/// `cmis:createdBy`.
pub const CREATED_BY: &str = "cmis:createdBy";
/// `cmis:creationDate`.
pub const CREATION_DATE: &str = "cmis:creationDate";
/// `cmis:lastModifiedBy`.
pub const LAST_MODIFIED_BY: &str = "cmis:lastModifiedBy";
/// `cmis:lastModificationDate`.
pub const LAST_MODIFICATION_DATE: &str = "cmis:lastModificationDate";
/// `cmis:changeToken`.
pub const CHANGE_TOKEN: &str = "cmis:changeToken";
/// `cmis:path`.
pub const PATH: &str = "cmis:path";
/// `cmis:parentId`.
pub const PARENT_ID: &str = "cmis:parentId";
/// `cmis:allowedChildObjectTypeIds`.
pub const ALLOWED_CHILD_OBJECT_TYPE_IDS: &str = "cmis:allowedChildObjectTypeIds";
/// `cmis:isImmutable`.
pub const IS_IMMUTABLE: &str = "cmis:isImmutable";
/// `cmis:isLatestVersion`.
pub const IS_LATEST_VERSION: &str = "cmis:isLatestVersion";
/// `cmis:isMajorVersion`.
pub const IS_MAJOR_VERSION: &str = "cmis:isMajorVersion";
/// `cmis:isLatestMajorVersion`.
pub const IS_LATEST_MAJOR_VERSION: &str = "cmis:isLatestMajorVersion";
/// `cmis:versionLabel`.
pub const VERSION_LABEL: &str = "cmis:versionLabel";
/// `cmis:versionSeriesId`.
pub const VERSION_SERIES_ID: &str = "cmis:versionSeriesId";
/// `cmis:isVersionSeriesCheckedOut`.
pub const IS_VERSION_SERIES_CHECKED_OUT: &str = "cmis:isVersionSeriesCheckedOut";
/// `cmis:versionSeriesCheckedOutBy`.
pub const VERSION_SERIES_CHECKED_OUT_BY: &str = "cmis:versionSeriesCheckedOutBy";
/// `cmis:versionSeriesCheckedOutId`.
pub const VERSION_SERIES_CHECKED_OUT_ID: &str = "cmis:versionSeriesCheckedOutId";
/// `cmis:checkinComment`.
pub const CHECKIN_COMMENT: &str = "cmis:checkinComment";
/// `cmis:contentStreamLength`.
pub const CONTENT_STREAM_LENGTH: &str = "cmis:contentStreamLength";
/// `cmis:contentStreamMimeType`.
pub const CONTENT_STREAM_MIME_TYPE: &str = "cmis:contentStreamMimeType";
/// `cmis:contentStreamFileName`.
pub const CONTENT_STREAM_FILE_NAME: &str = "cmis:contentStreamFileName";
/// `cmis:contentStreamId`.
pub const CONTENT_STREAM_ID: &str = "cmis:contentStreamId";
/// `cmis:sourceId`.
pub const SOURCE_ID: &str = "cmis:sourceId";
/// `cmis:targetId`.
pub const TARGET_ID: &str = "cmis:targetId";
/// `cmis:policyText`.
pub const POLICY_TEXT: &str = "cmis:policyText";

/// Returns the fixed type and cardinality of a core property, if `id` names one.
pub fn core_property_shape(id: &str) -> Option<(PropertyType, Cardinality)> {
	let shape = match id {
		CREATION_DATE | LAST_MODIFICATION_DATE => (PropertyType::DateTime, Cardinality::Single),
		CONTENT_STREAM_LENGTH => (PropertyType::Integer, Cardinality::Single),
		IS_IMMUTABLE
		| IS_LATEST_VERSION
		| IS_MAJOR_VERSION
		| IS_LATEST_MAJOR_VERSION
		| IS_VERSION_SERIES_CHECKED_OUT => (PropertyType::Boolean, Cardinality::Single),
		OBJECT_ID | OBJECT_TYPE_ID | BASE_TYPE_ID | PARENT_ID | VERSION_SERIES_ID
		| VERSION_SERIES_CHECKED_OUT_ID | CONTENT_STREAM_ID | SOURCE_ID | TARGET_ID =>
			(PropertyType::Id, Cardinality::Single),
		SECONDARY_OBJECT_TYPE_IDS | ALLOWED_CHILD_OBJECT_TYPE_IDS =>
			(PropertyType::Id, Cardinality::Multiple),
		NAME | DESCRIPTION | CREATED_BY | LAST_MODIFIED_BY | CHANGE_TOKEN | PATH
		| VERSION_LABEL | VERSION_SERIES_CHECKED_OUT_BY | CHECKIN_COMMENT
		| CONTENT_STREAM_MIME_TYPE | CONTENT_STREAM_FILE_NAME | POLICY_TEXT =>
			(PropertyType::String, Cardinality::Single),
		_ => return None,
	};

	Some(shape)
}
