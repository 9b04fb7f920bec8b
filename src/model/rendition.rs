//! Alternate representations of a document.

/// A rendition of a document (thumbnail, preview, ...).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Rendition {
	/// Stream identifier used to fetch the rendition content.
	pub stream_id: String,
	/// MIME type.
	pub mime_type: Option<String>,
	/// Content length in bytes.
	pub length: Option<u64>,
	/// Rendition kind (e.g. `cmis:thumbnail`).
	pub kind: Option<String>,
	/// Human-readable title.
	pub title: Option<String>,
	/// Pixel height, for image renditions.
	pub height: Option<u64>,
	/// Pixel width, for image renditions.
	pub width: Option<u64>,
	/// Identifier of a document that backs this rendition.
	pub rendition_document_id: Option<String>,
}
