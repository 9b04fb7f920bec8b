//! Object service: retrieval, creation, update, deletion, and renditions.

// self
use crate::{
	_prelude::*,
	http::{ProgressCallback, RequestBody, RequestHandle},
	model::{FailedToDelete, ObjectData, Properties, Rendition, property_ids},
	obs::OperationKind,
	services::{BindingContext, OperationContext, atompub, browser},
	session::BindingKind,
};

/// Document content to upload.
pub struct ContentStream {
	/// File name reported to the repository.
	pub file_name: String,
	/// MIME type of the content.
	pub mime_type: String,
	/// Content bytes, in memory or streamed with a declared length.
	pub body: RequestBody,
	/// Upload progress callback.
	pub progress: Option<ProgressCallback>,
}
impl ContentStream {
	/// Creates a content stream.
	pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, body: impl Into<RequestBody>) -> Self {
		Self { file_name: file_name.into(), mime_type: mime_type.into(), body: body.into(), progress: None }
	}

	/// Reports upload progress as `(bytes_sent, bytes_total)` of the whole request.
	pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
		self.progress = Some(progress);

		self
	}
}
impl Debug for ContentStream {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ContentStream")
			.field("file_name", &self.file_name)
			.field("mime_type", &self.mime_type)
			.field("length", &self.body.length())
			.field("progress", &self.progress.is_some())
			.finish()
	}
}

/// What happens to objects filed in the deleted tree and elsewhere.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum UnfileObjects {
	/// Unfile objects that are also filed elsewhere; delete the rest.
	Unfile,
	/// Delete objects filed only in the tree.
	DeleteSingleFiled,
	/// Delete every object in the tree.
	#[default]
	Delete,
}
impl UnfileObjects {
	/// Returns the wire label.
	pub const fn as_str(self) -> &'static str {
		match self {
			UnfileObjects::Unfile => "unfile",
			UnfileObjects::DeleteSingleFiled => "deletesinglefiled",
			UnfileObjects::Delete => "delete",
		}
	}
}

/// Options for [`ObjectService::delete_tree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeleteTreeOptions {
	/// Delete every version of documents in the tree.
	pub all_versions: bool,
	/// Handling of multi-filed objects.
	pub unfile: UnfileObjects,
	/// Keep going after the first failure.
	pub continue_on_failure: bool,
}
impl Default for DeleteTreeOptions {
	fn default() -> Self {
		Self { all_versions: true, unfile: UnfileObjects::Delete, continue_on_failure: false }
	}
}

/// Object retrieval and mutation.
#[derive(Clone, Debug)]
pub struct ObjectService {
	context: BindingContext,
}
impl ObjectService {
	/// Creates the service.
	pub fn new(context: BindingContext) -> Self {
		Self { context }
	}

	/// Fetches one object by id.
	pub fn get_object(&self, object_id: impl Into<String>, operation: &OperationContext) -> RequestHandle<ObjectData> {
		let cx = self.context.clone();
		let object_id = object_id.into();
		let operation = operation.clone();

		self.context.spawn(OperationKind::Object, "get_object", async move {
			require_id("object id", &object_id)?;

			match cx.session().binding() {
				BindingKind::Browser => browser::get_object(&cx, &object_id, &operation).await,
				BindingKind::AtomPub => atompub::get_object(&cx, &object_id, &operation).await,
			}
		})
	}

	/// Fetches one object by its absolute path (`/a/b`).
	pub fn get_object_by_path(&self, path: impl Into<String>, operation: &OperationContext) -> RequestHandle<ObjectData> {
		let cx = self.context.clone();
		let path = path.into();
		let operation = operation.clone();

		self.context.spawn(OperationKind::Object, "get_object_by_path", async move {
			if !path.starts_with('/') {
				return Err(Error::invalid_argument(format!("path `{path}` must be absolute")));
			}

			match cx.session().binding() {
				BindingKind::Browser => browser::get_object_by_path(&cx, &path, &operation).await,
				BindingKind::AtomPub => atompub::get_object_by_path(&cx, &path, &operation).await,
			}
		})
	}

	/// Creates a folder under `parent_id`; `properties` must name the folder and its type.
	pub fn create_folder(&self, parent_id: impl Into<String>, properties: Properties) -> RequestHandle<ObjectData> {
		let cx = self.context.clone();
		let parent_id = parent_id.into();

		self.context.spawn(OperationKind::Object, "create_folder", async move {
			require_id("parent folder id", &parent_id)?;
			require_creation_properties(&properties)?;

			match cx.session().binding() {
				BindingKind::Browser => browser::create_folder(&cx, &parent_id, &properties).await,
				BindingKind::AtomPub => atompub::create_folder(&cx, &parent_id, &properties).await,
			}
		})
	}

	/// Creates a document under `parent_id`, optionally with content.
	pub fn create_document(
		&self,
		parent_id: impl Into<String>,
		properties: Properties,
		content: Option<ContentStream>,
	) -> RequestHandle<ObjectData> {
		let cx = self.context.clone();
		let parent_id = parent_id.into();

		self.context.spawn(OperationKind::Object, "create_document", async move {
			require_id("parent folder id", &parent_id)?;
			require_creation_properties(&properties)?;

			match cx.session().binding() {
				BindingKind::Browser => browser::create_document(&cx, &parent_id, &properties, content).await,
				BindingKind::AtomPub => atompub::create_document(&cx, &parent_id, &properties, content).await,
			}
		})
	}

	/// Updates properties; `change_token` enables optimistic locking.
	pub fn update_properties(
		&self,
		object_id: impl Into<String>,
		properties: Properties,
		change_token: Option<String>,
	) -> RequestHandle<ObjectData> {
		let cx = self.context.clone();
		let object_id = object_id.into();

		self.context.spawn(OperationKind::Object, "update_properties", async move {
			require_id("object id", &object_id)?;

			if properties.is_empty() {
				return Err(Error::invalid_argument("at least one property must be updated"));
			}

			match cx.session().binding() {
				BindingKind::Browser =>
					browser::update_properties(&cx, &object_id, &properties, change_token.as_deref()).await,
				BindingKind::AtomPub =>
					atompub::update_properties(&cx, &object_id, &properties, change_token.as_deref()).await,
			}
		})
	}

	/// Deletes one object.
	pub fn delete_object(&self, object_id: impl Into<String>, all_versions: bool) -> RequestHandle<()> {
		let cx = self.context.clone();
		let object_id = object_id.into();

		self.context.spawn(OperationKind::Object, "delete_object", async move {
			require_id("object id", &object_id)?;

			match cx.session().binding() {
				BindingKind::Browser => browser::delete_object(&cx, &object_id, all_versions).await?,
				BindingKind::AtomPub => atompub::delete_object(&cx, &object_id, all_versions).await?,
			}

			cx.session().link_cache().remove(&object_id);

			Ok(())
		})
	}

	/// Deletes a folder and its descendants; objects that could not be removed are reported in
	/// the returned value rather than as an error.
	pub fn delete_tree(&self, folder_id: impl Into<String>, options: DeleteTreeOptions) -> RequestHandle<FailedToDelete> {
		let cx = self.context.clone();
		let folder_id = folder_id.into();

		self.context.spawn(OperationKind::Object, "delete_tree", async move {
			require_id("folder id", &folder_id)?;

			let failed = match cx.session().binding() {
				BindingKind::Browser => browser::delete_tree(&cx, &folder_id, options).await?,
				BindingKind::AtomPub => atompub::delete_tree(&cx, &folder_id, options).await?,
			};

			if !failed.ids.contains(&folder_id) {
				cx.session().link_cache().remove(&folder_id);
			}

			Ok(failed)
		})
	}

	/// Lists renditions matching `rendition_filter` (`*` for all).
	pub fn get_renditions(
		&self,
		object_id: impl Into<String>,
		rendition_filter: impl Into<String>,
	) -> RequestHandle<Vec<Rendition>> {
		let cx = self.context.clone();
		let object_id = object_id.into();
		let filter = rendition_filter.into();

		self.context.spawn(OperationKind::Object, "get_renditions", async move {
			require_id("object id", &object_id)?;

			match cx.session().binding() {
				BindingKind::Browser => browser::get_renditions(&cx, &object_id, &filter).await,
				BindingKind::AtomPub => atompub::get_renditions(&cx, &object_id, &filter).await,
			}
		})
	}
}

pub(crate) fn require_id(label: &str, id: &str) -> Result<()> {
	if id.trim().is_empty() {
		return Err(Error::invalid_argument(format!("{label} must not be empty")));
	}

	Ok(())
}

fn require_creation_properties(properties: &Properties) -> Result<()> {
	for id in [property_ids::NAME, property_ids::OBJECT_TYPE_ID] {
		if properties.text(id).is_none_or(|value| value.trim().is_empty()) {
			return Err(Error::invalid_argument(format!("`{id}` is required to create an object")));
		}
	}

	Ok(())
}
