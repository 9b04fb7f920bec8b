//! Navigation service: folder children.

// self
use crate::{
	_prelude::*,
	http::RequestHandle,
	model::ObjectList,
	obs::OperationKind,
	services::{BindingContext, OperationContext, atompub, browser, object::require_id},
	session::BindingKind,
};

/// Folder traversal.
#[derive(Clone, Debug)]
pub struct NavigationService {
	context: BindingContext,
}
impl NavigationService {
	/// Creates the service.
	pub fn new(context: BindingContext) -> Self {
		Self { context }
	}

	/// One page of the children of `folder_id`, paged by `operation.max_items`/`skip_count`.
	pub fn get_children(&self, folder_id: impl Into<String>, operation: &OperationContext) -> RequestHandle<ObjectList> {
		let cx = self.context.clone();
		let folder_id = folder_id.into();
		let operation = operation.clone();

		self.context.spawn(OperationKind::Navigation, "get_children", async move {
			require_id("folder id", &folder_id)?;

			match cx.session().binding() {
				BindingKind::Browser => browser::get_children(&cx, &folder_id, &operation).await,
				BindingKind::AtomPub => atompub::get_children(&cx, &folder_id, &operation).await,
			}
		})
	}
}
