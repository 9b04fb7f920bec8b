//! Repository service: repository descriptions and type definitions.

// self
use crate::{
	_prelude::*,
	http::RequestHandle,
	model::{RepositoryInfo, TypeDefinition},
	obs::{OperationKind, debug_event},
	services::{BindingContext, atompub, browser, object::require_id},
	session::BindingKind,
};

/// Repository-level metadata.
#[derive(Clone, Debug)]
pub struct RepositoryService {
	context: BindingContext,
}
impl RepositoryService {
	/// Creates the service.
	pub fn new(context: BindingContext) -> Self {
		Self { context }
	}

	/// Every repository the endpoint describes, keyed by id in document order.
	pub fn repository_infos(&self) -> RequestHandle<IndexMap<String, RepositoryInfo>> {
		let cx = self.context.clone();

		self.context.spawn(OperationKind::Repository, "repository_infos", async move { repository_infos(&cx).await })
	}

	/// One type definition, served from the session type cache when present.
	pub fn type_definition(&self, type_id: impl Into<String>) -> RequestHandle<Arc<TypeDefinition>> {
		let cx = self.context.clone();
		let type_id = type_id.into();

		self.context.spawn(OperationKind::Repository, "type_definition", async move {
			require_id("type id", &type_id)?;

			type_definition(&cx, &type_id).await
		})
	}
}

pub(crate) async fn repository_infos(cx: &BindingContext) -> Result<IndexMap<String, RepositoryInfo>> {
	match cx.session().binding() {
		BindingKind::Browser => browser::repository_infos(cx).await,
		BindingKind::AtomPub => atompub::repository_infos(cx).await,
	}
}

pub(crate) async fn type_definition(cx: &BindingContext, type_id: &str) -> Result<Arc<TypeDefinition>> {
	if let Some(definition) = cx.session().type_cache().get(type_id) {
		return Ok(definition);
	}

	debug_event!(type_id, "type definition cache miss");

	let definition = match cx.session().binding() {
		BindingKind::Browser => browser::fetch_type_definition(cx, type_id).await?,
		BindingKind::AtomPub => atompub::fetch_type_definition(cx, type_id).await?,
	};

	Ok(cx.session().type_cache().put(definition))
}
