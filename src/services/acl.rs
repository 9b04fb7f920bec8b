//! ACL service: read and modify access control lists.

// self
use crate::{
	_prelude::*,
	http::RequestHandle,
	model::{Ace, Acl, AclPropagation},
	obs::OperationKind,
	services::{BindingContext, atompub, browser, object::require_id},
	session::BindingKind,
};

/// Access control list management.
#[derive(Clone, Debug)]
pub struct AclService {
	context: BindingContext,
}
impl AclService {
	/// Creates the service.
	pub fn new(context: BindingContext) -> Self {
		Self { context }
	}

	/// The object's current ACL.
	pub fn retrieve_acl(&self, object_id: impl Into<String>, only_basic_permissions: bool) -> RequestHandle<Acl> {
		let cx = self.context.clone();
		let object_id = object_id.into();

		self.context.spawn(OperationKind::Acl, "retrieve_acl", async move {
			require_id("object id", &object_id)?;

			match cx.session().binding() {
				BindingKind::Browser => browser::retrieve_acl(&cx, &object_id, only_basic_permissions).await,
				BindingKind::AtomPub => atompub::retrieve_acl(&cx, &object_id, only_basic_permissions).await,
			}
		})
	}

	/// Adds and removes entries, returning the resulting ACL.
	pub fn apply_acl(
		&self,
		object_id: impl Into<String>,
		add: Vec<Ace>,
		remove: Vec<Ace>,
		propagation: AclPropagation,
	) -> RequestHandle<Acl> {
		let cx = self.context.clone();
		let object_id = object_id.into();

		self.context.spawn(OperationKind::Acl, "apply_acl", async move {
			require_id("object id", &object_id)?;
			add.iter().chain(&remove).try_for_each(Ace::validate)?;

			if add.is_empty() && remove.is_empty() {
				return Err(Error::invalid_argument("an ACL change must add or remove at least one entry"));
			}

			match cx.session().binding() {
				BindingKind::Browser => browser::apply_acl(&cx, &object_id, &add, &remove, propagation).await,
				BindingKind::AtomPub => atompub::apply_acl(&cx, &object_id, &add, &remove, propagation).await,
			}
		})
	}

	/// Replaces the object's direct entries with `aces`.
	pub fn set_acl(&self, object_id: impl Into<String>, aces: Vec<Ace>) -> RequestHandle<Acl> {
		let cx = self.context.clone();
		let object_id = object_id.into();

		self.context.spawn(OperationKind::Acl, "set_acl", async move {
			require_id("object id", &object_id)?;
			aces.iter().try_for_each(Ace::validate)?;

			match cx.session().binding() {
				BindingKind::Browser => browser::set_acl(&cx, &object_id, &aces).await,
				BindingKind::AtomPub => atompub::set_acl(&cx, &object_id, &aces).await,
			}
		})
	}
}
