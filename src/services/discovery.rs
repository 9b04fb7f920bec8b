//! Discovery service: change log and queries.

// self
use crate::{
	_prelude::*,
	http::RequestHandle,
	model::{ChangeEvents, QueryResults},
	obs::OperationKind,
	services::{BindingContext, OperationContext, atompub, browser},
	session::BindingKind,
};

/// Change-log and query access.
#[derive(Clone, Debug)]
pub struct DiscoveryService {
	context: BindingContext,
}
impl DiscoveryService {
	/// Creates the service.
	pub fn new(context: BindingContext) -> Self {
		Self { context }
	}

	/// Change-log events after `change_log_token` (from the start of the log when `None`).
	///
	/// Resume with [`ChangeEvents::latest_change_log_token`] while `has_more_items` is set.
	pub fn get_content_changes(
		&self,
		change_log_token: Option<String>,
		include_properties: bool,
		max_items: Option<u32>,
	) -> RequestHandle<ChangeEvents> {
		let cx = self.context.clone();

		self.context.spawn(OperationKind::Discovery, "get_content_changes", async move {
			let token = change_log_token.as_deref();

			match cx.session().binding() {
				BindingKind::Browser => browser::get_content_changes(&cx, token, include_properties, max_items).await,
				BindingKind::AtomPub => atompub::get_content_changes(&cx, token, include_properties, max_items).await,
			}
		})
	}

	/// Runs a CMIS query; paging and inclusion come from `operation`.
	pub fn query(
		&self,
		statement: impl Into<String>,
		search_all_versions: bool,
		operation: &OperationContext,
	) -> RequestHandle<QueryResults> {
		let cx = self.context.clone();
		let statement = statement.into();
		let operation = operation.clone();

		self.context.spawn(OperationKind::Discovery, "query", async move {
			if statement.trim().is_empty() {
				return Err(Error::invalid_argument("query statement must not be empty"));
			}

			match cx.session().binding() {
				BindingKind::Browser => browser::query(&cx, &statement, search_all_versions, &operation).await,
				BindingKind::AtomPub => atompub::query(&cx, &statement, search_all_versions, &operation).await,
			}
		})
	}
}
