//! Async CMIS client bindings: browser (JSON) and AtomPub (XML) wire codecs, a cancellable
//! HTTP request engine, per-session hypermedia link caching, and OAuth-aware authentication
//! providers.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod binding;
pub mod codec;
pub mod config;
pub mod error;
pub mod http;
pub mod links;
pub mod model;
pub mod obs;
pub mod services;
pub mod session;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and fixtures for tests; enabled via `cfg(test)` or the `test`
	//! crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		config::SessionParameters,
		model::{Cardinality, PropertyDefinition, PropertyType, Updatability},
		session::BindingKind,
	};

	/// Parses a URL fixture, panicking with a readable message on failure.
	pub fn url(value: &str) -> Url {
		Url::parse(value).expect("URL fixture should parse successfully.")
	}

	/// Session parameters for a browser-binding endpoint.
	pub fn browser_parameters(endpoint: &str) -> SessionParameters {
		SessionParameters::builder(BindingKind::Browser, url(endpoint))
			.build()
			.expect("Browser session parameters should build.")
	}

	/// Session parameters for an AtomPub service document.
	pub fn atompub_parameters(endpoint: &str) -> SessionParameters {
		SessionParameters::builder(BindingKind::AtomPub, url(endpoint))
			.build()
			.expect("AtomPub session parameters should build.")
	}

	/// Property definition fixture with read-write updatability.
	pub fn property_definition(
		id: &str,
		property_type: PropertyType,
		cardinality: Cardinality,
	) -> PropertyDefinition {
		PropertyDefinition {
			id: id.into(),
			local_name: Some(id.into()),
			display_name: None,
			query_name: Some(id.into()),
			description: None,
			property_type,
			cardinality,
			updatability: Updatability::ReadWrite,
			inherited: false,
			required: false,
			queryable: true,
			orderable: false,
		}
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, BTreeSet, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use bytes::Bytes;
	pub use indexmap::IndexMap;
	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
