//! Typed repository model produced by the wire codecs and consumed by the services.

pub mod acl;
pub mod actions;
pub mod changes;
pub mod list;
pub mod object;
pub mod property;
pub mod property_ids;
pub mod rendition;
pub mod repository;
pub mod types;

pub use acl::*;
pub use actions::*;
pub use changes::*;
pub use list::*;
pub use object::*;
pub use property::*;
pub use rendition::*;
pub use repository::*;
pub use types::*;
