// self
use crate::{_prelude::*, codec::TypeResolver, model::TypeDefinition};

/// Type definitions fetched during the session, keyed by type id.
#[derive(Debug, Default)]
pub struct TypeCache {
	entries: RwLock<HashMap<String, Arc<TypeDefinition>>>,
}
impl TypeCache {
	/// Returns a cached definition.
	pub fn get(&self, type_id: &str) -> Option<Arc<TypeDefinition>> {
		self.entries.read().get(type_id).cloned()
	}

	/// Caches a definition, returning the shared handle.
	pub fn put(&self, definition: TypeDefinition) -> Arc<TypeDefinition> {
		let definition = Arc::new(definition);

		self.entries.write().insert(definition.id.clone(), definition.clone());

		definition
	}

	/// Returns `true` when `type_id` is cached.
	pub fn contains(&self, type_id: &str) -> bool {
		self.entries.read().contains_key(type_id)
	}

	/// Drops every cached definition.
	pub fn clear(&self) {
		self.entries.write().clear();
	}
}
impl TypeResolver for TypeCache {
	fn type_definition(&self, type_id: &str) -> Option<Arc<TypeDefinition>> {
		self.get(type_id)
	}
}
