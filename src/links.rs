//! Hypermedia link relations and the per-session link cache.
//!
//! AtomPub entries advertise the URLs of related resources as `atom:link` elements. The cache
//! remembers them per object id so follow-up operations can skip rediscovery; it is bounded and
//! evicts the least recently stored object when full.

// self
use crate::_prelude::*;

/// Well-known relation names.
pub mod rel {
	/// `self`.
	pub const SELF: &str = "self";
	/// `edit`.
	pub const EDIT: &str = "edit";
	/// `edit-media`.
	pub const EDIT_MEDIA: &str = "edit-media";
	/// `alternate` (renditions).
	pub const ALTERNATE: &str = "alternate";
	/// `describedby` (type definition).
	pub const DESCRIBED_BY: &str = "describedby";
	/// `down` (children or descendants).
	pub const DOWN: &str = "down";
	/// `up` (parents).
	pub const UP: &str = "up";
	/// `next` (paging).
	pub const NEXT: &str = "next";
	/// `service`.
	pub const SERVICE: &str = "service";
	/// `via`.
	pub const VIA: &str = "via";
	/// CMIS allowable-actions relation.
	pub const ALLOWABLE_ACTIONS: &str = "http://docs.oasis-open.org/ns/cmis/link/200908/allowableactions";
	/// CMIS ACL relation.
	pub const ACL: &str = "http://docs.oasis-open.org/ns/cmis/link/200908/acl";
	/// CMIS relationships relation.
	pub const RELATIONSHIPS: &str = "http://docs.oasis-open.org/ns/cmis/link/200908/relationships";
	/// CMIS policies relation.
	pub const POLICIES: &str = "http://docs.oasis-open.org/ns/cmis/link/200908/policies";
	/// CMIS folder tree relation.
	pub const FOLDER_TREE: &str = "http://docs.oasis-open.org/ns/cmis/link/200908/foldertree";
	/// CMIS root descendants relation.
	pub const ROOT_DESCENDANTS: &str = "http://docs.oasis-open.org/ns/cmis/link/200908/rootdescendants";
	/// CMIS type descendants relation.
	pub const TYPE_DESCENDANTS: &str = "http://docs.oasis-open.org/ns/cmis/link/200908/typedescendants";
	/// CMIS content changes relation.
	pub const CHANGES: &str = "http://docs.oasis-open.org/ns/cmis/link/200908/changes";
}

/// Well-known link media types.
pub mod media {
	/// Atom feed.
	pub const ATOM_FEED: &str = "application/atom+xml;type=feed";
	/// Atom entry.
	pub const ATOM_ENTRY: &str = "application/atom+xml;type=entry";
	/// CMIS tree feed.
	pub const CMIS_TREE: &str = "application/cmistree+xml";
	/// CMIS ACL document.
	pub const CMIS_ACL: &str = "application/cmisacl+xml";
	/// CMIS allowable actions document.
	pub const CMIS_ALLOWABLE_ACTIONS: &str = "application/cmisallowableactions+xml";
	/// CMIS query document.
	pub const CMIS_QUERY: &str = "application/cmisquery+xml";
}

/// A single `(rel, href, type)` link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkRelation {
	/// Relation name.
	pub rel: String,
	/// Target URL.
	pub href: Url,
	/// Advertised media type, if any.
	pub media_type: Option<String>,
}

/// Links attached to one object, in document order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkRelations(Vec<LinkRelation>);
impl LinkRelations {
	/// Creates an empty set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a link.
	pub fn push(&mut self, rel: impl Into<String>, href: Url, media_type: Option<String>) {
		self.0.push(LinkRelation { rel: rel.into(), href, media_type });
	}

	/// Builder-style [`LinkRelations::push`].
	pub fn with(mut self, rel: impl Into<String>, href: Url, media_type: Option<&str>) -> Self {
		self.push(rel, href, media_type.map(str::to_owned));

		self
	}

	/// Resolves a link by relation and optional media type.
	///
	/// With a media type, an exact `(rel, type)` match wins; otherwise a link for `rel` that
	/// declares no type is accepted. Without a media type, the first link for `rel` is returned.
	pub fn resolve(&self, rel: &str, media_type: Option<&str>) -> Option<&Url> {
		let mut candidates = self.0.iter().filter(|link| link.rel == rel);

		match media_type {
			None => candidates.next().map(|link| &link.href),
			Some(wanted) => {
				let mut untyped = None;

				for link in candidates {
					match link.media_type.as_deref() {
						Some(ty) if media_type_matches(ty, wanted) => return Some(&link.href),
						None if untyped.is_none() => untyped = Some(&link.href),
						_ => {},
					}
				}

				untyped
			},
		}
	}

	/// Iterates links in document order.
	pub fn iter(&self) -> impl Iterator<Item = &LinkRelation> {
		self.0.iter()
	}

	/// Number of links.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` when no links are present.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

/// Bounded per-session cache of object links.
#[derive(Debug)]
pub struct LinkCache {
	capacity: usize,
	entries: RwLock<IndexMap<String, LinkRelations>>,
}
impl LinkCache {
	/// Default number of objects remembered per session.
	pub const DEFAULT_CAPACITY: usize = 400;

	/// Creates a cache remembering at most `capacity` objects (minimum one).
	pub fn new(capacity: usize) -> Self {
		Self { capacity: capacity.max(1), entries: RwLock::new(IndexMap::new()) }
	}

	/// Looks up the link `rel` of `object_id`, honoring the typed lookup rules of
	/// [`LinkRelations::resolve`].
	pub fn get(&self, object_id: &str, rel: &str, media_type: Option<&str>) -> Option<Url> {
		self.entries.read().get(object_id).and_then(|links| links.resolve(rel, media_type)).cloned()
	}

	/// Stores the links of `object_id`, replacing any previous entry wholesale.
	///
	/// An empty set removes the entry.
	pub fn put(&self, object_id: &str, links: LinkRelations) {
		let mut entries = self.entries.write();

		entries.shift_remove(object_id);

		if links.is_empty() {
			return;
		}

		entries.insert(object_id.to_owned(), links);

		while entries.len() > self.capacity {
			entries.shift_remove_index(0);
		}
	}

	/// Forgets the links of `object_id`.
	pub fn remove(&self, object_id: &str) {
		self.entries.write().shift_remove(object_id);
	}

	/// Forgets every object.
	pub fn clear(&self) {
		self.entries.write().clear();
	}

	/// Returns `true` when links for `object_id` are cached.
	pub fn contains(&self, object_id: &str) -> bool {
		self.entries.read().contains_key(object_id)
	}

	/// Number of cached objects.
	pub fn len(&self) -> usize {
		self.entries.read().len()
	}

	/// Returns `true` when nothing is cached.
	pub fn is_empty(&self) -> bool {
		self.entries.read().is_empty()
	}

	/// Configured capacity.
	pub fn capacity(&self) -> usize {
		self.capacity
	}
}
impl Default for LinkCache {
	fn default() -> Self {
		Self::new(Self::DEFAULT_CAPACITY)
	}
}

fn media_type_matches(advertised: &str, wanted: &str) -> bool {
	let normalize = |value: &str| value.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_ascii_lowercase();

	normalize(advertised) == normalize(wanted)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::url;

	fn children_links() -> LinkRelations {
		LinkRelations::new()
			.with(rel::SELF, url("https://repo.example.com/entry?id=f1"), Some(media::ATOM_ENTRY))
			.with(rel::DOWN, url("https://repo.example.com/children?id=f1"), Some(media::ATOM_FEED))
			.with(rel::DOWN, url("https://repo.example.com/tree?id=f1"), Some(media::CMIS_TREE))
			.with(rel::ACL, url("https://repo.example.com/acl?id=f1"), None)
	}

	#[test]
	fn typed_lookup_prefers_exact_media_type() {
		let cache = LinkCache::default();

		cache.put("f1", children_links());

		assert_eq!(
			cache.get("f1", rel::DOWN, Some(media::CMIS_TREE)),
			Some(url("https://repo.example.com/tree?id=f1"))
		);
		assert_eq!(
			cache.get("f1", rel::DOWN, Some("application/atom+xml; type=feed")),
			Some(url("https://repo.example.com/children?id=f1"))
		);
		assert_eq!(cache.get("f1", rel::DOWN, None), Some(url("https://repo.example.com/children?id=f1")));
	}

	#[test]
	fn typed_lookup_falls_back_to_untyped_links_only() {
		let cache = LinkCache::default();

		cache.put("f1", children_links());

		assert_eq!(
			cache.get("f1", rel::ACL, Some(media::CMIS_ACL)),
			Some(url("https://repo.example.com/acl?id=f1"))
		);
		assert_eq!(cache.get("f1", rel::SELF, Some(media::ATOM_FEED)), None);
		assert_eq!(cache.get("f1", rel::EDIT, None), None);
		assert_eq!(cache.get("missing", rel::SELF, None), None);
	}

	#[test]
	fn put_replaces_and_remove_forgets() {
		let cache = LinkCache::default();

		cache.put("f1", children_links());
		cache.put("f1", LinkRelations::new().with(rel::SELF, url("https://repo.example.com/v2"), None));

		assert_eq!(cache.get("f1", rel::DOWN, None), None);
		assert_eq!(cache.get("f1", rel::SELF, None), Some(url("https://repo.example.com/v2")));

		cache.remove("f1");

		assert_eq!(cache.get("f1", rel::SELF, None), None);

		cache.put("f2", children_links());
		cache.clear();

		assert!(cache.is_empty());
	}

	#[test]
	fn capacity_evicts_oldest_entry() {
		let cache = LinkCache::new(2);

		cache.put("a", children_links());
		cache.put("b", children_links());
		cache.put("a", children_links());
		cache.put("c", children_links());

		assert!(!cache.contains("b"));
		assert!(cache.contains("a"));
		assert!(cache.contains("c"));
		assert_eq!(cache.len(), 2);
	}
}
