//! AtomPub request construction.
//!
//! Objects are addressed through their hypermedia links. A link is taken from the session link
//! cache when present; otherwise the object entry is fetched through the `objectbyid` URI
//! template, its links are cached, and the link is resolved from the fresh entry.

// crates.io
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	codec::{ATOM_NS, CMIS_NS, CMISRA_NS},
	error::ConfigError,
	http::{HttpRequest, HttpResponse},
	links::{media, rel},
	model::{
		Ace, Acl, AclPropagation, ChangeEvents, FailedToDelete, ObjectData, ObjectList, Properties,
		QueryResults, Rendition, RepositoryInfo, TypeDefinition, collection, property_ids, template,
	},
	obs::debug_event,
	services::{BindingContext, ContentStream, DeleteTreeOptions, OperationContext, flag, params, with_query},
};

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

pub(crate) async fn repository_infos(cx: &BindingContext) -> Result<IndexMap<String, RepositoryInfo>> {
	let response = cx.send(HttpRequest::get(cx.session().parameters().url.clone())).await?;

	Ok(cx.session().codec().parse_repository_infos(&response.body, cx.parse_context(&response.url))?)
}

pub(crate) async fn fetch_type_definition(cx: &BindingContext, type_id: &str) -> Result<TypeDefinition> {
	let url = expand_template(&cx.uri_template(template::TYPE_BY_ID)?, &[("id", type_id.to_owned())])?;
	let response = cx.send(HttpRequest::get(url)).await?;

	Ok(cx.session().codec().parse_type_definition(&response.body, cx.parse_context(&response.url))?)
}

pub(crate) async fn get_object(
	cx: &BindingContext,
	object_id: &str,
	operation: &OperationContext,
) -> Result<ObjectData> {
	fetch_entry(cx, object_id, operation).await
}

pub(crate) async fn get_object_by_path(
	cx: &BindingContext,
	path: &str,
	operation: &OperationContext,
) -> Result<ObjectData> {
	let mut values = operation.object_params();

	values.push(("path", path.to_owned()));

	let url = expand_template(&cx.uri_template(template::OBJECT_BY_PATH)?, &values)?;
	let response = cx.send(HttpRequest::get(url)).await?;

	parse_entry(cx, &response)
}

pub(crate) async fn create_folder(cx: &BindingContext, parent_id: &str, properties: &Properties) -> Result<ObjectData> {
	let url = link(cx, parent_id, rel::DOWN, Some(media::ATOM_FEED)).await?;
	let entry = entry_document(properties)?;
	let request = HttpRequest::post(url, entry).with_header("content-type", media::ATOM_ENTRY);
	let response = cx.send(request).await?;

	parse_entry(cx, &response)
}

pub(crate) async fn create_document(
	cx: &BindingContext,
	parent_id: &str,
	properties: &Properties,
	content: Option<ContentStream>,
) -> Result<ObjectData> {
	let url = link(cx, parent_id, rel::DOWN, Some(media::ATOM_FEED)).await?;
	let request = match content {
		Some(ContentStream { mime_type, body, progress, .. }) => {
			let (prefix, suffix) = content_frame(properties, &mime_type)?;

			HttpRequest::post(url, body.base64_encoded().framed(prefix, suffix)).with_progress(progress)
		},
		None => HttpRequest::post(url, entry_document(properties)?),
	};
	let response = cx.send(request.with_header("content-type", media::ATOM_ENTRY)).await?;

	parse_entry(cx, &response)
}

pub(crate) async fn update_properties(
	cx: &BindingContext,
	object_id: &str,
	properties: &Properties,
	change_token: Option<&str>,
) -> Result<ObjectData> {
	let url = first_link(cx, object_id, &[(rel::EDIT, None), (rel::SELF, None)]).await?;
	let url = match change_token {
		Some(token) => with_query(url, &[(params::CHANGE_TOKEN, token)]),
		None => url,
	};
	let request =
		HttpRequest::put(url, entry_document(properties)?).with_header("content-type", media::ATOM_ENTRY);
	let response = cx.send(request).await?;

	if is_blank(&response.body) {
		return fetch_entry(cx, object_id, &OperationContext::default()).await;
	}

	parse_entry(cx, &response)
}

pub(crate) async fn delete_object(cx: &BindingContext, object_id: &str, all_versions: bool) -> Result<()> {
	let url = link(cx, object_id, rel::SELF, None).await?;

	cx.send(HttpRequest::delete(with_query(url, &[(params::ALL_VERSIONS, flag(all_versions))]))).await?;

	Ok(())
}

pub(crate) async fn delete_tree(
	cx: &BindingContext,
	folder_id: &str,
	options: DeleteTreeOptions,
) -> Result<FailedToDelete> {
	let url = first_link(cx, folder_id, &[(rel::FOLDER_TREE, None), (rel::DOWN, Some(media::CMIS_TREE))]).await?;
	let url = with_query(url, &[
		(params::ALL_VERSIONS, flag(options.all_versions)),
		(params::UNFILE_OBJECTS, options.unfile.as_str().to_owned()),
		(params::CONTINUE_ON_FAILURE, flag(options.continue_on_failure)),
	]);
	let response = cx.send(HttpRequest::delete(url)).await?;

	Ok(cx.session().codec().parse_failed_to_delete(&response.body, cx.parse_context(&response.url))?)
}

pub(crate) async fn get_renditions(cx: &BindingContext, object_id: &str, filter: &str) -> Result<Vec<Rendition>> {
	let url = link(cx, object_id, rel::SELF, None).await?;
	let url = with_query(url, &[(params::RENDITION_FILTER, filter), (params::FILTER, property_ids::OBJECT_ID)]);
	let response = cx.send(HttpRequest::get(url)).await?;

	Ok(cx.session().codec().parse_renditions(&response.body, cx.parse_context(&response.url))?)
}

pub(crate) async fn get_children(
	cx: &BindingContext,
	folder_id: &str,
	operation: &OperationContext,
) -> Result<ObjectList> {
	let url = link(cx, folder_id, rel::DOWN, Some(media::ATOM_FEED)).await?;
	let response = cx.send(HttpRequest::get(with_query(url, &operation.listing_params()))).await?;
	let list = cx.session().codec().parse_object_list(&response.body, cx.parse_context(&response.url))?;

	list.objects.iter().for_each(|object| cache_links(cx, object));

	Ok(list)
}

pub(crate) async fn retrieve_acl(cx: &BindingContext, object_id: &str, only_basic_permissions: bool) -> Result<Acl> {
	let url = link(cx, object_id, rel::ACL, Some(media::CMIS_ACL)).await?;
	let url = with_query(url, &[(params::ONLY_BASIC_PERMISSIONS, flag(only_basic_permissions))]);
	let response = cx.send(HttpRequest::get(url)).await?;

	Ok(cx.session().codec().parse_acl(&response.body, cx.parse_context(&response.url))?)
}

/// AtomPub replaces the whole list, so the change is merged into the current direct entries
/// before it is sent.
pub(crate) async fn apply_acl(
	cx: &BindingContext,
	object_id: &str,
	add: &[Ace],
	remove: &[Ace],
	propagation: AclPropagation,
) -> Result<Acl> {
	let current = retrieve_acl(cx, object_id, false).await?;

	put_acl(cx, object_id, &current.merged_direct(add, remove), propagation).await
}

pub(crate) async fn set_acl(cx: &BindingContext, object_id: &str, aces: &[Ace]) -> Result<Acl> {
	put_acl(cx, object_id, aces, AclPropagation::ObjectOnly).await
}

pub(crate) async fn get_content_changes(
	cx: &BindingContext,
	change_log_token: Option<&str>,
	include_properties: bool,
	max_items: Option<u32>,
) -> Result<ChangeEvents> {
	let url = cx
		.session()
		.repository_link(rel::CHANGES, Some(media::ATOM_FEED))
		.ok_or_else(|| ConfigError::MissingSessionEndpoint { endpoint: "changes link".into() })?;
	let mut pairs = Vec::new();

	if let Some(token) = change_log_token {
		pairs.push((params::CHANGE_LOG_TOKEN, token.to_owned()));
	}

	pairs.push((params::INCLUDE_PROPERTIES, flag(include_properties)));

	if let Some(max_items) = max_items {
		pairs.push((params::MAX_ITEMS, max_items.to_string()));
	}

	let response = cx.send(HttpRequest::get(with_query(url, &pairs))).await?;

	Ok(cx.session().codec().parse_change_events(&response.body, cx.parse_context(&response.url))?)
}

pub(crate) async fn query(
	cx: &BindingContext,
	statement: &str,
	search_all_versions: bool,
	operation: &OperationContext,
) -> Result<QueryResults> {
	let url = cx.collection(collection::QUERY)?;
	let request = HttpRequest::post(url, query_document(statement, search_all_versions, operation))
		.with_header("content-type", media::CMIS_QUERY);
	let response = cx.send(request).await?;

	Ok(cx.session().codec().parse_query_results(&response.body, cx.parse_context(&response.url))?)
}

async fn fetch_entry(cx: &BindingContext, object_id: &str, operation: &OperationContext) -> Result<ObjectData> {
	let mut values = operation.object_params();

	values.push(("id", object_id.to_owned()));

	let url = expand_template(&cx.uri_template(template::OBJECT_BY_ID)?, &values)?;
	let response = cx.send(HttpRequest::get(url)).await?;

	parse_entry(cx, &response)
}

async fn put_acl(cx: &BindingContext, object_id: &str, aces: &[Ace], propagation: AclPropagation) -> Result<Acl> {
	let url = link(cx, object_id, rel::ACL, Some(media::CMIS_ACL)).await?;
	let url = with_query(url, &[(params::ACL_PROPAGATION, propagation.as_str())]);
	let request = HttpRequest::put(url, acl_document(aces)).with_header("content-type", media::CMIS_ACL);
	let response = cx.send(request).await?;

	if is_blank(&response.body) {
		return retrieve_acl(cx, object_id, false).await;
	}

	Ok(cx.session().codec().parse_acl(&response.body, cx.parse_context(&response.url))?)
}

async fn link(cx: &BindingContext, object_id: &str, relation: &str, media_type: Option<&str>) -> Result<Url> {
	first_link(cx, object_id, &[(relation, media_type)]).await
}

/// Resolves the first available link among `candidates`, fetching the entry once on a miss.
async fn first_link(cx: &BindingContext, object_id: &str, candidates: &[(&str, Option<&str>)]) -> Result<Url> {
	let cache = cx.session().link_cache();

	if let Some(url) = candidates.iter().find_map(|(relation, media_type)| cache.get(object_id, relation, *media_type))
	{
		return Ok(url);
	}

	debug_event!(object_id, relation = candidates.first().map(|(relation, _)| *relation), "link cache miss");

	let filter = OperationContext::default().filter(property_ids::OBJECT_ID);
	let object = fetch_entry(cx, object_id, &filter).await?;

	candidates
		.iter()
		.find_map(|(relation, media_type)| object.links.resolve(relation, *media_type).cloned())
		.ok_or_else(|| {
			let relations = candidates.iter().map(|(relation, _)| *relation).collect::<Vec<_>>().join(", ");

			Error::invalid_argument(format!("object `{object_id}` exposes no {relations} link"))
		})
}

fn parse_entry(cx: &BindingContext, response: &HttpResponse) -> Result<ObjectData> {
	let object = cx.session().codec().parse_object_data(&response.body, cx.parse_context(&response.url))?;

	cache_links(cx, &object);

	Ok(object)
}

fn cache_links(cx: &BindingContext, object: &ObjectData) {
	if !object.links.is_empty() {
		cx.session().link_cache().put(&object.id, object.links.clone());
	}
}

fn is_blank(body: &[u8]) -> bool {
	body.iter().all(u8::is_ascii_whitespace)
}

/// Substitutes `{name}` placeholders with encoded values; unknown placeholders become empty.
fn expand_template(uri_template: &str, values: &[(&str, String)]) -> Result<Url> {
	let mut expanded = String::with_capacity(uri_template.len());
	let mut rest = uri_template;

	while let Some(start) = rest.find('{') {
		let Some(length) = rest[start..].find('}') else {
			return Err(Error::invalid_argument(format!("URI template `{uri_template}` is unterminated")));
		};
		let name = &rest[start + 1..start + length];

		expanded.push_str(&rest[..start]);

		if let Some((_, value)) = values.iter().find(|(key, _)| *key == name) {
			expanded.extend(form_urlencoded::byte_serialize(value.as_bytes()));
		}

		rest = &rest[start + length + 1..];
	}

	expanded.push_str(rest);

	Url::parse(&expanded)
		.map_err(|e| Error::invalid_argument(format!("expanded URI template `{expanded}` is not a URL ({e})")))
}

fn entry_document(properties: &Properties) -> Result<String> {
	Ok(format!("{}{}", entry_head(properties), entry_tail(properties)?))
}

/// Splits the entry around the base64 content so a streamed body can sit in the middle.
fn content_frame(properties: &Properties, mime_type: &str) -> Result<(String, String)> {
	let mut prefix = entry_head(properties);

	prefix.push_str(&format!(
		"<cmisra:content><cmisra:mediatype>{}</cmisra:mediatype><cmisra:base64>",
		escape(mime_type)
	));

	let mut suffix = String::from("</cmisra:base64></cmisra:content>");

	suffix.push_str(&entry_tail(properties)?);

	Ok((prefix, suffix))
}

fn entry_head(properties: &Properties) -> String {
	let title = properties.text(property_ids::NAME).unwrap_or_default();

	format!(
		"{XML_DECLARATION}<atom:entry xmlns:atom=\"{ATOM_NS}\" xmlns:cmis=\"{CMIS_NS}\" xmlns:cmisra=\"{CMISRA_NS}\"><atom:title>{}</atom:title>",
		escape(title)
	)
}

fn entry_tail(properties: &Properties) -> Result<String> {
	Ok(format!("<cmisra:object>{}</cmisra:object></atom:entry>", properties_xml(properties)?))
}

fn properties_xml(properties: &Properties) -> Result<String> {
	let mut xml = String::from("<cmis:properties>");

	for property in properties.iter() {
		let element = property.property_type.element_name();

		xml.push_str(&format!("<cmis:{element} propertyDefinitionId=\"{}\">", escape(&property.id)));

		for value in property.value.values() {
			xml.push_str(&format!("<cmis:value>{}</cmis:value>", escape(&value.xml_text()?)));
		}

		xml.push_str(&format!("</cmis:{element}>"));
	}

	xml.push_str("</cmis:properties>");

	Ok(xml)
}

fn acl_document(aces: &[Ace]) -> String {
	let mut xml = format!("{XML_DECLARATION}<cmis:acl xmlns:cmis=\"{CMIS_NS}\">");

	for ace in aces {
		xml.push_str(&format!(
			"<cmis:permission><cmis:principal><cmis:principalId>{}</cmis:principalId></cmis:principal>",
			escape(&ace.principal_id)
		));

		for permission in &ace.permissions {
			xml.push_str(&format!("<cmis:permission>{}</cmis:permission>", escape(permission)));
		}

		xml.push_str("<cmis:direct>true</cmis:direct></cmis:permission>");
	}

	xml.push_str("</cmis:acl>");

	xml
}

fn query_document(statement: &str, search_all_versions: bool, operation: &OperationContext) -> String {
	let mut xml = format!(
		"{XML_DECLARATION}<cmis:query xmlns:cmis=\"{CMIS_NS}\"><cmis:statement>{}</cmis:statement>",
		escape(statement)
	);

	xml.push_str(&format!("<cmis:searchAllVersions>{}</cmis:searchAllVersions>", flag(search_all_versions)));
	xml.push_str(&format!(
		"<cmis:includeAllowableActions>{}</cmis:includeAllowableActions>",
		flag(operation.include_allowable_actions)
	));
	xml.push_str(&format!(
		"<cmis:includeRelationships>{}</cmis:includeRelationships>",
		operation.include_relationships.as_str()
	));

	if let Some(filter) = &operation.rendition_filter {
		xml.push_str(&format!("<cmis:renditionFilter>{}</cmis:renditionFilter>", escape(filter)));
	}
	if let Some(max_items) = operation.max_items {
		xml.push_str(&format!("<cmis:maxItems>{max_items}</cmis:maxItems>"));
	}
	if let Some(skip_count) = operation.skip_count {
		xml.push_str(&format!("<cmis:skipCount>{skip_count}</cmis:skipCount>"));
	}

	xml.push_str("</cmis:query>");

	xml
}

fn escape(text: &str) -> String {
	let mut escaped = String::with_capacity(text.len());

	for c in text.chars() {
		match c {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'"' => escaped.push_str("&quot;"),
			'\'' => escaped.push_str("&apos;"),
			c => escaped.push(c),
		}
	}

	escaped
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		_preludet::url,
		codec::{AtomPubCodec, NoTypes, ParseContext, WireCodec},
		model::PropertyData,
	};

	#[test]
	fn templates_expand_known_and_blank_unknown_placeholders() {
		let url = expand_template(
			"https://ecm.example.com/atom/A1/path?p={path}&filter={filter}&includeACL={includeACL}",
			&[("path", "/Sites/Q3 report".to_owned()), ("filter", "cmis:name".to_owned())],
		)
		.expect("Template should expand.");

		assert_eq!(
			url.as_str(),
			"https://ecm.example.com/atom/A1/path?p=%2FSites%2FQ3+report&filter=cmis%3Aname&includeACL="
		);
		assert!(expand_template("https://ecm.example.com/{id", &[]).is_err());
	}

	#[test]
	fn entry_documents_parse_back_into_the_same_properties() {
		let properties = Properties::new()
			.with(PropertyData::single(property_ids::OBJECT_ID, "doc-9"))
			.with(PropertyData::single(property_ids::NAME, "R&D <draft>"))
			.with(PropertyData::single(property_ids::OBJECT_TYPE_ID, "cmis:document"));
		let document = entry_document(&properties).expect("Entry should serialize.");
		let base = url("https://ecm.example.com/atom/A1");
		let object = AtomPubCodec
			.parse_object_data(document.as_bytes(), ParseContext::new(&base, &NoTypes))
			.expect("Serialized entry should parse.");

		assert_eq!(object.id, "doc-9");
		assert_eq!(object.name(), Some("R&D <draft>"));
	}

	#[test]
	fn content_frame_wraps_the_base64_payload() {
		let properties = Properties::new().with(PropertyData::single(property_ids::NAME, "a.txt"));
		let (prefix, suffix) = content_frame(&properties, "text/plain").expect("Frame should serialize.");

		assert!(prefix.ends_with("<cmisra:mediatype>text/plain</cmisra:mediatype><cmisra:base64>"));
		assert!(suffix.starts_with("</cmisra:base64></cmisra:content><cmisra:object>"));
		assert!(suffix.ends_with("</atom:entry>"));
	}

	#[test]
	fn acl_documents_parse_back() {
		let document = acl_document(&[Ace::new("alice", ["cmis:read", "cmis:write"])]);
		let base = url("https://ecm.example.com/atom/A1");
		let acl = AtomPubCodec
			.parse_acl(document.as_bytes(), ParseContext::new(&base, &NoTypes))
			.expect("Serialized ACL should parse.");

		assert_eq!(acl.aces, vec![Ace::new("alice", ["cmis:read", "cmis:write"])]);
	}

	#[test]
	fn query_documents_escape_statements() {
		let document = query_document(
			"SELECT * FROM cmis:document WHERE cmis:name LIKE 'a<b'",
			false,
			&OperationContext::default().max_items(10),
		);

		assert!(document.contains("cmis:name LIKE &apos;a&lt;b&apos;"));
		assert!(document.contains("<cmis:maxItems>10</cmis:maxItems>"));
		assert!(!document.contains("skipCount"));
	}
}
