//! AtomPub XML codec.

// crates.io
use roxmltree::{Document, Node};
// self
use crate::{
	_prelude::*,
	codec::{ParseContext, ParseResult, WireCodec},
	error::ParseError,
	links::{LinkRelations, rel},
	model::{
		Ace, Acl, AllowableActions, AtomPubEndpoints, BaseType, Cardinality, ChangeEvent,
		ChangeEventInfo, ChangeEvents, FailedToDelete, ObjectData, ObjectList, Properties,
		PropertyData, PropertyDefinition, PropertyType, PropertyValue, QueryResult, QueryResults,
		Rendition, RepositoryInfo, TypeDefinition, Updatability, Value, property_ids,
	},
	session::BindingKind,
};

pub(crate) const ATOM_NS: &str = "http://www.w3.org/2005/Atom";
pub(crate) const APP_NS: &str = "http://www.w3.org/2007/app";
pub(crate) const CMIS_NS: &str = "http://docs.oasis-open.org/ns/cmis/core/200908/";
pub(crate) const CMISRA_NS: &str = "http://docs.oasis-open.org/ns/cmis/restatom/200908/";

/// XML codec for the AtomPub binding.
#[derive(Clone, Copy, Debug, Default)]
pub struct AtomPubCodec;
impl WireCodec for AtomPubCodec {
	fn binding(&self) -> BindingKind {
		BindingKind::AtomPub
	}

	fn parse_repository_infos(
		&self,
		payload: &[u8],
		cx: ParseContext<'_>,
	) -> ParseResult<IndexMap<String, RepositoryInfo>> {
		let text = utf8(payload)?;
		let document = Document::parse(text)?;
		let service = document.root_element();

		if !service.has_tag_name((APP_NS, "service")) {
			return Err(ParseError::at("app:service", "service document root is missing"));
		}

		children(service, APP_NS, "workspace")
			.map(|workspace| {
				let info = workspace_info(workspace, cx)?;

				Ok((info.id.clone(), info))
			})
			.collect()
	}

	fn parse_type_definition(&self, payload: &[u8], _: ParseContext<'_>) -> ParseResult<TypeDefinition> {
		let text = utf8(payload)?;
		let document = Document::parse(text)?;
		let node = document
			.descendants()
			.find(|node| node.has_tag_name((CMISRA_NS, "type")))
			.ok_or_else(|| ParseError::missing("cmisra:type"))?;

		type_definition(node)
	}

	fn parse_object_data(&self, payload: &[u8], cx: ParseContext<'_>) -> ParseResult<ObjectData> {
		let text = utf8(payload)?;
		let document = Document::parse(text)?;
		let entry = document.root_element();

		if !entry.has_tag_name((ATOM_NS, "entry")) {
			return Err(ParseError::at("atom:entry", "entry document root is missing"));
		}

		entry_object(entry, cx)
	}

	fn parse_object_list(&self, payload: &[u8], cx: ParseContext<'_>) -> ParseResult<ObjectList> {
		let text = utf8(payload)?;
		let document = Document::parse(text)?;
		let feed = feed_root(&document)?;
		let objects = entries(feed, |entry| entry_object(entry, cx))?;
		let (has_more_items, num_items) = paging(feed);

		Ok(ObjectList { objects, has_more_items, num_items })
	}

	fn parse_renditions(&self, payload: &[u8], _: ParseContext<'_>) -> ParseResult<Vec<Rendition>> {
		let text = utf8(payload)?;
		let document = Document::parse(text)?;

		document
			.descendants()
			.filter(|node| node.has_tag_name((CMIS_NS, "rendition")))
			.map(rendition)
			.collect()
	}

	fn parse_acl(&self, payload: &[u8], _: ParseContext<'_>) -> ParseResult<Acl> {
		let text = utf8(payload)?;
		let document = Document::parse(text)?;
		let node = document
			.descendants()
			.find(|node| node.has_tag_name((CMIS_NS, "acl")))
			.ok_or_else(|| ParseError::missing("cmis:acl"))?;

		acl(node, None)
	}

	fn parse_change_events(&self, payload: &[u8], cx: ParseContext<'_>) -> ParseResult<ChangeEvents> {
		let text = utf8(payload)?;
		let document = Document::parse(text)?;
		let feed = feed_root(&document)?;
		let events = entries(feed, |entry| entry_object(entry, cx).and_then(ChangeEvent::try_from))?;
		let (has_more_items, num_items) = paging(feed);
		let latest_change_log_token = feed_link(feed, rel::NEXT, cx)?.and_then(|next| {
			next.query_pairs().find(|(key, _)| key == "changeLogToken").map(|(_, value)| value.into_owned())
		});

		Ok(ChangeEvents { events, latest_change_log_token, has_more_items, num_items })
	}

	fn parse_query_results(&self, payload: &[u8], cx: ParseContext<'_>) -> ParseResult<QueryResults> {
		let text = utf8(payload)?;
		let document = Document::parse(text)?;
		let feed = feed_root(&document)?;
		let results = entries(feed, |entry| {
			let object = child(entry, CMISRA_NS, "object").ok_or_else(|| ParseError::missing("cmisra:object"))?;

			Ok(QueryResult {
				properties: properties(object, cx)?,
				allowable_actions: child(object, CMIS_NS, "allowableActions").map(allowable_actions),
				relationships: relationships(object, cx)?,
				renditions: children(object, CMIS_NS, "rendition").map(rendition).collect::<ParseResult<_>>()?,
			})
		})?;
		let (has_more_items, num_items) = paging(feed);

		Ok(QueryResults { results, has_more_items, num_items })
	}

	fn parse_failed_to_delete(&self, payload: &[u8], cx: ParseContext<'_>) -> ParseResult<FailedToDelete> {
		if payload.iter().all(u8::is_ascii_whitespace) {
			return Ok(FailedToDelete::default());
		}

		let text = utf8(payload)?;
		let document = Document::parse(text)?;
		let feed = feed_root(&document)?;
		let ids = entries(feed, |entry| {
			let object = child(entry, CMISRA_NS, "object").ok_or_else(|| ParseError::missing("cmisra:object"))?;

			properties(object, cx)?
				.text(property_ids::OBJECT_ID)
				.map(str::to_owned)
				.ok_or_else(|| ParseError::missing(property_ids::OBJECT_ID))
		})?;

		Ok(FailedToDelete { ids })
	}
}

fn utf8(payload: &[u8]) -> ParseResult<&str> {
	std::str::from_utf8(payload).map_err(|e| ParseError::new(format!("payload is not UTF-8 ({e})")))
}

fn child<'a, 'input>(node: Node<'a, 'input>, ns: &str, name: &str) -> Option<Node<'a, 'input>> {
	node.children().find(|candidate| candidate.has_tag_name((ns, name)))
}

fn children<'a, 'input>(
	node: Node<'a, 'input>,
	ns: &'static str,
	name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
	node.children().filter(move |candidate| candidate.has_tag_name((ns, name)))
}

fn text_of(node: Node<'_, '_>) -> String {
	node.text().map(str::trim).unwrap_or_default().to_owned()
}

fn child_text(node: Node<'_, '_>, ns: &str, name: &str) -> Option<String> {
	child(node, ns, name).map(text_of)
}

fn child_flag(node: Node<'_, '_>, ns: &str, name: &str) -> bool {
	child_text(node, ns, name).is_some_and(|text| text == "true")
}

fn child_number(node: Node<'_, '_>, ns: &str, name: &str) -> ParseResult<Option<u64>> {
	child_text(node, ns, name)
		.map(|text| text.parse().map_err(|_| ParseError::at(name, format!("`{text}` is not a number"))))
		.transpose()
}

fn feed_root<'a, 'input>(document: &'a Document<'input>) -> ParseResult<Node<'a, 'input>> {
	let feed = document.root_element();

	if feed.has_tag_name((ATOM_NS, "feed")) {
		Ok(feed)
	} else {
		Err(ParseError::at("atom:feed", "feed document root is missing"))
	}
}

fn entries<T, F>(feed: Node<'_, '_>, mut parse: F) -> ParseResult<Vec<T>>
where
	F: FnMut(Node<'_, '_>) -> ParseResult<T>,
{
	children(feed, ATOM_NS, "entry")
		.enumerate()
		.map(|(index, entry)| {
			parse(entry).map_err(|e| {
				let path = match e.path {
					Some(inner) => format!("entry[{index}]/{inner}"),
					None => format!("entry[{index}]"),
				};

				ParseError::at(path, e.reason)
			})
		})
		.collect()
}

fn paging(feed: Node<'_, '_>) -> (bool, Option<u64>) {
	let has_more_items = children(feed, ATOM_NS, "link").any(|link| link.attribute("rel") == Some(rel::NEXT));
	let num_items = child_text(feed, CMISRA_NS, "numItems").and_then(|text| text.parse().ok());

	(has_more_items, num_items)
}

fn feed_link(feed: Node<'_, '_>, relation: &str, cx: ParseContext<'_>) -> ParseResult<Option<Url>> {
	children(feed, ATOM_NS, "link")
		.find(|link| link.attribute("rel") == Some(relation))
		.and_then(|link| link.attribute("href"))
		.map(|href| cx.resolve_url(href))
		.transpose()
}

fn atom_links(node: Node<'_, '_>, cx: ParseContext<'_>) -> ParseResult<LinkRelations> {
	let mut links = LinkRelations::new();

	for link in children(node, ATOM_NS, "link") {
		let (Some(relation), Some(href)) = (link.attribute("rel"), link.attribute("href")) else {
			continue;
		};

		links.push(relation, cx.resolve_url(href)?, link.attribute("type").map(str::to_owned));
	}

	Ok(links)
}

fn workspace_info(workspace: Node<'_, '_>, cx: ParseContext<'_>) -> ParseResult<RepositoryInfo> {
	let info = child(workspace, CMISRA_NS, "repositoryInfo").ok_or_else(|| ParseError::missing("cmisra:repositoryInfo"))?;
	let id = child_text(info, CMIS_NS, "repositoryId")
		.filter(|id| !id.is_empty())
		.ok_or_else(|| ParseError::missing("cmis:repositoryId"))?;
	let capabilities = child(info, CMIS_NS, "capabilities")
		.map(|capabilities| {
			capabilities
				.children()
				.filter(|node| node.is_element() && node.first_element_child().is_none())
				.map(|node| (node.tag_name().name().to_owned(), text_of(node)))
				.collect()
		})
		.unwrap_or_default();
	let mut endpoints = AtomPubEndpoints { links: atom_links(workspace, cx)?, ..Default::default() };

	for collection in children(workspace, APP_NS, "collection") {
		let (Some(kind), Some(href)) = (child_text(collection, CMISRA_NS, "collectionType"), collection.attribute("href"))
		else {
			continue;
		};

		endpoints.collections.insert(kind, cx.resolve_url(href)?);
	}
	for template in children(workspace, CMISRA_NS, "uritemplate") {
		let (Some(kind), Some(body)) = (child_text(template, CMISRA_NS, "type"), child_text(template, CMISRA_NS, "template"))
		else {
			continue;
		};

		endpoints.uri_templates.insert(kind, body);
	}

	Ok(RepositoryInfo {
		id,
		name: child_text(info, CMIS_NS, "repositoryName"),
		description: child_text(info, CMIS_NS, "repositoryDescription"),
		vendor_name: child_text(info, CMIS_NS, "vendorName"),
		product_name: child_text(info, CMIS_NS, "productName"),
		product_version: child_text(info, CMIS_NS, "productVersion"),
		root_folder_id: child_text(info, CMIS_NS, "rootFolderId"),
		capabilities,
		cmis_version_supported: child_text(info, CMIS_NS, "cmisVersionSupported"),
		principal_id_anonymous: child_text(info, CMIS_NS, "principalAnonymous"),
		principal_id_anyone: child_text(info, CMIS_NS, "principalAnyone"),
		latest_change_log_token: child_text(info, CMIS_NS, "latestChangeLogToken"),
		repository_url: None,
		root_folder_url: None,
		endpoints,
	})
}

fn type_definition(node: Node<'_, '_>) -> ParseResult<TypeDefinition> {
	let id = child_text(node, CMIS_NS, "id").ok_or_else(|| ParseError::missing("cmis:id"))?;
	let base_type = child_text(node, CMIS_NS, "baseId")
		.ok_or_else(|| ParseError::missing("cmis:baseId"))
		.and_then(|base| BaseType::from_str(&base))?;
	let property_definitions = node
		.children()
		.filter(|candidate| {
			candidate.tag_name().namespace() == Some(CMIS_NS)
				&& candidate.tag_name().name().starts_with("property")
				&& candidate.tag_name().name().ends_with("Definition")
		})
		.map(|definition| {
			let definition = parse_property_definition(definition)?;

			Ok((definition.id.clone(), definition))
		})
		.collect::<ParseResult<_>>()?;

	Ok(TypeDefinition {
		id,
		local_name: child_text(node, CMIS_NS, "localName"),
		local_namespace: child_text(node, CMIS_NS, "localNamespace"),
		display_name: child_text(node, CMIS_NS, "displayName"),
		query_name: child_text(node, CMIS_NS, "queryName"),
		description: child_text(node, CMIS_NS, "description"),
		base_type,
		parent_id: child_text(node, CMIS_NS, "parentId"),
		creatable: child_flag(node, CMIS_NS, "creatable"),
		fileable: child_flag(node, CMIS_NS, "fileable"),
		queryable: child_flag(node, CMIS_NS, "queryable"),
		full_text_indexed: child_flag(node, CMIS_NS, "fulltextIndexed"),
		included_in_supertype_query: child_flag(node, CMIS_NS, "includedInSupertypeQuery"),
		controllable_policy: child_flag(node, CMIS_NS, "controllablePolicy"),
		controllable_acl: child_flag(node, CMIS_NS, "controllableACL"),
		property_definitions,
	})
}

fn parse_property_definition(node: Node<'_, '_>) -> ParseResult<PropertyDefinition> {
	let id = child_text(node, CMIS_NS, "id").ok_or_else(|| ParseError::missing("cmis:id"))?;
	let property_type = child_text(node, CMIS_NS, "propertyType")
		.ok_or_else(|| ParseError::at(id.as_str(), "property definition has no propertyType"))?
		.parse::<PropertyType>()?;
	let cardinality = match child_text(node, CMIS_NS, "cardinality").as_deref() {
		Some("multiple") => Cardinality::Multiple,
		_ => Cardinality::Single,
	};
	let updatability =
		child_text(node, CMIS_NS, "updatability").map(|text| text.parse()).transpose()?.unwrap_or(Updatability::ReadOnly);

	Ok(PropertyDefinition {
		local_name: child_text(node, CMIS_NS, "localName"),
		display_name: child_text(node, CMIS_NS, "displayName"),
		query_name: child_text(node, CMIS_NS, "queryName"),
		description: child_text(node, CMIS_NS, "description"),
		property_type,
		cardinality,
		updatability,
		inherited: child_flag(node, CMIS_NS, "inherited"),
		required: child_flag(node, CMIS_NS, "required"),
		queryable: child_flag(node, CMIS_NS, "queryable"),
		orderable: child_flag(node, CMIS_NS, "orderable"),
		id,
	})
}

fn entry_object(entry: Node<'_, '_>, cx: ParseContext<'_>) -> ParseResult<ObjectData> {
	let node = child(entry, CMISRA_NS, "object").ok_or_else(|| ParseError::missing("cmisra:object"))?;
	let mut object = object_data(node, cx)?;

	object.links = atom_links(entry, cx)?;
	object.content_url = child(entry, ATOM_NS, "content")
		.and_then(|content| content.attribute("src"))
		.map(|src| cx.resolve_url(src))
		.transpose()?;
	object.path_segment = child_text(entry, CMISRA_NS, "pathSegment");

	Ok(object)
}

fn object_data(node: Node<'_, '_>, cx: ParseContext<'_>) -> ParseResult<ObjectData> {
	let mut object = ObjectData::from_properties(properties(node, cx)?)?;
	let exact = child_text(node, CMIS_NS, "exactACL").map(|text| text == "true");

	object.allowable_actions = child(node, CMIS_NS, "allowableActions").map(allowable_actions);
	object.relationships = relationships(node, cx)?;
	object.change_event_info = child(node, CMIS_NS, "changeEventInfo").map(change_event_info).transpose()?;
	object.acl = child(node, CMIS_NS, "acl").map(|node| acl(node, exact)).transpose()?;
	object.policy_ids = child(node, CMIS_NS, "policyIds")
		.map(|policies| children(policies, CMIS_NS, "id").map(text_of).collect())
		.unwrap_or_default();
	object.renditions = children(node, CMIS_NS, "rendition").map(rendition).collect::<ParseResult<_>>()?;

	Ok(object)
}

fn relationships(node: Node<'_, '_>, cx: ParseContext<'_>) -> ParseResult<Vec<ObjectData>> {
	children(node, CMIS_NS, "relationship").map(|relationship| object_data(relationship, cx)).collect()
}

fn properties(object: Node<'_, '_>, cx: ParseContext<'_>) -> ParseResult<Properties> {
	let Some(container) = child(object, CMIS_NS, "properties") else {
		return Ok(Properties::new());
	};
	let elements = container
		.children()
		.filter_map(|node| {
			if node.tag_name().namespace() != Some(CMIS_NS) {
				return None;
			}

			PropertyType::from_element_name(node.tag_name().name()).map(|ty| (node, ty))
		})
		.collect::<Vec<_>>();
	let definitions = elements
		.iter()
		.filter(|(node, _)| {
			matches!(
				node.attribute("propertyDefinitionId"),
				Some(property_ids::OBJECT_TYPE_ID | property_ids::SECONDARY_OBJECT_TYPE_IDS)
			)
		})
		.flat_map(|(node, _)| children(*node, CMIS_NS, "value").map(text_of))
		.filter_map(|type_id| cx.types.type_definition(&type_id))
		.collect::<Vec<_>>();

	elements.into_iter().map(|(node, ty)| property(node, ty, &definitions)).collect()
}

fn property(node: Node<'_, '_>, ty: PropertyType, definitions: &[Arc<TypeDefinition>]) -> ParseResult<PropertyData> {
	let id = node
		.attribute("propertyDefinitionId")
		.ok_or_else(|| ParseError::missing("propertyDefinitionId"))?;
	let values = children(node, CMIS_NS, "value")
		.map(|value| Value::from_text(ty, value.text().unwrap_or_default()))
		.collect::<ParseResult<Vec<_>>>()
		.map_err(|e| ParseError::at(id, e.reason))?;
	let definition = definitions.iter().find_map(|definition| definition.property_definition(id));
	let cardinality = definition
		.map(|definition| definition.cardinality)
		.or_else(|| property_ids::core_property_shape(id).map(|(_, cardinality)| cardinality))
		.unwrap_or(if values.len() > 1 { Cardinality::Multiple } else { Cardinality::Single });
	let value = match cardinality {
		Cardinality::Multiple => PropertyValue::Multiple(values),
		Cardinality::Single if values.len() > 1 =>
			return Err(ParseError::at(id, format!("single-valued property carried {} values", values.len()))),
		Cardinality::Single => PropertyValue::Single(values.into_iter().next()),
	};
	let mut property = PropertyData::new(id, ty, value);

	property.local_name = node.attribute("localName").map(str::to_owned);
	property.display_name = node.attribute("displayName").map(str::to_owned);
	property.query_name = node.attribute("queryName").map(str::to_owned);

	Ok(property)
}

fn allowable_actions(node: Node<'_, '_>) -> AllowableActions {
	AllowableActions::from_flags(
		node.children()
			.filter(|action| action.is_element())
			.map(|action| (action.tag_name().name(), text_of(action) == "true")),
	)
}

fn change_event_info(node: Node<'_, '_>) -> ParseResult<ChangeEventInfo> {
	let change_type = child_text(node, CMIS_NS, "changeType").ok_or_else(|| ParseError::missing("cmis:changeType"))?;
	let change_time = child_text(node, CMIS_NS, "changeTime")
		.map(|text| Value::from_text(PropertyType::DateTime, &text))
		.transpose()?
		.and_then(|value| value.as_datetime());

	Ok(ChangeEventInfo { change_type: change_type.parse()?, change_time })
}

fn acl(node: Node<'_, '_>, exact: Option<bool>) -> ParseResult<Acl> {
	let aces = children(node, CMIS_NS, "permission")
		.map(|permission| {
			let principal_id = child(permission, CMIS_NS, "principal")
				.and_then(|principal| child_text(principal, CMIS_NS, "principalId"))
				.ok_or_else(|| ParseError::missing("cmis:principalId"))?;

			Ok(Ace {
				principal_id,
				permissions: children(permission, CMIS_NS, "permission").map(text_of).collect(),
				is_direct: child_text(permission, CMIS_NS, "direct").is_none_or(|text| text == "true"),
			})
		})
		.collect::<ParseResult<_>>()?;

	Ok(Acl { aces, is_exact: exact })
}

fn rendition(node: Node<'_, '_>) -> ParseResult<Rendition> {
	Ok(Rendition {
		stream_id: child_text(node, CMIS_NS, "streamId").ok_or_else(|| ParseError::missing("cmis:streamId"))?,
		mime_type: child_text(node, CMIS_NS, "mimetype"),
		length: child_number(node, CMIS_NS, "length")?,
		kind: child_text(node, CMIS_NS, "kind"),
		title: child_text(node, CMIS_NS, "title"),
		height: child_number(node, CMIS_NS, "height")?,
		width: child_number(node, CMIS_NS, "width")?,
		rendition_document_id: child_text(node, CMIS_NS, "renditionDocumentId"),
	})
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		_preludet::*,
		codec::{NoTypes, TypeResolver},
		links::media,
		model::{ChangeType, collection, template},
	};

	const SERVICE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<app:service xmlns:app="http://www.w3.org/2007/app" xmlns:atom="http://www.w3.org/2005/Atom"
	xmlns:cmis="http://docs.oasis-open.org/ns/cmis/core/200908/"
	xmlns:cmisra="http://docs.oasis-open.org/ns/cmis/restatom/200908/">
	<app:workspace>
		<atom:title>Main</atom:title>
		<cmisra:repositoryInfo>
			<cmis:repositoryId>A1</cmis:repositoryId>
			<cmis:repositoryName>Main</cmis:repositoryName>
			<cmis:vendorName>Acme</cmis:vendorName>
			<cmis:rootFolderId>root-1</cmis:rootFolderId>
			<cmis:latestChangeLogToken>17</cmis:latestChangeLogToken>
			<cmis:capabilities>
				<cmis:capabilityACL>manage</cmis:capabilityACL>
				<cmis:capabilityChanges>objectidsonly</cmis:capabilityChanges>
			</cmis:capabilities>
			<cmis:cmisVersionSupported>1.1</cmis:cmisVersionSupported>
		</cmisra:repositoryInfo>
		<app:collection href="https://ecm.example.com/atom/A1/children?id=root-1">
			<cmisra:collectionType>root</cmisra:collectionType>
		</app:collection>
		<app:collection href="types">
			<cmisra:collectionType>types</cmisra:collectionType>
		</app:collection>
		<atom:link rel="http://docs.oasis-open.org/ns/cmis/link/200908/changes" href="https://ecm.example.com/atom/A1/changes" type="application/atom+xml;type=feed"/>
		<cmisra:uritemplate>
			<cmisra:template>https://ecm.example.com/atom/A1/id?id={id}&amp;filter={filter}</cmisra:template>
			<cmisra:type>objectbyid</cmisra:type>
			<cmisra:mediatype>application/atom+xml;type=entry</cmisra:mediatype>
		</cmisra:uritemplate>
	</app:workspace>
</app:service>"#;

	const ENTRY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<atom:entry xmlns:atom="http://www.w3.org/2005/Atom"
	xmlns:cmis="http://docs.oasis-open.org/ns/cmis/core/200908/"
	xmlns:cmisra="http://docs.oasis-open.org/ns/cmis/restatom/200908/">
	<atom:id>urn:uuid:doc-1</atom:id>
	<atom:link rel="self" href="entry?id=doc-1" type="application/atom+xml;type=entry"/>
	<atom:link rel="http://docs.oasis-open.org/ns/cmis/link/200908/acl" href="acl?id=doc-1" type="application/cmisacl+xml"/>
	<atom:content src="content?id=doc-1" type="application/pdf"/>
	<cmisra:object>
		<cmis:properties>
			<cmis:propertyId propertyDefinitionId="cmis:objectId" displayName="Object Id"><cmis:value>doc-1</cmis:value></cmis:propertyId>
			<cmis:propertyId propertyDefinitionId="cmis:objectTypeId"><cmis:value>acme:invoice</cmis:value></cmis:propertyId>
			<cmis:propertyId propertyDefinitionId="cmis:baseTypeId"><cmis:value>cmis:document</cmis:value></cmis:propertyId>
			<cmis:propertyDecimal propertyDefinitionId="acme:amounts"><cmis:value>12.5</cmis:value></cmis:propertyDecimal>
			<cmis:propertyDateTime propertyDefinitionId="cmis:creationDate"><cmis:value>2024-03-01T10:00:00.000Z</cmis:value></cmis:propertyDateTime>
		</cmis:properties>
		<cmis:allowableActions>
			<cmis:canGetACL>true</cmis:canGetACL>
			<cmis:canDeleteObject>false</cmis:canDeleteObject>
		</cmis:allowableActions>
		<cmis:acl>
			<cmis:permission>
				<cmis:principal><cmis:principalId>alice</cmis:principalId></cmis:principal>
				<cmis:permission>cmis:all</cmis:permission>
				<cmis:direct>true</cmis:direct>
			</cmis:permission>
			<cmis:permission>
				<cmis:principal><cmis:principalId>everyone</cmis:principalId></cmis:principal>
				<cmis:permission>cmis:read</cmis:permission>
				<cmis:direct>false</cmis:direct>
			</cmis:permission>
		</cmis:acl>
		<cmis:exactACL>true</cmis:exactACL>
		<cmis:rendition>
			<cmis:streamId>thumb-1</cmis:streamId>
			<cmis:mimetype>image/png</cmis:mimetype>
			<cmis:length>2048</cmis:length>
			<cmis:kind>cmis:thumbnail</cmis:kind>
		</cmis:rendition>
	</cmisra:object>
	<cmisra:pathSegment>invoice.pdf</cmisra:pathSegment>
</atom:entry>"#;

	struct Invoice(Arc<TypeDefinition>);
	impl TypeResolver for Invoice {
		fn type_definition(&self, type_id: &str) -> Option<Arc<TypeDefinition>> {
			(type_id == self.0.id).then(|| self.0.clone())
		}
	}

	fn invoice() -> Invoice {
		let mut property_definitions = IndexMap::new();

		property_definitions.insert(
			"acme:amounts".to_owned(),
			property_definition("acme:amounts", PropertyType::Decimal, Cardinality::Multiple),
		);

		Invoice(Arc::new(TypeDefinition {
			id: "acme:invoice".into(),
			local_name: None,
			local_namespace: None,
			display_name: None,
			query_name: None,
			description: None,
			base_type: BaseType::Document,
			parent_id: None,
			creatable: true,
			fileable: true,
			queryable: true,
			full_text_indexed: false,
			included_in_supertype_query: true,
			controllable_policy: false,
			controllable_acl: true,
			property_definitions,
		}))
	}

	#[test]
	fn service_document_yields_endpoints() {
		let base = url("https://ecm.example.com/atom/");
		let infos = AtomPubCodec
			.parse_repository_infos(SERVICE.as_bytes(), ParseContext::new(&base, &NoTypes))
			.expect("Service document should parse.");
		let info = &infos["A1"];

		assert_eq!(info.name.as_deref(), Some("Main"));
		assert_eq!(info.root_folder_id.as_deref(), Some("root-1"));
		assert_eq!(info.latest_change_log_token.as_deref(), Some("17"));
		assert_eq!(info.capability("capabilityChanges"), Some("objectidsonly"));
		assert_eq!(
			info.endpoints.collections.get(collection::TYPES),
			Some(&url("https://ecm.example.com/atom/types"))
		);
		assert!(info.endpoints.collections.contains_key(collection::ROOT));
		assert_eq!(
			info.endpoints.uri_templates.get(template::OBJECT_BY_ID).map(String::as_str),
			Some("https://ecm.example.com/atom/A1/id?id={id}&filter={filter}")
		);
		assert_eq!(
			info.endpoints.links.resolve(rel::CHANGES, None),
			Some(&url("https://ecm.example.com/atom/A1/changes"))
		);
	}

	#[test]
	fn entry_carries_links_content_and_typed_properties() {
		let base = url("https://ecm.example.com/atom/A1/");
		let types = invoice();
		let object = AtomPubCodec
			.parse_object_data(ENTRY.as_bytes(), ParseContext::new(&base, &types))
			.expect("Entry should parse.");
		let acl = object.acl.as_ref().expect("ACL should be present.");

		assert_eq!(object.id, "doc-1");
		assert_eq!(object.base_type, Some(BaseType::Document));
		assert_eq!(
			object.properties.get("acme:amounts").map(|property| &property.value),
			Some(&PropertyValue::Multiple(vec![Value::Decimal(12.5)]))
		);
		assert!(object.properties.datetime(property_ids::CREATION_DATE).is_some());
		assert_eq!(
			object.links.resolve(rel::ACL, Some(media::CMIS_ACL)),
			Some(&url("https://ecm.example.com/atom/A1/acl?id=doc-1"))
		);
		assert_eq!(object.content_url, Some(url("https://ecm.example.com/atom/A1/content?id=doc-1")));
		assert_eq!(object.path_segment.as_deref(), Some("invoice.pdf"));
		assert!(object.allowable_actions.as_ref().is_some_and(|actions| actions.allows("canGetACL")));
		assert_eq!(acl.is_exact, Some(true));
		assert_eq!(acl.direct_aces().count(), 1);
		assert_eq!(object.renditions[0].length, Some(2048));
	}

	#[test]
	fn untyped_single_value_stays_scalar() {
		let base = url("https://ecm.example.com/atom/A1/");
		let object = AtomPubCodec
			.parse_object_data(ENTRY.as_bytes(), ParseContext::new(&base, &NoTypes))
			.expect("Entry should parse.");

		assert_eq!(
			object.properties.get("acme:amounts").map(|property| &property.value),
			Some(&PropertyValue::Single(Some(Value::Decimal(12.5))))
		);
	}

	#[test]
	fn entry_without_object_id_is_rejected() {
		let base = url("https://ecm.example.com/atom/A1/");
		let payload = ENTRY.replace("propertyDefinitionId=\"cmis:objectId\"", "propertyDefinitionId=\"acme:other\"");
		let err = AtomPubCodec
			.parse_object_data(payload.as_bytes(), ParseContext::new(&base, &NoTypes))
			.expect_err("Entries without an id should be rejected.");

		assert_eq!(err.path.as_deref(), Some(property_ids::OBJECT_ID));
	}

	#[test]
	fn change_feed_reports_token_from_next_link() {
		let base = url("https://ecm.example.com/atom/A1/");
		let payload = r#"<atom:feed xmlns:atom="http://www.w3.org/2005/Atom"
	xmlns:cmis="http://docs.oasis-open.org/ns/cmis/core/200908/"
	xmlns:cmisra="http://docs.oasis-open.org/ns/cmis/restatom/200908/">
	<atom:link rel="next" href="changes?changeLogToken=88&amp;maxItems=1"/>
	<cmisra:numItems>3</cmisra:numItems>
	<atom:entry>
		<cmisra:object>
			<cmis:properties>
				<cmis:propertyId propertyDefinitionId="cmis:objectId"><cmis:value>d-1</cmis:value></cmis:propertyId>
			</cmis:properties>
			<cmis:changeEventInfo>
				<cmis:changeType>updated</cmis:changeType>
				<cmis:changeTime>2024-03-01T10:00:00Z</cmis:changeTime>
			</cmis:changeEventInfo>
		</cmisra:object>
	</atom:entry>
</atom:feed>"#;
		let changes = AtomPubCodec
			.parse_change_events(payload.as_bytes(), ParseContext::new(&base, &NoTypes))
			.expect("Change feed should parse.");

		assert!(changes.has_more_items);
		assert_eq!(changes.latest_change_log_token.as_deref(), Some("88"));
		assert_eq!(changes.events[0].change_type, ChangeType::Updated);
	}

	#[test]
	fn type_entry_parses_property_definitions() {
		let base = url("https://ecm.example.com/atom/A1/");
		let payload = r#"<atom:entry xmlns:atom="http://www.w3.org/2005/Atom"
	xmlns:cmis="http://docs.oasis-open.org/ns/cmis/core/200908/"
	xmlns:cmisra="http://docs.oasis-open.org/ns/cmis/restatom/200908/">
	<cmisra:type>
		<cmis:id>acme:invoice</cmis:id>
		<cmis:baseId>cmis:document</cmis:baseId>
		<cmis:parentId>cmis:document</cmis:parentId>
		<cmis:creatable>true</cmis:creatable>
		<cmis:controllableACL>true</cmis:controllableACL>
		<cmis:propertyDecimalDefinition>
			<cmis:id>acme:amounts</cmis:id>
			<cmis:propertyType>decimal</cmis:propertyType>
			<cmis:cardinality>multiple</cmis:cardinality>
			<cmis:updatability>readwrite</cmis:updatability>
			<cmis:required>false</cmis:required>
		</cmis:propertyDecimalDefinition>
	</cmisra:type>
</atom:entry>"#;
		let definition = AtomPubCodec
			.parse_type_definition(payload.as_bytes(), ParseContext::new(&base, &NoTypes))
			.expect("Type entry should parse.");
		let amounts = definition.property_definition("acme:amounts").expect("Property should be defined.");

		assert!(definition.creatable && definition.controllable_acl);
		assert_eq!(definition.parent_id.as_deref(), Some("cmis:document"));
		assert_eq!(amounts.cardinality, Cardinality::Multiple);
		assert_eq!(amounts.updatability, Updatability::ReadWrite);
	}

	#[test]
	fn non_xml_payload_is_a_parse_error() {
		let base = url("https://ecm.example.com/atom/A1/");

		assert!(AtomPubCodec.parse_object_data(b"{\"json\":true}", ParseContext::new(&base, &NoTypes)).is_err());
	}
}
