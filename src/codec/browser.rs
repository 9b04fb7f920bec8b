//! Browser-binding JSON codec.
//!
//! Objects arrive either with verbose `properties` (one object per property carrying its type
//! and cardinality) or with `succinctProperties` (bare values keyed by property id). Both forms
//! normalize into the same [`Properties`]. Succinct values are typed from the object's type and
//! secondary types when the resolver knows them, then from the core property table, and only then
//! inferred from the JSON value.

// crates.io
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
// self
use crate::{
	_prelude::*,
	codec::{ParseContext, ParseResult, WireCodec},
	error::ParseError,
	model::{
		Ace, Acl, AllowableActions, BaseType, Cardinality, ChangeEvent, ChangeEventInfo, ChangeEvents,
		FailedToDelete, ObjectData, ObjectList, Properties, PropertyData, PropertyDefinition,
		PropertyType, PropertyValue, QueryResult, QueryResults, Rendition, RepositoryInfo,
		TypeDefinition, Updatability, Value, property_ids,
	},
	session::BindingKind,
};

/// JSON codec for the browser binding.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserCodec;
impl WireCodec for BrowserCodec {
	fn binding(&self) -> BindingKind {
		BindingKind::Browser
	}

	fn parse_repository_infos(
		&self,
		payload: &[u8],
		cx: ParseContext<'_>,
	) -> ParseResult<IndexMap<String, RepositoryInfo>> {
		let raw = decode::<IndexMap<String, RepositoryInfoJson>>(payload)?;

		raw.into_iter()
			.map(|(key, info)| {
				let info = info.into_model(cx).map_err(|e| nest(&key, e))?;

				Ok((info.id.clone(), info))
			})
			.collect()
	}

	fn parse_type_definition(&self, payload: &[u8], _: ParseContext<'_>) -> ParseResult<TypeDefinition> {
		decode::<TypeDefinitionJson>(payload)?.into_model()
	}

	fn parse_object_data(&self, payload: &[u8], cx: ParseContext<'_>) -> ParseResult<ObjectData> {
		decode::<ObjectJson>(payload)?.into_object(cx)
	}

	fn parse_object_list(&self, payload: &[u8], cx: ParseContext<'_>) -> ParseResult<ObjectList> {
		let raw = decode::<ObjectListJson>(payload)?;
		let objects = raw
			.objects
			.into_iter()
			.enumerate()
			.map(|(index, listed)| listed.into_object(cx).map_err(|e| nest(&format!("objects[{index}]"), e)))
			.collect::<ParseResult<Vec<_>>>()?;

		Ok(ObjectList { objects, has_more_items: raw.has_more_items, num_items: raw.num_items })
	}

	fn parse_renditions(&self, payload: &[u8], _: ParseContext<'_>) -> ParseResult<Vec<Rendition>> {
		Ok(decode::<Vec<RenditionJson>>(payload)?.into_iter().map(Rendition::from).collect())
	}

	fn parse_acl(&self, payload: &[u8], _: ParseContext<'_>) -> ParseResult<Acl> {
		Ok(decode::<AclJson>(payload)?.into_model(None))
	}

	fn parse_change_events(&self, payload: &[u8], cx: ParseContext<'_>) -> ParseResult<ChangeEvents> {
		let raw = decode::<ObjectListJson>(payload)?;
		let events = raw
			.objects
			.into_iter()
			.enumerate()
			.map(|(index, listed)| {
				listed
					.into_object(cx)
					.and_then(ChangeEvent::try_from)
					.map_err(|e| nest(&format!("objects[{index}]"), e))
			})
			.collect::<ParseResult<Vec<_>>>()?;

		Ok(ChangeEvents {
			events,
			latest_change_log_token: raw.change_log_token,
			has_more_items: raw.has_more_items,
			num_items: raw.num_items,
		})
	}

	fn parse_query_results(&self, payload: &[u8], cx: ParseContext<'_>) -> ParseResult<QueryResults> {
		let raw = decode::<QueryResultsJson>(payload)?;
		let results = raw
			.results
			.into_iter()
			.enumerate()
			.map(|(index, row)| row.into_query_result(cx).map_err(|e| nest(&format!("results[{index}]"), e)))
			.collect::<ParseResult<Vec<_>>>()?;

		Ok(QueryResults { results, has_more_items: raw.has_more_items, num_items: raw.num_items })
	}

	fn parse_failed_to_delete(&self, payload: &[u8], _: ParseContext<'_>) -> ParseResult<FailedToDelete> {
		if payload.iter().all(u8::is_ascii_whitespace) {
			return Ok(FailedToDelete::default());
		}

		Ok(FailedToDelete { ids: decode::<IdsJson>(payload)?.ids })
	}

	fn referenced_type_ids(&self, payload: &[u8]) -> ParseResult<BTreeSet<String>> {
		let document = serde_json::from_slice::<JsonValue>(payload)?;
		let mut type_ids = BTreeSet::new();

		collect_succinct_type_ids(&document, &mut type_ids);

		Ok(type_ids)
	}
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryInfoJson {
	repository_id: String,
	repository_name: Option<String>,
	repository_description: Option<String>,
	vendor_name: Option<String>,
	product_name: Option<String>,
	product_version: Option<String>,
	root_folder_id: Option<String>,
	#[serde(default)]
	capabilities: IndexMap<String, JsonValue>,
	cmis_version_supported: Option<String>,
	principal_id_anonymous: Option<String>,
	principal_id_anyone: Option<String>,
	latest_change_log_token: Option<String>,
	repository_url: Option<String>,
	root_folder_url: Option<String>,
}
impl RepositoryInfoJson {
	fn into_model(self, cx: ParseContext<'_>) -> ParseResult<RepositoryInfo> {
		let capabilities = self
			.capabilities
			.into_iter()
			.filter_map(|(name, value)| {
				let rendered = match value {
					JsonValue::String(text) => text,
					JsonValue::Bool(_) | JsonValue::Number(_) => value.to_string(),
					_ => return None,
				};

				Some((name, rendered))
			})
			.collect();

		Ok(RepositoryInfo {
			id: self.repository_id,
			name: self.repository_name,
			description: self.repository_description,
			vendor_name: self.vendor_name,
			product_name: self.product_name,
			product_version: self.product_version,
			root_folder_id: self.root_folder_id,
			capabilities,
			cmis_version_supported: self.cmis_version_supported,
			principal_id_anonymous: self.principal_id_anonymous,
			principal_id_anyone: self.principal_id_anyone,
			latest_change_log_token: self.latest_change_log_token,
			repository_url: self.repository_url.map(|href| cx.resolve_url(&href)).transpose()?,
			root_folder_url: self.root_folder_url.map(|href| cx.resolve_url(&href)).transpose()?,
			endpoints: Default::default(),
		})
	}
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypeDefinitionJson {
	id: String,
	local_name: Option<String>,
	local_namespace: Option<String>,
	display_name: Option<String>,
	query_name: Option<String>,
	description: Option<String>,
	base_id: String,
	parent_id: Option<String>,
	#[serde(default, alias = "createable")]
	creatable: bool,
	#[serde(default)]
	fileable: bool,
	#[serde(default)]
	queryable: bool,
	#[serde(default, rename = "fulltextIndexed", alias = "fullTextIndexed")]
	full_text_indexed: bool,
	#[serde(default, rename = "includedInSupertypeQuery", alias = "includedInSuperTypeQuery")]
	included_in_supertype_query: bool,
	#[serde(default)]
	controllable_policy: bool,
	#[serde(default, rename = "controllableACL", alias = "controllableAcl")]
	controllable_acl: bool,
	#[serde(default)]
	property_definitions: IndexMap<String, PropertyDefinitionJson>,
}
impl TypeDefinitionJson {
	fn into_model(self) -> ParseResult<TypeDefinition> {
		let base_type = BaseType::from_str(&self.base_id).map_err(|e| nest("baseId", e))?;
		let property_definitions = self
			.property_definitions
			.into_iter()
			.map(|(key, definition)| {
				let definition = definition.into_model(&key);

				(definition.id.clone(), definition)
			})
			.collect();

		Ok(TypeDefinition {
			id: self.id,
			local_name: self.local_name,
			local_namespace: self.local_namespace,
			display_name: self.display_name,
			query_name: self.query_name,
			description: self.description,
			base_type,
			parent_id: self.parent_id,
			creatable: self.creatable,
			fileable: self.fileable,
			queryable: self.queryable,
			full_text_indexed: self.full_text_indexed,
			included_in_supertype_query: self.included_in_supertype_query,
			controllable_policy: self.controllable_policy,
			controllable_acl: self.controllable_acl,
			property_definitions,
		})
	}
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PropertyDefinitionJson {
	id: Option<String>,
	local_name: Option<String>,
	display_name: Option<String>,
	query_name: Option<String>,
	description: Option<String>,
	property_type: PropertyType,
	#[serde(default)]
	cardinality: Cardinality,
	#[serde(default, alias = "updateability")]
	updatability: Updatability,
	#[serde(default)]
	inherited: bool,
	#[serde(default)]
	required: bool,
	#[serde(default)]
	queryable: bool,
	#[serde(default)]
	orderable: bool,
}
impl PropertyDefinitionJson {
	fn into_model(self, key: &str) -> PropertyDefinition {
		PropertyDefinition {
			id: self.id.unwrap_or_else(|| key.to_owned()),
			local_name: self.local_name,
			display_name: self.display_name,
			query_name: self.query_name,
			description: self.description,
			property_type: self.property_type,
			cardinality: self.cardinality,
			updatability: self.updatability,
			inherited: self.inherited,
			required: self.required,
			queryable: self.queryable,
			orderable: self.orderable,
		}
	}
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectJson {
	properties: Option<IndexMap<String, PropertyJson>>,
	succinct_properties: Option<IndexMap<String, JsonValue>>,
	allowable_actions: Option<IndexMap<String, JsonValue>>,
	#[serde(default)]
	relationships: Vec<ObjectJson>,
	change_event_info: Option<ChangeEventInfoJson>,
	acl: Option<AclJson>,
	#[serde(rename = "exactACL", alias = "exactAcl")]
	exact_acl: Option<bool>,
	policy_ids: Option<IdsJson>,
	#[serde(default)]
	renditions: Vec<RenditionJson>,
}
impl ObjectJson {
	fn into_object(self, cx: ParseContext<'_>) -> ParseResult<ObjectData> {
		let properties = self.take_properties(cx)?;
		let mut object = ObjectData::from_properties(properties)?;

		object.allowable_actions = self.allowable_actions.map(allowable_actions);
		object.acl = self.acl.map(|acl| acl.into_model(self.exact_acl));
		object.relationships = relationships(self.relationships, cx)?;
		object.change_event_info = self.change_event_info.map(ChangeEventInfoJson::into_model).transpose()?;
		object.policy_ids = self.policy_ids.map(|policies| policies.ids).unwrap_or_default();
		object.renditions = self.renditions.into_iter().map(Rendition::from).collect();

		Ok(object)
	}

	fn into_query_result(self, cx: ParseContext<'_>) -> ParseResult<QueryResult> {
		let properties = self.take_properties(cx)?;

		Ok(QueryResult {
			properties,
			allowable_actions: self.allowable_actions.map(allowable_actions),
			relationships: relationships(self.relationships, cx)?,
			renditions: self.renditions.into_iter().map(Rendition::from).collect(),
		})
	}

	fn take_properties(&self, cx: ParseContext<'_>) -> ParseResult<Properties> {
		match (&self.succinct_properties, &self.properties) {
			(Some(succinct), _) => {
				let scope = TypeScope::for_succinct(succinct, cx);

				succinct
					.iter()
					.map(|(id, raw)| scope.succinct_property(id, raw).map_err(|e| nest(&format!("succinctProperties.{id}"), e)))
					.collect()
			},
			(None, Some(verbose)) => {
				let scope = TypeScope::for_verbose(verbose, cx);

				verbose
					.iter()
					.map(|(key, raw)| scope.verbose_property(key, raw).map_err(|e| nest(&format!("properties.{key}"), e)))
					.collect()
			},
			(None, None) => Ok(Properties::new()),
		}
	}
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PropertyJson {
	id: Option<String>,
	local_name: Option<String>,
	display_name: Option<String>,
	query_name: Option<String>,
	#[serde(rename = "type")]
	property_type: Option<PropertyType>,
	cardinality: Option<Cardinality>,
	#[serde(default)]
	value: JsonValue,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangeEventInfoJson {
	change_type: String,
	#[serde(default)]
	change_time: JsonValue,
}
impl ChangeEventInfoJson {
	fn into_model(self) -> ParseResult<ChangeEventInfo> {
		let change_time = match &self.change_time {
			JsonValue::Null => None,
			raw => Value::from_json(PropertyType::DateTime, raw)?.as_datetime(),
		};

		Ok(ChangeEventInfo { change_type: self.change_type.parse()?, change_time })
	}
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AclJson {
	#[serde(default)]
	aces: Vec<AceJson>,
	is_exact: Option<bool>,
}
impl AclJson {
	fn into_model(self, exact_hint: Option<bool>) -> Acl {
		Acl {
			aces: self
				.aces
				.into_iter()
				.map(|ace| Ace {
					principal_id: ace.principal.principal_id,
					permissions: ace.permissions,
					is_direct: ace.is_direct,
				})
				.collect(),
			is_exact: self.is_exact.or(exact_hint),
		}
	}
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AceJson {
	principal: PrincipalJson,
	#[serde(default)]
	permissions: Vec<String>,
	#[serde(default = "direct_by_default")]
	is_direct: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrincipalJson {
	principal_id: String,
}

#[derive(Deserialize)]
struct IdsJson {
	#[serde(default)]
	ids: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenditionJson {
	stream_id: String,
	mime_type: Option<String>,
	length: Option<u64>,
	kind: Option<String>,
	title: Option<String>,
	height: Option<u64>,
	width: Option<u64>,
	rendition_document_id: Option<String>,
}
impl From<RenditionJson> for Rendition {
	fn from(raw: RenditionJson) -> Self {
		Self {
			stream_id: raw.stream_id,
			mime_type: raw.mime_type,
			length: raw.length,
			kind: raw.kind,
			title: raw.title,
			height: raw.height,
			width: raw.width,
			rendition_document_id: raw.rendition_document_id,
		}
	}
}

/// One entry of an object list: either `{"object": .., "pathSegment": ..}` (children) or a bare
/// object (changes, checked-out lists).
#[derive(Deserialize)]
#[serde(transparent)]
struct ListedObjectJson(JsonValue);
impl ListedObjectJson {
	fn into_object(self, cx: ParseContext<'_>) -> ParseResult<ObjectData> {
		if self.0.as_object().is_some_and(|entry| entry.contains_key("object")) {
			let InFolderJson { object, path_segment } = serde_path_to_error::deserialize(self.0)?;
			let mut object = object.into_object(cx)?;

			object.path_segment = path_segment;

			Ok(object)
		} else {
			let object: ObjectJson = serde_path_to_error::deserialize(self.0)?;

			object.into_object(cx)
		}
	}
}

#[derive(Deserialize)]
struct InFolderJson {
	object: ObjectJson,
	#[serde(rename = "pathSegment")]
	path_segment: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectListJson {
	#[serde(default)]
	objects: Vec<ListedObjectJson>,
	#[serde(default)]
	has_more_items: bool,
	num_items: Option<u64>,
	change_log_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResultsJson {
	#[serde(default)]
	results: Vec<ObjectJson>,
	#[serde(default)]
	has_more_items: bool,
	num_items: Option<u64>,
}

/// Type definitions that apply to one object.
struct TypeScope(Vec<Arc<TypeDefinition>>);
impl TypeScope {
	fn for_succinct(succinct: &IndexMap<String, JsonValue>, cx: ParseContext<'_>) -> Self {
		Self::resolve(
			succinct.get(property_ids::OBJECT_TYPE_ID),
			succinct.get(property_ids::SECONDARY_OBJECT_TYPE_IDS),
			cx,
		)
	}

	fn for_verbose(verbose: &IndexMap<String, PropertyJson>, cx: ParseContext<'_>) -> Self {
		Self::resolve(
			verbose.get(property_ids::OBJECT_TYPE_ID).map(|property| &property.value),
			verbose.get(property_ids::SECONDARY_OBJECT_TYPE_IDS).map(|property| &property.value),
			cx,
		)
	}

	fn resolve(primary: Option<&JsonValue>, secondary: Option<&JsonValue>, cx: ParseContext<'_>) -> Self {
		let mut type_ids = Vec::new();

		json_strings(primary, &mut type_ids);
		json_strings(secondary, &mut type_ids);

		Self(type_ids.into_iter().filter_map(|type_id| cx.types.type_definition(type_id)).collect())
	}

	fn definition(&self, property_id: &str) -> Option<&PropertyDefinition> {
		self.0.iter().find_map(|definition| definition.property_definition(property_id))
	}

	fn shape(&self, property_id: &str) -> Option<(PropertyType, Cardinality)> {
		self.definition(property_id)
			.map(|definition| (definition.property_type, definition.cardinality))
			.or_else(|| property_ids::core_property_shape(property_id))
	}

	fn succinct_property(&self, id: &str, raw: &JsonValue) -> ParseResult<PropertyData> {
		let Some((ty, cardinality)) = self.shape(id) else {
			return PropertyData::inferred_from_json(id, raw);
		};
		let mut property = PropertyData::new(id, ty, PropertyValue::from_json(ty, cardinality, raw)?);

		if let Some(definition) = self.definition(id) {
			property.local_name = definition.local_name.clone();
			property.display_name = definition.display_name.clone();
			property.query_name = definition.query_name.clone();
		}

		Ok(property)
	}

	fn verbose_property(&self, key: &str, raw: &PropertyJson) -> ParseResult<PropertyData> {
		let id = raw.id.as_deref().unwrap_or(key);
		let known = self.shape(id);
		let ty = raw.property_type.or(known.map(|(ty, _)| ty));
		let cardinality = raw.cardinality.or(known.map(|(_, cardinality)| cardinality));
		let mut property = match (ty, cardinality) {
			(Some(ty), Some(cardinality)) =>
				PropertyData::new(id, ty, PropertyValue::from_json(ty, cardinality, &raw.value)?),
			(Some(ty), None) => {
				let cardinality =
					if raw.value.is_array() { Cardinality::Multiple } else { Cardinality::Single };

				PropertyData::new(id, ty, PropertyValue::from_json(ty, cardinality, &raw.value)?)
			},
			(None, _) => PropertyData::inferred_from_json(id, &raw.value)?,
		};

		property.local_name = raw.local_name.clone();
		property.display_name = raw.display_name.clone();
		property.query_name = raw.query_name.clone();

		Ok(property)
	}
}

fn decode<T>(payload: &[u8]) -> ParseResult<T>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(payload);

	Ok(serde_path_to_error::deserialize(&mut deserializer)?)
}

fn nest(prefix: &str, error: ParseError) -> ParseError {
	let path = match error.path {
		Some(inner) if !inner.is_empty() && inner != "." => format!("{prefix}.{inner}"),
		_ => prefix.to_owned(),
	};

	ParseError::at(path, error.reason)
}

fn allowable_actions(flags: IndexMap<String, JsonValue>) -> AllowableActions {
	AllowableActions::from_flags(flags.into_iter().map(|(action, allowed)| (action, allowed.as_bool().unwrap_or(false))))
}

fn relationships(raw: Vec<ObjectJson>, cx: ParseContext<'_>) -> ParseResult<Vec<ObjectData>> {
	raw.into_iter()
		.enumerate()
		.map(|(index, relationship)| {
			relationship.into_object(cx).map_err(|e| nest(&format!("relationships[{index}]"), e))
		})
		.collect()
}

fn json_strings<'a>(raw: Option<&'a JsonValue>, into: &mut Vec<&'a str>) {
	match raw {
		Some(JsonValue::String(text)) => into.push(text),
		Some(JsonValue::Array(items)) => into.extend(items.iter().filter_map(JsonValue::as_str)),
		_ => {},
	}
}

fn collect_succinct_type_ids(node: &JsonValue, type_ids: &mut BTreeSet<String>) {
	match node {
		JsonValue::Object(map) => {
			if let Some(JsonValue::Object(succinct)) = map.get("succinctProperties") {
				let mut found = Vec::new();

				json_strings(succinct.get(property_ids::OBJECT_TYPE_ID), &mut found);
				json_strings(succinct.get(property_ids::SECONDARY_OBJECT_TYPE_IDS), &mut found);
				type_ids.extend(found.into_iter().map(str::to_owned));
			}

			map.values().for_each(|child| collect_succinct_type_ids(child, type_ids));
		},
		JsonValue::Array(items) => items.iter().for_each(|child| collect_succinct_type_ids(child, type_ids)),
		_ => {},
	}
}

fn direct_by_default() -> bool {
	true
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;
	use crate::{
		_preludet::*,
		codec::{NoTypes, TypeResolver},
		model::ChangeType,
	};

	struct Types(Vec<Arc<TypeDefinition>>);
	impl TypeResolver for Types {
		fn type_definition(&self, type_id: &str) -> Option<Arc<TypeDefinition>> {
			self.0.iter().find(|definition| definition.id == type_id).cloned()
		}
	}

	fn invoice_type() -> TypeDefinition {
		let mut property_definitions = IndexMap::new();

		property_definitions.insert(
			"acme:amounts".to_owned(),
			property_definition("acme:amounts", PropertyType::Decimal, Cardinality::Multiple),
		);
		property_definitions.insert(
			"acme:reviewed".to_owned(),
			property_definition("acme:reviewed", PropertyType::Boolean, Cardinality::Single),
		);

		TypeDefinition {
			id: "acme:invoice".into(),
			local_name: None,
			local_namespace: None,
			display_name: None,
			query_name: None,
			description: None,
			base_type: BaseType::Document,
			parent_id: Some("cmis:document".into()),
			creatable: true,
			fileable: true,
			queryable: true,
			full_text_indexed: false,
			included_in_supertype_query: true,
			controllable_policy: false,
			controllable_acl: true,
			property_definitions,
		}
	}

	fn bytes(value: JsonValue) -> Vec<u8> {
		serde_json::to_vec(&value).expect("Fixture should serialize.")
	}

	#[test]
	fn repository_infos_are_keyed_by_id() {
		let base = url("https://ecm.example.com/cmis/browser");
		let payload = bytes(json!({
			"A1": {
				"repositoryId": "A1",
				"repositoryName": "Main",
				"repositoryDescription": "Main repository",
				"vendorName": "Acme",
				"productName": "Acme ECM",
				"productVersion": "7.1",
				"rootFolderId": "root-1",
				"capabilities": { "capabilityACL": "manage", "capabilityGetDescendants": true },
				"cmisVersionSupported": "1.1",
				"principalIdAnonymous": "guest",
				"principalIdAnyone": "everyone",
				"latestChangeLogToken": "42",
				"repositoryUrl": "https://ecm.example.com/cmis/browser/A1",
				"rootFolderUrl": "https://ecm.example.com/cmis/browser/A1/root"
			}
		}));
		let infos = BrowserCodec
			.parse_repository_infos(&payload, ParseContext::new(&base, &NoTypes))
			.expect("Repository infos should parse.");
		let info = &infos["A1"];

		assert_eq!(infos.len(), 1);
		assert_eq!(info.name.as_deref(), Some("Main"));
		assert_eq!(info.description.as_deref(), Some("Main repository"));
		assert_eq!(info.vendor_name.as_deref(), Some("Acme"));
		assert_eq!(info.product_name.as_deref(), Some("Acme ECM"));
		assert_eq!(info.product_version.as_deref(), Some("7.1"));
		assert_eq!(info.root_folder_id.as_deref(), Some("root-1"));
		assert_eq!(info.capability("capabilityACL"), Some("manage"));
		assert_eq!(info.capability("capabilityGetDescendants"), Some("true"));
		assert_eq!(info.cmis_version_supported.as_deref(), Some("1.1"));
		assert_eq!(info.principal_id_anonymous.as_deref(), Some("guest"));
		assert_eq!(info.principal_id_anyone.as_deref(), Some("everyone"));
		assert_eq!(info.latest_change_log_token.as_deref(), Some("42"));
		assert_eq!(info.root_folder_url, Some(url("https://ecm.example.com/cmis/browser/A1/root")));
	}

	#[test]
	fn succinct_multi_valued_decimal_stays_a_sequence() {
		let base = url("https://ecm.example.com/cmis/browser/A1/root");
		let types = Types(vec![Arc::new(invoice_type())]);
		let payload = bytes(json!({
			"succinctProperties": {
				"cmis:objectId": "doc-1",
				"cmis:objectTypeId": "acme:invoice",
				"cmis:baseTypeId": "cmis:document",
				"cmis:creationDate": 1_700_000_000_000_i64,
				"acme:amounts": 12.5,
				"acme:reviewed": true
			}
		}));
		let object = BrowserCodec
			.parse_object_data(&payload, ParseContext::new(&base, &types))
			.expect("Succinct object should parse.");
		let amounts = object.properties.get("acme:amounts").expect("Amounts should be present.");

		assert_eq!(object.id, "doc-1");
		assert_eq!(object.base_type, Some(BaseType::Document));
		assert_eq!(amounts.property_type, PropertyType::Decimal);
		assert_eq!(amounts.value, PropertyValue::Multiple(vec![Value::Decimal(12.5)]));
		assert_eq!(object.properties.boolean("acme:reviewed"), Some(true));
		assert!(object.properties.datetime(property_ids::CREATION_DATE).is_some());
	}

	#[test]
	fn verbose_properties_carry_their_own_types() {
		let base = url("https://ecm.example.com/cmis/browser/A1/root");
		let payload = bytes(json!({
			"properties": {
				"cmis:objectId": { "id": "cmis:objectId", "type": "id", "cardinality": "single", "value": "f-1" },
				"cmis:name": { "id": "cmis:name", "displayName": "Name", "type": "string", "cardinality": "single", "value": "Invoices" },
				"acme:tags": { "id": "acme:tags", "type": "string", "cardinality": "multiple", "value": ["a", "b"] }
			},
			"allowableActions": { "canGetChildren": true, "canDeleteObject": false },
			"acl": { "aces": [{ "principal": { "principalId": "alice" }, "permissions": ["cmis:all"], "isDirect": true }] },
			"exactACL": true,
			"policyIds": { "ids": ["p-1"] }
		}));
		let object = BrowserCodec
			.parse_object_data(&payload, ParseContext::new(&base, &NoTypes))
			.expect("Verbose object should parse.");
		let actions = object.allowable_actions.as_ref().expect("Allowable actions should be present.");

		assert_eq!(object.name(), Some("Invoices"));
		assert_eq!(object.properties.get("cmis:name").and_then(|p| p.display_name.as_deref()), Some("Name"));
		assert_eq!(object.properties.texts("acme:tags"), ["a", "b"]);
		assert!(actions.allows("canGetChildren"));
		assert!(!actions.allows("canDeleteObject"));
		assert_eq!(object.is_exact_acl(), Some(true));
		assert_eq!(object.policy_ids, ["p-1"]);
	}

	#[test]
	fn missing_object_id_is_a_parse_error() {
		let base = url("https://ecm.example.com/cmis/browser/A1/root");
		let payload = bytes(json!({ "succinctProperties": { "cmis:name": "orphan" } }));
		let err = BrowserCodec
			.parse_object_data(&payload, ParseContext::new(&base, &NoTypes))
			.expect_err("Objects without an id should be rejected.");

		assert_eq!(err.path.as_deref(), Some(property_ids::OBJECT_ID));
	}

	#[test]
	fn children_pages_keep_path_segments_and_count_hints() {
		let base = url("https://ecm.example.com/cmis/browser/A1/root");
		let payload = bytes(json!({
			"objects": [
				{ "object": { "succinctProperties": { "cmis:objectId": "c-1" } }, "pathSegment": "one" },
				{ "object": { "succinctProperties": { "cmis:objectId": "c-2" } }, "pathSegment": "two" }
			],
			"hasMoreItems": true,
			"numItems": 10
		}));
		let list = BrowserCodec
			.parse_object_list(&payload, ParseContext::new(&base, &NoTypes))
			.expect("Children should parse.");

		assert!(list.has_more_items);
		assert_eq!(list.objects.len(), 2);
		assert_eq!(list.objects[1].path_segment.as_deref(), Some("two"));
		assert!(list.num_items.is_some());
	}

	#[test]
	fn malformed_list_item_reports_its_position() {
		let base = url("https://ecm.example.com/cmis/browser/A1/root");
		let payload = bytes(json!({
			"objects": [
				{ "object": { "succinctProperties": { "cmis:objectId": "c-1" } } },
				{ "object": { "succinctProperties": { "cmis:name": "no id" } } }
			]
		}));
		let err = BrowserCodec
			.parse_object_list(&payload, ParseContext::new(&base, &NoTypes))
			.expect_err("A list with an id-less object should be rejected.");

		assert_eq!(err.path.as_deref(), Some("objects[1].cmis:objectId"));
	}

	#[test]
	fn change_events_carry_token_and_kinds() {
		let base = url("https://ecm.example.com/cmis/browser/A1");
		let payload = bytes(json!({
			"objects": [{
				"succinctProperties": { "cmis:objectId": "d-9" },
				"changeEventInfo": { "changeType": "deleted", "changeTime": 1_700_000_000_000_i64 }
			}],
			"hasMoreItems": false,
			"changeLogToken": "token-7"
		}));
		let changes = BrowserCodec
			.parse_change_events(&payload, ParseContext::new(&base, &NoTypes))
			.expect("Change events should parse.");

		assert_eq!(changes.latest_change_log_token.as_deref(), Some("token-7"));
		assert_eq!(changes.events[0].change_type, ChangeType::Deleted);
		assert!(changes.events[0].change_time.is_some());
	}

	#[test]
	fn type_definitions_accept_both_flag_spellings() {
		let base = url("https://ecm.example.com/cmis/browser/A1");
		let payload = bytes(json!({
			"id": "acme:invoice",
			"baseId": "cmis:document",
			"createable": true,
			"fullTextIndexed": true,
			"controllableACL": true,
			"propertyDefinitions": {
				"acme:amounts": {
					"id": "acme:amounts",
					"propertyType": "decimal",
					"cardinality": "multiple",
					"updatability": "readwrite",
					"orderable": true
				}
			}
		}));
		let definition = BrowserCodec
			.parse_type_definition(&payload, ParseContext::new(&base, &NoTypes))
			.expect("Type definition should parse.");
		let amounts = definition.property_definition("acme:amounts").expect("Property should be defined.");

		assert!(definition.creatable && definition.full_text_indexed && definition.controllable_acl);
		assert_eq!(definition.base_type, BaseType::Document);
		assert_eq!(amounts.cardinality, Cardinality::Multiple);
		assert_eq!(amounts.updatability, Updatability::ReadWrite);
		assert!(amounts.orderable);
	}

	#[test]
	fn referenced_types_come_from_succinct_objects_only() {
		let payload = bytes(json!({
			"objects": [
				{ "object": { "succinctProperties": { "cmis:objectTypeId": "acme:invoice", "cmis:secondaryObjectTypeIds": ["acme:audited"] } } },
				{ "object": { "properties": { "cmis:objectTypeId": { "value": "cmis:folder" } } } }
			]
		}));
		let ids = BrowserCodec.referenced_type_ids(&payload).expect("Payload should scan.");

		assert_eq!(ids.into_iter().collect::<Vec<_>>(), ["acme:audited", "acme:invoice"]);
	}

	#[test]
	fn empty_delete_tree_body_means_nothing_failed() {
		let base = url("https://ecm.example.com/cmis/browser/A1/root");
		let cx = ParseContext::new(&base, &NoTypes);

		assert!(BrowserCodec.parse_failed_to_delete(b"", cx).expect("Empty body should parse.").is_empty());
		assert_eq!(
			BrowserCodec.parse_failed_to_delete(br#"{"ids":["x"]}"#, cx).expect("Ids should parse.").ids,
			["x"]
		);
	}

	#[test]
	fn list_entry_type_errors_keep_their_path() {
		let base = url("https://ecm.example.com/cmis/browser/A1/root");
		let cx = ParseContext::new(&base, &NoTypes);
		let children = bytes(json!({
			"objects": [
				{ "object": { "succinctProperties": { "cmis:objectId": "doc-1" }, "exactACL": "yes" }, "pathSegment": "a.txt" }
			]
		}));
		let err = BrowserCodec.parse_object_list(&children, cx).expect_err("Mistyped flag should fail.");

		assert_eq!(err.path.as_deref(), Some("objects[0].object.exactACL"));
		assert!(!err.reason.contains("cmis:objectId"));

		let bare = bytes(json!({ "objects": [{ "succinctProperties": { "cmis:objectId": "doc-1" }, "exactACL": 1 }] }));
		let err = BrowserCodec.parse_object_list(&bare, cx).expect_err("Mistyped flag should fail.");

		assert_eq!(err.path.as_deref(), Some("objects[0].exactACL"));
	}

	#[test]
	fn unparsable_body_is_a_parse_error() {
		let base = url("https://ecm.example.com/cmis/browser/A1/root");

		assert!(BrowserCodec.parse_object_data(b"<html>", ParseContext::new(&base, &NoTypes)).is_err());
	}
}
