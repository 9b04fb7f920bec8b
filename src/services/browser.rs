//! Browser-binding request construction.
//!
//! Reads are `GET`s against the repository or root-folder URL selected by `cmisselector`;
//! mutations are form posts selected by `cmisaction`. Responses use succinct properties, so any
//! type a payload references is loaded into the session type cache before the payload is parsed.

// crates.io
use url::form_urlencoded::Serializer;
// self
use crate::{
	_prelude::*,
	auth::oauth::random_string,
	http::{HttpRequest, HttpResponse},
	model::{
		Ace, Acl, AclPropagation, BaseType, ChangeEvents, FailedToDelete, ObjectData, ObjectList,
		Properties, QueryResults, Rendition, RepositoryInfo, TypeDefinition,
	},
	obs::debug_event,
	services::{
		BindingContext, ContentStream, DeleteTreeOptions, OperationContext, flag, params, repository,
		with_query,
	},
};

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded; charset=utf-8";
const BOUNDARY_LEN: usize = 32;

type Fields = Vec<(String, String)>;

pub(crate) async fn repository_infos(cx: &BindingContext) -> Result<IndexMap<String, RepositoryInfo>> {
	let response = cx.send(HttpRequest::get(cx.session().parameters().url.clone())).await?;

	Ok(cx.session().codec().parse_repository_infos(&response.body, cx.parse_context(&response.url))?)
}

pub(crate) async fn fetch_type_definition(cx: &BindingContext, type_id: &str) -> Result<TypeDefinition> {
	let url = with_query(cx.repository_url()?, &[(params::SELECTOR, "typeDefinition"), (params::TYPE_ID, type_id)]);
	let response = cx.send(HttpRequest::get(url)).await?;

	Ok(cx.session().codec().parse_type_definition(&response.body, cx.parse_context(&response.url))?)
}

pub(crate) async fn get_object(
	cx: &BindingContext,
	object_id: &str,
	operation: &OperationContext,
) -> Result<ObjectData> {
	let mut pairs = selector_params(Some(object_id), "object");

	pairs.extend(operation.object_params());

	let response = cx.send(HttpRequest::get(with_query(cx.root_folder_url()?, &pairs))).await?;

	parse_object(cx, &response).await
}

pub(crate) async fn get_object_by_path(
	cx: &BindingContext,
	path: &str,
	operation: &OperationContext,
) -> Result<ObjectData> {
	let mut url = cx.root_folder_url()?;

	url.path_segments_mut()
		.map_err(|_| Error::invalid_argument("root folder URL cannot address paths"))?
		.pop_if_empty()
		.extend(path.split('/').filter(|segment| !segment.is_empty()));

	let mut pairs = selector_params(None, "object");

	pairs.extend(operation.object_params());

	let response = cx.send(HttpRequest::get(with_query(url, &pairs))).await?;

	parse_object(cx, &response).await
}

pub(crate) async fn create_folder(cx: &BindingContext, parent_id: &str, properties: &Properties) -> Result<ObjectData> {
	let fields = action_fields("createFolder", property_fields(properties));
	let response = cx.send(form_request(object_url(cx, parent_id)?, fields)).await?;

	parse_object(cx, &response).await
}

pub(crate) async fn create_document(
	cx: &BindingContext,
	parent_id: &str,
	properties: &Properties,
	content: Option<ContentStream>,
) -> Result<ObjectData> {
	let fields = action_fields("createDocument", property_fields(properties));
	let url = object_url(cx, parent_id)?;
	let request = match content {
		Some(content) => multipart_request(url, fields, content),
		None => form_request(url, fields),
	};
	let response = cx.send(request).await?;

	parse_object(cx, &response).await
}

pub(crate) async fn update_properties(
	cx: &BindingContext,
	object_id: &str,
	properties: &Properties,
	change_token: Option<&str>,
) -> Result<ObjectData> {
	let mut fields = property_fields(properties);

	if let Some(token) = change_token {
		fields.push((params::CHANGE_TOKEN.into(), token.into()));
	}

	let response = cx.send(form_request(object_url(cx, object_id)?, action_fields("update", fields))).await?;

	parse_object(cx, &response).await
}

pub(crate) async fn delete_object(cx: &BindingContext, object_id: &str, all_versions: bool) -> Result<()> {
	let fields = action_fields("delete", vec![(params::ALL_VERSIONS.into(), flag(all_versions))]);

	cx.send(form_request(object_url(cx, object_id)?, fields)).await?;

	Ok(())
}

pub(crate) async fn delete_tree(
	cx: &BindingContext,
	folder_id: &str,
	options: DeleteTreeOptions,
) -> Result<FailedToDelete> {
	let fields = action_fields("deleteTree", vec![
		(params::ALL_VERSIONS.into(), flag(options.all_versions)),
		(params::UNFILE_OBJECTS.into(), options.unfile.as_str().into()),
		(params::CONTINUE_ON_FAILURE.into(), flag(options.continue_on_failure)),
	]);
	let response = cx.send(form_request(object_url(cx, folder_id)?, fields)).await?;

	Ok(cx.session().codec().parse_failed_to_delete(&response.body, cx.parse_context(&response.url))?)
}

pub(crate) async fn get_renditions(cx: &BindingContext, object_id: &str, filter: &str) -> Result<Vec<Rendition>> {
	let mut pairs = selector_params(Some(object_id), "renditions");

	pairs.push((params::RENDITION_FILTER, filter.to_owned()));

	let response = cx.send(HttpRequest::get(with_query(cx.root_folder_url()?, &pairs))).await?;

	Ok(cx.session().codec().parse_renditions(&response.body, cx.parse_context(&response.url))?)
}

pub(crate) async fn get_children(
	cx: &BindingContext,
	folder_id: &str,
	operation: &OperationContext,
) -> Result<ObjectList> {
	let mut pairs = selector_params(Some(folder_id), "children");

	pairs.extend(operation.listing_params());

	let response = cx.send(HttpRequest::get(with_query(cx.root_folder_url()?, &pairs))).await?;

	prefetch_types(cx, &response.body).await?;

	let mut list = cx.session().codec().parse_object_list(&response.body, cx.parse_context(&response.url))?;

	for object in &mut list.objects {
		attach_content_url(cx, object)?;
	}

	Ok(list)
}

pub(crate) async fn retrieve_acl(cx: &BindingContext, object_id: &str, only_basic_permissions: bool) -> Result<Acl> {
	let pairs = [
		(params::OBJECT_ID, object_id.to_owned()),
		(params::SELECTOR, "acl".to_owned()),
		(params::ONLY_BASIC_PERMISSIONS, flag(only_basic_permissions)),
	];
	let response = cx.send(HttpRequest::get(with_query(cx.root_folder_url()?, &pairs))).await?;

	Ok(cx.session().codec().parse_acl(&response.body, cx.parse_context(&response.url))?)
}

pub(crate) async fn apply_acl(
	cx: &BindingContext,
	object_id: &str,
	add: &[Ace],
	remove: &[Ace],
	propagation: AclPropagation,
) -> Result<Acl> {
	let mut fields = ace_fields("addACE", add);

	fields.extend(ace_fields("removeACE", remove));
	fields.push((params::ACL_PROPAGATION.into(), propagation.as_str().into()));

	let response = cx.send(form_request(object_url(cx, object_id)?, action_fields("applyACL", fields))).await?;

	Ok(cx.session().codec().parse_acl(&response.body, cx.parse_context(&response.url))?)
}

/// The browser binding has no replace operation; the change is applied as the difference
/// between the current direct entries and `aces`.
pub(crate) async fn set_acl(cx: &BindingContext, object_id: &str, aces: &[Ace]) -> Result<Acl> {
	let current = retrieve_acl(cx, object_id, false).await?;
	let direct = current.direct_aces().cloned().collect::<Vec<_>>();
	let add = ace_difference(aces, &direct);
	let remove = ace_difference(&direct, aces);

	if add.is_empty() && remove.is_empty() {
		return Ok(current);
	}

	apply_acl(cx, object_id, &add, &remove, AclPropagation::ObjectOnly).await
}

pub(crate) async fn get_content_changes(
	cx: &BindingContext,
	change_log_token: Option<&str>,
	include_properties: bool,
	max_items: Option<u32>,
) -> Result<ChangeEvents> {
	let mut pairs = vec![(params::SELECTOR, "contentChanges".to_owned())];

	if let Some(token) = change_log_token {
		pairs.push((params::CHANGE_LOG_TOKEN, token.to_owned()));
	}

	pairs.push((params::INCLUDE_PROPERTIES, flag(include_properties)));

	if let Some(max_items) = max_items {
		pairs.push((params::MAX_ITEMS, max_items.to_string()));
	}

	pairs.push((params::SUCCINCT, flag(true)));

	let response = cx.send(HttpRequest::get(with_query(cx.repository_url()?, &pairs))).await?;

	prefetch_types(cx, &response.body).await?;

	Ok(cx.session().codec().parse_change_events(&response.body, cx.parse_context(&response.url))?)
}

pub(crate) async fn query(
	cx: &BindingContext,
	statement: &str,
	search_all_versions: bool,
	operation: &OperationContext,
) -> Result<QueryResults> {
	let mut fields = vec![
		("q".to_owned(), statement.to_owned()),
		(params::SEARCH_ALL_VERSIONS.into(), flag(search_all_versions)),
		(params::INCLUDE_ALLOWABLE_ACTIONS.into(), flag(operation.include_allowable_actions)),
		(params::INCLUDE_RELATIONSHIPS.into(), operation.include_relationships.as_str().into()),
	];

	if let Some(filter) = &operation.rendition_filter {
		fields.push((params::RENDITION_FILTER.into(), filter.clone()));
	}

	fields.extend(operation.paging_params().into_iter().map(|(name, value)| (name.to_owned(), value)));

	let response = cx.send(form_request(cx.repository_url()?, action_fields("query", fields))).await?;

	prefetch_types(cx, &response.body).await?;

	Ok(cx.session().codec().parse_query_results(&response.body, cx.parse_context(&response.url))?)
}

async fn parse_object(cx: &BindingContext, response: &HttpResponse) -> Result<ObjectData> {
	prefetch_types(cx, &response.body).await?;

	let mut object = cx.session().codec().parse_object_data(&response.body, cx.parse_context(&response.url))?;

	attach_content_url(cx, &mut object)?;

	Ok(object)
}

/// Loads definitions for every type the payload references that the cache lacks.
///
/// A definition that cannot be fetched is skipped; its properties fall back to inference.
async fn prefetch_types(cx: &BindingContext, payload: &[u8]) -> Result<()> {
	for type_id in cx.session().codec().referenced_type_ids(payload)? {
		if cx.session().type_cache().contains(&type_id) {
			continue;
		}
		if let Err(e) = repository::type_definition(cx, &type_id).await {
			if e.is_cancelled() {
				return Err(e);
			}

			debug_event!(type_id = %type_id, error = %e, "type definition unavailable; inferring property types");
		}
	}

	Ok(())
}

fn attach_content_url(cx: &BindingContext, object: &mut ObjectData) -> Result<()> {
	if object.content_url.is_some() || object.base_type != Some(BaseType::Document) {
		return Ok(());
	}

	object.content_url = Some(with_query(cx.root_folder_url()?, &selector_params(Some(object.id.as_str()), "content")));

	Ok(())
}

fn selector_params(object_id: Option<&str>, selector: &str) -> Vec<(&'static str, String)> {
	let mut pairs = Vec::new();

	if let Some(id) = object_id {
		pairs.push((params::OBJECT_ID, id.to_owned()));
	}

	pairs.push((params::SELECTOR, selector.to_owned()));

	if selector != "content" {
		pairs.push((params::SUCCINCT, flag(true)));
	}

	pairs
}

fn object_url(cx: &BindingContext, object_id: &str) -> Result<Url> {
	Ok(with_query(cx.root_folder_url()?, &[(params::OBJECT_ID, object_id)]))
}

fn action_fields(action: &str, fields: Fields) -> Fields {
	let mut all = Vec::with_capacity(fields.len() + 2);

	all.push((params::ACTION.to_owned(), action.to_owned()));
	all.extend(fields);
	all.push((params::SUCCINCT.to_owned(), flag(true)));

	all
}

fn property_fields(properties: &Properties) -> Fields {
	let mut fields = Vec::new();

	for (index, property) in properties.iter().enumerate() {
		fields.push((format!("propertyId[{index}]"), property.id.clone()));

		if property.value.is_multiple() {
			for (position, value) in property.value.values().iter().enumerate() {
				fields.push((format!("propertyValue[{index}][{position}]"), value.form_text()));
			}
		} else if let Some(value) = property.value.first() {
			fields.push((format!("propertyValue[{index}]"), value.form_text()));
		}
	}

	fields
}

fn ace_fields(prefix: &str, aces: &[Ace]) -> Fields {
	let mut fields = Vec::new();

	for (index, ace) in aces.iter().enumerate() {
		fields.push((format!("{prefix}Principal[{index}]"), ace.principal_id.clone()));

		for (position, permission) in ace.permissions.iter().enumerate() {
			fields.push((format!("{prefix}Permission[{index}][{position}]"), permission.clone()));
		}
	}

	fields
}

/// Permissions granted by `from` that `to` does not grant, per principal.
fn ace_difference(from: &[Ace], to: &[Ace]) -> Vec<Ace> {
	from.iter()
		.filter_map(|ace| {
			let kept = to
				.iter()
				.filter(|other| other.principal_id == ace.principal_id)
				.flat_map(|other| other.permissions.iter())
				.collect::<BTreeSet<_>>();
			let missing =
				ace.permissions.iter().filter(|permission| !kept.contains(permission)).cloned().collect::<Vec<_>>();

			(!missing.is_empty()).then(|| Ace::new(ace.principal_id.clone(), missing))
		})
		.collect()
}

fn form_request(url: Url, fields: Fields) -> HttpRequest {
	let mut form = Serializer::new(String::new());

	form.extend_pairs(fields.iter().map(|(name, value)| (name.as_str(), value.as_str())));

	HttpRequest::post(url, form.finish()).with_header("content-type", FORM_URLENCODED)
}

fn multipart_request(url: Url, fields: Fields, content: ContentStream) -> HttpRequest {
	let ContentStream { file_name, mime_type, body, progress } = content;
	let boundary = format!("cmis-binding-{}", random_string(BOUNDARY_LEN));
	let mut prefix = String::new();

	for (name, value) in &fields {
		prefix.push_str(&format!(
			"--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
		));
	}

	prefix.push_str(&format!(
		"--{boundary}\r\nContent-Disposition: form-data; name=\"content\"; filename=\"{}\"\r\nContent-Type: {mime_type}\r\n\r\n",
		file_name.replace('"', "%22")
	));

	let suffix = format!("\r\n--{boundary}--\r\n");

	HttpRequest::post(url, body.framed(prefix, suffix))
		.with_header("content-type", format!("multipart/form-data; boundary={boundary}"))
		.with_progress(progress)
}
