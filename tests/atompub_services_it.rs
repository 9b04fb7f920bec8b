// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use url::Url;
// self
use cmis_binding::{
	auth::NoAuthentication,
	binding::CmisBinding,
	config::SessionParameters,
	error::Error,
	links::{media, rel},
	model::{BaseType, Properties, PropertyData, property_ids},
	services::OperationContext,
	session::BindingKind,
};

const NAMESPACES: &str = r#"xmlns:app="http://www.w3.org/2007/app" xmlns:atom="http://www.w3.org/2005/Atom" xmlns:cmis="http://docs.oasis-open.org/ns/cmis/core/200908/" xmlns:cmisra="http://docs.oasis-open.org/ns/cmis/restatom/200908/""#;

fn service_document(server: &MockServer) -> String {
	let base = server.url("/atom/A1");

	format!(
		r#"<?xml version="1.0" encoding="UTF-8"?>
<app:service {NAMESPACES}>
	<app:workspace>
		<cmisra:repositoryInfo>
			<cmis:repositoryId>A1</cmis:repositoryId>
			<cmis:repositoryName>Main</cmis:repositoryName>
			<cmis:rootFolderId>root-1</cmis:rootFolderId>
			<cmis:latestChangeLogToken>17</cmis:latestChangeLogToken>
		</cmisra:repositoryInfo>
		<app:collection href="{base}/query">
			<cmisra:collectionType>query</cmisra:collectionType>
		</app:collection>
		<atom:link rel="http://docs.oasis-open.org/ns/cmis/link/200908/changes" href="{base}/changes" type="application/atom+xml;type=feed"/>
		<cmisra:uritemplate>
			<cmisra:template>{base}/id?id={{id}}&amp;filter={{filter}}&amp;includeACL={{includeACL}}</cmisra:template>
			<cmisra:type>objectbyid</cmisra:type>
			<cmisra:mediatype>application/atom+xml;type=entry</cmisra:mediatype>
		</cmisra:uritemplate>
	</app:workspace>
</app:service>"#
	)
}

fn entry_body(server: &MockServer, id: &str, base_type: &str, name: &str) -> String {
	let base = server.url("/atom/A1");
	let down = if base_type == "cmis:folder" {
		format!(r#"<atom:link rel="down" href="{base}/children?id={id}" type="application/atom+xml;type=feed"/>"#)
	} else {
		String::new()
	};

	format!(
		r#"<atom:entry>
	<atom:link rel="self" href="{base}/entry?id={id}" type="application/atom+xml;type=entry"/>
	{down}
	<cmisra:object>
		<cmis:properties>
			<cmis:propertyId propertyDefinitionId="cmis:objectId"><cmis:value>{id}</cmis:value></cmis:propertyId>
			<cmis:propertyId propertyDefinitionId="cmis:baseTypeId"><cmis:value>{base_type}</cmis:value></cmis:propertyId>
			<cmis:propertyString propertyDefinitionId="cmis:name"><cmis:value>{name}</cmis:value></cmis:propertyString>
		</cmis:properties>
	</cmisra:object>
</atom:entry>"#
	)
}

fn entry_document(server: &MockServer, id: &str, base_type: &str, name: &str) -> String {
	entry_body(server, id, base_type, name).replacen("<atom:entry>", &format!("<atom:entry {NAMESPACES}>"), 1)
}

fn feed_document(entries: &[String], next: Option<&str>) -> String {
	let next = next.map(|href| format!(r#"<atom:link rel="next" href="{href}"/>"#)).unwrap_or_default();

	format!("<atom:feed {NAMESPACES}>{next}<cmisra:numItems>{}</cmisra:numItems>{}</atom:feed>", entries.len(), entries.concat())
}

async fn connected(server: &MockServer) -> CmisBinding {
	let document = service_document(server);

	server
		.mock_async(move |when, then| {
			when.method(GET).path("/atom");
			then.status(200).header("content-type", "application/atomsvc+xml").body(document.clone());
		})
		.await;

	let endpoint = Url::parse(&server.url("/atom")).expect("Mock endpoint should parse.");
	let parameters =
		SessionParameters::builder(BindingKind::AtomPub, endpoint).build().expect("Session parameters should build.");

	CmisBinding::connect(parameters, Arc::new(NoAuthentication)).await.expect("Connection should succeed.")
}

#[tokio::test]
async fn service_document_installs_endpoints() {
	let server = MockServer::start_async().await;
	let binding = connected(&server).await;
	let session = binding.session();

	assert_eq!(session.repository_id().as_deref(), Some("A1"));
	assert_eq!(session.collection("query"), Url::parse(&server.url("/atom/A1/query")).ok());
	assert!(session.uri_template("objectbyid").is_some_and(|template| template.contains("{id}")));
	assert_eq!(session.repository_link(rel::CHANGES, Some(media::ATOM_FEED)), Url::parse(&server.url("/atom/A1/changes")).ok());
	assert_eq!(session.repository_url(), None);
}

#[tokio::test]
async fn links_are_discovered_once_and_reused() {
	let server = MockServer::start_async().await;
	let binding = connected(&server).await;
	let root_entry = entry_document(&server, "root-1", "cmis:folder", "");
	let root_lookup = server
		.mock_async(move |when, then| {
			when.method(GET).path("/atom/A1/id").query_param("id", "root-1").query_param("filter", "cmis:objectId");
			then.status(200).body(root_entry.clone());
		})
		.await;
	let children_feed = feed_document(
		&[entry_body(&server, "doc-1", "cmis:document", "a.txt"), entry_body(&server, "f-2", "cmis:folder", "Reports")],
		None,
	);
	let children = server
		.mock_async(move |when, then| {
			when.method(GET).path("/atom/A1/children").query_param("id", "root-1");
			then.status(200).body(children_feed.clone());
		})
		.await;
	let navigation = binding.navigation_service();
	let first = navigation
		.get_children("root-1", &OperationContext::default())
		.await
		.expect("Children should be listed.");

	assert_eq!(first.objects.len(), 2);
	assert_eq!(first.num_items, Some(2));
	assert!(!first.has_more_items);
	assert_eq!(first.objects[1].base_type, Some(BaseType::Folder));
	assert!(binding.session().link_cache().contains("root-1"));
	assert!(binding.session().link_cache().contains("doc-1"));

	navigation.get_children("root-1", &OperationContext::default()).await.expect("Cached listing should succeed.");

	root_lookup.assert_calls_async(1).await;
	children.assert_calls_async(2).await;

	binding.logout();

	assert!(binding.session().link_cache().is_empty());

	navigation.get_children("root-1", &OperationContext::default()).await.expect("Listing after logout should succeed.");

	root_lookup.assert_calls_async(2).await;
}

#[tokio::test]
async fn delete_uses_the_cached_self_link_and_forgets_it() {
	let server = MockServer::start_async().await;
	let binding = connected(&server).await;
	let entry = entry_document(&server, "doc-1", "cmis:document", "a.txt");

	server
		.mock_async(move |when, then| {
			when.method(GET).path("/atom/A1/id").query_param("id", "doc-1");
			then.status(200).body(entry.clone());
		})
		.await;

	let delete = server
		.mock_async(|when, then| {
			when.method(DELETE).path("/atom/A1/entry").query_param("id", "doc-1").query_param("allVersions", "true");
			then.status(204);
		})
		.await;
	let objects = binding.object_service();
	let object = objects.get_object("doc-1", &OperationContext::default()).await.expect("Object should load.");

	assert_eq!(object.name(), Some("a.txt"));
	assert!(binding.session().link_cache().contains("doc-1"));

	objects.delete_object("doc-1", true).await.expect("Delete should succeed.");

	delete.assert_async().await;
	assert!(!binding.session().link_cache().contains("doc-1"));
}

#[tokio::test]
async fn objects_without_the_needed_link_are_rejected() {
	let server = MockServer::start_async().await;
	let binding = connected(&server).await;
	let entry = entry_document(&server, "doc-1", "cmis:document", "a.txt");

	server
		.mock_async(move |when, then| {
			when.method(GET).path("/atom/A1/id").query_param("id", "doc-1");
			then.status(200).body(entry.clone());
		})
		.await;

	let err = binding
		.navigation_service()
		.get_children("doc-1", &OperationContext::default())
		.await
		.expect_err("Documents have no children link.");

	assert!(matches!(err, Error::InvalidArgument { .. }));
}

#[tokio::test]
async fn folders_are_created_through_the_children_feed() {
	let server = MockServer::start_async().await;
	let binding = connected(&server).await;
	let root_entry = entry_document(&server, "root-1", "cmis:folder", "");
	let created = entry_document(&server, "f-9", "cmis:folder", "Invoices");

	server
		.mock_async(move |when, then| {
			when.method(GET).path("/atom/A1/id").query_param("id", "root-1");
			then.status(200).body(root_entry.clone());
		})
		.await;

	let create = server
		.mock_async(move |when, then| {
			when.method(POST)
				.path("/atom/A1/children")
				.query_param("id", "root-1")
				.header("content-type", "application/atom+xml;type=entry")
				.body_includes("<atom:title>Invoices</atom:title>")
				.body_includes(r#"propertyDefinitionId="cmis:objectTypeId""#);
			then.status(201).body(created.clone());
		})
		.await;
	let properties = Properties::new()
		.with(PropertyData::single(property_ids::NAME, "Invoices"))
		.with(PropertyData::single(property_ids::OBJECT_TYPE_ID, "cmis:folder"));
	let folder = binding.object_service().create_folder("root-1", properties).await.expect("Folder should be created.");

	assert_eq!(folder.id, "f-9");
	assert!(binding.session().link_cache().contains("f-9"));
	create.assert_async().await;
}

#[tokio::test]
async fn change_feed_and_query_use_repository_endpoints() {
	let server = MockServer::start_async().await;
	let binding = connected(&server).await;
	let next = server.url("/atom/A1/changes?changeLogToken=18");
	let change_feed = feed_document(
		&[entry_body(&server, "doc-1", "cmis:document", "a.txt").replace(
			"</cmis:properties>",
			"</cmis:properties><cmis:changeEventInfo><cmis:changeType>created</cmis:changeType></cmis:changeEventInfo>",
		)],
		Some(next.as_str()),
	);

	server
		.mock_async(move |when, then| {
			when.method(GET).path("/atom/A1/changes").query_param("changeLogToken", "17");
			then.status(200).body(change_feed.clone());
		})
		.await;

	let results_feed = feed_document(&[entry_body(&server, "doc-1", "cmis:document", "a.txt")], None);
	let query = server
		.mock_async(move |when, then| {
			when.method(POST)
				.path("/atom/A1/query")
				.header("content-type", "application/cmisquery+xml")
				.body_includes("<cmis:statement>SELECT * FROM cmis:document WHERE cmis:name = &apos;a&lt;b&apos;</cmis:statement>");
			then.status(201).body(results_feed.clone());
		})
		.await;
	let discovery = binding.discovery_service();
	let changes = discovery
		.get_content_changes(Some("17".into()), false, None)
		.await
		.expect("Change feed should parse.");

	assert!(changes.has_more_items);
	assert_eq!(changes.latest_change_log_token.as_deref(), Some("18"));
	assert_eq!(changes.events[0].object_id, "doc-1");

	let results = discovery
		.query("SELECT * FROM cmis:document WHERE cmis:name = 'a<b'", false, &OperationContext::default())
		.await
		.expect("Query should succeed.");

	assert_eq!(results.results.len(), 1);
	assert_eq!(results.results[0].properties.text(property_ids::NAME), Some("a.txt"));
	query.assert_async().await;
}
