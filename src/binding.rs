//! Connection setup and service access for one repository.

// self
use crate::{
	_prelude::*,
	auth::AuthenticationProvider,
	config::SessionParameters,
	error::ConfigError,
	http::{HttpRequestEngine, RequestHandle},
	model::RepositoryInfo,
	obs::{OperationKind, debug_event},
	services::{
		AclService, BindingContext, DiscoveryService, NavigationService, ObjectService, RepositoryService,
		repository,
	},
	session::BindingSession,
};

/// A connected binding: a session bound to one repository plus its services.
#[derive(Clone, Debug)]
pub struct CmisBinding {
	context: BindingContext,
}
impl CmisBinding {
	/// Connects to the endpoint in `parameters` and selects a repository.
	///
	/// The configured repository id is required to be offered by the endpoint; without one the
	/// first repository the endpoint describes is selected.
	pub async fn connect(
		parameters: SessionParameters,
		provider: Arc<dyn AuthenticationProvider>,
	) -> Result<Self> {
		let engine = HttpRequestEngine::new(&parameters.transport)?;
		let session = Arc::new(BindingSession::new(parameters, Arc::clone(&provider)));
		let context = BindingContext::new(Arc::clone(&session), engine);
		let info = select_repository(&context).await?;

		debug_event!(repository_id = %info.id, binding = %session.binding(), "repository selected");
		session.install_repository(info);
		provider.bind_session(&session);

		Ok(Self { context })
	}

	/// Shared session.
	pub fn session(&self) -> &Arc<BindingSession> {
		self.context.session()
	}

	/// Session plus engine, for building services directly.
	pub fn context(&self) -> &BindingContext {
		&self.context
	}

	/// Repository service.
	pub fn repository_service(&self) -> RepositoryService {
		RepositoryService::new(self.context.clone())
	}

	/// Object service.
	pub fn object_service(&self) -> ObjectService {
		ObjectService::new(self.context.clone())
	}

	/// Navigation service.
	pub fn navigation_service(&self) -> NavigationService {
		NavigationService::new(self.context.clone())
	}

	/// ACL service.
	pub fn acl_service(&self) -> AclService {
		AclService::new(self.context.clone())
	}

	/// Discovery service.
	pub fn discovery_service(&self) -> DiscoveryService {
		DiscoveryService::new(self.context.clone())
	}

	/// Re-reads the selected repository's description and reinstalls its endpoints.
	pub fn refresh_repository_info(&self) -> RequestHandle<Arc<RepositoryInfo>> {
		let cx = self.context.clone();

		self.context.spawn(OperationKind::Repository, "refresh_repository_info", async move {
			let info = select_repository(&cx).await?;

			cx.session().install_repository(info);
			cx.session()
				.repository_info()
				.ok_or_else(|| ConfigError::MissingSessionEndpoint { endpoint: "repository info".into() }.into())
		})
	}

	/// Forgets every cached link; the next link-based call rediscovers them.
	pub fn logout(&self) {
		self.context.session().link_cache().clear();
	}
}

async fn select_repository(cx: &BindingContext) -> Result<RepositoryInfo> {
	let mut infos = repository::repository_infos(cx).await?;
	let wanted = cx.session().parameters().repository_id.clone().or_else(|| cx.session().repository_id());

	match wanted {
		Some(id) => infos.shift_remove(&id).ok_or_else(|| ConfigError::UnknownRepository { id }.into()),
		None => infos.shift_remove_index(0).map(|(_, info)| info).ok_or_else(|| ConfigError::NoRepositories.into()),
	}
}
