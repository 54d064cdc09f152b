use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryDraftRepository, InMemoryIdentity, InMemoryListingSubmitter};
use crate::routes::with_site_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Duration;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use togo_estates::auth::{IdentityConnector, ProfileStore, RemoteIdentityConnector, SessionRegistry};
use togo_estates::config::{AppConfig, CatalogConfig, IdentityConfig};
use togo_estates::error::AppError;
use togo_estates::listings::ListingCatalog;
use togo_estates::telemetry;
use togo_estates::wizard::ListingWizardService;
use tracing::{info, warn};

pub(crate) fn load_catalog(config: &CatalogConfig) -> Result<ListingCatalog, AppError> {
    match &config.listings_csv {
        Some(path) => {
            let catalog = ListingCatalog::from_path(path)?;
            info!(path = %path.display(), listings = catalog.len(), "listing catalog loaded from CSV");
            Ok(catalog)
        }
        None => Ok(ListingCatalog::seeded()),
    }
}

pub(crate) fn identity_backend(
    identity: Option<&IdentityConfig>,
) -> Result<(Arc<dyn IdentityConnector>, Arc<dyn ProfileStore>), AppError> {
    match identity {
        Some(config) => {
            let connector = RemoteIdentityConnector::new(config)?;
            let profiles = connector.profile_store();
            info!(base_url = %config.base_url, "using hosted identity backend");
            Ok((Arc::new(connector), Arc::new(profiles)))
        }
        None => {
            warn!("IDENTITY_URL not set; accounts are kept in memory");
            let identity = InMemoryIdentity::default();
            let profiles = identity.profile_store();
            Ok((Arc::new(identity), Arc::new(profiles)))
        }
    }
}

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry, config.environment)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let catalog = Arc::new(load_catalog(&config.catalog)?);
    let (connector, profiles) = identity_backend(config.identity.as_ref())?;
    let sessions = Arc::new(
        SessionRegistry::new(connector, profiles)
            .with_ttl(Duration::seconds(i64::from(config.session.ttl_secs))),
    );
    let wizard = Arc::new(ListingWizardService::new(
        Arc::new(InMemoryDraftRepository::default()),
        Arc::new(InMemoryListingSubmitter::default()),
    ));

    let app = with_site_routes(catalog.clone(), sessions, wizard)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, listings = catalog.len(), "togo estates service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
