use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryLeadStore};
use crate::routes::{cors_layer, with_service_routes};
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use island_leads::config::AppConfig;
use island_leads::edge::EdgeExportService;
use island_leads::error::AppError;
use island_leads::leads::{
    EmailGateway, LeadService, LeadStore, NotificationFanout, ResendGateway, SheetGateway,
    SheetsClient, SupabaseLeadStore,
};
use island_leads::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    // The primary flow survives without Supabase credentials; the
    // store-backed edge export fails closed in that case.
    let (store, edge_store): (Arc<dyn LeadStore>, Option<Arc<dyn LeadStore>>) = match &config.store
    {
        Some(store_config) => {
            let store: Arc<dyn LeadStore> = Arc::new(SupabaseLeadStore::new(store_config)?);
            (store.clone(), Some(store))
        }
        None => {
            warn!("SUPABASE_URL not configured; keeping leads in memory");
            (Arc::new(InMemoryLeadStore::default()), None)
        }
    };

    let email: Option<Arc<dyn EmailGateway>> = config
        .email
        .clone()
        .map(|email_config| Arc::new(ResendGateway::new(email_config)) as Arc<dyn EmailGateway>);
    let sheets: Option<Arc<dyn SheetGateway>> = config
        .sheets
        .clone()
        .map(|sheets_config| Arc::new(SheetsClient::new(sheets_config)) as Arc<dyn SheetGateway>);

    let leads = Arc::new(LeadService::new(
        store,
        NotificationFanout::new(email, sheets.clone()),
        config.export.admin_token.clone(),
    ));
    let edge = Arc::new(EdgeExportService::new(
        config.export.download_token.clone(),
        edge_store,
        sheets,
    ));

    let app = with_service_routes(leads, edge)
        .layer(Extension(app_state))
        .layer(cors_layer())
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "lead capture backend ready");

    axum::serve(listener, app).await?;
    Ok(())
}
