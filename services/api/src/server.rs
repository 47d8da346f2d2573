use crate::cli::ServeArgs;
use crate::infra::{load_catalog, submission_store, AppState};
use crate::routes::with_assessment_routes;
use ai_readiness::assessment::{AdminView, AssessmentPipeline, AssessmentService, PipelineSettings};
use ai_readiness::config::AppConfig;
use ai_readiness::error::AppError;
use ai_readiness::integrations::build_collaborators;
use ai_readiness::telemetry;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
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

    let catalog = load_catalog(config.assessment.catalog_path.as_deref())?;
    let store = submission_store(&config.assessment);
    let collaborators = build_collaborators(&config.integrations, store);
    let settings = PipelineSettings {
        fee_minor_units: config.assessment.fee_minor_units,
        currency: config.assessment.currency.clone(),
        ..PipelineSettings::default()
    };
    let pipeline = AssessmentPipeline::new(Arc::new(catalog), collaborators, settings);

    if config.assessment.admin_emails.is_empty() {
        warn!("APP_ADMIN_EMAILS is empty; the admin listing will refuse every request");
    }
    let admin = AdminView::new(&config.assessment.admin_emails);
    let service = Arc::new(
        AssessmentService::new(pipeline, admin)
            .with_session_retention(config.assessment.session_retention()),
    );

    let app = with_assessment_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        integrations = ?config.integrations,
        "ai readiness assessment service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
