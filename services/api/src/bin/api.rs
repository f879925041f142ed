//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        chat_llm::OpenAiChatAdapter, db::DbAdapter, report_llm::OpenAiEvaluationAdapter,
        resume::PdfResumeParser,
    },
    config::Config,
    error::ApiError,
    web::{
        end_interview_handler, get_report_handler, init_interview_handler,
        list_interviews_handler, rest::ApiDoc, save_interview_handler, send_message_handler,
        session_status_handler, state::AppState,
    },
};
use async_openai::{config::OpenAIConfig, Client};
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::{get, post},
    Router,
};
use interview_core::{orchestrator::InterviewOrchestrator, registry::SessionRegistry};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool.clone()));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    let openai_config = OpenAIConfig::new().with_api_key(
        config
            .openai_api_key
            .as_ref()
            .ok_or_else(|| ApiError::Internal("OPENAI_API_KEY is required".to_string()))?,
    );
    let openai_client = Client::with_config(openai_config);

    let chat_adapter = Arc::new(OpenAiChatAdapter::new(
        openai_client.clone(),
        config.chat_model.clone(),
    ));
    let evaluation_adapter = Arc::new(OpenAiEvaluationAdapter::new(
        openai_client.clone(),
        config.report_model.clone(),
    ));
    let resume_parser = Arc::new(PdfResumeParser::new());

    // --- 4. Build the Core and the Shared AppState ---
    let registry = Arc::new(SessionRegistry::new());
    let orchestrator = Arc::new(InterviewOrchestrator::new(
        registry.clone(),
        chat_adapter,
        evaluation_adapter,
    ));

    let app_state = Arc::new(AppState {
        registry,
        orchestrator,
        resume_parser,
        archive: db_adapter,
        config: config.clone(),
    });

    let cors = CorsLayer::new()
        .allow_origin(
            config
                .cors_origin
                .parse::<HeaderValue>()
                .map_err(|e| ApiError::Internal(format!("Invalid CORS_ORIGIN: {}", e)))?,
        )
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    let api_router = Router::new()
        .route("/api/interview/init", post(init_interview_handler))
        .route("/api/interview/message", post(send_message_handler))
        .route("/api/interview/end", post(end_interview_handler))
        .route("/api/interview/report/{session_id}", get(get_report_handler))
        .route("/api/interview/status", get(session_status_handler))
        .route(
            "/api/interviews",
            post(save_interview_handler).get(list_interviews_handler),
        )
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
