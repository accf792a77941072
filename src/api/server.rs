//! HTTP server implementation

use std::sync::Arc;

use axum::Router;
use dashmap::DashMap;
use tower_http::compression::CompressionLayer;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::handlers::AppState;
use crate::api::routes;
use crate::chat::ChatService;
use crate::config::AppConfig;
use crate::database::Database;
use crate::embeddings::EmbeddingService;
use crate::faq::FaqIndex;
use crate::llm::LlmService;
use crate::pipeline::ProductSearchPipeline;
use crate::router::Router as QueryRouter;
use crate::tools::ProductRetrievalTool;
use crate::tools::VisionDescriptor;
use crate::Result;

/// Start the API server
pub async fn serve_api(config: &AppConfig, host: String, port: u16, enable_cors: bool) -> Result<()> {
    info!("Starting StyleRAG API server...");

    // Initialize service handles once; every request shares them
    let database = Arc::new(Database::from_config(config).await?);
    database.init_schema(config).await?;

    let embedding_service = Arc::new(EmbeddingService::new(config)?);
    let llm_service = Arc::new(LlmService::new(config)?);
    let faq_index = Arc::new(FaqIndex::from_file(config.faq_corpus_path())?);

    let retrieval_tool = Arc::new(ProductRetrievalTool::new(
        database.clone(),
        embedding_service.clone(),
    ));
    let vision = VisionDescriptor::new(config)?;

    let router = QueryRouter::new(faq_index, Some(llm_service.clone()), &config.faq);
    let pipeline = ProductSearchPipeline::from_services(
        ProductRetrievalTool::new(database.clone(), embedding_service.clone()),
        vision,
        Some(llm_service),
    );
    let chat_service = Arc::new(ChatService::new(router, pipeline, config.search.chat_top_k));

    let state = AppState {
        chat_service,
        retrieval_tool,
        sessions: Arc::new(DashMap::new()),
    };

    let api_router = routes::api_routes(state);

    let mut app = Router::new()
        .nest("/api", api_router)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new());

    if enable_cors {
        info!("CORS enabled");
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    let addr = format!("{host}:{port}");
    info!("Listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
