use std::sync::Arc;

use clap::Parser;
use clap::Subcommand;
use stylerag::chat::ChatService;
use stylerag::config::AppConfig;
use stylerag::database::Database;
use stylerag::embeddings::EmbeddingService;
use stylerag::faq::FaqIndex;
use stylerag::ingest::ingest_catalog;
use stylerag::llm::LlmService;
use stylerag::models::UserQuery;
use stylerag::pipeline::ProductSearchPipeline;
use stylerag::router::Router;
use stylerag::tools::ProductRetrievalTool;
use stylerag::tools::VisionDescriptor;
use stylerag::Result;
use tracing::info;

#[derive(Parser)]
#[command(name = "stylerag")]
#[command(about = "StyleRAG CLI for the fashion shopping assistant")]
#[command(version)]
struct Cli {
    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Bind address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Bind port
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Enable permissive CORS headers
        #[arg(long)]
        cors: bool,
    },
    /// Ingest a product catalog into the vector index
    Ingest {
        /// Path to the JSON-Lines catalog file
        catalog: String,
        /// Maximum number of items to ingest
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Ask the assistant one question from the command line
    Ask {
        /// The question or product request
        question: String,
        /// Path to an image file to attach
        #[arg(short, long)]
        image: Option<String>,
        /// Number of products to retrieve
        #[arg(short, long, default_value = "5")]
        top_k: usize,
    },
    /// Search the FAQ corpus directly
    Faq {
        /// Query string
        query: String,
        /// Number of passages to show
        #[arg(short, long, default_value = "3")]
        top_k: usize,
    },
    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        stylerag::logging::init_logging_with_level("debug")?;
    } else {
        stylerag::logging::init_logging()?;
    }

    // Load configuration
    let config = AppConfig::load()?;
    info!("Configuration loaded successfully");

    match cli.command {
        Commands::Serve { host, port, cors } => {
            stylerag::api::serve_api(&config, host, port, cors).await?;
        }
        Commands::Ingest { catalog, limit } => {
            handle_ingest_command(&config, &catalog, limit).await?;
        }
        Commands::Ask {
            question,
            image,
            top_k,
        } => {
            handle_ask_command(&config, question, image, top_k).await?;
        }
        Commands::Faq { query, top_k } => {
            handle_faq_command(&config, &query, top_k)?;
        }
        Commands::Config => {
            handle_config_command(&config);
        }
    }

    Ok(())
}

async fn handle_ingest_command(
    config: &AppConfig,
    catalog: &str,
    limit: Option<usize>,
) -> Result<()> {
    let db = Arc::new(Database::from_config(config).await?);
    db.init_schema(config).await?;

    let embedding_service = Arc::new(EmbeddingService::new(config)?);
    let stats = ingest_catalog(db.clone(), embedding_service, catalog, limit).await?;

    println!("Ingestion finished:");
    println!("  Rows read: {}", stats.total_rows);
    println!("  Ingested:  {}", stats.ingested);
    println!("  Skipped:   {}", stats.skipped);
    println!("  Failed:    {}", stats.failed);
    println!("  Index now holds {} products", db.count_products().await?);

    Ok(())
}

async fn handle_ask_command(
    config: &AppConfig,
    question: String,
    image: Option<String>,
    top_k: usize,
) -> Result<()> {
    let database = Arc::new(Database::from_config(config).await?);
    let embedding_service = Arc::new(EmbeddingService::new(config)?);
    let llm_service = Arc::new(LlmService::new(config)?);
    let faq_index = Arc::new(FaqIndex::from_file(config.faq_corpus_path())?);

    let router = Router::new(faq_index, Some(llm_service.clone()), &config.faq);
    let pipeline = ProductSearchPipeline::from_services(
        ProductRetrievalTool::new(database, embedding_service),
        VisionDescriptor::new(config)?,
        Some(llm_service),
    );
    let chat = ChatService::new(router, pipeline, top_k);

    let query = match image {
        Some(path) => UserQuery::with_image(question, std::fs::read(path)?),
        None => UserQuery::text(question),
    };

    let response = chat.handle(&query).await;

    println!("[{}] {}", response.source, response.message);
    for (idx, product) in response.products.iter().enumerate() {
        println!(
            "  {}. {} (id {}){}",
            idx + 1,
            product.product_name,
            product.product_id,
            if product.link.is_empty() {
                String::new()
            } else {
                format!(" - {}", product.link)
            }
        );
    }

    Ok(())
}

fn handle_faq_command(config: &AppConfig, query: &str, top_k: usize) -> Result<()> {
    let faq_index = FaqIndex::from_file(config.faq_corpus_path())?;
    let hits = faq_index.search(query, top_k);

    if hits.is_empty() {
        println!("No matching passages.");
        return Ok(());
    }

    println!("Found {} passage(s):", hits.len());
    for (idx, hit) in hits.iter().enumerate() {
        println!();
        println!("  {}. [{}] (score {:.2})", idx + 1, hit.section, hit.score);
        println!("     {}", hit.text);
    }

    Ok(())
}

fn handle_config_command(config: &AppConfig) {
    println!("StyleRAG Configuration:");
    println!();

    println!("Database:");
    println!("  URL: {}", mask_database_url(config.database_url()));
    println!("  Max connections: {}", config.max_connections());
    println!("  Min connections: {}", config.min_connections());
    println!("  Connection timeout: {}s", config.connection_timeout());
    println!();

    println!("Logging:");
    println!("  Level: {}", config.logging.level);
    println!("  Backtrace: {}", config.logging.backtrace);
    println!();

    println!("Embeddings:");
    println!("  Dimension: {}", config.embedding_dimension());
    println!("  Model: {}", config.embedding_model());
    println!("  Endpoint: {}", config.embeddings.endpoint);
    println!();

    println!("Performance:");
    println!("  Vector indexes: {}", config.vector_indexes_enabled());
    println!("  Vector index lists: {}", config.vector_index_lists());
    println!();

    println!("LLM:");
    println!("  Endpoint: {}", config.llm_endpoint());
    println!("  Model: {}", config.llm_model());
    println!();

    println!("Vision:");
    println!("  Endpoint: {}", config.vision_endpoint());
    println!("  Model: {}", config.vision.model);
    println!();

    println!("FAQ:");
    println!("  Corpus: {}", config.faq_corpus_path());
    println!("  Max attempts: {}", config.faq.max_attempts);
    println!("  Score threshold: {}", config.faq.score_threshold);
    println!();

    println!("Search:");
    println!("  Tool top_k: {}", config.search.top_k);
    println!("  Chat top_k: {}", config.search.chat_top_k);
    println!("  Image weight: {}", config.search.weight_image);
}

/// Mask database URL for logging (hide password)
fn mask_database_url(url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(url) {
        if let Some(host) = parsed.host_str() {
            format!(
                "{}://{}@{}:{}",
                parsed.scheme(),
                parsed.username(),
                host,
                parsed.port().unwrap_or(5432)
            )
        } else {
            "***masked***".to_string()
        }
    } else {
        "***invalid***".to_string()
    }
}
