//! Vector index access over PostgreSQL + pgvector.
//!
//! One `products` row per catalog item: document text, display metadata, and
//! the ingestion-time embedding. The interactive path is strictly read-only;
//! writes happen only through the batch ingestion job.

use pgvector::Vector;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::Row;
use tracing::debug;

use crate::models::ProductRecord;
use crate::Result;

/// Database connection pool wrapper
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

/// One raw nearest-neighbor row before similarity normalization.
#[derive(Debug, Clone)]
pub struct NearestProduct {
    pub id: String,
    pub name: String,
    pub link: Option<String>,
    pub document: String,
    pub metadata: Value,
    pub distance: f64,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new database instance from configuration
    pub async fn from_config(config: &crate::config::AppConfig) -> Result<Self> {
        let pool_options = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.max_connections())
            .min_connections(config.min_connections())
            .acquire_timeout(std::time::Duration::from_secs(config.connection_timeout()));

        let pool = pool_options.connect(config.database_url()).await?;
        Ok(Self::new(pool))
    }

    /// Get a reference to the database pool for raw queries
    pub fn pool(&self) -> &sqlx::PgPool {
        &self.pool
    }

    /// Initialize the products schema
    ///
    /// `dimension` must match the embedding model used at ingestion time;
    /// queries against a mismatched dimension fail at the index boundary.
    pub async fn init_schema(&self, config: &crate::config::AppConfig) -> Result<()> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await?;

        let dimension = config.embedding_dimension();
        sqlx::query(&format!(
            r"
            CREATE TABLE IF NOT EXISTS products (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                link TEXT,
                document TEXT NOT NULL,
                metadata JSONB NOT NULL DEFAULT '{{}}',
                embedding VECTOR({dimension}),
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
            "
        ))
        .execute(&self.pool)
        .await?;

        if config.vector_indexes_enabled() {
            let lists = config.vector_index_lists();
            sqlx::query(&format!(
                r"
                CREATE INDEX IF NOT EXISTS products_embedding_idx
                ON products USING ivfflat (embedding vector_cosine_ops)
                WITH (lists = {lists})
                "
            ))
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }

    /// Upsert one product with its embedding (ingestion path only)
    pub async fn upsert_product(
        &self,
        record: &ProductRecord,
        embedding: &[f32],
    ) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO products (id, name, link, document, metadata, embedding)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id)
            DO UPDATE SET
                name = EXCLUDED.name,
                link = EXCLUDED.link,
                document = EXCLUDED.document,
                metadata = EXCLUDED.metadata,
                embedding = EXCLUDED.embedding,
                updated_at = NOW()
            ",
        )
        .bind(&record.id)
        .bind(&record.name)
        .bind(&record.link)
        .bind(&record.document)
        .bind(&record.metadata)
        .bind(Vector::from(embedding.to_vec()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Top-K nearest products by cosine distance
    ///
    /// Results come back ordered by ascending distance; callers report
    /// similarity as `1 - distance`.
    pub async fn nearest_products(
        &self,
        query_embedding: Vec<f32>,
        top_k: i64,
    ) -> Result<Vec<NearestProduct>> {
        debug!("Executing vector search with top_k={}", top_k);

        let rows = sqlx::query(
            r"
            SELECT
                id,
                name,
                link,
                document,
                metadata,
                (embedding <=> $1)::float8 AS distance
            FROM products
            WHERE embedding IS NOT NULL
            ORDER BY embedding <=> $1
            LIMIT $2
            ",
        )
        .bind(Vector::from(query_embedding))
        .bind(top_k)
        .fetch_all(&self.pool)
        .await?;

        let results = rows
            .into_iter()
            .map(|row| NearestProduct {
                id: row.get("id"),
                name: row.get("name"),
                link: row.get("link"),
                document: row.get("document"),
                metadata: row.get("metadata"),
                distance: row.get("distance"),
            })
            .collect();

        Ok(results)
    }

    /// Fetch a single product by id (no embedding)
    pub async fn get_product(&self, id: &str) -> Result<Option<ProductRecord>> {
        let row = sqlx::query(
            r"
            SELECT id, name, link, document, metadata
            FROM products
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| ProductRecord {
            id: row.get("id"),
            name: row.get("name"),
            link: row.get("link"),
            document: row.get("document"),
            metadata: row.get("metadata"),
        }))
    }

    /// Count products in the index
    pub async fn count_products(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
