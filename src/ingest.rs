//! Catalog ingestion: batch ETL into the vector index
//!
//! Reads a JSON-Lines product catalog, filters to clothing article types,
//! constructs the enriched document text that queries are later phrased
//! against, embeds documents in batches, and upserts into the index. Offline
//! job; never runs on the interactive path.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::info;
use tracing::warn;

use crate::database::Database;
use crate::embeddings::EmbeddingService;
use crate::embeddings::MAX_BATCH_SIZE;
use crate::errors::Result;
use crate::models::ProductRecord;

/// Clothing article types admitted into the index
pub const CLOTHING_ARTICLE_TYPES: &[&str] = &[
    "Blazers", "Boxers", "Bra", "Briefs", "Camisoles", "Capris", "Churidar",
    "Clothing Set", "Dresses", "Dupatta", "Innerwear Vests", "Jackets", "Jeans",
    "Jeggings", "Jumpsuit", "Kurta Sets", "Kurtas", "Kurtis", "Leggings",
    "Lehenga Choli", "Lounge Pants", "Lounge Shorts", "Lounge Tshirts",
    "Nehru Jackets", "Night suits", "Nightdress", "Patiala", "Rain Jacket",
    "Rain Trousers", "Robe", "Rompers", "Salwar", "Salwar and Dupatta",
    "Sarees", "Shapewear", "Shirts", "Shorts", "Shrug", "Skirts", "Suits",
    "Sweaters", "Sweatshirts", "Swimwear", "Tights", "Tops", "Track Pants",
    "Tracksuits", "Trousers", "Tshirts", "Tunics", "Waistcoat",
];

/// Disambiguating explanation for ambiguous article types
pub fn category_explanation(article_type: &str) -> Option<&'static str> {
    let explanation = match article_type {
        "Tshirts" => "a casual, collarless knit top usually with short sleeves.",
        "Clothing Set" => "a matching or coordinated combination of garments sold as a set.",
        "Kurta Sets" => "a traditional Indian outfit consisting of a kurta and matching bottoms.",
        "Swimwear" => "garments designed specifically for swimming.",
        "Capris" => "close-fitting pants that extend below the knee but above the ankle.",
        "Churidar" => "tight-fitting trousers worn under kurtas, gathered at the ankles.",
        "Jeans" => "sturdy, casual trousers made from denim fabric.",
        "Jeggings" => "leggings styled to resemble jeans.",
        "Leggings" => "tight-fitting stretch pants, typically ankle-length.",
        "Patiala" => "pleated, baggy trousers traditional to Punjab, usually paired with kurtas.",
        "Salwar" => "loose-fitting trousers gathered at the waist and ankles.",
        "Shorts" => "casual or athletic lower garments that end above the knees.",
        "Skirts" => "lower garments that hang from the waist and flow freely around the legs.",
        "Track Pants" => "comfortable, athletic-style pants used for workouts or lounging.",
        "Tracksuits" => "a coordinated set of track pants and jacket.",
        "Trousers" => "formal or semi-formal pants that cover the legs from waist to ankle.",
        "Dresses" => "one-piece garments that combine a bodice with a skirt.",
        "Jumpsuit" => "a one-piece garment combining top and pants.",
        "Sarees" => "a traditional Indian garment draped over a blouse and petticoat.",
        "Blazers" => "semi-formal or formal upper-body garments with lapels.",
        "Jackets" => "outerwear designed for warmth, wind or rain protection.",
        "Kurtas" => "long, collarless shirts worn in South Asia.",
        "Kurtis" => "shorter versions of kurtas, typically worn with leggings or jeans.",
        "Lehenga Choli" => "a flared skirt (lehenga) and a cropped blouse (choli).",
        "Shirts" => "a collared, button-down garment, formal or casual.",
        "Shrug" => "a cropped cardigan-style outer layer worn over tops or dresses.",
        "Sweaters" => "knitted upper-body garments used for warmth.",
        "Sweatshirts" => "warm, thick upper garments made from fleece or cotton blends.",
        "Tops" => "a broad term for women's upper garments not categorized as shirts.",
        "Tunics" => "long tops typically extending below the hips.",
        "Waistcoat" => "a sleeveless, buttoned formal garment worn over a shirt.",
        _ => return None,
    };
    Some(explanation)
}

/// One raw catalog row
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    #[serde(rename = "productDisplayName")]
    pub product_display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "articleType")]
    pub article_type: String,
    #[serde(rename = "baseColour", default)]
    pub base_colour: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub usage: String,
    #[serde(default)]
    pub season: String,
    #[serde(default)]
    pub link: Option<String>,
}

/// Ingestion statistics
#[derive(Debug, Default, Clone)]
pub struct IngestStats {
    pub total_rows: usize,
    pub ingested: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Strip HTML tags from a catalog description
pub fn strip_html(raw: &str) -> String {
    let mut text = String::with_capacity(raw.len());
    let mut in_tag = false;
    for c in raw.chars() {
        match c {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                text.push(' ');
            }
            c if !in_tag => text.push(c),
            _ => {}
        }
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Construct the enriched document text for one item
///
/// This exact phrasing is mirrored by the pipeline's query rewriting stage
/// so query and document embeddings line up.
pub fn construct_document(item: &CatalogItem) -> String {
    let description: String = strip_html(&item.description).chars().take(100).collect();
    let explanation = category_explanation(&item.article_type).unwrap_or_default();

    format!(
        "{}. {} This product is a {}: {} It is {} in color, designed for {}. \
         Best used in {} during {}.",
        item.product_display_name,
        description,
        item.article_type,
        explanation,
        item.base_colour,
        item.gender,
        item.usage,
        item.season,
    )
}

/// Build the index record for one item
pub fn build_record(item: &CatalogItem) -> ProductRecord {
    let mut metadata = serde_json::Map::new();
    let fields = [
        ("productDisplayName", item.product_display_name.as_str()),
        ("articleType", item.article_type.as_str()),
        ("baseColour", item.base_colour.as_str()),
        ("gender", item.gender.as_str()),
        ("usage", item.usage.as_str()),
        ("season", item.season.as_str()),
    ];
    for (key, value) in fields {
        if !value.is_empty() {
            metadata.insert(key.to_string(), json!(value));
        }
    }
    if let Some(link) = &item.link {
        metadata.insert("link".to_string(), json!(link));
    }
    if let Some(explanation) = category_explanation(&item.article_type) {
        metadata.insert("category_explanation".to_string(), json!(explanation));
    }

    ProductRecord {
        id: item.id.clone(),
        name: item.product_display_name.clone(),
        link: item.link.clone(),
        document: construct_document(item),
        metadata: serde_json::Value::Object(metadata),
    }
}

/// Ingest a JSON-Lines catalog file into the vector index
///
/// Rows that fail to parse or embed are logged and skipped; the job keeps
/// going and reports totals at the end.
pub async fn ingest_catalog<P: AsRef<Path>>(
    db: Arc<Database>,
    embedding_service: Arc<EmbeddingService>,
    path: P,
    limit: Option<usize>,
) -> Result<IngestStats> {
    let path = path.as_ref();
    info!("Starting catalog ingestion from {}", path.display());

    let content = std::fs::read_to_string(path)?;
    let mut stats = IngestStats::default();
    let mut items: Vec<CatalogItem> = Vec::new();

    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        stats.total_rows += 1;

        match serde_json::from_str::<CatalogItem>(line) {
            Ok(item) => {
                if CLOTHING_ARTICLE_TYPES.contains(&item.article_type.as_str()) {
                    items.push(item);
                } else {
                    stats.skipped += 1;
                }
            }
            Err(e) => {
                warn!("Skipping malformed catalog row {}: {}", line_no + 1, e);
                stats.failed += 1;
            }
        }

        if let Some(limit) = limit {
            if items.len() >= limit {
                break;
            }
        }
    }

    info!("Parsed {} clothing items from {} rows", items.len(), stats.total_rows);

    for (batch_idx, chunk) in items.chunks(MAX_BATCH_SIZE).enumerate() {
        info!(
            "Embedding batch {}/{} ({} items)",
            batch_idx + 1,
            items.len().div_ceil(MAX_BATCH_SIZE),
            chunk.len()
        );

        let records: Vec<ProductRecord> = chunk.iter().map(build_record).collect();
        let documents: Vec<&str> = records.iter().map(|r| r.document.as_str()).collect();

        let embeddings = match embedding_service.generate_batch(documents).await {
            Ok(embeddings) => embeddings,
            Err(e) => {
                warn!("Embedding batch {} failed: {}", batch_idx + 1, e);
                stats.failed += chunk.len();
                continue;
            }
        };

        for (record, embedding) in records.iter().zip(embeddings.iter()) {
            match db.upsert_product(record, embedding).await {
                Ok(()) => stats.ingested += 1,
                Err(e) => {
                    warn!("Failed to upsert product {}: {}", record.id, e);
                    stats.failed += 1;
                }
            }
        }

        // Small delay between batches to avoid rate limiting
        if batch_idx < items.len().div_ceil(MAX_BATCH_SIZE) - 1 {
            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        }
    }

    info!(
        "Ingestion complete: {} ingested, {} skipped, {} failed",
        stats.ingested, stats.skipped, stats.failed
    );

    Ok(stats)
}
