//! Retrieval and vision tools
//!
//! Each tool takes plain-string queries (a documented external-API
//! constraint) and reports failures as tagged error values so the router and
//! pipeline can degrade gracefully instead of crashing the session.

pub mod combined_search;
pub mod product_search;
pub mod vision;

pub use combined_search::CombinedQueryTool;
pub use product_search::ProductRetrievalTool;
pub use vision::VisionDescriptor;
