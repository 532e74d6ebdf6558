use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{BlogPostSummary, Competition, Product};

#[derive(Debug, Default, Serialize, ToSchema)]
pub struct SearchBuckets {
    pub blog: Vec<BlogPostSummary>,
    pub products: Vec<Product>,
    pub competitions: Vec<Competition>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResults {
    pub query: String,
    pub results: SearchBuckets,
    /// Hits across all buckets on this page.
    pub total: usize,
}
