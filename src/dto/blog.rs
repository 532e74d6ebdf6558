use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::BlogPostSummary;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreatePostRequest {
    pub title: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub featured_image: Option<String>,
    pub category_id: Option<Uuid>,
    /// Defaults to publishing immediately.
    pub is_published: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub featured_image: Option<String>,
    pub category_id: Option<Uuid>,
    pub is_published: Option<bool>,
}

impl UpdatePostRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.excerpt.is_none()
            && self.content.is_none()
            && self.featured_image.is_none()
            && self.category_id.is_none()
            && self.is_published.is_none()
    }
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct PostList {
    #[schema(value_type = Vec<BlogPostSummary>)]
    pub items: Vec<BlogPostSummary>,
}
