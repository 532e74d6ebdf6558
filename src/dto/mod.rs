use serde::Serialize;
use utoipa::ToSchema;

use crate::models::Category;

pub mod blog;
pub mod competitions;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod push;
pub mod search;
pub mod services;

/// Product and blog categories, alphabetical.
#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct CategoryList {
    #[schema(value_type = Vec<Category>)]
    pub items: Vec<Category>,
}
