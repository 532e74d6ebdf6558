use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect};

use crate::{
    dto::search::{SearchBuckets, SearchResults},
    entity::{Competitions, ProductCategories, Products, competitions, product_categories, products},
    error::{AppError, AppResult},
    models::{Competition, Product},
    response::ApiResponse,
    routes::params::SearchQuery,
    services::{
        blog_service, competition_service::competition_from_entity, contains_ci,
        product_service::product_from_entity,
    },
    state::AppState,
};

const MIN_QUERY_CHARS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    All,
    Blog,
    Product,
    Competition,
}

impl Scope {
    fn parse(raw: Option<&str>) -> AppResult<Self> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            None | Some("all") => Ok(Scope::All),
            Some("blog") => Ok(Scope::Blog),
            Some("product") => Ok(Scope::Product),
            Some("competition") => Ok(Scope::Competition),
            Some(_) => Err(AppError::BadRequest("Invalid search type".into())),
        }
    }

    fn includes(self, bucket: Scope) -> bool {
        self == Scope::All || self == bucket
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SortOrder {
    Date,
    Relevance,
}

impl SortOrder {
    fn parse(raw: Option<&str>) -> AppResult<Self> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            None | Some("date") => Ok(SortOrder::Date),
            Some("relevance") => Ok(SortOrder::Relevance),
            Some(_) => Err(AppError::BadRequest("Invalid sort order".into())),
        }
    }
}

/// Searches posts, products and competitions at once. Each bucket is paged
/// on its own with the same page and size.
pub async fn global_search(
    state: &AppState,
    query: SearchQuery,
) -> AppResult<ApiResponse<SearchResults>> {
    let needle = query.q.as_deref().map(str::trim).unwrap_or_default();
    if needle.chars().count() < MIN_QUERY_CHARS {
        return Err(AppError::BadRequest(
            "Search query must be at least 2 characters".into(),
        ));
    }
    let scope = Scope::parse(query.scope.as_deref())?;
    let sort = SortOrder::parse(query.sort.as_deref())?;
    let category = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let (_, per_page, offset) = query.pagination().normalize();
    let (limit, offset) = (per_page as u64, offset as u64);

    let mut results = SearchBuckets::default();
    if scope.includes(Scope::Blog) {
        results.blog = blog_service::search_published(state, needle, category, limit, offset).await?;
    }
    if scope.includes(Scope::Product) {
        results.products = search_products(state, needle, category, limit, offset).await?;
    }
    if scope.includes(Scope::Competition) {
        results.competitions = search_competitions(state, needle, category, limit, offset).await?;
    }

    if sort == SortOrder::Relevance {
        let needle = needle.to_lowercase();
        title_matches_first(&mut results.blog, |p| p.title.as_str(), &needle);
        title_matches_first(&mut results.products, |p| p.name.as_str(), &needle);
        title_matches_first(&mut results.competitions, |c| c.title.as_str(), &needle);
    }

    let total = results.blog.len() + results.products.len() + results.competitions.len();
    Ok(ApiResponse::data(SearchResults {
        query: needle.to_string(),
        results,
        total,
    }))
}

async fn search_products(
    state: &AppState,
    needle: &str,
    category_slug: Option<&str>,
    limit: u64,
    offset: u64,
) -> AppResult<Vec<Product>> {
    let mut condition = Condition::all().add(products::Column::IsActive.eq(true)).add(
        Condition::any()
            .add(contains_ci(products::Column::Name, needle))
            .add(contains_ci(products::Column::Description, needle)),
    );

    if let Some(slug) = category_slug {
        let category = ProductCategories::find()
            .filter(product_categories::Column::Slug.eq(slug))
            .one(&state.orm)
            .await?;
        let Some(category) = category else {
            return Ok(Vec::new());
        };
        condition = condition.add(products::Column::CategoryId.eq(category.id));
    }

    Ok(Products::find()
        .filter(condition)
        .order_by_desc(products::Column::CreatedAt)
        .limit(limit)
        .offset(offset)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect())
}

async fn search_competitions(
    state: &AppState,
    needle: &str,
    competition_type: Option<&str>,
    limit: u64,
    offset: u64,
) -> AppResult<Vec<Competition>> {
    let mut condition = Condition::all()
        .add(competitions::Column::IsPublished.eq(true))
        .add(
            Condition::any()
                .add(contains_ci(competitions::Column::Title, needle))
                .add(contains_ci(competitions::Column::Description, needle)),
        );
    if let Some(kind) = competition_type {
        condition = condition.add(competitions::Column::CompetitionType.eq(kind));
    }

    Ok(Competitions::find()
        .filter(condition)
        .order_by_desc(competitions::Column::StartDate)
        .limit(limit)
        .offset(offset)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(competition_from_entity)
        .collect())
}

/// Stable partition: items whose title contains `needle` (already lowercased)
/// move to the front, everything else keeps its date order.
fn title_matches_first<T>(items: &mut [T], title: impl Fn(&T) -> &str, needle: &str) {
    items.sort_by_key(|item| !title(item).to_lowercase().contains(needle));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_and_sort_parse_known_values_only() {
        assert_eq!(Scope::parse(None).unwrap(), Scope::All);
        assert_eq!(Scope::parse(Some(" blog ")).unwrap(), Scope::Blog);
        assert!(Scope::parse(Some("forum")).is_err());
        assert!(Scope::All.includes(Scope::Product));
        assert!(!Scope::Blog.includes(Scope::Product));

        assert_eq!(SortOrder::parse(Some("relevance")).unwrap(), SortOrder::Relevance);
        assert_eq!(SortOrder::parse(Some("")).unwrap(), SortOrder::Date);
        assert!(SortOrder::parse(Some("random")).is_err());
    }

    #[test]
    fn title_hits_move_ahead_without_reordering_the_rest() {
        let mut titles = vec!["Feeding guide", "Saddle care", "Winter SADDLE fit", "Hoof oil"];
        title_matches_first(&mut titles, |t| *t, "saddle");
        assert_eq!(
            titles,
            vec!["Saddle care", "Winter SADDLE fit", "Feeding guide", "Hoof oil"]
        );
    }
}
