use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    dto::{
        CategoryList,
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
    },
    entity::{
        ProductCategories, product_categories,
        products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Category, Product},
    response::{ApiResponse, Meta},
    routes::params::ProductQuery,
    services::{contains_ci, slugify, unique_conflict},
    state::AppState,
};

const DUPLICATE_PRODUCT: &str = "Product with this name already exists";

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(Column::IsActive.eq(true));

    if let Some(search) = query.search.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        condition = condition.add(
            Condition::any()
                .add(contains_ci(Column::Name, search))
                .add(contains_ci(Column::Description, search)),
        );
    }
    if let Some(category_id) = query.category_id {
        condition = condition.add(Column::CategoryId.eq(category_id));
    }

    let finder = Products::find()
        .filter(condition)
        .order_by_desc(Column::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn get_product(state: &AppState, slug: &str) -> AppResult<ApiResponse<Product>> {
    let product = Products::find()
        .filter(
            Condition::all()
                .add(Column::Slug.eq(slug))
                .add(Column::IsActive.eq(true)),
        )
        .one(&state.orm)
        .await?
        .map(product_from_entity)
        .ok_or_else(|| AppError::NotFound("Product not found".into()))?;

    Ok(ApiResponse::success("Product", product, None))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;

    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("Product name is required".into()));
    }
    validate_amounts(Some(payload.price), Some(payload.stock_quantity))?;
    if let Some(category_id) = payload.category_id {
        ensure_category(state, category_id).await?;
    }

    let slug = slugify(&name);
    if slug.is_empty() {
        return Err(AppError::BadRequest("Product name must contain letters or digits".into()));
    }
    let taken = Products::find()
        .filter(Column::Slug.eq(slug.clone()))
        .count(&state.orm)
        .await?;
    if taken > 0 {
        return Err(AppError::Conflict(DUPLICATE_PRODUCT.into()));
    }

    let now = Utc::now();
    let product = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        slug: Set(slug),
        description: Set(payload.description),
        price: Set(payload.price),
        stock_quantity: Set(payload.stock_quantity),
        is_active: Set(payload.is_active.unwrap_or(true)),
        category_id: Set(payload.category_id),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await
    .map_err(|err| unique_conflict(err, DUPLICATE_PRODUCT))?;

    tracing::info!(product_id = %product.id, slug = %product.slug, "product created");

    Ok(ApiResponse::success(
        "Product created",
        product_from_entity(product),
        None,
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    if payload.is_empty() {
        return Err(AppError::BadRequest("No fields to update".into()));
    }
    validate_amounts(payload.price, payload.stock_quantity)?;
    if let Some(category_id) = payload.category_id {
        ensure_category(state, category_id).await?;
    }

    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".into()))?;

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(stock) = payload.stock_quantity {
        active.stock_quantity = Set(stock);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    if let Some(category_id) = payload.category_id {
        active.category_id = Set(Some(category_id));
    }
    active.updated_at = Set(Utc::now().into());

    let product = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Product updated",
        product_from_entity(product),
        None,
    ))
}

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let items = ProductCategories::find()
        .order_by_asc(product_categories::Column::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(category_from_entity)
        .collect();

    Ok(ApiResponse::data(CategoryList { items }))
}

async fn ensure_category(state: &AppState, category_id: Uuid) -> AppResult<()> {
    ProductCategories::find_by_id(category_id)
        .one(&state.orm)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::BadRequest("Unknown product category".into()))
}

fn validate_amounts(price: Option<i64>, stock: Option<i32>) -> AppResult<()> {
    if price.is_some_and(|p| p < 0) {
        return Err(AppError::BadRequest("Price must not be negative".into()));
    }
    if stock.is_some_and(|s| s < 0) {
        return Err(AppError::BadRequest("Stock quantity must not be negative".into()));
    }
    Ok(())
}

pub(crate) fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: model.id,
        name: model.name,
        slug: model.slug,
        description: model.description,
        price: model.price,
        stock_quantity: model.stock_quantity,
        is_active: model.is_active,
        category_id: model.category_id,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn category_from_entity(model: product_categories::Model) -> Category {
    Category {
        id: model.id,
        name: model.name,
        slug: model.slug,
        description: model.description,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
