//! Veterinarians and horse transporters: directory queries with proximity
//! ranking, self-registration and owner edits.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, QueryFilter,
    Set,
};
use sea_orm::sea_query::Expr;
use uuid::Uuid;

use crate::{
    dto::services::{
        RegisterTransporterRequest, RegisterVeterinarianRequest, TransporterList,
        UpdateTransporterRequest, UpdateVeterinarianRequest, VeterinarianList,
    },
    entity::{
        horse_transporters::{
            ActiveModel as TransporterActive, Column as TransCol, Entity as HorseTransporters,
            Model as TransporterModel,
        },
        sea_orm_active_enums::ServiceType,
        veterinarians::{
            ActiveModel as VetActive, Column as VetCol, Entity as Veterinarians,
            Model as VetModel,
        },
    },
    error::{AppError, AppResult},
    geo::{Coordinates, Locatable, rank_by_proximity},
    middleware::auth::AuthUser,
    models::{Transporter, Veterinarian},
    response::ApiResponse,
    routes::params::ProviderQuery,
    services::contains_ci,
    state::AppState,
};

impl Locatable for VetModel {
    fn coordinates(&self) -> Option<Coordinates> {
        coordinates(self.latitude, self.longitude)
    }
    fn rating(&self) -> f64 {
        self.rating
    }
    fn review_count(&self) -> i32 {
        self.total_reviews
    }
}

impl Locatable for TransporterModel {
    fn coordinates(&self) -> Option<Coordinates> {
        coordinates(self.latitude, self.longitude)
    }
    fn rating(&self) -> f64 {
        self.rating
    }
    fn review_count(&self) -> i32 {
        self.total_reviews
    }
}

fn coordinates(latitude: Option<f64>, longitude: Option<f64>) -> Option<Coordinates> {
    Some(Coordinates {
        latitude: latitude?,
        longitude: longitude?,
    })
}

/// The parts of either provider kind that bookings and reviews care about.
#[derive(Debug, Clone)]
pub struct ProviderRef {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub is_active: bool,
}

pub async fn find_provider<C: ConnectionTrait>(
    db: &C,
    service_type: &ServiceType,
    id: Uuid,
) -> Result<Option<ProviderRef>, DbErr> {
    let found = match service_type {
        ServiceType::Veterinarian => Veterinarians::find_by_id(id).one(db).await?.map(|v| ProviderRef {
            id: v.id,
            user_id: v.user_id,
            name: v.full_name,
            is_active: v.is_active,
        }),
        ServiceType::Transporter => HorseTransporters::find_by_id(id).one(db).await?.map(|t| ProviderRef {
            id: t.id,
            user_id: t.user_id,
            name: t.contact_name,
            is_active: t.is_active,
        }),
    };
    Ok(found)
}

/// Folds one more rating into the provider's running mean in a single
/// statement, so concurrent reviews cannot lose each other's update.
///
/// Returns the number of provider rows touched (0 when the id is unknown).
pub async fn apply_rating<C: ConnectionTrait>(
    db: &C,
    service_type: &ServiceType,
    id: Uuid,
    rating: i32,
) -> Result<u64, DbErr> {
    let value = f64::from(rating);
    let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
    let result = match service_type {
        ServiceType::Veterinarian => {
            Veterinarians::update_many()
                .col_expr(
                    VetCol::Rating,
                    Expr::col(VetCol::Rating)
                        .mul(Expr::col(VetCol::TotalReviews))
                        .add(value)
                        .div(Expr::col(VetCol::TotalReviews).add(1)),
                )
                .col_expr(VetCol::TotalReviews, Expr::col(VetCol::TotalReviews).add(1))
                .col_expr(VetCol::UpdatedAt, Expr::value(now))
                .filter(VetCol::Id.eq(id))
                .exec(db)
                .await?
        }
        ServiceType::Transporter => {
            HorseTransporters::update_many()
                .col_expr(
                    TransCol::Rating,
                    Expr::col(TransCol::Rating)
                        .mul(Expr::col(TransCol::TotalReviews))
                        .add(value)
                        .div(Expr::col(TransCol::TotalReviews).add(1)),
                )
                .col_expr(TransCol::TotalReviews, Expr::col(TransCol::TotalReviews).add(1))
                .col_expr(TransCol::UpdatedAt, Expr::value(now))
                .filter(TransCol::Id.eq(id))
                .exec(db)
                .await?
        }
    };
    Ok(result.rows_affected)
}

pub async fn list_veterinarians(
    state: &AppState,
    query: ProviderQuery,
) -> AppResult<ApiResponse<VeterinarianList>> {
    let origin = query.origin();
    let mut condition = Condition::all().add(VetCol::IsActive.eq(true));

    if origin.is_some() {
        condition = condition
            .add(VetCol::Latitude.is_not_null())
            .add(VetCol::Longitude.is_not_null());
    } else if let Some(region) = non_blank(&query.region) {
        // region only narrows non-geographic searches
        condition = condition.add(contains_ci(VetCol::Region, region));
    }
    if let Some(specialization) = non_blank(&query.specialization) {
        condition = condition.add(contains_ci(VetCol::Specialization, specialization));
    }

    let rows = Veterinarians::find().filter(condition).all(&state.orm).await?;
    let items = rank_by_proximity(rows, origin, query.radius_km())
        .into_iter()
        .map(|(model, distance)| vet_from_entity(model, distance))
        .collect();

    Ok(ApiResponse::data(VeterinarianList { items }))
}

pub async fn list_transporters(
    state: &AppState,
    query: ProviderQuery,
) -> AppResult<ApiResponse<TransporterList>> {
    let origin = query.origin();
    let mut condition = Condition::all().add(TransCol::IsActive.eq(true));

    if origin.is_some() {
        condition = condition
            .add(TransCol::Latitude.is_not_null())
            .add(TransCol::Longitude.is_not_null());
    } else if let Some(region) = non_blank(&query.region) {
        condition = condition.add(contains_ci(TransCol::Region, region));
    }

    let rows = HorseTransporters::find()
        .filter(condition)
        .all(&state.orm)
        .await?;
    let items = rank_by_proximity(rows, origin, query.radius_km())
        .into_iter()
        .map(|(model, distance)| transporter_from_entity(model, distance))
        .collect();

    Ok(ApiResponse::data(TransporterList { items }))
}

pub async fn get_veterinarian(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Veterinarian>> {
    let vet = Veterinarians::find()
        .filter(
            Condition::all()
                .add(VetCol::Id.eq(id))
                .add(VetCol::IsActive.eq(true)),
        )
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Veterinarian not found".into()))?;

    Ok(ApiResponse::data(vet_from_entity(vet, None)))
}

pub async fn get_transporter(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Transporter>> {
    let transporter = HorseTransporters::find()
        .filter(
            Condition::all()
                .add(TransCol::Id.eq(id))
                .add(TransCol::IsActive.eq(true)),
        )
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Transporter not found".into()))?;

    Ok(ApiResponse::data(transporter_from_entity(transporter, None)))
}

pub async fn register_veterinarian(
    state: &AppState,
    user: &AuthUser,
    payload: RegisterVeterinarianRequest,
) -> AppResult<ApiResponse<Veterinarian>> {
    require("full_name", &payload.full_name)?;
    require("phone", &payload.phone)?;
    validate_location(payload.latitude, payload.longitude)?;

    let now = Utc::now();
    let vet = VetActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        full_name: Set(payload.full_name),
        specialization: Set(payload.specialization),
        region: Set(payload.region),
        phone: Set(payload.phone),
        email: Set(payload.email),
        resume: Set(payload.resume),
        image_url: Set(payload.image_url),
        latitude: Set(payload.latitude),
        longitude: Set(payload.longitude),
        address: Set(payload.address),
        rating: Set(0.0),
        total_reviews: Set(0),
        is_verified: Set(false),
        is_active: Set(true),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(provider_id = %vet.id, user_id = %user.user_id, "veterinarian registered");

    Ok(ApiResponse::success(
        "Veterinarian registered successfully",
        vet_from_entity(vet, None),
        None,
    ))
}

pub async fn register_transporter(
    state: &AppState,
    user: &AuthUser,
    payload: RegisterTransporterRequest,
) -> AppResult<ApiResponse<Transporter>> {
    require("company_name", &payload.company_name)?;
    require("contact_name", &payload.contact_name)?;
    require("phone", &payload.phone)?;
    validate_location(payload.latitude, payload.longitude)?;

    let now = Utc::now();
    let transporter = TransporterActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        company_name: Set(payload.company_name),
        contact_name: Set(payload.contact_name),
        phone: Set(payload.phone),
        email: Set(payload.email),
        region: Set(payload.region),
        equipment: Set(payload.equipment),
        transport_info: Set(payload.transport_info),
        latitude: Set(payload.latitude),
        longitude: Set(payload.longitude),
        address: Set(payload.address),
        rating: Set(0.0),
        total_reviews: Set(0),
        is_verified: Set(false),
        is_active: Set(true),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(provider_id = %transporter.id, user_id = %user.user_id, "transporter registered");

    Ok(ApiResponse::success(
        "Transporter registered successfully",
        transporter_from_entity(transporter, None),
        None,
    ))
}

pub async fn update_veterinarian(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateVeterinarianRequest,
) -> AppResult<ApiResponse<Veterinarian>> {
    if payload.is_empty() {
        return Err(AppError::BadRequest("No fields to update".into()));
    }
    validate_location(payload.latitude, payload.longitude)?;

    let existing = Veterinarians::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Veterinarian not found".into()))?;
    if existing.user_id != user.user_id {
        return Err(AppError::Forbidden);
    }

    let mut active: VetActive = existing.into();
    if let Some(full_name) = payload.full_name {
        active.full_name = Set(full_name);
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(phone);
    }
    if payload.specialization.is_some() {
        active.specialization = Set(payload.specialization);
    }
    if payload.region.is_some() {
        active.region = Set(payload.region);
    }
    if payload.email.is_some() {
        active.email = Set(payload.email);
    }
    if payload.resume.is_some() {
        active.resume = Set(payload.resume);
    }
    if payload.image_url.is_some() {
        active.image_url = Set(payload.image_url);
    }
    if payload.latitude.is_some() {
        active.latitude = Set(payload.latitude);
    }
    if payload.longitude.is_some() {
        active.longitude = Set(payload.longitude);
    }
    if payload.address.is_some() {
        active.address = Set(payload.address);
    }
    active.updated_at = Set(Utc::now().into());

    let vet = active.update(&state.orm).await?;
    Ok(ApiResponse::success(
        "Veterinarian updated successfully",
        vet_from_entity(vet, None),
        None,
    ))
}

pub async fn update_transporter(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateTransporterRequest,
) -> AppResult<ApiResponse<Transporter>> {
    if payload.is_empty() {
        return Err(AppError::BadRequest("No fields to update".into()));
    }
    validate_location(payload.latitude, payload.longitude)?;

    let existing = HorseTransporters::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Transporter not found".into()))?;
    if existing.user_id != user.user_id {
        return Err(AppError::Forbidden);
    }

    let mut active: TransporterActive = existing.into();
    if let Some(company_name) = payload.company_name {
        active.company_name = Set(company_name);
    }
    if let Some(contact_name) = payload.contact_name {
        active.contact_name = Set(contact_name);
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(phone);
    }
    if payload.email.is_some() {
        active.email = Set(payload.email);
    }
    if payload.region.is_some() {
        active.region = Set(payload.region);
    }
    if payload.equipment.is_some() {
        active.equipment = Set(payload.equipment);
    }
    if payload.transport_info.is_some() {
        active.transport_info = Set(payload.transport_info);
    }
    if payload.latitude.is_some() {
        active.latitude = Set(payload.latitude);
    }
    if payload.longitude.is_some() {
        active.longitude = Set(payload.longitude);
    }
    if payload.address.is_some() {
        active.address = Set(payload.address);
    }
    active.updated_at = Set(Utc::now().into());

    let transporter = active.update(&state.orm).await?;
    Ok(ApiResponse::success(
        "Transporter updated successfully",
        transporter_from_entity(transporter, None),
        None,
    ))
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn require(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(())
}

fn validate_location(latitude: Option<f64>, longitude: Option<f64>) -> AppResult<()> {
    if latitude.is_some_and(|lat| !(-90.0..=90.0).contains(&lat)) {
        return Err(AppError::BadRequest("Latitude must be between -90 and 90".into()));
    }
    if longitude.is_some_and(|lng| !(-180.0..=180.0).contains(&lng)) {
        return Err(AppError::BadRequest("Longitude must be between -180 and 180".into()));
    }
    Ok(())
}

fn vet_from_entity(model: VetModel, distance_km: Option<f64>) -> Veterinarian {
    Veterinarian {
        id: model.id,
        user_id: model.user_id,
        full_name: model.full_name,
        specialization: model.specialization,
        region: model.region,
        phone: model.phone,
        email: model.email,
        resume: model.resume,
        image_url: model.image_url,
        latitude: model.latitude,
        longitude: model.longitude,
        address: model.address,
        rating: model.rating,
        total_reviews: model.total_reviews,
        is_verified: model.is_verified,
        is_active: model.is_active,
        distance_km,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn transporter_from_entity(model: TransporterModel, distance_km: Option<f64>) -> Transporter {
    Transporter {
        id: model.id,
        user_id: model.user_id,
        company_name: model.company_name,
        contact_name: model.contact_name,
        phone: model.phone,
        email: model.email,
        region: model.region,
        equipment: model.equipment,
        transport_info: model.transport_info,
        latitude: model.latitude,
        longitude: model.longitude,
        address: model.address,
        rating: model.rating,
        total_reviews: model.total_reviews,
        is_verified: model.is_verified,
        is_active: model.is_active,
        distance_km,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
