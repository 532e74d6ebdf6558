use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseTransaction, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::services::{CreateReviewRequest, ReviewList},
    entity::{
        ServiceBookings, Users,
        service_reviews::{ActiveModel, Column, Entity as ServiceReviews, Model as ReviewModel},
        sea_orm_active_enums::ServiceType,
        users::Model as UserModel,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Review,
    response::ApiResponse,
    services::{
        booking_service::parse_service_type, provider_service::apply_rating, unique_conflict,
    },
    state::AppState,
};

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

const DUPLICATE_REVIEW: &str = "This booking has already been reviewed";

/// Stores the review and folds its rating into the provider's aggregate.
/// Both writes commit together or not at all.
pub async fn create_review(
    state: &AppState,
    user: &AuthUser,
    payload: CreateReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    if !(MIN_RATING..=MAX_RATING).contains(&payload.rating) {
        return Err(AppError::BadRequest("Rating must be between 1 and 5".into()));
    }
    let service_type = parse_service_type(&payload.service_type)?;

    let booking = ServiceBookings::find_by_id(payload.booking_id)
        .one(&state.orm)
        .await?
        .filter(|b| b.user_id == user.user_id)
        .ok_or_else(|| AppError::NotFound("Booking not found".into()))?;
    if booking.service_provider_id != payload.service_provider_id
        || booking.service_type != service_type
    {
        return Err(AppError::BadRequest(
            "Booking does not belong to this service provider".into(),
        ));
    }

    let reviewed = ServiceReviews::find()
        .filter(Column::BookingId.eq(booking.id))
        .count(&state.orm)
        .await?;
    if reviewed > 0 {
        return Err(AppError::Conflict(DUPLICATE_REVIEW.into()));
    }

    let txn = state.orm.begin().await?;
    let review = match write_review(&txn, user, &payload, service_type).await {
        Ok(review) => {
            txn.commit().await?;
            review
        }
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::warn!(error = %rollback_err, "review rollback failed");
            }
            return Err(err);
        }
    };

    tracing::info!(
        review_id = %review.id,
        provider_id = %review.service_provider_id,
        rating = review.rating,
        "review created"
    );

    Ok(ApiResponse::success(
        "Review created successfully",
        review_from_entity(review, None),
        None,
    ))
}

async fn write_review(
    txn: &DatabaseTransaction,
    user: &AuthUser,
    payload: &CreateReviewRequest,
    service_type: ServiceType,
) -> AppResult<ReviewModel> {
    let review = ActiveModel {
        id: Set(Uuid::new_v4()),
        booking_id: Set(payload.booking_id),
        user_id: Set(user.user_id),
        service_provider_id: Set(payload.service_provider_id),
        service_type: Set(service_type),
        rating: Set(payload.rating),
        comment: Set(payload.comment.clone()),
        created_at: Set(Utc::now().into()),
    }
    .insert(txn)
    .await
    .map_err(|err| unique_conflict(err, DUPLICATE_REVIEW))?;

    let touched = apply_rating(txn, &service_type, payload.service_provider_id, payload.rating).await?;
    if touched == 0 {
        return Err(AppError::NotFound("Service provider not found".into()));
    }

    Ok(review)
}

pub async fn list_reviews(
    state: &AppState,
    service_type: &str,
    provider_id: Uuid,
) -> AppResult<ApiResponse<ReviewList>> {
    let service_type = parse_service_type(service_type)?;

    let items = ServiceReviews::find()
        .filter(
            Condition::all()
                .add(Column::ServiceType.eq(service_type))
                .add(Column::ServiceProviderId.eq(provider_id)),
        )
        .order_by_desc(Column::CreatedAt)
        .find_also_related(Users)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|(review, reviewer)| review_from_entity(review, reviewer))
        .collect();

    Ok(ApiResponse::data(ReviewList { items }))
}

fn review_from_entity(model: ReviewModel, reviewer: Option<UserModel>) -> Review {
    Review {
        id: model.id,
        booking_id: model.booking_id,
        user_id: model.user_id,
        reviewer_name: reviewer.map(|u| u.full_name),
        service_provider_id: model.service_provider_id,
        service_type: model.service_type,
        rating: model.rating,
        comment: model.comment,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
