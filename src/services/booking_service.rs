use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    dto::services::{BookingList, CreateBookingRequest, UpdateBookingStatusRequest},
    effects::best_effort,
    entity::{
        sea_orm_active_enums::{BookingStatus, NotificationType, ServiceType, parse_enum},
        service_bookings::{ActiveModel, Column, Entity as ServiceBookings, Model as BookingModel},
    },
    error::{AppError, AppResult},
    mailer::EmailTemplate,
    middleware::auth::AuthUser,
    models::Booking,
    response::ApiResponse,
    services::{
        load_user,
        notification_service::{self, NewNotification},
        provider_service::find_provider,
    },
    state::AppState,
};

pub(crate) fn parse_service_type(raw: &str) -> AppResult<ServiceType> {
    parse_enum::<ServiceType>(raw).ok_or_else(|| AppError::BadRequest("Invalid service type".into()))
}

pub async fn create_booking(
    state: &AppState,
    user: &AuthUser,
    payload: CreateBookingRequest,
) -> AppResult<ApiResponse<Booking>> {
    let service_type = parse_service_type(&payload.service_type)?;

    let provider = find_provider(&state.orm, &service_type, payload.service_provider_id)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| AppError::NotFound("Service provider not found".into()))?;

    let now = Utc::now();
    let booking = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        service_type: Set(service_type.clone()),
        service_provider_id: Set(provider.id),
        booking_date: Set(payload.booking_date.into()),
        description: Set(payload.description),
        status: Set(BookingStatus::Pending),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(
        booking_id = %booking.id,
        provider_id = %provider.id,
        service_type = service_type.label_fa(),
        "booking created"
    );

    let service_label = service_type.label_fa();
    let notify = notification_service::notify_user(
        state,
        NewNotification {
            user_id: user.user_id,
            notification_type: NotificationType::Booking,
            title: "رزرو جدید".into(),
            message: format!("رزرو شما برای {service_label} با موفقیت ثبت شد."),
            link: Some(format!("/profile/bookings/{}", booking.id)),
        },
    );
    let booking_at = booking.booking_date;
    let provider_name = provider.name.clone();
    let email = async {
        let customer = load_user(state, user.user_id).await?;
        let template = EmailTemplate::BookingReminder {
            name: customer.full_name,
            service_name: format!("{service_label} {provider_name}"),
            booking_date: booking_at.format("%Y-%m-%d").to_string(),
            booking_time: booking_at.format("%H:%M").to_string(),
        };
        state.mailer.send(&customer.email, &template).await
    };
    tokio::join!(
        best_effort("booking notification", notify),
        best_effort("booking reminder email", email),
    );

    Ok(ApiResponse::success(
        "Booking created successfully",
        booking_from_entity(booking),
        None,
    ))
}

pub async fn list_bookings(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<BookingList>> {
    let items = ServiceBookings::find()
        .filter(Column::UserId.eq(user.user_id))
        .order_by_desc(Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(booking_from_entity)
        .collect();

    Ok(ApiResponse::data(BookingList { items }))
}

/// Admins and the booked provider may move a booking to any status; the
/// customer who made it may only cancel.
pub async fn update_booking_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateBookingStatusRequest,
) -> AppResult<ApiResponse<Booking>> {
    let status = payload
        .status
        .as_deref()
        .and_then(parse_enum::<BookingStatus>)
        .ok_or_else(|| AppError::BadRequest("Invalid status".into()))?;

    let existing = ServiceBookings::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".into()))?;

    if !user.is_admin() {
        let is_provider = find_provider(&state.orm, &existing.service_type, existing.service_provider_id)
            .await?
            .is_some_and(|p| p.user_id == user.user_id);
        let is_customer = existing.user_id == user.user_id;
        let allowed = is_provider || (is_customer && status == BookingStatus::Cancelled);
        if !allowed {
            return Err(AppError::Forbidden);
        }
    }

    let mut active: ActiveModel = existing.into();
    active.status = Set(status);
    active.updated_at = Set(Utc::now().into());
    let booking = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Booking status updated",
        booking_from_entity(booking),
        None,
    ))
}

pub(crate) fn booking_from_entity(model: BookingModel) -> Booking {
    Booking {
        id: model.id,
        user_id: model.user_id,
        service_type: model.service_type,
        service_provider_id: model.service_provider_id,
        booking_date: model.booking_date.with_timezone(&Utc),
        description: model.description,
        status: model.status,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
