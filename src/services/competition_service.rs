use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    cache::{get_json, set_json},
    dto::competitions::{
        AddResultRequest, CompetitionList, CreateCompetitionRequest, ResultList,
        UpdateCompetitionRequest,
    },
    entity::{
        competition_results::{
            ActiveModel as ResultActive, Column as ResultCol, Entity as CompetitionResults,
            Model as ResultModel,
        },
        competitions::{ActiveModel, Column, Entity as Competitions, Model as CompetitionModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Competition, CompetitionResult},
    response::ApiResponse,
    routes::params::CompetitionQuery,
    services::{slugify, unique_conflict},
    state::AppState,
};

const CACHE_TTL_SECS: u64 = 300;
const LIST_PREFIX: &str = "competitions:list:";
const SLUG_PREFIX: &str = "competitions:slug:";
const DUPLICATE_COMPETITION: &str = "Competition with this title already exists";

pub async fn list_competitions(
    state: &AppState,
    query: CompetitionQuery,
) -> AppResult<ApiResponse<CompetitionList>> {
    let key = format!("{LIST_PREFIX}{}", query.cache_fragment());
    if let Some(cached) = get_json::<CompetitionList>(state.cache.as_ref(), &key).await {
        return Ok(ApiResponse::data(cached));
    }

    let mut condition = Condition::all().add(Column::IsPublished.eq(true));
    if let Some(kind) = query.competition_type.as_deref().filter(|k| !k.is_empty()) {
        condition = condition.add(Column::CompetitionType.eq(kind));
    }
    if let Some(international) = query.is_international {
        condition = condition.add(Column::IsInternational.eq(international));
    }
    if let Some(from) = query.start_date {
        condition = condition.add(Column::StartDate.gte(from));
    }
    if let Some(to) = query.end_date {
        condition = condition.add(Column::EndDate.lte(to));
    }

    let items = Competitions::find()
        .filter(condition)
        .order_by_asc(Column::StartDate)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(competition_from_entity)
        .collect();

    let list = CompetitionList { items };
    set_json(state.cache.as_ref(), &key, &list, CACHE_TTL_SECS).await;
    Ok(ApiResponse::data(list))
}

pub async fn get_competition(state: &AppState, slug: &str) -> AppResult<ApiResponse<Competition>> {
    let key = format!("{SLUG_PREFIX}{slug}");
    if let Some(cached) = get_json::<Competition>(state.cache.as_ref(), &key).await {
        return Ok(ApiResponse::data(cached));
    }

    let competition = Competitions::find()
        .filter(
            Condition::all()
                .add(Column::Slug.eq(slug))
                .add(Column::IsPublished.eq(true)),
        )
        .one(&state.orm)
        .await?
        .map(competition_from_entity)
        .ok_or_else(|| AppError::NotFound("Competition not found".into()))?;

    set_json(state.cache.as_ref(), &key, &competition, CACHE_TTL_SECS).await;
    Ok(ApiResponse::data(competition))
}

pub async fn create_competition(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCompetitionRequest,
) -> AppResult<ApiResponse<Competition>> {
    ensure_admin(user)?;

    let title = payload.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::BadRequest("Title is required".into()));
    }
    if payload.competition_type.trim().is_empty() {
        return Err(AppError::BadRequest("Competition type is required".into()));
    }
    if payload.end_date.is_some_and(|end| end < payload.start_date) {
        return Err(AppError::BadRequest("End date must not precede start date".into()));
    }

    let slug = slugify(&title);
    if slug.is_empty() {
        return Err(AppError::BadRequest("Title must contain letters or digits".into()));
    }
    let taken = Competitions::find()
        .filter(Column::Slug.eq(slug.clone()))
        .count(&state.orm)
        .await?;
    if taken > 0 {
        return Err(AppError::Conflict(DUPLICATE_COMPETITION.into()));
    }

    let now = Utc::now();
    let competition = ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(title),
        slug: Set(slug),
        description: Set(payload.description),
        competition_type: Set(payload.competition_type),
        location: Set(payload.location),
        start_date: Set(payload.start_date),
        end_date: Set(payload.end_date),
        registration_deadline: Set(payload.registration_deadline),
        prize_info: Set(payload.prize_info),
        image_url: Set(payload.image_url),
        is_international: Set(payload.is_international.unwrap_or(false)),
        is_published: Set(payload.is_published.unwrap_or(true)),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await
    .map_err(|err| unique_conflict(err, DUPLICATE_COMPETITION))?;

    state.cache.delete_prefix(LIST_PREFIX).await;
    tracing::info!(competition_id = %competition.id, slug = %competition.slug, "competition created");

    Ok(ApiResponse::success(
        "Competition created successfully",
        competition_from_entity(competition),
        None,
    ))
}

pub async fn update_competition(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCompetitionRequest,
) -> AppResult<ApiResponse<Competition>> {
    ensure_admin(user)?;
    if payload.is_empty() {
        return Err(AppError::BadRequest("No fields to update".into()));
    }

    let existing = find_competition(state, id).await?;
    let old_slug = existing.slug.clone();

    let start = payload.start_date.unwrap_or(existing.start_date);
    let end = payload.end_date.or(existing.end_date);
    if end.is_some_and(|end| end < start) {
        return Err(AppError::BadRequest("End date must not precede start date".into()));
    }

    let mut active: ActiveModel = existing.into();
    if let Some(title) = payload.title {
        let title = title.trim().to_string();
        let slug = slugify(&title);
        if slug.is_empty() {
            return Err(AppError::BadRequest("Title must contain letters or digits".into()));
        }
        if slug != old_slug {
            let taken = Competitions::find()
                .filter(Column::Slug.eq(slug.clone()))
                .count(&state.orm)
                .await?;
            if taken > 0 {
                return Err(AppError::Conflict(DUPLICATE_COMPETITION.into()));
            }
        }
        active.title = Set(title);
        active.slug = Set(slug);
    }
    if let Some(kind) = payload.competition_type {
        if kind.trim().is_empty() {
            return Err(AppError::BadRequest("Competition type is required".into()));
        }
        active.competition_type = Set(kind);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(location) = payload.location {
        active.location = Set(Some(location));
    }
    if let Some(start_date) = payload.start_date {
        active.start_date = Set(start_date);
    }
    if let Some(end_date) = payload.end_date {
        active.end_date = Set(Some(end_date));
    }
    if let Some(deadline) = payload.registration_deadline {
        active.registration_deadline = Set(Some(deadline));
    }
    if let Some(prize_info) = payload.prize_info {
        active.prize_info = Set(Some(prize_info));
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(Some(image_url));
    }
    if let Some(international) = payload.is_international {
        active.is_international = Set(international);
    }
    if let Some(published) = payload.is_published {
        active.is_published = Set(published);
    }
    active.updated_at = Set(Utc::now().into());

    let competition = active
        .update(&state.orm)
        .await
        .map_err(|err| unique_conflict(err, DUPLICATE_COMPETITION))?;

    invalidate(state, &old_slug).await;
    if competition.slug != old_slug {
        invalidate(state, &competition.slug).await;
    }

    Ok(ApiResponse::success(
        "Competition updated successfully",
        competition_from_entity(competition),
        None,
    ))
}

/// Removes the competition together with its results.
pub async fn delete_competition(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<()>> {
    ensure_admin(user)?;
    let existing = find_competition(state, id).await?;

    // Dropping the transaction on an early return rolls both deletes back.
    let txn = state.orm.begin().await?;
    CompetitionResults::delete_many()
        .filter(ResultCol::CompetitionId.eq(id))
        .exec(&txn)
        .await?;
    Competitions::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    invalidate(state, &existing.slug).await;
    tracing::info!(competition_id = %id, "competition deleted");

    Ok(ApiResponse::message("Competition deleted successfully"))
}

/// Standings, winner first.
pub async fn list_results(
    state: &AppState,
    competition_id: Uuid,
) -> AppResult<ApiResponse<ResultList>> {
    find_competition(state, competition_id).await?;

    let items = CompetitionResults::find()
        .filter(ResultCol::CompetitionId.eq(competition_id))
        .order_by_asc(ResultCol::Position)
        .order_by_asc(ResultCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(result_from_entity)
        .collect();

    Ok(ApiResponse::data(ResultList { items }))
}

pub async fn add_result(
    state: &AppState,
    user: &AuthUser,
    competition_id: Uuid,
    payload: AddResultRequest,
) -> AppResult<ApiResponse<CompetitionResult>> {
    ensure_admin(user)?;
    if payload.position < 1 {
        return Err(AppError::BadRequest("Position must be at least 1".into()));
    }
    let participant = payload.participant_name.trim().to_string();
    if participant.is_empty() {
        return Err(AppError::BadRequest("Participant name is required".into()));
    }
    if payload.score.is_some_and(|score| !score.is_finite()) {
        return Err(AppError::BadRequest("Score must be a number".into()));
    }
    find_competition(state, competition_id).await?;

    let result = ResultActive {
        id: Set(Uuid::new_v4()),
        competition_id: Set(competition_id),
        position: Set(payload.position),
        participant_name: Set(participant),
        horse_name: Set(payload.horse_name),
        score: Set(payload.score),
        notes: Set(payload.notes),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Result added successfully",
        result_from_entity(result),
        None,
    ))
}

async fn find_competition(state: &AppState, id: Uuid) -> AppResult<CompetitionModel> {
    Competitions::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Competition not found".into()))
}

async fn invalidate(state: &AppState, slug: &str) {
    state.cache.delete(&format!("{SLUG_PREFIX}{slug}")).await;
    state.cache.delete_prefix(LIST_PREFIX).await;
}

pub(crate) fn competition_from_entity(model: CompetitionModel) -> Competition {
    Competition {
        id: model.id,
        title: model.title,
        slug: model.slug,
        description: model.description,
        competition_type: model.competition_type,
        location: model.location,
        start_date: model.start_date,
        end_date: model.end_date,
        registration_deadline: model.registration_deadline,
        prize_info: model.prize_info,
        image_url: model.image_url,
        is_international: model.is_international,
        is_published: model.is_published,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn result_from_entity(model: ResultModel) -> CompetitionResult {
    CompetitionResult {
        id: model.id,
        competition_id: model.competition_id,
        position: model.position,
        participant_name: model.participant_name,
        horse_name: model.horse_name,
        score: model.score,
        notes: model.notes,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
