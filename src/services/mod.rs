use sea_orm::{
    DbErr, EntityTrait, SqlErr,
    sea_query::{Expr, Func, IntoColumnRef, SimpleExpr},
};
use uuid::Uuid;

use crate::{
    entity::{Users, users::Model as UserModel},
    error::AppError,
    state::AppState,
};

pub mod blog_service;
pub mod booking_service;
pub mod competition_service;
pub mod notification_service;
pub mod order_service;
pub mod product_service;
pub mod provider_service;
pub mod push_service;
pub mod review_service;
pub mod search_service;

/// Recipient lookup for outbound e-mail.
pub(crate) async fn load_user(state: &AppState, user_id: Uuid) -> anyhow::Result<UserModel> {
    Users::find_by_id(user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("user {user_id} not found"))
}

/// A unique index rejected the write: report `message` as a conflict. Covers
/// the race where a concurrent insert wins between a pre-check and our insert.
pub(crate) fn unique_conflict(err: DbErr, message: &str) -> AppError {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        AppError::Conflict(message.into())
    } else {
        AppError::OrmError(err)
    }
}

/// Case-insensitive substring match that behaves the same on every backend.
pub(crate) fn contains_ci<C: IntoColumnRef>(column: C, needle: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column))).like(format!("%{}%", needle.to_lowercase()))
}

/// URL-safe slug: lowercase, runs of anything that is not a letter or digit
/// collapse into one `-`. Non-Latin letters are kept.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    for c in input.trim().chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("  Western Saddle -- Deluxe! "), "western-saddle-deluxe");
        assert_eq!(slugify("مسابقات پرش"), "مسابقات-پرش");
        assert_eq!(slugify("---"), "");
    }
}
