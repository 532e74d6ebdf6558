use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "processing")]
    Processing,
    #[sea_orm(string_value = "shipped")]
    Shipped,
    #[sea_orm(string_value = "delivered")]
    Delivered,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl OrderStatus {
    /// Persian label used in customer-facing messages.
    pub fn label_fa(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "در انتظار پرداخت",
            OrderStatus::Processing => "در حال پردازش",
            OrderStatus::Shipped => "ارسال شده",
            OrderStatus::Delivered => "تحویل داده شده",
            OrderStatus::Cancelled => "لغو شده",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "failed")]
    Failed,
    #[sea_orm(string_value = "refunded")]
    Refunded,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    #[sea_orm(string_value = "veterinarian")]
    Veterinarian,
    #[sea_orm(string_value = "transporter")]
    Transporter,
}

impl ServiceType {
    pub fn label_fa(&self) -> &'static str {
        match self {
            ServiceType::Veterinarian => "دامپزشک",
            ServiceType::Transporter => "اسب‌کش",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    #[sea_orm(string_value = "order")]
    Order,
    #[sea_orm(string_value = "booking")]
    Booking,
    #[sea_orm(string_value = "system")]
    System,
    #[sea_orm(string_value = "promotion")]
    Promotion,
}

/// Parses a wire value (`"shipped"`, `"veterinarian"`, ...) into one of the
/// string-backed enums above.
pub fn parse_enum<E>(value: &str) -> Option<E>
where
    E: ActiveEnum<Value = String>,
{
    E::try_from_value(&value.to_string()).ok()
}

/// Wire value of a string-backed enum.
pub fn enum_value<E>(value: &E) -> String
where
    E: ActiveEnum<Value = String>,
{
    value.to_value()
}
