use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Booking, Review, Transporter, Veterinarian};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterVeterinarianRequest {
    pub full_name: String,
    pub specialization: Option<String>,
    pub region: Option<String>,
    pub phone: String,
    pub email: Option<String>,
    pub resume: Option<String>,
    pub image_url: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateVeterinarianRequest {
    pub full_name: Option<String>,
    pub specialization: Option<String>,
    pub region: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub resume: Option<String>,
    pub image_url: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
}

impl UpdateVeterinarianRequest {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.specialization.is_none()
            && self.region.is_none()
            && self.phone.is_none()
            && self.email.is_none()
            && self.resume.is_none()
            && self.image_url.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
            && self.address.is_none()
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterTransporterRequest {
    pub company_name: String,
    pub contact_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub region: Option<String>,
    pub equipment: Option<String>,
    pub transport_info: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateTransporterRequest {
    pub company_name: Option<String>,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub region: Option<String>,
    pub equipment: Option<String>,
    pub transport_info: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
}

impl UpdateTransporterRequest {
    pub fn is_empty(&self) -> bool {
        self.company_name.is_none()
            && self.contact_name.is_none()
            && self.phone.is_none()
            && self.email.is_none()
            && self.region.is_none()
            && self.equipment.is_none()
            && self.transport_info.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
            && self.address.is_none()
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateBookingRequest {
    /// `veterinarian` or `transporter`.
    pub service_type: String,
    pub service_provider_id: Uuid,
    pub booking_date: DateTime<Utc>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateBookingStatusRequest {
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateReviewRequest {
    pub booking_id: Uuid,
    pub service_provider_id: Uuid,
    pub service_type: String,
    pub rating: i32,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VeterinarianList {
    pub items: Vec<Veterinarian>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransporterList {
    pub items: Vec<Transporter>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingList {
    pub items: Vec<Booking>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewList {
    pub items: Vec<Review>,
}
