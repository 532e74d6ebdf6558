use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Competition, CompetitionResult};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateCompetitionRequest {
    pub title: String,
    pub description: Option<String>,
    pub competition_type: String,
    pub location: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub registration_deadline: Option<NaiveDate>,
    pub prize_info: Option<String>,
    pub image_url: Option<String>,
    pub is_international: Option<bool>,
    pub is_published: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CompetitionList {
    pub items: Vec<Competition>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateCompetitionRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub competition_type: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub registration_deadline: Option<NaiveDate>,
    pub prize_info: Option<String>,
    pub image_url: Option<String>,
    pub is_international: Option<bool>,
    pub is_published: Option<bool>,
}

impl UpdateCompetitionRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.competition_type.is_none()
            && self.location.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.registration_deadline.is_none()
            && self.prize_info.is_none()
            && self.image_url.is_none()
            && self.is_international.is_none()
            && self.is_published.is_none()
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AddResultRequest {
    pub position: i32,
    pub participant_name: String,
    pub horse_name: Option<String>,
    pub score: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ResultList {
    pub items: Vec<CompetitionResult>,
}
