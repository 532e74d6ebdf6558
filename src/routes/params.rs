use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::geo::{Coordinates, DEFAULT_RADIUS_KM};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;
        (page, per_page, offset)
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProductQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// Case-insensitive match on name or description.
    pub search: Option<String>,
    pub category_id: Option<Uuid>,
}

impl ProductQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PostQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub category_id: Option<Uuid>,
}

impl PostQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct BlogSearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SearchQuery {
    pub q: Option<String>,
    /// `blog`, `product`, `competition` or `all` (default).
    #[serde(rename = "type")]
    pub scope: Option<String>,
    /// Blog or product category slug, or a competition type.
    pub category: Option<String>,
    /// `date` (default) or `relevance`.
    pub sort: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl SearchQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProviderQuery {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Kilometres, inclusive. Defaults to 50 when an origin is given.
    pub radius: Option<f64>,
    pub region: Option<String>,
    /// Veterinarians only.
    pub specialization: Option<String>,
}

impl ProviderQuery {
    /// An origin needs both coordinates; a lone latitude or longitude is ignored.
    pub fn origin(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }

    pub fn radius_km(&self) -> f64 {
        self.radius
            .filter(|r| r.is_finite() && *r > 0.0)
            .unwrap_or(DEFAULT_RADIUS_KM)
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct NotificationQuery {
    pub limit: Option<u64>,
}

impl NotificationQuery {
    pub fn limit(&self) -> u64 {
        self.limit.unwrap_or(20).clamp(1, 100)
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CompetitionQuery {
    pub competition_type: Option<String>,
    pub is_international: Option<bool>,
    /// Competitions starting on or after this date.
    pub start_date: Option<NaiveDate>,
    /// Competitions ending on or before this date.
    pub end_date: Option<NaiveDate>,
}

impl CompetitionQuery {
    /// Stable cache-key fragment for this filter set.
    pub fn cache_fragment(&self) -> String {
        format!(
            "type={}&intl={}&from={}&to={}",
            self.competition_type.as_deref().unwrap_or(""),
            self.is_international
                .map(|b| b.to_string())
                .unwrap_or_default(),
            self.start_date.map(|d| d.to_string()).unwrap_or_default(),
            self.end_date.map(|d| d.to_string()).unwrap_or_default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_clamps_page_and_size() {
        let p = Pagination {
            page: Some(0),
            per_page: Some(500),
        };
        assert_eq!(p.normalize(), (1, 100, 0));
        assert_eq!(Pagination::default().normalize(), (1, 20, 0));
        let p = Pagination {
            page: Some(3),
            per_page: Some(10),
        };
        assert_eq!(p.normalize(), (3, 10, 20));
    }

    #[test]
    fn provider_origin_requires_both_coordinates() {
        let q = ProviderQuery {
            latitude: Some(35.7),
            ..Default::default()
        };
        assert!(q.origin().is_none());
        assert_eq!(q.radius_km(), DEFAULT_RADIUS_KM);

        let q = ProviderQuery {
            latitude: Some(35.7),
            longitude: Some(51.4),
            radius: Some(10.0),
            ..Default::default()
        };
        assert!(q.origin().is_some());
        assert_eq!(q.radius_km(), 10.0);
    }

    #[test]
    fn notification_limit_is_clamped() {
        assert_eq!(NotificationQuery { limit: None }.limit(), 20);
        assert_eq!(NotificationQuery { limit: Some(0) }.limit(), 1);
        assert_eq!(NotificationQuery { limit: Some(1000) }.limit(), 100);
    }
}
