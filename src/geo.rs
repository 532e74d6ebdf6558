use serde::Deserialize;
use utoipa::ToSchema;

pub const EARTH_RADIUS_KM: f64 = 6371.0;
pub const DEFAULT_RADIUS_KM: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, ToSchema)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Great-circle distance in kilometres (spherical law of cosines).
pub fn distance_km(from: Coordinates, to: Coordinates) -> f64 {
    if from == to {
        return 0.0;
    }
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let delta_lng = (to.longitude - from.longitude).to_radians();

    let cos_angle = lat1.cos() * lat2.cos() * delta_lng.cos() + lat1.sin() * lat2.sin();
    // rounding can push identical points just above 1.0
    EARTH_RADIUS_KM * cos_angle.clamp(-1.0, 1.0).acos()
}

/// Something that can be ranked by proximity.
pub trait Locatable {
    fn coordinates(&self) -> Option<Coordinates>;
    fn rating(&self) -> f64;
    fn review_count(&self) -> i32;
}

/// Orders `items` for display.
///
/// With an origin: items without coordinates or farther than `radius_km` are
/// dropped, the rest are sorted by ascending distance, then descending rating.
/// Without an origin: sorted by descending rating, then descending review count.
/// The returned distance is `None` exactly when no origin was given.
pub fn rank_by_proximity<T: Locatable>(
    items: Vec<T>,
    origin: Option<Coordinates>,
    radius_km: f64,
) -> Vec<(T, Option<f64>)> {
    match origin {
        Some(origin) => {
            let mut ranked: Vec<(T, Option<f64>)> = items
                .into_iter()
                .filter_map(|item| {
                    let distance = distance_km(origin, item.coordinates()?);
                    (distance <= radius_km).then_some((item, Some(distance)))
                })
                .collect();
            ranked.sort_by(|(a, da), (b, db)| {
                da.unwrap_or(f64::MAX)
                    .total_cmp(&db.unwrap_or(f64::MAX))
                    .then_with(|| b.rating().total_cmp(&a.rating()))
            });
            ranked
        }
        None => {
            let mut ranked: Vec<(T, Option<f64>)> =
                items.into_iter().map(|item| (item, None)).collect();
            ranked.sort_by(|(a, _), (b, _)| {
                b.rating()
                    .total_cmp(&a.rating())
                    .then_with(|| b.review_count().cmp(&a.review_count()))
            });
            ranked
        }
    }
}
