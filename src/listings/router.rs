use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Deserializer};
use serde_json::json;

use super::catalog::{ListingCatalog, DEFAULT_FEATURED_COUNT};
use super::filter::{filter_listings, FilterCriteria};
use super::views::{card_views, ListingCardView, ListingDetailView};
use crate::map::MapView;

/// Query string accepted by the search and map endpoints.
///
/// Mirrors the site's URL parameters (`type`, `forSale`, `location`, ...).
/// Blank values are treated as absent.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingQuery {
    #[serde(default, rename = "type", deserialize_with = "blank_as_none")]
    pub property_type: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub for_sale: Option<bool>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub price_min: Option<u64>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub price_max: Option<u64>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub bedrooms: Option<u32>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub bathrooms: Option<u32>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub location: Option<String>,
}

impl From<ListingQuery> for FilterCriteria {
    fn from(query: ListingQuery) -> Self {
        FilterCriteria {
            for_sale: query.for_sale,
            category: query.property_type,
            price_min: query.price_min,
            price_max: query.price_max,
            min_bedrooms: query.bedrooms,
            min_bathrooms: query.bathrooms,
            location: query.location,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FeaturedQuery {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub count: Option<usize>,
}

fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Router exposing catalog browsing, search and the map projection.
pub fn listing_router(catalog: Arc<ListingCatalog>) -> Router {
    Router::new()
        .route("/api/v1/listings", get(search_handler))
        .route("/api/v1/listings/featured", get(featured_handler))
        .route("/api/v1/listings/buy", get(buy_handler))
        .route("/api/v1/listings/rent", get(rent_handler))
        .route("/api/v1/listings/:listing_id", get(detail_handler))
        .route("/api/v1/map", get(map_handler))
        .with_state(catalog)
}

pub(crate) async fn search_handler(
    State(catalog): State<Arc<ListingCatalog>>,
    Query(query): Query<ListingQuery>,
) -> Json<Vec<ListingCardView>> {
    let criteria = FilterCriteria::from(query);
    let matches = filter_listings(catalog.all(), &criteria);
    tracing::debug!(?criteria, matched = matches.len(), "listing search");
    Json(card_views(matches))
}

pub(crate) async fn featured_handler(
    State(catalog): State<Arc<ListingCatalog>>,
    Query(query): Query<FeaturedQuery>,
) -> Json<Vec<ListingCardView>> {
    let count = query.count.unwrap_or(DEFAULT_FEATURED_COUNT);
    Json(card_views(catalog.featured(count)))
}

pub(crate) async fn buy_handler(
    State(catalog): State<Arc<ListingCatalog>>,
) -> Json<Vec<ListingCardView>> {
    Json(card_views(catalog.by_type(true)))
}

pub(crate) async fn rent_handler(
    State(catalog): State<Arc<ListingCatalog>>,
) -> Json<Vec<ListingCardView>> {
    Json(card_views(catalog.by_type(false)))
}

pub(crate) async fn detail_handler(
    State(catalog): State<Arc<ListingCatalog>>,
    Path(listing_id): Path<String>,
) -> Response {
    match catalog.by_id(&listing_id) {
        Some(listing) => (StatusCode::OK, Json(ListingDetailView::from(listing))).into_response(),
        None => {
            let payload = json!({
                "error": "listing not found",
                "listing_id": listing_id,
                "back_path": "/properties",
            });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn map_handler(
    State(catalog): State<Arc<ListingCatalog>>,
    Query(query): Query<ListingQuery>,
) -> Json<MapView> {
    let criteria = FilterCriteria::from(query);
    let matches = filter_listings(catalog.all(), &criteria);
    Json(MapView::from_listings(matches))
}
