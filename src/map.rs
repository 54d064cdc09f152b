//! Marker projection consumed by the front-end map widget.
//!
//! Positions come only from listing coordinates. The catalog carries no
//! geodata yet, so markers for such listings are emitted without a position
//! and flagged `geocoded: false` until a geocoder is wired in.

use crate::listings::{format_price, GeoPoint, Listing, ListingId};
use serde::Serialize;

/// Lomé city centre.
pub const DEFAULT_CENTER: GeoPoint = GeoPoint {
    latitude: 6.1271,
    longitude: 1.2227,
};
pub const DEFAULT_ZOOM: u8 = 13;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    Sale,
    Rent,
}

impl MarkerKind {
    pub const fn icon_color(self) -> &'static str {
        match self {
            Self::Sale => "green",
            Self::Rent => "blue",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub listing_id: ListingId,
    pub title: String,
    pub price_label: String,
    pub image_url: String,
    pub kind: MarkerKind,
    pub icon_color: &'static str,
    pub position: Option<GeoPoint>,
    pub geocoded: bool,
}

impl From<&Listing> for MapMarker {
    fn from(listing: &Listing) -> Self {
        let kind = if listing.is_for_sale {
            MarkerKind::Sale
        } else {
            MarkerKind::Rent
        };
        Self {
            listing_id: listing.id.clone(),
            title: listing.title.clone(),
            price_label: format_price(listing.price),
            image_url: listing.image_url.clone(),
            kind,
            icon_color: kind.icon_color(),
            position: listing.coordinates,
            geocoded: listing.coordinates.is_some(),
        }
    }
}

/// Emitted when a visitor clicks a marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerClick<'a> {
    pub listing: &'a Listing,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub center: GeoPoint,
    pub zoom: u8,
    pub markers: Vec<MapMarker>,
}

impl MapView {
    pub fn from_listings<'a, I>(listings: I) -> Self
    where
        I: IntoIterator<Item = &'a Listing>,
    {
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            markers: listings.into_iter().map(MapMarker::from).collect(),
        }
    }

    pub fn ungeocoded(&self) -> impl Iterator<Item = &MapMarker> {
        self.markers.iter().filter(|marker| !marker.geocoded)
    }
}

/// Resolves a marker click back to the listing it represents.
pub fn marker_click<'a>(listings: &'a [Listing], listing_id: &ListingId) -> Option<MarkerClick<'a>> {
    listings
        .iter()
        .find(|listing| &listing.id == listing_id)
        .map(|listing| MarkerClick { listing })
}
