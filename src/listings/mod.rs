//! Property catalog: storage, search predicate, presentation views and routes.

pub mod catalog;
pub mod domain;
pub mod filter;
pub mod router;
mod seed;
pub mod views;

pub use catalog::{CatalogError, ListingCatalog, DEFAULT_FEATURED_COUNT};
pub use domain::{GeoPoint, Listing, ListingId, PropertyCategory, UnknownCategory};
pub use filter::{filter_listings, Constraint, FilterCriteria};
pub use router::{listing_router, ListingQuery};
pub use views::{format_price, ListingCardView, ListingDetailView};
