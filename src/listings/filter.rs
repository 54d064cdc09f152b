//! Search predicate over the listing catalog.
//!
//! Every constraint is a standalone function so that a criteria value can be
//! relaxed one constraint at a time without touching the others.

use super::domain::Listing;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PRICE_MIN: u64 = 0;
pub const DEFAULT_PRICE_MAX: u64 = u64::MAX;

/// User supplied constraints for a single search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub for_sale: Option<bool>,
    pub category: Option<String>,
    pub price_min: Option<u64>,
    pub price_max: Option<u64>,
    pub min_bedrooms: Option<u32>,
    pub min_bathrooms: Option<u32>,
    pub location: Option<String>,
}

/// Individual constraints that make up a [`FilterCriteria`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    Intent,
    Category,
    PriceRange,
    Bedrooms,
    Bathrooms,
    Location,
}

impl Constraint {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::Intent,
            Self::Category,
            Self::PriceRange,
            Self::Bedrooms,
            Self::Bathrooms,
            Self::Location,
        ]
    }

    pub fn check(self, listing: &Listing, criteria: &FilterCriteria) -> bool {
        match self {
            Self::Intent => matches_intent(listing, criteria.for_sale),
            Self::Category => matches_category(listing, criteria.category.as_deref()),
            Self::PriceRange => within_price(listing, criteria.price_min, criteria.price_max),
            Self::Bedrooms => meets_minimum(listing.bedrooms, criteria.min_bedrooms),
            Self::Bathrooms => meets_minimum(listing.bathrooms, criteria.min_bathrooms),
            Self::Location => matches_location(listing, criteria.location.as_deref()),
        }
    }
}

impl FilterCriteria {
    pub fn for_sale(for_sale: bool) -> Self {
        Self {
            for_sale: Some(for_sale),
            ..Self::default()
        }
    }

    pub fn price_bounds(&self) -> (u64, u64) {
        (
            self.price_min.unwrap_or(DEFAULT_PRICE_MIN),
            self.price_max.unwrap_or(DEFAULT_PRICE_MAX),
        )
    }

    /// Returns a copy with one constraint cleared.
    pub fn without(&self, constraint: Constraint) -> Self {
        let mut relaxed = self.clone();
        match constraint {
            Constraint::Intent => relaxed.for_sale = None,
            Constraint::Category => relaxed.category = None,
            Constraint::PriceRange => {
                relaxed.price_min = None;
                relaxed.price_max = None;
            }
            Constraint::Bedrooms => relaxed.min_bedrooms = None,
            Constraint::Bathrooms => relaxed.min_bathrooms = None,
            Constraint::Location => relaxed.location = None,
        }
        relaxed
    }

    pub fn matches(&self, listing: &Listing) -> bool {
        Constraint::ordered()
            .into_iter()
            .all(|constraint| constraint.check(listing, self))
    }
}

/// Ordered subsequence of `listings` satisfying every constraint.
pub fn filter_listings<'a, I>(listings: I, criteria: &FilterCriteria) -> Vec<&'a Listing>
where
    I: IntoIterator<Item = &'a Listing>,
{
    listings
        .into_iter()
        .filter(|listing| criteria.matches(listing))
        .collect()
}

pub fn matches_intent(listing: &Listing, for_sale: Option<bool>) -> bool {
    for_sale.map_or(true, |wanted| listing.is_for_sale == wanted)
}

pub fn matches_category(listing: &Listing, category: Option<&str>) -> bool {
    match non_blank(category) {
        Some(name) => listing.category.matches_name(name),
        None => true,
    }
}

pub fn within_price(listing: &Listing, min: Option<u64>, max: Option<u64>) -> bool {
    let min = min.unwrap_or(DEFAULT_PRICE_MIN);
    let max = max.unwrap_or(DEFAULT_PRICE_MAX);
    listing.price >= min && listing.price <= max
}

/// Listings lacking the field never satisfy a requested minimum.
pub fn meets_minimum(value: Option<u32>, minimum: Option<u32>) -> bool {
    match minimum {
        Some(minimum) => value.is_some_and(|value| value >= minimum),
        None => true,
    }
}

pub fn matches_location(listing: &Listing, needle: Option<&str>) -> bool {
    match non_blank(needle) {
        Some(needle) => listing
            .location
            .to_lowercase()
            .contains(&needle.to_lowercase()),
        None => true,
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listings::ListingCatalog;

    fn ids(listings: &[&Listing]) -> Vec<String> {
        listings.iter().map(|l| l.id.0.clone()).collect()
    }

    #[test]
    fn empty_criteria_return_whole_catalog_in_order() {
        let catalog = ListingCatalog::seeded();
        let result = filter_listings(catalog.all(), &FilterCriteria::default());
        assert_eq!(result.len(), catalog.len());
        assert!(result
            .iter()
            .zip(catalog.all())
            .all(|(found, stored)| found.id == stored.id));
    }

    #[test]
    fn sale_listings_within_price_band() {
        let catalog = ListingCatalog::seeded();
        let criteria = FilterCriteria {
            for_sale: Some(true),
            price_min: Some(100_000_000),
            price_max: Some(500_000_000),
            ..FilterCriteria::default()
        };
        let result = filter_listings(catalog.all(), &criteria);
        assert_eq!(ids(&result), ["prop001", "prop002", "prop003", "prop008"]);
    }

    #[test]
    fn price_bounds_are_inclusive() {
        let catalog = ListingCatalog::seeded();
        let criteria = FilterCriteria {
            price_min: Some(120_000_000),
            price_max: Some(250_000_000),
            ..FilterCriteria::default()
        };
        let result = filter_listings(catalog.all(), &criteria);
        assert_eq!(ids(&result), ["prop002", "prop003", "prop008"]);
    }

    #[test]
    fn category_matches_slug_or_label_case_insensitively() {
        let catalog = ListingCatalog::seeded();
        for name in ["house", "MAISON", " maison "] {
            let criteria = FilterCriteria {
                category: Some(name.to_string()),
                ..FilterCriteria::default()
            };
            assert_eq!(
                ids(&filter_listings(catalog.all(), &criteria)),
                ["prop003", "prop008"]
            );
        }
    }

    #[test]
    fn blank_strings_impose_no_constraint() {
        let catalog = ListingCatalog::seeded();
        let criteria = FilterCriteria {
            category: Some(String::new()),
            location: Some("  ".to_string()),
            ..FilterCriteria::default()
        };
        assert_eq!(filter_listings(catalog.all(), &criteria).len(), 8);
    }

    #[test]
    fn minimum_rooms_exclude_listings_without_the_field() {
        let catalog = ListingCatalog::seeded();
        let criteria = FilterCriteria {
            min_bedrooms: Some(0),
            ..FilterCriteria::default()
        };
        let result = filter_listings(catalog.all(), &criteria);
        assert!(!ids(&result).contains(&"prop005".to_string()));
        assert!(!ids(&result).contains(&"prop006".to_string()));
        assert_eq!(result.len(), 6);

        let criteria = FilterCriteria {
            min_bathrooms: Some(3),
            ..FilterCriteria::default()
        };
        assert_eq!(
            ids(&filter_listings(catalog.all(), &criteria)),
            ["prop001", "prop003"]
        );
    }

    #[test]
    fn location_is_a_case_insensitive_substring() {
        let catalog = ListingCatalog::seeded();
        let criteria = FilterCriteria {
            location: Some("LOMÉ".to_string()),
            for_sale: Some(false),
            ..FilterCriteria::default()
        };
        assert_eq!(
            ids(&filter_listings(catalog.all(), &criteria)),
            ["prop004", "prop005"]
        );
    }

    #[test]
    fn results_satisfy_each_constraint_and_survive_relaxation() {
        let catalog = ListingCatalog::seeded();
        let criteria = FilterCriteria {
            for_sale: Some(true),
            category: Some("maison".to_string()),
            price_min: Some(100_000_000),
            price_max: Some(300_000_000),
            min_bedrooms: Some(3),
            min_bathrooms: Some(2),
            location: Some("o".to_string()),
        };
        let result = filter_listings(catalog.all(), &criteria);
        assert!(!result.is_empty());

        for listing in &result {
            for constraint in Constraint::ordered() {
                assert!(constraint.check(listing, &criteria));
                let relaxed = criteria.without(constraint);
                let widened = filter_listings(catalog.all(), &relaxed);
                assert!(
                    widened.iter().any(|found| found.id == listing.id),
                    "{:?} dropped after relaxing {:?}",
                    listing.id,
                    constraint
                );
            }
        }
    }
}
