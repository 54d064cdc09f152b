use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier wrapper for catalog listings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(pub String);

impl ListingId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ListingId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyCategory {
    House,
    Apartment,
    Villa,
    Land,
    Commercial,
}

impl PropertyCategory {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::House,
            Self::Apartment,
            Self::Villa,
            Self::Land,
            Self::Commercial,
        ]
    }

    /// Stable slug used in query strings and CSV files.
    pub const fn slug(self) -> &'static str {
        match self {
            Self::House => "house",
            Self::Apartment => "apartment",
            Self::Villa => "villa",
            Self::Land => "land",
            Self::Commercial => "commercial",
        }
    }

    /// Display label shown on cards and badges.
    pub const fn label(self) -> &'static str {
        match self {
            Self::House => "Maison",
            Self::Apartment => "Appartement",
            Self::Villa => "Villa",
            Self::Land => "Terrain",
            Self::Commercial => "Commercial",
        }
    }

    /// Case-insensitive match against either the slug or the display label.
    pub fn matches_name(self, name: &str) -> bool {
        let name = name.trim();
        self.slug().eq_ignore_ascii_case(name) || self.label().eq_ignore_ascii_case(name)
    }
}

impl fmt::Display for PropertyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown property category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for PropertyCategory {
    type Err = UnknownCategory;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ordered()
            .into_iter()
            .find(|category| category.matches_name(value))
            .ok_or_else(|| UnknownCategory(value.trim().to_string()))
    }
}

/// WGS84 position of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// A single property record offered for sale or rent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub title: String,
    pub location: String,
    /// Whole XOF francs; the currency has no minor unit.
    pub price: u64,
    pub category: PropertyCategory,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    /// Square meters.
    pub area: Option<u32>,
    pub is_for_sale: bool,
    pub image_url: String,
    #[serde(default)]
    pub coordinates: Option<GeoPoint>,
}

impl Listing {
    pub fn intent_label(&self) -> &'static str {
        if self.is_for_sale {
            "À vendre"
        } else {
            "À louer"
        }
    }
}
