use super::domain::{GeoPoint, Listing, ListingId, PropertyCategory, UnknownCategory};
use super::seed::seed_listings;
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

/// Number of listings shown in the home page carousel.
pub const DEFAULT_FEATURED_COUNT: usize = 4;

#[derive(Debug)]
pub enum CatalogError {
    Io(std::io::Error),
    Csv(csv::Error),
    DuplicateId(ListingId),
    InvalidRow { line: u64, reason: String },
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Io(err) => write!(f, "failed to read listing file: {}", err),
            CatalogError::Csv(err) => write!(f, "invalid listing CSV data: {}", err),
            CatalogError::DuplicateId(id) => write!(f, "listing id {} appears more than once", id),
            CatalogError::InvalidRow { line, reason } => {
                write!(f, "listing row {} rejected: {}", line, reason)
            }
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Io(err) => Some(err),
            CatalogError::Csv(err) => Some(err),
            CatalogError::DuplicateId(_) | CatalogError::InvalidRow { .. } => None,
        }
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for CatalogError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Read-only listing store, loaded once at startup.
#[derive(Debug, Clone)]
pub struct ListingCatalog {
    listings: Vec<Listing>,
}

impl ListingCatalog {
    /// Builds a catalog, rejecting duplicate identifiers.
    pub fn new(listings: Vec<Listing>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(listings.len());
        for listing in &listings {
            if !seen.insert(listing.id.clone()) {
                return Err(CatalogError::DuplicateId(listing.id.clone()));
            }
        }
        Ok(Self { listings })
    }

    pub fn seeded() -> Self {
        Self {
            listings: seed_listings(),
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut listings = Vec::new();

        for (index, record) in csv_reader.deserialize::<ListingRow>().enumerate() {
            let row = record?;
            // header occupies line 1
            listings.push(row.into_listing(index as u64 + 2)?);
        }

        Self::new(listings)
    }

    pub fn all(&self) -> &[Listing] {
        &self.listings
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    /// First `count` listings in storage order, truncated when fewer exist.
    pub fn featured(&self, count: usize) -> &[Listing] {
        &self.listings[..count.min(self.listings.len())]
    }

    pub fn by_type(&self, for_sale: bool) -> Vec<&Listing> {
        self.listings
            .iter()
            .filter(|listing| listing.is_for_sale == for_sale)
            .collect()
    }

    pub fn by_id(&self, id: &str) -> Option<&Listing> {
        self.listings.iter().find(|listing| listing.id.as_str() == id)
    }
}

#[derive(Debug, Deserialize)]
struct ListingRow {
    id: String,
    title: String,
    location: String,
    price: u64,
    category: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    bedrooms: Option<u32>,
    #[serde(default, deserialize_with = "empty_as_none")]
    bathrooms: Option<u32>,
    #[serde(default, deserialize_with = "empty_as_none")]
    area: Option<u32>,
    is_for_sale: bool,
    image_url: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    latitude: Option<f64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    longitude: Option<f64>,
}

impl ListingRow {
    fn into_listing(self, line: u64) -> Result<Listing, CatalogError> {
        let category: PropertyCategory =
            self.category
                .parse()
                .map_err(|err: UnknownCategory| CatalogError::InvalidRow {
                    line,
                    reason: err.to_string(),
                })?;

        if self.id.is_empty() {
            return Err(CatalogError::InvalidRow {
                line,
                reason: "listing id is empty".to_string(),
            });
        }

        let coordinates = match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint {
                latitude,
                longitude,
            }),
            _ => None,
        };

        Ok(Listing {
            id: ListingId(self.id),
            title: self.title,
            location: self.location,
            price: self.price,
            category,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            area: self.area,
            is_for_sale: self.is_for_sale,
            image_url: self.image_url,
            coordinates,
        })
    }
}

fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const HEADER: &str =
        "id,title,location,price,category,bedrooms,bathrooms,area,is_for_sale,image_url,latitude,longitude\n";

    #[test]
    fn seeded_catalog_has_eight_unique_listings() {
        let catalog = ListingCatalog::seeded();
        assert_eq!(catalog.len(), 8);
        assert!(ListingCatalog::new(catalog.all().to_vec()).is_ok());
    }

    #[test]
    fn featured_truncates_to_available_listings() {
        let catalog = ListingCatalog::seeded();
        let featured = catalog.featured(DEFAULT_FEATURED_COUNT);
        let ids: Vec<_> = featured.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, ["prop001", "prop002", "prop003", "prop004"]);
        assert_eq!(catalog.featured(50).len(), 8);
        assert!(catalog.featured(0).is_empty());
    }

    #[test]
    fn by_type_partitions_sale_and_rent() {
        let catalog = ListingCatalog::seeded();
        let rentals: Vec<_> = catalog
            .by_type(false)
            .into_iter()
            .map(|l| l.id.as_str())
            .collect();
        assert_eq!(rentals, ["prop004", "prop005", "prop007"]);
        assert_eq!(catalog.by_type(true).len(), 5);
    }

    #[test]
    fn by_id_returns_none_for_unknown_listing() {
        let catalog = ListingCatalog::seeded();
        assert_eq!(
            catalog.by_id("prop006").map(|l| l.category),
            Some(PropertyCategory::Land)
        );
        assert!(catalog.by_id("prop999").is_none());
        assert!(catalog.by_id("").is_none());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut listings = ListingCatalog::seeded().all().to_vec();
        listings.push(listings[2].clone());
        match ListingCatalog::new(listings) {
            Err(CatalogError::DuplicateId(id)) => assert_eq!(id.as_str(), "prop003"),
            other => panic!("expected duplicate id error, got {other:?}"),
        }
    }

    #[test]
    fn csv_rows_load_with_optional_fields() {
        let data = format!(
            "{HEADER}a1,Studio,Bè,150000,Appartement,1,,30,false,https://img/a1,6.13,1.22\n\
             a2,Parcelle,Tsévié,9000000,land,,,600,true,https://img/a2,,\n"
        );
        let catalog = ListingCatalog::from_reader(Cursor::new(data)).expect("csv loads");
        assert_eq!(catalog.len(), 2);

        let studio = catalog.by_id("a1").expect("studio present");
        assert_eq!(studio.category, PropertyCategory::Apartment);
        assert_eq!(studio.bathrooms, None);
        assert!(studio.coordinates.is_some());

        let parcel = catalog.by_id("a2").expect("parcel present");
        assert_eq!(parcel.bedrooms, None);
        assert!(parcel.coordinates.is_none());
    }

    #[test]
    fn csv_rows_with_unknown_category_fail() {
        let data = format!("{HEADER}x,Castle,Kara,1,castle,,,,true,https://img/x,,\n");
        match ListingCatalog::from_reader(Cursor::new(data)) {
            Err(CatalogError::InvalidRow { line, reason }) => {
                assert_eq!(line, 2);
                assert!(reason.contains("castle"));
            }
            other => panic!("expected invalid row, got {other:?}"),
        }
    }
}
