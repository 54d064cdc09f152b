use serde::{Deserialize, Serialize};

use crate::feedback::FieldError;
use crate::listings::{Listing, ListingCardView, ListingId, PropertyCategory};

pub const DEFAULT_LOCATION: &str = "Lomé, Togo";
pub const PREVIEW_TITLE: &str = "Your Property Title";
pub const PLACEHOLDER_IMAGE: &str = "https://images.unsplash.com/photo-1518780664697-55e3ad937233?ixlib=rb-4.0.3&auto=format&fit=crop&q=80&w=2065";
pub const MAX_IMAGES: usize = 10;

const TITLE_MIN: usize = 5;
const DESCRIPTION_MIN: usize = 20;

/// Values collected across the wizard pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingDraft {
    pub title: String,
    pub description: String,
    pub price: u64,
    pub category: Option<PropertyCategory>,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub area: u32,
    pub location: String,
    pub is_for_sale: bool,
    pub images: Vec<String>,
}

impl Default for ListingDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            price: 0,
            category: Some(PropertyCategory::House),
            bedrooms: 0,
            bathrooms: 0,
            area: 0,
            location: DEFAULT_LOCATION.to_string(),
            is_for_sale: true,
            images: Vec::new(),
        }
    }
}

impl ListingDraft {
    /// Card rendered next to the form, with placeholders for blank fields.
    pub fn preview(&self) -> ListingCardView {
        let title = self.title.trim();
        let location = self.location.trim();
        let listing = Listing {
            id: ListingId::from("preview"),
            title: if title.is_empty() { PREVIEW_TITLE } else { title }.to_string(),
            location: if location.is_empty() {
                DEFAULT_LOCATION
            } else {
                location
            }
            .to_string(),
            price: self.price,
            category: self.category.unwrap_or(PropertyCategory::House),
            bedrooms: Some(self.bedrooms),
            bathrooms: Some(self.bathrooms),
            area: Some(self.area),
            is_for_sale: self.is_for_sale,
            image_url: self
                .images
                .first()
                .cloned()
                .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
            coordinates: None,
        };
        ListingCardView::from(&listing)
    }

    /// Final checks applied when the listing is submitted. Title and
    /// description lengths count the text as typed, surrounding spaces included.
    pub fn validate_submission(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if self.title.chars().count() < TITLE_MIN {
            errors.push(FieldError::new(
                "title",
                "Title must be at least 5 characters",
            ));
        }
        if self.description.chars().count() < DESCRIPTION_MIN {
            errors.push(FieldError::new(
                "description",
                "Description must be at least 20 characters",
            ));
        }
        if self.price < 1 {
            errors.push(FieldError::new("price", "Price is required"));
        }
        if self.location.trim().is_empty() {
            errors.push(FieldError::new("location", "Location is required"));
        }
        if self.category.is_none() {
            errors.push(FieldError::new("category", "Property type is required"));
        }
        if self.area < 1 {
            errors.push(FieldError::new("area", "Area is required"));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Partial edit of a draft. Absent fields keep their value; an empty
/// `category` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<u64>,
    #[serde(default, alias = "propertyType")]
    pub category: Option<String>,
    #[serde(default)]
    pub bedrooms: Option<u32>,
    #[serde(default)]
    pub bathrooms: Option<u32>,
    #[serde(default)]
    pub area: Option<u32>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub is_for_sale: Option<bool>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
}

impl DraftUpdate {
    /// Applies the patch, leaving the draft untouched if any field is rejected.
    pub fn apply_to(&self, draft: &mut ListingDraft) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        let category = match self.category.as_deref().map(str::trim) {
            None => draft.category,
            Some("") => None,
            Some(name) => match name.parse::<PropertyCategory>() {
                Ok(category) => Some(category),
                Err(_) => {
                    errors.push(FieldError::new("category", "Unknown property type"));
                    draft.category
                }
            },
        };

        if let Some(images) = &self.images {
            if images.len() > MAX_IMAGES {
                errors.push(FieldError::new(
                    "images",
                    "You can upload up to 10 images",
                ));
            } else if images.iter().any(|image| url::Url::parse(image).is_err()) {
                errors.push(FieldError::new("images", "Please enter a valid URL"));
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        draft.category = category;
        if let Some(title) = &self.title {
            draft.title = title.clone();
        }
        if let Some(description) = &self.description {
            draft.description = description.clone();
        }
        if let Some(price) = self.price {
            draft.price = price;
        }
        if let Some(bedrooms) = self.bedrooms {
            draft.bedrooms = bedrooms;
        }
        if let Some(bathrooms) = self.bathrooms {
            draft.bathrooms = bathrooms;
        }
        if let Some(area) = self.area {
            draft.area = area;
        }
        if let Some(location) = &self.location {
            draft.location = location.clone();
        }
        if let Some(is_for_sale) = self.is_for_sale {
            draft.is_for_sale = is_for_sale;
        }
        if let Some(images) = &self.images {
            draft.images = images.clone();
        }
        Ok(())
    }
}
