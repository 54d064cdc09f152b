use super::domain::{Listing, ListingId, PropertyCategory};
use serde::Serialize;

/// Formats an XOF amount with space-grouped thousands, e.g. `450 000 000 F CFA`.
pub fn format_price(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }
    format!("{grouped} F CFA")
}

/// Compact representation rendered in result grids and carousels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingCardView {
    pub id: ListingId,
    pub title: String,
    pub location: String,
    pub price: u64,
    pub price_label: String,
    pub category: PropertyCategory,
    pub category_label: &'static str,
    pub intent_label: &'static str,
    pub is_for_sale: bool,
    pub image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<u32>,
    pub detail_path: String,
}

impl From<&Listing> for ListingCardView {
    fn from(listing: &Listing) -> Self {
        Self {
            id: listing.id.clone(),
            title: listing.title.clone(),
            location: listing.location.clone(),
            price: listing.price,
            price_label: format_price(listing.price),
            category: listing.category,
            category_label: listing.category.label(),
            intent_label: listing.intent_label(),
            is_for_sale: listing.is_for_sale,
            image_url: listing.image_url.clone(),
            bedrooms: listing.bedrooms,
            bathrooms: listing.bathrooms,
            area: listing.area,
            detail_path: format!("/properties/{}", listing.id),
        }
    }
}

/// Labelled fact shown in the detail page feature grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingFeature {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingDetailView {
    #[serde(flatten)]
    pub card: ListingCardView,
    pub features: Vec<ListingFeature>,
    /// Where the contact form sends visitors back to.
    pub listing_kind_path: &'static str,
}

impl From<&Listing> for ListingDetailView {
    fn from(listing: &Listing) -> Self {
        let mut features = vec![ListingFeature {
            label: "Type",
            value: listing.category.label().to_string(),
        }];
        if let Some(bedrooms) = listing.bedrooms {
            features.push(ListingFeature {
                label: "Chambres",
                value: bedrooms.to_string(),
            });
        }
        if let Some(bathrooms) = listing.bathrooms {
            features.push(ListingFeature {
                label: "Salles de bain",
                value: bathrooms.to_string(),
            });
        }
        if let Some(area) = listing.area {
            features.push(ListingFeature {
                label: "Surface",
                value: format!("{area} m²"),
            });
        }

        Self {
            card: ListingCardView::from(listing),
            features,
            listing_kind_path: if listing.is_for_sale { "/buy" } else { "/rent" },
        }
    }
}

pub fn card_views<'a, I>(listings: I) -> Vec<ListingCardView>
where
    I: IntoIterator<Item = &'a Listing>,
{
    listings.into_iter().map(ListingCardView::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listings::ListingCatalog;

    #[test]
    fn prices_group_by_thousands() {
        assert_eq!(format_price(0), "0 F CFA");
        assert_eq!(format_price(999), "999 F CFA");
        assert_eq!(format_price(300_000), "300 000 F CFA");
        assert_eq!(format_price(450_000_000), "450 000 000 F CFA");
        assert_eq!(format_price(1_234_567), "1 234 567 F CFA");
    }

    #[test]
    fn detail_view_omits_missing_room_counts() {
        let catalog = ListingCatalog::seeded();
        let office = catalog.by_id("prop005").expect("office listed");
        let view = ListingDetailView::from(office);

        let labels: Vec<_> = view.features.iter().map(|f| f.label).collect();
        assert_eq!(labels, ["Type", "Surface"]);
        assert_eq!(view.card.intent_label, "À louer");
        assert_eq!(view.listing_kind_path, "/rent");

        let json = serde_json::to_value(&view.card).expect("serializes");
        assert!(json.get("bedrooms").is_none());
        assert_eq!(json["category_label"], "Commercial");
    }
}
