use super::domain::{Listing, ListingId, PropertyCategory};

const UNSPLASH_PARAMS: &str = "?ixlib=rb-4.0.3&auto=format&fit=crop&q=80";

fn unsplash(photo: &str, width: u32) -> String {
    format!("https://images.unsplash.com/{photo}{UNSPLASH_PARAMS}&w={width}")
}

struct SeedRow {
    id: &'static str,
    title: &'static str,
    location: &'static str,
    price: u64,
    photo: &'static str,
    width: u32,
    category: PropertyCategory,
    bedrooms: Option<u32>,
    bathrooms: Option<u32>,
    area: u32,
    is_for_sale: bool,
}

/// The reference catalog published on the marketing site.
pub(crate) fn seed_listings() -> Vec<Listing> {
    seed_rows()
        .into_iter()
        .map(|row| Listing {
            id: ListingId::from(row.id),
            title: row.title.to_string(),
            location: row.location.to_string(),
            price: row.price,
            category: row.category,
            bedrooms: row.bedrooms,
            bathrooms: row.bathrooms,
            area: Some(row.area),
            is_for_sale: row.is_for_sale,
            image_url: unsplash(row.photo, row.width),
            coordinates: None,
        })
        .collect()
}

fn seed_rows() -> Vec<SeedRow> {
    vec![
        SeedRow {
            id: "prop001",
            title: "Villa de luxe avec vue sur la mer",
            location: "Baguida, Lomé",
            price: 450_000_000,
            photo: "photo-1564013799919-ab600027ffc6",
            width: 2070,
            category: PropertyCategory::Villa,
            bedrooms: Some(5),
            bathrooms: Some(4),
            area: 350,
            is_for_sale: true,
        },
        SeedRow {
            id: "prop002",
            title: "Appartement moderne au centre-ville",
            location: "Boulevard du Mono, Lomé",
            price: 175_000_000,
            photo: "photo-1522708323590-d24dbb6b0267",
            width: 2070,
            category: PropertyCategory::Apartment,
            bedrooms: Some(3),
            bathrooms: Some(2),
            area: 120,
            is_for_sale: true,
        },
        SeedRow {
            id: "prop003",
            title: "Maison familiale avec jardin",
            location: "Agoè, Lomé",
            price: 250_000_000,
            photo: "photo-1568605114967-8130f3a36994",
            width: 2070,
            category: PropertyCategory::House,
            bedrooms: Some(4),
            bathrooms: Some(3),
            area: 200,
            is_for_sale: true,
        },
        SeedRow {
            id: "prop004",
            title: "Appartement à louer près de l'université",
            location: "Tokoin, Lomé",
            price: 300_000,
            photo: "photo-1493809842364-78817add7ffb",
            width: 2070,
            category: PropertyCategory::Apartment,
            bedrooms: Some(2),
            bathrooms: Some(1),
            area: 75,
            is_for_sale: false,
        },
        SeedRow {
            id: "prop005",
            title: "Bureau commercial au quartier des affaires",
            location: "Quartier Administratif, Lomé",
            price: 500_000,
            photo: "photo-1497366811353-6870744d04b2",
            width: 2069,
            category: PropertyCategory::Commercial,
            bedrooms: None,
            bathrooms: None,
            area: 150,
            is_for_sale: false,
        },
        SeedRow {
            id: "prop006",
            title: "Terrain constructible avec vue panoramique",
            location: "Kpalimé",
            price: 85_000_000,
            photo: "photo-1500382017468-9049fed747ef",
            width: 2132,
            category: PropertyCategory::Land,
            bedrooms: None,
            bathrooms: None,
            area: 1200,
            is_for_sale: true,
        },
        SeedRow {
            id: "prop007",
            title: "Villa de vacances en bord de plage",
            location: "Aneho",
            price: 800_000,
            photo: "photo-1499793983690-e29da59ef1c2",
            width: 2070,
            category: PropertyCategory::Villa,
            bedrooms: Some(3),
            bathrooms: Some(2),
            area: 150,
            is_for_sale: false,
        },
        SeedRow {
            id: "prop008",
            title: "Maison traditionnelle rénovée",
            location: "Sokodé",
            price: 120_000_000,
            photo: "photo-1518780664697-55e3ad937233",
            width: 2065,
            category: PropertyCategory::House,
            bedrooms: Some(3),
            bathrooms: Some(2),
            area: 180,
            is_for_sale: true,
        },
    ]
}
