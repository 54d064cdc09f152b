use crate::infra::{InMemoryDraftRepository, InMemoryIdentity, InMemoryListingSubmitter};
use crate::server::load_catalog;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use togo_estates::auth::{AuthSession, IdentityConnector, LoginForm, RegistrationForm};
use togo_estates::config::CatalogConfig;
use togo_estates::error::AppError;
use togo_estates::listings::{
    filter_listings, FilterCriteria, ListingCardView, ListingCatalog, ListingDetailView,
    DEFAULT_FEATURED_COUNT,
};
use togo_estates::map::MapView;
use togo_estates::wizard::{DraftUpdate, ListingWizardService, StepMove, WizardStep};

#[derive(Args, Debug, Default)]
pub(crate) struct CatalogArgs {
    /// Listing CSV to load instead of the built-in catalog (falls back to LISTINGS_CSV)
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
}

impl CatalogArgs {
    fn load(self) -> Result<ListingCatalog, AppError> {
        let listings_csv = self
            .csv
            .or_else(|| std::env::var_os("LISTINGS_CSV").map(PathBuf::from));
        load_catalog(&CatalogConfig { listings_csv })
    }
}

#[derive(Args, Debug, Default)]
pub(crate) struct SearchArgs {
    #[command(flatten)]
    pub(crate) catalog: CatalogArgs,
    /// Property type (house, apartment, villa, land, commercial or the French label)
    #[arg(long = "type")]
    pub(crate) property_type: Option<String>,
    /// Only listings for sale
    #[arg(long, conflicts_with = "rent")]
    pub(crate) sale: bool,
    /// Only listings for rent
    #[arg(long)]
    pub(crate) rent: bool,
    /// Minimum price in F CFA
    #[arg(long)]
    pub(crate) price_min: Option<u64>,
    /// Maximum price in F CFA
    #[arg(long)]
    pub(crate) price_max: Option<u64>,
    /// Minimum number of bedrooms
    #[arg(long)]
    pub(crate) bedrooms: Option<u32>,
    /// Minimum number of bathrooms
    #[arg(long)]
    pub(crate) bathrooms: Option<u32>,
    /// Case-insensitive location fragment
    #[arg(long)]
    pub(crate) location: Option<String>,
    /// Also print the map markers for the results
    #[arg(long)]
    pub(crate) map: bool,
}

impl SearchArgs {
    fn criteria(&self) -> FilterCriteria {
        let for_sale = match (self.sale, self.rent) {
            (true, _) => Some(true),
            (false, true) => Some(false),
            (false, false) => None,
        };
        FilterCriteria {
            for_sale,
            category: self.property_type.clone(),
            price_min: self.price_min,
            price_max: self.price_max,
            min_bedrooms: self.bedrooms,
            min_bathrooms: self.bathrooms,
            location: self.location.clone(),
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct ShowArgs {
    #[command(flatten)]
    pub(crate) catalog: CatalogArgs,
    /// Listing id, e.g. prop001
    pub(crate) id: String,
}

#[derive(Args, Debug, Default)]
pub(crate) struct FeaturedArgs {
    #[command(flatten)]
    pub(crate) catalog: CatalogArgs,
    /// Number of listings to show
    #[arg(long, default_value_t = DEFAULT_FEATURED_COUNT)]
    pub(crate) count: usize,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Skip the listing wizard portion of the demo.
    #[arg(long)]
    pub(crate) skip_wizard: bool,
}

fn print_card(card: &ListingCardView) {
    println!(
        "- {} | {} | {} | {} | {} ({})",
        card.id, card.title, card.location, card.price_label, card.category_label, card.intent_label
    );
}

pub(crate) fn run_search(args: SearchArgs) -> Result<(), AppError> {
    let criteria = args.criteria();
    let show_map = args.map;
    let catalog = args.catalog.load()?;

    let matches = filter_listings(catalog.all(), &criteria);
    println!("{} propriétés trouvées", matches.len());
    for listing in &matches {
        print_card(&ListingCardView::from(*listing));
    }

    if show_map {
        let view = MapView::from_listings(matches);
        println!(
            "\nMap centred on ({:.4}, {:.4}) zoom {}",
            view.center.latitude, view.center.longitude, view.zoom
        );
        let ungeocoded = view.ungeocoded().count();
        if ungeocoded > 0 {
            println!("  {ungeocoded} listing(s) have no coordinates and are not placed");
        }
    }
    Ok(())
}

pub(crate) fn run_show(args: ShowArgs) -> Result<(), AppError> {
    let catalog = args.catalog.load()?;
    match catalog.by_id(&args.id) {
        Some(listing) => {
            let detail = ListingDetailView::from(listing);
            println!("{}", detail.card.title);
            println!("{} | {}", detail.card.location, detail.card.price_label);
            for feature in &detail.features {
                println!("  {}: {}", feature.label, feature.value);
            }
            println!("  Image: {}", detail.card.image_url);
        }
        None => println!("Propriété non trouvée: {}", args.id),
    }
    Ok(())
}

pub(crate) fn run_featured(args: FeaturedArgs) -> Result<(), AppError> {
    let catalog = args.catalog.load()?;
    for listing in catalog.featured(args.count) {
        print_card(&ListingCardView::from(listing));
    }
    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    println!("Togo Estates demo");

    let catalog = ListingCatalog::seeded();
    let criteria = FilterCriteria {
        for_sale: Some(true),
        price_min: Some(100_000_000),
        price_max: Some(500_000_000),
        ..FilterCriteria::default()
    };
    let matches = filter_listings(catalog.all(), &criteria);
    println!("\nFor sale between 100 000 000 and 500 000 000 F CFA:");
    for listing in &matches {
        print_card(&ListingCardView::from(*listing));
    }

    println!("\nAccount walkthrough (in-memory identity)");
    let identity = InMemoryIdentity::default();
    let session = Arc::new(AuthSession::new(
        identity.connect(),
        Arc::new(identity.profile_store()),
    ));
    if let Err(err) = session.initialize().await {
        println!("  Session restore failed: {}", err);
    }

    let registration = RegistrationForm {
        email: "ama.demo@example.tg".to_string(),
        password: "lome2025".to_string(),
        username: "ama_demo".to_string(),
        full_name: "Ama Demo".to_string(),
    };
    match session.register(&registration).await {
        Ok(notice) => println!("  {}", notice.message),
        Err(err) => {
            println!("  Registration rejected: {}", err);
            return Ok(());
        }
    }

    let login = LoginForm {
        email: registration.email.clone(),
        password: registration.password.clone(),
    };
    match session.sign_in(&login).await {
        Ok(outcome) => {
            println!("  {}", outcome.notice.message);
            if let Some(warning) = outcome.warning {
                println!("  {}", warning.message);
            }
        }
        Err(err) => {
            println!("  Sign in rejected: {}", err);
            return Ok(());
        }
    }
    let Some(user) = session.current_user() else {
        println!("  No user after sign in");
        return Ok(());
    };
    if let Some(profile) = session.state().profile.profile() {
        println!(
            "  Signed in as {} ({})",
            profile.full_name.as_deref().unwrap_or(&user.email),
            profile.initials()
        );
    }

    if args.skip_wizard {
        return Ok(());
    }

    println!("\nListing wizard walkthrough");
    let submitter = Arc::new(InMemoryListingSubmitter::default());
    let wizard = ListingWizardService::new(
        Arc::new(InMemoryDraftRepository::default()),
        submitter.clone(),
    );
    let draft = match wizard.create(&user.id) {
        Ok(draft) => draft,
        Err(err) => {
            println!("  Draft unavailable: {}", err);
            return Ok(());
        }
    };
    println!("- Started {} on step {}", draft.id, draft.wizard.current_step());

    if let Err(err) = wizard.change_step(&user.id, &draft.id, StepMove::Next) {
        println!("  Next blocked: {}", err.notice().message);
    }

    let update = DraftUpdate {
        title: Some("Maison moderne à Avédji".to_string()),
        description: Some("Trois chambres, salon spacieux, cour pavée et forage.".to_string()),
        price: Some(85_000_000),
        bedrooms: Some(3),
        bathrooms: Some(2),
        area: Some(210),
        location: Some("Avédji, Lomé".to_string()),
        ..DraftUpdate::default()
    };
    let draft = match wizard
        .update(&user.id, &draft.id, &update)
        .and_then(|draft| wizard.change_step(&user.id, &draft.id, StepMove::To(WizardStep::Preview)))
    {
        Ok(draft) => draft,
        Err(err) => {
            println!("  Wizard rejected: {}", err.notice().message);
            return Ok(());
        }
    };
    let preview = draft.wizard.draft().preview();
    println!("- Preview on step {}:", draft.wizard.current_step());
    print_card(&preview);

    match wizard.submit(&user.id, &draft.id).await {
        Ok((receipt, notice)) => {
            println!("  {} ({})", notice.message, receipt.listing_id);
            println!("  {} listing(s) awaiting publication", submitter.submitted().len());
        }
        Err(err) => println!("  Submission failed: {}", err.notice().message),
    }

    if let Ok(notice) = session.sign_out().await {
        println!("\n{}", notice.message);
    }
    Ok(())
}
