use crate::demo::{
    run_demo, run_featured, run_search, run_show, DemoArgs, FeaturedArgs, SearchArgs, ShowArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use togo_estates::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Togo Estates",
    about = "Serve and explore the Togo Estates property listings from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Browse the listing catalog
    Listings {
        #[command(subcommand)]
        command: ListingsCommand,
    },
    /// Run an end-to-end CLI demo covering search, accounts and the listing wizard
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum ListingsCommand {
    /// Filter listings by intent, type, price, rooms and location
    Search(SearchArgs),
    /// Show the detail view of one listing
    Show(ShowArgs),
    /// Show the first listings of the catalog
    Featured(FeaturedArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Listings { command } => match command {
            ListingsCommand::Search(args) => run_search(args),
            ListingsCommand::Show(args) => run_show(args),
            ListingsCommand::Featured(args) => run_featured(args),
        },
        Command::Demo(args) => run_demo(args).await,
    }
}
