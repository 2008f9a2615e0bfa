mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use radmin_core::{OperatingMode, Resource};
use tracing_subscriber::EnvFilter;

use crate::commands::{App, FilterArgs, PageArgs, browse, records, session};

#[derive(Parser)]
#[command(name = "radmin")]
#[command(about = "Console for the RADIUS / MikroTik captive-portal administration API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in as an administrator
    Login {
        username: String,
        /// Read from stdin when omitted
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Sign in as a captive-portal user
    PortalLogin {
        username: String,
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Exchange an external identity payload (JSON) for a portal session
    ExternalLogin { payload: String },
    /// End the admin session, or the portal-user session with --portal
    Logout {
        #[arg(long)]
        portal: bool,
    },
    /// Show both stored sessions
    Whoami,
    /// Show the advertisement attached to the portal login, once
    PortalAd,
    /// Show backend settings, or switch the operating mode (aaa | mikrotik)
    Mode { mode: Option<OperatingMode> },
    /// Update the admin profile from a JSON object
    Profile { changes: String },
    /// Resolve a console path against the stored sessions
    Route { path: String },
    /// Fetch one page of a resource
    List {
        resource: Resource,
        #[command(flatten)]
        page: PageArgs,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Fetch one record
    Get { resource: Resource, id: String },
    /// Create a record from a JSON object
    Create { resource: Resource, record: String },
    /// Update a record from a JSON object
    Update { resource: Resource, id: String, changes: String },
    /// Delete a record
    Delete { resource: Resource, id: String },
    /// Page through a resource interactively; type `help` for commands
    Browse {
        resource: Resource,
        #[command(flatten)]
        filters: FilterArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let app = App::open()?;

    match cli.command {
        Commands::Login { username, password } => {
            session::run_login(&app, &username, password).await?;
        },
        Commands::PortalLogin { username, password } => {
            session::run_portal_login(&app, &username, password).await?;
        },
        Commands::ExternalLogin { payload } => session::run_external_login(&app, &payload).await?,
        Commands::Logout { portal } => session::run_logout(&app, portal)?,
        Commands::Whoami => session::run_whoami(&app)?,
        Commands::PortalAd => session::run_portal_ad(&app)?,
        Commands::Mode { mode } => session::run_mode(&app, mode).await?,
        Commands::Profile { changes } => session::run_profile(&app, &changes).await?,
        Commands::Route { path } => session::run_route(&app, &path)?,
        Commands::List { resource, page, filters } => {
            records::run_list(&app, resource, &page, &filters).await?;
        },
        Commands::Get { resource, id } => records::run_get(&app, resource, &id).await?,
        Commands::Create { resource, record } => {
            records::run_create(&app, resource, &record).await?;
        },
        Commands::Update { resource, id, changes } => {
            records::run_update(&app, resource, &id, &changes).await?;
        },
        Commands::Delete { resource, id } => records::run_delete(&app, resource, &id).await?,
        Commands::Browse { resource, filters } => {
            browse::run_browse(&app, resource, &filters).await?;
        },
    }

    Ok(())
}
