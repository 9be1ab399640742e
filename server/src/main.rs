//! Licensor backend and admin CLI.
//!
//! Usage:
//!   licensor serve --db licenses.sqlite --admin-secret …
//!   licensor sync --db admin.sqlite --watch
//!   licensor verify --db admin.sqlite --origin https://ffw-example.de
//!   licensor licenses --db admin.sqlite --status expired
//!   licensor license create --db admin.sqlite --organization "FF Talheim" --domain talheim.de
//!   licensor request approve req_123 --db admin.sqlite --features inventory,vehicles

use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use licensor_license::{
    ContactDetails, LicenseDraft, LicenseFilter, StatusFilter, default_features,
    default_valid_until,
};
use licensor_server::{AppState, ServerConfig, build_router};
use licensor_store::LicenseStore;
use licensor_sync::{AdminConsole, SyncConfig, SyncEngine, SyncScheduler};
use licensor_types::{FeatureSet, License, LicenseId, ModuleDefinition, RequestId};
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "licensor")]
#[command(about = "License issuing, verification and sync", version)]
struct Cli {
    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the backend endpoint
    Serve {
        /// SQLite database file
        #[arg(long, default_value = "licensor.sqlite")]
        db: PathBuf,

        /// Address to listen on
        #[arg(long, default_value = "0.0.0.0:8080")]
        bind: SocketAddr,

        /// Shared secret for admin actions
        #[arg(long, env = "LICENSOR_ADMIN_SECRET", hide_env_values = true)]
        admin_secret: String,

        /// Do not create requests for unknown domains
        #[arg(long)]
        no_auto_register: bool,
    },

    /// Pull-merge the local store with the backend
    Sync {
        #[arg(long, default_value = "licensor.sqlite")]
        db: PathBuf,

        /// Backend URL (defaults to the `apiUrl` setting)
        #[arg(long)]
        api_url: Option<String>,

        /// Admin secret (defaults to the `adminSecret` setting)
        #[arg(long, env = "LICENSOR_ADMIN_SECRET", hide_env_values = true)]
        secret: Option<String>,

        /// Keep syncing in the background until Ctrl-C
        #[arg(long)]
        watch: bool,

        /// Seconds between background rounds
        #[arg(long, default_value = "30")]
        interval: u64,

        /// Request timeout in seconds
        #[arg(long, default_value = "15")]
        timeout: u64,
    },

    /// Run a verification against the local store
    Verify {
        #[arg(long, default_value = "licensor.sqlite")]
        db: PathBuf,

        /// Origin the call pretends to come from
        #[arg(long)]
        origin: String,

        /// License key to present
        #[arg(long)]
        key: Option<String>,
    },

    /// List licenses
    Licenses {
        #[arg(long, default_value = "licensor.sqlite")]
        db: PathBuf,

        /// Case-insensitive search over organization, key and domain
        #[arg(long, default_value = "")]
        search: String,

        /// all, active, expired or suspended
        #[arg(long, default_value = "all")]
        status: StatusFilter,
    },

    /// Create, revoke or delete a license
    License {
        #[command(flatten)]
        backend: Backend,

        #[command(subcommand)]
        action: LicenseAction,
    },

    /// Approve or reject a license request
    Request {
        #[command(flatten)]
        backend: Backend,

        #[command(subcommand)]
        action: RequestAction,
    },

    /// Read or write a setting
    Settings {
        #[arg(long, default_value = "licensor.sqlite")]
        db: PathBuf,

        #[command(subcommand)]
        action: SettingsAction,
    },
}

/// Store and optional backend for admin changes.
///
/// Without a backend URL and secret, from flags or settings, changes only
/// touch the local database.
#[derive(Args, Debug)]
struct Backend {
    #[arg(long, default_value = "licensor.sqlite")]
    db: PathBuf,

    /// Backend URL (defaults to the `apiUrl` setting)
    #[arg(long)]
    api_url: Option<String>,

    /// Admin secret (defaults to the `adminSecret` setting)
    #[arg(long, env = "LICENSOR_ADMIN_SECRET", hide_env_values = true)]
    secret: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value = "15")]
    timeout: u64,
}

#[derive(Args, Debug)]
struct Contact {
    #[arg(long)]
    organization: Option<String>,
    #[arg(long)]
    contact_person: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone: Option<String>,
}

#[derive(Subcommand, Debug)]
enum LicenseAction {
    /// Issue a license with a fresh key
    Create {
        #[command(flatten)]
        contact: Contact,

        #[arg(long)]
        domain: String,

        /// YYYY-MM-DD, one year from today if omitted
        #[arg(long)]
        valid_until: Option<String>,

        /// Comma-separated modules to enable (default: the base module)
        #[arg(long)]
        features: Option<String>,

        #[arg(long)]
        note: Option<String>,
    },
    /// Suspend a license
    Revoke { id: String },
    /// Delete a license for good
    Delete { id: String },
    /// Replace the enabled modules of a license
    Features {
        id: String,

        /// Comma-separated modules to enable; all others are turned off
        #[arg(long, default_value = "")]
        enable: String,
    },
}

#[derive(Subcommand, Debug)]
enum RequestAction {
    /// Turn a request into a license
    Approve {
        id: String,

        /// Overrides for the contact data taken from the request
        #[command(flatten)]
        contact: Contact,

        #[arg(long)]
        valid_until: Option<String>,

        #[arg(long)]
        features: Option<String>,
    },
    /// Drop a request
    Reject { id: String },
}

#[derive(Subcommand, Debug)]
enum SettingsAction {
    Get { key: String },
    Set { key: String, value: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    match cli.command {
        Command::Serve {
            db,
            bind,
            admin_secret,
            no_auto_register,
        } => serve(db, bind, admin_secret, no_auto_register).await,
        Command::Sync {
            db,
            api_url,
            secret,
            watch,
            interval,
            timeout,
        } => {
            let config = SyncConfig {
                api_url,
                secret,
                interval: Duration::from_secs(interval.max(1)),
                timeout: Duration::from_secs(timeout.max(1)),
            };
            sync(db, config, watch).await
        }
        Command::Verify { db, origin, key } => verify(db, &origin, key.as_deref()),
        Command::Licenses { db, search, status } => list_licenses(db, search, status),
        Command::License { backend, action } => license(backend, action).await,
        Command::Request { backend, action } => request(backend, action).await,
        Command::Settings { db, action } => settings(db, action),
    }
}

fn open_store(db: &Path) -> Result<LicenseStore> {
    LicenseStore::open(db).with_context(|| format!("Failed to open database {}", db.display()))
}

async fn serve(
    db: PathBuf,
    bind: SocketAddr,
    admin_secret: String,
    no_auto_register: bool,
) -> Result<()> {
    if admin_secret.trim().is_empty() {
        bail!("The admin secret must not be empty");
    }

    let store = open_store(&db)?;
    let mut config = ServerConfig::new(admin_secret);
    config.verifier.auto_register = !no_auto_register;
    let state = Arc::new(AppState::new(store, config));
    info!(
        "Licensor backend starting (database {}, secret {}…)",
        db.display(),
        state.secret_fingerprint()
    );

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    info!("Listening on http://{}", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;
    info!("Licensor backend stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

async fn sync(db: PathBuf, config: SyncConfig, watch: bool) -> Result<()> {
    let store = open_store(&db)?;
    let engine = SyncEngine::from_config(store, &config).context("Sync is not configured")?;

    if !watch {
        let report = engine.sync_once().await.context("Sync failed")?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let scheduler = SyncScheduler::spawn(engine, config.interval);
    shutdown_signal().await;
    let status = scheduler.status().await;
    scheduler.shutdown().await?;
    info!(
        "Ran {} sync rounds, last error: {}",
        status.rounds,
        status.last_error.as_deref().unwrap_or("none")
    );
    Ok(())
}

fn verify(db: PathBuf, origin: &str, key: Option<&str>) -> Result<()> {
    let console = AdminConsole::local(open_store(&db)?);
    let verification = console.simulate_verify(origin, key)?;
    println!("HTTP {}", verification.status_code);
    println!("{}", serde_json::to_string_pretty(&verification.body)?);
    Ok(())
}

fn list_licenses(db: PathBuf, search: String, status: StatusFilter) -> Result<()> {
    let store = open_store(&db)?;
    let licenses = store.list_licenses()?;
    let now = Utc::now();
    let filter = LicenseFilter::new(search, status);

    for license in filter.apply(&licenses, now) {
        let state = if license.is_suspended() {
            "suspended"
        } else if license.is_expired(now) {
            "expired"
        } else {
            "active"
        };
        println!(
            "{:<15} {:<32} {:<30} {:<10} {:>5}d  {}",
            license.key,
            license.domain,
            license.organization,
            state,
            license.days_remaining(now),
            license.enabled_modules().join(",")
        );
    }
    Ok(())
}

fn admin_console(backend: &Backend) -> Result<AdminConsole> {
    let store = open_store(&backend.db)?;
    let config = SyncConfig {
        api_url: backend.api_url.clone(),
        secret: backend.secret.clone(),
        timeout: Duration::from_secs(backend.timeout.max(1)),
        ..SyncConfig::default()
    };
    AdminConsole::from_config(store, &config).context("Failed to set up the backend connection")
}

/// Feature set for a comma-separated module list; `None` picks the defaults.
fn feature_set(catalog: &[ModuleDefinition], enabled: Option<&str>) -> FeatureSet {
    let Some(enabled) = enabled else {
        return default_features(catalog);
    };
    let mut features: FeatureSet = catalog.iter().map(|m| (m.id.clone(), false)).collect();
    for module in enabled.split(',').map(str::trim).filter(|m| !m.is_empty()) {
        features.insert(module.to_string(), true);
    }
    features
}

fn report_queue(console: &AdminConsole) -> Result<()> {
    let queued = console.store().pending_pushes()?.len();
    if queued > 0 {
        warn!("{} change(s) queued until the backend is reachable", queued);
    } else if !console.is_mirrored() {
        info!("No backend configured, the change is local only");
    }
    Ok(())
}

fn print_license(license: &License) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(license)?);
    Ok(())
}

async fn license(backend: Backend, action: LicenseAction) -> Result<()> {
    let console = admin_console(&backend)?;
    match action {
        LicenseAction::Create {
            contact,
            domain,
            valid_until,
            features,
            note,
        } => {
            let Some(organization) = contact.organization else {
                bail!("--organization is required");
            };
            let mut details = ContactDetails::new(
                organization,
                contact.contact_person.unwrap_or_default(),
                contact.email.unwrap_or_default(),
            );
            if let Some(phone) = contact.phone {
                details = details.with_phone(phone);
            }
            let catalog = console.store().list_modules()?;
            let draft = LicenseDraft {
                contact: details,
                domain,
                valid_until: valid_until.unwrap_or_else(|| default_valid_until(Utc::now())),
                features: feature_set(&catalog, features.as_deref()),
                note,
            };
            print_license(&console.create_license(draft).await?)?;
        }
        LicenseAction::Revoke { id } => {
            let id = LicenseId::parse(&id)?;
            print_license(&console.revoke(&id).await?)?;
        }
        LicenseAction::Delete { id } => {
            let id = LicenseId::parse(&id)?;
            if !console.delete_license(&id).await? {
                bail!("License {id} does not exist");
            }
            info!("Deleted license {}", id);
        }
        LicenseAction::Features { id, enable } => {
            let id = LicenseId::parse(&id)?;
            let catalog = console.store().list_modules()?;
            let features = feature_set(&catalog, Some(&enable));
            print_license(&console.update_features(&id, features).await?)?;
        }
    }
    report_queue(&console)
}

async fn request(backend: Backend, action: RequestAction) -> Result<()> {
    let console = admin_console(&backend)?;
    match action {
        RequestAction::Approve {
            id,
            contact,
            valid_until,
            features,
        } => {
            let id = RequestId::parse(&id)?;
            let Some(pending) = console.store().get_request(&id)? else {
                bail!("Request {id} does not exist");
            };
            let mut details = ContactDetails::new(
                contact.organization.unwrap_or(pending.organization),
                contact.contact_person.unwrap_or(pending.contact_person),
                contact.email.unwrap_or(pending.email),
            );
            if let Some(phone) = contact.phone.or(pending.phone_number) {
                details = details.with_phone(phone);
            }
            let catalog = console.store().list_modules()?;
            let features = feature_set(&catalog, features.as_deref());
            let valid_until = valid_until.unwrap_or_else(|| default_valid_until(Utc::now()));
            let license = console
                .approve_request(&id, details, features, &valid_until)
                .await?;
            print_license(&license)?;
        }
        RequestAction::Reject { id } => {
            let id = RequestId::parse(&id)?;
            if !console.reject_request(&id).await? {
                bail!("Request {id} does not exist");
            }
            info!("Rejected request {}", id);
        }
    }
    report_queue(&console)
}

fn settings(db: PathBuf, action: SettingsAction) -> Result<()> {
    let store = open_store(&db)?;
    match action {
        SettingsAction::Get { key } => match store.get_setting(&key)? {
            Some(value) => println!("{value}"),
            None => bail!("Setting {key} is not set"),
        },
        SettingsAction::Set { key, value } => {
            store.save_setting(&key, &value)?;
            info!("Saved setting {}", key);
        }
    }
    Ok(())
}
