use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Mutex;

use shoplist::app::App;
use shoplist::config::Config;
use shoplist::list::{ListSession, Removal, Shopper};
use shoplist::remote::{Backend, Credential};
use shoplist::storage::{keys, Database, DatabaseError, KeyValueStore};
use shoplist::util::{clean_remote_text, format_age};

/// Get the config directory path (~/.config/shoplist/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("shoplist"))
}

#[derive(Parser, Debug)]
#[command(name = "shoplist", about = "A shared shopping list in the terminal")]
struct Args {
    /// Config file (default: ~/.config/shoplist/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// List password to use instead of the remembered one
    #[arg(long, global = true, value_name = "PASSWORD")]
    password: Option<String>,

    /// Clear local state (remembered password, suggestions, cat settings)
    #[arg(long, global = true)]
    reset_state: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the items still to buy
    List,
    /// Add an item
    Add {
        name: String,
        /// Who is ordering it
        #[arg(long, value_enum, default_value_t = ShopperArg::UserA)]
        by: ShopperArg,
    },
    /// Remove an item
    Remove { name: String },
    /// Forget the remembered password
    Logout,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ShopperArg {
    UserA,
    UserB,
}

impl From<ShopperArg> for Shopper {
    fn from(arg: ShopperArg) -> Self {
        match arg {
            ShopperArg::UserA => Shopper::UserA,
            ShopperArg::UserB => Shopper::UserB,
        }
    }
}

/// Log to a file when RUST_LOG is set; the TUI owns stdout.
fn init_tracing(config_dir: &std::path::Path) -> Result<()> {
    if std::env::var_os("RUST_LOG").is_none() {
        return Ok(());
    }
    let log_path = config_dir.join("shoplist.log");
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn ensure_config_dir(config_dir: &std::path::Path) -> Result<()> {
    if !config_dir.exists() {
        std::fs::create_dir_all(config_dir).context("Failed to create config directory")?;
    }

    // User-only access: the database holds the remembered password
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o700);
        if let Err(e) = std::fs::set_permissions(config_dir, perms) {
            tracing::warn!(
                path = %config_dir.display(),
                error = %e,
                "Failed to set config directory permissions to 0700"
            );
        }
    }
    Ok(())
}

fn print_list<R, L>(session: &ListSession<R, L>, config: &Config)
where
    R: shoplist::remote::RemoteStore,
    L: KeyValueStore,
{
    let items = session.controller().items();
    if items.active_len() == 0 {
        println!("Nothing to buy.");
        return;
    }
    let now = Utc::now();
    for item in items.active() {
        println!(
            "{}  ({}, {})",
            clean_remote_text(&item.name),
            item.ordered_by.display_name(&config.shoppers),
            format_age(item.ordered_on, now)
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_dir = get_config_dir()?;
    ensure_config_dir(&config_dir)?;
    init_tracing(&config_dir)?;

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    config.validate().context("Invalid configuration")?;

    let db_path = config_dir.join("state.db");
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = match Database::open(db_path_str).await {
        Ok(db) => db,
        Err(DatabaseError::InstanceLocked) => {
            eprintln!("Error: {}", DatabaseError::InstanceLocked);
            std::process::exit(1);
        }
        Err(e) => return Err(anyhow::anyhow!("Failed to open database: {}", e)),
    };

    if args.reset_state {
        let cleared = db
            .clear_state()
            .await
            .context("Failed to clear local state")?;
        println!("Local state reset ({} entries removed).", cleared);
    }

    let backend = Backend::from_config(&config).context("Failed to set up the list store")?;
    let password = args.password.map(Credential::new);

    match args.command {
        None => {
            let mut app = App::new(db.clone(), backend, &config)
                .await
                .context("Failed to create application")?;
            shoplist::ui::run(&mut app, password).await?;
            drop(app);
            db.close().await;
            println!("Goodbye!");
        }
        Some(Command::Logout) => {
            db.remove(keys::CREDENTIAL)
                .await
                .context("Failed to forget password")?;
            println!("Password forgotten.");
        }
        Some(command) => {
            let mut session = ListSession::open(backend, db.clone(), config.refresh_before_edit)
                .await
                .context("Failed to read local state")?;
            session.start(password).await?;

            match command {
                Command::Add { name, by } => {
                    session.add(&name, by.into(), Utc::now()).await?;
                    println!("Added {}.", name.trim());
                }
                Command::Remove { name } => match session.remove(&name).await? {
                    Removal::Removed => println!("Removed {}.", name),
                    Removal::AlreadyGone => {
                        println!("{} was already removed by someone else.", name)
                    }
                },
                Command::List | Command::Logout => {}
            }
            print_list(&session, &config);
            db.close().await;
        }
    }

    Ok(())
}
