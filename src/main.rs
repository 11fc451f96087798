use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use finance_tracker::{AppConfig, BackupManager, Clock, Session, SqliteStore, SystemClock};

#[derive(Parser, Debug)]
#[command(
    name = "finance-tracker",
    version = finance_tracker::VERSION,
    about = "Personal finance tracker with monthly budgets"
)]
struct Cli {
    /// Config file (defaults to ./finance.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Directory for database snapshots
    #[arg(long, global = true)]
    backup_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive menu (default)
    Menu,
    /// Create one timestamped backup and exit
    Backup,
    /// Log in and open the terminal dashboard
    Dashboard,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let cfg = AppConfig::load(cli.config.as_deref())
        .context("failed to load configuration")?
        .with_overrides(cli.db.clone(), cli.backup_dir.clone());

    // Logs go to stderr so the menu on stdout stays readable
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.log.level.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database = %cfg.database.path.display(),
        backups = %cfg.backup.dir.display(),
        "configuration loaded"
    );

    let backups = BackupManager::new(&cfg.database.path, &cfg.backup.dir);
    let clock = SystemClock;

    match cli.command.unwrap_or(Command::Menu) {
        Command::Menu => run_menu(&cfg, &clock, &backups),
        Command::Backup => {
            let path = backups.create_backup(clock.now())?;
            println!("✅ Backup created successfully: {}", path.display());
            Ok(())
        }
        Command::Dashboard => run_dashboard(&cfg, &clock),
    }
}

fn run_menu(cfg: &AppConfig, clock: &SystemClock, backups: &BackupManager) -> Result<()> {
    let store = SqliteStore::open(&cfg.database.path)
        .with_context(|| format!("failed to open {}", cfg.database.path.display()))?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    Session::new(&store, clock, backups, stdin.lock(), stdout.lock()).run()?;
    Ok(())
}

#[cfg(feature = "tui")]
fn run_dashboard(cfg: &AppConfig, clock: &SystemClock) -> Result<()> {
    use std::io::{BufRead, Write};

    let store = SqliteStore::open(&cfg.database.path)
        .with_context(|| format!("failed to open {}", cfg.database.path.display()))?;

    let mut input = io::stdin().lock();
    let mut ask = |prompt: &str| -> Result<String> {
        print!("{}", prompt);
        io::stdout().flush()?;
        let mut line = String::new();
        input.read_line(&mut line)?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    };

    let username = ask("Enter your username: ")?;
    let password = ask("Enter your password: ")?;

    let user = match finance_tracker::login_user(&store, &username, &password) {
        Ok(user) => user,
        Err(err) => {
            eprintln!("❌ Error: {}", err);
            std::process::exit(1);
        }
    };

    println!("🖥️  Loading dashboard for {}...\n", user.username);
    finance_tracker::ui::run_ui(&store, clock, &user)
}

#[cfg(not(feature = "tui"))]
fn run_dashboard(_cfg: &AppConfig, _clock: &SystemClock) -> Result<()> {
    anyhow::bail!("this build does not include the dashboard (enable the `tui` feature)")
}
