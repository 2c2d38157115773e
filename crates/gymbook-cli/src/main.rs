//! Gymbook CLI - gym class booking and scheduling

use std::sync::Arc;

use anyhow::bail;
use chrono::{Duration, Local, NaiveDate, Timelike};
use clap::{Parser, Subcommand};
use gymbook_core::{
    Error as CoreError,
    catalog::SessionCatalog,
    config::Config,
    domain::{
        NewSession, Participant, Principal, ProfileChanges, SessionAvailability, SessionChanges,
        SessionStatus,
    },
    engine::ReservationEngine,
    identity::IdentityGateway,
    seed,
    storage::{BookingStore, Database, DatabaseConfig, SqliteStore},
};

#[derive(Parser)]
#[command(name = "gymbook")]
#[command(author, version, about = "Gym class booking and scheduling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Account email for authenticated commands
    #[arg(long, global = true)]
    email: Option<String>,

    /// Account password for authenticated commands
    #[arg(long, global = true)]
    password: Option<String>,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new client account (uses --email and --password)
    Register {
        /// First name
        first_name: String,
        /// Last name
        last_name: String,
    },

    /// Verify credentials and show account details
    Login,

    /// Update your profile
    Profile {
        /// New first name
        #[arg(long)]
        first_name: Option<String>,
        /// New last name
        #[arg(long)]
        last_name: Option<String>,
        /// New account email
        #[arg(long)]
        new_email: Option<String>,
        /// New account password
        #[arg(long)]
        new_password: Option<String>,
    },

    /// Browse and manage sessions
    Sessions {
        #[command(subcommand)]
        action: SessionAction,
    },

    /// Book and manage reservations
    Reservations {
        #[command(subcommand)]
        action: ReservationAction,
    },

    /// Load demo accounts and the weekly class plan
    Seed,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Run health check
    Doctor,
}

#[derive(Subcommand)]
enum SessionAction {
    /// Show the schedule for one day
    Day {
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show the week schedule
    Week {
        /// Any date inside the week (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// List sessions led by one trainer
    Trainer {
        /// Trainer id
        trainer_id: i64,
    },
    /// Create a session (managers only)
    Create {
        /// Session kind (group or personal)
        #[arg(long, default_value = "group")]
        kind: String,
        /// Trainer running the session
        #[arg(long)]
        trainer: i64,
        /// Start time (YYYY-MM-DDTHH:MM:SS)
        #[arg(long)]
        start: String,
        /// Duration in minutes
        #[arg(long, default_value_t = 60)]
        duration: i64,
        /// Number of bookable slots
        #[arg(long)]
        capacity: i64,
        /// Class name
        #[arg(long)]
        name: Option<String>,
        /// Description
        #[arg(long)]
        description: Option<String>,
        /// Difficulty (easy, medium or hard)
        #[arg(long)]
        difficulty: Option<String>,
        /// Price
        #[arg(long)]
        price: Option<f64>,
    },
    /// Edit a session (managers only)
    Edit {
        /// Session id
        session_id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        difficulty: Option<String>,
        #[arg(long)]
        price: Option<f64>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        duration: Option<i64>,
        #[arg(long)]
        capacity: Option<i64>,
    },
    /// Cancel a session (managers only)
    Cancel {
        /// Session id
        session_id: i64,
    },
    /// Show free slots for a session
    Slots {
        /// Session id
        session_id: i64,
    },
    /// List active participants (staff only)
    Participants {
        /// Session id
        session_id: i64,
    },
}

#[derive(Subcommand)]
enum ReservationAction {
    /// Book a slot in a session
    Book {
        /// Session id
        session_id: i64,
    },
    /// Cancel your reservation for a session
    Cancel {
        /// Session id
        session_id: i64,
    },
    /// Cancel a reservation by its id (managers only)
    CancelById {
        /// Reservation id
        reservation_id: i64,
    },
    /// Show your booking history
    List,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration values
    List,
    /// Reset configuration to defaults
    Reset,
    /// Show config file path
    Path,
}

/// Global flags shared by every command
struct Ctx {
    email: Option<String>,
    password: Option<String>,
    format: OutputFormat,
    quiet: bool,
}

impl Ctx {
    fn credentials(&self) -> anyhow::Result<(&str, &str)> {
        match (self.email.as_deref(), self.password.as_deref()) {
            (Some(email), Some(password)) => Ok((email, password)),
            _ => bail!("This command requires --email and --password"),
        }
    }
}

/// Services wired over one shared store
struct App {
    config: Config,
    db: Database,
    identity: IdentityGateway,
    catalog: SessionCatalog,
    engine: ReservationEngine,
}

async fn build_app() -> anyhow::Result<App> {
    let config = Config::load()?;
    let db = Database::new(DatabaseConfig::with_path(config.database_path())).await?;
    let store: Arc<dyn BookingStore> = Arc::new(SqliteStore::new(db.pool().clone()));
    Ok(App {
        config,
        db,
        identity: IdentityGateway::new(store.clone()),
        catalog: SessionCatalog::new(store.clone()),
        engine: ReservationEngine::new(store),
    })
}

async fn sign_in(app: &App, ctx: &Ctx) -> anyhow::Result<Principal> {
    let (email, password) = ctx.credentials()?;
    Ok(app.identity.authenticate(email, password).await?)
}

fn require(allowed: bool, action: &str) -> anyhow::Result<()> {
    if !allowed {
        bail!("Your role does not allow {}", action);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gymbook_core=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    if let Err(err) = dispatch(cli).await {
        report(&err);
        std::process::exit(1);
    }
    Ok(())
}

/// Print an error with its stable code and a follow-up hint when one exists
fn report(err: &anyhow::Error) {
    match err.downcast_ref::<CoreError>() {
        Some(core) => {
            eprintln!("Error [{}]: {}", core.code(), core);
            if let Some(hint) = core.suggestion() {
                eprintln!("  hint: {}", hint);
            }
        }
        None => eprintln!("Error: {:#}", err),
    }
}

async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let Cli {
        command,
        email,
        password,
        format,
        quiet,
    } = cli;
    let ctx = Ctx {
        email,
        password,
        format,
        quiet,
    };

    match command {
        Commands::Register {
            first_name,
            last_name,
        } => {
            let app = build_app().await?;
            cmd_register(&app, &ctx, &first_name, &last_name).await
        }

        Commands::Login => {
            let app = build_app().await?;
            cmd_login(&app, &ctx).await
        }

        Commands::Profile {
            first_name,
            last_name,
            new_email,
            new_password,
        } => {
            let app = build_app().await?;
            let changes = ProfileChanges {
                first_name,
                last_name,
                email: new_email,
                password: new_password,
            };
            cmd_profile(&app, &ctx, &changes).await
        }

        Commands::Sessions { action } => {
            let app = build_app().await?;
            cmd_sessions(&app, &ctx, action).await
        }

        Commands::Reservations { action } => {
            let app = build_app().await?;
            cmd_reservations(&app, &ctx, action).await
        }

        Commands::Seed => {
            let app = build_app().await?;
            cmd_seed(&app, &ctx).await
        }

        Commands::Config { action } => cmd_config(action, ctx.quiet),

        Commands::Doctor => cmd_doctor(ctx.quiet).await,
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn cmd_register(
    app: &App,
    ctx: &Ctx,
    first_name: &str,
    last_name: &str,
) -> anyhow::Result<()> {
    let (email, password) = ctx.credentials()?;
    let id = app
        .identity
        .register(first_name, last_name, email, password)
        .await?;
    if !ctx.quiet {
        println!("Account created (id {}).", id);
        println!("\nNext: run `gymbook --email <email> --password <password> login`");
    }
    Ok(())
}

async fn cmd_login(app: &App, ctx: &Ctx) -> anyhow::Result<()> {
    let principal = sign_in(app, ctx).await?;
    let user = app.identity.user(principal.id).await?;
    if !ctx.quiet {
        println!("Logged in as {} <{}>", user.full_name(), user.email);
        println!("  Role: {}", user.role);
    }
    Ok(())
}

async fn cmd_profile(app: &App, ctx: &Ctx, changes: &ProfileChanges) -> anyhow::Result<()> {
    let principal = sign_in(app, ctx).await?;
    app.identity.update_profile(principal.id, changes).await?;
    if !ctx.quiet {
        println!("Profile updated.");
        if changes.email.is_some() || changes.password.is_some() {
            println!("Use the new credentials from now on.");
        }
    }
    Ok(())
}

async fn cmd_sessions(app: &App, ctx: &Ctx, action: SessionAction) -> anyhow::Result<()> {
    match action {
        SessionAction::Day { date } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let sessions = app.catalog.sessions_for_date(date).await?;
            match ctx.format {
                OutputFormat::Json => print_json(&sessions)?,
                OutputFormat::Text => {
                    render_session_list(&format!("Sessions on {}", date), &sessions)
                }
            }
        }

        SessionAction::Week { date } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let monday = seed::week_monday(date);
            match ctx.format {
                OutputFormat::Json => {
                    let sessions = app.catalog.sessions_for_week(monday).await?;
                    print_json(&sessions)?;
                }
                OutputFormat::Text => {
                    let grid = app.catalog.week_schedule(monday).await?;
                    render_week_grid(&app.config, monday, &grid);
                }
            }
        }

        SessionAction::Trainer { trainer_id } => {
            let sessions = app.catalog.sessions_for_trainer(trainer_id).await?;
            match ctx.format {
                OutputFormat::Json => print_json(&sessions)?,
                OutputFormat::Text => {
                    render_session_list(&format!("Sessions of trainer {}", trainer_id), &sessions)
                }
            }
        }

        SessionAction::Create {
            kind,
            trainer,
            start,
            duration,
            capacity,
            name,
            description,
            difficulty,
            price,
        } => {
            let principal = sign_in(app, ctx).await?;
            require(principal.role.can_manage_sessions(), "managing sessions")?;
            let new = NewSession {
                kind,
                trainer_id: trainer,
                start_time: start,
                duration_min: duration,
                capacity,
                name,
                description,
                difficulty,
                price,
            };
            let id = app.catalog.create_session(&new).await?;
            if !ctx.quiet {
                println!("Session created (id {}).", id);
            }
        }

        SessionAction::Edit {
            session_id,
            name,
            description,
            difficulty,
            price,
            start,
            duration,
            capacity,
        } => {
            let principal = sign_in(app, ctx).await?;
            require(principal.role.can_manage_sessions(), "managing sessions")?;
            let changes = SessionChanges {
                name,
                description,
                difficulty,
                price,
                start_time: start,
                duration_min: duration,
                capacity,
            };
            app.catalog.edit_session(session_id, &changes).await?;
            if !ctx.quiet {
                println!("Session {} updated.", session_id);
            }
        }

        SessionAction::Cancel { session_id } => {
            let principal = sign_in(app, ctx).await?;
            require(principal.role.can_manage_sessions(), "managing sessions")?;
            app.catalog.cancel_session(session_id).await?;
            if !ctx.quiet {
                println!("Session {} cancelled.", session_id);
                println!("Existing reservations stay on record.");
            }
        }

        SessionAction::Slots { session_id } => {
            let available = app.catalog.available_slots(session_id).await?;
            match ctx.format {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "session_id": session_id,
                    "available": available,
                }))?,
                OutputFormat::Text => println!("Session {}: {} free slots", session_id, available),
            }
        }

        SessionAction::Participants { session_id } => {
            let principal = sign_in(app, ctx).await?;
            require(
                principal.role.can_view_participants(),
                "viewing participants",
            )?;
            let participants = app.engine.list_participants(session_id).await?;
            match ctx.format {
                OutputFormat::Json => print_json(&participants)?,
                OutputFormat::Text => render_participants(session_id, &participants),
            }
        }
    }
    Ok(())
}

async fn cmd_reservations(app: &App, ctx: &Ctx, action: ReservationAction) -> anyhow::Result<()> {
    let principal = sign_in(app, ctx).await?;

    match action {
        ReservationAction::Book { session_id } => {
            require(principal.role.can_book(), "booking sessions")?;
            let id = app.engine.create_reservation(principal.id, session_id).await?;
            if !ctx.quiet {
                let left = app.catalog.available_slots(session_id).await?;
                println!("Reservation confirmed (id {}).", id);
                println!("  Slots left: {}", left);
            }
        }

        ReservationAction::Cancel { session_id } => {
            require(principal.role.can_book(), "booking sessions")?;
            app.engine.cancel_reservation(principal.id, session_id).await?;
            if !ctx.quiet {
                println!("Reservation for session {} cancelled.", session_id);
            }
        }

        ReservationAction::CancelById { reservation_id } => {
            require(principal.role.can_manage_sessions(), "managing reservations")?;
            app.engine.cancel_reservation_by_id(reservation_id).await?;
            if !ctx.quiet {
                println!("Reservation {} cancelled.", reservation_id);
            }
        }

        ReservationAction::List => {
            let reservations = app.engine.reservations_for_client(principal.id).await?;
            match ctx.format {
                OutputFormat::Json => print_json(&reservations)?,
                OutputFormat::Text => {
                    if reservations.is_empty() {
                        println!("No reservations yet.");
                        println!("\nBook one with: gymbook reservations book <session-id>");
                    } else {
                        println!("Your reservations:");
                        for r in reservations {
                            let name = r.session_name.as_deref().unwrap_or("Personal training");
                            let note = if r.session_status == SessionStatus::Cancelled {
                                " [session cancelled]"
                            } else {
                                ""
                            };
                            println!(
                                "  #{:<4} {:<9} {}  {} ({} min){}",
                                r.reservation_id,
                                r.status.as_str(),
                                r.session_start.format("%a %Y-%m-%d %H:%M"),
                                name,
                                r.session_duration_min,
                                note
                            );
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

async fn cmd_seed(app: &App, ctx: &Ctx) -> anyhow::Result<()> {
    let (users, sessions) = seed::seed_all(&app.identity, &app.catalog).await?;
    if !ctx.quiet {
        println!("Seeded {} accounts and {} sessions.", users, sessions);
        if users > 0 {
            println!("\nDemo accounts:");
            println!("  marian@mygym / manager123 (manager)");
            println!("  tomasz@mygym / trainer123 (trainer)");
            println!("  kasia@mygym / trainer123 (trainer)");
        }
    }
    Ok(())
}

fn cmd_config(action: ConfigAction, quiet: bool) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key)?;
            println!("{}", value);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            if !quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            for (key, value) in config.list() {
                println!("{} = {}", key, value);
            }
        }
        ConfigAction::Reset => {
            Config::reset()?;
            if !quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

async fn cmd_doctor(quiet: bool) -> anyhow::Result<()> {
    if !quiet {
        println!("Gymbook Health Check");
        println!("====================");
        println!();
    }

    let mut all_ok = true;

    // Check configuration
    let config = match Config::load() {
        Ok(config) => {
            if !quiet {
                println!("[OK] Configuration: Valid");
            }
            Some(config)
        }
        Err(e) => {
            all_ok = false;
            if !quiet {
                println!("[!!] Configuration: Error - {}", e);
            }
            None
        }
    };

    // Check config file location
    if !quiet {
        match Config::config_path() {
            Ok(path) => {
                if path.exists() {
                    println!("[OK] Config file: {}", path.display());
                } else {
                    println!("[--] Config file: {} (using defaults)", path.display());
                }
            }
            Err(e) => {
                println!("[!!] Config file: Error - {}", e);
            }
        }
    }

    // Check database
    if let Some(config) = config {
        match Database::new(DatabaseConfig::with_path(config.database_path())).await {
            Ok(db) => match db.health_check().await {
                Ok(()) => {
                    if !quiet {
                        println!("[OK] Database: Connected");
                        println!("     Path: {}", db.path().display());
                    }

                    match db.migration_status().await {
                        Ok(status) => {
                            if !quiet {
                                if status.needs_migration {
                                    println!(
                                        "[!!] Database: Migrations pending (v{} -> v{})",
                                        status.current_version, status.latest_version
                                    );
                                } else {
                                    println!("[OK] Database: Schema v{}", status.current_version);
                                }
                            }
                        }
                        Err(e) => {
                            if !quiet {
                                println!("[!!] Database: Migration check failed - {}", e);
                            }
                        }
                    }

                    if !quiet {
                        let store: Arc<dyn BookingStore> =
                            Arc::new(SqliteStore::new(db.pool().clone()));
                        let identity = IdentityGateway::new(store);
                        let trainers = identity.trainers().await.unwrap_or_default();
                        println!("     Trainers on file: {}", trainers.len());
                        if trainers.is_empty() {
                            println!("     Run `gymbook seed` to load the demo schedule.");
                        }
                    }
                }
                Err(e) => {
                    all_ok = false;
                    if !quiet {
                        println!("[!!] Database: Health check failed - {}", e);
                    }
                }
            },
            Err(e) => {
                all_ok = false;
                if !quiet {
                    println!("[!!] Database: Failed to initialize - {}", e);
                }
            }
        }
    }

    // Summary
    if !quiet {
        println!();
        if all_ok {
            println!("All checks passed!");
        } else {
            println!("Some checks failed. See above for details.");
        }
    }

    Ok(())
}

// ============================================================================
// Rendering
// ============================================================================

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn render_session_list(heading: &str, sessions: &[SessionAvailability]) {
    if sessions.is_empty() {
        println!("{}: no sessions.", heading);
        return;
    }
    println!("{}:", heading);
    for entry in sessions {
        let s = &entry.session;
        let name = s.name.as_deref().unwrap_or("Personal training");
        let difficulty = s
            .difficulty
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        let price = s
            .price
            .map(|p| format!("{:.2}", p))
            .unwrap_or_else(|| "-".to_string());
        let note = if s.is_active() { "" } else { " [cancelled]" };
        println!(
            "  #{:<4} {}  {:<24} {:<8} {:>7}  {}/{} free{}",
            s.id,
            s.start_time.format("%a %H:%M"),
            name,
            difficulty,
            price,
            entry.available,
            s.capacity,
            note
        );
    }
}

fn render_week_grid(config: &Config, monday: NaiveDate, grid: &[Vec<SessionAvailability>]) {
    const CELL: usize = 22;
    let days = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

    println!("Week of {}", monday);

    let mut header = String::from("      ");
    for (i, day) in days.iter().enumerate() {
        let date = monday + Duration::days(i as i64);
        let label = format!("{} {}", day, date.format("%d.%m"));
        header.push_str(&format!("{:<width$}", label, width = CELL));
    }
    println!("{}", header.trim_end());

    for hour in config.schedule.day_start_hour..config.schedule.day_end_hour {
        let mut row = format!("{:>2}:00 ", hour);
        for bucket in grid {
            let entries: Vec<String> = bucket
                .iter()
                .filter(|e| e.session.start_time.hour() == hour)
                .map(|e| {
                    let name = e.session.name.as_deref().unwrap_or("Personal");
                    if e.session.is_active() {
                        format!("{} {}/{}", name, e.available, e.session.capacity)
                    } else {
                        format!("{} [cancelled]", name)
                    }
                })
                .collect();
            row.push_str(&format!("{:<width$}", entries.join(" / "), width = CELL));
        }
        println!("{}", row.trim_end());
    }
}

fn render_participants(session_id: i64, participants: &[Participant]) {
    if participants.is_empty() {
        println!("Session {}: no active participants.", session_id);
        return;
    }
    println!("Participants of session {} ({}):", session_id, participants.len());
    for p in participants {
        println!("  {} <{}>", p.full_name(), p.email);
    }
}
