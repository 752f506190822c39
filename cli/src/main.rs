use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use console::config::ConsoleConfig;
use console::gateway::{Backend, Gateway, GatewayError};
use console::guard::{RouteDecision, guard_protected};
use console::resources;
use console::session::{AuthError, SessionService};
use console::store::{CredentialStore, FileStore, StoreError};
use console::types::{ContactSettings, NewPaymentMethod, NewPromotion, NewSlider, PaymentKind};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("auth failed: {0}")]
    Auth(#[from] AuthError),
    #[error("request failed: {0}")]
    Gateway(#[from] GatewayError),
    #[error("credential storage failed: {0}")]
    Store(#[from] StoreError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("unknown payment kind `{0}` (expected `deposit` or `withdraw`)")]
    UnknownPaymentKind(String),
    #[error("not logged in; run `login` first")]
    NotLoggedIn,
}

#[derive(Parser, Debug)]
#[command(name = "bethub", about = "BetHub operator console CLI")]
struct Cli {
    #[arg(long, env = "BETHUB_API_URL")]
    api_url: Option<String>,

    #[arg(long, env = "BETHUB_STATE_DIR", default_value = ".bethub")]
    state_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Authenticate and store the session locally.
    Login {
        email: String,
        password: String,
    },
    /// Clear the local session (best-effort server-side invalidation).
    Logout,
    /// Show the cached operator profile.
    Whoami,
    Users(UsersCommand),
    Methods(MethodsCommand),
    Promotions(PromotionsCommand),
    Transactions(TransactionsCommand),
    Games(GamesCommand),
    Sliders(SlidersCommand),
    Contact(ContactCommand),
}

#[derive(Args, Debug)]
struct UsersCommand {
    #[command(subcommand)]
    command: UsersSubcommand,
}

#[derive(Subcommand, Debug)]
enum UsersSubcommand {
    List,
    SetStatus {
        user_id: String,
        #[arg(long)]
        active: bool,
    },
}

#[derive(Args, Debug)]
struct MethodsCommand {
    #[command(subcommand)]
    command: MethodsSubcommand,
}

#[derive(Subcommand, Debug)]
enum MethodsSubcommand {
    List {
        #[arg(long, default_value = "deposit")]
        kind: String,
    },
    Create {
        #[arg(long, help = "NewPaymentMethod fields as JSON")]
        data: String,
    },
    Delete {
        method_id: String,
    },
}

#[derive(Args, Debug)]
struct PromotionsCommand {
    #[command(subcommand)]
    command: PromotionsSubcommand,
}

#[derive(Subcommand, Debug)]
enum PromotionsSubcommand {
    List,
    Create {
        #[arg(long, help = "NewPromotion fields as JSON")]
        data: String,
    },
    Delete {
        promotion_id: String,
    },
}

#[derive(Args, Debug)]
struct TransactionsCommand {
    #[command(subcommand)]
    command: TransactionsSubcommand,
}

#[derive(Subcommand, Debug)]
enum TransactionsSubcommand {
    List {
        #[arg(long)]
        status: Option<String>,
    },
    SetStatus {
        transaction_id: String,
        #[arg(long)]
        status: String,
    },
}

#[derive(Args, Debug)]
struct GamesCommand {
    #[command(subcommand)]
    command: GamesSubcommand,
}

#[derive(Subcommand, Debug)]
enum GamesSubcommand {
    List,
    SetEnabled {
        game_id: String,
        #[arg(long)]
        enabled: bool,
    },
}

#[derive(Args, Debug)]
struct SlidersCommand {
    #[command(subcommand)]
    command: SlidersSubcommand,
}

#[derive(Subcommand, Debug)]
enum SlidersSubcommand {
    List,
    Create {
        #[arg(long, help = "NewSlider fields as JSON")]
        data: String,
    },
    Delete {
        slider_id: String,
    },
}

#[derive(Args, Debug)]
struct ContactCommand {
    #[command(subcommand)]
    command: ContactSubcommand,
}

#[derive(Subcommand, Debug)]
enum ContactSubcommand {
    Show,
    Set {
        #[arg(long, help = "ContactSettings fields as JSON")]
        data: String,
    },
}

/// Shared wiring: one store, one gateway, one session service.
struct Console {
    config: ConsoleConfig,
    gateway: Arc<Gateway>,
    session: SessionService,
}

impl Console {
    fn new(cli: &Cli) -> Result<Self, CliError> {
        let mut config = ConsoleConfig::from_env();
        if let Some(api_url) = &cli.api_url {
            config.api_base_url = api_url.trim_end_matches('/').to_owned();
        }

        let store: Arc<dyn CredentialStore> = Arc::new(FileStore::new(&cli.state_dir));
        let gateway = Arc::new(Gateway::new(&config, Arc::clone(&store))?);
        let session = SessionService::new(
            Arc::clone(&gateway) as Arc<dyn Backend>,
            store,
        );

        Ok(Self { config, gateway, session })
    }

    fn api(&self) -> &dyn Backend {
        self.gateway.as_ref()
    }

    /// Same decision the dashboard views make on navigation.
    fn require_session(&self) -> Result<(), CliError> {
        match guard_protected(self.session.is_authenticated()) {
            RouteDecision::Render => Ok(()),
            RouteDecision::Redirect(_) => Err(CliError::NotLoggedIn),
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    if let Err(error) = run(cli).await {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let console = Console::new(&cli)?;

    match cli.command {
        Command::Login { email, password } => {
            let session = console.session.login(&email, &password).await?;
            eprintln!("logged in as {}", session.profile.email);
            print_json(&serde_json::to_value(&session.profile)?)
        }
        Command::Logout => {
            console.session.logout().await?;
            eprintln!("logged out");
            Ok(())
        }
        Command::Whoami => match console.session.current_user() {
            Some(profile) => print_json(&serde_json::to_value(&profile)?),
            None => Err(CliError::NotLoggedIn),
        },
        Command::Users(users) => {
            console.require_session()?;
            run_users(&console, users).await
        }
        Command::Methods(methods) => {
            console.require_session()?;
            run_methods(&console, methods).await
        }
        Command::Promotions(promotions) => {
            console.require_session()?;
            run_promotions(&console, promotions).await
        }
        Command::Transactions(transactions) => {
            console.require_session()?;
            run_transactions(&console, transactions).await
        }
        Command::Games(games) => {
            console.require_session()?;
            run_games(&console, games).await
        }
        Command::Sliders(sliders) => {
            console.require_session()?;
            run_sliders(&console, sliders).await
        }
        Command::Contact(contact) => {
            console.require_session()?;
            run_contact(&console, contact).await
        }
    }
}

async fn run_users(console: &Console, users: UsersCommand) -> Result<(), CliError> {
    match users.command {
        UsersSubcommand::List => {
            let rows = resources::list_users(console.api()).await?;
            print_json(&serde_json::to_value(rows)?)
        }
        UsersSubcommand::SetStatus { user_id, active } => {
            let row = resources::set_user_status(console.api(), &user_id, active).await?;
            print_json(&serde_json::to_value(row)?)
        }
    }
}

async fn run_methods(console: &Console, methods: MethodsCommand) -> Result<(), CliError> {
    match methods.command {
        MethodsSubcommand::List { kind } => {
            let kind = parse_payment_kind(&kind)?;
            let rows = resources::list_payment_methods(console.api(), kind).await?;
            print_json(&serde_json::to_value(rows)?)
        }
        MethodsSubcommand::Create { data } => {
            let new_method: NewPaymentMethod = serde_json::from_str(&data)?;
            let row = resources::create_payment_method(console.api(), &new_method).await?;
            print_json(&serde_json::to_value(row)?)
        }
        MethodsSubcommand::Delete { method_id } => {
            resources::delete_payment_method(console.api(), &method_id).await?;
            eprintln!("deleted payment method {method_id}");
            Ok(())
        }
    }
}

async fn run_promotions(console: &Console, promotions: PromotionsCommand) -> Result<(), CliError> {
    match promotions.command {
        PromotionsSubcommand::List => {
            let rows = resources::list_promotions(console.api()).await?;
            print_json(&serde_json::to_value(rows)?)
        }
        PromotionsSubcommand::Create { data } => {
            let new_promotion: NewPromotion = serde_json::from_str(&data)?;
            let row = resources::create_promotion(console.api(), &new_promotion).await?;
            print_json(&serde_json::to_value(row)?)
        }
        PromotionsSubcommand::Delete { promotion_id } => {
            resources::delete_promotion(console.api(), &promotion_id).await?;
            eprintln!("deleted promotion {promotion_id}");
            Ok(())
        }
    }
}

async fn run_transactions(
    console: &Console,
    transactions: TransactionsCommand,
) -> Result<(), CliError> {
    match transactions.command {
        TransactionsSubcommand::List { status } => {
            let rows = resources::list_transactions(console.api(), status.as_deref()).await?;
            print_json(&serde_json::to_value(rows)?)
        }
        TransactionsSubcommand::SetStatus { transaction_id, status } => {
            let row =
                resources::set_transaction_status(console.api(), &transaction_id, &status).await?;
            print_json(&serde_json::to_value(row)?)
        }
    }
}

async fn run_games(console: &Console, games: GamesCommand) -> Result<(), CliError> {
    match games.command {
        GamesSubcommand::List => {
            let rows = resources::list_games(console.api()).await?;
            print_json(&serde_json::to_value(rows)?)
        }
        GamesSubcommand::SetEnabled { game_id, enabled } => {
            let row = resources::set_game_enabled(console.api(), &game_id, enabled).await?;
            print_json(&serde_json::to_value(row)?)
        }
    }
}

async fn run_sliders(console: &Console, sliders: SlidersCommand) -> Result<(), CliError> {
    match sliders.command {
        SlidersSubcommand::List => {
            let rows = resources::list_sliders(console.api()).await?;
            for slider in &rows {
                eprintln!("{}", console.config.asset_url(&slider.image_url));
            }
            print_json(&serde_json::to_value(rows)?)
        }
        SlidersSubcommand::Create { data } => {
            let new_slider: NewSlider = serde_json::from_str(&data)?;
            let row = resources::create_slider(console.api(), &new_slider).await?;
            print_json(&serde_json::to_value(row)?)
        }
        SlidersSubcommand::Delete { slider_id } => {
            resources::delete_slider(console.api(), &slider_id).await?;
            eprintln!("deleted slider {slider_id}");
            Ok(())
        }
    }
}

async fn run_contact(console: &Console, contact: ContactCommand) -> Result<(), CliError> {
    match contact.command {
        ContactSubcommand::Show => {
            let settings = resources::contact_settings(console.api()).await?;
            print_json(&serde_json::to_value(settings)?)
        }
        ContactSubcommand::Set { data } => {
            let settings: ContactSettings = serde_json::from_str(&data)?;
            let updated = resources::update_contact_settings(console.api(), &settings).await?;
            print_json(&serde_json::to_value(updated)?)
        }
    }
}

fn parse_payment_kind(raw: &str) -> Result<PaymentKind, CliError> {
    match raw {
        "deposit" => Ok(PaymentKind::Deposit),
        "withdraw" => Ok(PaymentKind::Withdraw),
        other => Err(CliError::UnknownPaymentKind(other.to_owned())),
    }
}

fn print_json(value: &serde_json::Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
