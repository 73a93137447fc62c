//! CLI module for the FuelPoa command-line client.
//!
//! Every page of the client is a subcommand:
//! - `login` / `attendant-login` / `register` / `logout` / `whoami`
//! - `wallet ...` - customer wallet, history and cards
//! - `pos ...` - attendant point of sale
//! - `admin ...` - station reporting
//! - `config check` - validate configuration file
//!
//! Page commands open their route through the router first; a redirect or
//! forced logout ends the command with a non-zero exit.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing::warn;

use crate::admin::{self, DateFilter};
use crate::auth::LoginRequest;
use crate::config::{ApiMode, Config};
use crate::money::{amount_for, format_amount, format_kes, format_litres};
use crate::pos::PosTerminal;
use crate::router::Route;
use crate::session::{AdminSession, AreaSession, AttendantSession, CustomerSession, LoginRole};
use crate::validation::{parse_amount, validate_credentials, RegistrationForm};
use crate::wallet::{self, LOYALTY_POINTS_PER_AWARD, LOYALTY_THRESHOLD_LITRES};
use crate::FuelPoa;

/// CLI arguments structure
#[derive(Parser, Debug)]
#[command(name = "fuelpoa")]
#[command(author, version, about = "Fuel wallet and station point-of-sale client", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "fuelpoa.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Backend URL (overrides api.base_url)
    #[arg(long, env = "FUELPOA_API_URL")]
    pub api_url: Option<String>,

    /// Answer every request from demo data instead of the backend
    #[arg(long)]
    pub demo: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in with phone or national ID
    Login {
        /// Phone number or national ID
        #[arg(short, long)]
        identifier: String,
        #[arg(short, long, env = "FUELPOA_PASSWORD")]
        password: String,
        /// Customer, Fuel Attendant, Station Admin or Super Admin
        #[arg(short, long, default_value = "Customer")]
        role: LoginRole,
    },

    /// Sign in at the attendant terminal
    AttendantLogin {
        #[arg(short, long)]
        employee_id: String,
        #[arg(short, long, env = "FUELPOA_PASSWORD")]
        password: String,
    },

    /// Create a new account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        national_id: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
        #[arg(long, default_value = "Customer")]
        account_type: LoginRole,
    },

    /// Sign out and forget the saved session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Customer wallet commands
    #[command(subcommand)]
    Wallet(WalletCommands),

    /// Attendant point-of-sale commands
    #[command(subcommand)]
    Pos(PosCommands),

    /// Station admin reports
    #[command(subcommand)]
    Admin(AdminCommands),

    /// Configuration management commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Wallet subcommands
#[derive(Subcommand, Debug)]
pub enum WalletCommands {
    /// Balance, loyalty points and progress
    Stats,
    /// Top up via M-Pesa STK push
    Topup {
        #[arg(short, long)]
        amount: String,
        /// M-Pesa phone number
        #[arg(short, long)]
        phone: String,
    },
    /// Recent transactions
    History {
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
    /// Fuel cards on the account
    Cards,
    /// Activate a card with its PIN
    Activate {
        #[arg(long)]
        card: String,
        #[arg(long)]
        pin: String,
    },
}

/// POS subcommands
#[derive(Subcommand, Debug)]
pub enum PosCommands {
    /// List fuel products and prices
    Products,
    /// Look up a customer card
    Lookup {
        /// 10-character card number
        card: String,
    },
    /// Charge a card for fuel
    Sell {
        #[arg(long)]
        card: String,
        /// Product ID from `pos products`
        #[arg(long)]
        product: u32,
        /// Amount in KES
        #[arg(long)]
        amount: String,
    },
    /// Litres for an amount, or the amount for `--litres`
    Quote {
        #[arg(long)]
        product: u32,
        #[arg(long, required_unless_present = "litres")]
        amount: Option<String>,
        #[arg(long, conflicts_with = "amount")]
        litres: Option<String>,
    },
}

/// Admin subcommands
#[derive(Subcommand, Debug)]
pub enum AdminCommands {
    /// Sales summary for a period
    Summary {
        /// today, yesterday, this_week or this_month
        #[arg(long, default_value = "today")]
        period: DateFilter,
    },
    /// Attendant performance
    Attendants,
    /// Station transaction log
    Transactions {
        #[arg(long, default_value = "today")]
        period: DateFilter,
        /// Only show the most recent N
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Write the log as CSV to this file
        #[arg(long)]
        export: Option<PathBuf>,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate configuration file
    Check,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded config
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(url) = &self.api_url {
            config.api.base_url = url.clone();
        }
        if self.demo {
            config.api.mode = ApiMode::Demo;
        }
    }
}

/// Run a CLI command
pub async fn run_command(cli: &Cli, mut config: Config) -> Result<()> {
    if let Commands::Config(ConfigCommands::Check) = &cli.command {
        return cmd_config_check(cli);
    }

    cli.apply_overrides(&mut config);
    let mut client = FuelPoa::from_config(config)?;

    match &cli.command {
        Commands::Login {
            identifier,
            password,
            role,
        } => cmd_login(&mut client, LoginRequest::new(identifier, password, *role)).await,
        Commands::AttendantLogin {
            employee_id,
            password,
        } => cmd_login(&mut client, LoginRequest::attendant(employee_id, password)).await,
        Commands::Register {
            name,
            national_id,
            phone,
            email,
            password,
            confirm_password,
            account_type,
        } => {
            let form = RegistrationForm {
                name: name.clone(),
                national_id: national_id.clone(),
                phone: phone.clone(),
                email: email.clone(),
                password: password.clone(),
                confirm_password: confirm_password.clone(),
            };
            cmd_register(&mut client, &form, *account_type).await
        }
        Commands::Logout => {
            client.logout();
            println!("[OK] Signed out");
            Ok(())
        }
        Commands::Whoami => {
            cmd_whoami(&client);
            Ok(())
        }
        Commands::Wallet(command) => cmd_wallet(&mut client, command).await,
        Commands::Pos(command) => cmd_pos(&mut client, command).await,
        Commands::Admin(command) => cmd_admin(&mut client, command).await,
        Commands::Config(ConfigCommands::Check) => Ok(()),
    }
}

/// Open a protected page, turning a guard redirect into a failed command
fn open<S: AreaSession>(client: &mut FuelPoa, route: Route) -> Result<S> {
    client.enter::<S>(route).map_err(|e| {
        warn!(route = %route, "Page guard refused access");
        anyhow::anyhow!(e)
    })
}

async fn cmd_login(client: &mut FuelPoa, request: LoginRequest) -> Result<()> {
    validate_credentials(&request.identifier, &request.password)?;
    let outcome = client.login(&request).await?;
    let identity = outcome.session.identity();

    println!("[OK] Signed in as {} ({})", identity.name, identity.role);
    if let Some(station) = &identity.station {
        println!("Station:    {}", station);
    }
    println!("Redirect:   {}", outcome.redirect);
    Ok(())
}

async fn cmd_register(client: &mut FuelPoa, form: &RegistrationForm, account_type: LoginRole) -> Result<()> {
    form.validate()?;
    let message = client.register(form, account_type).await?;
    println!("[OK] {}", message);
    println!("Redirect:   {}", client.auth().router().current());
    Ok(())
}

fn cmd_whoami(client: &FuelPoa) {
    match client.auth().current_identity() {
        Some(identity) => {
            println!("=== Signed In ===");
            println!();
            println!("Name:       {}", identity.name);
            println!("ID:         {}", identity.id);
            println!("Role:       {}", identity.role);
            if let Some(phone) = &identity.phone {
                println!("Phone:      {}", phone);
            }
            if let Some(station) = &identity.station {
                println!("Station:    {}", station);
            }
            println!("Area:       {}", client.auth().router().area());
            println!("Home:       {}", client.auth().router().current());
            println!("API mode:   {}", client.gateway().mode());
        }
        None => println!("Not signed in. Run `fuelpoa login` first."),
    }
}

async fn cmd_wallet(client: &mut FuelPoa, command: &WalletCommands) -> Result<()> {
    match command {
        WalletCommands::Stats => {
            let session: CustomerSession = open(client, Route::Dashboard)?;
            let overview = wallet::dashboard(client, &session).await?;
            let stats = &overview.stats;
            let loyalty = &overview.loyalty;

            println!("=== Welcome back, {} ===", session.identity().name);
            println!();
            println!("Balance:        {}", format_kes(stats.balance));
            println!("Loyalty Points: {}", stats.loyalty_points);
            println!("Litres Used:    {}", format_litres(stats.total_litres_consumed));
            println!("Active Cards:   {}", stats.active_cards);
            println!();
            println!(
                "Loyalty: {} / {} L toward the next {} points ({}%)",
                loyalty.progress_litres.round_dp(1),
                LOYALTY_THRESHOLD_LITRES,
                LOYALTY_POINTS_PER_AWARD,
                loyalty.percent.round_dp(0)
            );
            println!("          {} more to go", format_litres(loyalty.litres_needed));
            Ok(())
        }
        WalletCommands::Topup { amount, phone } => {
            let session: CustomerSession = open(client, Route::WalletTopUp)?;
            let amount = parse_amount(amount)?;
            let receipt = wallet::top_up(client, &session, amount, phone).await?;
            println!("[OK] {}", receipt.message);
            Ok(())
        }
        WalletCommands::History { limit } => {
            let session: CustomerSession = open(client, Route::History)?;
            let records = wallet::history(client, &session).await?;

            println!("=== Transaction History ===");
            println!();
            if records.is_empty() {
                println!("No transactions yet.");
                return Ok(());
            }
            for record in records.iter().take(*limit) {
                let detail = match (&record.station_name, record.litres) {
                    (Some(station), Some(litres)) => {
                        format!("{} at {}", format_litres(litres), station)
                    }
                    _ => record.reference.clone(),
                };
                println!(
                    "{}  {:<18} {:>16}  {:<10} {}",
                    record.date.format("%Y-%m-%d %H:%M"),
                    record.kind.label(),
                    format_kes(record.amount),
                    record.status,
                    detail
                );
            }
            Ok(())
        }
        WalletCommands::Cards => {
            let session: CustomerSession = open(client, Route::Cards)?;
            let cards = wallet::cards(client, &session).await?;

            println!("=== Fuel Cards ===");
            println!();
            if cards.is_empty() {
                println!("No cards on this account.");
            }
            for card in &cards {
                println!(
                    "Card {} (**** {}) [{}]  limit {}  used {}  remaining {}",
                    card.id,
                    card.number_last4,
                    card.status,
                    format_kes(card.daily_limit),
                    format_kes(card.used_today),
                    format_kes(card.remaining_today())
                );
            }
            Ok(())
        }
        WalletCommands::Activate { card, pin } => {
            let session: CustomerSession = open(client, Route::Cards)?;
            let message = wallet::activate_card(client, &session, card, pin).await?;
            println!("[OK] {}", message);
            Ok(())
        }
    }
}

async fn cmd_pos(client: &mut FuelPoa, command: &PosCommands) -> Result<()> {
    let session: AttendantSession = open(client, Route::AttendantTransaction)?;
    let mut terminal = PosTerminal::for_client(client);

    match command {
        PosCommands::Products => {
            println!("=== {} ===", client.config().station.name);
            println!();
            for product in terminal.catalog() {
                println!(
                    "{:>3}  {:<16} KES {}/L",
                    product.id,
                    product.name,
                    format_amount(product.price_per_litre)
                );
            }
            Ok(())
        }
        PosCommands::Lookup { card } => {
            let result = terminal.lookup_card(client, card).await.cloned();
            let details = match result {
                Ok(details) => details,
                Err(e) => {
                    if let Some(details) = terminal.card() {
                        print_card(details);
                    }
                    return Err(e.into());
                }
            };
            print_card(&details);
            println!();
            println!("[OK] {}", terminal.message());
            Ok(())
        }
        PosCommands::Sell {
            card,
            product,
            amount,
        } => {
            let amount = parse_amount(amount)?;
            terminal.lookup_card(client, card).await?;
            println!("{}", terminal.message());

            let receipt = terminal
                .submit_sale(client, &session, *product, amount)
                .await?;
            println!();
            println!("=== Receipt ===");
            println!("Customer:   {}", receipt.customer_name);
            println!("Product:    {}", receipt.product.name);
            println!("Litres:     {}", format_litres(receipt.litres));
            println!("Amount:     {}", format_kes(receipt.amount));
            println!();
            println!("[OK] {}", receipt.message);

            let summary = terminal.summary();
            println!();
            println!(
                "Today: {} sale(s), {}, {}",
                summary.transactions,
                format_kes(summary.total_sales),
                format_litres(summary.litres_dispensed)
            );
            Ok(())
        }
        PosCommands::Quote {
            product,
            amount,
            litres,
        } => {
            if let Some(litres) = litres {
                let litres = parse_amount(litres)?;
                let product = terminal
                    .product(*product)
                    .with_context(|| format!("Unknown fuel product: {}", product))?;
                println!(
                    "{} of {} = {}",
                    format_litres(litres),
                    product.name,
                    format_kes(amount_for(litres, product.price_per_litre))
                );
                return Ok(());
            }

            let amount = parse_amount(amount.as_deref().unwrap_or_default())?;
            let quote = terminal.quote(*product, amount)?;
            println!(
                "{} of {} = {}",
                format_kes(quote.amount),
                quote.product.name,
                format_litres(quote.litres)
            );
            Ok(())
        }
    }
}

fn print_card(details: &crate::pos::CardDetails) {
    println!("=== Card ===");
    println!("Customer:   {}", details.customer_name);
    println!("Status:     {}", details.status);
    println!("Balance:    {}", format_kes(details.wallet_balance));
    println!("Daily cap:  {}", format_kes(details.daily_limit));
}

async fn cmd_admin(client: &mut FuelPoa, command: &AdminCommands) -> Result<()> {
    let session: AdminSession = open(client, Route::AdminDashboard)?;

    match command {
        AdminCommands::Summary { period } => {
            let summary = admin::summary(client, &session, *period).await?;

            println!("=== {} - {} ===", client.config().station.name, period);
            println!();
            println!(
                "Total Sales:     {} ({})",
                format_kes(summary.total_sales),
                format_change(summary.sales_change)
            );
            println!(
                "Transactions:    {} ({})",
                summary.transactions,
                format_change(summary.transactions_change)
            );
            println!(
                "Litres:          {} ({})",
                format_litres(summary.litres_dispensed),
                format_change(summary.litres_change)
            );
            println!("Loyalty Points:  {}", summary.loyalty_awarded);
            println!("Attendants:      {} active", summary.active_attendants);
            Ok(())
        }
        AdminCommands::Attendants => {
            let rows = admin::attendants(client, &session).await?;

            println!("=== Attendant Performance ===");
            println!();
            for row in &rows {
                let icon = match row.status {
                    admin::AttendantStatus::Active => "[OK]",
                    admin::AttendantStatus::Offline => "[--]",
                };
                println!(
                    "{} {:<20} {:>4} tx  {}",
                    icon,
                    row.name,
                    row.transactions,
                    format_kes(row.sales)
                );
            }
            Ok(())
        }
        AdminCommands::Transactions {
            period,
            limit,
            export,
        } => {
            let log = admin::transactions(client, &session, *period).await?;
            let shown = match limit {
                Some(n) => admin::recent(&log, *n),
                None => &log[..],
            };

            if let Some(path) = export {
                std::fs::write(path, admin::export_csv(shown))
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!(
                    "[OK] Exported {} transaction(s) to {}",
                    shown.len(),
                    path.display()
                );
                return Ok(());
            }

            println!("=== Transactions - {} ===", period);
            println!();
            if shown.is_empty() {
                println!("No transactions for this period.");
            }
            for tx in shown {
                println!(
                    "{}  {:<20} {:<10} {:>9}  {}",
                    tx.time,
                    tx.attendant,
                    tx.card,
                    format_litres(tx.litres),
                    format_kes(tx.amount)
                );
            }
            Ok(())
        }
    }
}

/// Signed percent change, e.g. `+12.5%`
fn format_change(change: Decimal) -> String {
    let change = change.round_dp(1).normalize();
    if change > Decimal::ZERO {
        format!("+{}%", change)
    } else {
        format!("{}%", change)
    }
}

fn cmd_config_check(cli: &Cli) -> Result<()> {
    let config_path = &cli.config;

    println!("Checking configuration file: {}", config_path.display());
    println!();

    if !config_path.exists() {
        println!(
            "[!!] Configuration file not found: {}",
            config_path.display()
        );
        println!();
        println!("The built-in defaults will be used.");
        println!("To create a custom configuration, copy fuelpoa.example.toml to fuelpoa.toml");
        return Ok(());
    }

    let mut config = Config::load(config_path)?;
    cli.apply_overrides(&mut config);

    let problems = config.validate();
    if problems.is_empty() {
        println!("[OK] Configuration file is valid!");
    } else {
        for problem in &problems {
            println!("[!!] {}", problem);
        }
    }

    println!();
    println!("=== Configuration Summary ===");
    println!();
    println!("API:");
    println!("  Mode:         {}", config.api.mode);
    println!("  Base URL:     {}", config.api.base_url);
    println!("  Timeout:      {}s", config.api.timeout_secs);
    println!();
    println!("Session:");
    println!("  State File:   {}", config.session.state_file.display());
    println!();
    println!("Station:");
    println!("  ID:           {}", config.station.station_id);
    println!("  Name:         {}", config.station.name);
    for product in &config.station.products {
        println!(
            "  Product {:>3}:  {} @ KES {}/L",
            product.id,
            product.name,
            format_amount(product.price_per_litre)
        );
    }
    println!();
    println!("Logging:");
    println!("  Level:        {}", config.logging.level);

    if !problems.is_empty() {
        anyhow::bail!("{} configuration problem(s) found", problems.len());
    }
    Ok(())
}
