//! Tienda CLI - Database migrations and store management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! tienda-cli migrate
//!
//! # Inspect and change store settings
//! tienda-cli settings show
//! tienda-cli settings set-origin --lat -33.45 --lng -70.66
//! tienda-cli settings set-rates --base-fee 3500 --price-per-km 500 --enable
//!
//! # Price a distance
//! tienda-cli quote --distance-km 5.2
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `settings` - Show or update the store settings singleton
//! - `quote` - Apply the shipping cost formula to a distance

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tienda-cli")]
#[command(author, version, about = "Tienda CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Manage store settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Quote dynamic shipping for a road distance
    Quote {
        /// Road distance in kilometres
        #[arg(long)]
        distance_km: f64,

        /// Base fee (defaults to the stored setting)
        #[arg(long)]
        base_fee: Option<f64>,

        /// Price per kilometre (defaults to the stored setting)
        #[arg(long)]
        price_per_km: Option<f64>,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the current settings as JSON
    Show,
    /// Set the shipping origin (warehouse) coordinates
    SetOrigin {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
    },
    /// Set dynamic shipping rates
    SetRates {
        #[arg(long)]
        base_fee: f64,

        #[arg(long)]
        price_per_km: f64,

        /// Turn dynamic shipping on
        #[arg(long, conflicts_with = "disable")]
        enable: bool,

        /// Turn dynamic shipping off
        #[arg(long)]
        disable: bool,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Settings { action } => match action {
            SettingsAction::Show => commands::settings::show().await?,
            SettingsAction::SetOrigin { lat, lng } => {
                commands::settings::set_origin(lat, lng).await?;
            }
            SettingsAction::SetRates {
                base_fee,
                price_per_km,
                enable,
                disable,
            } => {
                let enabled = match (enable, disable) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                };
                commands::settings::set_rates(base_fee, price_per_km, enabled).await?;
            }
        },
        Commands::Quote {
            distance_km,
            base_fee,
            price_per_km,
        } => commands::quote::run(distance_km, base_fee, price_per_km).await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn negative_coordinates_parse() {
        let cli = Cli::try_parse_from([
            "tienda-cli", "settings", "set-origin", "--lat", "-33.45", "--lng", "-70.66",
        ])
        .expect("parses");
        assert!(matches!(
            cli.command,
            Commands::Settings {
                action: SettingsAction::SetOrigin { .. }
            }
        ));
    }
}
