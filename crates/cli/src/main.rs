//! Wear With Pride CLI - migrations and operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! wwp-cli migrate
//!
//! # Finish stock commits for paid orders a crash left half-done
//! wwp-cli checkout resume
//!
//! # Move an order through fulfillment
//! wwp-cli order status 42 shipped
//!
//! # Block an active user, or reactivate a blocked one
//! wwp-cli user toggle 7
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use wear_with_pride_core::{OrderId, OrderStatus, UserId};

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "wwp-cli")]
#[command(author, version, about = "Wear With Pride CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Checkout maintenance
    Checkout {
        #[command(subcommand)]
        action: CheckoutAction,
    },
    /// Order management
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },
    /// User management
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum CheckoutAction {
    /// Commit stock and clear carts for paid orders whose confirmation was
    /// interrupted
    Resume,
}

#[derive(Subcommand)]
enum OrderAction {
    /// Set an order's fulfillment status
    Status {
        /// Order ID
        id: OrderId,

        /// New status (`processing`, `shipped`, `delivered`, `cancelled`)
        status: OrderStatus,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Flip a user between active and blocked
    Toggle {
        /// User ID
        id: UserId,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await,
        Commands::Checkout { action } => match action {
            CheckoutAction::Resume => commands::checkout::resume().await,
        },
        Commands::Order { action } => match action {
            OrderAction::Status { id, status } => commands::order::set_status(id, status).await,
        },
        Commands::User { action } => match action {
            UserAction::Toggle { id } => commands::user::toggle(id).await,
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_order_status() {
        let cli = Cli::try_parse_from(["wwp-cli", "order", "status", "42", "shipped"]).unwrap();
        match cli.command {
            Commands::Order {
                action: OrderAction::Status { id, status },
            } => {
                assert_eq!(id, OrderId::new(42));
                assert_eq!(status, OrderStatus::Shipped);
            }
            _ => panic!("expected order status command"),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_status() {
        assert!(Cli::try_parse_from(["wwp-cli", "order", "status", "42", "lost"]).is_err());
        assert!(Cli::try_parse_from(["wwp-cli", "order", "status", "x", "shipped"]).is_err());
    }

    #[test]
    fn test_parse_user_toggle() {
        let cli = Cli::try_parse_from(["wwp-cli", "user", "toggle", "7"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::User {
                action: UserAction::Toggle { id }
            } if id == UserId::new(7)
        ));
        assert!(Cli::try_parse_from(["wwp-cli", "user", "toggle", "ada"]).is_err());
    }
}
