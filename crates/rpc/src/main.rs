//! Lombard CLI - Main entry point

use clap::{Args, Parser, Subcommand};
use lombard_rpc::{commands, AppContext};
use rust_decimal::Decimal;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "lombard")]
#[command(about = "Lombard - collateral-backed installment financing backoffice", long_about = None)]
struct Cli {
    /// Data directory path
    #[arg(short, long, default_value = "./data")]
    data: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Operator identity + reason, required for every mutating command
#[derive(Args)]
struct OperatorArgs {
    /// Operator id
    #[arg(long)]
    operator: String,

    /// Operator display name
    #[arg(long, default_value = "")]
    operator_name: String,

    /// Reason for the mutation (required, non-empty)
    #[arg(long)]
    reason: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Fund a new collateral investment for a user
    Fund {
        /// User id (UUID)
        user: Uuid,
        /// Principal amount
        amount: Decimal,
        #[command(flatten)]
        operator: OperatorArgs,
    },

    /// Adjust an investment's collateral value
    AdjustValue {
        /// Investment id
        investment: Uuid,
        /// New collateral value
        value: Decimal,
        #[command(flatten)]
        operator: OperatorArgs,
    },

    /// Draw a financing against an investment's credit limit
    Draw {
        /// Investment id
        investment: Uuid,
        /// Principal to draw
        amount: Decimal,
        /// Number of installments
        #[arg(long, default_value_t = 12)]
        installments: u32,
        /// First due date (RFC 3339); defaults to 30 days from now
        #[arg(long)]
        first_due: Option<String>,
        #[command(flatten)]
        operator: OperatorArgs,
    },

    /// Pay one installment
    Pay {
        /// Installment id
        installment: Uuid,
        #[command(flatten)]
        operator: OperatorArgs,
    },

    /// Waive an installment's penalty
    Waive {
        /// Installment id
        installment: Uuid,
        #[command(flatten)]
        operator: OperatorArgs,
    },

    /// Extend an installment's due date
    Extend {
        /// Installment id
        installment: Uuid,
        /// New due date (RFC 3339)
        new_date: String,
        #[command(flatten)]
        operator: OperatorArgs,
    },

    /// Forcibly liquidate a financing
    Liquidate {
        /// Financing id
        financing: Uuid,
        #[command(flatten)]
        operator: OperatorArgs,
    },

    /// Liquidate an investment with no active financings
    LiquidateInvestment {
        /// Investment id
        investment: Uuid,
        #[command(flatten)]
        operator: OperatorArgs,
    },

    /// Show a financing and its installment schedule
    ShowFinancing {
        /// Financing id
        financing: Uuid,
    },

    /// Show an investment
    ShowInvestment {
        /// Investment id
        investment: Uuid,
    },

    /// Show a user's account balance and transaction history
    Balance {
        /// User id
        user: Uuid,
    },
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let mut ctx = AppContext::new(&cli.data)?;

    match cli.command {
        Commands::Fund { user, amount, operator } => {
            let action = commands::action_context(&operator.operator, &operator.operator_name, &operator.reason)?;
            commands::fund(&mut ctx, user, amount, &action).await
        }
        Commands::AdjustValue { investment, value, operator } => {
            let action = commands::action_context(&operator.operator, &operator.operator_name, &operator.reason)?;
            commands::adjust_value(&mut ctx, investment, value, &action).await
        }
        Commands::Draw {
            investment,
            amount,
            installments,
            first_due,
            operator,
        } => {
            let action = commands::action_context(&operator.operator, &operator.operator_name, &operator.reason)?;
            commands::draw(&mut ctx, investment, amount, installments, first_due.as_deref(), &action).await
        }
        Commands::Pay { installment, operator } => {
            let action = commands::action_context(&operator.operator, &operator.operator_name, &operator.reason)?;
            commands::pay(&mut ctx, installment, &action).await
        }
        Commands::Waive { installment, operator } => {
            let action = commands::action_context(&operator.operator, &operator.operator_name, &operator.reason)?;
            commands::waive(&mut ctx, installment, &action).await
        }
        Commands::Extend { installment, new_date, operator } => {
            let action = commands::action_context(&operator.operator, &operator.operator_name, &operator.reason)?;
            commands::extend(&mut ctx, installment, &new_date, &action).await
        }
        Commands::Liquidate { financing, operator } => {
            let action = commands::action_context(&operator.operator, &operator.operator_name, &operator.reason)?;
            commands::liquidate(&mut ctx, financing, &action).await
        }
        Commands::LiquidateInvestment { investment, operator } => {
            let action = commands::action_context(&operator.operator, &operator.operator_name, &operator.reason)?;
            commands::liquidate_investment(&mut ctx, investment, &action).await
        }
        Commands::ShowFinancing { financing } => commands::show_financing(&ctx, financing).await,
        Commands::ShowInvestment { investment } => commands::show_investment(&ctx, investment).await,
        Commands::Balance { user } => commands::balance(&ctx, user).await,
    }
}
