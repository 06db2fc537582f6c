//! Fashion Advisor CLI - database and user management tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply the embedded schema
//! fa-cli migrate
//!
//! # Create a user without going through the web form
//! fa-cli user create --name "Asha" --email asha@example.com --password 'long-secret' \
//!     --height 165 --weight 58 --skin-color wheatish --body-shape hourglass \
//!     --gender female --age 27
//! ```
//!
//! The database is taken from `FASHION_DATABASE_URL` (or `DATABASE_URL`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Args, Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "fa-cli")]
#[command(author, version, about = "Fashion Advisor CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user with a styling profile
    Create(CreateUserArgs),
}

#[derive(Args)]
struct CreateUserArgs {
    /// Display name
    #[arg(long)]
    name: String,

    /// Email address (must be unique)
    #[arg(short, long)]
    email: String,

    /// Password (at least 8 characters)
    #[arg(short, long)]
    password: String,

    /// Height in centimeters
    #[arg(long)]
    height: u16,

    /// Weight in kilograms
    #[arg(long)]
    weight: u16,

    /// Skin tone description
    #[arg(long)]
    skin_color: String,

    /// Body shape description
    #[arg(long)]
    body_shape: String,

    /// Gender
    #[arg(long)]
    gender: String,

    /// Age in years
    #[arg(long)]
    age: u16,
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
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Create(args) => {
                let profile = fashion_advisor_core::BodyProfile {
                    name: args.name,
                    gender: args.gender,
                    age: args.age,
                    height_cm: args.height,
                    weight_kg: args.weight,
                    skin_tone: args.skin_color,
                    body_shape: args.body_shape,
                };
                commands::user::create(&args.email, &args.password, &profile).await?;
            }
        },
    }
    Ok(())
}
