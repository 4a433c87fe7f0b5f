use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;

use carteira_rs::{
    Email, PasswordHash, WalletName, create_user, create_wallet, default_chart_size, initialize_db,
};

const DEMO_EMAIL: &str = "demo@example.com";
const DEMO_PASSWORD: &str = "Carteira-Demo-Ledger-7291";

/// A utility for creating a test database for the carteira_rs server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    if output_path
        .extension()
        .is_none_or(|extension| extension.is_empty())
    {
        eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
        exit(1);
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let connection = Connection::open(output_path)?;

    initialize_db(&connection)?;

    println!("Creating demo user {DEMO_EMAIL}...");
    let password_hash =
        PasswordHash::from_raw_password(DEMO_PASSWORD, &[DEMO_EMAIL], PasswordHash::DEFAULT_COST)?;
    let user = create_user(Email::new(DEMO_EMAIL)?, password_hash, &connection)?;

    for name in ["Household", "Business"] {
        println!("Creating wallet {name} with {} accounts...", default_chart_size());
        create_wallet(user.id, WalletName::new(name)?, &connection)?;
    }

    println!("Success! Log in with {DEMO_EMAIL} and the password {DEMO_PASSWORD}");

    Ok(())
}
