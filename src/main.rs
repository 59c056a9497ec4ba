use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use calculation_tracker::{
    create, delete_calculation, get_calculation, get_calculations_by_user, get_user,
    insert_calculation, insert_user, open_database, update_calculation_inputs, Calculation,
    CalculationResponse, Settings, User,
};

#[derive(Parser)]
#[command(name = "calc-tracker", about = "Track arithmetic calculations per user")]
struct Cli {
    /// TOML settings file (DATABASE_URL still overrides it)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the database schema
    Init,

    /// Register a user that calculations can belong to
    AddUser { username: String },

    /// Create and store a calculation
    Create {
        /// addition, subtraction, multiplication or division (any case)
        calculation_type: String,
        user_id: Uuid,
        #[arg(allow_negative_numbers = true)]
        inputs: Vec<f64>,
    },

    /// Show a calculation and its result
    Show { id: Uuid },

    /// List a user's calculations
    List { user_id: Uuid },

    /// Replace a calculation's inputs
    Update {
        id: Uuid,
        #[arg(allow_negative_numbers = true)]
        inputs: Vec<f64>,
    },

    /// Delete a calculation
    Delete { id: Uuid },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let settings = Settings::load_or_default(cli.config.as_deref())
        .context("Failed to load settings")?;
    let conn = open_database(&settings).context("Failed to open database")?;

    run(&conn, cli.command)
}

fn run(conn: &Connection, command: Command) -> Result<()> {
    match command {
        Command::Init => {
            println!("✓ Database ready");
        }

        Command::AddUser { username } => {
            let user = User::new(username);
            insert_user(conn, &user).context("Failed to add user")?;
            println!("✓ User {} added: {}", user.username, user.id);
        }

        Command::Create {
            calculation_type,
            user_id,
            inputs,
        } => {
            let calc = create(&calculation_type, user_id, inputs)?;
            insert_calculation(conn, &calc).context("Failed to store calculation")?;
            print_calculation(&calc)?;
        }

        Command::Show { id } => {
            let Some(calc) = get_calculation(conn, id)? else {
                bail!("Calculation {} not found", id);
            };
            print_calculation(&calc)?;
        }

        Command::List { user_id } => {
            if get_user(conn, user_id)?.is_none() {
                bail!("User {} not found", user_id);
            }

            let calculations = get_calculations_by_user(conn, user_id)?;
            for calc in &calculations {
                println!("{}  {}  = {}", calc.id(), calc, describe_result(calc));
            }
            println!("✓ {} calculations", calculations.len());
        }

        Command::Update { id, inputs } => {
            let calc = update_calculation_inputs(conn, id, inputs)
                .context("Failed to update calculation")?;
            print_calculation(&calc)?;
        }

        Command::Delete { id } => {
            if !delete_calculation(conn, id)? {
                bail!("Calculation {} not found", id);
            }
            println!("✓ Calculation {} deleted", id);
        }
    }

    Ok(())
}

fn describe_result(calc: &Calculation) -> String {
    match calc.get_result() {
        Ok(result) => result.to_string(),
        Err(e) => format!("error: {}", e),
    }
}

fn print_calculation(calc: &Calculation) -> Result<()> {
    let response = CalculationResponse::from(calc);
    println!("{}", serde_json::to_string_pretty(&response)?);
    println!("result: {}", describe_result(calc));
    Ok(())
}
