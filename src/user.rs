use clap::{Parser, Subcommand};
use artmart_server::shared::util::config;
use artmart_server::shared::types::account::Role;
use artmart_server::shared::handlers::postgres_handler::PostgresHandler as SharedPostgresHandler;
use artmart_server::market::handlers::postgres_handler::PostgresHandler as MarketPostgresHandler;

#[derive(Parser)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new user
    Add {
        email: String,
        name: String,
        #[arg(value_parser = validate_password)]
        password: String,
        #[arg(value_parser = validate_role)]
        role: String,
    },
    /// Delete a user and everything they own
    Delete { email: String },
    /// Reset a user's password
    Password {
        email: String,
        #[arg(value_parser = validate_password)]
        password: String,
    },
    /// Change a user's role
    Role {
        email: String,
        #[arg(value_parser = validate_role)]
        role: String,
    },
}

fn validate_password(password: &str) -> Result<String, String> {
    if password.len() < config::get_config().count.min_password_length ||
       password.len() > config::get_config().count.max_password_length {
        return Err(format!("Password must be {} - {} characters (inclusive) in length",
            config::get_config().count.min_password_length,
            config::get_config().count.max_password_length
        ).to_string());
    }
    Ok(password.to_string())
}

fn validate_role(role: &str) -> Result<String, String> {
    match Role::parse(role) {
        Some(_) => Ok(role.to_string()),
        None => Err("Role must be one of: user, manager, admin".to_string())
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let postgres_handler = SharedPostgresHandler::new().await.unwrap();
    match &cli.command {
        Commands::Add { email, name, password, role } => match postgres_handler.find_by_email(email).await {
            Some(_) => println!(
                "{}",
                format!("Error: User with email `{email}` and name `{name}` already exists")
            ),
            None => match postgres_handler
                .create_account(name, email, password, "", Role::parse(role).unwrap()).await {
                Ok(_) => println!("Successfully created account"),
                Err(_) => println!("db error"),
            },
        },
        Commands::Delete { email } => match postgres_handler.find_by_email(email).await {
            Some(user) => {
                let market_handler = MarketPostgresHandler::new().await.unwrap();
                match market_handler.delete_by_owner(&user.id).await {
                    Ok(_) => match postgres_handler.delete_account(&user.id).await {
                        Ok(_) => println!("Successfully deleted account"),
                        Err(_) => println!("db error"),
                    },
                    Err(_) => println!("db error"),
                }
            },
            None => println!("db error"),
        },
        Commands::Password { email, password } => match postgres_handler.find_by_email(email).await {
            Some(user) => match postgres_handler
                .change_password(&user.id, password)
                .await
            {
                Ok(_) => println!("Successfully changed password"),
                Err(_) => println!("db error"),
            },

            None => println!("db error"),
        },
        Commands::Role { email, role } => match postgres_handler.find_by_email(email).await {
            Some(user) => match postgres_handler
                .change_role(&user.id, Role::parse(role).unwrap())
                .await
            {
                Ok(_) => println!("Successfully changed role"),
                Err(_) => println!("db error"),
            },

            None => println!("db error"),
        },
    }
}
