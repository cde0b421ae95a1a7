use clap::{Parser, Subcommand};
use keyhole::{
    db,
    repositories::user_repository::SqliteUserRepository,
    services::{
        auth_service::{AuthService, RegisterRequest},
        password::{PasswordHasher, DEFAULT_ROUNDS},
    },
};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "keyhole-cli")]
#[command(about = "CLI tool for managing keyhole users", long_about = None)]
struct Cli {
    /// SQLite database URL
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://data/keyhole.db")]
    database_url: String,

    /// PBKDF2 iteration count for new password hashes
    #[arg(long, env = "PBKDF2_ROUNDS", default_value_t = DEFAULT_ROUNDS)]
    pbkdf2_rounds: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// User management commands
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create a new user
    Create {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// List all users
    List {
        /// Maximum number of users to display
        #[arg(short, long, default_value_t = 100)]
        limit: i64,

        /// Offset for pagination
        #[arg(short = 'o', long, default_value_t = 0)]
        offset: i64,
    },
}

fn get_password(prompt: &str) -> anyhow::Result<String> {
    use std::io::{self, Write};
    print!("{}: ", prompt);
    io::stdout().flush()?;

    Ok(rpassword::read_password()?)
}

fn confirm_password(prompt: &str) -> anyhow::Result<(String, String)> {
    let password = get_password(prompt)?;
    let confirm = get_password("Confirm password")?;
    Ok((password, confirm))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Connect to database
    let pool = db::create_pool(&cli.database_url).await?;

    // Run migrations
    db::run_migrations(&pool).await?;

    let user_repository = Arc::new(SqliteUserRepository::new(pool.clone()));
    let auth_service = AuthService::new(user_repository, PasswordHasher::new(cli.pbkdf2_rounds));

    match cli.command {
        Commands::User { command } => match command {
            UserCommands::Create {
                name,
                email,
                password,
            } => {
                let password = match password {
                    Some(pw) => pw,
                    None => {
                        let (password, password_confirm) = confirm_password("Password")?;
                        if password != password_confirm {
                            eprintln!("❌ Passwords do not match");
                            std::process::exit(1);
                        }
                        password
                    }
                };

                let request = RegisterRequest {
                    name,
                    email,
                    password,
                };

                match auth_service.register(request).await {
                    Ok(user) => {
                        println!("✅ User created successfully!");
                        println!("  ID: {}", user.id);
                        println!("  Name: {}", user.name);
                        println!("  Email: {}", user.email);
                    }
                    Err(err) => {
                        eprintln!("❌ Failed to create user: {}", err);
                        std::process::exit(1);
                    }
                }
            }

            UserCommands::List { limit, offset } => {
                match auth_service.list_users(limit, offset).await {
                    Ok(users) => {
                        if users.is_empty() {
                            println!("No users found.");
                        } else {
                            println!("{:<5} {:<40} {:<30}", "ID", "Email", "Name");
                            println!("{}", "-".repeat(75));
                            for user in users {
                                println!("{:<5} {:<40} {:<30}", user.id, user.email, user.name);
                            }
                        }
                    }
                    Err(err) => {
                        eprintln!("❌ Failed to list users: {}", err);
                        std::process::exit(1);
                    }
                }
            }
        },
    }

    Ok(())
}
