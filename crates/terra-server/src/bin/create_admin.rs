//! Bootstrap an administrator account in the configured database.

use std::path::PathBuf;

use anyhow::bail;
use clap::Parser;
use tracing::info;
use uuid::Uuid;

use terra_api::auth::hash_password;
use terra_db::Database;
use terra_types::models::Role;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Parser, Debug)]
#[command(author, version, about = "Create a Terra admin account")]
struct Args {
    #[arg(long, default_value = "admin@example.com")]
    email: String,

    #[arg(long, default_value = "admin12345")]
    password: String,

    #[arg(long, default_value = "Admin User")]
    name: String,

    /// SQLite database file, shared with the server.
    #[arg(long, env = "TERRA_DB_PATH", default_value = "terra.db")]
    db_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "terra=info".into()),
        )
        .init();

    let args = Args::parse();
    let email = args.email.trim().to_lowercase();
    let name = args.name.trim();

    if !email.contains('@') {
        bail!("{} is not a valid email address", email);
    }
    if args.password.len() < MIN_PASSWORD_LEN {
        bail!("Password must be at least {MIN_PASSWORD_LEN} characters");
    }
    if name.is_empty() {
        bail!("Name must not be empty");
    }

    let db = Database::open(&args.db_path)?;
    let hash = hash_password(&args.password)?;

    let Some(user) = db.create_user(Uuid::new_v4(), &email, &hash, name, Role::Admin)? else {
        bail!("A user with email {} already exists", email);
    };

    info!("Created admin {} ({}) in {}", user.id, user.email, args.db_path.display());
    Ok(())
}
