use std::io::{self, Write};

use chrono::Utc;
use clap::Args;

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::infra::auth::AuthClient;
use crate::services::{AuthService, SignUpOutcome};
use crate::session::Session;

#[derive(Args, Debug, Clone)]
pub struct LoginArgs {
    /// Account email; prompted for when omitted.
    #[arg(long)]
    pub email: Option<String>,
    /// Print the Google OAuth URL instead of using a password.
    #[arg(long)]
    pub google: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SignupArgs {
    #[arg(long)]
    pub email: Option<String>,
}

pub async fn login(config: &AppConfig, args: LoginArgs) -> AppResult<()> {
    let auth = AuthClient::new(config);

    if args.google {
        println!("Open this URL in a browser to sign in with Google:");
        println!("{}", auth.authorize_url("google")?);
        return Ok(());
    }

    let email = resolve(args.email, "Email")?;
    let password = prompt("Password")?;
    let session = auth.sign_in(&email, &password).await?;
    session.save()?;
    println!("Signed in as {}", session.user.display_name());
    Ok(())
}

pub async fn signup(config: &AppConfig, args: SignupArgs) -> AppResult<()> {
    let auth = AuthClient::new(config);
    let email = resolve(args.email, "Email")?;
    let password = prompt("Password")?;

    match auth.sign_up(&email, &password).await? {
        SignUpOutcome::SignedIn(session) => {
            session.save()?;
            println!("Account created. Signed in as {}", session.user.display_name());
        }
        SignUpOutcome::ConfirmationRequired { email } => {
            println!("Account created. Check {email} for a confirmation link, then sign in.");
        }
    }
    Ok(())
}

pub fn logout() -> AppResult<()> {
    Session::clear()?;
    println!("Signed out.");
    Ok(())
}

pub fn whoami() -> AppResult<()> {
    let Some(session) = Session::load()? else {
        println!("Not signed in.");
        return Ok(());
    };
    println!("{} <{}>", session.user.display_name(), session.user.email);
    match session.expires_at() {
        Some(expiry) if session.is_expired(Utc::now()) => {
            println!("Session expired at {expiry}; sign in again.");
        }
        Some(expiry) => println!("Session valid until {expiry}."),
        None => {}
    }
    Ok(())
}

fn resolve(value: Option<String>, field: &str) -> AppResult<String> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => prompt(field),
    }
}

fn prompt(field: &str) -> AppResult<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{field}: ")?;
    stdout.flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}
