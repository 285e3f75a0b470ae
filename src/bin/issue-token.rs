//! Mint a bearer token for local testing.
//!
//! Usage: `issue-token <member|manager|admin> [subject-uuid]`

use std::env;
use std::process::ExitCode;

use uuid::Uuid;

use facility_booking::config::Config;
use facility_booking::utils::jwt::{create_token, Role};

fn main() -> ExitCode {
    let mut args = env::args().skip(1);

    let role = match args.next().as_deref() {
        Some("member") => Role::Member,
        Some("manager") => Role::Manager,
        Some("admin") => Role::Admin,
        _ => {
            eprintln!("usage: issue-token <member|manager|admin> [subject-uuid]");
            return ExitCode::FAILURE;
        }
    };

    let subject = match args.next().map(|s| s.parse::<Uuid>()) {
        Some(Ok(id)) => id,
        Some(Err(e)) => {
            eprintln!("invalid subject: {}", e);
            return ExitCode::FAILURE;
        }
        None => Uuid::new_v4(),
    };

    let config = Config::from_env();
    match create_token(subject, role, &config.jwt_secret, config.jwt_expiration_hours) {
        Ok(token) => {
            eprintln!("subject: {}", subject);
            println!("{}", token);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
