use std::io;
use std::process::ExitCode;

use checkpass::Checkpass;
use checkpass::Registry;
use checkpass_cli::commands;
use checkpass_cli::config::Config;
use checkpass_cli::Cli;
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() -> Result<ExitCode, anyhow::Error> {
    // Logs go to stderr so stdout carries only the command output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "checkpass=info,checkpass_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    tracing::debug!(
        bcrypt_cost = config.defaults.bcrypt.cost,
        argon2_m_cost = config.defaults.argon2.m_cost,
        scrypt_ln = config.defaults.scrypt.ln,
        pbkdf2_rounds = config.defaults.pbkdf2.rounds,
        "Configuration loaded"
    );

    let api = Checkpass::new(Registry::with_defaults(&config.defaults));
    let outcome = commands::execute(&cli.command, &api, &mut io::stdin().lock())?;
    println!("{}", outcome.output);

    Ok(if outcome.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
