//! CLI command definitions

use std::io::BufRead;

use anyhow::bail;
use anyhow::Context;
use checkpass::phc;
use checkpass::Checkpass;
use checkpass::OptionValue;
use checkpass::Options;
use clap::Parser;
use clap::Subcommand;

#[derive(Debug, Parser)]
#[command(name = "checkpass")]
#[command(about = "Verify and generate password hashes across schemes")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Verify the password read from stdin against a stored hash
    ///
    /// Exits with status 1 when the password does not match.
    Verify {
        /// Stored hash string
        hash: String,
    },

    /// Hash the password read from stdin
    ///
    /// Example usage:
    ///   checkpass newhash --id argon2i -o t_cost=2
    ///   checkpass newhash --pref bcrypt,10
    Newhash {
        /// Algorithm identifier, e.g. argon2i, scrypt, pbkdf2-sha256
        #[arg(long, conflicts_with = "pref")]
        id: Option<String>,

        /// OpenBSD-style preference such as `blowfish,12`
        #[arg(long)]
        pref: Option<String>,

        /// Scheme option as key=value, repeatable
        #[arg(short = 'o', long = "option", value_parser = parse_option)]
        options: Vec<(String, OptionValue)>,
    },

    /// Print the name of the scheme that owns a hash
    Identify {
        /// Stored hash string
        hash: String,
    },

    /// Decode a structured hash and print it as JSON
    Inspect {
        /// Stored hash in `$id$params$salt$checksum` layout
        hash: String,
    },
}

/// Result of one command: text for stdout and whether it succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub output: String,
    pub success: bool,
}

impl Outcome {
    fn ok(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            success: true,
        }
    }
}

/// Parse `key=value`; decimal values become integers.
pub fn parse_option(raw: &str) -> Result<(String, OptionValue), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {raw:?}"))?;
    if key.is_empty() {
        return Err(format!("empty option key in {raw:?}"));
    }
    let value = match value.parse::<i64>() {
        Ok(number) => OptionValue::Int(number),
        Err(_) => OptionValue::Text(value.to_string()),
    };
    Ok((key.to_string(), value))
}

/// Read the password from the first line of `input`, without its newline.
fn read_password(input: &mut impl BufRead) -> anyhow::Result<Vec<u8>> {
    let mut line = Vec::new();
    input
        .read_until(b'\n', &mut line)
        .context("Failed to read password from stdin")?;
    let password = line.strip_suffix(b"\n").unwrap_or(&line[..]);
    let password = password.strip_suffix(b"\r").unwrap_or(password);
    Ok(password.to_vec())
}

/// Run one command against `api`, reading any password from `input`.
///
/// # Errors
/// Any hashing error, or unreadable input
pub fn execute(command: &Command, api: &Checkpass, input: &mut impl BufRead) -> anyhow::Result<Outcome> {
    match command {
        Command::Verify { hash } => {
            let password = read_password(input)?;
            let matched = api.checkpass(password, hash)?;
            tracing::info!(matched, "verification finished");
            Ok(Outcome {
                output: if matched { "match" } else { "mismatch" }.to_string(),
                success: matched,
            })
        }
        Command::Newhash { id, pref, options } => {
            if id.is_none() && pref.is_none() {
                bail!("one of --id or --pref is required");
            }
            let password = read_password(input)?;
            let options = options
                .iter()
                .fold(Options::new(), |options, (key, value)| options.with(key, value.clone()));
            let hash = api.newhash(password, pref.as_deref(), id.as_deref(), &options)?;
            Ok(Outcome::ok(hash))
        }
        Command::Identify { hash } => Ok(Outcome::ok(api.identify(hash)?)),
        Command::Inspect { hash } => {
            let parsed = phc::decode(hash)?;
            let json = serde_json::to_string_pretty(&parsed).context("Failed to render hash as JSON")?;
            Ok(Outcome::ok(json))
        }
    }
}
