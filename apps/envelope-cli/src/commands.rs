//! Subcommand definitions and handlers

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use envelope_crypto::{CipherSuite, EnvelopeHex};
use tracing::info;

/// Message sealed and opened by `envelope smoke`
const SMOKE_MESSAGE: &str = "hello envelope - secret!";

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print a fresh 256-bit key as hex
    Keygen,

    /// Seal a payload and print the envelope as JSON
    Encrypt(EncryptArgs),

    /// Open an envelope and write the plaintext to stdout
    Decrypt(DecryptArgs),

    /// Round-trip a fixed message through every cipher suite
    Smoke,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Keygen => "keygen",
            Self::Encrypt(_) => "encrypt",
            Self::Decrypt(_) => "decrypt",
            Self::Smoke => "smoke",
        }
    }
}

#[derive(Args, Debug)]
pub struct EncryptArgs {
    /// Key as 64 hex characters
    #[arg(long, env = "ENVELOPE_KEY", hide_env_values = true)]
    key: String,

    /// Cipher suite (aes-256-gcm, chacha20-poly1305)
    #[arg(long, env = "ENVELOPE_SUITE", default_value_t = CipherSuite::default())]
    suite: CipherSuite,

    /// Payload given inline; stdin is read when neither --text nor --input is set
    #[arg(long, conflicts_with = "input")]
    text: Option<String>,

    /// Read the payload from a file
    #[arg(long)]
    input: Option<PathBuf>,

    /// Pretty-print the JSON record
    #[arg(long)]
    pretty: bool,
}

#[derive(Args, Debug)]
pub struct DecryptArgs {
    /// Key as 64 hex characters
    #[arg(long, env = "ENVELOPE_KEY", hide_env_values = true)]
    key: String,

    /// JSON envelope record; stdin is read when neither this nor --nonce is set
    #[arg(long, conflicts_with = "nonce")]
    envelope: Option<PathBuf>,

    /// Nonce as 24 hex characters
    #[arg(long, requires_all = ["tag", "ciphertext"])]
    nonce: Option<String>,

    /// Tag as 32 hex characters
    #[arg(long, requires = "nonce")]
    tag: Option<String>,

    /// Ciphertext as hex
    #[arg(long, requires = "nonce")]
    ciphertext: Option<String>,

    /// Cipher suite; overrides the suite named in a record
    #[arg(long, env = "ENVELOPE_SUITE")]
    suite: Option<CipherSuite>,
}

pub fn run(command: Command) -> Result<()> {
    match command {
        Command::Keygen => keygen(),
        Command::Encrypt(args) => encrypt(args),
        Command::Decrypt(args) => decrypt(args),
        Command::Smoke => smoke(),
    }
}

fn keygen() -> Result<()> {
    let key = envelope_crypto::generate_key()?;
    println!("{key}");
    Ok(())
}

fn encrypt(args: EncryptArgs) -> Result<()> {
    let payload = match (args.text, args.input) {
        (Some(text), _) => text.into_bytes(),
        (None, Some(path)) => read_file(&path)?,
        (None, None) => read_stdin()?,
    };

    let record = envelope_crypto::encrypt_with_suite(args.suite, &args.key, &payload)?;
    info!(suite = %record.suite, len = payload.len(), "sealed payload");

    let json = if args.pretty {
        serde_json::to_string_pretty(&record)?
    } else {
        serde_json::to_string(&record)?
    };
    println!("{json}");
    Ok(())
}

fn decrypt(args: DecryptArgs) -> Result<()> {
    let mut record = match (args.nonce, args.tag, args.ciphertext) {
        (Some(nonce_hex), Some(tag_hex), Some(ciphertext_hex)) => EnvelopeHex {
            suite: CipherSuite::default(),
            nonce_hex,
            tag_hex,
            ciphertext_hex,
        },
        // clap ties --nonce, --tag and --ciphertext together, so anything else is a record
        _ => {
            let raw = match &args.envelope {
                Some(path) => read_file(path)?,
                None => read_stdin()?,
            };
            serde_json::from_slice(&raw).context("Failed to parse envelope record")?
        }
    };
    if let Some(suite) = args.suite {
        record.suite = suite;
    }

    let plaintext = envelope_crypto::decrypt_envelope(&args.key, &record)?;
    info!(suite = %record.suite, len = plaintext.len(), "opened envelope");

    let mut stdout = io::stdout().lock();
    stdout.write_all(&plaintext)?;
    stdout.flush()?;
    Ok(())
}

fn smoke() -> Result<()> {
    for suite in CipherSuite::ALL {
        let key = envelope_crypto::generate_key()?;
        let record = envelope_crypto::encrypt_with_suite(suite, &key, SMOKE_MESSAGE)?;
        let recovered = envelope_crypto::decrypt_envelope(&key, &record)?;

        if recovered != SMOKE_MESSAGE.as_bytes() {
            bail!("{suite}: recovered plaintext does not match");
        }
        println!("{suite}: ok");
    }
    println!("encryption smoke test OK");
    Ok(())
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn read_stdin() -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    io::stdin()
        .read_to_end(&mut buf)
        .context("Failed to read stdin")?;
    Ok(buf)
}
