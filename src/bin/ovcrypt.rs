//! ovcrypt CLI - password-encrypted, link-shareable text
//!
//! Command-line front end for sealing files into `[OV_v2]` tokens or
//! shareable links, and opening them again.

use clap::{ArgAction, Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use ovcrypt::file_ops::{self, TokenForm, TokenSource};
use ovcrypt::passphrase::{PassphraseReader, ReaderPassphraseReader, TerminalPassphraseReader};

#[derive(Parser)]
#[command(name = "ovcrypt")]
#[command(version)]
#[command(about = "Password-encrypted, link-shareable text.", long_about = None)]
struct Cli {
    /// Read password from stdin instead of from terminal
    #[arg(long, global = true)]
    passphrase_stdin: bool,

    /// Address of the decrypt page that shareable links point to
    #[arg(
        long,
        global = true,
        env = "OVCRYPT_DECRYPT_URL",
        default_value = "decrypt.html",
        value_name = "URL"
    )]
    decrypt_url: String,

    /// More log output on stderr (-v debug, -vv trace); overrides RUST_LOG
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a file into a token
    #[command(alias = "e")]
    Encrypt {
        /// Path to the file whose contents is to be encrypted
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to write the token to (stdout if omitted)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Write a shareable link instead of the bare token
        #[arg(long)]
        link: bool,
    },

    /// Decrypt a token, link, or displayed payload
    #[command(alias = "d")]
    Decrypt {
        /// Path to the file holding the encrypted data
        #[arg(short, long, value_name = "FILE", required_unless_present = "token")]
        input: Option<PathBuf>,

        /// Encrypted data given directly on the command line
        #[arg(long, value_name = "TEXT", conflicts_with = "input")]
        token: Option<String>,

        /// Path to the file to write the decrypted content to
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// How many wrong passwords to allow at the terminal prompt
        #[arg(long, default_value_t = 1, value_name = "N")]
        attempts: u32,
    },

    /// Turn a stored token into a shareable link
    #[command(alias = "l")]
    Link {
        /// Path to the file holding the token
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Encrypt {
            input,
            output,
            link,
        } => {
            let mut reader = get_passphrase_reader(cli.passphrase_stdin);
            let form = if link {
                TokenForm::Link(cli.decrypt_url)
            } else {
                TokenForm::Token
            };
            file_ops::encrypt_file(&input, output.as_deref(), &mut *reader, &form)
        }
        Commands::Decrypt {
            input,
            token,
            output,
            attempts,
        } => {
            let mut reader = get_passphrase_reader(cli.passphrase_stdin);
            // stdin is read to the end on the first attempt; there is no second password.
            let attempts = if cli.passphrase_stdin { 1 } else { attempts };
            let source = match (&input, &token) {
                (_, Some(text)) => TokenSource::Text(text),
                (Some(path), None) => TokenSource::File(path),
                (None, None) => {
                    eprintln!("Error: either --input or --token is required");
                    process::exit(2);
                }
            };
            file_ops::decrypt_file(source, &output, &mut *reader, attempts)
        }
        Commands::Link { input } => file_ops::link_file(&input, &cli.decrypt_url).map(|link| {
            println!("{}", link);
        }),
    };

    if let Err(e) = result {
        tracing::debug!(kind = ?e.kind, category = ?e.category, "command failed");
        eprintln!("Error: {}", error_chain(&e));
        process::exit(1);
    }
}

/// "outer: inner: innermost", the way the error was wrapped.
fn error_chain(err: &dyn Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("ovcrypt=debug"),
        _ => EnvFilter::new("ovcrypt=trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn get_passphrase_reader(use_stdin: bool) -> Box<dyn PassphraseReader> {
    if use_stdin {
        Box::new(ReaderPassphraseReader::new(Box::new(std::io::stdin())))
    } else {
        Box::new(TerminalPassphraseReader)
    }
}
