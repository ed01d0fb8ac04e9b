//! vaultpack - password-protected encrypted file archives.
//!
//! Encrypts a directory into a directory of archive members and turns such
//! a directory back into the original files.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vaultpack::archive::{ArchiveMembers, DecryptOutcome, Decryptor, EncryptedArchive, Encryptor};
use vaultpack::config::{ArchiveConfig, MANIFEST_MEMBER, SALT_MEMBER};
use vaultpack::{storage, Error};

#[derive(Parser)]
#[command(name = "vaultpack")]
#[command(author, version, about, long_about = None)]
#[command(
    about = "Password-protected encrypted file archives",
    long_about = "Encrypts files with AES-256-GCM under a PBKDF2-derived key and stores them alongside an encrypted manifest and the salt."
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a file or directory into an archive directory
    Encrypt {
        /// File or directory to encrypt
        input: PathBuf,

        /// Directory to write archive members into
        output: PathBuf,

        /// Include hidden files and directories
        #[arg(long)]
        include_hidden: bool,

        /// Follow symbolic links
        #[arg(long)]
        follow_links: bool,

        /// Skip files larger than this many bytes
        #[arg(long)]
        max_file_size: Option<u64>,

        /// Encrypt on a single thread
        #[arg(long)]
        sequential: bool,

        /// Replace an existing archive in the output directory, removing its members
        #[arg(long)]
        force: bool,
    },

    /// Decrypt an archive directory
    Decrypt {
        /// Directory containing salt.bin, manifest.json.enc and .enc files
        archive: PathBuf,

        /// Directory to write recovered files into
        output: PathBuf,

        /// Fail if any file could not be recovered
        #[arg(long)]
        strict: bool,

        /// Decrypt on a single thread
        #[arg(long)]
        sequential: bool,
    },

    /// List the files recorded in an archive's manifest
    Ls {
        /// Directory containing salt.bin and manifest.json.enc
        archive: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Encrypt {
            input,
            output,
            include_hidden,
            follow_links,
            max_file_size,
            sequential,
            force,
        } => {
            let config = ArchiveConfig {
                parallel: !sequential,
                include_hidden,
                follow_links,
                max_file_size,
            };
            cmd_encrypt(&input, &output, &config, force)
        }

        Commands::Decrypt {
            archive,
            output,
            strict,
            sequential,
        } => {
            let config = ArchiveConfig {
                parallel: !sequential,
                ..ArchiveConfig::default()
            };
            cmd_decrypt(&archive, &output, &config, strict)
        }

        Commands::Ls { archive } => cmd_ls(&archive),
    }
}

fn prompt_password(prompt: &str) -> anyhow::Result<String> {
    match rpassword::prompt_password(prompt) {
        Ok(password) => Ok(password),
        Err(_) => {
            // No terminal: read a line from stdin instead.
            eprint!("{}", prompt);
            io::stderr().flush()?;
            let mut password = String::new();
            io::stdin()
                .read_line(&mut password)
                .context("failed to read password")?;
            Ok(password.trim_end_matches(['\r', '\n']).to_string())
        }
    }
}

fn cmd_encrypt(input: &Path, output: &Path, config: &ArchiveConfig, force: bool) -> anyhow::Result<()> {
    config.validate().map_err(Error::InvalidConfig)?;

    if !force && (output.join(SALT_MEMBER).exists() || output.join(MANIFEST_MEMBER).exists()) {
        bail!(
            "{} already contains an archive (use --force to overwrite)",
            output.display()
        );
    }

    let files = storage::collect_files(input, config)
        .with_context(|| format!("failed to collect files from {}", input.display()))?;
    if files.is_empty() {
        tracing::warn!(input = %input.display(), "no files to encrypt");
    }

    let password = prompt_password("Enter password: ")?;
    let confirm = prompt_password("Confirm password: ")?;
    if password != confirm {
        bail!("Passwords do not match");
    }
    if password.is_empty() {
        tracing::warn!("encrypting with an empty password");
    }

    let archive = Encryptor::new(config.clone()).encrypt(&files, &password)?;
    let count = archive.files.len();
    store(output, archive, force)?;

    println!("Encrypted {} file(s) into {}", count, output.display());
    Ok(())
}

/// Write `archive` into `output`, first removing a previous archive's
/// members when `replace` is set.
fn store(output: &Path, archive: EncryptedArchive, replace: bool) -> anyhow::Result<()> {
    if replace {
        storage::remove_members(output)
            .with_context(|| format!("failed to clear {}", output.display()))?;
    }
    storage::write_members(output, archive)
        .with_context(|| format!("failed to write archive to {}", output.display()))?;
    Ok(())
}

fn cmd_decrypt(archive: &Path, output: &Path, config: &ArchiveConfig, strict: bool) -> anyhow::Result<()> {
    let members = storage::read_members(archive)?;
    members.require_complete()?;

    let password = prompt_password("Password: ")?;
    let outcome = restore(&members, &password, output, config, strict)?;

    println!(
        "Decrypted {} file(s) into {}",
        outcome.files.len(),
        output.display()
    );
    Ok(())
}

/// Decrypt `members` and write the recovered files under `output`.
///
/// With `strict`, nothing is written unless every entry was recovered.
fn restore(
    members: &ArchiveMembers,
    password: &str,
    output: &Path,
    config: &ArchiveConfig,
    strict: bool,
) -> anyhow::Result<DecryptOutcome> {
    let outcome = Decryptor::new(config.clone()).decrypt_members(members, password)?;

    if !outcome.issues.is_empty() {
        println!("Skipped:");
        for issue in &outcome.issues {
            println!("  {}", issue);
        }
        println!();
    }
    if !outcome.unreferenced.is_empty() {
        println!("Not in manifest:");
        for name in &outcome.unreferenced {
            println!("  {}", name);
        }
        println!();
    }

    if strict && !outcome.is_complete() {
        bail!(
            "{} file(s) could not be recovered, nothing written",
            outcome.issues.len()
        );
    }

    storage::write_files(output, &outcome.files)
        .with_context(|| format!("failed to write files to {}", output.display()))?;

    Ok(outcome)
}

fn cmd_ls(archive: &Path) -> anyhow::Result<()> {
    let members = storage::read_members(archive)?;
    let salt = members
        .salt
        .as_deref()
        .ok_or_else(|| Error::InputIncomplete(format!("missing {}", SALT_MEMBER)))?;
    let manifest = members
        .manifest
        .as_deref()
        .ok_or_else(|| Error::InputIncomplete(format!("missing {}", MANIFEST_MEMBER)))?;

    let password = prompt_password("Password: ")?;
    let manifest = Decryptor::default().read_manifest(salt, manifest, &password)?;

    if manifest.is_empty() {
        println!("(empty)");
    } else {
        for entry in &manifest.files {
            let status = match members.files.get(&entry.encrypted_name) {
                Some(blob) => format!("{:>10}", blob.len()),
                None => format!("{:>10}", "missing"),
            };
            println!("{}  {}", status, entry.original_name);
        }
    }

    Ok(())
}
