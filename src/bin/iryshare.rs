// src/bin/iryshare.rs
//! iryshare: share, open and manage access to encrypted files from the shell

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use iryshare_core::db::{self, open_index_db};
use iryshare_core::share::{
    grant_access, open_shared, rekey_share, revoke_access, share_file, upgrade_share, ShareUpdate,
};
use iryshare_core::{Address, Caller, DirStore, EnvelopeVersion};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "iryshare", version, about = "Permissioned file sharing")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

/// Who is acting, plus an optional wallet signature for signature-protected owner keys
#[derive(Debug, clap::Args)]
struct Identity {
    /// Wallet address of the caller
    #[arg(long = "as", value_name = "ADDRESS")]
    address: String,

    /// Wallet signature string
    #[arg(long, env = "IRYSHARE_SIGNATURE", hide_env_values = true)]
    signature: Option<String>,
}

impl Identity {
    fn caller(&self) -> Result<Caller> {
        let address = Address::parse(&self.address).context("invalid --as address")?;
        let caller = Caller::new(address);
        Ok(match &self.signature {
            Some(signature) => caller.with_signature(signature.clone()),
            None => caller,
        })
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Encrypt a file for recipients and upload its envelope
    Share {
        path: PathBuf,
        #[command(flatten)]
        identity: Identity,
        /// Recipient addresses
        #[arg(long = "to", value_name = "ADDRESS")]
        recipients: Vec<String>,
        /// Envelope version ("1.0" per-recipient, "2.0" shared key)
        #[arg(long)]
        version: Option<EnvelopeVersion>,
    },
    /// Decrypt a shared file
    Open {
        file_id: String,
        #[command(flatten)]
        identity: Identity,
        #[arg(long, short)]
        out: PathBuf,
    },
    /// Give addresses access
    Grant {
        file_id: String,
        #[command(flatten)]
        identity: Identity,
        #[arg(long = "to", value_name = "ADDRESS", required = true)]
        recipients: Vec<String>,
    },
    /// Take access away (run `rekey` afterwards for real revocation)
    Revoke {
        file_id: String,
        #[command(flatten)]
        identity: Identity,
        #[arg(long = "from", value_name = "ADDRESS", required = true)]
        recipients: Vec<String>,
    },
    /// Re-encrypt under a fresh content key
    Rekey {
        file_id: String,
        #[command(flatten)]
        identity: Identity,
    },
    /// Convert a legacy per-recipient share to the shared-key format
    Upgrade {
        file_id: String,
        #[command(flatten)]
        identity: Identity,
    },
    /// List files owned by, or shared with, an address
    List {
        address: String,
        #[arg(long)]
        shared_with: bool,
    },
    /// Show the envelope history of a file
    History { file_id: String },
    /// Dump the share index to JSON
    Export { path: PathBuf },
}

fn parse_addresses(raw: &[String]) -> Result<Vec<Address>> {
    iryshare_core::address::normalize_addresses(raw).context("invalid recipient address")
}

fn report(update: &ShareUpdate) {
    match update.history_version {
        Some(version) => println!(
            "envelope v{version} → {} ({} address(es) changed)",
            update.storage_address,
            update.changed.len()
        ),
        None => println!("nothing changed; current envelope {}", update.storage_address),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = iryshare_core::load_config();
    let store = DirStore::new(&config.paths.store_dir)
        .with_context(|| format!("cannot open envelope store {}", config.paths.store_dir))?;
    let mut index = open_index_db().context("failed to open share index")?;

    match args.command {
        Command::Share {
            path,
            identity,
            recipients,
            version,
        } => {
            let owner = identity.caller()?;
            let recipients = parse_addresses(&recipients)?;
            let version = version.unwrap_or(config.sharing.default_version);
            let shared = share_file(&store, &mut index, &path, &owner, &recipients, version)
                .with_context(|| format!("cannot share {}", path.display()))?;
            println!("{}  {}", shared.file_id, shared.storage_address);
        }
        Command::Open {
            file_id,
            identity,
            out,
        } => {
            let plaintext = open_shared(&store, &index, &file_id, &identity.caller()?)?;
            std::fs::write(&out, plaintext.expose_secret())
                .with_context(|| format!("cannot write {}", out.display()))?;
            info!(bytes = plaintext.expose_secret().len(), out = %out.display(), "decrypted");
        }
        Command::Grant {
            file_id,
            identity,
            recipients,
        } => {
            let update = grant_access(
                &store,
                &mut index,
                &file_id,
                &identity.caller()?,
                &parse_addresses(&recipients)?,
            )?;
            report(&update);
        }
        Command::Revoke {
            file_id,
            identity,
            recipients,
        } => {
            let update = revoke_access(
                &store,
                &mut index,
                &file_id,
                &identity.caller()?,
                &parse_addresses(&recipients)?,
            )?;
            report(&update);
        }
        Command::Rekey { file_id, identity } => {
            report(&rekey_share(&store, &mut index, &file_id, &identity.caller()?)?);
        }
        Command::Upgrade { file_id, identity } => {
            report(&upgrade_share(&store, &mut index, &file_id, &identity.caller()?)?);
        }
        Command::List {
            address,
            shared_with,
        } => {
            let address = Address::parse(&address)?;
            let records = if shared_with {
                db::list_shared_with(&index, &address)?
            } else {
                db::list_owned(&index, &address)?
            };
            for record in records {
                println!(
                    "{}  {:<32}  v{}  {}",
                    record.file_id, record.file_name, record.envelope_version, record.owner_address
                );
            }
        }
        Command::History { file_id } => {
            for entry in db::envelope_history(&index, &file_id)? {
                println!(
                    "{:>3}  {}  {}  {}",
                    entry.version,
                    entry.storage_address,
                    entry.created_at,
                    entry.superseded_at.as_deref().unwrap_or("current")
                );
            }
        }
        Command::Export { path } => {
            let total = iryshare_core::export_to_json(&index, &path)?;
            println!("Exported {total} file(s) → {}", path.display());
        }
    }

    Ok(())
}
