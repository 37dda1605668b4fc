//! OTA Attest CLI
//!
//! Registers builds, answers update checks and migrates legacy metadata
//! against the configured database and package directory.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ota_attest::metadata::{self, LegacyMetadata};
use ota_attest::wire::{
    ApiCheckResponse, ArtifactChecksumResponse, LegacyCheckResponse, ValidateChecksumResponse,
};
use ota_attest::{BuildId, Engine, EngineConfig, NewRelease, PublicKey};

/// OTA firmware update negotiation and package attestation
#[derive(Parser)]
#[command(name = "ota-attest")]
#[command(version)]
struct Cli {
    /// JSON config file (defaults apply to anything it leaves out)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a build and attest its package
    Register {
        /// Build identifier
        #[arg(short, long)]
        build_id: String,

        /// Version string shown to devices
        #[arg(long)]
        version: String,

        /// Package file name inside the package directory
        #[arg(short, long)]
        artifact: Option<String>,

        /// Release time: RFC 3339 timestamp or YYYY-MM-DD (defaults to now)
        #[arg(long)]
        created_at: Option<String>,

        /// Patch notes (defaults to "Update to version {version}")
        #[arg(short, long)]
        patch_notes: Option<String>,
    },

    /// Answer an update check for a device's current build
    Check {
        /// The build the device runs
        build_id: String,

        /// Use the legacy response shape
        #[arg(long)]
        legacy: bool,
    },

    /// Compare a device-computed checksum with the stored one
    Validate { build_id: String, checksum: String },

    /// Hash and sign a package file without registering it
    Attest { filename: String },

    /// Verify a checksum signature
    Verify {
        checksum: String,
        signature: String,

        /// PEM public key (defaults to the configured signing key's)
        #[arg(long)]
        public_key: Option<PathBuf>,
    },

    /// Import a legacy metadata.json
    Import {
        file: PathBuf,

        /// Show what would be filled in without importing
        #[arg(long)]
        preview: bool,
    },

    /// Export the ledger as a legacy metadata.json
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List registered builds in release order
    List,

    /// Delete a build and its package
    Delete { build_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG takes precedence over --verbose
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };

    match &cli.command {
        Commands::Verify {
            checksum,
            signature,
            public_key,
        } => {
            let key = match public_key {
                Some(path) => {
                    let pem = std::fs::read_to_string(&path)
                        .with_context(|| format!("reading {}", path.display()))?;
                    PublicKey::from_pem(&pem)?
                }
                None => config.load_signing_key()?.public_key().clone(),
            };
            let valid = ota_attest::core::verify(checksum, signature, &key);
            print_json(&json!({ "checksum": checksum, "valid": valid }))?;
            if !valid {
                std::process::exit(1);
            }
            return Ok(());
        }
        Commands::Import {
            file,
            preview: true,
        } => {
            let metadata = read_metadata(file)?;
            print_json(&metadata::preview(&metadata))?;
            return Ok(());
        }
        _ => {}
    }

    let engine = Engine::open(config)?;

    match cli.command {
        Commands::Register {
            build_id,
            version,
            artifact,
            created_at,
            patch_notes,
        } => {
            let created_at = match created_at {
                Some(s) => match metadata::parse_date(&s) {
                    Some(t) => t,
                    None => bail!("unparseable release time {:?}", s),
                },
                None => chrono::Utc::now().timestamp_millis(),
            };
            let release = engine
                .register(NewRelease {
                    artifact_ref: artifact.unwrap_or_else(|| metadata::default_filename(&build_id)),
                    patch_notes: patch_notes.unwrap_or_else(|| format!("Update to version {}", version)),
                    build_id: BuildId::new(build_id)?,
                    version,
                    created_at,
                })
                .await?;
            let package = release
                .package
                .context("registration produced no package")?;
            print_json(&json!({
                "build_id": release.build.build_id,
                "version": release.build.version,
                "checksum": package.checksum.to_hex(),
                "signature": package.signature.to_hex(),
            }))?;
        }
        Commands::Check { build_id, legacy } => {
            let check = engine.check_update(&build_id).await?;
            if legacy {
                print_json(&LegacyCheckResponse::from(check))?;
            } else {
                print_json(&ApiCheckResponse::from(check))?;
            }
        }
        Commands::Validate { build_id, checksum } => {
            let result = engine.validate_checksum(&build_id, &checksum).await?;
            print_json(&ValidateChecksumResponse::new(build_id, result))?;
        }
        Commands::Attest { filename } => {
            let attestation = engine.attest_artifact(&filename).await?;
            print_json(&ArtifactChecksumResponse::new(filename, &attestation))?;
        }
        Commands::Import { file, .. } => {
            let metadata = read_metadata(&file)?;
            let now = chrono::Utc::now().timestamp_millis();
            let report = engine.import_metadata(&metadata, now).await?;
            for warning in &report.warnings {
                eprintln!("Warning: {}", warning);
            }
            print_json(&report)?;
        }
        Commands::Export { output } => {
            let text = engine.export_metadata().await?.to_json_pretty()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, text)
                        .with_context(|| format!("writing {}", path.display()))?;
                    info!(path = %path.display(), "metadata exported");
                }
                None => println!("{}", text),
            }
        }
        Commands::List => {
            let builds: Vec<_> = engine
                .list_builds()
                .await?
                .into_iter()
                .map(|r| {
                    json!({
                        "build_id": r.build.build_id,
                        "version": r.build.version,
                        "created_at": r.build.created_at,
                        "checksum": r.package.map(|p| p.checksum.to_hex()),
                    })
                })
                .collect();
            print_json(&builds)?;
        }
        Commands::Delete { build_id } => {
            let deleted = engine.delete_build(&build_id).await?;
            print_json(&json!({ "build_id": build_id, "deleted": deleted }))?;
        }
        Commands::Verify { .. } => unreachable!("handled before the engine is opened"),
    }

    Ok(())
}

fn read_metadata(path: &Path) -> Result<LegacyMetadata> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(LegacyMetadata::parse(&text)?)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
