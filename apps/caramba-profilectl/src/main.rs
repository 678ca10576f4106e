use anyhow::{Context, Result, bail};
use caramba_profile::{Profile, ProfileKind, parse_share_link, schema_version};
use clap::{Parser, Subcommand};
use console::style;
use std::path::PathBuf;
use std::process::exit;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod blob;
mod config;

use blob::BlobEncoding;
use config::ToolConfig;

#[derive(Parser)]
#[command(name = "caramba-profilectl")]
#[command(about = "Inspect, migrate and convert stored proxy profiles", long_about = None)]
struct Cli {
    /// Read and write blobs as hex instead of base64
    #[arg(long, global = true)]
    hex: bool,
    /// Fail on unknown transport or security values
    #[arg(long, global = true)]
    strict: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a stored blob and print it as JSON
    Decode {
        #[arg(long)]
        kind: ProfileKind,
        blob: String,
    },
    /// Encode a JSON profile at the current schema version
    Encode {
        #[arg(long)]
        kind: ProfileKind,
        file: PathBuf,
    },
    /// Rewrite a blob of any supported version at the current one
    Migrate {
        #[arg(long)]
        kind: ProfileKind,
        blob: String,
    },
    /// Print the schema version a blob was written with
    Version { blob: String },
    /// Convert a share link into a profile
    Import { link: String },
    /// Render a stored blob as a share link
    Export {
        #[arg(long)]
        kind: ProfileKind,
        blob: String,
        /// Remark placed in the link fragment
        #[arg(long, default_value = "")]
        name: String,
    },
}

fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "caramba_profilectl=info,caramba_profile=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("{}", style(format!("Error: {:#}", e)).red());
        exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = ToolConfig::load()?;
    if cli.hex {
        config.blob_encoding = BlobEncoding::Hex;
    }
    if cli.strict {
        config.decode.strict_discriminators = true;
    }
    let enc = config.blob_encoding;

    match cli.command {
        Commands::Decode { kind, blob } => {
            let bytes = enc.decode(&blob)?;
            let profile = Profile::decode_with(kind, &bytes, &config.decode)
                .with_context(|| format!("decoding {} profile", kind))?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
        Commands::Encode { kind, file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let mut profile: Profile = serde_json::from_str(&raw)
                .with_context(|| format!("parsing {}", file.display()))?;
            if profile.kind() != kind {
                bail!("{} holds a {} profile, expected {}", file.display(), profile.kind(), kind);
            }
            profile.initialize_default_values();
            println!("{}", enc.encode(&profile.encode()?));
        }
        Commands::Migrate { kind, blob } => {
            let bytes = enc.decode(&blob)?;
            let from = schema_version(&bytes)?;
            let migrated = Profile::migrate(kind, &bytes, &config.decode)
                .with_context(|| format!("migrating {} profile", kind))?;
            tracing::info!(
                "{} profile migrated from v{} to v{}",
                kind,
                from,
                Profile::current_version(kind)
            );
            println!("{}", enc.encode(&migrated));
        }
        Commands::Version { blob } => {
            let bytes = enc.decode(&blob)?;
            println!("{}", schema_version(&bytes)?);
        }
        Commands::Import { link } => {
            let imported = parse_share_link(&link)?;
            println!("{}", serde_json::to_string_pretty(&imported.profile)?);
            println!("{}", enc.encode(&imported.profile.encode()?));
        }
        Commands::Export { kind, blob, name } => {
            let bytes = enc.decode(&blob)?;
            let profile = Profile::decode_with(kind, &bytes, &config.decode)?;
            println!("{}", profile.to_share_link(&name)?);
        }
    }
    Ok(())
}
