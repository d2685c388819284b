//! Command-line interface for `esri2sf`, which downloads ArcGIS feature and map
//! service layers as simple-feature files.
//!
//! This binary is a thin façade over [`esri2sf_core`]: it parses arguments,
//! configures logging and delegates to the library.
//!
//! # Available Commands
//!
//! - `convert` - Download a layer and write it as `GeoJSON` or CSV
//! - `info` - Display layer metadata and fields
//! - `token` - Generate an access token for secured services

mod display;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use tracing::{Level, info};
use tracing_log::LogTracer;
use tracing_subscriber::FmtSubscriber;

use esri2sf_core::{
    ConvertOptions, Esri2SfError, GeometryType, HttpTransport, OutputFormat, TokenOptions,
    TransportConfig, WriterOptions, convert, describe_layer, generate_oauth_token, generate_token,
    write_table,
};

#[derive(Parser)]
#[command(
    name = "esri2sf",
    version,
    about = "Download ArcGIS feature services as simple features",
    long_about = "esri2sf queries an ArcGIS feature or map service layer, fetches every matching\n\
                  record in batches and writes the features as GeoJSON or CSV in EPSG:4326."
)]
/// Command-line arguments and options for the `esri2sf` CLI.
struct Cli {
    /// Enable verbose (INFO level) logging output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug (DEBUG level) logging output with detailed diagnostics.
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Downloads the features of a layer into a file.
    Convert {
        /// URL of the layer, e.g. `https://host/arcgis/rest/services/Parcels/FeatureServer/0`.
        #[arg(short, long, value_name = "URL")]
        url: String,

        /// Path of the output file.
        #[arg(short, long, value_name = "PATH")]
        output: PathBuf,

        /// Output format (`geojson` or `csv`); guessed from the output extension when omitted.
        #[arg(short, long, value_name = "FORMAT")]
        format: Option<OutputFormat>,

        /// SQL where clause selecting the records.
        #[arg(short, long = "where", value_name = "CLAUSE", default_value = "1=1")]
        where_clause: String,

        /// Comma separated fields to download.
        #[arg(long, value_name = "FIELDS", value_delimiter = ',', default_value = "*")]
        fields: Vec<String>,

        /// Token for secured services.
        #[arg(short, long, value_name = "TOKEN", default_value = "")]
        token: String,

        /// Geometry type of the layer; read from the layer metadata when omitted.
        #[arg(short, long, value_name = "TYPE")]
        geometry_type: Option<GeometryType>,

        /// Object ids per feature request (1 to 500).
        #[arg(long, value_name = "N", default_value_t = 500)]
        batch_size: usize,

        /// Feature requests in flight at once.
        #[arg(long, value_name = "N", default_value_t = 1)]
        concurrency: usize,

        /// Accept invalid TLS certificates.
        #[arg(long)]
        insecure: bool,

        /// Request timeout in seconds; 0 disables it.
        #[arg(long, value_name = "SECS", default_value_t = 120)]
        timeout: u64,

        /// Pretty-print `GeoJSON` output.
        #[arg(long)]
        pretty: bool,
    },

    /// Displays metadata and fields of a layer.
    Info {
        /// URL of the layer.
        #[arg(short, long, value_name = "URL")]
        url: String,

        /// Token for secured services.
        #[arg(short, long, value_name = "TOKEN", default_value = "")]
        token: String,

        /// Accept invalid TLS certificates.
        #[arg(long)]
        insecure: bool,
    },

    /// Generates an access token and prints it.
    ///
    /// Either `--token-url` with `--username` and `--password` (ArcGIS Server or
    /// Portal), or `--client-id` with `--client-secret` (ArcGIS Online OAuth).
    Token {
        /// The `generateToken` endpoint.
        #[arg(long, value_name = "URL", conflicts_with = "client_id")]
        token_url: Option<String>,

        #[arg(long, requires = "token_url")]
        username: Option<String>,

        #[arg(long, requires = "token_url")]
        password: Option<String>,

        /// OAuth application client id.
        #[arg(long, requires = "client_secret")]
        client_id: Option<String>,

        /// OAuth application client secret.
        #[arg(long, requires = "client_id")]
        client_secret: Option<String>,

        /// Token lifetime in minutes.
        #[arg(long, value_name = "MINUTES", default_value_t = 60)]
        expiration: u32,

        /// Accept invalid TLS certificates.
        #[arg(long)]
        insecure: bool,
    },
}

/// Entry point for the `esri2sf` command-line interface.
///
/// # Errors
///
/// Returns an error if command execution fails or if the logging system cannot be initialized.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    // Bridge logs from the `log` crate to the `tracing` ecosystem.
    LogTracer::init()?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Convert {
            url,
            output,
            format,
            where_clause,
            fields,
            token,
            geometry_type,
            batch_size,
            concurrency,
            insecure,
            timeout,
            pretty,
        } => {
            let mut options = ConvertOptions::default()
                .with_out_fields(fields)
                .with_where(where_clause)
                .with_token(token)
                .with_batch_size(batch_size)
                .with_concurrency(concurrency);
            options.geometry_type = geometry_type;

            let format = resolve_format(format, &output);
            let transport = transport_config(insecure, timeout);
            let writer_options = WriterOptions {
                pretty,
                ..WriterOptions::default()
            };
            handle_convert(&url, &output, format, &options, &transport, &writer_options).await?;
        },
        Commands::Info {
            url,
            token,
            insecure,
        } => {
            handle_info(&url, &token, &transport_config(insecure, 120)).await?;
        },
        Commands::Token {
            token_url,
            username,
            password,
            client_id,
            client_secret,
            expiration,
            insecure,
        } => {
            let request = match (token_url, client_id) {
                (Some(token_url), None) => TokenRequest::Server {
                    token_url,
                    username: username.unwrap_or_default(),
                    password: password.unwrap_or_default(),
                },
                (None, Some(client_id)) => TokenRequest::OAuth {
                    client_id,
                    client_secret: client_secret.unwrap_or_default(),
                },
                _ => {
                    return Err(anyhow!(
                        "Pass either --token-url with --username and --password, or --client-id with --client-secret."
                    ));
                },
            };
            let token = handle_token(request, expiration, &transport_config(insecure, 120)).await?;
            println!("{token}");
        },
    }

    Ok(())
}

fn transport_config(insecure: bool, timeout_secs: u64) -> TransportConfig {
    let timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));
    TransportConfig::default()
        .with_accept_invalid_certs(insecure)
        .with_timeout(timeout)
}

fn resolve_format(format: Option<OutputFormat>, output: &Path) -> OutputFormat {
    format
        .or_else(|| OutputFormat::from_path(output))
        .unwrap_or(OutputFormat::GeoJson)
}

/// Turns a library error into a CLI error carrying the user message and,
/// when there is one, a hint.
fn report(err: Esri2SfError) -> anyhow::Error {
    match err.recovery_suggestion() {
        Some(hint) => anyhow!("{}\nHint: {hint}", err.user_message()),
        None => anyhow!(err.user_message()),
    }
}

async fn handle_convert(
    url: &str,
    output: &Path,
    format: OutputFormat,
    options: &ConvertOptions,
    transport: &TransportConfig,
    writer_options: &WriterOptions,
) -> Result<()> {
    info!("Converting {url} to {} ({format})", output.display());

    let transport = HttpTransport::new(transport).map_err(|e| report(e.into()))?;
    let table = convert(&transport, url, options).await.map_err(report)?;
    write_table(&table, output, format, writer_options).map_err(|e| report(e.into()))?;

    println!(
        "Wrote {} {} feature(s) to {}",
        table.len(),
        table.geometry_type().simple_feature_name(),
        output.display()
    );
    Ok(())
}

async fn handle_info(url: &str, token: &str, transport: &TransportConfig) -> Result<()> {
    let transport = HttpTransport::new(transport).map_err(|e| report(e.into()))?;
    let summary = describe_layer(&transport, url, token).await.map_err(report)?;
    display::display_layer_summary(&summary);
    Ok(())
}

enum TokenRequest {
    Server {
        token_url: String,
        username: String,
        password: String,
    },
    OAuth {
        client_id: String,
        client_secret: String,
    },
}

async fn handle_token(
    request: TokenRequest,
    expiration: u32,
    transport: &TransportConfig,
) -> Result<String> {
    let transport = HttpTransport::new(transport).map_err(|e| report(e.into()))?;
    let token = match request {
        TokenRequest::Server {
            token_url,
            username,
            password,
        } => {
            let options = TokenOptions {
                expiration_minutes: expiration,
                ..TokenOptions::default()
            };
            generate_token(&transport, &token_url, &username, &password, &options).await
        },
        TokenRequest::OAuth {
            client_id,
            client_secret,
        } => generate_oauth_token(&transport, &client_id, &client_secret, expiration).await,
    };
    token.map_err(report)
}
