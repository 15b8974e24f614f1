use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use datacube_engine::{DataCube, DryRunExecutor, FlowExecutor, FlowHandle, Router};
use datacube_registry::{CatalogListing, SdkConfig};
use serde_json::{Map as JsonMap, Value};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "datacube", version, about = "Call DataCube flows by id, label or provider path")]
struct Cli {
    /// JSON file of flow records to use instead of the configured catalog
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show API status
    Status,
    /// Show account usage
    Usage,
    /// Show the authenticated account
    Me,
    /// Show the status of an asynchronous execution
    ExecutionStatus { id: String },
    /// List every reachable flow
    List {
        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },
    /// Call a flow
    Call {
        /// Flow path: `<label>`, `<provider>.<label>`, `teams.<team>.<label>`, or a raw id with --id
        path: String,
        /// Treat PATH as a raw backend id
        #[arg(long)]
        id: bool,
        /// Input as key=value; values that parse as JSON are sent as JSON
        #[arg(short = 'i', long = "input", value_parser = parse_input)]
        inputs: Vec<(String, Value)>,
        /// Inputs as one JSON object, merged under --input values
        #[arg(long)]
        inputs_json: Option<String>,
        /// Flow version; the latest version is used when omitted
        #[arg(long)]
        version: Option<String>,
        /// Print the outbound request instead of sending it
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = SdkConfig::load();
    if let Some(catalog) = &cli.catalog {
        config.catalog_path = Some(catalog.display().to_string());
    }

    match cli.command {
        Command::Call {
            path,
            id,
            inputs,
            inputs_json,
            version,
            dry_run,
        } => {
            let inputs = collect_inputs(inputs_json.as_deref(), inputs)?;
            let output = if dry_run {
                let sdk = DataCube::new(DryRunExecutor, config.catalog());
                run_call(sdk.router(), &path, id, inputs, version.as_deref()).await?
            } else {
                let sdk = DataCube::from_config(&config)?;
                run_call(sdk.router(), &path, id, inputs, version.as_deref()).await?
            };
            print_json(&output)
        }
        Command::List { json } => {
            let catalog = config.catalog();
            let listing = CatalogListing::from_flows(catalog.all_flows()?);
            if json {
                print_json(&serde_json::to_value(&listing)?)
            } else {
                println!("{}", listing.render_help());
                Ok(())
            }
        }
        Command::Status => print_json(&DataCube::from_config(&config)?.executor().status().await?),
        Command::Usage => print_json(&DataCube::from_config(&config)?.executor().usage().await?),
        Command::Me => print_json(&DataCube::from_config(&config)?.executor().me().await?),
        Command::ExecutionStatus { id } => {
            print_json(&DataCube::from_config(&config)?.executor().execution_status(&id).await?)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run_call<E: FlowExecutor>(
    router: Router<'_, E>,
    path: &str,
    by_id: bool,
    inputs: JsonMap<String, Value>,
    version: Option<&str>,
) -> Result<Value> {
    let handle: FlowHandle<'_, E> = if by_id { router.by_id(path) } else { router.route(path)? };
    let flow = handle.resolve()?;
    debug!(path, flow_id = %flow.id, scope = %handle.scope(), "calling flow");
    Ok(handle.call(inputs, version).await?)
}

fn collect_inputs(inputs_json: Option<&str>, pairs: Vec<(String, Value)>) -> Result<JsonMap<String, Value>> {
    let mut inputs = match inputs_json {
        Some(raw) => match serde_json::from_str::<Value>(raw).context("--inputs-json is not valid JSON")? {
            Value::Object(map) => map,
            other => return Err(anyhow!("--inputs-json must be a JSON object, got {}", other)),
        },
        None => JsonMap::new(),
    };
    inputs.extend(pairs);
    Ok(inputs)
}

fn parse_input(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{}'", raw));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
