//! mmc-cli: call the MapMyClient API through the same pipeline the
//! dashboard uses.
//!
//! Usage:
//!   mmc-cli get <path> [key=value ...]
//!   mmc-cli send <METHOD> <path> [json-body]
//!   mmc-cli stream <post-id> [--no-cache]
//!   mmc-cli config [--file <config.yaml>]

use anyhow::{anyhow, bail, Context};
use mapmyclient_sdk::auth::StaticTokenProvider;
use mapmyclient_sdk::pipeline::ResponseBody;
use mapmyclient_sdk::{ApiClient, ApiClientBuilder, ClientConfig, HttpMethod, OutboundRequest};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let result = match args[1].as_str() {
        "get" => cmd_get(&args[2..]).await,
        "send" => cmd_send(&args[2..]).await,
        "stream" => cmd_stream(&args[2..]).await,
        "config" => cmd_config(&args[2..]),
        "version" | "--version" | "-V" => {
            println!("mmc-cli {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"mmc-cli: MapMyClient API command line

USAGE:
    mmc-cli <COMMAND> [OPTIONS]

COMMANDS:
    get <path> [key=value ...]          GET a path, printing the JSON body
    send <METHOD> <path> [json-body]    Send any method with an optional JSON body
    stream <post-id> [--no-cache]       Stream an opportunity analysis, one record per line
    config [--file <path>]              Print the effective configuration
    version                             Show version information
    help                                Show this help message

ENVIRONMENT:
    MMC_API_URL                         API base URL (default http://localhost:8000/api)
    MMC_ACCESS_TOKEN                    Bearer token attached to every request
    MMC_CONFIG                          YAML configuration file
    RUST_LOG                            Log filter (default info)"#
    );
}

fn load_config(args: &[String]) -> anyhow::Result<ClientConfig> {
    let file = flag_value(args, "--file").or_else(|| std::env::var("MMC_CONFIG").ok());
    match file {
        Some(path) => ClientConfig::from_yaml_file(&path)
            .with_context(|| format!("loading configuration from {path}")),
        None => Ok(ClientConfig::from_env()),
    }
}

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn build_client(args: &[String]) -> anyhow::Result<ApiClient> {
    let mut builder = ApiClientBuilder::new().config(load_config(args)?);
    if let Ok(token) = std::env::var("MMC_ACCESS_TOKEN") {
        builder = builder.identity_provider(Arc::new(StaticTokenProvider::new(token)));
    }
    Ok(builder.build()?)
}

async fn cmd_get(args: &[String]) -> anyhow::Result<()> {
    let path = args.first().ok_or_else(|| anyhow!("get requires a path"))?;
    let mut request = OutboundRequest::get(path.as_str());
    for pair in &args[1..] {
        let (k, v) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("query parameters must look like key=value, got {pair}"))?;
        request = request.query(k, v);
    }

    let client = build_client(&[])?;
    let body: serde_json::Value = client.pipeline().json(request.build()?).await?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

async fn cmd_send(args: &[String]) -> anyhow::Result<()> {
    let (Some(method), Some(path)) = (args.first(), args.get(1)) else {
        bail!("send requires a method and a path");
    };
    let method =
        HttpMethod::parse(method).ok_or_else(|| anyhow!("unsupported HTTP method: {method}"))?;

    let mut request = OutboundRequest::builder(method, path.as_str());
    if let Some(raw) = args.get(2) {
        let body: serde_json::Value =
            serde_json::from_str(raw).context("request body must be JSON")?;
        request = request.json(&body);
    }

    let client = build_client(&[])?;
    let response = client.send(request.build()?).await?;
    match response.into_body() {
        ResponseBody::Json(v) => println!("{}", serde_json::to_string_pretty(&v)?),
        ResponseBody::Blob(b) => println!("<{} bytes>", b.len()),
        ResponseBody::Stream(_) => println!("<stream>"),
    }
    Ok(())
}

async fn cmd_stream(args: &[String]) -> anyhow::Result<()> {
    use futures::StreamExt;

    let post_id: i64 = args
        .first()
        .ok_or_else(|| anyhow!("stream requires a post id"))?
        .parse()
        .context("post id must be an integer")?;
    let use_cache = !args.iter().any(|a| a == "--no-cache");

    let client = build_client(&[])?;
    let handle = client.ai().analyze_opportunity_stream(post_id, use_cache).await?;
    let mut records = handle.into_records();
    while let Some(record) = records.next().await {
        println!("{}", record?);
    }
    Ok(())
}

fn cmd_config(args: &[String]) -> anyhow::Result<()> {
    let config = load_config(args)?;
    config.validate()?;
    print!("{}", serde_yaml::to_string(&config)?);
    Ok(())
}
