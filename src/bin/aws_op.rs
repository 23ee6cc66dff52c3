//! `aws-op`: invoke a catalog operation from the command line.
//!
//! ```text
//! aws-op <Operation> [Name=Value ...] [--select S] [--force]
//!        [--page-size N] [--next-token T] [--no-auto-iterate]
//!        [--region R] [--endpoint URL]
//! ```
//!
//! Each emitted value is printed as one JSON line on stdout. Logs go to
//! stderr; set `RUST_LOG` to change the level and `AWS_OP_LOG_FORMAT=json`
//! for JSON logs.

use std::io::Write;
use std::process::ExitCode;

use aws_operations::{Inputs, InvocationOptions, OperationClient, OperationError, OperationResult, PagingOptions};
use clap::Parser;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Invoke an operation from the built-in AWS catalog.
#[derive(Debug, Parser)]
#[command(name = "aws-op", version, about)]
struct Args {
    /// Operation name, bare or as `Service:Operation`
    operation: String,

    /// Operation inputs; JSON objects and arrays are passed as JSON
    #[arg(value_name = "NAME=VALUE", value_parser = parse_input)]
    inputs: Vec<(String, Value)>,

    /// Output selector: `*`, a response field path, or `^Param`
    #[arg(long)]
    select: Option<String>,

    /// Skip the confirmation gate for mutating operations
    #[arg(long)]
    force: bool,

    /// Page size for paginated operations
    #[arg(long, value_name = "N")]
    page_size: Option<u32>,

    /// Continuation token to resume from
    #[arg(long, value_name = "TOKEN")]
    next_token: Option<String>,

    /// Fetch a single page and print the next token
    #[arg(long)]
    no_auto_iterate: bool,

    /// AWS region
    #[arg(long)]
    region: Option<String>,

    /// Endpoint override
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,
}

fn parse_input(arg: &str) -> Result<(String, Value), String> {
    Inputs::parse_assignment(arg).map_err(|e| e.to_string())
}

impl Args {
    fn inputs(&self) -> Inputs {
        let mut inputs = Inputs::new();
        for (name, value) in &self.inputs {
            inputs.append(name.clone(), value.clone());
        }
        inputs
    }

    fn options(&self) -> InvocationOptions {
        let mut paging = PagingOptions::new();
        paging.page_size = self.page_size;
        paging.next_token = self.next_token.clone();
        paging.auto_iterate = !self.no_auto_iterate;

        InvocationOptions {
            select: self.select.clone(),
            force: self.force,
            paging,
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let json = std::env::var("AWS_OP_LOG_FORMAT").map(|v| v == "json").unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry.with(fmt::layer().json().with_writer(std::io::stderr)).try_init()
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).try_init()
    };
    if let Err(e) = result {
        eprintln!("failed to initialize logging: {}", e);
    }
}

async fn run(args: Args) -> OperationResult<()> {
    let mut builder = OperationClient::builder().from_env();
    if let Some(region) = args.region.clone() {
        builder = builder.region(region);
    }
    if let Some(endpoint) = args.endpoint.clone() {
        builder = builder.endpoint(endpoint);
    }
    let client = builder.build()?;
    let inputs = args.inputs();
    let options = args.options();

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            on_interrupt.cancel();
        }
    });

    let stdout = std::io::stdout();
    let outcome = client
        .invoke(&args.operation, &inputs, &options, cancel, |value| {
            let mut out = stdout.lock();
            writeln!(out, "{}", value).map_err(|e| OperationError::Serialization {
                message: format!("Failed to write output: {}", e),
            })
        })
        .await?;

    if outcome.skipped {
        eprintln!("{} was not confirmed; pass --force to run it", outcome.operation);
    }
    if let Some(token) = &outcome.next_token {
        eprintln!("more results available: --next-token {}", token);
    }
    debug!(?outcome, "Done");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
