use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Args;
use retune_core::{RetuneRequest, Retuner};
use tracing::debug;

#[derive(Args)]
pub struct PlanArgs {
    /// Request snapshot (JSON), or "-" for stdin
    #[arg(short, long, default_value = "-")]
    input: PathBuf,
    /// Override the snapshot's "now" (RFC 3339)
    #[arg(long)]
    now: Option<DateTime<Utc>>,
    /// Config file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print compact JSON
    #[arg(long)]
    compact: bool,
}

pub fn run(args: PlanArgs) -> Result<(), Box<dyn std::error::Error>> {
    let raw = super::read_input(&args.input)?;
    let mut value: serde_json::Value = serde_json::from_str(&raw)?;
    if let Some(now) = args.now {
        value["now"] = serde_json::to_value(now)?;
    }
    let request: RetuneRequest = serde_json::from_value(value)?;
    debug!(tasks = request.tasks.len(), now = %request.now, "loaded request snapshot");

    let config = super::load_config(args.config.as_ref())?;
    let outcome = Retuner::with_config(config).retune(&request);

    let json = if args.compact {
        serde_json::to_string(&outcome)?
    } else {
        serde_json::to_string_pretty(&outcome)?
    };
    println!("{json}");
    Ok(())
}
