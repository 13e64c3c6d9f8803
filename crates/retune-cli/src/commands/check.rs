use std::path::PathBuf;

use clap::Args;
use retune_core::task::validate::validate_task;
use retune_core::RetuneRequest;

#[derive(Args)]
pub struct CheckArgs {
    /// Request snapshot (JSON), or "-" for stdin
    #[arg(short, long, default_value = "-")]
    input: PathBuf,
}

pub fn run(args: CheckArgs) -> Result<(), Box<dyn std::error::Error>> {
    let raw = super::read_input(&args.input)?;
    let request: RetuneRequest = serde_json::from_str(&raw)?;

    let mut failures = 0usize;
    if let Some(prefs) = &request.preferences {
        if let Err(e) = prefs.validate() {
            println!("preferences: {e}");
            failures += 1;
        }
    } else {
        println!("preferences: missing");
        failures += 1;
    }
    for task in &request.tasks {
        if let Err(e) = validate_task(task) {
            println!("{}: {e}", task.id);
            failures += 1;
        }
    }

    if failures > 0 {
        return Err(format!("{failures} problem(s) found").into());
    }
    println!("ok: {} task(s)", request.tasks.len());
    Ok(())
}
