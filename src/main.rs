use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use vloop_crash::{generate_report, ReportOptions, ReportOutcome, LOOPER_GUID};

/// Exit status used by `--strict` when the looper slot is missing
const EXIT_SLOT_NOT_FOUND: i32 = 2;

/// Print a crash report from a VLoop debug snapshot
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the snapshot JSON
    #[arg(default_value = "vltest.json")]
    snapshot: PathBuf,

    /// Tag of the slot holding the looper state
    #[arg(long, default_value = LOOPER_GUID)]
    slot: String,

    /// Number of pulses either side of the crash to list in the context section
    #[arg(long, default_value_t = vloop_crash::report::DEFAULT_WINDOW)]
    window: u32,

    /// Exit with a non-zero status when the looper slot is missing
    #[arg(long)]
    strict: bool,
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    log::debug!("{:?}", args);

    let options = ReportOptions {
        slot_guid: args.slot,
        window: args.window,
    };

    let outcome = generate_report(&args.snapshot, &options)?;

    if args.strict && outcome == ReportOutcome::SlotNotFound {
        std::process::exit(EXIT_SLOT_NOT_FOUND);
    }

    Ok(())
}
