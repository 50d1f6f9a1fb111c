use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use serde::Serialize;

use car_dashboard::data::{load_file, FilterCriteria};
use car_dashboard::state::{DashboardSnapshot, DashboardState, FilterOptions};

/// Used when no dataset path is given.
const DEFAULT_DATASET: &str = "car_price_updated.csv";

/// What a presentation layer needs to draw one frame.
#[derive(Serialize)]
struct DashboardPayload {
    options: FilterOptions,
    snapshot: DashboardSnapshot,
}

fn read_criteria(path: &Path) -> Result<FilterCriteria> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading criteria {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing criteria {}", path.display()))
}

/// Usage: `car-dashboard [DATASET] [CRITERIA.json]`
fn run() -> Result<()> {
    let mut args = std::env::args_os().skip(1).map(PathBuf::from);
    let dataset_path = args.next().unwrap_or_else(|| PathBuf::from(DEFAULT_DATASET));
    let criteria_path = args.next();

    let dataset = load_file(&dataset_path)
        .with_context(|| format!("loading {}", dataset_path.display()))?;
    let mut state = DashboardState::new(dataset);
    if let Some(path) = criteria_path {
        state.set_criteria(read_criteria(&path)?);
    }

    let snapshot = state.snapshot();
    log::info!("{}", snapshot.metrics);

    let payload = DashboardPayload {
        options: state.filter_options(),
        snapshot,
    };
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
