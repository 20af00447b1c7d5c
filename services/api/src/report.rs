use clap::Args;
use sanitation_checklist::config::AppConfig;
use sanitation_checklist::error::AppError;
use sanitation_checklist::workflows::submissions::{ComplianceAggregator, FileSubmissionStore};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct ReportArgs {
    /// Directory holding `data_<id>.json` submission files (defaults to APP_DATA_DIR)
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
    /// Report supervisor sign-off activity instead of daily compliance
    #[arg(long)]
    pub(crate) supervisors: bool,
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let ReportArgs {
        data_dir,
        supervisors,
    } = args;

    let data_dir = match data_dir {
        Some(dir) => dir,
        None => AppConfig::load()?.storage.data_dir,
    };

    println!("{}", build_report(&data_dir, supervisors)?);
    Ok(())
}

pub(crate) fn build_report(data_dir: &Path, supervisors: bool) -> Result<String, AppError> {
    let aggregator = ComplianceAggregator::new(Arc::new(FileSubmissionStore::new(data_dir)));
    if supervisors {
        render_json(&aggregator.supervisor_metrics()?)
    } else {
        render_json(&aggregator.daily_metrics()?)
    }
}

fn render_json<T: Serialize + ?Sized>(rows: &T) -> Result<String, AppError> {
    Ok(serde_json::to_string_pretty(rows)?)
}
