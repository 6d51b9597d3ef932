//! Log dispatch to stdout and a rolling log file.

use std::path::{Path, PathBuf};

pub const LOG_FILE_NAME: &str = "listening-lab.log";

/// Install the global logger. Returns the log file path.
pub fn init_logger(log_dir: &Path) -> Result<PathBuf, fern::InitError> {
    std::fs::create_dir_all(log_dir).ok();
    let log_file = log_dir.join(LOG_FILE_NAME);

    let format = |out: fern::FormatCallback<'_>, message: &std::fmt::Arguments<'_>, record: &log::Record| {
        out.finish(format_args!(
            "[{}][{}][{}][{:?}] {}",
            chrono::Local::now().format("%Y-%m-%d"),
            chrono::Local::now().format("%H:%M:%S"),
            record.target(),
            record.level(),
            message
        ))
    };

    fern::Dispatch::new()
        .format(format)
        .level(log::LevelFilter::Debug)
        .level_for("hyper", log::LevelFilter::Info)
        .level_for("reqwest", log::LevelFilter::Info)
        .level_for("symphonia_core", log::LevelFilter::Warn)
        .chain(std::io::stdout())
        .chain(fern::log_file(&log_file)?)
        .apply()?;

    Ok(log_file)
}
