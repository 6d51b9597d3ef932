//! Path utilities for app data, audio storage, logs, and credentials.

use std::path::PathBuf;

const APP_DIR: &str = "listening-lab";

/// Get the app data directory (e.g. ~/.local/share/listening-lab on Linux).
pub fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".").join(APP_DIR))
}

/// Get the durable audio directory, creating it if necessary.
pub fn audio_dir() -> std::io::Result<PathBuf> {
    let dir = app_data_dir().join("audio");
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Get the log directory, creating it if necessary.
pub fn log_dir() -> std::io::Result<PathBuf> {
    let dir = app_data_dir().join("logs");
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

pub fn config_path() -> PathBuf {
    app_data_dir().join("config.json")
}

/// Get the path to the service-account credential document.
pub fn credentials_path() -> PathBuf {
    app_data_dir().join("service-account.json")
}

/// Get the path to the exercise library snapshot.
pub fn library_path() -> PathBuf {
    app_data_dir().join("exercises.json")
}

/// Ensure all app directories exist.
pub fn ensure_directories() -> std::io::Result<()> {
    std::fs::create_dir_all(app_data_dir())?;
    audio_dir()?;
    log_dir()?;
    Ok(())
}
