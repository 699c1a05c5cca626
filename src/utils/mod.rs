// Utility functions module

pub mod settings;

use std::path::PathBuf;

pub use settings::{
    get_settings_path, load_settings, load_settings_from, save_settings, AppSettings,
};

/// Get the directory for storing DriveTunes configuration and the song library
pub fn get_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".drivetunes")
}
