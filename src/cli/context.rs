use std::path::Path;
use std::path::PathBuf;

use crate::config::AppConfig;

pub struct CliContext {
    config: AppConfig,
    config_path: Option<PathBuf>,
}

impl CliContext {
    pub fn new(config: AppConfig, config_path: Option<PathBuf>) -> Self {
        Self {
            config,
            config_path,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}
