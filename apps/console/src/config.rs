use std::fs;

use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct Settings {
    pub server_url: String,
    pub request_timeout_secs: u64,
    pub preprocess: bool,
    pub clear_resets_history: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:5000".into(),
            request_timeout_secs: 30,
            preprocess: true,
            clear_resets_history: false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FileSettings {
    server_url: Option<String>,
    request_timeout_secs: Option<u64>,
    preprocess: Option<bool>,
    clear_resets_history: Option<bool>,
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("console.toml") {
        if let Ok(file_cfg) = toml::from_str::<FileSettings>(&raw) {
            if let Some(v) = file_cfg.server_url {
                settings.server_url = v;
            }
            if let Some(v) = file_cfg.request_timeout_secs {
                settings.request_timeout_secs = v;
            }
            if let Some(v) = file_cfg.preprocess {
                settings.preprocess = v;
            }
            if let Some(v) = file_cfg.clear_resets_history {
                settings.clear_resets_history = v;
            }
        }
    }

    if let Ok(v) = std::env::var("SENTIMENT_SERVER_URL") {
        settings.server_url = v;
    }
    if let Ok(v) = std::env::var("SENTIMENT_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }
    if let Ok(v) = std::env::var("SENTIMENT_PREPROCESS") {
        if let Ok(parsed) = v.parse::<bool>() {
            settings.preprocess = parsed;
        }
    }
    if let Ok(v) = std::env::var("SENTIMENT_CLEAR_RESETS_HISTORY") {
        if let Ok(parsed) = v.parse::<bool>() {
            settings.clear_resets_history = parsed;
        }
    }

    settings
}
