use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use serde::Deserialize;
use tracing::debug;

use crate::{
    error::ClientError,
    gate::DEFAULT_MIN_INPUT_INTERVAL,
    render::{Palette, Rgb, MAX_CELL_PX, MIN_CELL_PX},
};

pub const DEFAULT_SETTINGS_FILE: &str = "capture.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub server_url: String,
    pub min_input_interval_ms: u64,
    pub cell_px: u32,
    pub palette: Palette,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5000".into(),
            min_input_interval_ms: DEFAULT_MIN_INPUT_INTERVAL.as_millis() as u64,
            cell_px: 8,
            palette: Palette::default(),
        }
    }
}

impl ClientSettings {
    pub fn min_input_interval(&self) -> Duration {
        Duration::from_millis(self.min_input_interval_ms)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    server_url: Option<String>,
    min_input_interval_ms: Option<u64>,
    cell_px: Option<u32>,
    palette: Option<Palette>,
}

/// An explicit `path` must exist; without one, `capture.toml` in the working
/// directory is read when present.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<ClientSettings> {
    let mut settings = ClientSettings::default();

    let raw = match path {
        Some(path) => Some(
            fs::read_to_string(path)
                .with_context(|| format!("failed to read settings file '{}'", path.display()))?,
        ),
        None => fs::read_to_string(DEFAULT_SETTINGS_FILE).ok(),
    };
    if let Some(raw) = raw {
        apply_file(&mut settings, &raw).context("failed to parse settings file")?;
    }

    apply_env(&mut settings, |key| std::env::var(key).ok())?;
    validate(&settings)?;
    debug!(?settings, "client settings loaded");
    Ok(settings)
}

fn apply_file(settings: &mut ClientSettings, raw: &str) -> anyhow::Result<()> {
    let file_cfg = toml::from_str::<FileSettings>(raw)?;
    if let Some(v) = file_cfg.server_url {
        settings.server_url = v;
    }
    if let Some(v) = file_cfg.min_input_interval_ms {
        settings.min_input_interval_ms = v;
    }
    if let Some(v) = file_cfg.cell_px {
        settings.cell_px = v;
    }
    if let Some(v) = file_cfg.palette {
        settings.palette = v;
    }
    Ok(())
}

fn apply_env(
    settings: &mut ClientSettings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ClientError> {
    if let Some(v) = lookup("CAPTURE_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = lookup("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(v) = lookup("APP__MIN_INPUT_INTERVAL_MS") {
        settings.min_input_interval_ms = v.trim().parse().map_err(|_| ClientError::Setting {
            key: "APP__MIN_INPUT_INTERVAL_MS",
            reason: format!("'{v}' is not a number of milliseconds"),
        })?;
    }

    if let Some(v) = lookup("APP__CELL_PX") {
        settings.cell_px = v.trim().parse().map_err(|_| ClientError::Setting {
            key: "APP__CELL_PX",
            reason: format!("'{v}' is not a pixel count"),
        })?;
    }

    if let Some(v) = lookup("APP__PALETTE__RED") {
        settings.palette.red = v.parse::<Rgb>()?;
    }
    if let Some(v) = lookup("APP__PALETTE__BLUE") {
        settings.palette.blue = v.parse::<Rgb>()?;
    }

    Ok(())
}

fn validate(settings: &ClientSettings) -> Result<(), ClientError> {
    if !(MIN_CELL_PX..=MAX_CELL_PX).contains(&settings.cell_px) {
        return Err(ClientError::Setting {
            key: "cell_px",
            reason: format!(
                "{} is outside {MIN_CELL_PX}..={MAX_CELL_PX}",
                settings.cell_px
            ),
        });
    }
    if settings.server_url.trim().is_empty() {
        return Err(ClientError::Setting {
            key: "server_url",
            reason: "must not be empty".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
