use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::gfx::RenderApi;
use crate::os::{WindowApi, WindowCreateInfo};
use crate::Result;

/// Initial placement of the client area
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        let info = WindowCreateInfo::default();
        WindowConfig {
            title: info.title,
            x: info.x,
            y: info.y,
            width: info.width,
            height: info.height,
        }
    }
}

/// Application settings read from json, every field is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlazeConfig {
    pub window: WindowConfig,
    pub window_api: WindowApi,
    pub render_api: RenderApi,
}

impl BlazeConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads `path`, a missing file yields the defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("no config at {}, using defaults", path.display());
            return Ok(BlazeConfig::default());
        }
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn window_create_info(&self) -> WindowCreateInfo {
        WindowCreateInfo {
            title: self.window.title.clone(),
            x: self.window.x,
            y: self.window.y,
            width: self.window.width,
            height: self.window.height,
            window_api: self.window_api,
            event_handlers: Vec::new(),
        }
    }
}
