//! Backend configuration
//!
//! Read from a TOML file. Every field has a default matching the stock
//! Dreambox firmware layout, so a missing file is not an error.

use crate::host::{DisplayMode, PixelFormat};
use crate::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming the configuration file
pub const CONFIG_ENV: &str = "DREAMBOX_VIDEO_CONFIG";

pub const DEFAULT_CONFIG_PATH: &str = "/etc/dreambox-video.toml";

/// How show/hide drives the OSD plane alpha
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlphaControl {
    /// Write to `/proc/stb/video/alpha`
    Procfs,
    /// `FBIOPUT_OSD_SET_GBL_ALPHA` on the framebuffer node
    Osd,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub framebuffer: PathBuf,
    pub model_path: PathBuf,
    pub video_mode_path: PathBuf,
    pub alpha_path: PathBuf,
    /// Model name prefixes accepted by the availability probe
    pub supported_models: Vec<String>,
    /// Written to the video mode file during video init
    pub video_mode: String,
    pub width: u32,
    pub height: u32,
    pub refresh_rate: u32,
    pub gl_library: PathBuf,
    /// Load EGL from this file instead of the system search path
    pub egl_library: Option<PathBuf>,
    pub alpha_control: AlphaControl,
    /// Wait for vertical sync before every buffer swap
    pub vsync: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            framebuffer: PathBuf::from("/dev/fb0"),
            model_path: PathBuf::from("/proc/stb/info/model"),
            video_mode_path: PathBuf::from("/proc/stb/video/videomode"),
            alpha_path: PathBuf::from("/proc/stb/video/alpha"),
            supported_models: vec!["dm820".into(), "dm900".into(), "dm7080".into()],
            video_mode: "1080p".into(),
            width: 1280,
            height: 720,
            refresh_rate: 50,
            gl_library: PathBuf::from("/usr/lib/libGLESv2.so"),
            egl_library: None,
            alpha_control: AlphaControl::Procfs,
            vsync: true,
        }
    }
}

impl BackendConfig {
    /// Load from `$DREAMBOX_VIDEO_CONFIG`, falling back to the default path
    pub fn load() -> Result<Self> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load_from(&path)
    }

    /// Load from a file; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                info!(path = %path.display(), "Loaded backend configuration");
                Self::from_toml_str(&contents)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No configuration file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// The single display mode this backend drives
    pub fn display_mode(&self) -> DisplayMode {
        DisplayMode {
            width: self.width,
            height: self.height,
            refresh_rate: self.refresh_rate,
            format: PixelFormat::Rgba8888,
        }
    }
}
