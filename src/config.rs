//! Runtime settings for the sketchpad.
//!
//! Everything has a default; a JSON file may override any subset of fields.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::types::{Facing, Rgba, ToolKind, ToolState};

pub const DEFAULT_CONFIG_FILE: &str = "overlay-sketch.json";

/// How the source is laid into the viewport. The two are mutually exclusive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitPolicy {
    /// Viewport takes the source's aspect; the source fills it edge to edge.
    #[default]
    EdgeToEdge,
    /// Viewport is the whole container; the source is centered with filled margins.
    Letterbox,
}

/// What happens to existing ink when the viewport changes size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizePolicy {
    /// Copy the old ink into the new raster, scaled to fit.
    #[default]
    Resample,
    /// Start over with an empty raster.
    Clear,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub front_index: u32,
    pub back_index: u32,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self { front_index: 0, back_index: 1, width: 1920, height: 1080, fps: 30 }
    }
}

impl CameraConfig {
    /// Device index that serves the given facing.
    pub fn index_for(&self, facing: Facing) -> u32 {
        match facing {
            Facing::Front => self.front_index,
            Facing::Back => self.back_index,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self { title: "Overlay Sketch".into(), width: 960, height: 640 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SketchConfig {
    pub fit_policy: FitPolicy,
    pub resize_policy: ResizePolicy,
    pub letterbox_fill: Rgba,
    pub pen_color: Rgba,
    pub pen_width: f32,
    pub eraser_width: f32,
    pub initial_facing: Facing,
    pub camera: CameraConfig,
    pub window: WindowConfig,
    pub export_dir: PathBuf,
}

impl Default for SketchConfig {
    fn default() -> Self {
        Self {
            fit_policy: FitPolicy::default(),
            resize_policy: ResizePolicy::default(),
            letterbox_fill: Rgba::BLACK,
            pen_color: Rgba::opaque(255, 0, 0),
            pen_width: 5.0,
            eraser_width: 20.0,
            initial_facing: Facing::Back,
            camera: CameraConfig::default(),
            window: WindowConfig::default(),
            export_dir: PathBuf::from("."),
        }
    }
}

impl SketchConfig {
    pub fn from_json(text: &str) -> Result<Self, Error> {
        serde_json::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load settings from `path`. A missing file or a bad one falls back to defaults.
    pub fn load_or_default(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(text) => match Self::from_json(&text) {
                Ok(cfg) => {
                    info!("Loaded settings from {:?}", path);
                    cfg
                }
                Err(e) => {
                    warn!("Failed to parse settings {:?}: {}, using defaults", path, e);
                    Self::default()
                }
            },
            Err(_) => {
                info!("No settings file at {:?}, using defaults", path);
                Self::default()
            }
        }
    }

    /// Tool state a fresh session starts with: the pen, at the configured widths.
    pub fn initial_tools(&self) -> ToolState {
        ToolState {
            kind: ToolKind::Ink,
            color: self.pen_color,
            ink_width: self.pen_width.clamp(ToolState::MIN_WIDTH, ToolState::MAX_WIDTH),
            erase_width: self.eraser_width.clamp(ToolState::MIN_WIDTH, ToolState::MAX_WIDTH),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let cfg = SketchConfig::from_json(
            r#"{ "fit_policy": "letterbox", "camera": { "front_index": 3 } }"#,
        )
        .unwrap();
        assert_eq!(cfg.fit_policy, FitPolicy::Letterbox);
        assert_eq!(cfg.resize_policy, ResizePolicy::Resample);
        assert_eq!(cfg.camera.front_index, 3);
        assert_eq!(cfg.camera.width, 1920);
        assert_eq!(cfg.initial_facing, Facing::Back);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        assert!(matches!(SketchConfig::from_json("{ nope"), Err(Error::Config(_))));
    }

    #[test]
    fn missing_file_means_defaults() {
        let cfg = SketchConfig::load_or_default(Path::new("/definitely/not/here.json"));
        assert_eq!(cfg, SketchConfig::default());
    }

    #[test]
    fn initial_tools_clamp_configured_widths() {
        let cfg = SketchConfig { pen_width: 0.0, eraser_width: 250.0, ..SketchConfig::default() };
        let tools = cfg.initial_tools();
        assert_eq!(tools.kind, ToolKind::Ink);
        assert_eq!(tools.ink_width, ToolState::MIN_WIDTH);
        assert_eq!(tools.erase_width, ToolState::MAX_WIDTH);
    }

    #[test]
    fn camera_index_follows_facing() {
        let cam = CameraConfig::default();
        assert_eq!(cam.index_for(Facing::Front), 0);
        assert_eq!(cam.index_for(Facing::Back), 1);
    }
}
