//! Surface configuration
//!
//! Preset enums for the user-selectable parameters plus the TOML-backed
//! `SurfaceConfig` the demo driver loads at startup.

use crate::constants::view;
use crate::error::{EngineError, EngineResult, ErrorContext};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Grid resolution preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resolution {
    R16,
    R32,
    R64,
    R128,
}

impl Resolution {
    pub const ALL: [Resolution; 4] = [
        Resolution::R16,
        Resolution::R32,
        Resolution::R64,
        Resolution::R128,
    ];

    /// Grid points per axis
    pub fn size(self) -> u32 {
        match self {
            Resolution::R16 => 16,
            Resolution::R32 => 32,
            Resolution::R64 => 64,
            Resolution::R128 => 128,
        }
    }

    /// Atlas tiling `(tiles_x, tiles_y)` holding one Z-slice per tile
    pub fn atlas_tiles(self) -> (u32, u32) {
        match self {
            Resolution::R16 => (4, 4),
            Resolution::R32 => (8, 4),
            Resolution::R64 => (8, 8),
            Resolution::R128 => (8, 16),
        }
    }

    /// Voxels (cells) per axis
    pub fn cells_per_axis(self) -> u32 {
        self.size() - 1
    }
}

impl TryFrom<u32> for Resolution {
    type Error = EngineError;

    fn try_from(value: u32) -> EngineResult<Self> {
        match value {
            16 => Ok(Resolution::R16),
            32 => Ok(Resolution::R32),
            64 => Ok(Resolution::R64),
            128 => Ok(Resolution::R128),
            requested => Err(EngineError::UnsupportedResolution { requested }),
        }
    }
}

/// Blob count preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlobCount {
    One,
    Ten,
    Fifty,
    Hundred,
}

impl BlobCount {
    pub const ALL: [BlobCount; 4] = [
        BlobCount::One,
        BlobCount::Ten,
        BlobCount::Fifty,
        BlobCount::Hundred,
    ];

    pub fn count(self) -> usize {
        match self {
            BlobCount::One => 1,
            BlobCount::Ten => 10,
            BlobCount::Fifty => 50,
            BlobCount::Hundred => 100,
        }
    }
}

impl TryFrom<u32> for BlobCount {
    type Error = EngineError;

    fn try_from(value: u32) -> EngineResult<Self> {
        match value {
            1 => Ok(BlobCount::One),
            10 => Ok(BlobCount::Ten),
            50 => Ok(BlobCount::Fifty),
            100 => Ok(BlobCount::Hundred),
            requested => Err(EngineError::UnsupportedBlobCount { requested }),
        }
    }
}

/// Which extraction path renders the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    Cpu,
    Gpu,
}

impl RenderMode {
    pub fn toggled(self) -> Self {
        match self {
            RenderMode::Cpu => RenderMode::Gpu,
            RenderMode::Gpu => RenderMode::Cpu,
        }
    }
}

/// Validated parameters the core reads every frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSettings {
    pub resolution: Resolution,
    pub blob_count: BlobCount,
}

impl Default for SurfaceSettings {
    fn default() -> Self {
        Self {
            resolution: Resolution::R32,
            blob_count: BlobCount::Ten,
        }
    }
}

/// Startup configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub resolution: u32,
    pub num_blobs: u32,
    pub mode: RenderMode,
    pub camera_speed: f32,
    pub mouse_sensitivity: f32,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            window_title: "Metaball Surface".to_string(),
            window_width: 1280,
            window_height: 720,
            resolution: 32,
            num_blobs: 10,
            mode: RenderMode::Cpu,
            camera_speed: view::MOVEMENT_SPEED,
            mouse_sensitivity: view::LOOK_SENSITIVITY,
        }
    }
}

impl SurfaceConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> EngineResult<()> {
        let settings = self.settings()?;

        if self.window_width < 320 || self.window_height < 240 {
            return Err(EngineError::InvalidConfig {
                field: "window".to_string(),
                value: format!("{}x{}", self.window_width, self.window_height),
                reason: "window dimensions too small (min 320x240)".to_string(),
            });
        }

        if self.window_width > 16384 || self.window_height > 16384 {
            return Err(EngineError::InvalidConfig {
                field: "window".to_string(),
                value: format!("{}x{}", self.window_width, self.window_height),
                reason: "window dimensions too large (max 16384x16384)".to_string(),
            });
        }

        for (field, value) in [
            ("camera_speed", self.camera_speed),
            ("mouse_sensitivity", self.mouse_sensitivity),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(EngineError::InvalidConfig {
                    field: field.to_string(),
                    value: value.to_string(),
                    reason: "must be positive and finite".to_string(),
                });
            }
        }

        log::info!(
            "[SurfaceConfig] Validated: resolution={}, blobs={}, mode={:?}, window={}x{}",
            settings.resolution.size(),
            settings.blob_count.count(),
            self.mode,
            self.window_width,
            self.window_height
        );
        Ok(())
    }

    /// Convert the raw preset values into typed settings
    pub fn settings(&self) -> EngineResult<SurfaceSettings> {
        Ok(SurfaceSettings {
            resolution: Resolution::try_from(self.resolution)?,
            blob_count: BlobCount::try_from(self.num_blobs)?,
        })
    }
}

/// Load and validate a TOML configuration file
pub fn load_config(path: &Path) -> EngineResult<SurfaceConfig> {
    let display = path.display().to_string();
    let text = std::fs::read_to_string(path).io_context(&display)?;
    let config: SurfaceConfig = toml::from_str(&text).map_err(|e| EngineError::ConfigParse {
        path: display.clone(),
        error: e.to_string(),
    })?;
    config.validate()?;
    log::info!("[SurfaceConfig] Loaded configuration from {}", display);
    Ok(config)
}
