//! Static configuration tables: supported formats, codec and bitrate choices,
//! and the named conversion presets.
//!
//! Nothing here is mutable. Callers resolve a preset into
//! [`ConversionSettings`] once and hand that value to the engine.

use crate::core::error::ValidationError;
use crate::core::model::{ConversionSettings, Resolution};

pub const SUPPORTED_INPUT_FORMATS: &[&str] =
    &[".mp4", ".avi", ".mkv", ".mov", ".wmv", ".flv", ".webm", ".m4v"];
pub const SUPPORTED_OUTPUT_FORMATS: &[&str] =
    &[".mp4", ".avi", ".mkv", ".mov", ".wmv", ".flv", ".webm"];

pub const DEFAULT_OUTPUT_FORMAT: &str = ".mp4";
pub const DEFAULT_CODEC: &str = "libx264";
pub const DEFAULT_BITRATE: &str = "1000k";

pub const CODEC_IDS: &[&str] = &["libx264", "libx265", "libvpx-vp9", "libvpx", "mpeg4"];

#[derive(Debug, Clone, Copy)]
pub struct ResolutionPreset {
    pub key: &'static str,
    pub label: &'static str,
    pub size: Option<(u32, u32)>,
}

pub const RESOLUTION_PRESETS: &[ResolutionPreset] = &[
    ResolutionPreset { key: "original", label: "Original", size: None },
    ResolutionPreset { key: "1080p", label: "1080p (1920x1080)", size: Some((1920, 1080)) },
    ResolutionPreset { key: "720p", label: "720p (1280x720)", size: Some((1280, 720)) },
    ResolutionPreset { key: "480p", label: "480p (854x480)", size: Some((854, 480)) },
    ResolutionPreset { key: "360p", label: "360p (640x360)", size: Some((640, 360)) },
    ResolutionPreset { key: "240p", label: "240p (426x240)", size: Some((426, 240)) },
];

/// (label, codec id)
pub const CODEC_OPTIONS: &[(&str, &str)] = &[
    ("H.264 (libx264)", "libx264"),
    ("H.265 (libx265)", "libx265"),
    ("VP9", "libvpx-vp9"),
    ("VP8", "libvpx"),
    ("MPEG-4", "mpeg4"),
];

/// (label, bitrate token)
pub const BITRATE_PRESETS: &[(&str, &str)] = &[
    ("Low (500k)", "500k"),
    ("Medium (1000k)", "1000k"),
    ("High (2000k)", "2000k"),
    ("Very High (5000k)", "5000k"),
    ("Ultra (10000k)", "10000k"),
];

#[derive(Debug, Clone, Copy)]
pub struct Preset {
    pub name: &'static str,
    pub format: &'static str,
    pub codec: &'static str,
    pub resolution: Option<(u32, u32)>,
    pub bitrate: &'static str,
    pub description: &'static str,
}

impl Preset {
    pub fn settings(&self) -> ConversionSettings {
        ConversionSettings {
            output_format: self.format.to_string(),
            resolution: self.resolution.map(|(width, height)| Resolution { width, height }),
            bitrate: Some(self.bitrate.to_string()),
            codec: Some(self.codec.to_string()),
        }
    }
}

pub const CONVERSION_PRESETS: &[Preset] = &[
    Preset {
        name: "Web Optimized (MP4)",
        format: ".mp4",
        codec: "libx264",
        resolution: Some((1280, 720)),
        bitrate: "1000k",
        description: "Optimized for web streaming and social media",
    },
    Preset {
        name: "High Quality (MP4)",
        format: ".mp4",
        codec: "libx264",
        resolution: None,
        bitrate: "5000k",
        description: "High quality for archival purposes",
    },
    Preset {
        name: "Mobile Friendly",
        format: ".mp4",
        codec: "libx264",
        resolution: Some((854, 480)),
        bitrate: "500k",
        description: "Small file size for mobile devices",
    },
    Preset {
        name: "YouTube Upload",
        format: ".mp4",
        codec: "libx264",
        resolution: Some((1920, 1080)),
        bitrate: "2000k",
        description: "Optimized for YouTube uploads",
    },
    Preset {
        name: "Instagram Story",
        format: ".mp4",
        codec: "libx264",
        // 9:16
        resolution: Some((1080, 1920)),
        bitrate: "1500k",
        description: "Vertical format for Instagram stories",
    },
    Preset {
        name: "DVD Quality",
        format: ".avi",
        codec: "mpeg4",
        resolution: Some((720, 480)),
        bitrate: "1500k",
        description: "Standard DVD quality",
    },
    Preset {
        name: "Ultra Compressed",
        format: ".mp4",
        codec: "libx264",
        resolution: Some((640, 360)),
        bitrate: "250k",
        description: "Maximum compression for minimal file size",
    },
];

pub fn preset_names() -> Vec<&'static str> {
    CONVERSION_PRESETS.iter().map(|p| p.name).collect()
}

/// Case-insensitive lookup by preset name.
pub fn preset(name: &str) -> Option<&'static Preset> {
    let name = name.trim();
    CONVERSION_PRESETS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

pub fn preset_settings(name: &str) -> Result<ConversionSettings, ValidationError> {
    preset(name)
        .map(Preset::settings)
        .ok_or_else(|| ValidationError::UnknownPreset(name.to_string()))
}

pub fn preset_description(name: &str) -> &'static str {
    preset(name).map(|p| p.description).unwrap_or("No description available")
}

/// Matches either the short key (`720p`) or the full label (`720p (1280x720)`).
pub fn resolution_preset(s: &str) -> Option<&'static ResolutionPreset> {
    RESOLUTION_PRESETS
        .iter()
        .find(|r| r.key.eq_ignore_ascii_case(s) || r.label.eq_ignore_ascii_case(s))
}

/// Accepts a codec id (`libx265`) or its label (`VP9`).
pub fn codec_option(s: &str) -> Option<&'static str> {
    CODEC_OPTIONS
        .iter()
        .find(|(label, id)| id.eq_ignore_ascii_case(s) || label.eq_ignore_ascii_case(s))
        .map(|(_, id)| *id)
}

/// Accepts a bitrate token or a preset label such as `High (2000k)` / `high`.
pub fn bitrate_option(s: &str) -> Option<&'static str> {
    BITRATE_PRESETS
        .iter()
        .find(|(label, token)| {
            token.eq_ignore_ascii_case(s)
                || label.eq_ignore_ascii_case(s)
                || label
                    .split(" (")
                    .next()
                    .is_some_and(|short| short.eq_ignore_ascii_case(s))
        })
        .map(|(_, token)| *token)
}
