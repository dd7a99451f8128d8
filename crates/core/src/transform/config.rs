//! Configuration for the transform module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Encoder settings shared by all transformers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformConfig {
    /// JPEG quality (1-100).
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// PNG compression effort.
    #[serde(default)]
    pub png_compression: PngCompression,

    /// GIF encoder speed (1 = best quality, 30 = fastest).
    #[serde(default = "default_gif_speed")]
    pub gif_speed: i32,

    /// Video settings.
    #[serde(default)]
    pub ffmpeg: FfmpegConfig,
}

/// PNG compression effort.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PngCompression {
    Fast,
    Default,
    #[default]
    Best,
}

fn default_jpeg_quality() -> u8 {
    65
}

fn default_gif_speed() -> i32 {
    10
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: default_jpeg_quality(),
            png_compression: PngCompression::default(),
            gif_speed: default_gif_speed(),
            ffmpeg: FfmpegConfig::default(),
        }
    }
}

/// Configuration for the ffmpeg-based video transformer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FfmpegConfig {
    /// Whether video jobs are accepted at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Path to ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Timeout for a single video in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// x264 constant rate factor.
    #[serde(default = "default_crf")]
    pub crf: u8,

    /// x264 preset.
    #[serde(default = "default_preset")]
    pub preset: String,

    /// AAC audio bitrate, ffmpeg syntax.
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_enabled() -> bool {
    true
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_timeout() -> u64 {
    3600 // 1 hour
}

fn default_crf() -> u8 {
    28
}

fn default_preset() -> String {
    "slow".to_string()
}

fn default_audio_bitrate() -> String {
    "96k".to_string()
}

fn default_log_level() -> String {
    "error".to_string()
}

impl Default for FfmpegConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            ffmpeg_path: default_ffmpeg_path(),
            timeout_secs: default_timeout(),
            crf: default_crf(),
            preset: default_preset(),
            audio_bitrate: default_audio_bitrate(),
            log_level: default_log_level(),
        }
    }
}

impl FfmpegConfig {
    /// Sets the ffmpeg binary path.
    pub fn with_path(mut self, ffmpeg_path: PathBuf) -> Self {
        self.ffmpeg_path = ffmpeg_path;
        self
    }

    /// Sets the timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}
