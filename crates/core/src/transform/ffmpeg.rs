//! FFmpeg-based video transformer.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::time::{timeout, Duration};

use super::config::FfmpegConfig;
use super::error::TransformError;
use super::traits::Transformer;
use super::types::{TransformJob, TransformKind, TransformOutput};

/// Recompresses video to H.264/AAC MP4 by shelling out to ffmpeg.
pub struct FfmpegTransformer {
    config: FfmpegConfig,
}

impl FfmpegTransformer {
    /// Creates a new FFmpeg transformer with the given configuration.
    pub fn new(config: FfmpegConfig) -> Self {
        Self { config }
    }

    /// Creates a transformer with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(FfmpegConfig::default())
    }

    /// Builds ffmpeg arguments for a web-friendly H.264 encode.
    fn build_args(&self, input_path: &Path, output_path: &Path) -> Vec<String> {
        vec![
            "-y".to_string(), // Overwrite output
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            self.config.log_level.clone(),
            "-i".to_string(),
            input_path.to_string_lossy().to_string(),
            "-c:v".to_string(),
            "libx264".to_string(),
            "-preset".to_string(),
            self.config.preset.clone(),
            "-crf".to_string(),
            self.config.crf.to_string(),
            // Keyframe every 120 frames
            "-g".to_string(),
            "120".to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-profile:v".to_string(),
            "high".to_string(),
            "-level".to_string(),
            "4.1".to_string(),
            "-movflags".to_string(),
            "+faststart".to_string(),
            "-c:a".to_string(),
            "aac".to_string(),
            "-b:a".to_string(),
            self.config.audio_bitrate.clone(),
            output_path.to_string_lossy().to_string(),
        ]
    }

    fn map_spawn_error(&self, e: std::io::Error) -> TransformError {
        if e.kind() == std::io::ErrorKind::NotFound {
            TransformError::ToolNotFound {
                path: self.config.ffmpeg_path.clone(),
            }
        } else {
            TransformError::Io(e)
        }
    }
}

#[async_trait]
impl Transformer for FfmpegTransformer {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn supports(&self, kind: TransformKind) -> bool {
        kind == TransformKind::CompressVideo
    }

    async fn transform(&self, job: TransformJob) -> Result<TransformOutput, TransformError> {
        if !self.supports(job.kind) {
            return Err(TransformError::UnsupportedKind { kind: job.kind });
        }

        let start = Instant::now();

        let original_size = tokio::fs::metadata(job.input.as_path())
            .await
            .map_err(|_| TransformError::InputNotFound {
                path: job.input.as_path().to_path_buf(),
            })?
            .len();

        let args = self.build_args(job.input.as_path(), job.output.as_path());

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.map_spawn_error(e))?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| TransformError::failed("ffmpeg stderr was not captured", None))?;
        let mut reader = BufReader::new(stderr).lines();

        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let result = timeout(timeout_duration, async {
            let mut error_output = String::new();
            while let Ok(Some(line)) = reader.next_line().await {
                error_output.push_str(&line);
                error_output.push('\n');
            }
            let status = child.wait().await?;
            Ok::<(std::process::ExitStatus, String), std::io::Error>((status, error_output))
        })
        .await;

        match result {
            Ok(Ok((status, error_output))) => {
                if !status.success() {
                    return Err(TransformError::failed(
                        format!("FFmpeg exited with code: {:?}", status.code()),
                        if error_output.is_empty() {
                            None
                        } else {
                            Some(error_output)
                        },
                    ));
                }
            }
            Ok(Err(e)) => return Err(TransformError::Io(e)),
            Err(_) => {
                // Kill the process on timeout
                let _ = child.kill().await;
                return Err(TransformError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                });
            }
        }

        let final_size = tokio::fs::metadata(job.output.as_path())
            .await
            .map_err(|_| TransformError::failed("Output file not created", None))?
            .len();

        Ok(TransformOutput {
            output: job.output,
            original_size,
            final_size,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn validate(&self) -> Result<(), TransformError> {
        let output = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .output()
            .await
            .map_err(|e| self.map_spawn_error(e))?;

        if !output.status.success() {
            return Err(TransformError::failed(
                "ffmpeg -version returned a failure status",
                Some(String::from_utf8_lossy(&output.stderr).to_string()),
            ));
        }

        Ok(())
    }
}
