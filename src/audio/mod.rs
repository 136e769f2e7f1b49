//! Audio acquisition and processing utilities.
//!
//! Drives yt-dlp for downloading the audio track of a video and ffmpeg /
//! ffprobe for normalization, duration probing, and window extraction.

use crate::error::{Result, SvarError};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// Sample rate all audio is normalized to before recognition.
pub const NORMALIZED_SAMPLE_RATE: u32 = 16_000;

/// Downloads the best available audio-only stream for a URL.
///
/// The file lands in `output_dir` with a `source.*` name; the extension is
/// whatever yt-dlp produced.
#[instrument(skip(output_dir), fields(url = %url))]
pub async fn download_audio(url: &str, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;

    info!("Downloading audio stream");

    let template = output_dir.join("source.%(ext)s");

    let result = Command::new("yt-dlp")
        .arg("--format").arg("bestaudio")
        .arg("--output").arg(template.to_str().unwrap_or_default())
        .arg("--no-playlist")
        .arg("--quiet")
        .arg("--no-warnings")
        .arg(url)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(SvarError::ToolNotFound("yt-dlp".into()));
        }
        Err(e) => {
            return Err(SvarError::Download(format!("yt-dlp execution failed: {e}")));
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SvarError::Download(format!("yt-dlp failed: {stderr}")));
    }

    find_downloaded_file(output_dir)
}

/// Locates the downloaded `source.*` file.
fn find_downloaded_file(dir: &Path) -> Result<PathBuf> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| SvarError::Download(format!("Cannot read directory: {e}")))?;

    for entry in entries.flatten() {
        if entry.file_name().to_string_lossy().starts_with("source.") {
            return Ok(entry.path());
        }
    }

    Err(SvarError::Download(
        "No audio stream found after download".into(),
    ))
}

/// Converts an audio file to mono 16 kHz WAV.
#[instrument(skip_all, fields(source = %source.display()))]
pub async fn normalize_audio(source: &Path, dest: &Path) -> Result<()> {
    debug!("Normalizing to mono {} Hz", NORMALIZED_SAMPLE_RATE);

    let result = Command::new("ffmpeg")
        .arg("-i").arg(source)
        .arg("-vn")
        .arg("-ac").arg("1")
        .arg("-ar").arg(NORMALIZED_SAMPLE_RATE.to_string())
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    match result {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => {
            let err = String::from_utf8_lossy(&out.stderr);
            Err(SvarError::Download(format!("ffmpeg normalization failed: {err}")))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(SvarError::ToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(SvarError::Download(format!("ffmpeg error: {e}"))),
    }
}

/// Extracts one time window from an audio file.
pub async fn extract_window(source: &Path, dest: &Path, start: f64, length: f64) -> Result<()> {
    let result = Command::new("ffmpeg")
        .arg("-ss").arg(format!("{:.3}", start))
        .arg("-i").arg(source)
        .arg("-t").arg(format!("{:.3}", length))
        .arg("-codec:a").arg("pcm_s16le")
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    match result {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => {
            let err = String::from_utf8_lossy(&out.stderr);
            Err(SvarError::Transcription(format!("Window extraction failed: {err}")))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(SvarError::ToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(SvarError::Transcription(format!("ffmpeg error: {e}"))),
    }
}

/// Queries the duration of an audio file using ffprobe with JSON output.
pub async fn probe_duration(path: &Path) -> Result<f64> {
    let result = Command::new("ffprobe")
        .arg("-v").arg("quiet")
        .arg("-print_format").arg("json")
        .arg("-show_format")
        .arg(path)
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(SvarError::ToolNotFound("ffprobe".into()));
        }
        Err(e) => {
            return Err(SvarError::Download(format!("ffprobe failed: {e}")));
        }
    };

    if !output.status.success() {
        return Err(SvarError::Download("ffprobe returned error".into()));
    }

    let json_str = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(&json_str)
        .map_err(|_| SvarError::Download("Invalid ffprobe output".into()))?;

    parsed["format"]["duration"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| SvarError::Download("Could not determine audio duration".into()))
}
