//! Video transcription pipeline.
//!
//! Download, normalize, window, recognize. Every request works inside its
//! own temp directory, so concurrent transcriptions cannot clobber each
//! other's intermediate files.

use super::{window_plan, SpeechRecognizer, TranscriptChunk};
use crate::audio::{download_audio, extract_window, normalize_audio, probe_duration};
use crate::error::{Result, SvarError};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

/// The video transcription pipeline.
pub struct TranscriptionPipeline {
    recognizer: Arc<dyn SpeechRecognizer>,
    window_seconds: u32,
    temp_dir: PathBuf,
}

impl TranscriptionPipeline {
    /// Create a new pipeline.
    pub fn new(recognizer: Arc<dyn SpeechRecognizer>, window_seconds: u32, temp_dir: PathBuf) -> Self {
        Self {
            recognizer,
            window_seconds,
            temp_dir,
        }
    }

    /// Transcribe the audio track of a video URL.
    ///
    /// Windows are processed in strict index order and any failure discards
    /// the chunks transcribed so far; callers get either a complete
    /// transcript or an error. Intermediate files are removed when the
    /// request's temp directory drops (best-effort).
    #[instrument(skip(self), fields(url = %url))]
    pub async fn transcribe_url(&self, url: &str) -> Result<Vec<TranscriptChunk>> {
        url::Url::parse(url)
            .map_err(|e| SvarError::InvalidInput(format!("Invalid video URL: {}", e)))?;

        std::fs::create_dir_all(&self.temp_dir)?;
        let work_dir = tempfile::Builder::new()
            .prefix("transcribe-")
            .tempdir_in(&self.temp_dir)?;

        let downloaded = download_audio(url, work_dir.path()).await?;

        let normalized = work_dir.path().join("audio-16k.wav");
        normalize_audio(&downloaded, &normalized).await?;

        let duration = probe_duration(&normalized).await?;
        let plan = window_plan(duration, self.window_seconds);
        info!(
            "Transcribing {:.1}s of audio in {} windows",
            duration,
            plan.len()
        );

        let mut chunks = Vec::with_capacity(plan.len());

        for (index, (start, length)) in plan.into_iter().enumerate() {
            let window_path = work_dir.path().join(format!("window-{:04}.wav", index));
            extract_window(&normalized, &window_path, start, length).await?;

            let clock = Instant::now();
            let text = self.recognizer.transcribe_file(&window_path).await?;
            let transcription_time = clock.elapsed().as_secs_f64();

            chunks.push(TranscriptChunk {
                chunk_id: index,
                chunk_length: length,
                text,
                start_time: start,
                end_time: start + length,
                transcription_time,
            });
        }

        // work_dir drops here, removing downloaded and window files
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::Path;

    struct EchoRecognizer;

    #[async_trait]
    impl SpeechRecognizer for EchoRecognizer {
        async fn transcribe_file(&self, path: &Path) -> Result<String> {
            Ok(path.file_name().unwrap().to_string_lossy().to_string())
        }
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected_before_any_download() {
        let temp = tempfile::tempdir().unwrap();
        let pipeline = TranscriptionPipeline::new(
            Arc::new(EchoRecognizer),
            15,
            temp.path().to_path_buf(),
        );

        let err = pipeline.transcribe_url("not a url").await.unwrap_err();
        assert!(matches!(err, SvarError::InvalidInput(_)));
    }
}
