//! Speech-to-text transcription.
//!
//! The pipeline cuts normalized audio into fixed-duration windows and runs
//! a speech recognizer over each window in order, recording timing for
//! every chunk.

mod pipeline;
mod whisper;

pub use pipeline::TranscriptionPipeline;
pub use whisper::WhisperRecognizer;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One transcribed audio window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptChunk {
    /// Position of this window in the audio (0-based).
    pub chunk_id: usize,
    /// Duration of this window in seconds.
    pub chunk_length: f64,
    /// Recognized text.
    pub text: String,
    /// Window start offset in the audio, seconds.
    pub start_time: f64,
    /// Window end offset in the audio, seconds.
    pub end_time: f64,
    /// Wall-clock seconds the recognizer took for this window.
    pub transcription_time: f64,
}

/// Trait for speech recognition backends.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Transcribe a single audio file to text.
    async fn transcribe_file(&self, path: &Path) -> Result<String>;
}

/// Plan the fixed-duration windows covering `duration` seconds of audio.
///
/// Returns `(start, length)` pairs: consecutive, non-overlapping windows of
/// `window_seconds`, the last possibly shorter. Window count equals
/// `ceil(duration / window_seconds)`.
pub fn window_plan(duration: f64, window_seconds: u32) -> Vec<(f64, f64)> {
    let window = f64::from(window_seconds);
    if duration <= 0.0 || window <= 0.0 {
        return Vec::new();
    }

    let mut plan = Vec::new();
    let mut index = 0u32;
    loop {
        let start = f64::from(index) * window;
        if start >= duration {
            break;
        }
        let length = window.min(duration - start);
        plan.push((start, length));
        index += 1;
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_plan_counts() {
        assert_eq!(window_plan(45.0, 15).len(), 3);
        assert_eq!(window_plan(46.0, 15).len(), 4);
        assert_eq!(window_plan(44.9, 15).len(), 3);
        assert_eq!(window_plan(14.9, 15).len(), 1);
        assert_eq!(window_plan(0.0, 15).len(), 0);
    }

    #[test]
    fn test_window_plan_starts_and_final_end() {
        let duration = 37.5;
        let plan = window_plan(duration, 15);
        assert_eq!(plan.len(), 3);

        for (i, (start, _)) in plan.iter().enumerate() {
            assert!((start - 15.0 * i as f64).abs() < 1e-9);
        }

        let (last_start, last_len) = *plan.last().unwrap();
        assert!((last_start + last_len - duration).abs() < 1e-9);
        assert!(last_len < 15.0);
    }

    #[test]
    fn test_window_plan_exact_multiple_has_full_last_window() {
        let plan = window_plan(30.0, 15);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[1], (15.0, 15.0));
    }

    #[test]
    fn test_transcript_chunk_wire_format() {
        let chunk = TranscriptChunk {
            chunk_id: 2,
            chunk_length: 15.0,
            text: "hello".to_string(),
            start_time: 30.0,
            end_time: 45.0,
            transcription_time: 1.25,
        };

        let value = serde_json::to_value(&chunk).unwrap();
        assert_eq!(value["chunk_id"], 2);
        assert_eq!(value["chunk_length"], 15.0);
        assert_eq!(value["text"], "hello");
        assert_eq!(value["start_time"], 30.0);
        assert_eq!(value["end_time"], 45.0);
        assert_eq!(value["transcription_time"], 1.25);
    }
}
