//! Utilities for creating `rodio` sinks from track sources.
//!
//! The helper here encapsulates opening/decoding a file and preparing a
//! paused `Sink` at the requested start position.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::time::Duration;

use lofty::file::AudioFile;
use rodio::{Decoder, OutputStream, Sink, Source};

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("no audio output device: {0}")]
    Output(String),
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to decode {path}: {message}")]
    Decode { path: PathBuf, message: String },
}

/// Create a paused `Sink` for `source` that starts playback at `start_at`.
///
/// Also returns the decoder's total duration when it knows it.
pub(super) fn create_sink_at(
    stream: &OutputStream,
    source: &Path,
    start_at: Duration,
) -> Result<(Sink, Option<Duration>), BackendError> {
    let file = File::open(source).map_err(|e| BackendError::Open {
        path: source.to_path_buf(),
        source: e,
    })?;

    let decoder = Decoder::new(BufReader::new(file)).map_err(|e| BackendError::Decode {
        path: source.to_path_buf(),
        message: e.to_string(),
    })?;
    let total = decoder.total_duration();

    let sink = Sink::connect_new(stream.mixer());
    // `skip_duration` is our fallback seeking primitive; even Duration::ZERO is fine.
    sink.append(decoder.skip_duration(start_at));
    sink.pause();
    Ok((sink, total))
}

/// Duration from container metadata, for decoders that cannot tell.
pub(super) fn probe_duration(source: &Path) -> Option<Duration> {
    match lofty::read_from_path(source) {
        Ok(tagged) => Some(tagged.properties().duration()).filter(|d| !d.is_zero()),
        Err(e) => {
            tracing::debug!(path = %source.display(), error = %e, "duration probe failed");
            None
        }
    }
}
