use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rodio::{OutputStream, OutputStreamBuilder, Sink};

use super::media::MediaElement;
use super::sink::{BackendError, create_sink_at, probe_duration};
use super::types::{BindingId, MediaEvent, PlayToken};

/// How often the audio thread reports position and checks for track end.
const TICK: Duration = Duration::from_millis(200);

#[derive(Debug)]
enum BackendCmd {
    Bind { binding: BindingId, source: PathBuf },
    Unbind,
    Play(PlayToken),
    Pause,
    Seek(f64),
    Volume(f32),
    Quit,
}

type PositionHandle = Arc<Mutex<f64>>;

/// `MediaElement` backed by a rodio sink on a dedicated audio thread.
pub struct RodioElement {
    tx: Sender<BackendCmd>,
    position: PositionHandle,
    join: Option<JoinHandle<()>>,
}

impl RodioElement {
    /// Spawn the audio thread. Events are delivered on `events`.
    pub fn spawn(events: Sender<MediaEvent>) -> Self {
        let (tx, rx) = mpsc::channel::<BackendCmd>();
        let position: PositionHandle = Arc::new(Mutex::new(0.0));

        let worker_position = position.clone();
        let join = thread::spawn(move || run_worker(rx, events, worker_position));

        Self {
            tx,
            position,
            join: Some(join),
        }
    }

    fn send(&self, cmd: BackendCmd) {
        if let Err(e) = self.tx.send(cmd) {
            tracing::warn!(cmd = ?e.0, "audio thread is gone");
        }
    }

    /// Stop playback and wait for the audio thread to exit.
    pub fn shutdown(&mut self) {
        self.send(BackendCmd::Quit);
        if let Some(h) = self.join.take() {
            let _ = h.join();
        }
    }
}

impl Drop for RodioElement {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl MediaElement for RodioElement {
    fn bind(&mut self, binding: BindingId, source: &Path) {
        if let Ok(mut p) = self.position.lock() {
            *p = 0.0;
        }
        self.send(BackendCmd::Bind {
            binding,
            source: source.to_path_buf(),
        });
    }

    fn unbind(&mut self) {
        self.send(BackendCmd::Unbind);
    }

    fn play(&mut self, token: PlayToken) {
        self.send(BackendCmd::Play(token));
    }

    fn pause(&mut self) {
        self.send(BackendCmd::Pause);
    }

    fn position(&self) -> f64 {
        self.position.lock().map(|p| *p).unwrap_or(0.0)
    }

    fn set_position(&mut self, seconds: f64) {
        let seconds = seconds.max(0.0);
        if let Ok(mut p) = self.position.lock() {
            *p = seconds;
        }
        self.send(BackendCmd::Seek(seconds));
    }

    fn set_volume(&mut self, level: f64) {
        self.send(BackendCmd::Volume(level.clamp(0.0, 1.0) as f32));
    }
}

struct Worker {
    stream: Option<OutputStream>,
    sink: Option<Sink>,
    binding: Option<BindingId>,
    source: Option<PathBuf>,
    playing: bool,
    volume: f32,
    /// Added to `Sink::get_pos` after a rebuild that skipped into the file.
    offset: f64,
    position: PositionHandle,
    events: Sender<MediaEvent>,
}

fn run_worker(rx: Receiver<BackendCmd>, events: Sender<MediaEvent>, position: PositionHandle) {
    let stream = match OutputStreamBuilder::open_default_stream() {
        Ok(mut stream) => {
            // rodio logs to stderr when OutputStream is dropped. That's useful in debugging,
            // but noisy for a TUI app.
            stream.log_on_drop(false);
            Some(stream)
        }
        Err(e) => {
            tracing::error!(error = %e, "no audio output device; playback disabled");
            None
        }
    };

    let mut worker = Worker {
        stream,
        sink: None,
        binding: None,
        source: None,
        playing: false,
        volume: 1.0,
        offset: 0.0,
        position,
        events,
    };

    loop {
        match rx.recv_timeout(TICK) {
            Ok(BackendCmd::Quit) => {
                worker.unbind();
                break;
            }
            Ok(cmd) => worker.handle(cmd),
            Err(RecvTimeoutError::Timeout) => worker.tick(),
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

impl Worker {
    fn emit(&self, event: MediaEvent) {
        let _ = self.events.send(event);
    }

    fn store_position(&self, seconds: f64) {
        if let Ok(mut p) = self.position.lock() {
            *p = seconds;
        }
    }

    fn current_position(&self) -> f64 {
        self.position.lock().map(|p| *p).unwrap_or(0.0)
    }

    fn handle(&mut self, cmd: BackendCmd) {
        match cmd {
            BackendCmd::Bind { binding, source } => self.bind(binding, source),
            BackendCmd::Unbind => self.unbind(),
            BackendCmd::Play(token) => self.play(token),
            BackendCmd::Pause => {
                if let Some(s) = &self.sink {
                    s.pause();
                }
                self.playing = false;
            }
            BackendCmd::Seek(seconds) => self.seek(seconds),
            BackendCmd::Volume(v) => {
                self.volume = v;
                if let Some(s) = &self.sink {
                    s.set_volume(v);
                }
            }
            BackendCmd::Quit => {}
        }
    }

    fn unbind(&mut self) {
        if let Some(s) = self.sink.take() {
            s.stop();
        }
        self.binding = None;
        self.source = None;
        self.playing = false;
        self.offset = 0.0;
        self.store_position(0.0);
    }

    fn bind(&mut self, binding: BindingId, source: PathBuf) {
        self.unbind();
        self.binding = Some(binding);

        let mut duration = None;
        if let Some(stream) = &self.stream {
            match create_sink_at(stream, &source, Duration::ZERO) {
                Ok((sink, total)) => {
                    sink.set_volume(self.volume);
                    self.sink = Some(sink);
                    duration = total;
                }
                Err(e) => tracing::warn!(error = %e, "could not prepare track"),
            }
        }

        if let Some(d) = duration.or_else(|| probe_duration(&source)) {
            self.emit(MediaEvent::MetadataReady {
                binding,
                duration: d.as_secs_f64(),
            });
        }
        self.source = Some(source);
    }

    /// Replace the sink with a fresh one positioned at `at` seconds.
    fn rebuild(&mut self, at: f64) -> Result<(), BackendError> {
        let stream = self
            .stream
            .as_ref()
            .ok_or_else(|| BackendError::Output("output stream unavailable".to_string()))?;
        let Some(source) = &self.source else {
            return Ok(());
        };

        let (sink, _) = create_sink_at(stream, source, Duration::from_secs_f64(at))?;
        sink.set_volume(self.volume);
        if self.playing {
            sink.play();
        }
        if let Some(old) = self.sink.replace(sink) {
            old.stop();
        }
        self.offset = at;
        Ok(())
    }

    fn play(&mut self, token: PlayToken) {
        if self.binding != Some(token.binding) {
            self.emit(MediaEvent::PlayFailed {
                token,
                reason: "source is no longer bound".to_string(),
            });
            return;
        }

        // A finished sink restarts from the top, like a media element after `ended`.
        let finished = self.sink.as_ref().is_some_and(|s| s.empty());
        if finished || self.sink.is_none() {
            let at = if finished { 0.0 } else { self.current_position() };
            if finished {
                self.store_position(0.0);
            }
            if let Err(e) = self.rebuild(at) {
                self.emit(MediaEvent::PlayFailed {
                    token,
                    reason: e.to_string(),
                });
                return;
            }
        }

        match &self.sink {
            Some(s) => {
                s.play();
                self.playing = true;
                self.emit(MediaEvent::PlayStarted { token });
            }
            None => self.emit(MediaEvent::PlayFailed {
                token,
                reason: "nothing to play".to_string(),
            }),
        }
    }

    fn seek(&mut self, seconds: f64) {
        self.store_position(seconds);
        if self.binding.is_none() {
            return;
        }

        // A finished or missing sink is rebuilt by the next play at the stored
        // position, so a rewind right before a rebind never decodes the file.
        let Some(sink) = self.sink.as_ref().filter(|s| !s.empty()) else {
            if let Some(old) = self.sink.take() {
                old.stop();
            }
            return;
        };

        match sink.try_seek(Duration::from_secs_f64(seconds.max(0.0))) {
            Ok(()) => self.offset = 0.0,
            Err(e) => {
                tracing::debug!(error = %e, "in-place seek failed, rebuilding sink");
                if let Err(e) = self.rebuild(seconds) {
                    tracing::warn!(error = %e, "seek failed");
                }
            }
        }
    }

    fn tick(&mut self) {
        let Some(binding) = self.binding else {
            return;
        };
        if !self.playing {
            return;
        }
        let Some(sink) = &self.sink else {
            return;
        };

        let ended = sink.empty();
        let position = self.offset + sink.get_pos().as_secs_f64();
        self.store_position(position);
        self.emit(MediaEvent::PositionChanged { binding, position });

        if ended {
            self.playing = false;
            tracing::debug!(binding = binding.0, "track ended");
            self.emit(MediaEvent::Ended { binding });
        }
    }
}
