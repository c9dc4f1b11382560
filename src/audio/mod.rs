pub mod chime;

use chime::TimerChime;

use log::warn;
use rodio::{OutputStream, Sink};
use std::sync::{
    mpsc::{self, Sender},
    Arc, Mutex,
};
use std::thread;

/// Capability seam for the timer-end cue, so the cook controller is testable
/// without an audio device.
pub trait Chime: Send + Sync {
    fn ring(&self);
}

/// No-op chime for tests and headless environments.
pub struct NullChime;

impl Chime for NullChime {
    fn ring(&self) {}
}

enum AudioCommand {
    Ring,
}

/// Owns the dedicated audio thread. Non-Send rodio objects live on that
/// thread; callers only push commands through the channel.
pub struct ChimeHandle {
    tx: Arc<Mutex<Option<Sender<AudioCommand>>>>,
}

impl ChimeHandle {
    pub fn new() -> Self {
        Self {
            tx: Arc::new(Mutex::new(None)),
        }
    }

    fn ensure_thread(&self) -> Result<Sender<AudioCommand>, String> {
        // Held across spawn so concurrent callers share one audio thread.
        let mut guard = self.tx.lock().map_err(|e| e.to_string())?;
        if let Some(tx) = guard.as_ref() {
            return Ok(tx.clone());
        }

        let (tx, rx) = mpsc::channel::<AudioCommand>();

        thread::Builder::new()
            .name("audio-chime".to_string())
            .spawn(move || {
                let mut _stream: Option<OutputStream> = None;
                let mut sink: Option<Sink> = None;

                fn ensure_sink(
                    stream: &mut Option<OutputStream>,
                    sink: &mut Option<Sink>,
                ) -> Result<(), String> {
                    if sink.is_none() {
                        let (s, handle) = OutputStream::try_default()
                            .map_err(|e| format!("Failed to create audio output stream: {}", e))?;
                        let new_sink = Sink::try_new(&handle)
                            .map_err(|e| format!("Failed to create audio sink: {}", e))?;
                        *stream = Some(s);
                        *sink = Some(new_sink);
                    }
                    Ok(())
                }

                while let Ok(cmd) = rx.recv() {
                    match cmd {
                        AudioCommand::Ring => {
                            if let Err(e) = ensure_sink(&mut _stream, &mut sink) {
                                warn!("chime unavailable: {e}");
                                continue;
                            }
                            if let Some(ref s) = sink {
                                s.append(TimerChime::new());
                                s.play();
                            }
                        }
                    }
                }
            })
            .map_err(|e| e.to_string())?;

        let tx_clone = tx.clone();
        *guard = Some(tx);
        Ok(tx_clone)
    }
}

impl Chime for ChimeHandle {
    fn ring(&self) {
        match self.ensure_thread() {
            Ok(tx) => {
                let _ = tx.send(AudioCommand::Ring);
            }
            Err(e) => warn!("failed to start audio thread: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concurrent_callers_share_one_audio_thread() {
        let handle = Arc::new(ChimeHandle::new());

        let joins: Vec<_> = (0..4)
            .map(|_| {
                let handle = handle.clone();
                thread::spawn(move || handle.ensure_thread())
            })
            .collect();

        // Every caller gets a sender into the single live channel.
        for join in joins {
            let tx = join.join().unwrap().unwrap();
            assert!(tx.send(AudioCommand::Ring).is_ok());
        }
    }
}
