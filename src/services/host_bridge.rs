//! Capability adapter talking to the host over the line protocol.
//!
//! Every capability call becomes a [`HostCommand`]; completion events coming back from
//! the host are matched to their waiters by handle id.

use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicBool, Ordering},
};

use dashmap::DashMap;
use futures::{FutureExt, future::BoxFuture};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;
use uuid::Uuid;

use crate::{
    dto::{host::HostCommand, intent::HostMessage},
    services::{
        app::AppEvent,
        audio::{AudioBackend, AudioError, AudioHandle, Playing, VoiceCapture, VoiceError},
        speech::{SpeechOptions, SpeechSynth},
    },
};

type AudioWaiter = oneshot::Sender<Result<(), AudioError>>;
type VoiceWaiter = oneshot::Sender<Result<String, VoiceError>>;

/// Implements every host capability by emitting commands and awaiting host events.
#[derive(Clone)]
pub struct HostBridge {
    inner: Arc<BridgeInner>,
}

struct BridgeInner {
    commands: mpsc::UnboundedSender<HostCommand>,
    pending: DashMap<Uuid, AudioWaiter>,
    voice: Mutex<Option<VoiceWaiter>>,
    voice_supported: AtomicBool,
    language: String,
}

impl HostBridge {
    /// Emit commands on `commands`. Voice capture starts in `language`.
    pub fn new(commands: mpsc::UnboundedSender<HostCommand>, language: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(BridgeInner {
                commands,
                pending: DashMap::new(),
                voice: Mutex::new(None),
                voice_supported: AtomicBool::new(false),
                language: language.into(),
            }),
        }
    }

    /// Record whether the host can recognise speech.
    pub fn set_voice_supported(&self, supported: bool) {
        self.inner.voice_supported.store(supported, Ordering::Relaxed);
    }

    /// Deliver the host's verdict for a playback handle.
    pub fn resolve_audio(&self, handle: Uuid, result: Result<(), AudioError>) {
        match self.inner.pending.remove(&handle) {
            Some((_, waiter)) => {
                // The waiter is gone when the sequence was cancelled meanwhile.
                let _ = waiter.send(result);
            }
            None => debug!(%handle, "ignoring audio event for an untracked handle"),
        }
    }

    /// Deliver the outcome of the in-flight voice capture.
    pub fn resolve_voice(&self, result: Result<String, VoiceError>) {
        let waiter = self
            .inner
            .voice
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match waiter {
            Some(waiter) => {
                let _ = waiter.send(result);
            }
            None => debug!("ignoring voice event with no capture in flight"),
        }
    }

    /// Settle capability events coming from the host. User actions are handed back
    /// for the controller's inbox.
    pub fn route(&self, message: HostMessage) -> Option<AppEvent> {
        match message {
            HostMessage::Intent(intent) => return Some(AppEvent::Intent(intent)),
            HostMessage::AudioEnded { handle } => self.resolve_audio(handle, Ok(())),
            HostMessage::AudioFailed { handle, reason } => self.resolve_audio(
                handle,
                Err(AudioError::PlaybackFailed(
                    reason.unwrap_or_else(|| "unknown".into()),
                )),
            ),
            HostMessage::VoiceResult { transcript } => self.resolve_voice(Ok(transcript)),
            HostMessage::VoiceFailed { reason } => {
                self.resolve_voice(Err(reason.map_or(VoiceError::NoResult, VoiceError::Failed)))
            }
            HostMessage::Ready { .. } => debug!("ignoring repeated ready"),
            HostMessage::Unknown => debug!("ignoring unknown host message"),
        }
        None
    }

    /// Number of playback handles awaiting a host event.
    pub fn pending_audio(&self) -> usize {
        self.inner.pending.len()
    }
}

impl BridgeInner {
    fn send(&self, command: HostCommand) -> bool {
        match self.commands.send(command) {
            Ok(()) => true,
            Err(err) => {
                debug!(command = ?err.0, "host channel closed; dropping command");
                false
            }
        }
    }
}

struct BridgeHandle {
    id: Uuid,
    inner: Arc<BridgeInner>,
}

impl AudioHandle for BridgeHandle {
    fn id(&self) -> Uuid {
        self.id
    }

    fn stop(&self) -> Result<(), AudioError> {
        // Dropping the waiter resolves the playback as stopped and discards any late event.
        if self.inner.pending.remove(&self.id).is_none() {
            return Err(AudioError::Disposed);
        }
        self.inner.send(HostCommand::AudioStop { handle: self.id });
        Ok(())
    }
}

impl AudioBackend for HostBridge {
    fn play(&self, src: &str, volume: f32) -> Result<Playing, AudioError> {
        let id = Uuid::new_v4();
        let (waiter, finished) = oneshot::channel();
        self.inner.pending.insert(id, waiter);

        let sent = self.inner.send(HostCommand::AudioPlay {
            handle: id,
            src: src.to_string(),
            volume,
        });
        if !sent {
            self.inner.pending.remove(&id);
            return Err(AudioError::PlaybackFailed("host disconnected".into()));
        }

        Ok(Playing {
            handle: Arc::new(BridgeHandle {
                id,
                inner: self.inner.clone(),
            }),
            finished: finished
                .map(|result| result.unwrap_or(Err(AudioError::Stopped)))
                .boxed(),
        })
    }

    fn preload(&self, src: &str) {
        self.inner.send(HostCommand::AudioPreload {
            src: src.to_string(),
        });
    }
}

impl SpeechSynth for HostBridge {
    fn speak(&self, text: &str, options: &SpeechOptions) {
        self.inner.send(HostCommand::SpeechSpeak {
            text: text.to_string(),
            rate: options.rate,
            pitch: options.pitch,
            language: options.language.clone(),
        });
    }

    fn cancel(&self) {
        self.inner.send(HostCommand::SpeechCancel);
    }
}

impl VoiceCapture for HostBridge {
    fn is_supported(&self) -> bool {
        self.inner.voice_supported.load(Ordering::Relaxed)
    }

    fn start(&self) -> Result<BoxFuture<'static, Result<String, VoiceError>>, VoiceError> {
        if !self.is_supported() {
            return Err(VoiceError::Unsupported);
        }

        let mut slot = self
            .inner
            .voice
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|waiter| !waiter.is_closed()) {
            return Err(VoiceError::Busy);
        }

        let (waiter, result) = oneshot::channel();
        *slot = Some(waiter);
        drop(slot);

        if !self.inner.send(HostCommand::VoiceStart {
            language: self.inner.language.clone(),
        }) {
            self.inner
                .voice
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            return Err(VoiceError::Failed("host disconnected".into()));
        }

        Ok(result
            .map(|result| result.unwrap_or(Err(VoiceError::NoResult)))
            .boxed())
    }
}
