//! Flashcard audio sequencing with speech fallback and cancellation.
//!
//! A card plays three stages in strict order: the word clip, the syllable clip and the
//! sound effect. A missing or failing clip is replaced by synthesized speech followed by
//! a fixed wait. [`PlaybackSequencer::stop_all`] silences everything the sequencer owns
//! before anything new starts.

use std::{
    future::Future,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use dashmap::DashMap;
use tokio::{sync::watch, task::JoinHandle, time::sleep};
use tracing::debug;
use uuid::Uuid;

use crate::{
    config::{AppConfig, Timings, Volumes},
    services::{
        audio::{AudioBackend, AudioError, AudioHandle, Playing},
        messages::SAY_VICTORY,
        speech::SpeechFallback,
    },
    state::content::WordEntry,
};

const VICTORY_CLIP: &str = "victoria.mp3";
const ERROR_CLIP: &str = "error.mp3";
const WORD_VOLUME: f32 = 1.0;

/// Maps catalog audio names to playable locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceResolver {
    dir: String,
}

impl ResourceResolver {
    /// Resolve bare names under `dir`.
    pub fn new(dir: impl Into<String>) -> Self {
        let dir = dir.into().trim_end_matches('/').to_string();
        Self { dir }
    }

    /// Absolute URLs and names already under the directory pass through unchanged.
    pub fn resolve(&self, name: &str) -> String {
        if name.starts_with("http://") || name.starts_with("https://") || self.dir.is_empty() {
            return name.to_string();
        }
        match name.strip_prefix(self.dir.as_str()) {
            Some(rest) if rest.starts_with('/') => name.to_string(),
            _ => format!("{}/{}", self.dir, name),
        }
    }
}

/// One-shot cancellation flag shared by every stage of a sequence.
#[derive(Debug, Clone)]
pub struct CancelToken {
    sender: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    /// Fresh, not yet cancelled token.
    pub fn new() -> Self {
        let (sender, _receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Cancel the token. Later calls are no-ops.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    /// Whether [`CancelToken::cancel`] was called.
    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolve once the token is cancelled.
    pub async fn cancelled(&self) {
        let mut receiver = self.sender.subscribe();
        // The sender lives as long as `self`, so the wait cannot fail.
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Short feedback sounds played outside card sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    /// Right answer. Falls back to a spoken cheer.
    Victory,
    /// Wrong answer. Silent when the clip fails.
    Error,
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    Word,
    Syllables,
    Effect,
}

/// Owns every tracked audio handle and pending delay.
#[derive(Clone)]
pub struct PlaybackSequencer {
    inner: Arc<Inner>,
}

struct Inner {
    audio: Arc<dyn AudioBackend>,
    speech: SpeechFallback,
    resolver: ResourceResolver,
    timings: Timings,
    volumes: Volumes,
    handles: DashMap<Uuid, Arc<dyn AudioHandle>>,
    timers: DashMap<u64, JoinHandle<()>>,
    next_timer: AtomicU64,
    token: Mutex<CancelToken>,
}

impl PlaybackSequencer {
    /// Build a sequencer over the host's audio output and speech synthesizer.
    pub fn new(audio: Arc<dyn AudioBackend>, speech: SpeechFallback, config: &AppConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                audio,
                speech,
                resolver: ResourceResolver::new(config.audio_dir.clone()),
                timings: config.timings,
                volumes: config.volumes,
                handles: DashMap::new(),
                timers: DashMap::new(),
                next_timer: AtomicU64::new(0),
                token: Mutex::new(CancelToken::new()),
            }),
        }
    }

    /// Speech adapter shared with the sequencer.
    pub fn speech(&self) -> &SpeechFallback {
        &self.inner.speech
    }

    /// Stop whatever is playing and start the three-stage sequence for `entry`.
    pub fn play_sequence(&self, entry: Arc<WordEntry>) {
        let token = self.stop_all();
        let inner = self.inner.clone();
        self.track(async move { inner.run_sequence(entry, token).await });
    }

    /// Cancel speech, stop and forget every tracked handle and abort every pending delay.
    ///
    /// Returns the token guarding whatever starts next.
    pub fn stop_all(&self) -> CancelToken {
        let fresh = CancelToken::new();
        let previous = {
            let mut current = self.inner.token.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *current, fresh.clone())
        };
        previous.cancel();
        self.inner.speech.cancel();

        let ids: Vec<Uuid> = self.inner.handles.iter().map(|entry| *entry.key()).collect();
        for id in ids {
            if let Some((_, handle)) = self.inner.handles.remove(&id) {
                if let Err(err) = handle.stop() {
                    debug!(handle = %id, error = %err, "failed to stop audio handle");
                }
            }
        }

        let timers: Vec<u64> = self.inner.timers.iter().map(|entry| *entry.key()).collect();
        for id in timers {
            if let Some((_, timer)) = self.inner.timers.remove(&id) {
                timer.abort();
            }
        }

        fresh
    }

    /// Speak `text` after `delay` unless playback is stopped first.
    pub fn speak_after(&self, delay: Duration, text: String) {
        let inner = self.inner.clone();
        let token = self.current_token();
        self.track(async move {
            if inner.pause(delay, &token).await {
                inner.speech.say(&text);
            }
        });
    }

    /// Play a feedback cue. Cues are not tracked and survive [`PlaybackSequencer::stop_all`].
    pub fn play_cue(&self, cue: Cue) {
        let inner = self.inner.clone();
        tokio::spawn(async move {
            let (clip, volume) = match cue {
                Cue::Victory => (VICTORY_CLIP, inner.volumes.victory),
                Cue::Error => (ERROR_CLIP, inner.volumes.error),
            };
            let result = match inner.audio.play(&inner.resolver.resolve(clip), volume) {
                Ok(playing) => playing.finished.await,
                Err(err) => Err(err),
            };
            match (cue, result) {
                (_, Ok(())) | (_, Err(AudioError::Stopped)) => {}
                (Cue::Victory, Err(err)) => {
                    debug!(?cue, error = %err, "cue failed; speaking instead");
                    inner.speech.say_cue(SAY_VICTORY);
                }
                (Cue::Error, Err(err)) => debug!(?cue, error = %err, "cue failed"),
            }
        });
    }

    /// Ask the host to fetch every clip of `entries`.
    pub fn preload<'a>(&self, entries: impl IntoIterator<Item = &'a Arc<WordEntry>>) {
        for entry in entries {
            for clip in [&entry.audio, &entry.syllable_audio, &entry.sound]
                .into_iter()
                .flatten()
            {
                self.inner.audio.preload(&self.inner.resolver.resolve(clip));
            }
        }
    }

    /// Number of tracked audio handles and pending delays.
    pub fn tracked(&self) -> (usize, usize) {
        let timers = self
            .inner
            .timers
            .iter()
            .filter(|entry| !entry.value().is_finished())
            .count();
        (self.inner.handles.len(), timers)
    }

    fn current_token(&self) -> CancelToken {
        self.inner
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn track<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.inner.timers.retain(|_, timer| !timer.is_finished());
        let id = self.inner.next_timer.fetch_add(1, Ordering::Relaxed);
        self.inner.timers.insert(id, tokio::spawn(future));
    }
}

impl Inner {
    async fn run_sequence(&self, entry: Arc<WordEntry>, token: CancelToken) {
        if let Err(err) = self
            .play_stage(entry.audio.as_deref(), WORD_VOLUME, &token)
            .await
        {
            if token.is_cancelled() {
                return;
            }
            debug!(entry = %entry.id, stage = ?Stage::Word, error = %err, "falling back to speech");
            self.speech.say(&entry.word);
            if !self.pause(self.timings.word_fallback(), &token).await {
                return;
            }
        }

        if !self.pause(self.timings.stage_pause(), &token).await {
            return;
        }

        if let Err(err) = self
            .play_stage(entry.syllable_audio.as_deref(), WORD_VOLUME, &token)
            .await
        {
            if token.is_cancelled() {
                return;
            }
            debug!(entry = %entry.id, stage = ?Stage::Syllables, error = %err, "falling back to speech");
            self.speech.say_syllables(&entry.syllables);
            if !self.pause(self.timings.syllable_fallback(), &token).await {
                return;
            }
        }

        if !self.pause(self.timings.stage_pause(), &token).await {
            return;
        }

        match self
            .play_stage(entry.sound.as_deref(), self.volumes.effect, &token)
            .await
        {
            Ok(()) | Err(AudioError::Missing) => {}
            Err(err) => {
                debug!(entry = %entry.id, stage = ?Stage::Effect, error = %err, "sound effect skipped")
            }
        }
    }

    /// Play one clip and wait for it to end, fail, or be cancelled.
    async fn play_stage(
        &self,
        clip: Option<&str>,
        volume: f32,
        token: &CancelToken,
    ) -> Result<(), AudioError> {
        let clip = clip.ok_or(AudioError::Missing)?;
        if token.is_cancelled() {
            return Err(AudioError::Stopped);
        }
        let Playing { handle, finished } = self.audio.play(&self.resolver.resolve(clip), volume)?;
        let id = handle.id();
        self.handles.insert(id, handle);

        let result = tokio::select! {
            biased;
            _ = token.cancelled() => Err(AudioError::Stopped),
            result = finished => result,
        };

        // `stop_all` stops every handle it drains. One still here after a cancel was
        // inserted once the drain had passed, so nobody else will stop it.
        if let Some((_, handle)) = self.handles.remove(&id) {
            if result == Err(AudioError::Stopped) && token.is_cancelled() {
                if let Err(err) = handle.stop() {
                    debug!(handle = %id, error = %err, "failed to stop audio handle");
                }
            }
        }
        result
    }

    /// Sleep for `delay`. Returns `false` when cancelled first.
    async fn pause(&self, delay: Duration, token: &CancelToken) -> bool {
        tokio::select! {
            biased;
            _ = token.cancelled() => false,
            _ = sleep(delay) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use futures::FutureExt;
    use tokio::sync::oneshot;

    use super::*;
    use crate::{
        config::SpeechConfig,
        services::speech::{SpeechOptions, SpeechSynth},
        state::content::split_syllables,
    };

    #[derive(Default)]
    struct FakeSpeech {
        spoken: Mutex<Vec<String>>,
        cancels: Mutex<usize>,
    }

    impl SpeechSynth for FakeSpeech {
        fn speak(&self, text: &str, _options: &SpeechOptions) {
            self.spoken.lock().unwrap().push(text.to_string());
        }

        fn cancel(&self) {
            *self.cancels.lock().unwrap() += 1;
        }
    }

    struct FakeHandle {
        id: Uuid,
        stops: Arc<Mutex<Vec<Uuid>>>,
        disposed: bool,
    }

    impl AudioHandle for FakeHandle {
        fn id(&self) -> Uuid {
            self.id
        }

        fn stop(&self) -> Result<(), AudioError> {
            if self.disposed {
                return Err(AudioError::Disposed);
            }
            self.stops.lock().unwrap().push(self.id);
            Ok(())
        }
    }

    /// Records plays; clips listed in `failing` fail at once, others wait for `finish`.
    /// `on_play` runs once inside the next `play` call, before it returns.
    #[derive(Default)]
    struct FakeAudio {
        played: Mutex<Vec<(String, f32)>>,
        on_play: Mutex<Option<Box<dyn FnOnce() + Send>>>,
        pending: Mutex<Vec<(String, oneshot::Sender<Result<(), AudioError>>)>>,
        stops: Arc<Mutex<Vec<Uuid>>>,
        failing: Vec<String>,
        disposed: bool,
    }

    impl FakeAudio {
        fn failing(clips: &[&str]) -> Self {
            Self {
                failing: clips.iter().map(|clip| clip.to_string()).collect(),
                ..Self::default()
            }
        }

        fn finish(&self, src: &str) {
            let mut pending = self.pending.lock().unwrap();
            let position = pending.iter().position(|(clip, _)| clip == src).unwrap();
            let (_, sender) = pending.remove(position);
            let _ = sender.send(Ok(()));
        }

        fn played(&self) -> Vec<String> {
            self.played
                .lock()
                .unwrap()
                .iter()
                .map(|(src, _)| src.clone())
                .collect()
        }
    }

    impl AudioBackend for FakeAudio {
        fn play(&self, src: &str, volume: f32) -> Result<Playing, AudioError> {
            self.played.lock().unwrap().push((src.to_string(), volume));
            let hook = self.on_play.lock().unwrap().take();
            if let Some(hook) = hook {
                hook();
            }
            if self.failing.iter().any(|clip| clip == src) {
                return Err(AudioError::PlaybackFailed("blocked".into()));
            }
            let (sender, receiver) = oneshot::channel();
            self.pending.lock().unwrap().push((src.to_string(), sender));
            Ok(Playing {
                handle: Arc::new(FakeHandle {
                    id: Uuid::new_v4(),
                    stops: self.stops.clone(),
                    disposed: self.disposed,
                }),
                finished: receiver
                    .map(|result| result.unwrap_or(Err(AudioError::Disposed)))
                    .boxed(),
            })
        }
    }

    fn entry(
        audio: Option<&str>,
        syllable_audio: Option<&str>,
        sound: Option<&str>,
    ) -> Arc<WordEntry> {
        Arc::new(WordEntry {
            id: "a1".into(),
            word: "ELEFANTE".into(),
            syllable_text: "E-le-fan-te".into(),
            syllables: split_syllables("E-le-fan-te"),
            image: "elefante.png".into(),
            audio: audio.map(str::to_string),
            syllable_audio: syllable_audio.map(str::to_string),
            sound: sound.map(str::to_string),
        })
    }

    fn sequencer(audio: Arc<FakeAudio>, speech: Arc<FakeSpeech>) -> PlaybackSequencer {
        let fallback = SpeechFallback::new(speech, SpeechConfig::default());
        PlaybackSequencer::new(audio, fallback, &AppConfig::default())
    }

    async fn advance(ms: u64) {
        sleep(Duration::from_millis(ms)).await;
    }

    #[test]
    fn resolver_prefixes_bare_names_only() {
        let resolver = ResourceResolver::new("audio/");
        assert_eq!(resolver.resolve("perro.mp3"), "audio/perro.mp3");
        assert_eq!(resolver.resolve("audio/perro.mp3"), "audio/perro.mp3");
        assert_eq!(resolver.resolve("audiolibro.mp3"), "audio/audiolibro.mp3");
        assert_eq!(
            resolver.resolve("https://cdn.example.org/perro.mp3"),
            "https://cdn.example.org/perro.mp3"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn missing_clips_fall_back_to_speech_in_order() {
        let audio = Arc::new(FakeAudio::default());
        let speech = Arc::new(FakeSpeech::default());
        let sequencer = sequencer(audio.clone(), speech.clone());

        sequencer.play_sequence(entry(None, None, Some("trompeta.mp3")));
        advance(1).await;
        assert_eq!(*speech.spoken.lock().unwrap(), ["ELEFANTE"]);

        // Word fallback wait plus the stage pause.
        advance(1_498).await;
        assert_eq!(speech.spoken.lock().unwrap().len(), 1);
        advance(2).await;
        assert_eq!(
            *speech.spoken.lock().unwrap(),
            ["ELEFANTE", "E, Le, Fan, Te"]
        );
        assert!(audio.played().is_empty());

        advance(2_500).await;
        assert_eq!(
            *audio.played.lock().unwrap(),
            [("audio/trompeta.mp3".to_string(), 0.6)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn next_stage_waits_for_clip_completion() {
        let audio = Arc::new(FakeAudio::default());
        let speech = Arc::new(FakeSpeech::default());
        let sequencer = sequencer(audio.clone(), speech.clone());

        sequencer.play_sequence(entry(Some("elefante.mp3"), None, None));
        advance(10_000).await;
        assert_eq!(audio.played(), ["audio/elefante.mp3"]);
        assert!(speech.spoken.lock().unwrap().is_empty());
        assert_eq!(sequencer.tracked().0, 1);

        audio.finish("audio/elefante.mp3");
        advance(501).await;
        assert_eq!(*speech.spoken.lock().unwrap(), ["E, Le, Fan, Te"]);
        assert_eq!(sequencer.tracked().0, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_clip_falls_back_like_a_missing_one() {
        let audio = Arc::new(FakeAudio::failing(&["audio/elefante.mp3"]));
        let speech = Arc::new(FakeSpeech::default());
        let sequencer = sequencer(audio.clone(), speech.clone());

        sequencer.play_sequence(entry(Some("elefante.mp3"), None, None));
        advance(1).await;
        assert_eq!(*speech.spoken.lock().unwrap(), ["ELEFANTE"]);
    }

    #[tokio::test(start_paused = true)]
    async fn switching_cards_cancels_the_previous_sequence() {
        let audio = Arc::new(FakeAudio::default());
        let speech = Arc::new(FakeSpeech::default());
        let sequencer = sequencer(audio.clone(), speech.clone());

        sequencer.play_sequence(entry(Some("elefante.mp3"), None, Some("trompeta.mp3")));
        advance(1).await;

        sequencer.play_sequence(entry(None, None, None));
        advance(1).await;
        assert_eq!(audio.stops.lock().unwrap().len(), 1);
        assert_eq!(sequencer.tracked().0, 0);

        // A late completion of the first clip must not resume its sequence.
        audio.finish("audio/elefante.mp3");
        advance(10_000).await;
        assert_eq!(audio.played(), ["audio/elefante.mp3"]);
        assert_eq!(
            *speech.spoken.lock().unwrap(),
            ["ELEFANTE", "E, Le, Fan, Te"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stop_all_is_idempotent_and_survives_disposed_handles() {
        let audio = Arc::new(FakeAudio {
            disposed: true,
            ..FakeAudio::default()
        });
        let speech = Arc::new(FakeSpeech::default());
        let sequencer = sequencer(audio.clone(), speech.clone());

        sequencer.stop_all();
        sequencer.stop_all();
        assert_eq!(sequencer.tracked(), (0, 0));

        sequencer.play_sequence(entry(Some("elefante.mp3"), None, None));
        sequencer.speak_after(Duration::from_secs(1), "Toca... GATO".into());
        advance(1).await;
        assert_eq!(sequencer.tracked(), (1, 2));

        sequencer.stop_all();
        sequencer.stop_all();
        assert_eq!(sequencer.tracked(), (0, 0));

        advance(5_000).await;
        assert!(speech.spoken.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_all_while_a_clip_starts_still_stops_it() {
        let audio = Arc::new(FakeAudio::default());
        let speech = Arc::new(FakeSpeech::default());
        let sequencer = sequencer(audio.clone(), speech.clone());

        let stopper = sequencer.clone();
        *audio.on_play.lock().unwrap() = Some(Box::new(move || {
            stopper.stop_all();
        }));

        sequencer.play_sequence(entry(Some("elefante.mp3"), Some("e-le-fan-te.mp3"), None));
        advance(1).await;
        assert_eq!(audio.played(), ["audio/elefante.mp3"]);
        assert_eq!(audio.stops.lock().unwrap().len(), 1);
        assert_eq!(sequencer.tracked(), (0, 0));

        advance(10_000).await;
        assert_eq!(audio.played(), ["audio/elefante.mp3"]);
        assert!(speech.spoken.lock().unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn stop_all_while_a_clip_starts_on_another_worker_still_stops_it() {
        let audio = Arc::new(FakeAudio::default());
        let speech = Arc::new(FakeSpeech::default());
        let sequencer = sequencer(audio.clone(), speech.clone());

        let stopper = sequencer.clone();
        *audio.on_play.lock().unwrap() = Some(Box::new(move || {
            let handle = std::thread::spawn(move || {
                stopper.stop_all();
            });
            let _ = handle.join();
        }));

        sequencer.play_sequence(entry(Some("elefante.mp3"), None, None));
        for _ in 0..100 {
            if !audio.stops.lock().unwrap().is_empty() {
                break;
            }
            advance(10).await;
        }
        assert_eq!(audio.stops.lock().unwrap().len(), 1);
        assert_eq!(sequencer.tracked(), (0, 0));
        assert!(speech.spoken.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_speech_fires_unless_stopped() {
        let audio = Arc::new(FakeAudio::default());
        let speech = Arc::new(FakeSpeech::default());
        let sequencer = sequencer(audio, speech.clone());

        sequencer.speak_after(Duration::from_secs(1), "Toca... GATO".into());
        advance(1_001).await;
        assert_eq!(*speech.spoken.lock().unwrap(), ["Toca... GATO"]);
    }

    #[tokio::test(start_paused = true)]
    async fn victory_cue_falls_back_to_a_cheer() {
        let audio = Arc::new(FakeAudio::failing(&["audio/victoria.mp3", "audio/error.mp3"]));
        let speech = Arc::new(FakeSpeech::default());
        let sequencer = sequencer(audio.clone(), speech.clone());

        sequencer.play_cue(Cue::Error);
        sequencer.play_cue(Cue::Victory);
        advance(1).await;

        assert_eq!(*speech.spoken.lock().unwrap(), ["¡Excelente!"]);
        assert_eq!(
            *audio.played.lock().unwrap(),
            [
                ("audio/error.mp3".to_string(), 0.5),
                ("audio/victoria.mp3".to_string(), 0.7)
            ]
        );
    }
}
