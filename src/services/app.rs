//! Application controller: owns the session and turns host events into surface updates,
//! playback and round transitions.
//!
//! Events are handled one at a time from a single inbox. Delayed work (next round, pair
//! checks, replays) is scheduled as a future inbox event stamped with the generation it
//! belongs to, so anything scheduled for a superseded round or card is dropped.

use std::{future::Future, sync::Arc, time::Duration};

use rand::rngs::StdRng;
use tokio::{sync::mpsc, time::sleep};
use tracing::{debug, info, warn};

use crate::{
    config::AppConfig,
    dao::{catalog::ContentRepository, store::KeyValueStore},
    dto::{
        intent::UserIntent,
        surface::{CardView, ConfirmAction, RoundView, Severity},
    },
    error::ServiceError,
    services::{
        audio::{AudioBackend, VoiceCapture, VoiceError},
        messages::{self, MissKind},
        playback::{Cue, PlaybackSequencer},
        rewards::RewardTracker,
        speech::{SpeechFallback, SpeechSynth},
        surface::PresentationSurface,
    },
    state::{
        RoundEvent, Screen, Session,
        games::{FlipOutcome, GameMode, LetterOutcome, PairOutcome, Round, RoundError, Verdict},
    },
};

/// Collaborators the controller is wired to.
pub struct AppDeps {
    /// Runtime configuration.
    pub config: AppConfig,
    /// Word catalog.
    pub content: Arc<dyn ContentRepository>,
    /// User interface.
    pub surface: Arc<dyn PresentationSurface>,
    /// Clip playback.
    pub audio: Arc<dyn AudioBackend>,
    /// Speech synthesis.
    pub speech: Arc<dyn SpeechSynth>,
    /// Speech recognition.
    pub voice: Arc<dyn VoiceCapture>,
    /// Star persistence.
    pub store: Arc<dyn KeyValueStore>,
}

/// Delayed work items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Replace the solved round with a fresh one.
    NextRound,
    /// Compare the two face-up memory pieces.
    CheckPair,
    /// Celebrate a finished memory board.
    MemoryComplete,
    /// Replay the current card after a missed voice attempt.
    ReplayCard,
}

/// Everything the controller reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// A user action.
    Intent(UserIntent),
    /// A scheduled delay elapsed. `generation` is the round generation, or the card
    /// generation for [`TimerEvent::ReplayCard`].
    Timer {
        /// Generation the timer was scheduled in.
        generation: u64,
        /// Work to do.
        event: TimerEvent,
    },
    /// A voice capture finished.
    Voice(Result<String, VoiceError>),
}

/// Single owner of the session state.
pub struct App {
    config: AppConfig,
    content: Arc<dyn ContentRepository>,
    surface: Arc<dyn PresentationSurface>,
    voice: Arc<dyn VoiceCapture>,
    playback: PlaybackSequencer,
    rewards: RewardTracker,
    session: Session,
    rng: StdRng,
    sender: mpsc::UnboundedSender<AppEvent>,
    inbox: mpsc::UnboundedReceiver<AppEvent>,
}

impl App {
    /// Wire the controller and restore the persisted star count.
    pub async fn new(deps: AppDeps, rng: StdRng) -> Self {
        let AppDeps {
            config,
            content,
            surface,
            audio,
            speech,
            voice,
            store,
        } = deps;
        let speech = SpeechFallback::new(speech, config.speech.clone());
        let playback = PlaybackSequencer::new(audio, speech, &config);
        let rewards = RewardTracker::load(store, config.reward_every).await;
        let (sender, inbox) = mpsc::unbounded_channel();

        Self {
            config,
            content,
            surface,
            voice,
            playback,
            rewards,
            session: Session::new(),
            rng,
            sender,
            inbox,
        }
    }

    /// Handle for feeding events into the inbox.
    pub fn sender(&self) -> mpsc::UnboundedSender<AppEvent> {
        self.sender.clone()
    }

    /// Current session state.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Current round, if a game is running.
    pub fn round(&self) -> Option<&Round> {
        self.session.round()
    }

    /// Current star count.
    pub fn stars(&self) -> u64 {
        self.rewards.count()
    }

    /// Playback sequencer owned by the controller.
    pub fn playback(&self) -> &PlaybackSequencer {
        &self.playback
    }

    /// Paint the initial interface once the host is ready.
    pub fn init(&mut self) {
        self.surface.render_stars(self.rewards.count());
        let voice = self.voice.is_supported();
        if !voice {
            info!("speech recognition unavailable; hiding microphone");
        }
        self.surface.set_voice_available(voice);
        self.show(Screen::Home);
    }

    /// Process events until `shutdown` resolves.
    pub async fn run<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                Some(event) = self.inbox.recv() => self.handle(event).await,
            }
        }
        self.playback.stop_all();
        info!("controller stopped");
    }

    /// Handle every event already waiting in the inbox.
    pub async fn drain(&mut self) {
        while let Ok(event) = self.inbox.try_recv() {
            self.handle(event).await;
        }
    }

    /// Handle one event. Failures are logged; the session carries on.
    pub async fn handle(&mut self, event: AppEvent) {
        let result = match event {
            AppEvent::Intent(intent) => self.handle_intent(intent).await,
            AppEvent::Timer { generation, event } => self.handle_timer(generation, event).await,
            AppEvent::Voice(result) => {
                self.handle_voice(result).await;
                Ok(())
            }
        };
        if let Err(err) = result {
            warn!(error = %err, "event handling failed");
        }
    }

    async fn handle_intent(&mut self, intent: UserIntent) -> Result<(), ServiceError> {
        debug!(?intent, "handling intent");
        match intent {
            UserIntent::LoadCategory { name } => self.load_category(&name),
            UserIntent::NextCard => self.next_card(),
            UserIntent::PrevCard => self.prev_card(),
            UserIntent::Replay => self.replay(),
            UserIntent::ToggleImage => self.toggle_image(),
            UserIntent::StartListening => self.start_listening(),
            UserIntent::GoHome => self.go_home(),
            UserIntent::OpenGameMenu => self.open_game_menu(),
            UserIntent::StartGame { mode } => return self.start_game(mode),
            UserIntent::SelectOption { id } => return self.select_option(&id).await,
            UserIntent::FlipCard { index } => self.flip_card(index),
            UserIntent::SelectSyllable { index } => self.select_syllable(index),
            UserIntent::CheckSyllables => return self.check_syllables().await,
            UserIntent::PickLetter { index } => return self.pick_letter(index).await,
            UserIntent::ChooseBucket { category } => return self.choose_bucket(&category).await,
            UserIntent::ResetStars { confirmed } => self.reset_stars(confirmed).await,
            UserIntent::CloseModal => self.surface.dismiss_reward_modal(),
        }
        Ok(())
    }

    async fn handle_timer(&mut self, generation: u64, event: TimerEvent) -> Result<(), ServiceError> {
        if event == TimerEvent::ReplayCard {
            if generation != self.session.card_generation() || self.session.screen() != Screen::Learn
            {
                debug!(generation, ?event, "ignoring stale timer");
                return Ok(());
            }
            self.replay();
            return Ok(());
        }

        if generation != self.session.round_generation()
            || self.session.screen() != Screen::GamePlay
        {
            debug!(generation, ?event, "ignoring stale timer");
            return Ok(());
        }
        match event {
            TimerEvent::NextRound => {
                self.session.transition(RoundEvent::Advance)?;
                self.present_round()
            }
            TimerEvent::CheckPair => self.check_pair().await,
            TimerEvent::MemoryComplete => {
                self.surface
                    .toast(messages::BOARD_COMPLETE, Severity::Success);
                self.playback.play_cue(Cue::Victory);
                self.surface.celebrate();
                self.speech().say(messages::SAY_BOARD_COMPLETE);
                self.schedule_round(self.config.timings.memory_advance(), TimerEvent::NextRound);
                Ok(())
            }
            TimerEvent::ReplayCard => Ok(()),
        }
    }

    // Screens and learn mode.

    fn show(&mut self, screen: Screen) {
        self.session.set_screen(screen);
        self.surface.show_screen(screen);
    }

    /// Silence playback and drop any running game, card timer or voice capture.
    fn leave_screen(&mut self) {
        self.playback.stop_all();
        self.session.leave_game();
        self.session.bump_card();
        if self.session.listening() {
            self.session.set_listening(false);
            self.surface.set_listening(false);
        }
    }

    fn go_home(&mut self) {
        self.leave_screen();
        self.show(Screen::Home);
    }

    fn open_game_menu(&mut self) {
        self.leave_screen();
        self.show(Screen::GameMenu);
    }

    fn load_category(&mut self, name: &str) {
        let Some(category) = self.content.category(name) else {
            warn!(category = name, "unknown category requested");
            self.surface
                .toast(messages::UNKNOWN_CATEGORY, Severity::Error);
            return;
        };

        self.leave_screen();
        self.playback.preload(&category.entries);
        let images: Vec<String> = category
            .entries
            .iter()
            .map(|entry| entry.image.clone())
            .collect();
        self.surface.preload_images(&images);

        info!(category = %category.key, words = category.len(), "category loaded");
        self.session.select_category(category);
        self.session.set_screen(Screen::Learn);
        self.render_card();
        self.surface.show_screen(Screen::Learn);
    }

    /// Show the current card and start its audio sequence.
    fn render_card(&mut self) {
        let Some(entry) = self.session.current_entry() else {
            warn!("card requested without a category; returning home");
            self.go_home();
            return;
        };
        let total = self.session.category().map_or(0, |category| category.len());
        let card = CardView::new(
            &entry,
            self.session.card_index(),
            total,
            self.session.image_hidden(),
        );
        self.surface.render_card(&card);
        self.playback.play_sequence(entry);
    }

    fn next_card(&mut self) {
        if self.session.category().is_none() {
            warn!("next card requested without a category; returning home");
            self.go_home();
        } else if self.session.next_card() {
            self.render_card();
        } else {
            self.surface
                .toast(messages::END_OF_CATEGORY, Severity::Success);
        }
    }

    fn prev_card(&mut self) {
        if self.session.prev_card() {
            self.render_card();
        }
    }

    fn replay(&mut self) {
        match self.session.current_entry() {
            Some(entry) => self.playback.play_sequence(entry),
            None => debug!("nothing to replay"),
        }
    }

    fn toggle_image(&mut self) {
        let hidden = self.session.toggle_image();
        self.surface.set_image_hidden(hidden);
        if hidden {
            self.surface.toast(messages::IMAGE_HIDDEN, Severity::Info);
        }
    }

    // Voice practice.

    fn start_listening(&mut self) {
        if self.session.listening() {
            debug!("voice capture already in flight");
            return;
        }
        match self.voice.start() {
            Ok(capture) => {
                self.session.set_listening(true);
                self.surface.set_listening(true);
                let sender = self.sender.clone();
                tokio::spawn(async move {
                    let result = capture.await;
                    let _ = sender.send(AppEvent::Voice(result));
                });
            }
            Err(VoiceError::Unsupported) => {
                self.surface
                    .toast(messages::VOICE_UNSUPPORTED, Severity::Error);
            }
            Err(VoiceError::Busy) => debug!("voice capture already in flight"),
            Err(err) => {
                warn!(error = %err, "voice capture failed to start");
                self.surface.toast(messages::VOICE_NOT_HEARD, Severity::Info);
            }
        }
    }

    async fn handle_voice(&mut self, result: Result<String, VoiceError>) {
        if !self.session.listening() {
            debug!("ignoring voice result after leaving learn mode");
            return;
        }
        self.session.set_listening(false);
        self.surface.set_listening(false);

        let Some(entry) = self
            .session
            .current_entry()
            .filter(|_| self.session.screen() == Screen::Learn)
        else {
            debug!("ignoring voice result outside learn mode");
            return;
        };

        let heard = match result {
            Ok(transcript) => transcript.trim().to_uppercase(),
            Err(err) => {
                debug!(error = %err, "voice capture ended without a result");
                String::new()
            }
        };
        if heard.is_empty() {
            self.surface.toast(messages::VOICE_NOT_HEARD, Severity::Info);
            return;
        }

        if heard.contains(entry.word.as_str()) || entry.word.contains(heard.as_str()) {
            self.surface.toast(messages::VOICE_MATCH, Severity::Success);
            self.playback.play_cue(Cue::Victory);
            self.surface.celebrate();
            self.award().await;
        } else {
            let message = messages::encouragement(&mut self.rng, MissKind::Voice);
            self.surface.toast(message, Severity::Error);
            self.playback.play_cue(Cue::Error);
            self.speech().say(messages::SAY_TRY_AGAIN);
            self.schedule(
                self.config.timings.voice_retry_replay(),
                self.session.card_generation(),
                TimerEvent::ReplayCard,
            );
        }
    }

    // Games.

    fn start_game(&mut self, mode: GameMode) -> Result<(), ServiceError> {
        if mode.needs_category() && self.session.category().is_none() {
            warn!(%mode, "round requested without a category; returning home");
            self.go_home();
            return Ok(());
        }

        self.playback.stop_all();
        self.session.bump_card();
        self.session.enter_game(mode)?;
        self.show(Screen::GamePlay);
        info!(%mode, "game started");
        self.present_round()
    }

    /// Generate, render and announce a round, then open it for input.
    fn present_round(&mut self) -> Result<(), ServiceError> {
        self.playback.stop_all();
        let Some(mode) = self.session.mode() else {
            warn!("round requested outside a game; returning home");
            self.go_home();
            return Ok(());
        };

        let round = match Round::generate(
            mode,
            self.session.category(),
            self.content.as_ref(),
            &mut self.rng,
        ) {
            Ok(round) => round,
            Err(RoundError::NoCategory) => {
                warn!(%mode, "round requested without a category; returning home");
                self.go_home();
                return Ok(());
            }
            Err(err) => {
                warn!(%mode, error = %err, "cannot generate a round");
                self.surface
                    .toast(messages::ROUND_UNAVAILABLE, Severity::Error);
                self.open_game_menu();
                return Ok(());
            }
        };

        self.surface.render_round(&RoundView::from(&round));
        if let Some(text) = messages::spoken_instruction(&round) {
            self.speech().say(&text);
        }
        if let Round::ListenChoose(choice) = &round {
            self.playback.speak_after(
                self.config.timings.listen_prompt_delay(),
                messages::listen_prompt(&choice.target().word),
            );
        }
        self.session.set_round(round);
        self.session.transition(RoundEvent::Arm)?;
        Ok(())
    }

    /// Whether answers are accepted right now.
    fn accepts_answer(&self, action: &str) -> bool {
        let accepts = self.session.accepts_input();
        if !accepts {
            debug!(action, phase = ?self.session.phase(), "ignoring answer outside awaiting input");
        }
        accepts
    }

    fn wrong_kind(&self, action: &str) {
        debug!(action, mode = ?self.session.mode(), "ignoring answer for another round kind");
    }

    fn render_round(&self) {
        if let Some(round) = self.session.round() {
            self.surface.render_round(&RoundView::from(round));
        }
    }

    async fn select_option(&mut self, id: &str) -> Result<(), ServiceError> {
        if !self.accepts_answer("select_option") {
            return Ok(());
        }
        let verdict = match self.session.round() {
            Some(Round::FindWord(choice) | Round::ListenChoose(choice)) => choice.evaluate(id),
            _ => {
                self.wrong_kind("select_option");
                return Ok(());
            }
        };
        let Some(verdict) = verdict else {
            debug!(option = id, "ignoring option not on display");
            return Ok(());
        };

        self.session.transition(RoundEvent::Evaluate(verdict))?;
        match verdict {
            Verdict::Correct => {
                self.succeed(messages::CORRECT).await;
                self.speech().say(messages::SAY_WELL_DONE);
                self.schedule_round(self.config.timings.success_advance(), TimerEvent::NextRound);
            }
            Verdict::Incorrect => {
                self.miss(MissKind::Choice);
                self.speech().say(messages::SAY_TRY_AGAIN);
                self.session.transition(RoundEvent::Resume)?;
            }
        }
        Ok(())
    }

    fn flip_card(&mut self, index: usize) {
        if !self.accepts_answer("flip_card") {
            return;
        }
        let outcome = match self.session.round_mut() {
            Some(Round::Memory(memory)) => memory.flip(index),
            _ => {
                self.wrong_kind("flip_card");
                return;
            }
        };
        match outcome {
            FlipOutcome::Ignored => debug!(index, "ignoring flip"),
            FlipOutcome::Revealed => self.render_round(),
            FlipOutcome::PairReady => {
                self.render_round();
                self.schedule_round(self.config.timings.pair_check_delay(), TimerEvent::CheckPair);
            }
        }
    }

    async fn check_pair(&mut self) -> Result<(), ServiceError> {
        let outcome = match self.session.round_mut() {
            Some(Round::Memory(memory)) => memory.resolve(),
            _ => None,
        };
        let Some(outcome) = outcome else {
            debug!("no memory pair to check");
            return Ok(());
        };
        self.render_round();

        match outcome {
            PairOutcome::Matched { complete } => {
                self.session
                    .transition(RoundEvent::Evaluate(Verdict::Correct))?;
                self.succeed(messages::PAIR_FOUND).await;
                self.speech().say(messages::SAY_WELL_DONE);
                if complete {
                    self.schedule_round(
                        self.config.timings.memory_celebration_delay(),
                        TimerEvent::MemoryComplete,
                    );
                } else {
                    self.session.transition(RoundEvent::Resume)?;
                }
            }
            PairOutcome::Mismatched => {
                self.session
                    .transition(RoundEvent::Evaluate(Verdict::Incorrect))?;
                self.miss(MissKind::Memory);
                self.session.transition(RoundEvent::Resume)?;
            }
        }
        Ok(())
    }

    fn select_syllable(&mut self, index: usize) {
        if !self.accepts_answer("select_syllable") {
            return;
        }
        let selected = match self.session.round_mut() {
            Some(Round::SyllableOrder(syllables)) => syllables.select(index),
            _ => {
                self.wrong_kind("select_syllable");
                return;
            }
        };
        if selected {
            self.render_round();
        } else {
            debug!(index, "ignoring syllable");
        }
    }

    async fn check_syllables(&mut self) -> Result<(), ServiceError> {
        if !self.accepts_answer("check_syllables") {
            return Ok(());
        }
        let (verdict, word) = match self.session.round_mut() {
            Some(Round::SyllableOrder(syllables)) => {
                (syllables.check(), syllables.target().word.clone())
            }
            _ => {
                self.wrong_kind("check_syllables");
                return Ok(());
            }
        };

        self.session.transition(RoundEvent::Evaluate(verdict))?;
        match verdict {
            Verdict::Correct => {
                self.succeed(messages::CORRECT).await;
                self.speech()
                    .say(&format!("{} {word}", messages::SAY_WELL_DONE));
                self.schedule_round(self.config.timings.success_advance(), TimerEvent::NextRound);
            }
            Verdict::Incorrect => {
                self.render_round();
                self.miss(MissKind::Syllables);
                self.speech().say(messages::SAY_TRY_AGAIN);
                self.session.transition(RoundEvent::Resume)?;
            }
        }
        Ok(())
    }

    async fn pick_letter(&mut self, index: usize) -> Result<(), ServiceError> {
        if !self.accepts_answer("pick_letter") {
            return Ok(());
        }
        let (outcome, word) = match self.session.round_mut() {
            Some(Round::Spelling(spelling)) => (spelling.pick(index), spelling.target().word.clone()),
            _ => {
                self.wrong_kind("pick_letter");
                return Ok(());
            }
        };

        match outcome {
            LetterOutcome::Ignored => debug!(index, "ignoring letter"),
            LetterOutcome::Placed { complete } => {
                self.render_round();
                self.playback.play_cue(Cue::Victory);
                if complete {
                    self.session
                        .transition(RoundEvent::Evaluate(Verdict::Correct))?;
                    self.surface.toast(messages::WORD_COMPLETE, Severity::Success);
                    self.surface.celebrate();
                    self.award().await;
                    self.speech().say(&word);
                    self.schedule_round(
                        self.config.timings.spelling_advance(),
                        TimerEvent::NextRound,
                    );
                }
            }
            LetterOutcome::Rejected => {
                self.session
                    .transition(RoundEvent::Evaluate(Verdict::Incorrect))?;
                self.playback.play_cue(Cue::Error);
                self.surface.toast(messages::WRONG_LETTER, Severity::Error);
                self.surface.letter_rejected(index);
                self.session.transition(RoundEvent::Resume)?;
            }
        }
        Ok(())
    }

    async fn choose_bucket(&mut self, key: &str) -> Result<(), ServiceError> {
        if !self.accepts_answer("choose_bucket") {
            return Ok(());
        }
        let (verdict, label) = match self.session.round() {
            Some(Round::Classification(classification)) => (
                classification.evaluate(key),
                classification
                    .bucket(key)
                    .map(|bucket| bucket.label.clone())
                    .unwrap_or_default(),
            ),
            _ => {
                self.wrong_kind("choose_bucket");
                return Ok(());
            }
        };
        let Some(verdict) = verdict else {
            debug!(bucket = key, "ignoring bucket not on display");
            return Ok(());
        };

        self.session.transition(RoundEvent::Evaluate(verdict))?;
        match verdict {
            Verdict::Correct => {
                self.succeed(&messages::classified(&label)).await;
                self.schedule_round(
                    self.config.timings.classification_advance(),
                    TimerEvent::NextRound,
                );
            }
            Verdict::Incorrect => {
                self.surface.toast(messages::WRONG_BUCKET, Severity::Error);
                self.playback.play_cue(Cue::Error);
                self.session.transition(RoundEvent::Resume)?;
            }
        }
        Ok(())
    }

    // Feedback and rewards.

    fn speech(&self) -> &SpeechFallback {
        self.playback.speech()
    }

    /// Success toast, victory cue, confetti and one star.
    async fn succeed(&mut self, message: &str) {
        self.surface.toast(message, Severity::Success);
        self.playback.play_cue(Cue::Victory);
        self.surface.celebrate();
        self.award().await;
    }

    /// Encouragement toast and error cue.
    fn miss(&mut self, kind: MissKind) {
        let message = messages::encouragement(&mut self.rng, kind);
        self.surface.toast(message, Severity::Error);
        self.playback.play_cue(Cue::Error);
    }

    async fn award(&mut self) {
        let award = self.rewards.add_point().await;
        self.surface.render_stars(award.count);
        if award.celebrate {
            info!(stars = award.count, "reward milestone reached");
            self.surface.show_reward_modal();
        }
    }

    async fn reset_stars(&mut self, confirmed: bool) {
        if !confirmed {
            self.surface
                .request_confirmation(ConfirmAction::ResetStars, messages::CONFIRM_RESET);
            return;
        }
        self.rewards.reset().await;
        self.surface.render_stars(0);
        self.surface.toast(messages::STARS_RESET, Severity::Info);
    }

    // Scheduling.

    fn schedule_round(&self, delay: Duration, event: TimerEvent) {
        self.schedule(delay, self.session.round_generation(), event);
    }

    fn schedule(&self, delay: Duration, generation: u64, event: TimerEvent) {
        let sender = self.sender.clone();
        tokio::spawn(async move {
            sleep(delay).await;
            let _ = sender.send(AppEvent::Timer { generation, event });
        });
    }
}
