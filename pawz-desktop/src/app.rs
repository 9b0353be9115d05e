//! The desktop host: one owner for every pet and every component.
//!
//! All mutation happens on the thread that drives the ticks and dispatches
//! UI events. Chat requests run as tokio tasks on the side; they work on a
//! snapshot of the pet and hand their result back over a channel, which the
//! next frame tick drains. That keeps the memory log single-writer and makes
//! every save a consistent snapshot taken between ticks.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use pawz_chat::fallback::summarize_exchange;
use pawz_chat::{ChatBackend, ChatService, ChatStats, ChatTurn, PetProfile, PromptTemplate};
use pawz_core::animation::{AnimationDriver, choose_emote};
use pawz_core::behavior::{BehaviorStateMachine, RoamArea};
use pawz_core::mood::{MoodChange, MoodScheduler};
use pawz_core::persistence::{LoadSource, PersistenceManager, SaveReport, checkpoint_living_time};
use pawz_core::sprites::Emote;
use pawz_core::types::{BehaviorState, PetId, Position, Species};
use pawz_core::{PawzConfig, PawzError, PetRecord};

use crate::error::{AppError, Result};
use crate::events::{DeliveredReply, RenderFrame};
use crate::registry::PetRegistry;
use crate::session::{ChatDelivery, ChatSession};

/// Longest step one frame tick may take. A longer gap (a suspended laptop,
/// a stalled loop) is cut to this; the wall clock catches up on the next
/// hourly tick.
pub const MAX_FRAME_SECS: f32 = 60.0;

/// Pets, components, chat sessions and the simulation clock.
pub struct PetApp<B> {
    config: PawzConfig,
    registry: PetRegistry,
    mood: MoodScheduler,
    behavior: BehaviorStateMachine,
    animation: AnimationDriver,
    persistence: PersistenceManager,
    chat: Arc<ChatService<B>>,
    sessions: HashMap<PetId, ChatSession>,
    next_generation: u64,
    deliveries_tx: UnboundedSender<ChatDelivery>,
    deliveries_rx: UnboundedReceiver<ChatDelivery>,
    delivered: Vec<DeliveredReply>,
    rng: StdRng,
    now: DateTime<Utc>,
    scale: f32,
}

impl<B> std::fmt::Debug for PetApp<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PetApp")
            .field("pets", &self.registry.len())
            .field("sessions", &self.sessions.len())
            .field("now", &self.now)
            .field("scale", &self.scale)
            .finish_non_exhaustive()
    }
}

impl<B: ChatBackend> PetApp<B> {
    /// Create the host with an entropy-seeded random source.
    ///
    /// # Errors
    /// [`AppError::Core`] for an invalid configuration and [`AppError::Chat`]
    /// if the configured prompt file cannot be loaded.
    pub fn new(config: PawzConfig, backend: B, now: DateTime<Utc>) -> Result<Self> {
        Self::with_rng(config, backend, now, StdRng::from_entropy())
    }

    /// Create the host with an explicit random source, for reproducible runs.
    ///
    /// # Errors
    /// See [`new`](Self::new).
    pub fn with_rng(config: PawzConfig, backend: B, now: DateTime<Utc>, rng: StdRng) -> Result<Self> {
        config.validate()?;

        let template = match &config.chat.prompt_file {
            Some(path) => {
                let template = PromptTemplate::from_file(path)?;
                info!(path = %path.display(), version = %template.version, "Loaded chat prompt");
                template
            }
            None => PromptTemplate::builtin(),
        };
        let chat = ChatService::with_template(backend, config.chat.clone(), template);
        let (deliveries_tx, deliveries_rx) = mpsc::unbounded_channel();
        let general = &config.general;
        let scale = general.scale_factor.clamp(general.min_zoom, general.max_zoom);

        Ok(Self {
            registry: PetRegistry::new(),
            mood: MoodScheduler::new(config.mood.clone()),
            behavior: BehaviorStateMachine::new(config.behavior.clone(), RoamArea::from_general(general)),
            animation: AnimationDriver::new(config.animation.clone()),
            persistence: PersistenceManager::new(&config.persistence),
            chat: Arc::new(chat),
            sessions: HashMap::new(),
            next_generation: 0,
            deliveries_tx,
            deliveries_rx,
            delivered: Vec::new(),
            rng,
            now,
            scale,
            config,
        })
    }

    // ------------------------------------------------------------------
    // Clock
    // ------------------------------------------------------------------

    /// Current simulation time.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Move the clock forward to `to`. Earlier instants are ignored.
    pub fn advance_clock(&mut self, to: DateTime<Utc>) {
        if to > self.now {
            self.now = to;
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Restore saved pets, re-roll their mood for the new session and start
    /// each one standing.
    ///
    /// # Errors
    /// [`AppError::Core`] if a restored pet cannot enter STAND.
    pub fn startup(&mut self, now: DateTime<Utc>) -> Result<LoadSource> {
        self.advance_clock(now);
        let outcome = self.persistence.load(self.now);
        let area = self.behavior.area();

        let mut pets = outcome.pets;
        for pet in &mut pets {
            self.mood.reset(pet, self.now, &mut self.rng);
            pet.position = area.clamp(pet.position);
            self.behavior.begin(pet, self.now, &mut self.rng)?;
        }
        self.registry.replace_all(pets);

        info!(
            pets = self.registry.len(),
            source = ?outcome.source,
            offline_secs = outcome.offline_secs,
            "Pawz started"
        );
        Ok(outcome.source)
    }

    /// Flush pending chat results, stop in-flight requests and save.
    pub fn shutdown(&mut self) -> Option<SaveReport> {
        self.apply_deliveries();
        for (_, session) in self.sessions.drain() {
            session.cancel();
        }
        let report = self.save();
        info!(pets = self.registry.len(), "Pawz shut down");
        report
    }

    /// Credit living time and write every pet to disk.
    ///
    /// Failures are logged and reported as `None`; the previous save stays
    /// in place.
    pub fn save(&mut self) -> Option<SaveReport> {
        match self.try_save() {
            Ok(report) => Some(report),
            Err(e) => {
                warn!(error = %e, path = %self.persistence.path().display(), "Save failed");
                None
            }
        }
    }

    fn try_save(&mut self) -> pawz_core::error::Result<SaveReport> {
        checkpoint_living_time(self.registry.iter_mut(), self.now);
        self.persistence.save(self.registry.iter(), self.now)
    }

    // ------------------------------------------------------------------
    // Pet management
    // ------------------------------------------------------------------

    /// Adopt a pet at a random spot and save right away.
    ///
    /// # Errors
    /// [`PawzError::InvalidName`] for a blank name and
    /// [`PawzError::DuplicatePet`] for a name already used by that species.
    pub fn add_pet(&mut self, name: &str, species: Species) -> Result<PetId> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PawzError::InvalidName(name.to_string()).into());
        }
        let position = self.behavior.sample_target(&mut self.rng);
        let mut pet = PetRecord::new(name, species, position, self.mood.config(), self.now);
        self.behavior.begin(&mut pet, self.now, &mut self.rng)?;
        let id = self.registry.insert(pet)?;

        info!(pet = %id, name, species = %species, "Pet adopted");
        self.save();
        Ok(id)
    }

    /// Release a pet. An in-flight chat request is dropped and its reply is
    /// never applied.
    ///
    /// The removal only stands once it is on disk. If the save fails the pet
    /// is put back, chat and all, and the error is returned.
    ///
    /// # Errors
    /// [`PawzError::PetNotFound`] for an unknown ID, [`AppError::Core`] if
    /// the save file cannot be written.
    pub fn remove_pet(&mut self, id: PetId) -> Result<()> {
        let pet = self.registry.remove(id)?;
        if let Err(e) = self.try_save() {
            warn!(pet = %id, error = %e, "Save failed, keeping pet");
            self.registry.insert(pet)?;
            return Err(e.into());
        }
        if let Some(session) = self.sessions.remove(&id) {
            session.cancel();
        }
        info!(pet = %id, label = %pet.label(), "Pet released");

        if let Err(e) = self.persistence.forget(id) {
            warn!(pet = %id, error = %e, "Could not drop pet from backup");
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Input events
    // ------------------------------------------------------------------

    /// A click: count it, raise mood and play an emote that fits the new mood.
    ///
    /// # Errors
    /// [`PawzError::PetNotFound`] for an unknown ID.
    pub fn pet_clicked(&mut self, id: PetId) -> Result<Emote> {
        let pet = self.registry.get_mut(id)?;
        self.mood.apply(pet, self.now, &mut self.rng);
        pet.memory.record_petting();
        let mood = self.mood.pet(pet);
        let emote = choose_emote(mood, &mut self.rng);
        self.animation.start_emote(pet, emote);

        debug!(pet = %id, mood = %mood, times_petted = pet.memory.times_petted, emote = ?emote, "Pet clicked");
        Ok(emote)
    }

    /// Open the chat window: the pet stops where it is and stands until the
    /// window closes.
    ///
    /// # Errors
    /// [`PawzError::PetNotFound`] for an unknown ID.
    pub fn pet_double_clicked(&mut self, id: PetId) -> Result<()> {
        let pet = self.registry.get_mut(id)?;
        pet.enter_state(BehaviorState::Stand, self.now)?;
        pet.runtime.chatting = true;

        if !self.sessions.contains_key(&id) {
            self.next_generation += 1;
            self.sessions.insert(id, ChatSession::new(self.next_generation));
            debug!(pet = %id, "Chat opened");
        }
        Ok(())
    }

    /// Send a message to the pet. Opens the chat if it is not open yet.
    ///
    /// Returns `false` without sending when the text is blank or the
    /// previous reply is still pending.
    ///
    /// # Errors
    /// [`PawzError::PetNotFound`] for an unknown ID, [`AppError::Runtime`]
    /// when called outside a tokio runtime. Neither error opens the chat.
    pub fn send_chat(&mut self, id: PetId, text: &str) -> Result<bool> {
        let text = text.trim();
        if !self.registry.contains(id) {
            return Err(PawzError::PetNotFound(id).into());
        }
        let runtime = Handle::try_current().map_err(|e| AppError::Runtime(e.to_string()))?;
        if !self.sessions.contains_key(&id) {
            self.pet_double_clicked(id)?;
        }
        let Some(pet) = self.registry.get(id) else {
            return Err(PawzError::PetNotFound(id).into());
        };
        let Some(session) = self.sessions.get_mut(&id) else {
            return Err(PawzError::PetNotFound(id).into());
        };
        if text.is_empty() || session.is_waiting() {
            return Ok(false);
        }

        let profile = PetProfile::from_record(pet, self.config.chat.history_in_prompt);
        let history = session.push_user(text);
        let generation = session.generation();
        let chat = Arc::clone(&self.chat);
        let tx = self.deliveries_tx.clone();
        let user = text.to_string();

        let handle = runtime.spawn(async move {
            let reply = chat.reply(&profile, &history).await;
            // The receiver only goes away with the app itself.
            let _ = tx.send(ChatDelivery {
                pet: id,
                generation,
                user,
                reply,
            });
        });
        session.set_pending(handle);

        debug!(pet = %id, generation, "Chat message sent");
        Ok(true)
    }

    /// Close the chat window and let the pet roam again from STAND.
    ///
    /// A reply still in flight is kept: its summary lands in the pet's
    /// memory when it arrives.
    ///
    /// # Errors
    /// [`PawzError::PetNotFound`] for an unknown ID.
    pub fn close_chat(&mut self, id: PetId) -> Result<()> {
        let pet = self.registry.get_mut(id)?;
        pet.runtime.chatting = false;
        self.sessions.remove(&id);
        if !pet.runtime.dragging {
            self.behavior.begin(pet, self.now, &mut self.rng)?;
        }
        debug!(pet = %id, "Chat closed");
        Ok(())
    }

    /// Pick the pet up.
    ///
    /// # Errors
    /// [`PawzError::PetNotFound`] for an unknown ID.
    pub fn drag_start(&mut self, id: PetId) -> Result<()> {
        let pet = self.registry.get_mut(id)?;
        self.behavior.start_drag(pet);
        Ok(())
    }

    /// Follow the pointer.
    ///
    /// # Errors
    /// [`PawzError::PetNotFound`] for an unknown ID.
    pub fn drag_move(&mut self, id: PetId, x: f32, y: f32) -> Result<()> {
        let pet = self.registry.get_mut(id)?;
        self.behavior.drag_to(pet, Position::new(x, y));
        Ok(())
    }

    /// Drop the pet. It resumes from STAND unless its chat window is open.
    ///
    /// # Errors
    /// [`PawzError::PetNotFound`] for an unknown ID.
    pub fn drag_end(&mut self, id: PetId, x: f32, y: f32) -> Result<()> {
        let pet = self.registry.get_mut(id)?;
        self.behavior.end_drag(pet, Position::new(x, y), self.now, &mut self.rng)?;
        Ok(())
    }

    /// Multiply the render scale by `factor`, within the configured zoom
    /// limits. Returns the new scale. Pet state is untouched.
    pub fn zoom(&mut self, factor: f32) -> f32 {
        if factor.is_finite() && factor > 0.0 {
            let general = &self.config.general;
            self.scale = (self.scale * factor).clamp(general.min_zoom, general.max_zoom);
            debug!(scale = self.scale, "Zoom changed");
        }
        self.scale
    }

    // ------------------------------------------------------------------
    // Ticks
    // ------------------------------------------------------------------

    /// Advance the world by `dt` seconds and return what to draw, in pet ID
    /// order. `dt` is capped at [`MAX_FRAME_SECS`].
    ///
    /// # Errors
    /// [`AppError::Core`] with [`PawzError::InvalidState`] if a record has
    /// been corrupted. That is fatal; callers must not save afterwards.
    pub fn on_frame_tick(&mut self, dt: f32) -> Result<Vec<RenderFrame>> {
        let dt = if dt.is_finite() { dt.clamp(0.0, MAX_FRAME_SECS) } else { 0.0 };
        #[allow(clippy::cast_possible_truncation)]
        let micros = (f64::from(dt) * 1_000_000.0).round() as i64;
        self.now += Duration::microseconds(micros);

        self.apply_deliveries();

        let mut frames = Vec::with_capacity(self.registry.len());
        for pet in self.registry.iter_mut() {
            if let Some(change) = self.behavior.tick(pet, self.now, dt, &mut self.rng)? {
                debug!(pet = %pet.id, from = %change.from, to = %change.to, "Behavior changed");
            }
            let frame = self.animation.advance(pet, dt)?;
            frames.push(RenderFrame {
                id: pet.id,
                species: pet.species,
                position: pet.position,
                state: pet.state,
                direction: pet.direction,
                base_frame: frame.base,
                emote_frame: frame.emote,
                mood: pet.mood,
                scale: self.scale,
            });
        }
        Ok(frames)
    }

    /// Autosave.
    pub fn on_minute_tick(&mut self) -> Option<SaveReport> {
        self.save()
    }

    /// Apply hourly decay, or the daily re-roll if one is due.
    pub fn on_hour_tick(&mut self) {
        for pet in self.registry.iter_mut() {
            if let change @ (MoodChange::Decayed { .. } | MoodChange::Reset { .. }) =
                self.mood.apply(pet, self.now, &mut self.rng)
            {
                debug!(pet = %pet.id, change = ?change, "Hourly mood update");
            }
        }
    }

    /// A new calendar day: re-roll every pet's mood.
    pub fn on_day_rollover(&mut self) {
        for pet in self.registry.iter_mut() {
            self.mood.reset(pet, self.now, &mut self.rng);
        }
        info!(pets = self.registry.len(), day = %self.now.date_naive(), "Daily mood reset");
    }

    /// Apply finished chat requests: record the exchange in the pet's memory
    /// and queue the reply for the UI. Replies for released pets are dropped.
    fn apply_deliveries(&mut self) {
        while let Ok(delivery) = self.deliveries_rx.try_recv() {
            let ChatDelivery {
                pet: id,
                generation,
                user,
                reply,
            } = delivery;

            let Ok(pet) = self.registry.get_mut(id) else {
                debug!(pet = %id, "Discarding reply for released pet");
                continue;
            };
            pet.memory
                .append_summary(summarize_exchange(&pet.name, &user, &reply.text));

            match self.sessions.get_mut(&id) {
                Some(session) if session.generation() == generation => session.complete(&reply.text),
                _ => debug!(pet = %id, generation, "Reply arrived after its chat closed"),
            }

            debug!(
                pet = %id,
                source = ?reply.source,
                latency_ms = reply.latency_ms,
                conversations = pet.memory.conversation_count(),
                "Chat reply applied"
            );
            self.delivered.push(DeliveredReply { pet: id, reply });
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Replies applied since the last call, oldest first.
    pub fn take_replies(&mut self) -> Vec<DeliveredReply> {
        std::mem::take(&mut self.delivered)
    }

    /// Look a pet up.
    #[must_use]
    pub fn pet(&self, id: PetId) -> Option<&PetRecord> {
        self.registry.get(id)
    }

    /// Every pet, in ID order.
    pub fn pets(&self) -> impl Iterator<Item = &PetRecord> {
        self.registry.iter()
    }

    /// Number of pets.
    #[must_use]
    pub fn pet_count(&self) -> usize {
        self.registry.len()
    }

    /// Current render scale.
    #[must_use]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &PawzConfig {
        &self.config
    }

    /// Chat counters.
    #[must_use]
    pub fn chat_stats(&self) -> ChatStats {
        self.chat.stats()
    }

    /// Lines of the open chat with `id`, if its window is open.
    #[must_use]
    pub fn chat_history(&self, id: PetId) -> Option<&[ChatTurn]> {
        self.sessions.get(&id).map(ChatSession::history)
    }

    /// Whether a reply for `id` is still on its way.
    #[must_use]
    pub fn is_chat_pending(&self, id: PetId) -> bool {
        self.sessions.get(&id).is_some_and(ChatSession::is_waiting)
    }
}
