//! Renderer-facing types: input events in, frames and chat replies out.
//!
//! The renderer owns windows and input. It translates clicks, drags and
//! menu actions into [`UiEvent`]s and draws whatever [`RenderFrame`]s the
//! frame tick returns. Both are serde types so a renderer in another process
//! can exchange them as JSON.

use serde::{Deserialize, Serialize};

use pawz_chat::{ChatBackend, ChatReply};
use pawz_core::sprites::Emote;
use pawz_core::types::{BehaviorState, Direction, Mood, PetId, Position, Species};

use crate::app::PetApp;
use crate::error::Result;

/// Discrete input from the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiEvent {
    /// Tray menu: adopt a new pet.
    AddPet {
        /// Requested name.
        name: String,
        /// Requested species.
        species: Species,
    },
    /// Tray menu: release a pet.
    RemovePet(PetId),
    /// Single click on a pet.
    Click(PetId),
    /// Double click on a pet: opens chat.
    DoubleClick(PetId),
    /// Enter pressed in a chat window.
    SendChat {
        /// Pet being chatted with.
        id: PetId,
        /// Typed text.
        text: String,
    },
    /// Chat window closed.
    CloseChat(PetId),
    /// Mouse pressed on a pet and moved.
    DragStart(PetId),
    /// Pointer moved during a drag.
    DragMove {
        /// Pet being dragged.
        id: PetId,
        /// Pointer x.
        x: f32,
        /// Pointer y.
        y: f32,
    },
    /// Mouse released after a drag.
    DragEnd {
        /// Pet being dragged.
        id: PetId,
        /// Drop x.
        x: f32,
        /// Drop y.
        y: f32,
    },
    /// Tray menu zoom; 2.0 zooms in, 0.5 zooms out.
    Zoom(f32),
}

/// What handling a [`UiEvent`] produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventOutcome {
    /// A pet was adopted.
    Added(PetId),
    /// A click started this emote.
    Emote(Emote),
    /// Whether a chat message was dispatched (`false` while a reply is pending).
    ChatSent(bool),
    /// New render scale.
    Zoomed(f32),
    /// Handled; nothing to report.
    Done,
}

/// Everything the renderer needs to draw one pet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderFrame {
    /// Pet ID.
    pub id: PetId,
    /// Selects the sprite sheet.
    pub species: Species,
    /// Top-left corner on screen.
    pub position: Position,
    /// Behavior state.
    pub state: BehaviorState,
    /// Facing.
    pub direction: Direction,
    /// Frame index in the species' base sheet.
    pub base_frame: usize,
    /// Frame index in the emote sheet while an emote plays.
    pub emote_frame: Option<usize>,
    /// Current mood.
    pub mood: Mood,
    /// Render scale (sheet pixels to screen pixels).
    pub scale: f32,
}

/// A chat reply ready for the pet's chat window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredReply {
    /// Pet that answered.
    pub pet: PetId,
    /// The reply, model or canned.
    pub reply: ChatReply,
}

impl<B: ChatBackend> PetApp<B> {
    /// Dispatch a UI event to the matching operation.
    ///
    /// # Errors
    /// Whatever the underlying operation returns, typically
    /// [`PawzError::PetNotFound`](pawz_core::PawzError::PetNotFound).
    pub fn handle(&mut self, event: UiEvent) -> Result<EventOutcome> {
        let outcome = match event {
            UiEvent::AddPet { name, species } => EventOutcome::Added(self.add_pet(&name, species)?),
            UiEvent::RemovePet(id) => {
                self.remove_pet(id)?;
                EventOutcome::Done
            }
            UiEvent::Click(id) => EventOutcome::Emote(self.pet_clicked(id)?),
            UiEvent::DoubleClick(id) => {
                self.pet_double_clicked(id)?;
                EventOutcome::Done
            }
            UiEvent::SendChat { id, text } => EventOutcome::ChatSent(self.send_chat(id, &text)?),
            UiEvent::CloseChat(id) => {
                self.close_chat(id)?;
                EventOutcome::Done
            }
            UiEvent::DragStart(id) => {
                self.drag_start(id)?;
                EventOutcome::Done
            }
            UiEvent::DragMove { id, x, y } => {
                self.drag_move(id, x, y)?;
                EventOutcome::Done
            }
            UiEvent::DragEnd { id, x, y } => {
                self.drag_end(id, x, y)?;
                EventOutcome::Done
            }
            UiEvent::Zoom(factor) => EventOutcome::Zoomed(self.zoom(factor)),
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ui_events_read_from_json() {
        let event: UiEvent =
            serde_json::from_str(r#"{"add_pet":{"name":"Clucky","species":"chicken"}}"#).expect("valid event");
        assert_eq!(
            event,
            UiEvent::AddPet {
                name: "Clucky".into(),
                species: Species::Chicken
            }
        );
        let zoom: UiEvent = serde_json::from_str(r#"{"zoom":2.0}"#).expect("valid event");
        assert_eq!(zoom, UiEvent::Zoom(2.0));
    }

    #[test]
    fn render_frame_json_uses_field_names() {
        let frame = RenderFrame {
            id: PetId::new(),
            species: Species::Duck,
            position: Position::new(12.0, 34.0),
            state: BehaviorState::Walk,
            direction: Direction::Left,
            base_frame: 13,
            emote_frame: None,
            mood: Mood::new(70),
            scale: 4.0,
        };
        let json = serde_json::to_value(&frame).expect("serializable");
        assert_eq!(json["species"], "duck");
        assert_eq!(json["state"], "WALK");
        assert_eq!(json["base_frame"], 13);
        assert!(json["emote_frame"].is_null());
    }
}
