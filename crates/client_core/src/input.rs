//! Input adapter: turns UI actions and key presses into review commands.

use shared::domain::Label;
use tracing::debug;

use crate::{error::SettingsError, review::ReviewSession};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewCommand {
    Decide(Label),
    Undo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBindings {
    pub relevant: char,
    pub irrelevant: char,
    pub undo: char,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            relevant: 'r',
            irrelevant: 'i',
            undo: 'u',
        }
    }
}

impl KeyBindings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        let [relevant, irrelevant, undo] =
            [self.relevant, self.irrelevant, self.undo].map(|key| key.to_ascii_lowercase());
        if relevant == irrelevant || relevant == undo || irrelevant == undo {
            return Err(SettingsError::ConflictingKeyBindings {
                relevant: self.relevant,
                irrelevant: self.irrelevant,
                undo: self.undo,
            });
        }
        Ok(())
    }

    fn command_for(&self, key: char) -> Option<ReviewCommand> {
        let matches = |bound: char| bound.eq_ignore_ascii_case(&key);
        if matches(self.relevant) {
            Some(ReviewCommand::Decide(Label::Relevant))
        } else if matches(self.irrelevant) {
            Some(ReviewCommand::Decide(Label::Irrelevant))
        } else if matches(self.undo) {
            Some(ReviewCommand::Undo)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    fn any(&self) -> bool {
        self.ctrl || self.alt || self.meta
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// A decision or undo button was pressed.
    Action(ReviewCommand),
    KeyDown { key: char, modifiers: Modifiers },
}

impl InputEvent {
    pub fn key(key: char) -> Self {
        Self::KeyDown {
            key,
            modifiers: Modifiers::default(),
        }
    }
}

/// What the session will currently accept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputGate {
    pub can_decide: bool,
    pub undo_available: bool,
}

impl InputGate {
    pub async fn of(session: &ReviewSession) -> Self {
        Self {
            can_decide: session.can_decide().await,
            undo_available: session.undo_available().await,
        }
    }

    fn admits(&self, command: ReviewCommand) -> bool {
        match command {
            ReviewCommand::Decide(_) => self.can_decide,
            ReviewCommand::Undo => self.undo_available,
        }
    }
}

#[derive(Debug)]
struct KeyListener {
    bindings: KeyBindings,
}

pub struct InputAdapter {
    bindings: KeyBindings,
    keyboard_shortcuts: bool,
    listener: Option<KeyListener>,
}

impl InputAdapter {
    pub fn new(bindings: KeyBindings, keyboard_shortcuts: bool) -> Self {
        Self {
            bindings,
            keyboard_shortcuts,
            listener: None,
        }
    }

    /// Registers the keyboard listener. With shortcuts disabled nothing is registered.
    pub fn mount(&mut self) -> bool {
        if !self.keyboard_shortcuts {
            debug!("keyboard shortcuts disabled; no key listener registered");
            return false;
        }
        if self.listener.is_none() {
            debug!(bindings = ?self.bindings, "key listener registered");
            self.listener = Some(KeyListener {
                bindings: self.bindings,
            });
        }
        true
    }

    pub fn unmount(&mut self) {
        if self.listener.take().is_some() {
            debug!("key listener removed");
        }
    }

    pub fn is_listening(&self) -> bool {
        self.listener.is_some()
    }

    pub fn bindings(&self) -> KeyBindings {
        self.bindings
    }

    pub fn resolve(&self, event: InputEvent, gate: InputGate) -> Option<ReviewCommand> {
        let command = match event {
            InputEvent::Action(command) => command,
            InputEvent::KeyDown { key, modifiers } => {
                let listener = self.listener.as_ref()?;
                if modifiers.any() {
                    return None;
                }
                listener.bindings.command_for(key)?
            }
        };

        if !gate.admits(command) {
            debug!(?command, ?gate, "input dropped");
            return None;
        }
        Some(command)
    }

    /// Resolves `event` against the session's current gate and executes it.
    pub async fn dispatch(
        &self,
        event: InputEvent,
        session: &ReviewSession,
    ) -> Option<ReviewCommand> {
        let command = self.resolve(event, InputGate::of(session).await)?;
        match command {
            ReviewCommand::Decide(label) => session.decide(label).await,
            ReviewCommand::Undo => {
                session.undo().await;
            }
        }
        Some(command)
    }
}

#[cfg(test)]
#[path = "tests/input_tests.rs"]
mod tests;
