//! Line commands typed at the screening prompt.

use client_core::{InputEvent, ReviewCommand};
use shared::domain::Label;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptCommand {
    Input(InputEvent),
    Retry,
    Reset,
    Stats,
    History,
    Help,
    Quit,
}

/// Whole words are UI actions; a single character is a key press.
pub fn parse_line(line: &str) -> Option<PromptCommand> {
    let line = line.trim();
    let mut chars = line.chars();
    if let (Some(key), None) = (chars.next(), chars.next()) {
        return Some(PromptCommand::Input(InputEvent::key(key)));
    }

    let command = match line.to_ascii_lowercase().as_str() {
        "relevant" | "include" => {
            PromptCommand::Input(InputEvent::Action(ReviewCommand::Decide(Label::Relevant)))
        }
        "irrelevant" | "exclude" => {
            PromptCommand::Input(InputEvent::Action(ReviewCommand::Decide(Label::Irrelevant)))
        }
        "undo" => PromptCommand::Input(InputEvent::Action(ReviewCommand::Undo)),
        "retry" => PromptCommand::Retry,
        "reset" => PromptCommand::Reset,
        "stats" => PromptCommand::Stats,
        "history" => PromptCommand::History,
        "help" => PromptCommand::Help,
        "quit" | "exit" => PromptCommand::Quit,
        _ => return None,
    };
    Some(command)
}
