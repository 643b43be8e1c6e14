use crossterm::event::{Event, KeyEvent};
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

use crate::contact::{Contact, ContactDraft};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    First,
    Last,
    Twitter,
    Avatar,
    Notes,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::First,
        Field::Last,
        Field::Twitter,
        Field::Avatar,
        Field::Notes,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Field::First => "First",
            Field::Last => "Last",
            Field::Twitter => "Twitter",
            Field::Avatar => "Avatar URL",
            Field::Notes => "Notes",
        }
    }
}

/// Edit form for one contact. Every field is a text input; only the
/// active one receives keystrokes.
#[derive(Debug, Clone)]
pub struct ContactEditor {
    id: String,
    inputs: [Input; 5],
    active: usize,
}

impl ContactEditor {
    pub fn new(contact: &Contact) -> Self {
        let draft = contact.draft();
        Self {
            id: contact.id.clone(),
            inputs: [
                Input::new(draft.first),
                Input::new(draft.last),
                Input::new(draft.twitter),
                Input::new(draft.avatar),
                Input::new(draft.notes),
            ],
            active: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn active(&self) -> Field {
        Field::ALL[self.active]
    }

    pub fn value(&self, field: Field) -> &str {
        self.input(field).value()
    }

    pub fn visual_cursor(&self) -> usize {
        self.inputs[self.active].visual_cursor()
    }

    pub fn next(&mut self) {
        self.active = (self.active + 1) % self.inputs.len();
    }

    pub fn prev(&mut self) {
        self.active = (self.active + self.inputs.len() - 1) % self.inputs.len();
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> bool {
        self.inputs[self.active]
            .handle_event(&Event::Key(key))
            .is_some()
    }

    pub fn to_draft(&self) -> ContactDraft {
        ContactDraft {
            first: self.value(Field::First).to_string(),
            last: self.value(Field::Last).to_string(),
            twitter: self.value(Field::Twitter).to_string(),
            avatar: self.value(Field::Avatar).to_string(),
            notes: self.value(Field::Notes).to_string(),
        }
    }

    fn input(&self, field: Field) -> &Input {
        let index = Field::ALL
            .iter()
            .position(|f| *f == field)
            .unwrap_or_default();
        &self.inputs[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn edits_active_field_and_builds_draft() {
        let mut contact = Contact::blank("c1", 0);
        contact.first = Some("Ann".into());
        let mut editor = ContactEditor::new(&contact);

        assert_eq!(editor.active(), Field::First);
        assert!(editor.handle_key_event(key(KeyCode::Char('a'))));
        editor.next();
        assert_eq!(editor.active(), Field::Last);
        editor.handle_key_event(key(KeyCode::Char('B')));

        let draft = editor.to_draft();
        assert_eq!(draft.first, "Anna");
        assert_eq!(draft.last, "B");
        assert_eq!(draft.notes, "");
        assert_eq!(editor.id(), "c1");
    }

    #[test]
    fn focus_wraps() {
        let mut editor = ContactEditor::new(&Contact::blank("c1", 0));
        editor.prev();
        assert_eq!(editor.active(), Field::Notes);
        editor.next();
        assert_eq!(editor.active(), Field::First);
    }
}
