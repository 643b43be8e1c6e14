use std::io::stdout;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{debug, info};
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;
use tui_widgets::popup::PopupState;

use crate::config::{Config, UiColors};
use crate::db::Database;
use crate::listing::ListMarkup;
use crate::loader::Loader;
use crate::location::{Location, Route};
use crate::navigation::{LinkState, NavigationTicket};
use crate::session::{ContactAction, Resolution, Session};

use super::draw;
use super::edit::ContactEditor;

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Search,
    List,
    Detail,
    Editor,
}

#[derive(Debug, Clone)]
pub struct ConfirmModal {
    pub title: String,
    pub message: String,
    pub action: ConfirmAction,
}

/// Action to perform when confirm modal is accepted
#[derive(Debug, Clone)]
pub enum ConfirmAction {
    DeleteContact { id: String },
}

pub struct App<'a> {
    db: &'a Database,
    config: &'a Config,
    loader: Loader,
    pub session: Session,
    pub focus: Focus,
    pub selected: usize,
    pub search_input: Input,
    pub editor: Option<ContactEditor>,
    pub status: Option<String>,
    // Popup state for modal dialog (tui-widgets popup)
    pub modal_popup: PopupState,
    pub confirm_modal: Option<ConfirmModal>,
    tick: usize,
}

impl<'a> App<'a> {
    pub fn new(db: &'a Database, config: &'a Config, session: Session) -> Self {
        let loader = Loader::new(db.path().to_path_buf(), config.loader.latency);
        let search_input = Input::new(session.query().display_value().to_string());
        let mut app = Self {
            db,
            config,
            loader,
            session,
            focus: Focus::List,
            selected: 0,
            search_input,
            editor: None,
            status: None,
            modal_popup: PopupState::default(),
            confirm_modal: None,
            tick: 0,
        };
        app.sync_view();
        app
    }

    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        stdout.execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        terminal.backend_mut().execute(LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        info!(
            discarded = self.session.discarded_count(),
            "session finished"
        );
        result
    }

    fn event_loop<B>(&mut self, terminal: &mut Terminal<B>) -> Result<()>
    where
        B: ratatui::backend::Backend,
    {
        loop {
            self.apply_load_results();
            draw::render(terminal, self)?;

            // poll faster while something is loading so the spinner moves
            let timeout = if self.session.pending().is_some() {
                Duration::from_millis(80)
            } else {
                Duration::from_millis(250)
            };
            if event::poll(timeout)? {
                if let Event::Key(key) = event::read()? {
                    if self.handle_key(key)? {
                        break;
                    }
                }
            }
            self.tick = self.tick.wrapping_add(1);
        }
        Ok(())
    }

    fn apply_load_results(&mut self) {
        let mut changed = false;
        let mut failed = false;
        for result in self.loader.drain() {
            match self.session.resolve(result.seq, result.outcome) {
                Resolution::Committed => {
                    changed = true;
                    failed = false;
                }
                Resolution::Failed => failed = true,
                Resolution::Discarded => {}
            }
        }
        if changed {
            self.status = None;
        }
        if failed {
            self.status = self.session.error().map(|err| err.to_string());
        }
        if changed || failed {
            self.sync_view();
        }
    }

    /// Bring widgets in line with the committed location.
    fn sync_view(&mut self) {
        let value = self.session.query().display_value();
        if self.search_input.value() != value {
            debug!(value, "search input reset");
            self.search_input = Input::new(value.to_string());
        }

        match self.session.route() {
            Route::EditContact(id) => {
                let stale = self.editor.as_ref().map_or(true, |e| e.id() != id);
                if stale {
                    self.editor = self.session.detail().map(ContactEditor::new);
                }
                if self.editor.is_some() {
                    self.focus = Focus::Editor;
                }
            }
            _ => {
                self.editor = None;
                if self.focus == Focus::Editor {
                    self.focus = Focus::Detail;
                }
            }
        }

        let list = self.session.list();
        if let Some(index) = list
            .entries()
            .iter()
            .position(|entry| entry.link == LinkState::Active)
        {
            self.selected = index;
        }
        self.clamp_selection(&list);
    }

    fn clamp_selection(&mut self, list: &ListMarkup) {
        let len = list.entries().len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }

    fn dispatch(&mut self, ticket: NavigationTicket) {
        debug!(seq = ticket.seq, location = %ticket.location, "navigation issued");
        self.loader.dispatch(ticket);
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        // Ctrl+C always quits (hardcoded for safety)
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            return Ok(true);
        }

        if self.confirm_modal.is_some() {
            self.handle_confirm_modal_key(key);
            return Ok(false);
        }

        match self.focus {
            Focus::Editor => {
                self.handle_editor_key(key);
                Ok(false)
            }
            Focus::Search => {
                self.handle_search_key(key);
                Ok(false)
            }
            Focus::List | Focus::Detail => Ok(self.handle_navigation_key(key)),
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        let config = self.config;
        let keys = &config.keys.search_input;

        if key_matches_any(&key, &keys.cancel) {
            self.focus = Focus::List;
            return;
        }
        if key_matches_any(&key, &keys.confirm) {
            self.open_selected();
            self.focus = Focus::List;
            return;
        }
        if key_matches_any(&key, &keys.next) {
            self.move_selection(1);
            return;
        }
        if key_matches_any(&key, &keys.prev) {
            self.move_selection(-1);
            return;
        }

        if let Some(change) = self.search_input.handle_event(&Event::Key(key)) {
            if change.value {
                let value = self.search_input.value().to_string();
                let ticket = self.session.on_filter_changed(&value);
                self.dispatch(ticket);
            }
        }
    }

    /// Keys for the list and detail panes. Returns true to quit.
    fn handle_navigation_key(&mut self, key: KeyEvent) -> bool {
        let config = self.config;
        let global = &config.keys.global;

        // any key acknowledges a shown error
        if self.session.error().is_some() {
            self.session.dismiss_error();
            self.status = None;
        }

        if key_matches_any(&key, &global.quit) {
            return true;
        }
        if key_matches_any(&key, &global.search) {
            self.focus = Focus::Search;
            return false;
        }
        if key_matches_any(&key, &global.new) {
            self.create_contact();
            return false;
        }
        if key_matches_any(&key, &global.back) {
            if let Some(ticket) = self.session.back() {
                self.dispatch(ticket);
            }
            return false;
        }
        if key_matches_any(&key, &global.forward) {
            if let Some(ticket) = self.session.forward() {
                self.dispatch(ticket);
            }
            return false;
        }
        if key_matches_any(&key, &global.reload) {
            let ticket = self.session.revalidate();
            self.dispatch(ticket);
            return false;
        }

        if self.focus == Focus::List {
            let keys = &config.keys.list;
            if key_matches_any(&key, &keys.open) {
                self.open_selected();
            } else if key_matches_any(&key, &keys.next) {
                self.move_selection(1);
            } else if key_matches_any(&key, &keys.prev) {
                self.move_selection(-1);
            } else if key_matches_any(&key, &keys.focus_detail) {
                self.focus = Focus::Detail;
            }
            return false;
        }

        let keys = &config.keys.detail;
        if key_matches_any(&key, &keys.focus_list) {
            self.focus = Focus::List;
            return false;
        }
        let Some(id) = self.session.detail().map(|contact| contact.id.clone()) else {
            return false;
        };
        if key_matches_any(&key, &keys.edit) {
            let ticket = self.session.navigate(Location::edit_contact(&id));
            self.dispatch(ticket);
        } else if key_matches_any(&key, &keys.favorite) {
            self.perform(ContactAction::ToggleFavorite { id });
        } else if key_matches_any(&key, &keys.delete) {
            let name = self
                .session
                .detail()
                .and_then(|contact| contact.full_name())
                .unwrap_or_else(|| self.config.ui.labels.no_name.clone());
            self.modal_popup = PopupState::default();
            self.confirm_modal = Some(ConfirmModal {
                title: "DELETE CONTACT".to_string(),
                message: format!("Delete {}?", name),
                action: ConfirmAction::DeleteContact { id },
            });
        }
        false
    }

    fn handle_editor_key(&mut self, key: KeyEvent) {
        let config = self.config;
        let keys = &config.keys.editor;
        let Some(editor) = self.editor.as_mut() else {
            self.focus = Focus::Detail;
            return;
        };

        if key_matches_any(&key, &keys.save) {
            let action = ContactAction::Save {
                id: editor.id().to_string(),
                draft: editor.to_draft(),
            };
            self.perform(action);
        } else if key_matches_any(&key, &keys.cancel) {
            if let Some(ticket) = self.session.cancel_edit() {
                self.dispatch(ticket);
            }
        } else if key_matches_any(&key, &keys.next) {
            editor.next();
        } else if key_matches_any(&key, &keys.prev) {
            editor.prev();
        } else {
            editor.handle_key_event(key);
        }
    }

    fn handle_confirm_modal_key(&mut self, key: KeyEvent) {
        let Some(modal) = self.confirm_modal.take() else {
            return;
        };

        match key.code {
            KeyCode::Esc => {}
            KeyCode::Char(c) if c.eq_ignore_ascii_case(&'n') => {}
            KeyCode::Enter => self.confirm(modal.action),
            KeyCode::Char(c) if c.eq_ignore_ascii_case(&'y') => self.confirm(modal.action),
            // Put the modal back if key wasn't handled
            _ => self.confirm_modal = Some(modal),
        }
    }

    fn confirm(&mut self, action: ConfirmAction) {
        match action {
            ConfirmAction::DeleteContact { id } => {
                self.perform(ContactAction::Delete { id });
                self.focus = Focus::List;
            }
        }
    }

    fn create_contact(&mut self) {
        match self.session.create_contact(self.db) {
            Ok(ticket) => self.dispatch(ticket),
            Err(err) => self.set_status(err.to_string()),
        }
    }

    fn perform(&mut self, action: ContactAction) {
        match self.session.perform(self.db, action) {
            Ok(ticket) => self.dispatch(ticket),
            Err(err) => self.set_status(err.to_string()),
        }
    }

    fn open_selected(&mut self) {
        let list = self.session.list();
        let Some(entry) = list.entries().get(self.selected) else {
            return;
        };
        match self.session.follow_link(&entry.href) {
            Ok(ticket) => self.dispatch(ticket),
            Err(err) => self.set_status(format!("bad link {}: {}", entry.href, err)),
        }
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.session.list().entries().len();
        if len == 0 {
            return;
        }
        let index = (self.selected as isize + delta).clamp(0, len as isize - 1);
        self.selected = index as usize;
    }

    fn set_status<S: Into<String>>(&mut self, message: S) {
        self.status = Some(message.into());
    }

    pub fn config(&self) -> &Config {
        self.config
    }

    pub fn ui_colors(&self) -> &UiColors {
        &self.config.ui.colors
    }

    pub fn spinner(&self) -> &'static str {
        SPINNER[self.tick % SPINNER.len()]
    }
}

fn key_matches_any(event: &KeyEvent, bindings: &[String]) -> bool {
    bindings.iter().any(|b| key_matches_single(event, b))
}

/// Check if the key event matches a single binding string
fn key_matches_single(event: &KeyEvent, binding: &str) -> bool {
    let trimmed = binding.trim();
    if trimmed.is_empty() {
        return false;
    }

    // Disallow Ctrl/Alt/Super modifiers (we don't support them)
    let disallowed = KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER;
    if event.modifiers.intersects(disallowed) {
        return false;
    }

    match trimmed.to_ascii_lowercase().as_str() {
        "enter" => matches!(event.code, KeyCode::Enter),
        "tab" => matches!(event.code, KeyCode::Tab),
        "backtab" | "shift+tab" => matches!(event.code, KeyCode::BackTab),
        "backspace" => matches!(event.code, KeyCode::Backspace),
        "esc" | "escape" => matches!(event.code, KeyCode::Esc),
        "space" => matches!(event.code, KeyCode::Char(' ')),
        "up" => matches!(event.code, KeyCode::Up),
        "down" => matches!(event.code, KeyCode::Down),
        "left" => matches!(event.code, KeyCode::Left),
        "right" => matches!(event.code, KeyCode::Right),
        "pageup" | "page_up" => matches!(event.code, KeyCode::PageUp),
        "pagedown" | "page_down" => matches!(event.code, KeyCode::PageDown),
        "home" => matches!(event.code, KeyCode::Home),
        "end" => matches!(event.code, KeyCode::End),
        name if name.len() > 1 && name.starts_with('f') => name[1..]
            .parse::<u8>()
            .map(|n| (1..=12).contains(&n) && event.code == KeyCode::F(n))
            .unwrap_or(false),
        // Single character - case-sensitive (n != N, since N requires Shift)
        _ => {
            let mut chars = trimmed.chars();
            if let (Some(first), None) = (chars.next(), chars.next()) {
                matches!(event.code, KeyCode::Char(c) if c == first)
            } else {
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_key_matching() {
        assert!(key_matches_single(&key(KeyCode::Enter), "Enter"));
        assert!(key_matches_single(&key(KeyCode::Esc), "escape"));
        assert!(key_matches_single(&key(KeyCode::F(5)), "F5"));
        assert!(!key_matches_single(&key(KeyCode::F(5)), "F13"));
        assert!(key_matches_single(&key(KeyCode::Char('[')), "["));
        assert!(!key_matches_single(&key(KeyCode::Char('N')), "n"));
        assert!(!key_matches_single(&key(KeyCode::Char('q')), "quit"));

        let ctrl = KeyEvent::new(KeyCode::Char('n'), KeyModifiers::CONTROL);
        assert!(!key_matches_single(&ctrl, "n"));
        assert!(key_matches_any(
            &key(KeyCode::Down),
            &["j".to_string(), "Down".to_string()]
        ));
    }
}
