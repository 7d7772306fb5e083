use std::time::Duration;
use tracing::trace;

use ratatui::crossterm::event::{self, Event, KeyCode};

use crate::domain::{GridConfig, GridError, Message};
use crate::model::Model;
use crate::view::SortKey;

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &GridConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, GridError> {
        if event::poll(Duration::from_millis(self.event_poll_time))? {
            match event::read()? {
                Event::Key(key) if key.kind == event::KeyEventKind::Press => {
                    // The filter prompt wants every key as is
                    if model.raw_keyevents() {
                        return Ok(Some(Message::RawKey(key)));
                    }
                    return Ok(self.handle_key(key));
                }
                _ => {}
            }
        }
        Ok(None)
    }

    pub fn handle_key(&self, key: event::KeyEvent) -> Option<Message> {
        let message = match key.code {
            KeyCode::Char('q') => Some(Message::Quit),
            KeyCode::Esc => Some(Message::Exit),
            KeyCode::Up | KeyCode::Char('k') => Some(Message::MoveUp),
            KeyCode::Down | KeyCode::Char('j') => Some(Message::MoveDown),
            KeyCode::Left | KeyCode::Char('h') => Some(Message::PrevPage),
            KeyCode::Right | KeyCode::Char('l') => Some(Message::NextPage),
            KeyCode::Char(c @ '1'..='5') => {
                let idx = c as usize - '1' as usize;
                Some(Message::SortBy(SortKey::ALL[idx]))
            }
            KeyCode::Char('p') => Some(Message::CyclePageSize),
            KeyCode::Char(' ') => Some(Message::ToggleRow),
            KeyCode::Char('a') => Some(Message::ToggleAllOnPage),
            KeyCode::Char('/') => Some(Message::Filter),
            KeyCode::Char('s') => Some(Message::Send),
            KeyCode::Char('?') => Some(Message::Help),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}
