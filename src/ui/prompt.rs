//! Masked secret prompt for the terminal
//!
//! Keys are read in raw mode so the secret never echoes; each typed
//! character is shown as `*`. Raw mode is restored on every exit path.

use crate::core::credentials::{CredentialProvider, Credentials};
use crate::core::error::{ConfigError, NotesError, NotesResult};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use secrecy::SecretString;
use std::io::{self, Write};

/// What a key press does to the secret being typed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyAction {
  Push(char),
  Pop,
  Submit,
  Cancel,
  Ignore,
}

fn key_action(key: &KeyEvent) -> KeyAction {
  if key.kind != KeyEventKind::Press {
    return KeyAction::Ignore;
  }

  match key.code {
    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => KeyAction::Cancel,
    KeyCode::Char(c) => KeyAction::Push(c),
    KeyCode::Backspace => KeyAction::Pop,
    KeyCode::Enter => KeyAction::Submit,
    KeyCode::Esc => KeyAction::Cancel,
    _ => KeyAction::Ignore,
  }
}

/// Asks for the source-control secret on the controlling terminal
pub struct MaskedPrompt {
  label: String,
}

impl MaskedPrompt {
  pub fn new(label: impl Into<String>) -> Self {
    Self { label: label.into() }
  }

  fn read_secret(&self) -> io::Result<Option<String>> {
    let mut stderr = io::stderr();
    write!(stderr, "{}: ", self.label)?;
    stderr.flush()?;

    terminal::enable_raw_mode()?;
    let _raw = scopeguard::guard((), |_| {
      let _ = terminal::disable_raw_mode();
    });

    let mut secret = String::new();
    let result = loop {
      let Event::Key(key) = event::read()? else {
        continue;
      };

      match key_action(&key) {
        KeyAction::Push(c) => {
          secret.push(c);
          write!(stderr, "*")?;
        }
        KeyAction::Pop => {
          if secret.pop().is_some() {
            write!(stderr, "\u{8} \u{8}")?;
          }
        }
        KeyAction::Submit => break Some(secret),
        KeyAction::Cancel => break None,
        KeyAction::Ignore => continue,
      }
      stderr.flush()?;
    };

    // Raw mode swallows the newline
    write!(stderr, "\r\n")?;
    stderr.flush()?;
    Ok(result)
  }
}

impl CredentialProvider for MaskedPrompt {
  fn credentials(&self, username: &str) -> NotesResult<Credentials> {
    match self.read_secret()? {
      Some(secret) => Ok(Credentials::new(username, SecretString::from(secret))),
      None => Err(NotesError::Config(ConfigError::CredentialsUnavailable {
        reason: "secret prompt cancelled".to_string(),
      })),
    }
  }
}
