//! Source-control credentials and the providers that supply them
//!
//! The pipeline only depends on [`CredentialProvider`]; the interactive
//! masked prompt lives in `ui::prompt` and plugs in from the CLI side.

use crate::core::error::NotesResult;
use crate::utils::is_local_path;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;

/// Username and password / personal access token for git remotes
#[derive(Clone)]
pub struct Credentials {
  pub username: String,
  secret: SecretString,
}

impl Credentials {
  pub fn new(username: impl Into<String>, secret: SecretString) -> Self {
    Self {
      username: username.into(),
      secret,
    }
  }

  /// Credentials for remotes that need none (local paths)
  pub fn anonymous(username: impl Into<String>) -> Self {
    Self::new(username, SecretString::from(String::new()))
  }

  pub fn has_secret(&self) -> bool {
    !self.secret.expose_secret().is_empty()
  }

  /// `Authorization` header value for HTTP basic auth
  pub fn basic_auth_header(&self) -> String {
    let raw = format!("{}:{}", self.username, self.secret.expose_secret());
    format!("Basic {}", STANDARD.encode(raw))
  }
}

impl fmt::Debug for Credentials {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Credentials")
      .field("username", &self.username)
      .field("secret", &"[REDACTED]")
      .finish()
  }
}

/// Supplies credentials once per run
pub trait CredentialProvider {
  fn credentials(&self, username: &str) -> NotesResult<Credentials>;
}

/// Credentials known up front (config file or environment)
pub struct StaticCredentials {
  secret: SecretString,
}

impl StaticCredentials {
  pub fn new(secret: SecretString) -> Self {
    Self { secret }
  }
}

impl CredentialProvider for StaticCredentials {
  fn credentials(&self, username: &str) -> NotesResult<Credentials> {
    Ok(Credentials::new(username, self.secret.clone()))
  }
}

/// Where this run's secret comes from
#[derive(Debug, Clone)]
pub enum CredentialSource {
  /// Secret set in the config file or environment
  Configured(SecretString),
  /// Every remote is a local path; no secret needed
  Anonymous,
  /// Ask on the terminal
  Prompt,
  /// A secret is needed but there is no terminal to ask on
  Unavailable,
}

/// Decide how to obtain credentials for the given remotes
pub fn credential_source<S: AsRef<str>>(secret: Option<&str>, remote_urls: &[S], interactive: bool) -> CredentialSource {
  if let Some(secret) = secret.filter(|s| !s.is_empty()) {
    return CredentialSource::Configured(SecretString::from(secret.to_string()));
  }
  if remote_urls.iter().all(|url| is_local_path(url.as_ref())) {
    return CredentialSource::Anonymous;
  }
  if interactive {
    CredentialSource::Prompt
  } else {
    CredentialSource::Unavailable
  }
}
