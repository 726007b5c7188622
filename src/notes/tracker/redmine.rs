use super::{Issue, IssueScope, IssueStatus, IssueTracker};
use crate::core::config::TrackerConfig;
use crate::core::error::{NotesError, NotesResult, TrackerError};
use crate::notes::reference::IssueId;
use reqwest::Url;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;

const API_KEY_HEADER: &str = "X-Redmine-API-Key";

/// Redmine REST client (`/issues.json`)
pub struct RedmineTracker {
  base_url: Url,
  api_key: String,
  http_client: Client,
}

#[derive(Debug, Deserialize)]
struct IssuesResponse {
  #[serde(default)]
  issues: Vec<RedmineIssue>,
}

#[derive(Debug, Deserialize)]
struct RedmineIssue {
  id: u64,
  tracker: NamedRef,
  #[serde(default)]
  status: Option<StatusRef>,
  #[serde(default)]
  subject: String,
}

#[derive(Debug, Deserialize)]
struct NamedRef {
  name: String,
}

#[derive(Debug, Deserialize)]
struct StatusRef {
  #[serde(default)]
  is_closed: Option<bool>,
}

impl RedmineTracker {
  /// Build a client with the configured timeouts
  pub fn new(config: &TrackerConfig) -> NotesResult<Self> {
    let base_url = Url::parse(config.server_url.trim_end_matches('/'))
      .map_err(|e| NotesError::message(format!("Invalid tracker.server_url '{}': {}", config.server_url, e)))?;
    if base_url.cannot_be_a_base() {
      return Err(NotesError::message(format!(
        "Invalid tracker.server_url '{}': expected an http(s) URL",
        config.server_url
      )));
    }

    let http_client = Client::builder()
      .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(|e| NotesError::message(format!("Failed to initialize tracker HTTP client: {}", e)))?;

    Ok(Self {
      base_url,
      api_key: config.api_key.clone(),
      http_client,
    })
  }

  /// `<server>/issues.json?issue_id=<id>[&status_id=closed]`
  fn issues_url(&self, id: &IssueId, scope: IssueScope) -> Url {
    let mut url = self.base_url.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
      segments.pop_if_empty().push("issues.json");
    }
    {
      let mut query = url.query_pairs_mut();
      query.append_pair("issue_id", id.as_str());
      if scope == IssueScope::Closed {
        query.append_pair("status_id", "closed");
      }
    }
    url
  }
}

impl IssueTracker for RedmineTracker {
  fn find_issue(&self, id: &IssueId, scope: IssueScope) -> Result<Option<Issue>, TrackerError> {
    let url = self.issues_url(id, scope);

    let response = self
      .http_client
      .get(url.clone())
      .header(API_KEY_HEADER, &self.api_key)
      .send()
      .map_err(|e| TrackerError::Transport {
        url: url.to_string(),
        message: e.to_string(),
      })?;

    let status = response.status();
    if !status.is_success() {
      return Err(TrackerError::Status {
        url: url.to_string(),
        code: status.as_u16(),
      });
    }

    let body = response.text().map_err(|e| TrackerError::Transport {
      url: url.to_string(),
      message: e.to_string(),
    })?;

    decode_first_issue(&body, scope).map_err(|e| TrackerError::Decode {
      url: url.to_string(),
      message: e.to_string(),
    })
  }
}

fn decode_first_issue(body: &str, scope: IssueScope) -> Result<Option<Issue>, serde_json::Error> {
  let response: IssuesResponse = serde_json::from_str(body)?;

  Ok(response.issues.into_iter().next().map(|issue| {
    let closed = issue
      .status
      .and_then(|s| s.is_closed)
      .unwrap_or(scope == IssueScope::Closed);
    Issue {
      id: IssueId::from(issue.id),
      tracker: issue.tracker.name,
      subject: issue.subject,
      status: if closed { IssueStatus::Closed } else { IssueStatus::Open },
    }
  }))
}
