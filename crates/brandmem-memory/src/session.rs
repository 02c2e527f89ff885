//! Conversation sessions
//!
//! One session is active at a time. Messages are buffered while it runs and
//! can be summarised by the LLM; stored summaries feed the recent-session
//! context block.

use crate::llm::LLMProvider;
use brandmem_core::{Namespace, Result, SessionSummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Messages sent to the LLM when summarising
pub const SUMMARY_WINDOW: usize = 20;

/// Sessions rendered by [`SessionManager::get_session_context`]
pub const RECENT_SESSIONS: usize = 3;

/// A buffered conversation message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMessage {
    pub role: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Tracks the active session and all summaries produced so far
#[derive(Debug, Default)]
pub struct SessionManager {
    /// In start order
    sessions: Vec<SessionSummary>,
    active: Option<String>,
    active_brand: Option<Namespace>,
    buffer: Vec<SessionMessage>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new session and make it active, discarding buffered messages
    pub fn start_session(&mut self, brand: Option<Namespace>) -> String {
        let session = SessionSummary::new(brand.clone());
        let id = session.session_id.clone();
        self.sessions.push(session);
        self.active = Some(id.clone());
        self.active_brand = brand;
        self.buffer.clear();
        info!("Started session {}", id);
        id
    }

    pub fn active_brand(&self) -> Option<&Namespace> {
        self.active_brand.as_ref()
    }

    pub fn set_active_brand(&mut self, brand: Option<Namespace>) {
        self.active_brand = brand;
    }

    /// Buffer a message in the active session
    pub fn add_message(&mut self, role: impl Into<String>, content: impl Into<String>) {
        if self.active.is_none() {
            warn!("Dropping message: no active session");
            return;
        }
        self.buffer.push(SessionMessage {
            role: role.into(),
            content: content.into(),
            timestamp: Utc::now(),
        });
    }

    pub fn message_count(&self) -> usize {
        self.buffer.len()
    }

    pub fn current_session(&self) -> Option<&SessionSummary> {
        let id = self.active.as_deref()?;
        self.sessions.iter().find(|s| s.session_id == id)
    }

    /// Summarise the active session with the LLM and store the result.
    ///
    /// Returns `None` when there is no active session or nothing was said.
    pub async fn summarize_session(&mut self, llm: &dyn LLMProvider) -> Result<Option<SessionSummary>> {
        let Some(id) = self.active.clone() else {
            return Ok(None);
        };
        if self.buffer.is_empty() {
            return Ok(None);
        }

        let start = self.buffer.len().saturating_sub(SUMMARY_WINDOW);
        let transcript: Vec<String> = self.buffer[start..]
            .iter()
            .map(|m| format!("[{}]: {}", m.role, m.content))
            .collect();

        let prompt = format!(
            "Summarize the following Korean liquor brand conversation. \
             Extract: 1) A brief summary (2-3 sentences), 2) Key decisions made, \
             3) Topics discussed.\n\n\
             Format your response as:\n\
             SUMMARY: <summary>\n\
             DECISIONS: <comma-separated decisions>\n\
             TOPICS: <comma-separated topics>\n\n\
             Conversation:\n{}",
            transcript.join("\n")
        );
        let reply = llm.complete(&prompt).await?;

        let Some(session) = self.sessions.iter_mut().find(|s| s.session_id == id) else {
            return Ok(None);
        };
        apply_summary_reply(session, &reply);
        debug!(
            "Summarised session {}: {} decisions, {} topics",
            id,
            session.key_decisions.len(),
            session.topics_discussed.len()
        );
        Ok(Some(session.clone()))
    }

    /// Recent sessions rendered for prompt injection; empty when none exist
    pub fn get_session_context(&self) -> String {
        let mut recent: Vec<&SessionSummary> = self.sessions.iter().rev().collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent.truncate(RECENT_SESSIONS);

        if recent.is_empty() {
            return String::new();
        }

        let mut parts = vec!["## Recent Session Context".to_string()];
        for s in recent.into_iter().filter(|s| !s.summary.is_empty()) {
            let short: String = s.session_id.chars().take(8).collect();
            parts.push(format!("- Session {}: {}", short, s.summary));
            if !s.key_decisions.is_empty() {
                parts.push(format!("  Decisions: {}", s.key_decisions.join(", ")));
            }
        }
        parts.join("\n")
    }

    /// End the active session, returning its id
    pub fn end_session(&mut self) -> Option<String> {
        self.buffer.clear();
        let id = self.active.take();
        if let Some(id) = &id {
            info!("Ended session {}", id);
        }
        id
    }
}

fn apply_summary_reply(session: &mut SessionSummary, reply: &str) {
    for line in reply.lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix("SUMMARY:") {
            session.summary = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("DECISIONS:") {
            session.key_decisions = split_items(rest);
        } else if let Some(rest) = line.strip_prefix("TOPICS:") {
            session.topics_discussed = split_items(rest);
        }
    }
}

fn split_items(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
