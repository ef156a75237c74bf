//! Open-ended clarification search that runs outside the scripted questions.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::transcript::Transcript;

/// Search id the backend treats as "start a new search".
pub const NEW_SEARCH_ID: &str = "new";

/// Body of `POST /doctors/search/ai`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub user_input: String,
    pub zip_code: Option<String>,
    pub search_id: String,
}

/// Fields of the search response the loop consumes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub search_id: Option<String>,
    #[serde(default)]
    pub clarification_questions: Vec<String>,
    #[serde(default)]
    pub results: Vec<serde_json::Value>,
}

/// What a search response did to the loop.
#[derive(Debug, Clone, PartialEq)]
pub enum ClarificationOutcome {
    /// More questions were asked; the loop waits for the next input.
    FollowUp { questions: Vec<String> },
    /// Results arrived; the loop is closed and the chat cleared.
    Completed { results: Vec<serde_json::Value> },
    /// Neither questions nor results.
    NoProgress,
}

/// Server-threaded search conversation.
#[derive(Debug, Clone)]
pub struct ClarificationLoop {
    search_id: String,
    active: bool,
}

impl Default for ClarificationLoop {
    fn default() -> Self {
        Self {
            search_id: NEW_SEARCH_ID.to_string(),
            active: false,
        }
    }
}

impl ClarificationLoop {
    /// Start a fresh search conversation.
    pub fn begin(&mut self) {
        self.search_id = NEW_SEARCH_ID.to_string();
        self.active = true;
        info!("Clarification search started");
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn search_id(&self) -> &str {
        &self.search_id
    }

    /// Close the loop without results (user navigated away).
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Build the outbound request for a user turn.
    pub fn request(&self, text: &str, zip_code: Option<&str>) -> SearchRequest {
        SearchRequest {
            user_input: text.to_string(),
            zip_code: zip_code.map(str::to_string),
            search_id: self.search_id.clone(),
        }
    }

    /// Fold a search response into the loop and the shared transcript.
    pub fn apply(
        &mut self,
        response: SearchResponse,
        transcript: &mut Transcript,
    ) -> ClarificationOutcome {
        self.search_id = response
            .search_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| NEW_SEARCH_ID.to_string());

        if !response.clarification_questions.is_empty() {
            transcript.push_clarification(response.clarification_questions.join("\n"));
            debug!(
                search_id = %self.search_id,
                count = response.clarification_questions.len(),
                "Search asked for clarification"
            );
            return ClarificationOutcome::FollowUp {
                questions: response.clarification_questions,
            };
        }

        if !response.results.is_empty() {
            self.active = false;
            transcript.clear();
            info!(
                search_id = %self.search_id,
                results = response.results.len(),
                "Clarification search completed"
            );
            return ClarificationOutcome::Completed {
                results: response.results,
            };
        }

        ClarificationOutcome::NoProgress
    }
}
