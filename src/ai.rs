//! AI-assisted name cleanup and regrouping
//!
//! The model is an opaque collaborator: we send `{id, name}` pairs and get
//! back `{id, name}` or `{id, group}` pairs. A failed or empty answer never
//! touches the collection.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::{info, warn};

use crate::collection::Collection;
use crate::error::{Error, Result};
use crate::models::{Entry, EntryId};

pub const DEFAULT_BATCH_CAP: usize = 50;
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
const API_KEY_VARS: [&str; 2] = ["API_KEY", "GEMINI_API_KEY"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameItem {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupItem {
    pub id: String,
    pub group: String,
}

/// Text-completion service used for cleanup and categorization
pub trait AiAssistant: Send + Sync {
    fn clean_names(&self, batch: &[NameItem]) -> Result<Vec<NameItem>>;
    fn categorize(&self, batch: &[NameItem]) -> Result<Vec<GroupItem>>;
}

/// Gemini `generateContent` over REST
pub struct GeminiClient {
    agent: ureq::Agent,
    api_key: String,
    model: String,
    endpoint: String,
}

impl GeminiClient {
    pub fn new(api_key: &str, model: &str) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(120)))
            .timeout_connect(Some(Duration::from_secs(30)))
            .build()
            .new_agent();
        Self {
            agent,
            api_key: api_key.to_string(),
            model: model.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    /// Read the key from `API_KEY` or `GEMINI_API_KEY`
    pub fn from_env(model: &str) -> Result<Self> {
        let key = API_KEY_VARS
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                Error::Validation("No AI API key configured (set API_KEY).".to_string())
            })?;
        Ok(Self::new(key.trim(), model))
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }

    fn generate<T: DeserializeOwned>(&self, prompt: String, value_field: &str) -> Result<Vec<T>> {
        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "id": { "type": "STRING" },
                            value_field: { "type": "STRING" }
                        },
                        "required": ["id", value_field]
                    }
                }
            }
        });

        let mut response = self
            .agent
            .post(&url)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .send(serde_json::to_string(&body)?)?;

        if response.status() != 200 {
            return Err(Error::Network(format!("AI service HTTP error: {}", response.status())));
        }

        let text = response
            .body_mut()
            .read_to_string()
            .map_err(|e| Error::Network(format!("Read failed: {}", e)))?;
        let reply: Value = serde_json::from_str(&text)?;

        let Some(answer) = reply
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
        else {
            warn!("AI response carried no text part");
            return Ok(Vec::new());
        };

        // A malformed answer counts as "no results", not as a hard failure
        match serde_json::from_str(answer) {
            Ok(items) => Ok(items),
            Err(e) => {
                warn!("AI parse error: {}", e);
                Ok(Vec::new())
            }
        }
    }
}

impl AiAssistant for GeminiClient {
    fn clean_names(&self, batch: &[NameItem]) -> Result<Vec<NameItem>> {
        let prompt = format!(
            "Clean these channel names by removing numbers, extra spaces, and technical codes \
             (like \"FHD\", \"4K\", \"HEVC\"). Return a JSON array of objects with 'id' and 'name'. Data: {}",
            serde_json::to_string(batch)?
        );
        self.generate(prompt, "name")
    }

    fn categorize(&self, batch: &[NameItem]) -> Result<Vec<GroupItem>> {
        let prompt = format!(
            "Categorize these channels into standard groups like \"Movies\", \"Sports\", \"News\", \
             \"Kids\", \"Entertainment\", \"Music\". Return a JSON array of objects with 'id' and 'group'. Data: {}",
            serde_json::to_string(batch)?
        );
        self.generate(prompt, "group")
    }
}

/// The first `cap` targets as `{id, name}` pairs. Without a selection the
/// whole collection is the target set.
pub fn build_batch(collection: &Collection, selected: &HashSet<EntryId>, cap: usize) -> Vec<NameItem> {
    let targets: Box<dyn Iterator<Item = &Entry>> = if selected.is_empty() {
        Box::new(collection.entries().iter())
    } else {
        Box::new(collection.entries().iter().filter(|e| selected.contains(&e.id())))
    };
    targets
        .take(cap)
        .map(|e| NameItem {
            id: e.id().to_string(),
            name: e.name.clone(),
        })
        .collect()
}

/// Keep suggestions that refer to a batch member and carry a value
fn accepted<I>(batch: &[NameItem], suggestions: I) -> Result<HashMap<EntryId, String>>
where
    I: IntoIterator<Item = (String, String)>,
{
    let allowed: HashSet<&str> = batch.iter().map(|item| item.id.as_str()).collect();
    let updates: HashMap<EntryId, String> = suggestions
        .into_iter()
        .filter(|(id, value)| allowed.contains(id.trim()) && !value.trim().is_empty())
        .filter_map(|(id, value)| EntryId::parse(&id).map(|id| (id, value.trim().to_string())))
        .collect();

    if updates.is_empty() {
        return Err(Error::NoSuggestions);
    }
    Ok(updates)
}

pub fn name_updates(batch: &[NameItem], suggestions: Vec<NameItem>) -> Result<HashMap<EntryId, String>> {
    accepted(batch, suggestions.into_iter().map(|s| (s.id, s.name)))
}

pub fn group_updates(batch: &[NameItem], suggestions: Vec<GroupItem>) -> Result<HashMap<EntryId, String>> {
    accepted(batch, suggestions.into_iter().map(|s| (s.id, s.group)))
}

/// One AI pass over the collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiJob {
    CleanNames,
    Categorize,
}

impl AiJob {
    /// Collect the batch for this job. An empty target set is a validation error.
    pub fn prepare(
        self,
        collection: &Collection,
        selected: &HashSet<EntryId>,
        cap: usize,
    ) -> Result<Vec<NameItem>> {
        let batch = build_batch(collection, selected, cap);
        if batch.is_empty() {
            let message = match self {
                AiJob::CleanNames => "No items to clean",
                AiJob::Categorize => "No items to categorize",
            };
            return Err(Error::Validation(message.to_string()));
        }
        Ok(batch)
    }

    /// Ask the assistant and keep only usable suggestions. Safe to run off the UI thread.
    pub fn suggest(self, assistant: &dyn AiAssistant, batch: &[NameItem]) -> Result<HashMap<EntryId, String>> {
        match self {
            AiJob::CleanNames => name_updates(batch, assistant.clean_names(batch)?),
            AiJob::Categorize => group_updates(batch, assistant.categorize(batch)?),
        }
    }

    /// Write accepted suggestions back. Ids no longer in the collection are skipped.
    pub fn apply(self, collection: &mut Collection, updates: &HashMap<EntryId, String>) -> usize {
        match self {
            AiJob::CleanNames => {
                let renamed = collection.bulk_rename(updates);
                info!("AI cleaned {} titles", renamed);
                renamed
            }
            AiJob::Categorize => {
                let changed = collection.bulk_assign_category(updates);
                info!("AI categorized {} items", changed);
                changed
            }
        }
    }

    /// Prepare, ask and apply in one go on the calling thread
    pub fn run(
        self,
        collection: &mut Collection,
        selected: &HashSet<EntryId>,
        assistant: &dyn AiAssistant,
        cap: usize,
    ) -> Result<usize> {
        let batch = self.prepare(collection, selected, cap)?;
        let updates = self.suggest(assistant, &batch)?;
        Ok(self.apply(collection, &updates))
    }
}

/// Clean up names of the selection (or everything) in one request.
/// Returns how many entries were renamed.
pub fn clean_names(
    collection: &mut Collection,
    selected: &HashSet<EntryId>,
    assistant: &dyn AiAssistant,
    cap: usize,
) -> Result<usize> {
    AiJob::CleanNames.run(collection, selected, assistant, cap)
}

/// Regroup the selection (or everything) in one request.
/// Returns how many entries changed group.
pub fn categorize(
    collection: &mut Collection,
    selected: &HashSet<EntryId>,
    assistant: &dyn AiAssistant,
    cap: usize,
) -> Result<usize> {
    AiJob::Categorize.run(collection, selected, assistant, cap)
}

#[cfg(test)]
#[path = "ai_tests.rs"]
mod tests;
