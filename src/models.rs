use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Chat roles understood by the completion service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

// Groq chat message format, also the on-disk transcript entry
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

// Groq API request format
#[derive(Debug, Serialize, Clone)]
pub struct GroqRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: i32,
    pub top_p: f32,
    pub stream: bool,
}

// One server-sent event of a streaming completion
#[derive(Debug, Deserialize)]
pub struct GroqStreamChunk {
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
    /// Set when the server aborts the stream with an error event
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct StreamChoice {
    #[serde(default)]
    pub delta: Delta,
}

#[derive(Debug, Deserialize, Default)]
pub struct Delta {
    pub content: Option<String>,
}

/// Organic web search hit. Missing or null fields fall back to placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchResult {
    #[serde(
        default = "SearchResult::default_title",
        deserialize_with = "SearchResult::title_or_default"
    )]
    pub title: String,
    #[serde(
        default = "SearchResult::default_snippet",
        deserialize_with = "SearchResult::snippet_or_default"
    )]
    pub snippet: String,
}

impl SearchResult {
    fn default_title() -> String {
        "No Title".to_string()
    }

    fn default_snippet() -> String {
        "No Description".to_string()
    }

    fn title_or_default<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
        Ok(Option::<String>::deserialize(d)?.unwrap_or_else(Self::default_title))
    }

    fn snippet_or_default<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
        Ok(Option::<String>::deserialize(d)?.unwrap_or_else(Self::default_snippet))
    }
}

/// Command families the classifier is allowed to emit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    General,
    Realtime,
    Content,
    GoogleSearch,
    YoutubeSearch,
    Farewell,
    /// The model echoed the `(query)` template placeholder
    Query,
    /// Classifier gave up
    Unknown,
}

impl CommandKind {
    /// Leading keywords in the order they are matched
    pub const KEYWORDS: [(&'static str, CommandKind); 6] = [
        ("general", CommandKind::General),
        ("realtime", CommandKind::Realtime),
        ("content", CommandKind::Content),
        ("google search", CommandKind::GoogleSearch),
        ("youtube search", CommandKind::YoutubeSearch),
        ("lovely farewell", CommandKind::Farewell),
    ];

    pub const AMBIGUITY_MARKER: &'static str = "(query)";
}

/// One classifier decision, e.g. `realtime who won the match`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    text: String,
}

impl Command {
    /// Accepts candidate text only when it starts with a recognized keyword
    pub fn recognize(candidate: &str) -> Option<Self> {
        let lowered = candidate.to_lowercase();
        CommandKind::KEYWORDS
            .iter()
            .any(|(kw, _)| lowered.starts_with(kw))
            .then(|| Self {
                text: candidate.to_string(),
            })
    }

    pub fn unknown() -> Self {
        Self {
            text: "unknown".to_string(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> CommandKind {
        if self.is_ambiguous() {
            return CommandKind::Query;
        }
        let lowered = self.text.to_lowercase();
        CommandKind::KEYWORDS
            .iter()
            .find(|(kw, _)| lowered.starts_with(kw))
            .map(|(_, kind)| *kind)
            .unwrap_or(CommandKind::Unknown)
    }

    pub fn is_ambiguous(&self) -> bool {
        self.text.contains(CommandKind::AMBIGUITY_MARKER)
    }

    /// Lower-cased leading token and the rest of the text
    pub fn split(&self) -> (String, &str) {
        let trimmed = self.text.trim_start();
        match trimmed.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword.to_lowercase(), rest.trim_start()),
            None => (trimmed.to_lowercase(), ""),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Body of `POST /query/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    General,
    Realtime,
    Unsupported,
    Unknown,
    Error,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Realtime => "realtime",
            Self::Unsupported => "unsupported",
            Self::Unknown => "unknown",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(rename = "type")]
    pub kind: ResponseType,
    pub response: String,
}

impl QueryResponse {
    pub fn new(kind: ResponseType, response: impl Into<String>) -> Self {
        Self {
            kind,
            response: response.into(),
        }
    }
}
