//! Clarification questions and the answers collected for them

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a question expects to be answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    YesNo,
    MultipleChoice,
    Text,
}

impl std::fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::YesNo => write!(f, "yes_no"),
            Self::MultipleChoice => write!(f, "multiple_choice"),
            Self::Text => write!(f, "text"),
        }
    }
}

/// A well-formed clarification question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClarificationQuestion {
    pub id: String,
    pub question: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    /// Only meaningful for multiple choice
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

/// One entry of a question list as the model returned it
///
/// Entries that don't have the typed shape are kept verbatim as `Raw`
/// instead of being dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Question {
    Typed(ClarificationQuestion),
    Raw(Value),
}

impl Question {
    /// Decode one array entry, falling back to `Raw`
    pub fn from_value(value: Value) -> Self {
        match serde_json::from_value::<ClarificationQuestion>(value.clone()) {
            Ok(q) => Question::Typed(q),
            Err(_) => Question::Raw(value),
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Question::Typed(q) => Some(&q.id),
            Question::Raw(v) => v.get("id").and_then(Value::as_str),
        }
    }

    /// Text to show a person answering the question
    pub fn prompt_text(&self) -> String {
        match self {
            Question::Typed(q) => q.question.clone(),
            Question::Raw(v) => v
                .get("question")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| v.to_string()),
        }
    }

    pub fn kind(&self) -> Option<QuestionKind> {
        match self {
            Question::Typed(q) => Some(q.kind),
            Question::Raw(_) => None,
        }
    }

    pub fn options(&self) -> &[String] {
        match self {
            Question::Typed(q) => &q.options,
            Question::Raw(_) => &[],
        }
    }

    pub fn is_typed(&self) -> bool {
        matches!(self, Question::Typed(_))
    }
}

/// Answers keyed by question id, in the order they were first given
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClarificationAnswers {
    entries: Vec<(String, String)>,
}

impl ClarificationAnswers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an answer; re-answering an id replaces it in place
    pub fn set(&mut self, id: impl Into<String>, answer: impl Into<String>) {
        let id = id.into();
        let answer = answer.into();
        match self.entries.iter_mut().find(|(k, _)| *k == id) {
            Some(entry) => entry.1 = answer,
            None => self.entries.push((id, answer)),
        }
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.entries.iter().find(|(k, _)| k == id).map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `Q: {id}\nA: {answer}` blocks joined by newlines, in insertion order
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|(id, answer)| format!("Q: {}\nA: {}", id, answer))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ClarificationAnswers {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut answers = Self::new();
        for (k, v) in iter {
            answers.set(k, v);
        }
        answers
    }
}
