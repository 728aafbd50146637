use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => f.write_str("user"),
            Role::Assistant => f.write_str("assistant"),
        }
    }
}

/// One role-tagged message. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Turn {
    role: Role,
    content: String,
}

impl Turn {
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

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Append-only, in-memory history of one chat session.
///
/// Insertion order is display order. There is no edit, delete or clear;
/// the transcript goes away with the session that owns it.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn and return a reference to the stored copy.
    pub fn append(&mut self, turn: Turn) -> &Turn {
        self.turns.push(turn);
        &self.turns[self.turns.len() - 1]
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Turn> {
        self.turns.iter()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Number of completed exchanges (assistant turns).
    pub fn exchanges(&self) -> usize {
        self.turns
            .iter()
            .filter(|t| t.role() == Role::Assistant)
            .count()
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Turn;
    type IntoIter = std::slice::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}
