use std::slice::ChunksExact;

use thiserror::Error;

/// One element of flat structured authoring data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Datum {
    Text(String),
    List(Vec<String>),
}

impl Datum {
    /// Text form; lists are joined with single spaces.
    #[must_use]
    pub fn text(&self) -> String {
        match self {
            Datum::Text(text) => text.clone(),
            Datum::List(items) => items.join(" "),
        }
    }

    /// List form; empty text is the empty list.
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        match self {
            Datum::Text(text) if text.is_empty() => Vec::new(),
            Datum::Text(text) => vec![text.clone()],
            Datum::List(items) => items.clone(),
        }
    }
}

impl From<&str> for Datum {
    fn from(text: &str) -> Self {
        Datum::Text(text.to_string())
    }
}

impl From<String> for Datum {
    fn from(text: String) -> Self {
        Datum::Text(text)
    }
}

impl From<Vec<String>> for Datum {
    fn from(items: Vec<String>) -> Self {
        Datum::List(items)
    }
}

impl From<Vec<&str>> for Datum {
    fn from(items: Vec<&str>) -> Self {
        Datum::List(items.into_iter().map(str::to_string).collect())
    }
}

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("data length has to be a multiple of {expected}, found {found} items")]
pub struct ShapeError {
    pub expected: usize,
    pub found: usize,
}

/// Split `items` into groups of exactly `arity` elements.
pub fn group_exact<T>(items: &[T], arity: usize) -> Result<ChunksExact<'_, T>, ShapeError> {
    if arity == 0 || items.len() % arity != 0 {
        return Err(ShapeError {
            expected: arity,
            found: items.len(),
        });
    }
    Ok(items.chunks_exact(arity))
}

/// A scripted conversation step: context preparation, the utterance tokens,
/// the goal code and the response code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrainingRound {
    pub prep: Vec<String>,
    pub tokens: Vec<String>,
    pub goal: Vec<String>,
    pub response: Vec<String>,
}

impl TrainingRound {
    #[must_use]
    pub fn utterance(&self) -> String {
        self.tokens.join(" ")
    }
}

pub fn training_rounds(data: &[Datum]) -> Result<Vec<TrainingRound>, ShapeError> {
    Ok(group_exact(data, 4)?
        .map(|round| TrainingRound {
            prep: round[0].list(),
            tokens: round[1].list(),
            goal: round[2].list(),
            response: round[3].list(),
        })
        .collect())
}
