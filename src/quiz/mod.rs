pub mod ai_helper;
pub mod extract;
pub mod session;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Option label of a multiple-choice question.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Label {
    #[default]
    A,
    B,
    C,
    D,
}

impl Label {
    pub const ALL: [Label; 4] = [Label::A, Label::B, Label::C, Label::D];

    /// Exact match on a single uppercase letter.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "A" => Some(Label::A),
            "B" => Some(Label::B),
            "C" => Some(Label::C),
            "D" => Some(Label::D),
            _ => None,
        }
    }

    /// Normalizes a raw answer token the way the model output is read:
    /// trimmed, uppercased, and anything else than a bare label falls back to `A`.
    pub fn from_answer_token(token: &str) -> Self {
        Self::parse(&token.trim().to_uppercase()).unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::A => "A",
            Label::B => "B",
            Label::C => "C",
            Label::D => "D",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four answer options of a question, serialized as `{"A": .., "B": .., "C": .., "D": ..}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSet {
    #[serde(rename = "A")]
    a: String,
    #[serde(rename = "B")]
    b: String,
    #[serde(rename = "C")]
    c: String,
    #[serde(rename = "D")]
    d: String,
}

impl OptionSet {
    pub fn new(a: String, b: String, c: String, d: String) -> Self {
        Self { a, b, c, d }
    }

    pub fn get(&self, label: Label) -> &str {
        match label {
            Label::A => &self.a,
            Label::B => &self.b,
            Label::C => &self.c,
            Label::D => &self.d,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Label, &str)> {
        Label::ALL.into_iter().map(move |label| (label, self.get(label)))
    }

    /// First label whose value equals `value`.
    pub fn label_of(&self, value: &str) -> Option<Label> {
        self.iter()
            .find(|(_, option)| *option == value)
            .map(|(label, _)| label)
    }
}

/// One generated multiple-choice question.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    #[serde(rename = "question")]
    text: String,
    options: OptionSet,
    #[serde(rename = "correct_answer")]
    correct_label: Label,
}

impl QuestionRecord {
    pub fn new(text: String, options: OptionSet, correct_label: Label) -> Self {
        Self {
            text,
            options,
            correct_label,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> &OptionSet {
        &self.options
    }

    pub fn correct_label(&self) -> Label {
        self.correct_label
    }

    pub fn correct_value(&self) -> &str {
        self.options.get(self.correct_label)
    }
}
