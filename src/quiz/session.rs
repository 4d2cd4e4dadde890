use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::quiz::{Label, QuestionRecord};

/// Progress of one player through a generated question list.
///
/// A session is `InProgress` until every question has been answered, after
/// which it is `Completed` and only reports the final score.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSession {
    questions: Vec<QuestionRecord>,
    current_index: usize,
    score: usize,
    answered: BTreeMap<usize, Label>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    InProgress,
    Completed,
}

/// Result of an accepted answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub correct: bool,
    pub correct_answer: String,
}

impl QuizSession {
    pub fn new(questions: Vec<QuestionRecord>) -> Self {
        Self {
            questions,
            current_index: 0,
            score: 0,
            answered: BTreeMap::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        if self.current_index >= self.questions.len() {
            Phase::Completed
        } else {
            Phase::InProgress
        }
    }

    pub fn is_completed(&self) -> bool {
        self.phase() == Phase::Completed
    }

    pub fn current(&self) -> Option<&QuestionRecord> {
        self.questions.get(self.current_index)
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    pub fn answered(&self) -> &BTreeMap<usize, Label> {
        &self.answered
    }

    /// Answers the current question with the display value of an option.
    ///
    /// A missing choice, or one that is not among the current options, is
    /// rejected without touching the session.
    pub fn submit(&mut self, choice: Option<&str>) -> Result<Submission, SessionError> {
        let question = self.current().ok_or(SessionError::Completed)?;
        let choice = choice.ok_or(SessionError::NoChoice)?;
        let label = question
            .options()
            .label_of(choice)
            .ok_or_else(|| SessionError::UnknownChoice(choice.to_string()))?;

        let correct_answer = question.correct_value().to_string();
        let correct = choice == correct_answer;

        if correct {
            self.score += 1;
        }
        self.answered.insert(self.current_index, label);
        self.current_index += 1;

        Ok(Submission {
            correct,
            correct_answer,
        })
    }
}
