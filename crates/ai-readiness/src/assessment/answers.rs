use serde::{Deserialize, Serialize};

use super::scoring::{ResponseLabel, ScoringError};

/// One raw answer as submitted by the questionnaire form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerEntry {
    pub question_index: usize,
    pub response: String,
}

impl AnswerEntry {
    pub fn new(question_index: usize, response: impl Into<String>) -> Self {
        Self {
            question_index,
            response: response.into(),
        }
    }
}

/// Complete, validated set of answers for one catalog entry, ordered by question index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerSet {
    responses: Vec<ResponseLabel>,
}

impl AnswerSet {
    /// Validate raw entries against the number of prompts in the selected catalog entry.
    pub fn new(expected_len: usize, entries: Vec<AnswerEntry>) -> Result<Self, AnswerSetError> {
        let mut slots: Vec<Option<ResponseLabel>> = vec![None; expected_len];

        for entry in entries {
            let label: ResponseLabel = entry.response.parse()?;
            let slot = slots
                .get_mut(entry.question_index)
                .ok_or(AnswerSetError::QuestionOutOfRange {
                    index: entry.question_index,
                    expected: expected_len,
                })?;
            if slot.replace(label).is_some() {
                return Err(AnswerSetError::DuplicateAnswer(entry.question_index));
            }
        }

        let missing: Vec<usize> = slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.is_none().then_some(index))
            .collect();
        if !missing.is_empty() {
            return Err(AnswerSetError::Incomplete { missing });
        }

        Ok(Self {
            responses: slots.into_iter().flatten().collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    pub fn responses(&self) -> &[ResponseLabel] {
        &self.responses
    }

    pub fn scores(&self) -> Vec<u8> {
        self.responses.iter().map(|label| label.score()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnswerSetError {
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error("question index {index} is outside the {expected} catalog questions")]
    QuestionOutOfRange { index: usize, expected: usize },
    #[error("question {0} was answered more than once")]
    DuplicateAnswer(usize),
    #[error("questions {missing:?} were not answered")]
    Incomplete { missing: Vec<usize> },
}
