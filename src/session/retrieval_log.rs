//! Running question/answer logs resent with every retrieval-mode call.

use serde::{Deserialize, Serialize};

/// Separator appended after every logged entry.
pub const LOG_SEPARATOR: &str = " | ";

/// Append-only pair of chronological logs.
///
/// The retrieval backend is stateless, so the full history travels with each
/// request. Length is unbounded within a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalLog {
    questions_asked: String,
    answers_given: String,
}

impl RetrievalLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_question(&mut self, question: &str) {
        self.questions_asked.push_str(question);
        self.questions_asked.push_str(LOG_SEPARATOR);
    }

    pub fn record_answer(&mut self, answer: &str) {
        self.answers_given.push_str(answer);
        self.answers_given.push_str(LOG_SEPARATOR);
    }

    pub fn questions_asked(&self) -> &str {
        &self.questions_asked
    }

    pub fn answers_given(&self) -> &str {
        &self.answers_given
    }

    pub fn is_empty(&self) -> bool {
        self.questions_asked.is_empty() && self.answers_given.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logs_accumulate_in_submission_order() {
        let mut log = RetrievalLog::new();
        for answer in ["A1", "A2", "A3"] {
            log.record_answer(answer);
        }
        assert_eq!(log.answers_given(), "A1 | A2 | A3 | ");
        assert_eq!(log.questions_asked(), "");
    }

    #[test]
    fn questions_and_answers_are_independent() {
        let mut log = RetrievalLog::new();
        log.record_question("Define Y");
        assert_eq!(log.questions_asked(), "Define Y | ");
        assert!(log.answers_given().is_empty());
        assert!(!log.is_empty());
    }
}
