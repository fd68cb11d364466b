use serde::{Deserialize, Serialize};

/// What was recorded for one question.
///
/// `selected == None` only happens for a timeout answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub selected: Option<String>,
    pub correct: bool,
    pub time_taken: u32,
}

impl Answer {
    #[must_use]
    pub fn chosen(selected: impl Into<String>, correct: bool, time_taken: u32) -> Self {
        Self {
            selected: Some(selected.into()),
            correct,
            time_taken,
        }
    }

    /// Answer synthesized when the countdown ran out before a pick.
    #[must_use]
    pub fn timeout(limit: u32) -> Self {
        Self {
            selected: None,
            correct: false,
            time_taken: limit,
        }
    }

    #[must_use]
    pub fn is_timeout(&self) -> bool {
        self.selected.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_answer_shape() {
        let answer = Answer::timeout(30);
        assert_eq!(answer.selected, None);
        assert!(!answer.correct);
        assert_eq!(answer.time_taken, 30);
        assert!(answer.is_timeout());
    }

    #[test]
    fn serializes_with_camel_case_and_null_selection() {
        let json = serde_json::to_string(&Answer::timeout(12)).unwrap();
        assert_eq!(json, r#"{"selected":null,"correct":false,"timeTaken":12}"#);
    }
}
