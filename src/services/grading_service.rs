use std::collections::BTreeSet;

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::models::domain::{Game, GameType, Question};

/// Open-ended scores at or above this are reported as "close enough".
pub const CLOSE_ENOUGH_THRESHOLD: u8 = 80;

static OPTION_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*\(?[A-Da-d][.):]\s+").expect("OPTION_PREFIX is a valid regex pattern")
});

static BARE_LETTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*\(?([A-Da-d])[.)]?\s*$").expect("BARE_LETTER is a valid regex pattern")
});

/// Removes a leading "A. " / "b) " / "(C) " style label.
pub fn strip_option_prefix(text: &str) -> &str {
    match OPTION_PREFIX.find(text) {
        Some(m) => &text[m.end()..],
        None => text,
    }
}

/// Trim, strip option labels, collapse whitespace and case-fold.
pub fn normalize_choice(text: &str) -> String {
    strip_option_prefix(text.trim())
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Finds the option an answer refers to. A text match wins; a bare letter
/// selects by position only when no option has that text.
pub fn resolve_answer(options: &[String], answer: &str) -> Option<usize> {
    let wanted = normalize_choice(answer);
    if let Some(index) = options.iter().position(|o| normalize_choice(o) == wanted) {
        return Some(index);
    }

    let caps = BARE_LETTER.captures(answer)?;
    let letter = caps[1].chars().next()?.to_ascii_lowercase();
    let index = (letter as u8 - b'a') as usize;
    (index < options.len()).then_some(index)
}

fn word_tokens(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ChoiceGrade {
    pub is_correct: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct OpenEndedGrade {
    pub percentage_similar: u8,
}

impl OpenEndedGrade {
    pub fn is_close_enough(&self) -> bool {
        self.percentage_similar >= CLOSE_ENOUGH_THRESHOLD
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum GradingResult {
    Choice(ChoiceGrade),
    OpenEnded(OpenEndedGrade),
}

pub struct GradingService;

impl GradingService {
    /// Exact match after normalization; no partial credit.
    pub fn grade_choice(canonical: &str, submitted: &str) -> ChoiceGrade {
        ChoiceGrade {
            is_correct: normalize_choice(canonical) == normalize_choice(submitted),
        }
    }

    /// Sørensen–Dice coefficient over the two word-token sets, as a rounded
    /// percentage. Symmetric; identical text scores 100, disjoint text 0.
    pub fn grade_open_ended(canonical: &str, submitted: &str) -> OpenEndedGrade {
        let expected = word_tokens(canonical);
        let given = word_tokens(submitted);

        let percentage_similar = if expected.is_empty() && given.is_empty() {
            if canonical.trim() == submitted.trim() {
                100
            } else {
                0
            }
        } else {
            let shared = expected.intersection(&given).count();
            let score = 200.0 * shared as f64 / (expected.len() + given.len()) as f64;
            score.round().clamp(0.0, 100.0) as u8
        };

        OpenEndedGrade { percentage_similar }
    }

    pub fn grade_question(question: &Question, submitted: &str) -> GradingResult {
        match question.question_type {
            GameType::Mcq => GradingResult::Choice(Self::grade_choice(&question.answer, submitted)),
            GameType::OpenEnded => {
                GradingResult::OpenEnded(Self::grade_open_ended(&question.answer, submitted))
            }
        }
    }

    /// Records the submission and its outcome on the question. A later
    /// submission overwrites an earlier one.
    pub fn apply(question: &mut Question, submitted: &str, result: GradingResult) {
        question.user_answer = Some(submitted.to_string());
        match result {
            GradingResult::Choice(grade) => {
                question.is_correct = Some(grade.is_correct);
                question.percentage_correct = None;
            }
            GradingResult::OpenEnded(grade) => {
                question.is_correct = None;
                question.percentage_correct = Some(grade.percentage_similar);
            }
        }
        question.modified_at = Some(Utc::now());
    }

    /// Aggregate accuracy in percent, rounded to two decimals. Unanswered
    /// questions count as wrong.
    pub fn accuracy(game: &Game) -> f64 {
        let total = game.questions.len();
        if total == 0 {
            return 0.0;
        }

        let earned: f64 = match game.game_type {
            GameType::Mcq => game
                .questions
                .iter()
                .filter(|q| q.is_correct == Some(true))
                .count() as f64
                * 100.0,
            GameType::OpenEnded => game
                .questions
                .iter()
                .map(|q| q.percentage_correct.unwrap_or(0) as f64)
                .sum(),
        };

        (earned / total as f64 * 100.0).round() / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn strips_common_option_labels() {
        assert_eq!(strip_option_prefix("A. Paris"), "Paris");
        assert_eq!(strip_option_prefix("b) London"), "London");
        assert_eq!(strip_option_prefix("(C) Rome"), "Rome");
        assert_eq!(strip_option_prefix("A cat"), "A cat");
        assert_eq!(strip_option_prefix("A.D. 1066"), "A.D. 1066");
    }

    #[test]
    fn letter_answer_resolves_against_noisy_options() {
        let options = strings(&["Paris", "A. Paris", "paris ", "London"]);

        assert_eq!(resolve_answer(&options, "A"), Some(0));
        assert_eq!(resolve_answer(&options, "(a)"), Some(0));
        assert_eq!(resolve_answer(&options, "  PARIS "), Some(0));
        assert_eq!(resolve_answer(&options, "D."), Some(3));
        assert_eq!(resolve_answer(&options, "Berlin"), None);
    }

    #[test]
    fn option_text_that_looks_like_a_letter_matches_by_text() {
        let options = strings(&["C", "B12", "A", "B6"]);

        assert_eq!(resolve_answer(&options, "A"), Some(2));
        assert_eq!(resolve_answer(&options, "c"), Some(0));
        assert_eq!(resolve_answer(&options, "B"), Some(1));
    }

    #[test]
    fn letter_outside_option_range_does_not_resolve() {
        let options = strings(&["Yes", "No"]);

        assert_eq!(resolve_answer(&options, "C"), None);
    }

    #[test]
    fn grade_choice_normalizes() {
        assert!(GradingService::grade_choice("Paris", "Paris").is_correct);
        assert!(GradingService::grade_choice("Paris", "paris").is_correct);
        assert!(GradingService::grade_choice("Paris", "  A. Paris ").is_correct);
        assert!(!GradingService::grade_choice("Paris", "London").is_correct);
    }

    #[test]
    fn open_ended_identity_and_disjoint_bounds() {
        let text = "Chlorophyll absorbs light energy";

        assert_eq!(GradingService::grade_open_ended(text, text).percentage_similar, 100);
        assert_eq!(
            GradingService::grade_open_ended(text, "Mitochondria produce ATP").percentage_similar,
            0
        );
        assert_eq!(GradingService::grade_open_ended("!", "!").percentage_similar, 100);
    }

    #[test]
    fn open_ended_is_symmetric_and_case_insensitive() {
        let a = "Plants convert light into chemical energy";
        let b = "plants convert SUNLIGHT into energy";

        let forward = GradingService::grade_open_ended(a, b);
        let backward = GradingService::grade_open_ended(b, a);
        assert_eq!(forward, backward);
        // 4 shared of 6 + 5 tokens
        assert_eq!(forward.percentage_similar, 73);
        assert!(!forward.is_close_enough());
    }

    #[test]
    fn close_enough_threshold() {
        assert!(OpenEndedGrade { percentage_similar: 80 }.is_close_enough());
        assert!(!OpenEndedGrade { percentage_similar: 79 }.is_close_enough());
    }

    #[test]
    fn apply_records_outcome_by_type() {
        let mut mcq = Question::new_mcq("g", "Capital?", "Paris", strings(&["Paris", "Rome", "Oslo", "Bern"]));
        let result = GradingService::grade_question(&mcq, "paris");
        GradingService::apply(&mut mcq, "paris", result);
        assert_eq!(mcq.is_correct, Some(true));
        assert_eq!(mcq.user_answer.as_deref(), Some("paris"));
        assert!(mcq.percentage_correct.is_none());

        let mut open = Question::new_open_ended("g", "Define osmosis", "movement of water");
        let result = GradingService::grade_question(&open, "movement of water");
        GradingService::apply(&mut open, "movement of water", result);
        assert_eq!(open.percentage_correct, Some(100));
        assert!(open.is_correct.is_none());
    }

    #[test]
    fn accuracy_by_game_type() {
        let mut mcq = Game::new("p", "t", GameType::Mcq, "en");
        mcq.questions = (0..3)
            .map(|i| Question::new_mcq(&mcq.id, &format!("q{i}"), "a", strings(&["a", "b", "c", "d"])))
            .collect();
        mcq.questions[0].is_correct = Some(true);
        mcq.questions[1].is_correct = Some(false);
        assert_eq!(GradingService::accuracy(&mcq), 33.33);

        let mut open = Game::new("p", "t", GameType::OpenEnded, "en");
        open.questions = (0..2)
            .map(|i| Question::new_open_ended(&open.id, &format!("q{i}"), "a"))
            .collect();
        open.questions[0].percentage_correct = Some(90);
        open.questions[1].percentage_correct = Some(75);
        assert_eq!(GradingService::accuracy(&open), 82.5);

        assert_eq!(GradingService::accuracy(&Game::new("p", "t", GameType::Mcq, "en")), 0.0);
    }
}
