//! Fill-in-the-blank rendering for open-ended answers.

use regex::Regex;
use serde::Serialize;

pub const BLANK_MARKER: &str = "_____";
const BLANKS_PER_ANSWER: usize = 2;

const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few",
    "for", "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers",
    "herself", "him", "himself", "his", "how", "however", "i", "if", "in", "into", "is", "it",
    "its", "itself", "just", "may", "me", "might", "more", "most", "must", "my", "myself", "no",
    "nor", "not", "now", "of", "off", "on", "once", "only", "or", "other", "our", "ours",
    "ourselves", "out", "over", "own", "same", "she", "should", "so", "some", "such", "than",
    "that", "the", "their", "theirs", "them", "themselves", "then", "there", "these", "they",
    "this", "those", "through", "to", "too", "under", "until", "up", "upon", "very", "was", "we",
    "were", "what", "when", "where", "which", "while", "who", "whom", "why", "will", "with",
    "within", "without", "would", "you", "your", "yours", "yourself", "yourselves",
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BlankedAnswer {
    pub text: String,
    pub terms: Vec<String>,
    pub blank_count: usize,
}

impl BlankedAnswer {
    /// Substitutes player inputs for the blanks, in order. Missing inputs
    /// leave the slot empty.
    pub fn fill<S: AsRef<str>>(&self, inputs: &[S]) -> String {
        let mut filled = String::with_capacity(self.text.len());
        for (i, part) in self.text.split(BLANK_MARKER).enumerate() {
            if i > 0 {
                if let Some(input) = inputs.get(i - 1) {
                    filled.push_str(input.as_ref().trim());
                }
            }
            filled.push_str(part);
        }
        filled
    }
}

struct Candidate<'a> {
    word: &'a str,
    capitalized: bool,
}

fn is_significant(word: &str) -> bool {
    let lower = word.to_lowercase();
    word.chars().count() > 2
        && !STOPWORDS.contains(&lower.as_str())
        && !lower.ends_with("ing")
        && !lower.ends_with("ed")
}

/// Picks the terms to mask: longest significant words first, capitalized
/// words winning ties, then earliest occurrence.
pub fn select_terms(answer: &str) -> Vec<String> {
    let mut candidates: Vec<Candidate> = Vec::new();
    for word in answer.split(|c: char| !c.is_alphanumeric()) {
        if !is_significant(word) {
            continue;
        }
        let capitalized = word.chars().next().is_some_and(char::is_uppercase);
        // A repeated word counts as capitalized if any occurrence is.
        if let Some(seen) = candidates.iter_mut().find(|c| c.word.eq_ignore_ascii_case(word)) {
            seen.capitalized |= capitalized;
            continue;
        }
        candidates.push(Candidate { word, capitalized });
    }

    candidates.sort_by(|a, b| {
        b.word
            .chars()
            .count()
            .cmp(&a.word.chars().count())
            .then(b.capitalized.cmp(&a.capitalized))
    });

    candidates
        .into_iter()
        .take(BLANKS_PER_ANSWER)
        .map(|c| c.word.to_string())
        .collect()
}

/// Masks every whole-word, case-insensitive occurrence of the selected terms.
pub fn blank_answer(answer: &str) -> BlankedAnswer {
    let terms = select_terms(answer);
    let mut text = answer.to_string();
    let mut blank_count = 0;

    for term in &terms {
        let Ok(pattern) = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(term))) else {
            continue;
        };
        blank_count += pattern.find_iter(&text).count();
        text = pattern.replace_all(&text, BLANK_MARKER).into_owned();
    }

    BlankedAnswer {
        text,
        terms,
        blank_count,
    }
}
