//! Best-effort recovery of JSON from free-form model output.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::errors::ParseError;

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[A-Za-z]*\s*(.*?)\s*```").expect("CODE_FENCE is a valid regex pattern")
});

static TRAILING_COMMA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r",\s*([}\]])").expect("TRAILING_COMMA is a valid regex pattern")
});

/// Parses `text` as JSON, falling back to a series of repairs.
///
/// Repairs, in order: strip markdown code fences; collect the balanced
/// `{...}` objects in the text and join them into one array; normalise
/// smart/single quotes and trailing commas, then try both again.
pub fn repair_and_parse(text: &str) -> Result<Value, ParseError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ParseError("no content".to_string()));
    }

    let first_error = match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => return Ok(value),
        Err(err) => err,
    };

    let unfenced = strip_code_fences(trimmed);
    if let Some(value) = parse_candidates(&unfenced) {
        return Ok(value);
    }

    let normalized = normalize_quotes(&unfenced);
    if let Some(value) = parse_candidates(&normalized) {
        return Ok(value);
    }

    Err(ParseError(format!(
        "response is not valid JSON ({}); return only the JSON with no surrounding prose",
        first_error
    )))
}

fn parse_candidates(text: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Some(value);
    }

    let objects = collect_objects(text);
    match objects.as_slice() {
        [] => None,
        [(start, object)] => {
            let value: Value = serde_json::from_str(object).ok()?;
            // An object that sat inside `[...]` in the original text stays an array.
            if text[..*start].contains('[') {
                Some(Value::Array(vec![value]))
            } else {
                Some(value)
            }
        }
        _ => {
            let joined: Vec<&str> = objects.iter().map(|(_, o)| *o).collect();
            serde_json::from_str(&format!("[{}]", joined.join(",\n"))).ok()
        }
    }
}

fn strip_code_fences(text: &str) -> String {
    let bodies: Vec<&str> = CODE_FENCE
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();

    if bodies.is_empty() {
        text.trim_matches('`').trim().to_string()
    } else {
        bodies.join("\n")
    }
}

/// Returns every top-level balanced `{...}` slice with its byte offset,
/// ignoring braces in strings.
fn collect_objects(text: &str) -> Vec<(usize, &str)> {
    let mut objects = Vec::new();
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start.take() {
                        objects.push((s, &text[s..=i]));
                    }
                }
            }
            _ => {}
        }
    }

    objects
}

fn normalize_quotes(text: &str) -> String {
    let text = text
        .replace(['\u{201c}', '\u{201d}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    let text = if !text.contains('"') && text.contains('\'') {
        text.replace('\'', "\"")
    } else {
        text
    };

    TRAILING_COMMA.replace_all(&text, "$1").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_json_parses_directly() {
        let value = repair_and_parse(r#"{"question": "q", "answer": "a"}"#).unwrap();
        assert_eq!(value, json!({"question": "q", "answer": "a"}));
    }

    #[test]
    fn empty_response_is_no_content() {
        assert_eq!(repair_and_parse("  \n").unwrap_err().0, "no content");
    }

    #[test]
    fn code_fences_are_stripped() {
        let text = "Here you go:\n```json\n[{\"question\": \"q\", \"answer\": \"a\"}]\n```\nEnjoy!";

        let value = repair_and_parse(text).unwrap();
        assert_eq!(value, json!([{"question": "q", "answer": "a"}]));
    }

    #[test]
    fn newline_delimited_objects_become_an_array() {
        let text = "{\"question\": \"q1\", \"answer\": \"a1\"}\n{\"question\": \"q2\", \"answer\": \"a2\"}";

        let value = repair_and_parse(text).unwrap();
        assert_eq!(
            value,
            json!([
                {"question": "q1", "answer": "a1"},
                {"question": "q2", "answer": "a2"}
            ])
        );
    }

    #[test]
    fn prose_wrapped_single_element_array_stays_an_array() {
        let text = "Here is your question: [{\"question\": \"q\", \"answer\": \"a\"}] Good luck!";

        let value = repair_and_parse(text).unwrap();
        assert_eq!(value, json!([{"question": "q", "answer": "a"}]));
    }

    #[test]
    fn braces_inside_strings_do_not_split_objects() {
        let text = "Result: {\"question\": \"what is {x}?\", \"answer\": \"}\"} done";

        let value = repair_and_parse(text).unwrap();
        assert_eq!(value, json!({"question": "what is {x}?", "answer": "}"}));
    }

    #[test]
    fn single_quotes_and_trailing_commas_are_repaired() {
        let text = "{'question': 'q', 'answer': 'a',}";

        let value = repair_and_parse(text).unwrap();
        assert_eq!(value, json!({"question": "q", "answer": "a"}));
    }

    #[test]
    fn prose_without_json_fails_with_reason() {
        let err = repair_and_parse("I cannot help with that.").unwrap_err();
        assert!(err.0.contains("not valid JSON"));
    }
}
