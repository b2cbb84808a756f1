//! Tolerant JSON extraction for model output.
//!
//! Models are allowed to wrap their answer in prose or code fences. The
//! extractor walks the text and returns the first balanced, parseable value
//! whose outer bracket matches the requested shape.

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonShape {
    Array,
    Object,
}

impl JsonShape {
    fn open(self) -> char {
        match self {
            JsonShape::Array => '[',
            JsonShape::Object => '{',
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            JsonShape::Array => value.is_array(),
            JsonShape::Object => value.is_object(),
        }
    }
}

/// Return the first well-formed JSON value of `shape` embedded in `text`.
pub fn extract_json(text: &str, shape: JsonShape) -> Option<Value> {
    let open = shape.open();

    text.char_indices()
        .filter(|(_, c)| *c == open)
        .filter_map(|(start, _)| balanced_end(text, start).map(|end| &text[start..end]))
        .find_map(|candidate| {
            serde_json::from_str::<Value>(candidate)
                .ok()
                .filter(|value| shape.matches(value))
        })
}

/// Byte offset one past the bracket that closes the one at `start`.
fn balanced_end(text: &str, start: usize) -> Option<usize> {
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
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
            '[' => stack.push(']'),
            '{' => stack.push('}'),
            ']' | '}' => {
                if stack.pop() != Some(c) {
                    return None;
                }
                if stack.is_empty() {
                    return Some(start + offset + c.len_utf8());
                }
            }
            _ => {}
        }
    }

    None
}
