//! Lenient extraction of a JSON payload from free-form model output

/// Slice from the first `open` to the last `close`, inclusive
///
/// Returns `None` when either delimiter is missing or the last `close`
/// comes before the first `open`. Nesting is not checked; the decoder that
/// consumes the slice decides whether it is valid.
pub fn extract_balanced(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    if end < start {
        return None;
    }
    Some(&text[start..end + close.len_utf8()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_object_with_surrounding_prose() {
        let text = "Sure! Here you go: {\"a\": {\"b\": 1}} Hope that helps.";
        assert_eq!(extract_balanced(text, '{', '}'), Some("{\"a\": {\"b\": 1}}"));
    }

    #[test]
    fn test_extracts_array() {
        let text = "```json\n[{\"id\": \"x\"}, {\"id\": \"y\"}]\n```";
        assert_eq!(extract_balanced(text, '[', ']'), Some("[{\"id\": \"x\"}, {\"id\": \"y\"}]"));
    }

    #[test]
    fn test_missing_delimiters() {
        assert_eq!(extract_balanced("no json here", '{', '}'), None);
        assert_eq!(extract_balanced("only { open", '{', '}'), None);
        assert_eq!(extract_balanced("only } close", '{', '}'), None);
    }

    #[test]
    fn test_close_before_open() {
        assert_eq!(extract_balanced("} then {", '{', '}'), None);
    }

    #[test]
    fn test_spans_first_open_to_last_close() {
        // Two separate objects come back as one slice; decoding it fails later
        assert_eq!(extract_balanced("{1} and {2}", '{', '}'), Some("{1} and {2}"));
    }
}
