//! Reply parsing helpers for narration backends
//!
//! Backends hand back a sequence of text segments; only the first one is
//! ever used, and it must contain something other than whitespace.

use crate::error::{Error, Result};

/// Maximum characters of a raw reply echoed into error messages
const RAW_PREVIEW_LEN: usize = 200;

/// Take the first text segment of a reply
pub fn first_text_segment<I>(segments: I) -> Result<String>
where
    I: IntoIterator<Item = Option<String>>,
{
    match segments.into_iter().next() {
        Some(Some(text)) => Ok(text),
        Some(None) => Err(Error::Generation(
            "First reply segment carried no text".into(),
        )),
        None => Err(Error::Generation("Reply contained no text segments".into())),
    }
}

/// Turn a raw generated segment into a hypothesis sentence
///
/// Trims surrounding whitespace; an empty result counts as a failed generation.
pub fn extract_hypothesis(reply: &str) -> Result<String> {
    let trimmed = reply.trim();
    if trimmed.is_empty() {
        return Err(Error::Generation(format!(
            "Empty reply from narration backend | Raw: {:?}",
            preview(reply)
        )));
    }
    Ok(trimmed.to_string())
}

/// Truncate long replies for error messages
pub fn preview(raw: &str) -> String {
    if raw.chars().count() > RAW_PREVIEW_LEN {
        let cut: String = raw.chars().take(RAW_PREVIEW_LEN).collect();
        format!("{}...", cut)
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_text_segment() {
        let segments = vec![Some("first".to_string()), Some("second".to_string())];
        assert_eq!(first_text_segment(segments).unwrap(), "first");
    }

    #[test]
    fn test_first_text_segment_empty() {
        assert!(first_text_segment(Vec::<Option<String>>::new()).is_err());
        assert!(first_text_segment(vec![None, Some("late".to_string())]).is_err());
    }

    #[test]
    fn test_extract_hypothesis_trims() {
        let result = extract_hypothesis("\n  Sardines favour cooler water.  \n").unwrap();
        assert_eq!(result, "Sardines favour cooler water.");
    }

    #[test]
    fn test_extract_hypothesis_rejects_blank() {
        assert!(matches!(
            extract_hypothesis("   \n\t"),
            Err(Error::Generation(_))
        ));
    }

    #[test]
    fn test_preview_truncates() {
        let long = "x".repeat(500);
        let p = preview(&long);
        assert_eq!(p.len(), RAW_PREVIEW_LEN + 3);
        assert!(p.ends_with("..."));
        assert_eq!(preview("short"), "short");
    }
}
