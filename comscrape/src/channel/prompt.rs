//! Prompt detection by exact substring match.

use std::fmt;
use std::ops::Range;

use memchr::memmem::Finder;

use crate::error::ChannelError;

/// The string a device prints when it is ready for the next command
/// (e.g. `<H3C>`).
///
/// Matching is plain substring containment; no pattern syntax.
#[derive(Clone)]
pub struct Prompt {
    text: String,
    finder: Finder<'static>,
}

impl Prompt {
    /// Compile a prompt. The prompt must not be empty.
    pub fn new(text: impl Into<String>) -> Result<Self, ChannelError> {
        let text = text.into();
        if text.is_empty() {
            return Err(ChannelError::InvalidPrompt(text));
        }
        let finder = Finder::new(text.as_bytes()).into_owned();
        Ok(Self { text, finder })
    }

    /// Byte range of the first occurrence in `haystack`.
    pub fn find(&self, haystack: &[u8]) -> Option<Range<usize>> {
        self.finder
            .find(haystack)
            .map(|start| start..start + self.text.len())
    }

    /// Check if `haystack` contains the prompt.
    pub fn is_match(&self, haystack: &[u8]) -> bool {
        self.find(haystack).is_some()
    }

    /// Prompt length in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Always false; empty prompts are rejected by [`Prompt::new`].
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// The prompt text.
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Debug for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Prompt").field(&self.text).finish()
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substring_match() {
        let prompt = Prompt::new("<H3C>").unwrap();
        assert!(prompt.is_match(b"<H3C>"));
        assert!(prompt.is_match(b"Slot 1\r\n<H3C>"));
        assert!(prompt.is_match(b"<H3C> trailing"));
        assert!(!prompt.is_match(b"[H3C]"));
        assert_eq!(prompt.find(b"xx<H3C>yy"), Some(2..7));
    }

    #[test]
    fn test_no_pattern_syntax() {
        let prompt = Prompt::new("<H.C>").unwrap();
        assert!(!prompt.is_match(b"<H3C>"));
        assert!(prompt.is_match(b"<H.C>"));
    }

    #[test]
    fn test_empty_prompt_rejected() {
        assert!(matches!(
            Prompt::new(""),
            Err(ChannelError::InvalidPrompt(_))
        ));
    }
}
