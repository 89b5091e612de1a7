//! Hashtag input handling.
//!
//! Tags are compared by exact string equality including the `#` prefix. Case and
//! accents are kept as typed, so `#AI` and `#ai` are two different tags.

/// Key events the composer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Comma,
    Backspace,
    Char(char),
    Other,
}

/// Ordered, de-duplicated list of `#`-prefixed tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HashtagComposer {
    tags: Vec<String>,
}

impl HashtagComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one key event to the tag list. Returns true when the list changed.
    ///
    /// Enter and comma commit the buffer as a tag and clear it. Backspace on an
    /// empty buffer removes the last tag. Editing the buffer for any other key is
    /// left to the caller.
    pub fn on_key(&mut self, buffer: &mut String, key: Key) -> bool {
        match key {
            Key::Enter | Key::Comma => {
                let trimmed = buffer.trim();
                let tag = trimmed.strip_prefix('#').unwrap_or(trimmed);
                if tag.is_empty() {
                    return false;
                }
                let tag = format!("#{}", tag);
                if self.tags.contains(&tag) {
                    tracing::debug!(tag = %tag, "Duplicate hashtag ignored");
                    return false;
                }
                self.tags.push(tag);
                buffer.clear();
                true
            }
            Key::Backspace if buffer.is_empty() => self.tags.pop().is_some(),
            _ => false,
        }
    }

    /// Remove an exact-match tag. Returns true when it was present.
    pub fn remove(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t != tag);
        self.tags.len() != before
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn clear(&mut self) {
        self.tags.clear();
    }
}
