//! Text and category normalization shared by rule compilation and scanning.

/// Lower-case, replace every non-alphanumeric character with a space and
/// collapse whitespace
pub fn normalize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for ch in text.chars() {
        if ch.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_space = true;
        }
    }

    out
}

/// Lower-case and drop everything that is not alphanumeric
///
/// `Personal_Finance`, `personal finance` and `PersonalFinance` all
/// normalize to `personalfinance`.
pub fn normalize_category(category: &str) -> String {
    category
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Normalized text prepared for whole-word phrase lookups
#[derive(Debug, Clone)]
pub struct NormalizedText {
    padded: String,
    word_count: usize,
}

impl NormalizedText {
    pub fn new(raw: &str) -> Self {
        let normalized = normalize_text(raw);
        let word_count = normalized.split(' ').filter(|w| !w.is_empty()).count();
        Self {
            padded: format!(" {} ", normalized),
            word_count,
        }
    }

    /// Whether an already-normalized phrase occurs on word boundaries
    pub fn contains_phrase(&self, phrase: &str) -> bool {
        if phrase.is_empty() {
            return false;
        }
        self.padded.contains(&format!(" {} ", phrase))
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }
}
