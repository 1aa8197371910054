//! Keystroke masking for `DD/MM/YYYY` text.
//!
//! The mask is purely textual: it keeps at most eight digits, places the two
//! separators and works out where the caret should land. Calendar validity is
//! the validator's job.

pub const MAX_DIGITS: usize = 8;
pub const SEPARATOR: char = '/';

/// Digits typed so far plus the caret position in the formatted text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaskState {
    digits: String,
    cursor: usize,
}

impl MaskState {
    pub fn from_text(text: &str) -> Self {
        let digits = extract_digits(text);
        let cursor = format_digits(&digits).len();
        Self { digits, cursor }
    }

    pub fn digits(&self) -> &str {
        &self.digits
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn formatted(&self) -> String {
        format_digits(&self.digits)
    }

    pub fn is_complete(&self) -> bool {
        self.digits.len() == MAX_DIGITS
    }

    /// Runs one edit through the mask and returns the new caret position.
    pub fn apply(&mut self, raw: &str, cursor: usize) -> usize {
        let (formatted, cursor) = apply_input(&self.formatted(), raw, cursor);
        self.digits = extract_digits(&formatted);
        self.cursor = cursor;
        cursor
    }
}

/// Masks `raw` and returns the formatted text with the caret relocated.
///
/// `cursor` is the caret index inside `raw` as the field reported it after the
/// edit, counted in characters.
pub fn apply_input(previous: &str, raw: &str, cursor: usize) -> (String, usize) {
    let formatted = format_digits(&extract_digits(raw));
    let mut next = cursor;

    if formatted != previous {
        let formatted_len = formatted.chars().count();
        let previous_len = previous.chars().count();

        if formatted_len > previous_len {
            if next == 3 && char_at(&formatted, 2) == Some(SEPARATOR) {
                next = 4;
            } else if next == 6 && char_at(&formatted, 5) == Some(SEPARATOR) {
                next = 7;
            }
        } else if formatted_len < previous_len
            && next.checked_sub(1).and_then(|i| char_at(&formatted, i)) == Some(SEPARATOR)
        {
            // Leave the caret before the separator so the next backspace
            // removes a digit.
            next -= 1;
        }
    }

    let cursor = next.min(formatted.len());
    (formatted, cursor)
}

pub fn extract_digits(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_digit)
        .take(MAX_DIGITS)
        .collect()
}

/// Inserts separators after the day and month groups.
pub fn format_digits(digits: &str) -> String {
    let mut out = String::with_capacity(MAX_DIGITS + 2);
    for (idx, ch) in digits.chars().take(MAX_DIGITS).enumerate() {
        if idx == 2 || idx == 4 {
            out.push(SEPARATOR);
        }
        out.push(ch);
    }
    out
}

fn char_at(text: &str, idx: usize) -> Option<char> {
    text.chars().nth(idx)
}
