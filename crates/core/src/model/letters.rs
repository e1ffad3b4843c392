use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Number of letters available for labelling options (`A`..=`Z`).
pub const LETTER_COUNT: usize = 26;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LetterError {
    #[error("option position {position} has no letter (only {LETTER_COUNT} are available)")]
    Exhausted { position: usize },

    #[error("'{0}' is not an option letter")]
    InvalidChar(char),

    #[error("option {letter} does not exist, valid options are A to {last}")]
    OutOfRange { letter: OptionLetter, last: OptionLetter },

    #[error("a question needs at least one option")]
    NoOptions,
}

//
// ─── OPTION LETTER ────────────────────────────────────────────────────────────
//

/// Letter assigned to an answer option by its position (`A` is the first option).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OptionLetter(u8);

impl OptionLetter {
    /// Letter for a zero-based option position.
    ///
    /// # Errors
    ///
    /// Returns `LetterError::Exhausted` for positions past `Z`.
    pub fn from_position(position: usize) -> Result<Self, LetterError> {
        if position >= LETTER_COUNT {
            return Err(LetterError::Exhausted { position });
        }
        u8::try_from(position)
            .map(Self)
            .map_err(|_| LetterError::Exhausted { position })
    }

    /// Letter for a 1-based option index as written in the question source.
    ///
    /// # Errors
    ///
    /// Returns `LetterError::Exhausted` for index 0 or indices past `Z`.
    pub fn from_index(index: u32) -> Result<Self, LetterError> {
        let position = usize::try_from(index)
            .ok()
            .and_then(|index| index.checked_sub(1))
            .ok_or(LetterError::Exhausted { position: usize::MAX })?;
        Self::from_position(position)
    }

    /// Parses a single letter, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `LetterError::InvalidChar` for anything outside `A`..=`Z`.
    pub fn from_char(ch: char) -> Result<Self, LetterError> {
        let upper = ch.to_ascii_uppercase();
        if upper.is_ascii_uppercase() {
            Ok(Self(upper as u8 - b'A'))
        } else {
            Err(LetterError::InvalidChar(ch))
        }
    }

    /// Last valid letter for a question with `option_count` options.
    ///
    /// # Errors
    ///
    /// Returns `LetterError::NoOptions` for zero options and
    /// `LetterError::Exhausted` when the count exceeds the alphabet.
    pub fn last_for(option_count: usize) -> Result<Self, LetterError> {
        let position = option_count.checked_sub(1).ok_or(LetterError::NoOptions)?;
        Self::from_position(position)
    }

    /// Zero-based option position.
    #[must_use]
    pub fn position(&self) -> usize {
        usize::from(self.0)
    }

    #[must_use]
    pub fn as_char(&self) -> char {
        char::from(b'A' + self.0)
    }
}

impl fmt::Debug for OptionLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OptionLetter({})", self.as_char())
    }
}

impl fmt::Display for OptionLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

//
// ─── LETTER SET ───────────────────────────────────────────────────────────────
//

/// Sorted, duplicate-free set of option letters.
///
/// Equality is set equality, so the order in which a user typed the letters never
/// affects scoring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LetterSet(BTreeSet<OptionLetter>);

impl LetterSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses raw answer input for a question with `option_count` options.
    ///
    /// Spaces and commas separate letters; everything else must be a letter valid
    /// for the question. Blank input is an empty selection.
    ///
    /// # Errors
    ///
    /// Returns `LetterError::InvalidChar` for non-letters and
    /// `LetterError::OutOfRange` for letters past the last option.
    pub fn parse_answer(raw: &str, option_count: usize) -> Result<Self, LetterError> {
        let last = OptionLetter::last_for(option_count)?;
        let mut letters = BTreeSet::new();
        for ch in raw.chars() {
            if ch == ',' || ch.is_whitespace() {
                continue;
            }
            let letter = OptionLetter::from_char(ch)?;
            if letter > last {
                return Err(LetterError::OutOfRange { letter, last });
            }
            letters.insert(letter);
        }
        Ok(Self(letters))
    }

    #[must_use]
    pub fn contains(&self, letter: OptionLetter) -> bool {
        self.0.contains(&letter)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = OptionLetter> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<OptionLetter> for LetterSet {
    fn from_iter<T: IntoIterator<Item = OptionLetter>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for LetterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for letter in &self.0 {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{letter}")?;
            first = false;
        }
        Ok(())
    }
}
