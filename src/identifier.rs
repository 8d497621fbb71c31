//! Setting identifier parsing.
//!
//! A flat identifier such as `"mail.smtp.host"` is split on its last `.`
//! into the category `"mail.smtp"` and the name `"host"`. Identifiers
//! without a separator belong to [`DEFAULT_CATEGORY`].
//!
//! Every dot-delimited segment must be a *label*: a letter, `_` or a byte in
//! `0x7f..=0xff`, followed by any number of letters, digits, `_` or bytes in
//! `0x7f..=0xff`. Any non-ASCII character therefore counts as a label
//! character.
//!
//! ```
//! use settings_kit::identifier::split;
//!
//! let id = split("mail.smtp.host").unwrap();
//! assert_eq!(id.category, "mail.smtp");
//! assert_eq!(id.name, "host");
//!
//! assert_eq!(split("debug").unwrap().category, "settings");
//! assert!(split("mail..host").is_none());
//! ```

use crate::error::{Error, Result};
use std::fmt;

/// Category used for identifiers without a separator.
pub const DEFAULT_CATEGORY: &str = "settings";

/// Separator between category segments and the setting name.
pub const SEPARATOR: char = '.';

/// A setting identifier decomposed into category and name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SettingIdentifier {
    pub category: String,
    pub name: String,
}

impl SettingIdentifier {
    /// Split `identifier`, failing with [`Error::InvalidName`] when it does
    /// not satisfy the label grammar.
    pub fn parse(identifier: &str) -> Result<Self> {
        split(identifier).ok_or_else(|| Error::InvalidName(identifier.to_string()))
    }
}

impl fmt::Display for SettingIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.category, SEPARATOR, self.name)
    }
}

fn is_label_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b >= 0x7f
}

fn is_label_continue(b: u8) -> bool {
    is_label_start(b) || b.is_ascii_digit()
}

/// Check a single segment against the label grammar.
pub fn is_valid_label(label: &str) -> bool {
    match label.as_bytes().split_first() {
        Some((&first, rest)) => {
            is_label_start(first) && rest.iter().all(|&b| is_label_continue(b))
        }
        None => false,
    }
}

/// Split a flat identifier into category and name.
///
/// Returns `None` for the empty string, leading/trailing or doubled
/// separators and invalid characters. Never fails otherwise; callers decide
/// how to surface an invalid identifier.
pub fn split(identifier: &str) -> Option<SettingIdentifier> {
    if !identifier.split(SEPARATOR).all(is_valid_label) {
        return None;
    }

    let (category, name) = match identifier.rfind(SEPARATOR) {
        Some(pos) => (&identifier[..pos], &identifier[pos + 1..]),
        None => (DEFAULT_CATEGORY, identifier),
    };

    Some(SettingIdentifier {
        category: category.to_string(),
        name: name.to_string(),
    })
}

/// Validate a category name such as `"mail.smtp"`.
///
/// Categories follow the same grammar as full identifiers.
pub fn validate_category(category: &str) -> Result<()> {
    if split(category).is_some() {
        Ok(())
    } else {
        Err(Error::InvalidName(category.to_string()))
    }
}
