/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

use thiserror::Error;

/// A grammar failure, carrying the offending input and the adapter's reason.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to parse {input:?}: {reason}")]
pub struct ParseError {
    input: String,
    reason: String,
}

impl ParseError {
    pub fn new(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Returns the raw text that failed to parse.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Returns the reason reported by the grammar adapter.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Specialized Result type for field parsing.
pub type Result<T> = std::result::Result<T, ParseError>;

#[cfg(test)]
mod tests {
    use super::ParseError;

    #[test]
    fn error_display() {
        let err = ParseError::new("sam@", "empty domain");
        assert_eq!(err.to_string(), "failed to parse \"sam@\": empty domain");
        assert_eq!(err.input(), "sam@");
        assert_eq!(err.reason(), "empty domain");
    }
}
