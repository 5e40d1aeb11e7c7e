//! Rotation-pattern mini-language.
//!
//! Parses textual rotation patterns (e.g. `N-N-N-OFF-OFF`) into canonical
//! shift-token sequences, renders human-readable summaries for display,
//! and compiles avoid-sequences into a matcher used by the constraint
//! evaluator.
//!
//! # Grammar
//!
//! Tokens are separated by `-`, `,`, or whitespace. The alphabet is
//! `D` (day), `E` (evening), `N` (night), `A` (admin) and `OFF`/`O`,
//! case-insensitive. Unknown tokens are rejected with their position;
//! overly long consecutive-workday runs produce warnings, not errors.
//!
//! # Reference
//! Burke et al. (2004), "The State of the Art of Nurse Rostering"

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::ShiftType;

/// Consecutive non-OFF tokens beyond this length produce a parse warning.
pub const DEFAULT_MAX_CONSECUTIVE_WORKDAYS: usize = 6;

/// A single token in a rotation pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShiftToken {
    /// Day shift (`D`).
    Day,
    /// Evening shift (`E`).
    Evening,
    /// Night shift (`N`).
    Night,
    /// Administrative shift (`A`).
    Admin,
    /// Rest day (`OFF` or `O`).
    Off,
}

impl ShiftToken {
    /// Parses a single token, case-insensitively.
    pub fn parse(text: &str) -> Option<Self> {
        match text.to_ascii_uppercase().as_str() {
            "D" => Some(Self::Day),
            "E" => Some(Self::Evening),
            "N" => Some(Self::Night),
            "A" => Some(Self::Admin),
            "OFF" | "O" => Some(Self::Off),
            _ => None,
        }
    }

    /// Canonical token code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Day => "D",
            Self::Evening => "E",
            Self::Night => "N",
            Self::Admin => "A",
            Self::Off => "OFF",
        }
    }

    /// Whether this token is a rest day.
    #[inline]
    pub fn is_off(&self) -> bool {
        matches!(self, Self::Off)
    }

    /// The shift type this token maps to (`None` for OFF).
    pub fn shift_type(&self) -> Option<ShiftType> {
        match self {
            Self::Day => Some(ShiftType::Day),
            Self::Evening => Some(ShiftType::Evening),
            Self::Night => Some(ShiftType::Night),
            Self::Admin => Some(ShiftType::Admin),
            Self::Off => None,
        }
    }

    /// The token for a shift type.
    pub fn from_shift_type(shift_type: ShiftType) -> Self {
        match shift_type {
            ShiftType::Day => Self::Day,
            ShiftType::Evening => Self::Evening,
            ShiftType::Night => Self::Night,
            ShiftType::Admin => Self::Admin,
        }
    }

    fn noun(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Evening => "evening",
            Self::Night => "night",
            Self::Admin => "admin",
            Self::Off => "off",
        }
    }

    fn pluralizes(&self) -> bool {
        matches!(self, Self::Day | Self::Evening | Self::Night)
    }
}

/// Error for a token outside the pattern alphabet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown pattern token `{token}` at position {position}")]
pub struct PatternError {
    /// The offending token text.
    pub token: String,
    /// Zero-based token index within the pattern.
    pub position: usize,
}

/// Advisory finding attached to an otherwise valid pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternWarning {
    /// Human-readable description.
    pub message: String,
    /// Zero-based token index where the finding starts.
    pub position: usize,
}

/// A successfully parsed pattern with any advisory warnings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedPattern {
    /// Canonical token sequence.
    pub tokens: Vec<ShiftToken>,
    /// Warnings (e.g. excessive consecutive workdays). Never fatal.
    pub warnings: Vec<PatternWarning>,
}

/// Parses a pattern using [`DEFAULT_MAX_CONSECUTIVE_WORKDAYS`].
pub fn parse_pattern(text: &str) -> Result<ParsedPattern, PatternError> {
    parse_pattern_with(text, DEFAULT_MAX_CONSECUTIVE_WORKDAYS)
}

/// Parses a pattern with a custom consecutive-workday warning threshold.
///
/// Empty segments produced by repeated separators are skipped, so
/// `"N - N , OFF"` and `"N-N-OFF"` parse identically.
pub fn parse_pattern_with(
    text: &str,
    max_consecutive: usize,
) -> Result<ParsedPattern, PatternError> {
    let mut tokens = Vec::new();
    let raw = text
        .split(|c: char| c == '-' || c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty());

    for (position, piece) in raw.enumerate() {
        match ShiftToken::parse(piece) {
            Some(token) => tokens.push(token),
            None => {
                return Err(PatternError {
                    token: piece.to_string(),
                    position,
                })
            }
        }
    }

    let warnings = consecutive_warnings(&tokens, max_consecutive);
    Ok(ParsedPattern { tokens, warnings })
}

fn consecutive_warnings(tokens: &[ShiftToken], max_consecutive: usize) -> Vec<PatternWarning> {
    let mut warnings = Vec::new();
    let mut run_start = 0usize;
    let mut run_len = 0usize;

    for (i, token) in tokens.iter().enumerate() {
        if token.is_off() {
            if run_len > max_consecutive {
                warnings.push(run_warning(run_start, run_len, max_consecutive));
            }
            run_len = 0;
        } else {
            if run_len == 0 {
                run_start = i;
            }
            run_len += 1;
        }
    }
    if run_len > max_consecutive {
        warnings.push(run_warning(run_start, run_len, max_consecutive));
    }
    warnings
}

fn run_warning(start: usize, len: usize, max: usize) -> PatternWarning {
    PatternWarning {
        message: format!("{len} consecutive workdays exceed the threshold of {max}"),
        position: start,
    }
}

/// Renders a human-readable summary of a token sequence.
///
/// Run-length encodes the sequence: `[N, N, N, OFF, OFF]` becomes
/// `"3 nights then 2 off"`. Stable for a fixed sequence.
pub fn describe_pattern(tokens: &[ShiftToken]) -> String {
    if tokens.is_empty() {
        return "empty pattern".to_string();
    }

    let mut parts: Vec<String> = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i];
        let mut count = 1;
        while i + count < tokens.len() && tokens[i + count] == token {
            count += 1;
        }
        let noun = token.noun();
        if count > 1 && token.pluralizes() {
            parts.push(format!("{count} {noun}s"));
        } else {
            parts.push(format!("{count} {noun}"));
        }
        i += count;
    }
    parts.join(" then ")
}

/// A match of an avoid sequence inside a realized shift sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvoidMatch {
    /// Zero-based day index where the match begins.
    pub start: usize,
    /// Index of the matched sequence within the matcher.
    pub pattern_index: usize,
    /// Length of the matched sequence.
    pub len: usize,
}

/// Compiled lookup over a set of forbidden consecutive shift sequences.
///
/// Sequences are short (a handful of tokens), so matching is a direct
/// windowed scan over the realized sequence.
#[derive(Debug, Clone, Default)]
pub struct AvoidMatcher {
    sequences: Vec<Vec<ShiftToken>>,
}

impl AvoidMatcher {
    /// Compiles a matcher, discarding empty sequences.
    pub fn new(sequences: Vec<Vec<ShiftToken>>) -> Self {
        Self {
            sequences: sequences.into_iter().filter(|s| !s.is_empty()).collect(),
        }
    }

    /// Whether the matcher holds no sequences.
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Finds every occurrence of every avoid sequence, in day order.
    pub fn find_matches(&self, realized: &[ShiftToken]) -> Vec<AvoidMatch> {
        let mut matches = Vec::new();
        for start in 0..realized.len() {
            for (pattern_index, seq) in self.sequences.iter().enumerate() {
                if start + seq.len() <= realized.len()
                    && realized[start..start + seq.len()] == seq[..]
                {
                    matches.push(AvoidMatch {
                        start,
                        pattern_index,
                        len: seq.len(),
                    });
                }
            }
        }
        matches
    }

    /// Human-readable summary of one compiled sequence.
    pub fn describe(&self, pattern_index: usize) -> String {
        self.sequences
            .get(pattern_index)
            .map(|s| describe_pattern(s))
            .unwrap_or_else(|| "unknown pattern".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_pattern() {
        let parsed = parse_pattern("N-N-N-OFF-OFF").unwrap();
        assert_eq!(
            parsed.tokens,
            vec![
                ShiftToken::Night,
                ShiftToken::Night,
                ShiftToken::Night,
                ShiftToken::Off,
                ShiftToken::Off
            ]
        );
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn test_parse_mixed_separators_and_case() {
        let parsed = parse_pattern("d, e  n-o").unwrap();
        assert_eq!(
            parsed.tokens,
            vec![
                ShiftToken::Day,
                ShiftToken::Evening,
                ShiftToken::Night,
                ShiftToken::Off
            ]
        );
    }

    #[test]
    fn test_parse_rejects_unknown_token_with_position() {
        let err = parse_pattern("N-N-X-OFF").unwrap_err();
        assert_eq!(err.token, "X");
        assert_eq!(err.position, 2);
        assert!(err.to_string().contains("`X`"));
        assert!(err.to_string().contains("position 2"));
    }

    #[test]
    fn test_parse_empty_text() {
        let parsed = parse_pattern("").unwrap();
        assert!(parsed.tokens.is_empty());
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn test_consecutive_workday_warning() {
        let parsed = parse_pattern("D-D-D-D-D-D-D-OFF").unwrap();
        assert_eq!(parsed.warnings.len(), 1);
        assert_eq!(parsed.warnings[0].position, 0);
        assert!(parsed.warnings[0].message.contains('7'));
    }

    #[test]
    fn test_warning_threshold_configurable() {
        let parsed = parse_pattern_with("N-N-N-OFF", 2).unwrap();
        assert_eq!(parsed.warnings.len(), 1);

        let quiet = parse_pattern_with("N-N-N-OFF", 3).unwrap();
        assert!(quiet.warnings.is_empty());
    }

    #[test]
    fn test_trailing_run_warned() {
        let parsed = parse_pattern_with("OFF-D-D-D", 2).unwrap();
        assert_eq!(parsed.warnings.len(), 1);
        assert_eq!(parsed.warnings[0].position, 1);
    }

    #[test]
    fn test_describe_pattern() {
        let tokens = parse_pattern("N-N-N-OFF-OFF").unwrap().tokens;
        assert_eq!(describe_pattern(&tokens), "3 nights then 2 off");

        let tokens = parse_pattern("D-E-OFF").unwrap().tokens;
        assert_eq!(describe_pattern(&tokens), "1 day then 1 evening then 1 off");

        let tokens = parse_pattern("A-A").unwrap().tokens;
        assert_eq!(describe_pattern(&tokens), "2 admin");
    }

    #[test]
    fn test_describe_empty() {
        assert_eq!(describe_pattern(&[]), "empty pattern");
    }

    #[test]
    fn test_describe_is_idempotent_over_reparse() {
        for text in ["N-N-OFF", "d,e,n,a,off", "D - D - OFF"] {
            let first = parse_pattern(text).unwrap().tokens;
            let described = describe_pattern(&first);
            assert_eq!(described, describe_pattern(&first.clone()));
            let again = parse_pattern(text).unwrap().tokens;
            assert_eq!(describe_pattern(&again), described);
        }
    }

    #[test]
    fn test_token_round_trip_codes() {
        for token in [
            ShiftToken::Day,
            ShiftToken::Evening,
            ShiftToken::Night,
            ShiftToken::Admin,
            ShiftToken::Off,
        ] {
            assert_eq!(ShiftToken::parse(token.code()), Some(token));
        }
        assert_eq!(ShiftToken::parse("o"), Some(ShiftToken::Off));
    }

    #[test]
    fn test_avoid_matcher_finds_sequences() {
        let avoid = vec![parse_pattern("N-D").unwrap().tokens];
        let matcher = AvoidMatcher::new(avoid);
        let realized = parse_pattern("N-D-OFF-N-D").unwrap().tokens;

        let matches = matcher.find_matches(&realized);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].start, 0);
        assert_eq!(matches[1].start, 3);
        assert_eq!(matcher.describe(0), "1 night then 1 day");
    }

    #[test]
    fn test_avoid_matcher_multiple_patterns() {
        let matcher = AvoidMatcher::new(vec![
            parse_pattern("N-E").unwrap().tokens,
            parse_pattern("E-D").unwrap().tokens,
        ]);
        let realized = parse_pattern("N-E-D").unwrap().tokens;

        let matches = matcher.find_matches(&realized);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].pattern_index, 0);
        assert_eq!(matches[1].pattern_index, 1);
    }

    #[test]
    fn test_avoid_matcher_ignores_empty_sequences() {
        let matcher = AvoidMatcher::new(vec![vec![]]);
        assert!(matcher.is_empty());
        assert!(matcher.find_matches(&[ShiftToken::Day]).is_empty());
    }
}
