//! Splits a delimited PCRE source string `DpatternDflags` into its three
//! parts.
//!
//! The opening delimiter is always the first byte of the source; paired
//! bracket delimiters (`(`, `[`, `{`, `<`) close with their mirror image,
//! every other delimiter closes with itself. The closing delimiter is the
//! rightmost *unescaped* occurrence (an odd run of backslashes immediately
//! before it marks it escaped); everything strictly between the delimiters
//! is the pattern body, everything after the close is the flag string.

use crate::error::{PcreError, SourceError};

fn closing_for(opening: u8) -> u8 {
    match opening {
        b'(' => b')',
        b'[' => b']',
        b'{' => b'}',
        b'<' => b'>',
        other => other,
    }
}

/// Split `source` into `(pattern, flags, delimiter)`. `allowed_flags` is
/// the exact alphabet [`crate::config::Config::allowed_flags`] accepts.
pub fn split(source: &str, allowed_flags: &str) -> Result<(String, String, char), SourceError> {
    if source.len() < 2 {
        return Err(SourceError::new(
            PcreError::Delimiter("source is too short to contain a delimiter pair".to_string()),
            Some(0),
            source,
        ));
    }

    let bytes = source.as_bytes();
    let opening = bytes[0];
    if opening.is_ascii_alphanumeric() || opening.is_ascii_whitespace() || opening == b'\\' {
        return Err(SourceError::new(
            PcreError::Delimiter(format!(
                "'{}' is not a valid pattern delimiter",
                opening as char
            )),
            Some(0),
            source,
        ));
    }
    let delimiter = opening as char;
    let closing = closing_for(opening);

    let mut close_at = None;
    let mut i = bytes.len();
    while i > 1 {
        i -= 1;
        if bytes[i] == closing {
            let mut j = i;
            let mut backslashes = 0usize;
            while j > 0 && bytes[j - 1] == b'\\' {
                backslashes += 1;
                j -= 1;
            }
            if backslashes % 2 == 0 {
                close_at = Some(i);
                break;
            }
        }
    }

    let close_at = close_at.ok_or_else(|| {
        SourceError::new(
            PcreError::Delimiter(format!(
                "no closing delimiter '{}' found",
                closing as char
            )),
            Some(source.len()),
            source,
        )
    })?;

    let pattern = source[1..close_at].to_string();
    let flag_str = &source[close_at + 1..];

    let mut offending = String::new();
    let mut first_offset = None;
    for (offset, ch) in flag_str.char_indices() {
        if !allowed_flags.contains(ch) {
            if first_offset.is_none() {
                first_offset = Some(close_at + 1 + offset);
            }
            offending.push(ch);
        }
    }
    if !offending.is_empty() {
        return Err(SourceError::new(
            PcreError::Flag(format!("unsupported flag character(s): '{offending}'")),
            first_offset,
            source,
        ));
    }

    Ok((pattern, flag_str.to_string(), delimiter))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLAGS: &str = "imsxADSUXJunr";

    #[test]
    fn splits_simple_alternation_pattern() {
        let (pattern, flags, delim) = split("/a|b/i", FLAGS).unwrap();
        assert_eq!(pattern, "a|b");
        assert_eq!(flags, "i");
        assert_eq!(delim, '/');
    }

    #[test]
    fn paired_brace_delimiter_scans_for_escaped_close() {
        let (pattern, flags, delim) = split(r"{a(b\}c)d}", FLAGS).unwrap();
        assert_eq!(pattern, r"a(b\}c)d");
        assert_eq!(flags, "");
        assert_eq!(delim, '{');
    }

    #[test]
    fn paired_angle_delimiter_closes_with_mirror() {
        let (pattern, _, delim) = split("<abc>", FLAGS).unwrap();
        assert_eq!(pattern, "abc");
        assert_eq!(delim, '<');
    }

    #[test]
    fn rejects_source_shorter_than_two_bytes() {
        assert!(matches!(
            split("/", FLAGS).unwrap_err().error,
            PcreError::Delimiter(_)
        ));
    }

    #[test]
    fn rejects_missing_closing_delimiter() {
        assert!(matches!(
            split("/abc", FLAGS).unwrap_err().error,
            PcreError::Delimiter(_)
        ));
    }

    #[test]
    fn rejects_unsupported_flag_characters() {
        let err = split("/abc/q", FLAGS).unwrap_err();
        assert!(matches!(err.error, PcreError::Flag(_)));
        assert_eq!(err.offset, Some(5));
    }
}
