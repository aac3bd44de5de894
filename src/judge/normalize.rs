//! Output canonicalization for answer comparison
//!
//! Verdicts compare `normalize(actual) == normalize(expected)`, so the
//! normal form has to be insensitive to line-ending flavor and trailing
//! whitespace while preserving everything else.

/// Canonicalize program output for comparison:
/// 1. `\r\n` and lone `\r` become `\n`
/// 2. the whole string is trimmed
/// 3. trailing spaces and tabs are stripped from every line
pub fn normalize_output(s: &str) -> String {
    let s = s.replace("\r\n", "\n").replace('\r', "\n");
    let s = s.trim();

    s.split('\n')
        .map(|line| line.trim_end_matches([' ', '\t']))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_ending_insensitive() {
        assert_eq!(normalize_output("a\r\nb"), normalize_output("a\nb"));
        assert_eq!(normalize_output("a\rb"), normalize_output("a\nb"));
        assert_eq!(normalize_output("a\r\nb\rc\n"), "a\nb\nc");
    }

    #[test]
    fn test_trailing_whitespace_per_line() {
        assert_eq!(normalize_output("1 2  \n3\t\n"), "1 2\n3");
        // leading whitespace inside lines is significant
        assert_eq!(normalize_output("  x\n  y"), "x\n  y");
    }

    #[test]
    fn test_outer_trim() {
        assert_eq!(normalize_output("\n\n7\n\n"), "7");
        assert_eq!(normalize_output("   "), "");
    }

    #[test]
    fn test_idempotent() {
        for s in ["a\r\nb  \n c\t", "", "x", "1\n2\n3\r\n"] {
            let once = normalize_output(s);
            assert_eq!(normalize_output(&once), once);
        }
    }

    #[test]
    fn test_interior_blank_lines_kept() {
        assert_eq!(normalize_output("a\n\nb"), "a\n\nb");
    }
}
