/// Rewrites every positional placeholder (`$` followed by digits) in `sql`
/// so they read `$1, $2, ...` in order of appearance.
///
/// Fragments are rendered independently and each starts counting at `$1`;
/// renumbering the combined text restores one continuous sequence. The
/// original numbers are ignored. A `$` that is not followed by a digit, or
/// that continues an identifier such as `price$1`, is copied as-is.
pub fn renumber(sql: &str) -> String {
    let bytes = sql.as_bytes();
    let mut out = String::with_capacity(sql.len() + 8);
    let mut counter = 0usize;
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'$' || (i > 0 && is_identifier_byte(bytes[i - 1])) {
            i += 1;
            continue;
        }

        let digits_start = i + 1;
        let mut end = digits_start;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }

        if end == digits_start {
            i += 1;
            continue;
        }

        counter += 1;
        out.push_str(&sql[copied..i]);
        out.push('$');
        out.push_str(&counter.to_string());
        copied = end;
        i = end;
    }

    out.push_str(&sql[copied..]);
    out
}

// PostgreSQL identifiers may contain `$` after their first character.
fn is_identifier_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || !b.is_ascii()
}

/// Counts the positional placeholders in `sql`.
#[cfg(test)]
pub(crate) fn count(sql: &str) -> usize {
    let bytes = sql.as_bytes();
    bytes
        .iter()
        .enumerate()
        .filter(|&(i, &b)| {
            b == b'$'
                && bytes.get(i + 1).is_some_and(u8::is_ascii_digit)
                && (i == 0 || !is_identifier_byte(bytes[i - 1]))
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renumber_sequences_duplicates() {
        assert_eq!(
            renumber("(a = $1) AND (b = $1)"),
            "(a = $1) AND (b = $2)"
        );
    }

    #[test]
    fn test_renumber_ignores_original_numbers() {
        assert_eq!(
            renumber("a = $7 OR b = $3 OR c = $12"),
            "a = $1 OR b = $2 OR c = $3"
        );
    }

    #[test]
    fn test_renumber_without_placeholders_is_unchanged() {
        assert_eq!(renumber(""), "");
        assert_eq!(renumber("SELECT id FROM s.t"), "SELECT id FROM s.t");
    }

    #[test]
    fn test_renumber_is_idempotent() {
        let once = renumber("(x = $1) AND ((y < $1) OR (z > $1))");
        assert_eq!(once, "(x = $1) AND ((y < $2) OR (z > $3))");
        assert_eq!(renumber(&once), once);
    }

    #[test]
    fn test_renumber_placeholder_at_end_of_input() {
        assert_eq!(renumber("a = $9"), "a = $1");
        assert_eq!(renumber("a = $"), "a = $");
        assert_eq!(renumber("$"), "$");
    }

    #[test]
    fn test_renumber_multi_digit_runs() {
        let sql = (0..12)
            .map(|_| "c = $1".to_string())
            .collect::<Vec<_>>()
            .join(" AND ");
        let renumbered = renumber(&sql);
        assert!(renumbered.starts_with("c = $1 AND c = $2 AND"));
        assert!(renumbered.ends_with("c = $11 AND c = $12"));
        assert_eq!(renumber(&renumbered), renumbered);
    }

    #[test]
    fn test_renumber_leaves_identifiers_alone() {
        assert_eq!(
            renumber("(price$1 = $1) AND (b = $1)"),
            "(price$1 = $1) AND (b = $2)"
        );
        assert_eq!(renumber("s.t_$2 WHERE x$$3 < $4"), "s.t_$2 WHERE x$$3 < $1");
        assert_eq!(renumber("($3)"), "($1)");
    }

    #[test]
    fn test_count() {
        assert_eq!(count("a = $1 AND b = $20 AND c = $"), 2);
        assert_eq!(count("price$1 = $1"), 1);
        assert_eq!(count("$1"), 1);
        assert_eq!(count(""), 0);
    }
}
