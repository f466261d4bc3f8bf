use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Display width of a string; CJK counterparty names take two columns per character.
pub(crate) fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Cut `s` to at most `width` display columns, ending in ".." when cut.
pub(crate) fn truncate_display(s: &str, width: usize) -> String {
    if display_width(s) <= width {
        return s.to_string();
    }
    if width < 3 {
        return s
            .chars()
            .find(|&ch| ch.width().unwrap_or(0) <= width)
            .map(String::from)
            .unwrap_or_default();
    }

    let budget = width - 2;
    let mut used = 0;
    let mut end = 0;
    for (i, ch) in s.char_indices() {
        let cw = ch.width().unwrap_or(0);
        if used + cw > budget {
            break;
        }
        used += cw;
        end = i + ch.len_utf8();
    }
    format!("{}..", &s[..end])
}

/// Pad or truncate to exactly `width` display columns.
pub(crate) fn pad_right(s: &str, width: usize) -> String {
    let sw = display_width(s);
    if sw > width {
        let cut = truncate_display(s, width);
        let cw = display_width(&cut);
        format!("{cut}{}", " ".repeat(width - cw))
    } else {
        format!("{s}{}", " ".repeat(width - sw))
    }
}

/// Two-column table of labels and counts, labels aligned to the widest
/// one (capped at `max_label`).
pub(crate) fn count_table<'a>(
    rows: impl IntoIterator<Item = (&'a str, usize)>,
    max_label: usize,
) -> Vec<String> {
    let rows: Vec<(&str, usize)> = rows.into_iter().collect();
    let label_width = rows
        .iter()
        .map(|(label, _)| display_width(label))
        .max()
        .unwrap_or(0)
        .min(max_label);
    let count_width = rows
        .iter()
        .map(|(_, n)| n.to_string().len())
        .max()
        .unwrap_or(0);
    rows.into_iter()
        .map(|(label, n)| format!("  {}  {n:>count_width$}", pad_right(label, label_width)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_width_cjk() {
        assert_eq!(display_width("ACME"), 4);
        assert_eq!(display_width("应收账款"), 8);
        assert_eq!(display_width(""), 0);
    }

    #[test]
    fn truncate_fits() {
        assert_eq!(truncate_display("ACME", 4), "ACME");
        assert_eq!(truncate_display("ACME", 10), "ACME");
    }

    #[test]
    fn truncate_cuts() {
        assert_eq!(truncate_display("ACMECORP", 6), "ACME..");
        assert_eq!(truncate_display("abc", 2), "a");
    }

    #[test]
    fn truncate_cjk_boundary() {
        // 8 columns into 7: "应收" (4) fits the 5-column budget, "账" would not.
        let t = truncate_display("应收账款", 7);
        assert_eq!(t, "应收..");
        assert!(display_width(&t) <= 7);
    }

    #[test]
    fn pad_right_keeps_exact_width() {
        assert_eq!(pad_right("ab", 5), "ab   ");
        assert_eq!(pad_right("abcde", 5), "abcde");
        assert_eq!(display_width(&pad_right("应收账款", 7)), 7);
    }

    #[test]
    fn count_table_aligns_mixed_width_labels() {
        let lines = count_table([("ACME", 3), ("北京某某", 12)], 40);
        assert_eq!(lines, vec!["  ACME       3", "  北京某某  12"]);
    }

    #[test]
    fn count_table_caps_label_width() {
        let lines = count_table([("ABCDEFGHIJ", 1)], 6);
        assert_eq!(lines, vec!["  ABCD..  1"]);
    }
}
