use crate::types::BibItem;

/// The literal marker that begins each bibliographic entry.
const BIBITEM_MARKER: &str = r"\bibitem";

/// Split raw bibliography text into ordered (label, raw-text) records.
///
/// Fragment order is source appearance order; the text before the first
/// `\bibitem` is always discarded. Fragments with no braced label are not
/// an error — they come back with an empty label and the whole fragment as
/// raw text, and downstream resolution degrades them to `misc` entries.
pub fn segment(raw_text: &str) -> Vec<BibItem> {
    raw_text
        .split(BIBITEM_MARKER)
        .skip(1)
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .map(split_fragment)
        .collect()
}

fn split_fragment(fragment: &str) -> BibItem {
    let body = strip_citation_hint(fragment);
    match extract_braced(&body) {
        Some((label, raw)) => BibItem { label, raw },
        None => BibItem {
            label: String::new(),
            raw: body.trim().to_string(),
        },
    }
}

/// Drop the optional `[...]` citation hint at the head of a fragment.
/// The hint is presentation-only (e.g. `[Doe20]`) — it is not the label.
fn strip_citation_hint(fragment: &str) -> String {
    if !fragment.starts_with('[') {
        return fragment.to_string();
    }
    match fragment.find(']') {
        Some(close) => fragment[close + 1..].trim_start().to_string(),
        None => fragment.to_string(),
    }
}

/// Extract the text between the first `{` and the first `}` after it, and
/// return (label, fragment with that one `{label}` occurrence removed).
fn extract_braced(fragment: &str) -> Option<(String, String)> {
    let open = fragment.find('{')?;
    let close = open + fragment[open..].find('}')?;
    let label = fragment[open + 1..close].to_string();
    let mut rest = String::with_capacity(fragment.len());
    rest.push_str(&fragment[..open]);
    rest.push_str(&fragment[close + 1..]);
    Some((label, rest.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_item_with_hint() {
        let items = segment(r"\bibitem[Doe20]{doe2020} Doe, J. Title. 2020");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].label, "doe2020");
        assert_eq!(items[0].raw, "Doe, J. Title. 2020");
    }

    #[test]
    fn multiple_items_preserve_order() {
        let raw = "\\bibitem{foo1} bar1 \n\\bibitem{foo2} bar2\n\\bibitem{foo3} bar3";
        let items = segment(raw);
        let labels: Vec<&str> = items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, ["foo1", "foo2", "foo3"]);
        assert_eq!(items[0].raw, "bar1");
        assert_eq!(items[2].raw, "bar3");
    }

    #[test]
    fn item_count_matches_delimiter_count() {
        let raw = "preamble\n\\bibitem{a} x\\bibitem{b} y\\bibitem{c} z";
        assert_eq!(segment(raw).len(), raw.matches(r"\bibitem").count());
    }

    #[test]
    fn preamble_discarded() {
        let items = segment("\\providecommand{\\noop}[1]{}\n\\bibitem{k} text");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].label, "k");
    }

    #[test]
    fn malformed_fragment_keeps_full_text() {
        let items = segment(r"\bibitem no braces at all, just text");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].label, "");
        assert_eq!(items[0].raw, "no braces at all, just text");
    }

    #[test]
    fn duplicate_labels_pass_through() {
        let items = segment(r"\bibitem{dup} first \bibitem{dup} second");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].label, "dup");
        assert_eq!(items[1].label, "dup");
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(segment("").is_empty());
        assert!(segment("no delimiters here").is_empty());
    }

    #[test]
    fn multiline_raw_text_kept() {
        let items = segment("\\bibitem{k}\nA. Author,\n\\newblock Title.\n");
        assert_eq!(items[0].raw, "A. Author,\n\\newblock Title.");
    }
}
