use std::collections::HashMap;

/// The standard bibliographic record taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    Article,
    Book,
    Booklet,
    Conference,
    InBook,
    InCollection,
    InProceedings,
    Manual,
    MastersThesis,
    Misc,
    PhdThesis,
    Proceedings,
    TechReport,
    Unpublished,
}

impl EntryType {
    /// The `@TYPE` tag used in rendered records.
    pub fn tag(self) -> &'static str {
        match self {
            EntryType::Article => "ARTICLE",
            EntryType::Book => "BOOK",
            EntryType::Booklet => "BOOKLET",
            EntryType::Conference => "CONFERENCE",
            EntryType::InBook => "INBOOK",
            EntryType::InCollection => "INCOLLECTION",
            EntryType::InProceedings => "INPROCEEDINGS",
            EntryType::Manual => "MANUAL",
            EntryType::MastersThesis => "MASTERSTHESIS",
            EntryType::Misc => "MISC",
            EntryType::PhdThesis => "PHDTHESIS",
            EntryType::Proceedings => "PROCEEDINGS",
            EntryType::TechReport => "TECHREPORT",
            EntryType::Unpublished => "UNPUBLISHED",
        }
    }
}

/// A constraint over the `required` field list of a schema.
///
/// Empty values count as absent everywhere.
#[derive(Debug, Clone, Copy)]
pub enum FieldConstraint {
    /// The named field must be present.
    Exact(&'static str),
    /// At least one of the named fields must be present; the first present
    /// value is the one used.
    Or(&'static [&'static str]),
    /// Exactly one of the named fields must be present.
    Xor(&'static [&'static str]),
}

impl FieldConstraint {
    /// Resolve this constraint against a field map, returning the single
    /// (name, value) pair that satisfies it, or None if violated.
    fn satisfy<'a>(&self, fields: &'a HashMap<String, String>) -> Option<(&'static str, &'a str)> {
        match self {
            FieldConstraint::Exact(name) => present(fields, name).map(|v| (*name, v)),
            FieldConstraint::Or(names) => names
                .iter()
                .find_map(|name| present(fields, name).map(|v| (*name, v))),
            FieldConstraint::Xor(names) => {
                let mut found = None;
                for name in *names {
                    if let Some(value) = present(fields, name) {
                        if found.is_some() {
                            return None;
                        }
                        found = Some((*name, value));
                    }
                }
                found
            }
        }
    }
}

fn present<'a>(fields: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    fields
        .get(name)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
}

/// Required/optional field lists for one entry type.
pub struct Schema {
    pub required: &'static [FieldConstraint],
    pub optional: &'static [&'static str],
}

use FieldConstraint::{Exact, Or, Xor};

// Field lists per the standard taxonomy (nwalsh.com/tex/texhelp/bibtx-7.html).
pub fn schema(entry_type: EntryType) -> &'static Schema {
    match entry_type {
        EntryType::Article => &Schema {
            required: &[Exact("author"), Exact("title"), Exact("journal"), Exact("year")],
            optional: &["volume", "number", "pages", "month", "note"],
        },
        EntryType::Book => &Schema {
            required: &[Xor(&["author", "editor"]), Exact("title"), Exact("publisher"), Exact("year")],
            optional: &["volume", "series", "address", "edition", "month", "note"],
        },
        EntryType::Booklet => &Schema {
            required: &[Exact("title")],
            optional: &["author", "howpublished", "address", "month", "year", "note"],
        },
        EntryType::Conference | EntryType::InCollection | EntryType::InProceedings => &Schema {
            required: &[Exact("author"), Exact("title"), Exact("booktitle"), Exact("year")],
            optional: &["editor", "pages", "organization", "publisher", "address", "month", "note"],
        },
        EntryType::InBook => &Schema {
            required: &[
                Xor(&["author", "editor"]),
                Exact("title"),
                Or(&["chapter", "pages"]),
                Exact("publisher"),
                Exact("year"),
            ],
            optional: &["volume", "series", "address", "edition", "month", "note"],
        },
        EntryType::Manual => &Schema {
            required: &[Exact("title")],
            optional: &["author", "organization", "address", "edition", "month", "year", "note"],
        },
        EntryType::MastersThesis | EntryType::PhdThesis => &Schema {
            required: &[Exact("author"), Exact("title"), Exact("school"), Exact("year")],
            optional: &["address", "month", "note"],
        },
        EntryType::Misc => &Schema {
            required: &[],
            optional: &["author", "title", "howpublished", "month", "year", "note"],
        },
        EntryType::Proceedings => &Schema {
            required: &[Exact("title"), Exact("year")],
            optional: &["editor", "publisher", "organization", "address", "month", "note"],
        },
        EntryType::TechReport => &Schema {
            required: &[Exact("author"), Exact("title"), Exact("institution"), Exact("year")],
            optional: &["type", "number", "address", "month", "note"],
        },
        EntryType::Unpublished => &Schema {
            required: &[Exact("author"), Exact("title"), Exact("note")],
            optional: &["month", "year"],
        },
    }
}

/// A type-tagged field mapping. Immutable once constructed; validity is
/// computed, never stored.
#[derive(Debug, Clone)]
pub struct Entry {
    entry_type: EntryType,
    fields: HashMap<String, String>,
}

impl Entry {
    pub fn new(entry_type: EntryType, fields: HashMap<String, String>) -> Self {
        Self { entry_type, fields }
    }

    /// True iff every constraint in this type's required list is satisfied.
    /// Violations fail silently — `misc` synthesis is always available as
    /// the terminal fallback, so nothing here ever aborts a run.
    pub fn is_valid(&self) -> bool {
        schema(self.entry_type)
            .required
            .iter()
            .all(|constraint| constraint.satisfy(&self.fields).is_some())
    }

    /// Render canonical text: `@TYPE{label, field = {value}, ...}`.
    /// Required fields first (Or/Xor resolved to the single field that
    /// satisfied them), then present optional fields in schema order.
    /// Absent/empty fields are omitted with no dangling separators.
    pub fn render(&self, label: &str) -> String {
        let schema = schema(self.entry_type);
        let mut parts = Vec::new();
        for constraint in schema.required {
            if let Some((name, value)) = constraint.satisfy(&self.fields) {
                parts.push(format_field(name, value));
            }
        }
        for name in schema.optional {
            if let Some(value) = present(&self.fields, name) {
                parts.push(format_field(name, value));
            }
        }
        if parts.is_empty() {
            format!("@{}{{{}}}", self.entry_type.tag(), label)
        } else {
            format!("@{}{{{},{}}}", self.entry_type.tag(), label, parts.join(","))
        }
    }
}

fn format_field(name: &str, value: &str) -> String {
    format!("\n\t{name} = {{{value}}}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(entry_type: EntryType, pairs: &[(&str, &str)]) -> Entry {
        let fields = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Entry::new(entry_type, fields)
    }

    #[test]
    fn misc_is_always_valid() {
        assert!(entry(EntryType::Misc, &[]).is_valid());
        assert!(entry(EntryType::Misc, &[("note", "anything")]).is_valid());
        assert!(entry(EntryType::Misc, &[("bogus", "field")]).is_valid());
    }

    #[test]
    fn article_requires_all_exact_fields() {
        let complete = entry(
            EntryType::Article,
            &[("author", "a"), ("title", "t"), ("journal", "j"), ("year", "2013")],
        );
        assert!(complete.is_valid());
        let missing_journal =
            entry(EntryType::Article, &[("author", "a"), ("title", "t"), ("year", "2013")]);
        assert!(!missing_journal.is_valid());
    }

    #[test]
    fn book_author_editor_is_exclusive() {
        let base = [("title", "t"), ("publisher", "p"), ("year", "1968")];
        let with = |extra: &[(&str, &str)]| {
            let mut pairs = base.to_vec();
            pairs.extend_from_slice(extra);
            entry(EntryType::Book, &pairs)
        };
        assert!(with(&[("author", "a")]).is_valid());
        assert!(with(&[("editor", "e")]).is_valid());
        assert!(!with(&[]).is_valid());
        assert!(!with(&[("author", "a"), ("editor", "e")]).is_valid());
    }

    #[test]
    fn empty_value_counts_as_absent() {
        let e = entry(
            EntryType::Book,
            &[("author", ""), ("editor", "e"), ("title", "t"), ("publisher", "p"), ("year", "y")],
        );
        assert!(e.is_valid());
    }

    #[test]
    fn inbook_accepts_chapter_or_pages() {
        let base = [("author", "a"), ("title", "t"), ("publisher", "p"), ("year", "y")];
        let with = |extra: &[(&str, &str)]| {
            let mut pairs = base.to_vec();
            pairs.extend_from_slice(extra);
            entry(EntryType::InBook, &pairs)
        };
        assert!(with(&[("chapter", "3")]).is_valid());
        assert!(with(&[("pages", "10--20")]).is_valid());
        assert!(with(&[("chapter", "3"), ("pages", "10--20")]).is_valid());
        assert!(!with(&[]).is_valid());
    }

    #[test]
    fn render_required_first_then_optional() {
        let e = entry(
            EntryType::Article,
            &[("author", "foo"), ("title", "bar"), ("journal", "j"), ("year", "2013"), ("pages", "05--17")],
        );
        let text = e.render("key");
        assert_eq!(
            text,
            "@ARTICLE{key,\n\tauthor = {foo},\n\ttitle = {bar},\n\tjournal = {j},\n\tyear = {2013},\n\tpages = {05--17}}"
        );
    }

    #[test]
    fn render_resolves_xor_to_satisfied_field() {
        let e = entry(
            EntryType::Book,
            &[("editor", "ed"), ("title", "t"), ("publisher", "p"), ("year", "y")],
        );
        let text = e.render("k");
        assert!(text.contains("editor = {ed}"));
        assert!(!text.contains("author"));
    }

    #[test]
    fn render_omits_empty_fields_without_dangling_separators() {
        let e = entry(EntryType::Misc, &[("note", "n"), ("year", "")]);
        assert_eq!(e.render("k"), "@MISC{k,\n\tnote = {n}}");
    }

    #[test]
    fn render_fieldless_entry() {
        assert_eq!(entry(EntryType::Misc, &[]).render("k"), "@MISC{k}");
    }
}
