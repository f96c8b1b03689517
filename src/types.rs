/// One segmented citation record, prior to resolution.
///
/// `label` is the citation key from the source document (the braced alias
/// after `\bibitem`); `raw` is the unstructured free-text citation content.
/// A malformed fragment yields an empty `label` with the whole fragment as
/// `raw` — it still flows through resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibItem {
    pub label: String,
    pub raw: String,
}

/// How a record was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedVia {
    /// Content negotiation against the candidate's persistent identifier.
    ContentNegotiation,
    /// Built from the search candidate's structured metadata.
    SearchMetadata,
    /// Synthesized from the raw text (no usable search candidate).
    Synthesized,
}

/// The final record text for one BibItem, with the original label
/// substituted back in.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub label: String,
    pub text: String,
    pub via: ResolvedVia,
}
