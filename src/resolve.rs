use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::time::Duration;

use serde::Deserialize;

use crate::cache::LookupCache;
use crate::entry::{Entry, EntryType};
use crate::types::{BibItem, Resolution, ResolvedVia};
use crate::unlatexify::unlatexify;

/// A candidate returned by the relevance-ranked search service.
/// Only `doi` is guaranteed; the rest is best-effort metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    pub doi: String,
    #[serde(default)]
    pub title: Option<String>,
    /// The service emits this as either a string or a number.
    #[serde(default)]
    pub year: Option<serde_json::Value>,
    #[serde(default, rename = "fullCitation")]
    pub full_citation: Option<String>,
}

impl Candidate {
    fn year_string(&self) -> Option<String> {
        match self.year.as_ref()? {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

enum SearchOutcome {
    Found(Vec<Candidate>),
    NotFound,
    Skipped, // transient error, don't cache
}

/// Resolves segmented items against the citation search service, with
/// content negotiation and misc synthesis as fallbacks. No per-item
/// failure is ever fatal to the batch.
pub struct Resolver {
    agent: ureq::Agent,
    search_url: String,
    cache: Option<Mutex<LookupCache>>,
}

impl Resolver {
    pub fn new(search_url: String, timeout: Duration, cache: Option<LookupCache>) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_connect(Some(Duration::from_secs(5)))
            .timeout_global(Some(timeout))
            // Non-success statuses are cascade signals here, not errors.
            .http_status_as_error(false)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
            search_url,
            cache: cache.map(Mutex::new),
        }
    }

    /// Resolve every item on a bounded worker pool. Output order equals
    /// item order regardless of completion order.
    pub fn resolve_all(&self, items: &[BibItem], jobs: usize) -> Vec<Resolution> {
        resolve_ordered(items, jobs, |item| self.resolve(item))
    }

    /// QUERY → {RESOLVED_BY_CONTENT | RESOLVED_BY_LOOKUP | SYNTHESIZED}.
    pub fn resolve(&self, item: &BibItem) -> Resolution {
        let query = item.raw.split_whitespace().collect::<Vec<_>>().join(" ");

        if let Some(cached) = self.cached_doi(&query) {
            return match cached {
                Some(doi) => match self.negotiate_content(&doi) {
                    Some(text) => finish(item, text, ResolvedVia::ContentNegotiation),
                    None => synthesize(item),
                },
                None => synthesize(item),
            };
        }

        match self.search(&query) {
            SearchOutcome::Found(candidates) => {
                let top = &candidates[0];
                self.cache_put(&query, Some(&top.doi));
                self.resolve_candidate(item, top)
            }
            SearchOutcome::NotFound => {
                self.cache_put(&query, None);
                synthesize(item)
            }
            SearchOutcome::Skipped => synthesize(item),
        }
    }

    fn resolve_candidate(&self, item: &BibItem, candidate: &Candidate) -> Resolution {
        if let Some(text) = self.negotiate_content(&candidate.doi) {
            return finish(item, text, ResolvedVia::ContentNegotiation);
        }
        let entry = candidate_entry(candidate);
        if entry.is_valid() {
            return finish(item, entry.render(&item.label), ResolvedVia::SearchMetadata);
        }
        synthesize(item)
    }

    /// Submit the whitespace-joined raw text as a relevance query.
    fn search(&self, query: &str) -> SearchOutcome {
        let resp = match self
            .agent
            .get(&self.search_url)
            .query("q", query)
            .query("sort", "score")
            .call()
        {
            Ok(resp) => resp,
            Err(_) => return SearchOutcome::Skipped,
        };
        if resp.status() == 429 {
            return SearchOutcome::Skipped;
        }
        if resp.status() != 200 {
            return SearchOutcome::NotFound;
        }
        let body = match resp.into_body().read_to_string() {
            Ok(b) => b,
            Err(_) => return SearchOutcome::Skipped,
        };
        parse_candidates(&body)
    }

    /// Request the canonical interchange format for a persistent identifier.
    fn negotiate_content(&self, doi: &str) -> Option<String> {
        let resp = self
            .agent
            .get(&doi_url(doi))
            .header("Accept", "application/x-bibtex")
            .call()
            .ok()?;
        if resp.status() != 200 {
            return None;
        }
        let body = resp.into_body().read_to_string().ok()?;
        let trimmed = body.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    fn cached_doi(&self, query: &str) -> Option<Option<String>> {
        let cache = self.cache.as_ref()?.lock().ok()?;
        cache.get(query).ok().flatten()
    }

    fn cache_put(&self, query: &str, doi: Option<&str>) {
        if let Some(cache) = &self.cache
            && let Ok(cache) = cache.lock()
        {
            let _ = cache.put(query, doi);
        }
    }
}

fn parse_candidates(body: &str) -> SearchOutcome {
    match serde_json::from_str::<Vec<Candidate>>(body) {
        Ok(candidates) if candidates.is_empty() => SearchOutcome::NotFound,
        Ok(candidates) => SearchOutcome::Found(candidates),
        Err(_) => SearchOutcome::NotFound,
    }
}

fn doi_url(doi: &str) -> String {
    if doi.starts_with("http://") || doi.starts_with("https://") {
        doi.to_string()
    } else {
        format!("https://doi.org/{doi}")
    }
}

/// Build a record from the candidate's structured metadata, through the
/// misc schema so it always validates.
fn candidate_entry(candidate: &Candidate) -> Entry {
    let mut fields = HashMap::new();
    if let Some(title) = &candidate.title {
        fields.insert("title".to_string(), unlatexify(title));
    }
    if let Some(year) = candidate.year_string() {
        fields.insert("year".to_string(), year);
    }
    fields.insert("howpublished".to_string(), doi_url(&candidate.doi));
    if let Some(citation) = &candidate.full_citation {
        fields.insert("note".to_string(), unlatexify(citation));
    }
    Entry::new(EntryType::Misc, fields)
}

/// Terminal fallback: a misc entry whose sole field is the normalized raw
/// text. Misc has no required fields, so this always validates.
fn synthesize(item: &BibItem) -> Resolution {
    let mut fields = HashMap::new();
    fields.insert("note".to_string(), unlatexify(&item.raw));
    let entry = Entry::new(EntryType::Misc, fields);
    debug_assert!(entry.is_valid());
    finish(item, entry.render(&item.label), ResolvedVia::Synthesized)
}

fn finish(item: &BibItem, text: String, via: ResolvedVia) -> Resolution {
    Resolution {
        label: item.label.clone(),
        text: set_label(&text, &item.label),
        via,
    }
}

/// Force the citation key back to the one the source document used,
/// keeping the entry-type tag and every field: text up through the first
/// `{`, then the label, then the text from the first `,` onward.
/// Records not matching the `@TYPE{key,` shape pass through unchanged.
pub fn set_label(reference: &str, label: &str) -> String {
    let Some(open) = reference.find('{') else {
        return reference.to_string();
    };
    let Some(comma) = reference.find(',') else {
        return reference.to_string();
    };
    if comma < open {
        return reference.to_string();
    }
    format!("{}{{{},{}", &reference[..open], label, &reference[comma + 1..])
}

/// Run `resolve_one` over items with a fixed-size pool of scoped workers,
/// reassembling results by original index.
pub fn resolve_ordered<F>(items: &[BibItem], jobs: usize, resolve_one: F) -> Vec<Resolution>
where
    F: Fn(&BibItem) -> Resolution + Sync,
{
    if items.is_empty() {
        return Vec::new();
    }
    let jobs = jobs.clamp(1, items.len());
    let next = AtomicUsize::new(0);
    let done = AtomicUsize::new(0);
    let (tx, rx) = mpsc::channel();

    std::thread::scope(|scope| {
        for _ in 0..jobs {
            let tx = tx.clone();
            let next = &next;
            let done = &done;
            let resolve_one = &resolve_one;
            scope.spawn(move || {
                loop {
                    let idx = next.fetch_add(1, Ordering::Relaxed);
                    if idx >= items.len() {
                        break;
                    }
                    let resolution = resolve_one(&items[idx]);
                    let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                    eprint!("\rResolving references: {finished}/{}", items.len());
                    if tx.send((idx, resolution)).is_err() {
                        break;
                    }
                }
            });
        }
    });
    drop(tx);
    eprintln!();

    let mut slots: Vec<Option<Resolution>> = items.iter().map(|_| None).collect();
    for (idx, resolution) in rx {
        slots[idx] = Some(resolution);
    }
    slots.into_iter().flatten().collect()
}
