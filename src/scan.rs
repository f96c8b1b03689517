use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

const BIBLIO_BEGIN: &str = r"\begin{thebibliography}";
const BIBLIO_END: &str = r"\end{thebibliography}";

/// Produce the full raw bibliography text for a document path.
///
/// A file is scanned directly; a directory is walked recursively and every
/// contained file with a recognized extension is scanned, in sorted
/// discovery order. Only inability to read the top-level path is fatal —
/// everything below that degrades to a stderr diagnostic.
pub fn scan_path(path: &Path, extensions: &[String]) -> Result<String> {
    if path.is_dir() {
        scan_dir(path, extensions)
    } else {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(scan_file(path, &content))
    }
}

fn scan_dir(dir: &Path, extensions: &[String]) -> Result<String> {
    // Probe the root eagerly so an unreadable input is a clean error
    // instead of a silently empty walk.
    fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))?;

    let mut chunks = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                eprintln!("Error while walking '{}': {err}", dir.display());
                continue;
            }
        };
        if !entry.file_type().is_file() || !has_recognized_extension(entry.path(), extensions) {
            continue;
        }
        match fs::read_to_string(entry.path()) {
            Ok(content) => {
                let text = scan_file(entry.path(), &content);
                if !text.is_empty() {
                    chunks.push(text);
                }
            }
            Err(err) => {
                eprintln!("Error while trying to read '{}': {err}", entry.path().display());
            }
        }
    }
    Ok(chunks.join("\n"))
}

fn has_recognized_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}

/// Scan one file's lines with a two-state machine: lines strictly between
/// the begin/end markers are bibliography text; lines referencing an
/// external bibliography contribute that file's block at the trigger
/// position; comment lines never contribute.
fn scan_file(path: &Path, content: &str) -> String {
    let mut collected: Vec<String> = Vec::new();
    let mut inside = false;
    for line in content.lines() {
        if line.contains(BIBLIO_BEGIN) {
            inside = true;
            continue;
        }
        if line.contains(BIBLIO_END) {
            inside = false;
            continue;
        }
        if line.starts_with('%') {
            continue;
        }
        if references_external_bbl(line) {
            if let Some(text) = load_external_bbl(path, line) {
                collected.push(text);
            }
        } else if inside {
            collected.push(line.to_string());
        }
    }
    collected.join("\n")
}

/// A file-inclusion directive naming a `.bbl` target, or a bibliography
/// directive naming a base file.
fn references_external_bbl(line: &str) -> bool {
    (line.contains(r"\input{") && line.contains(".bbl}")) || line.contains(r"\bibliography{")
}

/// Resolve and read the external bibliography named on `line`.
///
/// The referenced name is resolved relative to the containing document's
/// directory unless absolute; if that path with a `.bbl` extension exists
/// it is used, otherwise the document's own path with a `.bbl` extension
/// is the fallback. An unreadable file is a diagnostic, not an error.
fn load_external_bbl(doc_path: &Path, line: &str) -> Option<String> {
    let target = resolve_bbl_path(doc_path, line)?;
    match fs::read_to_string(&target) {
        Ok(content) => Some(external_bibliography_text(&content)),
        Err(_) => {
            eprintln!("Error while trying to read '{}'", target.display());
            None
        }
    }
}

fn resolve_bbl_path(doc_path: &Path, line: &str) -> Option<PathBuf> {
    let (_, after_brace) = line.split_once('{')?;
    let (name, _) = after_brace.split_once('}')?;
    let mut referenced = PathBuf::from(name);
    if referenced.is_relative() {
        referenced = doc_path.parent().unwrap_or(Path::new(".")).join(referenced);
    }
    let referenced = referenced.with_extension("bbl");
    if referenced.exists() {
        Some(referenced)
    } else {
        Some(doc_path.with_extension("bbl"))
    }
}

/// An external file with its own markers contributes only the lines
/// strictly between them; one without markers contributes its entire
/// content (the safer default when the file is a bare compiled block).
fn external_bibliography_text(content: &str) -> String {
    if !content.contains(BIBLIO_BEGIN) {
        return content.trim_end().to_string();
    }
    let mut inside = false;
    let mut collected = Vec::new();
    for line in content.lines() {
        if line.contains(BIBLIO_BEGIN) {
            inside = true;
            continue;
        }
        if line.contains(BIBLIO_END) {
            inside = false;
            continue;
        }
        if inside {
            collected.push(line);
        }
    }
    collected.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn inline_block_between_markers() {
        let dir = tempfile::tempdir().unwrap();
        let doc = write_file(
            dir.path(),
            "paper.tex",
            "intro text\n\\begin{thebibliography}{9}\n\\bibitem{a} One\n\\bibitem{b} Two\n\\end{thebibliography}\nclosing\n",
        );
        let raw = scan_path(&doc, &[]).unwrap();
        assert_eq!(raw, "\\bibitem{a} One\n\\bibitem{b} Two");
    }

    #[test]
    fn comment_lines_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let doc = write_file(
            dir.path(),
            "paper.tex",
            "\\begin{thebibliography}{9}\n% generated by bibtex\n\\bibitem{a} One\n\\end{thebibliography}\n",
        );
        let raw = scan_path(&doc, &[]).unwrap();
        assert_eq!(raw, "\\bibitem{a} One");
    }

    #[test]
    fn bibliography_directive_loads_named_bbl() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "refs.bbl",
            "\\begin{thebibliography}{9}\n\\bibitem{x} External\n\\end{thebibliography}\n",
        );
        let doc = write_file(dir.path(), "paper.tex", "body\n\\bibliography{refs}\nmore body\n");
        let raw = scan_path(&doc, &[]).unwrap();
        assert_eq!(raw, "\\bibitem{x} External");
    }

    #[test]
    fn input_directive_with_bbl_suffix() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "refs.bbl",
            "\\begin{thebibliography}{9}\n\\bibitem{x} External\n\\end{thebibliography}\n",
        );
        let doc = write_file(dir.path(), "paper.tex", "\\input{refs.bbl}\n");
        let raw = scan_path(&doc, &[]).unwrap();
        assert_eq!(raw, "\\bibitem{x} External");
    }

    #[test]
    fn markerless_external_contributes_entire_content() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "refs.bbl", "\\bibitem{x} Bare line one\n\\bibitem{y} Bare line two\n");
        let doc = write_file(dir.path(), "paper.tex", "\\bibliography{refs}\n");
        let raw = scan_path(&doc, &[]).unwrap();
        assert_eq!(raw, "\\bibitem{x} Bare line one\n\\bibitem{y} Bare line two");
    }

    #[test]
    fn missing_named_bbl_falls_back_to_document_bbl() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "paper.bbl", "\\bibitem{d} Default\n");
        let doc = write_file(dir.path(), "paper.tex", "\\bibliography{nosuch}\n");
        let raw = scan_path(&doc, &[]).unwrap();
        assert_eq!(raw, "\\bibitem{d} Default");
    }

    #[test]
    fn unreadable_external_contributes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let doc = write_file(dir.path(), "paper.tex", "\\input{refs.bbl}\n");
        let raw = scan_path(&doc, &[]).unwrap();
        assert_eq!(raw, "");
    }

    #[test]
    fn external_and_inline_keep_encounter_order() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "early.bbl", "\\bibitem{e} Early external\n");
        let doc = write_file(
            dir.path(),
            "paper.tex",
            "\\bibliography{early}\n\\begin{thebibliography}{9}\n\\bibitem{i} Inline\n\\end{thebibliography}\n",
        );
        let raw = scan_path(&doc, &[]).unwrap();
        assert_eq!(raw, "\\bibitem{e} Early external\n\\bibitem{i} Inline");
    }

    #[test]
    fn directory_scan_filters_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "a.tex",
            "\\begin{thebibliography}{9}\n\\bibitem{a} From tex\n\\end{thebibliography}\n",
        );
        write_file(
            dir.path(),
            "b.txt",
            "\\begin{thebibliography}{9}\n\\bibitem{b} Ignored\n\\end{thebibliography}\n",
        );
        let raw = scan_path(dir.path(), &["tex".to_string(), "bbl".to_string()]).unwrap();
        assert_eq!(raw, "\\bibitem{a} From tex");
    }

    #[test]
    fn directory_scan_sorted_discovery_order() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "z.tex",
            "\\begin{thebibliography}{9}\n\\bibitem{z} Last\n\\end{thebibliography}\n",
        );
        write_file(
            dir.path(),
            "a.tex",
            "\\begin{thebibliography}{9}\n\\bibitem{a} First\n\\end{thebibliography}\n",
        );
        let raw = scan_path(dir.path(), &["tex".to_string()]).unwrap();
        assert_eq!(raw, "\\bibitem{a} First\n\\bibitem{z} Last");
    }

    #[test]
    fn unreadable_top_level_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.tex");
        assert!(scan_path(&missing, &[]).is_err());
    }
}
