//! Finds where resource keys are used in source files.
//!
//! A scan runs in two parallel passes. The first reads every candidate source file once
//! and records, per file, on which lines each known key shows up as a word. The second
//! runs per key and applies the configured patterns only to those lines.
//!
//! [`CodeReferenceTracker`] runs a scan on a worker thread. Starting a new scan cancels
//! the running one; the cancel flag is checked between files and between keys.

use std::{
    collections::{BTreeSet, HashMap, HashSet},
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    thread::{self, JoinHandle},
};

use rayon::prelude::*;
use regex::{Regex, RegexBuilder};
use tracing::{debug, error, info, warn};

use crate::{
    configuration::{CodeReferenceConfigItem, Configuration},
    entry::EntryId,
    project_file::{FileFilter, ProjectFile},
};

/// One usage of a key: file, 1-based line number and the line split for highlighting.
///
/// `line_segments` alternates between plain text and matched text, starting with plain
/// text (possibly empty).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeReference {
    pub project_file: Arc<ProjectFile>,
    pub line_number: usize,
    pub line_segments: Vec<String>,
}

/// A key to look for, with the entry that receives the results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceTarget {
    pub entry: EntryId,
    pub key: String,
    /// Base name of the resource file, substituted for `$File`.
    pub base_name: String,
}

pub type CodeReferenceResults = HashMap<EntryId, Arc<[CodeReference]>>;

/// Lines of one file and where the known keys occur in it.
struct IndexedFile {
    file: Arc<ProjectFile>,
    lines: Vec<String>,
    patterns: Vec<usize>,
    key_lines: HashMap<String, BTreeSet<usize>>,
}

/// Runs a complete scan on the calling thread. Returns `None` if `cancel` was raised.
pub fn find_code_references(
    configuration: &Configuration,
    filter: &dyn FileFilter,
    targets: &[ReferenceTarget],
    files: &[ProjectFile],
    cancel: &AtomicBool,
    progress: &AtomicUsize,
) -> Option<CodeReferenceResults> {
    let patterns = &configuration.code_references;
    let candidates: Vec<(&ProjectFile, Vec<usize>)> = files
        .iter()
        .filter(|f| filter.is_source_file(f) && filter.include_file(f))
        .filter_map(|f| {
            let extension = f.extension();
            let applicable: Vec<usize> = patterns
                .iter()
                .enumerate()
                .filter(|(_, p)| p.applies_to(&extension))
                .map(|(i, _)| i)
                .collect();
            (!applicable.is_empty()).then_some((f, applicable))
        })
        .collect();

    let keys: HashSet<&str> = targets.iter().map(|t| t.key.as_str()).collect();
    let mut folded_keys: HashMap<String, Vec<&str>> = HashMap::new();
    for key in &keys {
        folded_keys.entry(key.to_lowercase()).or_default().push(key);
    }

    let total = candidates.len().max(1);
    let visited = AtomicUsize::new(0);
    progress.store(0, Ordering::Relaxed);

    let indexed: Vec<IndexedFile> = candidates
        .into_par_iter()
        .filter_map(|(file, applicable)| {
            if cancel.load(Ordering::Relaxed) {
                return None;
            }
            let result = index_file(file, applicable, patterns, &keys, &folded_keys);
            let done = visited.fetch_add(1, Ordering::Relaxed) + 1;
            progress.store(done * 100 / total, Ordering::Relaxed);
            result
        })
        .collect();
    if cancel.load(Ordering::Relaxed) {
        return None;
    }

    let mut files_by_key: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, file) in indexed.iter().enumerate() {
        for key in file.key_lines.keys() {
            files_by_key.entry(key.as_str()).or_default().push(i);
        }
    }

    let results: CodeReferenceResults = targets
        .par_iter()
        .filter_map(|target| {
            if cancel.load(Ordering::Relaxed) {
                return None;
            }
            let candidates = files_by_key
                .get(target.key.as_str())
                .map(Vec::as_slice)
                .unwrap_or_default();
            let references = match_target(target, candidates, &indexed, patterns);
            Some((target.entry, Arc::from(references)))
        })
        .collect();

    if cancel.load(Ordering::Relaxed) {
        return None;
    }
    progress.store(100, Ordering::Relaxed);
    Some(results)
}

fn index_file(
    file: &ProjectFile,
    patterns: Vec<usize>,
    configuration: &[CodeReferenceConfigItem],
    keys: &HashSet<&str>,
    folded_keys: &HashMap<String, Vec<&str>>,
) -> Option<IndexedFile> {
    let lines = match file.read_lines() {
        Ok(lines) => lines,
        Err(e) => {
            warn!("skipping {}: {}", file.file_path().display(), e);
            return None;
        }
    };
    let case_insensitive = patterns
        .iter()
        .any(|&i| !configuration[i].is_case_sensitive);

    let mut key_lines: HashMap<String, BTreeSet<usize>> = HashMap::new();
    for (index, line) in lines.iter().enumerate() {
        for token in line
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|t| !t.is_empty())
        {
            if keys.contains(token) {
                key_lines.entry(token.to_string()).or_default().insert(index);
            }
            if case_insensitive && let Some(matches) = folded_keys.get(&token.to_lowercase()) {
                for key in matches {
                    key_lines.entry(key.to_string()).or_default().insert(index);
                }
            }
        }
    }

    Some(IndexedFile {
        file: Arc::new(file.clone()),
        lines,
        patterns,
        key_lines,
    })
}

/// A pattern compiled for one target.
enum CompiledPattern<'a> {
    Literal(Regex, &'a str),
    Expression(Regex, &'a str),
}

fn compile<'a>(
    item: &'a CodeReferenceConfigItem,
    target: &ReferenceTarget,
) -> Option<CompiledPattern<'a>> {
    let (source, literal) = if item.expression.trim().is_empty() {
        (regex::escape(&target.key), true)
    } else {
        let expression = item
            .expression
            .replace("$File", &regex::escape(&target.base_name))
            .replace("$Key", &regex::escape(&target.key));
        (expression, false)
    };
    match RegexBuilder::new(&source)
        .case_insensitive(!item.is_case_sensitive)
        .build()
    {
        Ok(regex) if literal => Some(CompiledPattern::Literal(regex, &item.single_line_comment)),
        Ok(regex) => Some(CompiledPattern::Expression(regex, &item.single_line_comment)),
        Err(e) => {
            error!(
                "invalid code reference expression `{}` for `{}`: {}",
                item.expression, target.key, e
            );
            None
        }
    }
}

fn match_target(
    target: &ReferenceTarget,
    candidates: &[usize],
    indexed: &[IndexedFile],
    configuration: &[CodeReferenceConfigItem],
) -> Vec<CodeReference> {
    let mut compiled: HashMap<usize, Option<CompiledPattern<'_>>> = HashMap::new();
    let mut references = Vec::new();

    for &file_index in candidates {
        let file = &indexed[file_index];
        let Some(lines) = file.key_lines.get(&target.key) else {
            continue;
        };
        for &line_index in lines {
            let line = &file.lines[line_index];
            for &pattern in &file.patterns {
                let pattern = compiled
                    .entry(pattern)
                    .or_insert_with(|| compile(&configuration[pattern], target));
                if let Some(segments) = pattern.as_ref().and_then(|p| match_line(p, line)) {
                    references.push(CodeReference {
                        project_file: Arc::clone(&file.file),
                        line_number: line_index + 1,
                        line_segments: segments,
                    });
                    break;
                }
            }
        }
    }
    references
}

fn is_commented_out(text: &str, comment: &str, match_start: usize) -> bool {
    !comment.is_empty() && text.find(comment).is_some_and(|position| position <= match_start)
}

fn match_line(pattern: &CompiledPattern<'_>, line: &str) -> Option<Vec<String>> {
    match pattern {
        CompiledPattern::Literal(regex, comment) => {
            let found = regex.find(line)?;
            if is_commented_out(line, comment, found.start()) {
                return None;
            }
            Some(split_segments(line, &[(found.start(), found.end())]))
        }
        CompiledPattern::Expression(regex, comment) => {
            let padded = format!(" {} ", line);
            let captures = regex.captures(&padded)?;
            let whole = captures.get(0)?;
            if is_commented_out(&padded, comment, whole.start()) {
                return None;
            }
            let groups: Vec<(usize, usize)> = captures
                .iter()
                .skip(1)
                .flatten()
                .map(|m| (m.start(), m.end()))
                .collect();
            let ranges = if groups.is_empty() {
                vec![(whole.start(), whole.end())]
            } else {
                groups
            };
            // Offsets are in the padded line; shift back onto the original.
            let ranges: Vec<(usize, usize)> = ranges
                .into_iter()
                .map(|(s, e)| {
                    (
                        s.saturating_sub(1).min(line.len()),
                        e.saturating_sub(1).min(line.len()),
                    )
                })
                .collect();
            Some(split_segments(line, &ranges))
        }
    }
}

/// Splits `line` into text, match, text, match, ..., text.
fn split_segments(line: &str, ranges: &[(usize, usize)]) -> Vec<String> {
    let mut segments = Vec::with_capacity(ranges.len() * 2 + 1);
    let mut cursor = 0;
    for &(start, end) in ranges {
        if start < cursor || end < start {
            continue;
        }
        segments.push(line[cursor..start].to_string());
        segments.push(line[start..end].to_string());
        cursor = end;
    }
    segments.push(line[cursor..].to_string());
    segments
}

/// Runs at most one scan at a time on a background thread.
#[derive(Debug, Default)]
pub struct CodeReferenceTracker {
    worker: Option<JoinHandle<Option<CodeReferenceResults>>>,
    cancel: Arc<AtomicBool>,
    progress: Arc<AtomicUsize>,
}

impl CodeReferenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels any running scan, waits for it, then starts scanning `files` for `targets`.
    pub fn start_find(
        &mut self,
        configuration: Arc<Configuration>,
        filter: Arc<dyn FileFilter>,
        targets: Vec<ReferenceTarget>,
        files: Vec<ProjectFile>,
    ) {
        self.stop_find();

        let cancel = Arc::new(AtomicBool::new(false));
        let progress = Arc::new(AtomicUsize::new(0));
        self.cancel = Arc::clone(&cancel);
        self.progress = Arc::clone(&progress);

        info!(
            "scanning {} files for {} keys",
            files.len(),
            targets.len()
        );
        self.worker = Some(thread::spawn(move || {
            let results = find_code_references(
                &configuration,
                filter.as_ref(),
                &targets,
                &files,
                &cancel,
                &progress,
            );
            if results.is_none() {
                debug!("code reference scan cancelled");
            }
            results
        }));
    }

    /// Cancels the running scan, if any, and waits for its worker to stop.
    pub fn stop_find(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            error!("code reference worker panicked");
        }
    }

    pub fn is_active(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Percentage of candidate files visited by the current scan.
    pub fn progress(&self) -> usize {
        self.progress.load(Ordering::Relaxed)
    }

    /// Blocks until the current scan finishes.
    pub fn wait(&mut self) -> Option<CodeReferenceResults> {
        let worker = self.worker.take()?;
        match worker.join() {
            Ok(results) => results,
            Err(_) => {
                error!("code reference worker panicked");
                None
            }
        }
    }

    /// Results of a finished scan; `None` while running or when nothing is pending.
    pub fn try_take_results(&mut self) -> Option<CodeReferenceResults> {
        if self.worker.as_ref()?.is_finished() {
            self.wait()
        } else {
            None
        }
    }
}

impl Drop for CodeReferenceTracker {
    fn drop(&mut self) {
        self.stop_find();
    }
}
