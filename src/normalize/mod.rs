//! OCR Text Normalization
//!
//! Repairs OCR artifacts in extracted text: broken words, uneven spacing,
//! page numbers, and repeated headers. Pure and deterministic - no I/O, no
//! model calls, never fails. Rules run in a fixed order:
//!
//! 1. **Line healing**: joins lines split mid-word (trailing hyphen or no
//!    terminal punctuation), guarded so digits are never fused across the
//!    boundary.
//! 2. **Whitespace collapse**: runs of spaces/tabs become one space; blank
//!    lines (paragraph breaks) survive.
//! 3. **Token spacing**: `$3.2million` becomes `$3.2 million`; numeric
//!    ranges (`2021-2023`) and ordinals (`4th`) are untouched.
//! 4. **Artifact stripping**: standalone page numbers (digits, roman
//!    numerals, `Page N`) and lines recurring on two or more pages.
//!
//! On input the heuristics cannot fully repair, the output carries a
//! `degraded` flag but text is still returned - downstream analysis prefers
//! imperfect text over none. Output is empty only when the input was.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::constants::normalize as norm_constants;
use crate::types::{CleanedText, ExtractedText};

static PAGE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:page\s+)?\d{1,4}$").unwrap());

// Strict roman numeral shape so ordinary words never match
static ROMAN_NUMERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^m{0,3}(cm|cd|d?c{0,3})(xc|xl|l?x{0,3})(ix|iv|v?i{0,3})$").unwrap()
});

static DIGIT_LETTER_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d)([A-Za-z]+)").unwrap());

/// Normalize extracted OCR text into a single cleaned string.
pub fn normalize(extracted: &ExtractedText) -> CleanedText {
    if extracted.is_empty() {
        return CleanedText::new(String::new(), false);
    }

    let mut lines: Vec<Line> = extracted
        .segments
        .iter()
        .map(|s| Line {
            page: s.page,
            text: s.content.clone(),
        })
        .collect();

    let mut anomalies = 0usize;
    let non_blank = lines.iter().filter(|l| !l.text.trim().is_empty()).count();

    anomalies += strip_control_chars(&mut lines);

    let artifacts = classify_artifacts(&lines);

    // Rule 1
    let healed = heal_lines(lines, &artifacts, &mut anomalies);

    // Rules 2 + 3 are per-line
    let spaced: Vec<Line> = healed
        .into_iter()
        .map(|mut line| {
            line.text = space_tokens(&collapse_whitespace(&line.text));
            line
        })
        .collect();

    // Rule 4
    let kept: Vec<&Line> = spaced
        .iter()
        .filter(|line| !is_artifact_text(&line.text, &artifacts))
        .collect();

    let mut text = render(kept.iter().map(|l| l.text.as_str()));

    // Stripping must never produce an empty document from a non-empty one
    if text.trim().is_empty() {
        text = render(spaced.iter().map(|l| l.text.as_str()));
        anomalies += non_blank;
    }

    let degraded = non_blank > 0
        && (anomalies as f64 / non_blank as f64) > norm_constants::DEGRADED_LINE_RATIO;

    CleanedText::new(text, degraded)
}

#[derive(Debug, Clone)]
struct Line {
    page: u32,
    text: String,
}

// =============================================================================
// Artifact classification (consulted by rules 1 and 4)
// =============================================================================

#[derive(Debug, Default)]
struct ArtifactIndex {
    /// Trimmed line texts that recur on >= HEADER_REPEAT_PAGES distinct pages
    repeated: HashSet<String>,
}

fn classify_artifacts(lines: &[Line]) -> ArtifactIndex {
    // Compare whitespace-collapsed text so uneven OCR spacing on one page
    // does not hide a repeated header
    let mut pages_by_text: HashMap<String, HashSet<u32>> = HashMap::new();
    for line in lines {
        let collapsed = collapse_whitespace(&line.text);
        if collapsed.is_empty() {
            continue;
        }
        pages_by_text
            .entry(collapsed)
            .or_default()
            .insert(line.page);
    }

    let repeated = pages_by_text
        .into_iter()
        .filter(|(_, pages)| pages.len() >= norm_constants::HEADER_REPEAT_PAGES)
        .map(|(text, _)| text)
        .collect();

    ArtifactIndex { repeated }
}

fn is_artifact_text(text: &str, artifacts: &ArtifactIndex) -> bool {
    let collapsed = collapse_whitespace(text);
    if collapsed.is_empty() {
        return false;
    }
    if PAGE_NUMBER.is_match(&collapsed) {
        return true;
    }
    if ROMAN_NUMERAL.is_match(&collapsed) {
        return true;
    }
    artifacts.repeated.contains(&collapsed)
}

// =============================================================================
// Rule 1: line healing
// =============================================================================

#[derive(Debug, PartialEq)]
enum Join {
    /// Drop the trailing hyphen and concatenate ("trans-" + "formation")
    HyphenMerge,
    /// Keep the hyphen, concatenate without space ("2021-" + "2023")
    HyphenKeep,
    /// Concatenate with a single space ("in" + "Q4")
    Space,
    None,
}

fn heal_lines(lines: Vec<Line>, artifacts: &ArtifactIndex, anomalies: &mut usize) -> Vec<Line> {
    let mut out: Vec<Line> = Vec::with_capacity(lines.len());
    let mut i = 0;

    while i < lines.len() {
        let current = &lines[i];
        if current.text.trim().is_empty() || is_artifact_text(&current.text, artifacts) {
            out.push(current.clone());
            i += 1;
            continue;
        }

        let mut acc = current.clone();
        i += 1;

        loop {
            // Look past artifact lines: prose flows across page headers
            let mut j = i;
            while j < lines.len() && is_artifact_text(&lines[j].text, artifacts) {
                j += 1;
            }
            if j >= lines.len() || lines[j].text.trim().is_empty() {
                break;
            }

            match join_decision(&acc.text, &lines[j].text) {
                Join::None => break,
                decision => {
                    // Skipped artifacts still need to reach rule 4
                    for artifact in &lines[i..j] {
                        out.push(artifact.clone());
                    }
                    acc.text = apply_join(&acc.text, &lines[j].text, &decision);
                    i = j + 1;
                }
            }
        }

        if acc.text.trim_end().ends_with('-') {
            // Dangling hyphen with nothing to heal against
            *anomalies += 1;
        }

        out.push(acc);
    }

    out
}

fn join_decision(prev: &str, next: &str) -> Join {
    let prev = prev.trim_end();
    let next = next.trim_start();
    if prev.is_empty() || next.is_empty() {
        return Join::None;
    }

    let last = match prev.chars().last() {
        Some(c) => c,
        None => return Join::None,
    };
    let first = match next.chars().next() {
        Some(c) => c,
        None => return Join::None,
    };

    if last == '-' {
        let before = prev.chars().rev().nth(1);
        return match before {
            Some(b) if b.is_alphabetic() && first.is_alphabetic() => Join::HyphenMerge,
            Some(b) if b.is_ascii_digit() || first.is_ascii_digit() => Join::HyphenKeep,
            _ => Join::None,
        };
    }

    if is_terminal_punct(last) || looks_like_heading(prev) {
        return Join::None;
    }

    // Word-shape guard: both boundary characters must carry word content,
    // and digits are never fused across the boundary.
    if is_wordish(last) && is_wordish(first) && !(last.is_ascii_digit() && first.is_ascii_digit())
    {
        return Join::Space;
    }

    Join::None
}

fn apply_join(prev: &str, next: &str, decision: &Join) -> String {
    let prev = prev.trim_end();
    let next = next.trim_start();
    match decision {
        Join::HyphenMerge => format!("{}{}", &prev[..prev.len() - 1], next),
        Join::HyphenKeep => format!("{}{}", prev, next),
        Join::Space => format!("{} {}", prev, next),
        Join::None => prev.to_string(),
    }
}

fn is_terminal_punct(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | ':' | ';')
}

fn is_wordish(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '$' | '€' | '£' | '%' | '(' | ')')
}

/// Short title-case lines are section headings, not broken sentences
fn looks_like_heading(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.len() > 60 {
        return false;
    }
    let words: Vec<&str> = trimmed.split_whitespace().collect();
    if words.is_empty() || words.len() > 8 {
        return false;
    }
    words.iter().all(|w| {
        w.chars()
            .next()
            .map(|c| c.is_uppercase() || c.is_ascii_digit() || c == '&' || c == '(')
            .unwrap_or(false)
            || matches!(*w, "and" | "of" | "the" | "for" | "in" | "to" | "&")
    })
}

// =============================================================================
// Rule 2: whitespace collapse
// =============================================================================

fn collapse_whitespace(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

// =============================================================================
// Rule 3: token spacing
// =============================================================================

fn space_tokens(line: &str) -> String {
    DIGIT_LETTER_RUN
        .replace_all(line, |caps: &regex::Captures| {
            let digit = &caps[1];
            let letters = &caps[2];
            if is_ordinal_suffix(letters) {
                format!("{}{}", digit, letters)
            } else {
                format!("{} {}", digit, letters)
            }
        })
        .into_owned()
}

fn is_ordinal_suffix(letters: &str) -> bool {
    matches!(
        letters.to_ascii_lowercase().as_str(),
        "st" | "nd" | "rd" | "th"
    )
}

// =============================================================================
// Assembly
// =============================================================================

fn render<'a>(lines: impl Iterator<Item = &'a str>) -> String {
    let mut out = String::new();
    let mut pending_blank = false;
    let mut wrote_any = false;

    for line in lines {
        if line.trim().is_empty() {
            pending_blank = wrote_any;
            continue;
        }
        if wrote_any {
            out.push('\n');
            if pending_blank {
                out.push('\n');
            }
        }
        out.push_str(line.trim());
        pending_blank = false;
        wrote_any = true;
    }

    out
}

fn strip_control_chars(lines: &mut [Line]) -> usize {
    let mut stripped = 0;
    for line in lines.iter_mut() {
        if line.text.chars().any(|c| c.is_control() && c != '\t') {
            line.text.retain(|c| !c.is_control() || c == '\t');
            stripped += 1;
        }
    }
    stripped
}

// =============================================================================
// Tests
// =============================================================================
