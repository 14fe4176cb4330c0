//! Line normalization module.
//!
//! This module removes boilerplate from the raw line sequence before any
//! segmentation happens:
//! - Watermark/footer lines together with the page number and running header around them
//! - Paired banner lines (the banner and the line right after it)
//!
//! Both passes are best-effort heuristics over a small context window.

use std::collections::BTreeSet;

use crate::config::NoiseMarkers;

/// Returns `true` if the line is a canonical decimal integer such as `"12"`.
///
/// `"012"`, `" 12"` and `"+12"` are not bare integers.
pub fn is_bare_integer(line: &str) -> bool {
    match line.parse::<i64>() {
        Ok(value) => value.to_string() == line,
        Err(_) => false,
    }
}

fn is_watermark(line: &str, markers: &NoiseMarkers) -> bool {
    (!markers.watermark_suffix.is_empty() && line.ends_with(&markers.watermark_suffix))
        || (!markers.brand_marker.is_empty() && line.contains(&markers.brand_marker))
}

fn has_secondary_marker(line: &str, markers: &NoiseMarkers) -> bool {
    !markers.secondary_marker.is_empty() && line.contains(&markers.secondary_marker)
}

/// Removes watermark/footer blocks.
///
/// For every watermark line the surrounding context decides how much goes:
/// - previous line is a page number: the three lines before the watermark
/// - next line is a page number: two or three lines after it
/// - a secondary marker right before or after: two lines on that side
/// - otherwise only the watermark line itself
pub fn remove_watermarks(lines: &[String], markers: &NoiseMarkers) -> Vec<String> {
    let n = lines.len();
    let line_at = |idx: usize| lines.get(idx).map(|s| s.as_str()).unwrap_or("");
    let mut to_remove = BTreeSet::new();

    for (i, line) in lines.iter().enumerate() {
        if !is_watermark(line, markers) {
            continue;
        }
        to_remove.insert(i);

        let prev = if i > 0 { line_at(i - 1) } else { "" };
        let next = line_at(i + 1);
        let next2 = line_at(i + 2);

        if is_bare_integer(prev) {
            to_remove.extend(i.saturating_sub(3)..i);
        } else if is_bare_integer(next) {
            if !is_bare_integer(next2) && !has_secondary_marker(next2, markers) {
                to_remove.extend((i + 1..i + 3).filter(|&idx| idx < n));
            } else {
                to_remove.extend(i + 1..usize::min(n, i + 4));
            }
        } else if has_secondary_marker(prev, markers) {
            to_remove.extend(i.saturating_sub(2)..i);
        } else if has_secondary_marker(next, markers) {
            to_remove.extend(i + 1..usize::min(n, i + 3));
        }
    }

    if !to_remove.is_empty() {
        tracing::debug!("Removed {} watermark/footer lines", to_remove.len());
    }

    lines
        .iter()
        .enumerate()
        .filter(|(idx, _)| !to_remove.contains(idx))
        .map(|(_, line)| line.clone())
        .collect()
}

/// Removes every banner line together with the line that follows it.
pub fn remove_banner_pairs(lines: &[String], markers: &NoiseMarkers) -> Vec<String> {
    if markers.banner_phrase.is_empty() {
        return lines.to_vec();
    }
    let mut filtered = Vec::with_capacity(lines.len());
    let mut skip_next = false;
    for line in lines {
        if skip_next {
            skip_next = false;
            continue;
        }
        if line.contains(&markers.banner_phrase) {
            skip_next = true;
            continue;
        }
        filtered.push(line.clone());
    }
    filtered
}

/// Runs both noise passes: watermarks first, then banner pairs.
pub fn normalize(lines: &[String], markers: &NoiseMarkers) -> Vec<String> {
    let lines = remove_watermarks(lines, markers);
    remove_banner_pairs(&lines, markers)
}
