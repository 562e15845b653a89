//! Canonical identifier allocation.
//!
//! Identifiers have the shape `<PREFIX>:<ancestor_1>.<ancestor_2>....<own>`,
//! e.g. `FEAT:FRONTEND.AUTH.LOGIN`. The string shape is a stable format
//! contract: already-allocated ids are persisted and must keep parsing.
//!
//! Allocation is single-writer. `allocate_unique` probes the store through a
//! caller-supplied predicate and is not safe under concurrent allocation.

use crate::model::EntityKind;

/// Upper bound on one normalized segment.
pub const MAX_SEGMENT_LEN: usize = 48;

/// Segment used when a title normalizes to nothing.
pub const PLACEHOLDER_SEGMENT: &str = "UNNAMED";

/// Normalizes a free-text title into one identifier segment.
///
/// Strips non-alphanumeric characters (whitespace and hyphens survive as
/// separators), collapses separator runs into a single underscore,
/// uppercases, and bounds the length. Degenerate input yields
/// [`PLACEHOLDER_SEGMENT`] rather than failing.
pub fn normalize_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_gap = false;

    for c in raw.trim().chars() {
        if c.is_whitespace() || c == '-' {
            pending_gap = !out.is_empty();
            continue;
        }
        if !c.is_alphanumeric() {
            continue;
        }
        if pending_gap {
            out.push('_');
            pending_gap = false;
        }
        for upper in c.to_uppercase() {
            out.push(upper);
        }
    }

    if out.is_empty() {
        return PLACEHOLDER_SEGMENT.to_string();
    }

    if out.len() > MAX_SEGMENT_LEN {
        let mut end = MAX_SEGMENT_LEN;
        while !out.is_char_boundary(end) {
            end -= 1;
        }
        out.truncate(end);
    }

    out
}

/// The id without its `PREFIX:` namespace, e.g. `FRONTEND.AUTH` for
/// `EPIC:FRONTEND.AUTH`. Ids without a prefix are returned whole.
pub fn id_body(id: &str) -> &str {
    id.split_once(':').map(|(_, body)| body).unwrap_or(id)
}

/// Composes a canonical identifier from a title and ancestor titles.
///
/// Ancestor segments are omitted for kinds with no required ancestor
/// (Module, Service); blank ancestor titles are skipped rather than turned
/// into placeholders.
pub fn allocate(kind: EntityKind, title: &str, ancestry: &[&str]) -> String {
    let mut segments: Vec<String> = Vec::new();

    if kind.expected_segments() > 1 {
        for ancestor in ancestry {
            if ancestor.trim().is_empty() {
                continue;
            }
            segments.push(normalize_segment(ancestor));
        }
    }

    segments.push(normalize_segment(title));
    format!("{}:{}", kind.prefix(), segments.join("."))
}

/// Composes a canonical identifier under an existing parent entity.
///
/// The parent's own id, stripped of its prefix, is reused verbatim as the
/// ancestor chain. This keeps child ids consistent with the parent even when
/// ancestor titles are malformed elsewhere.
pub fn allocate_under(kind: EntityKind, title: &str, parent_id: &str) -> String {
    let chain = id_body(parent_id);
    let own = normalize_segment(title);

    if chain.is_empty() {
        format!("{}:{}", kind.prefix(), own)
    } else {
        format!("{}:{}.{}", kind.prefix(), chain, own)
    }
}

/// Returns `base` if the store does not hold it yet, otherwise the first
/// free suffixed variant (`base.1`, `base.2`, ...).
pub fn allocate_unique<F>(base: &str, taken: F) -> String
where
    F: Fn(&str) -> bool,
{
    if !taken(base) {
        return base.to_string();
    }

    let mut n: u32 = 1;
    loop {
        let candidate = format!("{base}.{n}");
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
