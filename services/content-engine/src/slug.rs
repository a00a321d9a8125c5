//! URL-safe slug derivation.
//!
//! Slugs are assigned once, on first save, and never change afterwards.
//! Collisions are resolved deterministically with a numeric suffix, so a
//! given (name, existing-slug-set) pair always produces the same slug.

use std::collections::HashSet;

/// Base length before the numeric suffix, per entity.
pub const CATEGORIE_SLUG_BASE: usize = 110;
pub const ARTICLE_SLUG_BASE: usize = 280;
pub const TAG_SLUG_BASE: usize = 100;

/// Maps common accented characters onto their ASCII base letter so French
/// titles slug cleanly.
fn fold_accent(c: char) -> Option<char> {
    let folded = match c {
        'à' | 'â' | 'ä' => 'a',
        'ç' => 'c',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'î' | 'ï' => 'i',
        'ô' | 'ö' => 'o',
        'ù' | 'û' | 'ü' => 'u',
        'ÿ' => 'y',
        _ => return None,
    };
    Some(folded)
}

pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_hyphen = false;

    for c in input.chars() {
        let c = c.to_lowercase().next().unwrap_or(c);
        let mapped = if c.is_ascii_alphanumeric() {
            Some(c)
        } else {
            fold_accent(c)
        };
        match mapped {
            Some(c) => {
                if pending_hyphen && !slug.is_empty() {
                    slug.push('-');
                }
                pending_hyphen = false;
                slug.push(c);
            }
            None => pending_hyphen = true,
        }
    }

    slug
}

/// The slug base for `name`: slugified and truncated to `base_len`
/// characters, leaving room for a numeric suffix.
pub fn base_slug(name: &str, base_len: usize) -> String {
    let mut base: String = slugify(name).chars().take(base_len).collect();
    while base.ends_with('-') {
        base.pop();
    }
    if base.is_empty() {
        base.push_str("sans-titre");
    }
    base
}

/// Append "-1", "-2", ... to `base` until the candidate is absent from
/// the taken set.
pub fn resolve_collision(base: &str, existing: &HashSet<String>) -> String {
    if !existing.contains(base) {
        return base.to_string();
    }

    let mut counter = 1u64;
    loop {
        let candidate = format!("{}-{}", base, counter);
        if !existing.contains(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Derive a unique slug for `name` against the set of slugs already taken.
/// Deterministic for a given (name, existing-slug-set) pair.
pub fn assign_slug(name: &str, base_len: usize, existing: &HashSet<String>) -> String {
    resolve_collision(&base_slug(name, base_len), existing)
}
