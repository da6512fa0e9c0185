// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace name derivation.
//!
//! Workspace names double as agent identifiers, so the slug rules matter:
//! ASCII only, kebab-case, apostrophes stripped so contractions stay readable,
//! bounded length with truncation at a hyphen boundary.

use chrono::{DateTime, Utc};

/// Default upper bound for workspace slugs.
pub const DEFAULT_SLUG_LEN: usize = 50;

/// Slugify a task description or issue title into a workspace name.
///
/// Steps: strip apostrophes, fold Unicode to ASCII, lowercase, collapse any
/// run of non-alphanumerics into a single hyphen, trim hyphens, truncate to
/// `max_len` at the last hyphen boundary. Returns an empty string when
/// nothing survives; callers fall back to [`fallback_slug`].
pub fn workspace_slug(input: &str, max_len: usize) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut last_was_hyphen = true; // suppresses a leading hyphen
    let mut push = |c: char, slug: &mut String, last: &mut bool| {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            *last = false;
        } else if !*last {
            slug.push('-');
            *last = true;
        }
    };

    for ch in input.chars() {
        // Apostrophes vanish entirely so "don't" becomes "dont"
        if ch == '\'' || ch == '\u{2019}' {
            continue;
        }
        if ch.is_ascii() {
            push(ch, &mut slug, &mut last_was_hyphen);
        } else {
            let folded = fold_accent(ch);
            if folded.is_empty() {
                push('-', &mut slug, &mut last_was_hyphen);
            } else {
                for f in folded.chars() {
                    push(f, &mut slug, &mut last_was_hyphen);
                }
            }
        }
    }

    let mut slug = slug.trim_matches('-').to_string();

    if slug.len() > max_len {
        // Cut at the last hyphen that fits so no word is split mid-way
        let cut = slug[..=max_len].rfind('-').unwrap_or(max_len);
        slug.truncate(cut);
        let trimmed = slug.trim_end_matches('-');
        if trimmed.len() != slug.len() {
            slug = trimmed.to_string();
        }
    }

    slug
}

/// Timestamp-based fallback for tasks that slugify to nothing.
pub fn fallback_slug(now: DateTime<Utc>) -> String {
    format!("debug-bug-{}", now.format("%Y%m%d-%H%M%S"))
}

/// Prefix a slug with the spawn date (`YYYY-MM-DD-`).
pub fn date_prefixed(slug: &str, now: DateTime<Utc>) -> String {
    format!("{}-{}", now.format("%Y-%m-%d"), slug)
}

/// Fold an accented character to its closest ASCII rendering.
///
/// Covers the Latin-1 accented range; anything else maps to empty and ends
/// up as a hyphen-collapse point in the slug.
fn fold_accent(ch: char) -> &'static str {
    match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => "a",
        'è' | 'é' | 'ê' | 'ë' | 'È' | 'É' | 'Ê' | 'Ë' => "e",
        'ì' | 'í' | 'î' | 'ï' | 'Ì' | 'Í' | 'Î' | 'Ï' => "i",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' => "o",
        'ù' | 'ú' | 'û' | 'ü' | 'Ù' | 'Ú' | 'Û' | 'Ü' => "u",
        'ý' | 'ÿ' | 'Ý' => "y",
        'ñ' | 'Ñ' => "n",
        'ç' | 'Ç' => "c",
        'ß' => "ss",
        'æ' | 'Æ' => "ae",
        'œ' | 'Œ' => "oe",
        'ð' | 'Ð' => "d",
        'þ' | 'Þ' => "th",
        _ => "",
    }
}

#[cfg(test)]
#[path = "slug_tests.rs"]
mod tests;
