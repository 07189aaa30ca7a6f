// SPDX-License-Identifier: GPL-3.0-or-later

//! Loose text matching shared by every catalog adapter.
//!
//! Two strings "refer to the same thing" when their lowercase forms are equal or
//! one contains the other. Only case is folded: no Unicode normalization, no
//! punctuation stripping. `"Song"` therefore matches `"Song (Remix)"`, and a very
//! short query such as `"a"` matches almost anything.

/// Returns `true` when `a` and `b` loosely refer to the same title or artist.
pub fn matches(a: &str, b: &str) -> bool {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    a == b || a.contains(&b) || b.contains(&a)
}

/// Returns `true` when at least one credited artist loosely matches `artist`.
pub fn any_matches<'a, I>(credits: I, artist: &str) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    credits.into_iter().any(|credit| matches(credit, artist))
}
