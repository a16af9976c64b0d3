//! Engine-version label ordering.
//!
//! Labels look like `4.6.1f1` or `5.0.0p3`. They are compared position by
//! position:
//!
//! - identical characters continue to the next position;
//! - differing characters decide when either is a digit or a letter, by
//!   comparing the single characters (so `"9"` > `"10"`);
//! - differing punctuation does not decide;
//! - if one label runs out first, the longer label is newer.

use std::cmp::Ordering;

/// Orders two engine-version labels.
#[must_use]
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let mut left = a.chars();
    let mut right = b.chars();
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x == y => {}
            (Some(x), Some(y)) => {
                if x.is_alphanumeric() || y.is_alphanumeric() {
                    return x.cmp(&y);
                }
            }
        }
    }
}

/// Returns the newest label; on ties the earliest one wins.
pub fn newest_label<'a, I>(labels: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    labels.into_iter().fold(None, |best, label| match best {
        Some(b) if compare_versions(label, b) != Ordering::Greater => Some(b),
        _ => Some(label),
    })
}
