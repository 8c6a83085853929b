//! Comparison helpers shared by the entity equality and ordering rules.
//!
//! Collections come in two flavours. Order-significant lists (rules,
//! redirects) compare position by position. Set-like collections (instances,
//! domain keys, methods) compare by content regardless of position, and
//! because an absent collection deserializes as an empty one, "nil" and
//! "empty" are always equal.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Order two optional values. Unset sorts before any set value; two set
/// values compare by their natural order.
///
/// This is the ordering `Option` already derives; the named helper keeps the
/// intent visible where composite records are compared field by field.
pub fn compare_optional<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => a.cmp(b),
    }
}

/// Order two string lists: a shorter list sorts first, equal-length lists
/// compare element by element.
pub fn compare_string_slices(a: &[String], b: &[String]) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Multiset equality: same elements with the same multiplicity, in any order.
pub fn unordered_eq<T: Eq + Hash>(a: &[T], b: &[T]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut counts: HashMap<&T, usize> = HashMap::new();
    for item in a {
        *counts.entry(item).or_default() += 1;
    }

    for item in b {
        match counts.get_mut(item) {
            Some(n) if *n > 0 => *n -= 1,
            _ => return false,
        }
    }

    true
}

/// Multiset equality under a custom equality relation.
pub fn unordered_eq_by<T>(a: &[T], b: &[T], eq: impl Fn(&T, &T) -> bool) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut used = vec![false; b.len()];
    'outer: for item in a {
        for (idx, candidate) in b.iter().enumerate() {
            if !used[idx] && eq(item, candidate) {
                used[idx] = true;
                continue 'outer;
            }
        }
        return false;
    }

    true
}

/// Positional equality under a custom equality relation.
pub fn ordered_eq_by<T>(a: &[T], b: &[T], eq: impl Fn(&T, &T) -> bool) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| eq(x, y))
}

/// Set equality: duplicates and order are ignored.
pub fn same_set<T: Eq + Hash>(a: &[T], b: &[T]) -> bool {
    a.iter().collect::<HashSet<_>>() == b.iter().collect::<HashSet<_>>()
}

/// Compare two optional values with a custom equality relation; two unset
/// values are equal, set and unset never are.
pub fn option_eq_by<T>(a: Option<&T>, b: Option<&T>, eq: impl Fn(&T, &T) -> bool) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => eq(a, b),
        _ => false,
    }
}
