//! Utility functions and helpers

use serde::{Deserialize, Deserializer};

/// Deserialize an explicit `null` as the type's default value.
///
/// Combined with `#[serde(default)]` this makes an absent field, a `null`
/// field and an empty collection indistinguishable once loaded, which is
/// what the collection equality rules expect.
///
/// ```rust
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Holder {
///     #[serde(default, deserialize_with = "flowplane_model::utils::null_as_default")]
///     items: Vec<String>,
/// }
///
/// let h: Holder = serde_json::from_str(r#"{"items": null}"#).unwrap();
/// assert!(h.items.is_empty());
/// ```
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Truncate a string for inclusion in a log line.
pub fn truncate_for_log(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "null_as_default")]
        items: Vec<u32>,
    }

    #[test]
    fn null_absent_and_empty_are_the_same() {
        let null: Holder = serde_json::from_str(r#"{"items": null}"#).unwrap();
        let absent: Holder = serde_json::from_str("{}").unwrap();
        let empty: Holder = serde_json::from_str(r#"{"items": []}"#).unwrap();

        assert!(null.items.is_empty());
        assert!(absent.items.is_empty());
        assert!(empty.items.is_empty());
    }

    #[test]
    fn values_pass_through() {
        let h: Holder = serde_json::from_str(r#"{"items": [1, 2]}"#).unwrap();
        assert_eq!(h.items, vec![1, 2]);
    }

    #[test]
    fn truncates_long_strings() {
        assert_eq!(truncate_for_log("short", 10), "short");
        assert_eq!(truncate_for_log("abcdef", 3), "abc…");
    }
}
