//! `%NAME%` placeholder substitution.
//!
//! A token is `%` followed by an ASCII uppercase letter or `_`, then any
//! number of ASCII uppercase letters, digits or `_`, closed by `%`. Anything
//! else containing `%` (CSS percentages, escaped URLs) is copied through.
//! Rendering is a single pass; substituted values are never re-scanned.

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template not found: {0}")]
    NotFound(String),

    #[error("missing substitution for placeholder %{placeholder}%")]
    MissingSubstitution { placeholder: String },
}

/// Source of replacement values keyed by placeholder name (without the `%` delimiters).
pub trait Substitutions {
    fn lookup(&self, name: &str) -> Option<&str>;
}

impl<K: AsRef<str>, V: AsRef<str>> Substitutions for [(K, V)] {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_ref())
    }
}

impl<K: AsRef<str>, V: AsRef<str>, const N: usize> Substitutions for [(K, V); N] {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.as_slice().lookup(name)
    }
}

impl<K: AsRef<str>, V: AsRef<str>> Substitutions for Vec<(K, V)> {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.as_slice().lookup(name)
    }
}

impl<K, V, H> Substitutions for HashMap<K, V, H>
where
    K: Borrow<str> + Hash + Eq,
    V: AsRef<str>,
    H: BuildHasher,
{
    fn lookup(&self, name: &str) -> Option<&str> {
        self.get(name).map(|v| v.as_ref())
    }
}

impl<K: Borrow<str> + Ord, V: AsRef<str>> Substitutions for BTreeMap<K, V> {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.get(name).map(|v| v.as_ref())
    }
}

/// Returns the placeholder name if a token starts at byte offset `start`,
/// which must point at a `%`.
fn token_at(text: &str, start: usize) -> Option<&str> {
    let rest = &text[start + 1..];
    let bytes = rest.as_bytes();

    match bytes.first() {
        Some(b) if b.is_ascii_uppercase() || *b == b'_' => {}
        _ => return None,
    }

    let len = bytes
        .iter()
        .take_while(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || **b == b'_')
        .count();

    (bytes.get(len) == Some(&b'%')).then(|| &rest[..len])
}

/// Walks the tokens of `text`, yielding `(offset_of_opening_percent, name)`.
fn tokens(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut search = 0;
    std::iter::from_fn(move || {
        while let Some(offset) = text[search..].find('%') {
            let pos = search + offset;
            if let Some(name) = token_at(text, pos) {
                search = pos + name.len() + 2;
                return Some((pos, name));
            }
            search = pos + 1;
        }
        None
    })
}

/// Placeholder names in `text`, deduplicated, in order of first appearance.
pub fn placeholders(text: &str) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    for (_, name) in tokens(text) {
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Replaces every placeholder in `text` with its value from `substitutions`.
///
/// Fails with [`TemplateError::MissingSubstitution`] on the first placeholder
/// that has no value; no partial document is returned.
pub fn render<S: Substitutions + ?Sized>(
    text: &str,
    substitutions: &S,
) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;

    for (pos, name) in tokens(text) {
        let value = substitutions
            .lookup(name)
            .ok_or_else(|| TemplateError::MissingSubstitution {
                placeholder: name.to_string(),
            })?;
        out.push_str(&text[cursor..pos]);
        out.push_str(value);
        cursor = pos + name.len() + 2;
    }

    out.push_str(&text[cursor..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_every_occurrence() {
        let out = render("<p>%NAME%</p><b>%NAME%</b>", &[("NAME", "x")]).unwrap();
        assert_eq!(out, "<p>x</p><b>x</b>");
    }

    #[test]
    fn leaves_non_token_percent_untouched() {
        let text = "width:100%; height:50%; %lower% %1ABC% %% 100%";
        assert!(placeholders(text).is_empty());
        assert_eq!(render(text, &[("ABC", "nope")]).unwrap(), text);
    }

    #[test]
    fn does_not_rescan_substituted_values() {
        let out = render(
            "[%A%][%B%]",
            &[("A", "%B%"), ("B", "100% literal %A%")],
        )
        .unwrap();
        assert_eq!(out, "[%B%][100% literal %A%]");
    }

    #[test]
    fn missing_substitution_fails_the_same_way_every_time() {
        let subs: HashMap<&str, &str> = HashMap::from([("A", "a")]);
        for _ in 0..3 {
            assert_eq!(
                render("%A% %MISSING% %A%", &subs),
                Err(TemplateError::MissingSubstitution {
                    placeholder: "MISSING".to_string()
                })
            );
        }
    }

    #[test]
    fn token_adjacent_to_stray_percent() {
        assert_eq!(placeholders("50%%BODY%"), vec!["BODY"]);
        assert_eq!(render("50%%BODY%", &[("BODY", "x")]).unwrap(), "50%x");
        assert_eq!(render("%UNCLOSED", &[("UNCLOSED", "x")]).unwrap(), "%UNCLOSED");
    }

    #[test]
    fn placeholders_are_deduplicated_in_order() {
        assert_eq!(
            placeholders("%B_2% %A% %B_2% %_C%"),
            vec!["B_2", "A", "_C"]
        );
    }

    #[test]
    fn accepts_owned_maps() {
        let subs: BTreeMap<String, String> =
            BTreeMap::from([("X".to_string(), "<i>é</i>".to_string())]);
        assert_eq!(render("é%X%é", &subs).unwrap(), "é<i>é</i>é");

        let subs = vec![("X".to_string(), "y".to_string())];
        assert_eq!(render("%X%", &subs).unwrap(), "y");
    }
}
