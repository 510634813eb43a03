use crate::{walk, Lockfile};
use serde_json::Value;
use std::collections::BTreeSet;

/// Collect the unique string values of every field called `field` in `value`, at any depth.
///
/// A URL referenced by many dependency nodes appears once. Non-string values are ignored.
pub fn collect_field_strings(value: &Value, field: &str) -> BTreeSet<String> {
    let mut urls = BTreeSet::new();
    walk(value, |key, node| {
        if !key.is_field(field) {
            return;
        }
        if let Some(url) = node.as_str() {
            urls.insert(url.to_string());
        }
    });
    urls
}

impl Lockfile {
    /// Unique resolved URLs of every dependency in the lockfile.
    pub fn resolved_urls(&self) -> BTreeSet<String> {
        collect_field_strings(&self.value, Lockfile::RESOLVED_FIELD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn repeated_urls_are_collected_once() {
        let lockfile = Lockfile {
            value: json!({
                "name": "app",
                "dependencies": {
                    "a": {
                        "version": "1.0.0",
                        "resolved": "https://registry.npmjs.org/a/-/a-1.0.0.tgz",
                        "dependencies": {
                            "c": { "resolved": "https://registry.npmjs.org/c/-/c-2.0.0.tgz" },
                        },
                    },
                    "b": {
                        "resolved": "https://example.com/b.tgz",
                        "dependencies": {
                            "c": { "resolved": "https://registry.npmjs.org/c/-/c-2.0.0.tgz" },
                        },
                    },
                    "d": { "resolved": "https://registry.npmjs.org/c/-/c-2.0.0.tgz" },
                },
            }),
        };

        let received: Vec<_> = lockfile.resolved_urls().into_iter().collect();

        assert_eq!(
            received,
            [
                "https://example.com/b.tgz",
                "https://registry.npmjs.org/a/-/a-1.0.0.tgz",
                "https://registry.npmjs.org/c/-/c-2.0.0.tgz",
            ],
        );
    }

    #[test]
    fn non_string_values_are_ignored() {
        let value = json!({ "resolved": 1, "nested": { "resolved": null } });
        assert_eq!(collect_field_strings(&value, "resolved"), BTreeSet::new());
    }

    #[test]
    fn other_field_names_are_ignored() {
        let value = json!({ "a": { "_resolved": "https://example.com/a.tgz" } });
        assert_eq!(collect_field_strings(&value, "resolved"), BTreeSet::new());
        assert_eq!(
            collect_field_strings(&value, "_resolved"),
            BTreeSet::from(["https://example.com/a.tgz".to_string()]),
        );
    }
}
