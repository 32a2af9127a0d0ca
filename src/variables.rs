//! Placeholder extraction and classification.
//!
//! A placeholder is `{{identifier}}` with `identifier` matching
//! `[A-Za-z_][A-Za-z0-9_]*`. Anything else between double braces is plain
//! text.

use std::collections::HashSet;

use serde::Serialize;

use crate::catalog;
use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TemplateVariable {
    pub name: String,
}

/// Disjoint partition of a template's placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub system: Vec<TemplateVariable>,
    pub custom: Vec<TemplateVariable>,
    pub unknown: Vec<TemplateVariable>,
}

impl Classification {
    pub fn is_resolved(&self) -> bool {
        self.unknown.is_empty()
    }

    pub fn unknown_names(&self) -> Vec<String> {
        self.unknown.iter().map(|v| v.name.clone()).collect()
    }
}

/// A placeholder occurrence: byte range of the whole `{{…}}` token and the
/// identifier inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Placeholder<'a> {
    pub start: usize,
    pub end: usize,
    pub name: &'a str,
}

/// Scan `text` for placeholders in document order.
pub(crate) fn placeholders(text: &str) -> Vec<Placeholder<'_>> {
    let bytes = text.as_bytes();
    let mut found = Vec::new();
    let mut pos = 0;

    while let Some(rel) = text[pos..].find("{{") {
        let start = pos + rel;
        let ident_start = start + 2;
        let mut i = ident_start;
        if i < bytes.len() && (bytes[i].is_ascii_alphabetic() || bytes[i] == b'_') {
            i += 1;
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            if text[i..].starts_with("}}") {
                found.push(Placeholder {
                    start,
                    end: i + 2,
                    name: &text[ident_start..i],
                });
                pos = i + 2;
                continue;
            }
        }
        // Not a placeholder; retry one byte further so `{{{name}}` still
        // finds the inner token.
        pos = start + 1;
    }
    found
}

/// Extract the distinct placeholders of `text`, in first-occurrence order.
pub fn extract(text: &str) -> Vec<TemplateVariable> {
    let mut seen = HashSet::new();
    placeholders(text)
        .into_iter()
        .filter(|p| seen.insert(p.name))
        .map(|p| TemplateVariable {
            name: p.name.to_string(),
        })
        .collect()
}

/// Partition `tokens` into system / custom / unknown. A name that is both a
/// catalog variable and a custom name is classified as system.
pub fn classify<S: AsRef<str>>(tokens: &[TemplateVariable], custom_names: &[S]) -> Classification {
    let custom: HashSet<&str> = custom_names.iter().map(|s| s.as_ref()).collect();
    let mut out = Classification::default();
    for token in tokens {
        if catalog::is_system(&token.name) {
            out.system.push(token.clone());
        } else if custom.contains(token.name.as_str()) {
            out.custom.push(token.clone());
        } else {
            out.unknown.push(token.clone());
        }
    }
    out
}

/// Authoring pre-flight: classify the template and fail when any
/// placeholder is unknown.
pub fn validate<S: AsRef<str>>(template: &str, custom_names: &[S]) -> Result<Classification, Error> {
    let classification = classify(&extract(template), custom_names);
    if classification.is_resolved() {
        Ok(classification)
    } else {
        Err(Error::UnresolvedVariables(classification.unknown_names()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(vars: &[TemplateVariable]) -> Vec<&str> {
        vars.iter().map(|v| v.name.as_str()).collect()
    }

    #[test]
    fn extract_dedupes_in_first_occurrence_order() {
        let vars = extract("{{nom}} {{prenom}} {{nom}} {{_x1}}");
        assert_eq!(names(&vars), vec!["nom", "prenom", "_x1"]);
    }

    #[test]
    fn extract_rejects_invalid_identifiers() {
        let vars = extract("{{ nom }} {{1abc}} {{a-b}} {{}} {{ok}}");
        assert_eq!(names(&vars), vec!["ok"]);
    }

    #[test]
    fn extract_finds_token_after_extra_brace() {
        let vars = extract("{{{prenom}}}");
        assert_eq!(names(&vars), vec!["prenom"]);
    }

    #[test]
    fn placeholder_offsets_cover_braces() {
        let text = "Hi {{prenom}}!";
        let found = placeholders(text);
        assert_eq!(found.len(), 1);
        assert_eq!(&text[found[0].start..found[0].end], "{{prenom}}");
    }

    #[test]
    fn classify_gives_system_precedence() {
        let tokens = extract("{{prenom}} {{prime}} {{mystere}}");
        let c = classify(&tokens, &["prenom", "prime"]);
        assert_eq!(names(&c.system), vec!["prenom"]);
        assert_eq!(names(&c.custom), vec!["prime"]);
        assert_eq!(names(&c.unknown), vec!["mystere"]);
    }

    #[test]
    fn classify_partitions_are_disjoint_and_exhaustive() {
        let template = "{{nom}} {{a}} {{b}} {{ville}} {{c}} {{a}} {{poste}}";
        let tokens = extract(template);
        let c = classify(&tokens, &["a", "ville", "z"]);

        let mut union: Vec<&str> = names(&c.system);
        union.extend(names(&c.custom));
        union.extend(names(&c.unknown));
        let total = union.len();
        let distinct: HashSet<&str> = union.iter().copied().collect();

        assert_eq!(total, distinct.len(), "partitions overlap");
        assert_eq!(distinct, names(&tokens).into_iter().collect());
    }

    #[test]
    fn validate_lists_unknown_names() {
        let err = validate("{{prenom}} {{bonus}} {{autre}}", &["bonus"]).unwrap_err();
        assert_eq!(err.unresolved_names(), ["autre"]);

        let ok = validate("{{prenom}} {{bonus}}", &["bonus"]).unwrap();
        assert!(ok.is_resolved());
    }
}
