//! Variable substitution – replaces `{{name}}` placeholders with formatted
//! values.
//!
//! System values are inserted as plain text. Custom (operator-entered)
//! values are wrapped in `<mark>…</mark>`, which the markup parser renders
//! bold and highlighted so reviewers can tell them apart in the letter.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::catalog;
use crate::variables::placeholders;

/// A value bound to a placeholder.
///
/// Deserialises from plain JSON: `null`, booleans, numbers, ISO dates and
/// strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableValue {
    Missing,
    Bool(bool),
    Number(f64),
    Date(NaiveDate),
    Text(String),
}

impl From<&str> for VariableValue {
    fn from(s: &str) -> Self {
        VariableValue::Text(s.to_string())
    }
}

impl From<String> for VariableValue {
    fn from(s: String) -> Self {
        VariableValue::Text(s)
    }
}

impl From<NaiveDate> for VariableValue {
    fn from(d: NaiveDate) -> Self {
        VariableValue::Date(d)
    }
}

impl From<bool> for VariableValue {
    fn from(b: bool) -> Self {
        VariableValue::Bool(b)
    }
}

impl<T: Into<VariableValue>> From<Option<T>> for VariableValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(VariableValue::Missing)
    }
}

/// Name → value bindings for one generation.
pub type Values = BTreeMap<String, VariableValue>;

/// Locale rules for rendering values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatOptions {
    /// `chrono` format string for dates.
    pub date_format: String,
    pub yes: String,
    pub no: String,
    /// Rendered for missing or empty values.
    pub missing: String,
    pub decimal_separator: char,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            date_format: "%d/%m/%Y".to_string(),
            yes: "Oui".to_string(),
            no: "Non".to_string(),
            missing: "[Non renseigné]".to_string(),
            decimal_separator: ',',
        }
    }
}

/// Parse an ISO-8601 calendar date or an RFC 3339 / ISO date-time.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|dt| dt.date())
}

/// Render a value as display text. Check order: missing/empty, dates
/// (including date-like strings), booleans, then plain coercion.
pub fn format_value(value: &VariableValue, opts: &FormatOptions) -> String {
    match value {
        VariableValue::Missing => opts.missing.clone(),
        VariableValue::Text(s) if s.trim().is_empty() => opts.missing.clone(),
        VariableValue::Date(d) => d.format(&opts.date_format).to_string(),
        VariableValue::Text(s) => match parse_date(s) {
            Some(d) => d.format(&opts.date_format).to_string(),
            None => s.clone(),
        },
        VariableValue::Bool(true) => opts.yes.clone(),
        VariableValue::Bool(false) => opts.no.clone(),
        VariableValue::Number(n) => format_number(*n, opts.decimal_separator),
    }
}

fn format_number(n: f64, decimal_separator: char) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string().replace('.', &decimal_separator.to_string())
    }
}

/// Escape text so the markup parser reproduces it verbatim.
pub(crate) fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

/// Replace every placeholder of `template`.
///
/// A name present in `system` wins over the same name in `custom`. Catalog
/// variables with no value render the plain missing placeholder. Names that
/// are neither bound nor catalogued are left untouched; surfacing them is
/// the job of [`validate`](crate::variables::validate).
pub fn substitute(template: &str, system: &Values, custom: &Values, opts: &FormatOptions) -> String {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for ph in placeholders(template) {
        out.push_str(&template[last..ph.start]);
        last = ph.end;

        if let Some(value) = system.get(ph.name) {
            out.push_str(&escape_markup(&format_value(value, opts)));
        } else if let Some(value) = custom.get(ph.name) {
            out.push_str("<mark>");
            out.push_str(&escape_markup(&format_value(value, opts)));
            out.push_str("</mark>");
        } else if catalog::is_system(ph.name) {
            out.push_str(&escape_markup(&opts.missing));
        } else {
            log::warn!("Leaving unresolved placeholder {{{{{}}}}}", ph.name);
            out.push_str(&template[ph.start..ph.end]);
        }
    }
    out.push_str(&template[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, VariableValue)]) -> Values {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn format_checks_in_order() {
        let opts = FormatOptions::default();
        assert_eq!(format_value(&VariableValue::Missing, &opts), "[Non renseigné]");
        assert_eq!(format_value(&"  ".into(), &opts), "[Non renseigné]");
        assert_eq!(format_value(&"2024-01-15".into(), &opts), "15/01/2024");
        assert_eq!(
            format_value(&"2024-03-02T10:30:00Z".into(), &opts),
            "02/03/2024"
        );
        assert_eq!(format_value(&true.into(), &opts), "Oui");
        assert_eq!(format_value(&false.into(), &opts), "Non");
        assert_eq!(format_value(&VariableValue::Number(2500.0), &opts), "2500");
        assert_eq!(format_value(&VariableValue::Number(35.5), &opts), "35,5");
        assert_eq!(format_value(&"CDI".into(), &opts), "CDI");
    }

    #[test]
    fn non_iso_dates_stay_text() {
        let opts = FormatOptions::default();
        assert_eq!(format_value(&"15/01/2024".into(), &opts), "15/01/2024");
    }

    #[test]
    fn system_plain_custom_marked() {
        let template = "Bonjour {{prenom}}, votre contrat {{type_contrat}} débute le {{date_debut}}.";
        let system = values(&[("prenom", "Jean".into()), ("type_contrat", "CDI".into())]);
        let custom = values(&[(
            "date_debut",
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap().into(),
        )]);
        let out = substitute(template, &system, &custom, &FormatOptions::default());
        assert_eq!(
            out,
            "Bonjour Jean, votre contrat CDI débute le <mark>15/01/2024</mark>."
        );
    }

    #[test]
    fn system_wins_over_custom() {
        let system = values(&[("nom", "Martin".into())]);
        let custom = values(&[("nom", "Autre".into())]);
        let out = substitute("{{nom}}", &system, &custom, &FormatOptions::default());
        assert_eq!(out, "Martin");
    }

    #[test]
    fn missing_system_values_are_never_marked() {
        let out = substitute(
            "{{prenom}} {{nom}}",
            &Values::new(),
            &Values::new(),
            &FormatOptions::default(),
        );
        assert_eq!(out, "[Non renseigné] [Non renseigné]");
        assert!(!out.contains("<mark>"));
    }

    #[test]
    fn unknown_tokens_are_left_verbatim() {
        let out = substitute("a {{mystere}} b", &Values::new(), &Values::new(), &FormatOptions::default());
        assert_eq!(out, "a {{mystere}} b");
    }

    #[test]
    fn values_are_escaped() {
        let system = values(&[("entreprise_nom", "Dupont & Fils <SA>".into())]);
        let out = substitute("{{entreprise_nom}}", &system, &Values::new(), &FormatOptions::default());
        assert_eq!(out, "Dupont &amp; Fils &lt;SA&gt;");
    }

    #[test]
    fn substitution_is_idempotent() {
        let template = "{{prenom}} {{bonus}} {{date_jour}}";
        let system = values(&[("prenom", "Léa".into()), ("date_jour", "2024-06-01".into())]);
        let custom = values(&[("bonus", VariableValue::Number(1200.5))]);
        let opts = FormatOptions::default();
        let a = substitute(template, &system, &custom, &opts);
        let b = substitute(template, &system, &custom, &opts);
        assert_eq!(a, b);
    }

    #[test]
    fn values_deserialise_from_plain_json() {
        let parsed: Values = serde_json::from_str(
            r#"{"a": null, "b": true, "c": 12, "d": "2024-01-15", "e": "CDI"}"#,
        )
        .unwrap();
        assert_eq!(parsed["a"], VariableValue::Missing);
        assert_eq!(parsed["b"], VariableValue::Bool(true));
        assert_eq!(parsed["c"], VariableValue::Number(12.0));
        assert_eq!(
            parsed["d"],
            VariableValue::Date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
        );
        assert_eq!(parsed["e"], VariableValue::Text("CDI".into()));
    }
}
