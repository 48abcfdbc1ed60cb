//! # Template Engine
//!
//! Placeholder extraction and substitution over prompt bodies.
//!
//! A placeholder token is `{{key}}` where `key` matches `[A-Za-z][A-Za-z0-9_]*`.
//! Anything else, including malformed tokens such as `{{1abc}}` or `{{}}`, is
//! literal text and is passed through untouched.
//!
//! # Examples
//!
//! ```rust
//! use pvault_core::template::{extract_placeholders, render_template, PlaceholderValues};
//!
//! let body = "Hello {{name}}, meet {{friend}} and {{name}}";
//! assert_eq!(extract_placeholders(body), vec!["name", "friend"]);
//!
//! let mut values = PlaceholderValues::new();
//! values.insert("name".to_string(), "Ada".to_string());
//! assert_eq!(render_template(body, &values), "Hello Ada, meet  and Ada");
//! ```

use std::collections::BTreeMap;

use crate::parser::parse_template;

/// Current user-entered value per placeholder key.
pub type PlaceholderValues = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplatePart {
    Literal(String),
    Placeholder(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Template {
    pub parts: Vec<TemplatePart>,
}

/// A piece of the highlighted preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewSegment {
    Text(String),
    Filled(String),
    /// A placeholder without a value. Keeps its raw token so it can be shown dimmed.
    Unfilled {
        token: String,
        key: String,
        active: bool,
    },
}

impl Template {
    pub fn parse(body: &str) -> Template {
        match parse_template(body) {
            Ok((_, template)) => template,
            // The grammar accepts every input; keep the body verbatim if that ever changes.
            Err(_) => Template {
                parts: vec![TemplatePart::Literal(body.to_string())],
            },
        }
    }

    /// Distinct placeholder keys in order of first appearance.
    pub fn placeholders(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for part in &self.parts {
            if let TemplatePart::Placeholder(key) = part {
                if !keys.contains(&key.as_str()) {
                    keys.push(key);
                }
            }
        }
        keys
    }

    /// Substitutes every placeholder with its value, or with nothing when it has none.
    pub fn render(&self, values: &PlaceholderValues) -> String {
        let mut result = String::new();

        for part in &self.parts {
            match part {
                TemplatePart::Literal(text) => result.push_str(text),
                TemplatePart::Placeholder(key) => {
                    if let Some(value) = values.get(key) {
                        result.push_str(value);
                    }
                }
            }
        }

        result
    }

    pub fn preview(
        &self,
        values: &PlaceholderValues,
        active_key: Option<&str>,
    ) -> Vec<PreviewSegment> {
        self.parts
            .iter()
            .map(|part| match part {
                TemplatePart::Literal(text) => PreviewSegment::Text(text.clone()),
                TemplatePart::Placeholder(key) => match values.get(key) {
                    Some(value) if !value.is_empty() => PreviewSegment::Filled(value.clone()),
                    _ => PreviewSegment::Unfilled {
                        token: format!("{{{{{key}}}}}"),
                        key: key.clone(),
                        active: active_key == Some(key.as_str()),
                    },
                },
            })
            .collect()
    }
}

pub fn extract_placeholders(body: &str) -> Vec<String> {
    Template::parse(body)
        .placeholders()
        .into_iter()
        .map(str::to_string)
        .collect()
}

pub fn render_template(body: &str, values: &PlaceholderValues) -> String {
    Template::parse(body).render(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> PlaceholderValues {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_extract_placeholders_deduplicates_in_order() {
        assert_eq!(extract_placeholders("{{a}} {{b}} {{a}}"), vec!["a", "b"]);
    }

    #[test]
    fn test_extract_placeholders_empty_body() {
        assert!(extract_placeholders("").is_empty());
    }

    #[test]
    fn test_extract_placeholders_ignores_malformed() {
        let keys = extract_placeholders("{{1abc}} {{}} {{ok}} {{unclosed");
        assert_eq!(keys, vec!["ok"]);
    }

    #[test]
    fn test_render_template_missing_value_is_empty() {
        assert_eq!(render_template("X {{k}} Y", &PlaceholderValues::new()), "X  Y");
    }

    #[test]
    fn test_render_template_substitutes_value() {
        assert_eq!(render_template("X {{k}} Y", &values(&[("k", "Z")])), "X Z Y");
    }

    #[test]
    fn test_render_template_replaces_every_occurrence() {
        let rendered = render_template("{{a}}-{{a}}-{{b}}", &values(&[("a", "1"), ("b", "2")]));
        assert_eq!(rendered, "1-1-2");
    }

    #[test]
    fn test_render_template_preserves_non_token_text() {
        let body = "line one\r\n  {{1abc}} {{}} {name}\ttabs\n🚀 {{{{x}}}}";
        let rendered = render_template(body, &values(&[("x", "X")]));
        assert_eq!(rendered, "line one\r\n  {{1abc}} {{}} {name}\ttabs\n🚀 {{X}}");
    }

    #[test]
    fn test_render_template_is_repeatable() {
        let template = Template::parse("Dear {{name}}, you are {{age}} years old!");
        let vals = values(&[("name", "Alice"), ("age", "30")]);
        let first = template.render(&vals);
        assert_eq!(first, template.render(&vals));
        assert_eq!(first, "Dear Alice, you are 30 years old!");
    }

    #[test]
    fn test_render_value_containing_token_is_not_expanded() {
        let rendered = render_template("{{a}}", &values(&[("a", "{{b}}"), ("b", "nope")]));
        assert_eq!(rendered, "{{b}}");
    }

    #[test]
    fn test_preview_marks_unfilled_and_active() {
        let template = Template::parse("Hi {{name}} from {{place}}");
        let segments = template.preview(&values(&[("place", "Oslo"), ("name", "")]), Some("name"));
        assert_eq!(
            segments,
            vec![
                PreviewSegment::Text("Hi ".to_string()),
                PreviewSegment::Unfilled {
                    token: "{{name}}".to_string(),
                    key: "name".to_string(),
                    active: true,
                },
                PreviewSegment::Text(" from ".to_string()),
                PreviewSegment::Filled("Oslo".to_string()),
            ]
        );
    }
}
