use anyhow::{Context, Result};
use regex::{Captures, Regex};
use serde_json::{Map, Value};

pub const NONE_PLACEHOLDER: &str = "None";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedValue {
    Scalar(String),
    List(Vec<String>),
    Mapping(Vec<(String, Vec<String>)>),
}

impl ParsedValue {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::List(_) => "list",
            Self::Mapping(_) => "mapping",
        }
    }

    pub fn to_canonical_json(&self) -> String {
        match self {
            Self::Scalar(raw) => raw.clone(),
            Self::List(items) => Value::from(items.clone()).to_string(),
            Self::Mapping(members) => {
                let object: Map<String, Value> = members
                    .iter()
                    .map(|(key, items)| (key.clone(), Value::from(items.clone())))
                    .collect();
                Value::Object(object).to_string()
            }
        }
    }

    pub fn into_string_list(self) -> Vec<String> {
        let items = match self {
            Self::Scalar(raw) => vec![raw],
            Self::List(items) => items,
            Self::Mapping(members) => members.into_iter().flat_map(|(_, items)| items).collect(),
        };

        items
            .into_iter()
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect()
    }
}

pub struct ValueParser {
    python_literal: Regex,
    list_delimiters: Regex,
    camel_boundary: Regex,
}

impl ValueParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            python_literal: Regex::new(r#""(?:[^"\\]|\\.)*"|\b(None|True|False)\b"#)
                .context("failed to compile python literal regex")?,
            list_delimiters: Regex::new(r"[,;]+").context("failed to compile delimiter regex")?,
            camel_boundary: Regex::new(r"([a-z])([A-Z])")
                .context("failed to compile camel-case regex")?,
        })
    }

    pub fn parse(&self, raw: &str) -> ParsedValue {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return ParsedValue::List(Vec::new());
        }

        if let Some(value) = self.parse_json_like(trimmed) {
            return match value {
                Value::Array(items) => ParsedValue::List(items.iter().map(stringify).collect()),
                Value::Object(members) => ParsedValue::Mapping(
                    members
                        .iter()
                        .map(|(key, member)| (key.clone(), self.coerce_list(member)))
                        .collect(),
                ),
                _ => ParsedValue::Scalar(raw.to_string()),
            };
        }

        if looks_like_list(trimmed) {
            return ParsedValue::List(self.split_flat(trimmed));
        }

        ParsedValue::Scalar(raw.to_string())
    }

    pub fn reasons(&self, raw: &str) -> Vec<String> {
        self.parse(raw).into_string_list()
    }

    pub fn render(&self, raw: &str) -> String {
        match self.parse(raw) {
            ParsedValue::Scalar(text) => text,
            ParsedValue::List(items) if items.is_empty() => {
                if raw.trim().is_empty() {
                    String::new()
                } else {
                    NONE_PLACEHOLDER.to_string()
                }
            }
            ParsedValue::List(items) => items.join(", "),
            ParsedValue::Mapping(members) if members.is_empty() => NONE_PLACEHOLDER.to_string(),
            ParsedValue::Mapping(members) => members
                .iter()
                .map(|(key, items)| {
                    let shown = if items.is_empty() {
                        NONE_PLACEHOLDER.to_string()
                    } else {
                        items.join(", ")
                    };
                    format!("{}: {}", self.humanize_key(key), shown)
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    pub fn humanize_key(&self, key: &str) -> String {
        let spaced = key.replace('_', " ");
        let spaced = self.camel_boundary.replace_all(&spaced, "$1 $2");
        let collapsed = spaced.split_whitespace().collect::<Vec<_>>().join(" ");

        let mut out = String::with_capacity(collapsed.len());
        let mut at_word_start = true;
        for ch in collapsed.chars() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.push(ch);
            }
            at_word_start = !(ch.is_alphanumeric() || ch == '_');
        }
        out
    }

    fn parse_json_like(&self, text: &str) -> Option<Value> {
        if let Ok(value) = serde_json::from_str::<Value>(text) {
            return Some(value);
        }

        let requoted = text.replace('\'', "\"");
        let normalized = self
            .python_literal
            .replace_all(&requoted, |caps: &Captures<'_>| match caps.get(1) {
                Some(token) => match token.as_str() {
                    "None" => "null".to_string(),
                    "True" => "true".to_string(),
                    _ => "false".to_string(),
                },
                None => caps[0].to_string(),
            });

        serde_json::from_str::<Value>(&normalized).ok()
    }

    fn coerce_list(&self, value: &Value) -> Vec<String> {
        match value {
            Value::Null => Vec::new(),
            Value::Array(items) => items.iter().map(stringify).collect(),
            Value::Object(members) => {
                let mut out = Vec::new();
                for member in members.values() {
                    match member {
                        Value::Array(items) => out.extend(items.iter().map(stringify)),
                        Value::String(text) => out.push(text.clone()),
                        Value::Number(_) | Value::Bool(_) => out.push(member.to_string()),
                        Value::Null | Value::Object(_) => {}
                    }
                }
                out
            }
            Value::String(text) => {
                let text = text.trim();
                if let Some(Value::Array(items)) = self.parse_json_like(text) {
                    return items.iter().map(stringify).collect();
                }
                if text.contains([',', ';']) {
                    return self.split_flat(text);
                }
                if text.is_empty() {
                    Vec::new()
                } else {
                    vec![text.to_string()]
                }
            }
            Value::Number(_) | Value::Bool(_) => vec![value.to_string()],
        }
    }

    fn split_flat(&self, text: &str) -> Vec<String> {
        let inner = text
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .unwrap_or(text);

        self.list_delimiters
            .split(inner)
            .map(|piece| piece.trim_matches(|ch: char| ch.is_whitespace() || ch == '\'' || ch == '"'))
            .filter(|piece| !piece.is_empty())
            .map(ToOwned::to_owned)
            .collect()
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn looks_like_list(text: &str) -> bool {
    (text.starts_with('[') && text.ends_with(']')) || text.contains([',', ';'])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> ValueParser {
        ValueParser::new().expect("regexes compile")
    }

    fn list(items: &[&str]) -> ParsedValue {
        ParsedValue::List(items.iter().map(|item| item.to_string()).collect())
    }

    #[test]
    fn python_style_list_and_empty_cell() {
        let parser = parser();
        assert_eq!(parser.parse("['A', 'B']"), list(&["A", "B"]));
        assert_eq!(parser.parse(""), list(&[]));
        assert_eq!(parser.parse("   "), list(&[]));
    }

    #[test]
    fn strict_json_wins_before_normalization() {
        let parser = parser();
        assert_eq!(parser.parse(r#"["it's", "x"]"#), list(&["it's", "x"]));
        assert_eq!(parser.parse("[1, true, null]"), list(&["1", "true", "null"]));
    }

    #[test]
    fn python_literals_are_rewritten() {
        let parser = parser();
        let parsed = parser.parse("{'gpc': None, 'optout': True, 'vendors': ['a', 'b']}");
        assert_eq!(
            parsed,
            ParsedValue::Mapping(vec![
                ("gpc".to_string(), vec![]),
                ("optout".to_string(), vec!["true".to_string()]),
                ("vendors".to_string(), vec!["a".to_string(), "b".to_string()]),
            ])
        );
    }

    #[test]
    fn nested_objects_flatten_into_one_list() {
        let parser = parser();
        let parsed = parser.parse(
            r#"{"third_party": {"ads": ["x.com", "y.com"], "note": "z.com", "n": 3, "skip": null}}"#,
        );
        assert_eq!(
            parsed,
            ParsedValue::Mapping(vec![(
                "third_party".to_string(),
                vec!["x.com", "y.com", "z.com", "3"]
                    .into_iter()
                    .map(String::from)
                    .collect()
            )])
        );
    }

    #[test]
    fn delimiter_bearing_member_strings_are_split() {
        let parser = parser();
        let parsed = parser.parse(r#"{"domains": "a.com, b.com; c.com"}"#);
        assert_eq!(
            parsed,
            ParsedValue::Mapping(vec![(
                "domains".to_string(),
                vec!["a.com".to_string(), "b.com".to_string(), "c.com".to_string()]
            )])
        );
    }

    #[test]
    fn member_strings_split_like_top_level_lists() {
        let parser = parser();
        let ParsedValue::List(top_level) = parser.parse("'a', 'b'; c") else {
            panic!("expected a list");
        };
        assert_eq!(top_level, vec!["a", "b", "c"]);

        let ParsedValue::Mapping(members) = parser.parse(r#"{"k": "'a', 'b'; c"}"#) else {
            panic!("expected a mapping");
        };
        assert_eq!(members, vec![("k".to_string(), top_level)]);
    }

    #[test]
    fn literal_rewrite_leaves_quoted_text_alone() {
        let parser = parser();
        assert_eq!(
            parser.parse("['None of these', None, 'True story']"),
            list(&["None of these", "null", "True story"])
        );
        assert_eq!(
            parser.parse("{'note': 'None given', 'flag': False}"),
            ParsedValue::Mapping(vec![
                ("note".to_string(), vec!["None given".to_string()]),
                ("flag".to_string(), vec!["false".to_string()]),
            ])
        );
    }

    #[test]
    fn unparsable_lists_fall_back_to_flat_split() {
        let parser = parser();
        assert_eq!(
            parser.parse("[uspapi, 'Don't', \"x\"]"),
            list(&["uspapi", "Don't", "x"])
        );
        assert_eq!(parser.parse("a; b ;c"), list(&["a", "b", "c"]));
        assert_eq!(parser.parse("[ , ]"), list(&[]));
    }

    #[test]
    fn plain_text_and_json_scalars_stay_scalar() {
        let parser = parser();
        assert_eq!(
            parser.parse("example.com"),
            ParsedValue::Scalar("example.com".to_string())
        );
        assert_eq!(parser.parse("{broken"), ParsedValue::Scalar("{broken".to_string()));
        assert_eq!(parser.parse(" 42 "), ParsedValue::Scalar(" 42 ".to_string()));
    }

    #[test]
    fn reparsing_canonical_form_is_idempotent() {
        let parser = parser();
        let samples = [
            "['A', 'B']",
            r#"["x", 1, false]"#,
            "{'k': ['v1', 'v2'], 'n': None}",
            r#"{"outer": {"inner": ["a"], "other": "b, c"}}"#,
            "{}",
            "[]",
        ];

        for sample in samples {
            let first = parser.parse(sample);
            let second = parser.parse(&first.to_canonical_json());
            assert_eq!(first, second, "sample {sample}");
        }
    }

    #[test]
    fn reasons_collapse_any_shape_into_codes() {
        let parser = parser();
        assert_eq!(
            parser.reasons("['uspapi','OptanonConsent']"),
            vec!["uspapi", "OptanonConsent"]
        );
        assert_eq!(parser.reasons("uspapi"), vec!["uspapi"]);
        assert_eq!(parser.reasons(" [ 'Well-Known' ] "), vec!["Well-Known"]);
        assert!(parser.reasons("").is_empty());
    }

    #[test]
    fn render_uses_none_placeholder_for_empty_structures() {
        let parser = parser();
        assert_eq!(parser.render("{}"), NONE_PLACEHOLDER);
        assert_eq!(parser.render("[]"), NONE_PLACEHOLDER);
        assert_eq!(parser.render(""), "");
        assert_eq!(parser.render("['a', 'b']"), "a, b");
        assert_eq!(
            parser.render("{'sale_optOut': [], 'vendors': ['v']}"),
            "Sale Opt Out: None\nVendors: v"
        );
    }

    #[test]
    fn humanize_key_splits_underscores_and_camel_case() {
        let parser = parser();
        assert_eq!(parser.humanize_key("consent_stringValue"), "Consent String Value");
        assert_eq!(parser.humanize_key("  well-known__status "), "Well-Known Status");
    }
}
