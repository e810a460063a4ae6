use crate::{Error, Result};
use serde::{Deserialize, Deserializer};
use serde_yaml::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// One answer.
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerValue {
    Text(String),
    Bool(bool),
    File(PathBuf),
    List(Vec<String>),
    Entries(Vec<AnswerMap>),
}

impl AnswerValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Booleans, or text spelled true/false/yes/no.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Text(s) => match s.trim().to_lowercase().as_str() {
                "true" | "yes" => Some(true),
                "false" | "no" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// File answers, or text naming a path.
    pub fn as_path(&self) -> Option<PathBuf> {
        match self {
            Self::File(p) => Some(p.clone()),
            Self::Text(s) => Some(PathBuf::from(s)),
            _ => None,
        }
    }

    /// Lists, or a single text value as a one-item list.
    pub fn as_list(&self) -> Option<Vec<String>> {
        match self {
            Self::List(v) => Some(v.clone()),
            Self::Text(s) => Some(vec![s.clone()]),
            _ => None,
        }
    }

    /// Empty text and empty lists count as no answer.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.is_empty(),
            Self::List(v) => v.is_empty(),
            Self::Entries(v) => v.is_empty(),
            Self::File(p) => p.as_os_str().is_empty(),
            Self::Bool(_) => false,
        }
    }

    fn from_yaml(key: &str, value: Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(Self::Bool(b)),
            Value::Number(n) => Ok(Self::Text(n.to_string())),
            Value::String(s) => Ok(Self::Text(s)),
            Value::Tagged(t) => Self::from_yaml(key, t.value),
            Value::Sequence(items) if items.iter().all(Value::is_mapping) && !items.is_empty() => {
                let entries = items
                    .into_iter()
                    .map(AnswerMap::from_value)
                    .collect::<Result<Vec<_>>>()?;
                Ok(Self::Entries(entries))
            }
            Value::Sequence(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s),
                    Value::Number(n) => Ok(n.to_string()),
                    Value::Bool(b) => Ok(b.to_string()),
                    _ => Err(Error::Config(format!(
                        "answer '{}': lists must hold only scalars or only maps",
                        key
                    ))),
                })
                .collect::<Result<Vec<_>>>()
                .map(Self::List),
            Value::Mapping(_) => Err(Error::Config(format!(
                "answer '{}': use a list of maps for repeatable entries",
                key
            ))),
            Value::Null => Err(Error::Config(format!("answer '{}' is null", key))),
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(s: &str) -> Self {
        Self::Text(s.into())
    }
}

impl From<String> for AnswerValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<bool> for AnswerValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Field name to answer. Built once per run, read-only while filling.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnswerMap {
    values: HashMap<String, AnswerValue>,
}

impl AnswerMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set any answer.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<AnswerValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn file(self, key: impl Into<String>, path: impl AsRef<Path>) -> Self {
        self.set_value(key, AnswerValue::File(path.as_ref().to_path_buf()))
    }

    pub fn list<I, S>(self, key: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_value(key, AnswerValue::List(items.into_iter().map(Into::into).collect()))
    }

    pub fn entries(self, key: impl Into<String>, entries: Vec<AnswerMap>) -> Self {
        self.set_value(key, AnswerValue::Entries(entries))
    }

    fn set_value(mut self, key: impl Into<String>, value: AnswerValue) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&AnswerValue> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Layer `other` on top; its answers win.
    pub fn merge(mut self, other: &AnswerMap) -> Self {
        for (k, v) in &other.values {
            self.values.insert(k.clone(), v.clone());
        }
        self
    }

    /// Parse from CLI args like "key=value".
    pub fn from_args(args: &[String]) -> Result<Self> {
        let mut answers = Self::new();
        for arg in args {
            let (key, value) = arg.split_once('=').ok_or_else(|| {
                Error::Config(format!("invalid answer '{}', expected key=value", arg))
            })?;
            answers.values.insert(key.to_string(), value.into());
        }
        Ok(answers)
    }

    /// Load answers from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse answers from a YAML mapping.
    pub fn parse(yaml: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(yaml)?;
        Self::from_value(value)
    }

    /// Build from a YAML mapping. Null values are treated as absent.
    pub fn from_value(value: Value) -> Result<Self> {
        let map = match value {
            Value::Mapping(m) => m,
            Value::Null => return Ok(Self::new()),
            _ => return Err(Error::Config("answers must be a mapping".into())),
        };
        let mut answers = Self::new();
        for (k, v) in map {
            let key = match k {
                Value::String(s) => s,
                other => {
                    return Err(Error::Config(format!(
                        "answer keys must be strings, got {:?}",
                        other
                    )))
                }
            };
            if v.is_null() {
                continue;
            }
            let value = AnswerValue::from_yaml(&key, v)?;
            answers.values.insert(key, value);
        }
        Ok(answers)
    }
}

impl<'de> Deserialize<'de> for AnswerMap {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scalar_answers() {
        let answers = AnswerMap::parse(
            r#"
first_name: Ada
last_name: Lovelace
previously_employed: false
start_year: 2012
gpa: "3.0"
middle_name: ~
"#,
        )
        .unwrap();
        assert_eq!(answers.get("first_name"), Some(&AnswerValue::Text("Ada".into())));
        assert_eq!(
            answers.get("previously_employed").and_then(|v| v.as_bool()),
            Some(false)
        );
        assert_eq!(answers.get("start_year").and_then(|v| v.as_text()), Some("2012"));
        assert_eq!(answers.get("gpa").and_then(|v| v.as_text()), Some("3.0"));
        assert!(!answers.contains("middle_name"));
    }

    #[test]
    fn test_parse_lists_and_entries() {
        let answers = AnswerMap::parse(
            r#"
skills: [Rust, Python, OpenCV]
education:
  - school: Stanford University
    degree: Masters
  - school: MIT
    degree: Bachelors
"#,
        )
        .unwrap();
        assert_eq!(
            answers.get("skills"),
            Some(&AnswerValue::List(vec![
                "Rust".into(),
                "Python".into(),
                "OpenCV".into()
            ]))
        );
        match answers.get("education") {
            Some(AnswerValue::Entries(entries)) => {
                assert_eq!(entries.len(), 2);
                assert_eq!(
                    entries[1].get("school").and_then(|v| v.as_text()),
                    Some("MIT")
                );
            }
            other => panic!("Expected entries, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_nested_map() {
        let err = AnswerMap::parse("address:\n  city: Paris\n").unwrap_err();
        assert!(err.to_string().contains("address"));
    }

    #[test]
    fn test_merge_later_wins() {
        let defaults = AnswerMap::new().set("country", "United States +1").set("phone", "555");
        let overrides = AnswerMap::new().set("country", "United Kingdom +44");
        let merged = defaults.merge(&overrides);
        assert_eq!(
            merged.get("country").and_then(|v| v.as_text()),
            Some("United Kingdom +44")
        );
        assert_eq!(merged.get("phone").and_then(|v| v.as_text()), Some("555"));
    }

    #[test]
    fn test_answers_from_args() {
        let args = vec!["first_name=Ada".to_string(), "url=https://x.io/?a=b".to_string()];
        let answers = AnswerMap::from_args(&args).unwrap();
        assert_eq!(answers.get("first_name").and_then(|v| v.as_text()), Some("Ada"));
        assert_eq!(
            answers.get("url").and_then(|v| v.as_text()),
            Some("https://x.io/?a=b")
        );
        assert!(AnswerMap::from_args(&["novalue".to_string()]).is_err());
    }

    #[test]
    fn test_value_coercions() {
        assert_eq!(AnswerValue::from("Yes").as_bool(), Some(true));
        assert_eq!(AnswerValue::from("maybe").as_bool(), None);
        assert_eq!(
            AnswerValue::from("resume.pdf").as_path(),
            Some(PathBuf::from("resume.pdf"))
        );
        assert_eq!(AnswerValue::from("Rust").as_list(), Some(vec!["Rust".to_string()]));
        assert!(AnswerValue::from("").is_empty());
        assert!(!AnswerValue::Bool(false).is_empty());
    }
}
