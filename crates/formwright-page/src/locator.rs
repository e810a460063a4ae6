//! Locator grammar - how a field finds its element, written as data.
//!
//! | form | meaning |
//! |---|---|
//! | `role:textbox=First Name` | ARIA role with exact accessible name |
//! | `role:button=/^Add( Another)?$/` | role with a regex name |
//! | `role:option` | role, any name |
//! | `label:Email` | form control labelled "Email" |
//! | `css:#phone` | CSS selector |
//! | `id$:--url` | element whose id ends with a suffix |
//! | `placeholder:Search` | placeholder contains |
//! | `text:Submit` | visible text contains (the default for unprefixed strings) |
//! | `A >> B` | `B` inside an element matched by `A` |

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Accessible-name matcher for role locators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum NamePattern {
    Exact(String),
    Regex(String),
}

impl NamePattern {
    /// `/.../` is a regex, anything else an exact name.
    pub fn parse(s: &str) -> Self {
        match s.strip_prefix('/').and_then(|r| r.strip_suffix('/')) {
            Some(re) if !re.is_empty() => NamePattern::Regex(re.into()),
            _ => NamePattern::Exact(s.into()),
        }
    }
}

impl fmt::Display for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamePattern::Exact(s) => write!(f, "{}", s),
            NamePattern::Regex(s) => write!(f, "/{}/", s),
        }
    }
}

/// A site-specific element description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Locator {
    Role {
        role: String,
        name: Option<NamePattern>,
    },
    Label {
        text: String,
    },
    Css {
        selector: String,
    },
    IdSuffix {
        suffix: String,
    },
    Placeholder {
        text: String,
    },
    Text {
        text: String,
    },
    Within {
        scope: Box<Locator>,
        inner: Box<Locator>,
    },
}

impl Locator {
    /// Parse a locator string. Unprefixed strings are text searches.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();

        if let Some((scope, inner)) = s.split_once(">>") {
            return Locator::Within {
                scope: Box::new(Self::parse(scope)),
                inner: Box::new(Self::parse(inner)),
            };
        }
        if let Some(v) = s.strip_prefix("role:") {
            let (role, name) = match v.split_once('=') {
                Some((r, n)) => (r.trim(), Some(NamePattern::parse(n.trim()))),
                None => (v.trim(), None),
            };
            return Locator::Role {
                role: role.into(),
                name,
            };
        }
        if let Some(v) = s.strip_prefix("label:") {
            return Locator::Label { text: v.into() };
        }
        if let Some(v) = s.strip_prefix("css:") {
            return Locator::Css { selector: v.into() };
        }
        if let Some(v) = s.strip_prefix("id$:") {
            return Locator::IdSuffix { suffix: v.into() };
        }
        if let Some(v) = s.strip_prefix("placeholder:") {
            return Locator::Placeholder { text: v.into() };
        }
        if let Some(v) = s.strip_prefix("text:") {
            return Locator::Text { text: v.into() };
        }
        Locator::Text { text: s.into() }
    }

    /// Shorthand for `role:<role>=<name>`.
    pub fn role(role: impl Into<String>, name: impl Into<String>) -> Self {
        Locator::Role {
            role: role.into(),
            name: Some(NamePattern::Exact(name.into())),
        }
    }

    /// Scope `inner` to elements matched by `self`.
    pub fn within(self, inner: Locator) -> Self {
        Locator::Within {
            scope: Box::new(self),
            inner: Box::new(inner),
        }
    }

    /// Structural problems (empty parts). Regex names are checked by the caller.
    pub fn problems(&self) -> Vec<String> {
        let mut out = Vec::new();
        match self {
            Locator::Role { role, name } => {
                if role.is_empty() {
                    out.push("role locator without a role".to_string());
                }
                if let Some(NamePattern::Exact(n)) = name {
                    if n.is_empty() {
                        out.push(format!("role '{}' with an empty name", role));
                    }
                }
            }
            Locator::Label { text: v }
            | Locator::Css { selector: v }
            | Locator::IdSuffix { suffix: v }
            | Locator::Placeholder { text: v }
            | Locator::Text { text: v } => {
                if v.trim().is_empty() {
                    out.push(format!("empty locator '{}'", self));
                }
            }
            Locator::Within { scope, inner } => {
                out.extend(scope.problems());
                out.extend(inner.problems());
            }
        }
        out
    }

    /// Regex sources used anywhere in this locator.
    pub fn regex_patterns(&self) -> Vec<&str> {
        match self {
            Locator::Role {
                name: Some(NamePattern::Regex(re)),
                ..
            } => vec![re.as_str()],
            Locator::Within { scope, inner } => {
                let mut v = scope.regex_patterns();
                v.extend(inner.regex_patterns());
                v
            }
            _ => Vec::new(),
        }
    }
}

impl From<&str> for Locator {
    fn from(s: &str) -> Self {
        Locator::parse(s)
    }
}

impl<'de> Deserialize<'de> for Locator {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Locator::parse(&s))
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Role { role, name: None } => write!(f, "role:{}", role),
            Locator::Role {
                role,
                name: Some(n),
            } => write!(f, "role:{}={}", role, n),
            Locator::Label { text } => write!(f, "label:{}", text),
            Locator::Css { selector } => write!(f, "css:{}", selector),
            Locator::IdSuffix { suffix } => write!(f, "id$:{}", suffix),
            Locator::Placeholder { text } => write!(f, "placeholder:{}", text),
            Locator::Text { text } => write!(f, "text:{}", text),
            Locator::Within { scope, inner } => write!(f, "{} >> {}", scope, inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_role_with_name() {
        assert_eq!(
            Locator::parse("role:textbox=School or University"),
            Locator::role("textbox", "School or University")
        );
        assert_eq!(
            Locator::parse("role:option"),
            Locator::Role {
                role: "option".into(),
                name: None
            }
        );
    }

    #[test]
    fn parse_role_regex_name() {
        let loc = Locator::parse("role:button=/^Add( Another)?$/");
        assert_eq!(
            loc,
            Locator::Role {
                role: "button".into(),
                name: Some(NamePattern::Regex("^Add( Another)?$".into()))
            }
        );
        assert_eq!(loc.regex_patterns(), vec!["^Add( Another)?$"]);
    }

    #[test]
    fn parse_prefixes() {
        assert!(matches!(Locator::parse("label:Email"), Locator::Label { .. }));
        assert!(matches!(Locator::parse("css:#phone"), Locator::Css { .. }));
        assert!(matches!(Locator::parse("id$:--url"), Locator::IdSuffix { .. }));
        assert!(matches!(
            Locator::parse("placeholder:Search"),
            Locator::Placeholder { .. }
        ));
        assert!(matches!(Locator::parse("text:Submit"), Locator::Text { .. }));
    }

    #[test]
    fn parse_unprefixed_is_text() {
        assert_eq!(
            Locator::parse("  Save and Continue "),
            Locator::Text {
                text: "Save and Continue".into()
            }
        );
    }

    #[test]
    fn parse_scoped() {
        let loc = Locator::parse("role:group=Education >> role:button=Add");
        assert_eq!(
            loc,
            Locator::role("group", "Education").within(Locator::role("button", "Add"))
        );
        assert_eq!(loc.to_string(), "role:group=Education >> role:button=Add");
    }

    #[test]
    fn display_round_trips_through_parse() {
        for s in [
            "role:combobox=Country",
            "css:input#resume",
            "id$:--url",
            "role:group=Websites >> id$:--url",
        ] {
            assert_eq!(Locator::parse(s).to_string(), s);
        }
    }

    #[test]
    fn problems_reported() {
        assert!(Locator::parse("css:").problems().len() == 1);
        assert!(Locator::parse("role:=Name").problems().len() == 1);
        assert!(Locator::parse("role:group=X >> text: ").problems().len() == 1);
        assert!(Locator::parse("role:button=Add").problems().is_empty());
    }

    #[test]
    fn deserialize_from_yaml_like_json() {
        let loc: Locator = serde_json::from_str("\"role:radio=Yes\"").unwrap();
        assert_eq!(loc, Locator::role("radio", "Yes"));
    }

    #[test]
    fn serializes_tagged_for_scripts() {
        let json = serde_json::to_value(Locator::role("button", "Add")).unwrap();
        assert_eq!(json["type"], "role");
        assert_eq!(json["role"], "button");
        assert_eq!(json["name"]["mode"], "exact");
        assert_eq!(json["name"]["value"], "Add");
    }
}
