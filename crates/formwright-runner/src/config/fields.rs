use formwright_page::Locator;
use serde::{Deserialize, Deserializer};
use std::fmt;

/// What kind of control a field is, which decides the fill protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    SearchableDropdown,
    StaticDropdown,
    RadioBoolean,
    FileUpload,
    RepeatableGroup,
    Checkbox,
    MultiSelect,
    /// Anything else; rejected by validation.
    #[serde(other)]
    Unknown,
}

impl FieldKind {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::SearchableDropdown => "searchable_dropdown",
            Self::StaticDropdown => "static_dropdown",
            Self::RadioBoolean => "radio_boolean",
            Self::FileUpload => "file_upload",
            Self::RepeatableGroup => "repeatable_group",
            Self::Checkbox => "checkbox",
            Self::MultiSelect => "multi_select",
            Self::Unknown => "unknown",
        }
    }

    /// Kinds that pick from rendered options.
    pub fn uses_options(&self) -> bool {
        matches!(
            self,
            Self::SearchableDropdown | Self::StaticDropdown | Self::MultiSelect
        )
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a value is matched against rendered option text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Option text equals the value (surrounding whitespace ignored).
    Exact,
    /// Option text contains the value, case-insensitively.
    Contains,
}

impl MatchMode {
    pub fn matches(&self, option: &str, value: &str) -> bool {
        match self {
            Self::Exact => option.trim() == value.trim(),
            Self::Contains => option
                .to_lowercase()
                .contains(&value.trim().to_lowercase()),
        }
    }
}

/// Radio inputs for a boolean answer, scoped inside the field's locator.
#[derive(Debug, Clone, Deserialize)]
pub struct BooleanChoices {
    pub yes: Locator,
    pub no: Locator,
}

/// A section that accepts any number of like-structured entries.
#[derive(Debug, Clone, Deserialize)]
pub struct RepeatableGroup {
    /// Control that creates the first entry (usually "Add").
    pub add_button_first: Locator,
    /// Control that creates every further entry (usually "Add Another").
    pub add_button_subsequent: Locator,
    /// Fields of one entry.
    pub entry: FormSchema,
}

/// One form field.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldDescriptor {
    /// Answer key; unique within its schema.
    pub name: String,

    pub kind: FieldKind,

    /// Alternatives, tried in order; the first that resolves wins.
    #[serde(default, deserialize_with = "one_or_many")]
    pub locator: Vec<Locator>,

    #[serde(default)]
    pub required: bool,

    /// Dropdown kinds only.
    pub match_mode: Option<MatchMode>,

    /// Retype only this many leading characters when the full value renders
    /// no options.
    pub search_prefix: Option<usize>,

    /// Press Enter after typing a search query.
    #[serde(default)]
    pub submit_search: bool,

    /// Locator for rendered options (default `role:option`).
    pub options: Option<Locator>,

    /// Radio inputs for yes/no (default `role:radio=Yes` / `role:radio=No`).
    pub choices: Option<BooleanChoices>,

    /// Upload-complete signal (default: the file name appears on the page).
    pub confirm: Option<Locator>,

    /// Remove buttons of existing chips, clicked before adding values.
    pub clear_chips: Option<Locator>,

    pub group: Option<Box<RepeatableGroup>>,

    /// Overrides the field's primary wait.
    pub timeout_ms: Option<u64>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, kind: FieldKind, locator: impl Into<Locator>) -> Self {
        Self {
            name: name.into(),
            kind,
            locator: vec![locator.into()],
            required: false,
            match_mode: None,
            search_prefix: None,
            submit_search: false,
            options: None,
            choices: None,
            confirm: None,
            clear_chips: None,
            group: None,
            timeout_ms: None,
        }
    }

    /// A repeatable group field; it has no locator of its own.
    pub fn group(name: impl Into<String>, group: RepeatableGroup) -> Self {
        let mut field = Self::new(name, FieldKind::RepeatableGroup, "");
        field.locator.clear();
        field.group = Some(Box::new(group));
        field
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = Some(mode);
        self
    }

    pub fn with_search_prefix(mut self, len: usize) -> Self {
        self.search_prefix = Some(len);
        self
    }

    pub fn with_submit_search(mut self) -> Self {
        self.submit_search = true;
        self
    }

    pub fn with_fallback(mut self, locator: impl Into<Locator>) -> Self {
        self.locator.push(locator.into());
        self
    }

    pub fn with_choices(mut self, yes: impl Into<Locator>, no: impl Into<Locator>) -> Self {
        self.choices = Some(BooleanChoices {
            yes: yes.into(),
            no: no.into(),
        });
        self
    }

    pub fn with_confirm(mut self, locator: impl Into<Locator>) -> Self {
        self.confirm = Some(locator.into());
        self
    }

    pub fn with_clear_chips(mut self, locator: impl Into<Locator>) -> Self {
        self.clear_chips = Some(locator.into());
        self
    }

    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = Some(ms);
        self
    }
}

/// Move to the next wizard step once this one is filled.
#[derive(Debug, Clone, Deserialize)]
pub struct Transition {
    #[serde(deserialize_with = "one_or_many")]
    pub click: Vec<Locator>,
    /// Visible once the next step has loaded.
    pub confirm: Locator,
    pub timeout_ms: Option<u64>,
}

impl Transition {
    pub fn new(click: impl Into<Locator>, confirm: impl Into<Locator>) -> Self {
        Self {
            click: vec![click.into()],
            confirm: confirm.into(),
            timeout_ms: None,
        }
    }
}

/// Ordered fields of one page (or one repeatable entry).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormSchema {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    pub transition: Option<Transition>,
}

impl FormSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_transition(mut self, transition: Transition) -> Self {
        self.transition = Some(transition);
        self
    }

    /// Name for logs and reports; falls back to the step position.
    pub fn display_name(&self, index: usize) -> String {
        if self.name.is_empty() {
            format!("step {}", index + 1)
        } else {
            self.name.clone()
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(Locator),
    Many(Vec<Locator>),
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<Locator>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(l) => vec![l],
        OneOrMany::Many(v) => v,
    })
}
