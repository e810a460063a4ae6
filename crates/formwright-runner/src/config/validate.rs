use super::fields::{FieldDescriptor, FieldKind, FormSchema};
use formwright_page::Locator;
use std::collections::HashSet;
use std::fmt;

/// One problem found in a form schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    /// Where the problem is, e.g. `steps[1].education.school`.
    pub path: String,
    pub message: String,
}

impl SchemaError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn prefixed(mut self, prefix: &str) -> Self {
        self.path = if self.path.is_empty() {
            prefix.to_string()
        } else {
            format!("{}.{}", prefix, self.path)
        };
        self
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

pub(crate) fn join(errors: &[SchemaError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Check a schema before anything touches the page.
///
/// Returns every problem found rather than stopping at the first.
pub fn validate(schema: &FormSchema) -> Vec<SchemaError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for (i, field) in schema.fields.iter().enumerate() {
        let path = if field.name.is_empty() {
            format!("fields[{}]", i)
        } else {
            field.name.clone()
        };

        if field.name.is_empty() {
            errors.push(SchemaError::new(&path, "field name is required"));
        } else if !seen.insert(field.name.as_str()) {
            errors.push(SchemaError::new(
                &path,
                format!("duplicate field name '{}'", field.name),
            ));
        }

        check_field(field, &path, &mut errors);
    }

    if let Some(ref transition) = schema.transition {
        if transition.click.is_empty() {
            errors.push(SchemaError::new("transition", "no click locator"));
        }
        for locator in &transition.click {
            check_locator(locator, "transition.click", &mut errors);
        }
        check_locator(&transition.confirm, "transition.confirm", &mut errors);
    }

    errors
}

fn check_field(field: &FieldDescriptor, path: &str, errors: &mut Vec<SchemaError>) {
    let mut err = |message: String| errors.push(SchemaError::new(path, message));

    if field.kind == FieldKind::Unknown {
        err("unrecognized kind".into());
        return;
    }

    match field.kind {
        FieldKind::RepeatableGroup => {
            if !field.locator.is_empty() {
                err("repeatable_group takes no locator; use group.add_button_first".into());
            }
        }
        _ if field.locator.is_empty() => err(format!("{} field has no locator", field.kind)),
        _ => {}
    }

    if !field.kind.uses_options() {
        if field.match_mode.is_some() {
            err(format!("match_mode is not valid for {}", field.kind));
        }
        if field.options.is_some() {
            err(format!("options is not valid for {}", field.kind));
        }
    }
    if field.search_prefix == Some(0) {
        err("search_prefix must be at least 1".into());
    }
    if field.search_prefix.is_some() && field.kind != FieldKind::SearchableDropdown {
        err(format!("search_prefix is not valid for {}", field.kind));
    }
    if field.choices.is_some() && field.kind != FieldKind::RadioBoolean {
        err(format!("choices is not valid for {}", field.kind));
    }
    if field.clear_chips.is_some() && field.kind != FieldKind::MultiSelect {
        err(format!("clear_chips is not valid for {}", field.kind));
    }
    if field.confirm.is_some() && field.kind != FieldKind::FileUpload {
        err(format!("confirm is not valid for {}", field.kind));
    }

    match (&field.group, field.kind) {
        (None, FieldKind::RepeatableGroup) => err("repeatable_group needs a group".into()),
        (Some(_), kind) if kind != FieldKind::RepeatableGroup => {
            err(format!("group is not valid for {}", kind))
        }
        _ => {}
    }

    for locator in &field.locator {
        check_locator(locator, path, errors);
    }
    for (locator, what) in [
        (&field.options, "options"),
        (&field.confirm, "confirm"),
        (&field.clear_chips, "clear_chips"),
    ] {
        if let Some(l) = locator {
            check_locator(l, &format!("{}.{}", path, what), errors);
        }
    }
    if let Some(ref choices) = field.choices {
        check_locator(&choices.yes, &format!("{}.choices.yes", path), errors);
        check_locator(&choices.no, &format!("{}.choices.no", path), errors);
    }

    if let Some(ref group) = field.group {
        check_locator(&group.add_button_first, &format!("{}.add_button_first", path), errors);
        check_locator(
            &group.add_button_subsequent,
            &format!("{}.add_button_subsequent", path),
            errors,
        );
        if group.entry.fields.is_empty() {
            errors.push(SchemaError::new(path, "group entry has no fields"));
        }
        if group.entry.transition.is_some() {
            errors.push(SchemaError::new(path, "group entry cannot have a transition"));
        }
        errors.extend(
            validate(&group.entry)
                .into_iter()
                .map(|e| e.prefixed(path)),
        );
    }
}

fn check_locator(locator: &Locator, path: &str, errors: &mut Vec<SchemaError>) {
    for problem in locator.problems() {
        errors.push(SchemaError::new(path, problem));
    }
    for pattern in locator.regex_patterns() {
        if let Err(e) = regex::Regex::new(pattern) {
            errors.push(SchemaError::new(
                path,
                format!("invalid name pattern /{}/: {}", pattern, e),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::fields::{MatchMode, RepeatableGroup, Transition};

    fn text(name: &str, locator: &str) -> FieldDescriptor {
        FieldDescriptor::new(name, FieldKind::Text, locator)
    }

    #[test]
    fn valid_schema_has_no_errors() {
        let schema = FormSchema::new("Apply")
            .field(text("first_name", "css:#first_name").required())
            .field(
                FieldDescriptor::new("country", FieldKind::SearchableDropdown, "css:#country")
                    .with_match_mode(MatchMode::Exact)
                    .with_search_prefix(4),
            )
            .with_transition(Transition::new(
                "role:button=Save and Continue",
                "role:heading=/^My Experience/",
            ));
        assert!(validate(&schema).is_empty());
    }

    #[test]
    fn option_settings_rejected_on_text() {
        let schema = FormSchema::new("x").field(
            text("first_name", "css:#first_name")
                .with_match_mode(MatchMode::Contains)
                .with_search_prefix(2),
        );
        let errors = validate(&schema);
        assert_eq!(errors.len(), 2, "{errors:?}");
        assert!(errors.iter().all(|e| e.path == "first_name"));
    }

    #[test]
    fn empty_name_reported_by_position() {
        let schema = FormSchema::new("x").field(text("", "css:#a"));
        let errors = validate(&schema);
        assert_eq!(errors, vec![SchemaError::new("fields[0]", "field name is required")]);
    }

    #[test]
    fn group_entry_errors_are_nested() {
        let group = RepeatableGroup {
            add_button_first: "role:button=Add".into(),
            add_button_subsequent: "role:button=".into(),
            entry: FormSchema::new("")
                .field(text("school", "role:textbox=/(unclosed/"))
                .field(text("school", "label:School")),
        };
        let schema = FormSchema::new("x").field(FieldDescriptor::group("education", group));
        let errors = validate(&schema);
        let paths: Vec<_> = errors.iter().map(|e| e.path.as_str()).collect();
        assert!(paths.contains(&"education.add_button_subsequent"), "{paths:?}");
        assert_eq!(
            errors
                .iter()
                .filter(|e| e.path == "education.school")
                .count(),
            2
        );
    }

    #[test]
    fn group_kind_without_group() {
        let mut field = text("education", "css:#x");
        field.kind = FieldKind::RepeatableGroup;
        let messages: Vec<_> = validate(&FormSchema::new("x").field(field))
            .into_iter()
            .map(|e| e.message)
            .collect();
        assert!(messages.iter().any(|m| m.contains("needs a group")));
        assert!(messages.iter().any(|m| m.contains("takes no locator")));
    }

    #[test]
    fn join_lists_every_problem() {
        let errors = vec![
            SchemaError::new("a", "duplicate field name 'a'"),
            SchemaError::new("", "no fields"),
        ];
        assert_eq!(join(&errors), "a: duplicate field name 'a'; no fields");
    }
}
