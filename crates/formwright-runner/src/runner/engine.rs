use super::report::{FieldOutcome, FieldReport, FillError, FillReport, FillStatus};
use crate::config::{
    validate, AnswerMap, AnswerValue, FieldDescriptor, FieldKind, FormSchema, MatchMode,
    RepeatableGroup, SchemaError, Timeouts,
};
use formwright_page::{wait, Condition, Element, Locator, Lookup, PageAdapter};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Attempts at writing a text value before giving up.
const MAX_WRITE_ATTEMPTS: u32 = 2;

/// Which entry of a repeatable group a field lookup targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryIndex {
    /// The most recently added entry.
    Last,
    /// Absolute position, zero-based, in document order.
    At(usize),
}

trait ForField<T> {
    fn for_field(self, field: &str) -> Result<T, FillError>;
}

impl<T> ForField<T> for formwright_page::Result<T> {
    fn for_field(self, field: &str) -> Result<T, FillError> {
        self.map_err(|source| FillError::Page {
            field: field.to_string(),
            source,
        })
    }
}

/// Fills one schema at a time against a page.
pub struct FillEngine<'p, P: PageAdapter + ?Sized> {
    page: &'p P,
    timeouts: Timeouts,
}

impl<'p, P: PageAdapter + ?Sized> FillEngine<'p, P> {
    pub fn new(page: &'p P) -> Self {
        Self {
            page,
            timeouts: Timeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn page(&self) -> &'p P {
        self.page
    }

    pub fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    /// Fill every field of `schema` in order.
    ///
    /// Never touches the page when the schema is invalid. Stops at the first
    /// failing field; the report says which one and why.
    pub async fn fill(&self, schema: &FormSchema, answers: &AnswerMap) -> FillReport {
        let mut counts = HashMap::new();
        self.run_pass(schema, answers, None, &mut counts).await
    }

    /// Refill an entry that already exists on the page.
    pub async fn fill_entry(
        &self,
        entry: &FormSchema,
        answers: &AnswerMap,
        index: EntryIndex,
    ) -> FillReport {
        let mut counts = HashMap::new();
        self.run_pass(entry, answers, Some(index), &mut counts).await
    }

    /// Like [`fill`](Self::fill), continuing the entry counts of earlier steps.
    pub(crate) async fn fill_with_counts(
        &self,
        schema: &FormSchema,
        answers: &AnswerMap,
        counts: &mut HashMap<String, usize>,
    ) -> FillReport {
        self.run_pass(schema, answers, None, counts).await
    }

    async fn run_pass(
        &self,
        schema: &FormSchema,
        answers: &AnswerMap,
        position: Option<EntryIndex>,
        counts: &mut HashMap<String, usize>,
    ) -> FillReport {
        let start = Instant::now();
        let mut fields = Vec::new();

        let errors = validate(schema);
        let status = if !errors.is_empty() {
            warn!("schema '{}' has {} problems", schema.name, errors.len());
            FillStatus::Failed(FillError::SchemaValidationError(errors))
        } else {
            info!("filling '{}' ({} fields)", schema.name, schema.fields.len());
            match self
                .fill_fields(schema, answers, position, "", counts, &mut fields)
                .await
            {
                Ok(()) => FillStatus::Success,
                Err(e) => {
                    warn!("fill failed: {}", e);
                    FillStatus::Failed(e)
                }
            }
        };

        FillReport {
            schema: schema.name.clone(),
            fields,
            status,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    async fn fill_fields(
        &self,
        schema: &FormSchema,
        answers: &AnswerMap,
        position: Option<EntryIndex>,
        prefix: &str,
        counts: &mut HashMap<String, usize>,
        out: &mut Vec<FieldReport>,
    ) -> Result<(), FillError> {
        for field in &schema.fields {
            let path = format!("{}{}", prefix, field.name);

            let Some(answer) = answers.get(&field.name).filter(|v| !v.is_empty()) else {
                if field.required {
                    let err = FillError::MissingRequiredAnswer(path.clone());
                    out.push(FieldReport {
                        name: path,
                        outcome: FieldOutcome::Failed(err.clone()),
                    });
                    return Err(err);
                }
                debug!("{}: no answer, skipping", path);
                out.push(FieldReport {
                    name: path,
                    outcome: FieldOutcome::Skipped,
                });
                continue;
            };

            info!("fill {} ({})", path, field.kind);
            let result = match field.kind {
                FieldKind::RepeatableGroup => {
                    self.fill_group(field, answer, &path, position, counts, out)
                        .await
                }
                _ => self.fill_field(field, answer, &path, position).await,
            };
            match result {
                Ok(()) => out.push(FieldReport {
                    name: path,
                    outcome: FieldOutcome::Filled,
                }),
                Err(e) => {
                    out.push(FieldReport {
                        name: path,
                        outcome: FieldOutcome::Failed(e.clone()),
                    });
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    async fn fill_field(
        &self,
        field: &FieldDescriptor,
        answer: &AnswerValue,
        path: &str,
        position: Option<EntryIndex>,
    ) -> Result<(), FillError> {
        match field.kind {
            FieldKind::Text => {
                let text = expect_text(answer, path)?;
                self.fill_text(field, text, path, position).await
            }
            FieldKind::SearchableDropdown => {
                let value = expect_text(answer, path)?;
                self.fill_searchable(field, value, path, position).await
            }
            FieldKind::StaticDropdown => {
                let value = match answer {
                    AnswerValue::Text(s) => s.clone(),
                    AnswerValue::Bool(true) => "Yes".to_string(),
                    AnswerValue::Bool(false) => "No".to_string(),
                    _ => return Err(wrong_type(path, "text")),
                };
                self.fill_static(field, &value, path, position).await
            }
            FieldKind::RadioBoolean => {
                let yes = answer.as_bool().ok_or_else(|| wrong_type(path, "yes or no"))?;
                self.fill_radio(field, yes, path, position).await
            }
            FieldKind::Checkbox => {
                let checked = answer.as_bool().ok_or_else(|| wrong_type(path, "yes or no"))?;
                self.fill_checkbox(field, checked, path, position).await
            }
            FieldKind::FileUpload => {
                let file = answer
                    .as_path()
                    .ok_or_else(|| wrong_type(path, "a file path"))?;
                self.fill_upload(field, &file, path, position).await
            }
            FieldKind::MultiSelect => {
                let values = answer.as_list().ok_or_else(|| wrong_type(path, "a list"))?;
                self.fill_multi_select(field, &values, path, position).await
            }
            FieldKind::RepeatableGroup | FieldKind::Unknown => {
                Err(FillError::SchemaValidationError(vec![SchemaError::new(
                    path,
                    format!("{} cannot be filled directly", field.kind),
                )]))
            }
        }
    }

    async fn fill_text(
        &self,
        field: &FieldDescriptor,
        text: &str,
        path: &str,
        position: Option<EntryIndex>,
    ) -> Result<(), FillError> {
        let timeout = self.primary(field, self.timeouts.verify());
        let mut attempt = 0;
        loop {
            attempt += 1;
            let el = self.locate(&field.locator, path, position).await?;
            self.page.scroll_into_view(&el).await.for_field(path)?;
            self.page.click(&el).await.for_field(path)?;
            self.page.clear(&el).await.for_field(path)?;
            self.page.type_text(&el, text).await.for_field(path)?;

            if self
                .wait(&Condition::value_equals(&el, text), timeout, path)
                .await?
            {
                return Ok(());
            }
            let actual = self.page.value(&el).await.for_field(path)?;
            if attempt >= MAX_WRITE_ATTEMPTS {
                return Err(FillError::FieldWriteVerificationFailed {
                    field: path.to_string(),
                    expected: text.to_string(),
                    actual,
                });
            }
            warn!("{}: page shows '{}' after typing, retrying", path, actual);
        }
    }

    async fn fill_searchable(
        &self,
        field: &FieldDescriptor,
        value: &str,
        path: &str,
        position: Option<EntryIndex>,
    ) -> Result<(), FillError> {
        let mode = field.match_mode.unwrap_or(MatchMode::Exact);
        let options = options_locator(field);
        let timeout = self.primary(field, self.timeouts.options());

        let el = self.locate(&field.locator, path, position).await?;
        self.page.scroll_into_view(&el).await.for_field(path)?;
        self.page.click(&el).await.for_field(path)?;
        self.search(&el, value, field.submit_search, path).await?;

        let mut rendered = self
            .wait(&Condition::visible(&options), timeout, path)
            .await?;
        if !rendered {
            if let Some(len) = field
                .search_prefix
                .filter(|&len| len < value.chars().count())
            {
                let prefix: String = value.chars().take(len).collect();
                debug!("{}: no options for '{}', searching '{}'", path, value, prefix);
                self.search(&el, &prefix, field.submit_search, path).await?;
                rendered = self
                    .wait(&Condition::visible(&options), timeout, path)
                    .await?;
            }
        }

        let picked = if rendered {
            self.pick_option(&options, mode, value, path).await?
        } else {
            None
        };
        match picked {
            Some(option) => self.page.click(&option).await.for_field(path),
            None => Err(no_match(mode, path, value)),
        }
    }

    async fn fill_static(
        &self,
        field: &FieldDescriptor,
        value: &str,
        path: &str,
        position: Option<EntryIndex>,
    ) -> Result<(), FillError> {
        let not_found = || FillError::OptionNotFound {
            field: path.to_string(),
            value: value.to_string(),
        };

        let el = self.locate(&field.locator, path, position).await?;
        self.page.scroll_into_view(&el).await.for_field(path)?;

        if el.tag == "select" {
            debug!("{}: native select", path);
            return match self.page.select_option(&el, value).await.for_field(path)? {
                true => Ok(()),
                false => Err(not_found()),
            };
        }

        let options = options_locator(field);
        let timeout = self.primary(field, self.timeouts.options());
        self.page.click(&el).await.for_field(path)?;
        if !self
            .wait(&Condition::visible(&options), timeout, path)
            .await?
        {
            return Err(not_found());
        }
        let mode = field.match_mode.unwrap_or(MatchMode::Exact);
        match self.pick_option(&options, mode, value, path).await? {
            Some(option) => self.page.click(&option).await.for_field(path),
            None => Err(not_found()),
        }
    }

    async fn fill_radio(
        &self,
        field: &FieldDescriptor,
        yes: bool,
        path: &str,
        position: Option<EntryIndex>,
    ) -> Result<(), FillError> {
        let choice = match (&field.choices, yes) {
            (Some(c), true) => c.yes.clone(),
            (Some(c), false) => c.no.clone(),
            (None, true) => Locator::role("radio", "Yes"),
            (None, false) => Locator::role("radio", "No"),
        };
        let scoped: Vec<Locator> = field
            .locator
            .iter()
            .map(|l| l.clone().within(choice.clone()))
            .collect();

        let el = self.locate(&scoped, path, position).await?;
        self.page.scroll_into_view(&el).await.for_field(path)?;
        self.set_checked(&el, true, field, path).await
    }

    async fn fill_checkbox(
        &self,
        field: &FieldDescriptor,
        checked: bool,
        path: &str,
        position: Option<EntryIndex>,
    ) -> Result<(), FillError> {
        let el = self.locate(&field.locator, path, position).await?;
        self.page.scroll_into_view(&el).await.for_field(path)?;
        self.set_checked(&el, checked, field, path).await
    }

    async fn set_checked(
        &self,
        el: &Element,
        checked: bool,
        field: &FieldDescriptor,
        path: &str,
    ) -> Result<(), FillError> {
        let want = Condition::checked(el, checked);
        if self.page.check(&want).await.for_field(path)? {
            debug!("{}: already {}", path, if checked { "checked" } else { "unchecked" });
            return Ok(());
        }
        self.page.click(el).await.for_field(path)?;
        let timeout = self.primary(field, self.timeouts.verify());
        if self.wait(&want, timeout, path).await? {
            return Ok(());
        }
        Err(FillError::FieldWriteVerificationFailed {
            field: path.to_string(),
            expected: format!("checked={}", checked),
            actual: format!("checked={}", !checked),
        })
    }

    async fn fill_upload(
        &self,
        field: &FieldDescriptor,
        file: &Path,
        path: &str,
        position: Option<EntryIndex>,
    ) -> Result<(), FillError> {
        let not_found = || FillError::ResumeFileNotFound {
            field: path.to_string(),
            path: file.to_path_buf(),
        };
        let resolved = tokio::fs::canonicalize(file).await.map_err(|_| not_found())?;
        let is_file = tokio::fs::metadata(&resolved)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(not_found());
        }
        let file = resolved;

        let el = self.locate(&field.locator, path, position).await?;
        debug!("{}: attaching {}", path, file.display());
        self.page
            .set_files(&el, std::slice::from_ref(&file))
            .await
            .for_field(path)?;

        let confirm = match field.confirm {
            Some(ref locator) => Condition::visible(locator),
            None => {
                let name = file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                Condition::text_present(name)
            }
        };
        let timeout = self.primary(field, self.timeouts.upload());
        if self.wait(&confirm, timeout, path).await? {
            return Ok(());
        }
        Err(FillError::UploadTimedOut {
            field: path.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        })
    }

    async fn fill_multi_select(
        &self,
        field: &FieldDescriptor,
        values: &[String],
        path: &str,
        position: Option<EntryIndex>,
    ) -> Result<(), FillError> {
        if let Some(ref chip) = field.clear_chips {
            self.clear_chips(chip, path).await?;
        }

        let mode = field.match_mode.unwrap_or(MatchMode::Contains);
        let options = options_locator(field);
        let timeout = self.primary(field, self.timeouts.options());

        for value in values {
            let el = self.locate(&field.locator, path, position).await?;
            self.page.scroll_into_view(&el).await.for_field(path)?;
            self.page.click(&el).await.for_field(path)?;
            self.search(&el, value, true, path).await?;

            let picked = if self
                .wait(&Condition::visible(&options), timeout, path)
                .await?
            {
                self.pick_option(&options, mode, value, path).await?
            } else {
                None
            };
            match picked {
                Some(option) => {
                    debug!("{}: adding '{}'", path, option.text.trim());
                    self.page.click(&option).await.for_field(path)?;
                }
                None => return Err(no_match(mode, path, value)),
            }
        }
        Ok(())
    }

    /// Click remove controls until none match, verifying they are gone.
    async fn clear_chips(&self, chip: &Locator, path: &str) -> Result<(), FillError> {
        let existing = self.page.find_all(chip).await.for_field(path)?.len();
        if existing == 0 {
            return Ok(());
        }
        for _ in 0..existing {
            let Some(remove) = self.page.find_all(chip).await.for_field(path)?.into_iter().next()
            else {
                break;
            };
            self.page.click(&remove).await.for_field(path)?;
        }

        let deadline = Instant::now() + self.timeouts.verify();
        loop {
            let left = self.page.find_all(chip).await.for_field(path)?.len();
            if left == 0 {
                debug!("{}: removed {} existing values", path, existing);
                return Ok(());
            }
            let now = Instant::now();
            if now >= deadline {
                warn!("{}: {} of {} existing values still present", path, left, existing);
                return Err(FillError::FieldWriteVerificationFailed {
                    field: path.to_string(),
                    expected: "no existing values".to_string(),
                    actual: format!("{} remaining", left),
                });
            }
            tokio::time::sleep(self.timeouts.poll().min(deadline - now)).await;
        }
    }

    async fn fill_group(
        &self,
        field: &FieldDescriptor,
        answer: &AnswerValue,
        path: &str,
        position: Option<EntryIndex>,
        counts: &mut HashMap<String, usize>,
        out: &mut Vec<FieldReport>,
    ) -> Result<(), FillError> {
        let Some(group) = field.group.as_deref() else {
            return Err(FillError::SchemaValidationError(vec![SchemaError::new(
                path,
                "repeatable_group needs a group",
            )]));
        };
        let entries = group_entries(group, answer, path)?;
        let probe = group
            .entry
            .fields
            .iter()
            .find_map(|f| f.locator.first().map(|l| (f.name.as_str(), l)));

        for (i, entry_answers) in entries.iter().enumerate() {
            let created = counts.get(path).copied().unwrap_or(0);
            let add = if created == 0 {
                &group.add_button_first
            } else {
                &group.add_button_subsequent
            };
            let entry_path = format!("{}[{}]", path, i);

            let before = match probe {
                Some((_, locator)) => self.page.find_all(locator).await.for_field(path)?.len(),
                None => 0,
            };
            let button = self
                .locate(std::slice::from_ref(add), path, position.map(|_| EntryIndex::Last))
                .await?;
            info!("{}: add entry {} via '{}'", path, created + 1, add);
            self.page.scroll_into_view(&button).await.for_field(path)?;
            self.page.click(&button).await.for_field(path)?;
            counts.insert(path.to_string(), created + 1);

            if let Some((name, locator)) = probe {
                let appeared = self
                    .wait(
                        &Condition::count_at_least(locator, before + 1),
                        self.timeouts.find(),
                        path,
                    )
                    .await?;
                if !appeared {
                    return Err(FillError::ElementNotFound {
                        field: format!("{}.{}", entry_path, name),
                        locators: format!("'{}'", locator),
                    });
                }
            }

            Box::pin(self.fill_fields(
                &group.entry,
                entry_answers,
                Some(EntryIndex::Last),
                &format!("{}.", entry_path),
                counts,
                out,
            ))
            .await?;
        }
        Ok(())
    }

    /// Resolve the first locator alternative that matches.
    ///
    /// Without a position a locator must match exactly one element; with one,
    /// the matching elements are indexed in document order.
    pub(crate) async fn locate(
        &self,
        locators: &[Locator],
        path: &str,
        position: Option<EntryIndex>,
    ) -> Result<Element, FillError> {
        let deadline = Instant::now() + self.timeouts.find();
        loop {
            for locator in locators {
                let found = match position {
                    None => match self.page.find(locator).await.for_field(path)? {
                        Lookup::Found(el) => Some(el),
                        Lookup::Ambiguous(count) => {
                            return Err(FillError::AmbiguousLocator {
                                field: path.to_string(),
                                locator: locator.to_string(),
                                count,
                            })
                        }
                        Lookup::NotFound => None,
                    },
                    Some(index) => {
                        let mut matches = self.page.find_all(locator).await.for_field(path)?;
                        match index {
                            EntryIndex::Last => matches.pop(),
                            EntryIndex::At(n) => matches.into_iter().nth(n),
                        }
                    }
                };
                if let Some(el) = found {
                    debug!("{}: '{}' -> {}", path, locator, el.handle);
                    return Ok(el);
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(FillError::ElementNotFound {
                    field: path.to_string(),
                    locators: locators
                        .iter()
                        .map(|l| format!("'{}'", l))
                        .collect::<Vec<_>>()
                        .join(", "),
                });
            }
            tokio::time::sleep(self.timeouts.poll().min(deadline - now)).await;
        }
    }

    async fn search(
        &self,
        el: &Element,
        query: &str,
        submit: bool,
        path: &str,
    ) -> Result<(), FillError> {
        self.page.clear(el).await.for_field(path)?;
        self.page.type_text(el, query).await.for_field(path)?;
        if submit {
            self.page.press_key(el, "Enter").await.for_field(path)?;
        }
        Ok(())
    }

    /// First rendered option equal to `value`, else (in contains mode) the
    /// first containing it.
    async fn pick_option(
        &self,
        options: &Locator,
        mode: MatchMode,
        value: &str,
        path: &str,
    ) -> Result<Option<Element>, FillError> {
        let rendered = self.page.find_all(options).await.for_field(path)?;
        debug!("{}: {} options rendered", path, rendered.len());
        let exact = rendered
            .iter()
            .position(|o| MatchMode::Exact.matches(&o.text, value));
        let index = match (exact, mode) {
            (Some(i), _) => Some(i),
            (None, MatchMode::Contains) => rendered.iter().position(|o| mode.matches(&o.text, value)),
            (None, MatchMode::Exact) => None,
        };
        Ok(index.and_then(|i| rendered.into_iter().nth(i)))
    }

    async fn wait(
        &self,
        condition: &Condition,
        timeout: Duration,
        path: &str,
    ) -> Result<bool, FillError> {
        wait::poll(self.page, condition, timeout, self.timeouts.poll())
            .await
            .for_field(path)
    }

    fn primary(&self, field: &FieldDescriptor, default: Duration) -> Duration {
        field
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(default)
    }
}

fn options_locator(field: &FieldDescriptor) -> Locator {
    field
        .options
        .clone()
        .unwrap_or_else(|| Locator::Role {
            role: "option".into(),
            name: None,
        })
}

fn expect_text<'a>(answer: &'a AnswerValue, path: &str) -> Result<&'a str, FillError> {
    answer.as_text().ok_or_else(|| wrong_type(path, "text"))
}

fn wrong_type(path: &str, expected: &'static str) -> FillError {
    FillError::WrongAnswerType {
        field: path.to_string(),
        expected,
    }
}

fn no_match(mode: MatchMode, path: &str, value: &str) -> FillError {
    match mode {
        MatchMode::Exact => FillError::NoExactOptionMatch {
            field: path.to_string(),
            value: value.to_string(),
        },
        MatchMode::Contains => FillError::NoMatchingOption {
            field: path.to_string(),
            value: value.to_string(),
        },
    }
}

/// Answers for each entry. A plain list feeds a single-field entry.
fn group_entries(
    group: &RepeatableGroup,
    answer: &AnswerValue,
    path: &str,
) -> Result<Vec<AnswerMap>, FillError> {
    if let AnswerValue::Entries(entries) = answer {
        return Ok(entries.clone());
    }
    match (group.entry.fields.as_slice(), answer.as_list()) {
        ([only], Some(items)) => Ok(items
            .into_iter()
            .map(|item| AnswerMap::new().set(only.name.clone(), item))
            .collect()),
        _ => Err(wrong_type(path, "a list of entries")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formwright_page::fake::{FakeNode, FakePage};

    fn fast() -> Timeouts {
        Timeouts {
            find_ms: 300,
            ..Timeouts::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn locate_takes_first_alternative_that_resolves() {
        let page = FakePage::new();
        page.add(FakeNode::textbox("Phone").with_id("phone"));
        let engine = FillEngine::new(&page).with_timeouts(fast());

        let locators = vec![Locator::parse("css:#telephone"), Locator::parse("css:#phone")];
        let el = engine.locate(&locators, "phone", None).await.unwrap();
        assert_eq!(el.handle, "fake:0");
    }

    #[tokio::test(start_paused = true)]
    async fn locate_reports_ambiguity_without_position() {
        let page = FakePage::new();
        page.add(FakeNode::textbox("URL"));
        page.add(FakeNode::textbox("URL"));
        let engine = FillEngine::new(&page).with_timeouts(fast());

        let err = engine
            .locate(&[Locator::role("textbox", "URL")], "url", None)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            FillError::AmbiguousLocator {
                field: "url".into(),
                locator: "role:textbox=URL".into(),
                count: 2,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn locate_by_position() {
        let page = FakePage::new();
        page.add(FakeNode::textbox("URL"));
        page.add(FakeNode::textbox("URL"));
        page.add(FakeNode::textbox("URL"));
        let engine = FillEngine::new(&page).with_timeouts(fast());
        let url = [Locator::role("textbox", "URL")];

        let last = engine.locate(&url, "url", Some(EntryIndex::Last)).await.unwrap();
        assert_eq!(last.handle, "fake:2");
        let first = engine.locate(&url, "url", Some(EntryIndex::At(0))).await.unwrap();
        assert_eq!(first.handle, "fake:0");
        let err = engine
            .locate(&url, "url", Some(EntryIndex::At(3)))
            .await
            .unwrap_err();
        assert!(matches!(err, FillError::ElementNotFound { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn locate_gives_up_after_find_timeout() {
        let page = FakePage::new();
        let engine = FillEngine::new(&page).with_timeouts(fast());
        let start = Instant::now();
        let err = engine
            .locate(&[Locator::parse("css:#missing")], "missing", None)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            FillError::ElementNotFound {
                field: "missing".into(),
                locators: "'css:#missing'".into(),
            }
        );
        assert_eq!(start.elapsed(), Duration::from_millis(300));
    }

    #[test]
    fn plain_list_expands_for_single_field_entry() {
        let group = RepeatableGroup {
            add_button_first: "role:button=Add".into(),
            add_button_subsequent: "role:button=Add Another".into(),
            entry: FormSchema::new("").field(FieldDescriptor::new(
                "url",
                FieldKind::Text,
                "role:textbox=URL",
            )),
        };
        let answer = AnswerValue::List(vec!["https://a.dev".into(), "https://b.dev".into()]);
        let entries = group_entries(&group, &answer, "websites").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[1].get("url").and_then(|v| v.as_text()),
            Some("https://b.dev")
        );

        let err = group_entries(&group, &AnswerValue::Bool(true), "websites").unwrap_err();
        assert!(matches!(err, FillError::WrongAnswerType { .. }));
    }
}
