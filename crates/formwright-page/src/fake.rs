//! In-memory page for exercising fill logic without a browser.
//!
//! Nodes carry just enough state (role, accessible name, value, checked,
//! visibility, parent) to answer locators and conditions, and a [`Behavior`]
//! that scripts how the page reacts to interaction: search boxes render
//! options while typing, add buttons append entry templates, continue buttons
//! reveal the next step. Every adapter call is recorded.

use crate::locator::{Locator, NamePattern};
use crate::{Condition, Element, PageAdapter, PageError, Result};
use async_trait::async_trait;
use std::cell::RefCell;
use std::path::PathBuf;

/// How a node reacts to interaction.
#[derive(Debug, Clone, Default)]
pub enum Behavior {
    #[default]
    None,
    /// Typing renders options containing the query. Queries longer than
    /// `max_query` render nothing (prefix-only search indexes). With
    /// `on_enter`, options render on Enter instead of while typing.
    Search {
        options: Vec<String>,
        max_query: Option<usize>,
        on_enter: bool,
    },
    /// Clicking opens a listbox with these options.
    Listbox { options: Vec<String> },
    /// Clicking appends a copy of `template` under `parent`.
    Append {
        parent: Option<usize>,
        template: Vec<FakeNode>,
    },
    /// Clicking adds these nodes at the top level.
    Reveal(Vec<FakeNode>),
    /// The first `n` writes are dropped.
    DropWrites(usize),
    /// Files are accepted but the upload never finishes.
    StalledUpload,
    /// Clicking removes the parent node (chip remove buttons).
    RemoveParent,
}

/// One element of the fake DOM.
#[derive(Debug, Clone, Default)]
pub struct FakeNode {
    pub tag: String,
    pub role: String,
    pub name: String,
    pub text: String,
    pub dom_id: String,
    pub css: Vec<String>,
    pub placeholder: String,
    pub value: String,
    pub checked: bool,
    pub visible: bool,
    pub files: Vec<PathBuf>,
    pub select_options: Vec<String>,
    pub behavior: Behavior,
    parent: Option<usize>,
    owner: Option<usize>,
    removed: bool,
}

impl FakeNode {
    pub fn new(tag: &str, role: &str, name: &str) -> Self {
        Self {
            tag: tag.into(),
            role: role.into(),
            name: name.into(),
            visible: true,
            ..Default::default()
        }
    }

    pub fn textbox(name: &str) -> Self {
        Self::new("input", "textbox", name)
    }

    pub fn button(name: &str) -> Self {
        let mut n = Self::new("button", "button", name);
        n.text = name.into();
        n
    }

    pub fn combobox(name: &str) -> Self {
        Self::new("input", "combobox", name)
    }

    pub fn radio(name: &str) -> Self {
        Self::new("input", "radio", name)
    }

    pub fn checkbox(name: &str) -> Self {
        Self::new("input", "checkbox", name)
    }

    pub fn group(name: &str) -> Self {
        Self::new("fieldset", "group", name)
    }

    pub fn select(name: &str, options: &[&str]) -> Self {
        let mut n = Self::new("select", "combobox", name);
        n.select_options = options.iter().map(|s| s.to_string()).collect();
        n
    }

    /// A hidden `<input type=file>` with the given id.
    pub fn file_input(dom_id: &str) -> Self {
        let mut n = Self::new("input", "file", "");
        n.dom_id = dom_id.into();
        n.visible = false;
        n
    }

    pub fn text(content: &str) -> Self {
        let mut n = Self::new("div", "", "");
        n.text = content.into();
        n
    }

    pub fn with_id(mut self, dom_id: &str) -> Self {
        self.dom_id = dom_id.into();
        self
    }

    pub fn with_css(mut self, selector: &str) -> Self {
        self.css.push(selector.into());
        self
    }

    pub fn with_placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn with_behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn checked(mut self) -> Self {
        self.checked = true;
        self
    }
}

#[derive(Debug, Default)]
struct Dom {
    nodes: Vec<FakeNode>,
}

impl Dom {
    fn push(&mut self, mut node: FakeNode, parent: Option<usize>) -> usize {
        node.parent = parent;
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn live(&self, id: usize) -> bool {
        let mut cur = Some(id);
        while let Some(i) = cur {
            if self.nodes[i].removed {
                return false;
            }
            cur = self.nodes[i].parent;
        }
        true
    }

    fn findable(&self, id: usize) -> bool {
        let n = &self.nodes[id];
        self.live(id) && (n.visible || n.role == "file")
    }

    fn matches(&self, id: usize, locator: &Locator) -> bool {
        let n = &self.nodes[id];
        match locator {
            Locator::Role { role, name } => {
                n.role == *role
                    && match name {
                        None => true,
                        Some(NamePattern::Exact(s)) => n.name == *s,
                        Some(NamePattern::Regex(re)) => regex::Regex::new(re)
                            .map(|re| re.is_match(&n.name))
                            .unwrap_or(false),
                    }
            }
            Locator::Label { text } => !n.name.is_empty() && n.name == *text,
            Locator::Css { selector } => {
                n.css.iter().any(|c| c == selector)
                    || (!n.dom_id.is_empty() && *selector == format!("#{}", n.dom_id))
            }
            Locator::IdSuffix { suffix } => !n.dom_id.is_empty() && n.dom_id.ends_with(suffix),
            Locator::Placeholder { text } => {
                !n.placeholder.is_empty()
                    && n.placeholder.to_lowercase().contains(&text.to_lowercase())
            }
            Locator::Text { text } => {
                !n.text.is_empty() && n.text.to_lowercase().contains(&text.to_lowercase())
            }
            Locator::Within { scope, inner } => {
                if !self.matches(id, inner) {
                    return false;
                }
                let mut cur = n.parent;
                while let Some(p) = cur {
                    if self.matches(p, scope) {
                        return true;
                    }
                    cur = self.nodes[p].parent;
                }
                false
            }
        }
    }

    fn find_all(&self, locator: &Locator) -> Vec<usize> {
        (0..self.nodes.len())
            .filter(|&id| self.findable(id) && self.matches(id, locator))
            .collect()
    }

    fn clear_options(&mut self) {
        for n in self.nodes.iter_mut() {
            if n.owner.is_some() {
                n.removed = true;
            }
        }
    }

    fn render_options(&mut self, owner: usize, options: &[String], query: Option<&str>) {
        self.clear_options();
        let query = query.map(|q| q.to_lowercase());
        for opt in options {
            if let Some(q) = &query {
                if !opt.to_lowercase().contains(q) {
                    continue;
                }
            }
            let mut node = FakeNode::new("div", "option", opt);
            node.text = opt.clone();
            node.owner = Some(owner);
            self.push(node, None);
        }
    }

    fn search(&mut self, id: usize) {
        if let Behavior::Search {
            options, max_query, ..
        } = self.nodes[id].behavior.clone()
        {
            let query = self.nodes[id].value.clone();
            if max_query.is_some_and(|m| query.chars().count() > m) {
                self.clear_options();
            } else {
                self.render_options(id, &options, Some(&query));
            }
        }
    }
}

/// Scriptable in-memory [`PageAdapter`].
#[derive(Debug, Default)]
pub struct FakePage {
    dom: RefCell<Dom>,
    calls: RefCell<Vec<String>>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a top-level node; returns its id.
    pub fn add(&self, node: FakeNode) -> usize {
        self.dom.borrow_mut().push(node, None)
    }

    /// Add a node under `parent`; returns its id.
    pub fn add_child(&self, parent: usize, node: FakeNode) -> usize {
        self.dom.borrow_mut().push(node, Some(parent))
    }

    /// Snapshot of a node.
    pub fn node(&self, id: usize) -> FakeNode {
        self.dom.borrow().nodes[id].clone()
    }

    pub fn value_of(&self, id: usize) -> String {
        self.dom.borrow().nodes[id].value.clone()
    }

    /// Values of all live elements matching `locator`, in document order.
    pub fn values(&self, locator: &Locator) -> Vec<String> {
        let dom = self.dom.borrow();
        dom.find_all(locator)
            .into_iter()
            .map(|id| dom.nodes[id].value.clone())
            .collect()
    }

    pub fn count(&self, locator: &Locator) -> usize {
        self.dom.borrow().find_all(locator).len()
    }

    /// Every adapter call so far, as `"<method> <arg>"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Number of clicks on elements whose accessible name is `name`.
    pub fn clicks_on(&self, name: &str) -> usize {
        let dom = self.dom.borrow();
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| c.strip_prefix("click "))
            .filter_map(|h| h.strip_prefix("fake:")?.parse::<usize>().ok())
            .filter(|&id| dom.nodes[id].name == name)
            .count()
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }

    fn id_of(&self, element: &Element) -> Result<usize> {
        let id = element
            .handle
            .strip_prefix("fake:")
            .and_then(|s| s.parse::<usize>().ok())
            .ok_or_else(|| PageError::StaleElement(element.handle.clone()))?;
        let dom = self.dom.borrow();
        if id >= dom.nodes.len() || !dom.live(id) {
            return Err(PageError::StaleElement(element.handle.clone()));
        }
        Ok(id)
    }

    fn element(dom: &Dom, id: usize) -> Element {
        let n = &dom.nodes[id];
        Element {
            handle: format!("fake:{}", id),
            tag: n.tag.clone(),
            text: if n.text.is_empty() {
                n.name.clone()
            } else {
                n.text.clone()
            },
        }
    }
}

#[async_trait(?Send)]
impl PageAdapter for FakePage {
    async fn find_all(&self, locator: &Locator) -> Result<Vec<Element>> {
        self.record(format!("find_all {}", locator));
        let dom = self.dom.borrow();
        Ok(dom
            .find_all(locator)
            .into_iter()
            .map(|id| Self::element(&dom, id))
            .collect())
    }

    async fn click(&self, element: &Element) -> Result<()> {
        self.record(format!("click {}", element.handle));
        let id = self.id_of(element)?;
        let mut dom = self.dom.borrow_mut();

        if let Some(owner) = dom.nodes[id].owner {
            let text = dom.nodes[id].text.clone();
            dom.nodes[owner].value = text;
            dom.clear_options();
            return Ok(());
        }

        let role = dom.nodes[id].role.clone();
        match role.as_str() {
            "radio" => {
                let parent = dom.nodes[id].parent;
                for n in dom.nodes.iter_mut() {
                    if n.role == "radio" && n.parent == parent {
                        n.checked = false;
                    }
                }
                dom.nodes[id].checked = true;
            }
            "checkbox" => {
                let checked = dom.nodes[id].checked;
                dom.nodes[id].checked = !checked;
            }
            _ => {}
        }

        match dom.nodes[id].behavior.clone() {
            Behavior::Listbox { options } => dom.render_options(id, &options, None),
            Behavior::Append { parent, template } => {
                for node in template {
                    dom.push(node, parent);
                }
            }
            Behavior::Reveal(nodes) => {
                for node in nodes {
                    dom.push(node, None);
                }
            }
            Behavior::RemoveParent => {
                if let Some(p) = dom.nodes[id].parent {
                    dom.nodes[p].removed = true;
                }
            }
            _ => {}
        }
        Ok(())
    }

    async fn clear(&self, element: &Element) -> Result<()> {
        self.record(format!("clear {}", element.handle));
        let id = self.id_of(element)?;
        let mut dom = self.dom.borrow_mut();
        if let Behavior::DropWrites(n) = dom.nodes[id].behavior {
            if n > 0 {
                return Ok(());
            }
        }
        dom.nodes[id].value.clear();
        Ok(())
    }

    async fn type_text(&self, element: &Element, text: &str) -> Result<()> {
        self.record(format!("type_text {} {}", element.handle, text));
        let id = self.id_of(element)?;
        let mut dom = self.dom.borrow_mut();
        if let Behavior::DropWrites(n) = dom.nodes[id].behavior {
            if n > 0 {
                dom.nodes[id].behavior = Behavior::DropWrites(n - 1);
                return Ok(());
            }
        }
        dom.nodes[id].value.push_str(text);
        if let Behavior::Search {
            on_enter: false, ..
        } = dom.nodes[id].behavior
        {
            dom.search(id);
        }
        Ok(())
    }

    async fn value(&self, element: &Element) -> Result<String> {
        self.record(format!("value {}", element.handle));
        let id = self.id_of(element)?;
        Ok(self.dom.borrow().nodes[id].value.clone())
    }

    async fn press_key(&self, element: &Element, key: &str) -> Result<()> {
        self.record(format!("press_key {} {}", element.handle, key));
        let id = self.id_of(element)?;
        let mut dom = self.dom.borrow_mut();
        if key == "Enter" {
            if let Behavior::Search { on_enter: true, .. } = dom.nodes[id].behavior {
                dom.search(id);
            }
        }
        Ok(())
    }

    async fn select_option(&self, element: &Element, text: &str) -> Result<bool> {
        self.record(format!("select_option {} {}", element.handle, text));
        let id = self.id_of(element)?;
        let mut dom = self.dom.borrow_mut();
        if dom.nodes[id].select_options.iter().any(|o| o == text) {
            dom.nodes[id].value = text.into();
            return Ok(true);
        }
        Ok(false)
    }

    async fn set_files(&self, element: &Element, paths: &[PathBuf]) -> Result<()> {
        self.record(format!("set_files {}", element.handle));
        let id = self.id_of(element)?;
        let mut dom = self.dom.borrow_mut();
        dom.nodes[id].files = paths.to_vec();
        if !matches!(dom.nodes[id].behavior, Behavior::StalledUpload) {
            for p in paths {
                let name = p
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                dom.push(FakeNode::text(&name), None);
            }
        }
        Ok(())
    }

    async fn scroll_into_view(&self, element: &Element) -> Result<()> {
        self.record(format!("scroll_into_view {}", element.handle));
        self.id_of(element).map(|_| ())
    }

    async fn check(&self, condition: &Condition) -> Result<bool> {
        self.record(format!("check {}", condition));
        let dom = self.dom.borrow();
        let node_of = |el: &Element| {
            el.handle
                .strip_prefix("fake:")
                .and_then(|s| s.parse::<usize>().ok())
                .filter(|&id| id < dom.nodes.len() && dom.live(id))
        };
        Ok(match condition {
            Condition::Visible { locator } => !dom.find_all(locator).is_empty(),
            Condition::CountAtLeast { locator, count } => dom.find_all(locator).len() >= *count,
            Condition::TextPresent { text } => (0..dom.nodes.len()).any(|id| {
                dom.live(id) && dom.nodes[id].visible && dom.nodes[id].text.contains(text.as_str())
            }),
            Condition::ValueEquals { element, value } => {
                node_of(element).is_some_and(|id| dom.nodes[id].value == *value)
            }
            Condition::Checked { element, checked } => {
                node_of(element).is_some_and(|id| dom.nodes[id].checked == *checked)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scoped_locator_only_matches_inside_scope() {
        let page = FakePage::new();
        let edu = page.add(FakeNode::group("Education"));
        page.add_child(edu, FakeNode::button("Add"));
        let web = page.add(FakeNode::group("Websites"));
        page.add_child(web, FakeNode::button("Add"));

        let all = page.find_all(&Locator::role("button", "Add")).await.unwrap();
        assert_eq!(all.len(), 2);

        let scoped = Locator::parse("role:group=Education >> role:button=Add");
        let found = page.find_all(&scoped).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].handle, "fake:1");
    }

    #[tokio::test]
    async fn search_box_renders_matching_options() {
        let page = FakePage::new();
        let id = page.add(FakeNode::combobox("Location").with_behavior(Behavior::Search {
            options: vec!["San Francisco".into(), "San Diego".into(), "Boston".into()],
            max_query: None,
            on_enter: false,
        }));
        let el = FakePage::element(&page.dom.borrow(), id);
        page.type_text(&el, "san").await.unwrap();
        assert_eq!(page.count(&Locator::parse("role:option")), 2);

        let opts = page.find_all(&Locator::parse("role:option")).await.unwrap();
        page.click(&opts[1]).await.unwrap();
        assert_eq!(page.value_of(id), "San Diego");
        assert_eq!(page.count(&Locator::parse("role:option")), 0);
    }

    #[tokio::test]
    async fn removed_parent_hides_children() {
        let page = FakePage::new();
        let chip = page.add(FakeNode::new("div", "listitem", "Python"));
        page.add_child(
            chip,
            FakeNode::button("Remove").with_behavior(Behavior::RemoveParent),
        );
        let btn = page.find_all(&Locator::role("button", "Remove")).await.unwrap();
        page.click(&btn[0]).await.unwrap();
        assert_eq!(page.count(&Locator::role("button", "Remove")), 0);
        assert!(page.click(&btn[0]).await.is_err());
    }

    #[tokio::test]
    async fn radios_in_a_group_are_exclusive() {
        let page = FakePage::new();
        let g = page.add(FakeNode::group("Previously worked here?"));
        let yes = page.add_child(g, FakeNode::radio("Yes"));
        let no = page.add_child(g, FakeNode::radio("No").checked());
        let el = page.find_all(&Locator::role("radio", "Yes")).await.unwrap();
        page.click(&el[0]).await.unwrap();
        assert!(page.node(yes).checked);
        assert!(!page.node(no).checked);
    }
}
