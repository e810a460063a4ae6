use async_trait::async_trait;
use base64::Engine as _;
use formwright_page::{Condition, Element, Locator, PageAdapter, PageError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolve a serialized [`Locator`] to every visible matching element, in
/// document order. Returns a JSON string of `{handle, tag, text}`.
const FIND_JS: &str = r#"
((loc) => {
    const lc = s => (s || '').toLowerCase().trim();
    const squash = s => (s || '').replace(/\s+/g, ' ').trim();

    function selector(el) {
        if (el.id) return '#' + CSS.escape(el.id);
        const path = [];
        let n = el;
        while (n && n.nodeType === 1) {
            let s = n.tagName.toLowerCase();
            if (n.id) { path.unshift('#' + CSS.escape(n.id)); break; }
            const p = n.parentElement;
            if (p) {
                const sibs = [...p.children].filter(c => c.tagName === n.tagName);
                if (sibs.length > 1) s += ':nth-of-type(' + (sibs.indexOf(n) + 1) + ')';
            }
            path.unshift(s);
            n = p;
        }
        return path.join(' > ');
    }

    const IMPLICIT = {
        button: 'button', select: 'combobox', textarea: 'textbox', fieldset: 'group',
        h1: 'heading', h2: 'heading', h3: 'heading', h4: 'heading', h5: 'heading', h6: 'heading',
        li: 'listitem', ul: 'list', ol: 'list', option: 'option', dialog: 'dialog', form: 'form',
    };

    function role(el) {
        const explicit = el.getAttribute('role');
        if (explicit) return explicit.split(' ')[0];
        const tag = el.tagName.toLowerCase();
        if (tag === 'input') {
            const t = lc(el.type) || 'text';
            if (t === 'checkbox' || t === 'radio') return t;
            if (['button', 'submit', 'reset', 'image'].includes(t)) return 'button';
            if (t === 'file') return 'file';
            if (t === 'search') return 'searchbox';
            if (t === 'hidden') return '';
            return el.getAttribute('list') ? 'combobox' : 'textbox';
        }
        if (tag === 'a') return el.hasAttribute('href') ? 'link' : '';
        return IMPLICIT[tag] || '';
    }

    function labelText(el) {
        if (el.labels && el.labels.length) return squash([...el.labels].map(l => l.innerText).join(' '));
        return '';
    }

    function name(el) {
        const by = el.getAttribute('aria-labelledby');
        if (by) {
            const t = squash(by.split(/\s+/).map(id => document.getElementById(id)?.innerText || '').join(' '));
            if (t) return t;
        }
        const aria = el.getAttribute('aria-label');
        if (aria) return squash(aria);
        const label = labelText(el);
        if (label) return label;
        const r = role(el);
        if (r === 'group') {
            const legend = el.querySelector('legend');
            if (legend) return squash(legend.innerText);
        }
        if (['button', 'link', 'option', 'heading', 'tab', 'menuitem', 'listitem', 'radio', 'checkbox'].includes(r)) {
            const t = squash(el.innerText || el.value);
            if (t) return t;
        }
        return squash(el.title || el.placeholder);
    }

    function visible(el) {
        if (el.tagName === 'INPUT' && el.type === 'file') return true;
        const r = el.getBoundingClientRect();
        const s = getComputedStyle(el);
        return r.width > 0 && r.height > 0 && s.visibility !== 'hidden' && s.display !== 'none';
    }

    function nameMatches(el, pattern) {
        if (!pattern) return true;
        const n = name(el);
        if (pattern.mode === 'regex') {
            try { return new RegExp(pattern.value).test(n); } catch (e) { return false; }
        }
        return n === pattern.value;
    }

    const all = root => [...root.querySelectorAll('*')];

    function match(loc, root) {
        switch (loc.type) {
            case 'role':
                return all(root).filter(el => role(el) === loc.role && nameMatches(el, loc.name));
            case 'label':
                return all(root).filter(el =>
                    lc(labelText(el)) === lc(loc.text) || lc(el.getAttribute('aria-label')) === lc(loc.text));
            case 'css':
                return [...root.querySelectorAll(loc.selector)];
            case 'id_suffix':
                return all(root).filter(el => el.id && el.id.endsWith(loc.suffix));
            case 'placeholder':
                return all(root).filter(el => lc(el.placeholder).includes(lc(loc.text)));
            case 'text': {
                const t = lc(loc.text);
                return all(root).filter(el =>
                    lc(el.innerText).includes(t) && ![...el.children].some(c => lc(c.innerText).includes(t)));
            }
            case 'within': {
                const seen = new Set();
                for (const scope of match(loc.scope, root)) {
                    for (const el of match(loc.inner, scope)) seen.add(el);
                }
                return [...seen].sort((a, b) =>
                    a.compareDocumentPosition(b) & Node.DOCUMENT_POSITION_FOLLOWING ? -1 : 1);
            }
        }
        return [];
    }

    return JSON.stringify(match(loc, document).filter(visible).map(el => ({
        handle: selector(el),
        tag: el.tagName.toLowerCase(),
        text: squash(el.innerText || el.value || name(el)).slice(0, 200),
    })));
})
"#;

/// Pick a `<select>` option by visible text (or value).
const SELECT_JS: &str = r#"
((sel, text) => {
    const el = document.querySelector(sel);
    if (!el) return 'element_not_found';
    const opt = Array.from(el.options).find(o => o.text.trim() === text.trim() || o.value === text);
    if (!opt) return 'option_not_found';
    el.value = opt.value;
    el.dispatchEvent(new Event('input', { bubbles: true }));
    el.dispatchEvent(new Event('change', { bubbles: true }));
    return 'ok';
})
"#;

/// Attach base64-encoded files to a file input via DataTransfer.
const SET_FILES_JS: &str = r#"
((sel, files) => {
    const el = document.querySelector(sel);
    if (!el) return false;
    const dt = new DataTransfer();
    for (const f of files) {
        const bin = atob(f.data);
        const bytes = new Uint8Array(bin.length);
        for (let i = 0; i < bin.length; i++) bytes[i] = bin.charCodeAt(i);
        dt.items.add(new File([bytes], f.name, { type: f.mime }));
    }
    el.files = dt.files;
    el.dispatchEvent(new Event('input', { bubbles: true }));
    el.dispatchEvent(new Event('change', { bubbles: true }));
    return true;
})
"#;

/// [`PageAdapter`] over one eoka tab. Element handles are unique CSS
/// selectors computed at lookup time.
pub struct EokaPage<'a> {
    page: &'a eoka::Page,
}

impl<'a> EokaPage<'a> {
    pub fn new(page: &'a eoka::Page) -> Self {
        Self { page }
    }

    /// Run `body` with `el` bound to the element; yields `null` when the
    /// element is gone.
    async fn on_element<T>(&self, element: &Element, body: &str) -> Result<Option<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let js = format!(
            "(() => {{ const el = document.querySelector({}); if (!el) return null; {} }})()",
            js_str(&element.handle),
            body
        );
        self.page.evaluate(&js).await.map_err(browser)
    }

    async fn focus(&self, element: &Element) -> Result<()> {
        self.on_element::<bool>(element, "el.focus(); return true;")
            .await?
            .map(|_| ())
            .ok_or_else(|| stale(element))
    }
}

#[async_trait(?Send)]
impl PageAdapter for EokaPage<'_> {
    async fn find_all(&self, locator: &Locator) -> Result<Vec<Element>> {
        let loc = serde_json::to_string(locator).map_err(|e| PageError::Script(e.to_string()))?;
        let js = format!("{}({})", FIND_JS, loc);
        let json_str: String = self.page.evaluate(&js).await.map_err(browser)?;
        serde_json::from_str(&json_str)
            .map_err(|e| PageError::Script(format!("find parse error: {}", e)))
    }

    async fn click(&self, element: &Element) -> Result<()> {
        debug!("click {}", element.handle);
        self.page.click(&element.handle).await.map_err(browser)
    }

    async fn clear(&self, element: &Element) -> Result<()> {
        let selected: Option<bool> = self
            .on_element(
                element,
                "el.focus(); if (typeof el.select === 'function') el.select(); \
                 else document.execCommand('selectAll'); return true;",
            )
            .await?;
        if selected.is_none() {
            return Err(stale(element));
        }
        self.page
            .human()
            .press_key("Backspace")
            .await
            .map_err(browser)
    }

    async fn type_text(&self, element: &Element, text: &str) -> Result<()> {
        self.focus(element).await?;
        self.page.type_text(text).await.map_err(browser)
    }

    async fn value(&self, element: &Element) -> Result<String> {
        self.on_element(
            element,
            "return ('value' in el && el.tagName !== 'BUTTON') ? String(el.value) : (el.innerText || '').trim();",
        )
        .await?
        .ok_or_else(|| stale(element))
    }

    async fn press_key(&self, element: &Element, key: &str) -> Result<()> {
        self.focus(element).await?;
        self.page.human().press_key(key).await.map_err(browser)
    }

    async fn select_option(&self, element: &Element, text: &str) -> Result<bool> {
        let js = format!("{}({},{})", SELECT_JS, js_str(&element.handle), js_str(text));
        let result: String = self.page.evaluate(&js).await.map_err(browser)?;
        match result.as_str() {
            "ok" => Ok(true),
            "option_not_found" => Ok(false),
            "element_not_found" => Err(stale(element)),
            other => Err(PageError::Script(format!("select failed: {}", other))),
        }
    }

    async fn set_files(&self, element: &Element, paths: &[PathBuf]) -> Result<()> {
        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            let data = tokio::fs::read(path).await?;
            files.push(serde_json::json!({
                "name": path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default(),
                "mime": mime_type(path),
                "data": base64::engine::general_purpose::STANDARD.encode(&data),
            }));
        }
        debug!("set_files {} ({} files)", element.handle, files.len());
        let js = format!(
            "{}({},{})",
            SET_FILES_JS,
            js_str(&element.handle),
            serde_json::Value::Array(files)
        );
        let attached: bool = self.page.evaluate(&js).await.map_err(browser)?;
        if attached {
            Ok(())
        } else {
            Err(stale(element))
        }
    }

    async fn scroll_into_view(&self, element: &Element) -> Result<()> {
        self.on_element::<bool>(
            element,
            "el.scrollIntoView({block: 'center', inline: 'nearest'}); return true;",
        )
        .await?
        .map(|_| ())
        .ok_or_else(|| stale(element))
    }

    async fn check(&self, condition: &Condition) -> Result<bool> {
        match condition {
            Condition::Visible { locator } => Ok(!self.find_all(locator).await?.is_empty()),
            Condition::CountAtLeast { locator, count } => {
                Ok(self.find_all(locator).await?.len() >= *count)
            }
            Condition::TextPresent { text } => {
                let page_text = self.page.text().await.map_err(browser)?;
                Ok(page_text.contains(text.as_str()))
            }
            Condition::ValueEquals { element, value } => {
                let current: Option<String> = self
                    .on_element(
                        element,
                        "return ('value' in el && el.tagName !== 'BUTTON') ? String(el.value) : (el.innerText || '').trim();",
                    )
                    .await?;
                Ok(current.as_deref() == Some(value.as_str()))
            }
            Condition::Checked { element, checked } => {
                let current: Option<bool> = self
                    .on_element(
                        element,
                        "return !!el.checked || el.getAttribute('aria-checked') === 'true';",
                    )
                    .await?;
                Ok(current == Some(*checked))
            }
        }
    }
}

fn browser(e: eoka::Error) -> PageError {
    PageError::Browser(e.to_string())
}

fn stale(element: &Element) -> PageError {
    PageError::StaleElement(element.handle.clone())
}

/// JSON string literal, safe to splice into a script.
fn js_str(s: &str) -> String {
    serde_json::Value::from(s).to_string()
}

fn mime_type(path: &Path) -> &'static str {
    match path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .as_deref()
    {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("txt") => "text/plain",
        Some("rtf") => "application/rtf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn js_strings_are_escaped() {
        assert_eq!(js_str("#a"), "\"#a\"");
        assert_eq!(js_str("say \"hi\"\n"), "\"say \\\"hi\\\"\\n\"");
    }

    #[test]
    fn locators_serialize_for_the_find_script() {
        let loc = Locator::parse("role:group=Education >> role:button=/^Add/");
        let json: serde_json::Value = serde_json::to_value(&loc).unwrap();
        assert_eq!(json["type"], "within");
        assert_eq!(json["scope"]["type"], "role");
        assert_eq!(json["scope"]["name"]["mode"], "exact");
        assert_eq!(json["inner"]["name"]["mode"], "regex");
        assert_eq!(json["inner"]["name"]["value"], "^Add");

        let loc = Locator::parse("id$:--url");
        let json = serde_json::to_value(&loc).unwrap();
        assert_eq!(json["type"], "id_suffix");
        assert_eq!(json["suffix"], "--url");
    }

    #[test]
    fn mime_types_by_extension() {
        assert_eq!(mime_type(Path::new("/tmp/Resume.PDF")), "application/pdf");
        assert!(mime_type(Path::new("cv.docx")).ends_with("wordprocessingml.document"));
        assert_eq!(mime_type(Path::new("noext")), "application/octet-stream");
    }
}
