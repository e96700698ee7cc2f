//! Snapshot of one rendered page with a form-state overlay
//!
//! The markup is kept as served; every query re-parses it with `scraper`,
//! so nothing borrowed from the parse outlives a call. Element handles are
//! positions in document order, stamped with the page generation.

use crate::driver::ElementHandle;
use crate::{DriverError, DriverResult};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use url::Url;

/// Elements whose text content is never rendered
const NON_RENDERED: &[&str] = &["script", "style", "noscript", "template"];

/// HTTP method of a form submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMethod {
    Get,
    Post,
}

/// A form ready to be sent, as a browser would build it from a submit click
#[derive(Debug, Clone, PartialEq)]
pub struct FormSubmission {
    pub method: FormMethod,
    pub action: Url,
    pub fields: Vec<(String, String)>,
}

/// What clicking an element does
#[derive(Debug, Clone, PartialEq)]
pub enum ClickAction {
    /// Radio or checkbox state changed in place
    Toggled,
    /// Submit control inside a form
    Submit(FormSubmission),
    /// Anchor with a followable href
    Follow(Url),
    /// Element has no default action
    Inert,
}

/// One loaded page
#[derive(Debug, Clone)]
pub struct Document {
    url: Url,
    raw: Vec<u8>,
    markup: String,
    generation: u64,
    values: HashMap<usize, String>,
    checked: HashMap<usize, bool>,
}

impl Document {
    /// Creates a document from the bytes served for `url`
    pub fn new(url: Url, raw: Vec<u8>, generation: u64) -> Self {
        let markup = String::from_utf8_lossy(&raw).into_owned();
        Self {
            url,
            raw,
            markup,
            generation,
            values: HashMap::new(),
            checked: HashMap::new(),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Re-stamps the page, invalidating every handle resolved before
    pub fn regenerate(&mut self, generation: u64) {
        self.generation = generation;
    }

    pub fn title(&self) -> String {
        let html = self.parse();
        let selector = parse_selector("title").ok();
        selector
            .and_then(|s| {
                html.select(&s)
                    .next()
                    .map(|t| t.text().collect::<String>().trim().to_string())
            })
            .unwrap_or_default()
    }

    pub fn select(&self, selector: &str) -> DriverResult<Vec<ElementHandle>> {
        let selector = parse_selector(selector)?;
        let html = self.parse();
        Ok(indices_of(&html, html.select(&selector))
            .into_iter()
            .map(|index| ElementHandle::new(self.generation, index))
            .collect())
    }

    pub fn select_within(
        &self,
        parent: ElementHandle,
        selector: &str,
    ) -> DriverResult<Vec<ElementHandle>> {
        let selector = parse_selector(selector)?;
        self.check(parent)?;
        let html = self.parse();
        let elements = elements(&html);
        let parent = *elements.get(parent.index()).ok_or(DriverError::StaleElement)?;
        Ok(indices_of(&html, parent.select(&selector))
            .into_iter()
            .map(|index| ElementHandle::new(self.generation, index))
            .collect())
    }

    pub fn text(&self, handle: ElementHandle) -> DriverResult<String> {
        self.with_element(handle, |e| e.text().collect())
    }

    /// Rendered text of `<body>`; script, style, noscript and template contents are left out
    pub fn visible_text(&self) -> String {
        let html = self.parse();
        let body = parse_selector("body")
            .ok()
            .and_then(|selector| html.select(&selector).next());
        let root = body.unwrap_or_else(|| html.root_element());

        let mut text = String::new();
        for node in root.descendants() {
            let Some(chunk) = node.value().as_text() else {
                continue;
            };
            let hidden = node
                .ancestors()
                .filter_map(|ancestor| ancestor.value().as_element())
                .any(|element| NON_RENDERED.contains(&element.name()));
            if !hidden {
                text.push_str(chunk);
            }
        }
        text
    }

    pub fn attribute(&self, handle: ElementHandle, name: &str) -> DriverResult<Option<String>> {
        self.with_element(handle, |e| e.value().attr(name).map(str::to_string))
    }

    pub fn is_checked(&self, handle: ElementHandle) -> DriverResult<bool> {
        let declared = self.with_element(handle, |e| e.value().attr("checked").is_some())?;
        Ok(self.checked.get(&handle.index()).copied().unwrap_or(declared))
    }

    /// Sets the value a text control will submit
    pub fn fill(&mut self, handle: ElementHandle, text: &str) -> DriverResult<()> {
        self.check(handle)?;
        self.values.insert(handle.index(), text.to_string());
        Ok(())
    }

    /// Resolves the default action of a click, applying toggles in place
    pub fn click(&mut self, handle: ElementHandle) -> DriverResult<ClickAction> {
        self.check(handle)?;
        let html = self.parse();
        let elements = elements(&html);
        let element = *elements.get(handle.index()).ok_or(DriverError::StaleElement)?;
        let tag = element.value().name();
        let kind = input_type(&element);

        if tag == "input" && (kind == "radio" || kind == "checkbox") {
            let group = element.value().attr("name").map(str::to_string);
            let currently = self
                .checked
                .get(&handle.index())
                .copied()
                .unwrap_or(element.value().attr("checked").is_some());

            if kind == "radio" {
                if let Some(group) = group {
                    let siblings: Vec<usize> = elements
                        .iter()
                        .enumerate()
                        .filter(|(_, e)| {
                            e.value().name() == "input"
                                && input_type(e) == "radio"
                                && e.value().attr("name") == Some(group.as_str())
                        })
                        .map(|(i, _)| i)
                        .collect();
                    for index in siblings {
                        self.checked.insert(index, false);
                    }
                }
                self.checked.insert(handle.index(), true);
            } else {
                self.checked.insert(handle.index(), !currently);
            }
            return Ok(ClickAction::Toggled);
        }

        let is_submit = (tag == "input" && (kind == "submit" || kind == "image"))
            || (tag == "button" && (kind == "submit" || kind.is_empty()));
        if is_submit {
            let submission = self.build_submission(&elements, element)?;
            return Ok(ClickAction::Submit(submission));
        }

        if tag == "a" {
            if let Some(href) = element.value().attr("href") {
                let href = href.trim();
                if href.starts_with("javascript:") {
                    return Err(DriverError::NotAForm(format!(
                        "script link '{}' cannot be followed",
                        href
                    )));
                }
                if !href.is_empty() && !href.starts_with('#') {
                    return Ok(ClickAction::Follow(self.url.join(href)?));
                }
            }
        }

        Ok(ClickAction::Inert)
    }

    /// Collects the successful controls of the form enclosing `submitter`
    fn build_submission(
        &self,
        elements: &[ElementRef<'_>],
        submitter: ElementRef<'_>,
    ) -> DriverResult<FormSubmission> {
        let form = submitter
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|a| a.value().name() == "form")
            .ok_or_else(|| {
                DriverError::NotAForm(format!(
                    "submit control '{}' is outside any form",
                    submitter.value().attr("name").unwrap_or("")
                ))
            })?;

        let method = match form.value().attr("method") {
            Some(m) if m.eq_ignore_ascii_case("post") => FormMethod::Post,
            _ => FormMethod::Get,
        };
        let action = match form.value().attr("action").map(str::trim) {
            Some(a) if !a.is_empty() => self.url.join(a)?,
            _ => self.url.clone(),
        };

        let mut fields = Vec::new();
        for (index, control) in elements.iter().enumerate() {
            if !control.ancestors().any(|a| a.id() == form.id()) {
                continue;
            }
            let Some(name) = control.value().attr("name") else {
                continue;
            };
            if control.value().attr("disabled").is_some() {
                continue;
            }

            match control.value().name() {
                "input" => match input_type(control).as_str() {
                    "submit" | "image" | "button" | "reset" | "file" => {}
                    "radio" | "checkbox" => {
                        let declared = control.value().attr("checked").is_some();
                        if self.checked.get(&index).copied().unwrap_or(declared) {
                            let value = control.value().attr("value").unwrap_or("on");
                            fields.push((name.to_string(), value.to_string()));
                        }
                    }
                    _ => {
                        let value = self
                            .values
                            .get(&index)
                            .cloned()
                            .unwrap_or_else(|| control.value().attr("value").unwrap_or("").to_string());
                        fields.push((name.to_string(), value));
                    }
                },
                "textarea" => {
                    let value = self
                        .values
                        .get(&index)
                        .cloned()
                        .unwrap_or_else(|| control.text().collect());
                    fields.push((name.to_string(), value));
                }
                "select" => {
                    if let Some(value) = selected_option(control) {
                        fields.push((name.to_string(), value));
                    }
                }
                _ => {}
            }
        }

        if let Some(name) = submitter.value().attr("name") {
            let value = submitter.value().attr("value").unwrap_or("");
            fields.push((name.to_string(), value.to_string()));
        }

        Ok(FormSubmission {
            method,
            action,
            fields,
        })
    }

    fn with_element<T>(
        &self,
        handle: ElementHandle,
        f: impl FnOnce(ElementRef<'_>) -> T,
    ) -> DriverResult<T> {
        self.check(handle)?;
        let html = self.parse();
        let elements = elements(&html);
        let element = elements.get(handle.index()).ok_or(DriverError::StaleElement)?;
        Ok(f(*element))
    }

    fn check(&self, handle: ElementHandle) -> DriverResult<()> {
        if handle.generation() != self.generation {
            return Err(DriverError::StaleElement);
        }
        Ok(())
    }

    fn parse(&self) -> Html {
        Html::parse_document(&self.markup)
    }
}

fn parse_selector(selector: &str) -> DriverResult<Selector> {
    Selector::parse(selector)
        .map_err(|e| DriverError::InvalidSelector(format!("{}: {:?}", selector, e)))
}

/// Every element of the document in document order
fn elements(html: &Html) -> Vec<ElementRef<'_>> {
    html.root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .collect()
}

/// Document-order positions of `matches`
fn indices_of<'a>(html: &'a Html, matches: impl Iterator<Item = ElementRef<'a>>) -> Vec<usize> {
    let positions: HashMap<_, usize> = elements(html)
        .into_iter()
        .enumerate()
        .map(|(i, e)| (e.id(), i))
        .collect();
    matches
        .filter_map(|e| positions.get(&e.id()).copied())
        .collect()
}

fn input_type(element: &ElementRef<'_>) -> String {
    element
        .value()
        .attr("type")
        .unwrap_or(if element.value().name() == "input" { "text" } else { "" })
        .to_ascii_lowercase()
}

fn selected_option(select: &ElementRef<'_>) -> Option<String> {
    let option = parse_selector("option").ok()?;
    let options: Vec<ElementRef<'_>> = select.select(&option).collect();
    let chosen = options
        .iter()
        .find(|o| o.value().attr("selected").is_some())
        .or_else(|| options.first())?;
    Some(
        chosen
            .value()
            .attr("value")
            .map(str::to_string)
            .unwrap_or_else(|| chosen.text().collect::<String>().trim().to_string()),
    )
}
