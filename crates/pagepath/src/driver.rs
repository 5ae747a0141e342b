//! PageDriver - the automation driver collaborator
//!
//! The engine never talks to a browser directly. Everything it needs from the
//! outside world goes through [`PageDriver`]:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  PathEngine                                                  │
//! │     │ query_one / query_all / visible_text / text_content    │
//! │     ▼                                                        │
//! │  PageDriver (async trait)                                    │
//! │     ├── MockDriver   in-memory document for unit tests       │
//! │     └── CdpDriver    chromiumoxide page (feature "browser")  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Absence is data, not an error: a query that matches nothing returns an
//! [`ElementHandle`] without an identity, and `exists` reports `false` for it.

use crate::result::{PathError, PathResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use uuid::Uuid;

/// Selector prefix that can never match an element
pub const NOT_FOUND_PREFIX: &str = ":not(*)";

/// Identity of the document root scope
pub const DOCUMENT_ID: &str = "document";

/// Handle to an element (or to the absence of one)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Session-scoped identity token; `None` when nothing matched
    pub id: Option<String>,
    /// Selector the element was located with
    pub selector: String,
}

impl ElementHandle {
    /// Handle for an element that exists
    #[must_use]
    pub fn new(id: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            selector: selector.into(),
        }
    }

    /// The document root scope
    #[must_use]
    pub fn document() -> Self {
        Self::new(DOCUMENT_ID, "")
    }

    /// Handle for a query that matched nothing
    #[must_use]
    pub fn absent(selector: impl Into<String>) -> Self {
        Self {
            id: None,
            selector: selector.into(),
        }
    }

    /// Not-found sentinel: addresses a selector that is impossible by
    /// construction and unique to the given session
    #[must_use]
    pub fn not_found(session_token: &str) -> Self {
        Self::absent(format!(
            "{NOT_FOUND_PREFIX}[data-pagepath-session=\"{session_token}\"]"
        ))
    }

    /// Whether the handle refers to a matched element
    #[must_use]
    pub const fn is_present(&self) -> bool {
        self.id.is_some()
    }

    /// Whether this is the document root
    #[must_use]
    pub fn is_document(&self) -> bool {
        self.id.as_deref() == Some(DOCUMENT_ID)
    }

    /// Whether this is a not-found sentinel
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.id.is_none() && self.selector.starts_with(NOT_FOUND_PREFIX)
    }

    /// Identity token, if any
    #[must_use]
    pub fn identity(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{id} ({})", self.selector),
            None => write!(f, "<absent> ({})", self.selector),
        }
    }
}

/// Capabilities the engine requires from an automation driver
#[async_trait]
pub trait PageDriver: Send + Sync + fmt::Debug {
    /// First descendant of `scope` matching `selector`; an absent handle if
    /// there is none
    async fn query_one(&self, scope: &ElementHandle, selector: &str)
        -> PathResult<ElementHandle>;

    /// All descendants of `scope` matching `selector`, in document order
    async fn query_all(
        &self,
        scope: &ElementHandle,
        selector: &str,
    ) -> PathResult<Vec<ElementHandle>>;

    /// Rendered text, `None` if the driver cannot provide it
    async fn visible_text(&self, element: &ElementHandle) -> PathResult<Option<String>>;

    /// Raw `textContent`, read through the driver's evaluation capability
    async fn text_content(&self, element: &ElementHandle) -> PathResult<String>;

    /// Whether the element is attached to the document
    async fn exists(&self, element: &ElementHandle) -> PathResult<bool>;

    /// Whether the element exists and is displayed
    async fn is_visible(&self, element: &ElementHandle) -> PathResult<bool>;

    /// Token unique to the current session/page
    fn session_token(&self) -> &str;
}

/// Element of a [`MockDriver`] document
#[derive(Debug, Clone)]
pub struct MockElement {
    /// Identity token
    pub id: String,
    /// Parent element id; `None` for direct children of the document
    pub parent: Option<String>,
    /// Selectors this element answers to
    pub selectors: Vec<String>,
    /// Rendered text (`None` = driver cannot render it)
    pub text: Option<String>,
    /// Raw text content
    pub text_content: String,
    /// Whether the element is displayed
    pub visible: bool,
    /// Delay after driver creation before the element is attached
    pub appears_after: Duration,
    /// Latency of queries scoped to this element
    pub query_latency: Duration,
}

impl MockElement {
    /// Create a visible, immediately attached element
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent: None,
            selectors: Vec::new(),
            text: None,
            text_content: String::new(),
            visible: true,
            appears_after: Duration::ZERO,
            query_latency: Duration::ZERO,
        }
    }

    /// Nest under another element
    #[must_use]
    pub fn child_of(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Answer to a selector
    #[must_use]
    pub fn matching(mut self, selector: impl Into<String>) -> Self {
        self.selectors.push(selector.into());
        self
    }

    /// Set both rendered text and raw text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.text_content.clone_from(&text);
        self.text = Some(text);
        self
    }

    /// Set raw text content only; rendered text stays unavailable
    #[must_use]
    pub fn with_text_content(mut self, text: impl Into<String>) -> Self {
        self.text_content = text.into();
        self.text = None;
        self
    }

    /// Mark as not displayed
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Attach the element only after `delay`
    #[must_use]
    pub const fn appearing_after(mut self, delay: Duration) -> Self {
        self.appears_after = delay;
        self
    }

    /// Delay queries scoped to this element
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.query_latency = latency;
        self
    }
}

/// In-memory driver for unit testing.
///
/// Elements are kept in document order. Time is measured with
/// `tokio::time::Instant`, so tests running with paused time observe
/// delayed elements deterministically.
#[derive(Debug)]
pub struct MockDriver {
    elements: Vec<MockElement>,
    session: String,
    created: tokio::time::Instant,
    call_history: Mutex<Vec<String>>,
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDriver {
    /// Create an empty document with a random session token
    #[must_use]
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
            session: Uuid::new_v4().simple().to_string(),
            created: tokio::time::Instant::now(),
            call_history: Mutex::new(Vec::new()),
        }
    }

    /// Use a fixed session token
    #[must_use]
    pub fn with_session(mut self, token: impl Into<String>) -> Self {
        self.session = token.into();
        self
    }

    /// Append an element in document order
    #[must_use]
    pub fn with_element(mut self, element: MockElement) -> Self {
        self.elements.push(element);
        self
    }

    /// Append an element in document order
    pub fn add_element(&mut self, element: MockElement) {
        self.elements.push(element);
    }

    /// Recorded calls, in completion order
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.lock_history().clone()
    }

    /// Check if a method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.call_count(method) > 0
    }

    /// Number of recorded calls starting with `method`
    #[must_use]
    pub fn call_count(&self, method: &str) -> usize {
        self.lock_history()
            .iter()
            .filter(|call| call.starts_with(method))
            .count()
    }

    fn lock_history(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.call_history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: String) {
        self.lock_history().push(call);
    }

    fn attached(&self, element: &MockElement) -> bool {
        self.created.elapsed() >= element.appears_after
    }

    fn find(&self, handle: &ElementHandle) -> Option<&MockElement> {
        let id = handle.identity()?;
        self.elements
            .iter()
            .find(|e| e.id == id)
            .filter(|e| self.attached(e))
    }

    fn is_descendant(&self, element: &MockElement, ancestor: &str) -> bool {
        let mut parent = element.parent.as_deref();
        while let Some(id) = parent {
            if id == ancestor {
                return true;
            }
            parent = self
                .elements
                .iter()
                .find(|e| e.id == id)
                .and_then(|e| e.parent.as_deref());
        }
        false
    }

    /// Attached matches under `scope`; `None` if the scope itself is gone
    async fn matches(&self, scope: &ElementHandle, selector: &str) -> Option<Vec<ElementHandle>> {
        let scope_id = if scope.is_document() {
            None
        } else {
            let element = self.find(scope)?;
            if !element.query_latency.is_zero() {
                tokio::time::sleep(element.query_latency).await;
            }
            Some(element.id.as_str())
        };

        Some(
            self.elements
                .iter()
                .filter(|e| self.attached(e))
                .filter(|e| e.selectors.iter().any(|s| s == selector))
                .filter(|e| scope_id.map_or(true, |ancestor| self.is_descendant(e, ancestor)))
                .map(|e| ElementHandle::new(e.id.clone(), selector))
                .collect(),
        )
    }

    fn require(&self, element: &ElementHandle) -> PathResult<&MockElement> {
        self.find(element)
            .ok_or_else(|| PathError::driver(format!("element {element} does not exist")))
    }
}

#[async_trait]
impl PageDriver for MockDriver {
    async fn query_one(
        &self,
        scope: &ElementHandle,
        selector: &str,
    ) -> PathResult<ElementHandle> {
        let found = self
            .matches(scope, selector)
            .await
            .and_then(|all| all.into_iter().next())
            .unwrap_or_else(|| ElementHandle::absent(selector));
        self.record(format!(
            "query_one:{}:{selector}",
            scope.identity().unwrap_or("<absent>")
        ));
        Ok(found)
    }

    async fn query_all(
        &self,
        scope: &ElementHandle,
        selector: &str,
    ) -> PathResult<Vec<ElementHandle>> {
        let found = self.matches(scope, selector).await.unwrap_or_default();
        self.record(format!(
            "query_all:{}:{selector}",
            scope.identity().unwrap_or("<absent>")
        ));
        Ok(found)
    }

    async fn visible_text(&self, element: &ElementHandle) -> PathResult<Option<String>> {
        let found = self.require(element)?;
        self.record(format!("visible_text:{}", found.id));
        if !found.visible {
            return Ok(Some(String::new()));
        }
        Ok(found.text.clone())
    }

    async fn text_content(&self, element: &ElementHandle) -> PathResult<String> {
        let found = self.require(element)?;
        self.record(format!("text_content:{}", found.id));
        Ok(found.text_content.clone())
    }

    async fn exists(&self, element: &ElementHandle) -> PathResult<bool> {
        Ok(element.is_document() || self.find(element).is_some())
    }

    async fn is_visible(&self, element: &ElementHandle) -> PathResult<bool> {
        Ok(element.is_document() || self.find(element).is_some_and(|e| e.visible))
    }

    fn session_token(&self) -> &str {
        &self.session
    }
}
