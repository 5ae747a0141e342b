//! Path Resolver
//!
//! Walks a parsed path against the registered page-object tree, starting at
//! the document root. Each step narrows the current scope:
//!
//! | scope      | child      | modifier   | action                                  |
//! |------------|------------|------------|-----------------------------------------|
//! | element    | single     | none       | `query_one` under the element           |
//! | element    | collection | none       | `query_all` under the element           |
//! | element    | collection | `#n of`    | poll until n members exist, pick n-th   |
//! | element    | collection | `#t in`/`@`| poll until a member's text matches      |
//! | collection | single     | none       | fan out `query_one` over every member   |
//! | collection | collection | any        | invalid operation                       |
//! | any        | single     | index/text | invalid operation                       |
//!
//! A polled step that never succeeds yields the not-found sentinel rather
//! than an error.

use crate::config::EngineOptions;
use crate::driver::{ElementHandle, PageDriver};
use crate::page_object::{Children, PageNode, PageObject, PageTree};
use crate::path::{parse, MatchKind, Modifier, ParsedPath, SelectorStep};
use crate::result::{PathError, PathResult};
use crate::wait::Poller;
use futures::future::try_join_all;
use std::sync::Arc;

/// What a path resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A single element (possibly absent or the not-found sentinel)
    Element(ElementHandle),
    /// An ordered collection of elements
    Collection(Vec<ElementHandle>),
}

impl Target {
    /// Whether the path resolved to a collection
    #[must_use]
    pub const fn is_collection(&self) -> bool {
        matches!(self, Self::Collection(_))
    }

    /// The single element, if any
    #[must_use]
    pub const fn as_element(&self) -> Option<&ElementHandle> {
        match self {
            Self::Element(element) => Some(element),
            Self::Collection(_) => None,
        }
    }

    /// Consume into the single element, if any
    #[must_use]
    pub fn into_element(self) -> Option<ElementHandle> {
        match self {
            Self::Element(element) => Some(element),
            Self::Collection(_) => None,
        }
    }

    /// The collection members, if any
    #[must_use]
    pub fn as_collection(&self) -> Option<&[ElementHandle]> {
        match self {
            Self::Element(_) => None,
            Self::Collection(members) => Some(members),
        }
    }

    /// Consume into the collection members, if any
    #[must_use]
    pub fn into_collection(self) -> Option<Vec<ElementHandle>> {
        match self {
            Self::Element(_) => None,
            Self::Collection(members) => Some(members),
        }
    }

    /// Number of handles; always 1 for a single element, even an absent
    /// one or the not-found sentinel, so it says nothing about existence
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Element(_) => 1,
            Self::Collection(members) => members.len(),
        }
    }

    /// Whether this is an empty collection
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether this is the not-found sentinel
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.as_element().is_some_and(ElementHandle::is_not_found)
    }
}

/// Per-call resolution state
struct Scope<'t> {
    target: Target,
    children: &'t Children,
}

/// Path resolution engine.
///
/// Lifecycle: [`init`](Self::init) once, [`register`](Self::register) the
/// page objects, then resolve any number of paths with
/// [`get_element`](Self::get_element).
///
/// ```ignore
/// let mut engine = PathEngine::new();
/// engine.init(Arc::new(driver), EngineOptions::default());
/// engine.register([("List", PageNode::collection(".list li"))]);
///
/// let second = engine.get_element("#2 of List").await?;
/// ```
#[derive(Debug, Default)]
pub struct PathEngine {
    driver: Option<Arc<dyn PageDriver>>,
    options: EngineOptions,
    poller: Option<Poller>,
    tree: PageTree,
}

impl PathEngine {
    /// Create a detached engine
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine attached to `driver`
    #[must_use]
    pub fn with_driver(driver: Arc<dyn PageDriver>, options: EngineOptions) -> Self {
        let mut engine = Self::new();
        engine.init(driver, options);
        engine
    }

    /// Attach the driver and fix the engine options
    pub fn init(&mut self, driver: Arc<dyn PageDriver>, options: EngineOptions) {
        tracing::debug!(
            timeout_ms = options.timeout_ms,
            poll_interval_ms = options.poll_interval_ms,
            "engine initialized"
        );
        self.driver = Some(driver);
        self.poller = Some(Poller::from_options(&options));
        self.options = options;
    }

    /// Merge top-level page objects into the tree; later registrations
    /// overwrite same-named entries
    pub fn register<K, I>(&mut self, nodes: I)
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, PageNode)>,
    {
        self.tree.register(nodes);
    }

    /// Register the members of a declared page object
    pub fn register_page<P: PageObject>(&mut self) {
        self.tree.register_page::<P>();
    }

    /// Registered tree
    #[must_use]
    pub const fn tree(&self) -> &PageTree {
        &self.tree
    }

    /// Normalized names of the top-level page objects
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.tree.names()
    }

    /// Engine options
    #[must_use]
    pub const fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Whether `init` has been called
    #[must_use]
    pub const fn is_attached(&self) -> bool {
        self.driver.is_some()
    }

    /// The attached driver
    pub fn driver(&self) -> PathResult<&dyn PageDriver> {
        self.driver.as_deref().ok_or(PathError::DriverNotAttached)
    }

    /// Resolve a path string to an element or collection.
    ///
    /// # Errors
    ///
    /// - [`PathError::DriverNotAttached`] before `init`
    /// - [`PathError::Parse`] for malformed paths
    /// - [`PathError::UnknownElement`] for names not registered at that level
    /// - [`PathError::InvalidOperation`] for collection-of-collection or
    ///   modifiers on single elements
    /// - [`PathError::Driver`] if the driver fails a query
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn get_element(&self, path: &str) -> PathResult<Target> {
        self.driver()?;
        let parsed = parse(path)?;
        self.resolve(&parsed).await
    }

    /// Resolve an already parsed path
    pub async fn resolve(&self, path: &ParsedPath) -> PathResult<Target> {
        let driver = self.driver()?;
        let poller = self
            .poller
            .unwrap_or_else(|| Poller::from_options(&self.options));

        let mut scope = Scope {
            target: Target::Element(ElementHandle::document()),
            children: self.tree.root(),
        };

        for segment in path.segments() {
            let step = segment
                .step_for(scope.children)
                .ok_or_else(|| PathError::unknown_element(&segment.preferred().label))?;
            let node = scope
                .children
                .get(&step.name)
                .ok_or_else(|| PathError::unknown_element(&step.label))?;

            tracing::debug!(step = %step, collection = node.is_collection(), "resolving step");
            scope = Scope {
                target: Self::step(driver, &poller, scope.target, node, step).await?,
                children: node.children(),
            };
        }

        Ok(scope.target)
    }

    /// Whether a resolved element is attached to the document
    pub async fn exists(&self, element: &ElementHandle) -> PathResult<bool> {
        self.driver()?.exists(element).await
    }

    /// Whether a resolved element is displayed
    pub async fn is_visible(&self, element: &ElementHandle) -> PathResult<bool> {
        self.driver()?.is_visible(element).await
    }

    async fn step(
        driver: &dyn PageDriver,
        poller: &Poller,
        target: Target,
        node: &PageNode,
        step: &SelectorStep,
    ) -> PathResult<Target> {
        match (target, node) {
            (Target::Collection(_), PageNode::Collection { .. }) => Err(
                PathError::invalid_operation("Getting collection from collection"),
            ),
            (target, PageNode::Single { selector, .. }) => {
                if !step.modifier.is_none() {
                    return Err(PathError::invalid_operation(format!(
                        "{} is not collection",
                        step.label
                    )));
                }
                match target {
                    Target::Element(scope) => {
                        Ok(Target::Element(driver.query_one(&scope, selector).await?))
                    }
                    Target::Collection(members) => {
                        Ok(Target::Collection(fan_out(driver, &members, selector).await?))
                    }
                }
            }
            (Target::Element(scope), PageNode::Collection { selector, .. }) => {
                match &step.modifier {
                    Modifier::None => Ok(Target::Collection(
                        driver.query_all(&scope, selector).await?,
                    )),
                    Modifier::Index(n) => {
                        by_index(driver, poller, &scope, selector, *n)
                            .await
                            .map(Target::Element)
                    }
                    Modifier::Text { kind, value } => {
                        by_text(driver, poller, &scope, selector, *kind, value)
                            .await
                            .map(Target::Element)
                    }
                }
            }
        }
    }
}

/// Query `selector` under every member concurrently, keeping member order
async fn fan_out(
    driver: &dyn PageDriver,
    members: &[ElementHandle],
    selector: &str,
) -> PathResult<Vec<ElementHandle>> {
    try_join_all(
        members
            .iter()
            .map(|member| driver.query_one(member, selector)),
    )
    .await
}

async fn by_index(
    driver: &dyn PageDriver,
    poller: &Poller,
    scope: &ElementHandle,
    selector: &str,
    n: usize,
) -> PathResult<ElementHandle> {
    let result = poller
        .until(format!("#{n} of {selector}"), move || async move {
            let members = driver.query_all(scope, selector).await?;
            Ok::<_, PathError>(members.into_iter().nth(n.saturating_sub(1)))
        })
        .await?;

    Ok(found_or_sentinel(driver, result.value, &result.waited_for))
}

async fn by_text(
    driver: &dyn PageDriver,
    poller: &Poller,
    scope: &ElementHandle,
    selector: &str,
    kind: MatchKind,
    value: &str,
) -> PathResult<ElementHandle> {
    let result = poller
        .until(format!("{kind:?} {value:?} in {selector}"), move || async move {
            for member in driver.query_all(scope, selector).await? {
                let text = match element_text(driver, &member).await {
                    Ok(text) => text,
                    Err(err) => {
                        // detached between the query and the text read
                        if driver.exists(&member).await? {
                            return Err(err);
                        }
                        tracing::trace!(%member, %err, "member went stale, skipping");
                        continue;
                    }
                };
                if kind.matches(&text, value) {
                    return Ok(Some(member));
                }
            }
            Ok::<_, PathError>(None)
        })
        .await?;

    Ok(found_or_sentinel(driver, result.value, &result.waited_for))
}

/// Rendered text, falling back to raw text content when the driver cannot
/// render it
async fn element_text(driver: &dyn PageDriver, element: &ElementHandle) -> PathResult<String> {
    match driver.visible_text(element).await? {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Ok(driver.text_content(element).await?.trim().to_string()),
    }
}

fn found_or_sentinel(
    driver: &dyn PageDriver,
    found: Option<ElementHandle>,
    waited_for: &str,
) -> ElementHandle {
    found.unwrap_or_else(|| {
        tracing::debug!(waited_for, "poll timed out, returning not-found sentinel");
        ElementHandle::not_found(driver.session_token())
    })
}
