//! Pagepath: Path-Based Page Object Resolution
//!
//! Addresses elements of a web page through human-readable paths over a
//! declared tree of page objects, instead of raw CSS selectors:
//!
//! ```text
//! "#2 of Multiple Components > Child Item"
//! "@Third in List"
//! "#Contain in word in List"
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                      PAGEPATH Architecture                       │
//! ├──────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐             │
//! │   │ Path       │    │ Path       │    │ PageDriver │             │
//! │   │ Parser     │───►│ Engine     │───►│ (mock/CDP) │             │
//! │   └────────────┘    └─────┬──────┘    └────────────┘             │
//! │                           │                                      │
//! │                ┌──────────┴─────────┐                            │
//! │                │ PageTree  │ Poller │                            │
//! │                └────────────────────┘                            │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use pagepath::prelude::*;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let driver = MockDriver::new()
//!     .with_element(MockElement::new("a").matching(".list li").with_text("First"))
//!     .with_element(MockElement::new("b").matching(".list li").with_text("Second"));
//!
//! let mut engine = PathEngine::new();
//! engine.init(Arc::new(driver), EngineOptions::default());
//! engine.register([("List", PageNode::collection(".list li"))]);
//!
//! let second = engine.get_element("@Second in List").await.unwrap();
//! assert_eq!(second.as_element().and_then(|e| e.identity()), Some("b"));
//! # }
//! ```

#![warn(missing_docs)]

#[allow(clippy::missing_errors_doc)]
mod config;
#[allow(clippy::missing_errors_doc)]
mod driver;
mod engine;
mod page_object;
mod path;
mod result;

/// Chrome DevTools Protocol driver (requires the `browser` feature)
#[cfg(feature = "browser")]
#[allow(clippy::missing_errors_doc)]
pub mod cdp;

/// Tracing subscriber setup
pub mod tracing_support;

/// Wait Mechanisms
#[allow(clippy::missing_errors_doc)]
pub mod wait;

pub use config::{
    EngineOptions, DEFAULT_POLL_INTERVAL_MS, DEFAULT_TIMEOUT_MS, POLL_INTERVAL_ENV, TIMEOUT_ENV,
};
pub use driver::{ElementHandle, MockDriver, MockElement, PageDriver, NOT_FOUND_PREFIX};
pub use engine::{PathEngine, Target};
pub use page_object::{normalize_name, Children, Leaf, PageNode, PageObject, PageTree};
pub use path::{parse, parse_steps, MatchKind, Modifier, ParsedPath, Segment, SelectorStep};
pub use result::{PathError, PathResult};
pub use wait::{wait_until, Poller, WaitResult};

#[cfg(feature = "derive")]
pub use pagepath_derive::PageObject;

/// Prelude for convenient imports
pub mod prelude {
    #[cfg(feature = "browser")]
    pub use super::cdp::CdpDriver;
    pub use super::{
        parse, wait_until, Children, ElementHandle, EngineOptions, Leaf, MockDriver, MockElement,
        PageDriver, PageNode, PageObject, PageTree, PathEngine, PathError, PathResult, Target,
    };
}
