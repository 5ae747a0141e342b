//! Chrome DevTools Protocol driver
//!
//! Implements [`PageDriver`] over a chromiumoxide [`Page`]. DOM nodes cannot
//! cross the protocol boundary by reference, so the driver keeps a registry
//! on the page (`window.__pagepath`) that hands out a stable id per element:
//!
//! - `ids`: `WeakMap<Element, id>`, so an element keeps the same id across
//!   queries without being kept alive by it
//! - `byId`: `Map<id, WeakRef<Element>>`, for resolving handles back
//!
//! Ids are prefixed with the driver's session token. A page reload drops the
//! registry, after which stale handles simply stop existing.

use crate::driver::{ElementHandle, PageDriver, DOCUMENT_ID};
use crate::result::{PathError, PathResult};
use async_trait::async_trait;
use chromiumoxide::page::Page;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use uuid::Uuid;

const REGISTRY: &str = r"
const reg = window.__pagepath || (window.__pagepath = { ids: new WeakMap(), byId: new Map(), next: 0 });
const idOf = (el) => {
  let id = reg.ids.get(el);
  if (!id) {
    reg.next += 1;
    id = `${SESSION}-${reg.next}`;
    reg.ids.set(el, id);
    reg.byId.set(id, new WeakRef(el));
  }
  return id;
};
const lookup = (id) => {
  if (id === DOCUMENT) return document;
  const ref = reg.byId.get(id);
  const el = ref?.deref();
  if (ref && !el) reg.byId.delete(id);
  return el && el.isConnected ? el : null;
};
";

#[derive(Debug, Deserialize)]
struct TextProbe {
    found: bool,
    text: Option<String>,
}

/// Driver backed by a live Chromium page
#[derive(Clone)]
pub struct CdpDriver {
    page: Page,
    session: String,
}

impl fmt::Debug for CdpDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CdpDriver")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl CdpDriver {
    /// Wrap a page; each driver gets a fresh session token
    #[must_use]
    pub fn new(page: Page) -> Self {
        Self {
            page,
            session: Uuid::new_v4().simple().to_string(),
        }
    }

    /// Underlying page
    #[must_use]
    pub const fn page(&self) -> &Page {
        &self.page
    }

    async fn eval<T: DeserializeOwned>(&self, body: &str) -> PathResult<T> {
        let script = script(&self.session, body)?;
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| PathError::driver(e.to_string()))?;
        result
            .into_value()
            .map_err(|e| PathError::driver(format!("unexpected evaluation result: {e}")))
    }

    async fn probe_text(&self, element: &ElementHandle, property: &str) -> PathResult<TextProbe> {
        let Some(id) = element.identity() else {
            return Err(PathError::driver(format!("element {element} does not exist")));
        };
        let probe: TextProbe = self
            .eval(&format!(
                "const el = lookup({id}); \
                 return el ? {{ found: true, text: el.{property} ?? null }} : {{ found: false, text: null }};",
                id = js(id)?,
            ))
            .await?;
        if probe.found {
            Ok(probe)
        } else {
            Err(PathError::driver(format!("element {element} does not exist")))
        }
    }
}

/// Wrap `body` in an IIFE with the registry helpers in scope
fn script(session: &str, body: &str) -> PathResult<String> {
    Ok(format!(
        "(() => {{ const SESSION = {session}; const DOCUMENT = {document};{REGISTRY}{body} }})()",
        session = js(session)?,
        document = js(DOCUMENT_ID)?,
    ))
}

/// Encode a string as a JavaScript literal
fn js(value: &str) -> PathResult<String> {
    Ok(serde_json::to_string(value)?)
}

#[async_trait]
impl PageDriver for CdpDriver {
    async fn query_one(
        &self,
        scope: &ElementHandle,
        selector: &str,
    ) -> PathResult<ElementHandle> {
        let Some(scope_id) = scope.identity() else {
            return Ok(ElementHandle::absent(selector));
        };
        let id: Option<String> = self
            .eval(&format!(
                "const scope = lookup({scope}); \
                 const el = scope ? scope.querySelector({selector}) : null; \
                 return el ? idOf(el) : null;",
                scope = js(scope_id)?,
                selector = js(selector)?,
            ))
            .await?;
        Ok(id.map_or_else(
            || ElementHandle::absent(selector),
            |id| ElementHandle::new(id, selector),
        ))
    }

    async fn query_all(
        &self,
        scope: &ElementHandle,
        selector: &str,
    ) -> PathResult<Vec<ElementHandle>> {
        let Some(scope_id) = scope.identity() else {
            return Ok(Vec::new());
        };
        let ids: Vec<String> = self
            .eval(&format!(
                "const scope = lookup({scope}); \
                 return scope ? Array.from(scope.querySelectorAll({selector}), idOf) : [];",
                scope = js(scope_id)?,
                selector = js(selector)?,
            ))
            .await?;
        Ok(ids
            .into_iter()
            .map(|id| ElementHandle::new(id, selector))
            .collect())
    }

    async fn visible_text(&self, element: &ElementHandle) -> PathResult<Option<String>> {
        Ok(self.probe_text(element, "innerText").await?.text)
    }

    async fn text_content(&self, element: &ElementHandle) -> PathResult<String> {
        Ok(self
            .probe_text(element, "textContent")
            .await?
            .text
            .unwrap_or_default())
    }

    async fn exists(&self, element: &ElementHandle) -> PathResult<bool> {
        let Some(id) = element.identity() else {
            return Ok(false);
        };
        self.eval(&format!("return lookup({}) !== null;", js(id)?))
            .await
    }

    async fn is_visible(&self, element: &ElementHandle) -> PathResult<bool> {
        let Some(id) = element.identity() else {
            return Ok(false);
        };
        if element.is_document() {
            return Ok(true);
        }
        self.eval(&format!(
            "const el = lookup({}); \
             return !!el && !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length);",
            js(id)?
        ))
        .await
    }

    fn session_token(&self) -> &str {
        &self.session
    }
}
