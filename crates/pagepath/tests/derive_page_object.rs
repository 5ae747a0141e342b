//! Page objects declared with `#[derive(PageObject)]`.

#![cfg(feature = "derive")]
#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

use pagepath::prelude::*;
use std::sync::Arc;

#[derive(PageObject)]
struct SingleComponent {
    #[element(".child-item")]
    child_item: Leaf,
}

#[derive(PageObject)]
struct MultipleComponent {
    #[element("div")]
    child_item: Leaf,
}

#[derive(PageObject)]
struct App {
    #[element(".single-element")]
    single_element: Leaf,
    #[collection(".list li")]
    list: Leaf,
    #[element(".container")]
    single_component: SingleComponent,
    #[collection(".list-components li")]
    multiple_components: MultipleComponent,
    #[collection("button.sign-in")]
    #[page(name = "Sign in Buttons")]
    sign_in: Leaf,
}

#[test]
fn derived_tree_matches_declaration() {
    let children = App::children();
    assert_eq!(children.len(), 5);

    let list = children.get("List").unwrap();
    assert!(list.is_collection());
    assert_eq!(list.selector(), ".list li");
    assert!(list.children().is_empty());

    let component = children.get("Single Component").unwrap();
    assert!(!component.is_collection());
    assert_eq!(
        component.children().get("Child Item").unwrap().selector(),
        ".child-item"
    );

    assert!(children.contains("Sign in Buttons"));
    assert!(!children.contains("SignIn"));
}

#[tokio::test]
async fn resolves_through_derived_tree() {
    let driver = Arc::new(
        MockDriver::new()
            .with_element(MockElement::new("c1").matching(".list-components li").with_text("a"))
            .with_element(
                MockElement::new("c1-div")
                    .child_of("c1")
                    .matching("div")
                    .with_text("first inner"),
            )
            .with_element(MockElement::new("c2").matching(".list-components li").with_text("b"))
            .with_element(
                MockElement::new("c2-div")
                    .child_of("c2")
                    .matching("div")
                    .with_text("second inner"),
            )
            .with_element(
                MockElement::new("go")
                    .matching("button.sign-in")
                    .with_text("Go"),
            ),
    );

    let mut engine = PathEngine::new();
    engine.init(driver.clone(), EngineOptions::default());
    engine.register_page::<App>();

    let target = engine
        .get_element("#2 of Multiple Components > Child Item")
        .await
        .unwrap();
    assert_eq!(
        target.as_element().and_then(ElementHandle::identity),
        Some("c2-div")
    );

    let target = engine.get_element("#Go in Sign in Buttons").await.unwrap();
    assert_eq!(
        target.as_element().and_then(ElementHandle::identity),
        Some("go")
    );
}
