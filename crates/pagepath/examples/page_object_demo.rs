//! Example: Path-Based Page Objects
//!
//! Demonstrates: registering a page-object tree and resolving paths against
//! an in-memory document
//!
//! Run with: `cargo run --example page_object_demo`
//!
//! Set `RUST_LOG=pagepath=debug` to see every resolved step.

use pagepath::prelude::*;
use pagepath::tracing_support::init_tracing;
use std::sync::Arc;

fn document() -> MockDriver {
    let mut driver = MockDriver::new().with_element(
        MockElement::new("title")
            .matching(".single-element")
            .with_text("text of single element"),
    );
    for (i, text) in ["First", "Second", "Third", "Fourth", "Fifth"].iter().enumerate() {
        driver.add_element(
            MockElement::new(format!("li-{}", i + 1))
                .matching(".list li")
                .with_text(*text),
        );
    }
    for (i, text) in ["first inner", "second inner", "third inner"].iter().enumerate() {
        let item = format!("component-{}", i + 1);
        driver.add_element(
            MockElement::new(&item)
                .matching(".list-components li")
                .with_text(*text),
        );
        driver.add_element(
            MockElement::new(format!("{item}-div"))
                .child_of(&item)
                .matching("div")
                .with_text(*text),
        );
    }
    driver
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> PathResult<()> {
    let _ = init_tracing();
    println!("=== Path-Based Page Objects Example ===\n");

    // 1. Options: defaults, then environment overrides
    let options = EngineOptions::default()
        .with_timeout(1_000)
        .with_env_overrides()?;
    println!(
        "1. Options: timeout {}ms, poll every {}ms",
        options.timeout_ms, options.poll_interval_ms
    );

    // 2. Attach a driver and register the tree
    let mut engine = PathEngine::new();
    engine.init(Arc::new(document()), options);
    engine.register([
        ("Single Element", PageNode::element(".single-element")),
        ("List", PageNode::collection(".list li")),
        (
            "Multiple Components",
            PageNode::collection(".list-components li")
                .with_child("Child Item", PageNode::element("div")),
        ),
    ]);
    println!("\n2. Registered: {}", engine.names().join(", "));

    // 3. Resolve paths
    println!("\n3. Resolving paths...");
    for path in [
        "Single Element",
        "List",
        "#2 of List",
        "#Thi in List",
        "@Third in List",
        "#2 of Multiple Components > Child Item",
        "@third inner in Multiple Components > Child Item",
        "Multiple Components > Child Item",
        "#42 of List",
    ] {
        match engine.get_element(path).await? {
            Target::Element(element) if element.is_not_found() => {
                println!("   {path:<50} -> not found");
            }
            Target::Element(element) => println!("   {path:<50} -> {element}"),
            Target::Collection(members) => {
                println!("   {path:<50} -> {} elements", members.len());
            }
        }
    }

    // 4. Structural errors abort resolution
    println!("\n4. Errors...");
    for path in ["Lst", "#1 of Single Element", "#0 of List"] {
        if let Err(err) = engine.get_element(path).await {
            println!("   {path:<50} -> {err}");
        }
    }

    println!("\n=== Example Complete ===");
    Ok(())
}
