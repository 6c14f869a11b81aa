//! Sink enforcement demonstration.
//!
//! This example shows the lifecycle of an enforcer over an in-memory DOM:
//! 1. Define sinks on a `SurfaceRegistry`
//! 2. Install enforcement with a fallback policy
//! 3. Assign plain, trusted and hostile values
//! 4. Uninstall and observe the original behavior
//!
//! Violations are reported through `tracing`; this example prints them with
//! a fmt subscriber.
//!
//! Run with: `cargo run --example enforce_sinks`

use std::cell::RefCell;
use std::rc::Rc;

use sink_guard::{
    EnforcementConfig, Enforcer, GetterFn, PolicyFactory, PolicyRules, RuleRejection, SetterFn,
    SinkCatalog, SurfaceKind, SurfaceRegistry, Value,
};

fn define_property(host: &SurfaceRegistry, surface: SurfaceKind, name: &str) {
    let slot = Rc::new(RefCell::new(Value::Undefined));
    let read = slot.clone();
    let getter: GetterFn = Rc::new(move |_| Ok(read.borrow().clone()));
    let setter: SetterFn = Rc::new(move |_, value| {
        *slot.borrow_mut() = value;
        Ok(())
    });
    host.define_accessor(surface, name, Some(getter), Some(setter));
}

fn build_dom() -> Rc<SurfaceRegistry> {
    let host = Rc::new(SurfaceRegistry::new());
    let catalog = SinkCatalog::standard();

    for sink in catalog.standalone_sinks() {
        let name = format!("{}.{}", sink.surface, sink.member);
        host.define_function(sink.surface, &sink.member, move |receiver, args| {
            println!("  {} on {} with {:?}", name, receiver, args);
            Ok(Value::Undefined)
        });
    }
    for name in ["setAttribute", "setAttributeNS"] {
        host.define_function(SurfaceKind::Element, name, |_, _| Ok(Value::Undefined));
    }
    for sink in catalog.property_sinks() {
        let owner = match (sink.surface, sink.member.as_str()) {
            (SurfaceKind::HtmlScriptElement, "textContent") => SurfaceKind::Node,
            (SurfaceKind::HtmlScriptElement, "innerText") => SurfaceKind::HtmlElement,
            (surface, _) => surface,
        };
        define_property(&host, owner, &sink.member);
    }
    host
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(true)
        .init();

    println!("=== Sink Enforcement Example ===\n");

    let host = build_dom();
    let factory = Rc::new(PolicyFactory::new());

    let escape = |input: &str| -> Result<String, RuleRejection> {
        Ok(input.replace('<', "&lt;").replace('>', "&gt;"))
    };
    let same_origin = |url: &str| -> Result<String, RuleRejection> {
        if url.starts_with('/') {
            Ok(url.to_string())
        } else {
            Err(RuleRejection::new("cross-origin script"))
        }
    };
    let default_rules = PolicyRules::new()
        .with_html(escape)
        .with_script_url(same_origin);

    let config = EnforcementConfig::new()
        .with_fallback_policy("default")
        .with_allowed_policy_names(["default"]);
    let mut enforcer = Enforcer::new(config, host.clone(), factory.clone());

    // Scenario 1: Install
    println!("--- Scenario 1: Install ---");
    match enforcer.install() {
        Ok(()) => println!("✓ Enforcement installed"),
        Err(e) => {
            println!("✗ Install failed: {}", e);
            return;
        }
    }
    if let Err(e) = factory.create_policy("default", default_rules) {
        println!("✗ Could not create default policy: {}", e);
        return;
    }
    match factory.create_policy("analytics", PolicyRules::new()) {
        Ok(_) => println!("✗ Unexpected: analytics policy created"),
        Err(e) => println!("✓ {}", e),
    }

    // Scenario 2: Plain markup is converted by the fallback policy
    println!("\n--- Scenario 2: Fallback Conversion ---");
    let div = host.create_object(SurfaceKind::HtmlDivElement);
    match host.set(&div, "innerHTML", Value::from("<b>bold</b>")) {
        Ok(()) => println!(
            "✓ innerHTML is now {:?}",
            host.get(&div, "innerHTML").unwrap_or_default()
        ),
        Err(e) => println!("✗ Unexpected: {}", e),
    }

    // Scenario 3: Hostile script URL is rejected
    println!("\n--- Scenario 3: Violation ---");
    let script = host.create_object(SurfaceKind::HtmlScriptElement);
    match host.set(&script, "src", Value::from("https://evil.example/x.js")) {
        Ok(()) => println!("✗ Unexpected: cross-origin script accepted"),
        Err(e) => println!("✓ Blocked: {}", e),
    }
    match host.call(&script, "setAttribute", vec![Value::from("SRC"), Value::from("/app.js")]) {
        Ok(_) => println!("✓ Same-origin script accepted through setAttribute"),
        Err(e) => println!("✗ Unexpected: {}", e),
    }

    // Scenario 4: Uninstall
    println!("\n--- Scenario 4: Uninstall ---");
    match enforcer.uninstall() {
        Ok(()) => println!("✓ Enforcement removed"),
        Err(e) => println!("✗ Uninstall failed: {}", e),
    }
    let doc = host.create_object(SurfaceKind::Document);
    if let Err(e) = host.call(&doc, "write", vec![Value::from("<p>raw</p>")]) {
        println!("✗ Unexpected: {}", e);
    }

    println!("\n=== Example Complete ===");
}
