//! Shared helpers for integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Once};

use viewcomponent::{ComponentRegistry, Engine};

static TRACING: Once = Once::new();

/// Route `tracing` output through the test harness so `--nocapture` shows it.
pub fn init_tracing() {
    TRACING.call_once(|| {
        tracing_subscriber::fmt().with_test_writer().with_max_level(tracing::Level::DEBUG).init();
    });
}

/// Engine over a fresh registry, so tests never share registrations.
pub fn engine_with(register: impl FnOnce(&ComponentRegistry)) -> Engine {
    init_tracing();
    let registry = ComponentRegistry::new();
    register(&registry);
    Engine::new(Arc::new(registry))
}

/// Collapse whitespace and drop it around tags.
pub fn normalize_html(html: &str) -> String {
    let collapsed = html.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.replace("> ", ">").replace(" <", "<")
}

#[track_caller]
pub fn assert_html_eq(actual: &str, expected: &str) {
    assert_eq!(normalize_html(actual), normalize_html(expected));
}
