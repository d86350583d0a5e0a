use std::sync::Arc;

use super::*;
use crate::registry::ComponentRegistry;
use crate::template::Template;

fn engine() -> Engine {
    Engine::new(Arc::new(ComponentRegistry::new()))
}

fn render(source: &str, context: &mut Context) -> String {
    Template::compile(source).unwrap().render(&engine(), context).unwrap()
}

#[test]
fn variables_are_escaped_unless_safe() {
    let mut ctx = Context::new().with("raw", "<b>").with("markup", Value::safe("<i>"));
    assert_eq!(render("{{ raw }}{{ markup }}{{ raw|safe }}", &mut ctx), "&lt;b&gt;<i><b>");
}

#[test]
fn if_chooses_first_true_branch() {
    let source = "{% if a %}A{% elif b %}B{% else %}C{% endif %}";
    assert_eq!(render(source, &mut Context::new().with("a", true)), "A");
    assert_eq!(render(source, &mut Context::new().with("b", true)), "B");
    assert_eq!(render(source, &mut Context::new()), "C");
}

#[test]
fn for_exposes_loop_variable_and_forloop() {
    let items = Value::List(vec!["a".into(), "b".into(), "c".into()]);
    let mut ctx = Context::new().with("items", items);
    let out = render(
        "{% for x in items %}{{ forloop.counter }}{{ x }}{% if not forloop.last %},{% endif %}{% endfor %}",
        &mut ctx,
    );
    assert_eq!(out, "1a,2b,3c");
    assert!(!ctx.contains("x"));
    assert!(!ctx.contains("forloop"));
}

#[test]
fn for_renders_empty_branch() {
    let mut ctx = Context::new().with("items", Value::List(Vec::new()));
    assert_eq!(render("{% for x in items %}{{ x }}{% empty %}none{% endfor %}", &mut ctx), "none");
}

#[test]
fn with_binds_for_its_body_only() {
    let mut ctx = Context::new().with("name", "outer");
    let out = render("{% with name='inner' n=2 %}{{ name }}{{ n }}{% endwith %}{{ name }}", &mut ctx);
    assert_eq!(out, "inner2outer");
    assert_eq!(ctx.depth(), 1);
}

#[test]
fn malformed_for_is_rejected() {
    assert!(Template::compile("{% for x of items %}{% endfor %}").is_err());
    assert!(Template::compile("{% for x in %}{% endfor %}").is_err());
}

#[test]
fn with_requires_assignments() {
    assert!(Template::compile("{% with %}{% endwith %}").is_err());
    assert!(Template::compile("{% with a %}{% endwith %}").is_err());
}
