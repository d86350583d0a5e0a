use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::*;
use crate::component::Component;
use crate::fields::FieldSpec;
use crate::registry::ComponentRegistry;
use crate::template::Template;

#[derive(Serialize, Deserialize)]
struct Card {
    #[serde(default)]
    title: String,
}

impl Component for Card {
    fn template(&self) -> Option<&str> {
        Some("<div>{{ self.title }}{{ self.header.value }}{{ self.content }}</div>")
    }

    fn fields() -> Vec<FieldSpec> {
        vec![FieldSpec::renders_one("header")]
    }
}

fn engine() -> Engine {
    let registry = ComponentRegistry::new();
    registry.register_type::<Card>("card").unwrap();
    Engine::new(Arc::new(registry))
}

fn render(engine: &Engine, source: &str) -> Result<String, Error> {
    engine.render_str(source, &mut Context::new())
}

#[test]
fn component_tag_parses_alias_and_only() {
    let template = Template::compile(r#"{% component "card" title="x" only as c %}{% endcomponent %}"#).unwrap();
    let crate::template::Node::Component(node) = &template.nodes()[0] else {
        panic!("expected a component node");
    };
    assert_eq!(node.alias.as_deref(), Some("c"));
    assert!(node.isolated);
    assert_eq!(node.kwargs.len(), 1);
    assert!(node.args.is_empty());
}

#[test]
fn component_tag_requires_a_name() {
    let err = Template::compile("{% component %}{% endcomponent %}").unwrap_err();
    assert!(matches!(err, Error::Syntax { .. }));
}

#[test]
fn component_tag_requires_end_marker() {
    assert!(Template::compile(r#"{% component "card" %}"#).is_err());
}

#[test]
fn call_tag_requires_dotted_target() {
    assert!(Template::compile("{% call header %}{% endcall %}").is_err());
    assert!(Template::compile("{% call c. %}{% endcall %}").is_err());
    assert!(Template::compile("{% call c.header extra %}{% endcall %}").is_err());
}

#[test]
fn renders_component_with_body_and_fill() {
    let out = render(
        &engine(),
        r#"{% component "card" title="T" as c %}{% call c.header %}<h1>H</h1>{% endcall %}body{% endcomponent %}"#,
    )
    .unwrap();
    assert_eq!(out, "<div>T<h1>H</h1>body</div>");
}

#[test]
fn component_name_may_come_from_a_variable() {
    let engine = engine();
    let mut ctx = Context::new().with("which", "card");
    let out = engine.render_str("{% component which %}{% endcomponent %}", &mut ctx).unwrap();
    assert_eq!(out, "<div></div>");
}

#[test]
fn unknown_component_name_fails() {
    let err = render(&engine(), r#"{% component "nope" %}{% endcomponent %}"#).unwrap_err();
    assert!(matches!(err, Error::Registry(_)));
}

#[test]
fn call_outside_component_fails() {
    let err = render(&engine(), "{% call c.header %}x{% endcall %}").unwrap_err();
    assert!(matches!(err, Error::Binding(BindingError::AliasNotInScope(ref a)) if a == "c"));
}

#[test]
fn call_on_plain_value_fails() {
    let engine = engine();
    let mut ctx = Context::new().with("c", "text");
    let err = engine.render_str("{% call c.header %}x{% endcall %}", &mut ctx).unwrap_err();
    assert!(matches!(err, Error::Binding(BindingError::NotAComponent(_))));
}

#[test]
fn call_rejects_reserved_content_keyword() {
    let err = render(
        &engine(),
        r#"{% component "card" as c %}{% call c.header content="x" %}{% endcall %}{% endcomponent %}"#,
    )
    .unwrap_err();
    assert!(matches!(err, Error::Binding(BindingError::ReservedKeyword(_))));
}

#[test]
fn alias_is_gone_after_the_component() {
    let out = render(&engine(), r#"{% component "card" as c %}{% endcomponent %}[{{ c }}]"#).unwrap();
    assert_eq!(out, "<div></div>[]");
}
