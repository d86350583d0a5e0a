use serde::Deserialize;

use super::*;
use crate::error::ValidationError;
use crate::registry::ComponentRegistry;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Badge {
    label: String,
    #[serde(default)]
    count: i64,
}

impl Component for Badge {
    fn template(&self) -> Option<&str> {
        Some("<span>{{ self.label }}:{{ self.count }}</span>")
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Divider;

impl Component for Divider {
    fn template(&self) -> Option<&str> {
        Some("<hr>")
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Untemplated;

impl Component for Untemplated {}

#[derive(Debug, Serialize, Deserialize)]
struct Panel {
    title: String,
}

impl Component for Panel {
    fn template(&self) -> Option<&str> {
        Some("<section>{{ self.title }}|{{ self.header.value }}|{{ self.content }}</section>")
    }

    fn fields() -> Vec<FieldSpec> {
        vec![FieldSpec::renders_one("header").required()]
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Greeting {
    name: String,
}

impl Component for Greeting {
    fn template(&self) -> Option<&str> {
        Some("{{ greeting }}, {{ self.name }}")
    }

    fn get_context_data(&self, context: &mut Context) -> Result<(), Error> {
        context.set("greeting", "Hello");
        Ok(())
    }
}

fn engine() -> Engine {
    Engine::new(Arc::new(ComponentRegistry::new()))
}

#[test]
fn keyword_arguments_deserialize_into_the_struct() {
    let badge: Badge = Args::new().kwarg("label", "new").kwarg("count", 3).deserialize().unwrap();
    assert_eq!(badge, Badge { label: "new".into(), count: 3 });
}

#[test]
fn unit_structs_accept_no_arguments() {
    assert!(Args::new().deserialize::<Divider>().is_ok());
}

#[test]
fn positional_arguments_are_rejected_by_default() {
    let err = Badge::from_args(Args::new().arg("x")).unwrap_err();
    assert!(matches!(
        err,
        Error::Binding(BindingError::UnexpectedPositional { component: "Badge", count: 1 })
    ));
}

#[test]
fn mismatched_arguments_name_the_component() {
    let err = Args::new().kwarg("count", 1).deserialize::<Badge>().unwrap_err();
    assert!(matches!(err, Error::Arguments { component: "Badge", .. }));
}

#[test]
fn component_types_compare_by_type() {
    assert_eq!(ComponentType::of::<Badge>(), ComponentType::of::<Badge>());
    assert_ne!(ComponentType::of::<Badge>(), ComponentType::of::<Divider>());
    assert_eq!(ComponentType::of::<Panel>().name(), "Panel");
    assert!(ComponentType::of::<Panel>().is::<Panel>());
    assert_eq!(ComponentType::of::<Panel>().field_specs().len(), 1);
}

#[test]
fn attributes_come_from_serialized_fields() {
    let handle = ComponentHandle::new(Badge { label: "hot".into(), count: 2 });
    assert_eq!(handle.attribute("label"), Some(Value::from("hot")));
    assert_eq!(handle.attribute("count"), Some(Value::Int(2)));
    assert_eq!(handle.attribute("missing"), None);
    assert_eq!(handle.attribute("content"), Some(Value::safe("")));
}

#[test]
fn handles_share_one_instance() {
    let handle = ComponentHandle::new(Divider);
    let other = handle.clone();
    other.set_content("body");
    assert!(handle.same_instance(&other));
    assert_eq!(handle.content(), "body");
    assert!(!handle.same_instance(&ComponentHandle::new(Divider)));
}

#[test]
fn missing_template_is_a_configuration_error() {
    let handle = ComponentHandle::new(Untemplated);
    let err = handle.render(&engine(), &mut Context::new()).unwrap_err();
    assert!(matches!(err, Error::Configuration(ref msg) if msg.contains("Untemplated")));
}

#[test]
fn context_data_binds_self_and_author_values() {
    let engine = engine();
    let out = engine.render_instance(Greeting { name: "Ada".into() }, &mut Context::new()).unwrap();
    assert_eq!(out, "Hello, Ada");
}

#[test]
fn fields_must_be_created_before_use() {
    let handle = ComponentHandle::new(Panel { title: "t".into() });
    assert!(matches!(
        handle.check_slot_fields(),
        Err(Error::Binding(BindingError::FieldsNotInitialized("Panel")))
    ));
    assert!(handle.field("header").is_err());
}

#[test]
fn fields_without_declarations_need_no_setup() {
    assert!(ComponentHandle::new(Divider).check_slot_fields().is_ok());
}

#[test]
fn programmatic_fill_then_render() {
    let engine = engine();
    let handle = ComponentHandle::new(Panel { title: "Inbox".into() });
    handle.create_slot_fields().unwrap();

    let mut ctx = Context::new();
    handle.fill(&engine, &mut ctx, "header", Body::Markup("<h1>Hi</h1>".into()), Map::new()).unwrap();
    handle.set_content("body");
    handle.check_slot_fields().unwrap();

    let view = handle.field("header").unwrap();
    assert!(view.filled);

    handle.get_context_data(&mut ctx, Map::new()).unwrap();
    assert_eq!(handle.render(&engine, &mut ctx).unwrap(), "<section>Inbox|<h1>Hi</h1>|body</section>");
}

#[test]
fn unknown_fill_target_is_rejected() {
    let engine = engine();
    let handle = ComponentHandle::new(Panel { title: "x".into() });
    handle.create_slot_fields().unwrap();
    let err = handle.fill(&engine, &mut Context::new(), "footer", Body::Markup(String::new()), Map::new());
    assert!(matches!(err, Err(Error::Binding(BindingError::UnknownField { component: "Panel", .. }))));
}

#[test]
fn content_keyword_is_reserved() {
    let engine = engine();
    let handle = ComponentHandle::new(Panel { title: "x".into() });
    handle.create_slot_fields().unwrap();
    let kwargs = Map::from([("content".to_owned(), Value::from("x"))]);
    let err = handle.fill(&engine, &mut Context::new(), "header", Body::Markup(String::new()), kwargs);
    assert!(matches!(err, Err(Error::Binding(BindingError::ReservedKeyword(_)))));
}

#[test]
fn unfilled_required_field_fails_instance_render() {
    let err = engine().render_instance(Panel { title: "x".into() }, &mut Context::new()).unwrap_err();
    assert!(matches!(err, Error::Validation(ValidationError { component: "Panel", .. })));
}

#[test]
fn short_names_drop_the_module_path() {
    assert_eq!(short_type_name::<Badge>(), "Badge");
    assert_eq!(short_type_name::<Vec<u8>>(), "Vec<u8>");
}

#[test]
fn safe_keyword_arguments_stay_safe() {
    let args = Args::new().kwarg("label", Value::safe("<b>hot</b>")).kwarg("count", 3);
    let handle = ComponentType::of::<Badge>().instantiate(args).unwrap();
    assert!(matches!(handle.attribute("label"), Some(Value::Safe(ref s)) if s == "<b>hot</b>"));
    assert!(matches!(handle.attribute("count"), Some(Value::Int(3))));
}

#[derive(Debug, Serialize, Deserialize)]
struct Avatar;

impl Component for Avatar {
    fn template(&self) -> Option<&str> {
        Some("{{ self.avatar_image.filled }}")
    }

    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::renders_one("avatar_image"),
            FieldSpec::renders_one("avatar").variant("image", Binding::named("image")),
        ]
    }
}

#[test]
fn ambiguous_fields_fail_before_any_fill() {
    assert!(ComponentType::of::<Avatar>().check_fields().is_err());
    let err = engine().render_instance(Avatar, &mut Context::new()).unwrap_err();
    assert!(matches!(err, Error::Binding(BindingError::AmbiguousField { component: "Avatar", .. })));
}
