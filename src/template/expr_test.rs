use super::*;

fn bits(text: &str) -> Vec<String> {
    text.split_whitespace().map(ToOwned::to_owned).collect()
}

#[test]
fn parses_literals() {
    assert_eq!(Operand::parse("'sm'", 1).unwrap(), Operand::Literal(Literal::Str("sm".into())));
    assert_eq!(Operand::parse("\"a b\"", 1).unwrap(), Operand::Literal(Literal::Str("a b".into())));
    assert_eq!(Operand::parse("42", 1).unwrap(), Operand::Literal(Literal::Int(42)));
    assert_eq!(Operand::parse("-1.5", 1).unwrap(), Operand::Literal(Literal::Float(-1.5)));
    assert_eq!(Operand::parse("True", 1).unwrap(), Operand::Literal(Literal::Bool(true)));
    assert_eq!(Operand::parse("None", 1).unwrap(), Operand::Literal(Literal::None));
}

#[test]
fn parses_dotted_paths() {
    assert_eq!(
        Operand::parse("self.post.title", 1).unwrap(),
        Operand::Variable(vec!["self".into(), "post".into(), "title".into()])
    );
}

#[test]
fn rejects_malformed_operands() {
    assert!(Operand::parse("'open", 3).is_err());
    assert!(Operand::parse("a..b", 3).is_err());
    assert!(Operand::parse("a-b", 3).is_err());
}

#[test]
fn resolves_nested_paths_and_missing_names() {
    let post = Value::from_serialize(&serde_json::json!({"title": "Hi"})).unwrap();
    let ctx = Context::new().with("post", post);
    assert_eq!(Expr::parse("post.title", 1).unwrap().resolve(&ctx), Value::from("Hi"));
    assert_eq!(Expr::parse("post.missing", 1).unwrap().resolve(&ctx), Value::Null);
    assert_eq!(Expr::parse("nobody", 1).unwrap().resolve(&ctx), Value::Null);
}

#[test]
fn applies_filters_in_order() {
    let ctx = Context::new().with("html", "<b>").with("items", Value::List(vec![Value::Null; 3]));
    assert_eq!(Expr::parse("html|safe", 1).unwrap().resolve(&ctx), Value::safe("<b>"));
    assert_eq!(Expr::parse("missing|default:'n/a'", 1).unwrap().resolve(&ctx), Value::from("n/a"));
    assert_eq!(Expr::parse("items|length", 1).unwrap().resolve(&ctx), Value::Int(3));
}

#[test]
fn default_argument_may_contain_separators() {
    let ctx = Context::new();
    let expr = Expr::parse("x|default:'a|b:c'", 1).unwrap();
    assert_eq!(expr.resolve(&ctx), Value::from("a|b:c"));
}

#[test]
fn unknown_filter_is_rejected() {
    let err = Expr::parse("x|shout", 9).unwrap_err();
    assert!(matches!(err, Error::Syntax { line: 9, .. }));
}

#[test]
fn conditions_follow_precedence() {
    let ctx = Context::new().with("a", true).with("b", false).with("name", "x");
    assert!(Condition::parse(&bits("a or b and b"), 1).unwrap().eval(&ctx));
    assert!(!Condition::parse(&bits("not a"), 1).unwrap().eval(&ctx));
    assert!(Condition::parse(&bits("name == 'x'"), 1).unwrap().eval(&ctx));
    assert!(Condition::parse(&bits("name != 'y' and not b"), 1).unwrap().eval(&ctx));
}

#[test]
fn dangling_condition_is_rejected() {
    assert!(Condition::parse(&bits("a =="), 1).is_err());
    assert!(Condition::parse(&bits("a b"), 1).is_err());
    assert!(Condition::parse(&[], 1).is_err());
}
