use eavpot::construct::Entity;
use eavpot::datatype::Value;
use eavpot::EavError;
use serde_json::json;

fn entity() -> Entity {
    Entity::new().with_uid("UID").with_attribute("name", "Ada")
}

#[test]
fn no_uid_by_default() {
    assert_eq!(Entity::new().uid(), None);
    assert!(Entity::new().attributes().is_empty());
}

#[test]
fn with_uid_leaves_the_original_alone() {
    let original = entity();
    let changed = original.with_uid("UID2");
    assert_eq!(changed.uid(), Some("UID2"));
    assert_eq!(original.uid(), Some("UID"));
    let cleared = original.without_uid();
    assert_eq!(cleared.uid(), None);
    assert_eq!(original.uid(), Some("UID"));
    assert_eq!(cleared.attributes(), original.attributes());
}

#[test]
fn attributes_of_every_scalar_kind() {
    let e = Entity::new()
        .with_attribute("b", true)
        .with_attribute("i", 42)
        .with_attribute("f", 0.5)
        .with_attribute("s", "text")
        .with_attribute("n", Value::Null);
    assert_eq!(e.attribute("b"), Some(&Value::Boolean(true)));
    assert_eq!(e.attribute("i"), Some(&Value::Integer(42)));
    assert_eq!(e.attribute("f"), Some(&Value::Float(0.5)));
    assert_eq!(e.attribute("s"), Some(&Value::String("text".into())));
    assert_eq!(e.attribute("n"), Some(&Value::Null));
    // ordered by name
    let names: Vec<&str> = e.attributes().keys().map(String::as_str).collect();
    assert_eq!(names, ["b", "f", "i", "n", "s"]);
}

#[test]
fn with_and_without_attribute_copy() {
    let original = entity();
    let more = original.with_attribute("age", 36);
    let less = more.without_attribute("name");
    assert_eq!(original.attributes().len(), 1);
    assert_eq!(more.attributes().len(), 2);
    assert_eq!(less.attributes().len(), 1);
    assert_eq!(less.attribute("name"), None);
    assert_eq!(more.attribute("name"), Some(&Value::from("Ada")));
    // removing something absent changes nothing
    assert_eq!(original.without_attribute("missing"), original);
}

#[test]
fn default_when_attribute_is_missing() {
    let e = entity();
    assert_eq!(e.attribute_or("name", "nobody"), Value::from("Ada"));
    assert_eq!(e.attribute_or("age", 0), Value::Integer(0));
    assert_eq!(e.attribute_or("age", None::<i64>), Value::Null);
}

#[test]
fn untyped_scalars_are_accepted() {
    let e = entity()
        .try_with_attribute("age", json!(36))
        .and_then(|e| e.try_with_attribute("ratio", json!(0.25)))
        .and_then(|e| e.try_with_attribute("gone", json!(null)))
        .unwrap();
    assert_eq!(e.attribute("age"), Some(&Value::Integer(36)));
    assert_eq!(e.attribute("ratio"), Some(&Value::Float(0.25)));
    assert_eq!(e.attribute("gone"), Some(&Value::Null));
}

#[test]
fn composite_values_are_refused() {
    let original = entity();
    let err = original.try_with_attribute("list", json!([1, 2])).unwrap_err();
    assert!(matches!(err, EavError::Type(_)));
    let err = original.try_with_attribute("map", json!({"a": 1})).unwrap_err();
    assert!(matches!(err, EavError::Type(_)));
    assert_eq!(original.attributes().len(), 1);
}

#[test]
fn strict_identity() {
    assert!(Value::from(1).same_as(&Value::Integer(1)));
    assert!(!Value::from(1).same_as(&Value::from("1")));
    assert!(!Value::from(1).same_as(&Value::Float(1.0)));
    assert!(!Value::from(true).same_as(&Value::Integer(1)));
    assert!(!Value::Float(0.0).same_as(&Value::Float(-0.0)));
    assert!(Value::Float(f64::NAN).same_as(&Value::Float(f64::NAN)));
}
