use eavpot::datatype::Value;
use eavpot::statement::Statement;
use eavpot::EavError;

#[test]
fn empty_by_default() {
    let statement = Statement::new();
    assert_eq!(statement.text(), "");
    assert!(statement.parameters().is_empty());
}

#[test]
fn text_is_appended_verbatim() {
    let mut statement = Statement::new();
    statement.add_text("SELECT ").add_text("1");
    assert_eq!(statement.text(), "SELECT 1");
    assert!(statement.parameters().is_empty());
}

#[test]
fn values_get_sequential_placeholders() {
    let mut statement = Statement::new();
    assert_eq!(statement.add_value("VALUE 1").unwrap(), ":param0");
    assert_eq!(statement.add_value("VALUE 2").unwrap(), ":param1");
    assert_eq!(statement.text(), ":param0:param1");
    assert_eq!(
        statement.parameters(),
        &[
            (":param0".to_string(), Value::from("VALUE 1")),
            (":param1".to_string(), Value::from("VALUE 2")),
        ]
    );
}

#[test]
fn equal_values_share_one_placeholder() {
    let mut statement = Statement::new();
    statement.add_value("VALUE").unwrap();
    statement.add_text(" = ");
    statement.add_value("VALUE").unwrap();
    assert_eq!(statement.text(), ":param0 = :param0");
    assert_eq!(statement.parameters().len(), 1);
}

#[test]
fn values_of_different_kinds_are_not_merged() {
    let mut statement = Statement::new();
    statement.add_value(1).unwrap();
    statement.add_value("1").unwrap();
    statement.add_value(true).unwrap();
    statement.add_value(1.0).unwrap();
    assert_eq!(statement.text(), ":param0:param1:param2:param3");
    assert_eq!(statement.parameters().len(), 4);
}

#[test]
fn null_is_bound_once() {
    let mut statement = Statement::new();
    statement.add_value(Value::Null).unwrap();
    statement.add_value(Value::Null).unwrap();
    assert_eq!(statement.parameters(), &[(":param0".to_string(), Value::Null)]);
}

#[test]
fn custom_generator_is_used() {
    let mut next = 10;
    let mut statement = Statement::with_generator(move || {
        let name = format!("@param{next}");
        next += 1;
        name
    });
    statement.add_value("VALUE 1").unwrap();
    statement.add_value("VALUE 2").unwrap();
    assert_eq!(statement.text(), "@param10@param11");
    assert_eq!(statement.parameters()[1].0, "@param11");
}

#[test]
fn empty_generated_name_fails() {
    let mut statement = Statement::with_generator(String::new);
    let err = statement.add_value("VALUE 1").unwrap_err();
    assert!(matches!(err, EavError::BuilderUsage(_)));
    assert_eq!(statement.text(), "");
    assert!(statement.parameters().is_empty());
}

#[test]
fn repeated_generated_name_fails() {
    let mut statement = Statement::with_generator(|| ":a".to_string());
    statement.add_value("VALUE 1").unwrap();
    let err = statement.add_value("VALUE 2").unwrap_err();
    assert!(matches!(err, EavError::BuilderUsage(_)));
    assert_eq!(statement.text(), ":a");
    assert_eq!(statement.parameters().len(), 1);
}

#[test]
fn generated_tokens_bind_in_sqlite() {
    use eavpot::executor::SqlExecutor;
    let mut next = 0;
    let mut statement = Statement::with_generator(move || {
        next += 1;
        format!("$v{next}")
    });
    statement.add_text("SELECT ");
    statement.add_value(2).unwrap();
    statement.add_text(" + ");
    statement.add_value(3).unwrap();
    let connection = rusqlite::Connection::open_in_memory().unwrap();
    let rows = SqlExecutor::query(&connection, statement.text(), statement.parameters()).unwrap();
    assert_eq!(rows, vec![vec![Value::Integer(5)]]);
}
