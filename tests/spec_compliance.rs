// Behavioural scenarios
//
// End-to-end checks that run a search through scanning, parsing, evaluation,
// compilation and execution the way a service embedding the engine would.

mod support;

use std::sync::Arc;

use support::{Event, FakePool};
use tagql::ast::{Op, Term};
use tagql::exec::{Context, Db, DbError};
use tagql::value::Param;
use tagql::{Compiler, Config, Error, Field, FieldOptions, FieldType, Query, Schema, eval, parse};

fn literal(s: &str) -> Option<Term> {
    Some(Term::Literal(s.to_string()))
}

#[test]
fn scenario_single_leaf_group() {
    let tree = parse("and(id:test)").unwrap();
    let result = eval(&tree, |leaf| Ok(leaf.category_text() == "id")).unwrap();
    assert!(result);

    assert_eq!(tree.root.children.len(), 1);
    let and = &tree.root.children[0];
    assert_eq!(and.op, Op::And);
    assert_eq!(and.children[0].category, literal("id"));
    assert_eq!(and.children[0].value, literal("test"));
}

#[test]
fn scenario_negated_sibling() {
    let tree = parse("and(id:test1,not(id:test2))").unwrap();
    let result = eval(&tree, |leaf| {
        Ok(leaf.category_text() == "id" && leaf.value_text() == "test1")
    })
    .unwrap();
    assert!(result);

    let and = &tree.root.children[0];
    let not = &and.children[1];
    assert_eq!(not.op, Op::Not);
    assert_eq!(not.children.len(), 1);
    assert!(not.children[0].is_leaf());
    assert_eq!(not.children[0].value, literal("test2"));
}

#[test]
fn scenario_comparison_compiles_to_parameter() {
    let schema = Schema::new("account", vec![Field::new("score", FieldType::Int)]);
    let options = FieldOptions::new();
    let config = Config::default();
    let query = Query {
        search: "gt(score:10)".to_string(),
        ..Query::default()
    };
    let stmt = Compiler::new(&schema, &options, &config).select(&query).unwrap();
    assert!(stmt.sql.contains("WHERE score > $1"));
    assert_eq!(stmt.params, vec![Param::Int(10)]);
}

#[test]
fn scenario_base64_between_wildcards() {
    let tree = parse("and(tags:*b\"Lw==\"*)").unwrap();
    let leaf = &tree.root.children[0].children[0];
    assert_eq!(leaf.category, literal("tags"));
    assert_eq!(leaf.value, literal("*/*"));
}

#[test]
fn scenario_delete_without_parameters() {
    let schema = Schema::new("account", vec![Field::new("id", FieldType::String)]);
    let options = FieldOptions::new();
    let config = Config::default();
    let err = Compiler::new(&schema, &options, &config)
        .delete(&["id"], Vec::new())
        .unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));
}

#[test]
fn scenario_bind_fails_twice() {
    let pool = FakePool::new().fail(
        "SELECT set_config",
        DbError::Transport("connection reset by peer".to_string()),
        2,
    );
    let db = Db::new(Arc::new(pool.clone()), None, Config::default());
    let ctx = Context::new().with_tenant("acct-1");

    let stmt = tagql::Statement {
        sql: "DELETE FROM account WHERE id = $1".to_string(),
        params: vec![Param::Text("a".to_string())],
    };
    let err = db.exec(&ctx, &stmt).unwrap_err();

    assert!(matches!(err, Error::Transport(_)));
    assert_eq!(pool.count(|e| matches!(e, Event::Reconnect)), 1);
    assert!(pool.statements().iter().all(|sql| sql.starts_with("SELECT set_config")));
    assert_eq!(pool.count(|e| matches!(e, Event::Commit(_))), 0);
}

#[test]
fn scenario_bind_recovers_after_reconnect() {
    let pool = FakePool::new().fail(
        "SELECT set_config",
        DbError::Transport("connection reset by peer".to_string()),
        1,
    );
    let db = Db::new(Arc::new(pool.clone()), None, Config::default());
    let ctx = Context::new().with_tenant("acct-1");

    let stmt = tagql::Statement {
        sql: "DELETE FROM account WHERE id = $1".to_string(),
        params: vec![Param::Text("a".to_string())],
    };
    assert_eq!(db.exec(&ctx, &stmt).unwrap(), 1);
    assert_eq!(pool.events().last(), Some(&Event::Commit(2)));
}
