//! Integration tests for relational joins, junction tables, eager loading and
//! lazy loading.

mod common;

use common::*;
use lifeguard_activequery::test_helpers::MockExecutor;
use lifeguard_activequery::{
    ActiveQuery, Filter, JoinKind, LifeError, LifeModelTrait, Params, QueryConfig, RelationType, Row,
};
use sea_query::PostgresQueryBuilder;

fn sql_of<E: LifeModelTrait>(query: &ActiveQuery<E>) -> String {
    query.prepare(PostgresQueryBuilder).unwrap().sql
}

// ============================================================================
// Relation definitions
// ============================================================================

#[test]
fn test_into_relation() {
    let def = Customer.relation("orders").unwrap();
    assert_eq!(def.name, "orders");
    assert_eq!(def.rel_type, RelationType::HasMany);
    assert_eq!(def.table(), "order");
    assert_eq!(def.primary_key, vec!["id".to_string()]);
    assert!(def.via.is_none());

    let nested = def.relation("items").unwrap();
    assert_eq!(nested.table(), "item");
    assert!(nested.via.is_some());

    let profile = Customer.relation("profile").unwrap();
    assert_eq!(profile.rel_type, RelationType::HasOne);
}

#[test]
fn test_unknown_relation() {
    let err = Customer.relation("missing").unwrap_err();
    assert!(matches!(err, LifeError::ConfigurationError(_)));

    let err = Customer::find()
        .join_with(["missing"])
        .prepare(PostgresQueryBuilder)
        .unwrap_err();
    assert!(matches!(err, LifeError::ConfigurationError(_)));
}

// ============================================================================
// join_with SQL
// ============================================================================

#[test]
fn test_join_with_has_one() {
    let query = Customer::find().join_with(["profile"]);
    assert_eq!(
        sql_of(&query),
        r#"SELECT "customer".* FROM "customer" LEFT JOIN "profile" ON "customer"."profile_id" = "profile"."id""#
    );
}

#[test]
fn test_inner_join_with_has_many() {
    let query = Customer::find().inner_join_with(["orders"]);
    assert_eq!(
        sql_of(&query),
        r#"SELECT "customer".* FROM "customer" INNER JOIN "order" ON "customer"."id" = "order"."customer_id""#
    );
}

#[test]
fn test_join_with_relation_alias() {
    let query = Customer::find().alias("c").join_with(["orders o"]);
    assert_eq!(
        sql_of(&query),
        r#"SELECT "c".* FROM "customer" AS "c" LEFT JOIN "order" AS "o" ON "c"."id" = "o"."customer_id""#
    );
}

#[test]
fn test_join_with_keeps_explicit_select() {
    let query = Customer::find().select(["customer.id"]).join_with(["profile"]);
    assert!(sql_of(&query).starts_with(r#"SELECT "customer"."id" FROM "customer" LEFT JOIN"#));
}

#[test]
fn test_join_with_via_table() {
    let query = Order::find().inner_join_with(["items"]);
    assert_eq!(
        sql_of(&query),
        concat!(
            r#"SELECT "order".* FROM "order""#,
            r#" INNER JOIN "order_item" ON "order"."id" = "order_item"."order_id""#,
            r#" INNER JOIN "item" ON "order_item"."item_id" = "item"."id""#,
        )
    );
}

#[test]
fn test_join_with_nested_path() {
    let query = Customer::find().join_with(["orders.items"]);
    assert_eq!(
        sql_of(&query),
        concat!(
            r#"SELECT "customer".* FROM "customer""#,
            r#" LEFT JOIN "order" ON "customer"."id" = "order"."customer_id""#,
            r#" LEFT JOIN "order_item" ON "order"."id" = "order_item"."order_id""#,
            r#" LEFT JOIN "item" ON "order_item"."item_id" = "item"."id""#,
        )
    );
}

#[test]
fn test_join_with_shared_prefix_is_joined_once() {
    let query = Customer::find()
        .join_with(["orders"])
        .join_with(["orders.items"]);
    let prepared = query.prepare(PostgresQueryBuilder).unwrap();
    assert_eq!(prepared.sql.matches(r#"JOIN "order" "#).count(), 1);
    assert_eq!(prepared.sql.matches(r#"JOIN "item" "#).count(), 1);
}

#[test]
fn test_relation_on_condition_goes_into_join() {
    let query = Customer::find()
        .join_with(["active_orders"])
        .filter(Filter::eq("customer.name", "user1"));
    let prepared = query.prepare(PostgresQueryBuilder).unwrap();
    assert_eq!(
        prepared.sql,
        concat!(
            r#"SELECT "customer".* FROM "customer""#,
            r#" LEFT JOIN "order" ON "customer"."id" = "order"."customer_id" AND "status" = $1"#,
            r#" WHERE "customer"."name" = $2"#,
        )
    );
}

#[test]
fn test_right_join_with_without_eager() {
    let query = Customer::find().join_with_options(["profile"], false, JoinKind::Right);
    assert!(sql_of(&query).contains(r#"RIGHT JOIN "profile""#));
}

// ============================================================================
// Eager loading
// ============================================================================

#[test]
fn test_with_has_many() {
    let executor = MockExecutor::new();
    executor.push_rows(vec![customer_row(1, "user1", None), customer_row(2, "user2", None)]);
    executor.push_rows(vec![order_row(10, 1), order_row(11, 1), order_row(12, 2)]);

    let customers = Customer::find().with(["orders"]).all(&executor).unwrap();
    assert_eq!(customers[0].orders.iter().map(|o| o.id).collect::<Vec<_>>(), vec![10, 11]);
    assert_eq!(customers[1].orders.iter().map(|o| o.id).collect::<Vec<_>>(), vec![12]);

    let sql = executor.captured_sql();
    assert_eq!(sql.len(), 2);
    assert_eq!(sql[1], r#"SELECT * FROM "order" WHERE "customer_id" IN ($1, $2)"#);
}

#[test]
fn test_with_has_one_skips_null_links() {
    let executor = MockExecutor::new();
    executor.push_rows(vec![customer_row(1, "user1", Some(7)), customer_row(2, "user2", None)]);
    executor.push_rows(vec![profile_row(7, "first")]);

    let customers = Customer::find().with(["profile"]).all(&executor).unwrap();
    assert_eq!(customers[0].profile.as_ref().map(|p| p.id), Some(7));
    assert_eq!(customers[1].profile, None);
    assert_eq!(
        executor.captured_sql()[1],
        r#"SELECT * FROM "profile" WHERE "id" IN ($1)"#
    );
}

#[test]
fn test_with_via_table() {
    let executor = MockExecutor::new();
    executor.push_rows(vec![order_row(10, 1), order_row(11, 1)]);
    executor.push_rows(vec![order_item_row(10, 100), order_item_row(10, 101), order_item_row(11, 100)]);
    executor.push_rows(vec![item_row(100, "pen"), item_row(101, "ink")]);

    let orders = Order::find().with(["items"]).all(&executor).unwrap();
    assert_eq!(orders[0].items.iter().map(|i| i.name.as_str()).collect::<Vec<_>>(), vec!["pen", "ink"]);
    assert_eq!(orders[1].items.iter().map(|i| i.id).collect::<Vec<_>>(), vec![100]);

    let sql = executor.captured_sql();
    assert_eq!(sql[1], r#"SELECT * FROM "order_item" WHERE "order_id" IN ($1, $2)"#);
    assert_eq!(sql[2], r#"SELECT * FROM "item" WHERE "id" IN ($1, $2)"#);
}

#[test]
fn test_with_nested_path() {
    let executor = MockExecutor::new();
    executor.push_rows(vec![customer_row(1, "user1", None), customer_row(2, "user2", None)]);
    executor.push_rows(vec![order_row(10, 1), order_row(11, 2), order_row(12, 2)]);
    executor.push_rows(vec![order_item_row(10, 100), order_item_row(12, 100), order_item_row(12, 101)]);
    executor.push_rows(vec![item_row(100, "pen"), item_row(101, "ink")]);

    let customers = Customer::find().with(["orders.items"]).all(&executor).unwrap();
    let items = |c: &CustomerModel| -> Vec<Vec<i32>> {
        c.orders.iter().map(|o| o.items.iter().map(|i| i.id).collect()).collect()
    };
    assert_eq!(items(&customers[0]), vec![vec![100]]);
    assert_eq!(items(&customers[1]), vec![vec![], vec![100, 101]]);

    let sql = executor.captured_sql();
    assert_eq!(sql.len(), 4);
    assert_eq!(sql[1], r#"SELECT * FROM "order" WHERE "customer_id" IN ($1, $2)"#);
    assert_eq!(sql[2], r#"SELECT * FROM "order_item" WHERE "order_id" IN ($1, $2, $3)"#);
    assert_eq!(sql[3], r#"SELECT * FROM "item" WHERE "id" IN ($1, $2)"#);
}

#[test]
fn test_with_nested_path_and_parent_share_one_query() {
    let executor = MockExecutor::new();
    executor.push_rows(vec![customer_row(1, "user1", None)]);
    executor.push_rows(vec![order_row(10, 1)]);
    executor.push_rows(vec![order_item_row(10, 100)]);
    executor.push_rows(vec![item_row(100, "pen")]);

    let customers = Customer::find()
        .with(["orders", "orders.items"])
        .all(&executor)
        .unwrap();
    assert_eq!(customers[0].orders[0].items[0].name, "pen");
    assert_eq!(executor.captured_sql().len(), 4);
}

#[test]
fn test_eager_join_with_nested_path() {
    let executor = MockExecutor::new();
    executor.push_rows(vec![customer_row(1, "user1", None)]);
    executor.push_rows(vec![order_row(10, 1)]);
    executor.push_rows(vec![order_item_row(10, 101)]);
    executor.push_rows(vec![item_row(101, "ink")]);

    let customers = Customer::find()
        .join_with(["orders.items i"])
        .all(&executor)
        .unwrap();
    assert_eq!(customers[0].orders[0].items[0].id, 101);
    assert!(executor.captured_sql()[0].contains(r#"LEFT JOIN "item" AS "i""#));
}

#[test]
fn test_eager_join_with_loads_relation_once() {
    let executor = MockExecutor::new();
    // Joined rows repeat the customer once per order
    executor.push_rows(vec![
        customer_row(1, "user1", None),
        customer_row(1, "user1", None),
        customer_row(2, "user2", None),
    ]);
    executor.push_rows(vec![order_row(10, 1), order_row(11, 1), order_row(12, 2)]);

    let customers = Customer::find()
        .join_with(["orders"])
        .with(["orders"])
        .all(&executor)
        .unwrap();
    assert_eq!(customers.len(), 2);
    assert_eq!(customers[0].orders.len(), 2);
    assert_eq!(executor.captured_sql().len(), 2);
}

#[test]
fn test_non_eager_join_with_does_not_load() {
    let executor = MockExecutor::new();
    executor.push_rows(vec![customer_row(1, "user1", None)]);

    let customers = Customer::find()
        .join_with_options(["orders"], false, JoinKind::Inner)
        .all(&executor)
        .unwrap();
    assert!(customers[0].orders.is_empty());
    assert_eq!(executor.captured_sql().len(), 1);
}

#[test]
fn test_eager_loading_batches_keys() {
    let config = QueryConfig { eager_batch_size: 1, ..QueryConfig::default() };
    let executor = MockExecutor::new();
    executor.push_rows(vec![customer_row(1, "user1", None), customer_row(2, "user2", None)]);
    executor.push_rows(vec![order_row(10, 1)]);
    executor.push_rows(vec![order_row(12, 2)]);

    let customers = ActiveQuery::<Customer>::with_config(config)
        .with(["orders"])
        .all(&executor)
        .unwrap();
    assert_eq!(customers[0].orders[0].id, 10);
    assert_eq!(customers[1].orders[0].id, 12);
    assert_eq!(executor.captured_param_counts(), vec![0, 1, 1]);
}

#[test]
fn test_eager_loading_on_condition_filters() {
    let executor = MockExecutor::new();
    executor.push_rows(vec![customer_row(1, "user1", None)]);

    Customer::find().with(["active_orders"]).all(&executor).unwrap();
    assert_eq!(
        executor.captured_sql()[1],
        r#"SELECT * FROM "order" WHERE "status" = $1 AND "customer_id" IN ($2)"#
    );
}

#[test]
fn test_eager_loading_skipped_for_empty_result() {
    let executor = MockExecutor::new();
    let customers = Customer::find().with(["orders"]).all(&executor).unwrap();
    assert!(customers.is_empty());
    assert_eq!(executor.captured_sql().len(), 1);
}

#[test]
fn test_eager_loading_unknown_relation() {
    let executor = MockExecutor::new();
    executor.push_rows(vec![customer_row(1, "user1", None)]);
    let err = Customer::find().with(["missing"]).all(&executor).unwrap_err();
    assert!(matches!(err, LifeError::ConfigurationError(_)));
}

// ============================================================================
// Lazy loading
// ============================================================================

#[test]
fn test_lazy_has_many() {
    let query = ActiveQuery::<Order>::has_many([("customer_id", "id")])
        .primary(customer_row(1, "user1", None));
    let prepared = query.prepare(PostgresQueryBuilder).unwrap();
    assert_eq!(prepared.sql, r#"SELECT * FROM "order" WHERE "customer_id" = $1"#);
    assert_eq!(prepared.values.0, vec![sea_query::Value::Int(Some(1))]);
}

#[test]
fn test_lazy_via_table() {
    let query = ActiveQuery::<Item>::has_many([("id", "item_id")])
        .via_table("order_item", [("order_id", "id")])
        .unwrap()
        .primary(order_row(10, 1));
    assert_eq!(
        sql_of(&query),
        r#"SELECT * FROM "item" WHERE "id" IN (SELECT "item_id" FROM "order_item" WHERE "order_id" = $1)"#
    );
}

#[test]
fn test_lazy_has_one_with_null_link_matches_nothing() {
    let query = ActiveQuery::<Profile>::has_one([("id", "profile_id")])
        .primary(customer_row(1, "user1", None));
    let prepared = query.prepare(PostgresQueryBuilder).unwrap();
    assert_eq!(prepared.sql, r#"SELECT * FROM "profile" WHERE 1 = 0"#);
    assert!(prepared.values.0.is_empty());
}

#[test]
fn test_lazy_via_table_with_null_link_matches_nothing() {
    let query = ActiveQuery::<Item>::has_many([("id", "item_id")])
        .via_table("order_item", [("order_id", "id")])
        .unwrap()
        .primary(Row::from_pairs([("id", sea_query::Value::Int(None))]));
    assert_eq!(sql_of(&query), r#"SELECT * FROM "item" WHERE 1 = 0"#);
}

#[test]
fn test_lazy_loading_needs_link_values() {
    let query = ActiveQuery::<Order>::has_many([("customer_id", "id")])
        .primary(Row::from_pairs([("name", "no id column")]));
    let err = query.prepare(PostgresQueryBuilder).unwrap_err();
    assert!(matches!(err, LifeError::ConfigurationError(_)));
}

#[test]
fn test_lazy_loading_without_link() {
    let query = Customer::find()
        .on_condition(Filter::eq("status", 1), Params::new())
        .primary(customer_row(1, "user1", None));
    let err = query.prepare(PostgresQueryBuilder).unwrap_err();
    assert!(matches!(err, LifeError::ConfigurationError(_)));
}
