use pretty_assertions::assert_eq;
use stowage::{Session, Stowage};
use tests::{fixtures::*, query_raw, setup};

async fn rows_of(session: &mut Session, table: &str) -> i64 {
    query_raw(session, &format!("SELECT COUNT(*) FROM {table}"), vec![]).await[0][0]
        .as_i64()
        .unwrap()
}

async fn seed(session: &mut Session, orders: &stowage::Aggregate<Order>) -> (Order, Order) {
    let mut first = order(1, "alice", vec![line(10, "a", &["x", "y"]), line(11, "b", &["z"])]);
    first.tags = vec!["gift".to_string()];

    let mut second = order(2, "bob", vec![line(20, "c", &["w"])]);
    second.tags = vec!["rush".to_string()];

    session.save(orders, &mut first).await.unwrap();
    session.save(orders, &mut second).await.unwrap();

    (first, second)
}

#[tokio::test]
async fn delete_removes_every_level() {
    let stowage = Stowage::builder().build();
    let orders = orders(&stowage);
    let (mut session, _log) = setup(&stowage, ORDER_DDL).await;

    let (first, second) = seed(&mut session, &orders).await;

    session.delete(&orders, &first).await.unwrap();

    assert_eq!(rows_of(&mut session, "orders").await, 1);
    assert_eq!(rows_of(&mut session, "order_line").await, 1);
    assert_eq!(rows_of(&mut session, "line_note").await, 1);
    assert_eq!(rows_of(&mut session, "order_tag").await, 1);

    let err = session.get_by_id(&orders, 1_i64).await.unwrap_err();
    assert!(err.is_record_not_found());

    assert_eq!(session.get_by_id(&orders, 2_i64).await.unwrap(), second);
}

#[tokio::test]
async fn delete_by_ids_reports_removed_roots() {
    let stowage = Stowage::builder().build();
    let orders = orders(&stowage);
    let (mut session, _log) = setup(&stowage, ORDER_DDL).await;

    seed(&mut session, &orders).await;

    let removed = session.delete_by_ids(&orders, [2_i64, 99, 1]).await.unwrap();
    assert_eq!(removed, 2);

    for table in ["orders", "order_line", "line_note", "order_tag"] {
        assert_eq!(rows_of(&mut session, table).await, 0, "{table}");
    }

    // Deleted roots are forgotten along with their rows
    assert_eq!(session.tracked_rows(), 0);
}

#[tokio::test]
async fn deleting_a_missing_aggregate_is_not_an_error() {
    let stowage = Stowage::builder().build();
    let orders = orders(&stowage);
    let (mut session, _log) = setup(&stowage, ORDER_DDL).await;

    session.delete_by_id(&orders, 5_i64).await.unwrap();
    assert_eq!(session.delete_by_ids(&orders, [5_i64]).await.unwrap(), 0);
}

#[tokio::test]
async fn children_go_before_the_root() {
    let stowage = Stowage::builder().build();
    let orders = orders(&stowage);
    let (mut session, log) = setup(&stowage, ORDER_DDL).await;

    seed(&mut session, &orders).await;
    log.clear();

    session.delete_by_id(&orders, 1_i64).await.unwrap();

    assert_eq!(
        log.sql(),
        [
            r#"DELETE FROM "line_note" WHERE "line_note"."line_id" IN (SELECT "order_line"."id" FROM "order_line" WHERE "order_line"."order_id" IN (?))"#,
            r#"DELETE FROM "order_line" WHERE "order_line"."order_id" IN (?)"#,
            r#"DELETE FROM "order_tag" WHERE "order_tag"."order_id" IN (?)"#,
            r#"DELETE FROM "orders" WHERE "orders"."id" IN (?)"#,
        ]
    );
}
