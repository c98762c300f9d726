use pretty_assertions::assert_eq;
use stowage::Stowage;
use tests::{fixtures::*, setup};

#[tokio::test]
async fn new_rows_are_updated_then_inserted() {
    let stowage = Stowage::builder().build();
    let orders = orders(&stowage);
    let (mut session, log) = setup(&stowage, ORDER_DDL).await;

    let mut order = order(1, "alice", vec![line(10, "a", &["x"]), line(11, "b", &["y"])]);
    session.save(&orders, &mut order).await.unwrap();

    // One order, two lines and two notes
    assert_eq!(log.statements("UPDATE"), 5);
    assert_eq!(log.affected("UPDATE"), 0);
    assert_eq!(log.statements("INSERT"), 5);
    assert_eq!(log.affected("INSERT"), 5);

    // A new root keeps its initial version
    assert_eq!(order.version, 0);
}

#[tokio::test]
async fn existing_rows_are_only_updated() {
    let stowage = Stowage::builder().build();
    let orders = orders(&stowage);
    let (mut session, log) = setup(&stowage, ORDER_DDL).await;

    let mut order = order(1, "alice", vec![line(10, "a", &["x"]), line(11, "b", &["y"])]);
    session.save(&orders, &mut order).await.unwrap();

    session.clear_tracked();
    log.clear();

    order.customer = "alicia".to_string();
    session.save(&orders, &mut order).await.unwrap();

    assert_eq!(log.statements("UPDATE"), 5);
    assert_eq!(log.affected("UPDATE"), 5);
    assert_eq!(log.statements("INSERT"), 0);
    assert_eq!(order.version, 1);
}

#[tokio::test]
async fn only_changed_rows_are_written() {
    let stowage = Stowage::builder().build();
    let orders = orders(&stowage);
    let (mut session, log) = setup(&stowage, ORDER_DDL).await;

    let mut order = order(1, "alice", vec![line(10, "a", &["x"]), line(11, "b", &["y"])]);
    session.save(&orders, &mut order).await.unwrap();
    log.clear();

    order.lines[1].sku = "bb".to_string();
    session.save(&orders, &mut order).await.unwrap();

    assert_eq!(
        log.sql(),
        [r#"UPDATE "order_line" SET "order_id" = ?, "sku" = ? WHERE "id" = ?"#]
    );
    assert_eq!(log.affected("UPDATE"), 1);

    // Child changes leave the root row and its version alone
    assert_eq!(order.version, 0);
}

#[tokio::test]
async fn side_values_are_replaced_per_owner() {
    let stowage = Stowage::builder().build();
    let orders = orders(&stowage);
    let (mut session, log) = setup(&stowage, ORDER_DDL).await;

    let mut order = order(1, "alice", vec![]);
    order.tags = vec!["b".to_string(), "a".to_string(), "b".to_string()];
    session.save(&orders, &mut order).await.unwrap();

    // Duplicates collapse; first occurrence wins the position
    assert_eq!(log.statements(r#"INSERT INTO "order_tag""#), 2);

    session.clear_tracked();
    let mut fetched = session.get_by_id(&orders, 1_i64).await.unwrap();
    assert_eq!(fetched.tags, ["b", "a"]);

    log.clear();
    fetched.tags.push("c".to_string());
    session.save(&orders, &mut fetched).await.unwrap();

    assert_eq!(log.statements(r#"DELETE FROM "order_tag""#), 1);
    assert_eq!(log.affected(r#"DELETE FROM "order_tag""#), 2);
    assert_eq!(log.statements(r#"INSERT INTO "order_tag""#), 3);
}
