use pretty_assertions::assert_eq;
use stowage::{Session, Stowage, Value};
use tests::{fixtures::*, query_raw, setup};

async fn line_ids(session: &mut Session) -> Vec<i64> {
    query_raw(session, "SELECT id FROM order_line ORDER BY id", vec![])
        .await
        .into_iter()
        .map(|row| row[0].as_i64().unwrap())
        .collect()
}

async fn note_count(session: &mut Session) -> i64 {
    query_raw(session, "SELECT COUNT(*) FROM line_note", vec![]).await[0][0]
        .as_i64()
        .unwrap()
}

fn three_lines() -> Order {
    order(
        1,
        "alice",
        vec![
            line(1, "a", &["a1"]),
            line(2, "b", &["b1", "b2"]),
            line(3, "c", &["c1"]),
        ],
    )
}

#[tokio::test]
async fn removed_child_is_deleted_with_its_descendants() {
    let stowage = Stowage::builder().build();
    let orders = orders(&stowage);
    let (mut session, log) = setup(&stowage, ORDER_DDL).await;

    let mut order = three_lines();
    session.save(&orders, &mut order).await.unwrap();
    assert_eq!(note_count(&mut session).await, 4);

    order.lines.remove(1);
    log.clear();
    session.save(&orders, &mut order).await.unwrap();

    assert_eq!(line_ids(&mut session).await, [1_i64, 3]);
    assert_eq!(note_count(&mut session).await, 2);

    // Only the two stale tables are pruned; nothing else changed
    assert_eq!(log.statements("DELETE"), 2);
    assert_eq!(log.writes(), 2);
}

#[tokio::test]
async fn pruning_without_tracked_state() {
    let stowage = Stowage::builder().build();
    let orders = orders(&stowage);
    let (mut session, _log) = setup(&stowage, ORDER_DDL).await;

    let mut order = three_lines();
    session.save(&orders, &mut order).await.unwrap();

    session.clear_tracked();
    order.lines.remove(1);
    session.save(&orders, &mut order).await.unwrap();

    assert_eq!(line_ids(&mut session).await, [1_i64, 3]);
    assert_eq!(note_count(&mut session).await, 2);

    session.clear_tracked();
    let fetched = session.get_by_id(&orders, 1_i64).await.unwrap();
    assert_eq!(fetched.lines, order.lines);
}

#[tokio::test]
async fn shortened_keyless_list_drops_trailing_rows() {
    let stowage = Stowage::builder().build();
    let orders = orders(&stowage);
    let (mut session, _log) = setup(&stowage, ORDER_DDL).await;

    let mut order = order(1, "alice", vec![line(1, "a", &["first", "second", "third"])]);
    session.save(&orders, &mut order).await.unwrap();

    order.lines[0].notes.remove(0);
    session.save(&orders, &mut order).await.unwrap();

    let notes = query_raw(
        &mut session,
        "SELECT idx, body FROM line_note ORDER BY idx",
        vec![],
    )
    .await;

    assert_eq!(
        notes,
        [
            vec![Value::I64(0), Value::from("second")],
            vec![Value::I64(1), Value::from("third")],
        ]
    );
}

#[tokio::test]
async fn emptied_child_list_deletes_every_child() {
    let stowage = Stowage::builder().build();
    let orders = orders(&stowage);
    let (mut session, _log) = setup(&stowage, ORDER_DDL).await;

    let mut order = three_lines();
    session.save(&orders, &mut order).await.unwrap();

    order.lines.clear();
    session.save(&orders, &mut order).await.unwrap();

    assert!(line_ids(&mut session).await.is_empty());
    assert_eq!(note_count(&mut session).await, 0);
}

#[tokio::test]
async fn unchanged_aggregate_writes_nothing() {
    let stowage = Stowage::builder().build();
    let orders = orders(&stowage);
    let (mut session, log) = setup(&stowage, ORDER_DDL).await;

    let mut order = three_lines();
    order.tags = vec!["gift".to_string()];
    session.save(&orders, &mut order).await.unwrap();

    session.clear_tracked();
    let mut fetched = session.get_by_id(&orders, 1_i64).await.unwrap();

    log.clear();
    session.save(&orders, &mut fetched).await.unwrap();

    assert_eq!(log.writes(), 0);
    assert_eq!(fetched.version, order.version);
}
