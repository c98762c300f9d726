use pretty_assertions::assert_eq;
use stowage::Stowage;
use tests::{fixtures::*, setup};

#[tokio::test]
async fn save_then_fetch_returns_the_same_aggregate() {
    let stowage = Stowage::builder().build();
    let orders = orders(&stowage);
    let (mut session, _log) = setup(&stowage, ORDER_DDL).await;

    let mut saved = order(
        1,
        "alice",
        vec![line(10, "apple", &["ripe", "red"]), line(11, "pear", &[])],
    );
    saved.tags = vec!["gift".to_string(), "express".to_string()];

    session.save(&orders, &mut saved).await.unwrap();

    // Read back from the store rather than from tracked state
    session.clear_tracked();
    let fetched = session.get_by_id(&orders, 1_i64).await.unwrap();

    assert_eq!(fetched, saved);
}

#[tokio::test]
async fn fetch_by_ids_skips_missing_keys_and_keeps_key_order() {
    let stowage = Stowage::builder().build();
    let orders = orders(&stowage);
    let (mut session, _log) = setup(&stowage, ORDER_DDL).await;

    for (id, customer) in [(3, "carol"), (1, "alice"), (2, "bob")] {
        let mut order = order(id, customer, vec![line(id * 10, "sku", &["note"])]);
        session.save(&orders, &mut order).await.unwrap();
    }

    let fetched = session.fetch_by_ids(&orders, [3_i64, 99, 1, 3]).await.unwrap();
    let customers: Vec<_> = fetched.iter().map(|o| o.customer.as_str()).collect();

    assert_eq!(customers, ["alice", "carol"]);
    assert_eq!(fetched[1].lines, vec![line(30, "sku", &["note"])]);
}

#[tokio::test]
async fn missing_aggregate() {
    let stowage = Stowage::builder().build();
    let orders = orders(&stowage);
    let (mut session, log) = setup(&stowage, ORDER_DDL).await;

    assert!(session.fetch_by_id(&orders, 7_i64).await.unwrap().is_none());

    let err = session.get_by_id(&orders, 7_i64).await.unwrap_err();
    assert!(err.is_record_not_found());
    assert_eq!(err.to_string(), "record not found: table=orders key=(7)");

    assert_eq!(log.writes(), 0);
}

#[tokio::test]
async fn fetch_tracks_every_row() {
    let stowage = Stowage::builder().build();
    let orders = orders(&stowage);
    let (mut session, _log) = setup(&stowage, ORDER_DDL).await;

    let mut order = order(1, "alice", vec![line(10, "apple", &["a", "b"])]);
    order.tags = vec!["gift".to_string()];
    session.save(&orders, &mut order).await.unwrap();

    session.clear_tracked();
    assert_eq!(session.tracked_rows(), 0);

    session.get_by_id(&orders, 1_i64).await.unwrap();

    // Order, line, two notes and the tag side
    assert_eq!(session.tracked_rows(), 5);
}
