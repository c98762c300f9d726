use pretty_assertions::assert_eq;
use stowage::{Session, Stowage};
use tests::{fixtures::*, query_raw, setup, ExecLog};

/// Tables written by the logged statements starting with `keyword`, in order.
fn tables(log: &ExecLog, keyword: &str) -> Vec<String> {
    log.sql()
        .iter()
        .filter(|sql| sql.starts_with(keyword))
        .filter_map(|sql| sql.split('"').nth(1))
        .map(str::to_string)
        .collect()
}

async fn rows_of(session: &mut Session, table: &str) -> i64 {
    query_raw(session, &format!("SELECT COUNT(*) FROM {table}"), vec![]).await[0][0]
        .as_i64()
        .unwrap()
}

#[tokio::test]
async fn root_row_is_written_after_its_children() {
    let stowage = Stowage::builder().build();
    let orders = stowage
        .register(order_def().main_table_inserted_first(false))
        .unwrap();
    let (mut session, log) = setup(&stowage, ORDER_DDL).await;

    let mut order = order(1, "alice", vec![line(10, "a", &["n"])]);
    order.tags = vec!["gift".to_string()];
    session.save(&orders, &mut order).await.unwrap();

    assert_eq!(
        tables(&log, "INSERT"),
        ["order_line", "line_note", "order_tag", "orders"]
    );

    session.clear_tracked();
    assert_eq!(session.get_by_id(&orders, 1_i64).await.unwrap(), order);
}

#[tokio::test]
async fn root_row_is_deleted_before_its_children() {
    let stowage = Stowage::builder().build();
    let orders = stowage
        .register(order_def().main_table_inserted_first(false))
        .unwrap();
    let (mut session, log) = setup(&stowage, ORDER_DDL).await;

    let mut order = order(1, "alice", vec![line(10, "a", &["n", "m"])]);
    order.tags = vec!["gift".to_string()];
    session.save(&orders, &mut order).await.unwrap();

    log.clear();
    session.delete(&orders, &order).await.unwrap();

    assert_eq!(
        tables(&log, "DELETE"),
        ["orders", "line_note", "order_line", "order_tag"]
    );

    for table in ["orders", "order_line", "line_note", "order_tag"] {
        assert_eq!(rows_of(&mut session, table).await, 0, "{table}");
    }
}
