use pretty_assertions::assert_eq;
use stowage::{Session, Stowage};
use tests::{fixtures::*, query_raw, setup};

async fn count(session: &mut Session, table: &str) -> i64 {
    query_raw(session, &format!("SELECT COUNT(*) FROM {table}"), vec![]).await[0][0]
        .as_i64()
        .unwrap()
}

#[tokio::test]
async fn variants_are_read_from_their_joined_tables() {
    let stowage = Stowage::builder().build();
    let shapes = shapes(&stowage);
    let (mut session, _log) = setup(&stowage, SHAPE_DDL).await;

    let mut circle = Shape::Circle { id: 1, radius: 2.5 };
    let mut rectangle = Shape::Rectangle {
        id: 2,
        width: 3.0,
        height: 4.0,
    };

    session.save(&shapes, &mut circle).await.unwrap();
    session.save(&shapes, &mut rectangle).await.unwrap();

    assert_eq!(count(&mut session, "shape").await, 2);
    assert_eq!(count(&mut session, "circle").await, 1);
    assert_eq!(count(&mut session, "rectangle").await, 1);

    session.clear_tracked();
    let fetched = session.fetch_by_ids(&shapes, [2_i64, 1]).await.unwrap();

    assert_eq!(fetched, [circle, rectangle]);
}

#[tokio::test]
async fn changing_variant_moves_the_joined_row() {
    let stowage = Stowage::builder().build();
    let shapes = shapes(&stowage);
    let (mut session, _log) = setup(&stowage, SHAPE_DDL).await;

    let mut shape = Shape::Circle { id: 1, radius: 2.5 };
    session.save(&shapes, &mut shape).await.unwrap();

    shape = Shape::Rectangle {
        id: 1,
        width: 1.0,
        height: 2.0,
    };
    session.save(&shapes, &mut shape).await.unwrap();

    assert_eq!(count(&mut session, "circle").await, 0);
    assert_eq!(count(&mut session, "rectangle").await, 1);

    session.clear_tracked();
    assert_eq!(session.get_by_id(&shapes, 1_i64).await.unwrap(), shape);
}

#[tokio::test]
async fn row_without_a_joined_table_matches_no_variant() {
    let stowage = Stowage::builder().build();
    let shapes = shapes(&stowage);
    let (mut session, _log) = setup(&stowage, SHAPE_DDL).await;

    tests::exec_raw(&mut session, "INSERT INTO shape (id) VALUES (9)", vec![]).await;

    let err = session.get_by_id(&shapes, 9_i64).await.unwrap_err();
    assert!(err.is_unknown_variant());
}
