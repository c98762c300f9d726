use pretty_assertions::assert_eq;
use stowage::{Stowage, Value};
use tests::{exec_raw, fixtures::*, query_raw, setup};

fn rex() -> Pet {
    Pet::Dog {
        id: 1,
        name: "rex".to_string(),
        breed: "collie".to_string(),
    }
}

#[tokio::test]
async fn tag_column_selects_the_variant() {
    let stowage = Stowage::builder().build();
    let pets = pets(&stowage);
    let (mut session, _log) = setup(&stowage, PET_DDL).await;

    let mut tom = Pet::Cat {
        id: 2,
        name: "tom".to_string(),
        lives: 9,
    };
    session.save(&pets, &mut rex()).await.unwrap();
    session.save(&pets, &mut tom).await.unwrap();

    let stored = query_raw(
        &mut session,
        "SELECT kind, breed, lives FROM pet ORDER BY id",
        vec![],
    )
    .await;
    assert_eq!(
        stored,
        [
            vec![Value::from("dog"), Value::from("collie"), Value::Null],
            vec![Value::from("cat"), Value::Null, Value::I64(9)],
        ]
    );

    session.clear_tracked();
    let fetched = session.fetch_by_ids(&pets, [1_i64, 2]).await.unwrap();
    assert_eq!(fetched, [rex(), tom]);
}

#[tokio::test]
async fn changing_variant_rewrites_the_tag() {
    let stowage = Stowage::builder().build();
    let pets = pets(&stowage);
    let (mut session, _log) = setup(&stowage, PET_DDL).await;

    session.save(&pets, &mut rex()).await.unwrap();

    let mut cat = Pet::Cat {
        id: 1,
        name: "rex".to_string(),
        lives: 7,
    };
    session.save(&pets, &mut cat).await.unwrap();

    let stored = query_raw(&mut session, "SELECT kind, breed, lives FROM pet", vec![]).await;
    assert_eq!(stored, [vec![Value::from("cat"), Value::Null, Value::I64(7)]]);

    session.clear_tracked();
    assert_eq!(session.get_by_id(&pets, 1_i64).await.unwrap(), cat);
}

#[tokio::test]
async fn unknown_tag_is_an_error() {
    let stowage = Stowage::builder().build();
    let pets = pets(&stowage);
    let (mut session, _log) = setup(&stowage, PET_DDL).await;

    exec_raw(
        &mut session,
        "INSERT INTO pet (id, kind, name) VALUES (3, 'parrot', 'polly')",
        vec![],
    )
    .await;

    let err = session.get_by_id(&pets, 3_i64).await.unwrap_err();
    assert!(err.is_unknown_variant(), "{err}");
}
