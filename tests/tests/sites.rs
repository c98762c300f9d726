use pretty_assertions::assert_eq;
use stowage::{Session, Stowage, Value};
use tests::{fixtures::*, query_raw, setup};

fn site(manager: Option<Manager>) -> Site {
    Site {
        id: 1,
        name: "harbour".to_string(),
        budget: Money { cents: 125_000 },
        position: Point {
            lat: 52.5,
            lng: 13.25,
        },
        manager,
    }
}

async fn managers(session: &mut Session) -> i64 {
    query_raw(session, "SELECT COUNT(*) FROM site_manager", vec![]).await[0][0]
        .as_i64()
        .unwrap()
}

#[tokio::test]
async fn absent_manager_loads_as_none() {
    let stowage = Stowage::builder().build();
    let sites = sites(&stowage);
    let (mut session, _log) = setup(&stowage, SITE_DDL).await;

    session.save(&sites, &mut site(None)).await.unwrap();
    assert_eq!(managers(&mut session).await, 0);

    session.clear_tracked();
    let fetched = session.get_by_id(&sites, 1_i64).await.unwrap();
    assert_eq!(fetched.manager, None);
}

#[tokio::test]
async fn manager_with_null_columns_is_present() {
    let stowage = Stowage::builder().build();
    let sites = sites(&stowage);
    let (mut session, _log) = setup(&stowage, SITE_DDL).await;

    let manager = Manager {
        name: String::new(),
        phone: None,
    };
    let mut saved = site(Some(manager.clone()));
    session.save(&sites, &mut saved).await.unwrap();

    session.clear_tracked();
    let fetched = session.get_by_id(&sites, 1_i64).await.unwrap();
    assert_eq!(fetched.manager, Some(manager));
    assert_eq!(fetched, saved);
}

#[tokio::test]
async fn clearing_the_manager_deletes_its_row() {
    let stowage = Stowage::builder().build();
    let sites = sites(&stowage);
    let (mut session, log) = setup(&stowage, SITE_DDL).await;

    let mut saved = site(Some(Manager {
        name: "ines".to_string(),
        phone: Some("555-0100".to_string()),
    }));
    session.save(&sites, &mut saved).await.unwrap();
    assert_eq!(managers(&mut session).await, 1);

    saved.manager = None;
    log.clear();
    session.save(&sites, &mut saved).await.unwrap();

    assert_eq!(log.statements(r#"DELETE FROM "site_manager""#), 1);
    assert_eq!(log.writes(), 1);
    assert_eq!(managers(&mut session).await, 0);
}

#[tokio::test]
async fn custom_mappers_round_trip() {
    let stowage = Stowage::builder().build();
    let sites = sites(&stowage);
    let (mut session, log) = setup(&stowage, SITE_DDL).await;

    let mut saved = site(None);
    session.save(&sites, &mut saved).await.unwrap();

    let stored = query_raw(&mut session, "SELECT budget_cents, lat, lng FROM site", vec![]).await;
    assert_eq!(
        stored,
        [vec![Value::I64(125_000), Value::F64(52.5), Value::F64(13.25)]]
    );

    session.clear_tracked();
    let mut fetched = session.get_by_id(&sites, 1_i64).await.unwrap();
    assert_eq!(fetched, saved);

    // Freshly loaded custom columns compare equal to what they map to
    log.clear();
    session.save(&sites, &mut fetched).await.unwrap();
    assert_eq!(log.writes(), 0);

    fetched.position.lng = -0.5;
    session.save(&sites, &mut fetched).await.unwrap();
    assert_eq!(
        log.sql(),
        [r#"UPDATE "site" SET "name" = ?, "budget_cents" = ?, "lat" = ?, "lng" = ? WHERE "id" = ?"#]
    );
}
