use pretty_assertions::assert_eq;
use stowage::{Config, Dialect, Stowage};
use tests::{fixtures::*, setup};

#[tokio::test]
async fn table_name_prefix_applies_to_every_table() {
    let stowage = Stowage::builder().table_name_prefix("app_").build();
    let customers = customers(&stowage);

    let ddl: Vec<String> = CUSTOMER_DDL
        .iter()
        .map(|sql| sql.replacen("CREATE TABLE ", "CREATE TABLE app_", 1))
        .collect();
    let ddl: Vec<&str> = ddl.iter().map(String::as_str).collect();

    let (mut session, log) = setup(&stowage, &ddl).await;

    let mut alice = Customer {
        id: 1,
        name: "alice".to_string(),
        products: vec![3, 1],
    };
    session.save(&customers, &mut alice).await.unwrap();

    assert!(log.sql().iter().all(|sql| sql.contains(r#""app_customer"#)));

    session.clear_tracked();
    assert_eq!(session.get_by_id(&customers, 1_i64).await.unwrap().products, [1_i64, 3]);
}

#[test]
fn templates_render_for_the_configured_dialect() {
    let stowage = Stowage::builder()
        .config(Config {
            dialect: Dialect::Postgresql,
            table_name_prefix: None,
        })
        .build();
    let customers = customers(&stowage);
    let side = &customers.templates().sides[0];

    assert_eq!(
        side.select.render(stowage.dialect(), &[2]).unwrap(),
        r#"SELECT "customer_product"."customer_id", "customer_product"."product_id" FROM "customer_product" WHERE "customer_product"."customer_id" IN ($1, $2) ORDER BY "customer_product"."customer_id", "customer_product"."product_id""#
    );

    assert_eq!(
        customers.templates().tables[0]
            .update
            .render(Dialect::Sqlserver, &[])
            .unwrap(),
        "UPDATE [customer] SET [name] = ? WHERE [id] = ?"
    );
}
