use pretty_assertions::assert_eq;
use stowage::Stowage;
use tests::{fixtures::*, setup};

fn comment(body: &str) -> Comment {
    Comment {
        id: 0,
        body: body.to_string(),
    }
}

#[tokio::test]
async fn generated_keys_are_written_back() {
    let stowage = Stowage::builder().build();
    let tickets = tickets(&stowage);
    let (mut session, log) = setup(&stowage, TICKET_DDL).await;

    let mut ticket = Ticket {
        id: 0,
        title: "printer on fire".to_string(),
        comments: vec![comment("again?"), comment("extinguished")],
    };

    session.save(&tickets, &mut ticket).await.unwrap();

    assert_eq!(ticket.id, 1);
    assert_eq!(
        ticket.comments.iter().map(|c| c.id).collect::<Vec<_>>(),
        [1_i64, 2]
    );

    // Unassigned keys go straight to insert
    assert_eq!(log.statements("UPDATE"), 0);
    assert_eq!(log.statements("INSERT"), 3);

    session.clear_tracked();
    assert_eq!(session.get_by_id(&tickets, 1_i64).await.unwrap(), ticket);
}

#[tokio::test]
async fn children_reference_the_generated_root_key() {
    let stowage = Stowage::builder().build();
    let tickets = tickets(&stowage);
    let (mut session, log) = setup(&stowage, TICKET_DDL).await;

    let mut first = Ticket {
        title: "first".to_string(),
        ..Ticket::default()
    };
    let mut second = Ticket {
        title: "second".to_string(),
        comments: vec![comment("hello")],
        ..Ticket::default()
    };

    session.save(&tickets, &mut first).await.unwrap();
    session.save(&tickets, &mut second).await.unwrap();
    assert_eq!((first.id, second.id), (1, 2));

    second.comments.push(comment("still there?"));
    log.clear();
    session.save(&tickets, &mut second).await.unwrap();

    // Only the new comment is written
    assert_eq!(log.writes(), 1);
    assert_eq!(second.comments[1].id, 2);

    session.clear_tracked();
    let fetched = session.fetch_by_ids(&tickets, [1_i64, 2]).await.unwrap();
    assert_eq!(fetched, [first, second]);
}
