//! Aggregates shared by the integration tests, each with the DDL of its
//! tables.

use stowage::{
    stmt::Scalar, Aggregate, CustomMapper, Discriminator, EntityDef, Field, ScalarType,
    SideTableDef, Stowage, TableDef, Value,
};

/// Orders own lines, lines own keyless notes, and tags are flattened into a
/// side table.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Order {
    pub id: i64,
    pub customer: String,
    pub version: i64,
    pub lines: Vec<Line>,
    pub tags: Vec<String>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Line {
    pub id: i64,
    pub sku: String,
    pub notes: Vec<Note>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Note {
    pub body: String,
}

pub const ORDER_DDL: &[&str] = &[
    "CREATE TABLE orders (id INTEGER PRIMARY KEY, customer TEXT NOT NULL, version INTEGER NOT NULL)",
    "CREATE TABLE order_line (order_id INTEGER NOT NULL, id INTEGER PRIMARY KEY, sku TEXT NOT NULL)",
    "CREATE TABLE line_note (line_id INTEGER NOT NULL, idx INTEGER NOT NULL, body TEXT NOT NULL, \
     PRIMARY KEY (line_id, idx))",
    "CREATE TABLE order_tag (order_id INTEGER NOT NULL, tag TEXT NOT NULL, position INTEGER NOT NULL)",
];

pub fn orders(stowage: &Stowage) -> Aggregate<Order> {
    stowage.register(order_def()).unwrap()
}

pub fn order_def() -> EntityDef<Order> {
    let note = EntityDef::new(TableDef::new("line_note").parent_key(["line_id"]).list_index("idx"))
        .field(Field::primitive("body", "body", |n: &Note| &n.body, |n: &mut Note| &mut n.body));

    let line = EntityDef::new(TableDef::new("order_line").parent_key(["order_id"]))
        .field(Field::primitive("id", "id", |l: &Line| &l.id, |l: &mut Line| &mut l.id))
        .field(Field::primitive("sku", "sku", |l: &Line| &l.sku, |l: &mut Line| &mut l.sku))
        .field(Field::entity_list("notes", note, |l: &Line| &l.notes, |l: &mut Line| &mut l.notes))
        .primary_key(["id"]);

    EntityDef::new(TableDef::new("orders"))
        .field(Field::primitive("id", "id", |o: &Order| &o.id, |o: &mut Order| &mut o.id))
        .field(Field::primitive(
            "customer",
            "customer",
            |o: &Order| &o.customer,
            |o: &mut Order| &mut o.customer,
        ))
        .field(Field::primitive(
            "version",
            "version",
            |o: &Order| &o.version,
            |o: &mut Order| &mut o.version,
        ))
        .field(Field::entity_list(
            "lines",
            line,
            |o: &Order| &o.lines,
            |o: &mut Order| &mut o.lines,
        ))
        .field(Field::flattened(
            "tags",
            SideTableDef::new("order_tag", "order_id", "tag").order_column("position"),
            |o: &Order| &o.tags,
            |o: &mut Order| &mut o.tags,
        ))
        .primary_key(["id"])
        .version("version")
}

pub fn line(id: i64, sku: &str, notes: &[&str]) -> Line {
    Line {
        id,
        sku: sku.to_string(),
        notes: notes
            .iter()
            .map(|body| Note {
                body: body.to_string(),
            })
            .collect(),
    }
}

pub fn order(id: i64, customer: &str, lines: Vec<Line>) -> Order {
    Order {
        id,
        customer: customer.to_string(),
        lines,
        ..Order::default()
    }
}

/// A shape whose variant is told apart by which joined table has a row.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Circle { id: i64, radius: f64 },
    Rectangle { id: i64, width: f64, height: f64 },
}

pub const SHAPE_DDL: &[&str] = &[
    "CREATE TABLE shape (id INTEGER PRIMARY KEY)",
    "CREATE TABLE circle (radius REAL NOT NULL, id INTEGER PRIMARY KEY)",
    "CREATE TABLE rectangle (width REAL NOT NULL, height REAL NOT NULL, id INTEGER PRIMARY KEY)",
];

pub fn shapes(stowage: &Stowage) -> Aggregate<Shape> {
    let discriminator = Discriminator::by_joined_table(|shape: &Shape| match shape {
        Shape::Circle { .. } => "circle",
        Shape::Rectangle { .. } => "rectangle",
    })
    .variant("circle", || Shape::Circle { id: 0, radius: 0.0 })
    .variant("rectangle", || Shape::Rectangle {
        id: 0,
        width: 0.0,
        height: 0.0,
    });

    let def = EntityDef::polymorphic(TableDef::new("shape"), discriminator)
        .joined(TableDef::new("circle").variant("circle"))
        .joined(TableDef::new("rectangle").variant("rectangle"))
        .field(Field::primitive(
            "id",
            "id",
            |s: &Shape| match s {
                Shape::Circle { id, .. } | Shape::Rectangle { id, .. } => id,
            },
            |s: &mut Shape| match s {
                Shape::Circle { id, .. } | Shape::Rectangle { id, .. } => id,
            },
        ))
        .field(
            Field::variant_primitive(
                "radius",
                "radius",
                |s: &Shape| match s {
                    Shape::Circle { radius, .. } => Some(radius),
                    _ => None,
                },
                |s: &mut Shape| match s {
                    Shape::Circle { radius, .. } => Some(radius),
                    _ => None,
                },
            )
            .in_table("circle")
            .variant("circle"),
        )
        .field(
            Field::variant_primitive(
                "width",
                "width",
                |s: &Shape| match s {
                    Shape::Rectangle { width, .. } => Some(width),
                    _ => None,
                },
                |s: &mut Shape| match s {
                    Shape::Rectangle { width, .. } => Some(width),
                    _ => None,
                },
            )
            .in_table("rectangle")
            .variant("rectangle"),
        )
        .field(
            Field::variant_primitive(
                "height",
                "height",
                |s: &Shape| match s {
                    Shape::Rectangle { height, .. } => Some(height),
                    _ => None,
                },
                |s: &mut Shape| match s {
                    Shape::Rectangle { height, .. } => Some(height),
                    _ => None,
                },
            )
            .in_table("rectangle")
            .variant("rectangle"),
        )
        .primary_key(["id"]);

    stowage.register(def).unwrap()
}

/// A customer referencing products of another aggregate by key.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub products: Vec<i64>,
}

pub const CUSTOMER_DDL: &[&str] = &[
    "CREATE TABLE customer (id INTEGER PRIMARY KEY, name TEXT NOT NULL)",
    "CREATE TABLE customer_product (customer_id INTEGER NOT NULL, product_id INTEGER NOT NULL)",
];

pub fn customers(stowage: &Stowage) -> Aggregate<Customer> {
    let def = EntityDef::new(TableDef::new("customer"))
        .field(Field::primitive("id", "id", |c: &Customer| &c.id, |c: &mut Customer| &mut c.id))
        .field(Field::primitive(
            "name",
            "name",
            |c: &Customer| &c.name,
            |c: &mut Customer| &mut c.name,
        ))
        .field(Field::foreign_key_list(
            "products",
            SideTableDef::new("customer_product", "customer_id", "product_id"),
            |c: &Customer| &c.products,
            |c: &mut Customer| &mut c.products,
        ))
        .primary_key(["id"]);

    stowage.register(def).unwrap()
}

/// Tickets and their comments both take store-generated keys.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Ticket {
    pub id: i64,
    pub title: String,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Comment {
    pub id: i64,
    pub body: String,
}

pub const TICKET_DDL: &[&str] = &[
    "CREATE TABLE ticket (id INTEGER PRIMARY KEY AUTOINCREMENT, title TEXT NOT NULL)",
    "CREATE TABLE ticket_comment (ticket_id INTEGER NOT NULL, \
     id INTEGER PRIMARY KEY AUTOINCREMENT, body TEXT NOT NULL)",
];

pub fn tickets(stowage: &Stowage) -> Aggregate<Ticket> {
    let comment = EntityDef::new(
        TableDef::new("ticket_comment")
            .parent_key(["ticket_id"])
            .auto_increment("id"),
    )
    .field(Field::primitive("id", "id", |c: &Comment| &c.id, |c: &mut Comment| &mut c.id))
    .field(Field::primitive("body", "body", |c: &Comment| &c.body, |c: &mut Comment| &mut c.body))
    .primary_key(["id"]);

    let ticket = EntityDef::new(TableDef::new("ticket").auto_increment("id"))
        .field(Field::primitive("id", "id", |t: &Ticket| &t.id, |t: &mut Ticket| &mut t.id))
        .field(Field::primitive(
            "title",
            "title",
            |t: &Ticket| &t.title,
            |t: &mut Ticket| &mut t.title,
        ))
        .field(Field::entity_list(
            "comments",
            comment,
            |t: &Ticket| &t.comments,
            |t: &mut Ticket| &mut t.comments,
        ))
        .primary_key(["id"]);

    stowage.register(ticket).unwrap()
}

/// Pets are told apart by the tag stored in their `kind` column.
#[derive(Debug, Clone, PartialEq)]
pub enum Pet {
    Dog { id: i64, name: String, breed: String },
    Cat { id: i64, name: String, lives: i64 },
}

pub const PET_DDL: &[&str] = &[
    "CREATE TABLE pet (id INTEGER PRIMARY KEY, kind TEXT NOT NULL, name TEXT NOT NULL, \
     breed TEXT, lives INTEGER)",
];

pub fn pets(stowage: &Stowage) -> Aggregate<Pet> {
    let discriminator = Discriminator::by_column("kind", |pet: &Pet| match pet {
        Pet::Dog { .. } => "dog",
        Pet::Cat { .. } => "cat",
    })
    .variant("dog", || Pet::Dog {
        id: 0,
        name: String::new(),
        breed: String::new(),
    })
    .variant("cat", || Pet::Cat {
        id: 0,
        name: String::new(),
        lives: 0,
    });

    let def = EntityDef::polymorphic(TableDef::new("pet"), discriminator)
        .field(Field::primitive(
            "id",
            "id",
            |p: &Pet| match p {
                Pet::Dog { id, .. } | Pet::Cat { id, .. } => id,
            },
            |p: &mut Pet| match p {
                Pet::Dog { id, .. } | Pet::Cat { id, .. } => id,
            },
        ))
        .field(Field::primitive(
            "name",
            "name",
            |p: &Pet| match p {
                Pet::Dog { name, .. } | Pet::Cat { name, .. } => name,
            },
            |p: &mut Pet| match p {
                Pet::Dog { name, .. } | Pet::Cat { name, .. } => name,
            },
        ))
        .field(
            Field::variant_primitive(
                "breed",
                "breed",
                |p: &Pet| match p {
                    Pet::Dog { breed, .. } => Some(breed),
                    _ => None,
                },
                |p: &mut Pet| match p {
                    Pet::Dog { breed, .. } => Some(breed),
                    _ => None,
                },
            )
            .variant("dog"),
        )
        .field(
            Field::variant_primitive(
                "lives",
                "lives",
                |p: &Pet| match p {
                    Pet::Cat { lives, .. } => Some(lives),
                    _ => None,
                },
                |p: &mut Pet| match p {
                    Pet::Cat { lives, .. } => Some(lives),
                    _ => None,
                },
            )
            .variant("cat"),
        )
        .primary_key(["id"]);

    stowage.register(def).unwrap()
}

/// A site with at most one manager, a budget kept in cents and a position
/// spread over two columns.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Site {
    pub id: i64,
    pub name: String,
    pub budget: Money,
    pub position: Point,
    pub manager: Option<Manager>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Money {
    pub cents: i64,
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Point {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Manager {
    pub name: String,
    pub phone: Option<String>,
}

pub const SITE_DDL: &[&str] = &[
    "CREATE TABLE site (id INTEGER PRIMARY KEY, name TEXT NOT NULL, budget_cents INTEGER, \
     lat REAL, lng REAL)",
    "CREATE TABLE site_manager (site_id INTEGER PRIMARY KEY, name TEXT NOT NULL, phone TEXT)",
];

pub fn sites(stowage: &Stowage) -> Aggregate<Site> {
    let manager = EntityDef::new(TableDef::new("site_manager").parent_key(["site_id"]))
        .field(Field::primitive(
            "name",
            "name",
            |m: &Manager| &m.name,
            |m: &mut Manager| &mut m.name,
        ))
        .field(Field::primitive(
            "phone",
            "phone",
            |m: &Manager| &m.phone,
            |m: &mut Manager| &mut m.phone,
        ));

    let budget = CustomMapper::single(
        "budget_cents",
        ScalarType::I64,
        |s: &Site| Value::I64(s.budget.cents),
        |s: &mut Site, value: Value| {
            s.budget = Money {
                cents: value.to_i64()?,
            };
            Ok(())
        },
    );

    let position = CustomMapper::compound(
        [("lat", ScalarType::F64), ("lng", ScalarType::F64)],
        |s: &Site| vec![Value::F64(s.position.lat), Value::F64(s.position.lng)],
        |s: &mut Site, values: Vec<Value>| {
            let mut values = values.into_iter();
            s.position = Point {
                lat: f64::from_value(values.next().unwrap_or_default())?,
                lng: f64::from_value(values.next().unwrap_or_default())?,
            };
            Ok(())
        },
    );

    let def = EntityDef::new(TableDef::new("site"))
        .field(Field::primitive("id", "id", |s: &Site| &s.id, |s: &mut Site| &mut s.id))
        .field(Field::primitive("name", "name", |s: &Site| &s.name, |s: &mut Site| &mut s.name))
        .field(Field::custom_mapped("budget", budget))
        .field(Field::custom_mapped("position", position))
        .field(Field::entity(
            "manager",
            manager,
            |s: &Site| &s.manager,
            |s: &mut Site| &mut s.manager,
        ))
        .primary_key(["id"]);

    stowage.register(def).unwrap()
}
