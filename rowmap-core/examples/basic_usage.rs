use rowmap_core::{op, Column, QueryBuilder, Row, SortDirection, TableSchema};

fn main() {
    // Declare a schema the way you would declare the table itself
    let users = TableSchema::new("users")
        .column("id", Column::serial().primary_key())
        .column("username", Column::text().secondary_key())
        .column("hash", Column::text())
        .column(
            "time",
            Column::timestamp().default_value("now()").not_null(),
        );

    // Table creation DDL, indexes included
    println!("{}\n", users.create_sql().unwrap());

    // Single-column migration
    println!("{}\n", users.add_column_sql("hash").unwrap());

    // Rows generate their own persistence SQL
    let mut row = Row::new(&users);
    row.set("username", "bob").unwrap();
    row.set("hash", "1234").unwrap();

    let (sql, _) = row.insert_stmt().unwrap();
    println!("INSERT SQL: {}", sql);

    // Schema-bound SELECT with validated columns
    let query = users
        .select()
        .where_(("username", op::LIKE, "jo%"))
        .order_by("username", SortDirection::Asc)
        .limit(5);

    println!("SELECT SQL: {}", query.to_sql().unwrap());
    println!("Inline:     {}", query.to_inline_sql().unwrap());

    // Key lookups: integers hit the primary key, strings the secondary key
    let (by_id, _) = users.lookup_stmt(&5i64.into()).unwrap();
    let (by_name, _) = users.lookup_stmt(&"bob".into()).unwrap();
    println!("Lookup by id:       {}", by_id);
    println!("Lookup by username: {}", by_name);
}
