use rowmap_core::{Column, Row, TableSchema, Value};

fn main() {
    let users = TableSchema::new("users")
        .column("id", Column::serial().primary_key())
        .column("username", Column::text().secondary_key())
        .column("hash", Column::text());

    // A row loaded from the database starts clean
    let mut row = Row::from_db(
        &users,
        [
            ("id".to_string(), Value::I32(5)),
            ("username".to_string(), Value::from("bob")),
            ("hash".to_string(), Value::from("asdf")),
        ]
        .into_iter()
        .collect(),
    );
    println!("loaded:  {} (dirty: {})", row, row.is_dirty());

    // Assignments are tracked; only changed columns reach the UPDATE
    row.set("username", "bill").unwrap();
    let (sql, params) = row.update_stmt(None).unwrap();
    println!("update:  {} {:?}", sql, params);

    // A fresh row with no primary key would INSERT on save
    let fresh = Row::with_values(&users, vec![("username", "carol"), ("hash", "qwer")]).unwrap();
    let (sql, params) = fresh.insert_stmt().unwrap();
    println!("insert:  {} {:?}", sql, params);

    // Deletes key on the primary key
    let (sql, params) = row.delete_stmt().unwrap();
    println!("delete:  {} {:?}", sql, params);
}
