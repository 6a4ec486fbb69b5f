//! Inserts a handful of greetings in different languages, then selects one
//! back out. Drives the blocking facade directly, with no `#[tokio::main]`
//! and no `.await`, to demonstrate the synchronous entry point a caller
//! without their own async runtime would actually use.

use voltproto::{Arg, BlockingConnection, ConnectionConfig, Procedure, TypeTag};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = ConnectionConfig::builder("localhost", 21212).build();
    let conn = BlockingConnection::connect(config)?;

    let insert = Procedure::new("Insert", vec![TypeTag::Str, TypeTag::Str, TypeTag::Str]);
    let greetings = [
        ["English", "Hello", "World"],
        ["French", "Bonjour", "Monde"],
        ["Spanish", "Hola", "Mundo"],
        ["Danish", "Hej", "Verden"],
        ["Italian", "Ciao", "Mondo"],
    ];
    for [language, greeting, place] in greetings {
        let args = vec![Arg::from(language), Arg::from(greeting), Arg::from(place)];
        conn.call(&insert, &args)?;
    }

    let select = Procedure::new("Select", vec![TypeTag::Str]);
    let response = conn.call(&select, &[Arg::from("Spanish")])?;
    for table in &response.tables {
        for row in &table.rows {
            println!("{row:?}");
        }
    }

    Ok(())
}
