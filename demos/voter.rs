//! Casts a handful of votes and reports whatever status the server hands
//! back. Mirrors the reference voter benchmark's call shape; unlike that
//! script, this demo never interprets `status` beyond printing it, since the
//! library leaves that judgment to the caller.

use voltproto::{Arg, Connection, ConnectionConfig, Procedure, TypeTag, PROC_OK};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = ConnectionConfig::builder("localhost", 21212).build();
    let conn = Connection::connect(config).await?;

    let vote = Procedure::new("Vote", vec![TypeTag::BigInt, TypeTag::TinyInt, TypeTag::BigInt]);
    let max_contestant: i64 = 6;

    for phone_number in 1_000_000_000i64..1_000_000_010 {
        let contestant = ((phone_number % max_contestant) + 1) as i8;
        let args = vec![Arg::from(phone_number), Arg::from(contestant), Arg::from(max_contestant)];
        let response = conn.call(&vote, &args).await?;

        if response.status == PROC_OK {
            println!("vote accepted for phone {phone_number}");
        } else {
            println!("vote for phone {phone_number} returned status {}", response.status);
        }
    }

    Ok(())
}
