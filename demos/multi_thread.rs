use {
    dc_snowflake::Snowflake,
    std::{
        error::Error,
        sync::{mpsc, Arc},
        thread,
    },
};

fn main() -> Result<(), Box<dyn Error>> {
    let snowflake = Arc::new(Snowflake::new(1, 1)?);
    let (tx, rx) = mpsc::channel();

    for _ in 0 .. 10 {
        let snowflake = Arc::clone(&snowflake);
        let tx = tx.clone();

        thread::spawn(move || match snowflake.next_id() {
            Ok(sfid) => {
                let _ = tx.send(sfid);
            }
            Err(e) => {
                println!("Generate error: {}", e);
            }
        });
    }
    drop(tx);

    for sfid in rx {
        println!("Snowflake ID: {}", sfid);
    }

    Ok(())
}
