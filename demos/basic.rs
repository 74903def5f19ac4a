use dc_snowflake::Snowflake;

fn main() {
    let worker_id = 1;
    let datacenter_id = 1;
    let snowflake = Snowflake::new(worker_id, datacenter_id).unwrap();

    let id1 = snowflake.next_id().unwrap();
    let id2 = snowflake.next_id().unwrap();
    let id3 = snowflake.next_id().unwrap();

    println!("id1: {} ({})", id1, snowflake.parse(id1));
    println!("id2: {} ({})", id2, snowflake.parse(id2));
    println!("id3: {} ({})", id3, snowflake.parse(id3));

    assert!(id1 < id2);
    assert!(id2 < id3);
}

// Output:
// id1: 523447642701828096 (timestamp=1734258843207 datacenter_id=1 worker_id=1 sequence=0)
// id2: 523447642701828097 (timestamp=1734258843207 datacenter_id=1 worker_id=1 sequence=1)
// id3: 523447642701828098 (timestamp=1734258843207 datacenter_id=1 worker_id=1 sequence=2)
