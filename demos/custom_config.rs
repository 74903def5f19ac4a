use {
    dc_snowflake::{parse_id, LayoutOptions, Snowflake},
    std::error::Error,
};

fn main() -> Result<(), Box<dyn Error>> {
    let options = LayoutOptions::default()
        .with_epoch(1704067200000) // 2024-01-01 00:00:00.000 UTC
        .with_worker_id_bits(8)
        .with_datacenter_id_bits(2)
        .with_sequence_bits(10);
    let snowflake = Snowflake::with_options(200, 3, options)?;
    let sfid = snowflake.next_id()?;

    // Anyone holding the same options can decode the ID.
    let parsed = parse_id(sfid, &options.build()?);
    println!("Snowflake ID: {}", sfid);
    println!("Parsed: {:?}", parsed.to_strings());
    Ok(())
}
