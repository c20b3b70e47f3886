use netbuilder::{cidr::network_mask, CidrBlock};
use prettytable::{row, Table};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BlockInfo {
    cidr: CidrBlock,
    prefix_len: u8,
    netmask: String,
    first: String,
    last: String,
    size: u64,
}

/// Print the details of a block.
pub fn inspect(block: CidrBlock, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render(block, json)?);

    Ok(())
}

fn render(block: CidrBlock, json: bool) -> Result<String, Box<dyn std::error::Error>> {
    let info = BlockInfo {
        cidr: block,
        prefix_len: block.prefix_len(),
        netmask: network_mask(block.prefix_len())?,
        first: block.min_ip(),
        last: block.max_ip(),
        size: block.block_size(),
    };

    if json {
        return Ok(serde_json::to_string_pretty(&info)?);
    }

    let mut table = Table::new();
    table.add_row(row!["Block", info.cidr]);
    table.add_row(row!["Netmask", info.netmask]);
    table.add_row(row!["First address", info.first]);
    table.add_row(row!["Last address", info.last]);
    table.add_row(row!["Addresses", info.size]);

    Ok(table.to_string())
}
