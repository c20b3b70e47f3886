use netbuilder::{CidrBlock, NetworkBuilder};
use tracing::{debug, error};

use crate::render::{render_rows, OutputFormat, SubnetRow};

/// Carve `count` subnets out of `block` and print them.
///
/// If no prefix length is given, the largest subnets which still fit `count` times are used.
pub fn split(
    block: CidrBlock,
    count: usize,
    prefix_len: Option<u8>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render(block, count, prefix_len, format)?);

    Ok(())
}

fn render(
    block: CidrBlock,
    count: usize,
    prefix_len: Option<u8>,
    format: OutputFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    let mut builder = NetworkBuilder::with_parent(block);
    let prefix_len = match prefix_len {
        Some(prefix_len) => prefix_len,
        None => {
            let prefix_len = builder.mask_for_remaining_subnets(count)?;
            debug!("Using /{prefix_len} for {count} subnets in {block}");
            prefix_len
        }
    };

    let rows = match builder.allocate(prefix_len, count) {
        Ok(blocks) => blocks.iter().copied().map(SubnetRow::from).collect::<Vec<_>>(),
        Err(e) => {
            error!("Failed to split {block}: {e}");
            return Err(e.into());
        }
    };

    render_rows(&rows, format)
}
