use netbuilder::{plan::SubnetAllocation, CidrBlock};
use prettytable::{row, Table};
use serde::Serialize;

/// Output format for lists of subnets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human readable table.
    #[default]
    Table,
    /// JSON array.
    Json,
    /// TOML document with a `subnets` array of tables.
    Toml,
}

/// A single line of output describing a subnet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct SubnetRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    pub cidr: CidrBlock,
    pub first: String,
    pub last: String,
    pub size: u64,
}

#[derive(Serialize)]
struct Document<'a> {
    subnets: &'a [SubnetRow],
}

impl From<CidrBlock> for SubnetRow {
    fn from(block: CidrBlock) -> Self {
        Self {
            tier: None,
            zone: None,
            cidr: block,
            first: block.min_ip(),
            last: block.max_ip(),
            size: block.block_size(),
        }
    }
}

impl From<SubnetAllocation> for SubnetRow {
    fn from(allocation: SubnetAllocation) -> Self {
        Self {
            tier: Some(allocation.tier),
            zone: Some(allocation.zone),
            ..Self::from(allocation.cidr)
        }
    }
}

/// Render subnet rows in the requested format.
pub(crate) fn render_rows(
    rows: &[SubnetRow],
    format: OutputFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(rows)?,
        OutputFormat::Toml => toml::to_string_pretty(&Document { subnets: rows })?,
        OutputFormat::Table => {
            let with_placement = rows.iter().any(|r| r.tier.is_some());
            let mut table = Table::new();
            if with_placement {
                table.add_row(row!["Tier", "Zone", "Subnet", "First", "Last", "Size"]);
            } else {
                table.add_row(row!["Subnet", "First", "Last", "Size"]);
            }
            for r in rows {
                if with_placement {
                    table.add_row(row![
                        r.tier.as_deref().unwrap_or("-"),
                        r.zone.as_deref().unwrap_or("-"),
                        r.cidr,
                        r.first,
                        r.last,
                        r.size,
                    ]);
                } else {
                    table.add_row(row![r.cidr, r.first, r.last, r.size]);
                }
            }
            table.to_string()
        }
    })
}
