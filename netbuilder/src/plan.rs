//! Declarative network plans.
//!
//! A plan describes a parent block, the availability zones it spans, and a list of subnet tiers.
//! Every tier gets the same amount of subnets in every zone. Tiers either have a fixed prefix
//! length, or are sized from whatever space is left when they are reached.
//!
//! ```toml
//! cidr = "10.0.0.0/16"
//! zones = ["us-east-1a", "us-east-1b", "us-east-1c"]
//!
//! [[tiers]]
//! name = "public"
//! prefix = 24
//!
//! [[tiers]]
//! name = "private"
//! ```
//!
//! The `netplan` binary lets `NETPLAN_CIDR` and `NETPLAN_ZONES` override the file. Zones are then
//! given as a comma separated list, e.g. `NETPLAN_ZONES=us-east-1a,us-east-1b`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    builder::{NetworkBuilder, MIN_SUBNET_PREFIX_LEN},
    cidr::CidrBlock,
    Error,
};

/// A parent block and the subnets to create in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkPlan {
    /// Block to partition.
    pub cidr: CidrBlock,
    /// Names of the zones to create subnets in.
    pub zones: Vec<String>,
    /// Subnet tiers, allocated in order.
    #[serde(default)]
    pub tiers: Vec<SubnetTier>,
}

/// A group of equally sized subnets, repeated in every zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetTier {
    /// Name of the tier, e.g. `public`.
    pub name: String,
    /// Prefix length of the subnets in this tier. If this is not set, the remaining space of the
    /// parent is shared evenly between this tier and all following tiers without a prefix.
    ///
    /// Tiers without a prefix should therefore come last, any fixed size tier after them will
    /// not fit anymore.
    #[serde(default)]
    pub prefix: Option<u8>,
    /// Amount of subnets in every zone.
    #[serde(default = "default_per_zone")]
    pub per_zone: usize,
}

/// A single subnet handed out while executing a [`NetworkPlan`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetAllocation {
    /// Name of the tier the subnet belongs to.
    pub tier: String,
    /// Zone the subnet is placed in.
    pub zone: String,
    /// The subnet itself.
    pub cidr: CidrBlock,
}

fn default_per_zone() -> usize {
    1
}

impl NetworkPlan {
    /// Allocate all tiers of the plan.
    ///
    /// Subnets of a tier are assigned to zones in the order in which the zones are listed, so the
    /// first `per_zone` subnets of every tier go to the first zone. Any error aborts the entire
    /// plan.
    pub fn allocate(&self) -> Result<Vec<SubnetAllocation>, Error> {
        if self.zones.is_empty() {
            return Err(Error::InvalidArgument("plan must list at least one zone"));
        }

        let mut builder = NetworkBuilder::with_parent(self.cidr);
        let mut allocations = Vec::new();

        for (idx, tier) in self.tiers.iter().enumerate() {
            if tier.per_zone == 0 {
                return Err(Error::InvalidArgument("tier must have at least 1 subnet per zone"));
            }
            let count = self.tier_count(tier)?;

            let prefix_len = match tier.prefix {
                Some(prefix_len) => prefix_len,
                None => {
                    let mut shared = 0usize;
                    for auto in self.tiers[idx..].iter().filter(|t| t.prefix.is_none()) {
                        shared = shared.saturating_add(self.tier_count(auto)?);
                    }
                    // Never hand out subnets larger than the allocator allows, even if there is
                    // room for them.
                    builder
                        .mask_for_remaining_subnets(shared)?
                        .max(MIN_SUBNET_PREFIX_LEN)
                }
            };

            debug!(tier = %tier.name, prefix_len, count, "Allocating tier");
            let blocks = builder.allocate(prefix_len, count)?;
            allocations.extend(blocks.iter().enumerate().map(|(i, block)| SubnetAllocation {
                tier: tier.name.clone(),
                zone: self.zones[i / tier.per_zone].clone(),
                cidr: *block,
            }));
        }

        Ok(allocations)
    }

    fn tier_count(&self, tier: &SubnetTier) -> Result<usize, Error> {
        self.zones
            .len()
            .checked_mul(tier.per_zone)
            .ok_or(Error::InvalidArgument("tier subnet count overflows"))
    }
}
