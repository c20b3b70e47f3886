//! IPv4 address space planning.
//!
//! A [`NetworkBuilder`] partitions a single parent block into non-overlapping subnets on demand,
//! and can size subnets to share whatever space is left. [`plan::NetworkPlan`] drives a builder
//! from a declarative description of zones and subnet tiers.
//!
//! Everything in here is synchronous and in-memory. A builder is owned by a single planning pass;
//! independent plans use independent builders over disjoint parent blocks.

pub mod address;
pub mod builder;
pub mod cidr;
mod error;
pub mod plan;

pub use builder::NetworkBuilder;
pub use cidr::CidrBlock;
pub use error::Error;
