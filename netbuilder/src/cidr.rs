//! A dedicated IPv4 CIDR block type.
//!
//! [`Ipv4Net`] keeps the host bits of the address it was created with. A [`CidrBlock`] never
//! does: whatever address inside the block is used to construct it, the block snaps to its aligned
//! boundaries, so two blocks built from addresses in the same aligned range are equal.

use core::fmt;
use std::{net::Ipv4Addr, str::FromStr};

use ipnet::Ipv4Net;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::{address, Error};

/// Amount of bits in an IPv4 address, and thus the maximum prefix length.
pub const MAX_PREFIX_LEN: u8 = 32;

/// A canonical, aligned range of IPv4 addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CidrBlock {
    /// Always truncated, i.e. all host bits are 0.
    inner: Ipv4Net,
}

/// Returns the amount of addresses in a block with the given prefix length.
///
/// This is a `u64` since a `/0` spans the full `2^32` addresses.
///
/// # Examples
///
/// ```
/// use netbuilder::cidr::block_size;
///
/// assert_eq!(block_size(24).unwrap(), 256);
/// assert_eq!(block_size(0).unwrap(), 1 << 32);
/// assert!(block_size(33).is_err());
/// ```
pub fn block_size(prefix_len: u8) -> Result<u64, Error> {
    if prefix_len > MAX_PREFIX_LEN {
        return Err(Error::InvalidMask(prefix_len));
    }
    Ok(1 << (MAX_PREFIX_LEN - prefix_len))
}

/// Returns the netmask for the given prefix length in dotted-quad form.
///
/// # Examples
///
/// ```
/// use netbuilder::cidr::network_mask;
///
/// assert_eq!(network_mask(24).unwrap(), "255.255.255.0");
/// assert_eq!(network_mask(0).unwrap(), "0.0.0.0");
/// ```
pub fn network_mask(prefix_len: u8) -> Result<String, Error> {
    let net = Ipv4Net::new(Ipv4Addr::UNSPECIFIED, prefix_len)
        .map_err(|_| Error::InvalidMask(prefix_len))?;
    Ok(net.netmask().to_string())
}

impl CidrBlock {
    /// Create a new `CidrBlock` containing the given address, with the given prefix length.
    ///
    /// # Examples
    ///
    /// ```
    /// use netbuilder::cidr::CidrBlock;
    /// use std::net::Ipv4Addr;
    ///
    /// let block = CidrBlock::new(Ipv4Addr::new(10, 1, 2, 3), 16).unwrap();
    ///
    /// assert_eq!(block.to_string(), "10.1.0.0/16");
    /// ```
    pub fn new(addr: Ipv4Addr, prefix_len: u8) -> Result<Self, Error> {
        Ok(Self {
            inner: Ipv4Net::new(addr, prefix_len)
                .map_err(|_| Error::InvalidMask(prefix_len))?
                .trunc(),
        })
    }

    /// Create a new `CidrBlock` from a numeric address, snapping to the aligned block containing
    /// that address.
    pub fn from_address_and_prefix(address: u32, prefix_len: u8) -> Result<Self, Error> {
        Self::new(Ipv4Addr::from(address), prefix_len)
    }

    /// Parse a block in `address/prefix` notation. Host bits in the address are discarded.
    ///
    /// # Examples
    ///
    /// ```
    /// use netbuilder::cidr::CidrBlock;
    ///
    /// let block = CidrBlock::parse("192.168.1.77/24").unwrap();
    ///
    /// assert_eq!(block.to_string(), "192.168.1.0/24");
    /// assert!(CidrBlock::parse("192.168.1.0").is_err());
    /// ```
    pub fn parse(cidr: &str) -> Result<Self, Error> {
        let (addr, prefix) = cidr
            .split_once('/')
            .ok_or_else(|| Error::InvalidFormat(cidr.to_string()))?;

        if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidFormat(cidr.to_string()));
        }
        // Only digits are left, so parsing can only fail on overflow, which is just another
        // prefix length past the maximum.
        let prefix_len = prefix.parse::<u8>().unwrap_or(u8::MAX);

        Self::from_address_and_prefix(address::address_to_number(addr)?, prefix_len)
    }

    /// Returns the size of the prefix in bits.
    pub fn prefix_len(&self) -> u8 {
        self.inner.prefix_len()
    }

    /// Returns the amount of addresses in this block.
    pub fn block_size(&self) -> u64 {
        1 << (MAX_PREFIX_LEN - self.prefix_len())
    }

    /// Numeric value of the first address in the block.
    pub fn min_address(&self) -> u32 {
        self.inner.network().into()
    }

    /// Numeric value of the last address in the block.
    pub fn max_address(&self) -> u32 {
        self.inner.broadcast().into()
    }

    /// First address of the block, in dotted-quad form.
    pub fn min_ip(&self) -> String {
        self.inner.network().to_string()
    }

    /// Last address of the block, in dotted-quad form.
    pub fn max_ip(&self) -> String {
        self.inner.broadcast().to_string()
    }

    /// Returns the network address of this block.
    pub fn network(&self) -> Ipv4Addr {
        self.inner.network()
    }

    /// Returns the netmask of this block.
    pub fn netmask(&self) -> Ipv4Addr {
        self.inner.netmask()
    }

    /// Returns the adjacent block of the same size directly following this one.
    ///
    /// # Examples
    ///
    /// ```
    /// use netbuilder::cidr::CidrBlock;
    ///
    /// let block = CidrBlock::parse("10.0.255.0/24").unwrap();
    /// assert_eq!(block.next_block().unwrap().to_string(), "10.1.0.0/24");
    ///
    /// let last = CidrBlock::parse("255.255.255.0/24").unwrap();
    /// assert!(last.next_block().is_err());
    /// ```
    pub fn next_block(&self) -> Result<Self, Error> {
        let next = u32::try_from(u64::from(self.max_address()) + 1)
            .map_err(|_| Error::AddressSpaceOverflow(self.to_string()))?;
        Self::from_address_and_prefix(next, self.prefix_len())
    }

    /// Checks if this `CidrBlock` contains the provided `CidrBlock`, i.e. all addresses of the
    /// provided block are also part of this block.
    ///
    /// # Examples
    ///
    /// ```
    /// use netbuilder::cidr::CidrBlock;
    ///
    /// let parent = CidrBlock::parse("10.0.0.0/16").unwrap();
    /// let child = CidrBlock::parse("10.0.1.0/24").unwrap();
    ///
    /// assert!(parent.contains(&child));
    /// assert!(!child.contains(&parent));
    /// ```
    pub fn contains(&self, other: &Self) -> bool {
        other.min_address() >= self.min_address() && other.max_address() <= self.max_address()
    }

    /// Checks if this `CidrBlock` shares at least one address with the provided one.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min_address() <= other.max_address() && other.min_address() <= self.max_address()
    }
}

impl FromStr for CidrBlock {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CidrBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<Ipv4Net> for CidrBlock {
    fn from(value: Ipv4Net) -> Self {
        Self {
            inner: value.trunc(),
        }
    }
}

impl From<CidrBlock> for Ipv4Net {
    fn from(value: CidrBlock) -> Self {
        value.inner
    }
}

impl Serialize for CidrBlock {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CidrBlock {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        CidrBlock::parse(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use ipnet::Ipv4Net;
    use proptest::prelude::*;

    use super::{block_size, network_mask, CidrBlock};
    use crate::{address::address_to_number, Error};

    #[test]
    fn parse_canonical_block() {
        let block = CidrBlock::parse("10.0.0.0/16").unwrap();

        assert_eq!(block.to_string(), "10.0.0.0/16");
        assert_eq!(block.prefix_len(), 16);
        assert_eq!(block.block_size(), 65_536);
        assert_eq!(block.min_ip(), "10.0.0.0");
        assert_eq!(block.max_ip(), "10.0.255.255");
        assert_eq!(block.min_address(), address_to_number("10.0.0.0").unwrap());
        assert_eq!(block.max_address(), address_to_number("10.0.255.255").unwrap());
        assert_eq!(block.netmask(), Ipv4Addr::new(255, 255, 0, 0));
    }

    #[test]
    fn snaps_to_containing_block() {
        let block_1 = CidrBlock::parse("10.1.2.3/24").unwrap();
        let block_2 = CidrBlock::parse("10.1.2.255/24").unwrap();
        let block_3 = CidrBlock::parse("10.1.2.0/24").unwrap();
        let block_4 = CidrBlock::parse("10.1.3.0/24").unwrap();

        assert_eq!(block_1, block_2);
        assert_eq!(block_1, block_3);
        assert_ne!(block_1, block_4);
        assert_eq!(block_1.to_string(), "10.1.2.0/24");

        let block_5 = CidrBlock::parse("10.1.2.3/16").unwrap();
        assert_ne!(block_1, block_5);
    }

    #[test]
    fn extreme_prefix_lengths() {
        let all = CidrBlock::parse("0.0.0.0/0").unwrap();
        assert_eq!(all.block_size(), 4_294_967_296);
        assert_eq!(all.min_ip(), "0.0.0.0");
        assert_eq!(all.max_ip(), "255.255.255.255");
        assert_eq!(all.to_string(), "0.0.0.0/0");

        let single = CidrBlock::parse("192.168.1.1/32").unwrap();
        assert_eq!(single.block_size(), 1);
        assert_eq!(single.min_ip(), single.max_ip());
        assert_eq!(single.to_string(), "192.168.1.1/32");

        let top = CidrBlock::parse("255.255.255.255/32").unwrap();
        assert_eq!(top.to_string(), "255.255.255.255/32");

        assert_eq!(CidrBlock::parse("192.168.1.0/31").unwrap().block_size(), 2);
        assert_eq!(CidrBlock::parse("0.0.0.0/1").unwrap().block_size(), 2_147_483_648);
    }

    #[test]
    fn parse_errors() {
        assert_eq!(
            CidrBlock::parse("10.0.0.0"),
            Err(Error::InvalidFormat("10.0.0.0".into()))
        );
        assert_eq!(
            CidrBlock::parse("10.0.0.0/"),
            Err(Error::InvalidFormat("10.0.0.0/".into()))
        );
        assert_eq!(
            CidrBlock::parse("10.0.0.0/abc"),
            Err(Error::InvalidFormat("10.0.0.0/abc".into()))
        );
        assert_eq!(
            CidrBlock::parse("10.0.0.0/16/8"),
            Err(Error::InvalidFormat("10.0.0.0/16/8".into()))
        );
        assert_eq!(
            CidrBlock::parse("10.0.0/16"),
            Err(Error::InvalidAddress("10.0.0".into()))
        );
        assert_eq!(
            CidrBlock::parse("256.0.0.0/8"),
            Err(Error::InvalidAddress("256.0.0.0".into()))
        );
        assert_eq!(CidrBlock::parse("10.0.0.0/33"), Err(Error::InvalidMask(33)));
        assert_eq!(CidrBlock::parse("10.0.0.0/033"), Err(Error::InvalidMask(33)));
        assert_eq!(
            CidrBlock::parse("10.0.0.0/256"),
            Err(Error::InvalidMask(u8::MAX))
        );
        assert_eq!(
            CidrBlock::parse("10.0.0.0/12345678901234567890"),
            Err(Error::InvalidMask(u8::MAX))
        );
    }

    #[test]
    fn next_block() {
        let block = CidrBlock::parse("10.0.0.0/16").unwrap();
        assert_eq!(block.next_block().unwrap().to_string(), "10.1.0.0/16");

        let block = CidrBlock::parse("192.168.1.0/24").unwrap();
        assert_eq!(block.next_block().unwrap().to_string(), "192.168.2.0/24");

        let last = CidrBlock::parse("255.255.255.255/32").unwrap();
        assert_eq!(
            last.next_block(),
            Err(Error::AddressSpaceOverflow("255.255.255.255/32".into()))
        );
        let all = CidrBlock::parse("0.0.0.0/0").unwrap();
        assert!(all.next_block().is_err());
    }

    #[test]
    fn containment() {
        let parent = CidrBlock::parse("10.0.0.0/16").unwrap();
        let child = CidrBlock::parse("10.0.1.0/24").unwrap();
        let other = CidrBlock::parse("192.168.0.0/16").unwrap();
        let small = CidrBlock::parse("10.0.0.0/24").unwrap();

        assert!(parent.contains(&child));
        assert!(parent.contains(&parent));
        assert!(!parent.contains(&other));
        assert!(!small.contains(&parent));

        let adjacent = small.next_block().unwrap();
        assert!(!small.contains(&adjacent));
        assert!(!adjacent.contains(&small));
        assert!(!small.overlaps(&adjacent));
        assert!(small.overlaps(&parent));
    }

    #[test]
    fn masks() {
        assert_eq!(network_mask(16).unwrap(), "255.255.0.0");
        assert_eq!(network_mask(32).unwrap(), "255.255.255.255");
        assert_eq!(network_mask(33), Err(Error::InvalidMask(33)));
        assert_eq!(block_size(16), Ok(65_536));
    }

    #[test]
    fn ipnet_conversion() {
        let net: Ipv4Net = "10.1.2.3/8".parse().unwrap();
        let block = CidrBlock::from(net);

        assert_eq!(block.to_string(), "10.0.0.0/8");
        assert_eq!(Ipv4Net::from(block).to_string(), "10.0.0.0/8");
    }

    #[test]
    fn serde_as_string() {
        let block = CidrBlock::parse("172.16.0.0/12").unwrap();
        let json = serde_json::to_string(&block).unwrap();
        assert_eq!(json, "\"172.16.0.0/12\"");

        let back: CidrBlock = serde_json::from_str("\"172.16.5.9/12\"").unwrap();
        assert_eq!(back, block);

        assert!(serde_json::from_str::<CidrBlock>("\"172.16.0.0\"").is_err());
    }

    proptest! {
        #[test]
        fn block_size_is_power_of_two(prefix_len in 0u8..=32) {
            prop_assert_eq!(block_size(prefix_len).unwrap(), 2u64.pow(32 - u32::from(prefix_len)));
        }

        #[test]
        fn snapping_is_idempotent(address in any::<u32>(), prefix_len in 0u8..=32) {
            let block = CidrBlock::from_address_and_prefix(address, prefix_len).unwrap();
            let again = CidrBlock::from_address_and_prefix(block.min_address(), prefix_len).unwrap();

            prop_assert_eq!(block, again);
            prop_assert!(block.min_address() <= address && address <= block.max_address());
            prop_assert_eq!(u64::from(block.min_address()) % block.block_size(), 0);
            prop_assert_eq!(
                u64::from(block.max_address()) - u64::from(block.min_address()) + 1,
                block.block_size()
            );
        }
    }
}
