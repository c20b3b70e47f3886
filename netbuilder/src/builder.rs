//! Sequential subnet allocation out of a single parent block.

use tracing::{debug, trace};

use crate::{
    cidr::{self, CidrBlock},
    Error,
};

/// Smallest prefix length (largest subnet) which can be allocated.
pub const MIN_SUBNET_PREFIX_LEN: u8 = 16;
/// Largest prefix length (smallest subnet) which can be allocated.
pub const MAX_SUBNET_PREFIX_LEN: u8 = 28;

/// Carves non-overlapping subnets out of a parent [`CidrBlock`], in address order.
///
/// The builder keeps a cursor to the first address which has not been handed out yet. Every
/// allocation starts at the cursor, rounded up to the alignment of the requested prefix length,
/// so blocks of mixed sizes never overlap. Space skipped for alignment is not reused.
///
/// # Examples
///
/// ```
/// use netbuilder::NetworkBuilder;
///
/// let mut builder = NetworkBuilder::new("10.0.0.0/16").unwrap();
///
/// assert_eq!(builder.add_subnet(24).unwrap(), "10.0.0.0/24");
/// assert_eq!(
///     builder.add_subnets(24, 2).unwrap(),
///     vec!["10.0.1.0/24".to_string(), "10.0.2.0/24".to_string()],
/// );
/// assert_eq!(builder.allocated_cidrs().len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct NetworkBuilder {
    parent: CidrBlock,
    allocated: Vec<CidrBlock>,
    /// Next unclaimed address. Equal to one past the last address of the parent once the
    /// builder is exhausted, which does not fit a `u32` for blocks at the top of the address
    /// space.
    cursor: u64,
}

impl NetworkBuilder {
    /// Create a new `NetworkBuilder` which partitions the given CIDR block.
    pub fn new(parent_cidr: &str) -> Result<Self, Error> {
        Ok(Self::with_parent(CidrBlock::parse(parent_cidr)?))
    }

    /// Create a new `NetworkBuilder` which partitions an already parsed block.
    pub fn with_parent(parent: CidrBlock) -> Self {
        Self {
            parent,
            allocated: Vec::new(),
            cursor: u64::from(parent.min_address()),
        }
    }

    /// The block being partitioned.
    pub fn parent(&self) -> CidrBlock {
        self.parent
    }

    /// The next address an allocation will start from, before alignment.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Amount of addresses which have not been handed out or skipped yet.
    pub fn remaining(&self) -> u64 {
        self.end() - self.cursor
    }

    /// Checks if all addresses of the parent block have been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.cursor == self.end()
    }

    /// All blocks allocated so far, in allocation order.
    pub fn allocated(&self) -> &[CidrBlock] {
        &self.allocated
    }

    /// Canonical CIDR strings of all blocks allocated so far, in allocation order.
    pub fn allocated_cidrs(&self) -> Vec<String> {
        self.allocated.iter().map(ToString::to_string).collect()
    }

    /// Allocate a single subnet with the given prefix length.
    pub fn add_subnet(&mut self, prefix_len: u8) -> Result<String, Error> {
        let blocks = self.allocate(prefix_len, 1)?;
        Ok(blocks
            .first()
            .expect("Exactly 1 block is allocated on success; qed")
            .to_string())
    }

    /// Allocate `count` consecutive subnets with the given prefix length.
    ///
    /// Either all subnets are allocated, or none are: on error the builder is left untouched.
    pub fn add_subnets(&mut self, prefix_len: u8, count: usize) -> Result<Vec<String>, Error> {
        Ok(self
            .allocate(prefix_len, count)?
            .iter()
            .map(ToString::to_string)
            .collect())
    }

    /// Allocate `count` consecutive blocks and return them.
    pub fn allocate(&mut self, prefix_len: u8, count: usize) -> Result<&[CidrBlock], Error> {
        if !(MIN_SUBNET_PREFIX_LEN..=MAX_SUBNET_PREFIX_LEN).contains(&prefix_len) {
            return Err(Error::InvalidMask(prefix_len));
        }

        let capacity_exceeded = || Error::CapacityExceeded {
            count,
            prefix_len,
            parent: self.parent.to_string(),
        };

        if self.is_exhausted() {
            return Err(capacity_exceeded());
        }

        let size = cidr::block_size(prefix_len)?;
        let start = align_up(self.cursor, size);
        let end = u64::try_from(count)
            .ok()
            .and_then(|count| size.checked_mul(count))
            .and_then(|span| start.checked_add(span))
            .filter(|end| *end <= self.end())
            .ok_or_else(capacity_exceeded)?;

        let mut blocks = Vec::with_capacity(count);
        let mut next = start;
        while next < end {
            let address =
                u32::try_from(next).map_err(|_| Error::AddressSpaceOverflow(self.parent.to_string()))?;
            let block = CidrBlock::from_address_and_prefix(address, prefix_len)?;
            next = u64::from(block.max_address()) + 1;
            blocks.push(block);
        }

        if count > 0 {
            if start > self.cursor {
                trace!(
                    skipped = start - self.cursor,
                    prefix_len,
                    "Aligning cursor to block boundary"
                );
            }
            self.cursor = end;
        }

        let first = self.allocated.len();
        for block in &blocks {
            debug!(parent = %self.parent, subnet = %block, "Allocated subnet");
        }
        self.allocated.extend(blocks);

        Ok(&self.allocated[first..])
    }

    /// Calculates the smallest prefix length such that `subnet_count` subnets of equal size still
    /// fit in the remaining space, i.e. the prefix length of the largest subnets which can be
    /// created.
    ///
    /// This does not take alignment of the cursor into account, nor does it allocate anything.
    ///
    /// # Examples
    ///
    /// ```
    /// use netbuilder::NetworkBuilder;
    ///
    /// let mut builder = NetworkBuilder::new("10.0.0.0/16").unwrap();
    /// assert_eq!(builder.mask_for_remaining_subnets(4).unwrap(), 18);
    ///
    /// builder.add_subnet(17).unwrap();
    /// assert_eq!(builder.mask_for_remaining_subnets(1).unwrap(), 17);
    /// ```
    pub fn mask_for_remaining_subnets(&self, subnet_count: usize) -> Result<u8, Error> {
        if subnet_count == 0 {
            return Err(Error::InvalidArgument("subnet count must be positive"));
        }

        let per_subnet = u64::try_from(subnet_count)
            .map(|count| self.remaining() / count)
            .unwrap_or(0);
        if per_subnet == 0 {
            return Err(Error::CapacityExceeded {
                count: subnet_count,
                prefix_len: cidr::MAX_PREFIX_LEN,
                parent: self.parent.to_string(),
            });
        }

        // floor(log2(per_subnet)), at most 32 since per_subnet <= 2^32.
        let bits = (u64::BITS - 1 - per_subnet.leading_zeros()) as u8;
        let prefix_len = cidr::MAX_PREFIX_LEN - bits;
        debug!(
            parent = %self.parent,
            remaining = self.remaining(),
            subnet_count,
            prefix_len,
            "Sized remaining subnets"
        );

        Ok(prefix_len)
    }

    /// One past the last address of the parent.
    fn end(&self) -> u64 {
        u64::from(self.parent.max_address()) + 1
    }
}

/// Round `address` up to the next multiple of `size`, which must be a power of 2.
fn align_up(address: u64, size: u64) -> u64 {
    (address + size - 1) & !(size - 1)
}
