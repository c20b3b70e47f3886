use std::fmt;

/// Error generated while parsing blocks or carving subnets out of a parent block.
///
/// Every variant is fatal for the planning pass which produced it: none of these are transient,
/// and retrying the same call will yield the same error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A CIDR string is not of the form `address/prefix`.
    InvalidFormat(String),
    /// An address string is not four decimal octets in `[0, 255]`, or a number does not fit in
    /// the IPv4 address space.
    InvalidAddress(String),
    /// A prefix length is outside of the range allowed for the operation.
    InvalidMask(u8),
    /// A batch of subnets does not fit in the remaining space of the parent block.
    CapacityExceeded {
        /// Amount of subnets requested.
        count: usize,
        /// Prefix length of the requested subnets.
        prefix_len: u8,
        /// Canonical CIDR of the parent block.
        parent: String,
    },
    /// The successor of a block would lie past the end of the IPv4 address space.
    AddressSpaceOverflow(String),
    /// An argument which must be positive was zero.
    InvalidArgument(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFormat(s) => write!(f, "{s} is not a valid CIDR block."),
            Self::InvalidAddress(s) => write!(f, "{s} is not a valid IP address."),
            Self::InvalidMask(mask) => write!(f, "/{mask} is not a valid network mask."),
            Self::CapacityExceeded {
                count,
                prefix_len,
                parent,
            } => write!(
                f,
                "{count} of /{prefix_len} exceeds remaining space of {parent}."
            ),
            Self::AddressSpaceOverflow(cidr) => {
                write!(f, "{cidr} is the last block of its size in the IPv4 address space.")
            }
            Self::InvalidArgument(what) => write!(f, "invalid argument: {what}"),
        }
    }
}

impl std::error::Error for Error {}
