//! Conversion between dotted-quad IPv4 strings and their numeric form.
//!
//! The parser here is deliberately a bit more lenient than [`Ipv4Addr`]'s [`FromStr`]
//! implementation: octets with leading zeros (`010.000.000.001`) are accepted and read as
//! decimal. Everything else, i.e. empty segments, signs, whitespace, or octets above 255, is
//! rejected.
//!
//! [`FromStr`]: std::str::FromStr

use std::net::Ipv4Addr;

use crate::Error;

/// Amount of octets in an IPv4 address.
const OCTETS: usize = 4;

/// Checks if the given string is a valid dotted-quad IPv4 address.
///
/// # Examples
///
/// ```
/// use netbuilder::address::is_valid_ip;
///
/// assert!(is_valid_ip("192.168.1.1"));
/// assert!(is_valid_ip("010.000.000.001"));
/// assert!(!is_valid_ip("10.0.0"));
/// assert!(!is_valid_ip("10.0. 0.0"));
/// ```
pub fn is_valid_ip(ip: &str) -> bool {
    parse_octets(ip).is_some()
}

/// Converts a dotted-quad string to its numeric representation.
///
/// # Examples
///
/// ```
/// use netbuilder::address::address_to_number;
///
/// assert_eq!(address_to_number("10.0.0.0").unwrap(), 167_772_160);
/// assert!(address_to_number("256.0.0.0").is_err());
/// ```
pub fn address_to_number(ip: &str) -> Result<u32, Error> {
    parse_octets(ip)
        .map(u32::from_be_bytes)
        .ok_or_else(|| Error::InvalidAddress(ip.to_string()))
}

/// Converts a number to its dotted-quad representation.
///
/// The input is taken as a `u64` so that callers doing wide address arithmetic (e.g. one past the
/// last address of a block) get an error instead of a silently truncated address.
///
/// # Examples
///
/// ```
/// use netbuilder::address::number_to_address;
///
/// assert_eq!(number_to_address(0).unwrap(), "0.0.0.0");
/// assert_eq!(number_to_address(4_294_967_295).unwrap(), "255.255.255.255");
/// assert!(number_to_address(4_294_967_296).is_err());
/// ```
pub fn number_to_address(n: u64) -> Result<String, Error> {
    u32::try_from(n)
        .map(|n| Ipv4Addr::from(n).to_string())
        .map_err(|_| Error::InvalidAddress(n.to_string()))
}

fn parse_octets(ip: &str) -> Option<[u8; OCTETS]> {
    let mut octets = [0; OCTETS];
    let mut parts = ip.split('.');
    for octet in octets.iter_mut() {
        let part = parts.next()?;
        // `u8::from_str` accepts a leading `+`, which is not part of a dotted quad.
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        *octet = part.parse().ok()?;
    }

    if parts.next().is_some() {
        return None;
    }

    Some(octets)
}
