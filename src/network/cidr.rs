use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// an IPv4 address block, eg: `172.16.1.0/24`.
/// the address must be the network address of the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Cidr {
    addr: Ipv4Addr,
    prefix: u8,
}

impl Ipv4Cidr {
    pub fn new(addr: Ipv4Addr, prefix: u8) -> Result<Self, String> {
        if prefix > 32 {
            return Err(format!("Invalid prefix length /{prefix}. Must be at most /32"));
        }
        let cidr = Self { addr, prefix };
        if u32::from(addr) & cidr.mask() != u32::from(addr) {
            return Err(format!("{addr}/{prefix} is not a network address. Did you mean {}?", cidr.network()));
        }
        Ok(cidr)
    }

    pub fn addr(&self) -> Ipv4Addr {
        self.addr
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    fn mask(&self) -> u32 {
        if self.prefix == 0 { 0 } else { u32::MAX << (32 - self.prefix) }
    }

    fn network(&self) -> Ipv4Cidr {
        Ipv4Cidr { addr: Ipv4Addr::from(u32::from(self.addr) & self.mask()), prefix: self.prefix }
    }

    /// splits this block into `count` equally sized blocks, using the smallest power of
    /// two that fits `count`. Extra blocks beyond `count` are left unallocated.
    pub fn split(&self, count: usize) -> Result<Vec<Ipv4Cidr>, String> {
        if count == 0 {
            return Ok(vec![]);
        }
        let too_small = || format!("{self} is too small to hold {count} subnets (minimum subnet size is /28)");
        let blocks = u32::try_from(count).ok()
            .and_then(u32::checked_next_power_of_two)
            .ok_or_else(too_small)?;
        let new_prefix = u32::from(self.prefix) + blocks.trailing_zeros();
        // AWS subnets can't be smaller than a /28
        if new_prefix > 28 {
            return Err(too_small());
        }
        // a /0 only splits into itself, where the size is never used
        let size = 1u32.checked_shl(32 - new_prefix).unwrap_or(0);
        let base = u32::from(self.addr);
        Ok((0..blocks)
            .take(count)
            .map(|i| Ipv4Cidr { addr: Ipv4Addr::from(base + i * size), prefix: new_prefix as u8 })
            .collect())
    }
}

impl FromStr for Ipv4Cidr {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, prefix) = s.split_once('/')
            .ok_or_else(|| format!("Invalid CIDR block {:?}. Expected something like 10.0.0.0/16", s))?;
        let addr = Ipv4Addr::from_str(addr).map_err(|e| format!("Invalid CIDR block {:?}: {e}", s))?;
        let prefix = prefix.parse::<u8>().map_err(|e| format!("Invalid CIDR block {:?}: {e}", s))?;
        Ipv4Cidr::new(addr, prefix)
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix)
    }
}

impl<'de> Deserialize<'de> for Ipv4Cidr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl Serialize for Ipv4Cidr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
