//! Target parsing for the command line
//!
//! Turns user-supplied targets into the socket addresses handed to the
//! mapper. Accepted forms:
//! - `192.168.1.20` or `fe80::1` (default port applied)
//! - `192.168.1.20:5556` or `[fe80::1]:5556`
//! - `192.168.1.0/24` or `2001:db8::/120` (every host address, default port)
//! - `pixel.local` or `pixel.local:5556` (resolved through the system resolver)

use anyhow::{Context, Result};
use ipnetwork::IpNetwork;
use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::str::FromStr;

use crate::config::DEFAULT_ADB_PORT;

/// Represents a parsed target with its type and addresses
#[derive(Debug, Clone)]
pub struct ParsedTarget {
    pub original: String,
    pub target_type: TargetType,
    pub addresses: Vec<SocketAddr>,
}

/// Type of target being scanned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetType {
    Address,
    SocketAddress,
    Cidr,
    Hostname,
}

/// Target parser with CIDR and hostname support
#[derive(Debug, Clone)]
pub struct TargetParser {
    default_port: u16,
    max_cidr_addresses: u64,
    resolve_hostnames: bool,
}

impl Default for TargetParser {
    fn default() -> Self {
        Self {
            default_port: DEFAULT_ADB_PORT,
            max_cidr_addresses: 65536,
            resolve_hostnames: true,
        }
    }
}

impl TargetParser {
    pub fn new(default_port: u16, max_cidr_addresses: u64, resolve_hostnames: bool) -> Self {
        Self {
            default_port,
            max_cidr_addresses,
            resolve_hostnames,
        }
    }

    /// Parse a target string into a ParsedTarget
    pub fn parse_target(&self, target: &str) -> Result<ParsedTarget> {
        let target = target.trim();
        if target.is_empty() {
            return Err(anyhow::anyhow!("Target cannot be empty"));
        }

        let (target_type, addresses) = if target.contains('/') {
            let network = IpNetwork::from_str(target)
                .with_context(|| format!("Invalid CIDR block: {}", target))?;
            let addresses = self
                .expand_cidr(network)?
                .into_iter()
                .map(|ip| SocketAddr::new(ip, self.default_port))
                .collect();
            (TargetType::Cidr, addresses)
        } else if let Ok(addr) = SocketAddr::from_str(target) {
            (TargetType::SocketAddress, vec![addr])
        } else if let Ok(ip) = IpAddr::from_str(target) {
            (TargetType::Address, vec![SocketAddr::new(ip, self.default_port)])
        } else if self.resolve_hostnames {
            (TargetType::Hostname, self.resolve_hostname(target)?)
        } else {
            return Err(anyhow::anyhow!("Invalid target format: {}", target));
        };

        Ok(ParsedTarget {
            original: target.to_string(),
            target_type,
            addresses,
        })
    }

    /// Expand a CIDR block into host addresses
    fn expand_cidr(&self, network: IpNetwork) -> Result<Vec<IpAddr>> {
        let host_bits = match network {
            IpNetwork::V4(net) => 32 - u32::from(net.prefix()),
            IpNetwork::V6(net) => 128 - u32::from(net.prefix()),
        };

        let too_large = host_bits >= 64 || (1u64 << host_bits) > self.max_cidr_addresses;
        if too_large {
            return Err(anyhow::anyhow!(
                "CIDR network too large: /{} (max {} addresses)",
                network.prefix(),
                self.max_cidr_addresses
            ));
        }

        let addresses = match network {
            // Network and broadcast addresses never host a device, except in /31 and /32
            IpNetwork::V4(net) if net.prefix() < 31 => net
                .iter()
                .filter(|ip| *ip != net.network() && *ip != net.broadcast())
                .map(IpAddr::V4)
                .collect(),
            IpNetwork::V4(net) => net.iter().map(IpAddr::V4).collect(),
            IpNetwork::V6(net) => net.iter().map(IpAddr::V6).collect(),
        };

        Ok(addresses)
    }

    /// Resolve `host` or `host:port` to socket addresses
    fn resolve_hostname(&self, target: &str) -> Result<Vec<SocketAddr>> {
        let (host, port) = match target.rsplit_once(':') {
            Some((host, port)) => {
                let port: u16 = port
                    .parse()
                    .with_context(|| format!("Invalid port in target: {}", target))?;
                (host, port)
            }
            None => (target, self.default_port),
        };

        let mut seen = HashSet::new();
        let addresses: Vec<SocketAddr> = (host, port)
            .to_socket_addrs()
            .with_context(|| format!("Failed to resolve hostname: {}", host))?
            .filter(|addr| seen.insert(*addr))
            .collect();

        if addresses.is_empty() {
            return Err(anyhow::anyhow!("No addresses resolved for hostname: {}", host));
        }

        Ok(addresses)
    }
}

/// Parse every target, splitting comma separated lists, and flatten the
/// result into unique socket addresses in input order
pub fn parse_target_list<S: AsRef<str>>(targets: &[S], parser: &TargetParser) -> Result<Vec<SocketAddr>> {
    let mut seen = HashSet::new();
    let mut addresses = Vec::new();

    for entry in targets {
        for target in entry.as_ref().split(',') {
            if target.trim().is_empty() {
                continue;
            }
            let parsed = parser.parse_target(target)?;
            log::debug!("{} expanded to {} addresses", parsed.original, parsed.addresses.len());
            addresses.extend(parsed.addresses.into_iter().filter(|addr| seen.insert(*addr)));
        }
    }

    Ok(addresses)
}
