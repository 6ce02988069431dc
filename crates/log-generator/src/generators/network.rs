//! Synthetic client addresses.

use rand::Rng;
use std::net::Ipv4Addr;

/// Random host in `192.168.1.0/24`, excluding the network address.
pub fn generate_lan_address<R: Rng>(rng: &mut R) -> Ipv4Addr {
    Ipv4Addr::new(192, 168, 1, rng.gen_range(1..=255))
}
