//! Collaborator trait the protocol engine drives its host system through.
//!
//! The engine itself owns no sockets, clocks, or interface tables. The
//! embedder supplies a [`Platform`] implementation that sends UDP payloads,
//! manipulates interface addressing, and provides time and randomness. Tests
//! substitute a recording fake for the whole trait.

use std::net::Ipv4Addr;

use crate::error::Error;

pub trait Platform {
    /// Monotonic-enough wall clock in whole seconds. All deadlines are
    /// computed against this clock.
    fn now(&self) -> u64;

    /// Uniform random value, used for transaction ids and timer jitter.
    fn random_u32(&mut self) -> u32;

    /// MAC address of the given interface.
    fn link_address(&self, ifindex: u32) -> [u8; 6];

    /// Send a DHCP payload out of `ifindex` as a UDP datagram from port 68
    /// to port 67 at `dest`. `Ipv4Addr::BROADCAST` means link broadcast.
    fn transmit(&mut self, ifindex: u32, dest: Ipv4Addr, payload: &[u8]) -> Result<(), Error>;

    /// Install `addr` on the interface with a validity of `lease_seconds`.
    fn set_interface_address(
        &mut self,
        ifindex: u32,
        addr: Ipv4Addr,
        lease_seconds: u32,
    ) -> Result<(), Error>;

    /// Remove a previously installed address.
    fn remove_interface_address(&mut self, ifindex: u32, addr: Ipv4Addr) -> Result<(), Error>;

    fn set_interface_netmask(&mut self, ifindex: u32, netmask: Ipv4Addr) -> Result<(), Error>;

    /// Set the default gateway for the interface. `Ipv4Addr::UNSPECIFIED`
    /// clears it.
    fn set_interface_gateway(&mut self, ifindex: u32, gateway: Ipv4Addr) -> Result<(), Error>;

    /// A DNS server learned from a lease. Default implementation ignores it.
    fn reconfigure_dns(&mut self, _addr: Ipv4Addr) {}
}
