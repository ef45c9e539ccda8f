//! DHCPv4 client manager: one state machine per interface, one timer.
//!
//! The manager owns every per-interface [`Client`], the option-callback
//! registry, and a queue of lifecycle events. It is driven from the outside
//! by three kinds of input: control calls (`start`/`stop`, interface
//! up/down), received packets (`handle_packet`), and time (`tick`). The
//! embedder sleeps until [`DhcpManager::next_deadline`], calls `tick`, and
//! repeats.

use std::collections::HashMap;
use std::fmt;
use std::mem;
use std::net::Ipv4Addr;

use crate::client::{Client, DhcpState, MAX_ATTEMPTS, retransmit_timeout};
use crate::error::Error;
use crate::options::{OptionHandler, OptionRegistry};
use crate::platform::Platform;
use crate::wire::{
    DHCP_ACK, DHCP_DISCOVER, DHCP_NAK, DHCP_OFFER, DHCP_RELEASE, DHCP_REQUEST, DhcpOption,
    FLAG_BROADCAST, Message, OPT_DNS, OPT_HOSTNAME, OPT_LEASE_TIME, OPT_MESSAGE_TYPE,
    OPT_PARAMETER_LIST, OPT_REBINDING_TIME, OPT_RENEWAL_TIME, OPT_REQUESTED_IP, OPT_ROUTER,
    OPT_SERVER_ID, OPT_SUBNET_MASK, OPT_VENDOR_CLASS_ID, OptionsIter, ipv4_from,
    message_type_name,
};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Knobs shared by every client the manager runs.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Upper bound in seconds of the random delay before the first DISCOVER
    /// of an exchange (RFC 2131 §4.4.1).
    pub initial_delay_max: u32,

    /// Whether the host can receive unicast replies before an address is
    /// configured. When false, requests carry the BROADCAST flag.
    pub request_unicast: bool,

    /// Host name to offer to the server (option 12).
    pub hostname: Option<String>,

    /// Vendor class identifier (option 60).
    pub vendor_class_id: Option<String>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            initial_delay_max: 10,
            request_unicast: false,
            hostname: None,
            vendor_class_id: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Lifecycle notifications queued for the embedder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DhcpEvent {
    Started {
        ifindex: u32,
    },
    Stopped {
        ifindex: u32,
    },
    LeaseBound {
        ifindex: u32,
        address: Ipv4Addr,
        lease_time: u32,
        renewal_time: u32,
        rebinding_time: u32,
    },
    LeaseLost {
        ifindex: u32,
        address: Ipv4Addr,
    },
}

impl fmt::Display for DhcpEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started { ifindex } => write!(f, "DHCP started on ifindex {ifindex}"),
            Self::Stopped { ifindex } => write!(f, "DHCP stopped on ifindex {ifindex}"),
            Self::LeaseBound {
                ifindex,
                address,
                lease_time,
                renewal_time,
                rebinding_time,
            } => write!(
                f,
                "lease {address} bound on ifindex {ifindex} for {lease_time}s \
                 (renew {renewal_time}s, rebind {rebinding_time}s)"
            ),
            Self::LeaseLost { ifindex, address } => {
                write!(f, "lease {address} lost on ifindex {ifindex}")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Reply options
// ---------------------------------------------------------------------------

/// Core options extracted from a server reply while walking its option
/// stream. Application options go to the registry instead.
#[derive(Debug, Default)]
struct ReplyOptions {
    message_type: Option<u8>,
    server_id: Option<Ipv4Addr>,
    router: Option<Ipv4Addr>,
    lease_time: Option<u32>,
    renewal_time: Option<u32>,
    rebinding_time: Option<u32>,
}

fn time_option(code: u8, data: &[u8]) -> Result<u32, Error> {
    if data.len() != 4 {
        return Err(Error::BadOptionLength {
            code,
            len: data.len(),
        });
    }
    let secs = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
    if secs == 0 {
        return Err(Error::ZeroTime(code));
    }
    Ok(secs)
}

// ---------------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------------

pub struct DhcpManager<P: Platform> {
    pub platform: P,
    pub config: ManagerConfig,
    clients: HashMap<u32, Client>,
    registry: OptionRegistry,
    events: Vec<DhcpEvent>,
}

impl<P: Platform> DhcpManager<P> {
    pub fn new(platform: P, config: ManagerConfig) -> Self {
        Self {
            platform,
            config,
            clients: HashMap::new(),
            registry: OptionRegistry::new(),
            events: Vec::new(),
        }
    }

    // -- control -----------------------------------------------------------

    /// Begin negotiating on `ifindex`. No-op if a client is already running
    /// there.
    pub fn start(&mut self, ifindex: u32) {
        if self.clients.contains_key(&ifindex) {
            log::debug!("ifindex {ifindex}: DHCP client already running");
            return;
        }
        let xid = self.platform.random_u32();
        let now = self.platform.now();
        let mut client = Client::new(ifindex, xid);
        client.arm(now, 0);
        self.clients.insert(ifindex, client);
        self.events.push(DhcpEvent::Started { ifindex });
        log::info!("ifindex {ifindex}: DHCP negotiation started");
    }

    /// Stop the client on `ifindex`, releasing any held lease to its server
    /// on a best-effort basis and removing the installed address.
    pub fn stop(&mut self, ifindex: u32) {
        let Some(client) = self.clients.remove(&ifindex) else {
            return;
        };

        let has_lease = matches!(
            client.state,
            DhcpState::Bound | DhcpState::Renewing | DhcpState::Rebinding
        );
        if has_lease && !client.server_id.is_unspecified() && !client.requested_ip.is_unspecified()
        {
            let mac = self.platform.link_address(ifindex);
            let mut msg = Message::new_request(client.xid, &mac);
            msg.ciaddr = client.requested_ip;
            msg.options.push(DhcpOption {
                code: OPT_MESSAGE_TYPE,
                data: vec![DHCP_RELEASE],
            });
            msg.options.push(DhcpOption {
                code: OPT_SERVER_ID,
                data: client.server_id.octets().to_vec(),
            });
            if let Err(err) = self
                .platform
                .transmit(ifindex, client.server_id, &msg.encode())
            {
                log::warn!("ifindex {ifindex}: failed to send RELEASE: {err}");
            }
        }

        if client.addr_installed {
            if let Err(err) = self
                .platform
                .remove_interface_address(ifindex, client.requested_ip)
            {
                log::warn!("ifindex {ifindex}: failed to remove address: {err}");
            }
            self.events.push(DhcpEvent::LeaseLost {
                ifindex,
                address: client.requested_ip,
            });
        }

        self.events.push(DhcpEvent::Stopped { ifindex });
        log::info!("ifindex {ifindex}: DHCP client stopped");
    }

    /// Release the current lease and negotiate from scratch.
    pub fn restart(&mut self, ifindex: u32) {
        self.stop(ifindex);
        self.start(ifindex);
    }

    /// Carrier regained. The client resumes from where it was, due
    /// immediately.
    pub fn interface_up(&mut self, ifindex: u32) {
        let now = self.platform.now();
        let Some(client) = self.clients.get_mut(&ifindex) else {
            return;
        };
        if client.iface_up {
            return;
        }
        client.iface_up = true;
        client.arm(now, 0);
        log::info!(
            "ifindex {ifindex}: carrier up, resuming in state {}",
            client.state
        );
    }

    /// Carrier lost. The installed address is withdrawn and the client
    /// parks in RENEWING so a later `interface_up` re-validates the lease
    /// with its server first.
    pub fn interface_down(&mut self, ifindex: u32) {
        let now = self.platform.now();
        let Some(client) = self.clients.get_mut(&ifindex) else {
            return;
        };
        client.iface_up = false;
        log::info!("ifindex {ifindex}: carrier down in state {}", client.state);

        if client.addr_installed {
            let address = client.requested_ip;
            client.addr_installed = false;
            client.set_state(DhcpState::Renewing);
            client.xid = client.xid.wrapping_add(1);
            client.arm(now, 0);
            if let Err(err) = self.platform.remove_interface_address(ifindex, address) {
                log::warn!("ifindex {ifindex}: failed to remove address: {err}");
            }
            self.events.push(DhcpEvent::LeaseLost { ifindex, address });
        }
    }

    // -- option callbacks --------------------------------------------------

    /// Register a handler for option `code`; the code is added to the
    /// parameter-request list. Values are truncated to `max_len` bytes.
    pub fn add_option_callback(
        &mut self,
        code: u8,
        max_len: usize,
        handler: impl OptionHandler + 'static,
    ) {
        self.registry.add(code, max_len, Box::new(handler));
    }

    pub fn remove_option_callback(&mut self, code: u8) {
        self.registry.remove(code);
    }

    // -- timers ------------------------------------------------------------

    /// Run every client whose deadline has passed, earliest first, then
    /// return the new next deadline.
    pub fn tick(&mut self) -> Option<u64> {
        let now = self.platform.now();
        let mut due: Vec<(u64, u32)> = self
            .clients
            .values()
            .filter(|c| c.iface_up && c.state != DhcpState::Disabled && c.deadline() <= now)
            .map(|c| (c.deadline(), c.ifindex))
            .collect();
        due.sort_unstable();
        for (_, ifindex) in due {
            self.timer_action(ifindex, now);
        }
        self.next_deadline()
    }

    /// Earliest deadline over all active clients; `None` when nothing is
    /// waiting on time.
    pub fn next_deadline(&self) -> Option<u64> {
        self.clients
            .values()
            .filter(|c| c.iface_up && c.state != DhcpState::Disabled)
            .map(|c| c.deadline())
            .min()
    }

    pub fn state_of(&self, ifindex: u32) -> Option<DhcpState> {
        self.clients.get(&ifindex).map(|c| c.state)
    }

    /// Drain queued lifecycle events.
    pub fn take_events(&mut self) -> Vec<DhcpEvent> {
        mem::take(&mut self.events)
    }

    fn timer_action(&mut self, ifindex: u32, now: u64) {
        let Some(client) = self.clients.get_mut(&ifindex) else {
            return;
        };
        match client.state {
            DhcpState::Disabled => {}
            DhcpState::Init => self.enter_selecting(ifindex, now),
            DhcpState::Selecting => self.send_discover(ifindex, now),
            DhcpState::Requesting => {
                if client.attempts >= MAX_ATTEMPTS {
                    log::warn!("ifindex {ifindex}: no ACK after {MAX_ATTEMPTS} requests");
                    self.enter_selecting(ifindex, now);
                } else {
                    self.send_request(ifindex, now);
                }
            }
            DhcpState::Bound => {
                // T1 expired.
                client.set_state(DhcpState::Renewing);
                client.xid = client.xid.wrapping_add(1);
                self.send_request(ifindex, now);
            }
            DhcpState::Renewing => {
                if now >= client.rebinding_deadline() || client.attempts >= MAX_ATTEMPTS {
                    client.set_state(DhcpState::Rebinding);
                }
                self.send_request(ifindex, now);
            }
            DhcpState::Rebinding => {
                if client.attempts >= MAX_ATTEMPTS {
                    log::warn!("ifindex {ifindex}: lease expired without renewal");
                    self.drop_lease(ifindex);
                    self.enter_selecting(ifindex, now);
                } else {
                    self.send_request(ifindex, now);
                }
            }
        }
    }

    // -- sending -----------------------------------------------------------

    /// Start a fresh exchange: new transaction id, forgotten lease, and the
    /// once-only random delay before the first DISCOVER.
    fn enter_selecting(&mut self, ifindex: u32, now: u64) {
        let random = self.platform.random_u32();
        let Some(client) = self.clients.get_mut(&ifindex) else {
            return;
        };
        client.set_state(DhcpState::Selecting);
        client.clear_lease();
        client.xid = client.xid.wrapping_add(1);
        let delay = 1 + random % self.config.initial_delay_max.max(1);
        client.arm(now, delay);
        log::debug!("ifindex {ifindex}: first DISCOVER in {delay}s");
    }

    fn send_discover(&mut self, ifindex: u32, now: u64) {
        let random = self.platform.random_u32();
        let mac = self.platform.link_address(ifindex);
        let Some(client) = self.clients.get_mut(&ifindex) else {
            return;
        };
        let timeout = retransmit_timeout(client.attempts, random);
        client.attempts += 1;
        client.arm(now, timeout);
        let msg = build_message(
            &self.config,
            &self.registry,
            &mac,
            client.xid,
            DHCP_DISCOVER,
            Ipv4Addr::UNSPECIFIED,
            None,
            None,
        );
        log::debug!(
            "ifindex {ifindex}: sending DISCOVER (xid {:#010x}), retry in {timeout}s",
            client.xid
        );
        if let Err(err) = self
            .platform
            .transmit(ifindex, Ipv4Addr::BROADCAST, &msg.encode())
        {
            log::warn!("ifindex {ifindex}: failed to send DISCOVER: {err}");
        }
    }

    fn send_request(&mut self, ifindex: u32, now: u64) {
        let random = self.platform.random_u32();
        let mac = self.platform.link_address(ifindex);
        let Some(client) = self.clients.get_mut(&ifindex) else {
            return;
        };
        let timeout = retransmit_timeout(client.attempts, random);
        client.attempts += 1;
        client.arm(now, timeout);

        // RFC 2131 §4.3.2: which fields a REQUEST carries depends on state.
        let (dest, ciaddr, server_id, requested_ip) = match client.state {
            DhcpState::Requesting => (
                Ipv4Addr::BROADCAST,
                Ipv4Addr::UNSPECIFIED,
                Some(client.server_id),
                Some(client.requested_ip),
            ),
            DhcpState::Renewing => (client.server_id, client.requested_ip, None, None),
            _ => (Ipv4Addr::BROADCAST, client.requested_ip, None, None),
        };
        let msg = build_message(
            &self.config,
            &self.registry,
            &mac,
            client.xid,
            DHCP_REQUEST,
            ciaddr,
            server_id,
            requested_ip,
        );
        log::debug!(
            "ifindex {ifindex}: sending REQUEST to {dest} in state {}, retry in {timeout}s",
            client.state
        );
        if let Err(err) = self.platform.transmit(ifindex, dest, &msg.encode()) {
            log::warn!("ifindex {ifindex}: failed to send REQUEST: {err}");
        }
    }

    // -- receiving ---------------------------------------------------------

    /// Feed a received UDP payload to the client on `ifindex`. Returns
    /// whether the packet was accepted and advanced the state machine.
    pub fn handle_packet(&mut self, ifindex: u32, data: &[u8], src: Ipv4Addr) -> bool {
        let Some(client) = self.clients.get(&ifindex) else {
            log::trace!("ifindex {ifindex}: packet but no DHCP client");
            return false;
        };
        if !client.iface_up || client.state == DhcpState::Disabled {
            return false;
        }
        let xid = client.xid;

        let (msg, options_region) = match Message::parse(data) {
            Ok(parsed) => parsed,
            Err(err) => {
                log::debug!("ifindex {ifindex}: dropping packet: {err}");
                return false;
            }
        };
        let mac = self.platform.link_address(ifindex);
        if !msg.is_reply_for(xid, &mac) {
            log::trace!(
                "ifindex {ifindex}: reply for another exchange (xid {:#010x})",
                msg.xid
            );
            return false;
        }

        let reply = match self.process_options(ifindex, options_region) {
            Ok(reply) => reply,
            Err(err) => {
                log::warn!("ifindex {ifindex}: malformed reply dropped: {err}");
                return false;
            }
        };
        let Some(message_type) = reply.message_type else {
            log::debug!("ifindex {ifindex}: reply without message type");
            return false;
        };

        self.handle_reply(ifindex, &msg, message_type, reply, src)
    }

    /// Walk the option stream: core options are validated and extracted,
    /// address configuration side effects applied as encountered, everything
    /// else dispatched to the registry. A stream that never reaches END
    /// fails the whole packet.
    fn process_options(&mut self, ifindex: u32, region: &[u8]) -> Result<ReplyOptions, Error> {
        let mut reply = ReplyOptions::default();
        let mut iter = OptionsIter::new(region);
        for item in iter.by_ref() {
            let opt = item?;
            // Callbacks see every option they registered for, including
            // ones the core also interprets.
            let dispatched = self.registry.dispatch(ifindex, opt.code, opt.data);
            match opt.code {
                OPT_MESSAGE_TYPE => {
                    if opt.data.len() != 1 {
                        return Err(Error::BadOptionLength {
                            code: opt.code,
                            len: opt.data.len(),
                        });
                    }
                    reply.message_type = Some(opt.data[0]);
                }
                OPT_SERVER_ID => {
                    if opt.data.len() != 4 {
                        return Err(Error::BadOptionLength {
                            code: opt.code,
                            len: opt.data.len(),
                        });
                    }
                    reply.server_id = Some(ipv4_from(opt.data));
                }
                OPT_SUBNET_MASK => {
                    if opt.data.len() != 4 {
                        return Err(Error::BadOptionLength {
                            code: opt.code,
                            len: opt.data.len(),
                        });
                    }
                    let netmask = ipv4_from(opt.data);
                    if let Err(err) = self.platform.set_interface_netmask(ifindex, netmask) {
                        log::warn!("ifindex {ifindex}: failed to set netmask {netmask}: {err}");
                    }
                }
                OPT_ROUTER => {
                    if opt.data.len() < 4 {
                        return Err(Error::BadOptionLength {
                            code: opt.code,
                            len: opt.data.len(),
                        });
                    }
                    // Only the first router is used.
                    let gateway = ipv4_from(opt.data);
                    reply.router = Some(gateway);
                    if let Err(err) = self.platform.set_interface_gateway(ifindex, gateway) {
                        log::warn!("ifindex {ifindex}: failed to set gateway {gateway}: {err}");
                    }
                }
                OPT_DNS => {
                    if opt.data.len() < 4 {
                        return Err(Error::BadOptionLength {
                            code: opt.code,
                            len: opt.data.len(),
                        });
                    }
                    self.platform.reconfigure_dns(ipv4_from(opt.data));
                }
                OPT_LEASE_TIME => reply.lease_time = Some(time_option(opt.code, opt.data)?),
                OPT_RENEWAL_TIME => reply.renewal_time = Some(time_option(opt.code, opt.data)?),
                OPT_REBINDING_TIME => {
                    reply.rebinding_time = Some(time_option(opt.code, opt.data)?)
                }
                _ => {
                    if !dispatched {
                        log::trace!("ifindex {ifindex}: ignoring option {}", opt.code);
                    }
                }
            }
        }
        if !iter.terminated() {
            return Err(Error::MissingEnd);
        }
        Ok(reply)
    }

    fn handle_reply(
        &mut self,
        ifindex: u32,
        msg: &Message,
        message_type: u8,
        reply: ReplyOptions,
        src: Ipv4Addr,
    ) -> bool {
        let now = self.platform.now();
        let Some(client) = self.clients.get_mut(&ifindex) else {
            return false;
        };

        match (client.state, message_type) {
            (DhcpState::Selecting, DHCP_OFFER) => {
                let Some(server_id) = reply.server_id else {
                    log::warn!("ifindex {ifindex}: OFFER without server identifier");
                    return false;
                };
                if msg.yiaddr.is_unspecified() {
                    log::warn!("ifindex {ifindex}: OFFER without address");
                    return false;
                }
                client.requested_ip = msg.yiaddr;
                client.server_id = server_id;
                if let Some(lease) = reply.lease_time {
                    client.lease_time = lease;
                }
                log::info!("ifindex {ifindex}: offered {} by {server_id}", msg.yiaddr);
                client.set_state(DhcpState::Requesting);
                // An offer that names no router revokes any stale default
                // route from a previous lease.
                if reply.router.is_none()
                    && let Err(err) = self
                        .platform
                        .set_interface_gateway(ifindex, Ipv4Addr::UNSPECIFIED)
                {
                    log::warn!("ifindex {ifindex}: failed to clear gateway: {err}");
                }
                self.send_request(ifindex, now);
                true
            }

            (DhcpState::Requesting, DHCP_ACK) => {
                let Some(lease) = reply
                    .lease_time
                    .or_else(|| (client.lease_time != 0).then_some(client.lease_time))
                else {
                    log::warn!("ifindex {ifindex}: ACK without usable lease time");
                    return false;
                };
                let address = client.requested_ip;
                if let Err(err) = self.platform.set_interface_address(ifindex, address, lease) {
                    log::warn!("ifindex {ifindex}: failed to install {address}: {err}");
                    return false;
                }
                if let Some(client) = self.clients.get_mut(&ifindex) {
                    client.addr_installed = true;
                }
                self.enter_bound(ifindex, lease, &reply, now);
                true
            }

            (DhcpState::Renewing | DhcpState::Rebinding, DHCP_ACK) => {
                let Some(lease) = reply
                    .lease_time
                    .or_else(|| (client.lease_time != 0).then_some(client.lease_time))
                else {
                    log::warn!("ifindex {ifindex}: ACK without usable lease time");
                    return false;
                };
                // Re-install only after a carrier loss withdrew the address.
                if !client.addr_installed {
                    let address = client.requested_ip;
                    if let Err(err) = self.platform.set_interface_address(ifindex, address, lease)
                    {
                        log::warn!("ifindex {ifindex}: failed to install {address}: {err}");
                        return false;
                    }
                    if let Some(client) = self.clients.get_mut(&ifindex) {
                        client.addr_installed = true;
                    }
                }
                self.enter_bound(ifindex, lease, &reply, now);
                true
            }

            (DhcpState::Requesting, DHCP_NAK) => {
                if src != client.server_id {
                    log::warn!("ifindex {ifindex}: NAK from {src}, not our server, ignored");
                    return false;
                }
                log::info!("ifindex {ifindex}: request NAKed, restarting discovery");
                self.enter_selecting(ifindex, now);
                true
            }

            (DhcpState::Renewing | DhcpState::Rebinding, DHCP_NAK) => {
                log::info!("ifindex {ifindex}: lease NAKed by {src}, restarting discovery");
                self.drop_lease(ifindex);
                self.enter_selecting(ifindex, now);
                true
            }

            (state, other) => {
                log::debug!(
                    "ifindex {ifindex}: ignoring {} in state {state}",
                    message_type_name(other)
                );
                false
            }
        }
    }

    /// Record the lease from an ACK, install T1/T2 defaults where the server
    /// was silent, and arm the renewal timer.
    fn enter_bound(&mut self, ifindex: u32, lease: u32, reply: &ReplyOptions, now: u64) {
        let Some(client) = self.clients.get_mut(&ifindex) else {
            return;
        };
        let renewal = reply.renewal_time.unwrap_or(lease / 2);
        let rebinding = reply
            .rebinding_time
            .unwrap_or((u64::from(lease) * 875 / 1000) as u32);

        client.lease_time = lease;
        client.renewal_time = renewal;
        client.rebinding_time = rebinding;
        client.lease_start = now;
        client.set_state(DhcpState::Bound);
        client.arm(now, renewal.min(rebinding));

        let address = client.requested_ip;
        log::info!(
            "ifindex {ifindex}: bound {address} for {lease}s (renew {renewal}s, rebind {rebinding}s)"
        );
        self.events.push(DhcpEvent::LeaseBound {
            ifindex,
            address,
            lease_time: lease,
            renewal_time: renewal,
            rebinding_time: rebinding,
        });
    }

    /// Withdraw the installed address and report the lease as lost.
    fn drop_lease(&mut self, ifindex: u32) {
        let Some(client) = self.clients.get_mut(&ifindex) else {
            return;
        };
        if !client.addr_installed {
            return;
        }
        let address = client.requested_ip;
        client.addr_installed = false;
        if let Err(err) = self.platform.remove_interface_address(ifindex, address) {
            log::warn!("ifindex {ifindex}: failed to remove address: {err}");
        }
        self.events.push(DhcpEvent::LeaseLost { ifindex, address });
    }
}

/// Assemble an outgoing client message. Option order is fixed: message
/// type, server identifier, requested address, parameter request list (on
/// DISCOVER only), host name, vendor class.
fn build_message(
    config: &ManagerConfig,
    registry: &OptionRegistry,
    mac: &[u8; 6],
    xid: u32,
    message_type: u8,
    ciaddr: Ipv4Addr,
    server_id: Option<Ipv4Addr>,
    requested_ip: Option<Ipv4Addr>,
) -> Message {
    let mut msg = Message::new_request(xid, mac);
    msg.ciaddr = ciaddr;
    if !config.request_unicast && ciaddr.is_unspecified() {
        msg.flags = FLAG_BROADCAST;
    }
    msg.options.push(DhcpOption {
        code: OPT_MESSAGE_TYPE,
        data: vec![message_type],
    });
    if let Some(server_id) = server_id {
        msg.options.push(DhcpOption {
            code: OPT_SERVER_ID,
            data: server_id.octets().to_vec(),
        });
    }
    if let Some(requested_ip) = requested_ip {
        msg.options.push(DhcpOption {
            code: OPT_REQUESTED_IP,
            data: requested_ip.octets().to_vec(),
        });
    }
    if message_type == DHCP_DISCOVER {
        msg.options.push(DhcpOption {
            code: OPT_PARAMETER_LIST,
            data: registry.request_list().to_vec(),
        });
    }
    if let Some(hostname) = &config.hostname {
        msg.options.push(DhcpOption {
            code: OPT_HOSTNAME,
            data: hostname.as_bytes().to_vec(),
        });
    }
    if let Some(vendor) = &config.vendor_class_id {
        msg.options.push(DhcpOption {
            code: OPT_VENDOR_CLASS_ID,
            data: vendor.as_bytes().to_vec(),
        });
    }
    msg
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
