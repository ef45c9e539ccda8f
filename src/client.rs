//! Per-interface DHCP client record and retry/backoff arithmetic.
//!
//! A [`Client`] carries the RFC 2131 state machine position for one managed
//! interface, the transaction id of the current exchange, and the deadline
//! bookkeeping the manager folds over to arm its single timer.

use std::fmt;
use std::net::Ipv4Addr;

/// Retries per state before giving up and falling back.
pub const MAX_ATTEMPTS: u32 = 3;

/// Base retransmission timeout in seconds, doubled per attempt.
pub const INITIAL_RETRY_SECS: u32 = 4;

/// Retransmission backoff cap in seconds.
pub const MAX_RETRY_SECS: u32 = 64;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Current state of a DHCP client (RFC 2131 §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DhcpState {
    /// Not negotiating; the only initial and terminal state.
    Disabled,
    /// Started but nothing sent yet.
    Init,
    /// DISCOVER scheduled or sent, waiting for an OFFER.
    Selecting,
    /// REQUEST sent after an OFFER, waiting for an ACK.
    Requesting,
    /// Lease active, next deadline is T1.
    Bound,
    /// T1 reached (or carrier lost), unicast REQUEST to the leasing server.
    Renewing,
    /// T2 reached, broadcast REQUEST.
    Rebinding,
}

impl fmt::Display for DhcpState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => write!(f, "DISABLED"),
            Self::Init => write!(f, "INIT"),
            Self::Selecting => write!(f, "SELECTING"),
            Self::Requesting => write!(f, "REQUESTING"),
            Self::Bound => write!(f, "BOUND"),
            Self::Renewing => write!(f, "RENEWING"),
            Self::Rebinding => write!(f, "REBINDING"),
        }
    }
}

// ---------------------------------------------------------------------------
// Backoff
// ---------------------------------------------------------------------------

/// Retransmission timeout for the given attempt count: exponential from
/// [`INITIAL_RETRY_SECS`], capped at [`MAX_RETRY_SECS`], with ±1s of jitter
/// drawn from `random` (RFC 2131 §4.1).
pub fn retransmit_timeout(attempts: u32, random: u32) -> u32 {
    // 4 << 4 already reaches the 64s cap, so the shift cannot overflow.
    let capped = (INITIAL_RETRY_SECS << attempts.min(4)).min(MAX_RETRY_SECS);
    let jitter = (random % 3) as i64 - 1;
    (capped as i64 + jitter) as u32
}

// ---------------------------------------------------------------------------
// Client record
// ---------------------------------------------------------------------------

/// Runtime state of the DHCP client on one interface.
#[derive(Debug, Clone)]
pub struct Client {
    /// Interface this client manages.
    pub ifindex: u32,

    /// State machine position.
    pub state: DhcpState,

    /// Transaction id of the current exchange; replies carrying any other
    /// xid are dropped.
    pub xid: u32,

    /// Messages sent in the current state, reset on every state change.
    pub attempts: u32,

    /// Wall-clock anchor of the armed timer (seconds).
    pub timer_start: u64,

    /// Duration of the armed timer (seconds); the deadline is
    /// `timer_start + request_time`.
    pub request_time: u32,

    /// When the current lease was bound (anchor for T1/T2 deadlines).
    pub lease_start: u64,

    /// Lease duration in seconds, as granted by the server.
    pub lease_time: u32,

    /// T1 in seconds; defaults to `lease_time / 2` when the server omits it.
    pub renewal_time: u32,

    /// T2 in seconds; defaults to `lease_time * 875 / 1000` when omitted.
    pub rebinding_time: u32,

    /// The server the current exchange is with.
    pub server_id: Ipv4Addr,

    /// Address offered to / leased by this client.
    pub requested_ip: Ipv4Addr,

    /// Whether the leased address is currently installed on the interface.
    pub addr_installed: bool,

    /// Administrative carrier state; a down interface contributes no
    /// deadline and sends nothing.
    pub iface_up: bool,
}

impl Client {
    pub fn new(ifindex: u32, xid: u32) -> Self {
        Self {
            ifindex,
            state: DhcpState::Init,
            xid,
            attempts: 0,
            timer_start: 0,
            request_time: 0,
            lease_start: 0,
            lease_time: 0,
            renewal_time: 0,
            rebinding_time: 0,
            server_id: Ipv4Addr::UNSPECIFIED,
            requested_ip: Ipv4Addr::UNSPECIFIED,
            addr_installed: false,
            iface_up: true,
        }
    }

    /// Change state, resetting the attempt counter.
    pub fn set_state(&mut self, state: DhcpState) {
        if self.state != state {
            log::debug!("ifindex {}: {} -> {}", self.ifindex, self.state, state);
            self.state = state;
            self.attempts = 0;
        }
    }

    /// Arm this client's timer for `seconds` from `now`.
    pub fn arm(&mut self, now: u64, seconds: u32) {
        self.timer_start = now;
        self.request_time = seconds;
    }

    /// Absolute deadline of the armed timer.
    pub fn deadline(&self) -> u64 {
        self.timer_start + u64::from(self.request_time)
    }

    /// Seconds until the deadline, zero if it has passed.
    pub fn timeleft(&self, now: u64) -> u64 {
        self.deadline().saturating_sub(now)
    }

    /// Absolute T2 deadline of the current lease.
    pub fn rebinding_deadline(&self) -> u64 {
        self.lease_start + u64::from(self.rebinding_time)
    }

    /// Forget everything learned from the current/previous server. Done on
    /// every (re)entry into SELECTING.
    pub fn clear_lease(&mut self) {
        self.server_id = Ipv4Addr::UNSPECIFIED;
        self.requested_ip = Ipv4Addr::UNSPECIFIED;
        self.lease_time = 0;
        self.renewal_time = 0;
        self.rebinding_time = 0;
        self.lease_start = 0;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
