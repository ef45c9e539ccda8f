//! DHCPv4 wire format (RFC 2131 §2, RFC 2132).
//!
//! A message is a fixed 236-byte BOOTP header (44 bytes of fields, 64-byte
//! `sname`, 128-byte `file`), the 4-byte magic cookie, and a TLV option
//! stream terminated by the END option. Encoding computes the exact output
//! size up front; parsing is defensive — every read is bounds-checked and a
//! stream without an END marker is treated as malformed.

use std::fmt;
use std::net::Ipv4Addr;

use crate::error::Error;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const DHCP_SERVER_PORT: u16 = 67;
pub const DHCP_CLIENT_PORT: u16 = 68;

pub const BOOTP_REQUEST: u8 = 1;
pub const BOOTP_REPLY: u8 = 2;

pub const HTYPE_ETHERNET: u8 = 1;
pub const HLEN_ETHERNET: u8 = 6;

/// Ask the server to broadcast its replies (RFC 2131 §4.1).
pub const FLAG_BROADCAST: u16 = 0x8000;

/// Magic cookie that starts the options section (RFC 2131 §3).
pub const MAGIC_COOKIE: [u8; 4] = [99, 130, 83, 99];

/// Offset of the first option: 236 fixed bytes + 4-byte cookie.
pub const OPTIONS_OFFSET: usize = 240;

/// Minimum acceptable packet: fixed header plus magic cookie.
pub const MIN_PACKET_SIZE: usize = OPTIONS_OFFSET;

// DHCP message types (option 53).
pub const DHCP_DISCOVER: u8 = 1;
pub const DHCP_OFFER: u8 = 2;
pub const DHCP_REQUEST: u8 = 3;
pub const DHCP_DECLINE: u8 = 4;
pub const DHCP_ACK: u8 = 5;
pub const DHCP_NAK: u8 = 6;
pub const DHCP_RELEASE: u8 = 7;
pub const DHCP_INFORM: u8 = 8;

// Option codes.
pub const OPT_PAD: u8 = 0;
pub const OPT_SUBNET_MASK: u8 = 1;
pub const OPT_ROUTER: u8 = 3;
pub const OPT_DNS: u8 = 6;
pub const OPT_HOSTNAME: u8 = 12;
pub const OPT_REQUESTED_IP: u8 = 50;
pub const OPT_LEASE_TIME: u8 = 51;
pub const OPT_MESSAGE_TYPE: u8 = 53;
pub const OPT_SERVER_ID: u8 = 54;
pub const OPT_PARAMETER_LIST: u8 = 55;
pub const OPT_RENEWAL_TIME: u8 = 58;
pub const OPT_REBINDING_TIME: u8 = 59;
pub const OPT_VENDOR_CLASS_ID: u8 = 60;
pub const OPT_END: u8 = 255;

/// Return a human-readable name for a DHCP message type.
pub fn message_type_name(t: u8) -> &'static str {
    match t {
        DHCP_DISCOVER => "DISCOVER",
        DHCP_OFFER => "OFFER",
        DHCP_REQUEST => "REQUEST",
        DHCP_DECLINE => "DECLINE",
        DHCP_ACK => "ACK",
        DHCP_NAK => "NAK",
        DHCP_RELEASE => "RELEASE",
        DHCP_INFORM => "INFORM",
        _ => "UNKNOWN",
    }
}

/// Read an IPv4 address from the first four bytes of an option value.
/// Callers must have checked the length.
pub(crate) fn ipv4_from(data: &[u8]) -> Ipv4Addr {
    Ipv4Addr::new(data[0], data[1], data[2], data[3])
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A single DHCP option (type-length-value), used when building messages.
#[derive(Clone, PartialEq, Eq)]
pub struct DhcpOption {
    pub code: u8,
    pub data: Vec<u8>,
}

impl fmt::Debug for DhcpOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Opt({}, {} bytes)", self.code, self.data.len())
    }
}

/// The fixed-format part of a DHCP message plus the options to encode.
///
/// `sname` and `file` are always zero on outgoing messages and ignored on
/// incoming ones, so they are not represented.
#[derive(Clone)]
pub struct Message {
    pub op: u8,
    pub htype: u8,
    pub hlen: u8,
    pub hops: u8,
    pub xid: u32,
    pub secs: u16,
    pub flags: u16,
    pub ciaddr: Ipv4Addr,
    pub yiaddr: Ipv4Addr,
    pub siaddr: Ipv4Addr,
    pub giaddr: Ipv4Addr,
    pub chaddr: [u8; 16],
    pub options: Vec<DhcpOption>,
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("op", &self.op)
            .field("xid", &format_args!("{:#010x}", self.xid))
            .field("ciaddr", &self.ciaddr)
            .field("yiaddr", &self.yiaddr)
            .field("options", &self.options)
            .finish()
    }
}

impl Message {
    /// Create a client request with default fields and the given link address.
    pub fn new_request(xid: u32, mac: &[u8; 6]) -> Self {
        let mut chaddr = [0u8; 16];
        chaddr[..6].copy_from_slice(mac);
        Self {
            op: BOOTP_REQUEST,
            htype: HTYPE_ETHERNET,
            hlen: HLEN_ETHERNET,
            hops: 0,
            xid,
            secs: 0,
            flags: 0,
            ciaddr: Ipv4Addr::UNSPECIFIED,
            yiaddr: Ipv4Addr::UNSPECIFIED,
            siaddr: Ipv4Addr::UNSPECIFIED,
            giaddr: Ipv4Addr::UNSPECIFIED,
            chaddr,
            options: Vec::new(),
        }
    }

    /// Whether this message is a BOOTP reply addressed to the client with
    /// the given transaction id and link address. The trailing ten bytes of
    /// `chaddr` are padding and not compared.
    pub fn is_reply_for(&self, xid: u32, mac: &[u8; 6]) -> bool {
        self.op == BOOTP_REPLY
            && self.xid == xid
            && self.hlen == HLEN_ETHERNET
            && self.chaddr[..6] == *mac
    }

    /// Exact encoded size: fixed fields, sname, file, cookie, one TLV per
    /// option, END.
    pub fn encoded_len(&self) -> usize {
        let opts: usize = self.options.iter().map(|o| 2 + o.data.len()).sum();
        OPTIONS_OFFSET + opts + 1
    }

    /// Serialize the message. The buffer is allocated at its exact final
    /// size in one step.
    pub fn encode(&self) -> Vec<u8> {
        let len = self.encoded_len();
        let mut buf = Vec::with_capacity(len);

        buf.push(self.op);
        buf.push(self.htype);
        buf.push(self.hlen);
        buf.push(self.hops);
        buf.extend_from_slice(&self.xid.to_be_bytes());
        buf.extend_from_slice(&self.secs.to_be_bytes());
        buf.extend_from_slice(&self.flags.to_be_bytes());
        buf.extend_from_slice(&self.ciaddr.octets());
        buf.extend_from_slice(&self.yiaddr.octets());
        buf.extend_from_slice(&self.siaddr.octets());
        buf.extend_from_slice(&self.giaddr.octets());
        buf.extend_from_slice(&self.chaddr);
        buf.resize(buf.len() + 64 + 128, 0); // sname + file
        buf.extend_from_slice(&MAGIC_COOKIE);

        for opt in &self.options {
            buf.push(opt.code);
            buf.push(opt.data.len() as u8);
            buf.extend_from_slice(&opt.data);
        }
        buf.push(OPT_END);

        debug_assert_eq!(buf.len(), len);
        buf
    }

    /// Parse the fixed header and validate the magic cookie.
    ///
    /// Returns the header and the raw option region; the caller walks the
    /// options with [`OptionsIter`]. `sname` and `file` are skipped.
    pub fn parse(data: &[u8]) -> Result<(Self, &[u8]), Error> {
        if data.len() < MIN_PACKET_SIZE {
            return Err(Error::Truncated(data.len()));
        }

        if data[236..240] != MAGIC_COOKIE {
            return Err(Error::BadCookie);
        }

        let mut chaddr = [0u8; 16];
        chaddr.copy_from_slice(&data[28..44]);

        let msg = Self {
            op: data[0],
            htype: data[1],
            hlen: data[2],
            hops: data[3],
            xid: u32::from_be_bytes([data[4], data[5], data[6], data[7]]),
            secs: u16::from_be_bytes([data[8], data[9]]),
            flags: u16::from_be_bytes([data[10], data[11]]),
            ciaddr: ipv4_from(&data[12..16]),
            yiaddr: ipv4_from(&data[16..20]),
            siaddr: ipv4_from(&data[20..24]),
            giaddr: ipv4_from(&data[24..28]),
            chaddr,
            options: Vec::new(),
        };

        Ok((msg, &data[OPTIONS_OFFSET..]))
    }
}

// ---------------------------------------------------------------------------
// Option stream
// ---------------------------------------------------------------------------

/// A borrowed view of one option in a received message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawOption<'a> {
    pub code: u8,
    pub data: &'a [u8],
}

/// Cursor over a received TLV option stream.
///
/// Yields options until the END marker; PAD bytes are skipped. After the
/// iterator is exhausted, [`OptionsIter::terminated`] tells whether END was
/// actually seen — a stream that merely ran out of bytes is malformed and
/// the whole packet must be dropped.
pub struct OptionsIter<'a> {
    data: &'a [u8],
    pos: usize,
    terminated: bool,
    failed: bool,
}

impl<'a> OptionsIter<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            terminated: false,
            failed: false,
        }
    }

    /// Whether the END option was reached.
    pub fn terminated(&self) -> bool {
        self.terminated
    }
}

impl<'a> Iterator for OptionsIter<'a> {
    type Item = Result<RawOption<'a>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.terminated || self.failed {
            return None;
        }
        loop {
            if self.pos >= self.data.len() {
                // Ran out of bytes without an END marker.
                return None;
            }
            let code = self.data[self.pos];
            match code {
                OPT_PAD => self.pos += 1,
                OPT_END => {
                    self.terminated = true;
                    return None;
                }
                _ => {
                    if self.pos + 1 >= self.data.len() {
                        self.failed = true;
                        return Some(Err(Error::TruncatedOption(code)));
                    }
                    let len = self.data[self.pos + 1] as usize;
                    let start = self.pos + 2;
                    if start + len > self.data.len() {
                        self.failed = true;
                        return Some(Err(Error::TruncatedOption(code)));
                    }
                    self.pos = start + len;
                    return Some(Ok(RawOption {
                        code,
                        data: &self.data[start..start + len],
                    }));
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_mac() -> [u8; 6] {
        [0x52, 0x54, 0x00, 0x12, 0x34, 0x56]
    }

    fn collect_options(region: &[u8]) -> Result<(Vec<(u8, Vec<u8>)>, bool), Error> {
        let mut iter = OptionsIter::new(region);
        let mut out = Vec::new();
        for item in iter.by_ref() {
            let opt = item?;
            out.push((opt.code, opt.data.to_vec()));
        }
        Ok((out, iter.terminated()))
    }

    #[test]
    fn test_encode_exact_length() {
        let mut msg = Message::new_request(0x12345678, &test_mac());
        msg.options.push(DhcpOption {
            code: OPT_MESSAGE_TYPE,
            data: vec![DHCP_DISCOVER],
        });
        msg.options.push(DhcpOption {
            code: OPT_PARAMETER_LIST,
            data: vec![OPT_SUBNET_MASK, OPT_ROUTER, OPT_DNS],
        });
        let bytes = msg.encode();
        // 240 fixed + (2+1) + (2+3) + 1 END
        assert_eq!(bytes.len(), 249);
        assert_eq!(bytes.len(), msg.encoded_len());
        assert_eq!(*bytes.last().unwrap(), OPT_END);
    }

    #[test]
    fn test_encode_parse_roundtrip() {
        let mut msg = Message::new_request(0xAABBCCDD, &test_mac());
        msg.ciaddr = Ipv4Addr::new(192, 0, 2, 50);
        msg.flags = FLAG_BROADCAST;
        msg.options.push(DhcpOption {
            code: OPT_MESSAGE_TYPE,
            data: vec![DHCP_REQUEST],
        });
        msg.options.push(DhcpOption {
            code: OPT_SERVER_ID,
            data: vec![192, 0, 2, 1],
        });
        msg.options.push(DhcpOption {
            code: OPT_REQUESTED_IP,
            data: vec![192, 0, 2, 50],
        });

        let bytes = msg.encode();
        let (parsed, region) = Message::parse(&bytes).unwrap();
        assert_eq!(parsed.op, BOOTP_REQUEST);
        assert_eq!(parsed.xid, 0xAABBCCDD);
        assert_eq!(parsed.flags, FLAG_BROADCAST);
        assert_eq!(parsed.ciaddr, Ipv4Addr::new(192, 0, 2, 50));
        assert_eq!(&parsed.chaddr[..6], &test_mac());

        let (opts, terminated) = collect_options(region).unwrap();
        assert!(terminated);
        assert_eq!(
            opts,
            vec![
                (OPT_MESSAGE_TYPE, vec![DHCP_REQUEST]),
                (OPT_SERVER_ID, vec![192, 0, 2, 1]),
                (OPT_REQUESTED_IP, vec![192, 0, 2, 50]),
            ]
        );
    }

    #[test]
    fn test_parse_too_short() {
        assert!(matches!(
            Message::parse(&[0u8; 100]),
            Err(Error::Truncated(100))
        ));
    }

    #[test]
    fn test_parse_bad_cookie() {
        let data = vec![0u8; 300];
        assert!(matches!(Message::parse(&data), Err(Error::BadCookie)));
    }

    #[test]
    fn test_is_reply_for() {
        let mut msg = Message::new_request(42, &test_mac());
        msg.op = BOOTP_REPLY;
        assert!(msg.is_reply_for(42, &test_mac()));
        assert!(!msg.is_reply_for(43, &test_mac()));
        assert!(!msg.is_reply_for(42, &[0u8; 6]));

        msg.hlen = 16;
        assert!(!msg.is_reply_for(42, &test_mac()));

        msg.hlen = HLEN_ETHERNET;
        msg.op = BOOTP_REQUEST;
        assert!(!msg.is_reply_for(42, &test_mac()));
    }

    #[test]
    fn test_options_pad_skipped() {
        let region = [OPT_PAD, OPT_PAD, 53, 1, DHCP_ACK, OPT_PAD, OPT_END];
        let (opts, terminated) = collect_options(&region).unwrap();
        assert!(terminated);
        assert_eq!(opts, vec![(53, vec![DHCP_ACK])]);
    }

    #[test]
    fn test_options_missing_end() {
        let region = [53u8, 1, DHCP_ACK, 51, 4, 0, 0, 14, 16];
        let (opts, terminated) = collect_options(&region).unwrap();
        assert_eq!(opts.len(), 2);
        assert!(!terminated);
    }

    #[test]
    fn test_options_truncated_value() {
        // Length claims 4 bytes but only 2 remain.
        let region = [51u8, 4, 0, 0];
        let result = collect_options(&region);
        assert!(matches!(result, Err(Error::TruncatedOption(51))));
    }

    #[test]
    fn test_options_truncated_length_byte() {
        let region = [51u8];
        let result = collect_options(&region);
        assert!(matches!(result, Err(Error::TruncatedOption(51))));
    }

    #[test]
    fn test_options_empty_region_not_terminated() {
        let (opts, terminated) = collect_options(&[]).unwrap();
        assert!(opts.is_empty());
        assert!(!terminated);
    }

    #[test]
    fn test_message_type_name() {
        assert_eq!(message_type_name(DHCP_DISCOVER), "DISCOVER");
        assert_eq!(message_type_name(DHCP_OFFER), "OFFER");
        assert_eq!(message_type_name(DHCP_ACK), "ACK");
        assert_eq!(message_type_name(DHCP_NAK), "NAK");
        assert_eq!(message_type_name(99), "UNKNOWN");
    }
}
