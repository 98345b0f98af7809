use crate::cursor;
use crate::protocols::dns::{self, DNS};
use crate::protocols::ethernet::ether_type::EtherType;
use crate::protocols::ethernet::{self, Ethernet};
use crate::protocols::http::{self, HTTP};
use crate::protocols::ip::IpProtocol;
use crate::protocols::ipv4::{self, IPv4};
use crate::protocols::ipv6::{self, IPv6};
use crate::protocols::irc::{self, IRC};
use crate::protocols::tcp::{self, TCP};
use crate::protocols::telnet::{self, Telnet};
use crate::protocols::udp::{self, UDP};
use serde::{Deserialize, Serialize};

/// One decoded frame: a fixed set of independently-present layer records.
/// At most one of {ipv4, ipv6} and one of {tcp, udp} is set; application
/// records are set when the transport payload matched a recognized grammar.
/// `payload` always holds the bytes after the last recognized header.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Packet {
    pub length: usize,

    pub ethernet: Option<Ethernet>,

    pub ipv4: Option<IPv4>,
    pub ipv6: Option<IPv6>,

    pub tcp: Option<TCP>,
    pub udp: Option<UDP>,

    pub dns: Option<DNS>,
    pub http: Option<HTTP>,
    pub irc: Option<IRC>,
    pub telnet: Option<Telnet>,

    pub payload: Vec<u8>,
}

impl Packet {
    /// Decodes one frame. A pure function of the frame bytes: each layer
    /// parser either contributes a record or stops the chain, and whatever
    /// was decoded up to that point is kept. Never fails and never panics,
    /// whatever the byte content.
    pub fn parse(bytes: &[u8], link_type: &pcap::Linktype) -> Self {
        let mut packet = Self {
            length: bytes.len(),
            payload: bytes.to_vec(),
            ..Self::default()
        };

        // Only Ethernet captures are dissected
        if *link_type != pcap::Linktype(1) {
            return packet;
        }

        let rest = match ethernet::parse(bytes) {
            Ok((rest, protocol)) => {
                packet.ethernet = Some(protocol);
                packet.payload = rest.to_vec();
                rest
            },
            Err(_) => return packet,
        };

        let ether_type = match &packet.ethernet {
            Some(ethernet) => ethernet.ether_type,
            None => return packet,
        };
        let rest = match ether_type {
            EtherType::Ipv4 => match ipv4::parse(rest) {
                Ok((payload, protocol)) => {
                    packet.ipv4 = Some(protocol);
                    payload
                },
                Err(_) => return packet,
            },
            EtherType::Ipv6 => match ipv6::parse(rest) {
                Ok((payload, protocol)) => {
                    packet.ipv6 = Some(protocol);
                    payload
                },
                Err(_) => return packet,
            },
            _ => return packet,
        };
        packet.payload = rest.to_vec();

        let next_protocol = match (&packet.ipv4, &packet.ipv6) {
            (Some(ipv4), _) => ipv4.protocol,
            (_, Some(ipv6)) => ipv6.next_header,
            _ => return packet,
        };
        let rest = match next_protocol {
            IpProtocol::Tcp => match tcp::parse(rest) {
                Ok((payload, protocol)) => {
                    packet.tcp = Some(protocol);
                    payload
                },
                Err(_) => return packet,
            },
            IpProtocol::Udp => match udp::parse(rest) {
                Ok((payload, protocol)) => {
                    packet.udp = Some(protocol);
                    payload
                },
                Err(_) => return packet,
            },
            _ => return packet,
        };
        packet.payload = rest.to_vec();

        packet.parse_application();

        packet
    }

    /// Application dispatch: port first, content sniffing second, fixed
    /// priority. A parser whose precondition fails just leaves its record
    /// absent; the transport layers stay valid.
    fn parse_application(&mut self) {
        let (source_port, destination_port, over_tcp) = match (&self.tcp, &self.udp) {
            (Some(tcp), _) => (tcp.source_port, tcp.destination_port, true),
            (_, Some(udp)) => (udp.source_port, udp.destination_port, false),
            _ => return,
        };
        let payload = self.payload.clone();

        if source_port == dns::PORT || destination_port == dns::PORT {
            // Over TCP the message carries a 2-byte length prefix
            let message = match over_tcp {
                true => match cursor::be_u16(&payload) {
                    Ok((message, declared)) if declared as usize <= payload.len() => {
                        message
                    },
                    _ => return,
                },
                false => &payload[..],
            };

            if let Ok((_, protocol)) = dns::parse(message) {
                self.dns = Some(protocol);
            }
            return;
        }

        if http::PORTS.contains(&source_port)
            || http::PORTS.contains(&destination_port)
            || http::matches_grammar(&payload)
        {
            if let Ok((_, protocol)) = http::parse(&payload) {
                self.http = Some(protocol);
            }
            return;
        }

        if source_port == telnet::PORT || destination_port == telnet::PORT {
            if let Ok((_, protocol)) = telnet::parse(&payload) {
                self.telnet = Some(protocol);
            }
            return;
        }

        if source_port == irc::PORT
            || destination_port == irc::PORT
            || irc::matches_grammar(&payload)
        {
            if let Ok((_, protocol)) = irc::parse(&payload) {
                self.irc = Some(protocol);
            }
        }
    }

    pub fn payload_length(&self) -> usize {
        self.payload.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ethernet_header(ether_type: [u8; 2]) -> Vec<u8> {
        let mut frame = Vec::new();
        frame.extend_from_slice(&[0x84, 0xD8, 0x1B, 0x6E, 0xC1, 0x4A]);
        frame.extend_from_slice(&[0x04, 0xE8, 0xB9, 0x18, 0x55, 0x10]);
        frame.extend_from_slice(&ether_type);
        frame
    }

    fn udp_frame(source_port: u16, destination_port: u16, payload: &[u8]) -> Vec<u8> {
        let mut frame = ethernet_header([0x08, 0x00]);

        let total_length = (20 + 8 + payload.len()) as u16;
        frame.extend_from_slice(&[0x45, 0x00]);
        frame.extend_from_slice(&total_length.to_be_bytes());
        frame.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x40, 17, 0x00, 0x00]);
        frame.extend_from_slice(&[10, 0, 0, 1, 10, 0, 0, 2]);

        let datagram_length = (8 + payload.len()) as u16;
        frame.extend_from_slice(&source_port.to_be_bytes());
        frame.extend_from_slice(&destination_port.to_be_bytes());
        frame.extend_from_slice(&datagram_length.to_be_bytes());
        frame.extend_from_slice(&[0x00, 0x00]);
        frame.extend_from_slice(payload);

        frame
    }

    fn tcp_frame(source_port: u16, destination_port: u16, payload: &[u8]) -> Vec<u8> {
        let mut frame = ethernet_header([0x08, 0x00]);

        let total_length = (20 + 20 + payload.len()) as u16;
        frame.extend_from_slice(&[0x45, 0x00]);
        frame.extend_from_slice(&total_length.to_be_bytes());
        frame.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x40, 6, 0x00, 0x00]);
        frame.extend_from_slice(&[10, 0, 0, 1, 10, 0, 0, 2]);

        frame.extend_from_slice(&source_port.to_be_bytes());
        frame.extend_from_slice(&destination_port.to_be_bytes());
        frame.extend_from_slice(&[0, 0, 0, 1, 0, 0, 0, 0]);
        frame.extend_from_slice(&[0x50, 0x18, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00]);
        frame.extend_from_slice(payload);

        frame
    }

    fn dns_question_payload() -> Vec<u8> {
        let mut payload = Vec::new();
        payload.extend_from_slice(&[0x46, 0xF9, 0x01, 0x00]);
        payload.extend_from_slice(&[0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
        payload.extend_from_slice(b"\x07youtube\x03com\x00");
        payload.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]);
        payload
    }

    #[test]
    fn test_udp_dns_chain() {
        let frame = udp_frame(58643, 53, &dns_question_payload());

        let packet = Packet::parse(&frame, &pcap::Linktype(1));

        assert!(packet.ethernet.is_some());
        assert!(packet.ipv4.is_some());
        assert!(packet.udp.is_some());
        assert!(packet.ipv6.is_none());
        assert!(packet.tcp.is_none());

        let dns = packet.dns.as_ref().unwrap();
        assert_eq!(dns.qr(), 0);
        assert_eq!(dns.questions[0].to_string(), "youtube.com A");
        assert!(!dns.is_incomplete);
    }

    #[test]
    fn test_full_chain_real_frame() {
        // DNS query for download.jetbrains.com, captured off the wire
        let hex_actual = "84 D8 1B 6E C1 4A 04 E8 B9 18 55 10 08 00 45 00 00 44 D2 6E 00 00 80 11 00 00 C0 A8 00 67 C0 A8 00 01 E5 13 00 35 00 30 81 FA F3 31 01 00 00 01 00 00 00 00 00 00 08 64 6F 77 6E 6C 6F 61 64 09 6A 65 74 62 72 61 69 6E 73 03 63 6F 6D 00 00 01 00 01".replace(" ", "");
        let frame = hex::decode(hex_actual).unwrap();

        let packet = Packet::parse(&frame, &pcap::Linktype(1));

        let ipv4 = packet.ipv4.as_ref().unwrap();
        assert_eq!(ipv4.protocol, IpProtocol::Udp);

        let udp = packet.udp.as_ref().unwrap();
        assert_eq!(udp.source_port, 58643);
        assert_eq!(udp.destination_port, 53);

        let dns = packet.dns.as_ref().unwrap();
        assert_eq!(
            dns.questions[0].to_string(),
            "download.jetbrains.com A"
        );

        // The layer-agnostic payload is the transport payload here
        assert_eq!(packet.payload, udp.payload);
    }

    #[test]
    fn test_tcp_http_chain() {
        let frame = tcp_frame(
            49152,
            80,
            b"GET /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n",
        );

        let packet = Packet::parse(&frame, &pcap::Linktype(1));

        assert!(packet.tcp.is_some());
        let http = packet.http.as_ref().unwrap();
        assert!(http.is_request());
        assert_eq!(http.request_method, "GET");
        assert_eq!(http.request_uri, "/index.html");
        assert_eq!(http.header("Host"), Some("example.com"));
    }

    #[test]
    fn test_http_sniffed_on_foreign_port() {
        let frame = tcp_frame(49152, 3000, b"HTTP/1.1 404 Not Found\r\n\r\n");

        let packet = Packet::parse(&frame, &pcap::Linktype(1));

        let http = packet.http.as_ref().unwrap();
        assert_eq!(http.status_code, "404");
        assert_eq!(http.response_phrase, "Not Found");
    }

    #[test]
    fn test_http_port_with_binary_payload_degrades() {
        let frame = tcp_frame(80, 49152, &[0x16, 0x03, 0x01, 0x02, 0x00]);

        let packet = Packet::parse(&frame, &pcap::Linktype(1));

        let http = packet.http.as_ref().unwrap();
        assert!(!http.is_request());
        assert!(!http.is_response());
        assert_eq!(http.request_method, "");
    }

    #[test]
    fn test_dns_over_tcp_length_prefix() {
        let message = dns_question_payload();
        let mut payload = (message.len() as u16).to_be_bytes().to_vec();
        payload.extend_from_slice(&message);
        let frame = tcp_frame(49152, 53, &payload);

        let packet = Packet::parse(&frame, &pcap::Linktype(1));

        let dns = packet.dns.as_ref().unwrap();
        assert_eq!(dns.questions[0].to_string(), "youtube.com A");
    }

    #[test]
    fn test_dns_port_payload_too_short() {
        let frame = udp_frame(1024, 53, &[0x00, 0x01, 0x02]);

        let packet = Packet::parse(&frame, &pcap::Linktype(1));

        assert!(packet.udp.is_some());
        assert!(packet.dns.is_none());
    }

    #[test]
    fn test_telnet_port() {
        let frame = tcp_frame(23, 49152, b"login: ");

        let packet = Packet::parse(&frame, &pcap::Linktype(1));

        let telnet = packet.telnet.as_ref().unwrap();
        assert!(telnet.is_data());
        assert_eq!(telnet.data, "login: ");
    }

    #[test]
    fn test_irc_port_and_sniff() {
        let line = b":irc.example.net 001 daniel :Welcome\r\n";

        let by_port = Packet::parse(&tcp_frame(6667, 49152, line), &pcap::Linktype(1));
        assert!(by_port.irc.is_some());

        let sniffed = Packet::parse(&tcp_frame(5000, 5001, line), &pcap::Linktype(1));
        let irc = sniffed.irc.as_ref().unwrap();
        assert_eq!(irc.messages[0].trailing, "Welcome");
    }

    #[test]
    fn test_unknown_ether_type_stops_at_link() {
        let mut frame = ethernet_header([0x08, 0x06]);
        frame.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);

        let packet = Packet::parse(&frame, &pcap::Linktype(1));

        assert!(packet.ethernet.is_some());
        assert!(packet.ipv4.is_none());
        assert!(packet.ipv6.is_none());
        assert_eq!(packet.payload, &[0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn test_non_ethernet_link_type() {
        let frame = udp_frame(1, 2, b"data");

        let packet = Packet::parse(&frame, &pcap::Linktype(101));

        assert!(packet.ethernet.is_none());
        assert_eq!(packet.payload, frame);
        assert_eq!(packet.length, frame.len());
    }

    #[test]
    fn test_truncation_sweep_never_fails() {
        let frame = udp_frame(58643, 53, &dns_question_payload());

        for boundary in 0..=frame.len() {
            let packet = Packet::parse(&frame[..boundary], &pcap::Linktype(1));
            assert_eq!(packet.length, boundary);
        }
    }

    #[test]
    fn test_garbage_bytes_never_fail() {
        // Deterministic pseudo-random buffers
        let mut state: u32 = 0x1234_5678;
        let mut next = || {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 24) as u8
        };

        for length in [0usize, 1, 13, 14, 64, 512, 1500] {
            let buffer: Vec<u8> = (0..length).map(|_| next()).collect();
            let packet = Packet::parse(&buffer, &pcap::Linktype(1));
            assert_eq!(packet.length, length);
        }
    }

    #[test]
    fn test_layer_exclusivity() {
        let frame = udp_frame(58643, 53, &dns_question_payload());

        let packet = Packet::parse(&frame, &pcap::Linktype(1));

        assert!(!(packet.ipv4.is_some() && packet.ipv6.is_some()));
        assert!(!(packet.tcp.is_some() && packet.udp.is_some()));
    }
}
