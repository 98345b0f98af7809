use crate::config::Config;
use dissect::capture::CaptureError;
use dissect::{CaptureFile, Packet, analysis};

fn main() {
    let config = match Config::from_file() {
        Ok(value) => value,
        Err(err) => {
            let mut message = format!("Config initialization failed. Error: {err}.");
            if let Some(additional_info) = err.additional_info() {
                message.push_str(&format!(" Additional_info: {additional_info}"));
            }
            println!("{}", message);
            std::process::exit(1);
        },
    };

    logging::setup(config.log_level().unwrap_or_else(|err| {
        println!("{}", err);
        std::process::exit(1);
    }))
    .unwrap_or_else(|err| {
        println!("Logger initialization failed. Error: {err}.");
        std::process::exit(1);
    });

    let path = match std::env::args().nth(1) {
        Some(value) => value,
        None => {
            log::error!("Usage: cli <capture.pcap>");
            std::process::exit(2);
        },
    };

    if let Err(err) = scan(&path, &config) {
        log::error!("Scan failed. Error: {err}.");
        std::process::exit(1);
    }
}

fn scan(path: &str, config: &Config) -> Result<(), CaptureError> {
    let mut capture = CaptureFile::open(path)?;
    log::info!("Opened {}. Link type: {:?}.", path, capture.link_type());

    let mut totals = Totals::default();
    let mut index: usize = 0;
    while let Some(packet) = capture.next_packet() {
        log::info!("#{index}: {}", summary(&packet));
        totals.add(&packet);

        index += 1;
        if config.max_packets != 0 && index >= config.max_packets {
            log::info!("Stopping after {} packets per config.", config.max_packets);
            break;
        }
    }

    log::info!("{}", totals.report(index));

    if let Some(address) = analysis::most_common_address_in_file(path)? {
        log::info!("Most common address: {}.", address);
    }

    Ok(())
}

fn summary(packet: &Packet) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(ipv4) = &packet.ipv4 {
        parts.push(format!(
            "{} -> {}",
            ipv4.address_source, ipv4.address_destination
        ));
    }
    if let Some(ipv6) = &packet.ipv6 {
        parts.push(format!(
            "{} -> {}",
            ipv6.address_source, ipv6.address_destination
        ));
    }

    if let Some(tcp) = &packet.tcp {
        parts.push(format!("TCP {}:{}", tcp.source_port, tcp.destination_port));
    }
    if let Some(udp) = &packet.udp {
        parts.push(format!("UDP {}:{}", udp.source_port, udp.destination_port));
    }

    if let Some(dns) = &packet.dns {
        let mut part = format!(
            "DNS id 0x{:04X}, {} questions, {} answers",
            dns.id,
            dns.questions.len(),
            dns.answers.len()
        );
        if dns.is_incomplete {
            part.push_str(" (incomplete)");
        }
        parts.push(part);
    }
    if let Some(http) = &packet.http {
        if http.is_request() {
            parts.push(format!("HTTP {} {}", http.request_method, http.request_uri));
        } else if http.is_response() {
            parts.push(format!(
                "HTTP {} {}",
                http.status_code, http.response_phrase
            ));
        } else {
            parts.push("HTTP (unrecognized)".to_string());
        }
    }
    if let Some(irc) = &packet.irc {
        let commands: Vec<&str> = irc
            .messages
            .iter()
            .map(|message| message.command.as_str())
            .collect();
        parts.push(format!("IRC [{}]", commands.join(", ")));
    }
    if let Some(telnet) = &packet.telnet {
        let kind = if telnet.is_command() {
            "command"
        } else if telnet.is_data() {
            "data"
        } else {
            "empty"
        };
        parts.push(format!("Telnet {}", kind));
    }

    if parts.is_empty() {
        return format!("{} bytes, not dissected", packet.length);
    }

    format!("{} ({} bytes)", parts.join(", "), packet.length)
}

#[derive(Default)]
struct Totals {
    ipv4: usize,
    ipv6: usize,
    tcp: usize,
    udp: usize,
    dns: usize,
    http: usize,
    irc: usize,
    telnet: usize,
    incomplete_dns: usize,
}

impl Totals {
    fn add(&mut self, packet: &Packet) {
        self.ipv4 += usize::from(packet.ipv4.is_some());
        self.ipv6 += usize::from(packet.ipv6.is_some());
        self.tcp += usize::from(packet.tcp.is_some());
        self.udp += usize::from(packet.udp.is_some());
        self.dns += usize::from(packet.dns.is_some());
        self.http += usize::from(packet.http.is_some());
        self.irc += usize::from(packet.irc.is_some());
        self.telnet += usize::from(packet.telnet.is_some());

        if let Some(dns) = &packet.dns {
            self.incomplete_dns += usize::from(dns.is_incomplete);
        }
    }

    fn report(&self, packets: usize) -> String {
        format!(
            "Scanned {} packets: {} IPv4, {} IPv6, {} TCP, {} UDP, {} DNS ({} incomplete), {} HTTP, {} IRC, {} Telnet.",
            packets,
            self.ipv4,
            self.ipv6,
            self.tcp,
            self.udp,
            self.dns,
            self.incomplete_dns,
            self.http,
            self.irc,
            self.telnet
        )
    }
}

mod config;
mod logging;
