/// Rule matching: evaluates a compiled rule against a decoded packet
use super::rule::{CompiledRule, Protocol, RuleOptions};
use crate::packet::PacketView;
use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use std::sync::Arc;
use tracing::{debug, warn};

/// Returns true iff every stage of the rule accepts the packet.
///
/// Stages run in order (protocol, addresses, ports, options) and stop at the
/// first failure. A packet that lacks a layer some stage needs is simply not
/// matched; matching never fails with an error.
pub fn matches<P: PacketView + ?Sized>(rule: &CompiledRule, packet: &P) -> bool {
    check_protocol(rule.protocol, packet)
        && check_addresses(rule, packet)
        && check_ports(rule, packet)
        && check_options(&rule.options, packet)
}

impl CompiledRule {
    pub fn matches<P: PacketView + ?Sized>(&self, packet: &P) -> bool {
        matches(self, packet)
    }
}

pub fn check_protocol<P: PacketView + ?Sized>(protocol: Protocol, packet: &P) -> bool {
    match protocol {
        Protocol::Tcp => packet.has_tcp_layer(),
        Protocol::Udp => packet.has_udp_layer(),
        Protocol::Http => packet.has_tcp_layer() && packet.is_http_request(),
    }
}

pub fn check_addresses<P: PacketView + ?Sized>(rule: &CompiledRule, packet: &P) -> bool {
    match packet.ip_addresses() {
        Some((src, dst)) => rule.src_addresses.contains(src) && rule.dst_addresses.contains(dst),
        None => false,
    }
}

/// UDP ports take precedence over TCP ports
pub fn check_ports<P: PacketView + ?Sized>(rule: &CompiledRule, packet: &P) -> bool {
    match packet.udp_ports().or_else(|| packet.tcp_ports()) {
        Some((src, dst)) => rule.src_ports.contains(src) && rule.dst_ports.contains(dst),
        None => false,
    }
}

/// Every option present in the rule must hold.
///
/// An absent option is never looked at. A present option whose layer is
/// missing from the packet fails the whole check, whatever protocol the
/// rule was written for.
pub fn check_options<P: PacketView + ?Sized>(options: &RuleOptions, packet: &P) -> bool {
    if let Some(tos) = options.tos {
        if packet.tos().map(i64::from) != Some(tos) {
            return false;
        }
    }

    if let Some(header_length) = options.header_length {
        if packet.header_length().map(i64::from) != Some(header_length) {
            return false;
        }
    }

    if let Some(offset) = options.fragment_offset {
        if packet.fragment_offset().map(i64::from) != Some(offset) {
            return false;
        }
    }

    if let Some(seq) = options.seq {
        if packet.tcp_seq().map(i64::from) != Some(seq) {
            return false;
        }
    }

    if let Some(ack) = options.ack {
        if packet.tcp_ack().map(i64::from) != Some(ack) {
            return false;
        }
    }

    if let Some(ref wanted) = options.flags {
        // Subset test: the packet may carry more flags than the rule lists
        match packet.tcp_flags() {
            Some(flags) if wanted.chars().all(|c| flags.contains_char(c)) => {}
            _ => return false,
        }
    }

    if let Some(ref method) = options.http_request {
        match packet.http_request_first_token() {
            Some(token) if token == method.as_bytes() => {}
            _ => return false,
        }
    }

    if let Some(ref content) = options.content {
        let payload = packet.transport_payload();
        if payload.is_empty() || !contains_bytes(payload, content.as_bytes()) {
            return false;
        }
    }

    true
}

fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|window| window == needle)
}

/// Multi-pattern prefilter over the `content` options of a rule list.
///
/// One Aho-Corasick pass over the payload tells which content rules can
/// possibly match. Rules without a non-empty content option always pass.
#[derive(Debug)]
pub struct ContentPrefilter {
    /// Automaton over all non-empty content patterns
    automaton: Option<AhoCorasick>,
    /// Rule index for each pattern ID
    pattern_rules: Vec<usize>,
    /// Rules gated by the automaton
    filtered: Vec<bool>,
}

impl ContentPrefilter {
    /// Build the prefilter from rules in evaluation order
    pub fn build(rules: &[Arc<CompiledRule>]) -> Self {
        let mut patterns: Vec<&[u8]> = Vec::new();
        let mut pattern_rules = Vec::new();

        for (idx, rule) in rules.iter().enumerate() {
            if let Some(content) = rule.options.content.as_deref() {
                if !content.is_empty() {
                    patterns.push(content.as_bytes());
                    pattern_rules.push(idx);
                }
            }
        }

        let mut filtered = vec![false; rules.len()];

        if patterns.is_empty() {
            return Self {
                automaton: None,
                pattern_rules: Vec::new(),
                filtered,
            };
        }

        // Standard semantics so overlapping patterns are all reported
        match AhoCorasickBuilder::new()
            .match_kind(MatchKind::Standard)
            .build(&patterns)
        {
            Ok(automaton) => {
                debug!(
                    "Built content prefilter: {} patterns over {} rules",
                    patterns.len(),
                    rules.len()
                );
                for &idx in &pattern_rules {
                    filtered[idx] = true;
                }
                Self {
                    automaton: Some(automaton),
                    pattern_rules,
                    filtered,
                }
            }
            Err(e) => {
                warn!("Content prefilter disabled, failed to build automaton: {}", e);
                Self {
                    automaton: None,
                    pattern_rules: Vec::new(),
                    filtered,
                }
            }
        }
    }

    /// Per-rule flags: false only when the rule's content cannot occur in `payload`
    pub fn candidates(&self, payload: &[u8]) -> Vec<bool> {
        let mut candidates: Vec<bool> = self.filtered.iter().map(|gated| !gated).collect();

        if let Some(ref automaton) = self.automaton {
            for mat in automaton.find_overlapping_iter(payload) {
                candidates[self.pattern_rules[mat.pattern().as_usize()]] = true;
            }
        }

        candidates
    }

    /// Number of content patterns in the automaton
    pub fn pattern_count(&self) -> usize {
        self.pattern_rules.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::testutil;
    use crate::packet::{TcpFlags, TransportLayer};
    use crate::rules::compile;

    fn rule(text: &str) -> CompiledRule {
        compile(text).unwrap()
    }

    #[test]
    fn test_content_scenario() {
        let r = rule(r#"alert tcp 10.0.0.0/8 any -> any 80 (content:"GET")"#);

        let packet = testutil::tcp_packet("10.1.2.3", "172.16.0.1", 40000, 80, b"GET /index.html");
        assert!(matches(&r, &packet));

        let packet =
            testutil::tcp_packet("192.168.1.1", "172.16.0.1", 40000, 80, b"GET /index.html");
        assert!(!matches(&r, &packet));
    }

    #[test]
    fn test_http_request_scenario() {
        let r = rule(r#"alert http any any -> any any (http_request:"GET")"#);

        let get = testutil::http_packet("10.0.0.1", "10.0.0.2", b"GET / HTTP/1.1");
        assert!(r.matches(&get));

        let post = testutil::http_packet("10.0.0.1", "10.0.0.2", b"POST / HTTP/1.1");
        assert!(!r.matches(&post));
    }

    #[test]
    fn test_protocol_check() {
        let tcp = testutil::tcp_packet("10.0.0.1", "10.0.0.2", 1, 2, b"");
        let udp = testutil::udp_packet("10.0.0.1", "10.0.0.2", 1, 2, b"");
        let http = testutil::http_packet("10.0.0.1", "10.0.0.2", b"GET / HTTP/1.0");

        assert!(check_protocol(Protocol::Tcp, &tcp));
        assert!(!check_protocol(Protocol::Tcp, &udp));
        assert!(check_protocol(Protocol::Udp, &udp));
        assert!(!check_protocol(Protocol::Udp, &tcp));
        assert!(!check_protocol(Protocol::Http, &tcp));
        assert!(check_protocol(Protocol::Http, &http));
        assert!(check_protocol(Protocol::Tcp, &http));
    }

    #[test]
    fn test_no_ip_layer_never_matches() {
        let r = rule("alert tcp any any -> any any");
        let mut packet = testutil::tcp_packet("10.0.0.1", "10.0.0.2", 1, 2, b"");
        packet.ip = None;

        assert!(check_protocol(r.protocol, &packet));
        assert!(!check_addresses(&r, &packet));
        assert!(!matches(&r, &packet));
    }

    #[test]
    fn test_destination_address_check() {
        let r = rule("alert udp any any -> 8.8.8.8 53");
        assert!(matches(&r, &testutil::udp_packet("10.0.0.1", "8.8.8.8", 5000, 53, b"")));
        assert!(!matches(&r, &testutil::udp_packet("10.0.0.1", "1.1.1.1", 5000, 53, b"")));
    }

    #[test]
    fn test_port_check() {
        let r = rule("alert tcp any 1024: -> any 22");
        assert!(matches(&r, &testutil::tcp_packet("10.0.0.1", "10.0.0.2", 50000, 22, b"")));
        assert!(!matches(&r, &testutil::tcp_packet("10.0.0.1", "10.0.0.2", 50000, 23, b"")));
        assert!(!matches(&r, &testutil::tcp_packet("10.0.0.1", "10.0.0.2", 80, 22, b"")));
    }

    #[test]
    fn test_no_transport_ports_fails_port_check() {
        let r = rule("alert tcp any any -> any any");
        let mut packet = testutil::tcp_packet("10.0.0.1", "10.0.0.2", 1, 2, b"");
        packet.transport = None;
        assert!(!check_ports(&r, &packet));
    }

    #[test]
    fn test_rule_without_options_passes_options_check() {
        let r = rule("alert tcp any any -> any any");
        assert!(r.options.is_empty());
        assert!(check_options(&r.options, &testutil::bare_packet()));
        assert!(check_options(
            &r.options,
            &testutil::udp_packet("10.0.0.1", "10.0.0.2", 1, 2, b"")
        ));
    }

    #[test]
    fn test_msg_is_not_a_constraint() {
        let r = rule("alert tcp any any -> any any (msg: anything at all)");
        assert!(check_options(&r.options, &testutil::bare_packet()));
    }

    #[test]
    fn test_ip_options() {
        let mut packet = testutil::tcp_packet("10.0.0.1", "10.0.0.2", 1, 2, b"");
        if let Some(crate::packet::IpLayer::V4(ref mut header)) = packet.ip {
            header.tos = 16;
            header.fragment_offset = 185;
        }

        assert!(matches(&rule("alert tcp any any -> any any (tos:16)"), &packet));
        assert!(!matches(&rule("alert tcp any any -> any any (tos:0)"), &packet));
        assert!(matches(&rule("alert tcp any any -> any any (len:5)"), &packet));
        assert!(!matches(&rule("alert tcp any any -> any any (len:6)"), &packet));
        assert!(matches(&rule("alert tcp any any -> any any (offset:185)"), &packet));
        assert!(!matches(&rule("alert tcp any any -> any any (offset:0)"), &packet));
    }

    #[test]
    fn test_ip_option_without_ip_layer_fails() {
        let r = rule("alert tcp any any -> any any (tos:0)");
        assert!(!check_options(&r.options, &testutil::bare_packet()));
    }

    #[test]
    fn test_seq_and_ack() {
        let packet = testutil::tcp_packet("10.0.0.1", "10.0.0.2", 1, 2, b"");
        assert!(matches(&rule("alert tcp any any -> any any (seq:1; ack:0)"), &packet));
        assert!(!matches(&rule("alert tcp any any -> any any (seq:2)"), &packet));
        assert!(!matches(&rule("alert tcp any any -> any any (ack:7)"), &packet));
    }

    #[test]
    fn test_tcp_option_on_udp_packet_never_matches() {
        let r = rule("alert udp any any -> any any (seq:100)");
        let packet = testutil::udp_packet("10.0.0.1", "10.0.0.2", 1, 2, b"payload");

        assert!(check_protocol(r.protocol, &packet));
        assert!(check_addresses(&r, &packet));
        assert!(check_ports(&r, &packet));
        assert!(!matches(&r, &packet));
    }

    #[test]
    fn test_other_options_on_udp_packet_never_match() {
        let packet = testutil::udp_packet("10.0.0.1", "10.0.0.2", 1, 2, b"payload");

        for text in [
            "alert udp any any -> any any (flags:S)",
            "alert udp any any -> any any (ack:0)",
        ] {
            let r = rule(text);
            assert!(check_ports(&r, &packet));
            assert!(!check_options(&r.options, &packet), "{}", text);
            assert!(!matches(&r, &packet), "{}", text);
        }
    }

    #[test]
    fn test_content_without_transport_layer_fails() {
        let r = rule(r#"alert tcp any any -> any any (content:"x")"#);
        assert!(!check_options(&r.options, &testutil::bare_packet()));

        let mut packet = testutil::tcp_packet("10.0.0.1", "10.0.0.2", 1, 2, b"x");
        assert!(check_options(&r.options, &packet));
        packet.transport = None;
        assert!(!check_options(&r.options, &packet));
    }

    #[test]
    fn test_out_of_width_values_never_match() {
        // tos 0, seq 1, ack 0
        let packet = testutil::tcp_packet("10.0.0.1", "10.0.0.2", 1, 2, b"");

        for text in [
            "alert tcp any any -> any any (tos:256)",
            "alert tcp any any -> any any (tos:-1)",
            "alert tcp any any -> any any (len:261)",
            "alert tcp any any -> any any (offset:65536)",
            "alert tcp any any -> any any (seq:-1)",
            "alert tcp any any -> any any (seq:4294967297)",
            "alert tcp any any -> any any (ack:4294967296)",
        ] {
            assert!(!matches(&rule(text), &packet), "{}", text);
        }

        assert!(matches(&rule("alert tcp any any -> any any (tos:0; seq:1; ack:0)"), &packet));
    }

    #[test]
    fn test_flags_subset() {
        let r = rule("alert tcp any any -> any any (flags:SA)");
        let mut packet = testutil::tcp_packet("10.0.0.1", "10.0.0.2", 1, 2, b"");

        if let Some(TransportLayer::Tcp(ref mut tcp)) = packet.transport {
            tcp.flags = TcpFlags::from_byte(0x1a); // S, A, P
        }
        assert!(matches(&r, &packet));

        if let Some(TransportLayer::Tcp(ref mut tcp)) = packet.transport {
            tcp.flags = TcpFlags::from_byte(0x02); // S only
        }
        assert!(!matches(&r, &packet));
    }

    #[test]
    fn test_flags_are_case_sensitive() {
        let r = rule("alert tcp any any -> any any (flags:s)");
        let mut packet = testutil::tcp_packet("10.0.0.1", "10.0.0.2", 1, 2, b"");
        if let Some(TransportLayer::Tcp(ref mut tcp)) = packet.transport {
            tcp.flags = TcpFlags::from_byte(0x02);
        }
        assert!(!matches(&r, &packet));
    }

    #[test]
    fn test_http_request_needs_http_packet() {
        let r = rule(r#"alert tcp any any -> any any (http_request:"GET")"#);
        let plain = testutil::tcp_packet("10.0.0.1", "10.0.0.2", 1, 80, b"GET / HTTP/1.1");
        assert!(!matches(&r, &plain));

        let http = testutil::http_packet("10.0.0.1", "10.0.0.2", b"GET / HTTP/1.1");
        assert!(matches(&r, &http));
    }

    #[test]
    fn test_http_request_first_token_is_exact() {
        let r = rule(r#"alert http any any -> any any (http_request:"GE")"#);
        let http = testutil::http_packet("10.0.0.1", "10.0.0.2", b"GET / HTTP/1.1");
        assert!(!matches(&r, &http));
    }

    #[test]
    fn test_content_on_udp_payload() {
        let r = rule(r#"alert udp any any -> any 53 (content:"evil")"#);
        let hit = testutil::udp_packet("10.0.0.1", "10.0.0.2", 5000, 53, b"\x01\x02evil.example");
        let miss = testutil::udp_packet("10.0.0.1", "10.0.0.2", 5000, 53, b"good.example");

        assert!(matches(&r, &hit));
        assert!(!matches(&r, &miss));
    }

    #[test]
    fn test_content_is_case_sensitive_and_needs_payload() {
        let r = rule(r#"alert tcp any any -> any any (content:"GET")"#);
        assert!(!matches(&r, &testutil::tcp_packet("10.0.0.1", "10.0.0.2", 1, 2, b"get /")));
        assert!(!matches(&r, &testutil::tcp_packet("10.0.0.1", "10.0.0.2", 1, 2, b"")));

        let empty = rule(r#"alert tcp any any -> any any (content:"")"#);
        assert!(!matches(&empty, &testutil::tcp_packet("10.0.0.1", "10.0.0.2", 1, 2, b"")));
        assert!(matches(&empty, &testutil::tcp_packet("10.0.0.1", "10.0.0.2", 1, 2, b"x")));
    }

    #[test]
    fn test_contains_bytes() {
        assert!(contains_bytes(b"hello world", b"o w"));
        assert!(contains_bytes(b"abc", b""));
        assert!(!contains_bytes(b"ab", b"abc"));
    }

    #[test]
    fn test_prefilter_candidates() {
        let rules: Vec<Arc<CompiledRule>> = [
            r#"alert tcp any any -> any any (content:"GET")"#,
            r#"alert tcp any any -> any any (content:"GET /admin")"#,
            "alert tcp any any -> any any",
            r#"alert tcp any any -> any any (content:"")"#,
            r#"alert udp any any -> any any (content:"POST")"#,
        ]
        .iter()
        .map(|text| Arc::new(rule(text)))
        .collect();

        let prefilter = ContentPrefilter::build(&rules);
        assert_eq!(prefilter.pattern_count(), 3);

        // Overlapping patterns are both reported
        assert_eq!(
            prefilter.candidates(b"GET /admin HTTP/1.1"),
            vec![true, true, true, true, false]
        );
        assert_eq!(
            prefilter.candidates(b"nothing"),
            vec![false, false, true, true, false]
        );
    }

    #[test]
    fn test_prefilter_without_content() {
        let rules = vec![Arc::new(rule("alert tcp any any -> any any"))];
        let prefilter = ContentPrefilter::build(&rules);
        assert_eq!(prefilter.pattern_count(), 0);
        assert_eq!(prefilter.candidates(b""), vec![true]);
    }
}
