use ferrous_mesh_domain::{NameServerAddr, TransportProtocol};
use std::net::SocketAddr;

#[test]
fn test_nameserver_bare_ipv4_gets_default_port() {
    let addr: NameServerAddr = "10.0.0.1".parse().unwrap();
    assert_eq!(addr.socket_addr(), "10.0.0.1:53".parse::<SocketAddr>().unwrap());
}

#[test]
fn test_nameserver_keeps_explicit_port() {
    let addr: NameServerAddr = "10.0.0.1:5353".parse().unwrap();
    assert_eq!(addr.socket_addr().port(), 5353);
}

#[test]
fn test_nameserver_ipv6_forms() {
    let bare: NameServerAddr = "fd00::1".parse().unwrap();
    assert_eq!(bare.socket_addr(), "[fd00::1]:53".parse::<SocketAddr>().unwrap());

    let bracketed: NameServerAddr = "[fd00::1]".parse().unwrap();
    assert_eq!(bracketed, bare);

    let with_port: NameServerAddr = "[fd00::1]:5300".parse().unwrap();
    assert_eq!(with_port.socket_addr().port(), 5300);
}

#[test]
fn test_nameserver_rejects_hostnames() {
    assert!("dns.google".parse::<NameServerAddr>().is_err());
    assert!("".parse::<NameServerAddr>().is_err());
}

#[test]
fn test_nameserver_loopback() {
    assert!("127.0.0.1".parse::<NameServerAddr>().unwrap().is_loopback());
    assert!(!"8.8.8.8".parse::<NameServerAddr>().unwrap().is_loopback());
}

#[test]
fn test_transport_protocol_parse_and_display() {
    assert_eq!("udp".parse::<TransportProtocol>().unwrap(), TransportProtocol::Udp);
    assert_eq!("TCP".parse::<TransportProtocol>().unwrap(), TransportProtocol::Tcp);
    assert!("quic".parse::<TransportProtocol>().is_err());
    assert_eq!(TransportProtocol::Udp.to_string(), "UDP");
    assert!(TransportProtocol::Udp.is_udp());
    assert!(!TransportProtocol::Tcp.is_udp());
}
