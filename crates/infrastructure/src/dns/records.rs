//! Resource record synthesis shared by the resolvers.
//!
//! SRV targets use the `_addr` scheme: the endpoint address is hex-encoded
//! into a label ahead of a literal `_addr` marker,
//! `<hex-ip>._addr.<service>.<namespace>.`, so a follow-up A/AAAA query for
//! the target decodes straight back to the address.

use ferrous_mesh_domain::{DomainError, ServiceInstance, ServiceKey};
use hickory_proto::op::{Message, MessageType, ResponseCode};
use hickory_proto::rr::rdata::{A, AAAA, CNAME, SRV};
use hickory_proto::rr::{Name, RData, Record, RecordType};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

pub const ADDR_LABEL: &str = "_addr";

pub fn a_record(name: Name, ip: Ipv4Addr, ttl: u32) -> Record {
    Record::from_rdata(name, ttl, RData::A(A(ip)))
}

pub fn aaaa_record(name: Name, ip: Ipv6Addr, ttl: u32) -> Record {
    Record::from_rdata(name, ttl, RData::AAAA(AAAA(ip)))
}

pub fn cname_record(name: Name, canonical_name: Name, ttl: u32) -> Record {
    Record::from_rdata(name, ttl, RData::CNAME(CNAME(canonical_name)))
}

pub fn srv_record(name: Name, instance: &ServiceInstance, target: Name, ttl: u32) -> Record {
    Record::from_rdata(
        name,
        ttl,
        RData::SRV(SRV::new(
            instance.priority,
            instance.weight,
            instance.port,
            target,
        )),
    )
}

/// A or AAAA record for `ip` when its family matches `record_type`.
///
/// IPv4-mapped IPv6 addresses count as IPv4.
pub fn address_record(name: Name, ip: IpAddr, record_type: RecordType, ttl: u32) -> Option<Record> {
    match (record_type, ip) {
        (RecordType::A, IpAddr::V4(v4)) => Some(a_record(name, v4, ttl)),
        (RecordType::A, IpAddr::V6(v6)) => v6.to_ipv4_mapped().map(|v4| a_record(name, v4, ttl)),
        (RecordType::AAAA, IpAddr::V6(v6)) if v6.to_ipv4_mapped().is_none() => {
            Some(aaaa_record(name, v6, ttl))
        }
        _ => None,
    }
}

/// A/AAAA answers for `instances`, at most `limit` of them.
///
/// Instances of the other address family are skipped. When no instance has a
/// usable address and one reports a hostname instead, the answer is a CNAME to
/// that hostname.
pub fn instance_address_records(
    name: &Name,
    instances: &[ServiceInstance],
    record_type: RecordType,
    ttl: u32,
    limit: usize,
) -> Vec<Record> {
    let answers: Vec<Record> = instances
        .iter()
        .filter_map(ServiceInstance::ip)
        .filter_map(|ip| address_record(name.clone(), ip, record_type, ttl))
        .take(limit)
        .collect();
    if !answers.is_empty() {
        return answers;
    }

    instances
        .iter()
        .find(|instance| instance.ip().is_none())
        .and_then(|instance| Name::from_ascii(to_fqdn(&instance.host)).ok())
        .map(|canonical| vec![cname_record(name.clone(), canonical, ttl)])
        .unwrap_or_default()
}

/// Authoritative NOERROR response carrying `answers`. Header fields tied to
/// the request are filled in by the server.
pub fn authoritative_response(answers: Vec<Record>) -> Message {
    let mut response = Message::new();
    response
        .set_message_type(MessageType::Response)
        .set_authoritative(true)
        .set_response_code(ResponseCode::NoError);
    response.insert_answers(answers);
    response
}

pub fn to_fqdn(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{}.", name)
    }
}

/// Encodes `ip` as the SRV target `<hex-ip>._addr.<service>.<namespace>.`.
pub fn encode_addr_target(ip: IpAddr, key: &ServiceKey) -> Result<Name, DomainError> {
    let encoded = match ip {
        IpAddr::V4(v4) => hex::encode(v4.octets()),
        IpAddr::V6(v6) => hex::encode(v6.octets()),
    };
    let target = format!(
        "{}.{}.{}.{}.",
        encoded, ADDR_LABEL, key.service, key.namespace
    );
    Name::from_ascii(&target).map_err(|e| DomainError::InvalidDomainName(format!("{}: {}", target, e)))
}

/// Decodes the address carried by an `_addr` name.
///
/// Returns `None` when `qname` has no `_addr` label, and an error when the
/// label before it is not a hex-encoded IPv4 or IPv6 address.
pub fn decode_addr_label(qname: &str) -> Option<Result<IpAddr, DomainError>> {
    let labels: Vec<&str> = qname.trim_end_matches('.').split('.').collect();
    let marker = labels
        .iter()
        .position(|label| label.eq_ignore_ascii_case(ADDR_LABEL))?;

    let Some(encoded) = marker.checked_sub(1).map(|i| labels[i]) else {
        return Some(Err(DomainError::InvalidQname(format!(
            "{}: no address label before {}",
            qname, ADDR_LABEL
        ))));
    };

    let decoded = hex::decode(encoded)
        .map_err(|e| DomainError::InvalidIpAddress(format!("{}: {}", encoded, e)))
        .and_then(|bytes| bytes_to_ip(&bytes, encoded));
    Some(decoded)
}

fn bytes_to_ip(bytes: &[u8], encoded: &str) -> Result<IpAddr, DomainError> {
    if let Ok(octets) = <[u8; 4]>::try_from(bytes) {
        return Ok(IpAddr::V4(Ipv4Addr::from(octets)));
    }
    if let Ok(octets) = <[u8; 16]>::try_from(bytes) {
        return Ok(IpAddr::V6(Ipv6Addr::from(octets)));
    }
    Err(DomainError::InvalidIpAddress(format!(
        "{}: {} bytes is neither IPv4 nor IPv6",
        encoded,
        bytes.len()
    )))
}
