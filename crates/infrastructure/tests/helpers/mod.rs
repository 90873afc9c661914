#![allow(dead_code)]

pub mod dns_server_mock;
pub mod http_mock;
pub mod naming_mock;

pub use dns_server_mock::{MockBehavior, MockDnsServer};
pub use http_mock::MockHttpServer;
pub use naming_mock::{MockNamingClient, MockServiceRegistry};

use hickory_proto::op::{Edns, Message, MessageType, Query};
use hickory_proto::rr::rdata::opt::{ClientSubnet, EdnsOption};
use hickory_proto::rr::{Name, RecordType};
use std::str::FromStr;

pub fn query_message(name: &str, record_type: RecordType) -> Message {
    let mut message = Message::new();
    message
        .set_id(4242)
        .set_message_type(MessageType::Query)
        .set_recursion_desired(true)
        .add_query(Query::query(Name::from_str(name).unwrap(), record_type));
    message
}

/// Query carrying an EDNS0 OPT with `payload` and, optionally, a client
/// subnet of `subnet`/`prefix`.
pub fn edns_query_message(
    name: &str,
    record_type: RecordType,
    payload: u16,
    subnet: Option<(&str, u8)>,
) -> Message {
    let mut message = query_message(name, record_type);
    let mut edns = Edns::new();
    edns.set_max_payload(payload);
    if let Some((addr, prefix)) = subnet {
        edns.options_mut().insert(EdnsOption::Subnet(ClientSubnet::new(
            addr.parse().unwrap(),
            prefix,
            0,
        )));
    }
    message.set_edns(edns);
    message
}
