//! EDNS0 echo (RFC 6891) with client-subnet scope handling (RFC 7871).

use hickory_proto::op::{Edns, Message, ResponseCode};
use hickory_proto::rr::rdata::opt::{ClientSubnet, EdnsCode, EdnsOption};

/// Copies the request's EDNS0 OPT onto `response`.
///
/// The client-subnet option, when present, is echoed with its scope reset to
/// 0 (valid for every client) if `ecs_global` is set or the response is an
/// error that must not be cached per subnet; otherwise the scope equals the
/// request's source prefix. Requests without EDNS0 leave `response` as is.
pub fn set_edns(request: &Message, response: &mut Message, ecs_global: bool) {
    let Some(request_edns) = request.extensions().as_ref() else {
        return;
    };

    let mut edns = Edns::new();
    edns.set_max_payload(request_edns.max_payload());
    edns.set_version(0);
    edns.set_dnssec_ok(false);

    if let Some(subnet) = client_subnet(request) {
        let scope = if ecs_global || is_global_rcode(response.response_code()) {
            0
        } else {
            subnet.source_prefix()
        };
        edns.options_mut().insert(EdnsOption::Subnet(ClientSubnet::new(
            subnet.addr(),
            subnet.source_prefix(),
            scope,
        )));
    }

    response.set_edns(edns);
}

/// Client-subnet option carried by `message`, if any.
pub fn client_subnet(message: &Message) -> Option<&ClientSubnet> {
    match message.extensions().as_ref()?.option(EdnsCode::Subnet)? {
        EdnsOption::Subnet(subnet) => Some(subnet),
        _ => None,
    }
}

fn is_global_rcode(code: ResponseCode) -> bool {
    matches!(
        code,
        ResponseCode::NXDomain | ResponseCode::ServFail | ResponseCode::Refused | ResponseCode::NotImp
    )
}
