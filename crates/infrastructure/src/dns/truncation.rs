//! Response size limits.
//!
//! Oversized responses are cut to the longest answer prefix that still fits
//! the advertised size, found by binary search over the prefix length.

use ferrous_mesh_domain::TransportProtocol;
use hickory_proto::op::Message;
use hickory_proto::rr::Record;
use hickory_proto::ProtoError;

pub const UDP_HEADER_SIZE: usize = 12;
pub const UDP_MAX_SIZE: usize = 512;
pub const TCP_HEADER_SIZE: usize = 60;
pub const TCP_MAX_SIZE: usize = 65535;

/// Largest response the client accepts: the EDNS0 payload size (never below
/// 512) or 512 for UDP, 65535 for TCP.
pub fn max_response_size(protocol: TransportProtocol, request: &Message) -> usize {
    match protocol {
        TransportProtocol::Tcp => TCP_MAX_SIZE,
        TransportProtocol::Udp => request
            .extensions()
            .as_ref()
            .map(|edns| edns.max_payload() as usize)
            .unwrap_or(UDP_MAX_SIZE)
            .max(UDP_MAX_SIZE),
    }
}

pub fn header_overhead(protocol: TransportProtocol) -> usize {
    match protocol {
        TransportProtocol::Udp => UDP_HEADER_SIZE,
        TransportProtocol::Tcp => TCP_HEADER_SIZE,
    }
}

/// Drops trailing answers until `response` encodes within
/// `max_size - header_overhead(protocol)` bytes.
///
/// Returns whether answers were dropped. Only UDP responses get the TC flag;
/// a response that already fits is left untouched.
pub fn truncate_response(
    response: &mut Message,
    protocol: TransportProtocol,
    max_size: usize,
) -> Result<bool, ProtoError> {
    let budget = max_size.saturating_sub(header_overhead(protocol));
    if response.to_vec()?.len() <= budget {
        return Ok(false);
    }

    let mut answers = response.take_answers();
    let keep = binary_truncate(response, &answers, budget)?;
    answers.truncate(keep);
    response.insert_answers(answers);

    if protocol.is_udp() {
        response.set_truncated(true);
    }
    Ok(true)
}

/// Length of the longest prefix of `answers` that keeps `response` within
/// `budget` bytes. Stops early once less than one header of slack remains.
///
/// `response` must come in without answers and leaves without them.
pub fn binary_truncate(
    response: &mut Message,
    answers: &[Record],
    budget: usize,
) -> Result<usize, ProtoError> {
    let mut start = 0;
    let mut end = answers.len() + 1;

    while end - start > 1 {
        let median = start + (end - start) / 2;
        response.insert_answers(answers[..median].to_vec());
        let encoded = response.to_vec();
        response.take_answers();
        let size = encoded?.len();

        if size <= budget {
            if budget - size < UDP_HEADER_SIZE {
                return Ok(median);
            }
            start = median;
        } else {
            end = median;
        }
    }

    Ok(start)
}
