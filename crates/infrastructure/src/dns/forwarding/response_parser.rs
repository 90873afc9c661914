use ferrous_mesh_domain::DomainError;
use hickory_proto::op::{Message, MessageType, ResponseCode};
use tracing::debug;

const HEADER_LEN: usize = 12;
const TC_BIT: u8 = 0x02;

pub struct ResponseParser;

impl ResponseParser {
    /// Decodes an upstream reply to `request`.
    ///
    /// A reply that fails to decode but whose header carries the TC bit is
    /// turned into an empty truncated response, so the client retries over
    /// TCP instead of getting SERVFAIL.
    pub fn parse(response_bytes: &[u8], request: &Message) -> Result<Message, DomainError> {
        let message = match Message::from_vec(response_bytes) {
            Ok(message) => message,
            Err(e) => {
                return Self::truncated_reply(response_bytes, request).ok_or_else(|| {
                    DomainError::InvalidDnsResponse(format!("Failed to parse DNS response: {}", e))
                });
            }
        };

        if message.id() != request.id() {
            return Err(DomainError::InvalidDnsResponse(format!(
                "Response id {} does not match query id {}",
                message.id(),
                request.id()
            )));
        }

        debug!(
            rcode = ?message.response_code(),
            answers = message.answer_count(),
            truncated = message.truncated(),
            "Upstream response parsed"
        );

        Ok(message)
    }

    /// Whether a decoded reply ends the upstream loop.
    pub fn is_acceptable(message: &Message) -> bool {
        matches!(
            message.response_code(),
            ResponseCode::NoError | ResponseCode::NXDomain
        )
    }

    fn truncated_reply(response_bytes: &[u8], request: &Message) -> Option<Message> {
        if response_bytes.len() < HEADER_LEN || response_bytes[2] & TC_BIT == 0 {
            return None;
        }
        let id = u16::from_be_bytes([response_bytes[0], response_bytes[1]]);
        if id != request.id() {
            return None;
        }

        let mut reply = Message::new();
        reply
            .set_id(id)
            .set_message_type(MessageType::Response)
            .set_op_code(request.op_code())
            .set_recursion_desired(request.recursion_desired())
            .set_recursion_available(response_bytes[3] & 0x80 != 0)
            .set_truncated(true)
            .set_response_code(ResponseCode::from_low(response_bytes[3] & 0x0F))
            .add_queries(request.queries().to_vec());

        debug!(id, "Upstream response truncated beyond decoding");
        Some(reply)
    }
}
