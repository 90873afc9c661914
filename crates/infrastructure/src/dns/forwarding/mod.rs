pub mod forwarder;
pub mod response_parser;

pub use forwarder::RecursiveForwarder;
pub use response_parser::ResponseParser;
