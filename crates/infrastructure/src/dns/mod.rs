pub mod edns;
pub mod forwarding;
pub mod records;
pub mod resolv_conf;
pub mod server;
pub mod transport;
pub mod truncation;

pub use forwarding::RecursiveForwarder;
pub use resolv_conf::ResolvConf;
pub use server::{DnsServer, DnsServerHandler};
