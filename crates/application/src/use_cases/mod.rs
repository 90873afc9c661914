pub mod dns;

pub use dns::{DnsOutcome, HandleDnsQueryUseCase, ResponseSource};
