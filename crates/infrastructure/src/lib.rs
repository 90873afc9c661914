//! Ferrous Mesh Infrastructure Layer
pub mod dns;
pub mod naming;
pub mod resolver;
