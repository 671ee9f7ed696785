//! Cluster REST API access.
//!
//! [`Transport`] is the only way the rest of the crate talks to a cluster.
//! [`ClusterClient`] implements it over HTTP.

mod client;
mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use client::ClusterClient;
pub use transport::Transport;
