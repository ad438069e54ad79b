//! Manager-side S3P client.
//!
//! S3P is a point-to-point node management protocol spoken over a
//! byte-oriented serial link: the manager (this crate) reads and writes
//! a typed register table on an embedded node, transfers byte ranges to
//! and from the node's virtual memory map, executes named commands and
//! downloads self-describing metadata.
//!
//! The [`Client`] drives one transaction at a time over any
//! [`Transport`][s3p_transport::Transport]: it allocates the 4-bit
//! sequence, frames the request, matches the response by sequence and
//! type, and surfaces node-reported status codes. Bulk VMEM transfers
//! and metadata walks are chunked, report progress and honor a
//! [`CancelToken`].
//!
//! ```no_run
//! use s3p::{Client, ClientConfig};
//! # fn open_serial_port() -> s3p_transport::Loopback { unimplemented!() }
//!
//! let transport = open_serial_port();
//! let mut client = Client::new(Box::new(transport), ClientConfig::default())?;
//! let rtt = client.ping()?;
//! println!("node answered in {rtt:?}");
//! # Ok::<(), s3p::Error>(())
//! ```

#![forbid(unsafe_code)]

pub mod cache;
pub mod client;
pub mod config;
pub mod error;

pub use cache::{RegEntry, RegTable, VmemEntry, VmemTable};
pub use client::{Client, ProgressFn};
pub use config::ClientConfig;
pub use error::Error;

pub use s3p_msg::*;
pub use s3p_transport as transport;
pub use s3p_transport::{CancelToken, Transport};

/// S3P client Result type.
pub type Result<T> = std::result::Result<T, crate::Error>;
