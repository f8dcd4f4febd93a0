#![cfg_attr(docsrs, feature(doc_cfg))]
//! Firmware manifest tooling facade re-exporting the workspace crates.
//!
//! ```rust,no_run
//! use manifest_tools::{load_and_process, Manifest, ManifestType};
//!
//! # fn run(xml: &str) -> Result<(), manifest_tools::ManifestError> {
//! match load_and_process(xml, ManifestType::Pcd)? {
//!     Manifest::Pcd(pcd) => println!("platform {} version {}", pcd.platform_id, pcd.version),
//!     other => println!("unexpected {} record", other.kind()),
//! }
//! # Ok(())
//! # }
//! ```

pub use manifest_core as engine;
pub use manifest_xml as xml;

pub use manifest_core::{
    load_and_process, process_tree, ErrorKind, Manifest, ManifestError, ManifestType,
};
