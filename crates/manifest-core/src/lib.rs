#![cfg_attr(docsrs, feature(doc_cfg))]
//! Schema-driven extraction of firmware manifest records from XML.
//!
//! ```rust
//! use manifest_core::{load_and_process, Manifest, ManifestType};
//!
//! let xml = r#"
//!     <CFM id="nic0">
//!         <Firmware version="1.2">
//!             <SignedImage>
//!                 <Digest>DEAD BEEF</Digest>
//!                 <FailureAction>1</FailureAction>
//!             </SignedImage>
//!         </Firmware>
//!     </CFM>
//! "#;
//! let manifest = load_and_process(xml, ManifestType::Cfm).expect("valid manifest");
//! let Manifest::Cfm(cfm) = manifest else { unreachable!() };
//! assert_eq!(cfm.fw_list[0].signed_imgs[0].digest, [0xDE, 0xAD, 0xBE, 0xEF]);
//! ```

pub mod cfm;
pub mod extract;
pub mod pcd;
pub mod pfm;
pub mod region;
pub mod schema;

use std::fmt;
use std::str::FromStr;

use manifest_xml::{TreeNode, XmlError};
use thiserror::Error;
use tracing::{debug, warn};

pub use cfm::{assemble_cfm, Cfm, CfmSignedImage, FirmwareEntry};
pub use pcd::{
    assemble_pcd, Component, Cpld, Interface, Mux, Pcd, Policy, Port, PowerControl, Rot,
};
pub use pfm::{assemble_pfm, Pfm, PfmSignedImage};
pub use region::{extract_region, Region};

/// Error type produced while assembling a manifest record.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// A required tag or attribute is absent or empty.
    #[error("missing {what}")]
    MissingRequiredElement { what: String },
    /// A tag allowed at most once appears more than once, or a mapping key repeats.
    #[error("duplicate {what}")]
    DuplicateElement { what: String },
    /// A collection that must be non-empty has no entries.
    #[error("no {what}")]
    EmptyCollection { what: String },
    /// Signature or digest text is not hexadecimal.
    #[error("malformed hex in {tag}: {reason}")]
    MalformedHexPayload { tag: String, reason: String },
    /// The requested manifest kind is not PFM, CFM or PCD.
    #[error("unknown manifest type: {0}")]
    UnknownManifestType(String),
    /// The document could not be read into a tree.
    #[error(transparent)]
    UnderlyingParseFailure(#[from] XmlError),
    /// Failure inside a named block of the document.
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<ManifestError>,
    },
}

/// Error category, independent of the context a failure was reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingRequiredElement,
    DuplicateElement,
    EmptyCollection,
    MalformedHexPayload,
    UnknownManifestType,
    UnderlyingParseFailure,
}

impl ManifestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ManifestError::MissingRequiredElement { .. } => ErrorKind::MissingRequiredElement,
            ManifestError::DuplicateElement { .. } => ErrorKind::DuplicateElement,
            ManifestError::EmptyCollection { .. } => ErrorKind::EmptyCollection,
            ManifestError::MalformedHexPayload { .. } => ErrorKind::MalformedHexPayload,
            ManifestError::UnknownManifestType(_) => ErrorKind::UnknownManifestType,
            ManifestError::UnderlyingParseFailure(_) => ErrorKind::UnderlyingParseFailure,
            ManifestError::Context { source, .. } => source.kind(),
        }
    }

    pub(crate) fn missing_tag(tag: &str, parent: &str) -> Self {
        ManifestError::MissingRequiredElement {
            what: format!("`{tag}` tag in <{parent}>"),
        }
    }

    pub(crate) fn missing_attribute(name: &str, parent: &str) -> Self {
        ManifestError::MissingRequiredElement {
            what: format!("`{name}` attribute on <{parent}>"),
        }
    }
}

/// Attach the name of the enclosing block to a failure.
pub trait ResultExt<T> {
    fn with_context<C, F>(self, f: F) -> Result<T, ManifestError>
    where
        C: Into<String>,
        F: FnOnce() -> C;
}

impl<T> ResultExt<T> for Result<T, ManifestError> {
    fn with_context<C, F>(self, f: F) -> Result<T, ManifestError>
    where
        C: Into<String>,
        F: FnOnce() -> C,
    {
        self.map_err(|source| ManifestError::Context {
            context: f().into(),
            source: Box::new(source),
        })
    }
}

/// Manifest families understood by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManifestType {
    /// Platform firmware manifest.
    Pfm,
    /// Component firmware manifest.
    Cfm,
    /// Platform configuration data.
    Pcd,
}

impl fmt::Display for ManifestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ManifestType::Pfm => "PFM",
            ManifestType::Cfm => "CFM",
            ManifestType::Pcd => "PCD",
        };
        f.write_str(name)
    }
}

impl FromStr for ManifestType {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pfm" => Ok(ManifestType::Pfm),
            "cfm" => Ok(ManifestType::Cfm),
            "pcd" => Ok(ManifestType::Pcd),
            _ => Err(ManifestError::UnknownManifestType(s.to_string())),
        }
    }
}

/// Record produced by one of the assemblers.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Manifest {
    Pfm(Pfm),
    Cfm(Cfm),
    Pcd(Pcd),
}

impl Manifest {
    pub fn kind(&self) -> ManifestType {
        match self {
            Manifest::Pfm(_) => ManifestType::Pfm,
            Manifest::Cfm(_) => ManifestType::Cfm,
            Manifest::Pcd(_) => ManifestType::Pcd,
        }
    }
}

/// Parse `source` and assemble the record for `kind`.
///
/// Any failure, including malformed XML, is logged once and returned whole;
/// no partially assembled record ever leaves this function.
pub fn load_and_process(source: &str, kind: ManifestType) -> Result<Manifest, ManifestError> {
    let root = manifest_xml::parse_document(source).map_err(|err| {
        warn!(%kind, error = %err, "manifest rejected");
        ManifestError::from(err)
    })?;
    process_tree(&root, kind)
}

/// Run the assembler for `kind` on an already parsed tree.
///
/// Logs acceptance at `debug` and rejection at `warn`.
pub fn process_tree<N: TreeNode>(
    root: &N,
    kind: ManifestType,
) -> Result<Manifest, ManifestError> {
    let result = match kind {
        ManifestType::Pfm => assemble_pfm(root).map(Manifest::Pfm),
        ManifestType::Cfm => assemble_cfm(root).map(Manifest::Cfm),
        ManifestType::Pcd => assemble_pcd(root).map(Manifest::Pcd),
    };
    match &result {
        Ok(_) => debug!(%kind, "manifest accepted"),
        Err(err) => warn!(%kind, error = %err, "manifest rejected"),
    }
    result
}
