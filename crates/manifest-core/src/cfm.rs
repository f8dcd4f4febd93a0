//! Component firmware manifest (CFM) assembly.

use manifest_xml::TreeNode;
use tracing::debug;

use crate::extract::{decode_hex, extract_single_values, find_tags, require_attribute};
use crate::schema::{
    Cardinality, CFM_IMAGE_FIELDS, DIGEST_TAG, FIRMWARE_TAG, ID_ATTR, SIGNED_IMAGE_TAG,
    VERSION_ATTR,
};
use crate::{ManifestError, ResultExt};

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CfmSignedImage {
    #[cfg_attr(feature = "serde", serde(serialize_with = "hex::serde::serialize"))]
    pub digest: Vec<u8>,
    pub failure_action: String,
}

/// One accepted firmware version of a component.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FirmwareEntry {
    pub version: String,
    /// Never empty.
    pub signed_imgs: Vec<CfmSignedImage>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Cfm {
    pub device_id: String,
    /// Never empty.
    pub fw_list: Vec<FirmwareEntry>,
}

/// Build a [`Cfm`] from the document root.
pub fn assemble_cfm<N: TreeNode>(root: &N) -> Result<Cfm, ManifestError> {
    let device_id = require_attribute(root, ID_ATTR)?;
    let fw_list: Vec<FirmwareEntry> = find_tags(root, FIRMWARE_TAG, Cardinality::OneOrMore)
        .and_then(|blocks| blocks.into_iter().map(assemble_firmware).collect())
        .with_context(|| format!("Device {device_id}"))?;
    debug!(
        device = %device_id,
        firmware = fw_list.len(),
        "assembled component firmware manifest"
    );
    Ok(Cfm { device_id, fw_list })
}

fn assemble_firmware<N: TreeNode>(fw: &N) -> Result<FirmwareEntry, ManifestError> {
    let version = require_attribute(fw, VERSION_ATTR)?;
    let signed_imgs: Vec<CfmSignedImage> =
        find_tags(fw, SIGNED_IMAGE_TAG, Cardinality::OneOrMore)
            .and_then(|images| images.into_iter().map(assemble_image).collect())
            .with_context(|| format!("{FIRMWARE_TAG} {version}"))?;
    Ok(FirmwareEntry {
        version,
        signed_imgs,
    })
}

fn assemble_image<N: TreeNode>(img: &N) -> Result<CfmSignedImage, ManifestError> {
    let mut values = extract_single_values(img, CFM_IMAGE_FIELDS)?;
    Ok(CfmSignedImage {
        digest: decode_hex(&values.take("digest")?, DIGEST_TAG)?,
        failure_action: values.take("failure_action")?,
    })
}
