//! Platform firmware manifest (PFM) assembly.

use manifest_xml::TreeNode;
use tracing::debug;

use crate::extract::{
    decode_hex, extract_single_values, find_single_tag, find_tags, node_text, require_attribute,
    single_text,
};
use crate::region::{extract_region, Region};
use crate::schema::{
    Cardinality, DEFAULT_UNUSED_BYTE, PFM_IMAGE_FIELDS, PLATFORM_ATTR, READ_WRITE_TAG,
    REGION_TAG, SIGNATURE_TAG, SIGNED_IMAGE_TAG, UNUSED_BYTE_TAG, VALIDATE_TAG, VERSION_ADDR_TAG,
    VERSION_ATTR,
};
use crate::{ManifestError, ResultExt};

/// Image region list protected by one signature.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PfmSignedImage {
    pub pbkey: String,
    #[cfg_attr(feature = "serde", serde(serialize_with = "hex::serde::serialize"))]
    pub signature: Vec<u8>,
    /// Never empty.
    pub regions: Vec<Region>,
    pub validate: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Pfm {
    #[cfg_attr(feature = "serde", serde(serialize_with = "serialize_utf8"))]
    pub version_id: Vec<u8>,
    #[cfg_attr(feature = "serde", serde(serialize_with = "serialize_utf8"))]
    pub platform_id: Vec<u8>,
    pub version_addr: String,
    pub unused_byte: String,
    pub rw_regions: Vec<Region>,
    /// Never empty.
    pub signed_imgs: Vec<PfmSignedImage>,
}

#[cfg(feature = "serde")]
fn serialize_utf8<S: serde::Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(bytes))
}

/// Build a [`Pfm`] from the document root.
pub fn assemble_pfm<N: TreeNode>(root: &N) -> Result<Pfm, ManifestError> {
    let version = require_attribute(root, VERSION_ATTR)?;
    let platform = require_attribute(root, PLATFORM_ATTR)?;
    let context = format!("{} {version}", root.name());
    assemble_body(root, version, platform).with_context(|| context)
}

fn assemble_body<N: TreeNode>(
    root: &N,
    version: String,
    platform: String,
) -> Result<Pfm, ManifestError> {
    let version_addr = single_text(root, VERSION_ADDR_TAG)?;
    let unused_byte = match find_single_tag(root, UNUSED_BYTE_TAG, false)? {
        Some(node) => node_text(node)?,
        None => DEFAULT_UNUSED_BYTE.to_string(),
    };

    let mut rw_regions = Vec::new();
    for rw in find_tags(root, READ_WRITE_TAG, Cardinality::Any)? {
        for region in find_tags(rw, REGION_TAG, Cardinality::Any)? {
            rw_regions.push(extract_region(region).with_context(|| READ_WRITE_TAG)?);
        }
    }

    let images = find_tags(root, SIGNED_IMAGE_TAG, Cardinality::OneOrMore)?;
    let mut signed_imgs = Vec::with_capacity(images.len());
    for (index, img) in images.into_iter().enumerate() {
        let image =
            assemble_image(img).with_context(|| format!("{SIGNED_IMAGE_TAG} #{}", index + 1))?;
        signed_imgs.push(image);
    }

    debug!(
        version = %version,
        platform = %platform,
        rw_regions = rw_regions.len(),
        signed_images = signed_imgs.len(),
        "assembled platform firmware manifest"
    );
    Ok(Pfm {
        version_id: version.into_bytes(),
        platform_id: platform.into_bytes(),
        version_addr,
        unused_byte,
        rw_regions,
        signed_imgs,
    })
}

fn assemble_image<N: TreeNode>(img: &N) -> Result<PfmSignedImage, ManifestError> {
    let mut values = extract_single_values(img, PFM_IMAGE_FIELDS)?;
    let pbkey = values.take("pbkey")?;
    let signature = decode_hex(&values.take("signature")?, SIGNATURE_TAG)?;
    let regions = find_tags(img, REGION_TAG, Cardinality::OneOrMore)?
        .into_iter()
        .map(extract_region)
        .collect::<Result<Vec<_>, _>>()?;
    let validate = single_text(img, VALIDATE_TAG)?;
    Ok(PfmSignedImage {
        pbkey,
        signature,
        regions,
        validate,
    })
}
