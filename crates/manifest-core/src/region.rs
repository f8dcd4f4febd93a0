//! Memory regions shared by read-write and signed-image blocks.

use manifest_xml::TreeNode;

use crate::extract::extract_single_values;
use crate::schema::REGION_FIELDS;
use crate::ManifestError;

/// Address range as written in the manifest; the encoder interprets the numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Region {
    pub start: String,
    pub end: String,
}

/// Read a `Region` block holding exactly one `StartAddr` and one `EndAddr`.
pub fn extract_region<N: TreeNode>(node: &N) -> Result<Region, ManifestError> {
    let mut values = extract_single_values(node, REGION_FIELDS)?;
    Ok(Region {
        start: values.take("start")?,
        end: values.take("end")?,
    })
}
