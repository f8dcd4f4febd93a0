//! Primitive extractors shared by the manifest assemblers.
//!
//! Every lookup goes through [`find_tags`], which enforces the
//! [`Cardinality`] a schema table declares for a tag.

use manifest_xml::TreeNode;

use crate::schema::{Cardinality, FieldRule};
use crate::ManifestError;

/// Trimmed attribute value.
///
/// Absent and blank attributes are treated alike: an error when `required`,
/// `Ok(None)` otherwise.
pub fn extract_attribute<N: TreeNode>(
    node: &N,
    name: &str,
    required: bool,
) -> Result<Option<String>, ManifestError> {
    match node.attribute(name).map(str::trim) {
        Some(value) if !value.is_empty() => Ok(Some(value.to_string())),
        _ if required => Err(ManifestError::missing_attribute(name, node.name())),
        _ => Ok(None),
    }
}

pub fn require_attribute<N: TreeNode>(node: &N, name: &str) -> Result<String, ManifestError> {
    extract_attribute(node, name, true)?
        .ok_or_else(|| ManifestError::missing_attribute(name, node.name()))
}

/// Direct children named `tag`, checked against `cardinality`.
pub fn find_tags<'a, N: TreeNode>(
    node: &'a N,
    tag: &str,
    cardinality: Cardinality,
) -> Result<Vec<&'a N>, ManifestError> {
    let found = node.find_children(tag);
    match cardinality {
        Cardinality::ExactlyOne if found.is_empty() => {
            Err(ManifestError::missing_tag(tag, node.name()))
        }
        Cardinality::ExactlyOne | Cardinality::AtMostOne if found.len() > 1 => {
            Err(ManifestError::DuplicateElement {
                what: format!("`{tag}` tag in <{}> (found {})", node.name(), found.len()),
            })
        }
        Cardinality::OneOrMore if found.is_empty() => Err(ManifestError::EmptyCollection {
            what: format!("`{tag}` tags in <{}>", node.name()),
        }),
        _ => Ok(found),
    }
}

/// The unique child named `tag`.
///
/// More than one match is always an error; zero matches is an error only
/// when `required`.
pub fn find_single_tag<'a, N: TreeNode>(
    node: &'a N,
    tag: &str,
    required: bool,
) -> Result<Option<&'a N>, ManifestError> {
    let cardinality = if required {
        Cardinality::ExactlyOne
    } else {
        Cardinality::AtMostOne
    };
    Ok(find_tags(node, tag, cardinality)?.into_iter().next())
}

pub fn require_single_tag<'a, N: TreeNode>(node: &'a N, tag: &str) -> Result<&'a N, ManifestError> {
    find_single_tag(node, tag, true)?.ok_or_else(|| ManifestError::missing_tag(tag, node.name()))
}

/// Trimmed text of `node`. Blank text counts as a missing value.
pub fn node_text<N: TreeNode>(node: &N) -> Result<String, ManifestError> {
    let text = node.text().trim();
    if text.is_empty() {
        return Err(ManifestError::MissingRequiredElement {
            what: format!("value of `{}` tag", node.name()),
        });
    }
    Ok(text.to_string())
}

/// Trimmed text of the unique child named `tag`.
pub fn single_text<N: TreeNode>(node: &N, tag: &str) -> Result<String, ManifestError> {
    node_text(require_single_tag(node, tag)?)
}

/// Values read by [`extract_single_values`], keyed by [`FieldRule::key`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SingleValues {
    values: Vec<(&'static str, String)>,
}

impl SingleValues {
    /// Move the value for `key` out of the set.
    pub fn take(&mut self, key: &str) -> Result<String, ManifestError> {
        let index = self
            .values
            .iter()
            .position(|(k, _)| *k == key)
            .ok_or_else(|| ManifestError::MissingRequiredElement {
                what: format!("`{key}` field"),
            })?;
        Ok(self.values.swap_remove(index).1)
    }
}

/// Read every rule's tag as an exactly-once child in one pass.
///
/// The first missing or duplicated tag fails the whole call.
pub fn extract_single_values<N: TreeNode>(
    node: &N,
    rules: &[FieldRule],
) -> Result<SingleValues, ManifestError> {
    let mut values = Vec::with_capacity(rules.len());
    for rule in rules {
        values.push((rule.key, single_text(node, rule.tag)?));
    }
    Ok(SingleValues { values })
}

/// Decode hex text after dropping all whitespace.
pub fn decode_hex(text: &str, tag: &str) -> Result<Vec<u8>, ManifestError> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(&compact).map_err(|err| ManifestError::MalformedHexPayload {
        tag: tag.to_string(),
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::BUS_ENDPOINT_FIELDS;
    use crate::ErrorKind;
    use manifest_xml::{parse_document, Element};

    fn doc(xml: &str) -> Element {
        parse_document(xml).expect("parse xml")
    }

    #[test]
    fn attributes_are_trimmed() {
        let root = doc(r#"<Port id="  3 " blank="   "/>"#);
        assert_eq!(
            extract_attribute(&root, "id", true).unwrap().as_deref(),
            Some("3")
        );
        assert_eq!(require_attribute(&root, "id").unwrap(), "3");
        assert_eq!(extract_attribute(&root, "blank", false).unwrap(), None);
        assert_eq!(extract_attribute(&root, "other", false).unwrap(), None);

        let err = extract_attribute(&root, "blank", true).expect_err("blank attribute");
        assert_eq!(err.kind(), ErrorKind::MissingRequiredElement);
        let err = require_attribute(&root, "other").expect_err("absent attribute");
        assert_eq!(err.to_string(), "missing `other` attribute on <Port>");
    }

    #[test]
    fn single_tag_cardinality() {
        let root = doc("<RoT><Interface/><Ports/><Ports/></RoT>");
        assert!(find_single_tag(&root, "Interface", true).unwrap().is_some());
        assert!(find_single_tag(&root, "Missing", false).unwrap().is_none());

        let err = find_single_tag(&root, "Missing", true).expect_err("required tag");
        assert_eq!(err.kind(), ErrorKind::MissingRequiredElement);

        // duplicates are fatal whether or not the tag is required
        for required in [true, false] {
            let err = find_single_tag(&root, "Ports", required).expect_err("duplicate tag");
            assert_eq!(err.kind(), ErrorKind::DuplicateElement);
        }
    }

    #[test]
    fn one_or_more_rejects_empty() {
        let root = doc("<SignedImage><Region/><Region/></SignedImage>");
        assert_eq!(
            find_tags(&root, "Region", Cardinality::OneOrMore)
                .unwrap()
                .len(),
            2
        );
        let err = find_tags(&root, "Digest", Cardinality::OneOrMore).expect_err("empty");
        assert_eq!(err.kind(), ErrorKind::EmptyCollection);
        assert!(find_tags(&root, "Digest", Cardinality::Any)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn single_values_in_one_pass() {
        let root = doc("<CPLD><Address> 0x14 </Address><Channel>2</Channel></CPLD>");
        let mut values = extract_single_values(&root, BUS_ENDPOINT_FIELDS).expect("cpld values");
        assert_eq!(values.take("address").unwrap(), "0x14");
        assert_eq!(values.take("channel").unwrap(), "2");
        assert!(values.take("channel").is_err());
        assert_eq!(values, SingleValues::default());

        let root = doc("<CPLD><Address>0x14</Address></CPLD>");
        let err = extract_single_values(&root, BUS_ENDPOINT_FIELDS).expect_err("no channel");
        assert_eq!(err.kind(), ErrorKind::MissingRequiredElement);

        let root = doc("<CPLD><Address>1</Address><Address>2</Address><Channel>2</Channel></CPLD>");
        let err = extract_single_values(&root, BUS_ENDPOINT_FIELDS).expect_err("two addresses");
        assert_eq!(err.kind(), ErrorKind::DuplicateElement);

        let root = doc("<CPLD><Address>  </Address><Channel>2</Channel></CPLD>");
        let err = extract_single_values(&root, BUS_ENDPOINT_FIELDS).expect_err("blank address");
        assert_eq!(err.kind(), ErrorKind::MissingRequiredElement);
    }

    #[test]
    fn hex_ignores_whitespace() {
        assert_eq!(
            decode_hex("AB CD", "Digest").unwrap(),
            decode_hex("ABCD", "Digest").unwrap()
        );
        assert_eq!(
            decode_hex("de\n\tad be ef", "Signature").unwrap(),
            vec![0xDE, 0xAD, 0xBE, 0xEF]
        );

        let err = decode_hex("zz", "Digest").expect_err("not hex");
        assert_eq!(err.kind(), ErrorKind::MalformedHexPayload);
        let err = decode_hex("ABC", "Digest").expect_err("odd length");
        assert_eq!(err.kind(), ErrorKind::MalformedHexPayload);
    }
}
