//! Platform configuration data (PCD) assembly.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use manifest_xml::TreeNode;
use tracing::debug;

use crate::extract::{
    extract_single_values, find_single_tag, find_tags, require_attribute, require_single_tag,
};
use crate::schema::{
    Cardinality, BUS_ENDPOINT_FIELDS, COMPONENTS_TAG, COMPONENT_FIELDS, COMPONENT_TAG, CPLD_TAG,
    ID_ATTR, INTERFACE_FIELDS, INTERFACE_TAG, LEVEL_ATTR, MUXES_TAG, MUX_TAG, PCD_VERSION_FIELDS,
    PLATFORM_ATTR, POLICY_FIELDS, POLICY_TAG, PORTS_TAG, PORT_FIELDS, PORT_TAG, PWR_CTRL_FIELDS,
    PWR_CTRL_TAG, ROT_FIELDS, ROT_TAG,
};
use crate::{ManifestError, ResultExt};

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Port {
    pub spifreq: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Interface {
    pub address: String,
    pub bmc_address: String,
}

/// Root-of-trust block.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Rot {
    /// Keyed by port id; `None` when the block has no `Ports` tag.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub ports: Option<BTreeMap<String, Port>>,
    pub is_pa_rot: String,
    pub interface: Interface,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Cpld {
    pub address: String,
    pub channel: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Mux {
    pub address: String,
    pub channel: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PowerControl {
    pub register: String,
    pub mask: String,
}

/// Device reachable from the RoT over I2C.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Component {
    pub devicetype: String,
    pub bus: String,
    pub address: String,
    pub i2cmode: String,
    pub eid: String,
    pub powerctrl: PowerControl,
    /// Keyed by mux level.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub muxes: Option<BTreeMap<String, Mux>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Policy {
    pub active: String,
    pub defaultfailureaction: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Pcd {
    pub platform_id: String,
    pub version: String,
    pub rot: Rot,
    pub cpld: Cpld,
    /// `None` without a `Components` tag; may be empty otherwise.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub components: Option<Vec<Component>>,
    pub policy: Policy,
}

/// Build a [`Pcd`] from the document root.
pub fn assemble_pcd<N: TreeNode>(root: &N) -> Result<Pcd, ManifestError> {
    let platform_id = require_attribute(root, PLATFORM_ATTR)?;
    let version = extract_single_values(root, PCD_VERSION_FIELDS)?.take("version")?;

    let rot = require_single_tag(root, ROT_TAG)
        .and_then(assemble_rot)
        .with_context(|| ROT_TAG)?;

    let mut values = require_single_tag(root, CPLD_TAG)
        .and_then(|cpld| extract_single_values(cpld, BUS_ENDPOINT_FIELDS))
        .with_context(|| CPLD_TAG)?;
    let cpld = Cpld {
        address: values.take("address")?,
        channel: values.take("channel")?,
    };

    let components = match find_single_tag(root, COMPONENTS_TAG, false)? {
        Some(block) => Some(assemble_components(block)?),
        None => None,
    };

    let mut values = require_single_tag(root, POLICY_TAG)
        .and_then(|policy| extract_single_values(policy, POLICY_FIELDS))
        .with_context(|| POLICY_TAG)?;
    let policy = Policy {
        active: values.take("active")?,
        defaultfailureaction: values.take("defaultfailureaction")?,
    };

    debug!(
        platform = %platform_id,
        ports = rot.ports.as_ref().map_or(0, BTreeMap::len),
        components = components.as_ref().map_or(0, Vec::len),
        "assembled platform configuration data"
    );
    Ok(Pcd {
        platform_id,
        version,
        rot,
        cpld,
        components,
        policy,
    })
}

fn assemble_rot<N: TreeNode>(rot: &N) -> Result<Rot, ManifestError> {
    let ports = match find_single_tag(rot, PORTS_TAG, false)? {
        Some(block) => Some(assemble_ports(block)?),
        None => None,
    };
    let interface = require_single_tag(rot, INTERFACE_TAG)?;
    let is_pa_rot = extract_single_values(rot, ROT_FIELDS)?.take("is_pa_rot")?;
    let mut values =
        extract_single_values(interface, INTERFACE_FIELDS).with_context(|| INTERFACE_TAG)?;
    Ok(Rot {
        ports,
        is_pa_rot,
        interface: Interface {
            address: values.take("address")?,
            bmc_address: values.take("bmc_address")?,
        },
    })
}

fn assemble_ports<N: TreeNode>(block: &N) -> Result<BTreeMap<String, Port>, ManifestError> {
    let mut ports = BTreeMap::new();
    for port in find_tags(block, PORT_TAG, Cardinality::Any)? {
        let id = require_attribute(port, ID_ATTR).with_context(|| PORTS_TAG)?;
        let spifreq = extract_single_values(port, PORT_FIELDS)
            .and_then(|mut values| values.take("spifreq"))
            .with_context(|| format!("{PORT_TAG} {id}"))?;
        insert_unique(&mut ports, id, Port { spifreq }, PORT_TAG, ID_ATTR)?;
    }
    Ok(ports)
}

fn assemble_components<N: TreeNode>(block: &N) -> Result<Vec<Component>, ManifestError> {
    let mut components = Vec::new();
    for (index, node) in find_tags(block, COMPONENT_TAG, Cardinality::Any)?
        .into_iter()
        .enumerate()
    {
        let component = assemble_component(node)
            .with_context(|| format!("{COMPONENT_TAG} #{}", index + 1))?;
        components.push(component);
    }
    Ok(components)
}

fn assemble_component<N: TreeNode>(node: &N) -> Result<Component, ManifestError> {
    let mut values = extract_single_values(node, COMPONENT_FIELDS)?;

    let mut pwr = require_single_tag(node, PWR_CTRL_TAG)
        .and_then(|pwrctrl| extract_single_values(pwrctrl, PWR_CTRL_FIELDS))
        .with_context(|| PWR_CTRL_TAG)?;
    let powerctrl = PowerControl {
        register: pwr.take("register")?,
        mask: pwr.take("mask")?,
    };

    let muxes = match find_single_tag(node, MUXES_TAG, false)? {
        Some(block) => Some(assemble_muxes(block)?),
        None => None,
    };

    Ok(Component {
        devicetype: values.take("devicetype")?,
        bus: values.take("bus")?,
        address: values.take("address")?,
        i2cmode: values.take("i2cmode")?,
        eid: values.take("eid")?,
        powerctrl,
        muxes,
    })
}

fn assemble_muxes<N: TreeNode>(block: &N) -> Result<BTreeMap<String, Mux>, ManifestError> {
    let mut muxes = BTreeMap::new();
    for mux in find_tags(block, MUX_TAG, Cardinality::Any)? {
        let mut values =
            extract_single_values(mux, BUS_ENDPOINT_FIELDS).with_context(|| MUX_TAG)?;
        let level = require_attribute(mux, LEVEL_ATTR).with_context(|| MUXES_TAG)?;
        let entry = Mux {
            address: values.take("address")?,
            channel: values.take("channel")?,
        };
        insert_unique(&mut muxes, level, entry, MUX_TAG, LEVEL_ATTR)?;
    }
    Ok(muxes)
}

fn insert_unique<V>(
    map: &mut BTreeMap<String, V>,
    key: String,
    value: V,
    tag: &str,
    attr: &str,
) -> Result<(), ManifestError> {
    match map.entry(key) {
        Entry::Occupied(entry) => Err(ManifestError::DuplicateElement {
            what: format!("`{tag}` with {attr} `{}`", entry.key()),
        }),
        Entry::Vacant(entry) => {
            entry.insert(value);
            Ok(())
        }
    }
}
