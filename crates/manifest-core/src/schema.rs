//! Tag and attribute names of the manifest documents, and the field tables
//! the assemblers read through [`crate::extract::extract_single_values`].

/// Identifier attribute (`id`) on CFM devices and PCD ports.
pub const ID_ATTR: &str = "id";
/// Version attribute (`version`) on PFM roots and CFM firmware entries.
pub const VERSION_ATTR: &str = "version";
/// Platform attribute (`platform`) on PFM and PCD roots.
pub const PLATFORM_ATTR: &str = "platform";
/// Mux level attribute (`level`).
pub const LEVEL_ATTR: &str = "level";

// Platform firmware manifest.
pub const VERSION_ADDR_TAG: &str = "VersionAddr";
pub const UNUSED_BYTE_TAG: &str = "UnusedByte";
pub const READ_WRITE_TAG: &str = "ReadWrite";
pub const REGION_TAG: &str = "Region";
pub const START_ADDR_TAG: &str = "StartAddr";
pub const END_ADDR_TAG: &str = "EndAddr";
pub const SIGNED_IMAGE_TAG: &str = "SignedImage";
pub const PUBLIC_KEY_TAG: &str = "PublicKey";
pub const SIGNATURE_TAG: &str = "Signature";
pub const VALIDATE_TAG: &str = "ValidateOnBoot";

// Component firmware manifest.
pub const FIRMWARE_TAG: &str = "Firmware";
pub const DIGEST_TAG: &str = "Digest";
pub const FAILURE_ACTION_TAG: &str = "FailureAction";

// Platform configuration data.
pub const VERSION_TAG: &str = "Version";
pub const ROT_TAG: &str = "RoT";
pub const PORTS_TAG: &str = "Ports";
pub const PORT_TAG: &str = "Port";
pub const SPI_FREQ_TAG: &str = "SPIFreq";
pub const INTERFACE_TAG: &str = "Interface";
pub const IS_PA_ROT_TAG: &str = "IsPARoT";
pub const ADDRESS_TAG: &str = "Address";
pub const BMC_ADDRESS_TAG: &str = "BMCAddress";
pub const CPLD_TAG: &str = "CPLD";
pub const CHANNEL_TAG: &str = "Channel";
pub const COMPONENTS_TAG: &str = "Components";
pub const COMPONENT_TAG: &str = "Component";
pub const DEVICE_TYPE_TAG: &str = "DeviceType";
pub const BUS_TAG: &str = "Bus";
pub const I2C_MODE_TAG: &str = "I2CMode";
pub const EID_TAG: &str = "EID";
pub const PWR_CTRL_TAG: &str = "PwrCtrl";
pub const REGISTER_TAG: &str = "Register";
pub const MASK_TAG: &str = "Mask";
pub const MUXES_TAG: &str = "Muxes";
pub const MUX_TAG: &str = "Mux";
pub const POLICY_TAG: &str = "Policy";
pub const ACTIVE_TAG: &str = "Active";
pub const DEFAULT_FAILURE_ACTION_TAG: &str = "DefaultFailureAction";

/// Unused byte value assumed when a PFM has no `UnusedByte` tag.
pub const DEFAULT_UNUSED_BYTE: &str = "0xff";

/// How many children with a given tag a node may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    ExactlyOne,
    AtMostOne,
    OneOrMore,
    /// Zero or more; never fails.
    Any,
}

/// One single-valued child read into an output key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub key: &'static str,
    pub tag: &'static str,
}

const fn field(key: &'static str, tag: &'static str) -> FieldRule {
    FieldRule { key, tag }
}

pub const REGION_FIELDS: &[FieldRule] =
    &[field("start", START_ADDR_TAG), field("end", END_ADDR_TAG)];

pub const PFM_IMAGE_FIELDS: &[FieldRule] = &[
    field("pbkey", PUBLIC_KEY_TAG),
    field("signature", SIGNATURE_TAG),
];

pub const CFM_IMAGE_FIELDS: &[FieldRule] = &[
    field("digest", DIGEST_TAG),
    field("failure_action", FAILURE_ACTION_TAG),
];

pub const PCD_VERSION_FIELDS: &[FieldRule] = &[field("version", VERSION_TAG)];

pub const PORT_FIELDS: &[FieldRule] = &[field("spifreq", SPI_FREQ_TAG)];

pub const ROT_FIELDS: &[FieldRule] = &[field("is_pa_rot", IS_PA_ROT_TAG)];

pub const INTERFACE_FIELDS: &[FieldRule] = &[
    field("address", ADDRESS_TAG),
    field("bmc_address", BMC_ADDRESS_TAG),
];

/// Shared by `CPLD` and `Mux` blocks.
pub const BUS_ENDPOINT_FIELDS: &[FieldRule] =
    &[field("address", ADDRESS_TAG), field("channel", CHANNEL_TAG)];

pub const COMPONENT_FIELDS: &[FieldRule] = &[
    field("devicetype", DEVICE_TYPE_TAG),
    field("bus", BUS_TAG),
    field("address", ADDRESS_TAG),
    field("i2cmode", I2C_MODE_TAG),
    field("eid", EID_TAG),
];

pub const PWR_CTRL_FIELDS: &[FieldRule] =
    &[field("register", REGISTER_TAG), field("mask", MASK_TAG)];

pub const POLICY_FIELDS: &[FieldRule] = &[
    field("active", ACTIVE_TAG),
    field("defaultfailureaction", DEFAULT_FAILURE_ACTION_TAG),
];
