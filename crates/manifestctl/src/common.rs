use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use manifest_core::{load_and_process, Manifest, ManifestError, ManifestType};
use serde::Serialize;

/// Read `path` and run it through the dispatcher.
///
/// I/O failures are reported through `anyhow`; a readable file that fails
/// validation comes back as the inner `Err`.
pub fn load_manifest(path: &Path, kind: ManifestType) -> Result<Result<Manifest, ManifestError>> {
    let source =
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    Ok(load_and_process(&source, kind))
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("serialise JSON output")?;
    println!("{text}");
    Ok(())
}

/// One-line human summary of a record.
pub fn summarize(manifest: &Manifest) -> String {
    match manifest {
        Manifest::Pfm(pfm) => format!(
            "PFM version {} platform {}: {} signed image(s), {} read-write region(s), \
             version address {}, unused byte {}",
            String::from_utf8_lossy(&pfm.version_id),
            String::from_utf8_lossy(&pfm.platform_id),
            pfm.signed_imgs.len(),
            pfm.rw_regions.len(),
            pfm.version_addr,
            pfm.unused_byte,
        ),
        Manifest::Cfm(cfm) => {
            let firmware = cfm
                .fw_list
                .iter()
                .map(|fw| format!("{} ({} image(s))", fw.version, fw.signed_imgs.len()))
                .collect::<Vec<_>>()
                .join(", ");
            format!("CFM device {}: firmware {firmware}", cfm.device_id)
        }
        Manifest::Pcd(pcd) => format!(
            "PCD platform {} version {}: {} port(s), {} component(s), policy {}",
            pcd.platform_id,
            pcd.version,
            pcd.rot.ports.as_ref().map_or(0, |ports| ports.len()),
            pcd.components.as_ref().map_or(0, |components| components.len()),
            pcd.policy.active,
        ),
    }
}
