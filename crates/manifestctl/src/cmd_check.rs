use std::path::PathBuf;

use anyhow::{bail, Result};
use manifest_core::ManifestType;
use serde::Serialize;
use tracing::{info, warn};

use crate::common;

#[derive(Debug, Serialize)]
pub struct CheckEntry {
    pub file: String,
    pub ok: bool,
    pub error: Option<String>,
}

/// Validate every file, recording unreadable files as failures.
pub fn check_files(kind: ManifestType, files: &[PathBuf]) -> Vec<CheckEntry> {
    files
        .iter()
        .map(|file| {
            let error = match common::load_manifest(file, kind) {
                Ok(Ok(_)) => None,
                Ok(Err(err)) => Some(err.to_string()),
                Err(err) => {
                    let message = format!("{err:#}");
                    warn!(file = %file.display(), error = %message, "cannot read manifest");
                    Some(message)
                }
            };
            CheckEntry {
                file: file.display().to_string(),
                ok: error.is_none(),
                error,
            }
        })
        .collect()
}

pub fn run(kind: ManifestType, files: Vec<PathBuf>, json: bool) -> Result<()> {
    let entries = check_files(kind, &files);
    let failed = entries.iter().filter(|entry| !entry.ok).count();
    info!(%kind, checked = entries.len(), failed, "manifest check finished");

    if json {
        common::print_json(&entries)?;
    } else {
        for entry in &entries {
            match &entry.error {
                None => println!("OK    {}", entry.file),
                Some(err) => println!("FAIL  {}: {err}", entry.file),
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} manifest(s) rejected", entries.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const CFM: &str = r#"
        <CFM id="nic0">
            <Firmware version="1.0">
                <SignedImage><Digest>00ff</Digest><FailureAction>0</FailureAction></SignedImage>
            </Firmware>
        </CFM>
    "#;

    #[test]
    fn unreadable_file_does_not_stop_the_run() {
        let dir = tempfile::tempdir().expect("temp dir");
        let missing = dir.path().join("absent.xml");
        let good = dir.path().join("nic0.xml");
        fs::write(&good, CFM).expect("write manifest");

        let entries = check_files(ManifestType::Cfm, &[missing.clone(), good.clone()]);
        assert_eq!(entries.len(), 2);
        assert!(!entries[0].ok);
        let error = entries[0].error.as_deref().expect("read failure");
        assert!(error.starts_with("read "), "{error}");
        assert!(entries[1].ok, "{:?}", entries[1].error);
        assert_eq!(entries[1].file, good.display().to_string());

        let err = run(ManifestType::Cfm, vec![missing, good], false).expect_err("one failure");
        assert_eq!(err.to_string(), "1 of 2 manifest(s) rejected");
    }

    #[test]
    fn rejected_and_accepted_manifests() {
        let dir = tempfile::tempdir().expect("temp dir");
        let good = dir.path().join("good.xml");
        let bad = dir.path().join("bad.xml");
        fs::write(&good, CFM).expect("write manifest");
        fs::write(&bad, r#"<CFM id="nic0"></CFM>"#).expect("write manifest");

        let entries = check_files(ManifestType::Cfm, &[bad.clone(), good.clone()]);
        assert!(!entries[0].ok);
        assert!(entries[0].error.as_deref().unwrap_or_default().contains("Device nic0"));
        assert!(entries[1].ok);

        run(ManifestType::Cfm, vec![good], true).expect("all accepted");
        assert!(run(ManifestType::Cfm, vec![bad], false).is_err());
    }
}
