use std::path::PathBuf;

use anyhow::{Context, Result};
use manifest_core::ManifestType;
use tracing::info;

use crate::common;

pub fn run(kind: ManifestType, file: PathBuf, json: bool) -> Result<()> {
    let manifest = common::load_manifest(&file, kind)?
        .with_context(|| format!("{} rejected as {kind}", file.display()))?;
    info!(file = %file.display(), %kind, "manifest accepted");

    if json {
        common::print_json(&manifest)?;
    } else {
        println!("{}", common::summarize(&manifest));
    }

    Ok(())
}
