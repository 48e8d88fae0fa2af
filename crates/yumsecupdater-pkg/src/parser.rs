//! Parser for `yum check-update` output
//!
//! A package line looks like
//!
//! ```text
//! openssl-libs.x86_64      1:1.0.2k-21.el7_9      rhel-7-server-rpms
//! ```
//!
//! Headers, blank lines, obsoleting notices and anything else that does not
//! fit `name.arch version repo` exactly are skipped.

use std::sync::LazyLock;

use regex::bytes::Regex;

use crate::error::PackageError;
use crate::types::UpdateRecord;

/// ASCII-only classes: yum never emits non-ASCII package metadata and
/// `\w` must not widen to Unicode letters.
static PACKAGE_WITH_UPDATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?-u)^([\w\-_]*)\.([\w\-_]+)\s+(\d+[\w.\-_:]+)\s+([\w.\-_]+)\s*$")
        .expect("package line pattern is valid")
});

/// Parse the combined output of `yum check-update`
///
/// Records come back in line order, duplicates included.
///
/// # Errors
/// Returns [`PackageError::ParseError`] when a line matches the package
/// pattern but does not split into `name.arch`, version and repository.
pub fn parse_updates_available(output: &[u8]) -> Result<Vec<UpdateRecord>, PackageError> {
    let mut packages = Vec::new();

    for line in output.split(|b| *b == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if !PACKAGE_WITH_UPDATE.is_match(line) {
            continue;
        }
        packages.push(record_from_line(line)?);
    }

    Ok(packages)
}

/// Safeguard in case the pattern and the field split disagree
fn record_from_line(line: &[u8]) -> Result<UpdateRecord, PackageError> {
    let line = std::str::from_utf8(line)
        .map_err(|e| PackageError::ParseError(format!("non UTF-8 package line: {e}")))?;

    let fields: Vec<&str> = line.split_whitespace().collect();
    let [name_arch, version, repo] = fields.as_slice() else {
        return Err(PackageError::ParseError(format!(
            "invalid parsed fields: {fields:?}"
        )));
    };

    let Some((name, arch)) = name_arch.split_once('.') else {
        return Err(PackageError::ParseError(format!(
            "missing architecture in {name_arch:?}"
        )));
    };

    Ok(UpdateRecord {
        name: name.to_string(),
        arch: arch.to_string(),
        version: (*version).to_string(),
        repo: (*repo).to_string(),
    })
}
