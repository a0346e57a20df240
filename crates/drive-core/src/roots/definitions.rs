use std::collections::{BTreeMap, BTreeSet};

/// Serialize active roots into the compact checkpoint form.
///
/// Entries are `repository:nativeId` pairs joined by commas, in repository
/// then id order, so two equal root sets always serialize identically.
pub fn serialize_root_definitions(roots: &BTreeMap<String, BTreeSet<String>>) -> String {
    let mut parts = Vec::new();
    for (repository, ids) in roots {
        for id in ids {
            parts.push(format!("{repository}:{id}"));
        }
    }
    parts.join(",")
}

/// Parse a checkpoint root-definition string back into the per-repository
/// set. Whitespace around entries is tolerated; entries without a
/// repository prefix are skipped.
pub fn parse_root_definitions(definitions: &str) -> BTreeMap<String, BTreeSet<String>> {
    let mut roots: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for part in definitions.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let Some((repository, native_id)) = part.split_once(':') else {
            tracing::warn!(entry = part, "Skipping malformed root definition");
            continue;
        };
        if repository.is_empty() || native_id.is_empty() {
            tracing::warn!(entry = part, "Skipping malformed root definition");
            continue;
        }
        roots
            .entry(repository.to_owned())
            .or_default()
            .insert(native_id.to_owned());
    }
    roots
}
