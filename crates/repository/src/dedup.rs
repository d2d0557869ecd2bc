//! Keep the newest build of each `(name, arch)`

use crate::record::PackageRecord;
use std::collections::BTreeMap;

/// Deduplicate records, keeping the highest version per `(name, arch)`
///
/// When either side's version fails to parse the record selected so far is
/// kept and a warning names the offending string. Output is ordered by
/// `(name, arch)`.
#[must_use]
pub fn deduplicate(records: Vec<PackageRecord>) -> Vec<PackageRecord> {
    let mut selected: BTreeMap<(String, String), PackageRecord> = BTreeMap::new();

    for record in records {
        let key = (record.name.clone(), record.arch.clone());
        let Some(current) = selected.get(&key) else {
            selected.insert(key, record);
            continue;
        };

        match (current.version_key(), record.version_key()) {
            (Ok(old), Ok(new)) => {
                if new > old {
                    tracing::debug!(
                        package = %key.0,
                        arch = %key.1,
                        from = %old,
                        to = %new,
                        "newer build replaces older"
                    );
                    selected.insert(key, record);
                }
            }
            (old, new) => {
                let bad = if old.is_err() { &current.version } else { &record.version };
                tracing::warn!(
                    package = %key.0,
                    arch = %key.1,
                    version = %bad,
                    kept = %current.nevra(),
                    ignored = %record.nevra(),
                    parsed = new.is_ok(),
                    "version comparison failed, keeping current record"
                );
            }
        }
    }

    selected.into_values().collect()
}
