//! Deterministic text rendering of part records

use crate::types::PartRecord;

/// Render the searchable summary of a record.
///
/// Output depends only on the record's fields, so re-indexing an unchanged
/// record yields byte-identical text.
pub fn render_record(record: &PartRecord) -> String {
    format!(
        "{}\nPart#: {}\nBrand: {}\nCompatibility: {}\nInstallation: {}\nTroubleshooting: {}",
        record.name,
        record.part_number,
        record.brand,
        record.compatibility.join(","),
        record.installation_steps,
        record.troubleshooting.join(","),
    )
}
