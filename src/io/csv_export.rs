use std::path::Path;

use crate::error::{Result, SchedulerError};
use crate::model::Schedule;

/// Export the schedule to a semicolon-delimited CSV file.
///
/// One row per attempt in timeline order:
/// Team ; Task ; Attempt ; Number ; Slot ; Date
/// Dates are formatted as DD/MM/YYYY and left empty when the project has no span.
/// Returns the number of attempts written.
pub fn export_csv(schedule: &Schedule, path: &Path) -> Result<usize> {
    let file = std::fs::File::create(path).map_err(|e| SchedulerError::io(path, e))?;
    let written = write_csv(schedule, file)?;
    tracing::info!(path = %path.display(), rows = written, "schedule exported");
    Ok(written)
}

pub fn write_csv<W: std::io::Write>(schedule: &Schedule, out: W) -> Result<usize> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .from_writer(out);

    wtr.write_record(["Team", "Task", "Attempt", "Number", "Slot", "Date"])?;

    let hierarchy = schedule.hierarchy();
    let mut rows = 0;
    for group in schedule.order().ids() {
        let Some(group) = hierarchy.group(*group) else {
            continue;
        };
        for unit in hierarchy.units_of(group.id) {
            let Some(unit) = hierarchy.unit(*unit) else {
                continue;
            };
            for leaf in hierarchy.leaves_of(unit.id) {
                let Some(leaf) = hierarchy.leaf(*leaf) else {
                    continue;
                };
                let date = schedule
                    .slot_date(leaf.slot)
                    .map(|d| d.format("%d/%m/%Y").to_string())
                    .unwrap_or_default();
                let number = leaf.number.to_string();
                let slot = leaf.slot.to_string();
                wtr.write_record([
                    group.label.as_str(),
                    unit.label.as_str(),
                    leaf.label.as_str(),
                    number.as_str(),
                    slot.as_str(),
                    date.as_str(),
                ])?;
                rows += 1;
            }
        }
    }

    wtr.flush().map_err(|e| SchedulerError::Csv(e.into()))?;
    Ok(rows)
}
