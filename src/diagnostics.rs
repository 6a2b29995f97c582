use anyhow::Result;

use crate::controller::ClockController;
use crate::florence::encode_default;
use crate::time_provider::SelectedTimeSource;
use crate::zone::detect::LocalZoneHint;
use crate::zone::table::{LoadedTable, TableSource};

pub fn run_diagnostics(
    selected: &SelectedTimeSource,
    table_source: &TableSource,
    loaded: LoadedTable,
    hint: &LocalZoneHint,
) -> Result<()> {
    let sample = selected.source.now()?;
    println!("Florence clock diagnostics");
    println!("Selected time source: {}", selected.label);
    println!(
        "Sample (unix ms): {} from {}",
        sample.unix_millis, sample.source
    );
    println!("Local time: {}", sample.to_local_datetime()?.to_rfc3339());
    println!("Florence time: {}", encode_default(sample.day_fraction()));
    println!("Detected local zone: {}", hint.describe());
    println!("Timezone table: {}", table_source.describe());
    println!("Timezone entries: {}", loaded.table.len());
    if let Some(reason) = loaded.fallback_reason.as_deref() {
        println!("Fallback reason: {reason}");
    }
    match hint.match_index(&loaded.table) {
        Some(_) => println!("Zone match: detected"),
        None => println!("Zone match: none, defaulting to UTC"),
    }

    let controller = ClockController::with_hint(loaded.table, hint);
    let state = controller.state();
    println!(
        "Default timezone: [{}] {}",
        state.timezone_index,
        controller.selected_entry().label()
    );
    Ok(())
}
