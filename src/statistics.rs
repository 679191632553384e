use std::collections::BTreeMap;

use crate::domain::{DatasetStatistics, EquipmentRow};

fn mean(total: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

/// Aggregates a dataset's rows. Empty input yields zero averages and an
/// empty distribution rather than NaN.
pub fn compute_statistics(rows: &[EquipmentRow]) -> DatasetStatistics {
    let mut flowrate_total = 0.0;
    let mut pressure_total = 0.0;
    let mut temperature_total = 0.0;
    let mut type_distribution: BTreeMap<String, u64> = BTreeMap::new();

    for row in rows {
        flowrate_total += row.flowrate;
        pressure_total += row.pressure;
        temperature_total += row.temperature;
        *type_distribution
            .entry(row.equipment_type.clone())
            .or_insert(0) += 1;
    }

    let count = rows.len();
    DatasetStatistics {
        total_count: count as u64,
        avg_flowrate: mean(flowrate_total, count),
        avg_pressure: mean(pressure_total, count),
        avg_temperature: mean(temperature_total, count),
        type_distribution,
    }
}
