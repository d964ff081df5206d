use log::{debug, info};

use crate::algorithms::stats::{mean, median, observed};
use crate::core::domain::{AsteroidRecord, FlatRecord, Measurements, NumericColumn};

/// Strategy used to fill gaps in a numeric column
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImputeStrategy {
    Mean,
    Median,
    Constant(f64),
}

/// Impute missing values in a column using the given strategy.
///
/// When the strategy has no value to offer (mean or median of a column with
/// no observed values) the column is returned unchanged.
pub fn impute_missing(values: &[Option<f64>], strategy: ImputeStrategy) -> Vec<Option<f64>> {
    let present = observed(values.iter().copied());
    let fill = match strategy {
        ImputeStrategy::Mean => mean(&present),
        ImputeStrategy::Median => median(&present),
        ImputeStrategy::Constant(value) => Some(value),
    };

    match fill {
        Some(fill) => values.iter().map(|v| Some(v.unwrap_or(fill))).collect(),
        None => values.to_vec(),
    }
}

/// Coerce a raw numeric field; non-finite values count as missing.
fn coerce_numeric(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Clean a batch of flat records.
///
/// Every numeric column is coerced to finite floats and its gaps are filled
/// with the column median over this batch; a column with no observed values
/// stays empty. The hazard flag becomes a strict boolean (absent means
/// `false`). The input is left untouched.
pub fn clean_records(records: &[FlatRecord]) -> Vec<AsteroidRecord> {
    let mut cleaned: Vec<AsteroidRecord> = records
        .iter()
        .map(|record| AsteroidRecord {
            date: record.date,
            id: record.id.clone(),
            name: record.name.clone(),
            measurements: Measurements::default(),
            is_potentially_hazardous: record.is_potentially_hazardous.unwrap_or(false),
            close_approach_date: record.close_approach_date,
        })
        .collect();

    for column in NumericColumn::ALL {
        let values: Vec<Option<f64>> = records
            .iter()
            .map(|r| coerce_numeric(column.get(&r.measurements)))
            .collect();
        let missing = values.iter().filter(|v| v.is_none()).count();
        let filled = impute_missing(&values, ImputeStrategy::Median);

        if missing == values.len() {
            debug!("Column {} has no observed values; leaving gaps", column.name());
        } else if missing > 0 {
            debug!("Filled {} gaps in {} with the median", missing, column.name());
        }

        for (record, value) in cleaned.iter_mut().zip(filled) {
            *column.get_mut(&mut record.measurements) = value;
        }
    }

    info!("Cleaned {} records", cleaned.len());
    cleaned
}
