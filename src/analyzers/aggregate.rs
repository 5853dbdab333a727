use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::analyzers::types::{DailyAggregate, HourlyRecord};

/// Groups hourly records by calendar date and averages each target value.
///
/// Inputs must already be gap-free; NaN is not skipped. Output has one entry
/// per distinct date, in ascending date order.
pub fn aggregate_daily(records: &[HourlyRecord]) -> Vec<DailyAggregate> {
    let mut groups: BTreeMap<NaiveDate, (Vec<f64>, usize)> = BTreeMap::new();

    for record in records {
        let (sums, count) = groups
            .entry(record.date)
            .or_insert_with(|| (vec![0.0; record.values.len()], 0));

        for (sum, value) in sums.iter_mut().zip(&record.values) {
            *sum += value;
        }
        *count += 1;
    }

    groups
        .into_iter()
        .map(|(date, (sums, hours))| DailyAggregate {
            date,
            means: sums.into_iter().map(|s| s / hours as f64).collect(),
            hours,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(y: i32, m: u32, d: u32, values: &[f64]) -> HourlyRecord {
        HourlyRecord {
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            values: values.to_vec(),
        }
    }

    #[test]
    fn test_same_date_is_averaged() {
        let daily = aggregate_daily(&[record(2010, 1, 1, &[10.0]), record(2010, 1, 1, &[20.0])]);

        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].means, vec![15.0]);
        assert_eq!(daily[0].hours, 2);
    }

    #[test]
    fn test_dates_are_unique_and_ascending() {
        let daily = aggregate_daily(&[
            record(2010, 1, 2, &[1.0, 2.0]),
            record(2010, 1, 1, &[3.0, 4.0]),
            record(2010, 1, 2, &[5.0, 6.0]),
            record(2009, 12, 31, &[7.0, 8.0]),
        ]);

        let dates: Vec<String> = daily.iter().map(|d| d.date.to_string()).collect();
        assert_eq!(dates, vec!["2009-12-31", "2010-01-01", "2010-01-02"]);
        assert_eq!(daily[2].means, vec![3.0, 4.0]);
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate_daily(&[]).is_empty());
    }
}
