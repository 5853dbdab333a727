use std::collections::HashMap;

use crate::analyzers::classify::BinTable;
use crate::analyzers::types::{ClassifiedDay, LevelCount};

/// Counts days per level, in severity order, with each level's color taken
/// from the bin table by label. Levels with no days are omitted.
pub fn tally_levels(days: &[ClassifiedDay], bins: &BinTable) -> Vec<LevelCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for day in days {
        *counts.entry(day.level.as_str()).or_default() += 1;
    }

    bins.bins()
        .iter()
        .filter_map(|bin| {
            counts.get(bin.level.as_str()).map(|&days| LevelCount {
                level: bin.level.clone(),
                days,
                color: bin.color.clone(),
            })
        })
        .collect()
}
