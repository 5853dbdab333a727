use crate::parser::is_missing_token;

/// One cell of a categorical column such as wind direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Category {
    Known(String),
    /// The "indeterminate" token (calm/variable wind, `cv`).
    Sentinel,
    /// An empty cell or missing token.
    Blank,
}

impl Category {
    pub fn parse(cell: &str, sentinel: &str) -> Self {
        let cell = cell.trim();
        if cell == sentinel {
            Category::Sentinel
        } else if is_missing_token(cell) {
            Category::Blank
        } else {
            Category::Known(cell.to_string())
        }
    }

    /// Text written back to the table. Blanks become empty cells.
    pub fn render(&self, sentinel: &str) -> String {
        match self {
            Category::Known(v) => v.clone(),
            Category::Sentinel => sentinel.to_string(),
            Category::Blank => String::new(),
        }
    }
}

/// Result of [`backfill`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repair {
    pub values: Vec<Category>,
    /// Sentinels present before repair.
    pub sentinels: usize,
    /// Sentinels replaced by a later known value.
    pub repaired: usize,
    /// Blank cells replaced by a later known value.
    pub blanks_filled: usize,
    /// Sentinels with no known value after them; left as sentinels.
    pub unresolved: usize,
}

/// Replaces every sentinel (and blank) with the next known value later in the
/// series. Cells with nothing known after them keep their original tag.
pub fn backfill(values: &[Category]) -> Repair {
    let mut out = values.to_vec();
    let mut next: Option<&str> = None;

    let mut sentinels = 0;
    let mut repaired = 0;
    let mut blanks_filled = 0;
    let mut unresolved = 0;

    for (i, value) in values.iter().enumerate().rev() {
        match value {
            Category::Known(v) => next = Some(v.as_str()),
            Category::Sentinel => {
                sentinels += 1;
                match next {
                    Some(v) => {
                        out[i] = Category::Known(v.to_string());
                        repaired += 1;
                    }
                    None => unresolved += 1,
                }
            }
            Category::Blank => {
                if let Some(v) = next {
                    out[i] = Category::Known(v.to_string());
                    blanks_filled += 1;
                }
            }
        }
    }

    Repair {
        values: out,
        sentinels,
        repaired,
        blanks_filled,
        unresolved,
    }
}
