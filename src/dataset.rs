use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use crate::domain::GridError;

pub type RowId = u64;

/// Non-negative currency amount with two decimal places, stored in cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(u64);

impl Money {
    pub fn from_cents(cents: u64) -> Self {
        Money(cents)
    }

    /// Rounds to the nearest cent. Negative and non-finite values become zero.
    pub fn from_f64(value: f64) -> Self {
        if !value.is_finite() || value <= 0.0 {
            return Money(0);
        }
        Money((value * 100.0).round() as u64)
    }

    pub fn cents(&self) -> u64 {
        self.0
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Fixed two decimal rendering, e.g. `$3.50`.
    pub fn display(&self) -> String {
        format!("${}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Shortest decimal form: `3`, `3.5`, `3.73`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (units, cents) = (self.0 / 100, self.0 % 100);
        if cents == 0 {
            write!(f, "{units}")
        } else if cents % 10 == 0 {
            write!(f, "{units}.{}", cents / 10)
        } else {
            write!(f, "{units}.{cents:02}")
        }
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % 100 == 0 {
            serializer.serialize_u64(self.0 / 100)
        } else {
            serializer.serialize_f64(self.as_f64())
        }
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Ok(Money::from_f64(value))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub id: RowId,
    pub item: String,
    pub qty: u64,
    pub price: Money,
    pub total: Money,
    pub selected: bool,
}

impl Row {
    /// Fails when `qty * price` does not fit in cents.
    pub fn new(
        id: RowId,
        item: impl Into<String>,
        qty: u64,
        price: Money,
    ) -> Result<Self, GridError> {
        let total = qty.checked_mul(price.cents()).ok_or_else(|| GridError::InvalidRow {
            id,
            reason: "total overflows".to_string(),
        })?;
        Ok(Row {
            id,
            item: item.into(),
            qty,
            price,
            total: Money::from_cents(total),
            selected: false,
        })
    }

    /// Case-insensitive substring match over the textual form of every field.
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        needle.is_empty()
            || self.id.to_string().contains(needle)
            || self.item.to_lowercase().contains(needle)
            || self.qty.to_string().contains(needle)
            || self.price.to_string().contains(needle)
            || self.total.to_string().contains(needle)
    }
}

/// The fixed rows of a session. Only the selection flags change after load.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    rows: Vec<Row>,
    index: HashMap<RowId, usize>, // id -> position in rows
}

impl Dataset {
    pub fn from_tuples<I, S>(tuples: I) -> Result<Self, GridError>
    where
        I: IntoIterator<Item = (RowId, S, u64, Money)>,
        S: Into<String>,
    {
        let mut dataset = Dataset::default();
        for (id, item, qty, price) in tuples {
            if qty == 0 {
                return Err(GridError::InvalidRow {
                    id,
                    reason: "qty must be positive".to_string(),
                });
            }
            let row = Row::new(id, item, qty, price)?;
            if dataset.index.insert(id, dataset.rows.len()).is_some() {
                return Err(GridError::DuplicateId(id));
            }
            dataset.rows.push(row);
        }
        debug!("Dataset with {} rows", dataset.rows.len());
        Ok(dataset)
    }

    /// Built-in demo data: 50 rows with ids 1001..=1050.
    pub fn sample() -> Self {
        let tuples = (0..50u64).map(|i| {
            let qty = i % 7 + 1;
            let price = Money::from_f64((i as f64 * 0.73) % 97.0 + 3.0);
            let letter = char::from(b'A' + (i % 26) as u8);
            (1001 + i, format!("Item {letter}-{}", i + 1), qty, price)
        });
        let mut dataset = Dataset::default();
        // qty <= 7 and price < $100, so every total fits
        let rows = tuples.filter_map(|(id, item, qty, price)| Row::new(id, item, qty, price).ok());
        for row in rows {
            dataset.index.insert(row.id, dataset.rows.len());
            dataset.rows.push(row);
        }
        dataset
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, id: RowId) -> Option<&Row> {
        self.index.get(&id).map(|&idx| &self.rows[idx])
    }

    pub(crate) fn get_mut(&mut self, id: RowId) -> Option<&mut Row> {
        self.index.get(&id).map(|&idx| &mut self.rows[idx])
    }
}
