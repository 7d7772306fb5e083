use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dataset::{Dataset, Money, RowId};

pub const PAYLOAD_TYPE: &str = "selection";

/// A selected row as it goes over the wire. The selection flag itself is not sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedRow {
    pub id: RowId,
    pub item: String,
    pub qty: u64,
    pub price: Money,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionPayload {
    #[serde(rename = "type")]
    pub kind: String,
    pub rows: Vec<SelectedRow>,
    pub count: usize,
    pub ts: i64,
}

impl SelectionPayload {
    /// `count` always matches `rows`.
    pub fn new(rows: Vec<SelectedRow>, ts: i64) -> Self {
        SelectionPayload {
            kind: PAYLOAD_TYPE.to_string(),
            count: rows.len(),
            rows,
            ts,
        }
    }

    pub fn now(rows: Vec<SelectedRow>) -> Self {
        Self::new(rows, chrono::Utc::now().timestamp_millis())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Summary as the receiving side shows it: a count line and up to `limit` rows.
    pub fn preview(&self, limit: usize) -> String {
        let plural = if self.count == 1 { "" } else { "s" };
        let mut lines = vec![format!("Got {} row{plural}", self.count)];
        lines.extend(
            self.rows
                .iter()
                .take(limit)
                .map(|r| format!("• #{} {} x{} = {}", r.id, r.item, r.qty, r.total.display())),
        );
        lines.join("\n")
    }
}

/// Label of the send action, e.g. `Send 1 row` or `Send 3 rows`.
pub fn send_label(count: usize) -> String {
    format!("Send {count} row{}", if count == 1 { "" } else { "s" })
}

impl Dataset {
    /// Every selected row of the whole dataset, in dataset order.
    pub fn collect_selection(&self) -> Vec<SelectedRow> {
        let rows: Vec<SelectedRow> = self
            .rows()
            .iter()
            .filter(|r| r.selected)
            .map(|r| SelectedRow {
                id: r.id,
                item: r.item.clone(),
                qty: r.qty,
                price: r.price,
                total: r.total,
            })
            .collect();
        debug!("Collected {} selected rows", rows.len());
        rows
    }

    pub fn selection_payload(&self) -> SelectionPayload {
        SelectionPayload::now(self.collect_selection())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_in_dataset_order() {
        let mut data = Dataset::sample();
        for id in [1030, 1002, 1017] {
            data.set_selected(id, true);
        }
        let ids: Vec<u64> = data.collect_selection().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1002, 1017, 1030]);
        assert_eq!(data.collect_selection(), data.collect_selection());
    }

    #[test]
    fn wire_format() {
        let mut data = Dataset::sample();
        data.set_selected(1001, true);
        data.set_selected(1002, true);
        let payload = SelectionPayload::new(data.collect_selection(), 1700000000000);
        assert_eq!(
            payload.to_json().unwrap(),
            concat!(
                r#"{"type":"selection","rows":["#,
                r#"{"id":1001,"item":"Item A-1","qty":1,"price":3,"total":3},"#,
                r#"{"id":1002,"item":"Item B-2","qty":2,"price":3.73,"total":7.46}"#,
                r#"],"count":2,"ts":1700000000000}"#
            )
        );
    }

    #[test]
    fn empty_selection_has_zero_count() {
        let data = Dataset::sample();
        let payload = data.selection_payload();
        assert_eq!(payload.count, 0);
        assert!(payload.rows.is_empty());
        assert_eq!(payload.kind, "selection");
        assert!(payload.ts > 0);
    }

    #[test]
    fn preview_limits_rows() {
        let mut data = Dataset::sample();
        for id in 1001..=1007 {
            data.set_selected(id, true);
        }
        let json = data.selection_payload().to_json().unwrap();
        let payload = SelectionPayload::from_json(&json).unwrap();
        let preview = payload.preview(5);
        let lines: Vec<&str> = preview.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "Got 7 rows");
        assert_eq!(lines[2], "• #1002 Item B-2 x2 = $7.46");
    }

    #[test]
    fn send_label_pluralizes() {
        assert_eq!(send_label(0), "Send 0 rows");
        assert_eq!(send_label(1), "Send 1 row");
        assert_eq!(send_label(4), "Send 4 rows");
    }
}
