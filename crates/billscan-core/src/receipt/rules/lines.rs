//! Line segmentation and item-line classification.

use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::trace;

use crate::models::bill::LineItem;

use super::patterns::{ITEM_LINE, ITEM_NAME_NOISE};

/// Split raw OCR text into trimmed, non-empty lines.
///
/// The iterator borrows `raw_text`; calling this again on the same text
/// yields the same sequence.
pub fn segment_lines(raw_text: &str) -> impl Iterator<Item = &str> {
    raw_text
        .split(['\n', '\r'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
}

/// Remove every character that may not appear in an item name.
pub fn sanitize_item_name(name: &str) -> String {
    ITEM_NAME_NOISE.replace_all(name, "").trim().to_string()
}

/// Classify a single line as an item line.
///
/// Returns `None` for lines that do not carry a name followed by quantity,
/// rate and amount, and for lines whose numbers do not fit the target types.
pub fn classify_line(line: &str) -> Option<LineItem> {
    let Some(caps) = ITEM_LINE.captures(line) else {
        trace!("Skipping non-item line: {:?}", line);
        return None;
    };

    let quantity = caps["quantity"].parse::<u64>().ok();
    let rate = Decimal::from_str(&caps["rate"]).ok();
    let amount = Decimal::from_str(&caps["amount"]).ok();

    match (quantity, rate, amount) {
        (Some(quantity), Some(rate), Some(amount)) => Some(LineItem {
            item: sanitize_item_name(&caps["name"]),
            quantity,
            rate,
            amount,
        }),
        _ => {
            trace!("Item line has unparseable numbers: {:?}", line);
            None
        }
    }
}

/// Extract every item line from raw OCR text, in order of appearance.
pub fn extract_line_items(raw_text: &str) -> Vec<LineItem> {
    segment_lines(raw_text).filter_map(classify_line).collect()
}
