//! Compiled patterns for restaurant receipt extraction.
//!
//! Every pattern is built once per process and shared by all callers.

use lazy_static::lazy_static;
use regex::Regex;

/// Label, optional `:` or `-` separator, then the number. The number is
/// digits with at most one `.` or `,` in it.
const AMOUNT_SUFFIX: &str = r"\s*[:\-]?\s*(?P<value>[0-9]+[.,]?[0-9]*)";

fn labeled_amount(label: &str) -> Regex {
    Regex::new(&format!(r"(?i){}{}", label, AMOUNT_SUFFIX)).unwrap()
}

lazy_static! {
    // Item line: name, quantity, rate, amount. The name is non-greedy so the
    // first run of three numbers after it is taken.
    pub static ref ITEM_LINE: Regex = Regex::new(
        r"^(?P<name>.+?)\s+(?P<quantity>[0-9]+)\s+(?P<rate>[0-9]+(?:\.[0-9]+)?)\s+(?P<amount>[0-9]+(?:\.[0-9]+)?)"
    ).unwrap();

    // Anything that may not appear in an item name
    pub static ref ITEM_NAME_NOISE: Regex = Regex::new(r"[^a-zA-Z0-9 ()&]").unwrap();

    // "Total" / "Total Amount". Also sees the "Total" inside "Grand Total";
    // the first occurrence in the text wins either way.
    pub static ref TOTAL_AMOUNT: Regex = labeled_amount(r"total\s*(?:amount)?");

    pub static ref FINAL_AMOUNT: Regex =
        labeled_amount(r"(?:grand\s*total|final\s*total|final\s*amount)");

    // Tax components
    pub static ref CGST: Regex = labeled_amount("cgst");
    pub static ref SGST: Regex = labeled_amount("sgst");
    pub static ref VAT: Regex = labeled_amount("vat");
}
