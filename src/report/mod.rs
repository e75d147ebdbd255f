//! Renderings of an order history: console report, JSON and CSV exports.
//!
//! None of them alter the history, rendering twice yields identical output.

mod console;
mod csv;
mod json;

pub use self::{
    console::{DisplayOptions, history_table, summary},
    csv::{CsvRow, csv_rows, write_csv},
    json::{HistoryDocument, JsonEvent, to_json},
};

use crate::{collection::EventsCollection, types::EnrichedEvent};

pub type EnrichedEvents = EventsCollection<EnrichedEvent>;

/// First ten characters of the ISO date, the calendar day.
fn day(date: &str) -> &str {
    date.get(..10).unwrap_or(date)
}
