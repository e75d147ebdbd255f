use std::io;

use serde::Serialize;

use super::{EnrichedEvents, day};
use crate::types::{Direction, EnrichedDetails, EnrichedEvent, EventContext, OperationType};

const HEADER: [&str; 6] = ["Date", "Block", "Operation", "Direction", "Amount", "InterestRate"];

/// Row of the CSV export.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CsvRow {
    pub date: String,
    pub block: u64,
    pub operation: OperationType,
    pub direction: String,
    pub amount: String,
    pub interest_rate: String,
}

/// Direction and amount columns, `None` for rows carrying no amount.
fn direction_and_amount(event: &EnrichedEvent) -> Option<(String, String)> {
    match (&event.details, event.operation()) {
        (EnrichedDetails::Swap(swap), _) => {
            let flow = swap.flow.as_ref()?;
            match swap.direction {
                Direction::Lend => Some((swap.direction.to_string(), flow.out_amount.clone())),
                Direction::Borrow => Some((swap.direction.to_string(), flow.in_amount.clone())),
                Direction::Other => None,
            }
        }
        (EnrichedDetails::UpdateOrder(update), OperationType::Deposit) => Some((
            "DEPOSIT".to_string(),
            update.ft_change.trim_start_matches('-').to_string(),
        )),
        (EnrichedDetails::UpdateOrder(update), OperationType::Withdraw) => Some((
            "WITHDRAW".to_string(),
            update.ft_change.trim_start_matches('-').to_string(),
        )),
        (EnrichedDetails::OrderInitialized(init), _) => {
            Some(("CREATE".to_string(), init.max_xt_reserve.clone()))
        }
        _ => None,
    }
}

/// `"0.0"`, `"-0"` and the empty string all carry no amount.
fn is_zero(amount: &str) -> bool {
    amount
        .trim_start_matches('-')
        .chars()
        .all(|c| c == '0' || c == '.')
}

fn csv_row(ctx: &EventContext<EnrichedEvent>) -> Option<CsvRow> {
    let event = ctx.event();
    let date = event.date()?;
    let (direction, amount) =
        direction_and_amount(event).filter(|(_, amount)| !is_zero(amount))?;
    let interest_rate = match &event.details {
        EnrichedDetails::Swap(swap) => swap
            .avg_matched_interest_rate
            .filter(|r| *r != 0.0)
            .map(|r| r.to_string())
            .unwrap_or_default(),
        _ => String::new(),
    };
    Some(CsvRow {
        date: day(&date).to_string(),
        block: ctx.block_number(),
        operation: event.operation(),
        direction,
        amount,
        interest_rate,
    })
}

/// Rows of the CSV export in ledger order.
///
/// Events without a resolved date, without an amount or with a zero amount
/// are left out.
pub fn csv_rows(events: &EnrichedEvents) -> Vec<CsvRow> {
    events
        .chronological()
        .into_iter()
        .filter_map(csv_row)
        .collect()
}

/// Writes the CSV export, header first.
pub fn write_csv<W: io::Write>(events: &EnrichedEvents, writer: W) -> Result<(), csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);
    writer.write_record(HEADER)?;
    for row in csv_rows(events) {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
