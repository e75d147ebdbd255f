use std::{collections::HashSet, fmt};

use crate::types::{EventContext, LogPosition, OperationType, OrderEvent};

/// Category of the categorized event views.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Swaps,
    Deposits,
    Withdrawals,
    UpdateCurves,
    Creations,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Swaps,
        Category::Deposits,
        Category::Withdrawals,
        Category::UpdateCurves,
        Category::Creations,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Category::Swaps => "swaps",
            Category::Deposits => "deposits",
            Category::Withdrawals => "withdrawals",
            Category::UpdateCurves => "updateCurves",
            Category::Creations => "creations",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Categories an order event is listed under.
///
/// Every `UpdateOrder` is a curve update, balance changing ones are listed
/// as deposits or withdrawals too.
pub fn categories(event: &OrderEvent) -> &'static [Category] {
    match (event, event.operation()) {
        (OrderEvent::Swap(_), _) => &[Category::Swaps],
        (OrderEvent::UpdateOrder(_), OperationType::Deposit) => {
            &[Category::Deposits, Category::UpdateCurves]
        }
        (OrderEvent::UpdateOrder(_), OperationType::Withdraw) => {
            &[Category::Withdrawals, Category::UpdateCurves]
        }
        (OrderEvent::UpdateOrder(_), _) => &[Category::UpdateCurves],
        (OrderEvent::WithdrawAssets(_), _) => &[Category::Withdrawals],
        (OrderEvent::OrderInitialized(_), _) => &[Category::Creations],
    }
}

/// Events of an order, each stored once and indexed per category.
///
/// Category lists keep insertion order, the merged views are derived from
/// the stored events on demand.
#[derive(Clone, Debug)]
pub struct EventsCollection<T> {
    events: Vec<EventContext<T>>,
    index: [Vec<usize>; 5],
    positions: HashSet<LogPosition>,
    incomplete: bool,
}

impl<T> Default for EventsCollection<T> {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            index: Default::default(),
            positions: HashSet::new(),
            incomplete: false,
        }
    }
}

impl<T> EventsCollection<T> {
    /// Adds the event under the given categories.
    ///
    /// Returns `false` and keeps the collection intact if an event at the
    /// same ledger position is already present.
    pub fn insert(&mut self, event: EventContext<T>, categories: &[Category]) -> bool {
        if !self.positions.insert(event.position()) {
            return false;
        }
        let idx = self.events.len();
        self.events.push(event);
        for category in categories {
            self.index[Self::slot(*category)].push(idx);
        }
        true
    }

    fn slot(category: Category) -> usize {
        match category {
            Category::Swaps => 0,
            Category::Deposits => 1,
            Category::Withdrawals => 2,
            Category::UpdateCurves => 3,
            Category::Creations => 4,
        }
    }

    pub fn category(&self, category: Category) -> impl Iterator<Item = &EventContext<T>> {
        self.index[Self::slot(category)]
            .iter()
            .map(|idx| &self.events[*idx])
    }

    pub fn category_len(&self, category: Category) -> usize {
        self.index[Self::slot(category)].len()
    }

    /// All events, most recent block first, in log order within a block.
    pub fn all(&self) -> Vec<&EventContext<T>> {
        let mut all = self.events.iter().collect::<Vec<_>>();
        all.sort_by(|a, b| {
            b.block_number
                .cmp(&a.block_number)
                .then(a.log_index.cmp(&b.log_index))
        });
        all
    }

    /// All events in ledger order.
    pub fn chronological(&self) -> Vec<&EventContext<T>> {
        let mut all = self.events.iter().collect::<Vec<_>>();
        all.sort_by_key(|e| e.position());
        all
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Event retrieval stopped early, the collection may miss events.
    pub fn incomplete(&self) -> bool {
        self.incomplete
    }

    pub fn set_incomplete(&mut self, incomplete: bool) {
        self.incomplete = incomplete;
    }

    /// Transforms every payload, keeping positions and categories.
    pub fn map<O>(&self, mut f: impl FnMut(&EventContext<T>) -> O) -> EventsCollection<O> {
        EventsCollection {
            events: self.events.iter().map(|e| e.pass(f(e))).collect(),
            index: self.index.clone(),
            positions: self.positions.clone(),
            incomplete: self.incomplete,
        }
    }
}

impl EventsCollection<OrderEvent> {
    /// Adds an order event under the categories derived from its payload.
    pub fn push(&mut self, event: EventContext<OrderEvent>) -> bool {
        let categories = categories(event.event());
        self.insert(event, categories)
    }
}
