//! Calculation of the ACTION/GOTO table.

use crate::{
    grammar::{Grammar, NonterminalID, ProductionID, SymbolID, TerminalID},
    lalr::LALRAutomaton,
    lr1::StateID,
    types::Map,
    util::display_fn,
};
use indexmap::map::Entry;
use std::fmt;

#[derive(Debug)]
pub struct ParseTable {
    pub states: Map<StateID, ParseTableRow>,
    conflicts: Vec<Conflict>,
}

impl ParseTable {
    /// Return `ACTION[state, lookahead]`, or `None` for an error cell.
    pub fn action(&self, state: StateID, lookahead: TerminalID) -> Option<Action> {
        self.states.get(&state)?.actions.get(&lookahead).copied()
    }

    /// Return `GOTO[state, symbol]`.
    pub fn goto(&self, state: StateID, symbol: NonterminalID) -> Option<StateID> {
        self.states.get(&state)?.gotos.get(&symbol).copied()
    }

    /// The actions dropped while filling the table.
    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts[..]
    }
}

#[derive(Debug, Default)]
pub struct ParseTableRow {
    pub actions: Map<TerminalID, Action>,
    pub gotos: Map<NonterminalID, StateID>,
}

/// The content of a non-empty ACTION cell.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Action {
    /// Consume the lookahead and push the given state.
    Shift(StateID),

    /// Pop the body of the production and follow the GOTO of its head.
    Reduce(ProductionID),

    Accept,
}

impl Action {
    // `"shift 3"`, `"reduce by C -> c C"` or `"accept"`
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| match self {
            Self::Shift(next) => write!(f, "shift {}", next),
            Self::Reduce(p) => write!(f, "reduce by {}", g.production(*p).display(g)),
            Self::Accept => f.write_str("accept"),
        })
    }
}

/// The compact form used in table cells: `s3`, `r2`, `acc`.
impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shift(next) => write!(f, "s{}", next),
            Self::Reduce(p) => write!(f, "r{}", p),
            Self::Accept => f.write_str("acc"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConflictKind {
    /// A reduce competed with a shift or an accept.
    ShiftReduce,
    ReduceReduce,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShiftReduce => f.write_str("shift/reduce"),
            Self::ReduceReduce => f.write_str("reduce/reduce"),
        }
    }
}

/// Two actions competed for one cell and only `kept` was written.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub state: StateID,
    pub lookahead: TerminalID,
    pub kept: Action,
    pub dropped: Action,
}

impl Conflict {
    pub fn kind(&self) -> ConflictKind {
        match (self.kept, self.dropped) {
            (Action::Reduce(..), Action::Reduce(..)) => ConflictKind::ReduceReduce,
            _ => ConflictKind::ShiftReduce,
        }
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            write!(
                f,
                "{} conflict in state {} on `{}': {} (kept), {} (dropped)",
                self.kind(),
                self.state,
                g.terminal(self.lookahead),
                self.kept.display(g),
                self.dropped.display(g),
            )
        })
    }
}

/// Fill the ACTION/GOTO table from the items of each state.
///
/// Items are visited in their canonical order. A shift or accept overwrites a
/// reduce already in the cell, while a reduce is written only into an empty
/// cell. Every overwritten or refused action is recorded as a [`Conflict`].
pub fn generate(g: &Grammar, automaton: &LALRAutomaton) -> ParseTable {
    let mut states = Map::default();
    let mut conflicts = vec![];

    for (&id, state) in &automaton.states {
        let mut row = ParseTableRow::default();

        for item in &state.items {
            let (lookahead, action) = match item.next_symbol(g) {
                // [X -> ... . t ...]
                Some(SymbolID::T(t)) => match automaton.transition(id, SymbolID::T(t)) {
                    Some(next) => (t, Action::Shift(next)),
                    None => continue,
                },
                Some(SymbolID::N(..)) => continue,
                // [S' -> S ., $]
                None if item.production == ProductionID::ACCEPT => {
                    if item.lookahead != TerminalID::EOI {
                        continue;
                    }
                    (TerminalID::EOI, Action::Accept)
                }
                // [X -> ... ., a]
                None => (item.lookahead, Action::Reduce(item.production)),
            };

            if let Some(conflict) = put_action(&mut row.actions, id, lookahead, action) {
                conflicts.push(conflict);
            }
        }

        for (n, _) in g.nonterminals() {
            if let Some(next) = automaton.transition(id, SymbolID::N(n)) {
                row.gotos.insert(n, next);
            }
        }

        states.insert(id, row);
    }

    tracing::debug!(
        states = states.len(),
        conflicts = conflicts.len(),
        "parse table generated"
    );

    ParseTable { states, conflicts }
}

fn put_action(
    actions: &mut Map<TerminalID, Action>,
    state: StateID,
    lookahead: TerminalID,
    action: Action,
) -> Option<Conflict> {
    let mut entry = match actions.entry(lookahead) {
        Entry::Vacant(entry) => {
            entry.insert(action);
            return None;
        }
        Entry::Occupied(entry) => entry,
    };

    let current = *entry.get();
    if current == action {
        return None;
    }

    let (kept, dropped) = match action {
        Action::Reduce(..) => (current, action),
        Action::Shift(..) | Action::Accept => {
            entry.insert(action);
            (action, current)
        }
    };
    Some(Conflict {
        state,
        lookahead,
        kept,
        dropped,
    })
}
