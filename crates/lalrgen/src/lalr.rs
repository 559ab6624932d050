//! Merging of LR(1) states that share an LR(0) core.

use crate::{
    grammar::SymbolID,
    lr1::{CoreItem, Item, ItemSet, LR1Automaton, StateID, Transition},
    types::Map,
    GenerateError,
};
use indexmap::map::Entry;
use std::collections::BTreeSet;

#[derive(Debug)]
pub struct LALRState {
    /// The union of the items of every merged LR(1) state.
    pub items: ItemSet,
    /// The LR(1) states folded into this state, in discovery order.
    pub merged: Vec<StateID>,
}

impl LALRState {
    pub fn core(&self) -> BTreeSet<CoreItem> {
        self.items.iter().map(Item::core).collect()
    }
}

#[derive(Debug)]
pub struct LALRAutomaton {
    pub states: Map<StateID, LALRState>,
    pub transitions: Map<Transition, StateID>,
    /// Maps each LR(1) state to the state it was merged into.
    pub lr1_states: Map<StateID, StateID>,
}

impl LALRAutomaton {
    pub fn state(&self, id: StateID) -> &LALRState {
        &self.states[&id]
    }

    pub fn transition(&self, from: StateID, symbol: SymbolID) -> Option<StateID> {
        self.transitions.get(&Transition { from, symbol }).copied()
    }
}

/// Merge the LR(1) states with identical cores.
///
/// Groups are numbered in order of the first discovery of each core, so the
/// group of LR(1) state 0 becomes state 0.
pub fn merge(lr1: &LR1Automaton) -> Result<LALRAutomaton, GenerateError> {
    let mut groups = Map::<BTreeSet<CoreItem>, Vec<StateID>>::default();
    for (&id, items) in &lr1.states {
        let core = items.iter().map(Item::core).collect();
        groups.entry(core).or_default().push(id);
    }

    let automaton = fold(lr1, groups.into_values())?;

    tracing::debug!(
        lr1_states = lr1.states.len(),
        states = automaton.states.len(),
        "LALR(1) states merged"
    );

    Ok(automaton)
}

/// Keep every LR(1) state as it is.
///
/// The result has the same shape as the one from [`merge`], so the table
/// builder and the driver work unchanged on canonical LR(1) tables.
pub fn canonical(lr1: &LR1Automaton) -> LALRAutomaton {
    let groups = lr1.states.keys().map(|&id| vec![id]);
    match fold(lr1, groups) {
        Ok(automaton) => automaton,
        Err(..) => unreachable!("a one-to-one grouping never merges transitions"),
    }
}

fn fold<I>(lr1: &LR1Automaton, groups: I) -> Result<LALRAutomaton, GenerateError>
where
    I: IntoIterator<Item = Vec<StateID>>,
{
    let mut states = Map::default();
    let mut lr1_states = Map::default();
    for (i, merged) in groups.into_iter().enumerate() {
        let id = StateID::from_index(i);
        let items: ItemSet = merged
            .iter()
            .flat_map(|s| lr1.state(*s).iter().copied())
            .collect();
        for &s in &merged {
            lr1_states.insert(s, id);
        }
        states.insert(id, LALRState { items, merged });
    }

    let mut transitions = Map::default();
    for (edge, to) in &lr1.transitions {
        let key = Transition {
            from: lr1_states[&edge.from],
            symbol: edge.symbol,
        };
        let next = lr1_states[to];
        match transitions.entry(key) {
            Entry::Vacant(entry) => {
                entry.insert(next);
            }
            Entry::Occupied(entry) if *entry.get() == next => {}
            Entry::Occupied(entry) => {
                return Err(GenerateError::InconsistentMerge {
                    state: key.from,
                    symbol: key.symbol,
                    first: *entry.get(),
                    second: next,
                });
            }
        }
    }

    Ok(LALRAutomaton {
        states,
        transitions,
        lr1_states,
    })
}
