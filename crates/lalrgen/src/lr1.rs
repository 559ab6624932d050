//! The canonical collection of LR(1) item sets.

use crate::{
    first_sets::FirstSets,
    grammar::{Grammar, ProductionID, SymbolID, TerminalID},
    types::{Map, Set},
    util::display_fn,
};
use std::{
    collections::{BTreeSet, VecDeque},
    fmt,
};

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateID(usize);

impl fmt::Debug for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S#{:03}", self.0)
    }
}

impl fmt::Display for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl StateID {
    /// The initial state, whose kernel is `[S' -> . S, $]`.
    pub const START: Self = Self(0);

    pub const fn from_index(index: usize) -> Self {
        Self(index)
    }

    /// Return the discovery order of this state.
    pub const fn index(self) -> usize {
        self.0
    }
}

/// The LR(0) item, a.k.a. LR item core.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoreItem {
    pub production: ProductionID,
    pub dot: u16,
}

// LR(1) item
// A production `X -> Y1 Y2 ... Yn` with a marker position and one lookahead symbol.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Item {
    pub production: ProductionID,
    pub dot: u16,
    pub lookahead: TerminalID,
}

impl Item {
    pub fn new(production: ProductionID, dot: u16, lookahead: TerminalID) -> Self {
        Self {
            production,
            dot,
            lookahead,
        }
    }

    /// Strip the lookahead symbol.
    pub fn core(&self) -> CoreItem {
        CoreItem {
            production: self.production,
            dot: self.dot,
        }
    }

    /// Return the symbol right after the dot, or `None` if the dot is at the end.
    pub fn next_symbol(&self, g: &Grammar) -> Option<SymbolID> {
        g.production(self.production)
            .right()
            .get(usize::from(self.dot))
            .copied()
    }

    fn advance(&self) -> Self {
        Self {
            dot: self.dot + 1,
            ..*self
        }
    }

    // `"C -> c . C, d"`
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(|f| {
            let production = g.production(self.production);
            write!(f, "{} ->", g.nonterminal(production.left()))?;
            for (i, symbol) in production.right().iter().enumerate() {
                if i == usize::from(self.dot) {
                    f.write_str(" .")?;
                }
                write!(f, " {}", g.symbol_name(*symbol))?;
            }
            if usize::from(self.dot) == production.right().len() {
                f.write_str(" .")?;
            }
            write!(f, ", {}", g.terminal(self.lookahead))
        })
    }
}

/// A set of LR(1) items.
///
/// The ordered representation doubles as the canonical key when states are
/// compared for equality.
pub type ItemSet = BTreeSet<Item>;

/// An edge `from --(symbol)--> ...` of the automaton.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Transition {
    pub from: StateID,
    pub symbol: SymbolID,
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:?},{:?})", self.from, self.symbol)
    }
}

/// Saturate `items` by expanding every nonterminal right after a dot.
///
/// For `[X -> α . B β, a]` and every production `B -> γ`, the items
/// `[B -> . γ, b]` are added for each `b` in `First(β a)`.
pub fn closure<I>(g: &Grammar, first: &FirstSets, items: I) -> ItemSet
where
    I: IntoIterator<Item = Item>,
{
    let mut set = ItemSet::new();
    let mut pending = VecDeque::new();
    for item in items {
        if set.insert(item) {
            pending.push_back(item);
        }
    }

    while let Some(item) = pending.pop_front() {
        let production = g.production(item.production);

        // [X -> ... . B beta, a]
        //  B: one nonterminal symbol
        let (b, beta) = match &production.right()[usize::from(item.dot)..] {
            [SymbolID::N(b), beta @ ..] => (*b, beta),
            _ => continue,
        };

        let lookaheads = first.of_sequence(
            beta.iter()
                .copied()
                .chain(Some(SymbolID::T(item.lookahead))),
        );
        for p in g.productions_of(b) {
            for lookahead in lookaheads.terminals.iter() {
                let added = Item::new(p.id(), 0, lookahead);
                if set.insert(added) {
                    pending.push_back(added);
                }
            }
        }
    }

    set
}

/// Advance the dot over `symbol` in every item of `state` that allows it, and
/// close the result.
///
/// Returns `None` when no item has `symbol` right after the dot, i.e. there
/// is no transition on `symbol` from `state`.
pub fn goto(g: &Grammar, first: &FirstSets, state: &ItemSet, symbol: SymbolID) -> Option<ItemSet> {
    let kernel: Vec<Item> = state
        .iter()
        .filter(|item| item.next_symbol(g) == Some(symbol))
        .map(Item::advance)
        .collect();
    if kernel.is_empty() {
        return None;
    }
    Some(closure(g, first, kernel))
}

/// The canonical LR(1) automaton.
#[derive(Debug)]
pub struct LR1Automaton {
    pub states: Map<StateID, ItemSet>,
    pub transitions: Map<Transition, StateID>,
}

impl LR1Automaton {
    /// Build the canonical collection of LR(1) item sets.
    ///
    /// States are numbered in breadth-first discovery order. From each state
    /// the declared nonterminals are tried first, then the declared
    /// terminals, both in declaration order.
    pub fn build(g: &Grammar, first: &FirstSets) -> Self {
        let alphabet: Vec<SymbolID> = g
            .nonterminals()
            .map(|(n, _)| SymbolID::N(n))
            .chain(g.terminals().map(|(t, _)| SymbolID::T(t)))
            .collect();

        // [S' -> . S, $]
        let start = closure(
            g,
            first,
            Some(Item::new(ProductionID::ACCEPT, 0, TerminalID::EOI)),
        );

        // The position in this set is the state number.
        let mut interned = Set::<ItemSet>::default();
        interned.insert(start);

        let mut transitions = Map::default();
        let mut pending = VecDeque::new();
        pending.push_back(StateID::START);

        while let Some(current) = pending.pop_front() {
            for &symbol in &alphabet {
                let Some(next_items) = goto(g, first, &interned[current.index()], symbol) else {
                    continue;
                };
                let (index, inserted) = interned.insert_full(next_items);
                let next = StateID::from_index(index);
                if inserted {
                    pending.push_back(next);
                }
                transitions.insert(
                    Transition {
                        from: current,
                        symbol,
                    },
                    next,
                );
            }
        }

        let states: Map<StateID, ItemSet> = interned
            .into_iter()
            .enumerate()
            .map(|(i, items)| (StateID::from_index(i), items))
            .collect();

        tracing::debug!(
            states = states.len(),
            transitions = transitions.len(),
            "LR(1) collection built"
        );

        Self {
            states,
            transitions,
        }
    }

    pub fn state(&self, id: StateID) -> &ItemSet {
        &self.states[&id]
    }

    /// Return the target of the transition on `symbol` from `from`, if any.
    pub fn transition(&self, from: StateID, symbol: SymbolID) -> Option<StateID> {
        self.transitions.get(&Transition { from, symbol }).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn g_ccdd() -> Grammar {
        Grammar::from_notation("S -> C C\nC -> c C | d", None).unwrap()
    }

    fn items(g: &Grammar, set: &ItemSet) -> Vec<String> {
        set.iter().map(|item| item.display(g).to_string()).collect()
    }

    #[test]
    fn initial_closure() {
        let g = g_ccdd();
        let first = FirstSets::compute(&g);
        let state = closure(
            &g,
            &first,
            Some(Item::new(ProductionID::ACCEPT, 0, TerminalID::EOI)),
        );
        assert_eq!(
            items(&g, &state),
            [
                "S' -> . S, $",
                "S -> . C C, $",
                "C -> . c C, c",
                "C -> . c C, d",
                "C -> . d, c",
                "C -> . d, d",
            ]
        );
    }

    #[test]
    fn closure_is_a_set() {
        let g = g_ccdd();
        let first = FirstSets::compute(&g);
        let kernel = Item::new(ProductionID::ACCEPT, 0, TerminalID::EOI);
        let once = closure(&g, &first, Some(kernel));
        let twice = closure(&g, &first, [kernel, kernel]);
        assert_eq!(once, twice);
        assert_eq!(closure(&g, &first, once.iter().copied()), once);
    }

    #[test]
    fn goto_without_transition() {
        let g = g_ccdd();
        let first = FirstSets::compute(&g);
        let lr1 = LR1Automaton::build(&g, &first);

        let s = SymbolID::N(g.nonterminal_id("S").unwrap());
        let accepting = lr1.transition(StateID::START, s).unwrap();
        for (t, _) in g.terminals() {
            assert_eq!(goto(&g, &first, lr1.state(accepting), SymbolID::T(t)), None);
        }
        assert_eq!(items(&g, lr1.state(accepting)), ["S' -> S ., $"]);
    }

    #[test]
    fn canonical_collection() {
        let g = g_ccdd();
        let first = FirstSets::compute(&g);
        let lr1 = LR1Automaton::build(&g, &first);

        assert_eq!(lr1.states.len(), 10);
        assert_eq!(lr1.transitions.len(), 13);

        let sym = |name: &str| match g.terminal_id(name) {
            Some(t) => SymbolID::T(t),
            None => SymbolID::N(g.nonterminal_id(name).unwrap()),
        };
        let edges: Vec<_> = lr1
            .transitions
            .iter()
            .map(|(k, to)| (k.from.index(), g.symbol_name(k.symbol), to.index()))
            .collect();
        assert_eq!(
            edges,
            [
                (0, "S", 1),
                (0, "C", 2),
                (0, "c", 3),
                (0, "d", 4),
                (2, "C", 5),
                (2, "c", 6),
                (2, "d", 7),
                (3, "C", 8),
                (3, "c", 3),
                (3, "d", 4),
                (6, "C", 9),
                (6, "c", 6),
                (6, "d", 7),
            ]
        );

        // I3 and I6 share a core but differ in lookaheads.
        assert_eq!(
            items(&g, lr1.state(StateID::from_index(3))),
            [
                "C -> . c C, c",
                "C -> . c C, d",
                "C -> c . C, c",
                "C -> c . C, d",
                "C -> . d, c",
                "C -> . d, d",
            ]
        );
        assert_eq!(
            items(&g, lr1.state(StateID::from_index(6))),
            ["C -> . c C, $", "C -> c . C, $", "C -> . d, $"]
        );
        assert_eq!(lr1.transition(StateID::from_index(6), sym("S")), None);
    }

    #[test]
    fn every_state_is_closed() {
        let g = Grammar::from_notation(
            "E -> E + T | T\n\
             T -> T * F | F\n\
             F -> ( E ) | id",
            None,
        )
        .unwrap();
        let first = FirstSets::compute(&g);
        let lr1 = LR1Automaton::build(&g, &first);

        for state in lr1.states.values() {
            for item in state {
                let Some(SymbolID::N(b)) = item.next_symbol(&g) else {
                    continue;
                };
                let beta = &g.production(item.production).right()[usize::from(item.dot) + 1..];
                let lookaheads = first.of_sequence(
                    beta.iter()
                        .copied()
                        .chain(Some(SymbolID::T(item.lookahead))),
                );
                for p in g.productions_of(b) {
                    for la in lookaheads.terminals.iter() {
                        assert!(state.contains(&Item::new(p.id(), 0, la)));
                    }
                }
            }
        }
    }
}
