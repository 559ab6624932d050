//! FIRST sets, computed by fixed-point iteration.

use crate::{
    grammar::{Grammar, SymbolID, TerminalID, TerminalSet},
    types::Map,
};

/// `First(X)` for a symbol or a sequence of symbols.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FirstSet {
    pub terminals: TerminalSet,
    /// Whether the empty string belongs to this set.
    pub empty: bool,
}

impl FirstSet {
    /// Add `other` into this set, and return whether this set grew.
    fn union_with(&mut self, other: &FirstSet) -> bool {
        let mut changed = self.terminals.union_with(&other.terminals);
        if other.empty && !self.empty {
            self.empty = true;
            changed = true;
        }
        changed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirstSets {
    map: Map<SymbolID, FirstSet>,
}

impl FirstSets {
    /// Compute the first sets of every symbol in the grammar, the end marker included.
    pub fn compute(g: &Grammar) -> Self {
        let mut map = Map::default();

        // First(t) = {t}, First($) = {$}
        for id in Some(TerminalID::EOI).into_iter().chain(g.terminals().map(|(id, _)| id)) {
            map.insert(
                SymbolID::T(id),
                FirstSet {
                    terminals: Some(id).into_iter().collect(),
                    empty: false,
                },
            );
        }

        // First(N) = {} for all nonterminals, S' included
        for (_, p) in g.productions() {
            map.entry(SymbolID::N(p.left())).or_default();
        }

        let mut first_sets = Self { map };
        let mut sweeps = 1;
        while first_sets.sweep(g) {
            sweeps += 1;
        }
        tracing::debug!(sweeps, "first sets converged");

        first_sets
    }

    /// Perform one pass of `First(head) ⊇ First(body)` over every production,
    /// and return whether any set has grown.
    ///
    /// After [`FirstSets::compute`] returns, a further sweep never changes anything.
    pub fn sweep(&mut self, g: &Grammar) -> bool {
        let mut changed = false;
        for (_, p) in g.productions() {
            let added = self.of_sequence(p.right().iter().copied());
            let slot = self.map.entry(SymbolID::N(p.left())).or_default();
            changed |= slot.union_with(&added);
        }
        changed
    }

    /// `First(X)`
    pub fn get(&self, symbol: SymbolID) -> &FirstSet {
        &self.map[&symbol]
    }

    /// `First(X1 X2 ... Xn)`
    ///
    /// The scan stops at the first `Xi` whose first set lacks the empty
    /// string. The result contains the empty string only if every `Xi` can
    /// derive it, in particular when the sequence is empty.
    pub fn of_sequence<I>(&self, symbols: I) -> FirstSet
    where
        I: IntoIterator<Item = SymbolID>,
    {
        let mut res = FirstSet::default();
        for symbol in symbols {
            let first = &self.map[&symbol];
            res.terminals.union_with(&first.terminals);
            if !first.empty {
                return res;
            }
        }
        res.empty = true;
        res
    }
}
