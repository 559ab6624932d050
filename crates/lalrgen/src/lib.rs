//! An LALR(1) parser generator that also drives its tables over token
//! sequences.
//!
//! ```
//! use lalrgen::{grammar::Grammar, Config};
//!
//! let g = Grammar::from_notation("S -> C C\nC -> c C | d", None).unwrap();
//! let generated = Config::new().use_lalr().generate(&g).unwrap();
//! assert_eq!(generated.table.states.len(), 7);
//!
//! let trace = generated.parse(&g, ["c", "c", "d", "d"]);
//! assert!(trace.is_accepted());
//! ```

pub mod driver;
pub mod first_sets;
pub mod grammar;
pub mod lalr;
pub mod lr1;
pub mod table;
pub mod types;
pub mod util;

use crate::{
    driver::Trace,
    first_sets::FirstSets,
    grammar::{Grammar, SymbolID},
    lalr::LALRAutomaton,
    lr1::{LR1Automaton, StateID},
    table::{Conflict, ParseTable},
};

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("the grammar has {} conflict(s)", .0.len())]
    Conflicts(Vec<Conflict>),

    #[error("merged state {state} has two transitions on {symbol:?}: to {first} and to {second}")]
    InconsistentMerge {
        state: StateID,
        symbol: SymbolID,
        first: StateID,
        second: StateID,
    },
}

#[derive(Debug, Copy, Clone)]
enum MergeMode {
    /// Keep every LR(1) state, as in Knuth's canonical LR(1) method.
    Canonical,

    /// Merge the states with the same LR(0) cores, as in DeRemer's LALR(1) method.
    LALR,
}

#[derive(Debug, Copy, Clone)]
enum ConflictPolicy {
    /// Keep the table filled by the fixed tie-break and report the conflicts.
    Resolve,

    /// Fail if any conflict occurs.
    Strict,
}

#[derive(Debug)]
pub struct Config {
    merge_mode: MergeMode,
    conflict_policy: ConflictPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub const fn new() -> Self {
        Self {
            merge_mode: MergeMode::LALR,
            conflict_policy: ConflictPolicy::Resolve,
        }
    }

    /// Merge the LR(1) states that share an LR(0) core. This is the default.
    pub fn use_lalr(&mut self) -> &mut Self {
        self.merge_mode = MergeMode::LALR;
        self
    }

    /// Build the table directly from the canonical LR(1) collection.
    pub fn use_canonical(&mut self) -> &mut Self {
        self.merge_mode = MergeMode::Canonical;
        self
    }

    /// Return [`GenerateError::Conflicts`] instead of a table when an action
    /// is dropped.
    pub fn use_strict(&mut self) -> &mut Self {
        self.conflict_policy = ConflictPolicy::Strict;
        self
    }

    /// Resolve the conflicts by the fixed tie-break, logging a warning for
    /// each. This is the default.
    pub fn use_resolve(&mut self) -> &mut Self {
        self.conflict_policy = ConflictPolicy::Resolve;
        self
    }

    pub fn generate(&self, g: &Grammar) -> Result<Generated, GenerateError> {
        let first_sets = FirstSets::compute(g);
        let lr1 = LR1Automaton::build(g, &first_sets);
        let lalr = match self.merge_mode {
            MergeMode::LALR => lalr::merge(&lr1)?,
            MergeMode::Canonical => lalr::canonical(&lr1),
        };
        let table = table::generate(g, &lalr);

        if !table.conflicts().is_empty() {
            match self.conflict_policy {
                ConflictPolicy::Strict => {
                    return Err(GenerateError::Conflicts(table.conflicts().to_vec()));
                }
                ConflictPolicy::Resolve => {
                    for conflict in table.conflicts() {
                        tracing::warn!("{}", conflict.display(g));
                    }
                }
            }
        }

        Ok(Generated {
            first_sets,
            lr1,
            lalr,
            table,
        })
    }
}

/// Generate the LALR(1) table with the default configuration.
pub fn generate(g: &Grammar) -> Result<Generated, GenerateError> {
    Config::new().generate(g)
}

/// The results of every phase of the generation.
#[derive(Debug)]
pub struct Generated {
    pub first_sets: FirstSets,
    pub lr1: LR1Automaton,
    /// The merged automaton, or a copy of `lr1` in canonical mode.
    pub lalr: LALRAutomaton,
    pub table: ParseTable,
}

impl Generated {
    /// Run the driver over `tokens` with the generated table.
    pub fn parse<I, T>(&self, g: &Grammar, tokens: I) -> Trace
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        driver::parse(g, &self.table, tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_lalr() {
        let g = Grammar::from_notation("S -> C C\nC -> c C | d", None).unwrap();
        let generated = generate(&g).unwrap();
        assert_eq!(generated.lr1.states.len(), 10);
        assert_eq!(generated.lalr.states.len(), 7);
        assert_eq!(generated.table.states.len(), 7);

        let generated = Config::new().use_canonical().generate(&g).unwrap();
        assert_eq!(generated.table.states.len(), 10);
    }

    #[test]
    fn strict_policy() {
        let g = Grammar::from_notation("E -> E + E | n", None).unwrap();

        let err = Config::new().use_strict().generate(&g).unwrap_err();
        match err {
            GenerateError::Conflicts(conflicts) => assert_eq!(conflicts.len(), 1),
            err => panic!("unexpected error: {}", err),
        }

        let generated = Config::new().use_strict().use_resolve().generate(&g).unwrap();
        assert_eq!(generated.table.conflicts().len(), 1);
        assert!(generated.parse(&g, ["n", "+", "n", "+", "n"]).is_accepted());
    }

    #[test]
    fn strict_policy_accepts_conflict_free_grammars() {
        let g = Grammar::from_notation("S -> C C\nC -> c C | d", None).unwrap();
        let generated = Config::new().use_strict().generate(&g).unwrap();
        assert!(generated.table.conflicts().is_empty());
    }
}
