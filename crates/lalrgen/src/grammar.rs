//! Grammar types.

use crate::{
    types::{Map, Set},
    util::display_fn,
};
use std::{fmt, fs, path::Path};

/// The symbol written in a production body to denote the empty string.
pub const EMPTY_MARKER: &str = "ε";

/// The display name of the end-of-input marker.
pub const END_MARKER: &str = "$";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TerminalID {
    raw: u16,
}

impl TerminalID {
    /// Reserved symbol used as a terminal symbol that means the end of input.
    pub const EOI: Self = Self::from_raw(0);

    const OFFSET: u16 = 1;

    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn into_raw(self) -> u16 {
        self.raw
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NonterminalID {
    raw: u16,
}

impl NonterminalID {
    /// The synthetic head of the augmented production `S' -> S`.
    pub const START: Self = Self::from_raw(0);

    const OFFSET: u16 = 1;

    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn into_raw(self) -> u16 {
        self.raw
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolID {
    T(TerminalID),
    N(NonterminalID),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ProductionID {
    raw: u16,
}

impl ProductionID {
    /// The augmented production `S' -> S`.
    pub const ACCEPT: Self = Self::from_raw(0);

    const OFFSET: u16 = 1;

    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn into_raw(self) -> u16 {
        self.raw
    }
}

impl fmt::Display for ProductionID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.raw, f)
    }
}

/// A set of terminal symbols, the end marker included.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct TerminalSet {
    inner: bit_set::BitSet,
}

impl TerminalSet {
    pub fn contains(&self, id: TerminalID) -> bool {
        self.inner.contains(id.into_raw().into())
    }
    pub fn insert(&mut self, id: TerminalID) -> bool {
        self.inner.insert(id.into_raw().into())
    }
    /// Add all the elements of `other`, and return whether this set grew.
    pub fn union_with(&mut self, other: &Self) -> bool {
        let before = self.inner.len();
        self.inner.union_with(&other.inner);
        self.inner.len() != before
    }
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
    pub fn len(&self) -> usize {
        self.inner.len()
    }
    pub fn iter(&self) -> impl Iterator<Item = TerminalID> + '_ {
        self.inner
            .iter()
            .filter_map(|raw| u16::try_from(raw).ok().map(TerminalID::from_raw))
    }
}

impl FromIterator<TerminalID> for TerminalSet {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = TerminalID>,
    {
        Self {
            inner: iter.into_iter().map(|t| t.into_raw().into()).collect(),
        }
    }
}

#[derive(Debug)]
pub struct Terminal {
    id: TerminalID,
    name: String,
}

impl Terminal {
    pub fn id(&self) -> TerminalID {
        self.id
    }
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug)]
pub struct Nonterminal {
    id: NonterminalID,
    name: String,
}

impl Nonterminal {
    pub fn id(&self) -> NonterminalID {
        self.id
    }
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Nonterminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A production `left -> right`, numbered in input order.
#[derive(Debug)]
pub struct Production {
    id: ProductionID,
    left: NonterminalID,
    right: Vec<SymbolID>,
}

impl Production {
    pub fn id(&self) -> ProductionID {
        self.id
    }

    /// Return the left-hand side of this production.
    pub fn left(&self) -> NonterminalID {
        self.left
    }

    /// Return the right-hand side of this production.
    pub fn right(&self) -> &[SymbolID] {
        &self.right[..]
    }

    // `"LHS -> R1 R2 R3"`, or `"LHS -> ε"` for an empty body
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(|f| {
            write!(f, "{} ->", g.nonterminal(self.left))?;
            if self.right.is_empty() {
                return write!(f, " {}", EMPTY_MARKER);
            }
            for symbol in &self.right {
                write!(f, " {}", g.symbol_name(*symbol))?;
            }
            Ok(())
        })
    }
}

/// The augmented grammar used to derive the parser tables.
#[derive(Debug)]
pub struct Grammar {
    terminals: Map<TerminalID, Terminal>,
    nonterminals: Map<NonterminalID, Nonterminal>,
    productions: Map<ProductionID, Production>,
    start_symbol: NonterminalID,
    names: Map<String, SymbolID>,
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## terminals:")?;
        for (_, terminal) in self.terminals() {
            writeln!(f, "{}", terminal)?;
        }

        writeln!(f, "\n## nonterminals:")?;
        for (id, nonterminal) in self.nonterminals() {
            write!(f, "{}", nonterminal)?;
            if id == self.start_symbol {
                write!(f, " (start)")?;
            }
            writeln!(f)?;
        }

        writeln!(f, "\n## productions:")?;
        for (id, production) in self.productions() {
            writeln!(f, "{}: {}", id, production.display(self))?;
        }

        Ok(())
    }
}

impl Grammar {
    /// Build a grammar from `(head, body)` pairs and the name of the start symbol.
    ///
    /// Every symbol appearing as a head is a nonterminal; every other body
    /// symbol is a terminal. A body that is empty or consists of
    /// [`EMPTY_MARKER`] alone is the empty production.
    pub fn new<I, H, B, S>(rules: I, start: &str) -> Result<Self, GrammarError>
    where
        I: IntoIterator<Item = (H, B)>,
        H: AsRef<str>,
        B: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut def = GrammarDef::default();
        for (head, body) in rules {
            def.rule(head.as_ref(), body);
        }
        def.end(start)
    }

    /// Parse a grammar written as one rule per line:
    ///
    /// ```text
    /// # comment
    /// S -> C C
    /// C -> c C | d
    /// ```
    ///
    /// Symbols are separated by whitespace. When `start` is omitted, the head
    /// of the first rule is the start symbol.
    pub fn from_notation(source: &str, start: Option<&str>) -> Result<Self, GrammarError> {
        let mut def = GrammarDef::default();
        let mut first_head = None;

        for (i, line) in source.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let syntax_error = |message: &str| GrammarError::Syntax {
                line: i + 1,
                message: message.to_owned(),
            };

            let (head, bodies) = line
                .split_once("->")
                .ok_or_else(|| syntax_error("expected `->'"))?;
            let head = head.trim();
            if head.is_empty() || head.contains(char::is_whitespace) {
                return Err(syntax_error("expected exactly one symbol before `->'"));
            }

            for body in bodies.split('|') {
                def.rule(head, body.split_whitespace());
            }
            first_head.get_or_insert_with(|| head.to_owned());
        }

        let start = match (start, &first_head) {
            (Some(start), _) => start,
            (None, Some(head)) => head.as_str(),
            (None, None) => return Err(GrammarError::Empty),
        };
        def.end(start)
    }

    /// Read a grammar file written in the notation of [`Grammar::from_notation`].
    pub fn from_file(path: &Path, start: Option<&str>) -> Result<Self, GrammarError> {
        let source = fs::read_to_string(path)?;
        Self::from_notation(&source, start)
    }

    /// Iterate over the declared terminal symbols. The end marker is not included.
    pub fn terminals(&self) -> impl Iterator<Item = (TerminalID, &Terminal)> + '_ {
        self.terminals
            .iter()
            .filter(|(id, _)| **id != TerminalID::EOI)
            .map(|(id, t)| (*id, t))
    }

    /// Iterate over the declared nonterminal symbols. The augmented start
    /// symbol is not included.
    pub fn nonterminals(&self) -> impl Iterator<Item = (NonterminalID, &Nonterminal)> + '_ {
        self.nonterminals
            .iter()
            .filter(|(id, _)| **id != NonterminalID::START)
            .map(|(id, n)| (*id, n))
    }

    /// Iterate over all productions of the augmented grammar, `S' -> S` first.
    pub fn productions(&self) -> impl Iterator<Item = (ProductionID, &Production)> + '_ {
        self.productions.iter().map(|(id, p)| (*id, p))
    }

    /// Iterate over the productions whose left-hand side is `n`.
    pub fn productions_of(&self, n: NonterminalID) -> impl Iterator<Item = &Production> + '_ {
        self.productions.values().filter(move |p| p.left == n)
    }

    pub fn terminal(&self, id: TerminalID) -> &Terminal {
        &self.terminals[&id]
    }

    pub fn nonterminal(&self, id: NonterminalID) -> &Nonterminal {
        &self.nonterminals[&id]
    }

    pub fn production(&self, id: ProductionID) -> &Production {
        &self.productions[&id]
    }

    pub fn end_marker(&self) -> &Terminal {
        self.terminal(TerminalID::EOI)
    }

    pub fn augmented_start(&self) -> &Nonterminal {
        self.nonterminal(NonterminalID::START)
    }

    /// Return the start symbol given by the user.
    pub fn start_symbol(&self) -> NonterminalID {
        self.start_symbol
    }

    /// Look up a declared terminal by name.
    pub fn terminal_id(&self, name: &str) -> Option<TerminalID> {
        match self.names.get(name)? {
            SymbolID::T(t) => Some(*t),
            SymbolID::N(..) => None,
        }
    }

    /// Look up a declared nonterminal by name.
    pub fn nonterminal_id(&self, name: &str) -> Option<NonterminalID> {
        match self.names.get(name)? {
            SymbolID::N(n) => Some(*n),
            SymbolID::T(..) => None,
        }
    }

    pub fn symbol_name(&self, symbol: SymbolID) -> &str {
        match symbol {
            SymbolID::T(t) => self.terminal(t).name(),
            SymbolID::N(n) => self.nonterminal(n).name(),
        }
    }
}

/// The contextual values for building a `Grammar`.
#[derive(Debug, Default)]
pub struct GrammarDef {
    rules: Vec<(String, Vec<String>)>,
}

impl GrammarDef {
    /// Specify a production rule into this grammar.
    ///
    /// Occurrences of [`EMPTY_MARKER`] in `body` are dropped.
    pub fn rule<B, S>(&mut self, head: &str, body: B) -> &mut Self
    where
        B: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let body = body
            .into_iter()
            .map(|s| s.as_ref().to_owned())
            .filter(|s| s != EMPTY_MARKER)
            .collect();
        self.rules.push((head.to_owned(), body));
        self
    }

    /// Classify the symbols, augment the grammar with `S' -> start` and
    /// number every symbol and production.
    pub fn end(self, start: &str) -> Result<Grammar, GrammarError> {
        for (head, body) in &self.rules {
            if head.is_empty() || head == END_MARKER || head == EMPTY_MARKER {
                return Err(GrammarError::ReservedSymbol { name: head.clone() });
            }
            if let Some(s) = body.iter().find(|s| s.is_empty() || *s == END_MARKER) {
                return Err(GrammarError::ReservedSymbol { name: s.clone() });
            }
            // The dot position of an item is a `u16`.
            if u16::try_from(body.len()).is_err() {
                return Err(GrammarError::TooLarge);
            }
        }

        // Every head is a nonterminal, numbered in order of first appearance.
        let heads: Set<&str> = self.rules.iter().map(|(head, _)| head.as_str()).collect();
        if !heads.contains(start) {
            return Err(GrammarError::MissingStartProduction {
                name: start.to_owned(),
            });
        }

        let augmented = format!("{}'", start);
        if heads.contains(augmented.as_str())
            || self
                .rules
                .iter()
                .any(|(_, body)| body.iter().any(|s| *s == augmented))
        {
            return Err(GrammarError::AugmentedStartCollision { name: augmented });
        }

        let mut names = Map::<String, SymbolID>::default();

        let mut nonterminals = Map::default();
        nonterminals.insert(
            NonterminalID::START,
            Nonterminal {
                id: NonterminalID::START,
                name: augmented,
            },
        );
        for (i, head) in heads.iter().enumerate() {
            let id = NonterminalID::from_raw(next_raw(NonterminalID::OFFSET, i)?);
            nonterminals.insert(
                id,
                Nonterminal {
                    id,
                    name: (*head).to_owned(),
                },
            );
            names.insert((*head).to_owned(), SymbolID::N(id));
        }

        // The remaining body symbols are terminals.
        let mut terminals = Map::default();
        terminals.insert(
            TerminalID::EOI,
            Terminal {
                id: TerminalID::EOI,
                name: END_MARKER.to_owned(),
            },
        );
        for (_, body) in &self.rules {
            for symbol in body {
                if names.contains_key(symbol) {
                    continue;
                }
                let id = TerminalID::from_raw(next_raw(TerminalID::OFFSET, terminals.len() - 1)?);
                terminals.insert(
                    id,
                    Terminal {
                        id,
                        name: symbol.clone(),
                    },
                );
                names.insert(symbol.clone(), SymbolID::T(id));
            }
        }

        let start_symbol = match names[start] {
            SymbolID::N(n) => n,
            SymbolID::T(..) => unreachable!("heads are always nonterminals"),
        };

        let mut productions = Map::default();
        productions.insert(
            ProductionID::ACCEPT,
            Production {
                id: ProductionID::ACCEPT,
                left: NonterminalID::START,
                right: vec![SymbolID::N(start_symbol)],
            },
        );
        for (i, (head, body)) in self.rules.iter().enumerate() {
            let id = ProductionID::from_raw(next_raw(ProductionID::OFFSET, i)?);
            let left = match names[head.as_str()] {
                SymbolID::N(n) => n,
                SymbolID::T(..) => unreachable!("heads are always nonterminals"),
            };
            let right: Vec<_> = body.iter().map(|s| names[s.as_str()]).collect();
            productions.insert(id, Production { id, left, right });
        }

        tracing::debug!(
            terminals = terminals.len() - 1,
            nonterminals = nonterminals.len() - 1,
            productions = productions.len(),
            "grammar defined"
        );

        Ok(Grammar {
            terminals,
            nonterminals,
            productions,
            start_symbol,
            names,
        })
    }
}

fn next_raw(offset: u16, index: usize) -> Result<u16, GrammarError> {
    u16::try_from(index)
        .ok()
        .and_then(|i| i.checked_add(offset))
        .ok_or(GrammarError::TooLarge)
}

#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    #[error("the start symbol `{name}' has no production")]
    MissingStartProduction { name: String },

    #[error("the augmented start symbol `{name}' collides with an existing symbol")]
    AugmentedStartCollision { name: String },

    #[error("reserved or empty symbol name: `{name}'")]
    ReservedSymbol { name: String },

    #[error("the grammar has no production rules")]
    Empty,

    #[error("too many symbols or production rules")]
    TooLarge,

    #[error("syntax error at line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("failed to read the grammar file")]
    Io(#[from] std::io::Error),
}
