//! The table-driven parse loop.

use crate::{
    grammar::{Grammar, NonterminalID, ProductionID, SymbolID, TerminalID},
    lr1::StateID,
    table::{Action, ParseTable},
    util::display_fn,
};
use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StackEntry {
    State(StateID),
    Symbol(SymbolID),
}

/// A token of the input, resolved against the grammar's terminals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSymbol {
    Terminal(TerminalID),
    /// A token that names no terminal of the grammar.
    Unknown(String),
}

impl InputSymbol {
    pub fn terminal(&self) -> Option<TerminalID> {
        match self {
            Self::Terminal(t) => Some(*t),
            Self::Unknown(..) => None,
        }
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| match self {
            Self::Terminal(t) => f.write_str(g.terminal(*t).name()),
            Self::Unknown(symbol) => f.write_str(symbol),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("no action in state {state} for the lookahead {lookahead:?}")]
    InvalidSyntax {
        state: StateID,
        lookahead: TerminalID,
    },

    #[error("unknown symbol `{symbol}' at position {position}")]
    InvalidSymbol { symbol: String, position: usize },

    #[error("no GOTO entry in state {state} for {nonterminal:?}")]
    MissingGoto {
        state: StateID,
        nonterminal: NonterminalID,
    },

    #[error("the parse stack has no state on top")]
    StackUnderflow,

    #[error("the reductions from state {state} repeat without consuming any input")]
    ReductionCycle { state: StateID },
}

impl ParseError {
    /// Return whether this error comes from a broken table rather than from
    /// the input.
    pub fn is_table_defect(&self) -> bool {
        matches!(
            self,
            Self::MissingGoto { .. } | Self::StackUnderflow | Self::ReductionCycle { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAction {
    Shift(StateID),
    Reduce(ProductionID),
    Accept,
    Error(ParseError),
}

/// The configuration of the driver before performing `action`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceStep {
    pub stack: Vec<StackEntry>,
    /// The input not consumed yet, ending with the end marker.
    pub remaining: Vec<InputSymbol>,
    pub action: StepAction,
}

impl TraceStep {
    /// Describe the action of this step, e.g. `"Reduce by C -> c C"`.
    pub fn describe<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| match &self.action {
            StepAction::Shift(next) => write!(f, "Shift {}", next),
            StepAction::Reduce(p) => write!(f, "Reduce by {}", g.production(*p).display(g)),
            StepAction::Accept => f.write_str("Accept"),
            StepAction::Error(ParseError::InvalidSyntax { .. }) => {
                f.write_str("Error: Invalid Syntax")
            }
            StepAction::Error(ParseError::InvalidSymbol { symbol, .. }) => {
                write!(f, "Error: Invalid symbol {:?}", symbol)
            }
            StepAction::Error(ParseError::MissingGoto { state, nonterminal }) => write!(
                f,
                "Error: No GOTO for {} from state {}",
                g.nonterminal(*nonterminal),
                state
            ),
            StepAction::Error(ParseError::StackUnderflow) => f.write_str("Error: Stack underflow"),
            StepAction::Error(ParseError::ReductionCycle { state }) => {
                write!(f, "Error: Reduction cycle in state {}", state)
            }
        })
    }

    // `"0 c 3 C 6"`
    pub fn display_stack<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for (i, entry) in self.stack.iter().enumerate() {
                if i > 0 {
                    f.write_str(" ")?;
                }
                match entry {
                    StackEntry::State(s) => write!(f, "{}", s)?,
                    StackEntry::Symbol(symbol) => f.write_str(g.symbol_name(*symbol))?,
                }
            }
            Ok(())
        })
    }

    // `"d d $"`
    pub fn display_input<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for (i, symbol) in self.remaining.iter().enumerate() {
                if i > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{}", symbol.display(g))?;
            }
            Ok(())
        })
    }
}

/// The record of one run of the driver.
///
/// The last step is always `Accept` or an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    steps: Vec<TraceStep>,
}

impl Trace {
    pub fn steps(&self) -> &[TraceStep] {
        &self.steps[..]
    }

    pub fn final_step(&self) -> Option<&TraceStep> {
        self.steps.last()
    }

    pub fn is_accepted(&self) -> bool {
        matches!(
            self.final_step(),
            Some(TraceStep {
                action: StepAction::Accept,
                ..
            })
        )
    }

    /// Return the error that stopped the driver, if the input was rejected.
    pub fn error(&self) -> Option<&ParseError> {
        match &self.final_step()?.action {
            StepAction::Error(err) => Some(err),
            _ => None,
        }
    }
}

/// Run the driver over `tokens`, the names of terminal symbols.
///
/// The end marker is appended to the input. Tokens that name no terminal,
/// including a literal `$`, stop the parse with [`ParseError::InvalidSymbol`]
/// once the driver reaches them.
///
/// A table whose reductions would go on forever without consuming the
/// lookahead is stopped with [`ParseError::ReductionCycle`].
pub fn parse<I, T>(g: &Grammar, table: &ParseTable, tokens: I) -> Trace
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    let mut input: Vec<InputSymbol> = tokens
        .into_iter()
        .map(|token| {
            let token = token.as_ref();
            match g.terminal_id(token) {
                Some(t) => InputSymbol::Terminal(t),
                None => InputSymbol::Unknown(token.to_owned()),
            }
        })
        .collect();
    input.push(InputSymbol::Terminal(TerminalID::EOI));

    let mut stack = vec![StackEntry::State(StateID::START)];
    let mut cursor = 0;
    let mut steps = vec![];
    let mut pending_error = None;

    // `(stack length, top state)` of the configurations since the last shift
    // that no later reduction has popped below.
    let mut since_shift = vec![(stack.len(), StateID::START)];

    loop {
        let action = match pending_error.take() {
            Some(err) => StepAction::Error(err),
            None => next_action(table, &stack, &input, cursor),
        };
        tracing::trace!(step = steps.len() + 1, ?action, "parse step");

        steps.push(TraceStep {
            stack: stack.clone(),
            remaining: input[cursor..].to_vec(),
            action: action.clone(),
        });

        match action {
            StepAction::Shift(next) => {
                if let Some(t) = input[cursor].terminal() {
                    stack.push(StackEntry::Symbol(SymbolID::T(t)));
                }
                stack.push(StackEntry::State(next));
                cursor += 1;

                since_shift.clear();
                since_shift.push((stack.len(), next));
            }
            StepAction::Reduce(p) => match reduce(g, table, &mut stack, p) {
                Ok((exposed, next)) => {
                    // Returning to a recorded top state without popping below
                    // it repeats the same reductions indefinitely.
                    since_shift.retain(|&(depth, _)| depth <= exposed);
                    if since_shift.iter().any(|&(_, state)| state == next) {
                        pending_error = Some(ParseError::ReductionCycle { state: next });
                    }
                    since_shift.push((stack.len(), next));
                }
                Err(err) => pending_error = Some(err),
            },
            StepAction::Accept | StepAction::Error(..) => break,
        }
    }

    let trace = Trace { steps };
    tracing::debug!(
        steps = trace.steps.len(),
        accepted = trace.is_accepted(),
        "parse finished"
    );
    trace
}

fn top_state(stack: &[StackEntry]) -> Option<StateID> {
    match stack.last() {
        Some(StackEntry::State(s)) => Some(*s),
        _ => None,
    }
}

fn next_action(
    table: &ParseTable,
    stack: &[StackEntry],
    input: &[InputSymbol],
    cursor: usize,
) -> StepAction {
    let state = match top_state(stack) {
        Some(state) => state,
        None => return StepAction::Error(ParseError::StackUnderflow),
    };

    let lookahead = match &input[cursor] {
        InputSymbol::Terminal(t) => *t,
        InputSymbol::Unknown(symbol) => {
            return StepAction::Error(ParseError::InvalidSymbol {
                symbol: symbol.clone(),
                position: cursor,
            });
        }
    };

    match table.action(state, lookahead) {
        Some(Action::Shift(next)) => StepAction::Shift(next),
        Some(Action::Reduce(p)) => StepAction::Reduce(p),
        Some(Action::Accept) => StepAction::Accept,
        None => StepAction::Error(ParseError::InvalidSyntax { state, lookahead }),
    }
}

/// Pop the body of `p` off the stack, push its head and then the GOTO target.
///
/// Returns the stack length right after popping and the pushed state. The
/// head is pushed even when the GOTO entry is missing, so the failing
/// configuration stays visible in the trace.
fn reduce(
    g: &Grammar,
    table: &ParseTable,
    stack: &mut Vec<StackEntry>,
    p: ProductionID,
) -> Result<(usize, StateID), ParseError> {
    let production = g.production(p);
    let n = 2 * production.right().len();
    if stack.len() <= n {
        return Err(ParseError::StackUnderflow);
    }
    stack.truncate(stack.len() - n);

    let exposed = top_state(stack).ok_or(ParseError::StackUnderflow)?;
    let depth = stack.len();
    let head = production.left();
    stack.push(StackEntry::Symbol(SymbolID::N(head)));

    let next = table
        .goto(exposed, head)
        .ok_or(ParseError::MissingGoto {
            state: exposed,
            nonterminal: head,
        })?;
    stack.push(StackEntry::State(next));

    Ok((depth, next))
}
