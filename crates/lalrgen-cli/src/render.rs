//! Text listings of the generation results.

use lalrgen::{
    driver::Trace,
    grammar::{Grammar, SymbolID, TerminalID},
    lr1::LR1Automaton,
    table::ParseTable,
    util::display_fn,
};
use std::fmt;

pub fn lr1_collection<'g>(g: &'g Grammar, lr1: &'g LR1Automaton) -> impl fmt::Display + 'g {
    display_fn(move |f| {
        for (i, (id, items)) in lr1.states.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "I{}:", id)?;
            for item in items {
                writeln!(f, "  {}", item.display(g))?;
            }
        }
        Ok(())
    })
}

pub fn transitions<'g>(g: &'g Grammar, lr1: &'g LR1Automaton) -> impl fmt::Display + 'g {
    display_fn(move |f| {
        for (edge, next) in &lr1.transitions {
            writeln!(
                f,
                "goto(I{}, {}) = I{}",
                edge.from,
                g.symbol_name(edge.symbol),
                next
            )?;
        }
        Ok(())
    })
}

/// The ACTION columns (terminals sorted by name, then `$`) followed by the
/// GOTO columns (nonterminals sorted by name).
pub fn parse_table<'g>(g: &'g Grammar, table: &'g ParseTable) -> impl fmt::Display + 'g {
    display_fn(move |f| {
        let mut terminals: Vec<_> = g.terminals().map(|(id, t)| (t.name(), id)).collect();
        terminals.sort();
        let mut nonterminals: Vec<_> = g.nonterminals().map(|(id, n)| (n.name(), id)).collect();
        nonterminals.sort();

        let columns: Vec<SymbolID> = terminals
            .iter()
            .map(|(_, id)| SymbolID::T(*id))
            .chain(Some(SymbolID::T(TerminalID::EOI)))
            .chain(nonterminals.iter().map(|(_, id)| SymbolID::N(*id)))
            .collect();

        let header = Some("State")
            .into_iter()
            .chain(columns.iter().map(|symbol| g.symbol_name(*symbol)))
            .map(String::from)
            .collect();

        let rows = table
            .states
            .keys()
            .map(|&state| {
                let cells = columns.iter().map(|symbol| match symbol {
                    SymbolID::T(t) => table
                        .action(state, *t)
                        .map_or_else(String::new, |action| action.to_string()),
                    SymbolID::N(n) => table
                        .goto(state, *n)
                        .map_or_else(String::new, |next| next.to_string()),
                });
                Some(state.to_string())
                    .into_iter()
                    .chain(cells)
                    .collect::<Vec<_>>()
            })
            .collect();

        write_grid(f, header, rows)
    })
}

pub fn trace<'g>(g: &'g Grammar, trace: &'g Trace) -> impl fmt::Display + 'g {
    display_fn(move |f| {
        let header = ["Step", "Stack", "Input Buffer", "Action"]
            .into_iter()
            .map(String::from)
            .collect();
        let rows = trace
            .steps()
            .iter()
            .enumerate()
            .map(|(i, step)| {
                vec![
                    (i + 1).to_string(),
                    step.display_stack(g).to_string(),
                    step.display_input(g).to_string(),
                    step.describe(g).to_string(),
                ]
            })
            .collect();
        write_grid(f, header, rows)
    })
}

fn write_grid(f: &mut fmt::Formatter<'_>, header: Vec<String>, rows: Vec<Vec<String>>) -> fmt::Result {
    let mut widths: Vec<usize> = header.iter().map(|cell| cell.chars().count()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let write_row = |f: &mut fmt::Formatter<'_>, row: &[String]| -> fmt::Result {
        for (i, (cell, width)) in row.iter().zip(&widths).enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{:<width$}", cell, width = *width)?;
        }
        writeln!(f)
    };

    write_row(f, &header)?;
    for (i, width) in widths.iter().enumerate() {
        if i > 0 {
            f.write_str("-+-")?;
        }
        f.write_str(&"-".repeat(*width))?;
    }
    writeln!(f)?;
    for row in &rows {
        write_row(f, row)?;
    }
    Ok(())
}
