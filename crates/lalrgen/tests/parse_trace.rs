use lalrgen::{
    driver::{InputSymbol, ParseError, StackEntry, StepAction},
    grammar::{Grammar, SymbolID, TerminalID, END_MARKER},
    lr1::StateID,
    table::ConflictKind,
    Config, Generated,
};
use std::{env, path::PathBuf};

fn load(name: &str) -> Grammar {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let path = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap())
        .join(format!("tests/{}.grammar", name));
    Grammar::from_file(&path, None).unwrap()
}

fn lalr(g: &Grammar) -> Generated {
    Config::new().use_lalr().generate(g).unwrap()
}

fn canonical(g: &Grammar) -> Generated {
    Config::new().use_canonical().generate(g).unwrap()
}

fn tokens(input: &str) -> Vec<&str> {
    input.split_whitespace().collect()
}

#[test]
fn ccdd_is_accepted() {
    let g = load("ccdd");
    let generated = lalr(&g);
    let trace = generated.parse(&g, ["c", "c", "d", "d"]);

    assert!(trace.is_accepted());
    assert_eq!(trace.steps().len(), 10);

    let s = g.nonterminal_id("S").unwrap();
    let last = trace.final_step().unwrap();
    assert_eq!(last.action, StepAction::Accept);
    assert_eq!(
        last.stack,
        [
            StackEntry::State(StateID::START),
            StackEntry::Symbol(SymbolID::N(s)),
            StackEntry::State(generated.table.goto(StateID::START, s).unwrap()),
        ]
    );
    assert_eq!(last.remaining, [InputSymbol::Terminal(TerminalID::EOI)]);
}

#[test]
fn ccd_is_rejected() {
    let g = load("ccdd");
    let generated = lalr(&g);
    let trace = generated.parse(&g, ["c", "c", "d"]);

    assert!(!trace.is_accepted());
    let last = trace.final_step().unwrap();
    assert_eq!(last.describe(&g).to_string(), "Error: Invalid Syntax");
    assert!(matches!(
        trace.error(),
        Some(ParseError::InvalidSyntax { lookahead, .. }) if *lookahead == TerminalID::EOI
    ));
}

#[test]
fn unknown_symbol_stops_at_cursor() {
    let g = load("arithmetic");
    let generated = lalr(&g);
    let trace = generated.parse(&g, tokens("id + foo * id"));

    let last = trace.final_step().unwrap();
    assert_eq!(last.remaining[0], InputSymbol::Unknown("foo".into()));
    assert_eq!(last.display_input(&g).to_string(), "foo * id $");
    assert_eq!(
        trace.error(),
        Some(&ParseError::InvalidSymbol {
            symbol: "foo".into(),
            position: 2,
        })
    );
}

#[test]
fn end_marker_is_excluded_from_terminals() {
    for name in ["ccdd", "arithmetic", "assignment", "nullable", "json"] {
        let g = load(name);
        assert!(g.terminals().all(|(_, t)| t.name() != END_MARKER));
        assert_eq!(g.terminal_id(END_MARKER), None);

        let generated = lalr(&g);
        let trace = generated.parse(&g, [END_MARKER]);
        assert!(matches!(
            trace.error(),
            Some(ParseError::InvalidSymbol { position: 0, .. })
        ));
    }
}

#[test]
fn stack_balance() {
    let g = load("nullable");
    let generated = lalr(&g);
    let trace = generated.parse(&g, tokens("id + id * ( id + id )"));
    assert!(trace.is_accepted());

    for pair in trace.steps().windows(2) {
        if let StepAction::Reduce(p) = pair[0].action {
            let body = g.production(p).right().len();
            assert_eq!(pair[1].stack.len() + 2 * body, pair[0].stack.len() + 2);
        }
    }
}

#[test]
fn canonical_and_lalr_agree_on_lalr_grammars() {
    let sentences = [
        ("arithmetic", "id + id * ( id )", true),
        ("arithmetic", "id + * id", false),
        ("assignment", "* id = id", true),
        ("assignment", "id = = id", false),
        ("json", "{ str : [ num , true ] }", true),
        ("json", "{ str : }", false),
    ];
    for (name, input, accepted) in sentences {
        let g = load(name);
        let lalr = lalr(&g);
        let clr = canonical(&g);
        assert!(lalr.table.conflicts().is_empty());
        assert!(clr.table.conflicts().is_empty());
        assert!(lalr.table.states.len() <= clr.table.states.len());

        assert_eq!(lalr.parse(&g, tokens(input)).is_accepted(), accepted, "{}", input);
        assert_eq!(clr.parse(&g, tokens(input)).is_accepted(), accepted, "{}", input);
    }
}

#[test]
fn merging_introduces_reduce_reduce_conflicts() {
    let g = load("lr1_only");

    let clr = canonical(&g);
    assert!(clr.table.conflicts().is_empty());
    for input in ["a c d", "a c e", "b c d", "b c e"] {
        assert!(clr.parse(&g, tokens(input)).is_accepted(), "{}", input);
    }

    let lalr = lalr(&g);
    assert_eq!(lalr.table.conflicts().len(), 2);
    assert!(lalr
        .table
        .conflicts()
        .iter()
        .all(|c| c.kind() == ConflictKind::ReduceReduce));

    // `A -> c` is declared first and wins both cells.
    assert!(lalr.parse(&g, tokens("a c d")).is_accepted());
    assert!(!lalr.parse(&g, tokens("a c e")).is_accepted());

    assert!(Config::new().use_strict().generate(&g).is_err());
    assert!(Config::new().use_strict().use_canonical().generate(&g).is_ok());
}

#[test]
fn shift_is_preferred_in_ambiguous_grammars() {
    let g = load("ambiguous");
    let generated = lalr(&g);
    assert!(generated
        .table
        .conflicts()
        .iter()
        .all(|c| c.kind() == ConflictKind::ShiftReduce));

    let trace = generated.parse(&g, tokens("n + n * n"));
    assert!(trace.is_accepted());

    // Shifting `*` over reducing `E + E` defers every reduction of `E + E`
    // until the end of the input.
    let reductions: Vec<_> = trace
        .steps()
        .iter()
        .filter(|step| matches!(step.action, StepAction::Reduce(..)))
        .map(|step| step.describe(&g).to_string())
        .collect();
    assert_eq!(
        reductions,
        [
            "Reduce by E -> n",
            "Reduce by E -> n",
            "Reduce by E -> n",
            "Reduce by E -> E * E",
            "Reduce by E -> E + E",
        ]
    );
}
