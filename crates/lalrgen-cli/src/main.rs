mod render;

use anyhow::Context as _;
use clap::Parser;
use lalrgen::{grammar::Grammar, Config};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The path of grammar file, one `HEAD -> body | body` rule per line.
    grammar: PathBuf,

    /// The start symbol. Defaults to the head of the first rule.
    #[arg(long)]
    start: Option<String>,

    /// The input to parse, as whitespace-separated terminal names.
    #[arg(long)]
    input: Option<String>,

    /// Treat every non-whitespace character of the input as a token.
    #[arg(long)]
    chars: bool,

    /// Build canonical LR(1) tables instead of LALR(1) ones.
    #[arg(long)]
    canonical: bool,

    /// Fail if the table has any conflict.
    #[arg(long)]
    strict: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::trace!("CLI args = {:?}", args);

    let grammar = Grammar::from_file(&args.grammar, args.start.as_deref()).with_context(|| {
        anyhow::anyhow!("failed to load the grammar from {}", args.grammar.display())
    })?;

    let mut config = Config::new();
    if args.canonical {
        config.use_canonical();
    }
    if args.strict {
        config.use_strict();
    }
    let generated = config
        .generate(&grammar)
        .context("failed to generate the parse table")?;

    println!("## LR(1) item sets");
    println!("{}", render::lr1_collection(&grammar, &generated.lr1));
    println!("## LR(1) transitions");
    println!("{}", render::transitions(&grammar, &generated.lr1));
    println!("## parse table");
    println!("{}", render::parse_table(&grammar, &generated.table));

    let conflicts = generated.table.conflicts();
    if !conflicts.is_empty() {
        let suffix = if conflicts.len() == 1 { "" } else { "s" };
        println!(
            "[warning] The table has {} conflict{}, resolved as follows:",
            conflicts.len(),
            suffix
        );
        for conflict in conflicts {
            println!("- {}", conflict.display(&grammar));
        }
        println!();
    }

    let input = match &args.input {
        Some(input) => input,
        None => return Ok(()),
    };
    let tokens: Vec<String> = if args.chars {
        input
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(String::from)
            .collect()
    } else {
        input.split_whitespace().map(String::from).collect()
    };

    let trace = generated.parse(&grammar, &tokens);
    println!("## parse trace");
    print!("{}", render::trace(&grammar, &trace));

    if let Some(err) = trace.error() {
        anyhow::bail!("the input was rejected: {}", err);
    }

    Ok(())
}
