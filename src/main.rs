use std::{fs, io};

use anyhow::{anyhow, Context};
use clap::{crate_version, App, Arg};
use log::{info, LevelFilter};

use kaleidoscope::{
    lexer::{dump_tokens, Lexer, LineLexer, TokenSource},
    parser::{Parser, PROMPT},
    printer::{render, Format},
};

struct Options {
    interactive: bool,
    tokens: bool,
    format: Format,
}

fn init_logging(verbosity: u64) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

/// Parse (or dump) everything `source` yields, returning the number of units
/// that failed to parse.
fn process<S: TokenSource>(mut source: S, options: &Options) -> anyhow::Result<(S, usize)> {
    if options.interactive {
        eprint!("{}", PROMPT);
    }

    if options.tokens {
        for line in dump_tokens(&mut source) {
            println!("{}", line);
        }
        return Ok((source, 0));
    }

    let mut failures = 0;
    let mut parser = Parser::new(source);
    parser
        .run(options.interactive, |unit| match unit {
            Ok(node) => println!("{}", render(&node, options.format)),
            Err(err) => {
                failures += 1;
                eprintln!("error: {}", err);
            }
        })
        .context("failed to write prompt")?;
    Ok((parser.into_source(), failures))
}

fn main() -> anyhow::Result<()> {
    let matches = App::new("kaleidoscope")
        .version(crate_version!())
        .about("parses kaleidoscope source and prints the resulting syntax tree")
        .arg(
            Arg::with_name("FILE")
                .help("source file to read, standard input when omitted")
                .index(1),
        )
        .arg(
            Arg::with_name("interactive")
                .short("i")
                .long("interactive")
                .help("print a prompt between top-level units"),
        )
        .arg(
            Arg::with_name("tokens")
                .long("tokens")
                .help("print the token stream instead of parsing"),
        )
        .arg(
            Arg::with_name("format")
                .long("format")
                .takes_value(true)
                .possible_values(&["source", "outline"])
                .default_value("source")
                .help("how parsed units are printed"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("raise log verbosity, repeat for more"),
        )
        .get_matches();

    init_logging(matches.occurrences_of("verbose"));

    let options = Options {
        interactive: matches.is_present("interactive"),
        tokens: matches.is_present("tokens"),
        format: matches
            .value_of("format")
            .unwrap_or("source")
            .parse()
            .map_err(|e: String| anyhow!(e))?,
    };

    let failures = match matches.value_of("FILE") {
        Some(path) => {
            info!("reading {}", path);
            let source =
                fs::read_to_string(path).with_context(|| format!("failed to read {}", path))?;
            process(Lexer::new(&source), &options)?.1
        }
        None => {
            info!("reading standard input");
            let stdin = io::stdin();
            let (mut lexer, failures) = process(LineLexer::new(stdin.lock()), &options)?;
            if let Some(err) = lexer.take_error() {
                return Err(err).context("failed to read standard input");
            }
            failures
        }
    };

    if failures > 0 {
        return Err(anyhow!("{} unit(s) failed to parse", failures));
    }

    Ok(())
}
