use std::io::{BufRead, BufReader};
use std::time::Instant;

use hopcroft::prelude::*;

use tracing::debug;
use tracing_subscriber::{filter, prelude::*};

use clap::{Arg, ArgMatches, Command};

fn cli() -> clap::Command {
    Command::new("hopcroft")
        .about("Builds a deterministic finite automaton and minimizes it")
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbosity")
                .num_args(0..=1)
                .require_equals(true)
                .value_parser(["info", "debug", "trace"])
                .default_missing_value("info"),
        )
        .arg(Arg::new("file").value_name("FILE").help(
            "transition table in tabular format; when omitted, \
             a lexicon is read from stdin, one word per line",
        ))
        .arg(
            Arg::new("dot-before")
                .long("dot-before")
                .value_name("PATH")
                .help("write the automaton in dot format before minimizing"),
        )
        .arg(
            Arg::new("dot-after")
                .long("dot-after")
                .value_name("PATH")
                .help("write the minimized automaton in dot format"),
        )
}

fn setup_logging(matches: &ArgMatches) {
    let level = match matches
        .try_get_one::<String>("verbosity")
        .ok()
        .flatten()
        .map(|m| m.as_str())
    {
        Some("trace") => filter::LevelFilter::TRACE,
        Some("debug") => filter::LevelFilter::DEBUG,
        Some("info") => filter::LevelFilter::INFO,
        _ => filter::LevelFilter::WARN,
    };

    let stdout_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(stdout_log.with_filter(level))
        .init();
}

pub fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = cli().get_matches();

    setup_logging(&matches);

    let mut dfa = match matches.get_one::<String>("file") {
        Some(path) => {
            debug!("reading transition table from {path}");
            Dfa::from_att(BufReader::new(std::fs::File::open(path)?))?
        }
        None => {
            debug!("reading lexicon from stdin");
            let mut dfa = Dfa::new();
            for line in std::io::stdin().lock().lines() {
                dfa.add_word(line?);
            }
            dfa
        }
    };

    println!("{dfa}");
    if let Some(path) = matches.get_one::<String>("dot-before") {
        debug!("writing input automaton to {path}");
        dfa.save_dot(path)?;
    }

    let start = Instant::now();
    dfa.minimize();
    println!("minimized in {:.6}s", start.elapsed().as_secs_f64());

    println!("{dfa}");
    if let Some(path) = matches.get_one::<String>("dot-after") {
        debug!("writing minimized automaton to {path}");
        dfa.save_dot(path)?;
    }

    Ok(())
}
