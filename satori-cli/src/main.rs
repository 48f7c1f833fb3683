use std::env;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::{anyhow, Error};
use clap::{values_t, App, AppSettings, Arg, ArgMatches};
use env_logger::{fmt, Builder, Target};
use log::{error, info};
use log::{Level, LevelFilter, Record};

use satori::pipeline::{self, SolveOptions, SolveOutcome, SolverKind};
use satori::SolverConfigUpdate;
use satori_dimacs::{write_dimacs, DimacsParser};
use satori_formula::{Expr, FormulaRepr};
use satori_prefix::parse_prefix;

/// How to read an input file.
#[derive(Copy, Clone, PartialEq, Eq)]
enum Loader {
    Auto,
    Prefix,
    Dimacs,
}

impl Loader {
    /// Resolve the `auto` loader by file extension.
    fn resolve(self, path: Option<&str>) -> Loader {
        if self != Loader::Auto {
            return self;
        }
        let is_dimacs = path
            .and_then(|path| Path::new(path).extension())
            .map(|ext| ext == "cnf" || ext == "dimacs")
            .unwrap_or(false);
        if is_dimacs {
            Loader::Dimacs
        } else {
            Loader::Prefix
        }
    }
}

fn main() {
    let exit_code = match main_with_err() {
        Err(err) => {
            error!("{}", err);
            1
        }
        Ok(exit_code) => exit_code,
    };
    std::process::exit(exit_code);
}

fn init_logging(debug: bool) {
    let format = |buf: &mut fmt::Formatter, record: &Record| {
        if record.level() == Level::Info {
            writeln!(buf, "c {}", record.args())
        } else {
            writeln!(buf, "c {}: {}", record.level(), record.args())
        }
    };

    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut builder = Builder::new();
    builder.target(Target::Stdout).format(format).filter(None, level);

    if let Ok(ref env_var) = env::var("SATORI_LOG") {
        builder.parse_filters(env_var);
    }

    builder.init();
}

fn main_with_err() -> Result<i32, Error> {
    let matches = App::new("satori")
        .version(env!("CARGO_PKG_VERSION"))
        .setting(AppSettings::DisableHelpSubcommand)
        .arg_from_usage("[INPUT]... 'The input files to solve (stdin if omitted)'")
        .arg(
            Arg::from_usage("[loader] --loader=[FORMAT] 'Input format'")
                .possible_values(&["auto", "prefix", "dimacs"])
                .default_value("auto")
                .case_insensitive(true),
        )
        .arg(
            Arg::from_usage("[solver] --solver=[NAME] 'Solving backend'")
                .possible_values(&["cdcl", "brute"])
                .default_value("cdcl")
                .case_insensitive(true),
        )
        .arg_from_usage("--no-ast-optimization 'Skip optimization of the formula tree'")
        .arg_from_usage("--no-cnf-conversion 'Keep the formula tree instead of converting to CNF'")
        .arg_from_usage("--no-simplification 'Skip CNF simplification'")
        .arg(
            Arg::from_usage("[expect] --expect=[RESULT] 'Fail unless the solver answers this'")
                .possible_values(&["sat", "unsat"])
                .case_insensitive(true),
        )
        .arg_from_usage("-m, --model 'Print the satisfying assignment'")
        .arg_from_usage("--debug 'Enable debug logging'")
        .arg_from_usage("[config-file] --config=[FILE] 'Read parameters from configuration file'")
        .arg(
            Arg::from_usage("[config-option] -C --config-option")
                .value_name("OPTION>=<VALUE")
                .help("Specify a single config option as a TOML fragment")
                .multiple(true)
                .number_of_values(1),
        )
        .arg_from_usage(
            "[write-dimacs] --write-dimacs=[FILE] 'Write the converted CNF for debugging'",
        )
        .get_matches();

    init_logging(matches.is_present("debug"));

    let mut config_update = SolverConfigUpdate::new();

    if let Some(config_path) = matches.value_of("config-file") {
        let mut config_contents = String::new();
        fs::File::open(config_path)?.read_to_string(&mut config_contents)?;

        config_update.merge(toml::from_str(&config_contents)?);
    }

    for config_option in values_t!(matches, "config-option", String).unwrap_or_default() {
        config_update.merge(toml::from_str(&config_option)?);
    }

    let options = SolveOptions {
        solver: match &matches.value_of("solver").unwrap().to_ascii_lowercase()[..] {
            "brute" => SolverKind::Brute,
            _ => SolverKind::Cdcl,
        },
        ast_optimization: !matches.is_present("no-ast-optimization"),
        cnf_conversion: !matches.is_present("no-cnf-conversion"),
        cnf_simplification: !matches.is_present("no-simplification"),
        expected_result: matches
            .value_of("expect")
            .map(|expect| expect.eq_ignore_ascii_case("sat")),
        config: config_update,
    };

    let loader = match &matches.value_of("loader").unwrap().to_ascii_lowercase()[..] {
        "prefix" => Loader::Prefix,
        "dimacs" => Loader::Dimacs,
        _ => Loader::Auto,
    };

    let mut exit_code = 0;

    match matches.values_of("INPUT") {
        Some(paths) => {
            for path in paths {
                info!("reading file '{}'", path);
                let file = fs::File::open(path)?;
                if let Err(err) = solve_input(file, loader.resolve(Some(path)), &options, &matches)
                {
                    error!("{}: {}", path, err);
                    println!("?");
                    exit_code = 1;
                }
            }
        }
        None => {
            info!("reading from stdin");
            let stdin = io::stdin();
            let locked_stdin = stdin.lock();
            if let Err(err) = solve_input(locked_stdin, loader.resolve(None), &options, &matches) {
                error!("{}", err);
                println!("?");
                exit_code = 1;
            }
        }
    }

    Ok(exit_code)
}

/// Load one input, solve it and print the answer.
fn solve_input(
    input: impl Read,
    loader: Loader,
    options: &SolveOptions,
    matches: &ArgMatches,
) -> Result<(), Error> {
    let outcome = match loader {
        Loader::Dimacs => {
            let cnf = DimacsParser::parse(input)?;
            if let Some(path) = matches.value_of("write-dimacs") {
                write_dimacs(&mut fs::File::create(path)?, &cnf)?;
            }
            pipeline::solve_cnf(cnf, options)?
        }
        _ => {
            let expr = parse_prefix(input)?;
            if let Some(path) = matches.value_of("write-dimacs") {
                dump_converted(&expr, options, path)?;
            }
            pipeline::solve_expr(&expr, options)?
        }
    };

    println!("{}", outcome.answer());

    if matches.is_present("model") {
        print_model(&outcome);
    }

    Ok(())
}

/// Write the Tseitin-converted CNF of a formula to a file.
fn dump_converted(expr: &Expr, options: &SolveOptions, path: &str) -> Result<(), Error> {
    let converted = pipeline::prepare_expr(expr, options);
    match converted.repr() {
        FormulaRepr::Cnf(cnf) => {
            write_dimacs(&mut fs::File::create(path)?, cnf)?;
            Ok(())
        }
        _ => Err(anyhow!(
            "cannot write DIMACS output with CNF conversion disabled"
        )),
    }
}

fn print_model(outcome: &SolveOutcome) {
    if let Some(model) = outcome.model() {
        for (name, value) in model {
            println!("{} = {}", name, value);
        }
    }
}
