extern crate clap;
#[macro_use] extern crate log;
extern crate fern;
extern crate chrono;
extern crate regex;
extern crate term_grid;

pub mod compiler;

use clap::{Arg, ArgMatches, App};
use term_grid::{Grid, GridOptions, Direction, Filling, Cell};

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use compiler::ast::Node;
use compiler::codegen::flatten;

fn main() {
    let args = process_arguments();
    initialize_logging(args.occurrences_of("verbose"));

    let ifile = args.value_of("INPUT").unwrap();
    let tfile = args.value_of("template").unwrap();

    debug!("Arguments:\n\tVerbosity: {}\n\tStrict: {}\n\tOutfile: {}\n\tTemplate: {}\n\tInfile: {}",
        verbosity(args.occurrences_of("verbose")),
        args.is_present("strict"),
        args.value_of("output").unwrap_or("None"),
        tfile,
        ifile
    );

    let source = read_or_exit(Path::new(ifile), "input");
    let template = read_or_exit(Path::new(tfile), "template");
    let options = compiler::Options { strict: args.is_present("strict") };

    if args.is_present("print-debug") {
        // A parse failure is reported by compile() below.
        if let Ok(forms) = compiler::parse(&source, options) {
            print_debug(&forms);
        }
    }

    let program = match compiler::compile(&source, &template, options) {
        Err(err) => {
            error!("fatal: unable to compile `{}`: {}", ifile, err);
            std::process::exit(1);
        },
        Ok(program) => program,
    };

    match args.value_of("output") {
        Some(filename) => {
            let opath = Path::new(filename);
            let mut ofile = match File::create(&opath) {
                Err(err) => {
                    error!("fatal: unable to open output file `{}`: {}", opath.display(), err);
                    std::process::exit(1);
                },
                Ok(file) => file,
            };

            if let Err(err) = write_program(&mut ofile, &program) {
                error!("fatal: unable to write to output file `{}`: {}", opath.display(), err);
                std::process::exit(1);
            }
            info!("Wrote {} byte(s) to `{}`.", program.len() + 1, opath.display());
        },
        None => {
            let stdout = std::io::stdout();
            if let Err(err) = write_program(&mut stdout.lock(), &program) {
                error!("fatal: unable to write to STDOUT: {}", err);
                std::process::exit(1);
            }
        },
    }
}

/// Writes the filled template followed by a newline.
fn write_program<W: Write>(out: &mut W, program: &str) -> io::Result<()> {
    writeln!(out, "{}", program)?;
    out.flush()
}

fn read_or_exit(path: &Path, what: &str) -> String {
    match fs::read_to_string(path) {
        Err(err) => {
            error!("fatal: unable to read {} file `{}`: {}", what, path.display(), err);
            std::process::exit(1);
        },
        Ok(text) => text,
    }
}

/// Lists every top-level form with the section it lands in and how many
/// lines of assembly it produced.
fn print_debug(forms: &[Node]) {
    let mut grid = Grid::new(GridOptions {
        filling:     Filling::Spaces(1),
        direction:   Direction::LeftToRight,
    });

    for (idx, form) in forms.iter().enumerate() {
        let section = if form.is_definition() { "sub" } else { "code" };
        grid.add(Cell::from(format!("0x{:04X}:", idx)));
        grid.add(Cell::from(section.to_string()));
        grid.add(Cell::from(format!("{}", form).escape_debug().to_string()));
        grid.add(Cell::from("=>".to_string()));
        grid.add(Cell::from(format!("{} line(s)", flatten(&form.compile()).len())));
    }

    eprintln!("{}", grid.fit_into_columns(5));
}

fn verbosity(occurrences: u64) -> log::LevelFilter {
    match occurrences {
        0 => log::LevelFilter::Error,
        1 => log::LevelFilter::Warn,
        2 => log::LevelFilter::Info,
        3 | _ => log::LevelFilter::Debug,
    }
}

fn process_arguments() -> ArgMatches<'static> {
    App::new(option_env!("CARGO_PKG_NAME").unwrap())
        .version(option_env!("CARGO_PKG_VERSION").unwrap())
        .author(option_env!("CARGO_PKG_AUTHORS").unwrap())
        .about(option_env!("CARGO_PKG_DESCRIPTION").unwrap())
        .arg(Arg::with_name("INPUT")
            .help("Sets the source file to compile")
            .required(true)
            .multiple(false)
            .index(1))
        .arg(Arg::with_name("verbose")
            .short("v")
            .multiple(true)
            .takes_value(false)
            .help("Sets the level of verbosity"))
        .arg(Arg::with_name("output")
            .short("o")
            .long("output")
            .takes_value(true)
            .help("write output to an outfile instead of STDOUT"))
        .arg(Arg::with_name("template")
            .short("t")
            .long("template")
            .takes_value(true)
            .default_value("kernel.s")
            .help("the assembly template holding the ;cd and ;sr markers"))
        .arg(Arg::with_name("strict")
            .short("s")
            .long("strict")
            .takes_value(false)
            .help("reject trailing tokens that do not start a statement or definition"))
        .arg(Arg::with_name("print-debug")
            .short("d")
            .long("print-debug")
            .alias("show")
            .takes_value(false)
            .help("prints each top-level form and its generated line count to STDERR"))
        .get_matches()
}

// Logs go to STDERR; STDOUT carries the compiled program.
fn initialize_logging(occurrences: u64) {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(verbosity(occurrences))
        .chain(std::io::stderr())
        .apply().ok();
}
