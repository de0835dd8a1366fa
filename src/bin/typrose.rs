//! Command-line interface for typrose
//! Converts a Typst source file plus its compiler debug AST dump into a
//! textlint-shaped prose tree.
//!
//! Usage:
//!   typrose convert `<source>` --dump `<dump>` [--format `<format>`]  - Convert a source/dump pair

use clap::{Arg, Command};

use typrose::formats::{to_json_string_pretty, to_json_string};
use typrose::Node;

fn main() {
    let matches = Command::new("typrose")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Converts Typst compiler AST dumps into textlint prose trees")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("convert")
                .about("Convert a source/dump pair into a prose tree")
                .arg(
                    Arg::new("source")
                        .help("Path to the Typst source file")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("dump")
                        .long("dump")
                        .short('d')
                        .help("Path to the compiler debug AST dump")
                        .required(true),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .short('f')
                        .help("Output format ('json', 'json-compact', 'summary')")
                        .default_value("json"),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("convert", convert_matches)) => {
            let source = convert_matches
                .get_one::<String>("source")
                .map(String::as_str)
                .unwrap_or_default();
            let dump = convert_matches
                .get_one::<String>("dump")
                .map(String::as_str)
                .unwrap_or_default();
            let format = convert_matches
                .get_one::<String>("format")
                .map(String::as_str)
                .unwrap_or("json");
            handle_convert_command(source, dump, format);
        }
        _ => unreachable!(),
    }
}

/// Handle the convert command
fn handle_convert_command(source_path: &str, dump_path: &str, format: &str) {
    let source = read_file(source_path);
    let dump = read_file(dump_path);
    let document = typrose::convert(&source, &dump).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });
    match format {
        "json" => println!("{}", to_json_string_pretty(&document)),
        "json-compact" => println!("{}", to_json_string(&document)),
        "summary" => print_summary(&document),
        other => {
            eprintln!("Error: unknown format '{}'", other);
            std::process::exit(1);
        }
    }
}

fn read_file(path: &str) -> String {
    std::fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {}", path, e);
        std::process::exit(1);
    })
}

/// One line per top-level node: kind, byte range, and a short excerpt.
fn print_summary(document: &Node) {
    for child in document.children().unwrap_or_default() {
        let (start, end) = child.range();
        let excerpt: String = child.raw().chars().take(40).collect();
        println!(
            "{:<12} {:>5}..{:<5} {:?}",
            child.type_name(),
            start,
            end,
            excerpt
        );
    }
}
