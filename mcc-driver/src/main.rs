//! Command-line driver for the C front end.
//!
//! One subcommand per pipeline stage: `preprocess` emits the expanded
//! source text, `lex` the token stream, `parse` the syntax tree and
//! `diagram` a Graphviz rendering of it. Every stage runs the stages
//! before it, so `parse` always sees preprocessed input.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use serde::Serialize;

use mcc_frontend::{diagnostics, diagram, AstNode, Frontend, Token};
use mcc_preprocessor::Preprocessor;

#[derive(Parser)]
#[command(name = "mcc")]
#[command(version)]
#[command(about = "C front end: preprocess, tokenize and parse C sources")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the preprocessor and emit the expanded source text
    Preprocess {
        #[command(flatten)]
        options: PipelineOptions,

        /// Print the final macro table to stdout after processing
        #[arg(long)]
        dump_defines: bool,
    },

    /// Preprocess and tokenize, one `lexeme, Kind` line per token
    Lex {
        #[command(flatten)]
        options: PipelineOptions,

        /// Emit the token stream as JSON instead of plain lines
        #[arg(long)]
        json: bool,
    },

    /// Run the full pipeline and print the syntax tree
    Parse {
        #[command(flatten)]
        options: PipelineOptions,
    },

    /// Run the full pipeline and emit the tree as Graphviz DOT text
    Diagram {
        #[command(flatten)]
        options: PipelineOptions,
    },
}

/// Options shared by every subcommand.
#[derive(Args)]
struct PipelineOptions {
    /// Input C source file
    input: PathBuf,

    /// Output file; stdout when omitted
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Search directory for `#include "..."`; may repeat
    #[arg(short = 'I', value_name = "DIR")]
    include: Vec<PathBuf>,

    /// Predefine an object macro, `NAME` or `NAME=VALUE`; may repeat
    #[arg(short = 'D', value_name = "NAME[=VALUE]")]
    define: Vec<String>,

    /// Undefine a macro before processing starts; may repeat
    #[arg(short = 'U', value_name = "NAME")]
    undefine: Vec<String>,

    /// Root directory for `#include <...>` lookups
    #[arg(long, value_name = "DIR")]
    system_root: Option<PathBuf>,

    /// Ceiling for nested includes
    #[arg(long, value_name = "N")]
    max_include_depth: Option<usize>,

    /// Suppress the implicit `NDEBUG` definition
    #[arg(long)]
    debug: bool,

    /// Enable log output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Preprocess {
            options,
            dump_defines,
        } => preprocess_command(&options, dump_defines),
        Commands::Lex { options, json } => lex_command(&options, json),
        Commands::Parse { options } => parse_command(&options),
        Commands::Diagram { options } => diagram_command(&options),
    }
}

fn preprocess_command(options: &PipelineOptions, dump_defines: bool) -> Result<()> {
    let (preprocessor, text) = preprocess_input(options)?;
    write_output(options.output.as_deref(), &text)?;
    if dump_defines {
        print!("{}", preprocessor.dump_defines());
    }
    Ok(())
}

fn lex_command(options: &PipelineOptions, json: bool) -> Result<()> {
    let (_, text) = preprocess_input(options)?;
    let tokens = Frontend::tokenize_source(&text)?;
    let rendered = if json {
        let mut dump = serde_json::to_string_pretty(&TokenDump { tokens: &tokens })?;
        dump.push('\n');
        dump
    } else {
        token_lines(&tokens)
    };
    write_output(options.output.as_deref(), &rendered)
}

fn parse_command(options: &PipelineOptions) -> Result<()> {
    let tree = parse_input(options)?;
    write_output(options.output.as_deref(), &tree.format_tree())
}

fn diagram_command(options: &PipelineOptions) -> Result<()> {
    let tree = parse_input(options)?;
    write_output(options.output.as_deref(), &diagram::to_dot(&tree))
}

/// Run the preprocessor over the input file with all shared options
/// applied. The preprocessor is returned alongside the text so
/// `--dump-defines` can read the final macro table.
fn preprocess_input(options: &PipelineOptions) -> Result<(Preprocessor, String)> {
    if options.verbose {
        env_logger::init();
    }

    let source = fs::read_to_string(&options.input)
        .with_context(|| format!("failed to read {}", options.input.display()))?;

    let mut preprocessor = Preprocessor::new();
    for dir in &options.include {
        preprocessor.add_include_dir(dir.clone());
    }
    for define in &options.define {
        match define.split_once('=') {
            Some((name, value)) => preprocessor.define(name.to_string(), Some(value.to_string())),
            None => preprocessor.define(define.clone(), None),
        }
    }
    for name in &options.undefine {
        preprocessor.undefine(name);
    }
    if let Some(root) = &options.system_root {
        preprocessor.set_system_root(root.clone());
    }
    if let Some(depth) = options.max_include_depth {
        preprocessor.set_max_include_depth(depth);
    }
    preprocessor.set_debug(options.debug);

    let text = preprocessor
        .process(&source, options.input.clone())
        .with_context(|| format!("failed to preprocess {}", options.input.display()))?;
    info!(
        "preprocessed {} into {} bytes",
        options.input.display(),
        text.len()
    );
    Ok((preprocessor, text))
}

/// Run the full pipeline up to the parser. On a syntax error the error
/// and a source rendering with the offending token marked go to stderr
/// and the process exits with status 1.
fn parse_input(options: &PipelineOptions) -> Result<AstNode> {
    let (_, text) = preprocess_input(options)?;
    let tokens = Frontend::tokenize_source(&text)?;
    let mut parser = mcc_frontend::Parser::new(tokens);
    match parser.parse() {
        Ok(tree) => {
            info!("parsed {} external declarations", tree.children.len());
            Ok(tree)
        }
        Err(error) => {
            eprintln!("{error}");
            if let Some(at) = error.token_index() {
                eprintln!("{}", diagnostics::render(parser.tokens(), at));
            }
            process::exit(1);
        }
    }
}

/// One `lexeme, Kind` line per token, end-of-input included.
fn token_lines(tokens: &[Token]) -> String {
    let mut out = String::new();
    for token in tokens {
        out.push_str(&format!("{}, {:?}\n", token.lexeme, token.kind));
    }
    out
}

fn write_output(output: Option<&Path>, text: &str) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?
        }
        None => print!("{text}"),
    }
    Ok(())
}

#[derive(Serialize)]
struct TokenDump<'a> {
    tokens: &'a [Token],
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcc_common::CompilerError;

    #[test]
    fn test_token_lines_format() {
        let tokens = Frontend::tokenize_source("int x;").unwrap();
        assert_eq!(
            token_lines(&tokens),
            "int, Int\nx, Identifier\n;, Punctuator\n, Eof\n"
        );
    }

    #[test]
    fn test_token_dump_serializes_kind_and_lexeme() {
        let tokens = Frontend::tokenize_source("42").unwrap();
        let dump = serde_json::to_string(&TokenDump { tokens: &tokens }).unwrap();
        assert!(dump.contains("\"kind\":\"IntegerConstant\""));
        assert!(dump.contains("\"lexeme\":\"42\""));
    }

    #[test]
    fn test_cli_parses_lex_with_json() {
        let cli = Cli::try_parse_from(["mcc", "lex", "input.c", "--json"]).unwrap();
        match cli.command {
            Commands::Lex { options, json } => {
                assert!(json);
                assert_eq!(options.input, PathBuf::from("input.c"));
            }
            _ => panic!("expected the lex subcommand"),
        }
    }

    #[test]
    fn test_cli_collects_defines_and_includes() {
        let cli = Cli::try_parse_from([
            "mcc",
            "preprocess",
            "main.c",
            "-D",
            "DEBUG=1",
            "-D",
            "TRACE",
            "-I",
            "include",
            "-U",
            "NDEBUG",
        ])
        .unwrap();
        match cli.command {
            Commands::Preprocess {
                options,
                dump_defines,
            } => {
                assert!(!dump_defines);
                assert_eq!(options.define, vec!["DEBUG=1", "TRACE"]);
                assert_eq!(options.include, vec![PathBuf::from("include")]);
                assert_eq!(options.undefine, vec!["NDEBUG"]);
            }
            _ => panic!("expected the preprocess subcommand"),
        }
    }

    #[test]
    fn test_pipeline_reports_syntax_errors() {
        let tokens = Frontend::tokenize_source("int main( { }").unwrap();
        let mut parser = mcc_frontend::Parser::new(tokens);
        let error = parser.parse().unwrap_err();
        assert!(matches!(error, CompilerError::SyntaxError { .. }));
        assert_eq!(error.token_index(), Some(3));
    }
}
