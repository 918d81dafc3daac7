//! beryl-drv - Front-end driver.
//!
//! The driver is the downstream-consumer surface of the front end: it
//! reads source files, runs the lexer and parser, and prints one
//! S-expression per top-level statement (or the syntax error, with its
//! file, line, and excerpt). Code generation and evaluation consume the
//! same S-expression stream.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use beryl_par::{NodeKind, Parser};

/// Driver options
#[derive(Debug, Default)]
pub struct Config {
    /// Dump the token stream instead of parsing
    pub tokens_only: bool,
}

/// Parse one file and render its S-expressions
pub fn process_file(path: &Path, config: &Config) -> Result<String> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let label = path.display().to_string();
    process_source(&source, &label, config)
}

/// Parse a source string and render its S-expressions
pub fn process_source(source: &str, label: &str, config: &Config) -> Result<String> {
    if config.tokens_only {
        let tokens = beryl_lex::Lexer::new(source, label).tokens();
        let mut out = String::new();
        for token in tokens {
            out.push_str(&format!(
                "{}:{}: {:?} {}\n",
                token.line() + 1,
                token.column() + 1,
                token.kind(),
                token.display_value()
            ));
        }
        return Ok(out);
    }

    let mut parser = Parser::new(source, label);
    let tree = parser
        .tree()
        .map_err(|error| anyhow::anyhow!("{}", error))?;
    let mut out = String::new();
    match tree.kind() {
        NodeKind::Block { nodes } => {
            for node in nodes {
                out.push_str(&node.to_sexp().to_string());
                out.push('\n');
            }
        },
        _ => {
            out.push_str(&tree.to_sexp().to_string());
            out.push('\n');
        },
    }
    Ok(out)
}
