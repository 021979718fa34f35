pub mod fsm;
mod gen;
pub mod ir;
pub mod lex;
pub mod token;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;

pub use gen::CodeGen;
use ir::{Layout, Printer, Sink};
use lex::LexicalAnalyzer;
use token::Token;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{line}:{column}: {source}")]
    Lexical {
        line: usize,
        column: usize,
        source: fsm::TransitionError<lex::State>,
    },

    #[error("{line}:{column}: malformed number `{lexeme}`")]
    MalformedNumber {
        lexeme: String,
        line: usize,
        column: usize,
    },

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("expected {expected}, found `{found}`")]
    UnexpectedToken { expected: String, found: Token },

    #[error("malformed expression")]
    MalformedExpression,

    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Mode {
    #[default]
    Triplets,
    Tokens,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub file: PathBuf,
    pub output: Option<PathBuf>,
    pub mode: Mode,
    pub layout: Layout,
}

/// Split source text into tokens.
///
/// # Errors
/// If the text contains a character sequence outside the lexical grammar.
pub fn tokenize(source: &str) -> Result<Vec<Token>, Error> {
    LexicalAnalyzer::default().parse(source)
}

/// Translate source text, handing each triplet to `sink` as soon as it is produced.
///
/// # Errors
/// If lexing or translation fails, or the sink does. Lines emitted before the failure have
/// already reached the sink.
pub fn compile<S: Sink>(source: &str, sink: S) -> Result<(), Error> {
    let tokens = tokenize(source)?;
    CodeGen::new(tokens, sink).generate_code()
}

/// Run the compiler as configured.
///
/// # Errors
/// If the files cannot be read or written, or compilation fails.
pub fn run(config: &Config) -> anyhow::Result<()> {
    let source = std::fs::read_to_string(&config.file)
        .with_context(|| format!("could not read {}", config.file.display()))?;

    let mut out: Box<dyn Write> = match &config.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("could not create {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };

    match config.mode {
        Mode::Tokens => {
            for token in tokenize(&source)? {
                writeln!(out, "{:<10} {token}", token.kind().to_string())?;
            }
        }
        Mode::Triplets => {
            let mut printer = Printer::new(&mut out, config.layout);
            compile(&source, &mut printer)
                .with_context(|| format!("could not compile {}", config.file.display()))?;
        }
    }
    out.flush()?;
    Ok(())
}
