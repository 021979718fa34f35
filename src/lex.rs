use log::{debug, trace};

use crate::fsm::Fsm;
use crate::token::{Token, TokenKind, RESERVED_WORDS};
use crate::Error;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum State {
    Start,
    Id,
    Number,
    Unitary,
    /// Entered on a letter right after a digit run. Has no outgoing edges.
    Error,
}

pub mod class {
    pub const WHITESPACE: &str = " \t\r\n";
    pub const LETTERS: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
    pub const DIGITS: &str = "0123456789";
    pub const MUL_OPS: &str = "*/";
    pub const REL_OPS: &str = "<>";
    pub const ASSIGNMENT: &str = "=";
    pub const DELIMITERS: &str = "(){};,";
    pub const UNITARY: &str = "+-*/<>=(){};,";
}

pub type TransitionTable<'a> = [(State, &'a str, State)];

pub const TRANSITIONS: &TransitionTable<'static> = &[
    (State::Start, class::WHITESPACE, State::Start),
    (State::Start, class::LETTERS, State::Id),
    (State::Start, class::DIGITS, State::Number),
    (State::Start, class::UNITARY, State::Unitary),
    (State::Id, class::WHITESPACE, State::Start),
    (State::Id, class::LETTERS, State::Id),
    (State::Id, class::DIGITS, State::Id),
    (State::Id, class::UNITARY, State::Unitary),
    (State::Number, class::WHITESPACE, State::Start),
    (State::Number, class::LETTERS, State::Error),
    (State::Number, class::DIGITS, State::Number),
    (State::Number, class::UNITARY, State::Unitary),
];

#[derive(Clone, Copy, Debug)]
struct Position {
    line: usize,
    column: usize,
}

impl Position {
    fn advance(&mut self, ch: char) {
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self { line: 1, column: 1 }
    }
}

pub struct LexicalAnalyzer {
    fsm: Fsm<State>,
}

impl Default for LexicalAnalyzer {
    fn default() -> Self {
        Self::new(TRANSITIONS)
    }
}

impl LexicalAnalyzer {
    /// Build an analyzer whose machine has one edge per character of each class in `table`.
    pub fn new(table: &TransitionTable<'_>) -> Self {
        let mut fsm = Fsm::new(State::Start);
        for &(from, chars, to) in table {
            for activator in chars.chars() {
                fsm.add_transition(from, to, activator);
            }
        }
        Self { fsm }
    }

    /// Split `source` into tokens.
    ///
    /// # Errors
    /// If a character has no edge out of the current state, or a number runs into a letter.
    pub fn parse(&mut self, source: &str) -> Result<Vec<Token>, Error> {
        self.fsm.reset();
        let result = self.scan(source);
        self.fsm.reset();
        result
    }

    fn scan(&mut self, source: &str) -> Result<Vec<Token>, Error> {
        let mut tokens = Vec::new();
        let mut lexeme = String::new();
        let mut pos = Position::default();
        let mut chars = source.chars().peekable();

        while let Some(ch) = chars.next() {
            let at = pos;
            pos.advance(ch);

            let previous = self.fsm.current();
            let current = self.fsm.transition(ch).map_err(|source| Error::Lexical {
                line: at.line,
                column: at.column,
                source,
            })?;

            match current {
                State::Error => {
                    lexeme.push(ch);
                    return Err(Error::MalformedNumber {
                        lexeme,
                        line: at.line,
                        column: at.column,
                    });
                }
                State::Start if previous != State::Start => {
                    tokens.push(finish(previous, std::mem::take(&mut lexeme)));
                }
                State::Start => {}
                State::Unitary => {
                    if previous != State::Start {
                        tokens.push(finish(previous, std::mem::take(&mut lexeme)));
                    }
                    let token = if ch == '=' && chars.next_if_eq(&'=').is_some() {
                        pos.advance('=');
                        Token::new(TokenKind::RelOp, "==")
                    } else {
                        Token::new(classify(ch), ch)
                    };
                    trace!("lexed {:?}", token);
                    tokens.push(token);
                    self.fsm.reset();
                }
                State::Id | State::Number => lexeme.push(ch),
            }
        }

        let last = self.fsm.current();
        if last != State::Start {
            tokens.push(finish(last, lexeme));
        }

        debug!("lexed {} tokens", tokens.len());
        Ok(tokens)
    }
}

fn finish(state: State, lexeme: String) -> Token {
    let kind = if state == State::Number {
        TokenKind::Number
    } else if RESERVED_WORDS.contains(&lexeme.as_str()) {
        TokenKind::Reserved
    } else {
        TokenKind::Identifier
    };
    let token = Token::new(kind, lexeme);
    trace!("lexed {:?}", token);
    token
}

fn classify(ch: char) -> TokenKind {
    if class::MUL_OPS.contains(ch) {
        TokenKind::MulOp
    } else if class::REL_OPS.contains(ch) {
        TokenKind::RelOp
    } else if class::ASSIGNMENT.contains(ch) {
        TokenKind::Assignment
    } else if class::DELIMITERS.contains(ch) {
        TokenKind::Delimiter
    } else {
        TokenKind::AddOp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<(TokenKind, String)> {
        LexicalAnalyzer::default()
            .parse(source)
            .expect("source should lex")
            .into_iter()
            .map(|t| (t.kind(), t.into_text()))
            .collect()
    }

    fn one(kind: TokenKind, text: &str) -> Vec<(TokenKind, String)> {
        vec![(kind, text.to_string())]
    }

    #[test]
    fn reserved_words_alone() {
        for word in RESERVED_WORDS {
            assert_eq!(lex(&format!(" {word} ")), one(TokenKind::Reserved, word));
        }
    }

    #[test]
    fn identifiers_alone() {
        for name in ["x", "count", "x1", "camelCase", "integer", "Write"] {
            assert_eq!(lex(&format!(" {name} ")), one(TokenKind::Identifier, name));
        }
    }

    #[test]
    fn numbers_alone() {
        for number in ["0", "7", "42", "1000"] {
            assert_eq!(lex(&format!(" {number} ")), one(TokenKind::Number, number));
        }
    }

    #[test]
    fn trailing_lexeme_is_kept() {
        assert_eq!(lex("abc"), one(TokenKind::Identifier, "abc"));
        assert_eq!(lex("12"), one(TokenKind::Number, "12"));
    }

    #[test]
    fn double_equals_is_one_relop() {
        assert_eq!(lex("=="), one(TokenKind::RelOp, "=="));
        assert_eq!(
            lex("a==b"),
            vec![
                (TokenKind::Identifier, "a".to_string()),
                (TokenKind::RelOp, "==".to_string()),
                (TokenKind::Identifier, "b".to_string()),
            ]
        );
    }

    #[test]
    fn spaced_equals_stay_assignments() {
        assert_eq!(
            lex("= ="),
            vec![
                (TokenKind::Assignment, "=".to_string()),
                (TokenKind::Assignment, "=".to_string()),
            ]
        );
    }

    #[test]
    fn unitary_kinds() {
        let kinds: Vec<TokenKind> = lex("+-*/<>=(){};,").into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::AddOp,
                TokenKind::AddOp,
                TokenKind::MulOp,
                TokenKind::MulOp,
                TokenKind::RelOp,
                TokenKind::RelOp,
                TokenKind::Assignment,
                TokenKind::Delimiter,
                TokenKind::Delimiter,
                TokenKind::Delimiter,
                TokenKind::Delimiter,
                TokenKind::Delimiter,
                TokenKind::Delimiter,
            ]
        );
    }

    #[test]
    fn statement_without_spaces() {
        assert_eq!(
            lex("x=x+1;"),
            vec![
                (TokenKind::Identifier, "x".to_string()),
                (TokenKind::Assignment, "=".to_string()),
                (TokenKind::Identifier, "x".to_string()),
                (TokenKind::AddOp, "+".to_string()),
                (TokenKind::Number, "1".to_string()),
                (TokenKind::Delimiter, ";".to_string()),
            ]
        );
    }

    #[test]
    fn whitespace_emits_nothing() {
        assert!(lex(" \t\r\n  ").is_empty());
    }

    #[test]
    fn letter_after_digits_is_malformed_number() {
        let err = LexicalAnalyzer::default().parse("x = 12ab;").unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedNumber { ref lexeme, line: 1, column: 7 } if lexeme == "12a"
        ));
    }

    #[test]
    fn unknown_character_reports_position() {
        let err = LexicalAnalyzer::default().parse("int x;\n  $").unwrap_err();
        assert!(matches!(
            err,
            Error::Lexical {
                line: 2,
                column: 3,
                source: crate::fsm::TransitionError {
                    state: State::Start,
                    activator: '$'
                }
            }
        ));
    }

    #[test]
    fn analyzer_is_reusable_after_failure() {
        let mut analyzer = LexicalAnalyzer::default();
        assert!(analyzer.parse("a $").is_err());
        assert_eq!(analyzer.parse("b").unwrap().len(), 1);
    }
}
