mod expr;

use std::collections::VecDeque;

use log::debug;

use crate::ir::{Line, Names, Operand, Sink, Temp, Triplet};
use crate::token::{self, Pattern, Token};
use crate::Error;

/// Single-pass translator from tokens to triplets.
///
/// Every grammar rule is a method that consumes its tokens and emits triplets into the sink
/// as it goes. No syntax tree is built. Input is assumed to be well formed; anything else
/// ends the run with an error, leaving what was already emitted in the sink.
pub struct CodeGen<S> {
    tokens: VecDeque<Token>,
    /// Everything consumed so far, replays included. Loops slice their condition out of it by mark.
    consumed: Vec<Token>,
    depth: usize,
    names: Names,
    sink: S,
}

impl<S: Sink> CodeGen<S> {
    pub fn new(tokens: Vec<Token>, sink: S) -> Self {
        Self {
            tokens: tokens.into(),
            consumed: Vec::new(),
            depth: 0,
            names: Names::default(),
            sink,
        }
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Translate function definitions until the tokens run out.
    ///
    /// # Errors
    /// If the tokens do not form a sequence of function definitions, or the sink fails.
    pub fn generate_code(&mut self) -> Result<(), Error> {
        while !self.tokens.is_empty() {
            self.expand_function()?;
        }
        Ok(())
    }

    fn first(&self) -> Option<&Token> {
        self.tokens.front()
    }

    fn at(&self, pattern: Pattern) -> bool {
        self.nth_is(0, pattern)
    }

    /// Whether the token `n` places ahead (0 is the next one) matches.
    fn nth_is(&self, n: usize, pattern: Pattern) -> bool {
        self.tokens.get(n).is_some_and(|t| t.matches(pattern))
    }

    fn consume(&mut self) -> Result<Token, Error> {
        let token = self.tokens.pop_front().ok_or(Error::UnexpectedEof)?;
        self.consumed.push(token.clone());
        Ok(token)
    }

    fn expect(&mut self, pattern: Pattern) -> Result<Token, Error> {
        let token = self.consume()?;
        if token.matches(pattern) {
            Ok(token)
        } else {
            Err(Error::UnexpectedToken {
                expected: pattern.to_string(),
                found: token,
            })
        }
    }

    fn expect_type(&mut self) -> Result<Token, Error> {
        let token = self.consume()?;
        if token.is_type() {
            Ok(token)
        } else {
            Err(Error::UnexpectedToken {
                expected: "a type".to_string(),
                found: token,
            })
        }
    }

    fn emit(&mut self, triplet: Triplet) -> Result<(), Error> {
        self.sink.emit(Line {
            depth: self.depth,
            triplet,
        })
    }

    /// Emit one level out from the current depth.
    fn emit_outer(&mut self, triplet: Triplet) -> Result<(), Error> {
        self.sink.emit(Line {
            depth: self.depth.saturating_sub(1),
            triplet,
        })
    }

    fn expand_function(&mut self) -> Result<(), Error> {
        debug!("expand_function first={:?}", self.first());
        self.expect_type()?;
        let name = self.expect(token::IDENTIFIER)?.into_text();
        self.expect(token::OPEN_PAREN)?;
        self.expand_arguments()?;
        self.expect(token::CLOSE_PAREN)?;

        self.emit(Triplet::Entry(name.clone()))?;
        self.depth += 1;
        self.expand_compound_statement()?;
        if name == "main" {
            self.emit(Triplet::Return(None))?;
        }
        self.depth -= 1;
        self.emit(Triplet::Exit(name))
    }

    // void | type id ("," type id)*
    fn expand_arguments(&mut self) -> Result<(), Error> {
        debug!("expand_arguments first={:?}", self.first());
        if self.at(token::VOID) {
            self.consume()?;
            return Ok(());
        }
        while !self.at(token::CLOSE_PAREN) {
            self.expect_type()?;
            self.expect(token::IDENTIFIER)?;
            if self.at(token::COMMA) {
                self.consume()?;
            }
        }
        Ok(())
    }

    fn expand_compound_statement(&mut self) -> Result<(), Error> {
        debug!("expand_compound_statement first={:?}", self.first());
        self.expect(token::OPEN_BRACE)?;
        self.expand_local_declarations()?;
        self.expand_statement_list()?;
        self.expect(token::CLOSE_BRACE)?;
        Ok(())
    }

    fn expand_local_declarations(&mut self) -> Result<(), Error> {
        debug!("expand_local_declarations first={:?}", self.first());
        while self.first().is_some_and(Token::is_type) {
            self.consume()?;
            self.expect(token::IDENTIFIER)?;
            self.expect(token::SEMICOLON)?;
        }
        Ok(())
    }

    fn expand_statement_list(&mut self) -> Result<(), Error> {
        debug!("expand_statement_list first={:?}", self.first());
        while !self.at(token::CLOSE_BRACE) {
            self.expand_statement()?;
        }
        Ok(())
    }

    fn expand_statement(&mut self) -> Result<(), Error> {
        debug!("expand_statement first={:?}", self.first());
        if self.at(token::IF) {
            self.expand_selection_statement()
        } else if self.at(token::RETURN) {
            self.expand_return_statement()
        } else if self.at(token::WHILE) {
            self.expand_iteration_statement()
        } else if self.at(token::OPEN_BRACE) {
            self.expand_compound_statement()
        } else if self.at(token::SEMICOLON) {
            self.consume()?;
            Ok(())
        } else if (self.at(token::IDENTIFIER) || self.at(token::READ) || self.at(token::WRITE))
            && self.nth_is(1, token::OPEN_PAREN)
        {
            self.expand_call()
        } else {
            self.expand_expression_statement()
        }
    }

    fn expand_selection_statement(&mut self) -> Result<(), Error> {
        debug!("expand_selection_statement first={:?}", self.first());
        self.expect(token::IF)?;
        self.expect(token::OPEN_PAREN)?;
        let cond = self.expand_expression(None)?;
        self.expect(token::CLOSE_PAREN)?;

        let else_label = self.names.new_label();
        self.emit(Triplet::IfFalse {
            cond,
            target: else_label,
        })?;

        self.depth += 1;
        self.expand_statement()?;
        let end_label = if self.at(token::ELSE) {
            self.consume()?;
            Some(self.names.new_label())
        } else {
            None
        };

        if let Some(end) = end_label {
            self.emit_outer(Triplet::Goto(end))?;
        }
        self.emit_outer(Triplet::Label(else_label))?;
        if let Some(end) = end_label {
            self.expand_statement()?;
            self.emit_outer(Triplet::Label(end))?;
        }
        self.depth -= 1;
        Ok(())
    }

    fn expand_iteration_statement(&mut self) -> Result<(), Error> {
        debug!("expand_iteration_statement first={:?}", self.first());
        self.expect(token::WHILE)?;
        self.expect(token::OPEN_PAREN)?;

        let mark = self.consumed.len();
        let cond = self.expand_expression(None)?;
        let condition = self.consumed[mark..].to_vec();
        self.expect(token::CLOSE_PAREN)?;

        let exit = self.names.new_label();
        let reenter = self.names.new_label();
        self.emit(Triplet::Label(reenter))?;
        self.emit(Triplet::IfFalse {
            cond: cond.clone(),
            target: exit,
        })?;

        self.depth += 1;
        self.expand_statement()?;
        self.replay(condition, cond.as_temp())?;
        self.depth -= 1;

        self.emit(Triplet::Goto(reenter))?;
        self.emit(Triplet::Label(exit))
    }

    fn expand_return_statement(&mut self) -> Result<(), Error> {
        debug!("expand_return_statement first={:?}", self.first());
        self.expect(token::RETURN)?;
        let value = if self.at(token::SEMICOLON) {
            None
        } else {
            Some(self.expand_expression(None)?)
        };
        self.expect(token::SEMICOLON)?;
        self.emit(Triplet::Return(value))
    }

    fn expand_expression_statement(&mut self) -> Result<(), Error> {
        debug!("expand_expression_statement first={:?}", self.first());
        self.expand_expression(None)?;
        self.expect(token::SEMICOLON)?;
        Ok(())
    }

    /// A call in statement position. `write` prints its argument instead of calling.
    fn expand_call(&mut self) -> Result<(), Error> {
        debug!("expand_call first={:?}", self.first());
        let func = self.consume()?;
        self.expect(token::OPEN_PAREN)?;

        if func.matches(token::WRITE) {
            let value = self.expand_expression(None)?;
            self.expect(token::CLOSE_PAREN)?;
            self.emit(Triplet::Write(value))?;
        } else {
            self.invoke(func.into_text())?;
        }
        self.expect(token::SEMICOLON)?;
        Ok(())
    }

    /// `id = read`, `id = expr`, or a plain operator/operand run.
    fn expand_expression(&mut self, force: Option<Temp>) -> Result<Operand, Error> {
        debug!("expand_expression first={:?}", self.first());
        if !(self.at(token::IDENTIFIER) && self.nth_is(1, token::ASSIGN)) {
            return self.expand_simple_expression(force);
        }

        let var = self.consume()?.into_text();
        self.consume()?;
        if self.at(token::READ) {
            self.consume()?;
            if self.at(token::OPEN_PAREN) && self.nth_is(1, token::CLOSE_PAREN) {
                self.consume()?;
                self.consume()?;
            }
            self.emit(Triplet::Read(var.clone()))?;
        } else {
            let src = self.expand_expression(None)?;
            self.emit(Triplet::Copy {
                dest: Operand::Var(var.clone()),
                src,
            })?;
        }
        Ok(Operand::Var(var))
    }
}
