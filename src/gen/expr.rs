use log::debug;

use super::CodeGen;
use crate::ir::{BinOp, Operand, Sink, Temp, Triplet};
use crate::token::{self, Token, TokenKind};
use crate::Error;

/// An entry on the operator stack.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Stacked {
    Op(BinOp),
    Open,
}

impl Stacked {
    fn precedence(self) -> u8 {
        match self {
            Self::Op(op) => op.precedence(),
            Self::Open => 3,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
enum Item {
    Operand(Operand),
    Operator(BinOp),
}

impl Item {
    fn is_operator(&self) -> bool {
        matches!(self, Self::Operator(_))
    }

    fn into_operand(self) -> Result<Operand, Error> {
        match self {
            Self::Operand(v) => Ok(v),
            Self::Operator(_) => Err(Error::MalformedExpression),
        }
    }
}

/// Infix to postfix conversion.
#[derive(Default, Debug)]
struct Shunt {
    postfix: Vec<Item>,
    operators: Vec<Stacked>,
}

impl Shunt {
    fn operand(&mut self, v: Operand) {
        self.postfix.push(Item::Operand(v));
    }

    fn pop_to_output(&mut self) {
        if let Some(Stacked::Op(op)) = self.operators.pop() {
            self.postfix.push(Item::Operator(op));
        }
    }

    fn push(&mut self, entry: Stacked) {
        let rank = entry.precedence();
        match self.operators.last().copied() {
            None => {}
            Some(top) if rank > top.precedence() => {}
            Some(top) if rank == top.precedence() => {
                if entry != Stacked::Open {
                    self.pop_to_output();
                }
            }
            Some(_) => {
                while let Some(&top) = self.operators.last() {
                    if top == Stacked::Open || rank >= top.precedence() {
                        break;
                    }
                    self.pop_to_output();
                }
                if let Some(&top) = self.operators.last() {
                    if top != Stacked::Open && rank == top.precedence() {
                        self.pop_to_output();
                    }
                }
            }
        }
        self.operators.push(entry);
    }

    fn close(&mut self) {
        while let Some(entry) = self.operators.pop() {
            match entry {
                Stacked::Open => break,
                Stacked::Op(op) => self.postfix.push(Item::Operator(op)),
            }
        }
    }

    fn finish(mut self) -> Vec<Item> {
        while !self.operators.is_empty() {
            self.pop_to_output();
        }
        self.postfix
    }
}

impl<S: Sink> CodeGen<S> {
    /// Translate an operator/operand run into triplets and return the value holding its result.
    ///
    /// Stops before an unbalanced `)`, a `,` or a `;`. With `force`, the final reduction (or the
    /// copy of a bare operand) writes into that temp instead of a fresh one.
    pub(super) fn expand_simple_expression(
        &mut self,
        force: Option<Temp>,
    ) -> Result<Operand, Error> {
        debug!("expand_simple_expression first={:?}", self.first());
        let postfix = self.shunt()?;
        self.reduce(postfix, force)
    }

    fn shunt(&mut self) -> Result<Vec<Item>, Error> {
        let mut shunt = Shunt::default();
        let mut open_parens = 0usize;

        loop {
            let next = self.first().ok_or(Error::UnexpectedEof)?;
            if (next.matches(token::CLOSE_PAREN) && open_parens == 0)
                || next.matches(token::COMMA)
                || next.matches(token::SEMICOLON)
            {
                break;
            }

            if next.is_identifier() && self.nth_is(1, token::OPEN_PAREN) {
                let result = self.expand_expr_call()?;
                shunt.operand(Operand::Temp(result));
                continue;
            }

            let tok = self.consume()?;
            if tok.matches(token::OPEN_PAREN) {
                open_parens += 1;
                shunt.push(Stacked::Open);
            } else if tok.matches(token::CLOSE_PAREN) {
                open_parens -= 1;
                shunt.close();
            } else if let Some(op) = BinOp::from_token(&tok) {
                shunt.push(Stacked::Op(op));
            } else {
                shunt.operand(Operand::try_from(tok)?);
            }
        }

        Ok(shunt.finish())
    }

    fn reduce(&mut self, mut postfix: Vec<Item>, force: Option<Temp>) -> Result<Operand, Error> {
        if let [Item::Operand(src)] = postfix.as_slice() {
            let dest = force.unwrap_or_else(|| self.names.new_temp());
            self.emit(Triplet::Copy {
                dest: Operand::Temp(dest),
                src: src.clone(),
            })?;
            return Ok(Operand::Temp(dest));
        }

        while let Some(at) = postfix.iter().position(Item::is_operator) {
            if at < 2 {
                return Err(Error::MalformedExpression);
            }
            let dest = match force {
                Some(temp) if postfix.len() == 3 => temp,
                _ => self.names.new_temp(),
            };

            let Item::Operator(op) = postfix.remove(at) else {
                return Err(Error::MalformedExpression);
            };
            let rhs = postfix.remove(at - 1).into_operand()?;
            let lhs = postfix.remove(at - 2).into_operand()?;
            self.emit(Triplet::Binary { dest, lhs, op, rhs })?;
            postfix.insert(at - 2, Item::Operand(Operand::Temp(dest)));
        }

        match <[Item; 1]>::try_from(postfix) {
            Ok([item]) => item.into_operand(),
            Err(_) => Err(Error::MalformedExpression),
        }
    }

    /// A call used as an operand. Returns the temp holding its result.
    pub(super) fn expand_expr_call(&mut self) -> Result<Temp, Error> {
        debug!("expand_expr_call first={:?}", self.first());
        let func = self.consume()?.into_text();
        self.expect(token::OPEN_PAREN)?;
        self.invoke(func)
    }

    /// Emit the argument list and the call itself. The opening `(` is already consumed.
    pub(super) fn invoke(&mut self, func: String) -> Result<Temp, Error> {
        self.emit(Triplet::BeginArgs)?;
        let argc = self.expand_args()?;
        let dest = self.names.new_temp();
        self.emit(Triplet::Call { dest, func, argc })?;
        self.expect(token::CLOSE_PAREN)?;
        Ok(dest)
    }

    fn expand_args(&mut self) -> Result<usize, Error> {
        debug!("expand_args first={:?}", self.first());
        let mut argc = 0;
        while !self.at(token::CLOSE_PAREN) {
            let value = self.expand_expression(None)?;
            self.emit(Triplet::Param(value))?;
            if self.at(token::COMMA) {
                self.consume()?;
            }
            argc += 1;
        }
        Ok(argc)
    }

    /// Replay an already translated expression, writing its result into `into`.
    pub(super) fn replay(&mut self, tokens: Vec<Token>, into: Option<Temp>) -> Result<(), Error> {
        debug!("replay {} tokens into {:?}", tokens.len(), into);
        self.tokens.push_front(Token::new(TokenKind::Delimiter, ")"));
        for tok in tokens.into_iter().rev() {
            self.tokens.push_front(tok);
        }
        self.expand_expression(into)?;
        self.expect(token::CLOSE_PAREN)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{LineBuf, Names};
    use crate::lex::LexicalAnalyzer;

    fn var(name: &str) -> Item {
        Item::Operand(Operand::Var(name.to_string()))
    }

    fn postfix_of(source: &str) -> Vec<Item> {
        let tokens = LexicalAnalyzer::default().parse(source).unwrap();
        let mut gen = CodeGen::new(tokens, LineBuf::new());
        gen.shunt().unwrap()
    }

    fn triplets(source: &str, force: Option<Temp>) -> (Operand, Vec<String>) {
        let tokens = LexicalAnalyzer::default().parse(source).unwrap();
        let mut out = LineBuf::new();
        let mut gen = CodeGen::new(tokens, &mut out);
        let value = gen.expand_expression(force).unwrap();
        (value, out.iter().map(ToString::to_string).collect())
    }

    #[test]
    fn multiplication_binds_tighter() {
        assert_eq!(
            postfix_of("a + b * c;"),
            vec![
                var("a"),
                var("b"),
                var("c"),
                Item::Operator(BinOp::Mul),
                Item::Operator(BinOp::Add)
            ]
        );
        let (value, lines) = triplets("a + b * c;", None);
        assert_eq!(lines, ["t1 = b * c", "t2 = a + t1"]);
        assert_eq!(value.to_string(), "t2");
    }

    #[test]
    fn equal_precedence_is_left_associative() {
        let (_, lines) = triplets("a - b - c;", None);
        assert_eq!(lines, ["t1 = a - b", "t2 = t1 - c"]);
    }

    #[test]
    fn lower_precedence_flushes_the_stack() {
        let (_, lines) = triplets("a - b * c + d;", None);
        assert_eq!(lines, ["t1 = b * c", "t2 = a - t1", "t3 = t2 + d"]);
    }

    #[test]
    fn parentheses_group() {
        let (_, lines) = triplets("(a + b) * c;", None);
        assert_eq!(lines, ["t1 = a + b", "t2 = t1 * c"]);

        let (_, lines) = triplets("a * ((b - 1) / 2);", None);
        assert_eq!(lines, ["t1 = b - 1", "t2 = t1 / 2", "t3 = a * t2"]);
    }

    #[test]
    fn relational_operators_bind_loosest() {
        let (_, lines) = triplets("a + 1 == b * 2;", None);
        assert_eq!(lines, ["t1 = a + 1", "t2 = b * 2", "t3 = t1 == t2"]);
    }

    #[test]
    fn bare_operand_is_copied() {
        let (value, lines) = triplets("42;", None);
        assert_eq!(lines, ["t1 = 42"]);
        assert_eq!(value, Operand::Temp(Names::default().new_temp()));
    }

    #[test]
    fn forced_temp_for_one_operator() {
        let mut names = Names::default();
        let forced = names.new_temp();
        let _ = names.new_temp();
        let _ = names.new_temp();
        let forced_too = names.new_temp();
        assert_eq!(forced_too.to_string(), "t4");

        let (value, lines) = triplets("a + b;", Some(forced_too));
        assert_eq!(lines, ["t4 = a + b"]);
        assert_eq!(value, Operand::Temp(forced_too));

        let (_, lines) = triplets("a;", Some(forced));
        assert_eq!(lines, ["t1 = a"]);
    }

    #[test]
    fn forced_temp_takes_final_reduction_of_chain() {
        let mut names = Names::default();
        for _ in 0..8 {
            names.new_temp();
        }
        let forced = names.new_temp();
        let (value, lines) = triplets("a + b * c;", Some(forced));
        assert_eq!(lines, ["t1 = b * c", "t9 = a + t1"]);
        assert_eq!(value, Operand::Temp(forced));
    }

    #[test]
    fn stops_at_delimiters_without_consuming_them() {
        let tokens = LexicalAnalyzer::default().parse("a + b) , ;").unwrap();
        let mut gen = CodeGen::new(tokens, LineBuf::new());
        gen.expand_expression(None).unwrap();
        assert!(gen.at(token::CLOSE_PAREN));
    }

    #[test]
    fn calls_become_operands() {
        let (_, lines) = triplets("f(a, b + 1) * 2;", None);
        assert_eq!(
            lines,
            [
                "begin_args",
                "t1 = a",
                "param t1",
                "t2 = b + 1",
                "param t2",
                "t3 = call f 2",
                "t4 = t3 * 2"
            ]
        );
    }

    #[test]
    fn nested_calls() {
        let (_, lines) = triplets("f(g());", None);
        assert_eq!(
            lines,
            [
                "begin_args",
                "begin_args",
                "t1 = call g 0",
                "t2 = t1",
                "param t2",
                "t3 = call f 1",
                "t4 = t3"
            ]
        );
    }

    #[test]
    fn operand_after_operand_is_malformed() {
        let tokens = LexicalAnalyzer::default().parse("a b;").unwrap();
        let mut gen = CodeGen::new(tokens, LineBuf::new());
        assert!(matches!(
            gen.expand_expression(None),
            Err(Error::MalformedExpression)
        ));
    }

    #[test]
    fn empty_expression_is_malformed() {
        let tokens = LexicalAnalyzer::default().parse(";").unwrap();
        let mut gen = CodeGen::new(tokens, LineBuf::new());
        assert!(matches!(
            gen.expand_expression(None),
            Err(Error::MalformedExpression)
        ));
    }

    #[test]
    fn running_out_of_tokens() {
        let tokens = LexicalAnalyzer::default().parse("a +").unwrap();
        let mut gen = CodeGen::new(tokens, LineBuf::new());
        assert!(matches!(
            gen.expand_expression(None),
            Err(Error::UnexpectedEof)
        ));
    }
}
