use std::fmt::Display;
use std::io::Write;

use crate::token::Token;
use crate::Error;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Temp(u32);

impl Display for Temp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t{}", self.0)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Label(u32);

impl Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Mints temps and labels. One per generator run.
#[derive(Debug)]
pub struct Names {
    next_temp: u32,
    next_label: u32,
}

impl Default for Names {
    fn default() -> Self {
        Self {
            next_temp: 1,
            next_label: 1,
        }
    }
}

impl Names {
    pub fn new_temp(&mut self) -> Temp {
        let ret = self.next_temp;
        self.next_temp += 1;
        Temp(ret)
    }

    pub fn new_label(&mut self) -> Label {
        let ret = self.next_label;
        self.next_label += 1;
        Label(ret)
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Operand {
    Temp(Temp),
    Var(String),
    Const(String),
}

impl Operand {
    pub fn as_temp(&self) -> Option<Temp> {
        match self {
            Self::Temp(temp) => Some(*temp),
            Self::Var(_) | Self::Const(_) => None,
        }
    }
}

impl TryFrom<Token> for Operand {
    type Error = Error;

    fn try_from(token: Token) -> Result<Self, Error> {
        if token.is_identifier() {
            Ok(Self::Var(token.into_text()))
        } else if token.is_number() {
            Ok(Self::Const(token.into_text()))
        } else {
            Err(Error::UnexpectedToken {
                expected: "an operand".to_string(),
                found: token,
            })
        }
    }
}

impl Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Temp(t) => write!(f, "{t}"),
            Self::Var(s) | Self::Const(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BinOp {
    Gt,
    Lt,
    Eq,
    Add,
    Sub,
    Mul,
    Div,
}

impl BinOp {
    pub fn from_token(token: &Token) -> Option<Self> {
        if !(token.is_any_relop() || token.is_any_addop() || token.is_any_mulop()) {
            return None;
        }
        Some(match token.text() {
            ">" => Self::Gt,
            "<" => Self::Lt,
            "==" => Self::Eq,
            "+" => Self::Add,
            "-" => Self::Sub,
            "*" => Self::Mul,
            "/" => Self::Div,
            _ => return None,
        })
    }

    /// Higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            Self::Gt | Self::Lt | Self::Eq => 0,
            Self::Add | Self::Sub => 1,
            Self::Mul | Self::Div => 2,
        }
    }
}

impl Display for BinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Gt => ">",
                Self::Lt => "<",
                Self::Eq => "==",
                Self::Add => "+",
                Self::Sub => "-",
                Self::Mul => "*",
                Self::Div => "/",
            }
        )
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Triplet {
    Entry(String),
    Exit(String),
    Label(Label),
    Goto(Label),
    IfFalse {
        cond: Operand,
        target: Label,
    },
    Copy {
        dest: Operand,
        src: Operand,
    },
    Binary {
        dest: Temp,
        lhs: Operand,
        op: BinOp,
        rhs: Operand,
    },
    Call {
        dest: Temp,
        func: String,
        argc: usize,
    },
    Param(Operand),
    BeginArgs,
    Read(String),
    Write(Operand),
    Return(Option<Operand>),
}

impl Triplet {
    pub const FIELDS: usize = 5;

    /// Number of meaningful fields when printed.
    pub fn arity(&self) -> usize {
        match self {
            Self::BeginArgs | Self::Return(None) => 1,
            Self::Entry(_)
            | Self::Exit(_)
            | Self::Label(_)
            | Self::Goto(_)
            | Self::Param(_)
            | Self::Read(_)
            | Self::Write(_)
            | Self::Return(Some(_)) => 2,
            Self::Copy { .. } => 3,
            Self::IfFalse { .. } => 4,
            Self::Binary { .. } | Self::Call { .. } => 5,
        }
    }
}

impl Display for Triplet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Entry(func) => write!(f, "entry {func}"),
            Self::Exit(func) => write!(f, "exit {func}"),
            Self::Label(l) => write!(f, "Label {l}"),
            Self::Goto(l) => write!(f, "goto {l}"),
            Self::IfFalse { cond, target } => write!(f, "if_false {cond} goto {target}"),
            Self::Copy { dest, src } => write!(f, "{dest} = {src}"),
            Self::Binary { dest, lhs, op, rhs } => write!(f, "{dest} = {lhs} {op} {rhs}"),
            Self::Call { dest, func, argc } => write!(f, "{dest} = call {func} {argc}"),
            Self::Param(v) => write!(f, "param {v}"),
            Self::BeginArgs => write!(f, "begin_args"),
            Self::Read(var) => write!(f, "read {var}"),
            Self::Write(v) => write!(f, "write {v}"),
            Self::Return(Some(v)) => write!(f, "return {v}"),
            Self::Return(None) => write!(f, "return"),
        }
    }
}

/// A triplet at its nesting depth.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Line {
    pub depth: usize,
    pub triplet: Triplet,
}

impl Display for Line {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:width$}{}", "", self.triplet, width = 4 * self.depth)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Layout {
    #[default]
    Trimmed,
    /// Every line carries five fields; unused ones print as empty, leaving trailing blanks.
    Padded,
}

impl Layout {
    pub fn render(self, line: &Line) -> String {
        match self {
            Self::Trimmed => line.to_string(),
            Self::Padded => {
                let blanks = Triplet::FIELDS.saturating_sub(line.triplet.arity());
                format!("{line}{:blanks$}", "")
            }
        }
    }
}

/// Receives each line as soon as the generator produces it.
pub trait Sink {
    /// # Errors
    /// If the line cannot be delivered.
    fn emit(&mut self, line: Line) -> Result<(), Error>;
}

pub type LineBuf = Vec<Line>;

impl Sink for LineBuf {
    fn emit(&mut self, line: Line) -> Result<(), Error> {
        self.push(line);
        Ok(())
    }
}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn emit(&mut self, line: Line) -> Result<(), Error> {
        (**self).emit(line)
    }
}

pub struct Printer<W> {
    out: W,
    layout: Layout,
}

impl<W: Write> Printer<W> {
    pub fn new(out: W, layout: Layout) -> Self {
        Self { out, layout }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Sink for Printer<W> {
    fn emit(&mut self, line: Line) -> Result<(), Error> {
        writeln!(self.out, "{}", self.layout.render(&line))?;
        Ok(())
    }
}
