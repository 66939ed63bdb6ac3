//! The parsed shape of an IPL compilation unit. Every node keeps the source
//! spelling of its literals so listings and graph labels can reproduce the
//! program text verbatim.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    pub constructs: Vec<Construct>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Construct {
    Func(FuncDefn),
    Var(VarDefn),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncDefn {
    pub name: String,
    pub params: Vec<VarBind>,
    pub ret: Option<TypeExpr>,
    pub body: Vec<Instruction>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarBind {
    pub name: String,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDefn {
    pub bind: VarBind,
    pub init: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    VarDefn(VarDefn),
    Return(Option<Expr>),
    Write(Vec<Expr>),
    Assign {
        name: String,
        index: Option<Expr>,
        value: Expr,
    },
    Call(FuncCall),
    Flow(ControlFlow),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncCall {
    pub name: String,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Prepend,
    Append,
    Eq,
    Neq,
    And,
    Or,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Pow => "^",
            BinOp::Prepend => "^:",
            BinOp::Append => "$:",
            BinOp::Eq => "==",
            BinOp::Neq => "!=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Not(Box<Expr>),
    Paren(Box<Expr>),
    Literal(Literal),
    Deref {
        name: String,
        index: Option<Box<Expr>>,
    },
    Call(FuncCall),
    Read,
    Head(Box<Expr>),
    Tail(Box<Expr>),
}

/// Numeric and string payloads are the raw lexemes, quotes and sign included.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(String),
    Float(String),
    Bool(String),
    Str(String),
    List(Vec<Expr>),
    Array(Vec<Expr>),
    Tuple(Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Int,
    Bool,
    String,
    Float,
    Tuple(Vec<TypeExpr>),
    Array(Box<TypeExpr>, usize),
    List(Box<TypeExpr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControlFlow {
    If {
        cond: Expr,
        body: Vec<Instruction>,
        elifs: Vec<ElifArm>,
        else_body: Option<Vec<Instruction>>,
    },
    Unless {
        cond: Expr,
        body: Vec<Instruction>,
    },
    Case {
        scrutinee: Expr,
        arms: Vec<OfArm>,
        default: Vec<Instruction>,
    },
    While {
        cond: Expr,
        body: Vec<Instruction>,
    },
    DoWhile {
        body: Vec<Instruction>,
        cond: Expr,
    },
    For {
        var: String,
        iterable: Expr,
        body: Vec<Instruction>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElifArm {
    pub cond: Expr,
    pub body: Vec<Instruction>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OfArm {
    pub label: Literal,
    pub body: Vec<Instruction>,
}

// -------------------------------------------------------------------------
//  Plain-source rendering, shared by the graph builders for node labels.
//  The analyzer re-derives the same spellings during its own walk so it can
//  interleave the type checks.
// -------------------------------------------------------------------------

fn comma_separated<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Binary { op, lhs, rhs } => write!(f, "{lhs} {} {rhs}", op.symbol()),
            Expr::Not(inner) => write!(f, "!{inner}"),
            Expr::Paren(inner) => write!(f, "({inner})"),
            Expr::Literal(lit) => write!(f, "{lit}"),
            Expr::Deref { name, index: None } => f.write_str(name),
            Expr::Deref {
                name,
                index: Some(idx),
            } => write!(f, "{name}[{idx}]"),
            Expr::Call(call) => write!(f, "{call}"),
            Expr::Read => f.write_str("read()"),
            Expr::Head(inner) => write!(f, "head({inner})"),
            Expr::Tail(inner) => write!(f, "tail({inner})"),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(s) | Literal::Float(s) | Literal::Bool(s) | Literal::Str(s) => {
                f.write_str(s)
            }
            Literal::List(items) => {
                f.write_str("[")?;
                comma_separated(f, items)?;
                f.write_str("]")
            }
            Literal::Array(items) => {
                f.write_str("{")?;
                comma_separated(f, items)?;
                f.write_str("}")
            }
            Literal::Tuple(items) => {
                f.write_str("|")?;
                comma_separated(f, items)?;
                f.write_str("|")
            }
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Int => f.write_str("int"),
            TypeExpr::Bool => f.write_str("bool"),
            TypeExpr::String => f.write_str("string"),
            TypeExpr::Float => f.write_str("float"),
            TypeExpr::Tuple(items) => {
                f.write_str("tuple<")?;
                comma_separated(f, items)?;
                f.write_str(">")
            }
            TypeExpr::Array(elem, size) => write!(f, "array<{elem}, {size}>"),
            TypeExpr::List(elem) => write!(f, "list<{elem}>"),
        }
    }
}

impl fmt::Display for VarBind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.ty)
    }
}

impl fmt::Display for FuncCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        comma_separated(f, &self.args)?;
        f.write_str(")")
    }
}

impl FuncDefn {
    /// Header text as it appears in graph signature nodes:
    /// `name(a: int, b: string) -> bool` or `name()` when void.
    pub fn signature(&self) -> String {
        let params = self
            .params
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        match &self.ret {
            Some(ret) => format!("{}({params}) -> {ret}", self.name),
            None => format!("{}({params})", self.name),
        }
    }
}

#[test]
fn expressions_render_back_to_source() {
    let e = Expr::Binary {
        op: BinOp::Add,
        lhs: Box::new(Expr::Literal(Literal::Int("1".into()))),
        rhs: Box::new(Expr::Paren(Box::new(Expr::Binary {
            op: BinOp::Mul,
            lhs: Box::new(Expr::Deref {
                name: "x".into(),
                index: None,
            },),
            rhs: Box::new(Expr::Literal(Literal::Float("2.5".into()))),
        }))),
    };
    assert_eq!(e.to_string(), "1 + (x * 2.5)");
}

#[test]
fn container_literals_render_with_their_delimiters() {
    let one = Expr::Literal(Literal::Int("1".into()));
    let two = Expr::Literal(Literal::Int("2".into()));
    assert_eq!(
        Literal::List(vec![one.clone(), two.clone()]).to_string(),
        "[1, 2]"
    );
    assert_eq!(
        Literal::Array(vec![one.clone(), two.clone()]).to_string(),
        "{1, 2}"
    );
    assert_eq!(Literal::Tuple(vec![one, two]).to_string(), "|1, 2|");
}

#[test]
fn signature_renders_return_type() {
    let f = FuncDefn {
        name: "foo".into(),
        params: vec![VarBind {
            name: "n".into(),
            ty: TypeExpr::Int,
        }],
        ret: Some(TypeExpr::List(Box::new(TypeExpr::Int))),
        body: vec![],
    };
    assert_eq!(f.signature(), "foo(n: int) -> list<int>");
}
