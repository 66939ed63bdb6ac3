//! Recursive-descent parser for the IPL. The language's reference grammar
//! leaves binary operators ambiguous; here they bind with conventional
//! precedence (see DESIGN.md) and `^` associates to the right.

use crate::ast::{
    BinOp, Construct, ControlFlow, ElifArm, Expr, FuncCall, FuncDefn, Instruction, Literal, OfArm,
    TypeExpr, Unit, VarBind, VarDefn,
};
use crate::errors::ParseError;
use crate::lexer::{Kw, Token, TokenKind, tokenize};

pub fn parse_unit(src: &str) -> Result<Unit, ParseError> {
    let tokens = tokenize(src)?;
    Parser { tokens, pos: 0 }.unit()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn kind(&self) -> TokenKind {
        self.tokens[self.pos].kind
    }

    fn next_kind(&self) -> TokenKind {
        self.tokens
            .get(self.pos + 1)
            .map_or(TokenKind::Eof, |t| t.kind)
    }

    fn bump(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, ParseError> {
        if self.at(kind) {
            Ok(self.bump())
        } else {
            Err(self.error_here(format!("expected {what}")))
        }
    }

    fn error_here(&self, message: impl Into<String>) -> ParseError {
        let tok = self.peek();
        let mut message = message.into();
        if tok.kind == TokenKind::Eof {
            message.push_str(", found end of input");
        } else {
            message.push_str(&format!(", found '{}'", tok.text));
        }
        ParseError::new(tok.line, message)
    }

    // ---------------------------------------------------------------------
    //  Top level
    // ---------------------------------------------------------------------

    fn unit(&mut self) -> Result<Unit, ParseError> {
        let mut constructs = Vec::new();
        while !self.at(TokenKind::Eof) {
            match self.kind() {
                TokenKind::Keyword(Kw::Fn) => constructs.push(Construct::Func(self.func_defn()?)),
                TokenKind::Keyword(Kw::Let) => constructs.push(Construct::Var(self.var_defn()?)),
                _ => return Err(self.error_here("expected 'fn' or 'let'")),
            }
        }
        Ok(Unit { constructs })
    }

    fn func_defn(&mut self) -> Result<FuncDefn, ParseError> {
        self.expect(TokenKind::Keyword(Kw::Fn), "'fn'")?;
        let name = self.expect(TokenKind::Ident, "function name")?.text;
        self.expect(TokenKind::LParen, "'('")?;
        let mut params = Vec::new();
        if !self.at(TokenKind::RParen) {
            loop {
                params.push(self.var_bind()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "')'")?;
        let ret = if self.eat(TokenKind::Arrow) {
            Some(self.type_expr()?)
        } else {
            None
        };
        let body = self.block()?;
        Ok(FuncDefn {
            name,
            params,
            ret,
            body,
        })
    }

    fn var_bind(&mut self) -> Result<VarBind, ParseError> {
        let name = self.expect(TokenKind::Ident, "identifier")?.text;
        self.expect(TokenKind::Colon, "':'")?;
        let ty = self.type_expr()?;
        Ok(VarBind { name, ty })
    }

    fn var_defn(&mut self) -> Result<VarDefn, ParseError> {
        self.expect(TokenKind::Keyword(Kw::Let), "'let'")?;
        let bind = self.var_bind()?;
        self.expect(TokenKind::Assign, "'='")?;
        let init = self.expression()?;
        self.expect(TokenKind::Semi, "';'")?;
        Ok(VarDefn { bind, init })
    }

    fn type_expr(&mut self) -> Result<TypeExpr, ParseError> {
        match self.kind() {
            TokenKind::Keyword(Kw::Int) => {
                self.bump();
                Ok(TypeExpr::Int)
            }
            TokenKind::Keyword(Kw::Bool) => {
                self.bump();
                Ok(TypeExpr::Bool)
            }
            TokenKind::Keyword(Kw::String) => {
                self.bump();
                Ok(TypeExpr::String)
            }
            TokenKind::Keyword(Kw::Float) => {
                self.bump();
                Ok(TypeExpr::Float)
            }
            TokenKind::Keyword(Kw::Tuple) => {
                self.bump();
                self.expect(TokenKind::Lt, "'<'")?;
                let first = self.type_expr()?;
                if !self.at(TokenKind::Comma) {
                    return Err(self.error_here("tuple type requires at least two element types"));
                }
                let mut items = vec![first];
                while self.eat(TokenKind::Comma) {
                    items.push(self.type_expr()?);
                }
                self.expect(TokenKind::Gt, "'>'")?;
                Ok(TypeExpr::Tuple(items))
            }
            TokenKind::Keyword(Kw::Array) => {
                self.bump();
                self.expect(TokenKind::Lt, "'<'")?;
                let elem = self.type_expr()?;
                self.expect(TokenKind::Comma, "','")?;
                if self.at(TokenKind::Minus) {
                    return Err(self.error_here("array size must be non-negative"));
                }
                let size_tok = self.expect(TokenKind::IntLit, "array size")?;
                let size = size_tok
                    .text
                    .parse::<usize>()
                    .map_err(|_| ParseError::new(size_tok.line, "array size out of range"))?;
                self.expect(TokenKind::Gt, "'>'")?;
                Ok(TypeExpr::Array(Box::new(elem), size))
            }
            TokenKind::Keyword(Kw::List) => {
                self.bump();
                self.expect(TokenKind::Lt, "'<'")?;
                let elem = self.type_expr()?;
                self.expect(TokenKind::Gt, "'>'")?;
                Ok(TypeExpr::List(Box::new(elem)))
            }
            _ => Err(self.error_here("expected type")),
        }
    }

    // ---------------------------------------------------------------------
    //  Instructions
    // ---------------------------------------------------------------------

    fn block(&mut self) -> Result<Vec<Instruction>, ParseError> {
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut body = Vec::new();
        while !self.at(TokenKind::RBrace) {
            if self.at(TokenKind::Eof) {
                return Err(self.error_here("expected '}'"));
            }
            body.push(self.instruction()?);
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(body)
    }

    fn instruction(&mut self) -> Result<Instruction, ParseError> {
        match self.kind() {
            TokenKind::Keyword(Kw::Let) => Ok(Instruction::VarDefn(self.var_defn()?)),
            TokenKind::Keyword(Kw::Return) => {
                self.bump();
                if self.eat(TokenKind::Semi) {
                    return Ok(Instruction::Return(None));
                }
                let expr = self.expression()?;
                self.expect(TokenKind::Semi, "';'")?;
                Ok(Instruction::Return(Some(expr)))
            }
            TokenKind::Keyword(Kw::Write) => {
                self.bump();
                self.expect(TokenKind::LParen, "'('")?;
                let mut args = vec![self.expression()?];
                while self.eat(TokenKind::Comma) {
                    args.push(self.expression()?);
                }
                self.expect(TokenKind::RParen, "')'")?;
                self.expect(TokenKind::Semi, "';'")?;
                Ok(Instruction::Write(args))
            }
            TokenKind::Keyword(
                Kw::If | Kw::Unless | Kw::Case | Kw::While | Kw::Do | Kw::For,
            ) => Ok(Instruction::Flow(self.control_flow()?)),
            TokenKind::Ident => match self.next_kind() {
                TokenKind::LParen => {
                    let call = self.func_call()?;
                    self.expect(TokenKind::Semi, "';'")?;
                    Ok(Instruction::Call(call))
                }
                TokenKind::LBracket => {
                    let name = self.bump().text;
                    self.bump(); // '['
                    let index = self.expression()?;
                    self.expect(TokenKind::RBracket, "']'")?;
                    self.expect(TokenKind::Assign, "'='")?;
                    let value = self.expression()?;
                    self.expect(TokenKind::Semi, "';'")?;
                    Ok(Instruction::Assign {
                        name,
                        index: Some(index),
                        value,
                    })
                }
                TokenKind::Assign => {
                    let name = self.bump().text;
                    self.bump(); // '='
                    let value = self.expression()?;
                    self.expect(TokenKind::Semi, "';'")?;
                    Ok(Instruction::Assign {
                        name,
                        index: None,
                        value,
                    })
                }
                _ => Err(self.error_here("expected assignment or call")),
            },
            _ => Err(self.error_here("expected instruction")),
        }
    }

    fn control_flow(&mut self) -> Result<ControlFlow, ParseError> {
        match self.kind() {
            TokenKind::Keyword(Kw::If) => {
                self.bump();
                let cond = self.paren_expr()?;
                let body = self.block()?;
                let mut elifs = Vec::new();
                while self.at(TokenKind::Keyword(Kw::Elif)) {
                    self.bump();
                    let cond = self.paren_expr()?;
                    let body = self.block()?;
                    elifs.push(ElifArm { cond, body });
                }
                let else_body = if self.eat(TokenKind::Keyword(Kw::Else)) {
                    Some(self.block()?)
                } else {
                    None
                };
                Ok(ControlFlow::If {
                    cond,
                    body,
                    elifs,
                    else_body,
                })
            }
            TokenKind::Keyword(Kw::Unless) => {
                self.bump();
                let cond = self.paren_expr()?;
                let body = self.block()?;
                Ok(ControlFlow::Unless { cond, body })
            }
            TokenKind::Keyword(Kw::Case) => {
                self.bump();
                let scrutinee = self.paren_expr()?;
                self.expect(TokenKind::LBrace, "'{'")?;
                let mut arms = Vec::new();
                while self.at(TokenKind::Keyword(Kw::Of)) {
                    self.bump();
                    self.expect(TokenKind::LParen, "'('")?;
                    let label = self.case_label()?;
                    self.expect(TokenKind::RParen, "')'")?;
                    let body = self.block()?;
                    arms.push(OfArm { label, body });
                }
                self.expect(TokenKind::Keyword(Kw::Default), "'of' or 'default'")?;
                let default = self.block()?;
                self.expect(TokenKind::RBrace, "'}'")?;
                Ok(ControlFlow::Case {
                    scrutinee,
                    arms,
                    default,
                })
            }
            TokenKind::Keyword(Kw::While) => {
                self.bump();
                let cond = self.paren_expr()?;
                let body = self.block()?;
                Ok(ControlFlow::While { cond, body })
            }
            TokenKind::Keyword(Kw::Do) => {
                self.bump();
                let body = self.block()?;
                self.expect(TokenKind::Keyword(Kw::While), "'while'")?;
                let cond = self.paren_expr()?;
                self.expect(TokenKind::Semi, "';'")?;
                Ok(ControlFlow::DoWhile { body, cond })
            }
            TokenKind::Keyword(Kw::For) => {
                self.bump();
                self.expect(TokenKind::LParen, "'('")?;
                let var = self.expect(TokenKind::Ident, "loop variable")?.text;
                self.expect(TokenKind::Keyword(Kw::In), "'in'")?;
                let iterable = self.expression()?;
                self.expect(TokenKind::RParen, "')'")?;
                let body = self.block()?;
                Ok(ControlFlow::For {
                    var,
                    iterable,
                    body,
                })
            }
            _ => Err(self.error_here("expected control flow")),
        }
    }

    fn case_label(&mut self) -> Result<Literal, ParseError> {
        match self.kind() {
            TokenKind::IntLit => Ok(Literal::Int(self.bump().text)),
            TokenKind::Minus => {
                self.bump();
                let tok = self.expect(TokenKind::IntLit, "integer literal")?;
                Ok(Literal::Int(format!("-{}", tok.text)))
            }
            TokenKind::StrLit => Ok(Literal::Str(self.bump().text)),
            _ => Err(self.error_here("expected integer or string literal")),
        }
    }

    fn paren_expr(&mut self) -> Result<Expr, ParseError> {
        self.expect(TokenKind::LParen, "'('")?;
        let expr = self.expression()?;
        self.expect(TokenKind::RParen, "')'")?;
        Ok(expr)
    }

    // ---------------------------------------------------------------------
    //  Expressions, loosest binding first
    // ---------------------------------------------------------------------

    fn expression(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.or_expr()?;
        let op = match self.kind() {
            TokenKind::Prepend => BinOp::Prepend,
            TokenKind::Append => BinOp::Append,
            _ => return Ok(lhs),
        };
        self.bump();
        let rhs = self.expression()?;
        Ok(Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    fn or_expr(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.and_expr()?;
        while self.eat(TokenKind::OrOr) {
            let rhs = self.and_expr()?;
            lhs = Expr::Binary {
                op: BinOp::Or,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.equality()?;
        while self.eat(TokenKind::AndAnd) {
            let rhs = self.equality()?;
            lhs = Expr::Binary {
                op: BinOp::And,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn equality(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.additive()?;
        loop {
            let op = match self.kind() {
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::NotEq => BinOp::Neq,
                _ => return Ok(lhs),
            };
            self.bump();
            let rhs = self.additive()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn additive(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => return Ok(lhs),
            };
            self.bump();
            let rhs = self.term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn term(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.power()?;
        loop {
            let op = match self.kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => return Ok(lhs),
            };
            self.bump();
            let rhs = self.power()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn power(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.unary()?;
        if self.eat(TokenKind::Caret) {
            let rhs = self.power()?;
            return Ok(Expr::Binary {
                op: BinOp::Pow,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            });
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        match self.kind() {
            TokenKind::Bang => {
                self.bump();
                let inner = self.unary()?;
                Ok(Expr::Not(Box::new(inner)))
            }
            // A leading minus is only the sign of a numeric literal; the IPL
            // has no unary negation operator.
            TokenKind::Minus => {
                self.bump();
                match self.kind() {
                    TokenKind::IntLit => {
                        let tok = self.bump();
                        Ok(Expr::Literal(Literal::Int(format!("-{}", tok.text))))
                    }
                    TokenKind::FloatLit => {
                        let tok = self.bump();
                        Ok(Expr::Literal(Literal::Float(format!("-{}", tok.text))))
                    }
                    _ => Err(self.error_here("expected numeric literal after '-'")),
                }
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        match self.kind() {
            TokenKind::IntLit => Ok(Expr::Literal(Literal::Int(self.bump().text))),
            TokenKind::FloatLit => Ok(Expr::Literal(Literal::Float(self.bump().text))),
            TokenKind::StrLit => Ok(Expr::Literal(Literal::Str(self.bump().text))),
            TokenKind::Keyword(Kw::True | Kw::False) => {
                Ok(Expr::Literal(Literal::Bool(self.bump().text)))
            }
            TokenKind::LBracket => {
                self.bump();
                let mut items = Vec::new();
                if !self.at(TokenKind::RBracket) {
                    loop {
                        items.push(self.expression()?);
                        if !self.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RBracket, "']'")?;
                Ok(Expr::Literal(Literal::List(items)))
            }
            TokenKind::LBrace => {
                self.bump();
                if self.at(TokenKind::RBrace) {
                    return Err(self.error_here("array literal requires at least one element"));
                }
                let mut items = vec![self.expression()?];
                while self.eat(TokenKind::Comma) {
                    items.push(self.expression()?);
                }
                self.expect(TokenKind::RBrace, "'}'")?;
                Ok(Expr::Literal(Literal::Array(items)))
            }
            TokenKind::Pipe => {
                self.bump();
                let first = self.expression()?;
                if !self.at(TokenKind::Comma) {
                    return Err(self.error_here("tuple literal requires at least two elements"));
                }
                let mut items = vec![first];
                while self.eat(TokenKind::Comma) {
                    items.push(self.expression()?);
                }
                self.expect(TokenKind::Pipe, "'|'")?;
                Ok(Expr::Literal(Literal::Tuple(items)))
            }
            TokenKind::Keyword(Kw::Read) => {
                self.bump();
                self.expect(TokenKind::LParen, "'('")?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(Expr::Read)
            }
            TokenKind::Keyword(Kw::Head) => {
                self.bump();
                let inner = self.paren_expr()?;
                Ok(Expr::Head(Box::new(inner)))
            }
            TokenKind::Keyword(Kw::Tail) => {
                self.bump();
                let inner = self.paren_expr()?;
                Ok(Expr::Tail(Box::new(inner)))
            }
            TokenKind::LParen => {
                self.bump();
                let inner = self.expression()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(Expr::Paren(Box::new(inner)))
            }
            TokenKind::Ident => match self.next_kind() {
                TokenKind::LParen => Ok(Expr::Call(self.func_call()?)),
                TokenKind::LBracket => {
                    let name = self.bump().text;
                    self.bump(); // '['
                    let index = self.expression()?;
                    self.expect(TokenKind::RBracket, "']'")?;
                    Ok(Expr::Deref {
                        name,
                        index: Some(Box::new(index)),
                    })
                }
                _ => Ok(Expr::Deref {
                    name: self.bump().text,
                    index: None,
                }),
            },
            _ => Err(self.error_here("expected expression")),
        }
    }

    fn func_call(&mut self) -> Result<FuncCall, ParseError> {
        let name = self.expect(TokenKind::Ident, "function name")?.text;
        self.expect(TokenKind::LParen, "'('")?;
        let mut args = Vec::new();
        if !self.at(TokenKind::RParen) {
            loop {
                args.push(self.expression()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "')'")?;
        Ok(FuncCall { name, args })
    }
}

// -------------------------------------------------------------------------

#[cfg(test)]
fn parse_ok(src: &str) -> Unit {
    parse_unit(src).expect("source should parse")
}

#[test]
fn parses_a_function_with_control_flow() {
    let unit = parse_ok(
        r#"
        let y: bool = true;
        fn foo(var: int, baz: string) -> list<int> {
            let x: float = 3.0;
            unless(x == 4.0){
                return 3 $: [1];
            }
            while(true){ write("loop"); }
            for(a in {1,2,3}){ a = a + 1; }
            return [];
        }
        "#,
    );
    assert_eq!(unit.constructs.len(), 2);
    let Construct::Func(f) = &unit.constructs[1] else {
        panic!("expected function");
    };
    assert_eq!(f.name, "foo");
    assert_eq!(f.params.len(), 2);
    assert_eq!(f.ret, Some(TypeExpr::List(Box::new(TypeExpr::Int))));
    assert_eq!(f.body.len(), 5);
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    let unit = parse_ok("let x: int = 1 + 2 * 3;");
    let Construct::Var(v) = &unit.constructs[0] else {
        panic!("expected variable");
    };
    let Expr::Binary { op: BinOp::Add, rhs, .. } = &v.init else {
        panic!("expected '+' at the top: {:?}", v.init);
    };
    assert!(matches!(**rhs, Expr::Binary { op: BinOp::Mul, .. }));
}

#[test]
fn list_operators_bind_loosest() {
    let unit = parse_ok("let l: list<int> = 1 + 2 ^: [3];");
    let Construct::Var(v) = &unit.constructs[0] else {
        panic!("expected variable");
    };
    let Expr::Binary { op: BinOp::Prepend, lhs, .. } = &v.init else {
        panic!("expected '^:' at the top: {:?}", v.init);
    };
    assert!(matches!(**lhs, Expr::Binary { op: BinOp::Add, .. }));
}

#[test]
fn tuple_literal_requires_two_elements() {
    assert!(parse_unit("let t: tuple<int,string> = |1,\"a\"|;").is_ok());
    let err = parse_unit("let t: tuple<int,string> = |1|;").unwrap_err();
    assert!(err.message.contains("at least two"));
}

#[test]
fn tuple_type_requires_two_elements() {
    let err = parse_unit("let t: tuple<int> = |1,2|;").unwrap_err();
    assert!(err.message.contains("at least two"));
}

#[test]
fn empty_array_literal_is_rejected() {
    let err = parse_unit("fn f(){ let a: array<int, 0> = {}; }").unwrap_err();
    assert!(err.message.contains("at least one element"));
}

#[test]
fn case_requires_a_default_arm() {
    let ok = r#"fn f(){ case(1){ of(1){ } default { } } }"#;
    assert!(parse_unit(ok).is_ok());
    let missing = r#"fn f(){ case(1){ of(1){ } } }"#;
    assert!(parse_unit(missing).is_err());
}

#[test]
fn do_while_parses_with_trailing_condition() {
    let unit = parse_ok("fn f(){ do { write(1); } while(true); }");
    let Construct::Func(f) = &unit.constructs[0] else {
        panic!("expected function");
    };
    assert!(matches!(
        f.body[0],
        Instruction::Flow(ControlFlow::DoWhile { .. })
    ));
}

#[test]
fn negative_literals_only_attach_to_numbers() {
    assert!(parse_unit("let x: int = -4;").is_ok());
    assert!(parse_unit("let x: int = -y;").is_err());
}

#[test]
fn write_requires_an_argument() {
    assert!(parse_unit("fn f(){ write(); }").is_err());
}
