//! The semantic walk. Every expression visitor hands back the expression's
//! type together with its canonical spelling; instruction visitors emit one
//! listing line through the flush protocol. Scope and indentation travel
//! together: a scope is one indentation level.

use crate::ast::{
    BinOp, Construct, ControlFlow, Expr, FuncCall, FuncDefn, Instruction, Literal, TypeExpr, Unit,
    VarDefn,
};
use crate::listing::Listing;
use crate::scope::{FuncTable, ScopeStack};
use crate::types::Type;

pub struct Analyzer {
    vars: ScopeStack,
    funcs: FuncTable,
    current_fn: Option<String>,
    listing: Listing,
}

fn lower_type(ty: &TypeExpr) -> Type {
    match ty {
        TypeExpr::Int => Type::Int,
        TypeExpr::Bool => Type::Bool,
        TypeExpr::String => Type::String,
        TypeExpr::Float => Type::Float,
        TypeExpr::Tuple(items) => Type::Tuple(items.iter().map(lower_type).collect()),
        TypeExpr::Array(elem, size) => Type::Array(Box::new(lower_type(elem)), *size),
        TypeExpr::List(elem) => Type::List(Box::new(lower_type(elem))),
    }
}

impl Analyzer {
    pub fn new() -> Self {
        Self {
            vars: ScopeStack::new(),
            funcs: FuncTable::new(),
            current_fn: None,
            listing: Listing::new(),
        }
    }

    pub fn analyze(&mut self, unit: &Unit) {
        for construct in &unit.constructs {
            match construct {
                Construct::Func(f) => self.visit_func(f),
                Construct::Var(v) => self.visit_var_defn(v),
            }
        }
    }

    pub fn has_errors(&self) -> bool {
        self.listing.has_errors()
    }

    pub fn into_html(self) -> String {
        self.listing.finish()
    }

    fn enter_scope(&mut self) {
        self.vars.enter_scope();
        self.listing.indent();
    }

    fn leave_scope(&mut self) {
        self.vars.leave_scope();
        self.listing.dedent();
    }

    fn flush_line(&mut self, code: &str) {
        let line = format!("{}{}", self.listing.indent_str(), code);
        self.listing.flush(&line);
    }

    fn write_plain_line(&mut self, code: &str) {
        let line = format!("{}{}", self.listing.indent_str(), code);
        self.listing.write_line(&line);
    }

    // ---------------------------------------------------------------------
    //  Constructs
    // ---------------------------------------------------------------------

    fn visit_func(&mut self, f: &FuncDefn) {
        self.enter_scope();

        let mut param_types = Vec::new();
        let mut param_codes = Vec::new();
        for bind in &f.params {
            let ty = lower_type(&bind.ty);
            if self.vars.declare(&bind.name, ty.clone()).is_err() {
                self.listing.stage("Variable already defined");
            }
            param_codes.push(bind.to_string());
            param_types.push(ty);
        }

        let (ret_ty, ret_code) = match &f.ret {
            Some(t) => (lower_type(t), format!(" -> {t} ")),
            None => (Type::Void, String::new()),
        };

        // Registration happens before the body so self-recursion resolves;
        // a redefinition keeps the first signature and drops the return
        // checks for this body.
        match self.funcs.declare(&f.name, param_types, ret_ty) {
            Ok(()) => self.current_fn = Some(f.name.clone()),
            Err(_) => {
                self.listing.stage("Function already defined");
                self.current_fn = None;
            }
        }

        self.listing.flush(&format!(
            "fn {}({}){}{{",
            f.name,
            param_codes.join(", "),
            ret_code
        ));

        for inst in &f.body {
            self.visit_instruction(inst);
        }

        self.current_fn = None;
        self.listing.write_line("}");
        self.listing.blank_line();
        self.leave_scope();
    }

    // ---------------------------------------------------------------------
    //  Instructions
    // ---------------------------------------------------------------------

    fn visit_instruction(&mut self, inst: &Instruction) {
        match inst {
            Instruction::VarDefn(v) => self.visit_var_defn(v),
            Instruction::Return(expr) => self.visit_return(expr.as_ref()),
            Instruction::Write(args) => self.visit_write(args),
            Instruction::Assign { name, index, value } => {
                self.visit_assign(name, index.as_ref(), value)
            }
            Instruction::Call(call) => {
                let (_, code) = self.visit_call(call);
                self.flush_line(&format!("{code};"));
            }
            Instruction::Flow(flow) => self.visit_flow(flow),
        }
    }

    fn visit_var_defn(&mut self, v: &VarDefn) {
        // The initializer is evaluated first: an identifier is not visible
        // inside its own initializer.
        let var_ty = lower_type(&v.bind.ty);
        let (init_ty, init_code) = self.visit_expr(&v.init);
        if self.vars.declare(&v.bind.name, var_ty.clone()).is_err() {
            self.listing.stage("Variable already defined");
        }
        if init_ty != var_ty {
            self.listing.stage("Mismatched types");
        }
        self.flush_line(&format!("let {} = {};", v.bind, init_code));
    }

    fn visit_return(&mut self, expr: Option<&Expr>) {
        match expr {
            Some(e) => {
                let (ty, code) = self.visit_expr(e);
                if let Some(name) = &self.current_fn {
                    if let Some(ret) = self.funcs.ret_type(name) {
                        if ty != *ret {
                            self.listing.stage("Mismatched types in return statement");
                        }
                    }
                }
                self.flush_line(&format!("return {code};"));
            }
            None => {
                if let Some(name) = &self.current_fn {
                    if self
                        .funcs
                        .ret_type(name)
                        .is_some_and(|r| !matches!(r, Type::Void))
                    {
                        self.listing.stage("Mismatched types in return statement");
                    }
                }
                self.flush_line("return;");
            }
        }
    }

    fn visit_write(&mut self, args: &[Expr]) {
        let mut codes = Vec::new();
        for arg in args {
            let (_, code) = self.visit_expr(arg);
            codes.push(code);
        }
        self.flush_line(&format!("write({});", codes.join(", ")));
    }

    fn visit_assign(&mut self, name: &str, index: Option<&Expr>, value: &Expr) {
        let (value_ty, value_code) = self.visit_expr(value);
        match index {
            None => {
                match self.vars.lookup(name) {
                    Err(_) => self.listing.stage("Variable not in scope"),
                    Ok(var_ty) => {
                        if value_ty != *var_ty {
                            self.listing.stage("Mismatched types in assignment");
                        }
                    }
                }
                self.flush_line(&format!("{name} = {value_code};"));
            }
            Some(idx) => {
                let (ind_ty, ind_code) = self.visit_expr(idx);
                match self.vars.lookup(name) {
                    Err(_) => self.listing.stage("Variable not in scope"),
                    Ok(Type::Array(elem, _)) => {
                        if value_ty != **elem {
                            self.listing.stage("Mismatched types in assignment");
                        } else if ind_ty != Type::Int {
                            self.listing
                                .stage("Type of rhs operand for operator [] must be int");
                        }
                    }
                    Ok(Type::Any) => {}
                    Ok(_) => self
                        .listing
                        .stage("Type of lhs operand for operator [] must be array"),
                }
                self.flush_line(&format!("{name}[{ind_code}] = {value_code};"));
            }
        }
    }

    // ---------------------------------------------------------------------
    //  Control flow
    // ---------------------------------------------------------------------

    fn visit_flow(&mut self, flow: &ControlFlow) {
        match flow {
            ControlFlow::If {
                cond,
                body,
                elifs,
                else_body,
            } => {
                let code = self.visit_condition(cond);
                self.flush_line(&format!("if({code}){{"));
                self.visit_block(body);
                for arm in elifs {
                    let code = self.visit_condition(&arm.cond);
                    self.flush_line(&format!("elif({code}){{"));
                    self.visit_block(&arm.body);
                }
                if let Some(else_body) = else_body {
                    self.write_plain_line("else {");
                    self.visit_block(else_body);
                }
            }
            ControlFlow::Unless { cond, body } => {
                let code = self.visit_condition(cond);
                self.flush_line(&format!("unless({code}){{"));
                self.visit_block(body);
            }
            ControlFlow::Case {
                scrutinee,
                arms,
                default,
            } => {
                let (ty, code) = self.visit_expr(scrutinee);
                if ty != Type::Int && ty != Type::String {
                    self.listing
                        .stage("Type of case expression must be int or string");
                }
                self.flush_line(&format!("case({code}){{"));
                self.enter_scope();
                for arm in arms {
                    self.write_plain_line(&format!("of({}){{", arm.label));
                    self.visit_block(&arm.body);
                }
                self.write_plain_line("default {");
                self.visit_block(default);
                self.leave_scope();
                self.write_plain_line("}");
            }
            ControlFlow::While { cond, body } => {
                let code = self.visit_condition(cond);
                self.flush_line(&format!("while({code}){{"));
                self.visit_block(body);
            }
            ControlFlow::DoWhile { body, cond } => {
                // The condition is checked inside the body's scope, so it
                // can mention variables the body declares.
                self.write_plain_line("do {");
                self.enter_scope();
                for inst in body {
                    self.visit_instruction(inst);
                }
                let code = self.visit_condition(cond);
                self.leave_scope();
                self.flush_line(&format!("}} while({code});"));
            }
            ControlFlow::For {
                var,
                iterable,
                body,
            } => {
                self.enter_scope();
                let (ty, code) = self.visit_expr(iterable);
                match ty {
                    Type::Array(elem, _) | Type::List(elem) => {
                        if self.vars.declare(var, *elem).is_err() {
                            self.listing.stage("Variable already defined");
                        }
                    }
                    Type::Any => {
                        let _ = self.vars.declare(var, Type::Any);
                    }
                    _ => self.listing.stage("Type of expression must iterable"),
                }
                let line = format!(
                    "{}for({var} in {code}){{",
                    self.listing.parent_indent().to_owned()
                );
                self.listing.flush(&line);
                for inst in body {
                    self.visit_instruction(inst);
                }
                self.leave_scope();
                self.write_plain_line("}");
            }
        }
    }

    fn visit_condition(&mut self, cond: &Expr) -> String {
        let (ty, code) = self.visit_expr(cond);
        if ty != Type::Bool {
            self.listing
                .stage("Type of condition expression must be bool");
        }
        code
    }

    fn visit_block(&mut self, body: &[Instruction]) {
        self.enter_scope();
        for inst in body {
            self.visit_instruction(inst);
        }
        self.leave_scope();
        self.write_plain_line("}");
    }

    // ---------------------------------------------------------------------
    //  Expressions
    // ---------------------------------------------------------------------

    fn visit_expr(&mut self, expr: &Expr) -> (Type, String) {
        match expr {
            Expr::Binary { op, lhs, rhs } => self.visit_binary(*op, lhs, rhs),
            Expr::Not(inner) => {
                let (ty, code) = self.visit_expr(inner);
                if ty != Type::Bool {
                    self.listing
                        .stage("Type of operand for operator ! must be bool");
                }
                (Type::Bool, format!("!{code}"))
            }
            Expr::Paren(inner) => {
                let (ty, code) = self.visit_expr(inner);
                (ty, format!("({code})"))
            }
            Expr::Literal(lit) => self.visit_literal(lit),
            Expr::Deref { name, index } => self.visit_deref(name, index.as_deref()),
            Expr::Call(call) => self.visit_call(call),
            Expr::Read => (Type::Any, "read()".to_owned()),
            Expr::Head(inner) => {
                let (ty, code) = self.visit_expr(inner);
                let code = format!("head({code})");
                match ty {
                    Type::List(elem) => (*elem, code),
                    Type::Any => (Type::Any, code),
                    _ => {
                        self.listing
                            .stage("head() operations can only be used on lists");
                        (Type::Any, code)
                    }
                }
            }
            Expr::Tail(inner) => {
                let (ty, code) = self.visit_expr(inner);
                if !matches!(ty, Type::List(_) | Type::Any) {
                    self.listing
                        .stage("tail() operations can only be used on lists");
                }
                (ty, format!("tail({code})"))
            }
        }
    }

    fn visit_binary(&mut self, op: BinOp, lhs: &Expr, rhs: &Expr) -> (Type, String) {
        let (lt, lc) = self.visit_expr(lhs);
        let (rt, rc) = self.visit_expr(rhs);
        let code = format!("{lc} {} {rc}", op.symbol());
        let ty = match op {
            BinOp::Add => {
                if lt != rt {
                    self.listing
                        .stage("Type of operands for operator + must be the same");
                } else if !matches!(lt, Type::Int | Type::Float | Type::String | Type::Any) {
                    self.listing
                        .stage("Type of operands for operator + must be int, float or string");
                }
                lt
            }
            BinOp::Sub => {
                self.check_numeric_pair(
                    &lt,
                    &rt,
                    "Type of operands for operator - must be the same",
                    "Type of operands for operator - must be int or float",
                );
                lt
            }
            BinOp::Mul => {
                self.check_numeric_pair(
                    &lt,
                    &rt,
                    "Type of operands for operator * must be the same",
                    "Type of operands for operator * must be int or float",
                );
                lt
            }
            BinOp::Div => {
                self.check_numeric_pair(
                    &lt,
                    &rt,
                    "Type of operands for operator / must be the same",
                    "Type of operands for operator / must be int or float",
                );
                lt
            }
            BinOp::Pow => {
                self.check_numeric_pair(
                    &lt,
                    &rt,
                    "Type of operands for operator ^ must be the same",
                    "Type of operands for operator ^ must be int or float",
                );
                lt
            }
            BinOp::Mod => {
                if lt != Type::Int || rt != Type::Int {
                    self.listing
                        .stage("Type of operands for operator % must be int");
                }
                Type::Int
            }
            BinOp::Prepend => {
                self.check_list_pair(
                    &lt,
                    &rt,
                    "Type of rhs operand for operator ^: must be list",
                    "Type of lhs operand for operator ^: must be the same as rhs's typename",
                );
                rt
            }
            BinOp::Append => {
                self.check_list_pair(
                    &lt,
                    &rt,
                    "Type of rhs operand for operator $: must be list",
                    "Type of lhs operand for operator $: must be the same as rhs's typename",
                );
                rt
            }
            BinOp::Eq => {
                if lt != rt {
                    self.listing
                        .stage("Type of operands for operator == must be the same");
                }
                Type::Bool
            }
            BinOp::Neq => {
                if lt != rt {
                    self.listing
                        .stage("Type of operands for operator != must be the same");
                }
                Type::Bool
            }
            BinOp::And => {
                if lt != Type::Bool || rt != Type::Bool {
                    self.listing
                        .stage("Type of operands for operator && must be bool");
                }
                Type::Bool
            }
            BinOp::Or => {
                if lt != Type::Bool || rt != Type::Bool {
                    self.listing
                        .stage("Type of operands for operator || must be bool");
                }
                Type::Bool
            }
        };
        (ty, code)
    }

    fn check_numeric_pair(
        &mut self,
        lt: &Type,
        rt: &Type,
        same_msg: &'static str,
        kind_msg: &'static str,
    ) {
        if lt != rt {
            self.listing.stage(same_msg);
        } else if !matches!(lt, Type::Int | Type::Float | Type::Any) {
            self.listing.stage(kind_msg);
        }
    }

    fn check_list_pair(
        &mut self,
        lt: &Type,
        rt: &Type,
        list_msg: &'static str,
        elem_msg: &'static str,
    ) {
        match rt {
            Type::List(_) => {
                if !rt.is_param(lt) {
                    self.listing.stage(elem_msg);
                }
            }
            Type::Any => {}
            _ => self.listing.stage(list_msg),
        }
    }

    fn visit_deref(&mut self, name: &str, index: Option<&Expr>) -> (Type, String) {
        match index {
            Some(idx) => {
                let (ind_ty, ind_code) = self.visit_expr(idx);
                let code = format!("{name}[{ind_code}]");
                let ty = match self.vars.lookup(name) {
                    Err(_) => {
                        self.listing.stage("Variable not in scope");
                        Type::Any
                    }
                    Ok(Type::Array(elem, _)) => {
                        let elem = (**elem).clone();
                        if ind_ty != Type::Int {
                            self.listing
                                .stage("Type of rhs operand for operator [] must be int");
                        }
                        elem
                    }
                    Ok(Type::Any) => Type::Any,
                    Ok(_) => {
                        self.listing
                            .stage("Type of lhs operand for operator [] must be array");
                        Type::Any
                    }
                };
                (ty, code)
            }
            None => match self.vars.lookup(name) {
                Err(_) => {
                    self.listing.stage("Variable not in scope");
                    (Type::Any, name.to_owned())
                }
                Ok(ty) => (ty.clone(), name.to_owned()),
            },
        }
    }

    fn visit_call(&mut self, call: &FuncCall) -> (Type, String) {
        let mut arg_types = Vec::new();
        let mut codes = Vec::new();
        for arg in &call.args {
            let (ty, code) = self.visit_expr(arg);
            arg_types.push(ty);
            codes.push(code);
        }
        let code = format!("{}({})", call.name, codes.join(", "));

        let Some(params) = self.funcs.params(&call.name) else {
            self.listing.stage("Function not in scope");
            return (Type::Any, code);
        };

        let mut ok = true;
        if params.len() != arg_types.len() {
            self.listing
                .stage("Number of function parameters and given arguments must match");
            ok = false;
        } else {
            for (param, arg) in params.iter().zip(&arg_types) {
                if param != arg {
                    self.listing
                        .stage("Mismatched types in function call argument");
                    ok = false;
                    break;
                }
            }
        }

        let ret = self
            .funcs
            .ret_type(&call.name)
            .cloned()
            .unwrap_or(Type::Any);
        (if ok { ret } else { Type::Any }, code)
    }

    fn visit_literal(&mut self, lit: &Literal) -> (Type, String) {
        match lit {
            Literal::Int(s) => (Type::Int, s.clone()),
            Literal::Float(s) => (Type::Float, s.clone()),
            Literal::Bool(s) => (Type::Bool, s.clone()),
            Literal::Str(s) => (Type::String, s.clone()),
            Literal::List(items) => {
                if items.is_empty() {
                    return (Type::List(Box::new(Type::Any)), "[]".to_owned());
                }
                let (first_ty, codes) =
                    self.visit_elements(items, "Lists must have homogeneous types");
                (
                    Type::List(Box::new(first_ty)),
                    format!("[{}]", codes.join(", ")),
                )
            }
            Literal::Array(items) => {
                let (first_ty, codes) =
                    self.visit_elements(items, "Arrays must have homogeneous types");
                (
                    Type::Array(Box::new(first_ty), items.len()),
                    format!("{{{}}}", codes.join(", ")),
                )
            }
            Literal::Tuple(items) => {
                let mut types = Vec::new();
                let mut codes = Vec::new();
                for item in items {
                    let (ty, code) = self.visit_expr(item);
                    types.push(ty);
                    codes.push(code);
                }
                (Type::Tuple(types), format!("|{}|", codes.join(", ")))
            }
        }
    }

    /// Visit a non-empty homogeneous container, staging `msg` on the first
    /// element whose type disagrees with the first element's.
    fn visit_elements(&mut self, items: &[Expr], msg: &'static str) -> (Type, Vec<String>) {
        let (first_ty, first_code) = self.visit_expr(&items[0]);
        let mut codes = vec![first_code];
        for item in &items[1..] {
            let (ty, code) = self.visit_expr(item);
            codes.push(code);
            if first_ty != ty {
                self.listing.stage(msg);
            }
        }
        (first_ty, codes)
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

// -------------------------------------------------------------------------

#[cfg(test)]
fn analyze_source(src: &str) -> Analyzer {
    let unit = crate::parser::parse_unit(src).expect("source should parse");
    let mut analyzer = Analyzer::new();
    analyzer.analyze(&unit);
    analyzer
}

#[cfg(test)]
fn listing_body(html: &str) -> String {
    let start = html.find("<pre>").unwrap() + "<pre>".len();
    let end = html.find("</pre>").unwrap();
    let mut out = String::new();
    let mut in_tag = false;
    for ch in html[start..end].chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[test]
fn duplicate_function_is_flagged_on_the_second_header() {
    let analyzer = analyze_source("fn f(){} fn f(){}");
    assert!(analyzer.has_errors());
    let html = analyzer.into_html();
    assert!(html.contains(
        "<div class=\"error\">fn f(){<span class=\"errortext\">Function already defined</span></div>"
    ));
    // the first header stays clean
    assert!(html.contains("\nfn f(){\n"));
}

#[test]
fn return_type_mismatch_wraps_the_return_line() {
    let analyzer = analyze_source("fn g() -> int { return 1.0; }");
    assert!(analyzer.has_errors());
    let html = analyzer.into_html();
    assert!(html.contains("return 1.0;<span class=\"errortext\">Mismatched types in return statement</span>"));
}

#[test]
fn index_assignment_happy_path_is_clean() {
    let analyzer = analyze_source("fn h(){ let a: array<int, 3> = {1,2,3}; a[0] = 9; }");
    assert!(!analyzer.has_errors());
    let html = analyzer.into_html();
    assert!(html.contains("    let a: array&lt;int, 3&gt; = {1, 2, 3};"));
    assert!(html.contains("    a[0] = 9;"));
    assert!(!html.contains("class=\"error\""));
}

#[test]
fn only_the_first_error_per_line_is_reported() {
    let analyzer = analyze_source("fn f(){ let x: int = (true + 1) + (false + 2); }");
    assert!(analyzer.has_errors());
    let html = analyzer.into_html();
    assert_eq!(html.matches("class=\"errortext\"").count(), 1);
    assert!(html.contains("Type of operands for operator + must be the same"));
    assert!(!html.contains("Mismatched types<"));
}

#[test]
fn has_errors_stays_set_after_later_clean_lines() {
    let analyzer = analyze_source("fn f(){ let x: int = 1.5; let y: int = 2; }");
    assert!(analyzer.has_errors());
}

#[test]
fn scope_discipline_leaves_only_top_level_bindings() {
    let analyzer = analyze_source(
        "let y: bool = true; fn f(){ let x: int = 1; } let z: float = 2.0;",
    );
    let names: Vec<_> = analyzer.vars.bindings().map(|(n, _)| n.to_owned()).collect();
    assert_eq!(names, vec!["y", "z"]);
}

#[test]
fn for_binds_the_element_type_in_the_loop_scope() {
    let analyzer = analyze_source("fn e(){ for(x in {1,2,3}){ let y: int = x + 0; } }");
    assert!(!analyzer.has_errors());
}

#[test]
fn for_over_non_iterable_is_flagged() {
    let analyzer = analyze_source("fn e(){ for(x in 5){ } }");
    assert!(analyzer.has_errors());
    let html = analyzer.into_html();
    assert!(html.contains("Type of expression must iterable"));
}

#[test]
fn unknown_variable_recovers_as_wildcard() {
    // the only reported error is the missing variable, not a cascade
    let analyzer = analyze_source("fn f(){ let x: int = missing + 1; }");
    let html = analyzer.into_html();
    assert!(html.contains("Variable not in scope"));
    assert!(!html.contains("must be the same"));
}

#[test]
fn duplicate_parameter_names_are_flagged() {
    let analyzer = analyze_source("fn f(a: int, a: int){}");
    assert!(analyzer.has_errors());
    let html = analyzer.into_html();
    assert!(html.contains("Variable already defined"));
}

#[test]
fn indexing_a_non_array_is_flagged() {
    let analyzer = analyze_source("fn f(){ let a: int = 1; a[0] = 2; }");
    let html = analyzer.into_html();
    assert!(html.contains("Type of lhs operand for operator [] must be array"));
}

#[test]
fn case_scrutinee_must_be_int_or_string() {
    let analyzer = analyze_source("fn f(){ case(true){ default { } } }");
    let html = analyzer.into_html();
    assert!(html.contains("Type of case expression must be int or string"));
}

#[test]
fn do_while_condition_sees_body_bindings() {
    let analyzer = analyze_source("fn f(){ do { let i: int = 1; } while(i == 1); }");
    assert!(!analyzer.has_errors());
}

#[test]
fn self_recursion_typechecks_but_forward_calls_do_not() {
    let rec = analyze_source("fn f(n: int) -> int { return f(n - 1); }");
    assert!(!rec.has_errors());

    let fwd = analyze_source("fn a(){ b(); } fn b(){}");
    assert!(fwd.has_errors());
    let html = fwd.into_html();
    assert!(html.contains("Function not in scope"));
}

#[test]
fn empty_list_satisfies_any_declared_list_type() {
    let analyzer = analyze_source("fn f(){ let s: list<string> = []; }");
    assert!(!analyzer.has_errors());
}

#[test]
fn operators_and_arrows_are_escaped_in_the_listing() {
    let analyzer =
        analyze_source("fn f(b: bool) -> tuple<int, bool> { return |1, b && true|; }");
    assert!(!analyzer.has_errors());
    let html = analyzer.into_html();
    assert!(html.contains("fn f(b: bool) -&gt; tuple&lt;int, bool&gt; {"));
    assert!(html.contains("b &amp;&amp; true"));
}

#[test]
fn listing_round_trips_to_the_same_ast() {
    let src = r#"
        let y: bool = true;

        fn bar(a: int) -> float {
            return 1.0;
        }

        fn foo(n: int, s: string) -> tuple<int, string> {
            let l: list<int> = [1, 2, 3];
            let m: list<int> = n ^: tail(l);
            let h: int = head(m);
            if(h == 1 && !false){
                write(s, h);
            }
            elif(h != 2 || false){
                h = 3;
            }
            else {
                unless(h % 2 == 0){
                    let f: float = bar(h);
                }
            }
            case(n){
                of(1){ write("one"); }
                default { write("other"); }
            }
            while(h != 5){
                h = h + 1;
            }
            do {
                h = h - 1;
            } while(h == 999);
            for(x in {1, 2, 3}){
                let q: int = x * 2;
            }
            return |n, s|;
        }
    "#;
    let unit = crate::parser::parse_unit(src).unwrap();
    let mut analyzer = Analyzer::new();
    analyzer.analyze(&unit);
    assert!(!analyzer.has_errors());

    let body = listing_body(&analyzer.into_html());
    let reparsed = crate::parser::parse_unit(&body).expect("listing should reparse");
    assert_eq!(reparsed, unit);
}
