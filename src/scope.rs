use crate::types::Type;
use indexmap::IndexMap;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SymbolError {
    #[error("already defined")]
    AlreadyDefined,
    #[error("not found")]
    NotFound,
}

/// Lexically scoped variable bindings. The map is insertion-ordered so that
/// leaving a scope can drop exactly the bindings that scope introduced, most
/// recent first; a side stack remembers how many that is per open scope.
#[derive(Debug, Default)]
pub struct ScopeStack {
    vars: IndexMap<String, Type>,
    saved_counts: Vec<usize>,
    new_in_scope: usize,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter_scope(&mut self) {
        self.saved_counts.push(self.new_in_scope);
        self.new_in_scope = 0;
    }

    pub fn leave_scope(&mut self) {
        for _ in 0..self.new_in_scope {
            self.vars.pop();
        }
        self.new_in_scope = self.saved_counts.pop().unwrap_or(0);
    }

    /// Shadowing is not a thing in the IPL: a name bound in any open scope
    /// cannot be bound again.
    pub fn declare(&mut self, name: &str, ty: Type) -> Result<(), SymbolError> {
        if self.vars.contains_key(name) {
            return Err(SymbolError::AlreadyDefined);
        }
        self.vars.insert(name.to_owned(), ty);
        self.new_in_scope += 1;
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<&Type, SymbolError> {
        self.vars.get(name).ok_or(SymbolError::NotFound)
    }

    pub fn bindings(&self) -> impl Iterator<Item = (&str, &Type)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }
}

/// Functions live in a single flat namespace and cannot be redefined; the
/// first signature wins.
#[derive(Debug, Default)]
pub struct FuncTable {
    params: HashMap<String, Vec<Type>>,
    ret_types: HashMap<String, Type>,
}

impl FuncTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, name: &str, params: Vec<Type>, ret: Type) -> Result<(), SymbolError> {
        if self.params.contains_key(name) {
            return Err(SymbolError::AlreadyDefined);
        }
        self.params.insert(name.to_owned(), params);
        self.ret_types.insert(name.to_owned(), ret);
        Ok(())
    }

    pub fn params(&self, name: &str) -> Option<&[Type]> {
        self.params.get(name).map(Vec::as_slice)
    }

    pub fn ret_type(&self, name: &str) -> Option<&Type> {
        self.ret_types.get(name)
    }
}

#[test]
fn scope_exit_drops_only_inner_bindings() {
    let mut scopes = ScopeStack::new();
    scopes.declare("outer", Type::Int).unwrap();
    scopes.enter_scope();
    scopes.declare("a", Type::Bool).unwrap();
    scopes.declare("b", Type::Float).unwrap();
    assert_eq!(scopes.len(), 3);
    scopes.leave_scope();

    assert_eq!(scopes.len(), 1);
    assert_eq!(*scopes.lookup("outer").unwrap(), Type::Int);
    assert_eq!(scopes.lookup("a"), Err(SymbolError::NotFound));
}

#[test]
fn nested_scopes_restore_their_counters() {
    let mut scopes = ScopeStack::new();
    scopes.enter_scope();
    scopes.declare("x", Type::Int).unwrap();
    scopes.enter_scope();
    scopes.declare("y", Type::Int).unwrap();
    scopes.leave_scope();
    // `x` must survive the inner scope and die with the outer one.
    assert!(scopes.lookup("x").is_ok());
    scopes.leave_scope();
    assert_eq!(scopes.len(), 0);
}

#[test]
fn duplicate_declaration_is_rejected_across_open_scopes() {
    let mut scopes = ScopeStack::new();
    scopes.declare("x", Type::Int).unwrap();
    scopes.enter_scope();
    assert_eq!(
        scopes.declare("x", Type::Bool),
        Err(SymbolError::AlreadyDefined)
    );
}

#[test]
fn function_redefinition_keeps_the_first_signature() {
    let mut funcs = FuncTable::new();
    funcs.declare("f", vec![Type::Int], Type::Bool).unwrap();
    assert_eq!(
        funcs.declare("f", vec![], Type::Void),
        Err(SymbolError::AlreadyDefined)
    );
    assert_eq!(funcs.params("f").unwrap().len(), 1);
    assert_eq!(*funcs.ret_type("f").unwrap(), Type::Bool);
}
