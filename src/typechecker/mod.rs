//! AST walk with an auxiliary type stack and an ordered variable table.

use crate::ast::*;
use crate::diagnostics::{Diagnostics, ErrorKind, Location};
use crate::lexer::{Token, TokenKind};

/// An entry on the type-checking stack: a value's type, its source location
/// (for error reporting), and — for indexable values — the element type.
#[derive(Debug, Clone)]
struct StackItem {
    type_: PrimitiveType,
    loc: Location,
    sub_type: Option<PrimitiveType>,
}

impl StackItem {
    fn new(type_: PrimitiveType, loc: Location) -> Self {
        Self { type_, loc, sub_type: None }
    }
}

/// A declared variable: its name, type and whether it was declared `furt`.
/// Kept as a plain ordered `Vec` — scopes only ever pop a known count off the
/// tail, so a hash map buys nothing at this scale.
#[derive(Debug, Clone)]
struct Variable {
    name: String,
    type_: PrimitiveType,
    sub_type: Option<PrimitiveType>,
    is_const: bool,
    loc: Location,
}

pub struct TypeChecker<'a> {
    stack: Vec<StackItem>,
    variables: Vec<Variable>,
    scopes: Vec<usize>,
    diagnostics: &'a Diagnostics,
    loop_depth: usize,
}

impl<'a> TypeChecker<'a> {
    pub fn new(diagnostics: &'a Diagnostics) -> Self {
        Self {
            stack: Vec::new(),
            variables: Vec::new(),
            scopes: vec![0],
            diagnostics,
            loop_depth: 0,
        }
    }

    fn error(&self, message: impl AsRef<str>, loc: Location) -> ! {
        self.diagnostics.error(ErrorKind::Type, message, Some(loc))
    }

    fn pop(&mut self) -> StackItem {
        self.stack.pop().expect("type stack underflow — parser produced a malformed expression")
    }

    pub fn check_program(&mut self, program: &Program) {
        for stmt in &program.stmts {
            self.check_statement(stmt);
        }
    }

    fn check_statement(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Exit(expr) => self.check_exit(expr),
            Stmt::Declare(decl) => self.check_decl(decl),
            Stmt::Scope(scope) => self.check_scope(scope),
            Stmt::If(if_stmt) => self.check_if(if_stmt),
            Stmt::Reassign(reassign) => self.check_reassign(reassign),
            Stmt::While(w) => self.check_while(w),
            Stmt::DoWhile(dw) => self.check_do_while(dw),
            Stmt::For(f) => self.check_for(f),
            Stmt::Print(p) => self.check_print(p),
            Stmt::Break(token) => {
                if self.loop_depth == 0 {
                    self.diagnostics
                        .error(ErrorKind::Syntax, "break used outside of a loop", Some(Location::from(token)));
                }
            }
            Stmt::Empty => {}
        }
    }

    fn find_variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().rev().find(|v| v.name == name)
    }

    fn find_variable_in_current_scope(&self, name: &str) -> bool {
        let floor = *self.scopes.last().unwrap_or(&0);
        self.variables[floor..].iter().any(|v| v.name == name)
    }

    fn check_term(&mut self, term: &Term) {
        if let Some(index) = &term.index {
            let bare = Term { kind: term.kind.clone(), index: None };
            self.check_term(&bare);
            let mut item = self.pop();
            let Some(sub) = item.sub_type else {
                self.error(format!("expected indexable type, got `{}`", item.type_), item.loc);
            };
            item.sub_type = None;
            item.type_ = sub;

            self.check_expression(index);
            let idx = self.pop();
            if idx.type_ != PrimitiveType::Int {
                self.error(format!("expected type `cif`, got `{}`", idx.type_), idx.loc);
            }
            self.stack.push(item);
            return;
        }

        match &term.kind {
            TermKind::Int { token, .. } => self.stack.push(StackItem::new(PrimitiveType::Int, Location::from(token))),
            TermKind::Ident { token, .. } => {
                let name = token.value.as_deref().unwrap_or_default();
                let Some(var) = self.find_variable(name).cloned() else {
                    self.diagnostics
                        .error(ErrorKind::Value, format!("variable was not declared: {name}"), Some(Location::from(token)));
                };
                let mut item = StackItem::new(var.type_, Location::from(token));
                item.sub_type = var.sub_type;
                self.stack.push(item);
            }
            TermKind::Bool { token } => self.stack.push(StackItem::new(PrimitiveType::Bool, Location::from(token))),
            TermKind::Char { token } => self.stack.push(StackItem::new(PrimitiveType::Char, Location::from(token))),
            TermKind::Str { token, .. } => {
                let mut item = StackItem::new(PrimitiveType::Str, Location::from(token));
                item.sub_type = Some(PrimitiveType::Char);
                self.stack.push(item);
            }
            TermKind::Paren { expr, negative } => {
                self.check_expression(expr);
                if *negative && self.stack.last().unwrap().type_ != PrimitiveType::Int {
                    let top = self.stack.last().unwrap().clone();
                    self.error(format!("`{}` cannot be negative", top.type_), top.loc);
                }
            }
            TermKind::Not(inner) => {
                self.check_term(inner);
                let top = self.stack.last().unwrap();
                if top.type_ != PrimitiveType::Bool {
                    self.error(format!("expected type `bul`, got `{}`", top.type_), top.loc);
                }
            }
            TermKind::BNot(inner) => {
                self.check_term(inner);
                let top = self.stack.last().unwrap();
                if top.type_ != PrimitiveType::Int {
                    self.error(format!("expected type `cif`, got `{}`", top.type_), top.loc);
                }
            }
            TermKind::Cast { expr, type_token } => {
                let target = primitive_of_type_token(type_token);
                if target == PrimitiveType::Str {
                    panic!("typecasting to a string is not implemented");
                }
                self.check_expression(expr);
                let top = self.stack.last().unwrap().clone();
                if top.type_ == PrimitiveType::Str && target == PrimitiveType::Char {
                    self.error("cannot cast `lancok` to `znak`", Location::from(type_token));
                }
                self.stack.last_mut().unwrap().type_ = target;
            }
            TermKind::Array(exprs) => {
                let mut elem_type: Option<StackItem> = None;
                for expr in exprs {
                    self.check_expression(expr);
                    let item = self.pop();
                    match &elem_type {
                        None => elem_type = Some(item),
                        Some(t) if t.type_ != item.type_ => {
                            self.error(format!("expected `{}`, got `{}`", t.type_, item.type_), item.loc);
                        }
                        Some(_) => {}
                    }
                }
                let elem = elem_type.unwrap_or_else(|| StackItem::new(PrimitiveType::Int, Location { line: 0, col: 0 }));
                let mut array_item = StackItem::new(PrimitiveType::Array, elem.loc);
                array_item.sub_type = Some(elem.type_);
                self.stack.push(array_item);
            }
        }
    }

    fn check_binary_expression(&mut self, bin: &BinExpr) {
        self.check_expression(&bin.lhs);
        self.check_expression(&bin.rhs);
        let b = self.pop();
        let a = self.pop();

        if bin.op.kind.is_comparison() {
            if !matches!(a.type_, PrimitiveType::Int | PrimitiveType::Char) {
                self.error(format!("expected type `cif`, got `{}`", a.type_), a.loc);
            }
            if !matches!(b.type_, PrimitiveType::Int | PrimitiveType::Char) {
                self.error(format!("expected type `cif`, got `{}`", b.type_), b.loc);
            }
            self.stack.push(StackItem::new(PrimitiveType::Bool, a.loc));
        } else if matches!(bin.op.kind, TokenKind::And | TokenKind::Or) {
            if a.type_ != PrimitiveType::Bool {
                self.error(format!("expected type `bul`, got `{}`", a.type_), a.loc);
            }
            if b.type_ != PrimitiveType::Bool {
                self.error(format!("expected type `bul`, got `{}`", b.type_), b.loc);
            }
            self.stack.push(a);
        } else if matches!(
            bin.op.kind,
            TokenKind::ShiftLeft
                | TokenKind::ShiftRight
                | TokenKind::BOr
                | TokenKind::BAnd
                | TokenKind::Xor
                | TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Star
                | TokenKind::Slash
                | TokenKind::Percent
        ) {
            if a.type_ != PrimitiveType::Int {
                self.error(format!("expected type `cif`, got `{}`", a.type_), a.loc);
            }
            if b.type_ != PrimitiveType::Int {
                self.error(format!("expected type `cif`, got `{}`", b.type_), b.loc);
            }
            self.stack.push(a);
        } else {
            unreachable!("lexer/parser only ever produce binary operators from the precedence table")
        }
    }

    fn check_expression(&mut self, expr: &Expr) {
        match expr {
            Expr::Term(term) => self.check_term(term),
            Expr::Binary(bin) => self.check_binary_expression(bin),
        }
    }

    fn check_exit(&mut self, expr: &Expr) {
        self.check_expression(expr);
        let item = self.pop();
        if item.type_ != PrimitiveType::Int {
            self.error(format!("expected type `cif`, got `{}`", item.type_), item.loc);
        }
    }

    fn check_decl(&mut self, decl: &Declare) {
        let name = decl.ident.value.as_deref().unwrap_or_default();
        if self.find_variable_in_current_scope(name) {
            self.diagnostics.error(
                ErrorKind::Value,
                format!("variable has been already declared in this scope: {name}"),
                Some(Location::from(&decl.ident)),
            );
        }

        self.check_expression(&decl.expr);
        let mut type_ = decl.resolved_type();
        let top = self.stack.last().unwrap().clone();

        if type_.primitive == PrimitiveType::Infer {
            type_.primitive = top.type_;
        } else if top.type_ != type_.primitive {
            self.error(
                format!("expected type `{}`, got `{}`", type_.primitive, top.type_),
                Location::from(&decl.ident),
            );
        }

        let sub_type = if type_.primitive == PrimitiveType::Str {
            Some(PrimitiveType::Char)
        } else if type_.primitive == PrimitiveType::Array {
            top.sub_type
        } else {
            None
        };

        decl.type_.replace(type_);
        self.stack.pop();

        let name = decl.ident.value.clone().unwrap_or_default();
        self.variables.push(Variable {
            name,
            type_: decl.resolved_type().primitive,
            sub_type,
            is_const: decl.is_const,
            loc: Location::from(&decl.ident),
        });
    }

    fn check_reassign(&mut self, reassign: &Reassign) {
        let ident = reassign.ident();
        let token = ident.ident_token();
        let name = token.value.as_deref().unwrap_or_default();

        let Some(var) = self.find_variable(name).cloned() else {
            self.diagnostics
                .error(ErrorKind::Value, format!("undeclared identifier: {name}"), Some(Location::from(token)));
        };
        if var.is_const {
            self.diagnostics
                .error(ErrorKind::Value, format!("modification of const identifier: {name}"), Some(Location::from(token)));
        }

        match reassign {
            Reassign::Eq { rvalue, .. } => {
                self.check_expression(rvalue);
                let item = self.pop();
                if ident.index.is_some() {
                    if var.sub_type.is_none() {
                        self.error(format!("expected indexable type, got `{}`", var.type_), var.loc);
                    }
                } else if item.type_ != var.type_ {
                    self.error(format!("expected type `{}`, got `{}`", var.type_, item.type_), Location::from(token));
                }
            }
            Reassign::Inc { .. } | Reassign::Dec { .. } => {
                if var.type_ != PrimitiveType::Int {
                    self.error(format!("cannot increment or decrement a variable of `{}` type", var.type_), var.loc);
                }
            }
        }
    }

    fn check_scope(&mut self, scope: &Scope) {
        self.scopes.push(self.variables.len());
        for stmt in &scope.stmts {
            self.check_statement(stmt);
        }
        let floor = self.scopes.pop().expect("scope stack underflow");
        self.variables.truncate(floor);
    }

    fn check_condition(&mut self, expr: &Expr, allow_int: bool) {
        self.check_expression(expr);
        let item = self.pop();
        let ok = item.type_ == PrimitiveType::Bool || (allow_int && item.type_ == PrimitiveType::Int);
        if !ok {
            let expected = if allow_int { "bul` or `cif" } else { "bul" };
            self.error(format!("expected type `{expected}`, got `{}`", item.type_), item.loc);
        }
    }

    fn check_if(&mut self, if_stmt: &StmtIf) {
        self.check_condition(&if_stmt.expr, true);
        self.check_scope(&if_stmt.scope);
        if let Some(pred) = &if_stmt.pred {
            self.check_if_predicate(pred);
        }
    }

    fn check_if_predicate(&mut self, pred: &IfPred) {
        match pred {
            IfPred::Elif { expr, scope, next } => {
                self.check_condition(expr, true);
                self.check_scope(scope);
                if let Some(next) = next {
                    self.check_if_predicate(next);
                }
            }
            IfPred::Else { scope } => self.check_scope(scope),
        }
    }

    fn check_while(&mut self, w: &StmtWhile) {
        self.check_condition(&w.expr, true);
        self.loop_depth += 1;
        self.check_scope(&w.scope);
        self.loop_depth -= 1;
    }

    fn check_do_while(&mut self, dw: &StmtDoWhile) {
        self.loop_depth += 1;
        self.check_scope(&dw.scope);
        self.loop_depth -= 1;
        self.check_condition(&dw.expr, true);
    }

    fn check_for(&mut self, f: &StmtFor) {
        self.check_decl(&f.ident_def);
        self.check_condition(&f.condition, false);
        self.loop_depth += 1;
        self.check_scope(&f.scope);
        self.loop_depth -= 1;
        self.check_reassign(&f.ident_assign);
    }

    fn check_print(&mut self, p: &StmtPrint) {
        self.check_expression(&p.content);
        let item = self.pop();
        if !matches!(item.type_, PrimitiveType::Char | PrimitiveType::Str) {
            self.error(format!("expected type `znak` or `lancok`, got `{}`", item.type_), item.loc);
        }
        p.cont_type.set(item.type_);
    }
}

fn primitive_of_type_token(token: &Token) -> PrimitiveType {
    match token.kind {
        TokenKind::IntDef => PrimitiveType::Int,
        TokenKind::BoolDef => PrimitiveType::Bool,
        TokenKind::CharDef => PrimitiveType::Char,
        TokenKind::StrDef => PrimitiveType::Str,
        _ => unreachable!("cast target is always a type keyword, enforced by the parser"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn check(source: &str) {
        let diagnostics = Diagnostics::new("test.hdz", source, false, false);
        let tokens = Lexer::new(source, &diagnostics).tokenize();
        let program = Parser::new(tokens, &diagnostics).parse_program();
        TypeChecker::new(&diagnostics).check_program(&program);
    }

    #[test]
    fn accepts_int_exit() {
        check("vychod(42)\n");
    }

    #[test]
    fn accepts_arithmetic_precedence() {
        check("vychod(2 + 3 * 4)\n");
    }

    #[test]
    fn accepts_bool_declaration_and_while() {
        check("naj x = pravda\nkim x {\n  x = klamstvo\n}\nvychod(0)\n");
    }

    #[test]
    fn accepts_string_print() {
        check("hutor(\"Hi\")\n");
    }

    #[test]
    fn inner_scope_shadowing_does_not_leak_outward() {
        check("naj x = 1\n{\n  naj x = pravda\n}\nvychod(x)\n");
    }

    #[test]
    fn accepts_break_inside_while() {
        check("kim pravda {\n  konec\n}\nvychod(0)\n");
    }
}
