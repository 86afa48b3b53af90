//! Recursive-descent parser with Pratt precedence climbing for expressions.
//!
//! Two conventions run through this module, carried over exactly from the
//! structure this parser is modeled on: statement-level `parse_*` functions
//! advance eagerly past every token they consume, while `parse_term` leaves
//! `current` sitting on the last token it consumed and `parse_expr` leaves
//! `current` one token past the expression it built. The two turn out to
//! compose without any special-casing at the boundaries (a parenthesized or
//! cast expression's closing delimiter is simultaneously "one past the
//! sub-expression" and "the term's own last token").

use std::cell::{Cell, RefCell};

use crate::ast::*;
use crate::diagnostics::{Diagnostics, ErrorKind, Location};
use crate::lexer::{Token, TokenKind};

pub struct Parser<'a> {
    tokens: Vec<Token>,
    index: isize,
    current: Option<Token>,
    diagnostics: &'a Diagnostics,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token>, diagnostics: &'a Diagnostics) -> Self {
        let mut parser = Self {
            tokens,
            index: -1,
            current: None,
            diagnostics,
        };
        parser.advance();
        parser
    }

    fn advance(&mut self) {
        self.index += 1;
        self.current = usize::try_from(self.index).ok().and_then(|i| self.tokens.get(i)).cloned();
    }

    fn peek_kind(&self, offset: isize) -> Option<TokenKind> {
        usize::try_from(self.index + offset)
            .ok()
            .and_then(|i| self.tokens.get(i))
            .map(|t| t.kind)
    }

    fn current_kind(&self) -> Option<TokenKind> {
        self.current.as_ref().map(|t| t.kind)
    }

    fn loc(&self) -> Option<Location> {
        self.current.as_ref().map(Location::from)
    }

    fn error(&self, kind: ErrorKind, message: impl AsRef<str>) -> ! {
        self.diagnostics.error(kind, message, self.loc())
    }

    /// Aborts unless `current` is one of `kinds`. Never advances.
    fn try_expect(&self, kinds: &[TokenKind], message: &str) {
        match self.current_kind() {
            Some(kind) if kinds.contains(&kind) => {}
            _ => self.error(ErrorKind::Syntax, message),
        }
    }

    fn expect_one(&self, kind: TokenKind, message: &str) {
        self.try_expect(&[kind], message);
    }

    fn current_token(&self) -> Token {
        self.current.clone().unwrap_or_else(|| self.error(ErrorKind::Syntax, "unexpected end of input"))
    }

    // ---- terms & expressions -------------------------------------------------

    fn primitive_from_type_keyword(&self, kind: TokenKind) -> PrimitiveType {
        match kind {
            TokenKind::IntDef => PrimitiveType::Int,
            TokenKind::BoolDef => PrimitiveType::Bool,
            TokenKind::CharDef => PrimitiveType::Char,
            TokenKind::StrDef => PrimitiveType::Str,
            TokenKind::InferDef => PrimitiveType::Infer,
            _ => unreachable!("caller guarantees a type keyword"),
        }
    }

    fn parse_term_base(&mut self) -> Option<Term> {
        let mut is_negative = false;
        if self.current_kind() == Some(TokenKind::Minus) {
            is_negative = true;
            self.advance();
        }

        match self.current_kind()? {
            TokenKind::IntLit => Some(Term::new(TermKind::Int {
                token: self.current_token(),
                negative: is_negative,
            })),
            TokenKind::Ident => Some(Term::new(TermKind::Ident {
                token: self.current_token(),
                negative: is_negative,
            })),
            TokenKind::CharLit => {
                if is_negative {
                    self.error(ErrorKind::Syntax, "`znak` literal cannot be negative");
                }
                Some(Term::new(TermKind::Char { token: self.current_token() }))
            }
            TokenKind::StrLit => {
                if is_negative {
                    self.error(ErrorKind::Syntax, "`lancok` literal cannot be negative");
                }
                let token = self.current_token();
                let length = token.value.as_deref().unwrap_or("").split(',').filter(|s| !s.is_empty()).count();
                Some(Term::new(TermKind::Str { token, length }))
            }
            TokenKind::True | TokenKind::False => {
                if is_negative {
                    self.error(ErrorKind::Syntax, "`bul` literal cannot be negative");
                }
                Some(Term::new(TermKind::Bool { token: self.current_token() }))
            }
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.parse_expr(0).unwrap_or_else(|| self.error(ErrorKind::Value, "expected expression"));
                self.expect_one(TokenKind::RightParen, "expected `)`");
                Some(Term::new(TermKind::Paren {
                    expr: Box::new(expr),
                    negative: is_negative,
                }))
            }
            TokenKind::Not => {
                if is_negative {
                    self.error(ErrorKind::Syntax, "logical `ne` expression cannot be negative");
                }
                self.advance();
                let term = self.parse_term().unwrap_or_else(|| self.error(ErrorKind::Value, "expected term"));
                Some(Term::new(TermKind::Not(Box::new(term))))
            }
            TokenKind::BNot => {
                if is_negative {
                    self.error(ErrorKind::Syntax, "bitwise `~` expression cannot be negative");
                }
                self.advance();
                let term = self.parse_term().unwrap_or_else(|| self.error(ErrorKind::Value, "expected term"));
                Some(Term::new(TermKind::BNot(Box::new(term))))
            }
            TokenKind::LeftBracket => {
                self.advance();
                let mut exprs = Vec::new();
                if self.current_kind() != Some(TokenKind::RightBracket) {
                    loop {
                        let expr = self.parse_expr(0).unwrap_or_else(|| self.error(ErrorKind::Syntax, "invalid array element"));
                        exprs.push(expr);
                        if self.current_kind() == Some(TokenKind::Comma) {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                }
                self.expect_one(TokenKind::RightBracket, "expected `]`");
                Some(Term::new(TermKind::Array(exprs)))
            }
            TokenKind::ArrayDef => Some(Term::new(TermKind::Array(Vec::new()))),
            kind if kind.is_type_keyword() => {
                let type_token = self.current_token();
                self.advance();
                self.expect_one(TokenKind::LeftParen, "expected a `(`");
                self.advance();
                let expr = self.parse_expr(0).unwrap_or_else(|| self.error(ErrorKind::Syntax, "invalid expression"));
                self.expect_one(TokenKind::RightParen, "expected a `)`");
                Some(Term::new(TermKind::Cast {
                    expr: Box::new(expr),
                    type_token,
                }))
            }
            _ => None,
        }
    }

    fn parse_term(&mut self) -> Option<Term> {
        let mut term = self.parse_term_base()?;
        if self.peek_kind(1) == Some(TokenKind::LeftBracket) {
            self.advance();
            self.advance();
            let index = self.parse_expr(0).unwrap_or_else(|| self.error(ErrorKind::Value, "expected index expression"));
            self.expect_one(TokenKind::RightBracket, "expected `]`");
            term.index = Some(Box::new(index));
        }
        Some(term)
    }

    fn parse_expr(&mut self, min_prec: u8) -> Option<Expr> {
        let term_lhs = self.parse_term()?;
        self.advance();

        let mut expr_lhs = Expr::Term(Box::new(term_lhs));

        loop {
            let Some(op) = self.current.clone() else { break };
            let Some(prec) = op.kind.precedence() else { break };
            if prec < min_prec {
                break;
            }

            self.advance();
            let rhs = self
                .parse_expr(prec + 1)
                .unwrap_or_else(|| self.error(ErrorKind::Value, "invalid expression"));

            expr_lhs = Expr::Binary(Box::new(BinExpr { lhs: expr_lhs, rhs, op }));
        }

        Some(expr_lhs)
    }

    // ---- statements -----------------------------------------------------------

    fn parse_decl(&mut self) -> Declare {
        let mut is_const = false;
        if self.current_kind() == Some(TokenKind::Const) {
            is_const = true;
            self.advance();
        }

        let type_token = self.current_token();
        let type_ = if type_token.kind == TokenKind::Ident && is_const {
            Type::new(PrimitiveType::Infer)
        } else {
            self.advance();
            Type::new(self.primitive_from_type_keyword(type_token.kind))
        };

        self.expect_one(TokenKind::Ident, "expected valid identifier");
        let ident = self.current_token();
        self.advance();

        self.expect_one(TokenKind::Equals, "expected `=`");
        self.advance();

        let expr = self.parse_expr(0).unwrap_or_else(|| self.error(ErrorKind::Syntax, "invalid expression"));

        Declare {
            ident,
            expr,
            type_: RefCell::new(type_),
            is_const,
        }
    }

    fn parse_exit(&mut self) -> Stmt {
        self.advance();
        self.expect_one(TokenKind::LeftParen, "expected `(`");
        self.advance();

        let expr = self.parse_expr(0).unwrap_or_else(|| self.error(ErrorKind::Syntax, "invalid expression"));

        self.expect_one(TokenKind::RightParen, "expected `)`");
        self.advance();

        Stmt::Exit(expr)
    }

    fn parse_scope(&mut self) -> Scope {
        if self.current_kind() == Some(TokenKind::Newline) {
            self.advance();
        }

        let start = self.loc();
        self.expect_one(TokenKind::LeftCurly, "expected '{'");
        self.advance();

        let mut scope = Scope::default();
        while let Some(stmt) = self.parse_statement() {
            let at_closer = self.current_kind() == Some(TokenKind::RightCurly);
            let terminator_free = matches!(stmt, Stmt::Empty | Stmt::If(_));
            scope.stmts.push(stmt);

            if !terminator_free && !at_closer {
                self.expect_one(TokenKind::Newline, "expected new line");
                self.advance();
            }

            if self.current_kind() == Some(TokenKind::RightCurly) {
                self.advance();
                return scope;
            }
        }

        if self.current.is_none() {
            self.diagnostics.error(ErrorKind::Syntax, "unclosed scope starting here", start);
        }
        if self.current_kind() == Some(TokenKind::RightCurly) {
            self.advance();
        }
        scope
    }

    fn parse_ifpred(&mut self) -> Option<IfPred> {
        match self.current_kind() {
            Some(TokenKind::Elif) => {
                self.advance();
                let expr = self
                    .parse_expr(0)
                    .unwrap_or_else(|| self.error(ErrorKind::Value, "not able to evaluate expression"));
                let scope = self.parse_scope();
                let next = self.parse_ifpred().map(Box::new);
                Some(IfPred::Elif { expr, scope, next })
            }
            Some(TokenKind::Else) => {
                self.advance();
                let scope = self.parse_scope();
                Some(IfPred::Else { scope })
            }
            _ => None,
        }
    }

    fn parse_if(&mut self) -> Stmt {
        self.advance();
        let expr = self
            .parse_expr(0)
            .unwrap_or_else(|| self.error(ErrorKind::Value, "not able to parse expression"));
        let scope = self.parse_scope();

        while self.current_kind() == Some(TokenKind::Newline) {
            self.advance();
        }

        let pred = self.parse_ifpred();
        Stmt::If(StmtIf { expr, scope, pred })
    }

    fn parse_while(&mut self) -> Stmt {
        self.advance();
        let expr = self
            .parse_expr(0)
            .unwrap_or_else(|| self.error(ErrorKind::Value, "not able to parse expression"));
        let scope = self.parse_scope();
        Stmt::While(StmtWhile { expr, scope })
    }

    fn parse_lvalue(&mut self) -> Term {
        self.expect_one(TokenKind::Ident, "expected identifier");
        let token = self.current_token();
        self.advance();

        let mut term = Term::new(TermKind::Ident { token, negative: false });
        if self.current_kind() == Some(TokenKind::LeftBracket) {
            self.advance();
            let index = self.parse_expr(0).unwrap_or_else(|| self.error(ErrorKind::Value, "expected index expression"));
            self.expect_one(TokenKind::RightBracket, "expected `]`");
            self.advance();
            term.index = Some(Box::new(index));
        }
        term
    }

    fn parse_reassign(&mut self) -> Reassign {
        let ident = self.parse_lvalue();

        match self.current_kind() {
            Some(TokenKind::Increment) => {
                self.advance();
                Reassign::Inc { ident }
            }
            Some(TokenKind::Decrement) => {
                self.advance();
                Reassign::Dec { ident }
            }
            _ => {
                self.expect_one(TokenKind::Equals, "expected '='");
                self.advance();
                let rvalue = self.parse_expr(0).unwrap_or_else(|| self.error(ErrorKind::Value, "expected expression"));
                Reassign::Eq { ident, rvalue }
            }
        }
    }

    fn parse_for_loop(&mut self) -> Stmt {
        self.advance();
        self.expect_one(TokenKind::LeftParen, "expected '('");
        self.advance();

        let ident_def = self.parse_decl();

        self.expect_one(TokenKind::Comma, "expected ','");
        self.advance();

        let condition = self.parse_expr(0).unwrap_or_else(|| self.error(ErrorKind::Syntax, "missing condition"));
        if !matches!(&condition, Expr::Binary(b) if b.op.kind.is_comparison()) {
            self.error(ErrorKind::Syntax, "invalid condition");
        }

        self.expect_one(TokenKind::Comma, "expected ','");
        self.advance();

        let ident_assign = self.parse_reassign();

        self.expect_one(TokenKind::RightParen, "expected ')'");
        self.advance();

        let scope = self.parse_scope();
        Stmt::For(Box::new(StmtFor {
            ident_def,
            condition,
            ident_assign,
            scope,
        }))
    }

    fn parse_do_while(&mut self) -> Stmt {
        self.advance();
        let scope = self.parse_scope();

        self.expect_one(TokenKind::While, "expected 'kim'");
        self.advance();

        let expr = self.parse_expr(0).unwrap_or_else(|| self.error(ErrorKind::Value, "invalid expression"));
        Stmt::DoWhile(StmtDoWhile { scope, expr })
    }

    fn parse_print(&mut self) -> Stmt {
        self.advance();
        self.expect_one(TokenKind::LeftParen, "expected '('");
        self.advance();

        let content = self.parse_expr(0).unwrap_or_else(|| self.error(ErrorKind::Syntax, "Invalid print argument"));

        self.expect_one(TokenKind::RightParen, "expected ')'");
        self.advance();

        Stmt::Print(StmtPrint {
            content,
            cont_type: Cell::new(PrimitiveType::Infer),
        })
    }

    fn parse_break(&mut self) -> Stmt {
        let token = self.current_token();
        self.advance();
        Stmt::Break(token)
    }

    fn parse_newline(&mut self) -> Stmt {
        self.advance();
        Stmt::Empty
    }

    fn parse_statement(&mut self) -> Option<Stmt> {
        let kind = self.current_kind()?;

        if kind == TokenKind::RightCurly {
            return Some(Stmt::Empty);
        }

        Some(match kind {
            TokenKind::Exit => self.parse_exit(),
            TokenKind::Print => self.parse_print(),
            TokenKind::InferDef | TokenKind::IntDef | TokenKind::BoolDef | TokenKind::CharDef | TokenKind::StrDef | TokenKind::Const => {
                Stmt::Declare(self.parse_decl())
            }
            TokenKind::LeftCurly => Stmt::Scope(self.parse_scope()),
            TokenKind::If => self.parse_if(),
            TokenKind::Ident => Stmt::Reassign(self.parse_reassign()),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for_loop(),
            TokenKind::Do => self.parse_do_while(),
            TokenKind::Break => self.parse_break(),
            TokenKind::Newline => self.parse_newline(),
            _ => self.error(ErrorKind::Syntax, "invalid statement start"),
        })
    }

    pub fn parse_program(mut self) -> Program {
        let mut program = Program { stmts: Vec::new() };
        while self.current.is_some() {
            let Some(stmt) = self.parse_statement() else { break };
            if !matches!(stmt, Stmt::Empty | Stmt::Scope(_) | Stmt::If(_)) && self.current.is_some() {
                self.expect_one(TokenKind::Newline, "expected new line");
                self.advance();
            }
            program.stmts.push(stmt);
        }
        program
    }
}
