//! The Hadzik (hdz) compiler: lexer, parser, type checker and code
//! generator for a small Slovak-dialect language that compiles to
//! FASM-flavoured x86-64 assembly.

pub mod ast;
pub mod cli;
pub mod codegen;
pub mod diagnostics;
pub mod driver;
pub mod lexer;
pub mod parser;
pub mod typechecker;
