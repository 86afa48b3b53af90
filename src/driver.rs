//! Wires the four compiler stages together and drives the external
//! assemble/link/run steps: load, canonicalize, run each stage, then act
//! on the flag-selected output.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info};

use crate::ast::Program;
use crate::cli::Cli;
use crate::codegen::Codegen;
use crate::diagnostics::Diagnostics;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::typechecker::TypeChecker;

/// Runs the full pipeline for the file named by `cli.path`. Returns the
/// process exit code: 0 on a clean compile (or the `-r` run's own exit code,
/// reduced mod 255), non-zero for driver-level failures (I/O, assemble/link).
pub fn run(cli: &Cli) -> i32 {
    if cli.path.extension().and_then(|ext| ext.to_str()) != Some("hdz") {
        eprintln!("hdzc: expected a `.hdz` source file, got {}", cli.path.display());
        return 1;
    }

    let source = match fs::read_to_string(&cli.path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("hdzc: could not read {}: {err}", cli.path.display());
            return 1;
        }
    };

    let canonical = fs::canonicalize(&cli.path).unwrap_or_else(|_| cli.path.clone());
    info!("compiling {}", canonical.display());

    let diagnostics = Diagnostics::new(canonical.display().to_string(), source.clone(), cli.dialect, cli.debug);

    info!("lexing");
    let tokens = Lexer::new(&source, &diagnostics).tokenize();
    if cli.debug {
        debug!("tokens: {tokens:#?}");
    }

    info!("parsing");
    let program: Program = Parser::new(tokens, &diagnostics).parse_program();
    if cli.debug {
        debug!("ast: {program:#?}");
    }

    info!("type checking");
    let mut checker = TypeChecker::new(&diagnostics);
    checker.check_program(&program);

    info!("generating code");
    let asm = Codegen::new(&diagnostics).gen_program(&program);

    let output = cli.resolve_output();
    let asm_path = output.with_extension("asm");
    if let Err(err) = fs::write(&asm_path, &asm) {
        eprintln!("hdzc: could not write {}: {err}", asm_path.display());
        return 1;
    }

    match assemble_and_link(&asm_path, &output) {
        Ok(()) => info!("wrote {}", output.display()),
        Err(err) => {
            eprintln!("hdzc: {err}");
            return 1;
        }
    }

    if cli.run {
        return run_binary(&output);
    }

    0
}

/// Invokes `fasm` to assemble the generated source straight into the final
/// binary. The emitted assembly opens with `format ELF64 executable 3`, so
/// `fasm`'s own output is already a complete, linked ELF64 executable —
/// there is no intermediate object file and no separate link step.
fn assemble_and_link(asm_path: &Path, output: &Path) -> Result<(), String> {
    info!("assembling");
    let fasm_status = Command::new("fasm")
        .arg(asm_path)
        .arg(output)
        .status()
        .map_err(|err| format!("failed to launch fasm: {err}"))?;
    if !fasm_status.success() {
        return Err(format!("fasm exited with {fasm_status}"));
    }

    Ok(())
}

/// Runs the freshly linked binary and reports its exit code for the `-r`
/// flag, reduced mod 255.
fn run_binary(path: &PathBuf) -> i32 {
    match Command::new(path).status() {
        Ok(status) => {
            let code = status.code().unwrap_or(1);
            info!("{} exited with {code}", path.display());
            code.rem_euclid(255)
        }
        Err(err) => {
            eprintln!("hdzc: could not run {}: {err}", path.display());
            1
        }
    }
}
