//! CLI argument parsing for `hdzc`.

use std::path::PathBuf;

use clap::Parser;

/// `hdzc <path>.hdz [flags]`
#[derive(Parser, Debug)]
#[command(author, version, about = "Compiler for the Hadzik (hdz) language")]
pub struct Cli {
    /// Path to the `.hdz` source file to compile.
    pub path: PathBuf,

    /// Localise error-kind names to their Slovak dialect spelling.
    #[arg(short = 's', long = "dialect")]
    pub dialect: bool,

    /// After a successful compile, assemble, link, run the binary and
    /// report its exit code (mod 255).
    #[arg(short = 'r', long = "run")]
    pub run: bool,

    /// Output path for the produced binary. Defaults to the input path
    /// with `.hdz` stripped.
    #[arg(short = 'n', long = "output")]
    pub output: Option<PathBuf>,

    /// Verbose debug dump of tokens, AST and stack state.
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,
}

impl Cli {
    pub fn init() -> Self {
        Cli::parse()
    }

    /// The assembly/object/binary output path, stripping `.hdz` from the
    /// input when `-n` wasn't given.
    pub fn resolve_output(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            let input = self.path.to_string_lossy();
            match input.strip_suffix(".hdz") {
                Some(stripped) => PathBuf::from(stripped),
                None => self.path.clone(),
            }
        })
    }
}
