use std::{
    error::Error,
    io,
    path::Path,
    process::{Command, Output},
    str,
};

const HDZC_PATH: &str = "./target/debug/hdzc";
const OUTPUT_PATH: &str = "./output";

pub struct Expected<'a> {
    pub stdout: &'a str,
    pub stderr: &'a str,
    pub exit_code: i32,
}

impl<'a> Expected<'a> {
    fn assert_matches(self, output: &Output) -> Result<(), Box<dyn Error>> {
        assert_eq!(str::from_utf8(&output.stdout)?, self.stdout);
        assert_eq!(str::from_utf8(&output.stderr)?, self.stderr);
        assert_eq!(output.status.code(), Some(self.exit_code));
        Ok(())
    }
}

fn run_compiler(src_path: &Path, out_path: &Path) -> Result<Output, io::Error> {
    Command::new(HDZC_PATH).arg(src_path).arg("-n").arg(out_path).output()
}

/// Compiles `src_path`, then runs the produced binary and asserts its
/// stdout, stderr and exit code match `expected`.
pub fn check_compilation(src_path: &Path, expected: Expected) -> Result<(), Box<dyn Error>> {
    let out_path = Path::new(OUTPUT_PATH).join(src_path.file_stem().unwrap());

    let compile_output = run_compiler(src_path, &out_path)?;
    let compile_stdout = str::from_utf8(&compile_output.stdout)?;
    let compile_stderr = str::from_utf8(&compile_output.stderr)?;

    println!("{compile_stdout}");
    assert!(compile_stderr.is_empty(), "{}", compile_stderr);
    assert!(
        compile_output.status.success(),
        "hdzc exited with status {:?}",
        compile_output.status.code()
    );

    let output = Command::new(&out_path).output()?;

    expected.assert_matches(&output)
}

/// Asserts that compiling `src_path` fails (the compiler exits non-zero
/// before ever producing a binary to run).
pub fn check_failing_compilation(src_path: &Path) -> Result<(), Box<dyn Error>> {
    let out_path = Path::new(OUTPUT_PATH).join(src_path.file_stem().unwrap());

    let compile_output = run_compiler(src_path, &out_path)?;

    println!("{compile_output:?}");
    assert!(
        !compile_output.status.success(),
        "hdzc should have rejected {}",
        src_path.display()
    );

    Ok(())
}
