use std::{error::Error, path::Path};

use test_utils::{check_compilation, Expected};

const SRC_PATH: &str = "./demos/empty_program.hdz";
const EXPECTED: Expected = Expected {
    stdout: "",
    stderr: "",
    exit_code: 0,
};

#[test]
fn compile_and_run_empty_program() -> Result<(), Box<dyn Error>> {
    check_compilation(Path::new(SRC_PATH), EXPECTED)
}
