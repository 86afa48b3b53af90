use std::{error::Error, path::Path};

use test_utils::{check_compilation, Expected};

const SRC_PATH: &str = "./demos/arithmetic.hdz";
const EXPECTED: Expected = Expected {
    stdout: "",
    stderr: "",
    exit_code: 14,
};

#[test]
fn compile_and_run_arithmetic() -> Result<(), Box<dyn Error>> {
    check_compilation(Path::new(SRC_PATH), EXPECTED)
}
