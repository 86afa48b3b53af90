use std::{error::Error, path::Path};

use test_utils::{check_compilation, Expected};

const SRC_PATH: &str = "./demos/string_print.hdz";
const EXPECTED: Expected = Expected {
    stdout: "Hi",
    stderr: "",
    exit_code: 0,
};

#[test]
fn compile_and_run_string_print() -> Result<(), Box<dyn Error>> {
    check_compilation(Path::new(SRC_PATH), EXPECTED)
}
