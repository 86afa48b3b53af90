use std::{error::Error, path::Path};

use test_utils::{check_compilation, Expected};

const SRC_PATH: &str = "./demos/if_else.hdz";
const EXPECTED: Expected = Expected {
    stdout: "",
    stderr: "",
    exit_code: 1,
};

#[test]
fn compile_and_run_if_else() -> Result<(), Box<dyn Error>> {
    check_compilation(Path::new(SRC_PATH), EXPECTED)
}
