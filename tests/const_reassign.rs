use std::{error::Error, path::Path};

use test_utils::check_failing_compilation;

const SRC_PATH: &str = "./demos/const_reassign.hdz";

#[test]
fn reassigning_a_const_is_rejected() -> Result<(), Box<dyn Error>> {
    check_failing_compilation(Path::new(SRC_PATH))
}
