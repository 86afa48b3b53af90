use std::{error::Error, path::Path};

use test_utils::check_failing_compilation;

const SRC_PATH: &str = "./demos/break_outside_loop.hdz";

#[test]
fn break_outside_a_loop_is_rejected() -> Result<(), Box<dyn Error>> {
    check_failing_compilation(Path::new(SRC_PATH))
}
