//! Safety checks to prevent accidental input clobbering.
//!
//! The matcher and merge binaries overwrite their output paths, so both
//! validate that the output is not one of the input files first.

use anyhow::{bail, Result};
use std::path::Path;

/// Validates that an output path does not collide with any input path.
pub fn ensure_output_distinct(output: &Path, inputs: &[&Path]) -> Result<()> {
    for input in inputs {
        if output == *input {
            bail!(
                "output '{}' would overwrite input '{}'",
                output.display(),
                input.display()
            );
        }
    }
    Ok(())
}
