pub(crate) mod narrate;
pub(crate) mod run;

use std::path::Path;

use dioph_core::Verdict;

use crate::config::FileConfig;
use crate::{ExecArgs, NarrateArgs, OutputFormat};

/// `run` followed by `narrate`. Narration is skipped when execution
/// failed; otherwise the exit code is the worse of the two.
pub(crate) fn cmd_all(
    root: &Path,
    config: &FileConfig,
    exec: &ExecArgs,
    narrate: &NarrateArgs,
    strict: bool,
    output: OutputFormat,
    quiet: bool,
) -> i32 {
    let (run_code, verdict) = run::run_and_verify(root, config, exec, strict, output, quiet);
    match verdict {
        None | Some(Verdict::Failed) => {
            tracing::error!("skipping narration: execution did not produce the required results");
            run_code
        }
        Some(_) => {
            if output == OutputFormat::Text && !quiet {
                println!();
            }
            let narrate_code = narrate::cmd_narrate(root, config, narrate, output, quiet);
            run_code.max(narrate_code)
        }
    }
}
