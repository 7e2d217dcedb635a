/*!
Everything that touches the external `studio` binary.

  runner.rs  StudioRunner trait + ProcessRunner (tokio child process)
  format.rs  failure text, placeholder fallback, preview URL extraction

Callers build an argument vector, hand it to a runner, and render the
resulting `CliOutput` with the helpers in `format`. A non-zero exit code is
an ordinary outcome here, not an error.
*/

pub mod format;
pub mod runner;

pub use format::{extract_preview_url, format_cli_failure, text_or};
pub use runner::{CliOutput, ProcessRunner, StudioRunner};
