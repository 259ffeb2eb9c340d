//! Terminal output for the CLI
//!
//! Interactive terminals get spinners and symbols; CI and pipes get plain
//! `[OK]` / `[WARN]` lines that read well in build logs.

mod context;
mod output;
mod progress;

pub use context::UiContext;
pub use output::{key_value, key_value_status, remark, step_ok, step_warn, step_warn_hint};
pub use progress::TaskSpinner;
