//! UI module for consistent CLI output
//!
//! Uses `cliclack` for interactive prompts and spinners, with automatic
//! fallback to plain output in CI/non-interactive environments.
//!
//! # Example
//!
//! ```rust,ignore
//! use kiln::ui::{self, UiContext, TaskSpinner};
//!
//! let ctx = UiContext::detect().with_auto_yes(args.yes);
//!
//! let mut spinner = TaskSpinner::new(&ctx);
//! spinner.start("Fetching paketo-buildpacks/go...");
//! // ... do work ...
//! spinner.stop("Built v1.2.0");
//!
//! if ui::confirm(&ctx, "Clear the cache?", false).await? {
//!     ui::step_ok(&ctx, "Cache cleared");
//! }
//! ```

mod context;
mod output;
mod progress;
mod prompts;
mod theme;

pub use context::UiContext;
pub use output::{remark, step_info, step_ok, step_ok_detail, step_warn_hint};
pub use progress::TaskSpinner;
pub use prompts::confirm;
pub use theme::{init_theme, KilnTheme};
