//! imgcheck library exports.
//!
//! The rule engine (`rules`, `mapping`, `image_spec`) has no dependency on
//! external tools. The harness (`oracle`, `cases`, `runner`) drives them
//! through the command templates in `config`.

pub mod cases;
pub mod common;
pub mod config;
pub mod image_spec;
pub mod mapping;
pub mod oracle;
pub mod preflight;
pub mod process;
pub mod rules;
pub mod runner;
pub mod timing;
