//! Lowering of checked Bismuth programs.
//!
//! [`lower`] consumes the attributes of every checking pass (bundled as
//! [`bis_types::Checked`]) and produces an [`ir::Module`]: record layouts,
//! functions with explicit dictionary parameters, instance constructors and
//! the globals that name them. Types are erased; interface evidence becomes
//! ordinary values passed ahead of each call's arguments.

pub mod ir;
mod lower;

pub use lower::lower;
