//! Core building blocks shared by every shop crate: layered settings,
//! the module lifecycle, and field-keyed validation errors.

pub mod module;
pub mod registry;
pub mod settings;
pub mod validation;

pub use module::{InitCtx, Module};
pub use registry::ModuleRegistry;
pub use validation::{FieldError, FieldErrors, NON_FIELD_ERRORS};
