//! Built-in processing modules.
//!
//! Each module is a [`Schema`](crate::core::module::Schema) over its own card
//! layout. Group names follow the manual's card numbering (`c1`, `c2_1`, ...);
//! `c_gui` groups hold hidden counts that only drive the layout.

pub mod acer;
pub mod broadr;
pub mod catalog;
pub mod errorr;
pub mod gaspr;
pub mod heatr;
pub mod moder;
pub mod plotr;
pub mod purr;
pub mod reconr;
pub mod thermr;
pub mod unresr;
pub mod viewr;

use crate::core::field::Field;
use crate::core::registry::Registry;
use crate::core::rule::Rule;

/// Registry of every built-in module, in typical processing order.
pub fn registry() -> Registry {
    let mut registry = Registry::new();
    registry
        .register("MODER", moder::module)
        .register("RECONR", reconr::module)
        .register("BROADR", broadr::module)
        .register("HEATR", heatr::module)
        .register("THERMR", thermr::module)
        .register("UNRESR", unresr::module)
        .register("PURR", purr::module)
        .register("GASPR", gaspr::module)
        .register("ERRORR", errorr::module)
        .register("ACER", acer::module)
        .register("PLOTR", plotr::module)
        .register("VIEWR", viewr::module);
    registry
}

pub(crate) fn int(name: impl Into<String>, default: &str) -> Field {
    Field::new(name, default).rule(Rule::Int)
}

pub(crate) fn float(name: impl Into<String>, default: &str) -> Field {
    Field::new(name, default).rule(Rule::Float)
}

pub(crate) fn unit_in(name: impl Into<String>, default: &str) -> Field {
    int(name, default).input_file()
}

pub(crate) fn unit_out(name: impl Into<String>, default: &str) -> Field {
    int(name, default).output_file()
}

pub(crate) fn material(name: impl Into<String>, default: &str) -> Field {
    int(name, default).choices(catalog::MATERIALS)
}
