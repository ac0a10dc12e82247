//! GASPR: gas production cross sections.

use crate::core::group::Group;
use crate::core::module::{Module, Schema};
use crate::core::values::Values;
use crate::modules::{unit_in, unit_out};

pub struct Gaspr;

impl Schema for Gaspr {
    fn groups(&self, _values: &Values) -> Vec<Group> {
        vec![
            Group::new("c1", "I/O units")
                .reference("Page 724")
                .with(unit_in("nendf", "20").describe("Input ENDF tape"))
                .with(unit_in("nin", "21").describe("Input PENDF tape"))
                .with(unit_out("nout", "22").describe("Output PENDF tape with MT 203-207")),
        ]
    }
}

pub fn module() -> Module {
    Module::new("GASPR", "gaspr", Gaspr)
        .with_description(
            "Adds gas production (hydrogen and helium isotopes) cross sections to a \
             PENDF tape.",
        )
        .with_reference("NJOY2016 Manual, Section 25, Page 723")
}
