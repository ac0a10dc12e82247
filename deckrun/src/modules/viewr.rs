//! VIEWR: renders PLOTR output to PostScript.

use crate::core::group::Group;
use crate::core::module::{Module, Schema};
use crate::core::values::Values;
use crate::modules::{unit_in, unit_out};

pub struct Viewr;

impl Schema for Viewr {
    fn groups(&self, _values: &Values) -> Vec<Group> {
        vec![
            Group::new("c1", "I/O units")
                .reference("Page 303")
                .with(unit_in("nplot", "26").describe("Plot commands from PLOTR"))
                .with(unit_out("nps", "50").describe("Output PostScript file")),
        ]
    }
}

pub fn module() -> Module {
    Module::new("VIEWR", "viewr", Viewr)
        .with_description("Converts plot commands into a PostScript file.")
        .with_reference("NJOY2016 Manual, Section 19, Page 303")
}
