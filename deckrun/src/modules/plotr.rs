//! PLOTR: cross-section plot commands for VIEWR.

use crate::core::field::Field;
use crate::core::group::Group;
use crate::core::module::{Module, Schema};
use crate::core::values::Values;
use crate::modules::catalog::REACTIONS;
use crate::modules::{float, int, material, unit_in, unit_out};

pub struct Plotr;

impl Schema for Plotr {
    fn groups(&self, _values: &Values) -> Vec<Group> {
        vec![
            Group::new("c1", "I/O units")
                .reference("Page 273")
                .with(int("nplt0", "0").describe("Leading control token"))
                .with(unit_in("lorig", "21").describe("Input data tape (e.g. PENDF)"))
                .with(unit_out("lplot", "26").describe("Output plot file")),
            Group::new("c2", "Plot configuration")
                .reference("Page 273")
                .with(int("itype", "1").describe("Plot type (1 log-log, 2 log-lin, ...)")),
            Group::new("c3", "Curve 1")
                .reference("Page 274")
                .with(material("mat", "125").describe("Material"))
                .with(int("mf", "3").describe("ENDF file (3 = cross sections)"))
                .with(int("mt", "1").describe("Reaction").choices(REACTIONS))
                .with(float("temp", "293.6").describe("Temperature (K)")),
            Group::new("c4", "Title")
                .reference("Page 275")
                .with(Field::new("title", "CROSS SECTION").describe("Plot title").quoted()),
            Group::terminator("c_end", "0"),
        ]
    }
}

pub fn module() -> Module {
    Module::new("PLOTR", "plotr", Plotr)
        .with_description("Prepares cross-section plots from ENDF or PENDF data.")
        .with_reference("NJOY2016 Manual, Section 18, Page 273")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_deck_text() {
        assert_eq!(
            module().serialize().expect("serialize"),
            "plotr\n0 21 26/\n1/\n125 3 1 293.6/\n'CROSS SECTION'/\n0/"
        );
    }
}
