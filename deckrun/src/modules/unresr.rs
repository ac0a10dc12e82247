//! UNRESR: effective self-shielded cross sections in the unresolved range.

use crate::core::field::Field;
use crate::core::group::Group;
use crate::core::module::{Module, Schema};
use crate::core::rule::Rule;
use crate::core::values::Values;
use crate::modules::{int, material, unit_in, unit_out};

pub struct Unresr;

impl Schema for Unresr {
    fn groups(&self, _values: &Values) -> Vec<Group> {
        vec![
            Group::new("c1", "I/O units")
                .reference("Page 67")
                .with(unit_in("nendf", "20").describe("Input ENDF tape"))
                .with(unit_in("nin", "22").describe("Input PENDF tape"))
                .with(unit_out("nout", "23").describe("Output PENDF tape")),
            Group::new("c2", "Material")
                .reference("Page 67")
                .with(material("matd", "125").describe("Material to process"))
                .with(int("ntemp", "1").describe("Number of temperatures"))
                .with(int("nsigz", "1").describe("Number of sigma-zero values"))
                .with(int("nprint", "1").describe("Print option")),
            Group::new("c3", "Temperatures").reference("Page 67").with(
                Field::new("temp", "293.6")
                    .describe("Temperatures (K); one per NTEMP")
                    .list()
                    .rule(Rule::count_of("c2", "ntemp")),
            ),
            Group::new("c4", "Sigma zeros").reference("Page 67").with(
                Field::new("sigz", "1.0e10")
                    .describe("Background cross sections (barns); one per NSIGZ")
                    .list()
                    .rule(Rule::count_of("c2", "nsigz")),
            ),
            Group::terminator("c_end", "0"),
        ]
    }
}

pub fn module() -> Module {
    Module::new("UNRESR", "unresr", Unresr)
        .with_description(
            "Produces effective self-shielded pointwise cross sections in the \
             unresolved resonance range.",
        )
        .with_reference("NJOY2016 Manual, Section 7, Page 67")
}
