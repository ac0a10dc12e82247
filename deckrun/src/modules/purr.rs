//! PURR: probability tables for the unresolved resonance range.

use crate::core::field::Field;
use crate::core::group::Group;
use crate::core::module::{Module, Schema};
use crate::core::rule::Rule;
use crate::core::values::Values;
use crate::modules::{int, material, unit_in, unit_out};

pub struct Purr;

impl Schema for Purr {
    fn groups(&self, _values: &Values) -> Vec<Group> {
        vec![
            Group::new("c1", "I/O units")
                .reference("Page 642")
                .with(unit_in("nendf", "20").describe("Input ENDF tape (unresolved parameters)"))
                .with(unit_in("nin", "21").describe("Input PENDF tape"))
                .with(unit_out("nout", "22").describe("Output PENDF tape with probability tables")),
            Group::new("c2", "Processing options")
                .reference("Page 642")
                .with(material("matd", "125").describe("Material to process"))
                .with(int("ntemp", "1").describe("Number of temperatures on the PENDF tape"))
                .with(int("nsigz", "1").describe("Number of sigma-zero values"))
                .with(int("nbin", "20").describe("Number of probability bins"))
                .with(int("nladr", "32").describe("Number of resonance ladders"))
                .with(int("iprint", "1").describe("Print option"))
                .with(int("nunx", "0").describe("Energy points to process (0 = all)")),
            Group::new("c3", "Temperatures").reference("Page 642").with(
                Field::new("temp", "293.6")
                    .describe("Temperatures (K); must match the PENDF tape")
                    .list()
                    .rule(Rule::count_of("c2", "ntemp")),
            ),
            Group::new("c4", "Sigma zeros").reference("Page 642").with(
                Field::new("sigz", "1.0E10")
                    .describe("Background cross sections, infinity first")
                    .list()
                    .rule(Rule::count_of("c2", "nsigz")),
            ),
            Group::terminator("c_end", "0"),
        ]
    }
}

pub fn module() -> Module {
    Module::new("PURR", "purr", Purr)
        .with_description(
            "Generates unresolved-range probability tables from random resonance \
             ladders for continuous-energy Monte Carlo self-shielding.",
        )
        .with_reference("NJOY2016 Manual, Section 23, Page 635")
}
