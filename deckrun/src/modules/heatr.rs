//! HEATR: heat production (KERMA) and damage energy cross sections.

use crate::core::group::Group;
use crate::core::module::{Module, Schema};
use crate::core::values::Values;
use crate::modules::{int, material, unit_in, unit_out};

pub struct Heatr;

impl Schema for Heatr {
    fn groups(&self, _values: &Values) -> Vec<Group> {
        vec![
            Group::new("c1", "I/O units")
                .reference("Page 225")
                .with(unit_in("nendf", "20").describe("Input ENDF tape"))
                .with(unit_in("nin", "22").describe("Input PENDF tape"))
                .with(unit_out("nout", "24").describe("Output PENDF tape with heating")),
            Group::new("c2", "Material control")
                .reference("Page 225")
                .with(material("matd", "125").describe("Material to process"))
                .with(int("npk", "0").describe("Number of partial KERMAs"))
                .with(int("nqa", "0").describe("Number of user Q values"))
                .with(int("ntemp", "0").describe("Number of temperatures (0 = all)"))
                .with(int("local", "0").describe("Local photon deposition (0 no, 1 yes)"))
                .with(int("iprint", "0").describe("Print option")),
            Group::terminator("c_end", "0"),
        ]
    }
}

pub fn module() -> Module {
    Module::new("HEATR", "heatr", Heatr)
        .with_description(
            "Computes heat production cross sections (KERMA factors) and radiation \
             damage energy production.",
        )
        .with_reference("NJOY2016 Manual, Section 16, Page 225")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_deck_text() {
        assert_eq!(
            module().serialize().expect("serialize"),
            "heatr\n20 22 24/\n125 0 0 0 0 0/\n0/"
        );
    }
}
