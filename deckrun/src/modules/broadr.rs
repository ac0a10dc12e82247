//! BROADR: Doppler-broadens and thins pointwise cross sections.

use crate::core::field::Field;
use crate::core::group::Group;
use crate::core::module::{Module, Schema};
use crate::core::rule::Rule;
use crate::core::values::{Bounds, Values};
use crate::modules::{float, int, material, unit_in, unit_out};

const MATERIALS: Bounds = Bounds::new(1, 10);

pub struct Broadr;

impl Schema for Broadr {
    fn groups(&self, values: &Values) -> Vec<Group> {
        let nmat = values.count("c_gui", "nmat", MATERIALS);
        let mut groups = vec![
            Group::new("c1", "I/O units")
                .reference("Page 82")
                .with(unit_in("nendf", "20").describe("Input ENDF tape"))
                .with(unit_in("nin", "21").describe("Input PENDF tape"))
                .with(unit_out("nout", "22").describe("Output PENDF tape")),
            Group::new("c_gui", "Material count").with(
                Field::new("nmat", nmat.to_string())
                    .describe("Number of materials to broaden")
                    .hidden()
                    .count(MATERIALS),
            ),
        ];
        for i in 1..=nmat {
            let c2 = format!("c2_{i}");
            groups.push(
                Group::new(&c2, format!("Material #{i}: controls"))
                    .reference("Page 82")
                    .with(material(format!("mat1_{i}"), "125").describe("Material to broaden"))
                    .with(int(format!("ntemp2_{i}"), "1").describe("Number of final temperatures"))
                    .with(int(format!("istart_{i}"), "0").describe("Restart option (0 = new run)"))
                    .with(int(format!("istrap_{i}"), "0").describe("Bootstrap option"))
                    .with(
                        float(format!("temp1_{i}"), "0.0")
                            .describe("Starting temperature on the input tape (K)")
                            .or_else("0.0"),
                    ),
            );
            groups.push(
                Group::new(format!("c3_{i}"), format!("Material #{i}: tolerances"))
                    .reference("Page 82")
                    .with(float(format!("errthn_{i}"), "0.005").describe("Fractional thinning tolerance"))
                    .with(
                        float(format!("thnmax_{i}"), "1e6")
                            .describe("Maximum energy for broadening and thinning (eV)")
                            .or_else("1e6"),
                    )
                    .with(
                        Field::new(format!("errint_{i}"), "")
                            .describe("Integral tolerance; blank means 0")
                            .rule(Rule::optional(Rule::Float))
                            .or_else("0.0"),
                    )
                    .with(
                        float(format!("thn1_{i}"), "0.0")
                            .describe("Thinning tolerance for thermal energies")
                            .or_else("0.0"),
                    ),
            );
            groups.push(
                Group::new(format!("c4_{i}"), format!("Material #{i}: temperatures"))
                    .reference("Page 83")
                    .with(
                        Field::new(format!("temp_{i}"), "293.6")
                            .describe("Final temperatures (K); one per NTEMP2")
                            .list()
                            .rule(Rule::count_of(&c2, format!("ntemp2_{i}"))),
                    ),
            );
        }
        groups.push(Group::terminator("c_end", "0"));
        groups
    }
}

pub fn module() -> Module {
    Module::new("BROADR", "broadr", Broadr)
        .with_description(
            "Doppler-broadens pointwise cross sections to higher temperatures and \
             thins the resulting grid.",
        )
        .with_reference("NJOY2016 Manual, Section 5, Page 82")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_deck_text() {
        assert_eq!(
            module().serialize().expect("serialize"),
            "broadr\n20 21 22/\n125 1 0 0 0.0/\n0.005 1e6 0.0 0.0/\n293.6/\n0/"
        );
    }

    /// Verifies the temperature list is checked against NTEMP2 in both
    /// directions.
    #[test]
    fn temperature_count_must_match() {
        let mut broadr = module();
        broadr.set_value("c2_1", "ntemp2_1", "3").expect("ntemp2");
        assert_eq!(broadr.invalid_fields().len(), 1);

        broadr.set_value("c4_1", "temp_1", "300 600 900").expect("temps");
        assert!(broadr.invalid_fields().is_empty());
    }

    #[test]
    fn second_material_copies_first_forward() {
        let mut broadr = module();
        broadr.set_value("c2_1", "mat1_1", "9228").expect("mat");
        broadr.set_value("c_gui", "nmat", "2").expect("nmat");

        assert_eq!(broadr.field("c2_1", "mat1_1").expect("mat1_1").value, "9228");
        assert_eq!(broadr.field("c2_2", "mat1_2").expect("mat1_2").value, "125");
        assert_eq!(
            broadr.serialize().expect("serialize").matches("293.6/").count(),
            2
        );
    }
}
