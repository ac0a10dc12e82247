//! MODER: converts tapes between ASCII and blocked binary, optionally
//! merging selected materials into one tape.

use crate::core::condition::Condition;
use crate::core::field::Field;
use crate::core::group::Group;
use crate::core::module::{Module, Schema};
use crate::core::values::{Bounds, Values};
use crate::modules::{material, unit_in, unit_out};

const MATERIALS: Bounds = Bounds::new(1, 10);

/// Input units 1..=19 (either sign) select material-by-material copying.
fn selective() -> Condition {
    Condition::abs_between("c1", "nin", 1, 19)
}

pub struct Moder;

impl Schema for Moder {
    fn groups(&self, values: &Values) -> Vec<Group> {
        let count = values.count("c2", "num_mats", MATERIALS);
        let mut groups = vec![
            Group::new("c1", "I/O configuration")
                .reference("Page 28")
                .with(
                    unit_in("nin", "20")
                        .describe("Input unit; 1..19 in magnitude selects materials individually")
                        .reference("Page 28"),
                )
                .with(
                    unit_out("nout", "21")
                        .describe("Output unit; negative for binary, positive for ASCII")
                        .reference("Page 28"),
                ),
            Group::new("c2", "Output tape label")
                .reference("Page 29")
                .active_if(selective())
                .with(
                    Field::new("tpid", "NJOY TAPE")
                        .describe("Tape identification, up to 66 characters")
                        .quoted()
                        .reference("Page 29"),
                )
                .with(
                    Field::new("num_mats", count.to_string())
                        .describe("Number of materials to copy")
                        .hidden()
                        .count(MATERIALS),
                ),
        ];
        for i in 1..=count {
            groups.push(
                Group::new(format!("c3_{i}"), format!("Material copy #{i}"))
                    .reference("Page 29")
                    .active_if(selective())
                    .with(
                        unit_in(format!("nin_{i}"), "20")
                            .describe("Unit of the tape holding the material")
                            .reference("Page 29"),
                    )
                    .with(
                        material(format!("matd_{i}"), "125")
                            .describe("Material to copy")
                            .reference("Page 29"),
                    ),
            );
        }
        groups.push(Group::terminator("c_end", "0").active_if(selective()));
        groups
    }
}

pub fn module() -> Module {
    Module::new("MODER", "moder", Moder)
        .with_description(
            "Converts ENDF/PENDF/GENDF tapes between ASCII and binary mode and can \
             merge selected materials from several tapes.",
        )
        .with_reference("NJOY2016 Manual, Section 3, Page 28")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_conversion_writes_units_only() {
        assert_eq!(module().serialize().expect("serialize"), "moder\n20 21/");
    }

    #[test]
    fn selective_mode_lists_materials_and_terminates() {
        let mut moder = module();
        moder.set_value("c1", "nin", "1").expect("nin");
        moder.set_value("c2", "num_mats", "2").expect("count");
        moder.set_value("c3_2", "matd_2", "9228").expect("matd");

        assert_eq!(
            moder.serialize().expect("serialize"),
            "moder\n1 21/\n'NJOY TAPE'/\n20 125/\n20 9228/\n0/"
        );
    }
}
