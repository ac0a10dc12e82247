//! RECONR: reconstructs pointwise cross sections from resonance parameters
//! and writes a PENDF tape.

use crate::core::condition::Condition;
use crate::core::field::Field;
use crate::core::group::Group;
use crate::core::module::{Module, Schema};
use crate::core::rule::Rule;
use crate::core::values::{Bounds, Values};
use crate::modules::catalog::GRID_POINTS;
use crate::modules::{float, material, unit_in, unit_out};

const MATERIALS: Bounds = Bounds::new(1, 5);
const COMMENTS: Bounds = Bounds::new(0, 10);

pub struct Reconr;

impl Schema for Reconr {
    fn groups(&self, values: &Values) -> Vec<Group> {
        let nmat = values.count("c2", "nmat", MATERIALS);
        let mut groups = vec![
            Group::new("c1", "I/O configuration")
                .reference("Page 36")
                .with(unit_in("nendf", "20").describe("Input ENDF tape").reference("Page 36"))
                .with(unit_out("npend", "21").describe("Output PENDF tape").reference("Page 36")),
            Group::new("c2", "Run control")
                .reference("Page 36")
                .with(
                    Field::new("tlabel", "PENDF TAPE")
                        .describe("Label for the output tape")
                        .quoted()
                        .reference("Page 36"),
                )
                .with(
                    Field::new("nmat", nmat.to_string())
                        .describe("Number of materials to reconstruct")
                        .hidden()
                        .count(MATERIALS),
                ),
        ];

        for i in 1..=nmat {
            let c3 = format!("c3_{i}");
            let c4 = format!("c4_{i}");
            let ncards = values.count(&c3, &format!("ncards_{i}"), COMMENTS);

            groups.push(
                Group::new(&c3, format!("Material #{i}: selection"))
                    .reference("Page 36")
                    .with(material(format!("mat_{i}"), "125").describe("Material to process"))
                    .with(
                        Field::new(format!("ncards_{i}"), ncards.to_string())
                            .describe("Number of descriptive comment cards")
                            .count(COMMENTS),
                    )
                    .with(
                        Field::new(format!("ngrid_{i}"), "0")
                            .describe("Number of user energy grid points to add")
                            .rule(Rule::Int),
                    ),
            );
            groups.push(
                Group::new(&c4, format!("Material #{i}: precision"))
                    .reference("Page 37")
                    .with(float(format!("err_{i}"), "0.005").describe("Fractional reconstruction tolerance"))
                    .with(float(format!("tempr_{i}"), "0.0").describe("Reconstruction temperature (K)"))
                    .with(
                        Field::new(format!("errmax_{i}"), "")
                            .describe("Maximum tolerance; blank means 10 x ERR")
                            .rule(Rule::optional(Rule::Float))
                            .or_scaled(&c4, &format!("err_{i}"), 10.0),
                    )
                    .with(
                        Field::new(format!("errint_{i}"), "")
                            .describe("Integral tolerance per point; blank means ERR / 20000")
                            .rule(Rule::optional(Rule::Float))
                            .or_scaled(&c4, &format!("err_{i}"), 1.0 / 20000.0),
                    ),
            );
            for j in 1..=ncards {
                groups.push(
                    Group::new(format!("comment_{i}_{j}"), format!("Material #{i}: comment {j}"))
                        .reference("Page 37")
                        .with(
                            Field::new(format!("cards5_{i}_{j}"), "")
                                .describe("Comment text")
                                .quoted()
                                .or_else("Blank Comment"),
                        ),
                );
            }
            groups.push(
                Group::new(format!("c6_{i}"), format!("Material #{i}: user grid"))
                    .reference("Page 37")
                    .active_if(Condition::at_least(&c3, format!("ngrid_{i}"), 1))
                    .with(
                        Field::new(format!("enode_{i}"), "")
                            .describe("Energies (eV) forced into the grid")
                            .list()
                            .choices(GRID_POINTS)
                            .rule(Rule::count_of(&c3, format!("ngrid_{i}"))),
                    ),
            );
        }
        groups.push(Group::terminator("c_end", "0"));
        groups
    }
}

pub fn module() -> Module {
    Module::new("RECONR", "reconr", Reconr)
        .with_description(
            "Reconstructs resonance cross sections from resonance parameters and \
             linearizes all cross sections onto a common energy grid.",
        )
        .with_reference("NJOY2016 Manual, Section 4, Page 36")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_compute_blank_tolerances() {
        assert_eq!(
            module().serialize().expect("serialize"),
            "reconr\n20 21/\n'PENDF TAPE'/\n125 0 0/\n0.005 0.0 0.05 2.5e-7/\n0/"
        );
    }

    #[test]
    fn comment_cards_follow_count() {
        let mut reconr = module();
        reconr.set_value("c3_1", "ncards_1", "2").expect("ncards");
        reconr.set_value("comment_1_1", "cards5_1_1", "U-235 run").expect("comment");

        let text = reconr.serialize().expect("serialize");
        assert!(text.contains("125 2 0/\n"));
        assert!(text.contains("'U-235 run'/\n'Blank Comment'/"));
    }

    /// Verifies a saved project with comment cards on a second material
    /// loads back to the same deck text.
    #[test]
    fn saved_comments_of_second_material_reload() {
        use crate::core::deck::Deck;
        use crate::core::document::{self, ModuleRecord};

        let mut reconr = module();
        reconr.set_value("c2", "nmat", "2").expect("nmat");
        reconr.set_value("c3_2", "ncards_2", "2").expect("ncards_2");
        reconr.set_value("comment_2_1", "cards5_2_1", "second").expect("comment");
        let deck = Deck::from_modules(vec![reconr]);

        let json = serde_json::to_string(&document::capture(&deck)).expect("serialize");
        let records: Vec<ModuleRecord> = serde_json::from_str(&json).expect("parse");
        let (loaded, skipped) = document::hydrate(&records, &crate::modules::registry());

        assert!(skipped.is_empty());
        let rendered = loaded.render();
        assert!(rendered.errors.is_empty(), "{:?}", rendered.errors);
        assert_eq!(rendered, deck.render());
        assert!(rendered.text.contains("'second'/\n'Blank Comment'/\n"));
    }

    #[test]
    fn user_grid_appears_when_requested() {
        let mut reconr = module();
        reconr.set_value("c3_1", "ngrid_1", "2").expect("ngrid");
        reconr.set_value("c6_1", "enode_1", "0.0253, 2.0e7").expect("enode");

        let text = reconr.serialize().expect("serialize");
        assert!(text.contains("\n0.0253 2.0e7/\n0/"));
        assert!(reconr.invalid_fields().is_empty());
    }
}
