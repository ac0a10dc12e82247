//! ERRORR: multigroup covariance matrices.

use crate::core::condition::Condition;
use crate::core::field::Field;
use crate::core::group::Group;
use crate::core::module::{Module, Schema};
use crate::core::rule::Rule;
use crate::core::values::{FieldPath, Values, tokens};
use crate::modules::catalog::{NEUTRON_GROUPS, WEIGHT_FUNCTIONS};
use crate::modules::{float, int, material, unit_in, unit_out};

fn read_option(value: i64) -> Condition {
    Condition::equals("c7", "iread", value)
}

/// Energy bounds come as NEK + 1 values.
fn boundary_count(value: &str, values: &Values) -> bool {
    values
        .int(&FieldPath::new("c8", "nek"))
        .is_some_and(|nek| nek >= 0 && tokens(value).len() as i64 == nek + 1)
}

pub struct Errorr;

impl Schema for Errorr {
    fn groups(&self, _values: &Values) -> Vec<Group> {
        let energy_ranges = read_option(1).and(Condition::at_least("c8", "nek", 1));
        let user_groups = Condition::one_of("c2", "ign", &[1, 19]);

        vec![
            Group::new("c1", "I/O units")
                .reference("Page 261")
                .with(unit_in("nendf", "20").describe("Input ENDF tape"))
                .with(unit_in("npend", "21").describe("Input PENDF tape"))
                .with(unit_in("ngout", "0").describe("Input GENDF tape (0 = compute groups)"))
                .with(unit_out("nout", "33").describe("Output covariance tape"))
                .with(unit_in("nin", "0").describe("Input covariance tape (0 = none)"))
                .with(unit_in("nstan", "0").describe("Standards tape (0 = none)")),
            Group::new("c2", "Material and groups")
                .reference("Page 261")
                .with(material("matd", "125").describe("Material to process"))
                .with(
                    int("ign", "2")
                        .describe("Neutron group structure")
                        .choices(NEUTRON_GROUPS),
                )
                .with(
                    int("iwt", "6")
                        .describe("Weight function option")
                        .choices(WEIGHT_FUNCTIONS),
                )
                .with(int("iprint", "1").describe("Print option"))
                .with(int("irelco", "1").describe("Covariance form (1 relative)")),
            Group::new("c3", "Print and temperature")
                .reference("Page 262")
                .with(int("mprint", "0").describe("Group-averaging print option"))
                .with(float("tempin", "300.0").describe("Temperature (K)")),
            Group::new("c7", "Covariance options")
                .reference("Page 262")
                .with(
                    int("iread", "0")
                        .describe("MT source: 0 all, 1 listed, 2 cross-material pairs")
                        .rule(Rule::IntRange { min: 0, max: 2 }),
                )
                .with(int("mfcov", "33").describe("Covariance file (31, 33, 34, 35, 40)"))
                .with(int("irespr", "1").describe("Resonance parameter processing"))
                .with(int("legord", "1").describe("Legendre order for MF34"))
                .with(int("ifissp", "-1").describe("Fission spectrum subspace"))
                .with(float("efmean", "2.0e6").describe("Mean fission energy (eV)"))
                .with(float("dap", "0.0").describe("Scattering radius uncertainty")),
            Group::new("c8", "Listed reactions")
                .reference("Page 263")
                .active_if(read_option(1))
                .with(int("nmt", "1").describe("Number of MTs"))
                .with(int("nek", "0").describe("Number of derived energy ranges")),
            Group::new("c8a", "Reaction list")
                .reference("Page 263")
                .active_if(read_option(1))
                .with(
                    Field::new("mts", "102")
                        .describe("MT numbers; one per NMT")
                        .list()
                        .rule(Rule::count_of("c8", "nmt")),
                ),
            Group::new("c8b", "Derived energy bounds")
                .reference("Page 263")
                .active_if(energy_ranges.clone())
                .with(
                    Field::new("ek", "")
                        .describe("Energy bounds (eV); NEK + 1 values")
                        .list()
                        .rule(Rule::custom(boundary_count)),
                ),
            Group::new("c9", "Derived coefficients")
                .reference("Page 263")
                .active_if(energy_ranges)
                .with(Field::new("akxy", "").describe("Derived cross section coefficients").list()),
            Group::new("c10", "Cross-material pair")
                .reference("Page 263")
                .active_if(read_option(2))
                .with(int("mat1", "125").describe("First material"))
                .with(int("mt1", "102").describe("First reaction"))
                .with(int("mat2", "125").describe("Second material"))
                .with(int("mt2", "102").describe("Second reaction")),
            Group::terminator("c10_end", "0").active_if(read_option(2)),
            Group::new("c11", "Standards ratio")
                .reference("Page 264")
                .active_if(Condition::not_equals("c1", "nstan", 0))
                .with(int("matb", "0").describe("Material of the measured reaction"))
                .with(int("mtb", "0").describe("Measured reaction"))
                .with(int("matc", "0").describe("Material of the standard"))
                .with(int("mtc", "0").describe("Standard reaction")),
            Group::terminator("c11_end", "0").active_if(Condition::not_equals("c1", "nstan", 0)),
            Group::new("c12a", "User group count")
                .reference("Page 264")
                .active_if(user_groups.clone())
                .with(int("ngn", "0").describe("Number of groups")),
            Group::new("c12b", "User group bounds")
                .reference("Page 264")
                .active_if(user_groups)
                .with(Field::new("egn", "").describe("Group bounds (eV), ascending").list()),
            Group::new("c13", "Tabulated weight function")
                .reference("Page 264")
                .active_if(Condition::equals("c2", "iwt", 1))
                .with(Field::new("wght", "0.0 0.0").describe("TAB1 weight function").list()),
            Group::new("c13b", "Thermal/fission weight function")
                .reference("Page 265")
                .active_if(Condition::equals("c2", "iwt", 4))
                .with(float("eb", "0.0253").describe("Thermal break (eV)"))
                .with(float("tb", "0.0253").describe("Thermal temperature (eV)"))
                .with(float("ec", "8.2e5").describe("Fission break (eV)"))
                .with(float("tc", "1.27e6").describe("Fission temperature (eV)")),
        ]
    }
}

pub fn module() -> Module {
    Module::new("ERRORR", "errorr", Errorr)
        .with_description(
            "Produces multigroup covariance matrices from ENDF uncertainty data.",
        )
        .with_reference("NJOY2016 Manual, Section 12, Page 261")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_deck_text() {
        assert_eq!(
            module().serialize().expect("serialize"),
            "errorr\n20 21 0 33 0 0/\n125 2 6 1 1/\n0 300.0/\n0 33 1 1 -1 2.0e6 0.0/"
        );
    }

    #[test]
    fn pair_mode_emits_card_ten_and_terminator() {
        let mut errorr = module();
        errorr.set_value("c7", "iread", "2").expect("iread");
        assert!(
            errorr
                .serialize()
                .expect("serialize")
                .ends_with("2 33 1 1 -1 2.0e6 0.0/\n125 102 125 102/\n0/")
        );
    }

    /// Verifies the derived-range cards need both the listed mode and NEK > 0,
    /// and that the bound list must hold NEK + 1 values.
    #[test]
    fn energy_bounds_track_nek() {
        let mut errorr = module();
        errorr.set_value("c7", "iread", "1").expect("iread");
        let text = errorr.serialize().expect("serialize");
        assert!(text.ends_with("1 0/\n102/"));

        errorr.set_value("c8", "nek", "2").expect("nek");
        errorr.set_value("c8b", "ek", "1e-5 1e3").expect("ek");
        assert_eq!(errorr.invalid_fields(), vec![FieldPath::new("c8b", "ek")]);

        errorr.set_value("c8b", "ek", "1e-5 1e3 2e7").expect("ek");
        assert!(errorr.invalid_fields().is_empty());
    }

    #[test]
    fn weight_function_cards_follow_iwt() {
        let mut errorr = module();
        errorr.set_value("c2", "iwt", "4").expect("iwt");
        assert!(
            errorr
                .serialize()
                .expect("serialize")
                .ends_with("\n0.0253 0.0253 8.2e5 1.27e6/")
        );
    }
}
