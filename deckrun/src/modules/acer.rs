//! ACER: ACE-format libraries for continuous-energy Monte Carlo codes.
//!
//! `c2.iopt` selects one of several mutually exclusive card branches; each
//! branch's groups are present in every layout and gated by activation so
//! switching modes keeps the values of the inactive branches.

use crate::core::condition::Condition;
use crate::core::field::Field;
use crate::core::group::Group;
use crate::core::module::{Module, Schema};
use crate::core::rule::Rule;
use crate::core::values::{Bounds, Values};
use crate::modules::{float, int, material, unit_in, unit_out};

const EXTRA_PAIRS: Bounds = Bounds::new(0, 16);
const ATOMS: Bounds = Bounds::new(3, 16);

pub const FAST: i64 = 1;
pub const THERMAL: i64 = 2;
pub const DOSIMETRY: i64 = 3;
pub const PHOTOATOMIC: i64 = 4;
pub const PHOTONUCLEAR: i64 = 5;

fn mode(iopt: i64) -> Condition {
    Condition::equals("c2", "iopt", iopt)
}

pub struct Acer;

impl Schema for Acer {
    fn groups(&self, values: &Values) -> Vec<Group> {
        let nxtra = values.count("c2", "nxtra", EXTRA_PAIRS);
        let nza = values.count("c8_therm", "nza", ATOMS);
        let thinning = values.lookup("c7_fast_gui", "thinning").map(str::trim) == Some("1");

        let mut groups = vec![
            Group::new("c1", "I/O units")
                .reference("Page 522")
                .with(unit_in("nendf", "20").describe("Input ENDF tape"))
                .with(unit_in("npendf", "21").describe("Input PENDF tape"))
                .with(unit_in("ngend", "0").describe("Input multigroup photon tape (0 = none)"))
                .with(unit_out("nace", "26").describe("Output ACE file"))
                .with(unit_out("ndir", "27").describe("Output xsdir fragment")),
            Group::new("c2", "Processing options")
                .reference("Page 522")
                .with(
                    int("iopt", "1")
                        .describe("Run mode: 1 fast, 2 thermal, 3 dosimetry, 4 photoatomic, 5 photonuclear, 7 check")
                        .rule(Rule::IntRange { min: 1, max: 7 }),
                )
                .with(int("iprint", "2").describe("Print option"))
                .with(int("itype", "1").describe("ACE output type (1 ASCII)"))
                .with(float("suff", "0.80").describe("Table suffix"))
                .with(
                    Field::new("nxtra", nxtra.to_string())
                        .describe("Number of IZ/AW pairs to read")
                        .count(EXTRA_PAIRS),
                ),
            Group::new("c3", "Library header")
                .reference("Page 523")
                .with(Field::new("hk", "NJOY PROCESSED DATA").describe("Descriptive header").quoted()),
        ];

        for i in 1..=nxtra {
            groups.push(
                Group::new(format!("c4_{i}"), format!("IZ/AW pair #{i}"))
                    .reference("Page 523")
                    .with(int(format!("iz_{i}"), "0").describe("ZA of the extra nuclide"))
                    .with(float(format!("aw_{i}"), "0.0").describe("Atomic weight ratio")),
            );
        }

        groups.push(
            Group::new("c5_fast", "Fast: material")
                .reference("Page 523")
                .active_if(mode(FAST))
                .with(material("matd", "125").describe("Material to process"))
                .with(float("tempd", "293.6").describe("Temperature (K)")),
        );
        groups.push(
            Group::new("c6_fast", "Fast: physics flags")
                .reference("Page 523")
                .active_if(mode(FAST))
                .with(int("newfor", "1").describe("Use law 61 energy-angle data"))
                .with(int("iopp", "1").describe("Detailed photon production"))
                .with(int("ismooth", "1").describe("Smooth spectra")),
        );
        groups.push(
            Group::new("c7_fast_gui", "Fast: grid thinning toggle")
                .active_if(mode(FAST))
                .with(
                    Field::new("thinning", "0")
                        .describe("1 enables card 7 grid thinning")
                        .rule(Rule::OneOf(vec![0, 1]))
                        .hidden()
                        .structural(),
                ),
        );
        if thinning {
            groups.push(
                Group::new("c7_fast", "Fast: grid thinning")
                    .reference("Page 523")
                    .active_if(mode(FAST))
                    .with(float("thin1", "0.005").describe("Reconstruction tolerance"))
                    .with(float("thin2", "1.0e6").describe("Thinning threshold (eV)"))
                    .with(int("thin3", "2").describe("Thinning type (2 integral)")),
            );
        }

        groups.push(
            Group::new("c8_therm", "Thermal: configuration")
                .reference("Page 528")
                .active_if(mode(THERMAL))
                .with(material("matd", "0").describe("Thermal material"))
                .with(float("tempd", "293.6").describe("Temperature (K)"))
                .with(Field::new("tname", "lwtr").describe("Thermal table name").quoted())
                .with(
                    Field::new("nza", nza.to_string())
                        .describe("Number of moderator atom ZA values")
                        .count(ATOMS),
                ),
        );
        let mut atoms = Group::new("c8a_therm", "Thermal: moderator atoms")
            .reference("Page 528")
            .active_if(mode(THERMAL));
        for i in 1..=nza {
            atoms = atoms.with(int(format!("iza_{i}"), "0").describe(format!("Moderator ZA #{i}")));
        }
        groups.push(atoms);
        groups.push(
            Group::new("c9_therm", "Thermal: physics flags")
                .reference("Page 528")
                .active_if(mode(THERMAL))
                .with(int("mti", "222").describe("Inelastic MT"))
                .with(int("nbint", "8").describe("Number of angular bins"))
                .with(int("mtem", "1").describe("Elastic energies option"))
                .with(int("ielas", "0").describe("Elastic MT (0 none)"))
                .with(int("nmix", "1").describe("Number of atom types in mixed moderator"))
                .with(float("emax", "4.0").describe("Maximum thermal energy (eV)"))
                .with(int("iwt", "0").describe("Weighting option")),
        );

        groups.push(
            Group::new("c10_dos", "Dosimetry")
                .reference("Page 530")
                .active_if(mode(DOSIMETRY))
                .with(int("matd", "0").describe("Material"))
                .with(float("tempd", "300.0").describe("Temperature (K)")),
        );
        groups.push(
            Group::new("c11_photo", "Photoatomic")
                .reference("Page 530")
                .active_if(mode(PHOTOATOMIC))
                .with(int("matd", "0").describe("Material (Z * 1000)")),
        );
        groups.push(
            Group::new("c12_pnuc", "Photonuclear")
                .reference("Page 530")
                .active_if(mode(PHOTONUCLEAR))
                .with(int("matd", "0").describe("Material")),
        );
        groups
    }
}

pub fn module() -> Module {
    Module::new("ACER", "acer", Acer)
        .with_description(
            "Prepares ACE-format libraries for continuous-energy Monte Carlo codes \
             from PENDF data.",
        )
        .with_reference("NJOY2016 Manual, Section 21, Page 520")
}
