//! THERMR: thermal scattering cross sections and matrices.

use crate::core::field::Field;
use crate::core::group::Group;
use crate::core::module::{Module, Schema};
use crate::core::rule::Rule;
use crate::core::values::{Bounds, FieldPath, Values};
use crate::modules::catalog::MATERIALS as MATERIAL_TABLE;
use crate::modules::{float, int, material, unit_in, unit_out};

const MATERIALS: Bounds = Bounds::new(1, 10);

pub struct Thermr;

impl Schema for Thermr {
    fn groups(&self, values: &Values) -> Vec<Group> {
        let nmat = values.count("c_gui", "nmat", MATERIALS);
        let mut groups = vec![
            Group::new("c1", "I/O units")
                .reference("Page 49")
                .with(unit_in("nendf", "24").describe("ENDF tape with thermal scattering law data (0 for free gas)"))
                .with(unit_in("nin", "22").describe("Input PENDF tape"))
                .with(unit_out("nout", "23").describe("Output PENDF tape")),
            Group::new("c_gui", "Material count").with(
                Field::new("nmat", nmat.to_string())
                    .describe("Number of materials to process")
                    .hidden()
                    .count(MATERIALS),
            ),
        ];
        for i in 1..=nmat {
            let c2 = format!("c2_{i}");
            groups.push(
                Group::new(&c2, format!("Material #{i}: configuration"))
                    .reference("Page 49")
                    .with(material(format!("matde_{i}"), "1001").describe("Material on the thermal tape"))
                    .with(
                        Field::new(format!("matdp_{i}"), "0")
                            .describe("Material on the PENDF tape; required when IIN >= 2")
                            .choices(MATERIAL_TABLE)
                            .rule(Rule::PositiveWhen {
                                selector: FieldPath::new(&c2, format!("iin_{i}")),
                                at_least: 2,
                            }),
                    )
                    .with(int(format!("nbin_{i}"), "8").describe("Number of equi-probable angles"))
                    .with(int(format!("ntemp_{i}"), "1").describe("Number of temperatures"))
                    .with(int(format!("iin_{i}"), "1").describe("Inelastic option (1 free gas, 2 S(a,b))"))
                    .with(int(format!("icoh_{i}"), "0").describe("Elastic option (0 none)"))
                    .with(int(format!("iform_{i}"), "0").describe("Output format (0 E-mu-E')"))
                    .with(int(format!("natom_{i}"), "0").describe("Number of principal atoms"))
                    .with(int(format!("mtref_{i}"), "222").describe("MT for inelastic reaction"))
                    .with(int(format!("iprint_{i}"), "0").describe("Print option")),
            );
            groups.push(
                Group::new(format!("c3_{i}"), format!("Material #{i}: temperatures"))
                    .reference("Page 49")
                    .with(
                        Field::new(format!("tempr_{i}"), "293.6")
                            .describe("Temperatures (K); one per NTEMP")
                            .list()
                            .rule(Rule::count_of(&c2, format!("ntemp_{i}"))),
                    ),
            );
            groups.push(
                Group::new(format!("c4_{i}"), format!("Material #{i}: limits"))
                    .reference("Page 49")
                    .with(float(format!("tol_{i}"), "0.05").describe("Reconstruction tolerance"))
                    .with(float(format!("emax_{i}"), "4.5").describe("Maximum energy for thermal treatment (eV)")),
            );
        }
        groups
    }
}

pub fn module() -> Module {
    Module::new("THERMR", "thermr", Thermr)
        .with_description(
            "Generates pointwise neutron scattering cross sections and matrices in \
             the thermal range, for free-gas or bound scatterers.",
        )
        .with_reference("NJOY2016 Manual, Section 6, Page 49")
}
