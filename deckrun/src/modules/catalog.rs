//! Choice tables offered next to material, grid and reaction fields.

use crate::core::field::Choices;

pub const MATERIALS: Choices = &[
    ("125", "H-1 (Hydrogen-1)"),
    ("128", "He-4 (Helium-4)"),
    ("325", "Li-6 (Lithium-6)"),
    ("328", "Li-7 (Lithium-7)"),
    ("425", "Be-9 (Beryllium-9)"),
    ("600", "C-Nat (Natural Carbon)"),
    ("625", "C-12 (Carbon-12)"),
    ("725", "N-14 (Nitrogen-14)"),
    ("825", "O-16 (Oxygen-16)"),
    ("1325", "Al-27 (Aluminum-27)"),
    ("2600", "Fe-Nat (Natural Iron)"),
    ("9228", "U-235 (Uranium-235)"),
    ("9237", "U-238 (Uranium-238)"),
    ("9437", "Pu-239 (Plutonium-239)"),
];

pub const GRID_POINTS: Choices = &[
    ("", "None"),
    ("0.0253", "Thermal peak (0.0253 eV)"),
    ("1.0e-5", "Low bound (1e-5 eV)"),
    ("2.0e7", "High bound (20 MeV)"),
    ("1.0e-5 0.0253 2.0e7", "Standard anchors"),
    ("1.4e7", "Fusion (14 MeV)"),
];

pub const REACTIONS: Choices = &[
    ("1", "Total"),
    ("2", "Elastic scattering"),
    ("3", "Non-elastic"),
    ("4", "Total inelastic"),
    ("16", "(n,2n)"),
    ("17", "(n,3n)"),
    ("18", "Fission (total)"),
    ("19", "(n,f) first chance"),
    ("102", "(n,gamma) radiative capture"),
    ("103", "(n,p)"),
    ("107", "(n,alpha)"),
    ("452", "Nu-bar (total)"),
    ("1018", "Chi (fission spectrum)"),
];

pub const NEUTRON_GROUPS: Choices = &[
    ("1", "Arbitrary structure (read in)"),
    ("2", "CSEWG 239-group"),
    ("3", "LANL 30-group"),
    ("4", "ANL 27-group"),
    ("5", "RRD 50-group"),
    ("6", "GAM-I 68-group"),
    ("7", "GAM-II 100-group"),
    ("8", "LASER-THERMOS 35-group"),
    ("9", "EPRI-CPM 69-group"),
    ("10", "LANL 187-group"),
    ("11", "LANL 70-group"),
    ("12", "SAND-II 620-group"),
    ("13", "LANL 80-group"),
    ("14", "EURLIB 100-group"),
    ("15", "SAND-IIA 640-group"),
    ("16", "Vitamin-E 174-group"),
    ("17", "Vitamin-J 175-group"),
    ("18", "XMAS NEA-LANL"),
    ("19", "ECCO 33-group"),
];

pub const WEIGHT_FUNCTIONS: Choices = &[
    ("0", "Read from tape"),
    ("1", "Read in smooth weight function"),
    ("2", "Constant"),
    ("3", "1/E"),
    ("4", "1/E + fission spectrum + thermal Maxwellian"),
    ("5", "EPRI-CELL LWR"),
    ("6", "Thermal, 1/E, fission + fusion"),
    ("7", "Same as 6 with T-dependent thermal part"),
    ("8", "Thermal, 1/E, fast reactor, fission + fusion"),
    ("9", "CLAW"),
    ("10", "CLAW with T-dependent thermal part"),
    ("11", "Vitamin-E (ORNL-5505)"),
];
