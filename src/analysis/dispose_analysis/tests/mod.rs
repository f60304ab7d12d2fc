mod lattice_tests;
mod verdict_tests;
