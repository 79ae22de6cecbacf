pub mod edit;
pub mod import;
pub mod recalc;
