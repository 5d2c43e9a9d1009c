//! CLI command implementations

pub mod norm;
pub mod pop;
pub mod ppk;
pub mod pplot;
pub mod stack;
pub mod thres;
