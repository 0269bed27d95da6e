pub mod cdr;
pub mod delivery;
pub mod fallback;
pub mod ghostscript;
pub mod retry;
pub mod staging;
pub mod zamzar;
