pub mod chorus;
pub mod echo;
pub mod filter;
pub mod frac_delay;
pub mod lfo;
pub mod ring;
