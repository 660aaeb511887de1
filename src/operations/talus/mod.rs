mod pair;
mod strip;

pub use pair::{PairTalus, TalusPair};
pub use strip::{build_strip, BuildStrips, StripParams, StripSet, TalusStrip};
