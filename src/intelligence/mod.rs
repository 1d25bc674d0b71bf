pub mod classifier;

pub use classifier::{classify_legs, SwapClassification};
