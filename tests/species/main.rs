#![allow(clippy::cast_precision_loss)]

mod bounds;
mod configuration;
mod convergence;
#[cfg(feature = "serde")]
mod serialization;
mod shared;
