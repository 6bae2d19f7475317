pub mod common;
pub mod config;
pub mod error;
pub mod input;
pub mod model;
pub mod preprocess;

pub use error::EncoderError;
pub use model::{ActivationMap, Encoder, EncoderOutput, NpzWeights, Role, WeightSet, WeightSource};
pub use preprocess::{deprocess, preprocess, ChannelOrder};
