mod encoder;
pub mod ops;
pub mod pipeline;
mod weights;

pub use encoder::{ActivationMap, Encoder, EncoderOutput, Role};
pub use weights::{ConvWeights, NpzWeights, WeightSet, WeightSource};
