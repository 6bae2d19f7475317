//! Errors raised by the encoder and its weight loading.

use thiserror::Error;

/// Errors that can occur while building or running the encoder.
#[derive(Debug, Error)]
pub enum EncoderError {
    /// The weights do not fit the fixed layer pipeline.
    #[error("topology mismatch: {message}")]
    TopologyMismatch {
        /// What part of the topology disagreed
        message: String,
    },

    /// The requested image role is neither `style` nor `content`.
    #[error(r#"invalid role "{0}", expected "style" or "content""#)]
    InvalidRole(String),

    /// The input tensor cannot be run through the pipeline.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of the offending shape
        message: String,
    },

    /// The weight archive could not be read.
    #[error("unable to read weights: {0}")]
    Weights(#[from] tch::TchError),
}

impl EncoderError {
    pub fn topology_mismatch(message: impl Into<String>) -> Self {
        Self::TopologyMismatch {
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}
