use super::{
    ops,
    pipeline::{Stage, ENCODER_LAYERS, FEATURE_LAYERS},
    weights::{WeightSet, WeightSource},
};
use crate::error::EncoderError;
use log::debug;
use static_assertions::assert_impl_all;
use std::{fmt, str::FromStr};
use tch::{Kind, Tensor};

/// Window and stride of the average pool that produces content codes.
const CONTENT_POOL_SIZE: i64 = 8;

/// Window and stride of the pipeline's max pooling stages.
const DOWNSAMPLE_SIZE: i64 = 2;

/// The purpose of an input image, selecting how the latent code is pooled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Global per-channel statistics, `(batch, channels)`.
    Style,
    /// Coarse spatial grid, `(batch, channels, height / 8, width / 8)`.
    Content,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Style => "style",
            Role::Content => "content",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = EncoderError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text.to_ascii_lowercase().as_str() {
            "style" => Ok(Role::Style),
            "content" => Ok(Role::Content),
            _ => Err(EncoderError::InvalidRole(text.to_owned())),
        }
    }
}

/// Feature layer outputs in pipeline order, laid out as
/// `(batch, height, width, channels)`.
#[derive(Debug, Default)]
pub struct ActivationMap {
    entries: Vec<(&'static str, Tensor)>,
}

impl ActivationMap {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    fn insert(&mut self, name: &'static str, activation: Tensor) {
        self.entries.push((name, activation));
    }

    pub fn get(&self, name: &str) -> Option<&Tensor> {
        self.entries
            .iter()
            .find(|(entry, _)| *entry == name)
            .map(|(_, activation)| activation)
    }

    pub fn last(&self) -> Option<(&'static str, &Tensor)> {
        self.entries
            .last()
            .map(|(name, activation)| (*name, activation))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Tensor)> + '_ {
        self.entries
            .iter()
            .map(|(name, activation)| (*name, activation))
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(name, _)| *name)
    }
}

#[derive(Debug)]
pub struct EncoderOutput {
    pub latent_code: Tensor,
    pub activations: ActivationMap,
}

/// Runs images through the VGG19 prefix and pools the deepest feature layer
/// into a latent code.
///
/// The encoder is `Send` but not `Sync`. To encode on several threads, hand
/// each thread its own [`Encoder::shallow_clone`]; the clones read the same
/// weight storage, which is never written after construction.
#[derive(Debug)]
pub struct Encoder {
    weights: WeightSet,
}

assert_impl_all!(Encoder: Send);

impl Encoder {
    pub fn new<S>(source: &S) -> Result<Self, EncoderError>
    where
        S: WeightSource + ?Sized,
    {
        let weights = WeightSet::load(source)?;
        Ok(Self { weights })
    }

    /// A handle on the same weights, to be moved to another thread.
    pub fn shallow_clone(&self) -> Self {
        Self {
            weights: self.weights.shallow_clone(),
        }
    }

    pub fn weights(&self) -> &WeightSet {
        &self.weights
    }

    /// Encodes a preprocessed `(batch, height, width, channels)` image.
    pub fn encode(&self, image: &Tensor, role: Role) -> Result<EncoderOutput, EncoderError> {
        tch::no_grad(|| self.forward(image, role))
    }

    fn forward(&self, image: &Tensor, role: Role) -> Result<EncoderOutput, EncoderError> {
        let image_size = image.size();
        if image_size.len() != 4 {
            return Err(EncoderError::invalid_input(format!(
                "expected a (batch, height, width, channels) image, got shape {:?}",
                image_size
            )));
        }
        let in_channels = self
            .weights
            .in_channels()
            .ok_or_else(|| EncoderError::topology_mismatch("the encoder has no weights"))?;
        if image_size[3] != in_channels {
            return Err(EncoderError::invalid_input(format!(
                "expected {} image channels, got {}",
                in_channels, image_size[3]
            )));
        }

        let mut convs = self.weights.iter();
        let mut activations = ActivationMap::with_capacity(FEATURE_LAYERS.len());
        let mut current = image.to_kind(Kind::Float).permute(&[0, 3, 1, 2]);

        for stage in ENCODER_LAYERS {
            current = match *stage {
                Stage::Conv(name) => {
                    let conv = convs.next().ok_or_else(|| {
                        EncoderError::topology_mismatch(format!("no weights for {}", name))
                    })?;
                    let size = current.size();
                    if size[2] < 2 || size[3] < 2 {
                        return Err(EncoderError::invalid_input(format!(
                            "{} needs at least 2x2 pixels to mirror-pad, got {}x{}",
                            name, size[2], size[3]
                        )));
                    }
                    ops::conv2d_reflect(&current, &conv.kernel, &conv.bias)
                }
                Stage::Relu(_) => current.relu(),
                Stage::Pool(_) => ops::max_pool2d_same(&current, DOWNSAMPLE_SIZE, DOWNSAMPLE_SIZE),
            };
            debug!("{} -> {:?}", stage.name(), current.size());

            if stage.is_feature() {
                activations.insert(stage.name(), current.permute(&[0, 2, 3, 1]));
            }
        }

        if activations.len() != FEATURE_LAYERS.len() {
            return Err(EncoderError::topology_mismatch(format!(
                "captured {} feature layers, expected {}",
                activations.len(),
                FEATURE_LAYERS.len()
            )));
        }

        let enc = match activations.last() {
            Some((_, enc)) => enc.permute(&[0, 3, 1, 2]),
            None => return Err(EncoderError::topology_mismatch("no feature layer captured")),
        };
        let latent_code = match role {
            Role::Style => ops::spatial_mean(&enc),
            Role::Content => ops::avg_pool2d_same(&enc, CONTENT_POOL_SIZE, CONTENT_POOL_SIZE),
        };

        Ok(EncoderOutput {
            latent_code,
            activations,
        })
    }
}
