use super::pipeline;
use crate::error::EncoderError;
use log::{debug, warn};
use std::{collections::HashMap, path::Path};
use tch::{Device, Kind, Tensor};

/// A sequence of pretrained arrays addressed by index, holding interleaved
/// kernel/bias pairs in pipeline order.
pub trait WeightSource {
    fn array(&self, index: usize) -> Option<Tensor>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl WeightSource for [Tensor] {
    fn array(&self, index: usize) -> Option<Tensor> {
        self.get(index).map(Tensor::shallow_clone)
    }

    fn len(&self) -> usize {
        <[Tensor]>::len(self)
    }
}

impl WeightSource for Vec<Tensor> {
    fn array(&self, index: usize) -> Option<Tensor> {
        self.as_slice().array(index)
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }
}

/// Arrays of an `.npz` archive, keyed `arr_0`, `arr_1`, ...
pub struct NpzWeights {
    arrays: HashMap<String, Tensor>,
}

impl NpzWeights {
    pub fn open<P>(path: P, device: Device) -> Result<Self, EncoderError>
    where
        P: AsRef<Path>,
    {
        let arrays = Tensor::read_npz(path)?
            .into_iter()
            .map(|(name, array)| (name, array.to_device(device)))
            .collect::<HashMap<_, _>>();
        Ok(Self { arrays })
    }
}

impl WeightSource for NpzWeights {
    fn array(&self, index: usize) -> Option<Tensor> {
        self.arrays
            .get(&format!("arr_{}", index))
            .map(Tensor::shallow_clone)
    }

    /// Counts the `arr_<i>` entries only.
    fn len(&self) -> usize {
        self.arrays.keys().filter(|name| is_indexed_name(name)).count()
    }
}

fn is_indexed_name(name: &str) -> bool {
    match name.strip_prefix("arr_") {
        Some(index) => !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

/// Kernel and bias of one convolution stage.
#[derive(Debug)]
pub struct ConvWeights {
    /// `(height, width, in_channels, out_channels)`
    pub kernel: Tensor,
    /// `(out_channels,)`
    pub bias: Tensor,
}

impl ConvWeights {
    /// A handle sharing the same kernel and bias storage.
    pub fn shallow_clone(&self) -> Self {
        Self {
            kernel: self.kernel.shallow_clone(),
            bias: self.bias.shallow_clone(),
        }
    }

    pub fn in_channels(&self) -> i64 {
        self.kernel.size()[2]
    }

    pub fn out_channels(&self) -> i64 {
        self.kernel.size()[3]
    }
}

/// The immutable set of convolution weights, one entry per conv stage.
#[derive(Debug)]
pub struct WeightSet {
    layers: Vec<ConvWeights>,
}

impl WeightSet {
    pub fn load<S>(source: &S) -> Result<Self, EncoderError>
    where
        S: WeightSource + ?Sized,
    {
        let num_stages = pipeline::num_conv_stages();
        let mut layers: Vec<ConvWeights> = Vec::with_capacity(num_stages);

        for (stage, name) in pipeline::ENCODER_LAYERS
            .iter()
            .filter(|stage| matches!(stage, pipeline::Stage::Conv(_)))
            .map(pipeline::Stage::name)
            .enumerate()
        {
            let (kernel, bias) = match (source.array(2 * stage), source.array(2 * stage + 1)) {
                (Some(kernel), Some(bias)) => (kernel, bias),
                _ => {
                    return Err(EncoderError::topology_mismatch(format!(
                        "weight source ran out at {} ({} of {} convolution stages loaded)",
                        name, stage, num_stages
                    )))
                }
            };

            // stored as (out, in, height, width)
            if kernel.dim() != 4 {
                return Err(EncoderError::topology_mismatch(format!(
                    "kernel of {} has shape {:?}, expected 4 dimensions",
                    name,
                    kernel.size()
                )));
            }
            let kernel = kernel.to_kind(Kind::Float).permute(&[2, 3, 1, 0]);
            let bias = bias.to_kind(Kind::Float);
            let conv = ConvWeights { kernel, bias };

            if conv.bias.size() != [conv.out_channels()] {
                return Err(EncoderError::topology_mismatch(format!(
                    "bias of {} has shape {:?}, expected [{}]",
                    name,
                    conv.bias.size(),
                    conv.out_channels()
                )));
            }
            if let Some(prev) = layers.last() {
                if prev.out_channels() != conv.in_channels() {
                    return Err(EncoderError::topology_mismatch(format!(
                        "{} expects {} input channels but the previous stage yields {}",
                        name,
                        conv.in_channels(),
                        prev.out_channels()
                    )));
                }
            }

            debug!("loaded {} with kernel {:?}", name, conv.kernel.size());
            layers.push(conv);
        }

        let consumed = 2 * num_stages;
        if source.len() > consumed {
            warn!(
                "ignoring {} weight arrays beyond the {} used by the encoder",
                source.len() - consumed,
                consumed
            );
        }

        Ok(Self { layers })
    }

    /// A handle sharing the same weight storage.
    pub fn shallow_clone(&self) -> Self {
        Self {
            layers: self.layers.iter().map(ConvWeights::shallow_clone).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ConvWeights> {
        self.layers.iter()
    }

    pub fn get(&self, index: usize) -> Option<&ConvWeights> {
        self.layers.get(index)
    }

    /// Channels expected on the input image.
    pub fn in_channels(&self) -> Option<i64> {
        self.layers.first().map(ConvWeights::in_channels)
    }
}
