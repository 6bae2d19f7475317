//! The fixed VGG19 layer sequence, truncated at `relu4_1`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Conv(&'static str),
    Relu(&'static str),
    Pool(&'static str),
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match *self {
            Stage::Conv(name) | Stage::Relu(name) | Stage::Pool(name) => name,
        }
    }

    /// Whether the output of this stage is captured in the activation map.
    pub fn is_feature(&self) -> bool {
        FEATURE_LAYERS.contains(&self.name())
    }
}

use Stage::{Conv, Pool, Relu};

pub const ENCODER_LAYERS: &[Stage] = &[
    Conv("conv1_1"),
    Relu("relu1_1"),
    Conv("conv1_2"),
    Relu("relu1_2"),
    Pool("pool1"),
    Conv("conv2_1"),
    Relu("relu2_1"),
    Conv("conv2_2"),
    Relu("relu2_2"),
    Pool("pool2"),
    Conv("conv3_1"),
    Relu("relu3_1"),
    Conv("conv3_2"),
    Relu("relu3_2"),
    Conv("conv3_3"),
    Relu("relu3_3"),
    Conv("conv3_4"),
    Relu("relu3_4"),
    Pool("pool3"),
    Conv("conv4_1"),
    Relu("relu4_1"),
];

pub const FEATURE_LAYERS: &[&str] = &["relu1_1", "relu2_1", "relu3_1", "relu4_1"];

/// Number of convolution stages, i.e. the number of kernel/bias pairs the
/// weight source has to provide.
pub fn num_conv_stages() -> usize {
    ENCODER_LAYERS
        .iter()
        .filter(|stage| matches!(stage, Stage::Conv(_)))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_has_nine_convolutions() {
        assert_eq!(num_conv_stages(), 9);
        assert_eq!(ENCODER_LAYERS.first(), Some(&Conv("conv1_1")));
        assert_eq!(ENCODER_LAYERS.last().map(Stage::name), Some("relu4_1"));
    }

    #[test]
    fn every_feature_layer_is_a_stage() {
        let captured = ENCODER_LAYERS
            .iter()
            .filter(|stage| stage.is_feature())
            .map(Stage::name)
            .collect::<Vec<_>>();
        assert_eq!(captured, FEATURE_LAYERS);
    }

    #[test]
    fn stage_names_are_unique() {
        let mut names = ENCODER_LAYERS.iter().map(Stage::name).collect::<Vec<_>>();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ENCODER_LAYERS.len());
    }
}
