//! ImageNet mean subtraction expected by the pretrained VGG19 weights.

use crate::common::*;

/// Per-channel ImageNet means in BGR order.
pub const IMAGENET_MEAN_BGR: [f32; 3] = [103.939, 116.779, 123.68];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelOrder {
    #[serde(rename = "BGR")]
    Bgr,
    #[serde(rename = "RGB")]
    Rgb,
}

impl Default for ChannelOrder {
    fn default() -> Self {
        ChannelOrder::Bgr
    }
}

impl ChannelOrder {
    pub fn means(&self) -> [f32; 3] {
        let [b, g, r] = IMAGENET_MEAN_BGR;
        match self {
            ChannelOrder::Bgr => [b, g, r],
            ChannelOrder::Rgb => [r, g, b],
        }
    }

    fn mean_tensor(&self, like: &Tensor) -> Tensor {
        Tensor::of_slice(&self.means()).to_device(like.device())
    }
}

impl FromStr for ChannelOrder {
    type Err = Error;

    fn from_str(text: &str) -> Fallible<Self> {
        match text.to_ascii_uppercase().as_str() {
            "BGR" => Ok(ChannelOrder::Bgr),
            "RGB" => Ok(ChannelOrder::Rgb),
            _ => bail!(r#"invalid channel order "{}", expected "BGR" or "RGB""#, text),
        }
    }
}

/// Subtracts the channel means from a `(..., channels)` image.
pub fn preprocess(image: &Tensor, order: ChannelOrder) -> Tensor {
    image.to_kind(Kind::Float) - order.mean_tensor(image)
}

/// Adds the channel means back, inverting [`preprocess`].
pub fn deprocess(image: &Tensor, order: ChannelOrder) -> Tensor {
    image.to_kind(Kind::Float) + order.mean_tensor(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtracts_means_in_channel_order() {
        let zeros = Tensor::zeros(&[1, 2, 2, 3], (Kind::Float, Device::Cpu));

        let bgr = preprocess(&zeros, ChannelOrder::Bgr);
        let expect = Tensor::of_slice(&[-103.939f32, -116.779, -123.68]);
        assert!(bgr.get(0).get(1).get(0).allclose(&expect, 0.0, 0.0, false));

        let rgb = preprocess(&zeros, ChannelOrder::Rgb);
        let expect = Tensor::of_slice(&[-123.68f32, -116.779, -103.939]);
        assert!(rgb.get(0).get(0).get(1).allclose(&expect, 0.0, 0.0, false));
    }

    #[test]
    fn deprocess_inverts_preprocess() {
        let image = Tensor::rand(&[2, 5, 7, 3], (Kind::Float, Device::Cpu)) * 255.0;
        for order in [ChannelOrder::Bgr, ChannelOrder::Rgb] {
            let restored = deprocess(&preprocess(&image, order), order);
            assert_eq!(restored.size(), image.size());
            assert!(restored.allclose(&image, 0.0, 1e-4, false));
        }
    }

    #[test]
    fn accepts_byte_images() {
        let image = Tensor::of_slice(&[0u8, 128, 255]).view(&[1, 1, 1, 3][..]);
        let processed = preprocess(&image, ChannelOrder::Bgr);
        assert_eq!(processed.kind(), Kind::Float);
        let expect = Tensor::of_slice(&[-103.939f32, 11.221, 131.32]).view(&[1, 1, 1, 3][..]);
        assert!(processed.allclose(&expect, 0.0, 1e-4, false));
    }

    #[test]
    fn parses_channel_order() {
        assert_eq!("bgr".parse::<ChannelOrder>().unwrap(), ChannelOrder::Bgr);
        assert_eq!("RGB".parse::<ChannelOrder>().unwrap(), ChannelOrder::Rgb);
        assert!("BRG".parse::<ChannelOrder>().is_err());
    }
}
