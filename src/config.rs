use crate::{common::*, preprocess::ChannelOrder};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub weights_file: PathBuf,
    #[serde(
        serialize_with = "serialize_device",
        deserialize_with = "deserialize_device",
        default = "default_device"
    )]
    pub device: Device,
    #[serde(default)]
    pub channel_order: ChannelOrder,
    #[serde(default)]
    pub style_images: Vec<String>,
    #[serde(default)]
    pub content_images: Vec<String>,
    /// Target `[width, height]` the images are resized to before encoding.
    #[serde(default)]
    pub resize: Option<[u32; 2]>,
    pub output_dir: PathBuf,
    #[serde(default)]
    pub save_activations: bool,
}

impl Config {
    pub fn open<P>(path: P) -> Fallible<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        text.parse()
    }
}

impl FromStr for Config {
    type Err = Error;

    fn from_str(text: &str) -> Fallible<Self> {
        let config: Self = json5::from_str(text)?;
        if let Some([width, height]) = config.resize {
            ensure!(
                width > 0 && height > 0,
                "resize dimensions must be positive, got {}x{}",
                width,
                height
            );
        }
        Ok(config)
    }
}

fn default_device() -> Device {
    Device::cuda_if_available()
}

fn serialize_device<S>(device: &Device, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let text = match device {
        Device::Cpu => "cpu".into(),
        Device::Cuda(n) => format!("cuda({})", n),
    };
    text.serialize(serializer)
}

fn deserialize_device<'de, D>(deserializer: D) -> Result<Device, D::Error>
where
    D: Deserializer<'de>,
{
    let name = String::deserialize(deserializer)?;
    let device = match name.as_str() {
        "cpu" => Device::Cpu,
        "cuda" => Device::cuda_if_available(),
        _ => {
            let prefix = "cuda(";
            let suffix = ")";
            if name.starts_with(prefix) && name.ends_with(suffix) {
                let number: usize = name[(prefix.len())..(name.len() - suffix.len())]
                    .parse()
                    .map_err(|_err| D::Error::custom(format!("invalid device name {}", name)))?;
                Device::Cuda(number)
            } else {
                return Err(D::Error::custom(format!("invalid device name {}", name)));
            }
        }
    };
    Ok(device)
}
