use vgg_encoder::{
    common::*,
    config::Config,
    input, preprocess, Encoder, EncoderOutput, NpzWeights, Role,
};

/// Extract style and content latent codes with a pretrained VGG19 encoder.
#[derive(FromArgs)]
struct Args {
    /// the config file.
    #[argh(option, default = "PathBuf::from(\"config.json5\")")]
    config: PathBuf,
}

#[derive(Debug, Serialize)]
struct ManifestEntry {
    image: PathBuf,
    role: String,
    latent_shape: Vec<i64>,
    output: PathBuf,
}

fn main() -> Fallible<()> {
    pretty_env_logger::init();

    // Parse arguments
    let args: Args = argh::from_env();

    // load config
    let config = Config::open(&args.config)?;
    fs::create_dir_all(&config.output_dir)?;

    // Load weights
    info!("Loading weights from {}", config.weights_file.display());
    let weights = NpzWeights::open(&config.weights_file, config.device)?;
    let encoder = Encoder::new(&weights)?;

    let mut manifest = vec![];
    for (role, patterns) in [
        (Role::Style, &config.style_images),
        (Role::Content, &config.content_images),
    ] {
        let paths = input::expand_patterns(patterns.as_slice())?;
        info!("Encoding {} {} images", paths.len(), role);

        let images = input::load_images(&paths, config.resize)?;
        let outputs = input::output_paths(&paths, &config.output_dir, role.as_str())?;
        for ((path, image), output) in paths.into_iter().zip(images).zip(outputs) {
            let tensor = input::image_to_tensor(&image, config.channel_order, config.device);
            let tensor = preprocess(&tensor, config.channel_order);
            let EncoderOutput {
                latent_code,
                activations,
            } = encoder.encode(&tensor, role)?;

            let mut arrays = vec![("latent_code", &latent_code)];
            if config.save_activations {
                arrays.extend(activations.iter());
            }
            Tensor::write_npz(&arrays, &output)?;

            let latent_shape = latent_code.size();
            info!(
                "{} -> {} [{}]",
                path.display(),
                output.display(),
                latent_shape.iter().join(", ")
            );

            manifest.push(ManifestEntry {
                image: path,
                role: role.to_string(),
                latent_shape,
                output,
            });
        }
    }

    let manifest_file = config.output_dir.join("manifest.json");
    fs::write(&manifest_file, serde_json::to_string_pretty(&manifest)?)?;
    info!("Wrote {} entries to {}", manifest.len(), manifest_file.display());

    Ok(())
}
