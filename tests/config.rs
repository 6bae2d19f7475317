use tch::Device;
use vgg_encoder::{config::Config, ChannelOrder};

#[test]
fn parses_full_config() {
    let config: Config = r#"{
        weights_file: "vgg19.npz",
        device: "cuda(1)",
        channel_order: "RGB",
        style_images: ["style/*.png"],
        content_images: ["content/a.jpg", "content/b.jpg"],
        resize: [512, 384],
        output_dir: "out",
        save_activations: true,
    }"#
    .parse()
    .unwrap();

    assert_eq!(config.weights_file.to_str(), Some("vgg19.npz"));
    assert_eq!(config.device, Device::Cuda(1));
    assert_eq!(config.channel_order, ChannelOrder::Rgb);
    assert_eq!(config.style_images, vec!["style/*.png"]);
    assert_eq!(config.content_images.len(), 2);
    assert_eq!(config.resize, Some([512, 384]));
    assert!(config.save_activations);
}

#[test]
fn fills_defaults() {
    let config: Config = r#"{ weights_file: "vgg19.npz", device: "cpu", output_dir: "out" }"#
        .parse()
        .unwrap();

    assert_eq!(config.device, Device::Cpu);
    assert_eq!(config.channel_order, ChannelOrder::Bgr);
    assert!(config.style_images.is_empty());
    assert!(config.content_images.is_empty());
    assert_eq!(config.resize, None);
    assert!(!config.save_activations);
}

#[test]
fn rejects_bad_values() {
    let bad_device = r#"{ weights_file: "w.npz", device: "tpu", output_dir: "out" }"#;
    assert!(bad_device.parse::<Config>().is_err());

    let bad_order = r#"{ weights_file: "w.npz", channel_order: "GBR", output_dir: "out" }"#;
    assert!(bad_order.parse::<Config>().is_err());

    let bad_resize =
        r#"{ weights_file: "w.npz", device: "cpu", resize: [0, 128], output_dir: "out" }"#;
    assert!(bad_resize.parse::<Config>().is_err());

    let missing_weights = r#"{ device: "cpu", output_dir: "out" }"#;
    assert!(missing_weights.parse::<Config>().is_err());
}

#[test]
fn ships_a_loadable_example() {
    let config = Config::open(concat!(env!("CARGO_MANIFEST_DIR"), "/config.json5")).unwrap();
    assert_eq!(config.device, Device::Cpu);
    assert_eq!(config.resize, Some([256, 256]));
}
