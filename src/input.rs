//! Image files in, `(1, height, width, 3)` tensors out.

use crate::{common::*, preprocess::ChannelOrder};

/// Expands glob patterns into a sorted, de-duplicated list of files.
pub fn expand_patterns<S>(patterns: &[S]) -> Fallible<Vec<PathBuf>>
where
    S: AsRef<str>,
{
    let paths = patterns
        .iter()
        .map(|pattern| {
            let pattern = pattern.as_ref();
            let paths = glob::glob(pattern)
                .with_context(|| format!("invalid glob pattern {}", pattern))?
                .collect::<Result<Vec<_>, _>>()?;
            if paths.is_empty() {
                warn!("pattern {} matches no files", pattern);
            }
            Fallible::Ok(paths)
        })
        .collect::<Fallible<Vec<_>>>()?
        .into_iter()
        .flatten()
        .sorted()
        .dedup()
        .collect();
    Ok(paths)
}

/// Output file for each image, `<stem>.<tag>.npz` in `output_dir`.
///
/// Images sharing a file stem (e.g. `a/x.jpg` and `b/x.jpg`) get a numeric
/// suffix, `x-1.<tag>.npz`, so that no two images write the same file.
pub fn output_paths(paths: &[PathBuf], output_dir: &Path, tag: &str) -> Fallible<Vec<PathBuf>> {
    let mut taken = HashSet::new();
    paths
        .iter()
        .map(|path| {
            let stem = path
                .file_stem()
                .ok_or_else(|| format_err!("{} has no file name", path.display()))?
                .to_string_lossy();
            let output = (0..)
                .map(|n| match n {
                    0 => output_dir.join(format!("{}.{}.npz", stem, tag)),
                    n => output_dir.join(format!("{}-{}.{}.npz", stem, n, tag)),
                })
                .find(|output| !taken.contains(output))
                .ok_or_else(|| format_err!("no free output name for {}", path.display()))?;
            if !output.ends_with(format!("{}.{}.npz", stem, tag)) {
                warn!("{} is written to {} to avoid a name clash", path.display(), output.display());
            }
            taken.insert(output.clone());
            Fallible::Ok(output)
        })
        .collect()
}

/// Decodes the images in parallel, optionally resizing to `[width, height]`.
pub fn load_images(paths: &[PathBuf], resize: Option<[u32; 2]>) -> Fallible<Vec<RgbImage>> {
    paths
        .par_iter()
        .map(|path| {
            let image = decode_image(path)?;
            let image = match resize {
                Some([width, height]) => {
                    imageops::resize(&image, width, height, FilterType::Triangle)
                }
                None => image,
            };
            debug!(
                "loaded {} ({}x{})",
                path.display(),
                image.width(),
                image.height()
            );
            Fallible::Ok(image)
        })
        .collect()
}

fn decode_image(path: &Path) -> Fallible<RgbImage> {
    let image = ImageReader::open(path)
        .with_context(|| format!("unable to open {}", path.display()))?
        .with_guessed_format()?
        .decode()
        .with_context(|| format!("unable to decode {}", path.display()))?;
    Ok(image.to_rgb8())
}

/// Converts an image to a `(1, height, width, 3)` float tensor with pixel
/// values in `[0, 255]`, channels arranged in `order`.
pub fn image_to_tensor(image: &RgbImage, order: ChannelOrder, device: Device) -> Tensor {
    let (width, height) = image.dimensions();
    let tensor = Tensor::of_slice(image.as_raw().as_slice())
        .view(&[1, height as i64, width as i64, 3][..])
        .to_kind(Kind::Float);
    let tensor = match order {
        ChannelOrder::Rgb => tensor,
        ChannelOrder::Bgr => tensor.flip(&[3]),
    };
    tensor.to_device(device)
}
