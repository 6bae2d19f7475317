//! Convolution and pooling primitives. Tensors are laid out as
//! `(batch, channels, height, width)`.

use tch::Tensor;

/// Mirror padding by one pixel followed by a valid stride-1 convolution.
///
/// `kernel` is stored as `(height, width, in_channels, out_channels)`.
pub fn conv2d_reflect(xs: &Tensor, kernel: &Tensor, bias: &Tensor) -> Tensor {
    let weight = kernel.permute(&[3, 2, 0, 1]);
    xs.reflection_pad2d(&[1, 1, 1, 1])
        .conv2d(&weight, Some(bias), &[1, 1], &[0, 0], &[1, 1], 1)
}

/// Padding `(before, after)` of a `SAME` window along one axis.
pub fn same_padding(input: i64, kernel: i64, stride: i64) -> (i64, i64) {
    let output = (input + stride - 1) / stride;
    let total = ((output - 1) * stride + kernel - input).max(0);
    (total / 2, total - total / 2)
}

fn pad_same(xs: &Tensor, kernel: i64, stride: i64, value: f64) -> Tensor {
    let size = xs.size();
    let (batch_size, channels, height, width) = (size[0], size[1], size[2], size[3]);
    let (top, bottom) = same_padding(height, kernel, stride);
    let (left, right) = same_padding(width, kernel, stride);

    let padded = Tensor::full(
        &[batch_size, channels, height + top + bottom, width + left + right],
        value,
        (xs.kind(), xs.device()),
    );
    padded
        .narrow(2, top, height)
        .narrow(3, left, width)
        .copy_(xs);
    padded
}

/// Max pooling with `SAME` padding. Output size is `ceil(input / stride)`.
pub fn max_pool2d_same(xs: &Tensor, kernel: i64, stride: i64) -> Tensor {
    pad_same(xs, kernel, stride, f64::NEG_INFINITY).max_pool2d(
        &[kernel, kernel],
        &[stride, stride],
        &[0, 0],
        &[1, 1],
        false,
    )
}

/// Average pooling with `SAME` padding. Padded cells are excluded from
/// each window's average.
pub fn avg_pool2d_same(xs: &Tensor, kernel: i64, stride: i64) -> Tensor {
    let pool = |ts: &Tensor| {
        ts.avg_pool2d(
            &[kernel, kernel],
            &[stride, stride],
            &[0, 0],
            false,
            true,
            None::<i64>,
        )
    };

    let sums = pool(&pad_same(xs, kernel, stride, 0.0));
    let counts = pool(&pad_same(&xs.ones_like(), kernel, stride, 0.0));
    sums / counts
}

/// Mean over both spatial axes, yielding `(batch, channels)`.
pub fn spatial_mean(xs: &Tensor) -> Tensor {
    let size = xs.size();
    xs.adaptive_avg_pool2d(&[1, 1])
        .reshape(&[size[0], size[1]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::{Device, Kind};

    fn grid(values: &[f32], height: i64, width: i64) -> Tensor {
        Tensor::of_slice(values).view(&[1, 1, height, width][..])
    }

    fn to_vec(ts: &Tensor) -> Vec<f32> {
        Vec::<f32>::from(&ts.flatten(0, -1))
    }

    #[test]
    fn same_padding_matches_window_arithmetic() {
        assert_eq!(same_padding(4, 2, 2), (0, 0));
        assert_eq!(same_padding(5, 2, 2), (0, 1));
        assert_eq!(same_padding(10, 8, 8), (3, 3));
        assert_eq!(same_padding(3, 8, 8), (2, 3));
        assert_eq!(same_padding(16, 8, 8), (0, 0));
    }

    #[test]
    fn bottom_right_taps_read_mirrored_pixels() {
        // each output reads its down-right neighbour, mirrored past the last row and column
        let kernel = Tensor::zeros(&[3, 3, 1, 1], (Kind::Float, Device::Cpu));
        let _ = kernel.get(2).get(2).fill_(1.0);
        let bias = Tensor::of_slice(&[0f32]);

        let xs = grid(&[1., 2., 3., 4., 5., 6., 7., 8., 9.], 3, 3);
        let ys = conv2d_reflect(&xs, &kernel, &bias);
        assert_eq!(ys.size(), vec![1, 1, 3, 3]);
        assert_eq!(to_vec(&ys), [5., 6., 5., 8., 9., 8., 5., 6., 5.]);
    }

    #[test]
    fn centered_identity_kernel_preserves_input() {
        // (height, width, in, out) with a single 1.0 at the center tap
        let kernel = Tensor::zeros(&[3, 3, 1, 1], (Kind::Float, Device::Cpu));
        let _ = kernel.get(1).get(1).fill_(1.0);
        let bias = Tensor::of_slice(&[0.5f32]);

        let xs = grid(&[1., 2., 3., 4., 5., 6., 7., 8., 9.], 3, 3);
        let ys = conv2d_reflect(&xs, &kernel, &bias);
        assert_eq!(ys.size(), vec![1, 1, 3, 3]);
        assert_eq!(
            to_vec(&ys),
            [1.5, 2.5, 3.5, 4.5, 5.5, 6.5, 7.5, 8.5, 9.5]
        );
    }

    #[test]
    fn border_taps_read_mirrored_pixels() {
        // only the top-left tap is set, so each output reads its up-left neighbour
        let kernel = Tensor::zeros(&[3, 3, 1, 1], (Kind::Float, Device::Cpu));
        let _ = kernel.get(0).get(0).fill_(1.0);
        let bias = Tensor::of_slice(&[0f32]);

        let xs = grid(&[1., 2., 3., 4., 5., 6., 7., 8., 9.], 3, 3);
        let ys = conv2d_reflect(&xs, &kernel, &bias);
        assert_eq!(to_vec(&ys), [5., 4., 5., 2., 1., 2., 5., 4., 5.]);
    }

    #[test]
    fn max_pool_rounds_up() {
        let xs = grid(&[1., 2., 3., 4., 5., 6., 7., 8., 9.], 3, 3);
        let ys = max_pool2d_same(&xs, 2, 2);
        assert_eq!(ys.size(), vec![1, 1, 2, 2]);
        assert_eq!(to_vec(&ys), [5., 6., 8., 9.]);
    }

    #[test]
    fn max_pool_keeps_negative_values() {
        let xs = grid(&[-4., -3., -2., -1., -6., -5.], 2, 3);
        let ys = max_pool2d_same(&xs, 2, 2);
        assert_eq!(to_vec(&ys), [-1., -2.]);
    }

    #[test]
    fn avg_pool_excludes_padding() {
        let values = (0..10).map(|v| v as f32).collect::<Vec<_>>();
        let xs = grid(&values, 1, 10);
        let ys = avg_pool2d_same(&xs, 8, 8);
        assert_eq!(ys.size(), vec![1, 1, 1, 2]);
        // windows cover [0, 5) and [5, 10)
        assert_eq!(to_vec(&ys), [2., 7.]);
    }

    #[test]
    fn spatial_mean_per_channel() {
        let xs = Tensor::of_slice(&[1f32, 2., 3., 4., 10., 10., 10., 10.])
            .view(&[1, 2, 2, 2][..]);
        let mean = spatial_mean(&xs);
        assert_eq!(mean.size(), vec![1, 2]);
        assert_eq!(to_vec(&mean), [2.5, 10.]);
    }
}
