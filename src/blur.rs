use tiny_skia::{Pixmap, PremultipliedColorU8};

/// Canvas-style `shadowBlur` to Gaussian standard deviation.
pub(crate) fn sigma_for_blur(blur: f32) -> f32 {
    (blur / 2.0).max(0.0)
}

/// Pixels the blur can spread ink beyond its source.
pub(crate) fn blur_extent(sigma: f32) -> u32 {
    (sigma.abs() * 3.0).ceil() as u32
}

pub(crate) fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = blur_extent(sigma) as usize;
    if radius == 0 {
        return Vec::new();
    }
    let two_sigma_sq = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (0..=radius * 2)
        .map(|i| {
            let x = i as f32 - radius as f32;
            (-x * x / two_sigma_sq).exp()
        })
        .collect();
    let sum: f32 = kernel.iter().sum();
    if sum > 0.0 {
        for k in &mut kernel {
            *k /= sum;
        }
    }
    kernel
}

/// Separable Gaussian blur in place. Samples outside the pixmap count as
/// transparent so ink fades out at the edges instead of smearing.
pub(crate) fn apply_gaussian_blur(pixmap: &mut Pixmap, sigma: f32) {
    let kernel = gaussian_kernel(sigma);
    if kernel.is_empty() {
        return;
    }
    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let src: Vec<[f32; 4]> = pixmap
        .pixels()
        .iter()
        .map(|p| {
            [
                p.red() as f32,
                p.green() as f32,
                p.blue() as f32,
                p.alpha() as f32,
            ]
        })
        .collect();

    let horizontal = blur_pass(&src, width, height, &kernel, (1, 0));
    let vertical = blur_pass(&horizontal, width, height, &kernel, (0, 1));

    for (dst, vals) in pixmap.pixels_mut().iter_mut().zip(vertical.iter()) {
        let a = vals[3].round().clamp(0.0, 255.0) as u8;
        // Premultiplied channels may never exceed alpha.
        let c = |v: f32| (v.round().clamp(0.0, 255.0) as u8).min(a);
        *dst = PremultipliedColorU8::from_rgba(c(vals[0]), c(vals[1]), c(vals[2]), a)
            .unwrap_or(PremultipliedColorU8::TRANSPARENT);
    }
}

fn blur_pass(
    src: &[[f32; 4]],
    width: usize,
    height: usize,
    kernel: &[f32],
    step: (isize, isize),
) -> Vec<[f32; 4]> {
    let radius = (kernel.len() / 2) as isize;
    let mut out = vec![[0.0f32; 4]; src.len()];
    for y in 0..height {
        for x in 0..width {
            let mut accum = [0.0f32; 4];
            for (i, weight) in kernel.iter().enumerate() {
                let offset = i as isize - radius;
                let sx = x as isize + offset * step.0;
                let sy = y as isize + offset * step.1;
                if sx < 0 || sy < 0 || sx >= width as isize || sy >= height as isize {
                    continue;
                }
                let sample = src[sy as usize * width + sx as usize];
                for (acc, channel) in accum.iter_mut().zip(sample) {
                    *acc += channel * weight;
                }
            }
            out[y * width + x] = accum;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_is_normalized_and_symmetric() {
        let kernel = gaussian_kernel(2.0);
        assert_eq!(kernel.len(), 13);
        let sum: f32 = kernel.iter().sum();
        assert!((sum - 1.0).abs() < 1e-4);
        assert_eq!(kernel[0], kernel[12]);
        assert!(kernel[6] > kernel[5]);
    }

    #[test]
    fn zero_sigma_is_a_noop() {
        assert!(gaussian_kernel(0.0).is_empty());
        let mut pixmap = Pixmap::new(3, 3).unwrap();
        pixmap.fill(tiny_skia::Color::from_rgba8(10, 20, 30, 255));
        let before = pixmap.data().to_vec();
        apply_gaussian_blur(&mut pixmap, 0.0);
        assert_eq!(pixmap.data(), before.as_slice());
    }

    #[test]
    fn blur_spreads_a_single_dot_and_keeps_premultiplied_invariant() {
        let mut pixmap = Pixmap::new(9, 9).unwrap();
        let idx = 4 * 9 + 4;
        pixmap.pixels_mut()[idx] = PremultipliedColorU8::from_rgba(255, 255, 255, 255).unwrap();
        apply_gaussian_blur(&mut pixmap, 1.0);
        let center = pixmap.pixel(4, 4).unwrap();
        let neighbor = pixmap.pixel(5, 4).unwrap();
        assert!(center.alpha() < 255);
        assert!(neighbor.alpha() > 0);
        assert!(center.alpha() > neighbor.alpha());
        for p in pixmap.pixels() {
            assert!(p.red() <= p.alpha());
        }
    }

    #[test]
    fn shadow_blur_maps_to_half_sigma() {
        assert_eq!(sigma_for_blur(4.0), 2.0);
        assert_eq!(blur_extent(sigma_for_blur(4.0)), 6);
        assert_eq!(sigma_for_blur(-3.0), 0.0);
    }
}
