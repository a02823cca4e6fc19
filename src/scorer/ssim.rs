//! Structural similarity (SSIM) between two frames.
//!
//! Frames are converted to 8-bit YCrCb. Local means, variances and covariances are taken over
//! an 11x11 Gaussian window with standard deviation 1.5, with edge pixels replicated beyond the
//! frame border. The SSIM index of a plane is the mean of its SSIM map, and the similarity of
//! two frames is the weighted sum of the plane indices.
//!
//! Everything that depends on a single frame (the planes, their local means and variances) is
//! computed once when the frame is decoded, so comparing a pair only needs to smooth the
//! product of the two frames.

use image::RgbImage;
use smallvec::SmallVec;

pub const C1: f64 = 6.5025;
pub const C2: f64 = 58.5225;

pub const WINDOW_SIZE: usize = 11;
pub const WINDOW_SIGMA: f64 = 1.5;

/// Plane weights: Y, Cr, Cb
pub const YCRCB_WEIGHTS: [f64; 3] = [0.8, 0.1, 0.1];

/// Normalized 1D Gaussian kernel. The 2D window is its outer product.
pub fn gaussian_window() -> [f32; WINDOW_SIZE] {
    let center = (WINDOW_SIZE / 2) as f64;
    let mut kernel = [0.0f64; WINDOW_SIZE];

    for (i, k) in kernel.iter_mut().enumerate() {
        let d = i as f64 - center;
        *k = (-d * d / (2.0 * WINDOW_SIGMA * WINDOW_SIGMA)).exp();
    }

    let total: f64 = kernel.iter().sum();
    kernel.map(|k| (k / total) as f32)
}

/// Convolve a plane with the Gaussian window, one axis at a time
fn smooth(plane: &[f32], width: usize, height: usize, kernel: &[f32; WINDOW_SIZE]) -> Vec<f32> {
    let radius = WINDOW_SIZE / 2;
    let clamp = |v: isize, len: usize| v.clamp(0, len as isize - 1) as usize;

    let mut rows = vec![0.0f32; plane.len()];
    for y in 0..height {
        let row = &plane[y * width..(y + 1) * width];
        for x in 0..width {
            rows[y * width + x] = kernel.iter()
                .enumerate()
                .map(|(k, w)| w * row[clamp(x as isize + k as isize - radius as isize, width)])
                .sum();
        }
    }

    let mut smoothed = vec![0.0f32; plane.len()];
    for y in 0..height {
        for x in 0..width {
            smoothed[y * width + x] = kernel.iter()
                .enumerate()
                .map(|(k, w)| w * rows[clamp(y as isize + k as isize - radius as isize, height) * width + x])
                .sum();
        }
    }

    smoothed
}

/// A single plane together with its local mean and variance
#[derive(Debug, Clone)]
struct PlaneStats {
    values: Vec<f32>,
    mu: Vec<f32>,
    sigma_sq: Vec<f32>,
}

impl PlaneStats {
    fn new(values: Vec<f32>, width: usize, height: usize, kernel: &[f32; WINDOW_SIZE]) -> Self {
        let mu = smooth(&values, width, height, kernel);

        let squares: Vec<f32> = values.iter().map(|v| v * v).collect();
        let sigma_sq = smooth(&squares, width, height, kernel).into_iter()
            .zip(&mu)
            .map(|(sq, m)| sq - m * m)
            .collect();

        Self { values, mu, sigma_sq }
    }
}

/// A decoded frame, ready for comparison
#[derive(Debug, Clone)]
pub struct FramePlanes {
    width: usize,
    height: usize,
    planes: SmallVec<[PlaneStats; 3]>,
}

impl FramePlanes {
    pub fn from_image(image: &RgbImage) -> Self {
        let (width, height) = (image.width() as usize, image.height() as usize);
        let num_pixels = width * height;

        let mut y = Vec::with_capacity(num_pixels);
        let mut cr = Vec::with_capacity(num_pixels);
        let mut cb = Vec::with_capacity(num_pixels);

        // 8-bit conversion, so each channel is rounded and saturated like the source pixels
        let to_u8 = |v: f32| v.round().clamp(0.0, 255.0);

        for pixel in image.pixels() {
            let [r, g, b] = pixel.0.map(f32::from);
            let luma = 0.299 * r + 0.587 * g + 0.114 * b;

            y.push(to_u8(luma));
            cr.push(to_u8((r - luma) * 0.713 + 128.0));
            cb.push(to_u8((b - luma) * 0.564 + 128.0));
        }

        let kernel = gaussian_window();
        let planes = [y, cr, cb].into_iter()
            .map(|values| PlaneStats::new(values, width, height, &kernel))
            .collect();

        Self { width, height, planes }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }
}

/// Mean of the SSIM map of two planes of the same frame size
fn plane_ssim(a: &PlaneStats, b: &PlaneStats, width: usize, height: usize, kernel: &[f32; WINDOW_SIZE]) -> f64 {
    let products: Vec<f32> = a.values.iter().zip(&b.values).map(|(x, y)| x * y).collect();
    let smoothed_products = smooth(&products, width, height, kernel);

    let total: f64 = smoothed_products.iter()
        .enumerate()
        .map(|(i, &p)| {
            // Same precision as the variances, so that identical planes score exactly one
            let sigma_ab = (p - a.mu[i] * b.mu[i]) as f64;

            let (mu_a, mu_b) = (a.mu[i] as f64, b.mu[i] as f64);
            let mu_ab = mu_a * mu_b;

            let numerator = (2.0 * mu_ab + C1) * (2.0 * sigma_ab + C2);
            let denominator = (mu_a * mu_a + mu_b * mu_b + C1)
                * (a.sigma_sq[i] as f64 + b.sigma_sq[i] as f64 + C2);

            numerator / denominator
        })
        .sum();

    total / smoothed_products.len() as f64
}

/// Weighted SSIM of two frames, clamped to [0, 1]
pub fn frame_similarity(a: &FramePlanes, b: &FramePlanes) -> Result<f64, String> {
    if (a.width, a.height) != (b.width, b.height) {
        return Err(format!("frames differ in size ({}x{} vs. {}x{})", a.width, a.height, b.width, b.height));
    }

    let kernel = gaussian_window();
    let similarity: f64 = a.planes.iter()
        .zip(&b.planes)
        .zip(YCRCB_WEIGHTS)
        .map(|((pa, pb), w)| w * plane_ssim(pa, pb, a.width, a.height, &kernel))
        .sum();

    Ok(similarity.clamp(0.0, 1.0))
}
