use image::{imageops, GrayImage, Luma, Rgb};
use imageproc::{
    contrast::{otsu_level, threshold},
    filter::separable_filter_equal,
};
use log::debug;

pub const WHITE: Luma<u8> = Luma([u8::MAX]);
pub const BLACK: Luma<u8> = Luma([u8::MIN]);

pub const RED: Rgb<u8> = Rgb([255, 0, 0]);
pub const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
pub const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
pub const WHITE_RGB: Rgb<u8> = Rgb([255, 255, 255]);

pub const RAINBOW: [Rgb<u8>; 7] = [
    Rgb([255, 0, 0]),
    Rgb([255, 127, 0]),
    Rgb([255, 255, 0]),
    Rgb([0, 255, 0]),
    Rgb([0, 0, 255]),
    Rgb([75, 0, 130]),
    Rgb([148, 0, 211]),
];

/// Builds a normalized 1D gaussian kernel of the given odd size. The sigma
/// is derived from the size the same way common vision libraries do when
/// no sigma is given: `0.3 * ((size - 1) / 2 - 1) + 0.8`.
pub fn gaussian_kernel(size: u32) -> Vec<f32> {
    let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let center = (size / 2) as f32;
    let weights = (0..size)
        .map(|i| {
            let offset = i as f32 - center;
            (-(offset * offset) / (2.0 * sigma * sigma)).exp()
        })
        .collect::<Vec<f32>>();
    let total: f32 = weights.iter().sum();
    weights.into_iter().map(|w| w / total).collect()
}

/// Smooths a grayscale image with a square gaussian kernel of the given
/// odd size.
pub fn blur(img: &GrayImage, kernel_size: u32) -> GrayImage {
    separable_filter_equal(img, &gaussian_kernel(kernel_size))
}

/// Binarizes an image at its Otsu level with inverted polarity: pixels at
/// or below the level (ink) become `WHITE`, everything brighter `BLACK`.
pub fn binarize_inverted(img: &GrayImage) -> GrayImage {
    let level = otsu_level(img);
    debug!("otsu threshold level: {}", level);
    let mut out = threshold(img, level);
    imageops::invert(&mut out);
    out
}

/// Determines the number of pixels in an image that match the given luma.
pub fn count_pixels(img: &GrayImage, luma: &Luma<u8>) -> u32 {
    img.pixels().filter(|p| *p == luma).count() as u32
}
