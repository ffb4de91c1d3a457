use image::{GenericImageView, RgbaImage};
use std::collections::HashMap;
use std::fmt;

// Sprites are tiny, but arbitrary images get downsampled before quantizing.
const MAX_SAMPLE_DIM: u32 = 128;
// Pixels more transparent than this carry no color information.
const ALPHA_CUTOFF: u8 = 128;

const VIBRANT_MIN_SATURATION: f32 = 0.35;
const VIBRANT_LIGHTNESS: (f32, f32) = (0.3, 0.7);

/// A representative color cluster with the number of sampled pixels that
/// landed in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Swatch {
    pub rgb: (u8, u8, u8),
    pub population: u32,
}

impl Swatch {
    pub fn argb(&self) -> u32 {
        let (r, g, b) = self.rgb;
        0xFF00_0000 | (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
    }

    fn saturation_and_lightness(&self) -> (f32, f32) {
        let (r, g, b) = self.rgb;
        let max = r.max(g).max(b) as f32 / 255.0;
        let min = r.min(g).min(b) as f32 / 255.0;
        let lightness = (max + min) / 2.0;
        let saturation = if max == min {
            0.0
        } else {
            let delta = max - min;
            delta / (1.0 - (2.0 * lightness - 1.0).abs())
        };
        (saturation, lightness)
    }

    fn is_vibrant(&self) -> bool {
        let (saturation, lightness) = self.saturation_and_lightness();
        saturation >= VIBRANT_MIN_SATURATION
            && lightness >= VIBRANT_LIGHTNESS.0
            && lightness <= VIBRANT_LIGHTNESS.1
    }
}

#[derive(Debug)]
pub enum ExtractionError {
    Decode(image::ImageError),
    NoSwatch,
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionError::Decode(_) => f.write_str("could not decode image"),
            ExtractionError::NoSwatch => f.write_str("no usable color swatch in image"),
        }
    }
}

impl std::error::Error for ExtractionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExtractionError::Decode(err) => Some(err),
            ExtractionError::NoSwatch => None,
        }
    }
}

impl From<image::ImageError> for ExtractionError {
    fn from(value: image::ImageError) -> Self {
        ExtractionError::Decode(value)
    }
}

/// Population-weighted palette quantized from a bitmap. Opaque pixels are
/// bucketed at 5 bits per channel; each bucket's color is the average of the
/// pixels that fell into it.
#[derive(Debug, Clone)]
pub struct ColorPalette {
    swatches: Vec<Swatch>,
}

impl ColorPalette {
    pub fn from_image(image: &RgbaImage) -> Self {
        struct Bucket {
            sum: (u64, u64, u64),
            population: u32,
        }

        let mut buckets: HashMap<u16, Bucket> = HashMap::new();
        for pixel in image.pixels() {
            let [r, g, b, a] = pixel.0;
            if a < ALPHA_CUTOFF {
                continue;
            }
            let key = (u16::from(r >> 3) << 10) | (u16::from(g >> 3) << 5) | u16::from(b >> 3);
            let bucket = buckets.entry(key).or_insert(Bucket {
                sum: (0, 0, 0),
                population: 0,
            });
            bucket.sum.0 += u64::from(r);
            bucket.sum.1 += u64::from(g);
            bucket.sum.2 += u64::from(b);
            bucket.population += 1;
        }

        let mut swatches: Vec<Swatch> = buckets
            .into_values()
            .map(|bucket| {
                let n = u64::from(bucket.population);
                Swatch {
                    rgb: (
                        (bucket.sum.0 / n) as u8,
                        (bucket.sum.1 / n) as u8,
                        (bucket.sum.2 / n) as u8,
                    ),
                    population: bucket.population,
                }
            })
            .collect();
        swatches.sort_by(|a, b| b.population.cmp(&a.population));

        Self { swatches }
    }

    /// The most populous saturated, mid-lightness swatch, if any.
    pub fn vibrant_swatch(&self) -> Option<Swatch> {
        self.swatches.iter().copied().find(Swatch::is_vibrant)
    }

    /// The most populous swatch overall.
    pub fn dominant_swatch(&self) -> Option<Swatch> {
        self.swatches.first().copied()
    }
}

/// Vibrant swatch if one exists, dominant otherwise. Pure with respect to the
/// pixel data, so concurrent extraction over distinct images needs no
/// coordination.
pub fn extract_color(image: &RgbaImage) -> Result<u32, ExtractionError> {
    let palette = ColorPalette::from_image(image);
    palette
        .vibrant_swatch()
        .or_else(|| palette.dominant_swatch())
        .map(|swatch| swatch.argb())
        .ok_or(ExtractionError::NoSwatch)
}

/// Decodes encoded image bytes (the remote sprite PNG) and extracts a color.
/// CPU-bound; callers run it under `spawn_blocking`.
pub fn extract_color_from_bytes(bytes: &[u8]) -> Result<u32, ExtractionError> {
    let decoded = image::load_from_memory(bytes)?;
    let sampled = if decoded.width() > MAX_SAMPLE_DIM || decoded.height() > MAX_SAMPLE_DIM {
        decoded.thumbnail(MAX_SAMPLE_DIM, MAX_SAMPLE_DIM)
    } else {
        decoded
    };
    extract_color(&sampled.to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba(rgba))
    }

    #[test]
    fn vibrant_swatch_wins_over_a_larger_dull_population() {
        // 3/4 dull gray, 1/4 saturated red. Dominant is the gray; vibrant
        // must still be preferred.
        let mut image = solid(16, 16, [0x80, 0x80, 0x80, 0xFF]);
        for y in 0..8 {
            for x in 0..8 {
                image.put_pixel(x, y, Rgba([0xE0, 0x20, 0x20, 0xFF]));
            }
        }

        let palette = ColorPalette::from_image(&image);
        assert_eq!(palette.dominant_swatch().unwrap().rgb, (0x80, 0x80, 0x80));
        assert_eq!(palette.vibrant_swatch().unwrap().rgb, (0xE0, 0x20, 0x20));
        assert_eq!(extract_color(&image).unwrap(), 0xFFE0_2020);
    }

    #[test]
    fn falls_back_to_dominant_when_nothing_is_vibrant() {
        // 0x112233 is dark and desaturated enough to never qualify as
        // vibrant, so extraction must return it via the dominant path.
        let image = solid(8, 8, [0x11, 0x22, 0x33, 0xFF]);

        let palette = ColorPalette::from_image(&image);
        assert!(palette.vibrant_swatch().is_none());
        assert_eq!(palette.dominant_swatch().unwrap().rgb, (0x11, 0x22, 0x33));
        assert_eq!(extract_color(&image).unwrap(), 0xFF11_2233);
    }

    #[test]
    fn fully_transparent_image_has_no_swatch() {
        let image = solid(8, 8, [0xFF, 0x00, 0x00, 0x00]);
        let palette = ColorPalette::from_image(&image);
        assert!(palette.dominant_swatch().is_none());
        assert!(matches!(
            extract_color(&image),
            Err(ExtractionError::NoSwatch)
        ));
    }

    #[test]
    fn dominant_is_the_most_populous_bucket() {
        let mut image = solid(10, 10, [0x10, 0xA0, 0x10, 0xFF]);
        // A minority of a very different color.
        for x in 0..3 {
            image.put_pixel(x, 0, Rgba([0x00, 0x00, 0xF0, 0xFF]));
        }
        let palette = ColorPalette::from_image(&image);
        assert_eq!(palette.dominant_swatch().unwrap().rgb, (0x10, 0xA0, 0x10));
        assert_eq!(palette.dominant_swatch().unwrap().population, 97);
    }

    #[test]
    fn undecodable_bytes_are_a_decode_error() {
        assert!(matches!(
            extract_color_from_bytes(b"definitely not a png"),
            Err(ExtractionError::Decode(_))
        ));
    }

    #[test]
    fn argb_packs_an_opaque_pixel() {
        let swatch = Swatch {
            rgb: (0x11, 0x22, 0x33),
            population: 1,
        };
        assert_eq!(swatch.argb(), 0xFF11_2233);
    }
}
