use image::{imageops, RgbImage};
use image_compare::Algorithm;
use slidewatch_common::config::FilterConfig;

use super::traits::{CompareError, FrameComparator, Verdict};

/// Structural-similarity (SSIM) scene change comparator.
///
/// Both frames are reduced to luma and scored with `image_compare`'s
/// windowed SSIM, which averages the local luminance, contrast and structure
/// terms over the whole frame. Identical frames short-circuit to exactly 1.0.
pub struct SsimComparator {
    threshold: f64,
}

impl SsimComparator {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn from_config(config: &FilterConfig) -> Self {
        Self::new(config.similarity_threshold)
    }
}

impl FrameComparator for SsimComparator {
    fn compare(&self, current: &RgbImage, reference: &RgbImage) -> Result<f64, CompareError> {
        if current.dimensions() != reference.dimensions() {
            return Err(CompareError::DimensionMismatch {
                current: current.dimensions(),
                reference: reference.dimensions(),
            });
        }
        let (width, height) = current.dimensions();
        if width == 0 || height == 0 || current == reference {
            return Ok(1.0);
        }

        let a = imageops::grayscale(current);
        let b = imageops::grayscale(reference);
        let similarity = image_compare::gray_similarity_structure(&Algorithm::MSSIMSimple, &a, &b)
            .map_err(|e| CompareError::Metric(format!("{e:?}")))?;
        Ok(similarity.score)
    }

    fn classify(&self, score: f64) -> Verdict {
        if score > self.threshold {
            Verdict::Same
        } else {
            Verdict::Different
        }
    }

    fn name(&self) -> &str {
        "ssim"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn comparator() -> SsimComparator {
        SsimComparator::from_config(&FilterConfig::default())
    }

    fn solid(width: u32, height: u32, value: u8) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb([value, value, value]))
    }

    /// Slide-like content: a busy but deterministic pattern.
    fn pattern(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            let v = ((x * 7 + y * 13) % 256) as u8;
            Rgb([v, v.wrapping_mul(3), 255 - v])
        })
    }

    #[test]
    fn identical_frames_score_one() {
        let c = comparator();
        let img = pattern(64, 48);
        let score = c.compare(&img, &img.clone()).unwrap();
        assert_eq!(score, 1.0);
        assert_eq!(c.classify(score), Verdict::Same);

        let flat = solid(20, 20, 128);
        assert_eq!(c.compare(&flat, &flat).unwrap(), 1.0);
    }

    #[test]
    fn black_and_white_are_different() {
        let c = comparator();
        let score = c.compare(&solid(32, 32, 0), &solid(32, 32, 255)).unwrap();
        assert!(score < 0.85, "score {score} should be below the threshold");
        assert!(score < 0.01);
        assert_eq!(c.classify(score), Verdict::Different);
    }

    #[test]
    fn a_single_changed_pixel_is_still_the_same() {
        let c = comparator();
        let a = pattern(64, 64);
        let mut b = a.clone();
        b.put_pixel(30, 30, Rgb([0, 0, 0]));
        let score = c.compare(&b, &a).unwrap();
        assert!(score < 1.0);
        assert_eq!(c.classify(score), Verdict::Same);
    }

    #[test]
    fn new_content_is_different() {
        let c = comparator();
        let stripes = |horizontal: bool| {
            RgbImage::from_fn(64, 64, move |x, y| {
                let along = if horizontal { y } else { x };
                let v = if (along / 4) % 2 == 0 { 0 } else { 255 };
                Rgb([v, v, v])
            })
        };
        let (a, b) = (stripes(true), stripes(false));
        let score = c.compare(&b, &a).unwrap();
        assert_eq!(c.classify(score), Verdict::Different, "score {score}");
    }

    #[test]
    fn score_is_symmetric_and_deterministic() {
        let c = comparator();
        let a = pattern(40, 30);
        let b = solid(40, 30, 90);
        let ab = c.compare(&a, &b).unwrap();
        assert!((ab - c.compare(&b, &a).unwrap()).abs() < 1e-9);
        assert!((ab - c.compare(&a, &b).unwrap()).abs() < 1e-9);
        assert!(ab < 1.0);
    }

    #[test]
    fn mismatched_dimensions_are_rejected() {
        let err = comparator()
            .compare(&solid(10, 10, 0), &solid(10, 11, 0))
            .unwrap_err();
        assert!(matches!(
            err,
            CompareError::DimensionMismatch {
                current: (10, 10),
                reference: (10, 11)
            }
        ));
    }

    #[test]
    fn frames_smaller_than_one_window() {
        let c = comparator();
        let a = pattern(3, 2);
        assert_eq!(c.compare(&a, &a).unwrap(), 1.0);
        assert!(c.compare(&solid(3, 2, 0), &solid(3, 2, 255)).unwrap() < 0.85);
        assert_eq!(c.compare(&solid(0, 0, 0), &solid(0, 0, 0)).unwrap(), 1.0);
    }

    #[test]
    fn classify_is_a_pure_threshold() {
        let c = SsimComparator::new(0.85);
        assert_eq!(c.classify(0.95), Verdict::Same);
        assert_eq!(c.classify(0.85), Verdict::Different);
        assert_eq!(c.classify(0.40), Verdict::Different);
        for _ in 0..3 {
            assert_eq!(c.classify(0.86), Verdict::Same);
        }
        assert_eq!(SsimComparator::new(0.99).classify(0.95), Verdict::Different);
    }
}
