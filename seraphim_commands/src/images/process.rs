//! Blocking image work. Everything here is meant to run inside `spawn_blocking`.

use std::io::Cursor;

use image::{
    codecs::{
        gif::{GifDecoder, GifEncoder, Repeat},
        jpeg::JpegEncoder,
        png::{CompressionType, FilterType as PngFilter, PngEncoder},
        webp::{WebPDecoder, WebPEncoder},
    },
    imageops::{self, FilterType},
    AnimationDecoder, DynamicImage, Frame,
};

use crate::utils::converters::ImageType;

const MAX_SIDE: u32 = 1920;

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Cannot convert an animated image to this file type!")]
    Animated,
    #[error("Could not process the image: {0}")]
    Image(#[from] image::ImageError),
}

#[derive(Clone, Copy, Debug)]
pub struct Options {
    pub shrink: bool,
    /// Only used by jpeg output, webp is always lossless.
    pub quality: u8,
}

/// How much an image gets divided by so its longest side fits in 1920px.
#[must_use]
pub fn shrink_factor(width: u32, height: u32) -> u32 {
    let bigger = width.max(height);
    if bigger > MAX_SIDE {
        bigger.div_ceil(MAX_SIDE)
    } else {
        1
    }
}

fn is_animated(bytes: &[u8], source: ImageType) -> Result<bool, ProcessError> {
    match source {
        ImageType::Gif => {
            let decoder = GifDecoder::new(Cursor::new(bytes))?;
            Ok(decoder.into_frames().take(2).count() > 1)
        }
        ImageType::Webp => Ok(WebPDecoder::new(Cursor::new(bytes))?.has_animation()),
        ImageType::Jpeg | ImageType::Png => Ok(false),
    }
}

fn decode_frames(bytes: &[u8], source: ImageType) -> Result<Vec<Frame>, ProcessError> {
    let frames = match source {
        ImageType::Gif => GifDecoder::new(Cursor::new(bytes))?
            .into_frames()
            .collect_frames()?,
        ImageType::Webp => WebPDecoder::new(Cursor::new(bytes))?
            .into_frames()
            .collect_frames()?,
        ImageType::Jpeg | ImageType::Png => return Err(ProcessError::Animated),
    };

    Ok(frames)
}

fn shrink_frame(frame: Frame, factor: u32) -> Frame {
    let delay = frame.delay();
    let (left, top) = (frame.left() / factor, frame.top() / factor);

    let buffer = frame.into_buffer();
    let resized = imageops::resize(
        &buffer,
        buffer.width().div_ceil(factor),
        buffer.height().div_ceil(factor),
        FilterType::Triangle,
    );

    Frame::from_parts(resized, left, top, delay)
}

fn encode_animation(frames: Vec<Frame>) -> Result<Vec<u8>, ProcessError> {
    let mut out = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut out);
        encoder.set_repeat(Repeat::Infinite)?;
        encoder.encode_frames(frames)?;
    }

    Ok(out)
}

fn encode(image: &DynamicImage, target: ImageType, quality: u8) -> Result<Vec<u8>, ProcessError> {
    let mut out = Vec::new();

    match target {
        ImageType::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
            image.to_rgb8().write_with_encoder(encoder)?;
        }
        ImageType::Png => {
            let encoder =
                PngEncoder::new_with_quality(&mut out, CompressionType::Best, PngFilter::Adaptive);
            image.write_with_encoder(encoder)?;
        }
        ImageType::Gif => {
            let mut encoder = GifEncoder::new(&mut out);
            encoder.encode_frame(Frame::new(image.to_rgba8()))?;
        }
        ImageType::Webp => {
            let encoder = WebPEncoder::new_lossless(&mut out);
            image.to_rgba8().write_with_encoder(encoder)?;
        }
    }

    Ok(out)
}

/// What happens to the frames of an animated image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Animation {
    Keep,
    /// Animated webp can't be written, so only the first frame is kept.
    FirstFrame,
    Refuse,
}

fn animation_for(target: ImageType) -> Animation {
    match target {
        ImageType::Gif => Animation::Keep,
        ImageType::Webp => Animation::FirstFrame,
        ImageType::Jpeg | ImageType::Png => Animation::Refuse,
    }
}

fn shrink_image(image: DynamicImage) -> DynamicImage {
    let factor = shrink_factor(image.width(), image.height());
    if factor == 1 {
        return image;
    }

    image.resize_exact(
        image.width().div_ceil(factor),
        image.height().div_ceil(factor),
        FilterType::Triangle,
    )
}

/// Re-encodes `bytes` from `source` into `target`, shrinking it first if asked to.
///
/// Animated images can only become gifs or webps. Gifs keep every frame.
pub fn process(
    bytes: &[u8],
    source: ImageType,
    target: ImageType,
    options: Options,
) -> Result<Vec<u8>, ProcessError> {
    let mut image = if source.can_animate() && is_animated(bytes, source)? {
        let frames = decode_frames(bytes, source)?;

        match animation_for(target) {
            Animation::Refuse => return Err(ProcessError::Animated),
            Animation::Keep => {
                let factor = frames
                    .first()
                    .filter(|_| options.shrink)
                    .map_or(1, |f| shrink_factor(f.buffer().width(), f.buffer().height()));

                let frames = if factor > 1 {
                    frames
                        .into_iter()
                        .map(|frame| shrink_frame(frame, factor))
                        .collect()
                } else {
                    frames
                };

                return encode_animation(frames);
            }
            Animation::FirstFrame => {
                let Some(first) = frames.into_iter().next() else {
                    return Err(ProcessError::Animated);
                };
                DynamicImage::ImageRgba8(first.into_buffer())
            }
        }
    } else {
        image::load_from_memory_with_format(bytes, source.format())?
    };

    if options.shrink {
        image = shrink_image(image);
    }

    encode(&image, target, options.quality)
}

/// Human readable size with binary units, `1.5 KiB` style.
#[must_use]
pub fn natural_size(bytes: u64) -> String {
    const UNITS: [&str; 8] = ["KiB", "MiB", "GiB", "TiB", "PiB", "EiB", "ZiB", "YiB"];

    if bytes == 1 {
        return String::from("1 Byte");
    }
    if bytes < 1024 {
        return format!("{bytes} Bytes");
    }

    #[allow(clippy::cast_precision_loss)]
    let mut size = bytes as f64;
    let mut unit = UNITS[0];
    for next in UNITS {
        size /= 1024.0;
        unit = next;
        if size < 1024.0 {
            break;
        }
    }

    format!("{size:.1} {unit}")
}

/// Percentage of `original` that was saved, rounded to two decimals.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn percent_saved(original: usize, reduced: usize) -> f64 {
    if original == 0 {
        return 0.0;
    }

    let saved = (1.0 - reduced as f64 / original as f64) * 100.0;
    (saved * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Delay, Rgba, RgbaImage};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            Rgba([200, 30, 60, 255]),
        ));
        encode(&image, ImageType::Png, 100).unwrap()
    }

    fn animated_gif() -> Vec<u8> {
        let frames = [Rgba([255, 0, 0, 255]), Rgba([0, 0, 255, 255])]
            .into_iter()
            .map(|colour| {
                Frame::from_parts(
                    RgbaImage::from_pixel(8, 8, colour),
                    0,
                    0,
                    Delay::from_numer_denom_ms(100, 1),
                )
            })
            .collect();

        encode_animation(frames).unwrap()
    }

    const OPTIONS: Options = Options {
        shrink: true,
        quality: 70,
    };

    #[test]
    fn shrink_factors() {
        assert_eq!(shrink_factor(1920, 1080), 1);
        assert_eq!(shrink_factor(1921, 10), 2);
        assert_eq!(shrink_factor(100, 4000), 3);
        assert_eq!(shrink_factor(3840, 3840), 2);
    }

    #[test]
    fn png_to_jpeg() {
        let out = process(&png(16, 16), ImageType::Png, ImageType::Jpeg, OPTIONS).unwrap();

        assert_eq!(&out[..2], &[0xFF, 0xD8]);
        assert_eq!(
            image::guess_format(&out).unwrap(),
            image::ImageFormat::Jpeg
        );
    }

    #[test]
    fn large_images_shrink() {
        let out = process(&png(4000, 100), ImageType::Png, ImageType::Png, OPTIONS).unwrap();
        let image = image::load_from_memory(&out).unwrap();

        assert_eq!((image.width(), image.height()), (1334, 34));

        let kept = process(
            &png(4000, 100),
            ImageType::Png,
            ImageType::Png,
            Options {
                shrink: false,
                quality: 70,
            },
        )
        .unwrap();
        assert_eq!(image::load_from_memory(&kept).unwrap().width(), 4000);
    }

    #[test]
    fn static_webp_and_gif_output() {
        let webp = process(&png(8, 8), ImageType::Png, ImageType::Webp, OPTIONS).unwrap();
        assert_eq!(image::guess_format(&webp).unwrap(), image::ImageFormat::WebP);

        let gif = process(&png(8, 8), ImageType::Png, ImageType::Gif, OPTIONS).unwrap();
        assert_eq!(image::guess_format(&gif).unwrap(), image::ImageFormat::Gif);
    }

    #[test]
    fn animated_images_stay_gifs() {
        let gif = animated_gif();

        let err = process(&gif, ImageType::Gif, ImageType::Png, OPTIONS).unwrap_err();
        assert!(matches!(err, ProcessError::Animated));
        assert_eq!(
            err.to_string(),
            "Cannot convert an animated image to this file type!"
        );

        let out = process(&gif, ImageType::Gif, ImageType::Gif, OPTIONS).unwrap();
        let frames = GifDecoder::new(Cursor::new(out.as_slice()))
            .unwrap()
            .into_frames()
            .collect_frames()
            .unwrap();
        assert_eq!(frames.len(), 2);
    }

    #[test]
    fn animated_gif_to_webp_keeps_first_frame() {
        let out = process(&animated_gif(), ImageType::Gif, ImageType::Webp, OPTIONS).unwrap();

        assert_eq!(image::guess_format(&out).unwrap(), image::ImageFormat::WebP);
        let image = image::load_from_memory(&out).unwrap();
        assert_eq!((image.width(), image.height()), (8, 8));
    }

    #[test]
    fn animation_targets() {
        assert_eq!(animation_for(ImageType::Gif), Animation::Keep);
        // webp sources and targets both land here, so webp to webp works.
        assert_eq!(animation_for(ImageType::Webp), Animation::FirstFrame);
        assert_eq!(animation_for(ImageType::Png), Animation::Refuse);
        assert_eq!(animation_for(ImageType::Jpeg), Animation::Refuse);
    }

    #[test]
    fn garbage_fails_to_decode() {
        let err = process(b"not an image", ImageType::Png, ImageType::Jpeg, OPTIONS).unwrap_err();
        assert!(matches!(err, ProcessError::Image(_)));
    }

    #[test]
    fn sizes() {
        assert_eq!(natural_size(1), "1 Byte");
        assert_eq!(natural_size(1000), "1000 Bytes");
        assert_eq!(natural_size(1536), "1.5 KiB");
        assert_eq!(natural_size(8_388_608), "8.0 MiB");
    }

    #[test]
    fn savings() {
        assert!((percent_saved(200, 150) - 25.0).abs() < f64::EPSILON);
        assert!((percent_saved(3, 2) - 33.33).abs() < 1e-9);
        assert!((percent_saved(100, 120) + 20.0).abs() < f64::EPSILON);
        assert!(percent_saved(0, 10).abs() < f64::EPSILON);
    }
}
