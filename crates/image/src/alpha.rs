//! Alpha channel flattening for formats without transparency.

use image::{DynamicImage, GenericImageView, ImageBuffer, Rgb, Rgba};

/// Background used when flattening for JPEG output
pub const WHITE: [u8; 3] = [255, 255, 255];

/// Composite an image over a solid background, dropping the alpha channel.
pub fn flatten_alpha(img: &DynamicImage, background_color: [u8; 3]) -> DynamicImage {
    if !has_alpha_channel(img) {
        return DynamicImage::ImageRgb8(img.to_rgb8());
    }

    let (width, height) = img.dimensions();
    let rgba_img = img.to_rgba8();

    let mut output = ImageBuffer::new(width, height);

    for (x, y, pixel) in rgba_img.enumerate_pixels() {
        let Rgba([r, g, b, a]) = *pixel;

        let alpha = f32::from(a) / 255.0;
        let blend = |c: u8, bg: u8| (f32::from(c) * alpha + f32::from(bg) * (1.0 - alpha)).round() as u8;

        output.put_pixel(
            x,
            y,
            Rgb([
                blend(r, background_color[0]),
                blend(g, background_color[1]),
                blend(b, background_color[2]),
            ]),
        );
    }

    DynamicImage::ImageRgb8(output)
}

/// Check if an image has an alpha channel
pub fn has_alpha_channel(img: &DynamicImage) -> bool {
    img.color().has_alpha()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    #[test]
    fn test_flatten_white_background() {
        let mut img = RgbaImage::new(2, 2);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255])); // Opaque red
        img.put_pixel(0, 1, Rgba([0, 255, 0, 128])); // Semi-transparent green
        img.put_pixel(1, 0, Rgba([0, 0, 255, 0])); // Fully transparent blue
        img.put_pixel(1, 1, Rgba([255, 255, 0, 255])); // Opaque yellow

        let result = flatten_alpha(&DynamicImage::ImageRgba8(img), WHITE).to_rgb8();

        assert_eq!(result.get_pixel(0, 0), &Rgb([255, 0, 0]));
        assert_eq!(result.get_pixel(0, 1), &Rgb([127, 255, 127]));
        assert_eq!(result.get_pixel(1, 0), &Rgb([255, 255, 255]));
        assert_eq!(result.get_pixel(1, 1), &Rgb([255, 255, 0]));
    }

    #[test]
    fn test_flatten_without_alpha_is_lossless() {
        let mut img = image::RgbImage::new(1, 1);
        img.put_pixel(0, 0, Rgb([10, 20, 30]));
        let result = flatten_alpha(&DynamicImage::ImageRgb8(img), WHITE);
        assert_eq!(result.to_rgb8().get_pixel(0, 0), &Rgb([10, 20, 30]));
    }

    #[test]
    fn test_has_alpha_channel() {
        let rgba_img = DynamicImage::ImageRgba8(RgbaImage::new(1, 1));
        assert!(has_alpha_channel(&rgba_img));

        let rgb_img = DynamicImage::ImageRgb8(image::RgbImage::new(1, 1));
        assert!(!has_alpha_channel(&rgb_img));
    }
}
