use base64::{Engine as _, engine::general_purpose::STANDARD};
use futures::future::join_all;
use image::{codecs::jpeg::JpegEncoder, imageops::FilterType};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("could not decode image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("could not encode image: {0}")]
    Encode(#[source] image::ImageError),
    #[error("image worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy)]
pub struct ImageOptions {
    pub max_width: u32,
    pub quality: u8,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            max_width: 300,
            quality: 70,
        }
    }
}

/// Decodes `bytes`, shrinks it to `max_width` if wider, and re-encodes it as a
/// JPEG data URI.
pub fn downscale_to_data_uri(bytes: &[u8], options: ImageOptions) -> Result<String, ImageError> {
    let img = image::load_from_memory(bytes).map_err(ImageError::Decode)?;
    let img = if img.width() > options.max_width {
        img.resize(options.max_width, u32::MAX, FilterType::Triangle)
    } else {
        img
    };

    let rgb = img.to_rgb8();
    let mut encoded = Vec::new();
    JpegEncoder::new_with_quality(&mut encoded, options.quality)
        .encode_image(&rgb)
        .map_err(ImageError::Encode)?;

    Ok(format!("data:image/jpeg;base64,{}", STANDARD.encode(&encoded)))
}

/// Processes every image on the blocking pool at once. Results keep the order
/// of `files`, whatever order the workers finish in.
pub async fn process_batch(
    files: Vec<UploadedImage>,
    options: ImageOptions,
) -> Vec<(String, Result<String, ImageError>)> {
    let tasks = files.into_iter().map(|file| async move {
        let UploadedImage { name, bytes } = file;
        let result = tokio::task::spawn_blocking(move || downscale_to_data_uri(&bytes, options))
            .await
            .map_err(ImageError::from)
            .and_then(|result| result);
        if let Err(err) = &result {
            warn!(file = %name, "image processing failed: {err}");
        }
        (name, result)
    });
    join_all(tasks).await
}

/// Splits a `data:<mime>;base64,<payload>` URI.
pub fn split_data_uri(uri: &str) -> Option<(&str, &str)> {
    let (header, payload) = uri.split_once(',')?;
    let mime = header.strip_prefix("data:")?.split(';').next()?;
    if mime.is_empty() || payload.is_empty() {
        return None;
    }
    Some((mime, payload))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{ImageBuffer, ImageFormat, Rgb};
    use std::io::Cursor;

    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(width, height, Rgb([200u8, 40, 90]));
        let mut bytes = Cursor::new(Vec::new());
        img.write_to(&mut bytes, ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    fn decode_data_uri(uri: &str) -> image::DynamicImage {
        let (mime, payload) = split_data_uri(uri).unwrap();
        assert_eq!(mime, "image/jpeg");
        let bytes = STANDARD.decode(payload).unwrap();
        image::load_from_memory(&bytes).unwrap()
    }

    #[test]
    fn wide_images_are_scaled_to_max_width() {
        let uri = downscale_to_data_uri(&png_bytes(600, 200), ImageOptions::default()).unwrap();
        assert!(uri.starts_with("data:image/jpeg;base64,"));
        let img = decode_data_uri(&uri);
        assert_eq!(img.width(), 300);
        assert_eq!(img.height(), 100);
    }

    #[test]
    fn narrow_images_are_not_upscaled() {
        let uri = downscale_to_data_uri(&png_bytes(120, 80), ImageOptions::default()).unwrap();
        let img = decode_data_uri(&uri);
        assert_eq!((img.width(), img.height()), (120, 80));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let err = downscale_to_data_uri(b"definitely not an image", ImageOptions::default())
            .unwrap_err();
        assert!(matches!(err, ImageError::Decode(_)));
    }

    #[tokio::test]
    async fn batch_keeps_selection_order_and_isolates_failures() {
        let files = vec![
            UploadedImage { name: "a.png".into(), bytes: png_bytes(40, 40) },
            UploadedImage { name: "b.txt".into(), bytes: b"nope".to_vec() },
            UploadedImage { name: "c.png".into(), bytes: png_bytes(500, 50) },
        ];
        let results = process_batch(files, ImageOptions::default()).await;
        let names: Vec<_> = results.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["a.png", "b.txt", "c.png"]);
        assert!(results[0].1.is_ok());
        assert!(results[1].1.is_err());
        assert_eq!(decode_data_uri(results[2].1.as_ref().unwrap()).width(), 300);
    }

    #[test]
    fn data_uri_parts() {
        assert_eq!(
            split_data_uri("data:image/png;base64,AAAA"),
            Some(("image/png", "AAAA"))
        );
        assert_eq!(split_data_uri("b64"), None);
        assert_eq!(split_data_uri("data:;base64,AAAA"), None);
        assert_eq!(split_data_uri("data:image/png;base64,"), None);
    }
}
