use std::io::Cursor;
use std::path::PathBuf;

use image::{ImageFormat, Rgb, RgbImage};

pub fn fixture_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(relative)
}

pub fn load_fixture(relative: &str) -> String {
    std::fs::read_to_string(fixture_path(relative))
        .unwrap_or_else(|_| panic!("Failed to load fixture: {}", relative))
}

/// Small solid-colour image encoded in `format`
pub fn image_bytes(format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_pixel(8, 6, Rgb([200, 30, 30]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format)
        .unwrap_or_else(|e| panic!("Failed to encode test image as {:?}: {}", format, e));
    out.into_inner()
}

pub fn jpeg_bytes() -> Vec<u8> {
    image_bytes(ImageFormat::Jpeg)
}

pub fn png_bytes() -> Vec<u8> {
    image_bytes(ImageFormat::Png)
}

/// Home page whose logo is `<img alt="logo" src=...>`
pub fn home_page_with_logo(src: &str) -> String {
    load_fixture("sites/home_alt_logo.html").replace("{{LOGO_SRC}}", src)
}
