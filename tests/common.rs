#![allow(dead_code)]

use image::{ImageFormat, Rgba, RgbaImage};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub fn write_test_image(path: &Path, width: u32, height: u32) {
    let format = ImageFormat::from_path(path).unwrap_or(ImageFormat::Png);
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 5) as u8, (y * 3) as u8, ((x + y) * 2) as u8, 255])
    });
    match format {
        // JPEG has no alpha channel
        ImageFormat::Jpeg => image::DynamicImage::ImageRgba8(img)
            .to_rgb8()
            .save_with_format(path, format)
            .unwrap(),
        _ => img.save_with_format(path, format).unwrap(),
    }
}

pub fn create_test_image_files(temp_dir: &Path) -> Vec<PathBuf> {
    let png_file = temp_dir.join("test.png");
    let jpg_file = temp_dir.join("photo.jpg");
    let txt_file = temp_dir.join("notes.txt");

    write_test_image(&png_file, 32, 24);
    write_test_image(&jpg_file, 20, 20);
    File::create(&txt_file)
        .unwrap()
        .write_all(b"not an image")
        .unwrap();

    vec![png_file, jpg_file, txt_file]
}

pub fn create_nested_directory_structure(temp_dir: &Path) -> PathBuf {
    let subdir = temp_dir.join("subdir");
    std::fs::create_dir(&subdir).unwrap();

    write_test_image(&subdir.join("nested.png"), 16, 16);
    File::create(subdir.join("nested.txt"))
        .unwrap()
        .write_all(b"nested text")
        .unwrap();

    subdir
}

pub fn create_broken_image(temp_dir: &Path, name: &str) -> PathBuf {
    let path = temp_dir.join(name);
    File::create(&path)
        .unwrap()
        .write_all(b"fake image data")
        .unwrap();
    path
}

pub fn create_temp_directory() -> TempDir {
    TempDir::new().unwrap()
}

pub fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
