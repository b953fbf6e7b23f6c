//! # PNG Export
//!
//! Writes chunk textures, height fields and stitched world views to disk.

use std::path::Path;

use image::{ImageBuffer, Rgb, RgbImage};
use tessera_procedural::{HeightField, Image};
use tessera_streaming::{ChunkCoord, ChunkManager};

/// Converts a terrain texture into an encodable buffer.
#[must_use]
pub fn to_rgb_image(texture: &Image) -> RgbImage {
    let mut img: RgbImage = ImageBuffer::new(texture.width() as u32, texture.height() as u32);
    for (i, color) in texture.pixels().iter().enumerate() {
        let x = i % texture.width();
        let y = i / texture.width();
        img.put_pixel(x as u32, y as u32, Rgb(color.to_array()));
    }
    img
}

/// Saves a chunk texture as PNG.
///
/// # Errors
///
/// Returns the encoder's error if the file cannot be written.
pub fn save_texture(texture: &Image, path: impl AsRef<Path>) -> Result<(), image::ImageError> {
    let path = path.as_ref();
    to_rgb_image(texture).save(path)?;
    tracing::debug!("wrote texture {}", path.display());
    Ok(())
}

/// Saves a height field as greyscale, 0 black and 1 white.
///
/// # Errors
///
/// Returns the encoder's error if the file cannot be written.
pub fn save_heightmap(field: &HeightField, path: impl AsRef<Path>) -> Result<(), image::ImageError> {
    let path = path.as_ref();
    let mut img: RgbImage = ImageBuffer::new(field.width() as u32, field.height() as u32);
    for y in 0..field.height() {
        for x in 0..field.width() {
            let v = (field.get(x, y).clamp(0.0, 1.0) * 255.0).round() as u8;
            img.put_pixel(x as u32, y as u32, Rgb([v, v, v]));
        }
    }
    img.save(path)?;
    tracing::debug!("wrote heightmap {}", path.display());
    Ok(())
}

/// Stitches chunk textures into one image, north up.
///
/// Neighbouring chunks share their edge samples, so tiles overlap by one
/// pixel. Chunks without a texture stay black. Returns `None` when no tile
/// is given.
#[must_use]
pub fn mosaic<'a>(tiles: impl IntoIterator<Item = (ChunkCoord, &'a Image)>) -> Option<RgbImage> {
    let tiles: Vec<(ChunkCoord, &Image)> = tiles.into_iter().collect();
    let (_, first) = tiles.first()?;
    let (tile_w, tile_h) = (first.width(), first.height());
    let step_x = tile_w.saturating_sub(1).max(1);
    let step_y = tile_h.saturating_sub(1).max(1);

    let min_x = tiles.iter().map(|(c, _)| c.x).min()?;
    let max_x = tiles.iter().map(|(c, _)| c.x).max()?;
    let min_z = tiles.iter().map(|(c, _)| c.z).min()?;
    let max_z = tiles.iter().map(|(c, _)| c.z).max()?;

    let width = (max_x - min_x) as usize * step_x + tile_w;
    let height = (max_z - min_z) as usize * step_y + tile_h;
    let mut img: RgbImage = ImageBuffer::new(width as u32, height as u32);

    for (coord, tile) in tiles {
        // Higher z is further north, so it sits higher in the image
        let origin_x = (coord.x - min_x) as usize * step_x;
        let origin_y = (max_z - coord.z) as usize * step_y;
        for y in 0..tile.height().min(tile_h) {
            for x in 0..tile.width().min(tile_w) {
                let color = tile.pixel(x as i64, y as i64);
                img.put_pixel((origin_x + x) as u32, (origin_y + y) as u32, Rgb(color.to_array()));
            }
        }
    }
    Some(img)
}

/// Stitches every textured chunk the manager holds and saves the result.
///
/// Returns `Ok(false)` without writing anything if no chunk has a texture yet.
///
/// # Errors
///
/// Returns the encoder's error if the file cannot be written.
pub fn save_world_mosaic(manager: &ChunkManager, path: impl AsRef<Path>) -> Result<bool, image::ImageError> {
    let tiles = manager
        .chunks()
        .filter_map(|record| record.texture().map(|texture| (record.coord(), texture.as_ref())));
    let Some(img) = mosaic(tiles) else {
        return Ok(false);
    };
    let path = path.as_ref();
    img.save(path)?;
    tracing::info!("wrote {}x{} world mosaic to {}", img.width(), img.height(), path.display());
    Ok(true)
}
