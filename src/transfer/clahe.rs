//! Contrast-limited adaptive histogram equalization on lightness
//!
//! The lightness plane is padded (reflect-101) to a multiple of the tile
//! grid and cut into equal tiles. Each tile gets its own clipped-histogram
//! lookup table; every output pixel bilinearly mixes the tables of the four
//! tiles whose centers surround it.

use crate::buffer::{LabPlanes, PixelBuffer};
use crate::color::ColorConverter;
use crate::config::TileGrid;
use crate::constants::clahe::{HISTOGRAM_BINS, MAX_LEVEL};
use crate::error::{Result, TransferError};
use crate::parallel;

type Lut = [u8; HISTOGRAM_BINS];

/// Tile-based CLAHE applied to the lightness channel only
#[derive(Debug, Clone)]
pub struct LocalContrastEnhancer {
    clip_limit: f32,
    tile_grid: TileGrid,
    converter: ColorConverter,
}

impl LocalContrastEnhancer {
    pub fn new(clip_limit: f32, tile_grid: TileGrid) -> Result<Self> {
        Self::with_converter(clip_limit, tile_grid, ColorConverter::new())
    }

    pub fn with_converter(
        clip_limit: f32,
        tile_grid: TileGrid,
        converter: ColorConverter,
    ) -> Result<Self> {
        if !clip_limit.is_finite() || clip_limit < 0.0 {
            return Err(TransferError::invalid_parameter("clip_limit", clip_limit));
        }
        if tile_grid.columns == 0 || tile_grid.rows == 0 {
            return Err(TransferError::invalid_parameter(
                "tile_grid",
                format!("{}x{}", tile_grid.columns, tile_grid.rows),
            ));
        }
        Ok(Self {
            clip_limit,
            tile_grid,
            converter,
        })
    }

    /// Equalize the lightness of a device image, keeping its chroma
    pub fn enhance(&self, image: &PixelBuffer) -> Result<PixelBuffer> {
        let planes = self.converter.to_perceptual(image)?;
        let (width, height) = planes.dimensions();
        let (lightness, a, b) = planes.into_planes();

        let quantized: Vec<u8> = lightness
            .iter()
            .map(|&l| l.round().clamp(0.0, MAX_LEVEL) as u8)
            .collect();
        let equalized = self.equalize(&quantized, width, height)?;

        let enhanced = LabPlanes::from_planes(
            width,
            height,
            equalized.into_iter().map(f32::from).collect(),
            a,
            b,
        )?;
        self.converter.to_device(&enhanced)
    }

    /// Equalize an 8-bit plane of `width * height` values
    pub fn equalize(&self, plane: &[u8], width: usize, height: usize) -> Result<Vec<u8>> {
        if width == 0 || height == 0 || plane.len() != width * height {
            return Err(TransferError::invalid_buffer(format!(
                "lightness plane of {} values does not match {}x{}",
                plane.len(),
                width,
                height
            )));
        }

        // Never more tiles than pixels along an axis
        let tiles_x = self.tile_grid.columns.min(width);
        let tiles_y = self.tile_grid.rows.min(height);
        let tile_w = width.div_ceil(tiles_x);
        let tile_h = height.div_ceil(tiles_y);
        let padded_w = tile_w * tiles_x;
        let padded_h = tile_h * tiles_y;
        let parallel = parallel::should_parallelize(padded_w * padded_h);

        let padded = pad_reflect_101(plane, width, height, padded_w, padded_h);
        let clip = self.absolute_clip(tile_w * tile_h);

        let luts: Vec<Lut> = parallel::map_range(tiles_x * tiles_y, parallel, |t| {
            let (tx, ty) = (t % tiles_x, t / tiles_x);
            tile_lut(&padded, padded_w, tx * tile_w, ty * tile_h, tile_w, tile_h, clip)
        });

        let inv_tile_w = 1.0 / tile_w as f32;
        let inv_tile_h = 1.0 / tile_h as f32;

        let rows = parallel::map_range(height, parallel, |y| {
            let (ty1, ty2, ya) = neighbours(y, inv_tile_h, tiles_y);
            let row = &plane[y * width..(y + 1) * width];
            row.iter()
                .enumerate()
                .map(|(x, &v)| {
                    let (tx1, tx2, xa) = neighbours(x, inv_tile_w, tiles_x);
                    let v = v as usize;
                    let top = luts[ty1 * tiles_x + tx1][v] as f32 * (1.0 - xa)
                        + luts[ty1 * tiles_x + tx2][v] as f32 * xa;
                    let bottom = luts[ty2 * tiles_x + tx1][v] as f32 * (1.0 - xa)
                        + luts[ty2 * tiles_x + tx2][v] as f32 * xa;
                    (top * (1.0 - ya) + bottom * ya).round().clamp(0.0, MAX_LEVEL) as u8
                })
                .collect::<Vec<u8>>()
        });

        Ok(rows.concat())
    }

    /// Per-bin count cap for a tile of `tile_area` pixels, `None` when clipping is off
    fn absolute_clip(&self, tile_area: usize) -> Option<u32> {
        if self.clip_limit > 0.0 {
            let clip = (self.clip_limit * tile_area as f32 / HISTOGRAM_BINS as f32) as u32;
            Some(clip.max(1))
        } else {
            None
        }
    }
}

/// Surrounding tile indices and the weight of the second one for coordinate `pos`
fn neighbours(pos: usize, inv_tile: f32, tiles: usize) -> (usize, usize, f32) {
    let f = pos as f32 * inv_tile - 0.5;
    let first = f.floor();
    let weight = f - first;
    let first = first as isize;
    let last = tiles as isize - 1;
    (
        first.clamp(0, last) as usize,
        (first + 1).clamp(0, last) as usize,
        weight,
    )
}

/// Mirror index `i` into `0..n` without repeating the edge sample
fn reflect_101(i: usize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let period = 2 * (n - 1);
    let m = i % period;
    if m < n {
        m
    } else {
        period - m
    }
}

fn pad_reflect_101(
    plane: &[u8],
    width: usize,
    height: usize,
    padded_w: usize,
    padded_h: usize,
) -> Vec<u8> {
    if padded_w == width && padded_h == height {
        return plane.to_vec();
    }
    let mut padded = Vec::with_capacity(padded_w * padded_h);
    for y in 0..padded_h {
        let row = reflect_101(y, height) * width;
        for x in 0..padded_w {
            padded.push(plane[row + reflect_101(x, width)]);
        }
    }
    padded
}

/// Lookup table of one tile; flat tiles map every level to itself
fn tile_lut(
    padded: &[u8],
    stride: usize,
    x0: usize,
    y0: usize,
    tile_w: usize,
    tile_h: usize,
    clip: Option<u32>,
) -> Lut {
    let mut hist = [0u32; HISTOGRAM_BINS];
    let first = padded[y0 * stride + x0];
    let mut flat = true;
    for y in y0..y0 + tile_h {
        for &v in &padded[y * stride + x0..y * stride + x0 + tile_w] {
            hist[v as usize] += 1;
            flat &= v == first;
        }
    }

    let mut lut = [0u8; HISTOGRAM_BINS];
    if flat {
        for (level, out) in lut.iter_mut().enumerate() {
            *out = level as u8;
        }
        return lut;
    }

    if let Some(clip) = clip {
        clip_histogram(&mut hist, clip);
    }

    let scale = MAX_LEVEL / (tile_w * tile_h) as f32;
    let mut sum = 0u32;
    for (bin, out) in hist.iter().zip(lut.iter_mut()) {
        sum += bin;
        *out = (sum as f32 * scale).round().min(MAX_LEVEL) as u8;
    }
    lut
}

/// Cap every bin at `clip` and spread the excess back over all bins
fn clip_histogram(hist: &mut [u32; HISTOGRAM_BINS], clip: u32) {
    let mut clipped = 0u32;
    for bin in hist.iter_mut() {
        if *bin > clip {
            clipped += *bin - clip;
            *bin = clip;
        }
    }

    let batch = clipped / HISTOGRAM_BINS as u32;
    let mut residual = clipped - batch * HISTOGRAM_BINS as u32;
    for bin in hist.iter_mut() {
        *bin += batch;
    }

    if residual > 0 {
        let step = (HISTOGRAM_BINS as u32 / residual).max(1) as usize;
        for bin in hist.iter_mut().step_by(step) {
            if residual == 0 {
                break;
            }
            *bin += 1;
            residual -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enhancer(clip_limit: f32) -> LocalContrastEnhancer {
        LocalContrastEnhancer::new(clip_limit, TileGrid::new(8, 8)).unwrap()
    }

    fn range(values: &[u8]) -> u8 {
        values.iter().max().unwrap() - values.iter().min().unwrap()
    }

    #[test]
    fn test_uniform_plane_unchanged() {
        let plane = vec![137u8; 100 * 100];
        let out = enhancer(2.0).equalize(&plane, 100, 100).unwrap();
        assert_eq!(out, plane);
    }

    #[test]
    fn test_low_contrast_gradient_is_stretched() {
        let (w, h) = (64, 64);
        let plane: Vec<u8> = (0..w * h).map(|i| 100 + ((i % w) / 2) as u8).collect();
        let out = enhancer(40.0).equalize(&plane, w, h).unwrap();
        assert_eq!(out.len(), plane.len());
        assert!(range(&out) > range(&plane));
    }

    #[test]
    fn test_tighter_clip_limits_gain() {
        let (w, h) = (64, 64);
        let plane: Vec<u8> = (0..w * h).map(|i| 100 + ((i % w) / 2) as u8).collect();
        let gentle = enhancer(1.0).equalize(&plane, w, h).unwrap();
        let strong = enhancer(40.0).equalize(&plane, w, h).unwrap();
        assert!(range(&gentle) <= range(&strong));
    }

    #[test]
    fn test_image_smaller_than_grid() {
        let plane = vec![10u8, 20, 30, 40, 50, 60];
        let out = enhancer(2.0).equalize(&plane, 3, 2).unwrap();
        assert_eq!(out.len(), 6);
    }

    #[test]
    fn test_grid_larger_than_image_is_capped() {
        let huge = LocalContrastEnhancer::new(2.0, TileGrid::new(10_000, 10_000)).unwrap();
        assert_eq!(huge.equalize(&[42], 1, 1).unwrap(), vec![42]);

        let plane = vec![10u8, 20, 30, 40, 50, 60];
        assert_eq!(huge.equalize(&plane, 3, 2).unwrap(), plane);
    }

    // 4x4 plane on a 2x2 grid: every tile is 2x2 and holds levels 10 and 200.
    // Left tiles: two of each. Right tiles: three 10s, one 200.
    fn two_level_plane() -> Vec<u8> {
        vec![
            10, 200, 10, 10, //
            200, 10, 10, 200, //
            10, 200, 10, 10, //
            200, 10, 10, 200,
        ]
    }

    #[test]
    fn test_two_by_two_grid_without_clipping() {
        let clahe = LocalContrastEnhancer::new(0.0, TileGrid::new(2, 2)).unwrap();
        let out = clahe.equalize(&two_level_plane(), 4, 4).unwrap();

        // Left LUT: 10 -> round(2 * 255 / 4) = 128, 200 -> 255
        // Right LUT: 10 -> round(3 * 255 / 4) = 191, 200 -> 255
        // Column 2 sits halfway between tile centers: (128 + 191) / 2 = 159.5 -> 160
        let expected = vec![
            128, 255, 160, 191, //
            255, 128, 160, 255, //
            128, 255, 160, 191, //
            255, 128, 160, 255,
        ];
        assert_eq!(out, expected);
    }

    #[test]
    fn test_two_by_two_grid_with_clipping() {
        // clip = max(1, int(2.0 * 4 / 256)) = 1; the two excess counts land on
        // bins 0 and 128, so both tiles end up with one count per occupied bin.
        let mut hist = [0u32; HISTOGRAM_BINS];
        hist[10] = 3;
        hist[200] = 1;
        clip_histogram(&mut hist, 1);
        assert_eq!((hist[0], hist[10], hist[128], hist[200]), (1, 1, 1, 1));
        assert_eq!(hist.iter().sum::<u32>(), 4);

        let clahe = LocalContrastEnhancer::new(2.0, TileGrid::new(2, 2)).unwrap();
        let out = clahe.equalize(&two_level_plane(), 4, 4).unwrap();
        let expected = vec![
            128, 255, 128, 128, //
            255, 128, 128, 255, //
            128, 255, 128, 128, //
            255, 128, 128, 255,
        ];
        assert_eq!(out, expected);
    }

    #[test]
    fn test_single_pixel() {
        let out = enhancer(2.0).equalize(&[42], 1, 1).unwrap();
        assert_eq!(out, vec![42]);
    }

    #[test]
    fn test_mismatched_plane_rejected() {
        assert!(matches!(
            enhancer(2.0).equalize(&[0; 10], 4, 4),
            Err(TransferError::InvalidBuffer { .. })
        ));
    }

    #[test]
    fn test_tile_lut_is_monotonic() {
        let tile: Vec<u8> = (0..64).map(|i| (i * 3) as u8).collect();
        for clip in [None, Some(1), Some(4)] {
            let lut = tile_lut(&tile, 8, 0, 0, 8, 8, clip);
            assert!(lut.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn test_flat_tile_lut_is_identity() {
        let tile = vec![77u8; 16];
        let lut = tile_lut(&tile, 4, 0, 0, 4, 4, Some(1));
        assert!(lut.iter().enumerate().all(|(i, &v)| v as usize == i));
    }

    #[test]
    fn test_clip_histogram_preserves_mass() {
        let mut hist = [0u32; HISTOGRAM_BINS];
        hist[10] = 500;
        hist[200] = 12;
        clip_histogram(&mut hist, 8);
        assert_eq!(hist.iter().sum::<u32>(), 512);
        assert!(hist[10] <= 8 + 2 + 1);
    }

    #[test]
    fn test_reflect_101() {
        assert_eq!(reflect_101(4, 5), 4);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(7, 5), 1);
        assert_eq!(reflect_101(3, 1), 0);
    }

    #[test]
    fn test_enhance_keeps_dimensions_and_gray_stays_neutral() {
        let image = PixelBuffer::filled(20, 12, [128, 128, 128]).unwrap();
        let out = enhancer(2.0).enhance(&image).unwrap();
        assert_eq!(out.dimensions(), (20, 12));
        for p in out.pixels() {
            for c in p {
                assert!((c as i16 - 128).abs() <= 2);
            }
        }
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(LocalContrastEnhancer::new(-1.0, TileGrid::new(8, 8)).is_err());
        assert!(LocalContrastEnhancer::new(2.0, TileGrid::new(8, 0)).is_err());
    }
}
