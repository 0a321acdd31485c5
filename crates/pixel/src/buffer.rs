//! RGBA pixel grid loaded from a CSV capture, with analysis queries.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::{Pixel, PixelCsvError};

/// On-disk representation a buffer was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvFormat {
    /// `x,y,r,g,b[,a]` header row plus one data row per pixel.
    Standard,
    /// One line per pixel row of `R###G###B###` or `#RRGGBB` tokens.
    RowMajor,
}

/// Min/max/average luminance over a buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrightnessStats {
    /// Darkest luma value present.
    pub min: u8,
    /// Brightest luma value present.
    pub max: u8,
    /// Mean luma over all pixels.
    pub average: f64,
}

/// An in-memory RGBA grid indexed as `[y][x]`.
///
/// Rows may be ragged when a row-major capture was truncated; `pixel` bounds
/// checks per row and [`PixelBuffer::validate`] reports inconsistent widths.
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    format: CsvFormat,
    rows: Vec<Vec<Pixel>>,
}

impl PixelBuffer {
    /// Loads a pixel CSV artifact, detecting the representation from the
    /// first non-comment line.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PixelCsvError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let content = fs::read_to_string(path).map_err(|source| PixelCsvError::Io {
            path: display.clone(),
            source,
        })?;

        let lines: Vec<(usize, &str)> = content
            .lines()
            .enumerate()
            .map(|(index, line)| (index + 1, line.trim_end()))
            .filter(|(_, line)| !line.is_empty() && (!line.starts_with('#') || is_hex_row(line)))
            .collect();

        if lines.is_empty() {
            return Err(PixelCsvError::Empty(display));
        }

        let first = lines[0].1;
        if first.starts_with("x,y,r") {
            Self::from_standard_rows(&display, &lines[1..])
        } else if first.contains(',') {
            Self::from_row_major_rows(&display, &lines)
        } else {
            Err(PixelCsvError::UnrecognizedFormat(display))
        }
    }

    fn from_standard_rows(path: &str, rows: &[(usize, &str)]) -> Result<Self, PixelCsvError> {
        let mut grid: Vec<Vec<Pixel>> = Vec::new();
        let mut width = 0u32;
        let mut height = 0u32;

        for &(line, row) in rows {
            let fields: Vec<&str> = row.split(',').map(str::trim).collect();
            if fields.len() < 5 {
                return Err(PixelCsvError::MalformedRow {
                    path: path.to_string(),
                    line,
                    detail: format!("expected at least 5 comma-separated fields, found {}", fields.len()),
                });
            }

            let coordinate = |index: usize| -> Result<u32, PixelCsvError> {
                fields[index].parse::<u32>().map_err(|_| PixelCsvError::MalformedRow {
                    path: path.to_string(),
                    line,
                    detail: format!("'{}' is not an unsigned integer", fields[index]),
                })
            };

            let x = coordinate(0)?;
            let y = coordinate(1)?;
            let r = coordinate(2)? as u8;
            let g = coordinate(3)? as u8;
            let b = coordinate(4)? as u8;
            let a = if fields.len() > 5 && !fields[5].is_empty() {
                coordinate(5)? as u8
            } else {
                255
            };

            width = width.max(x + 1);
            height = height.max(y + 1);
            if grid.len() <= y as usize {
                grid.resize_with(y as usize + 1, Vec::new);
            }
            let grid_row = &mut grid[y as usize];
            if grid_row.len() <= x as usize {
                grid_row.resize(x as usize + 1, Pixel::default());
            }
            grid_row[x as usize] = Pixel::rgba(r, g, b, a);
        }

        if grid.is_empty() {
            return Err(PixelCsvError::Empty(path.to_string()));
        }

        Ok(Self {
            width,
            height,
            format: CsvFormat::Standard,
            rows: grid,
        })
    }

    fn from_row_major_rows(path: &str, rows: &[(usize, &str)]) -> Result<Self, PixelCsvError> {
        let mut grid: Vec<Vec<Pixel>> = Vec::new();
        let mut width = 0u32;

        for &(line, row) in rows {
            let mut pixels = Vec::new();
            for token in row.split(',').map(str::trim).filter(|token| !token.is_empty()) {
                let pixel = parse_color_token(token).ok_or_else(|| PixelCsvError::MalformedRow {
                    path: path.to_string(),
                    line,
                    detail: format!("'{token}' is neither R###G###B### nor #RRGGBB"),
                })?;
                pixels.push(pixel);
            }
            if !pixels.is_empty() {
                width = width.max(pixels.len() as u32);
                grid.push(pixels);
            }
        }

        if grid.is_empty() {
            return Err(PixelCsvError::Empty(path.to_string()));
        }

        let height = grid.len() as u32;
        Ok(Self {
            width,
            height,
            format: CsvFormat::RowMajor,
            rows: grid,
        })
    }

    /// Grid width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Representation the buffer was loaded from.
    pub fn format(&self) -> CsvFormat {
        self.format
    }

    /// Total number of pixels actually present.
    pub fn pixel_count(&self) -> u32 {
        self.rows.iter().map(|row| row.len() as u32).sum()
    }

    /// Pixel at `(x, y)`, or `None` outside the grid.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Pixel> {
        self.rows.get(y as usize)?.get(x as usize).copied()
    }

    /// All pixels inside the given region, clipped to the grid.
    pub fn region(&self, x0: u32, y0: u32, region_width: u32, region_height: u32) -> Vec<Pixel> {
        let mut pixels = Vec::new();
        for y in y0..y0.saturating_add(region_height).min(self.height) {
            for x in x0..x0.saturating_add(region_width).min(self.width) {
                if let Some(pixel) = self.pixel(x, y) {
                    pixels.push(pixel);
                }
            }
        }
        pixels
    }

    /// Channel-wise average color over a region; opaque black for an empty
    /// region.
    pub fn average_color(&self, x0: u32, y0: u32, region_width: u32, region_height: u32) -> Pixel {
        let region = self.region(x0, y0, region_width, region_height);
        if region.is_empty() {
            return Pixel::default();
        }
        let count = region.len() as u64;
        let mut sums = [0u64; 4];
        for pixel in &region {
            sums[0] += u64::from(pixel.r);
            sums[1] += u64::from(pixel.g);
            sums[2] += u64::from(pixel.b);
            sums[3] += u64::from(pixel.a);
        }
        Pixel::rgba(
            (sums[0] / count) as u8,
            (sums[1] / count) as u8,
            (sums[2] / count) as u8,
            (sums[3] / count) as u8,
        )
    }

    /// Number of pixels exactly equal to `color`.
    pub fn count_pixels(&self, color: Pixel) -> u32 {
        self.pixels().filter(|pixel| *pixel == color).count() as u32
    }

    /// Number of pixels within `tolerance` of `color` on every channel.
    pub fn count_pixels_with_tolerance(&self, color: Pixel, tolerance: u8) -> u32 {
        self.pixels().filter(|pixel| pixel.matches_with_tolerance(color, tolerance)).count() as u32
    }

    /// Number of pixels whose brightest color channel exceeds `channel_floor`.
    pub fn count_non_black(&self, channel_floor: u8) -> u32 {
        self.pixels().filter(|pixel| pixel.max_channel() > channel_floor).count() as u32
    }

    /// Histogram of packed-ARGB colors to occurrence counts.
    pub fn color_histogram(&self) -> BTreeMap<u32, u32> {
        let mut histogram = BTreeMap::new();
        for pixel in self.pixels() {
            *histogram.entry(pixel.to_argb()).or_insert(0) += 1;
        }
        histogram
    }

    /// Min/max/average luminance over the whole buffer.
    pub fn brightness_stats(&self) -> BrightnessStats {
        let mut stats = BrightnessStats {
            min: 255,
            max: 0,
            average: 0.0,
        };
        let mut sum = 0.0f64;
        let mut count = 0u32;
        for pixel in self.pixels() {
            let luma = pixel.luminance();
            stats.min = stats.min.min(luma);
            stats.max = stats.max.max(luma);
            sum += f64::from(luma);
            count += 1;
        }
        if count > 0 {
            stats.average = sum / f64::from(count);
        } else {
            stats.min = 0;
        }
        stats
    }

    /// True iff at least 90% of pixels have luminance strictly below
    /// `brightness_threshold`. An empty buffer counts as empty.
    pub fn is_mostly_empty(&self, brightness_threshold: u8) -> bool {
        let total = self.pixel_count() as u64;
        if total == 0 {
            return true;
        }
        let dark = self.pixels().filter(|pixel| pixel.luminance() < brightness_threshold).count() as u64;
        dark * 10 >= total * 9
    }

    /// True when the luminance spread (max - min) reaches `min_diff`.
    pub fn has_significant_variation(&self, min_diff: u8) -> bool {
        let stats = self.brightness_stats();
        u32::from(stats.max).saturating_sub(u32::from(stats.min)) >= u32::from(min_diff)
    }

    /// Percentage (0-100) of pixels with alpha above 127.
    pub fn opacity_percentage(&self) -> f64 {
        let total = self.pixel_count();
        if total == 0 {
            return 0.0;
        }
        let opaque = self.pixels().filter(|pixel| pixel.a > 127).count() as u32;
        100.0 * f64::from(opaque) / f64::from(total)
    }

    /// True when the grid is exactly the expected size.
    pub fn verify_dimensions(&self, expected_width: u32, expected_height: u32) -> bool {
        self.width == expected_width && self.height == expected_height
    }

    /// Structural check: non-empty with every row the same width.
    pub fn validate(&self) -> bool {
        if self.rows.is_empty() {
            return false;
        }
        let expected = self.rows[0].len();
        self.rows.iter().all(|row| row.len() == expected) && self.width > 0 && self.height > 0
    }

    /// Human-readable statistics block for diagnostics.
    pub fn summary(&self) -> String {
        let mut text = String::new();
        let histogram = self.color_histogram();
        let brightness = self.brightness_stats();
        let _ = writeln!(text, "Dimensions: {}x{}", self.width, self.height);
        let _ = writeln!(text, "Total Pixels: {}", self.pixel_count());
        let _ = writeln!(text, "Unique Colors: {}", histogram.len());
        let _ = writeln!(
            text,
            "Brightness - Min: {}, Max: {}, Avg: {:.1}",
            brightness.min, brightness.max, brightness.average
        );
        let _ = writeln!(text, "Opacity: {:.1}%", self.opacity_percentage());
        text
    }

    fn pixels(&self) -> impl Iterator<Item = Pixel> + '_ {
        self.rows.iter().flatten().copied()
    }
}

fn is_hex_row(line: &str) -> bool {
    line.starts_with('#') && line.len() > 1 && line.as_bytes()[1].is_ascii_hexdigit() && line.contains(',')
}

fn parse_color_token(token: &str) -> Option<Pixel> {
    if let Some(hex) = token.strip_prefix('#') {
        if hex.len() != 6 {
            return None;
        }
        let value = u32::from_str_radix(hex, 16).ok()?;
        return Some(Pixel::rgb((value >> 16) as u8, (value >> 8) as u8, value as u8));
    }

    let r_pos = token.find('R')?;
    let g_pos = token.find('G')?;
    let b_pos = token.find('B')?;
    if r_pos >= g_pos || g_pos >= b_pos {
        return None;
    }
    let r = token[r_pos + 1..g_pos].parse::<u8>().ok()?;
    let g = token[g_pos + 1..b_pos].parse::<u8>().ok()?;
    let b = token[b_pos + 1..].parse::<u8>().ok()?;
    Some(Pixel::rgb(r, g, b))
}
