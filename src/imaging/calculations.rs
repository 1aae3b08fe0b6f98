//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate the output dimensions for a width-capped downscale.
///
/// The width is capped at `max_width`; the height follows the source aspect
/// ratio. Images narrower than the cap keep their dimensions (never upscale).
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `max_width` - Maximum output width in pixels
///
/// # Returns
/// * `(width, height)` - Output dimensions, each at least 1
///
/// # Examples
/// ```
/// # use realty_desk::imaging::calculate_target_dimensions;
/// // 4000x3000 capped at 1920 → 1920x1440
/// assert_eq!(calculate_target_dimensions((4000, 3000), 1920), (1920, 1440));
///
/// // 1200x800 is already narrow enough → unchanged
/// assert_eq!(calculate_target_dimensions((1200, 800), 1920), (1200, 800));
/// ```
pub fn calculate_target_dimensions(source: (u32, u32), max_width: u32) -> (u32, u32) {
    let (src_w, src_h) = source;

    if src_w <= max_width || src_w == 0 {
        return (src_w, src_h);
    }

    let ratio = max_width as f64 / src_w as f64;
    let h = (src_h as f64 * ratio).round().max(1.0) as u32;
    (max_width, h)
}

/// Convert a KiB threshold from config to bytes.
pub fn kib(value: u32) -> usize {
    value as usize * 1024
}
