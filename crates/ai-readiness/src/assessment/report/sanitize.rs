/// Character substituted for anything the renderer's single-byte encoding cannot carry.
pub const PLACEHOLDER: char = '?';

/// Replace every character outside U+0000..=U+00FF with [`PLACEHOLDER`].
///
/// Nothing is dropped, so the output has exactly as many characters as the input,
/// and sanitizing twice is the same as sanitizing once.
pub fn sanitize_for_rendering(text: &str) -> String {
    text.chars()
        .map(|c| if is_renderable(c) { c } else { PLACEHOLDER })
        .collect()
}

pub fn is_renderable(c: char) -> bool {
    u32::from(c) <= 0xFF
}
