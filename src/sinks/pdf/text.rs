//! Text in the standard Helvetica face.
//!
//! The title is the only text a PDF carries, so rather than embedding a font the
//! document uses the base-14 Helvetica with WinAnsi encoding. Measurement uses an
//! approximate width table, which is enough to centre a heading.

/// Encode `text` as WinAnsi (Windows-1252) bytes. Characters with no WinAnsi code
/// are replaced with `?`.
pub fn to_winansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            0x20..=0x7E | 0xA0..=0xFF => c as u8,
            0x20AC => 0x80,
            0x201A => 0x82,
            0x0192 => 0x83,
            0x201E => 0x84,
            0x2026 => 0x85,
            0x2020 => 0x86,
            0x2021 => 0x87,
            0x02C6 => 0x88,
            0x2030 => 0x89,
            0x0160 => 0x8A,
            0x2039 => 0x8B,
            0x0152 => 0x8C,
            0x017D => 0x8E,
            0x2018 => 0x91,
            0x2019 => 0x92,
            0x201C => 0x93,
            0x201D => 0x94,
            0x2022 => 0x95,
            0x2013 => 0x96,
            0x2014 => 0x97,
            0x02DC => 0x98,
            0x2122 => 0x99,
            0x0161 => 0x9A,
            0x203A => 0x9B,
            0x0153 => 0x9C,
            0x017E => 0x9E,
            0x0178 => 0x9F,
            _ => b'?',
        })
        .collect()
}

/// Helvetica advance of one WinAnsi byte in 1/1000 em.
fn helvetica_advance(byte: u8) -> f32 {
    match byte {
        b' ' => 278.0,
        b'!'..=b'/' => 333.0,
        b'0'..=b'9' => 556.0,
        b':'..=b'@' => 333.0,
        b'I' | b'J' => 278.0,
        b'M' | b'W' => 833.0,
        b'A'..=b'Z' => 667.0,
        b'['..=b'`' => 333.0,
        b'f' | b'i' | b'j' | b'l' | b't' => 278.0,
        b'm' | b'w' => 833.0,
        b'a'..=b'z' => 556.0,
        _ => 556.0,
    }
}

/// Width of `text` set in Helvetica at `size` points.
pub fn helvetica_width(text: &str, size: f32) -> f32 {
    to_winansi(text)
        .into_iter()
        .map(helvetica_advance)
        .sum::<f32>()
        * size
        / 1000.0
}
