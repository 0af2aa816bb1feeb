//! CAPTCHA challenge generation.
//!
//! The gate activates after repeated failed credential submissions. The
//! challenge code is generated and compared here; drawing the image is a
//! pluggable collaborator behind [`CaptchaRenderer`].

use rand::Rng;
use subtle::ConstantTimeEq;

pub const CHALLENGE_LENGTH: usize = 5;

/// Ambiguous glyphs (0/O, 1/I/L) are left out.
const ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

pub fn generate_challenge() -> String {
    let mut rng = rand::thread_rng();
    (0..CHALLENGE_LENGTH)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Case-insensitive, whitespace-tolerant, constant-time comparison.
pub fn answers_match(expected: &str, provided: &str) -> bool {
    let expected = expected.trim().to_ascii_uppercase();
    let provided = provided.trim().to_ascii_uppercase();
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}

pub trait CaptchaRenderer: Send + Sync {
    /// Render the challenge, returning the content type and image bytes.
    fn render(&self, code: &str) -> (&'static str, Vec<u8>);
}

/// Minimal built-in renderer. Real deployments plug in an actual image
/// renderer; this one exists so the route works out of the box.
#[derive(Debug, Default)]
pub struct SvgCaptchaRenderer;

impl CaptchaRenderer for SvgCaptchaRenderer {
    fn render(&self, code: &str) -> (&'static str, Vec<u8>) {
        let mut glyphs = String::new();
        for (i, ch) in code.chars().enumerate() {
            let x = 18 + i * 26;
            let y = 34 + (i % 3) as i32 * 4 - 4;
            let rot = (i as i32 % 5) * 7 - 14;
            glyphs.push_str(&format!(
                "<text x=\"{x}\" y=\"{y}\" transform=\"rotate({rot} {x} {y})\" \
                 font-family=\"monospace\" font-size=\"28\" fill=\"#334\">{ch}</text>"
            ));
        }
        let svg = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"160\" height=\"50\">\
             <rect width=\"160\" height=\"50\" fill=\"#eef\"/>\
             <line x1=\"0\" y1=\"12\" x2=\"160\" y2=\"40\" stroke=\"#99a\"/>\
             <line x1=\"0\" y1=\"38\" x2=\"160\" y2=\"8\" stroke=\"#99a\"/>\
             {glyphs}</svg>"
        );
        ("image/svg+xml", svg.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn challenge_has_expected_shape() {
        let code = generate_challenge();
        assert_eq!(code.len(), CHALLENGE_LENGTH);
        assert!(code.bytes().all(|b| ALPHABET.contains(&b)));
    }

    #[test]
    fn comparison_ignores_case_and_whitespace() {
        assert!(answers_match("AB3CD", " ab3cd "));
        assert!(!answers_match("AB3CD", "AB3CE"));
        assert!(!answers_match("AB3CD", ""));
        assert!(!answers_match("AB3CD", "AB3C"));
    }

    #[test]
    fn renderer_embeds_the_code() {
        let (mime, bytes) = SvgCaptchaRenderer.render("XY42Z");
        assert_eq!(mime, "image/svg+xml");
        let svg = String::from_utf8(bytes).unwrap();
        for ch in "XY42Z".chars() {
            assert!(svg.contains(ch));
        }
    }
}
