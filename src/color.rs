use palette::Srgb;

/// Canonicalize a CSS color value into lowercase `#rrggbb`.
///
/// Accepted inputs are `#rgb`, `#rrggbb`, `rgb(...)` and `rgba(...)` (comma or space
/// separated, optional `/ alpha`). Everything else, including `transparent` and colors whose
/// alpha is zero, yields `None`.
pub fn normalize(raw: &str) -> Option<String> {
    parse_color(raw).map(to_hex)
}

/// Parse a CSS color value into sRGB. Alpha is only used to reject invisible colors.
pub fn parse_color(raw: &str) -> Option<Srgb<u8>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(digits) = s.strip_prefix('#') {
        return parse_hex_digits(digits);
    }

    let lower = s.to_ascii_lowercase();
    let args = lower
        .strip_prefix("rgba(")
        .or_else(|| lower.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'))?;
    parse_css_rgb(args)
}

/// Parse a canonical or short hex string (`#` optional) into sRGB.
pub fn hex_to_rgb(hex: &str) -> Option<Srgb<u8>> {
    parse_hex_digits(hex.trim().trim_start_matches('#'))
}

pub fn to_hex(c: Srgb<u8>) -> String {
    format!("#{:02x}{:02x}{:02x}", c.red, c.green, c.blue)
}

/// Perceived brightness (ITU-R BT.601 luma) on a 0-255 scale.
pub fn brightness(c: Srgb<u8>) -> f32 {
    (c.red as f32 * 299.0 + c.green as f32 * 587.0 + c.blue as f32 * 114.0) / 1000.0
}

/// Euclidean distance in RGB space.
pub fn distance(a: Srgb<u8>, b: Srgb<u8>) -> f32 {
    let dr = a.red as f32 - b.red as f32;
    let dg = a.green as f32 - b.green as f32;
    let db = a.blue as f32 - b.blue as f32;
    (dr * dr + dg * dg + db * db).sqrt()
}

/// Chroma relative to the brightest channel. Black has zero saturation.
pub fn saturation(c: Srgb<u8>) -> f32 {
    let max = c.red.max(c.green).max(c.blue) as f32;
    let min = c.red.min(c.green).min(c.blue) as f32;
    if max == 0.0 { 0.0 } else { (max - min) / max }
}

/// Pull every `rgb()`, `rgba()` and `#hex` token out of a compound value such as
/// `linear-gradient(90deg, rgb(49, 46, 129) 0%, #6366f1 100%)`.
pub fn color_tokens(value: &str) -> Vec<&str> {
    let bytes = value.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let rest = &bytes[i..];
        let is_func = (rest.len() >= 4 && rest[..4].eq_ignore_ascii_case(b"rgb("))
            || (rest.len() >= 5 && rest[..5].eq_ignore_ascii_case(b"rgba("));

        if is_func {
            match rest.iter().position(|&b| b == b')') {
                Some(end) => {
                    tokens.push(&value[i..=i + end]);
                    i += end + 1;
                    continue;
                }
                None => break,
            }
        }

        if bytes[i] == b'#' {
            let len = rest[1..].iter().take_while(|b| b.is_ascii_hexdigit()).count();
            if len > 0 {
                tokens.push(&value[i..=i + len]);
            }
            i += len + 1;
            continue;
        }

        i += 1;
    }

    tokens
}

fn parse_hex_digits(digits: &str) -> Option<Srgb<u8>> {
    let nibble = |c: u8| -> Option<u8> {
        match c {
            b'0'..=b'9' => Some(c - b'0'),
            b'a'..=b'f' => Some(c - b'a' + 10),
            b'A'..=b'F' => Some(c - b'A' + 10),
            _ => None,
        }
    };

    let bytes = digits.as_bytes();
    match bytes.len() {
        3 => Some(Srgb::new(
            nibble(bytes[0])? * 17,
            nibble(bytes[1])? * 17,
            nibble(bytes[2])? * 17,
        )),
        6 => {
            let pair = |hi: u8, lo: u8| -> Option<u8> { Some(nibble(hi)? << 4 | nibble(lo)?) };
            Some(Srgb::new(
                pair(bytes[0], bytes[1])?,
                pair(bytes[2], bytes[3])?,
                pair(bytes[4], bytes[5])?,
            ))
        }
        _ => None,
    }
}

/// Handles both `r, g, b[, a]` and `r g b[ / a]`. Channels may be fractional or percentages.
fn parse_css_rgb(args: &str) -> Option<Srgb<u8>> {
    let (channels, slash_alpha) = match args.split_once('/') {
        Some((channels, alpha)) => (channels, Some(alpha.trim())),
        None => (args, None),
    };

    let parts: Vec<&str> = channels
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .collect();

    let alpha = match (parts.len(), slash_alpha) {
        (3, None) => None,
        (3, Some(a)) => Some(a),
        (4, None) => Some(parts[3]),
        _ => return None,
    };

    if let Some(a) = alpha {
        if parse_alpha(a)? <= 0.0 {
            return None;
        }
    }

    Some(Srgb::new(
        parse_channel(parts[0])?,
        parse_channel(parts[1])?,
        parse_channel(parts[2])?,
    ))
}

fn parse_channel(token: &str) -> Option<u8> {
    let value = match token.strip_suffix('%') {
        Some(pct) => pct.parse::<f32>().ok()? * 2.55,
        None => token.parse::<f32>().ok()?,
    };
    if !value.is_finite() {
        return None;
    }
    Some(value.clamp(0.0, 255.0).round() as u8)
}

fn parse_alpha(token: &str) -> Option<f32> {
    let value = match token.strip_suffix('%') {
        Some(pct) => pct.parse::<f32>().ok()? / 100.0,
        None => token.parse::<f32>().ok()?,
    };
    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_rgb_functions() {
        assert_eq!(normalize("rgb(99, 102, 241)").as_deref(), Some("#6366f1"));
        assert_eq!(normalize("RGBA(49, 46, 129, 0.8)").as_deref(), Some("#312e81"));
        assert_eq!(normalize("rgb(99 102 241 / 50%)").as_deref(), Some("#6366f1"));
        assert_eq!(normalize("rgb(100%, 0%, 0%)").as_deref(), Some("#ff0000"));
        assert_eq!(normalize("rgb(10.6, 20.2, 30)").as_deref(), Some("#0b141e"));
    }

    #[test]
    fn rejects_invisible_and_unknown_values() {
        assert_eq!(normalize("transparent"), None);
        assert_eq!(normalize("rgba(0, 0, 0, 0)"), None);
        assert_eq!(normalize("rgb(1 2 3 / 0)"), None);
        assert_eq!(normalize("red"), None);
        assert_eq!(normalize(""), None);
        assert_eq!(normalize("#12345"), None);
        assert_eq!(normalize("#ggg"), None);
        assert_eq!(normalize("rgb(1, 2)"), None);
        assert_eq!(normalize("var(--primary)"), None);
    }

    #[test]
    fn expands_short_hex() {
        assert_eq!(normalize("#AbC").as_deref(), Some("#aabbcc"));
    }

    #[test]
    fn hex_normalization_is_idempotent() {
        for hex in ["#336699", "#ABCDEF", "#8b5cf6", "#000000"] {
            let once = normalize(hex).unwrap();
            assert_eq!(once, hex.to_ascii_lowercase());
            assert_eq!(normalize(&once).unwrap(), once);
        }
    }

    #[test]
    fn brightness_uses_luma_weights() {
        assert_eq!(brightness(Srgb::new(255, 255, 255)), 255.0);
        assert_eq!(brightness(Srgb::new(0, 0, 0)), 0.0);
        assert!((brightness(Srgb::new(255, 0, 0)) - 76.245).abs() < 1e-3);
    }

    #[test]
    fn distance_and_saturation() {
        let a = hex_to_rgb("#336699").unwrap();
        let b = hex_to_rgb("#33669a").unwrap();
        assert_eq!(distance(a, b), 1.0);
        assert_eq!(saturation(Srgb::new(0, 0, 0)), 0.0);
        assert_eq!(saturation(Srgb::new(128, 128, 128)), 0.0);
        assert_eq!(saturation(Srgb::new(255, 0, 0)), 1.0);
    }

    #[test]
    fn extracts_gradient_stops() {
        let value = "linear-gradient(90deg, rgb(49, 46, 129) 0%, #6366F1 50%, rgba(0,0,0,0) 100%)";
        let tokens = color_tokens(value);
        assert_eq!(tokens, vec!["rgb(49, 46, 129)", "#6366F1", "rgba(0,0,0,0)"]);
        let hexes: Vec<String> = tokens.into_iter().filter_map(normalize).collect();
        assert_eq!(hexes, vec!["#312e81", "#6366f1"]);
    }

    #[test]
    fn color_tokens_ignores_plain_text() {
        assert!(color_tokens("none").is_empty());
        assert!(color_tokens("url(\"hero.png\")").is_empty());
    }
}
