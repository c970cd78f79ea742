//! Startup banner with a blurple-to-ember gradient (DISCORD-TTL).
//! Uses figlet's bundled standard font.

use crossterm::ExecutableCommand;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use figlet_rs::FIGfont;
use std::io::{Write, stdout};

/// Blurple (#5865f2).
const BLURPLE: (u8, u8, u8) = (0x58, 0x65, 0xf2);
/// Ember (#ff7a45).
const EMBER: (u8, u8, u8) = (0xff, 0x7a, 0x45);

/// Linear interpolation between two RGB colors. `t` in [0.0, 1.0].
fn lerp_rgb(a: (u8, u8, u8), b: (u8, u8, u8), t: f64) -> (u8, u8, u8) {
    let r = (f64::from(a.0) * (1.0 - t) + f64::from(b.0) * t).round() as u8;
    let g = (f64::from(a.1) * (1.0 - t) + f64::from(b.1) * t).round() as u8;
    let bl = (f64::from(a.2) * (1.0 - t) + f64::from(b.2) * t).round() as u8;
    (r, g, bl)
}

/// Prints "DISCORD-TTL" as ASCII art with a gradient, then the version.
/// Silently prints nothing if the font cannot be loaded.
pub fn print_welcome() {
    let Ok(font) = FIGfont::standard() else {
        return;
    };
    let Some(figure) = font.convert("DISCORD-TTL") else {
        return;
    };
    let art = figure.to_string();
    let lines: Vec<&str> = art.lines().collect();
    let total = lines.len().max(1);

    let mut out = stdout();
    for (i, line) in lines.iter().enumerate() {
        let t = if total <= 1 {
            1.0
        } else {
            i as f64 / (total - 1) as f64
        };
        let (r, g, b) = lerp_rgb(BLURPLE, EMBER, t);
        let _ = out.execute(SetForegroundColor(Color::Rgb { r, g, b }));
        let _ = out.execute(Print(line));
        let _ = out.execute(Print("\r\n"));
        let _ = out.execute(ResetColor);
    }

    let _ = out.execute(SetForegroundColor(Color::Rgb {
        r: EMBER.0,
        g: EMBER.1,
        b: EMBER.2,
    }));
    let _ = out.execute(Print(format!("v{}\r\n", env!("CARGO_PKG_VERSION"))));
    let _ = out.execute(ResetColor);
    let _ = out.flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_endpoints() {
        assert_eq!(lerp_rgb(BLURPLE, EMBER, 0.0), BLURPLE);
        assert_eq!(lerp_rgb(BLURPLE, EMBER, 1.0), EMBER);
    }
}
