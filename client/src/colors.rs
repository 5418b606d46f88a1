use hazardmap_shared::Season;

/// Format RGBA as a CSS color string.
pub fn rgba_css(r: u8, g: u8, b: u8, a: f64) -> String {
    format!("rgba({r},{g},{b},{a})")
}

pub fn season_rgb(season: Season) -> (u8, u8, u8) {
    match season {
        Season::Spring => (102, 194, 122),
        Season::Summer => (245, 197, 66),
        Season::Fall => (219, 112, 54),
        Season::Winter => (110, 168, 230),
    }
}

pub fn season_css(season: Season, alpha: f64) -> String {
    let (r, g, b) = season_rgb(season);
    rgba_css(r, g, b, alpha)
}

/// Dims a color toward the panel background for inactive toggles.
pub fn muted(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let mix = |c: u8, bg: u8| ((c as u16 + bg as u16 * 3) / 4) as u8;
    (mix(r, 26), mix(g, 29), mix(b, 42))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seasons_have_distinct_colors() {
        let colors: std::collections::HashSet<_> =
            Season::ALL.into_iter().map(season_rgb).collect();
        assert_eq!(colors.len(), 4);
    }

    #[test]
    fn css_string_shape() {
        assert_eq!(rgba_css(1, 2, 3, 0.5), "rgba(1,2,3,0.5)");
    }

    #[test]
    fn muting_moves_toward_background() {
        assert_eq!(muted(26, 29, 42), (26, 29, 42));
        let (r, _, _) = muted(255, 0, 0);
        assert!(r < 255 && r > 26);
    }
}
