// Copyright (c) 2026 rezky_nightky

use crossterm::style::Color;
use rand::{seq::IndexedRandom, Rng};

use crate::error::ConfigError;
use crate::runtime::ColorMode;

pub const DEFAULT_THEME: &str = "algeria";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::opaque(0, 0, 0);

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Source-over composite of `self` onto an opaque `dst`.
    pub fn over(self, dst: Rgba) -> Rgba {
        match self.a {
            255 => self,
            0 => dst,
            a => {
                let a = a as u16;
                let mix = |s: u8, d: u8| ((s as u16 * a + d as u16 * (255 - a) + 127) / 255) as u8;
                Rgba::opaque(mix(self.r, dst.r), mix(self.g, dst.g), mix(self.b, dst.b))
            }
        }
    }

    pub fn luma(self) -> u8 {
        ((self.r as u32 * 299 + self.g as u32 * 587 + self.b as u32 * 114) / 1000) as u8
    }
}

struct ThemeDef {
    name: &'static str,
    description: &'static str,
    colors: &'static [(u8, u8, u8)],
}

const THEMES: &[ThemeDef] = &[
    ThemeDef {
        name: "algeria",
        description: "Green, white and red",
        colors: &[(0, 98, 51), (255, 255, 255), (210, 16, 52)],
    },
    ThemeDef {
        name: "brazil",
        description: "Green, gold, blue and white",
        colors: &[(0, 156, 59), (255, 223, 0), (0, 39, 118), (255, 255, 255)],
    },
    ThemeDef {
        name: "france",
        description: "Blue, white and red",
        colors: &[(0, 35, 149), (255, 255, 255), (237, 41, 57)],
    },
    ThemeDef {
        name: "germany",
        description: "Charcoal, red and gold",
        colors: &[(40, 40, 40), (221, 0, 0), (255, 206, 0)],
    },
    ThemeDef {
        name: "ireland",
        description: "Green, white and orange",
        colors: &[(22, 155, 98), (255, 255, 255), (255, 136, 62)],
    },
    ThemeDef {
        name: "italy",
        description: "Green, off-white and red",
        colors: &[(0, 146, 70), (241, 242, 241), (206, 43, 55)],
    },
    ThemeDef {
        name: "jamaica",
        description: "Green, gold and charcoal",
        colors: &[(0, 155, 58), (254, 209, 0), (40, 40, 40)],
    },
    ThemeDef {
        name: "japan",
        description: "White and crimson",
        colors: &[(255, 255, 255), (188, 0, 45)],
    },
    ThemeDef {
        name: "sweden",
        description: "Blue and yellow",
        colors: &[(0, 106, 167), (254, 204, 0)],
    },
    ThemeDef {
        name: "ukraine",
        description: "Azure and gold",
        colors: &[(0, 87, 183), (255, 215, 0)],
    },
    ThemeDef {
        name: "rainbow",
        description: "Six-band rainbow",
        colors: &[
            (228, 3, 3),
            (255, 140, 0),
            (255, 237, 0),
            (0, 128, 38),
            (36, 64, 142),
            (115, 41, 130),
        ],
    },
    ThemeDef {
        name: "ocean",
        description: "Deep blues and sea foam",
        colors: &[
            (0, 40, 85),
            (0, 95, 140),
            (0, 150, 170),
            (120, 210, 200),
            (220, 245, 240),
        ],
    },
    ThemeDef {
        name: "sunset",
        description: "Purple dusk into orange",
        colors: &[
            (53, 20, 80),
            (140, 30, 90),
            (220, 70, 60),
            (250, 140, 50),
            (255, 200, 90),
        ],
    },
    ThemeDef {
        name: "forest",
        description: "Moss, pine and bark",
        colors: &[
            (20, 60, 30),
            (40, 100, 45),
            (90, 140, 60),
            (150, 120, 70),
            (90, 60, 40),
        ],
    },
    ThemeDef {
        name: "pastel",
        description: "Soft pinks, mints and lilacs",
        colors: &[
            (255, 179, 186),
            (255, 223, 186),
            (255, 255, 186),
            (186, 255, 201),
            (186, 225, 255),
            (220, 200, 255),
        ],
    },
    ThemeDef {
        name: "gray",
        description: "Grayscale ramp",
        colors: &[(60, 60, 60), (110, 110, 110), (160, 160, 160), (210, 210, 210)],
    },
];

/// A resolved palette. Colors keep their declaration order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Theme {
    pub name: &'static str,
    pub colors: Vec<Rgba>,
}

impl Theme {
    /// Uniform draw with replacement.
    pub fn pick_random<R: Rng + ?Sized>(&self, rng: &mut R) -> Rgba {
        self.colors.choose(rng).copied().unwrap_or(Rgba::BLACK)
    }
}

pub fn resolve(name: &str) -> Result<Theme, ConfigError> {
    let key = name.trim().to_ascii_lowercase();
    let key = match key.as_str() {
        "grey" => "gray",
        other => other,
    };
    THEMES
        .iter()
        .find(|t| t.name == key)
        .map(|t| Theme {
            name: t.name,
            colors: t
                .colors
                .iter()
                .map(|&(r, g, b)| Rgba::opaque(r, g, b))
                .collect(),
        })
        .ok_or_else(|| ConfigError::UnknownTheme(name.to_string()))
}

pub fn theme_listing() -> impl Iterator<Item = (&'static str, &'static str)> {
    THEMES.iter().map(|t| (t.name, t.description))
}

fn dist2(r0: u8, g0: u8, b0: u8, r1: u8, g1: u8, b1: u8) -> i32 {
    let dr = (r0 as i32) - (r1 as i32);
    let dg = (g0 as i32) - (g1 as i32);
    let db = (b0 as i32) - (b1 as i32);
    (dr * dr) + (dg * dg) + (db * db)
}

fn rgb_to_ansi256(c: Rgba) -> u8 {
    const CUBE_LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];

    let level = |v: u8| ((v as u16 * 5) + 127) / 255;
    let (r6, g6, b6) = (level(c.r), level(c.g), level(c.b));
    let cube_idx = 16 + (36 * r6 as u8) + (6 * g6 as u8) + (b6 as u8);
    let cube_dist = dist2(
        c.r,
        c.g,
        c.b,
        CUBE_LEVELS[r6 as usize],
        CUBE_LEVELS[g6 as usize],
        CUBE_LEVELS[b6 as usize],
    );

    let avg = ((c.r as u16 + c.g as u16 + c.b as u16) / 3) as u8;
    let gray_idx = match avg {
        0..=7 => 16,
        239..=255 => 231,
        v => 232 + ((v - 8) / 10),
    };
    let gv = match gray_idx {
        16 => 0,
        231 => 255,
        i => 8 + 10 * (i - 232),
    };

    if dist2(c.r, c.g, c.b, gv, gv, gv) < cube_dist {
        gray_idx
    } else {
        cube_idx
    }
}

fn rgb_to_color16(c: Rgba) -> Color {
    const TABLE: [(Color, (u8, u8, u8)); 16] = [
        (Color::Black, (0, 0, 0)),
        (Color::DarkGrey, (128, 128, 128)),
        (Color::Grey, (192, 192, 192)),
        (Color::White, (255, 255, 255)),
        (Color::DarkRed, (128, 0, 0)),
        (Color::Red, (255, 0, 0)),
        (Color::DarkGreen, (0, 128, 0)),
        (Color::Green, (0, 255, 0)),
        (Color::DarkBlue, (0, 0, 128)),
        (Color::Blue, (0, 0, 255)),
        (Color::DarkCyan, (0, 128, 128)),
        (Color::Cyan, (0, 255, 255)),
        (Color::DarkMagenta, (128, 0, 128)),
        (Color::Magenta, (255, 0, 255)),
        (Color::DarkYellow, (128, 128, 0)),
        (Color::Yellow, (255, 255, 0)),
    ];

    TABLE
        .iter()
        .min_by_key(|(_, (r, g, b))| dist2(c.r, c.g, c.b, *r, *g, *b))
        .map(|(col, _)| *col)
        .unwrap_or(Color::White)
}

/// Terminal background color for `c`, or `None` in mono mode.
pub fn term_color(c: Rgba, mode: ColorMode) -> Option<Color> {
    match mode {
        ColorMode::Mono => None,
        ColorMode::TrueColor => Some(Color::Rgb {
            r: c.r,
            g: c.g,
            b: c.b,
        }),
        ColorMode::Color256 => Some(Color::AnsiValue(rgb_to_ansi256(c))),
        ColorMode::Color16 => Some(rgb_to_color16(c)),
    }
}

/// Glyph used in mono mode so neighbouring stripes stay distinguishable.
pub fn shade_glyph(c: Rgba) -> char {
    match c.luma() {
        0..=31 => ' ',
        32..=95 => '░',
        96..=159 => '▒',
        160..=223 => '▓',
        _ => '█',
    }
}

#[cfg(test)]
impl Theme {
    pub fn contains(&self, c: Rgba) -> bool {
        self.colors.contains(&c)
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    #[test]
    fn default_theme_resolves() {
        let t = resolve(DEFAULT_THEME).unwrap();
        assert_eq!(t.name, "algeria");
        assert_eq!(t.colors.len(), 3);
    }

    #[test]
    fn resolve_ignores_case_and_whitespace() {
        assert_eq!(resolve("  Algeria ").unwrap().name, "algeria");
        assert_eq!(resolve("GREY").unwrap().name, "gray");
    }

    #[test]
    fn unknown_theme_is_an_error() {
        assert_eq!(
            resolve("narnia"),
            Err(ConfigError::UnknownTheme("narnia".to_string()))
        );
    }

    #[test]
    fn every_listed_theme_resolves_to_a_non_empty_palette() {
        for (name, _) in theme_listing() {
            assert!(!resolve(name).unwrap().colors.is_empty(), "{name}");
        }
    }

    #[test]
    fn pick_random_reaches_every_color() {
        let t = resolve("rainbow").unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = vec![false; t.colors.len()];
        for _ in 0..500 {
            let c = t.pick_random(&mut rng);
            let i = t.colors.iter().position(|&p| p == c).unwrap();
            seen[i] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn over_respects_alpha() {
        let red = Rgba::opaque(255, 0, 0);
        assert_eq!(red.over(Rgba::BLACK), red);
        let clear = Rgba { a: 0, ..red };
        assert_eq!(clear.over(Rgba::BLACK), Rgba::BLACK);
        let half = Rgba { a: 128, ..red };
        assert_eq!(half.over(Rgba::BLACK), Rgba::opaque(128, 0, 0));
    }

    #[test]
    fn ansi256_maps_pure_colors_to_cube_corners() {
        assert_eq!(rgb_to_ansi256(Rgba::opaque(255, 0, 0)), 196);
        assert_eq!(rgb_to_ansi256(Rgba::BLACK), 16);
        assert_eq!(rgb_to_ansi256(Rgba::opaque(255, 255, 255)), 231);
    }

    #[test]
    fn mono_mode_has_no_color_but_shades_by_brightness() {
        assert_eq!(term_color(Rgba::opaque(255, 255, 255), ColorMode::Mono), None);
        assert_eq!(shade_glyph(Rgba::BLACK), ' ');
        assert_eq!(shade_glyph(Rgba::opaque(255, 255, 255)), '█');
    }
}
