use ratatui::style::Color;

#[derive(Clone)]
pub struct Theme {
    pub name: &'static str,
    pub fg: Color,
    pub title: Color,
    pub accent: Color,
    pub muted: Color,
    pub error: Color,
    pub user_color: Color,
    pub assistant_color: Color,
    pub border: Color,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            name: "dark",
            fg: Color::Rgb(220, 220, 220),
            title: Color::Rgb(255, 255, 255),
            accent: Color::Rgb(122, 162, 247),
            muted: Color::Rgb(110, 110, 110),
            error: Color::Rgb(247, 118, 142),
            user_color: Color::Cyan,
            assistant_color: Color::Green,
            border: Color::Rgb(60, 60, 60),
        }
    }

    pub fn light() -> Self {
        Self {
            name: "light",
            fg: Color::Rgb(40, 40, 40),
            title: Color::Rgb(0, 0, 0),
            accent: Color::Rgb(38, 99, 235),
            muted: Color::Rgb(140, 140, 140),
            error: Color::Rgb(200, 30, 30),
            user_color: Color::Rgb(0, 110, 140),
            assistant_color: Color::Rgb(20, 120, 50),
            border: Color::Rgb(190, 190, 190),
        }
    }

    pub fn high_contrast() -> Self {
        Self {
            name: "high-contrast",
            fg: Color::White,
            title: Color::Yellow,
            accent: Color::Yellow,
            muted: Color::Gray,
            error: Color::LightRed,
            user_color: Color::LightCyan,
            assistant_color: Color::LightGreen,
            border: Color::White,
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "dark" => Some(Self::dark()),
            "light" => Some(Self::light()),
            "high-contrast" => Some(Self::high_contrast()),
            _ => None,
        }
    }

    pub fn all_names() -> &'static [&'static str] {
        &["dark", "light", "high-contrast"]
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}
