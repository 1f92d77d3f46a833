use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedColor {
    Red,
    Orange,
    Yellow,
    Green,
    Teal,
    Blue,
    Purple,
    Pink,
}

impl SeedColor {
    pub const ALL: [SeedColor; 8] = [
        SeedColor::Red,
        SeedColor::Orange,
        SeedColor::Yellow,
        SeedColor::Green,
        SeedColor::Teal,
        SeedColor::Blue,
        SeedColor::Purple,
        SeedColor::Pink,
    ];

    pub fn rgb8(self) -> [u8; 3] {
        match self {
            SeedColor::Red => [255, 59, 48],
            SeedColor::Orange => [255, 149, 0],
            SeedColor::Yellow => [255, 204, 0],
            SeedColor::Green => [76, 217, 100],
            SeedColor::Teal => [90, 200, 250],
            SeedColor::Blue => [0, 122, 255],
            SeedColor::Purple => [88, 86, 214],
            SeedColor::Pink => [255, 45, 85],
        }
    }

    pub fn rgb(self) -> [f32; 3] {
        let [r, g, b] = self.rgb8();
        [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0]
    }

    pub fn rgba(self) -> [f32; 4] {
        let [r, g, b] = self.rgb();
        [r, g, b, 1.0]
    }

    pub fn name(self) -> &'static str {
        match self {
            SeedColor::Red => "red",
            SeedColor::Orange => "orange",
            SeedColor::Yellow => "yellow",
            SeedColor::Green => "green",
            SeedColor::Teal => "teal",
            SeedColor::Blue => "blue",
            SeedColor::Purple => "purple",
            SeedColor::Pink => "pink",
        }
    }
}
