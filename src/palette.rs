use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HabitColor {
    #[default]
    Blue,
    Pink,
    Green,
    Yellow,
    Indigo,
    Orange,
    Purple,
    Teal,
}

/// Display attributes for one palette entry.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ColorStyle {
    pub name: &'static str,
    pub background: &'static str,
    pub border: &'static str,
    pub accent: &'static str,
}

const STYLES: [ColorStyle; 8] = [
    ColorStyle { name: "Blue", background: "#dbeafe", border: "#60a5fa", accent: "#0052FF" },
    ColorStyle { name: "Pink", background: "#fce7f3", border: "#f9a8d4", accent: "#ec4899" },
    ColorStyle { name: "Green", background: "#dcfce7", border: "#86efac", accent: "#22c55e" },
    ColorStyle { name: "Yellow", background: "#fef3c7", border: "#fcd34d", accent: "#f59e0b" },
    ColorStyle { name: "Indigo", background: "#e0e7ff", border: "#a5b4fc", accent: "#6366f1" },
    ColorStyle { name: "Orange", background: "#fed7aa", border: "#fdba74", accent: "#f97316" },
    ColorStyle { name: "Purple", background: "#e9d5ff", border: "#c084fc", accent: "#a855f7" },
    ColorStyle { name: "Teal", background: "#ccfbf1", border: "#5eead4", accent: "#14b8a6" },
];

impl HabitColor {
    pub const ALL: [HabitColor; 8] = [
        HabitColor::Blue,
        HabitColor::Pink,
        HabitColor::Green,
        HabitColor::Yellow,
        HabitColor::Indigo,
        HabitColor::Orange,
        HabitColor::Purple,
        HabitColor::Teal,
    ];

    pub fn index(self) -> u64 {
        self as u64
    }

    pub fn from_index(index: u64) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
    }

    /// Used for indices read back from storage or the contract, which are not
    /// validated at their source.
    pub fn from_index_lossy(index: u64) -> Self {
        Self::from_index(index).unwrap_or_else(|| {
            warn!(color_index = index, "color index out of palette range, using default");
            Self::default()
        })
    }

    pub fn style(self) -> &'static ColorStyle {
        &STYLES[self as usize]
    }
}
