// pidstat_report - pidstat Memory Log Analyzer
// Copyright (C) 2025 The pidstat_report contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Chart styling (TOML, every key optional)

use std::fs;
use std::path::Path;

use anyhow::Context;
use plotters::style::{FontDesc, FontFamily, FontStyle, RGBColor};
use serde::{Deserialize, Serialize};

/// Plain `[r, g, b]` triple so styles stay serializable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl From<Rgb> for RGBColor {
    fn from(c: Rgb) -> Self {
        RGBColor(c.0, c.1, c.2)
    }
}

/// Font family handed to plotters. The family is resolved by the backend at
/// draw time, unknown names fall back to its default face.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontPreference {
    pub family: String,
}

impl Default for FontPreference {
    fn default() -> Self {
        Self {
            family: "sans-serif".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartStyle {
    pub width: u32,
    pub height: u32,
    pub font: FontPreference,
    pub title_size: u32,
    pub panel_title_size: u32,
    pub label_size: u32,
    pub system_color: Rgb,
    pub process_color: Rgb,
    pub system_peak_fill: Rgb,
    pub process_peak_fill: Rgb,
    pub system_panel_title: String,
    pub process_panel_title: String,
    /// Prefix for process series labels, e.g. "Process RSS"
    pub process_label: String,
    pub max_time_ticks: usize,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            width: 1800,
            height: 1200,
            font: FontPreference::default(),
            title_size: 32,
            panel_title_size: 24,
            label_size: 16,
            system_color: Rgb(0x2E, 0x86, 0xAB),
            process_color: Rgb(0xFF, 0x6B, 0x6B),
            system_peak_fill: Rgb(255, 255, 0),
            process_peak_fill: Rgb(255, 165, 0),
            system_panel_title: "System Total RSS Memory Usage".to_string(),
            process_panel_title: "Process Memory Usage".to_string(),
            process_label: "Process".to_string(),
            max_time_ticks: 15,
        }
    }
}

impl ChartStyle {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading style file {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing style file {}", path.display()))
    }

    pub fn font(&self, size: u32) -> FontDesc<'_> {
        FontDesc::new(FontFamily::Name(&self.font.family), size as f64, FontStyle::Normal)
    }

    pub fn bold_font(&self, size: u32) -> FontDesc<'_> {
        FontDesc::new(FontFamily::Name(&self.font.family), size as f64, FontStyle::Bold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let style: ChartStyle = toml::from_str(
            r#"
width = 900
process_label = "cb-spider"

[font]
family = "DejaVu Sans"
"#,
        )
        .unwrap();
        assert_eq!(style.width, 900);
        assert_eq!(style.height, ChartStyle::default().height);
        assert_eq!(style.process_label, "cb-spider");
        assert_eq!(style.font.family, "DejaVu Sans");
        assert_eq!(style.max_time_ticks, 15);
    }

    #[test]
    fn colors_are_rgb_arrays() {
        let style: ChartStyle = toml::from_str("system_color = [1, 2, 3]").unwrap();
        let c = RGBColor::from(style.system_color);
        assert_eq!((c.0, c.1, c.2), (1, 2, 3));
    }
}
