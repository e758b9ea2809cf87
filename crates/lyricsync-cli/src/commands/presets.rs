use anyhow::Result;

use lyricsync_core::{AppConfig, ScrollPreset};
use lyricsync_render::ScrollConfigExt;

const SAMPLE_DISTANCES_PX: [f64; 5] = [30.0, 60.0, 120.0, 300.0, 600.0];

pub fn run(config: &AppConfig) -> Result<()> {
    println!("Scroll presets (duration = clamp(base + k * |delta|, min, max)):\n");

    for preset in ScrollPreset::ALL {
        let model = preset.model();
        let marker = if preset == config.scroll.preset { "*" } else { " " };
        println!(
            "{} {:<7} {:<10} base {:>4.0}ms  k {:.2}ms/px  [{}..{}]ms",
            marker,
            preset.name(),
            format!("{:?}", model.easing).to_lowercase(),
            model.base_ms,
            model.k_ms_per_px,
            model.min_ms,
            model.max_ms
        );
        println!("    css: {}", model.easing.css());

        let samples: Vec<String> = SAMPLE_DISTANCES_PX
            .iter()
            .map(|px| format!("{}px={}ms", px, model.duration_ms(*px)))
            .collect();
        println!("    {}\n", samples.join("  "));
    }

    println!("* configured preset");
    if !config.scroll.is_smooth() {
        println!("smooth scrolling is disabled: every line change snaps");
    }
    Ok(())
}
