use std::fs;
use std::path::Path;

use anyhow::Context;
use log::info;

use chart_state::{persistance, State};

pub fn save(state: &State, sample_rate: u32, path: &Path) -> anyhow::Result<()> {
    let chart = persistance::encode(
        state.graph(),
        &state.tempo(sample_rate),
        state.music_name(),
        state.max_block(),
    )?;

    let output = serde_json::to_string_pretty(&chart)?;
    fs::write(path, output)
        .with_context(|| format!("failed to write chart to {}", path.display()))?;

    info!("saved chart to {}", path.display());
    Ok(())
}

pub fn load(path: &Path) -> anyhow::Result<State> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read chart from {}", path.display()))?;

    let chart: persistance::PersistedChart = serde_json::from_str(&content)?;
    let graph = persistance::decode(&chart)?;

    let mut state = State::default();
    state.apply_chart(&chart, graph);

    info!("loaded chart {} from {}", state.music_name(), path.display());
    Ok(state)
}
