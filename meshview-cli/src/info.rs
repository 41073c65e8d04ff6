//! Headless topology report

use anyhow::{bail, Context, Result};
use meshview_core::TopologyAttributes;
use meshview_io::ModelSource;
use meshview_viewer::{
    HeadlessBackend, LoadStatus, ManualScheduler, Viewer, ViewerOptions, PREVIEW_UNAVAILABLE,
};

/// Load `source` without a window and return its topology attributes
///
/// Runs the same load and first-frame path as the interactive viewer, with
/// the info panel on so the attributes are computed on the first tick.
pub fn topology_report(source: ModelSource) -> Result<TopologyAttributes> {
    let name = source.display_name().to_string();
    let options = ViewerOptions {
        info_panel: true,
        ..ViewerOptions::default()
    };
    let mut viewer = Viewer::new(options, HeadlessBackend::new(), ManualScheduler::new());

    match viewer.load_model(source) {
        LoadStatus::Ready => {}
        LoadStatus::Fallback { format } => bail!("{}: {} ({})", name, PREVIEW_UNAVAILABLE, format),
        LoadStatus::Failed(e) => return Err(e).with_context(|| format!("failed to load {}", name)),
        LoadStatus::Stale => bail!("load of {} was superseded", name),
    }

    if let Some(token) = viewer.scheduler_mut().fire_next() {
        viewer.tick(token);
    }
    viewer
        .visible_topology()
        .copied()
        .with_context(|| format!("no topology computed for {}", name))
}
