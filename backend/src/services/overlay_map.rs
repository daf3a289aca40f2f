//! Map overlay model.
//!
//! Stands in for the tile-layer state of a map widget: the ordered list of
//! overlay layers with their visibility, the legend tabs, the active legend
//! index and the shared overlay opacity. Rendering is someone else's job.

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::api::{IndexId, Sensor};
use crate::models::indices::is_true_color;

pub const DEFAULT_OPACITY: u8 = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayLayer {
    pub id: String,
    pub index: IndexId,
    pub date: NaiveDate,
    pub sensor: Sensor,
    pub url: String,
    pub visible: bool,
}

impl OverlayLayer {
    pub fn is_true_color(&self) -> bool {
        is_true_color(self.index.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayMap {
    layers: Vec<OverlayLayer>,
    legend_tabs: Vec<IndexId>,
    active_legend: Option<IndexId>,
    opacity: u8,
}

impl Default for OverlayMap {
    fn default() -> Self {
        Self {
            layers: Vec::new(),
            legend_tabs: Vec::new(),
            active_legend: None,
            opacity: DEFAULT_OPACITY,
        }
    }
}

impl OverlayMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every layer and legend entry and restore full opacity.
    pub fn reset(&mut self) {
        self.layers.clear();
        self.legend_tabs.clear();
        self.active_legend = None;
        self.opacity = DEFAULT_OPACITY;
    }

    /// Append a layer; non-true-color indices get a legend tab on first sight.
    pub fn add_layer(
        &mut self,
        index: IndexId,
        date: NaiveDate,
        sensor: Sensor,
        url: String,
        visible: bool,
    ) -> &OverlayLayer {
        if !is_true_color(index.as_str()) && !self.legend_tabs.contains(&index) {
            self.legend_tabs.push(index.clone());
        }
        self.layers.push(OverlayLayer {
            id: Uuid::new_v4().to_string(),
            index,
            date,
            sensor,
            url,
            visible,
        });
        &self.layers[self.layers.len() - 1]
    }

    /// Show or hide a layer. Returns `None` for an unknown id.
    pub fn set_visible(&mut self, layer_id: &str, visible: bool) -> Option<&OverlayLayer> {
        let layer = self.layers.iter_mut().find(|l| l.id == layer_id)?;
        layer.visible = visible;
        Some(layer)
    }

    /// Select the legend tab. Only indices that have a tab can be selected.
    pub fn set_active_legend(&mut self, index: &str) -> bool {
        match self.legend_tabs.iter().find(|t| t.as_str() == index) {
            Some(tab) => {
                self.active_legend = Some(tab.clone());
                true
            }
            None => false,
        }
    }

    pub fn set_opacity(&mut self, percent: u8) {
        self.opacity = percent.min(100);
    }

    pub fn layers(&self) -> &[OverlayLayer] {
        &self.layers
    }

    pub fn layer(&self, layer_id: &str) -> Option<&OverlayLayer> {
        self.layers.iter().find(|l| l.id == layer_id)
    }

    pub fn visible_layers(&self) -> impl Iterator<Item = &OverlayLayer> {
        self.layers.iter().filter(|l| l.visible)
    }

    /// First visible layer that carries index data (not true color).
    pub fn first_visible_data_layer(&self) -> Option<&OverlayLayer> {
        self.visible_layers().find(|l| !l.is_true_color())
    }

    pub fn legend_tabs(&self) -> &[IndexId] {
        &self.legend_tabs
    }

    pub fn active_legend(&self) -> Option<&IndexId> {
        self.active_legend.as_ref()
    }

    pub fn opacity(&self) -> u8 {
        self.opacity
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}
