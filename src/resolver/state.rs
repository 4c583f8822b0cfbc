//! Interactive selection state over a pack's availability.
//!
//! Tracks which resolution, topology and optional parts are chosen and which choices
//! are currently enabled. Presentation layers drive it and render its flags.

use super::selection::{resolve_selection, ResolvedSelection};
use crate::error::{ImportError, Result};
use crate::types::{AdditionalElements, PackVariant, TextureResolution, Topology};

/// Selection state for one pack.
#[derive(Debug, Clone)]
pub struct SelectionState {
    variants: Vec<PackVariant>,
    elements: AdditionalElements,
    resolution: Option<TextureResolution>,
    topology: Option<Topology>,
    parts: AdditionalElements,
}

impl SelectionState {
    pub fn new(variants: &[PackVariant], elements: AdditionalElements) -> Self {
        Self {
            variants: variants.to_vec(),
            elements,
            resolution: None,
            topology: None,
            parts: AdditionalElements::empty(),
        }
    }

    pub fn resolution(&self) -> Option<TextureResolution> {
        self.resolution
    }

    pub fn topology(&self) -> Option<Topology> {
        self.topology
    }

    /// Optional parts currently toggled on.
    pub fn parts(&self) -> AdditionalElements {
        self.parts
    }

    /// Clear every choice.
    pub fn reset(&mut self) {
        self.resolution = None;
        self.topology = None;
        self.parts = AdditionalElements::empty();
    }

    pub fn resolution_enabled(&self, resolution: TextureResolution) -> bool {
        self.variants.iter().any(|v| v.resolution == resolution)
    }

    pub fn topology_enabled(&self, topology: Topology) -> bool {
        match self.resolution {
            Some(resolution) => self.is_available(resolution, topology),
            None => false,
        }
    }

    /// Parts are only offered for Default topology, and only when the pack has them.
    pub fn part_enabled(&self, part: AdditionalElements) -> bool {
        self.topology == Some(Topology::Default) && self.elements.contains(part)
    }

    pub fn can_confirm(&self) -> bool {
        self.resolution.is_some() && self.topology.is_some()
    }

    /// Pick a resolution. Picking the current one again deselects it.
    pub fn select_resolution(&mut self, resolution: TextureResolution) -> Result<()> {
        if self.resolution == Some(resolution) {
            self.resolution = None;
            self.set_topology(None);
            return Ok(());
        }
        if !self.resolution_enabled(resolution) {
            return Err(ImportError::InvalidSelection(format!(
                "no {} variant in this pack",
                resolution
            )));
        }

        self.resolution = Some(resolution);
        if let Some(topology) = self.topology {
            if !self.is_available(resolution, topology) {
                self.set_topology(None);
            }
        }
        Ok(())
    }

    /// Pick a topology for the chosen resolution. Picking the current one again deselects it.
    pub fn select_topology(&mut self, topology: Topology) -> Result<()> {
        if self.topology == Some(topology) {
            self.set_topology(None);
            return Ok(());
        }
        if !self.topology_enabled(topology) {
            return Err(ImportError::InvalidSelection(format!(
                "{} topology not available for the chosen resolution",
                topology
            )));
        }
        self.set_topology(Some(topology));
        Ok(())
    }

    /// Toggle one optional part.
    pub fn toggle_part(&mut self, part: AdditionalElements) -> Result<()> {
        if !self.part_enabled(part) {
            return Err(ImportError::InvalidSelection(format!("{} cannot be selected", part)));
        }
        self.parts.toggle(part);
        Ok(())
    }

    /// Resolve the current choices.
    pub fn confirm(&self) -> Result<ResolvedSelection> {
        match (self.resolution, self.topology) {
            (Some(resolution), Some(topology)) => resolve_selection(
                PackVariant::new(resolution, topology),
                self.parts,
                self.elements,
            ),
            _ => Err(ImportError::InvalidSelection(
                "resolution and topology must both be chosen".to_string(),
            )),
        }
    }

    fn set_topology(&mut self, topology: Option<Topology>) {
        self.topology = topology;
        if topology != Some(Topology::Default) {
            self.parts = AdditionalElements::empty();
        }
    }

    fn is_available(&self, resolution: TextureResolution, topology: Topology) -> bool {
        self.variants.contains(&PackVariant::new(resolution, topology))
    }
}
