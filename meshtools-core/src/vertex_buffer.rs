//! Vertex attribute storage
//!
//! A [`VertexBuffer`] holds positions plus the optional per-vertex
//! attributes a submesh (or shared geometry block) carries: normals, any
//! number of texture coordinate banks and a diffuse colour. Every attribute
//! is either absent or populated for all vertices; short attribute arrays
//! are tolerated and simply read as missing for the trailing vertices.

use crate::error::{Error, Result};
use crate::point::{Bounds, Point3f, Vector3f};
use log::warn;
use serde::{Deserialize, Serialize};

/// Allowed dimensionality of a texture coordinate bank
pub const TEXCOORD_DIMENSIONS: std::ops::RangeInclusive<usize> = 2..=4;

/// Per-vertex colour layout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorFormat {
    #[default]
    Rgb,
    Rgba,
}

impl ColorFormat {
    /// Number of floats stored per vertex
    pub fn components(self) -> usize {
        match self {
            ColorFormat::Rgb => 3,
            ColorFormat::Rgba => 4,
        }
    }
}

/// One texture coordinate channel with a fixed dimensionality
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TexcoordBank {
    dimension: usize,
    values: Vec<f32>,
}

impl TexcoordBank {
    fn new(dimension: usize) -> Self {
        Self {
            dimension,
            values: Vec::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Number of complete coordinate tuples stored
    pub fn len(&self) -> usize {
        self.values.len() / self.dimension
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Coordinates of vertex `index`, `None` if the bank is too short
    pub fn get(&self, index: usize) -> Option<&[f32]> {
        let start = index * self.dimension;
        self.values.get(start..start + self.dimension)
    }
}

/// Diffuse colour channel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorChannel {
    format: ColorFormat,
    values: Vec<f32>,
}

impl ColorChannel {
    pub fn format(&self) -> ColorFormat {
        self.format
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len() / self.format.components()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&[f32]> {
        let width = self.format.components();
        let start = index * width;
        self.values.get(start..start + width)
    }
}

/// Derived data cached on a buffer and dropped on every mutation.
///
/// Never part of a buffer's identity: any two caches compare equal.
#[derive(Debug, Clone, Default)]
pub struct Derived<T>(Option<T>);

impl<T> PartialEq for Derived<T> {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl<T> Derived<T> {
    pub fn is_fresh(&self) -> bool {
        self.0.is_some()
    }

    pub fn get(&self) -> Option<&T> {
        self.0.as_ref()
    }

    pub fn invalidate(&mut self) {
        self.0 = None;
    }

    /// Cached value if `valid` accepts it, otherwise a newly built one
    pub fn refresh(&mut self, valid: impl FnOnce(&T) -> bool, build: impl FnOnce() -> T) -> &mut T {
        if !self.0.as_ref().is_some_and(valid) {
            self.0 = None;
        }
        self.0.get_or_insert_with(build)
    }
}

/// Which attributes of a buffer hold a value for every vertex
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeMask {
    pub normals: bool,
    /// One flag per texcoord bank
    pub texcoords: Vec<bool>,
    pub colors: bool,
}

impl AttributeMask {
    /// Attributes that hold some values but not one per vertex
    pub fn partial_in(&self, buffer: &VertexBuffer) -> Vec<String> {
        let mut partial = Vec::new();
        if !self.normals && buffer.has_normals() {
            partial.push("normals".to_string());
        }
        for (bank, complete) in self.texcoords.iter().enumerate() {
            if !complete && buffer.texcoords.get(bank).is_some_and(|b| !b.is_empty()) {
                partial.push(format!("texcoord bank {}", bank));
            }
        }
        if !self.colors && buffer.has_colors() {
            partial.push("colours".to_string());
        }
        partial
    }
}

/// Positions, normals, texture coordinates and colours of a set of vertices
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VertexBuffer {
    positions: Vec<Point3f>,
    normals: Vec<Vector3f>,
    texcoords: Vec<TexcoordBank>,
    colors: ColorChannel,
    bounds: Option<Bounds>,
    #[serde(skip)]
    reference_counts: Derived<Vec<u32>>,
}

impl VertexBuffer {
    /// Create a new empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty buffer with the same texcoord bank layout and colour format
    pub fn empty_like(&self) -> Self {
        Self {
            texcoords: self
                .texcoords
                .iter()
                .map(|bank| TexcoordBank::new(bank.dimension))
                .collect(),
            colors: ColorChannel {
                format: self.colors.format,
                values: Vec::new(),
            },
            ..Self::default()
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Append a vertex position and return its index
    pub fn add_vertex(&mut self, position: Point3f) -> usize {
        let index = self.positions.len();
        self.positions.push(position);
        match self.bounds.as_mut() {
            Some(bounds) => bounds.include(position, index),
            None => self.bounds = Some(Bounds::from_point(position, index)),
        }
        self.reference_counts.invalidate();
        index
    }

    pub fn add_normal(&mut self, normal: Vector3f) {
        self.normals.push(normal);
    }

    /// Declare a new texture coordinate bank and return its index.
    ///
    /// Dimensions outside 2..=4 are clamped into range.
    pub fn declare_texcoord_bank(&mut self, dimension: usize) -> usize {
        let clamped = dimension.clamp(*TEXCOORD_DIMENSIONS.start(), *TEXCOORD_DIMENSIONS.end());
        if clamped != dimension {
            warn!(
                "texcoord bank dimension {} out of range, using {}",
                dimension, clamped
            );
        }
        self.texcoords.push(TexcoordBank::new(clamped));
        self.texcoords.len() - 1
    }

    /// Append coordinates to a declared bank. Unknown banks are ignored.
    pub fn add_texcoord(&mut self, bank: usize, values: &[f32]) {
        let count = self.texcoords.len();
        match self.texcoords.get_mut(bank) {
            Some(target) => target.values.extend_from_slice(values),
            None => warn!(
                "texcoord bank {} not declared ({} banks), dropping {} values",
                bank,
                count,
                values.len()
            ),
        }
    }

    pub fn set_color_format(&mut self, format: ColorFormat) {
        self.colors.format = format;
    }

    pub fn color_format(&self) -> ColorFormat {
        self.colors.format
    }

    /// Append one colour; callers supply the declared number of components.
    pub fn add_color(&mut self, components: &[f32]) {
        self.colors.values.extend_from_slice(components);
    }

    pub fn positions(&self) -> &[Point3f] {
        &self.positions
    }

    pub fn position(&self, index: usize) -> Option<&Point3f> {
        self.positions.get(index)
    }

    pub fn normals(&self) -> &[Vector3f] {
        &self.normals
    }

    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }

    pub fn texcoord_banks(&self) -> &[TexcoordBank] {
        &self.texcoords
    }

    pub fn texcoord_bank_count(&self) -> usize {
        self.texcoords.len()
    }

    pub fn texcoord(&self, bank: usize, index: usize) -> Option<&[f32]> {
        self.texcoords.get(bank).and_then(|b| b.get(index))
    }

    pub fn colors(&self) -> &ColorChannel {
        &self.colors
    }

    pub fn has_colors(&self) -> bool {
        !self.colors.is_empty()
    }

    pub fn color(&self, index: usize) -> Option<&[f32]> {
        self.colors.get(index)
    }

    pub fn bounds(&self) -> Option<&Bounds> {
        self.bounds.as_ref()
    }

    /// Move every vertex by `offset`
    pub fn translate(&mut self, offset: &Vector3f) {
        for position in &mut self.positions {
            *position += *offset;
        }
        if let Some(bounds) = self.bounds.as_mut() {
            bounds.translate(offset);
        }
    }

    /// Append every attribute array of `other` to this buffer.
    ///
    /// Banks are matched by index; banks only `other` has are declared with
    /// its dimension. The colour format is adopted when this buffer has no
    /// colours yet.
    pub fn merge(&mut self, other: &VertexBuffer) {
        let offset = self.positions.len();
        self.positions.extend_from_slice(&other.positions);
        self.normals.extend_from_slice(&other.normals);

        for (bank, source) in other.texcoords.iter().enumerate() {
            if bank == self.texcoords.len() {
                self.texcoords.push(TexcoordBank::new(source.dimension));
            }
            let target = &mut self.texcoords[bank];
            if target.dimension != source.dimension {
                warn!(
                    "merging texcoord bank {} with dimension {} into dimension {}",
                    bank, source.dimension, target.dimension
                );
            }
            target.values.extend_from_slice(&source.values);
        }

        if self.colors.is_empty() {
            self.colors.format = other.colors.format;
        }
        self.colors.values.extend_from_slice(&other.colors.values);

        self.bounds = match (self.bounds, other.bounds) {
            (Some(own), Some(theirs)) => Some(own.union(&theirs, offset)),
            (None, Some(theirs)) => Some(theirs),
            (own, None) => own,
        };
        self.reference_counts.invalidate();
    }

    /// Reference counter array sized to the vertex count.
    ///
    /// Allocated zero-filled when stale or wrongly sized; otherwise the
    /// cached array is returned untouched.
    pub fn setup_reference_counts(&mut self) -> &mut Vec<u32> {
        let vertex_count = self.positions.len();
        self.reference_counts
            .refresh(|counts| counts.len() == vertex_count, || vec![0; vertex_count])
    }

    /// Cached reference counts, if still valid
    pub fn reference_counts(&self) -> Option<&[u32]> {
        self.reference_counts.get().map(Vec::as_slice)
    }

    /// Attributes populated for exactly every vertex
    pub fn complete_attributes(&self) -> AttributeMask {
        let vertex_count = self.positions.len();
        AttributeMask {
            normals: self.normals.len() == vertex_count,
            texcoords: self
                .texcoords
                .iter()
                .map(|bank| bank.values.len() == vertex_count * bank.dimension)
                .collect(),
            colors: self.colors.values.len() == vertex_count * self.colors.format.components(),
        }
    }

    /// Append vertex `index` of `source` with the attributes `mask` selects.
    ///
    /// `mask` should come from [`VertexBuffer::complete_attributes`] on
    /// `source`, so every copied attribute stays aligned with its position.
    pub fn copy_vertex_from(&mut self, source: &VertexBuffer, index: usize, mask: &AttributeMask) -> Option<usize> {
        let position = *source.positions.get(index)?;
        let new_index = self.add_vertex(position);
        if mask.normals {
            if let Some(normal) = source.normals.get(index) {
                self.normals.push(*normal);
            }
        }
        for (bank, source_bank) in source.texcoords.iter().enumerate() {
            if bank == self.texcoords.len() {
                self.texcoords.push(TexcoordBank::new(source_bank.dimension));
            }
            if !mask.texcoords.get(bank).copied().unwrap_or(false) {
                continue;
            }
            if let Some(values) = source_bank.get(index) {
                self.texcoords[bank].values.extend_from_slice(values);
            }
        }
        if mask.colors {
            if let Some(color) = source.colors.get(index) {
                if self.colors.is_empty() {
                    self.colors.format = source.colors.format;
                }
                self.colors.values.extend_from_slice(color);
            }
        }
        Some(new_index)
    }

    /// Check that every present attribute covers exactly all vertices
    pub fn validate(&self) -> Result<()> {
        let vertex_count = self.positions.len();
        if !self.normals.is_empty() && self.normals.len() != vertex_count {
            return Err(Error::InvalidData(format!(
                "{} normals for {} vertices",
                self.normals.len(),
                vertex_count
            )));
        }
        for (bank, texcoords) in self.texcoords.iter().enumerate() {
            let partial = texcoords.values.len() % texcoords.dimension != 0;
            if partial || (!texcoords.is_empty() && texcoords.len() != vertex_count) {
                return Err(Error::InvalidData(format!(
                    "texcoord bank {} holds {} values of dimension {} for {} vertices",
                    bank,
                    texcoords.values.len(),
                    texcoords.dimension,
                    vertex_count
                )));
            }
        }
        let width = self.colors.format.components();
        if self.colors.values.len() % width != 0
            || (!self.colors.is_empty() && self.colors.len() != vertex_count)
        {
            return Err(Error::InvalidData(format!(
                "{} colour components of width {} for {} vertices",
                self.colors.values.len(),
                width,
                vertex_count
            )));
        }
        Ok(())
    }

    /// Remove all vertex data, keeping the bank layout and colour format
    pub fn clear(&mut self) {
        *self = self.empty_like();
    }
}
