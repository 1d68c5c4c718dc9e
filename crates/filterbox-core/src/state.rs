//! Filter and transform state store.
//!
//! All editable state lives in one [`FilterStore`] aggregate so that a reset
//! is all-or-nothing. Per-parameter access goes through the filter table
//! ([`FilterState::current_value`] / [`FilterState::with_value`]) instead of
//! per-channel branches.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::EditorError;
use crate::filters::{FilterParameter, FilterSet};

/// Orientation along one axis. Renders as a scale factor of exactly 1 or -1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Flip {
    #[default]
    Normal,
    Mirrored,
}

impl Flip {
    /// The other orientation.
    #[inline]
    pub fn toggled(self) -> Self {
        match self {
            Flip::Normal => Flip::Mirrored,
            Flip::Mirrored => Flip::Normal,
        }
    }

    /// Scale factor: 1 or -1.
    #[inline]
    pub fn factor(self) -> i8 {
        match self {
            Flip::Normal => 1,
            Flip::Mirrored => -1,
        }
    }
}

impl From<Flip> for i8 {
    fn from(flip: Flip) -> Self {
        flip.factor()
    }
}

impl TryFrom<i8> for Flip {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Flip::Normal),
            -1 => Ok(Flip::Mirrored),
            other => Err(format!("flip factor must be 1 or -1, got {other}")),
        }
    }
}

/// Rotation and flips applied about the image centre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformState {
    /// Accumulated rotation in degrees; only its value mod 360 matters.
    pub rotation_degrees: i32,
    pub flip_horizontal: Flip,
    pub flip_vertical: Flip,
}

impl TransformState {
    /// No rotation, no flips.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Rotate a quarter turn counter-clockwise.
    pub fn rotate_left(&mut self) {
        self.rotate_by(-90);
    }

    /// Rotate a quarter turn clockwise.
    pub fn rotate_right(&mut self) {
        self.rotate_by(90);
    }

    fn rotate_by(&mut self, delta: i32) {
        // Fold back into 0..360 only if accumulation would overflow.
        self.rotation_degrees = self
            .rotation_degrees
            .checked_add(delta)
            .unwrap_or_else(|| self.rotation_degrees.rem_euclid(360) + delta);
    }

    pub fn toggle_flip_horizontal(&mut self) {
        self.flip_horizontal = self.flip_horizontal.toggled();
    }

    pub fn toggle_flip_vertical(&mut self) {
        self.flip_vertical = self.flip_vertical.toggled();
    }

    /// Rotation reduced to 0..360.
    #[inline]
    pub fn normalized_rotation(&self) -> i32 {
        self.rotation_degrees.rem_euclid(360)
    }

    /// Rotation in radians: `degrees * PI / 180`.
    #[inline]
    pub fn rotation_radians(&self) -> f64 {
        self.rotation_degrees as f64 * PI / 180.0
    }

    /// Whether rendering this transform is a no-op.
    pub fn is_identity(&self) -> bool {
        self.normalized_rotation() == 0
            && self.flip_horizontal == Flip::Normal
            && self.flip_vertical == Flip::Normal
    }
}

/// Current value of every parameter of a filter set.
///
/// Values are stored in declaration order and are always within range.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    set: FilterSet,
    values: Vec<f32>,
}

impl FilterState {
    /// Every parameter at its default.
    pub fn defaults(set: FilterSet) -> Self {
        Self {
            set,
            values: set.parameters().iter().map(|p| p.default_value).collect(),
        }
    }

    pub fn filter_set(&self) -> FilterSet {
        self.set
    }

    fn index(&self, id: &str) -> Result<usize, EditorError> {
        self.set
            .index_of(id)
            .ok_or_else(|| EditorError::InvalidParameter(id.to_string()))
    }

    /// Stored value for `id`.
    pub fn current_value(&self, id: &str) -> Result<f32, EditorError> {
        Ok(self.values[self.index(id)?])
    }

    /// A copy of this state with `id` set to `value`, clamped to its range.
    pub fn with_value(mut self, id: &str, value: f32) -> Result<Self, EditorError> {
        self.set_value(id, value)?;
        Ok(self)
    }

    /// Set `id` in place, returning the clamped value actually stored.
    pub fn set_value(&mut self, id: &str, value: f32) -> Result<f32, EditorError> {
        let index = self.index(id)?;
        Ok(self.set_at(index, value))
    }

    fn set_at(&mut self, index: usize, value: f32) -> f32 {
        let clamped = self.set.parameters()[index].clamp(value);
        self.values[index] = clamped;
        clamped
    }

    /// (parameter, value) pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static FilterParameter, f32)> + '_ {
        self.set.parameters().iter().zip(self.values.iter().copied())
    }

    /// Whether every parameter is at its default.
    pub fn is_default(&self) -> bool {
        self.iter().all(|(p, v)| p.default_value == v)
    }
}

/// One (id, value) pair in a [`StoreSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterValue {
    pub id: &'static str,
    pub value: f32,
}

/// Serializable view of the store, for handing state to the UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    pub active: &'static str,
    pub active_value: f32,
    pub filters: Vec<ParameterValue>,
    pub transform: TransformState,
}

/// The editing session's filter state, transform state and active selection.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterStore {
    filters: FilterState,
    transform: TransformState,
    /// Index of the parameter bound to the shared slider.
    active: usize,
    /// Intensity shown on the slider; mirrors the active parameter's value.
    observed: f32,
}

impl FilterStore {
    pub fn new(set: FilterSet) -> Self {
        let filters = FilterState::defaults(set);
        let observed = filters.values[0];
        Self {
            filters,
            transform: TransformState::identity(),
            active: 0,
            observed,
        }
    }

    pub fn filter_set(&self) -> FilterSet {
        self.filters.set
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn transform(&self) -> &TransformState {
        &self.transform
    }

    /// Set one parameter, clamped to its declared range.
    ///
    /// Returns the stored value. Other parameters are untouched.
    pub fn set_parameter(&mut self, id: &str, value: f32) -> Result<f32, EditorError> {
        let index = self.filters.index(id)?;
        let stored = self.filters.set_at(index, value);
        if index == self.active {
            self.observed = stored;
        }
        Ok(stored)
    }

    /// Bind the slider to `id` and return that parameter's stored value.
    pub fn select_active(&mut self, id: &str) -> Result<f32, EditorError> {
        let index = self.filters.index(id)?;
        self.active = index;
        self.observed = self.filters.values[index];
        Ok(self.observed)
    }

    /// Route a slider value to the active parameter.
    pub fn set_active_value(&mut self, value: f32) -> f32 {
        let stored = self.filters.set_at(self.active, value);
        self.observed = stored;
        stored
    }

    /// (parameter, value) pairs in declaration order, for listing in the UI.
    pub fn parameters(&self) -> impl Iterator<Item = (&'static FilterParameter, f32)> + '_ {
        self.filters.iter()
    }

    pub fn active_parameter(&self) -> &'static FilterParameter {
        &self.filters.set.parameters()[self.active]
    }

    pub fn active_id(&self) -> &'static str {
        self.active_parameter().id
    }

    /// Intensity currently shown on the slider.
    pub fn active_value(&self) -> f32 {
        self.observed
    }

    /// Stored value for any parameter.
    pub fn value(&self, id: &str) -> Result<f32, EditorError> {
        self.filters.current_value(id)
    }

    pub fn rotate_left(&mut self) {
        self.transform.rotate_left();
    }

    pub fn rotate_right(&mut self) {
        self.transform.rotate_right();
    }

    pub fn flip_horizontal(&mut self) {
        self.transform.toggle_flip_horizontal();
    }

    pub fn flip_vertical(&mut self) {
        self.transform.toggle_flip_vertical();
    }

    /// Restore defaults, identity transform and the first parameter as active.
    pub fn reset(&mut self) {
        *self = Self::new(self.filters.set);
        log::debug!("Filter state reset to defaults");
    }

    pub fn is_default(&self) -> bool {
        self.filters.is_default() && self.transform.is_identity()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            active: self.active_id(),
            active_value: self.observed,
            filters: self
                .filters
                .iter()
                .map(|(p, value)| ParameterValue { id: p.id, value })
                .collect(),
            transform: self.transform,
        }
    }
}

impl Default for FilterStore {
    fn default() -> Self {
        Self::new(FilterSet::default())
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
