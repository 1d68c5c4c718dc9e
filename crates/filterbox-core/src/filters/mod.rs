//! Compiled-in filter channel table.
//!
//! Every adjustable channel is described once here: its stable id, display
//! name, unit, default and range, and the CSS filter function it renders to.
//! Everything downstream (state store, composition, rasterizer) is driven by
//! this table, so adding a channel means adding a row.
//!
//! ## Declaration Order
//! 1. Brightness
//! 2. Saturation
//! 3. Inversion
//! 4. Grayscale
//! 5. Blur (extended)
//! 6. Contrast (extended)
//! 7. Hue rotate (extended)
//! 8. Sepia (extended)
//! 9. Opacity (extended)
//!
//! Filters are composed in this order. Colour filters do not commute
//! (grayscale then invert differs from invert then grayscale), so the order
//! is part of the contract.

mod ops;

pub use ops::{FilterChain, FilterOp, ParseFilterError};

use serde::{Deserialize, Serialize};

/// Unit a filter value is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterUnit {
    /// Percentage, `100` means 100%.
    Percent,
    /// CSS pixel length.
    Pixels,
    /// Angle in degrees.
    Degrees,
}

impl FilterUnit {
    /// CSS suffix for this unit.
    pub fn suffix(self) -> &'static str {
        match self {
            FilterUnit::Percent => "%",
            FilterUnit::Pixels => "px",
            FilterUnit::Degrees => "deg",
        }
    }
}

/// The CSS filter function a channel renders to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterFunction {
    Brightness,
    Saturate,
    Invert,
    Grayscale,
    Blur,
    Contrast,
    HueRotate,
    Sepia,
    Opacity,
}

impl FilterFunction {
    /// All functions, for parsing.
    pub const ALL: [FilterFunction; 9] = [
        FilterFunction::Brightness,
        FilterFunction::Saturate,
        FilterFunction::Invert,
        FilterFunction::Grayscale,
        FilterFunction::Blur,
        FilterFunction::Contrast,
        FilterFunction::HueRotate,
        FilterFunction::Sepia,
        FilterFunction::Opacity,
    ];

    /// Name of the CSS function, e.g. `hue-rotate`.
    pub fn css_name(self) -> &'static str {
        match self {
            FilterFunction::Brightness => "brightness",
            FilterFunction::Saturate => "saturate",
            FilterFunction::Invert => "invert",
            FilterFunction::Grayscale => "grayscale",
            FilterFunction::Blur => "blur",
            FilterFunction::Contrast => "contrast",
            FilterFunction::HueRotate => "hue-rotate",
            FilterFunction::Sepia => "sepia",
            FilterFunction::Opacity => "opacity",
        }
    }

    /// Unit the function's argument is written in.
    pub fn unit(self) -> FilterUnit {
        match self {
            FilterFunction::Blur => FilterUnit::Pixels,
            FilterFunction::HueRotate => FilterUnit::Degrees,
            _ => FilterUnit::Percent,
        }
    }

    /// Look up a function by its CSS name.
    pub fn from_css_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.css_name() == name)
    }
}

/// One adjustable filter channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterParameter {
    /// Stable key, e.g. `"brightness"`.
    pub id: &'static str,
    /// Label shown next to the slider.
    pub name: &'static str,
    /// CSS function this channel drives.
    pub function: FilterFunction,
    /// Unit of the stored value.
    pub unit: FilterUnit,
    /// Value after a reset.
    pub default_value: f32,
    /// Inclusive lower bound.
    pub min: f32,
    /// Inclusive upper bound.
    pub max: f32,
}

impl FilterParameter {
    const fn new(
        id: &'static str,
        name: &'static str,
        function: FilterFunction,
        unit: FilterUnit,
        default_value: f32,
        min: f32,
        max: f32,
    ) -> Self {
        Self {
            id,
            name,
            function,
            unit,
            default_value,
            min,
            max,
        }
    }

    /// Constrain a value to this channel's range.
    ///
    /// NaN is treated as the default value rather than poisoning the state.
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            return self.default_value;
        }
        value.clamp(self.min, self.max)
    }
}

/// Every channel the editor knows about, in declaration order.
static PARAMETERS: [FilterParameter; 9] = [
    FilterParameter::new(
        "brightness",
        "Brightness",
        FilterFunction::Brightness,
        FilterUnit::Percent,
        100.0,
        0.0,
        200.0,
    ),
    FilterParameter::new(
        "saturation",
        "Saturation",
        FilterFunction::Saturate,
        FilterUnit::Percent,
        100.0,
        0.0,
        200.0,
    ),
    FilterParameter::new(
        "inversion",
        "Inversion",
        FilterFunction::Invert,
        FilterUnit::Percent,
        0.0,
        0.0,
        100.0,
    ),
    FilterParameter::new(
        "grayscale",
        "Grayscale",
        FilterFunction::Grayscale,
        FilterUnit::Percent,
        0.0,
        0.0,
        100.0,
    ),
    FilterParameter::new("blur", "Blur", FilterFunction::Blur, FilterUnit::Pixels, 0.0, 0.0, 20.0),
    FilterParameter::new(
        "contrast",
        "Contrast",
        FilterFunction::Contrast,
        FilterUnit::Percent,
        100.0,
        0.0,
        200.0,
    ),
    FilterParameter::new(
        "hue-rotate",
        "Hue Rotate",
        FilterFunction::HueRotate,
        FilterUnit::Degrees,
        0.0,
        0.0,
        360.0,
    ),
    FilterParameter::new("sepia", "Sepia", FilterFunction::Sepia, FilterUnit::Percent, 0.0, 0.0, 100.0),
    FilterParameter::new(
        "opacity",
        "Opacity",
        FilterFunction::Opacity,
        FilterUnit::Percent,
        100.0,
        0.0,
        200.0,
    ),
];

/// Number of channels in the basic editor.
const BASIC_LEN: usize = 4;

/// Which compiled-in channel table the editor runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterSet {
    /// Brightness, saturation, inversion and grayscale.
    #[default]
    Basic,
    /// The basic channels followed by blur, contrast, hue rotate, sepia and opacity.
    Extended,
}

impl FilterSet {
    /// Parameters of this set in declaration order.
    pub fn parameters(self) -> &'static [FilterParameter] {
        match self {
            FilterSet::Basic => &PARAMETERS[..BASIC_LEN],
            FilterSet::Extended => &PARAMETERS,
        }
    }

    /// Position of `id` in this set.
    pub fn index_of(self, id: &str) -> Option<usize> {
        self.parameters().iter().position(|p| p.id == id)
    }

    /// Look up a parameter by id.
    pub fn get(self, id: &str) -> Option<&'static FilterParameter> {
        self.parameters().iter().find(|p| p.id == id)
    }

    /// Number of channels.
    pub fn len(self) -> usize {
        self.parameters().len()
    }

    /// Always false; every set has at least one channel.
    pub fn is_empty(self) -> bool {
        self.parameters().is_empty()
    }
}
