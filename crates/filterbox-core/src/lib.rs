//! Filterbox Core - single-image filter editor
//!
//! This crate holds everything about the editor that does not touch the DOM:
//! the filter table and its state store, the composition both sinks render,
//! a software canvas for export, and decoding/encoding of image files.
//!
//! The browser bindings live in `filterbox-wasm`.

pub mod compose;
pub mod config;
pub mod decode;
pub mod encode;
pub mod error;
pub mod export;
pub mod filters;
pub mod render;
pub mod session;
pub mod state;

pub use compose::{Composition, DrawStep, DrawingSurface, PreviewSink, PreviewStyle};
pub use config::{EditorConfig, ExportOptions};
pub use error::EditorError;
pub use export::{export_image, rasterize, ExportedImage};
pub use filters::{FilterChain, FilterFunction, FilterOp, FilterParameter, FilterSet};
pub use render::RasterSurface;
pub use session::{EditorSession, LoadOutcome, LoadTicket, SourceImage};
pub use state::{FilterState, FilterStore, Flip, StoreSnapshot, TransformState};
