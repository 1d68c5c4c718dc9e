//! The editing session: one loaded image, its filter store, and both sinks.
//!
//! Loading is split in two so a host that decodes asynchronously can start a
//! load, let the user pick another file, and have the first completion
//! discarded. Only the most recently issued [`LoadTicket`] can finish.
//!
//! A [`PreviewSink`] attached with [`EditorSession::attach_preview`] is
//! refreshed after every state change and every completed load while an
//! image is present.

use std::fmt;

use image::RgbaImage;

use crate::compose::{Composition, PreviewSink};
use crate::config::EditorConfig;
use crate::decode::{decode_image, DecodeError};
use crate::error::EditorError;
use crate::export::{export_image, ExportedImage};
use crate::filters::FilterParameter;
use crate::state::{FilterStore, StoreSnapshot};

/// Identifies one call to [`EditorSession::begin_load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket(u64);

/// Result of finishing a load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A newer load was started; this one was dropped.
    Stale,
    /// The image replaced the previous one and the store was reset.
    Loaded {
        width: u32,
        height: u32,
        /// Preview handle of the replaced image, to be released by the host.
        released_handle: Option<String>,
    },
}

#[derive(Debug)]
struct PendingLoad {
    ticket: LoadTicket,
    bytes: Vec<u8>,
    mime: String,
}

/// The currently loaded image.
#[derive(Debug, Clone)]
pub struct SourceImage {
    bytes: Vec<u8>,
    mime: String,
    bitmap: RgbaImage,
    handle: Option<String>,
}

impl SourceImage {
    /// Original file bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// Decoded bitmap at natural size.
    pub fn bitmap(&self) -> &RgbaImage {
        &self.bitmap
    }

    pub fn width(&self) -> u32 {
        self.bitmap.width()
    }

    pub fn height(&self) -> u32 {
        self.bitmap.height()
    }

    /// Preview handle (object URL) the host created for this image, if any.
    pub fn handle(&self) -> Option<&str> {
        self.handle.as_deref()
    }
}

pub struct EditorSession {
    config: EditorConfig,
    store: FilterStore,
    source: Option<SourceImage>,
    pending: Option<PendingLoad>,
    next_ticket: u64,
    preview: Option<Box<dyn PreviewSink>>,
}

impl fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorSession")
            .field("config", &self.config)
            .field("store", &self.store)
            .field("source", &self.source)
            .field("pending", &self.pending)
            .field("preview_attached", &self.preview.is_some())
            .finish_non_exhaustive()
    }
}

impl EditorSession {
    pub fn new(config: EditorConfig) -> Self {
        let store = FilterStore::new(config.filter_set);
        Self {
            config,
            store,
            source: None,
            pending: None,
            next_ticket: 0,
            preview: None,
        }
    }

    /// Keep `sink` in sync with the session from now on.
    ///
    /// The sink receives the current description immediately if an image is
    /// loaded. Replaces any previously attached sink.
    pub fn attach_preview(&mut self, sink: Box<dyn PreviewSink>) {
        self.preview = Some(sink);
        self.notify_preview();
    }

    pub fn detach_preview(&mut self) -> Option<Box<dyn PreviewSink>> {
        self.preview.take()
    }

    /// Push the current description to the attached sink, if any.
    fn notify_preview(&mut self) {
        if self.source.is_none() {
            return;
        }
        if let Some(sink) = self.preview.as_mut() {
            sink.apply(&Composition::from_store(&self.store).preview_style());
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn store(&self) -> &FilterStore {
        &self.store
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    pub fn has_image(&self) -> bool {
        self.source.is_some()
    }

    /// Whether a load has begun and not yet finished.
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Start loading `bytes`, superseding any load still in flight.
    pub fn begin_load(&mut self, bytes: Vec<u8>, mime: &str) -> LoadTicket {
        let ticket = LoadTicket(self.next_ticket);
        self.next_ticket = self.next_ticket.wrapping_add(1);
        if let Some(previous) = self.pending.replace(PendingLoad {
            ticket,
            bytes,
            mime: mime.to_string(),
        }) {
            log::debug!("Load {:?} superseded by {:?}", previous.ticket, ticket);
        }
        ticket
    }

    /// Decode the pending load for `ticket` and make it the current image.
    ///
    /// On a decode failure the pending load is dropped and the previous image
    /// and all edit state are left untouched.
    pub fn finish_load(&mut self, ticket: LoadTicket) -> Result<LoadOutcome, EditorError> {
        let Some(pending) = self.pending.take_if(|p| p.ticket == ticket) else {
            log::warn!("Discarding stale load {ticket:?}");
            return Ok(LoadOutcome::Stale);
        };

        let bitmap = decode_image(&pending.bytes, &pending.mime)
            .and_then(|decoded| {
                decoded.into_rgba_image().ok_or_else(|| {
                    DecodeError::CorruptedFile("pixel buffer does not match dimensions".into())
                })
            })
            .inspect_err(|e| log::warn!("Failed to load image: {e}"))?;

        let (width, height) = bitmap.dimensions();
        let released_handle = self.source.take().and_then(|s| s.handle);
        self.source = Some(SourceImage {
            bytes: pending.bytes,
            mime: pending.mime,
            bitmap,
            handle: None,
        });
        self.store.reset();
        log::debug!("Loaded {width}x{height} image");
        self.notify_preview();

        Ok(LoadOutcome::Loaded {
            width,
            height,
            released_handle,
        })
    }

    /// Begin and finish a load in one step.
    pub fn load(&mut self, bytes: Vec<u8>, mime: &str) -> Result<LoadOutcome, EditorError> {
        let ticket = self.begin_load(bytes, mime);
        self.finish_load(ticket)
    }

    /// Record the host's preview handle for the current image.
    ///
    /// Returns the handle it replaces, which the host must release.
    pub fn attach_preview_handle(
        &mut self,
        handle: impl Into<String>,
    ) -> Result<Option<String>, EditorError> {
        let source = self.source.as_mut().ok_or(EditorError::NoImageLoaded)?;
        Ok(source.handle.replace(handle.into()))
    }

    /// Drop the current image and any pending load.
    ///
    /// Returns the image's preview handle for the host to release.
    pub fn close(&mut self) -> Option<String> {
        self.pending = None;
        self.store.reset();
        self.source.take().and_then(|s| s.handle)
    }

    // Store operations

    pub fn set_parameter(&mut self, id: &str, value: f32) -> Result<f32, EditorError> {
        let stored = self.store.set_parameter(id, value)?;
        self.notify_preview();
        Ok(stored)
    }

    pub fn select_active(&mut self, id: &str) -> Result<f32, EditorError> {
        let stored = self.store.select_active(id)?;
        self.notify_preview();
        Ok(stored)
    }

    pub fn set_active_value(&mut self, value: f32) -> f32 {
        let stored = self.store.set_active_value(value);
        self.notify_preview();
        stored
    }

    pub fn current_value(&self, id: &str) -> Result<f32, EditorError> {
        self.store.value(id)
    }

    pub fn active_parameter(&self) -> &'static FilterParameter {
        self.store.active_parameter()
    }

    pub fn active_value(&self) -> f32 {
        self.store.active_value()
    }

    pub fn rotate_left(&mut self) {
        self.store.rotate_left();
        self.notify_preview();
    }

    pub fn rotate_right(&mut self) {
        self.store.rotate_right();
        self.notify_preview();
    }

    pub fn flip_horizontal(&mut self) {
        self.store.flip_horizontal();
        self.notify_preview();
    }

    pub fn flip_vertical(&mut self) {
        self.store.flip_vertical();
        self.notify_preview();
    }

    pub fn reset(&mut self) {
        self.store.reset();
        self.notify_preview();
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.store.snapshot()
    }

    // Sinks

    pub fn composition(&self) -> Composition {
        Composition::from_store(&self.store)
    }

    /// Push the full preview description to `sink`.
    pub fn refresh_preview<S: PreviewSink + ?Sized>(&self, sink: &mut S) -> Result<(), EditorError> {
        if self.source.is_none() {
            return Err(EditorError::NoImageLoaded);
        }
        sink.apply(&self.composition().preview_style());
        Ok(())
    }

    /// Rasterize the current image with the current edits and encode it.
    pub fn export(&self) -> Result<ExportedImage, EditorError> {
        let source = self.source.as_ref().ok_or(EditorError::NoImageLoaded)?;
        export_image(&source.bitmap, &self.composition(), &self.config.export)
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}
