//! Editor session state.
//!
//! Everything the editor knows lives in one [`EditorSession`]: the current
//! image, the adjustments, the crop and the export settings. UI bindings hold
//! the session and forward events to it, so the whole pipeline runs headless
//! in tests.
//!
//! ## Crop
//! The crop widget reports a rectangle on every drag ("live") and once more
//! on pointer release ("committed"). Only the committed rectangle is used for
//! export.
//!
//! ## Background Removal
//! Removal is the only asynchronous operation. At most one call may be in
//! flight: [`EditorSession::begin_removal`] rejects a second call until
//! [`EditorSession::finish_removal`] has run. There is no cancellation. If a
//! new file is loaded while a removal is pending, its result is discarded.

use crate::adjustments::{AdjustmentParam, AdjustmentSet};
use crate::export::{
    deliver, export_and_download, export_filename, export_png, DownloadSink, ExportError,
    ExportOptions, ExportedImage,
};
use crate::geometry::{AspectPreset, CropRectangle};
use crate::handle::{DisplaySize, ImageError, ImageHandle};
use crate::preview::PreviewStyle;
use async_trait::async_trait;
use std::cell::RefCell;
use thiserror::Error;

/// Errors reported by the background-removal collaborator.
#[derive(Debug, Error)]
pub enum RemovalError {
    /// The model call failed
    #[error("Background removal failed: {0}")]
    Failed(String),

    /// The model returned something that is not a usable image
    #[error("Background removal returned an invalid image: {0}")]
    InvalidOutput(#[from] ImageError),
}

/// Errors raised by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No image loaded")]
    NoImage,

    #[error("Background removal already in progress")]
    RemovalInFlight,

    #[error("Image changed while background removal was running; result discarded")]
    StaleRemoval,

    #[error(transparent)]
    Removal(#[from] RemovalError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Image(#[from] ImageError),
}

/// Asynchronous image → image transform that removes the background.
#[async_trait(?Send)]
pub trait BackgroundRemover {
    async fn remove_background(&self, image: &ImageHandle) -> Result<ImageHandle, RemovalError>;
}

/// Proof that a removal was started, carrying the image it runs on.
#[derive(Debug)]
pub struct RemovalTicket {
    generation: u64,
    source: ImageHandle,
}

impl RemovalTicket {
    /// The image handed to the remover.
    pub fn source(&self) -> &ImageHandle {
        &self.source
    }
}

/// All editor state for one browser tab.
#[derive(Debug, Default)]
pub struct EditorSession {
    image: Option<ImageHandle>,
    adjustments: AdjustmentSet,
    aspect: AspectPreset,
    live_crop: Option<CropRectangle>,
    committed_crop: Option<CropRectangle>,
    export_options: ExportOptions,
    removal_in_flight: bool,
    /// Bumped on every file load so late removal results can be recognised.
    generation: u64,
}

impl EditorSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_export_options(export_options: ExportOptions) -> Self {
        Self {
            export_options,
            ..Self::default()
        }
    }

    // ---- image -------------------------------------------------------------

    /// Show a newly selected file.
    ///
    /// Adjustments go back to their defaults and a centred crop is created
    /// for the current aspect preset.
    pub fn load_image(&mut self, image: ImageHandle) {
        let (w, h) = image.natural_size();
        tracing::debug!(width = w, height = h, "Loading image");

        self.adjustments.reset();
        self.generation = self.generation.wrapping_add(1);
        self.replace_image(image);
    }

    fn replace_image(&mut self, image: ImageHandle) {
        let crop = CropRectangle::centered(self.aspect, &image.displayed_size());
        self.live_crop = Some(crop);
        self.committed_crop = Some(crop);
        self.image = Some(image);
    }

    pub fn image(&self) -> Option<&ImageHandle> {
        self.image.as_ref()
    }

    /// Record a new on-screen size for the current image.
    pub fn set_displayed_size(&mut self, displayed: DisplaySize) -> Result<(), SessionError> {
        let image = self.image.as_ref().ok_or(SessionError::NoImage)?;
        self.image = Some(image.with_displayed_size(displayed)?);
        Ok(())
    }

    // ---- adjustments -------------------------------------------------------

    pub fn adjustments(&self) -> &AdjustmentSet {
        &self.adjustments
    }

    /// Direct access for callers that clamp their own input.
    pub fn adjustments_mut(&mut self) -> &mut AdjustmentSet {
        &mut self.adjustments
    }

    /// Set one parameter from a UI control, clamped to its range.
    pub fn set_adjustment(&mut self, param: AdjustmentParam, value: f32) {
        self.adjustments.set(param, value);
    }

    pub fn reset_adjustments(&mut self) {
        self.adjustments.reset();
    }

    // ---- crop --------------------------------------------------------------

    pub fn aspect(&self) -> AspectPreset {
        self.aspect
    }

    /// Switch aspect preset; the crop is replaced by a new centred one.
    pub fn set_aspect(&mut self, aspect: AspectPreset) {
        self.aspect = aspect;
        if let Some(image) = &self.image {
            let crop = CropRectangle::centered(aspect, &image.displayed_size());
            self.live_crop = Some(crop);
            self.committed_crop = Some(crop);
        }
    }

    /// Crop reported while the user is dragging.
    pub fn update_crop(&mut self, crop: CropRectangle) {
        self.live_crop = Some(crop);
    }

    /// Crop reported on pointer release; this is the one exported.
    pub fn commit_crop(&mut self, crop: CropRectangle) {
        self.live_crop = Some(crop);
        self.committed_crop = Some(crop);
    }

    /// Drop the crop so the whole image is exported.
    pub fn clear_crop(&mut self) {
        self.live_crop = None;
        self.committed_crop = None;
    }

    pub fn live_crop(&self) -> Option<&CropRectangle> {
        self.live_crop.as_ref()
    }

    pub fn committed_crop(&self) -> Option<&CropRectangle> {
        self.committed_crop.as_ref()
    }

    // ---- preview and export ------------------------------------------------

    /// CSS for the live preview, or `None` before an image is loaded.
    pub fn preview(&self) -> Option<PreviewStyle> {
        self.image
            .as_ref()
            .map(|image| PreviewStyle::compute(&self.adjustments, &image.displayed_size()))
    }

    pub fn export_options(&self) -> &ExportOptions {
        &self.export_options
    }

    pub fn set_export_options(&mut self, export_options: ExportOptions) {
        self.export_options = export_options;
    }

    /// Export the current image with the committed crop and deliver it to `sink`.
    ///
    /// Returns the download file name.
    pub fn export<S: DownloadSink>(
        &self,
        timestamp_ms: u64,
        sink: &mut S,
    ) -> Result<String, SessionError> {
        let image = self.image.as_ref().ok_or(SessionError::NoImage)?;
        let filename = export_and_download(
            image,
            self.committed_crop.as_ref(),
            &self.adjustments,
            &self.export_options,
            timestamp_ms,
            sink,
        )?;
        Ok(filename)
    }

    /// Render and encode the export without delivering it.
    ///
    /// Returns the download file name together with the PNG.
    pub fn prepare_export(
        &self,
        timestamp_ms: u64,
    ) -> Result<(String, ExportedImage), SessionError> {
        let image = self.image.as_ref().ok_or(SessionError::NoImage)?;
        let exported = match export_png(
            image,
            self.committed_crop.as_ref(),
            &self.adjustments,
            &self.export_options,
        ) {
            Ok(exported) => exported,
            Err(e) => {
                tracing::warn!(error = %e, "Export failed");
                return Err(e.into());
            }
        };
        let filename = export_filename(&self.export_options.filename_prefix, timestamp_ms);
        Ok((filename, exported))
    }

    // ---- background removal ------------------------------------------------

    pub fn is_removal_in_flight(&self) -> bool {
        self.removal_in_flight
    }

    /// Start a background removal on the current image.
    pub fn begin_removal(&mut self) -> Result<RemovalTicket, SessionError> {
        if self.removal_in_flight {
            return Err(SessionError::RemovalInFlight);
        }
        let source = self.image.clone().ok_or(SessionError::NoImage)?;
        self.removal_in_flight = true;
        tracing::debug!("Background removal started");
        Ok(RemovalTicket {
            generation: self.generation,
            source,
        })
    }

    /// Complete a removal started with [`begin_removal`](Self::begin_removal).
    ///
    /// On success the image is replaced and the crop re-centred; adjustments
    /// are kept. On failure nothing but the in-flight flag changes.
    pub fn finish_removal(
        &mut self,
        ticket: RemovalTicket,
        result: Result<ImageHandle, RemovalError>,
    ) -> Result<(), SessionError> {
        self.removal_in_flight = false;

        let image = match result {
            Ok(image) => image,
            Err(e) => {
                tracing::warn!(error = %e, "Background removal failed");
                return Err(e.into());
            }
        };

        if ticket.generation != self.generation {
            tracing::debug!("Discarding background removal for a replaced image");
            return Err(SessionError::StaleRemoval);
        }

        // The page may have been resized while the model ran.
        let image = match &self.image {
            Some(current) => image.with_displayed_size(current.displayed_size())?,
            None => image,
        };
        self.replace_image(image);
        tracing::debug!("Background removal applied");
        Ok(())
    }
}

/// Export from a shared session and deliver the file to `sink`.
///
/// The session is borrowed only while rendering and encoding. `sink` may
/// therefore re-enter the session while the download is handed off.
pub fn export_session<S: DownloadSink>(
    session: &RefCell<EditorSession>,
    timestamp_ms: u64,
    sink: &mut S,
) -> Result<String, SessionError> {
    let (filename, exported) = session.borrow().prepare_export(timestamp_ms)?;
    if let Err(e) = deliver(&exported, &filename, sink) {
        tracing::warn!(error = %e, "Export failed");
        return Err(e.into());
    }
    Ok(filename)
}

/// Run one background removal against a shared session.
///
/// The session is only borrowed before and after the model call, never
/// across the await, so UI events keep working while the call is pending.
pub async fn remove_background<R: BackgroundRemover + ?Sized>(
    session: &RefCell<EditorSession>,
    remover: &R,
) -> Result<(), SessionError> {
    let ticket = session.borrow_mut().begin_removal()?;
    complete_removal(session, ticket, remover).await
}

/// Second half of [`remove_background`], for callers that start the removal
/// synchronously and await the model later.
pub async fn complete_removal<R: BackgroundRemover + ?Sized>(
    session: &RefCell<EditorSession>,
    ticket: RemovalTicket,
    remover: &R,
) -> Result<(), SessionError> {
    let result = remover.remove_background(ticket.source()).await;
    session.borrow_mut().finish_removal(ticket, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::CropUnit;
    use futures::executor::block_on;
    use image::{Rgba, RgbaImage};

    fn handle(w: u32, h: u32) -> ImageHandle {
        ImageHandle::new(
            RgbaImage::from_pixel(w, h, Rgba([120, 130, 140, 255])),
            DisplaySize::new(w as f64 / 2.0, h as f64 / 2.0),
        )
        .unwrap()
    }

    #[derive(Default)]
    struct RecordingSink {
        names: Vec<String>,
    }

    impl DownloadSink for RecordingSink {
        type Error = String;

        fn deliver(&mut self, filename: &str, _png: &[u8]) -> Result<(), String> {
            self.names.push(filename.to_string());
            Ok(())
        }
    }

    /// Sink that edits the session while the download is handed off.
    struct ReentrantSink<'a> {
        session: &'a RefCell<EditorSession>,
        names: Vec<String>,
    }

    impl DownloadSink for ReentrantSink<'_> {
        type Error = String;

        fn deliver(&mut self, filename: &str, _png: &[u8]) -> Result<(), String> {
            let mut session = self.session.try_borrow_mut().map_err(|e| e.to_string())?;
            session.set_adjustment(AdjustmentParam::Brightness, 50.0);
            self.names.push(filename.to_string());
            Ok(())
        }
    }

    /// Clears alpha in the left half, like a segmentation mask would.
    struct HalfTransparentRemover;

    #[async_trait(?Send)]
    impl BackgroundRemover for HalfTransparentRemover {
        async fn remove_background(
            &self,
            image: &ImageHandle,
        ) -> Result<ImageHandle, RemovalError> {
            let mut raster = image.raster().clone();
            let half = raster.width() / 2;
            for (x, _, pixel) in raster.enumerate_pixels_mut() {
                if x < half {
                    pixel.0[3] = 0;
                }
            }
            Ok(ImageHandle::new(raster, image.displayed_size())?)
        }
    }

    struct FailingRemover;

    #[async_trait(?Send)]
    impl BackgroundRemover for FailingRemover {
        async fn remove_background(
            &self,
            _image: &ImageHandle,
        ) -> Result<ImageHandle, RemovalError> {
            Err(RemovalError::Failed("model unavailable".to_string()))
        }
    }

    /// Tries to start a second removal while the first is pending.
    struct ReentrantRemover<'a> {
        session: &'a RefCell<EditorSession>,
    }

    #[async_trait(?Send)]
    impl BackgroundRemover for ReentrantRemover<'_> {
        async fn remove_background(
            &self,
            image: &ImageHandle,
        ) -> Result<ImageHandle, RemovalError> {
            let second = self.session.borrow_mut().begin_removal();
            assert!(matches!(second, Err(SessionError::RemovalInFlight)));
            assert!(self.session.borrow().is_removal_in_flight());
            Ok(image.clone())
        }
    }

    #[test]
    fn test_load_resets_adjustments_and_centres_crop() {
        let mut session = EditorSession::new();
        session.set_adjustment(AdjustmentParam::Brightness, 150.0);

        session.load_image(handle(400, 300));
        assert!(session.adjustments().is_default());

        let crop = session.committed_crop().unwrap();
        assert_eq!(crop.unit, CropUnit::Percent);
        assert_eq!(session.live_crop(), Some(crop));
    }

    #[test]
    fn test_set_adjustment_clamps() {
        let mut session = EditorSession::new();
        session.set_adjustment(AdjustmentParam::Vignette, 500.0);
        assert_eq!(session.adjustments().vignette, 200.0);

        session.reset_adjustments();
        assert!(session.adjustments().is_default());
    }

    #[test]
    fn test_live_crop_does_not_affect_export() {
        let mut session = EditorSession::new();
        session.load_image(handle(400, 300));
        session.commit_crop(CropRectangle::pixels(0.0, 0.0, 50.0, 50.0));
        session.update_crop(CropRectangle::pixels(0.0, 0.0, 10.0, 10.0));

        assert_eq!(
            session.committed_crop(),
            Some(&CropRectangle::pixels(0.0, 0.0, 50.0, 50.0))
        );
        assert_eq!(
            session.live_crop(),
            Some(&CropRectangle::pixels(0.0, 0.0, 10.0, 10.0))
        );
    }

    #[test]
    fn test_set_aspect_replaces_crop() {
        let mut session = EditorSession::new();
        session.load_image(handle(400, 300));
        session.commit_crop(CropRectangle::pixels(1.0, 1.0, 2.0, 2.0));

        session.set_aspect(AspectPreset::Square);
        let crop = session.committed_crop().unwrap();
        let px = crop.to_pixels(&session.image().unwrap().displayed_size());
        assert!((px.width - px.height).abs() < 1e-9);
    }

    #[test]
    fn test_preview_requires_image() {
        let mut session = EditorSession::new();
        assert!(session.preview().is_none());

        session.load_image(handle(40, 30));
        session.set_adjustment(AdjustmentParam::Temperature, -10.0);
        let style = session.preview().unwrap();
        assert!(style.filter.ends_with("hue-rotate(-15deg)"));
    }

    #[test]
    fn test_export_without_image_fails() {
        let session = EditorSession::new();
        let mut sink = RecordingSink::default();
        assert!(matches!(
            session.export(1, &mut sink),
            Err(SessionError::NoImage)
        ));
        assert!(sink.names.is_empty());
    }

    #[test]
    fn test_export_uses_committed_crop() {
        let mut session = EditorSession::new();
        session.load_image(handle(400, 300));
        session.clear_crop();

        let mut sink = RecordingSink::default();
        let name = session.export(99, &mut sink).unwrap();
        assert_eq!(name, "VISION-CUT-99.png");
        assert_eq!(sink.names, vec!["VISION-CUT-99.png".to_string()]);
    }

    #[test]
    fn test_prepare_export_does_not_deliver() {
        let mut session = EditorSession::new();
        session.load_image(handle(400, 300));
        session.clear_crop();

        let (name, exported) = session.prepare_export(12).unwrap();
        assert_eq!(name, "VISION-CUT-12.png");
        assert_eq!((exported.region.width, exported.region.height), (400, 300));
    }

    #[test]
    fn test_sink_may_edit_session_during_export() {
        let session = RefCell::new(EditorSession::new());
        session.borrow_mut().load_image(handle(40, 30));

        let mut sink = ReentrantSink {
            session: &session,
            names: Vec::new(),
        };
        let name = export_session(&session, 3, &mut sink).unwrap();

        assert_eq!(name, "VISION-CUT-3.png");
        assert_eq!(sink.names, vec![name]);
        assert_eq!(session.borrow().adjustments().brightness, 50.0);
    }

    #[test]
    fn test_export_session_without_image() {
        let session = RefCell::new(EditorSession::new());
        let mut sink = RecordingSink::default();
        assert!(matches!(
            export_session(&session, 1, &mut sink),
            Err(SessionError::NoImage)
        ));
        assert!(sink.names.is_empty());
    }

    #[test]
    fn test_set_displayed_size() {
        let mut session = EditorSession::new();
        assert!(matches!(
            session.set_displayed_size(DisplaySize::new(10.0, 10.0)),
            Err(SessionError::NoImage)
        ));

        session.load_image(handle(400, 300));
        session.set_displayed_size(DisplaySize::new(100.0, 75.0)).unwrap();
        assert_eq!(session.image().unwrap().scale(), (4.0, 4.0));
    }

    #[test]
    fn test_removal_replaces_image_and_keeps_adjustments() {
        let session = RefCell::new(EditorSession::new());
        session.borrow_mut().load_image(handle(8, 8));
        session
            .borrow_mut()
            .set_adjustment(AdjustmentParam::Contrast, 130.0);

        block_on(remove_background(&session, &HalfTransparentRemover)).unwrap();

        let session = session.borrow();
        assert!(!session.is_removal_in_flight());
        assert_eq!(session.adjustments().contrast, 130.0);
        let raster = session.image().unwrap().raster();
        assert_eq!(raster.get_pixel(0, 0).0[3], 0);
        assert_eq!(raster.get_pixel(7, 0).0[3], 255);
    }

    #[test]
    fn test_removal_failure_leaves_state_untouched() {
        let session = RefCell::new(EditorSession::new());
        session.borrow_mut().load_image(handle(8, 8));
        let before = session.borrow().image().unwrap().clone();

        let result = block_on(remove_background(&session, &FailingRemover));
        assert!(matches!(
            result,
            Err(SessionError::Removal(RemovalError::Failed(_)))
        ));

        let session = session.borrow();
        assert!(!session.is_removal_in_flight());
        assert!(session.image().unwrap().shares_raster_with(&before));
    }

    #[test]
    fn test_removal_can_be_retried_after_failure() {
        let session = RefCell::new(EditorSession::new());
        session.borrow_mut().load_image(handle(8, 8));

        assert!(block_on(remove_background(&session, &FailingRemover)).is_err());
        assert!(block_on(remove_background(&session, &HalfTransparentRemover)).is_ok());
    }

    #[test]
    fn test_removal_is_single_flight() {
        let session = RefCell::new(EditorSession::new());
        session.borrow_mut().load_image(handle(8, 8));

        let remover = ReentrantRemover { session: &session };
        block_on(remove_background(&session, &remover)).unwrap();
        assert!(!session.borrow().is_removal_in_flight());
    }

    #[test]
    fn test_flag_set_before_model_runs() {
        let session = RefCell::new(EditorSession::new());
        session.borrow_mut().load_image(handle(8, 8));

        let ticket = session.borrow_mut().begin_removal().unwrap();
        assert!(session.borrow().is_removal_in_flight());

        block_on(complete_removal(&session, ticket, &HalfTransparentRemover)).unwrap();
        assert!(!session.borrow().is_removal_in_flight());
    }

    #[test]
    fn test_begin_removal_without_image() {
        let mut session = EditorSession::new();
        assert!(matches!(
            session.begin_removal(),
            Err(SessionError::NoImage)
        ));
        assert!(!session.is_removal_in_flight());
    }

    #[test]
    fn test_stale_removal_is_discarded() {
        let mut session = EditorSession::new();
        session.load_image(handle(8, 8));
        let ticket = session.begin_removal().unwrap();

        // User picks another file while the model is running
        let replacement = handle(16, 16);
        session.load_image(replacement.clone());

        let result = session.finish_removal(ticket, Ok(handle(8, 8)));
        assert!(matches!(result, Err(SessionError::StaleRemoval)));
        assert!(!session.is_removal_in_flight());
        assert!(session.image().unwrap().shares_raster_with(&replacement));
    }

    #[test]
    fn test_removal_keeps_current_displayed_size() {
        let session = RefCell::new(EditorSession::new());
        session.borrow_mut().load_image(handle(400, 300));
        let ticket = session.borrow_mut().begin_removal().unwrap();

        // Window resized while the model runs
        session
            .borrow_mut()
            .set_displayed_size(DisplaySize::new(100.0, 75.0))
            .unwrap();

        let output = ImageHandle::new(
            ticket.source().raster().clone(),
            ticket.source().displayed_size(),
        )
        .unwrap();
        session.borrow_mut().finish_removal(ticket, Ok(output)).unwrap();

        let mut session = session.borrow_mut();
        assert_eq!(
            session.image().unwrap().displayed_size(),
            DisplaySize::new(100.0, 75.0)
        );

        session.commit_crop(CropRectangle::pixels(0.0, 0.0, 50.0, 50.0));
        let region = crate::geometry::resolve_source_region(
            session.committed_crop(),
            session.image().unwrap(),
        );
        assert_eq!((region.width, region.height), (200, 200));
    }
}
