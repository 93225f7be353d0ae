use std::time::Duration;

use chrono::Utc;

use super::client::StudioApi;
use super::{ConceptMode, Notification, NotificationLevel, Step};
use crate::error::WizardError;
use crate::gallery::GalleryStore;
use crate::types::{AspectRatio, GalleryItem, Selection, UploadedImage};
use crate::wire::{required, BackgroundRequest, ConceptRequest, ImageRequest};

#[derive(Debug, Clone)]
pub struct WizardConfig {
    /// Pause on the Progress step after a successful generation before showing Results.
    pub advance_delay: Duration,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            advance_delay: Duration::from_millis(1500),
        }
    }
}

/// Outcome of the last successful generation, shown on the Results step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub image_url: String,
    pub prompt: String,
    pub enhanced_prompt: String,
    pub guidance: String,
    pub style: String,
    pub aspect_ratio: AspectRatio,
    pub message: String,
}

pub struct WizardSession<A> {
    api: A,
    gallery: GalleryStore,
    config: WizardConfig,
    step: Step,
    selection: Selection,
    images: Vec<UploadedImage>,
    analyses: Vec<String>,
    concept_mode: ConceptMode,
    generated_concept: Option<String>,
    result: Option<GenerationResult>,
    gallery_return: Option<Step>,
    notifications: Vec<Notification>,
}

impl<A: StudioApi> WizardSession<A> {
    pub fn new(api: A, gallery: GalleryStore, config: WizardConfig) -> Self {
        Self {
            api,
            gallery,
            config,
            step: Step::Upload,
            selection: Selection::default(),
            images: Vec::new(),
            analyses: Vec::new(),
            concept_mode: ConceptMode::default(),
            generated_concept: None,
            result: None,
            gallery_return: None,
            notifications: Vec::new(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn images(&self) -> &[UploadedImage] {
        &self.images
    }

    /// Background analysis text per uploaded image, from the last successful analysis.
    pub fn analyses(&self) -> &[String] {
        &self.analyses
    }

    pub fn concept_mode(&self) -> ConceptMode {
        self.concept_mode
    }

    pub fn generated_concept(&self) -> Option<&str> {
        self.generated_concept.as_deref()
    }

    pub fn result(&self) -> Option<&GenerationResult> {
        self.result.as_ref()
    }

    pub fn gallery(&self) -> &GalleryStore {
        &self.gallery
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    // ---------------------------------------------------------------------
    // Upload
    // ---------------------------------------------------------------------

    pub fn add_image(&mut self, image: UploadedImage) {
        tracing::debug!(name = %image.name, "wizard: image added");
        self.images.push(image);
    }

    pub fn remove_image(&mut self, index: usize) -> Option<UploadedImage> {
        (index < self.images.len()).then(|| self.images.remove(index))
    }

    /// "Analyze" path out of Upload: one background analysis per image, then Style.
    pub async fn analyze_images(&mut self) -> Result<(), WizardError> {
        self.expect_step(&[Step::Upload], "analyze images")?;
        if self.images.is_empty() {
            return self.reject("Please upload at least one image");
        }

        let payloads: Vec<String> = self.images.iter().map(|i| i.raw_data.clone()).collect();
        let mut analyses = Vec::with_capacity(payloads.len());
        let mut message = String::new();
        for image_data in payloads {
            let req = BackgroundRequest {
                image_data: Some(image_data),
            };
            match self.api.remove_background(&req).await {
                Ok(res) => {
                    analyses.push(res.result);
                    message = res.message;
                }
                Err(e) => return self.fail(e),
            }
        }

        self.analyses = analyses;
        self.notify(NotificationLevel::Success, message);
        self.step = Step::Style;
        Ok(())
    }

    /// "Generate directly" path out of Upload; no images required.
    pub fn skip_to_style(&mut self) -> Result<(), WizardError> {
        self.expect_step(&[Step::Upload], "continue to styles")?;
        self.step = Step::Style;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Style
    // ---------------------------------------------------------------------

    /// Blank input clears the selection.
    pub fn select_style(&mut self, style: &str) {
        self.selection.style = required(Some(style)).map(|s| s.trim().to_string());
    }

    pub fn select_aspect_ratio(&mut self, aspect_ratio: AspectRatio) {
        self.selection.aspect_ratio = aspect_ratio;
    }

    pub fn set_topic(&mut self, topic: &str) {
        self.selection.topic = topic.to_string();
    }

    /// Drives the enabled state of the Style step's proceed button.
    pub fn can_proceed_from_style(&self) -> bool {
        self.selection.style.is_some()
    }

    pub fn proceed_to_concept(&mut self) -> Result<(), WizardError> {
        self.expect_step(&[Step::Style], "continue to concept")?;
        if !self.can_proceed_from_style() {
            return self.reject("Please select a style");
        }
        self.step = Step::Concept;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Concept
    // ---------------------------------------------------------------------

    pub fn set_concept_mode(&mut self, mode: ConceptMode) {
        self.concept_mode = mode;
    }

    pub fn set_manual_prompt(&mut self, prompt: &str) {
        self.selection.concept_prompt = prompt.to_string();
    }

    /// Asks the gateway for a concept and switches to it on success.
    pub async fn generate_concept(&mut self) -> Result<(), WizardError> {
        self.expect_step(&[Step::Concept, Step::Refinement], "generate a concept")?;
        let Some(style) = self.selection.style.clone() else {
            return self.reject("Please select a style first");
        };

        let req = ConceptRequest {
            style: Some(style),
            topic: required(Some(self.selection.topic.as_str())).map(str::to_string),
            aspect_ratio: Some(self.selection.aspect_ratio.as_str().to_string()),
        };
        match self.api.generate_concept(&req).await {
            Ok(res) => {
                self.generated_concept = Some(res.concept);
                self.concept_mode = ConceptMode::Generated;
                self.notify(NotificationLevel::Success, "Concept generated");
                Ok(())
            }
            Err(e) => self.fail(e),
        }
    }

    /// Manual text or the generated concept, per the mode toggle; `None` when blank.
    pub fn resolved_prompt(&self) -> Option<&str> {
        let text = match self.concept_mode {
            ConceptMode::Manual => Some(self.selection.concept_prompt.as_str()),
            ConceptMode::Generated => self.generated_concept.as_deref(),
        };
        required(text).map(str::trim)
    }

    pub fn can_start_generation(&self) -> bool {
        matches!(self.step, Step::Concept | Step::Refinement) && self.resolved_prompt().is_some()
    }

    // ---------------------------------------------------------------------
    // Progress
    // ---------------------------------------------------------------------

    /// Concept/Refinement → Progress → Results. A failed call returns to the originating
    /// step and leaves the previous result in place.
    pub async fn start_generation(&mut self) -> Result<(), WizardError> {
        self.expect_step(&[Step::Concept, Step::Refinement], "generate")?;
        let Some(prompt) = self.resolved_prompt().map(str::to_string) else {
            return self.reject("Please enter or generate a concept prompt");
        };

        let origin = self.step;
        let style = self.selection.style.clone();
        let aspect_ratio = self.selection.aspect_ratio;
        self.step = Step::Progress;

        let req = ImageRequest {
            prompt: Some(prompt),
            style: style.clone(),
            aspect_ratio: Some(aspect_ratio.as_str().to_string()),
        };
        let res = match self.api.generate_image(&req).await {
            Ok(res) => res,
            Err(e) => {
                self.step = origin;
                return self.fail(e);
            }
        };

        let result = GenerationResult {
            image_url: self.preview_url(aspect_ratio),
            prompt: res.prompt,
            enhanced_prompt: res.enhanced_prompt,
            guidance: res.guidance,
            style: style.unwrap_or_default(),
            aspect_ratio,
            message: res.message,
        };
        self.notify(NotificationLevel::Success, result.message.clone());

        tokio::time::sleep(self.config.advance_delay).await;
        self.result = Some(result);
        self.step = Step::Results;
        Ok(())
    }

    /// First uploaded image, or a sized placeholder when generating from text alone.
    fn preview_url(&self, aspect_ratio: AspectRatio) -> String {
        match self.images.first() {
            Some(image) => image.raw_data.clone(),
            None => {
                let (w, h) = aspect_ratio.dimensions();
                format!("https://placehold.co/{}x{}", w, h)
            }
        }
    }

    // ---------------------------------------------------------------------
    // Results, Refinement, Gallery
    // ---------------------------------------------------------------------

    /// Results → Refinement, pre-filling the manual prompt with the last prompt.
    pub fn begin_refinement(&mut self) -> Result<(), WizardError> {
        self.expect_step(&[Step::Results], "refine")?;
        let Some(prompt) = self.result.as_ref().map(|r| r.prompt.clone()) else {
            return self.reject("Nothing to refine yet");
        };
        self.selection.concept_prompt = prompt;
        self.concept_mode = ConceptMode::Manual;
        self.step = Step::Refinement;
        Ok(())
    }

    pub fn back_to_results(&mut self) -> Result<(), WizardError> {
        self.expect_step(&[Step::Refinement, Step::Gallery], "return to results")?;
        if self.result.is_none() {
            return self.reject("No results to show");
        }
        self.gallery_return = None;
        self.step = Step::Results;
        Ok(())
    }

    /// Saves the current result and opens the gallery. Returns the new item's id.
    pub fn save_to_gallery(&mut self) -> Result<String, WizardError> {
        self.expect_step(&[Step::Results], "save")?;
        let Some(result) = self.result.clone() else {
            return self.reject("Nothing to save yet");
        };

        let item = self.gallery.new_item(
            &result.image_url,
            &result.style,
            result.aspect_ratio,
            &result.prompt,
            Utc::now(),
        );
        let id = item.id.clone();
        if let Err(e) = self.gallery.append(item) {
            return self.fail(e.into());
        }

        self.notify(NotificationLevel::Success, "Saved to gallery");
        self.gallery_return = Some(Step::Results);
        self.step = Step::Gallery;
        Ok(id)
    }

    pub fn open_gallery(&mut self) -> Result<(), WizardError> {
        if self.step == Step::Progress {
            return self.reject("Please wait for the generation to finish");
        }
        if self.step != Step::Gallery {
            self.gallery_return = Some(self.step);
            self.step = Step::Gallery;
        }
        Ok(())
    }

    /// Leaves the gallery for the step it was opened from.
    pub fn close_gallery(&mut self) -> Result<(), WizardError> {
        self.expect_step(&[Step::Gallery], "close the gallery")?;
        self.step = self.gallery_return.take().unwrap_or(Step::Upload);
        Ok(())
    }

    pub fn gallery_items(&self) -> &[GalleryItem] {
        self.gallery.items()
    }

    pub fn remove_from_gallery(&mut self, id: &str) -> Result<bool, WizardError> {
        match self.gallery.remove_by_id(id) {
            Ok(removed) => Ok(removed),
            Err(e) => self.fail(e.into()),
        }
    }

    pub fn clear_gallery(&mut self) -> Result<(), WizardError> {
        match self.gallery.clear() {
            Ok(()) => {
                self.notify(NotificationLevel::Info, "Gallery cleared");
                Ok(())
            }
            Err(e) => self.fail(e.into()),
        }
    }

    /// Back to Upload for another run. Selections and images stay for the session.
    pub fn start_over(&mut self) -> Result<(), WizardError> {
        if self.step == Step::Progress {
            return self.reject("Please wait for the generation to finish");
        }
        self.result = None;
        self.generated_concept = None;
        self.analyses.clear();
        self.concept_mode = ConceptMode::default();
        self.gallery_return = None;
        self.step = Step::Upload;
        Ok(())
    }

    // ---------------------------------------------------------------------

    fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.notifications.push(Notification {
            level,
            message: message.into(),
        });
    }

    fn expect_step(&mut self, allowed: &[Step], action: &str) -> Result<(), WizardError> {
        if allowed.contains(&self.step) {
            return Ok(());
        }
        self.reject(&format!("Cannot {} from the {:?} step", action, self.step))
    }

    fn reject<T>(&mut self, message: &str) -> Result<T, WizardError> {
        tracing::debug!(step = ?self.step, message, "wizard: guard rejected");
        self.notify(NotificationLevel::Warning, message);
        Err(WizardError::Guard(message.to_string()))
    }

    fn fail<T>(&mut self, err: WizardError) -> Result<T, WizardError> {
        tracing::warn!(step = ?self.step, error = %err, "wizard: action failed");
        self.notify(NotificationLevel::Error, err.to_string());
        Err(err)
    }
}
