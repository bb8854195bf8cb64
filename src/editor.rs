//! Editing state for a single day cell.
//!
//! Every committed change produces the full replacement [`EntryData`] for the
//! date; the caller stores it in the shared map and persists the whole map.

use crate::images::ImageError;
use crate::models::{Color, EntryData, ImageFailure, LogEntry};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("log text must not be empty")]
    EmptyLog,
    #[error("no log entry with id {0}")]
    UnknownLog(String),
}

#[derive(Debug)]
pub struct DayEditor {
    date_key: String,
    logs: Vec<LogEntry>,
    color: Color,
    stored_color: Option<String>,
    images: Vec<String>,
    persisted_weight: String,
    weight_draft: String,
}

#[derive(Debug)]
pub struct ImageBatchOutcome {
    pub emitted: Option<EntryData>,
    pub failures: Vec<ImageFailure>,
}

impl DayEditor {
    pub fn new(date_key: impl Into<String>, data: EntryData) -> Self {
        let weight = data.weight.unwrap_or_default();
        Self {
            date_key: date_key.into(),
            color: Color::resolve(data.color.as_deref()),
            stored_color: data.color,
            logs: data.logs,
            images: data.images,
            persisted_weight: weight.clone(),
            weight_draft: weight,
        }
    }

    pub fn date_key(&self) -> &str {
        &self.date_key
    }

    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    pub fn images(&self) -> &[String] {
        &self.images
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn weight_draft(&self) -> &str {
        &self.weight_draft
    }

    pub fn add_log(&mut self, text: &str) -> Result<EntryData, EditError> {
        if text.trim().is_empty() {
            return Err(EditError::EmptyLog);
        }
        self.logs.push(LogEntry::new(text));
        Ok(self.snapshot())
    }

    pub fn edit_log(&mut self, id: &str, text: &str) -> Result<EntryData, EditError> {
        let log = self
            .logs
            .iter_mut()
            .find(|log| log.id == id)
            .ok_or_else(|| EditError::UnknownLog(id.to_string()))?;
        log.text = text.to_string();
        Ok(self.snapshot())
    }

    /// Removing an id that is not present changes nothing and emits nothing.
    pub fn delete_log(&mut self, id: &str) -> Option<EntryData> {
        let before = self.logs.len();
        self.logs.retain(|log| log.id != id);
        (self.logs.len() != before).then(|| self.snapshot())
    }

    pub fn set_color(&mut self, color: Color) -> EntryData {
        self.color = color;
        self.stored_color = Some(color.id().to_string());
        self.snapshot()
    }

    /// Keystrokes only update the draft; see [`DayEditor::blur_weight`].
    pub fn set_weight_draft(&mut self, weight: impl Into<String>) {
        self.weight_draft = weight.into();
    }

    /// Commits the weight draft when the field loses focus, but only if it
    /// differs from what was last persisted.
    pub fn blur_weight(&mut self) -> Option<EntryData> {
        if self.weight_draft == self.persisted_weight {
            return None;
        }
        self.persisted_weight = self.weight_draft.clone();
        Some(self.snapshot())
    }

    /// Appends every successfully processed image in selection order and
    /// reports the rest. Nothing is emitted when no image succeeded.
    pub fn apply_image_batch(
        &mut self,
        results: Vec<(String, Result<String, ImageError>)>,
    ) -> ImageBatchOutcome {
        let mut failures = Vec::new();
        let mut added = 0;
        for (index, (name, result)) in results.into_iter().enumerate() {
            match result {
                Ok(uri) => {
                    self.images.push(uri);
                    added += 1;
                }
                Err(err) => failures.push(ImageFailure {
                    index,
                    name,
                    message: err.to_string(),
                }),
            }
        }
        ImageBatchOutcome {
            emitted: (added > 0).then(|| self.snapshot()),
            failures,
        }
    }

    pub fn remove_image(&mut self, index: usize) -> Option<EntryData> {
        if index >= self.images.len() {
            return None;
        }
        self.images.remove(index);
        Some(self.snapshot())
    }

    /// Emitted records always carry a color; an unknown stored id is kept
    /// until the user picks a new one.
    fn snapshot(&self) -> EntryData {
        let color = self
            .stored_color
            .clone()
            .unwrap_or_else(|| self.color.id().to_string());
        EntryData {
            logs: self.logs.clone(),
            color: Some(color),
            weight: (!self.persisted_weight.is_empty()).then(|| self.persisted_weight.clone()),
            images: self.images.clone(),
        }
    }
}

/// The palette popup is open for at most one day at a time.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ColorPicker {
    open_for: Option<String>,
}

impl ColorPicker {
    pub fn open_for(&self) -> Option<&str> {
        self.open_for.as_deref()
    }

    pub fn is_open_for(&self, date_key: &str) -> bool {
        self.open_for.as_deref() == Some(date_key)
    }

    pub fn open(&mut self, date_key: impl Into<String>) {
        self.open_for = Some(date_key.into());
    }

    pub fn toggle(&mut self, date_key: &str) {
        if self.is_open_for(date_key) {
            self.close();
        } else {
            self.open(date_key);
        }
    }

    pub fn select(&mut self, color: Color) -> Color {
        self.close();
        color
    }

    pub fn click_outside(&mut self) {
        self.close();
    }

    pub fn close(&mut self) {
        self.open_for = None;
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum ImageViewer {
    #[default]
    Closed,
    Showing { date_key: String, index: usize },
}

impl ImageViewer {
    pub fn show(&mut self, date_key: impl Into<String>, index: usize, images: &[String]) {
        *self = ImageViewer::Showing {
            date_key: date_key.into(),
            index,
        };
        self.reconcile(images);
    }

    /// Closes the viewer when the shown day no longer has an image at its
    /// index. `images` is the shown day's current sequence.
    pub fn reconcile(&mut self, images: &[String]) {
        if let ImageViewer::Showing { index, .. } = self {
            if *index >= images.len() {
                *self = ImageViewer::Closed;
            }
        }
    }

    pub fn dismiss(&mut self) {
        *self = ImageViewer::Closed;
    }

    pub fn showing_for(&self, date_key: &str) -> Option<usize> {
        match self {
            ImageViewer::Showing { date_key: shown, index } if shown == date_key => Some(*index),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor() -> DayEditor {
        DayEditor::new("2024-03-10", EntryData::default())
    }

    fn decode_failure() -> ImageError {
        ImageError::Decode(image::load_from_memory(b"junk").unwrap_err())
    }

    #[test]
    fn add_log_appends_and_rejects_blank_text() {
        let mut ed = editor();
        assert_eq!(ed.add_log("   "), Err(EditError::EmptyLog));
        let first = ed.add_log("run 5k").unwrap();
        let second = ed.add_log("read").unwrap();
        assert_eq!(first.logs.len(), 1);
        assert_eq!(second.logs.len(), 2);
        assert_eq!(second.logs[1].text, "read");
        assert_ne!(second.logs[0].id, second.logs[1].id);
        assert_eq!(second.color.as_deref(), Some("white"));
    }

    #[test]
    fn edit_log_keeps_position() {
        let mut ed = editor();
        ed.add_log("one").unwrap();
        ed.add_log("two").unwrap();
        let id = ed.logs()[0].id.clone();
        let data = ed.edit_log(&id, "uno").unwrap();
        assert_eq!(data.logs[0].text, "uno");
        assert_eq!(data.logs[0].id, id);
        assert_eq!(data.logs[1].text, "two");
        assert_eq!(
            ed.edit_log("missing", "x"),
            Err(EditError::UnknownLog("missing".into()))
        );
    }

    #[test]
    fn delete_log_is_a_no_op_for_unknown_ids() {
        let mut ed = editor();
        ed.add_log("one").unwrap();
        assert!(ed.delete_log("missing").is_none());
        let id = ed.logs()[0].id.clone();
        let data = ed.delete_log(&id).unwrap();
        assert!(data.logs.is_empty());
    }

    #[test]
    fn color_change_always_emits() {
        let mut ed = editor();
        let data = ed.set_color(Color::Green);
        assert_eq!(data.color.as_deref(), Some("green"));
        assert_eq!(ed.set_color(Color::Green).color.as_deref(), Some("green"));
    }

    #[test]
    fn unknown_stored_color_survives_other_edits() {
        let data = EntryData {
            color: Some("teal".into()),
            ..EntryData::default()
        };
        let mut ed = DayEditor::new("2024-03-10", data);
        assert_eq!(ed.color(), Color::White);
        assert_eq!(ed.add_log("x").unwrap().color.as_deref(), Some("teal"));
    }

    #[test]
    fn weight_edits_write_once_on_blur() {
        let mut ed = editor();
        let mut writes = 0;
        ed.set_weight_draft("70");
        ed.set_weight_draft("70.5");
        if ed.blur_weight().is_some() {
            writes += 1;
        }
        if ed.blur_weight().is_some() {
            writes += 1;
        }
        assert_eq!(writes, 1);
    }

    #[test]
    fn unchanged_weight_does_not_write() {
        let data = EntryData {
            weight: Some("81".into()),
            ..EntryData::default()
        };
        let mut ed = DayEditor::new("2024-03-10", data);
        ed.set_weight_draft("82");
        ed.set_weight_draft("81");
        assert!(ed.blur_weight().is_none());
    }

    #[test]
    fn clearing_weight_removes_it() {
        let data = EntryData {
            weight: Some("81".into()),
            ..EntryData::default()
        };
        let mut ed = DayEditor::new("2024-03-10", data);
        ed.set_weight_draft("");
        assert_eq!(ed.blur_weight().unwrap().weight, None);
    }

    #[test]
    fn partial_image_batch_keeps_successes() {
        let mut ed = editor();
        let outcome = ed.apply_image_batch(vec![
            ("ok.png".into(), Ok("data:image/jpeg;base64,AAAA".into())),
            ("bad.png".into(), Err(decode_failure())),
        ]);
        let data = outcome.emitted.unwrap();
        assert_eq!(data.images, vec!["data:image/jpeg;base64,AAAA".to_string()]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].index, 1);
        assert_eq!(outcome.failures[0].name, "bad.png");
    }

    #[test]
    fn failed_batch_emits_nothing() {
        let mut ed = editor();
        let outcome = ed.apply_image_batch(vec![("bad.png".into(), Err(decode_failure()))]);
        assert!(outcome.emitted.is_none());
        assert_eq!(outcome.failures.len(), 1);
    }

    #[test]
    fn remove_image_by_index() {
        let data = EntryData {
            images: vec!["a".into(), "b".into(), "c".into()],
            ..EntryData::default()
        };
        let mut ed = DayEditor::new("2024-03-10", data);
        assert!(ed.remove_image(3).is_none());
        assert_eq!(ed.remove_image(1).unwrap().images, vec!["a", "c"]);
    }

    #[test]
    fn picker_is_exclusive_and_closes_on_select() {
        let mut picker = ColorPicker::default();
        picker.open("2024-03-01");
        picker.toggle("2024-03-02");
        assert!(picker.is_open_for("2024-03-02"));
        assert!(!picker.is_open_for("2024-03-01"));

        assert_eq!(picker.select(Color::Pink), Color::Pink);
        assert_eq!(picker.open_for(), None);

        picker.toggle("2024-03-02");
        picker.toggle("2024-03-02");
        assert_eq!(picker.open_for(), None);

        picker.open("2024-03-05");
        picker.click_outside();
        assert_eq!(picker.open_for(), None);
    }

    #[test]
    fn viewer_closes_when_index_is_out_of_bounds() {
        let images = vec!["a".to_string(), "b".to_string()];
        let mut viewer = ImageViewer::default();
        viewer.show("2024-03-01", 1, &images);
        assert_eq!(viewer.showing_for("2024-03-01"), Some(1));
        assert_eq!(viewer.showing_for("2024-03-02"), None);

        viewer.show("2024-03-01", 1, &images[..1]);
        assert_eq!(viewer, ImageViewer::Closed);

        viewer.show("2024-03-01", 5, &images);
        assert_eq!(viewer, ImageViewer::Closed);

        viewer.show("2024-03-01", 0, &images);
        viewer.dismiss();
        assert_eq!(viewer, ImageViewer::Closed);
    }

    #[test]
    fn viewer_reconciles_against_removed_images() {
        let mut images = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let mut viewer = ImageViewer::default();
        viewer.show("2024-03-01", 1, &images);

        images.remove(2);
        viewer.reconcile(&images);
        assert_eq!(viewer.showing_for("2024-03-01"), Some(1));

        images.remove(1);
        viewer.reconcile(&images);
        assert_eq!(viewer, ImageViewer::Closed);

        viewer.reconcile(&[]);
        assert_eq!(viewer, ImageViewer::Closed);
    }
}
