//! Resize dialog state.
//!
//! A dialog is bound to one converted file. It keeps its own width and
//! height until confirmed; with the aspect lock on, editing one dimension
//! recomputes the other from the ratio the dialog was opened with.

use crate::error::Result;
use crate::session::{ConvertedFile, ConverterSession};
use snapconvert_image::{locked_height, locked_width};

/// Keys the dialog reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKey {
    /// Dismiss without changes
    Escape,
    /// Any other key
    Other,
}

/// Editable resize state for one converted file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeDialog {
    converted_id: String,
    seed: (u32, u32),
    width: u32,
    height: u32,
    lock_aspect: bool,
    error: Option<String>,
    open: bool,
}

impl ResizeDialog {
    /// Open a dialog seeded from `file`'s current size, aspect lock on
    pub fn open(file: &ConvertedFile) -> Self {
        Self {
            converted_id: file.id.clone(),
            seed: (file.width, file.height),
            width: file.width,
            height: file.height,
            lock_aspect: true,
            error: None,
            open: true,
        }
    }

    /// Converted file this dialog edits
    pub fn converted_id(&self) -> &str {
        &self.converted_id
    }

    /// Pending width
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Pending height
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether the aspect ratio is locked
    pub fn aspect_locked(&self) -> bool {
        self.lock_aspect
    }

    /// Inline error from the last failed confirm
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether the dialog is still showing
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Set the width; with the lock on, the height follows
    pub fn set_width(&mut self, width: u32) {
        self.width = width;
        if self.lock_aspect {
            self.height = locked_height(self.seed.0, self.seed.1, width);
        }
    }

    /// Set the height; with the lock on, the width follows
    pub fn set_height(&mut self, height: u32) {
        self.height = height;
        if self.lock_aspect {
            self.width = locked_width(self.seed.0, self.seed.1, height);
        }
    }

    /// Toggle the aspect lock. Turning it on re-derives the height from the width.
    pub fn set_aspect_lock(&mut self, locked: bool) {
        self.lock_aspect = locked;
        if locked {
            self.height = locked_height(self.seed.0, self.seed.1, self.width);
        }
    }

    /// Apply the resize to the session.
    ///
    /// Success closes the dialog. Failure keeps it open with an inline
    /// error and the session unchanged.
    pub fn confirm(&mut self, session: &mut ConverterSession) -> Result<()> {
        match session.resize_converted(&self.converted_id, self.width, self.height) {
            Ok(_) => {
                self.error = None;
                self.open = false;
                Ok(())
            }
            Err(e) => {
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Escape dismisses; other keys are ignored
    pub fn handle_key(&mut self, key: DialogKey) {
        if key == DialogKey::Escape {
            self.dismiss();
        }
    }

    /// Clicking outside the dialog dismisses it
    pub fn backdrop_click(&mut self) {
        self.dismiss();
    }

    fn dismiss(&mut self) {
        self.open = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::MemoryNotifier;
    use crate::session::SessionConfig;
    use crate::source::SourceFile;
    use image::{DynamicImage, ImageOutputFormat, RgbImage};
    use std::io::Cursor;

    fn converted_session(width: u32, height: u32) -> (ConverterSession, String) {
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(RgbImage::new(width, height))
            .write_to(&mut buf, ImageOutputFormat::Png)
            .unwrap();

        let mut session = ConverterSession::new(SessionConfig::default()).with_notifier(MemoryNotifier::new());
        session.add_files(vec![SourceFile::from_bytes("wide.png", buf.into_inner())]);
        session.convert_all(false);
        let id = session.converted()[0].id.clone();
        (session, id)
    }

    fn dialog_for(session: &ConverterSession, id: &str) -> ResizeDialog {
        ResizeDialog::open(session.converted_file(id).unwrap())
    }

    #[test]
    fn test_seeded_from_file() {
        let (session, id) = converted_session(192, 108);
        let dialog = dialog_for(&session, &id);
        assert_eq!((dialog.width(), dialog.height()), (192, 108));
        assert!(dialog.aspect_locked());
        assert!(dialog.is_open());
    }

    #[test]
    fn test_aspect_lock_uses_seed_ratio() {
        let (session, id) = converted_session(192, 108);
        let mut dialog = dialog_for(&session, &id);

        dialog.set_width(100);
        assert_eq!(dialog.height(), 56);
        dialog.set_width(50);
        assert_eq!(dialog.height(), 28);
        dialog.set_height(54);
        assert_eq!(dialog.width(), 96);
    }

    #[test]
    fn test_unlocked_edits_are_independent() {
        let (session, id) = converted_session(40, 20);
        let mut dialog = dialog_for(&session, &id);

        dialog.set_aspect_lock(false);
        dialog.set_width(10);
        assert_eq!((dialog.width(), dialog.height()), (10, 20));

        dialog.set_aspect_lock(true);
        assert_eq!(dialog.height(), 5);
    }

    #[test]
    fn test_confirm_resizes_and_closes() {
        let (mut session, id) = converted_session(40, 20);
        let mut dialog = dialog_for(&session, &id);

        dialog.set_width(20);
        dialog.confirm(&mut session).unwrap();

        assert!(!dialog.is_open());
        let file = session.converted_file(&id).unwrap();
        assert_eq!((file.width, file.height), (20, 10));
    }

    #[test]
    fn test_failed_confirm_keeps_dialog_open() {
        let (mut session, id) = converted_session(40, 20);
        let before = session.converted_file(&id).unwrap().clone();
        let mut dialog = dialog_for(&session, &id);

        dialog.set_aspect_lock(false);
        dialog.set_width(0);
        assert!(dialog.confirm(&mut session).is_err());

        assert!(dialog.is_open());
        assert!(dialog.error().unwrap().contains("Invalid dimensions"));
        let after = session.converted_file(&id).unwrap();
        assert_eq!((after.blob, after.width, after.height), (before.blob, before.width, before.height));
    }

    #[test]
    fn test_escape_and_backdrop_dismiss_without_changes() {
        let (session, id) = converted_session(40, 20);
        let blob = session.converted_file(&id).unwrap().blob;

        let mut dialog = dialog_for(&session, &id);
        dialog.set_width(10);
        dialog.handle_key(DialogKey::Other);
        assert!(dialog.is_open());
        dialog.handle_key(DialogKey::Escape);
        assert!(!dialog.is_open());

        let mut dialog = dialog_for(&session, &id);
        dialog.backdrop_click();
        assert!(!dialog.is_open());

        let file = session.converted_file(&id).unwrap();
        assert_eq!((file.blob, file.width), (blob, 40));
    }
}
