//! What a front end should show for the current session.

use crate::error::ErrorKind;
use crate::image::ImageAsset;
use crate::session::{Session, SessionState};

/// One of the wizard's three screens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View<'a> {
    /// The two upload slots and the generate control.
    Upload {
        /// Preview of the uploaded portrait.
        person: Option<&'a ImageAsset>,
        /// Preview of the uploaded flag.
        flag: Option<&'a ImageAsset>,
        /// Whether the generate control is enabled.
        can_generate: bool,
        /// Whether the upload slots accept new files.
        uploads_locked: bool,
        /// Error to display under the form.
        error: Option<ErrorKind>,
    },
    /// The progress indicator.
    Progress,
    /// The finished portrait with download and reset controls.
    Result {
        /// The generated portrait.
        image: &'a ImageAsset,
    },
}

impl Session {
    /// Projects the session onto the screen to render.
    pub fn view(&self) -> View<'_> {
        match self.state() {
            SessionState::Succeeded(image) => View::Result { image },
            SessionState::Generating => View::Progress,
            SessionState::Empty
            | SessionState::PartiallyReady
            | SessionState::Ready
            | SessionState::Failed(_) => View::Upload {
                person: self.person(),
                flag: self.flag(),
                can_generate: self.can_generate(),
                uploads_locked: self.uploads_locked(),
                error: self.error(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FlagPortraitError;
    use crate::session::Slot;

    #[test]
    fn test_views_follow_state() {
        let person = ImageAsset::from_bytes(b"person");
        let flag = ImageAsset::from_bytes(b"flag");
        let mut session = Session::new();

        assert_eq!(
            session.view(),
            View::Upload {
                person: None,
                flag: None,
                can_generate: false,
                uploads_locked: false,
                error: None,
            }
        );

        let _ = session.upload(Slot::Person, person.clone());
        assert!(session.begin_generation().is_err());
        assert_eq!(
            session.view(),
            View::Upload {
                person: Some(&person),
                flag: None,
                can_generate: false,
                uploads_locked: false,
                error: Some(ErrorKind::MissingImages),
            }
        );

        let _ = session.upload(Slot::Flag, flag.clone());
        let pending = session.begin_generation().unwrap().unwrap();
        assert_eq!(session.view(), View::Progress);

        let _ = session.complete_generation(
            pending.ticket,
            Err(FlagPortraitError::InvalidCredentials("bad key".into())),
        );
        assert_eq!(
            session.view(),
            View::Upload {
                person: Some(&person),
                flag: Some(&flag),
                can_generate: true,
                uploads_locked: true,
                error: Some(ErrorKind::InvalidCredentials),
            }
        );

        let pending = session.begin_generation().unwrap().unwrap();
        let result = ImageAsset::from_bytes(b"portrait");
        let _ = session.complete_generation(pending.ticket, Ok(result.clone()));
        assert_eq!(session.view(), View::Result { image: &result });
    }
}
