//! Audible and visual alerts for fired alarms and finished countdowns.
//!
//! Alert delivery is best-effort: every collaborator failure is logged and
//! dropped so the tick that triggered it completes normally.

use thiserror::Error;

use crate::schedule::{FireReason, FiredAlarm};
use crate::types::Sound;

/// Title shown when a countdown reaches zero.
pub const TIMER_FINISHED_TITLE: &str = "Timer Finished!";

/// Title written back by [`TitleReset`]. Empty lets the host pick its default.
pub const RESTORED_TITLE: &str = "";

/// Collaborator failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AlertError {
    #[error("audio playback failed: {0}")]
    Audio(String),

    #[error("notification failed: {0}")]
    Notification(String),
}

/// Plays a short audible cue.
pub trait AudioPlayer {
    fn play(&self, sound: Sound) -> Result<(), AlertError>;
}

/// User-facing notifications and the visible title/banner.
pub trait Notifier {
    /// Asks for permission to show notifications. Returns whether granted.
    fn request_permission(&self) -> Result<bool, AlertError>;

    fn notify(&self, title: &str, body: &str) -> Result<(), AlertError>;

    fn set_title(&self, title: &str) -> Result<(), AlertError>;
}

/// Routes alarm and countdown events to the audio and notification
/// collaborators.
pub struct Alerter<A, N> {
    audio: A,
    notifier: N,
    permission: Option<bool>,
}

impl<A: AudioPlayer, N: Notifier> Alerter<A, N> {
    pub const fn new(audio: A, notifier: N) -> Self {
        Self {
            audio,
            notifier,
            permission: None,
        }
    }

    /// Requests notification permission on first use only. A failed request
    /// counts as denied.
    pub fn prime(&mut self) -> bool {
        if let Some(granted) = self.permission {
            return granted;
        }
        let granted = self.notifier.request_permission().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "notification permission request failed");
            false
        });
        tracing::debug!(granted, "notification permission resolved");
        self.permission = Some(granted);
        granted
    }

    pub fn alarm_fired(&mut self, alarm: &FiredAlarm) {
        let rule = &alarm.rule;
        let time = rule.time_of_day.to_string();
        self.play(rule.sound);

        if self.prime() {
            let title = match alarm.reason {
                FireReason::Scheduled => format!("Alarm: {}", rule.display_label("Untitled")),
                FireReason::Snoozed => format!("Snoozed alarm: {}", rule.display_label("Untitled")),
            };
            if let Err(err) = self.notifier.notify(&title, &format!("Time: {time}")) {
                tracing::warn!(error = %err, id = %rule.id, "alarm notification failed");
            }
        } else {
            tracing::debug!(id = %rule.id, "notifications not permitted; title only");
        }

        self.set_title(&format!("{} - {time}", rule.display_label("Alarm")));
    }

    pub fn countdown_finished(&mut self) {
        self.play(Sound::Default);
        self.set_title(TIMER_FINISHED_TITLE);
    }

    pub const fn notifier(&self) -> &N {
        &self.notifier
    }

    fn play(&self, sound: Sound) {
        if let Err(err) = self.audio.play(sound) {
            tracing::warn!(error = %err, %sound, "alert sound failed");
        }
    }

    fn set_title(&self, title: &str) {
        if let Err(err) = self.notifier.set_title(title) {
            tracing::warn!(error = %err, "failed to update title");
        }
    }
}

/// Puts the title back when dropped.
///
/// Hold one for as long as alerts may retitle the window, so a finished
/// countdown or fired alarm does not leave its title behind on any exit path.
pub struct TitleReset<N: Notifier> {
    notifier: N,
}

impl<N: Notifier> TitleReset<N> {
    pub const fn new(notifier: N) -> Self {
        Self { notifier }
    }
}

impl<N: Notifier> Drop for TitleReset<N> {
    fn drop(&mut self) {
        if let Err(err) = self.notifier.set_title(RESTORED_TITLE) {
            tracing::warn!(error = %err, "failed to restore title");
        }
    }
}
