//! Onboarding variants for first-time users.
//!
//! The variant is selected by name through `Settings`; every script is
//! an explicit entry here rather than a lookup hidden in handler code.

use anyhow::Result;
use teloxide::prelude::*;

use crate::dialogue::{ChatDialogue, ChatState, ProfileField};
use crate::lexicon;

use super::ui_builder::create_intro_keyboard;

/// A scripted introductory flow shown on a fresh `/start`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnboardingVariant {
    /// Two-button intro: send a photo now, or watch the demo
    IntroChoice,
    /// Older question-based flow: ask for the city up front
    LegacyQuestion,
    /// No script at all, straight into the open dialog
    Plain,
}

impl OnboardingVariant {
    pub const DEFAULT: OnboardingVariant = OnboardingVariant::IntroChoice;

    /// Resolve a configured variant name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "intro_choice" => Some(OnboardingVariant::IntroChoice),
            "legacy_question" => Some(OnboardingVariant::LegacyQuestion),
            "plain" => Some(OnboardingVariant::Plain),
            _ => None,
        }
    }

    /// State the opening script leaves the chat in. `None` keeps the
    /// current state: the intro waits for a button press before moving.
    pub fn initial_state(&self) -> Option<ChatState> {
        match self {
            OnboardingVariant::IntroChoice => None,
            OnboardingVariant::LegacyQuestion => Some(ChatState::OnboardingQuestion {
                field: ProfileField::Geography,
            }),
            OnboardingVariant::Plain => Some(ChatState::AiDialog),
        }
    }

    /// Run the variant's opening script and set the matching state
    pub async fn run(&self, bot: &Bot, chat_id: ChatId, dialogue: ChatDialogue) -> Result<()> {
        match self {
            OnboardingVariant::IntroChoice => {
                bot.send_message(chat_id, lexicon::INTRO_TEXT)
                    .reply_markup(create_intro_keyboard())
                    .await?;
            }
            OnboardingVariant::LegacyQuestion => {
                bot.send_message(chat_id, lexicon::LEGACY_CITY_QUESTION).await?;
            }
            OnboardingVariant::Plain => {
                bot.send_message(chat_id, lexicon::PLAIN_WELCOME).await?;
            }
        }
        if let Some(state) = self.initial_state() {
            dialogue.update(state).await?;
        }
        Ok(())
    }
}

/// What a `/start` should do, decided before anything is sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartDecision {
    /// User already finished onboarding; resume the open dialog
    ResumeDialog,
    /// An onboarding flow is underway; tell the user to keep going
    ContinueOnboarding,
    /// Brand-new user; run the configured variant
    RunVariant,
}

pub fn decide_start(is_context_added: bool, state: &ChatState) -> StartDecision {
    if is_context_added {
        StartDecision::ResumeDialog
    } else if state.onboarding_in_progress() {
        StartDecision::ContinueOnboarding
    } else {
        StartDecision::RunVariant
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_lookup_by_name() {
        assert_eq!(
            OnboardingVariant::from_name("intro_choice"),
            Some(OnboardingVariant::IntroChoice)
        );
        assert_eq!(
            OnboardingVariant::from_name("legacy_question"),
            Some(OnboardingVariant::LegacyQuestion)
        );
        assert_eq!(
            OnboardingVariant::from_name("plain"),
            Some(OnboardingVariant::Plain)
        );
        assert_eq!(OnboardingVariant::from_name("unknown"), None);
    }

    #[test]
    fn test_default_is_intro_choice() {
        assert_eq!(OnboardingVariant::DEFAULT, OnboardingVariant::IntroChoice);
    }

    #[test]
    fn test_fresh_start_never_opens_dialog_directly() {
        // a brand-new user runs the variant, and the default variant
        // holds the chat at its opening screen until a button is pressed
        assert_eq!(
            decide_start(false, &ChatState::Start),
            StartDecision::RunVariant
        );
        assert!(OnboardingVariant::DEFAULT.initial_state().is_none());
        assert!(matches!(
            OnboardingVariant::LegacyQuestion.initial_state(),
            Some(ChatState::OnboardingQuestion { .. })
        ));
    }

    #[test]
    fn test_known_user_resumes_dialog() {
        assert_eq!(
            decide_start(true, &ChatState::Start),
            StartDecision::ResumeDialog
        );
        assert_eq!(
            decide_start(true, &ChatState::WaitingHomeTime),
            StartDecision::ResumeDialog
        );
    }

    #[test]
    fn test_start_mid_onboarding_does_not_restart() {
        assert_eq!(
            decide_start(false, &ChatState::WaitingHomeTime),
            StartDecision::ContinueOnboarding
        );
        assert_eq!(
            decide_start(
                false,
                &ChatState::OnboardingQuestion {
                    field: ProfileField::Geography
                }
            ),
            StartDecision::ContinueOnboarding
        );
    }
}
