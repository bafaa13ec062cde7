//! Conversation state for the onboarding and diagnosis flow.

use serde::{Deserialize, Serialize};
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};

/// Paywall branch derived from the health score
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scenario {
    Rescue,
    Growth,
}

impl Scenario {
    /// A score of 5 or below means the plant needs rescuing
    pub fn for_score(score: u8) -> Self {
        if score <= 5 {
            Scenario::Rescue
        } else {
            Scenario::Growth
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::Rescue => "rescue",
            Scenario::Growth => "growth",
        }
    }
}

/// Profile question asked by the legacy onboarding variant
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfileField {
    Geography,
}

/// Why the user is being held in the photo-waiting state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaitReason {
    OnboardingPlantPhoto,
}

/// Per-chat conversation state.
///
/// `Start` is the unset state of a brand-new chat. `AiDialog` is the
/// long-lived steady state; quota exhaustion is a gate check on entry to
/// each action, not a state of its own.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub enum ChatState {
    #[default]
    Start,
    /// Legacy question-based onboarding variant
    OnboardingQuestion { field: ProfileField },
    /// Free-form assistant chat
    AiDialog,
    /// Waiting for the first plant photo
    WaitingPlantPhoto { wait_reason: WaitReason },
    /// Waiting for the user to pick when they will be home
    WaitingHomeTime,
    /// Photo analyzed; waiting for the user's city before the paywall
    WaitingCity { scenario: Scenario, health_score: u8 },
}

impl ChatState {
    /// States in which `/start` must not restart the onboarding
    pub fn onboarding_in_progress(&self) -> bool {
        matches!(
            self,
            ChatState::OnboardingQuestion { .. }
                | ChatState::WaitingPlantPhoto { .. }
                | ChatState::WaitingHomeTime
                | ChatState::WaitingCity { .. }
        )
    }
}

/// Type alias for the chat dialogue
pub type ChatDialogue = Dialogue<ChatState, InMemStorage<ChatState>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_for_score() {
        assert_eq!(Scenario::for_score(0), Scenario::Rescue);
        assert_eq!(Scenario::for_score(3), Scenario::Rescue);
        assert_eq!(Scenario::for_score(5), Scenario::Rescue);
        assert_eq!(Scenario::for_score(6), Scenario::Growth);
        assert_eq!(Scenario::for_score(8), Scenario::Growth);
        assert_eq!(Scenario::for_score(10), Scenario::Growth);
    }

    #[test]
    fn test_default_state_is_start() {
        assert!(matches!(ChatState::default(), ChatState::Start));
    }

    #[test]
    fn test_onboarding_in_progress() {
        assert!(ChatState::WaitingHomeTime.onboarding_in_progress());
        assert!(ChatState::WaitingPlantPhoto {
            wait_reason: WaitReason::OnboardingPlantPhoto
        }
        .onboarding_in_progress());
        assert!(ChatState::WaitingCity {
            scenario: Scenario::Growth,
            health_score: 8
        }
        .onboarding_in_progress());
        assert!(!ChatState::Start.onboarding_in_progress());
        assert!(!ChatState::AiDialog.onboarding_in_progress());
    }

    #[test]
    fn test_state_serialization_round_trip() {
        let state = ChatState::WaitingCity {
            scenario: Scenario::Rescue,
            health_score: 3,
        };
        let json = serde_json::to_string(&state).unwrap();
        let back: ChatState = serde_json::from_str(&json).unwrap();
        match back {
            ChatState::WaitingCity {
                scenario,
                health_score,
            } => {
                assert_eq!(scenario, Scenario::Rescue);
                assert_eq!(health_score, 3);
            }
            _ => panic!("unexpected state after round trip"),
        }
    }
}
