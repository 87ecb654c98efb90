use serde::Serialize;

use super::codec::BridgeMessage;
use super::errors::LoadError;
use super::types::PlayerState;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "camelCase")]
pub enum ReadinessState {
    #[default]
    NotLoaded,
    Loading,
    Ready,
}

/// What observing a notification did to readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessTransition {
    BecameReady,
    PlayerStateChanged(PlayerState),
    Unchanged,
    /// A `Ready` that arrived while not loading. Dropped.
    StrayReady,
}

/// NotLoaded -> Loading -> Ready, with teardown as the only way back.
#[derive(Debug, Default)]
pub struct ReadinessMachine {
    state: ReadinessState,
    player_state: PlayerState,
}

impl ReadinessMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ReadinessState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == ReadinessState::Ready
    }

    /// Last state reported while Ready; `Unstarted` otherwise.
    pub fn player_state(&self) -> PlayerState {
        self.player_state
    }

    pub fn begin_loading(&mut self) -> Result<(), LoadError> {
        if self.state != ReadinessState::NotLoaded {
            return Err(LoadError::AlreadyLoaded(self.state));
        }
        log::debug!("Readiness: NotLoaded -> Loading");
        self.state = ReadinessState::Loading;
        Ok(())
    }

    pub fn observe(&mut self, message: &BridgeMessage) -> ReadinessTransition {
        match (self.state, message) {
            (ReadinessState::Loading, BridgeMessage::Ready) => {
                log::debug!("Readiness: Loading -> Ready");
                self.state = ReadinessState::Ready;
                self.player_state = PlayerState::Unstarted;
                ReadinessTransition::BecameReady
            }
            (_, BridgeMessage::Ready) => {
                log::warn!("Readiness: ignoring onReady while {:?}", self.state);
                ReadinessTransition::StrayReady
            }
            (ReadinessState::Ready, BridgeMessage::StateChange(state)) => {
                self.player_state = *state;
                ReadinessTransition::PlayerStateChanged(*state)
            }
            (state, other) => {
                if state != ReadinessState::Ready {
                    log::debug!("Readiness: {:?} arrived while {:?}", other, state);
                }
                ReadinessTransition::Unchanged
            }
        }
    }

    pub fn reset(&mut self) {
        if self.state != ReadinessState::NotLoaded {
            log::debug!("Readiness: {:?} -> NotLoaded", self.state);
        }
        self.state = ReadinessState::NotLoaded;
        self.player_state = PlayerState::Unstarted;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_only_follows_loading() {
        let mut machine = ReadinessMachine::new();
        assert_eq!(machine.observe(&BridgeMessage::Ready), ReadinessTransition::StrayReady);
        assert_eq!(machine.state(), ReadinessState::NotLoaded);

        machine.begin_loading().unwrap();
        assert_eq!(machine.state(), ReadinessState::Loading);
        assert_eq!(
            machine.observe(&BridgeMessage::StateChange(PlayerState::Buffering)),
            ReadinessTransition::Unchanged
        );
        assert_eq!(machine.state(), ReadinessState::Loading);

        assert_eq!(machine.observe(&BridgeMessage::Ready), ReadinessTransition::BecameReady);
        assert!(machine.is_ready());
        assert_eq!(machine.observe(&BridgeMessage::Ready), ReadinessTransition::StrayReady);
    }

    #[test]
    fn second_load_is_refused_until_reset() {
        let mut machine = ReadinessMachine::new();
        machine.begin_loading().unwrap();
        assert!(matches!(
            machine.begin_loading(),
            Err(LoadError::AlreadyLoaded(ReadinessState::Loading))
        ));
        machine.reset();
        assert!(machine.begin_loading().is_ok());
    }

    #[test]
    fn player_state_tracked_only_while_ready() {
        let mut machine = ReadinessMachine::new();
        machine.begin_loading().unwrap();
        machine.observe(&BridgeMessage::StateChange(PlayerState::Playing));
        assert_eq!(machine.player_state(), PlayerState::Unstarted);

        machine.observe(&BridgeMessage::Ready);
        assert_eq!(
            machine.observe(&BridgeMessage::StateChange(PlayerState::Playing)),
            ReadinessTransition::PlayerStateChanged(PlayerState::Playing)
        );
        assert_eq!(machine.player_state(), PlayerState::Playing);

        machine.reset();
        assert_eq!(machine.state(), ReadinessState::NotLoaded);
        assert_eq!(machine.player_state(), PlayerState::Unstarted);
    }
}
