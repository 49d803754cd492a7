// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::NavigationState;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    pub nav: NavigationState,
    pub status_line: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    NextStep,
    PrevStep,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    StepChanged(usize),
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn new(nav: NavigationState) -> Self {
        Self {
            nav,
            status_line: None,
        }
    }

    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::NextStep => self.step_event(NavigationState::advance),
            AppCommand::PrevStep => self.step_event(NavigationState::retreat),
            AppCommand::SetStatus(message) => {
                self.status_line = Some(message.clone());
                vec![AppEvent::StatusUpdated(message)]
            }
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    fn step_event(&mut self, step: fn(&mut NavigationState) -> bool) -> Vec<AppEvent> {
        if step(&mut self.nav) {
            vec![AppEvent::StepChanged(self.nav.selected_index())]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AppCommand, AppEvent, AppState};

    #[test]
    fn next_step_emits_change_until_last_step() {
        let mut state = AppState::default();

        assert_eq!(
            state.dispatch(AppCommand::NextStep),
            vec![AppEvent::StepChanged(1)]
        );
        assert_eq!(
            state.dispatch(AppCommand::NextStep),
            vec![AppEvent::StepChanged(2)]
        );
        assert!(state.dispatch(AppCommand::NextStep).is_empty());
        assert_eq!(state.nav.selected_index(), 2);
    }

    #[test]
    fn prev_step_at_first_step_is_silent() {
        let mut state = AppState::default();
        assert!(state.dispatch(AppCommand::PrevStep).is_empty());
        assert_eq!(state.nav.selected_index(), 0);
    }

    #[test]
    fn status_set_and_clear() {
        let mut state = AppState::default();

        let set = state.dispatch(AppCommand::SetStatus("refreshed".to_owned()));
        assert_eq!(state.status_line.as_deref(), Some("refreshed"));
        assert_eq!(set, vec![AppEvent::StatusUpdated("refreshed".to_owned())]);

        let cleared = state.dispatch(AppCommand::ClearStatus);
        assert_eq!(state.status_line, None);
        assert_eq!(cleared, vec![AppEvent::StatusCleared]);
    }
}
