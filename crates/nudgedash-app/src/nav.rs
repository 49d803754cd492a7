// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub const STEP_COUNT: usize = 3;
pub const LAST_STEP: usize = STEP_COUNT - 1;

const LOCKED_STEP: usize = 1;
const DEFAULT_SECOND_LABEL: &str = "2";

/// Three-step tab view-model. Only `advance` and `retreat` move the index,
/// and both clamp it to `0..=LAST_STEP`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationState {
    selected_index: usize,
    pub second_locked: bool,
    pub second_label: String,
    pub bottom: bool,
}

impl Default for NavigationState {
    fn default() -> Self {
        Self {
            selected_index: 0,
            second_locked: true,
            second_label: DEFAULT_SECOND_LABEL.to_owned(),
            bottom: false,
        }
    }
}

impl NavigationState {
    pub fn new(second_locked: bool, second_label: impl Into<String>, bottom: bool) -> Self {
        Self {
            selected_index: 0,
            second_locked,
            second_label: second_label.into(),
            bottom,
        }
    }

    pub const fn selected_index(&self) -> usize {
        self.selected_index
    }

    /// Returns true when the index moved.
    pub fn advance(&mut self) -> bool {
        let next = (self.selected_index + 1).min(LAST_STEP);
        let moved = next != self.selected_index;
        self.selected_index = next;
        moved
    }

    /// Returns true when the index moved.
    pub fn retreat(&mut self) -> bool {
        let next = self.selected_index.saturating_sub(1);
        let moved = next != self.selected_index;
        self.selected_index = next;
        moved
    }

    pub fn step_labels(&self) -> [String; STEP_COUNT] {
        ["1".to_owned(), self.second_label.clone(), "3".to_owned()]
    }

    pub fn is_locked(&self, step: usize) -> bool {
        step == LOCKED_STEP && self.second_locked
    }
}
