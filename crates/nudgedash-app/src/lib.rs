// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod model;
pub mod nav;
pub mod refresh;
pub mod schedule;
pub mod state;

pub use model::*;
pub use nav::*;
pub use refresh::*;
pub use schedule::*;
pub use state::*;
