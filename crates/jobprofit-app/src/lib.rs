// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod calc;
pub mod format;
pub mod history;
pub mod ids;
pub mod model;
pub mod state;
pub mod summary;
pub mod validation;

pub use calc::*;
pub use history::*;
pub use ids::*;
pub use model::*;
pub use state::*;
pub use summary::*;
pub use validation::*;
