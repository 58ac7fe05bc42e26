//! Application state shared across handlers.

use super::origins::OriginPolicy;
use crate::commands::Commands;

#[derive(Clone)]
pub struct AppState {
    pub commands: Commands,
    pub origins: OriginPolicy,
}

impl AppState {
    pub fn new(commands: Commands, origins: OriginPolicy) -> Self {
        Self { commands, origins }
    }
}
