pub mod core;
pub mod orchestration;
pub mod security;
pub mod services;

pub use crate::core::*;
pub use orchestration::{
    HistoryCache, PollUpdate, PollerOptions, PublishOrchestrator, StatusPoller, TargetStore,
};
pub use security::{SecretBundle, SecretStore};
pub use services::{
    AutoConfirm, ConfirmPrompt, HttpPublishService, HttpSettingsService, PublishService,
    SettingsService,
};
