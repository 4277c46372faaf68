//! Skills configuration controller.
//!
//! Holds the skills panel state for a gateway console: the status report and
//! `skills` config fetched from the gateway, locally buffered per-skill edits,
//! the allow-list draft, and the editor/preview/create/delete modals.
//!
//! Synchronous edits are plain functions over [`SkillsConfigState`] (see
//! [`edits`] and [`allowlist`]), applied through
//! [`SkillsController::with_state`]. Anything that talks to the gateway is an
//! async method on [`SkillsController`]; those never return errors, they
//! record them in state.

pub mod actions;
pub mod allowlist;
pub mod controller;
pub mod create;
pub mod delete;
pub mod editor;
pub mod edits;
pub mod error;
pub mod i18n;
pub mod loader;
pub mod patch;
pub mod preview;
pub mod save;
pub mod state;
pub mod view;

pub use {
    controller::SkillsController,
    error::{Result, SkillsError},
    loader::LoadOptions,
    patch::GlobalSetting,
    state::{AllowlistMode, SkillEdit, SkillsConfigState},
    view::{SkillRow, skill_rows},
};
