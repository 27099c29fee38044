#![allow(dead_code)]

pub mod scripted;

pub use scripted::{Behaviour, RecordingObserver, ScriptedService, SubmitStep};
