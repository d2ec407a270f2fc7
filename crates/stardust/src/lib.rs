//! Stardust: cursor-reactive particles for your terminal

pub mod canvas;
pub mod cli_args;
/// All the user-configurable settings.
pub mod config {
    pub mod input;
    pub mod main;
}
pub mod framebuffer;
/// The particle effect itself.
pub mod particles {
    pub mod colour_mode;
    pub mod config;
    pub mod field;
    pub mod interaction;
    pub mod main;
    pub mod panel;
    pub mod particle;
    pub mod pointer;
    pub mod simulation;
    pub mod spawn;
}
pub mod raw_input;
pub mod renderer;
pub mod run;
pub mod shared_state;
pub mod surface;
