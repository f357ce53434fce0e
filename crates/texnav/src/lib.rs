// lib.rs
//
// LaTeX file-reference navigation: the command scanner, the reference
// resolver, and the LSP backend that serves its results as document links.

pub mod backend;
pub mod config;
pub mod document;
pub mod handlers;
pub mod latex;
pub mod navigation;
pub mod state;
