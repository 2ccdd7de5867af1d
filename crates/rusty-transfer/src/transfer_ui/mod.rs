//! The three panels of the transfer board.

pub mod board;
pub mod history;
pub mod information;
