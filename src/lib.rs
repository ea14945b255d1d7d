pub mod assign;
pub mod db;
pub mod ipc;
pub mod remote;
pub mod roster;
pub mod session;
pub mod sync;
pub mod views;
