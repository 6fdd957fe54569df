//! energy-ticker: a desktop strip showing a live energy gauge, a rotating
//! news headline and a short energy trend, fed by a WebSocket backend.

pub mod config;
pub mod config_watcher;
pub mod feed;
pub mod gateway;
pub mod logging;
pub mod paths;
pub mod protocol;
pub mod render;
pub mod state_machine;
pub mod theme;
pub mod ticker;
pub mod view;
pub mod ws_client;
