//! Slack Integration - slash-command interface for aqibot
//!
//! This crate turns a signed `/aqi` request into a Slack reply:
//! - **Signature** (`signature`) - v0 request signing and timestamp freshness
//! - **Tokenizer** (`tokenizer`) - quote-aware splitting of command text
//! - **Commands** (`commands`) - payload parsing and command resolution
//! - **Messages** (`message`) - reply builders with severity icons
//! - **Delivery** (`notify`, `response`) - immediate or deferred replies
//!
//! # Architecture
//!
//! ```text
//! HTTP body → verify → tokenize → resolve → ResponseController
//!                                               ↓           ↓
//!                                     inline reply    response_url post
//! ```
//!
//! # Key Types
//!
//! - `ResolvedCommand` - What the user asked for
//! - `ResponseController` - Fetches readings and picks the reply path
//! - `Notifier` - Trait for posting messages to Slack URLs

pub mod commands;
pub mod message;
pub mod notify;
pub mod response;
pub mod signature;
pub mod tokenizer;
