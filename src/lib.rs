#![doc = "bakery-publish: locate baked election result files and publish them to GitHub."]

//! Result files are staged under `<country_dir>/bakery` by upstream tooling. This
//! crate finds the files for a jurisdiction ([`locate`]) and pushes them to that
//! jurisdiction's results repository, then merges them into the public branch
//! ([`publish`]). The remote host is abstracted in [`contract`]; [`github`] is the
//! concrete client.

pub mod cli;
pub mod config;
pub mod contract;
pub mod error;
pub mod github;
pub mod hooks;
pub mod load_config;
pub mod locate;
pub mod publish;
