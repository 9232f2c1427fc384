pub mod app;
pub mod classify;
pub mod commands;
pub mod context;
pub mod dispatch;
pub mod env;
pub mod heal;
pub mod output;
pub mod parse;
pub mod rules;
pub mod runtime;

pub use classify::{cmd_classify, ClassifyArgs};
pub use heal::{cmd_heal, HealArgs};
pub use parse::{cmd_parse, ParseArgs};
pub use rules::{cmd_rules, RulesArgs};
