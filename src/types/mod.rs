#![allow(unreachable_pub)]

mod annotation;
mod declaration;
mod error;
mod github;
mod rule;
mod target;

pub use annotation::Annotation;
pub use declaration::{AdapterConfig, ChatAdapter, TargetDeclaration};
pub use error::ErrorKind;
pub use github::GithubRepo;
pub use rule::{RoutingRule, RuleKind, RuleStore};
pub use target::{ResolveMethod, ResolvedTarget, SystemDefault};

/// The `clawmark_routing` `Result` type
pub type Result<T> = std::result::Result<T, crate::ErrorKind>;
