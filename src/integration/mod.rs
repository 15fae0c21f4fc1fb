//! Integration rules, their points, and the traversal over them.

pub mod gauss_point;
pub mod rule;
pub mod traversal;

pub use gauss_point::GaussPoint;
pub use rule::{IntegrationRule, RuleArena, RuleId};
pub use traversal::{IpRef, IpTraversal, for_each_ip_mut, try_for_each_ip_mut};
