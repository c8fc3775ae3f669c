//! One renderable clause per kind of metadata row.

pub mod condition;
pub mod from;
pub mod group;
pub mod join;
pub mod limit;
pub mod order;
pub mod select;

pub use condition::ConditionClause;
pub use from::FromClause;
pub use group::GroupByClause;
pub use join::JoinClause;
pub use limit::LimitClause;
pub use order::OrderByClause;
pub use select::SelectClause;
