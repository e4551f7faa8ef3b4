use rstest::fixture;

use crate::db::local::LocalRepository;

pub const PROPOSAL: &str = "cm14451";
pub const VISIT: &str = "cm14451-1";

/// Member of `cm14451` and of its first session.
pub const MEMBER: &str = "vxn01537";
/// Holds `mx_admin` but belongs to no proposal.
pub const ADMIN: &str = "mxs21644";
pub const OUTSIDER: &str = "qqq99999";

#[fixture]
pub fn repository() -> LocalRepository {
    LocalRepository::bundled().unwrap()
}
