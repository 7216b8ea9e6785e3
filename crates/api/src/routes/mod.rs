mod badges;
mod checkin;
mod misc;
mod search;

pub use badges::badge_routes;
pub use checkin::checkin_routes;
pub use misc::misc_routes;
pub use search::search_routes;
