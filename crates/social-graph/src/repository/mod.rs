//! Repositories over the User vertices and FOLLOW edges

mod follows;
mod users;

use crate::data::ElementId;

pub use follows::FollowRepository;
pub use users::UserRepository;

const USERS_NOT_FOUND_ERROR_MESSAGE: &str = "Users not found";
const USER_NOT_FOUND_ERROR_MESSAGE: &str = "User not found by id: ";
const USER_ALREADY_EXISTS_ERROR_MESSAGE: &str = "User already exists by username: ";

fn existing_edge_message(from: &ElementId, to: &ElementId) -> String {
    format!("Existing edge found from user id: {} to user id: {}", from, to)
}

fn no_existing_edge_message(from: &ElementId, to: &ElementId) -> String {
    format!("No existing edge found from user id: {} to user id: {}", from, to)
}
