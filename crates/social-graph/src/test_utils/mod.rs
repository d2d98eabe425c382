//! Fixtures and test doubles for exercising the repositories

#[cfg(feature = "mocks")]
pub mod mocks;

#[cfg(feature = "mocks")]
pub use mocks::MockGraphStore;

use crate::data::{Address, PropertyMap, PropertyValue, User, ID_KEY, LABEL_KEY};

/// Element map of a stored User vertex, as a store returns it.
pub fn user_row(id: &str, username: &str) -> PropertyMap {
    let mut row = PropertyMap::new();
    row.insert(ID_KEY.to_string(), PropertyValue::from(id));
    row.insert(LABEL_KEY.to_string(), PropertyValue::from("User"));
    row.insert("username".to_string(), PropertyValue::from(username));
    row
}

/// Element map of a stored FOLLOW edge from `out_id` to `in_id`.
pub fn follow_row(id: &str, out_id: &str, in_id: &str) -> PropertyMap {
    let anchor = |vertex_id: &str| {
        let mut anchor = PropertyMap::new();
        anchor.insert(ID_KEY.to_string(), PropertyValue::from(vertex_id));
        anchor.insert(LABEL_KEY.to_string(), PropertyValue::from("User"));
        PropertyValue::Map(anchor)
    };

    let mut row = PropertyMap::new();
    row.insert(ID_KEY.to_string(), PropertyValue::from(id));
    row.insert(LABEL_KEY.to_string(), PropertyValue::from("FOLLOW"));
    row.insert("status".to_string(), PropertyValue::from("ACTIVE"));
    row.insert("OUT".to_string(), anchor(out_id));
    row.insert("IN".to_string(), anchor(in_id));
    row
}

/// A user with a full address in `state`.
pub fn user_in_state(username: &str, name: &str, state: &str) -> User {
    User::new(username, Some(name)).with_address(Address {
        address_line: Some("100 Market St".to_string()),
        zip_code: Some("00000".to_string()),
        city: Some("Springfield".to_string()),
        state: Some(state.to_string()),
        country: Some("US".to_string()),
    })
}
