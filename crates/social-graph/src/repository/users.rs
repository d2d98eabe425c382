use serde_json::Value;
use tracing::{debug, info, instrument};

use super::{USERS_NOT_FOUND_ERROR_MESSAGE, USER_ALREADY_EXISTS_ERROR_MESSAGE, USER_NOT_FOUND_ERROR_MESSAGE};
use crate::codec::{
    flatten, flatten_patch, is_reserved_key, unflatten, writable_properties, ADDRESS_STATE_PROPERTY,
    NAME_PROPERTY, USERNAME_PROPERTY, USER_VERTEX_LABEL,
};
use crate::data::{
    ElementId, ExecutionFailure, PropertyMap, PropertyValue, RepositoryError, RepositoryResult, User,
};
use crate::query::{build_exact_filter, build_name_filter, Pagination};
use crate::traversal::{GraphTraversalSource, Predicate, Traversal};

/// CRUD operations on User vertices.
#[derive(Debug, Clone)]
pub struct UserRepository {
    g: GraphTraversalSource,
}

impl UserRepository {
    pub fn new(g: GraphTraversalSource) -> Self {
        Self { g }
    }

    /// Lists users whose name contains `name` and whose address state equals
    /// `address_state`, both case-insensitively, one page at a time.
    ///
    /// An empty page is reported as `NotFound`.
    #[instrument(skip(self))]
    pub async fn list_users(
        &self,
        name: Option<&str>,
        address_state: Option<&str>,
        pagination: Pagination,
    ) -> RepositoryResult<Vec<User>> {
        let (start, end) = pagination.range()?;

        let mut traversal = Traversal::v().has_label(USER_VERTEX_LABEL);
        if let Some(predicate) = build_name_filter(name) {
            traversal = traversal.has(NAME_PROPERTY, predicate);
        }
        if let Some(predicate) = build_exact_filter(address_state) {
            traversal = traversal.has(ADDRESS_STATE_PROPERTY, predicate);
        }

        let rows = self.g.to_list(traversal.range(start, end)).await?;
        if rows.is_empty() {
            return Err(RepositoryError::NotFound(USERS_NOT_FOUND_ERROR_MESSAGE.to_string()));
        }

        debug!(rows = rows.len(), "Decoding user page");
        rows.iter()
            .map(|row| unflatten::<User>(row).map_err(RepositoryError::from))
            .collect()
    }

    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn get_user_by_id(&self, id: &ElementId) -> RepositoryResult<User> {
        let row = self.find_vertex(id).await?;
        Ok(unflatten(&row)?)
    }

    /// Creates a user with a fresh id, failing with `Conflict` if the
    /// username is taken. Any id on `user` is ignored.
    #[instrument(skip(self, user), fields(username = %user.username))]
    pub async fn insert_user(&self, user: &User) -> RepositoryResult<User> {
        validate_username(&user.username)?;

        let mut search = PropertyMap::new();
        search.insert(USERNAME_PROPERTY.to_string(), PropertyValue::from(user.username.as_str()));
        let on_create: PropertyMap = writable_properties(flatten(user))
            .filter(|(key, value)| key != USERNAME_PROPERTY && !value.is_null())
            .collect();

        let traversal = Traversal::merge_v(USER_VERTEX_LABEL, search, on_create)
            .fail_on_match(format!("{}{}", USER_ALREADY_EXISTS_ERROR_MESSAGE, user.username));
        let row = self
            .g
            .try_next(traversal)
            .await?
            .ok_or_else(|| empty_write_result("merge"))?;

        let created: User = unflatten(&row)?;
        info!(user_id = ?created.id, "User created");
        Ok(created)
    }

    /// Replaces every stored property of the user with those of `user`.
    /// Fields absent from `user` end up cleared.
    #[instrument(skip(self, user), fields(user_id = %id))]
    pub async fn replace_user(&self, id: &ElementId, user: &User) -> RepositoryResult<User> {
        self.find_vertex(id).await?;
        validate_username(&user.username)?;

        let mut traversal = self
            .guarded_vertex(id, &user.username)
            .clear_properties();
        for (key, value) in writable_properties(flatten(user)) {
            if !value.is_null() {
                traversal = traversal.property(&key, value);
            }
        }

        let row = self.g.try_next(traversal).await?.ok_or_else(|| not_found(id))?;
        info!("User replaced");
        Ok(unflatten(&row)?)
    }

    /// Applies a partial update: supplied values are set, explicit nulls
    /// drop the property, and omitted keys are left untouched.
    #[instrument(skip(self, patch), fields(user_id = %id, keys = patch.len()))]
    pub async fn patch_user(
        &self,
        id: &ElementId,
        patch: &serde_json::Map<String, Value>,
    ) -> RepositoryResult<User> {
        self.find_vertex(id).await?;

        if patch.is_empty() {
            return Err(RepositoryError::BadRequest(
                "Patch request must contain at least one property".to_string(),
            ));
        }
        let partition_key = self.g.partition().map(|p| p.key());
        if let Some(key) = patch
            .keys()
            .find(|key| is_reserved_key(key) || Some(key.as_str()) == partition_key)
        {
            return Err(RepositoryError::BadRequest(format!("Property {} cannot be patched", key)));
        }
        let changes = flatten_patch::<User>(patch).map_err(|e| RepositoryError::BadRequest(e.to_string()))?;

        let mut traversal = match changes.get(USERNAME_PROPERTY).and_then(PropertyValue::as_str) {
            Some(username) => {
                validate_username(username)?;
                self.guarded_vertex(id, username)
            }
            None => Traversal::v_id(id).has_label(USER_VERTEX_LABEL),
        };
        for (key, value) in changes {
            traversal = if value.is_null() {
                traversal.drop_property(&key)
            } else {
                traversal.property(&key, value)
            };
        }

        let row = self.g.try_next(traversal).await?.ok_or_else(|| not_found(id))?;
        info!("User patched");
        Ok(unflatten(&row)?)
    }

    /// Deletes the user together with every incident edge.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn delete_user(&self, id: &ElementId) -> RepositoryResult<()> {
        self.find_vertex(id).await?;
        self.g.iterate(Traversal::v_id(id).has_label(USER_VERTEX_LABEL).drop()).await?;
        info!("User deleted");
        Ok(())
    }

    /// Element map of the user vertex `id`, or `NotFound`.
    pub(crate) async fn find_vertex(&self, id: &ElementId) -> RepositoryResult<PropertyMap> {
        self.g
            .try_next(Traversal::v_id(id).has_label(USER_VERTEX_LABEL))
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Selects the user vertex `id`, failing the traversal before any later
    /// step runs if another user already owns `username`.
    fn guarded_vertex(&self, id: &ElementId, username: &str) -> Traversal {
        let owner = Traversal::v()
            .has_label(USER_VERTEX_LABEL)
            .has(USERNAME_PROPERTY, Predicate::eq(username))
            .has_not_id(id);
        Traversal::v_id(id)
            .has_label(USER_VERTEX_LABEL)
            .fail_if(owner, format!("{}{}", USER_ALREADY_EXISTS_ERROR_MESSAGE, username))
    }
}

fn validate_username(username: &str) -> RepositoryResult<()> {
    if username.trim().is_empty() {
        return Err(RepositoryError::BadRequest("username must not be blank".to_string()));
    }
    Ok(())
}

fn not_found(id: &ElementId) -> RepositoryError {
    RepositoryError::NotFound(format!("{}{}", USER_NOT_FOUND_ERROR_MESSAGE, id))
}

fn empty_write_result(step: &str) -> RepositoryError {
    RepositoryError::StoreExecution(ExecutionFailure::Engine(format!(
        "{} step returned no element",
        step
    )))
}
