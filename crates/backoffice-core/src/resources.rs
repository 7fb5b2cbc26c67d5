//! Admin resources managed by the console.
//!
//! Each resource maps to a collection path under `/admin`. Payloads are
//! opaque JSON; this module only builds the requests and refuses operations
//! the backend does not expose for a resource.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, InvalidInputError};
use crate::types::{ApiRequest, Pagination};
use crate::Result;

/// An admin resource collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Users,
    Events,
    News,
    Courses,
    Orders,
    StudentSays,
}

/// A CRUD operation on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Get,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::List => "list",
            Operation::Get => "get",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

impl Resource {
    pub const ALL: [Resource; 6] = [
        Resource::Users,
        Resource::Events,
        Resource::News,
        Resource::Courses,
        Resource::Orders,
        Resource::StudentSays,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Resource::Users => "users",
            Resource::Events => "events",
            Resource::News => "news",
            Resource::Courses => "courses",
            Resource::Orders => "orders",
            Resource::StudentSays => "student-says",
        }
    }

    /// Collection path, e.g. `/admin/users`.
    pub fn path(&self) -> String {
        format!("/admin/{}", self.name())
    }

    pub fn supports(&self, operation: Operation) -> bool {
        use Operation::*;
        match self {
            Resource::Users | Resource::Events | Resource::News => true,
            Resource::Courses => matches!(operation, List | Get | Update),
            Resource::Orders => matches!(operation, List),
            Resource::StudentSays => matches!(operation, List | Create | Delete),
        }
    }

    /// `GET /admin/<resource>?page=&take=`
    pub fn list(&self, pagination: Pagination) -> Result<ApiRequest> {
        self.check(Operation::List)?;
        Ok(ApiRequest::get(self.path())
            .with_query("page", pagination.page)
            .with_query("take", pagination.take))
    }

    /// `GET /admin/<resource>/<id>`
    pub fn get(&self, id: &str) -> Result<ApiRequest> {
        self.check(Operation::Get)?;
        Ok(ApiRequest::get(self.item_path(id)?))
    }

    /// `POST /admin/<resource>`
    pub fn create(&self, body: serde_json::Value) -> Result<ApiRequest> {
        self.check(Operation::Create)?;
        Ok(ApiRequest::post(self.path()).with_body(body))
    }

    /// `PATCH /admin/<resource>/<id>`
    pub fn update(&self, id: &str, body: serde_json::Value) -> Result<ApiRequest> {
        self.check(Operation::Update)?;
        Ok(ApiRequest::patch(self.item_path(id)?).with_body(body))
    }

    /// `DELETE /admin/<resource>/<id>`
    pub fn delete(&self, id: &str) -> Result<ApiRequest> {
        self.check(Operation::Delete)?;
        Ok(ApiRequest::delete(self.item_path(id)?))
    }

    fn check(&self, operation: Operation) -> Result<()> {
        if self.supports(operation) {
            Ok(())
        } else {
            Err(InvalidInputError::Unsupported {
                resource: self.name(),
                operation: operation.as_str(),
            }
            .into())
        }
    }

    fn item_path(&self, id: &str) -> Result<String> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && id != "."
            && id != "..";
        if !valid {
            return Err(InvalidInputError::Path {
                value: id.to_string(),
                reason: "resource id must be a non-empty path segment".to_string(),
            }
            .into());
        }
        Ok(format!("{}/{}", self.path(), id))
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Resource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Resource::ALL
            .into_iter()
            .find(|r| r.name() == s)
            .ok_or_else(|| {
                InvalidInputError::Path {
                    value: s.to_string(),
                    reason: "unknown resource".to_string(),
                }
                .into()
            })
    }
}
