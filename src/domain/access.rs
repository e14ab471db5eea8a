//! Route-to-permission matching used by the admin access check.

use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::domain::permission::Permission;
use crate::domain::types::{ActionName, ControllerKey, Guard};

/// Controller and action a request resolves to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RouteAction {
    pub controller: ControllerKey,
    pub action: ActionName,
}

impl Display for RouteAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.controller, self.action)
    }
}

fn is_identifier(segment: &str) -> bool {
    !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit())
}

impl RouteAction {
    /// Resolves a resource route by REST convention.
    ///
    /// `path` is the part of the request path below the protected prefix,
    /// e.g. `/users/3/edit` for `/admin/users/3/edit`.
    pub fn resolve(method: &str, path: &str) -> Option<Self> {
        let segments = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>();
        let method = method.to_ascii_uppercase();

        let (controller, action) = match (segments.as_slice(), method.as_str()) {
            ([c], "GET" | "HEAD") => (*c, "index"),
            ([c], "POST") => (*c, "store"),
            ([c, "create"], "GET" | "HEAD") => (*c, "create"),
            ([c, id], "GET" | "HEAD") if is_identifier(id) => (*c, "show"),
            ([c, id], "PUT" | "PATCH") if is_identifier(id) => (*c, "update"),
            ([c, id], "DELETE") if is_identifier(id) => (*c, "destroy"),
            ([c, id, "edit"], "GET" | "HEAD") if is_identifier(id) => (*c, "edit"),
            ([c, extra], _) if !is_identifier(extra) => (*c, *extra),
            ([c, id, extra], _) if is_identifier(id) => (*c, *extra),
            _ => return None,
        };

        Some(Self {
            controller: ControllerKey::new(controller).ok()?,
            action: ActionName::new(action).ok()?,
        })
    }
}

/// Why a request was let through.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Grant {
    SuperAdmin,
    Permission(String),
}

/// Outcome of the permission lookup for one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccessDecision {
    Granted(Grant),
    Denied,
}

impl AccessDecision {
    pub fn is_granted(&self) -> bool {
        matches!(self, AccessDecision::Granted(_))
    }
}

/// Flat lookup over the aggregated permission set.
///
/// Only permissions registered for `guard` are considered. The first match
/// wins; there is no precedence between permissions.
pub fn find_grant<'a, I>(
    permissions: I,
    guard: Guard,
    route: &RouteAction,
) -> Option<&'a Permission>
where
    I: IntoIterator<Item = &'a Permission>,
{
    permissions
        .into_iter()
        .filter(|permission| permission.guard == guard)
        .find(|permission| permission.allows(&route.controller, &route.action))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AuditStamp;
    use crate::domain::types::{PermissionId, PermissionName, parse_actions};

    fn route(method: &str, path: &str) -> Option<String> {
        RouteAction::resolve(method, path).map(|r| r.to_string())
    }

    #[test]
    fn resolves_resource_actions() {
        assert_eq!(route("GET", "/users").as_deref(), Some("users@index"));
        assert_eq!(route("POST", "/users/").as_deref(), Some("users@store"));
        assert_eq!(route("GET", "/users/create").as_deref(), Some("users@create"));
        assert_eq!(route("GET", "/users/12").as_deref(), Some("users@show"));
        assert_eq!(route("PUT", "/users/12").as_deref(), Some("users@update"));
        assert_eq!(route("patch", "/users/12").as_deref(), Some("users@update"));
        assert_eq!(route("DELETE", "/users/12").as_deref(), Some("users@destroy"));
        assert_eq!(route("GET", "/users/12/edit").as_deref(), Some("users@edit"));
    }

    #[test]
    fn resolves_custom_actions() {
        assert_eq!(
            route("POST", "/users/4/toggle-status").as_deref(),
            Some("users@toggle-status")
        );
        assert_eq!(
            route("GET", "/enquiries/export").as_deref(),
            Some("enquiries@export")
        );
        assert_eq!(
            route("GET", "/permission-groups").as_deref(),
            Some("permission-groups@index")
        );
    }

    #[test]
    fn rejects_unknown_shapes() {
        assert_eq!(route("GET", "/"), None);
        assert_eq!(route("DELETE", "/users"), None);
        assert_eq!(route("GET", "/users/1/edit/extra"), None);
        assert_eq!(route("GET", "/Users Table"), None);
    }

    #[test]
    fn grant_respects_guard() {
        let permission = Permission {
            id: PermissionId::new(1).unwrap(),
            name: PermissionName::new("users-list").unwrap(),
            guard: Guard::Api,
            group_id: None,
            controller: ControllerKey::new("users").unwrap(),
            methods: parse_actions("index").unwrap(),
            audit: AuditStamp::default(),
        };
        let route = RouteAction::resolve("GET", "/users").unwrap();
        let permissions = vec![permission];

        assert!(find_grant(&permissions, Guard::Web, &route).is_none());
        assert!(find_grant(&permissions, Guard::Api, &route).is_some());
    }
}
