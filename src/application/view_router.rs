//! View Router.
//!
//! A pure mapping from `{role, session presence, path}` to a view. The
//! route table is rebuilt on every call from the caller's current role:
//! admin-only routes exist in it only for `Role::Admin`, so a role change
//! can never be served from a stale table.

use serde::Serialize;

use crate::domain::auth::Role;
use crate::domain::foundation::PostId;

pub const HOME_PATH: &str = "/";
pub const LOGIN_PATH: &str = "/login";

/// Which subtree a view belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Area {
    Public,
    Authenticated,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "page", rename_all = "snake_case")]
pub enum View {
    BlogIndex,
    BlogPost { slug: String },
    Category { name: String },
    About,
    Login,
    Dashboard,
    Profile,
    AdminOverview,
    AdminPosts,
    AdminNewPost,
    AdminEditPost { post_id: PostId },
    AdminUsers,
    AdminSettings,
    Redirect { to: String },
    NotFound,
}

impl View {
    pub fn area(&self) -> Area {
        match self {
            View::Dashboard | View::Profile => Area::Authenticated,
            View::AdminOverview
            | View::AdminPosts
            | View::AdminNewPost
            | View::AdminEditPost { .. }
            | View::AdminUsers
            | View::AdminSettings => Area::Admin,
            _ => Area::Public,
        }
    }

    /// Whether the route guard must admit the caller first.
    pub fn requires_session(&self) -> bool {
        self.area() != Area::Public
    }
}

type Build = fn(&[&str]) -> Option<View>;

#[derive(Clone, Copy)]
struct Route {
    pattern: &'static str,
    build: Build,
}

const PUBLIC_ROUTES: &[Route] = &[
    Route {
        pattern: "/blog",
        build: |_| Some(View::BlogIndex),
    },
    Route {
        pattern: "/blog/{slug}",
        build: blog_post,
    },
    Route {
        pattern: "/category/{name}",
        build: category,
    },
    Route {
        pattern: "/about",
        build: |_| Some(View::About),
    },
    Route {
        pattern: LOGIN_PATH,
        build: |_| Some(View::Login),
    },
];

const AUTHENTICATED_ROUTES: &[Route] = &[
    Route {
        pattern: HOME_PATH,
        build: |_| Some(View::Dashboard),
    },
    Route {
        pattern: "/profile",
        build: |_| Some(View::Profile),
    },
];

const ADMIN_ROUTES: &[Route] = &[
    Route {
        pattern: "/admin",
        build: |_| Some(View::AdminOverview),
    },
    Route {
        pattern: "/admin/posts",
        build: |_| Some(View::AdminPosts),
    },
    Route {
        pattern: "/admin/posts/new",
        build: |_| Some(View::AdminNewPost),
    },
    Route {
        pattern: "/admin/posts/{id}/edit",
        build: edit_post,
    },
    Route {
        pattern: "/admin/users",
        build: |_| Some(View::AdminUsers),
    },
    Route {
        pattern: "/admin/settings",
        build: |_| Some(View::AdminSettings),
    },
];

fn blog_post(params: &[&str]) -> Option<View> {
    Some(View::BlogPost {
        slug: params[0].to_string(),
    })
}

fn category(params: &[&str]) -> Option<View> {
    Some(View::Category {
        name: params[0].to_string(),
    })
}

/// Only well-formed post ids match.
fn edit_post(params: &[&str]) -> Option<View> {
    params[0]
        .parse()
        .ok()
        .map(|post_id| View::AdminEditPost { post_id })
}

/// Routes available to one role.
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn for_role(role: Role) -> Self {
        let mut routes = Vec::with_capacity(
            PUBLIC_ROUTES.len() + AUTHENTICATED_ROUTES.len() + ADMIN_ROUTES.len(),
        );
        routes.extend_from_slice(PUBLIC_ROUTES);
        routes.extend_from_slice(AUTHENTICATED_ROUTES);
        if role.is_admin() {
            routes.extend_from_slice(ADMIN_ROUTES);
        }
        Self { routes }
    }

    pub fn patterns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.routes.iter().map(|r| r.pattern)
    }

    pub fn contains(&self, pattern: &str) -> bool {
        self.patterns().any(|p| p == pattern)
    }

    /// Finds the view for a normalised path.
    pub fn resolve(&self, path: &str) -> Option<View> {
        let segments = split(path);
        self.routes.iter().find_map(|route| {
            let params = match_pattern(route.pattern, &segments)?;
            (route.build)(&params)
        })
    }
}

pub struct ViewRouter;

impl ViewRouter {
    pub fn route(role: Role, session_present: bool, path: &str) -> View {
        let path = normalise(path);

        if path == LOGIN_PATH && session_present {
            return View::Redirect {
                to: HOME_PATH.to_string(),
            };
        }

        RouteTable::for_role(role)
            .resolve(&path)
            .unwrap_or(View::NotFound)
    }
}

fn normalise(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    format!("/{}", trimmed)
}

fn split(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn match_pattern<'a>(pattern: &str, segments: &[&'a str]) -> Option<Vec<&'a str>> {
    let expected = split(pattern);
    if expected.len() != segments.len() {
        return None;
    }

    let mut params = Vec::new();
    for (want, got) in expected.iter().zip(segments) {
        if want.starts_with('{') && want.ends_with('}') {
            params.push(*got);
        } else if want != got {
            return None;
        }
    }
    Some(params)
}
