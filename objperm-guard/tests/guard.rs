use std::cell::Cell;

use axum::http::{header, HeaderMap, StatusCode, Uri};
use objperm_core::{
    AccessCheck, AuthUser, Group, MemoryPermissionStore, ModelKey, ObjectPermissions,
    ObjectPermissionsBackend, OlpConfig, OlpUser,
};
use objperm_guard::{
    permission_required, GuardContext, MemoryRegistry, PermSpec, PermissionRequiredView,
    Rejection, ViewArgs,
};

struct User {
    pk: String,
    superuser: bool,
}

impl User {
    fn new(pk: &str) -> OlpUser<User> {
        OlpUser::new(User {
            pk: pk.to_string(),
            superuser: false,
        })
    }
}

impl AuthUser for User {
    fn pk(&self) -> &str {
        &self.pk
    }
    fn is_active(&self) -> bool {
        true
    }
    fn is_superuser(&self) -> bool {
        self.superuser
    }
    fn groups(&self) -> &[Group] {
        &[]
    }
}

#[derive(Debug)]
struct Article {
    id: u32,
    author: String,
}

impl ObjectPermissions<User> for Article {
    fn model(&self) -> ModelKey {
        ModelKey::new("blog", "article")
    }

    fn pk(&self) -> String {
        self.id.to_string()
    }

    fn user_can(&self, codename: &str, user: &OlpUser<User>) -> Option<AccessCheck> {
        match codename {
            "change_article" | "delete_article" => Some(Ok(user.pk() == self.author)),
            _ => None,
        }
    }
}

struct Fixture {
    backend: ObjectPermissionsBackend,
    registry: MemoryRegistry<User>,
    headers: HeaderMap,
    uri: Uri,
}

impl Fixture {
    fn new() -> Self {
        Self::with_config(OlpConfig::default())
    }

    fn with_config(config: OlpConfig) -> Self {
        let store = MemoryPermissionStore::new();
        let article = ModelKey::new("blog", "article");
        store.register_defaults(&article);
        store.grant_user_all("1", &article);
        store.grant_user_all("2", &article);

        let registry: MemoryRegistry<User> = MemoryRegistry::new()
            .with(Article {
                id: 1,
                author: "1".into(),
            })
            .with(Article {
                id: 2,
                author: "2".into(),
            });

        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "testserver".parse().unwrap());

        Self {
            backend: ObjectPermissionsBackend::with_config(store, config),
            registry,
            headers,
            uri: "/test/".parse().unwrap(),
        }
    }

    fn ctx<'a>(&'a self, user: Option<&'a OlpUser<User>>) -> GuardContext<'a, User> {
        GuardContext {
            backend: &self.backend,
            registry: &self.registry,
            headers: &self.headers,
            uri: &self.uri,
            user,
        }
    }
}

fn args(pairs: &[(&str, &str)]) -> ViewArgs<User> {
    ViewArgs::from_pairs(pairs)
}

// ── permission_required ────────────────────────────────────────────────

#[test]
fn test_unauthenticated_redirects_to_login() {
    let fx = Fixture::new();
    let guard = permission_required(["blog.add_article"]);

    let result = guard.check(&fx.ctx(None), &mut ViewArgs::new());
    assert_eq!(
        result,
        Err(Rejection::Redirect("/accounts/login/?next=/test/".into()))
    );
}

#[test]
fn test_unauthorized_redirects_to_login() {
    let fx = Fixture::new();
    let user = User::new("3");
    let guard = permission_required(["blog.add_article"]);

    let resp = guard.call(&fx.ctx(Some(&user)), ViewArgs::new(), |_| "success");
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        resp.headers()[header::LOCATION],
        "/accounts/login/?next=/test/"
    );
}

#[test]
fn test_authorized_reaches_handler() {
    let fx = Fixture::new();
    let user = User::new("1");
    let called = Cell::new(false);

    let resp = permission_required(["blog.add_article"]).call(
        &fx.ctx(Some(&user)),
        ViewArgs::new(),
        |_| {
            called.set(true);
            "success"
        },
    );
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(called.get());
}

#[test]
fn test_superuser_reaches_handler() {
    let fx = Fixture::new();
    let user = OlpUser::new(User {
        pk: "admin".into(),
        superuser: true,
    });
    let guard = permission_required(["blog.add_article", "blog.delete_article"]);

    assert!(guard.check(&fx.ctx(Some(&user)), &mut ViewArgs::new()).is_ok());
}

#[test]
fn test_custom_login_url() {
    let fx = Fixture::new();
    let guard = permission_required(["blog.add_article"]).login_url("/custom/login/");

    assert_eq!(
        guard.check(&fx.ctx(None), &mut ViewArgs::new()),
        Err(Rejection::Redirect("/custom/login/?next=/test/".into()))
    );
}

#[test]
fn test_custom_login_url_other_origin() {
    let fx = Fixture::new();
    let guard =
        permission_required(["blog.add_article"]).login_url("https://example.com/custom/login/");

    assert_eq!(
        guard.check(&fx.ctx(None), &mut ViewArgs::new()),
        Err(Rejection::Redirect(
            "https://example.com/custom/login/?next=http%3A//testserver/test/".into()
        ))
    );
}

#[test]
fn test_custom_login_url_same_host_https() {
    let fx = Fixture::new();
    let guard =
        permission_required(["blog.add_article"]).login_url("https://testserver/custom/login/");

    assert_eq!(
        guard.check(&fx.ctx(None), &mut ViewArgs::new()),
        Err(Rejection::Redirect(
            "https://testserver/custom/login/?next=/test/".into()
        ))
    );
}

#[test]
fn test_configured_login_url() {
    let fx = Fixture::with_config(OlpConfig::new().with_login_url("/signin/"));
    let guard = permission_required(["blog.add_article"]);

    assert_eq!(
        guard.check(&fx.ctx(None), &mut ViewArgs::new()),
        Err(Rejection::Redirect("/signin/?next=/test/".into()))
    );
}

#[test]
fn test_raise_exception() {
    let fx = Fixture::new();
    let user = User::new("3");
    let guard = permission_required(["blog.add_article"]).raise_exception(true);

    let resp = guard.call(&fx.ctx(Some(&user)), ViewArgs::new(), |_| "success");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[test]
fn test_default_403_from_config() {
    let fx = Fixture::with_config(OlpConfig::new().with_default_403(true));
    let guard = permission_required(["blog.add_article"]);
    assert_eq!(
        guard.check(&fx.ctx(None), &mut ViewArgs::new()),
        Err(Rejection::Forbidden)
    );

    let guard = permission_required(["blog.add_article"]).raise_exception(false);
    assert!(matches!(
        guard.check(&fx.ctx(None), &mut ViewArgs::new()),
        Err(Rejection::Redirect(_))
    ));
}

#[test]
fn test_object_spec_replaces_argument() {
    let fx = Fixture::new();
    let user = User::new("1");
    let guard = permission_required([("blog.change_article", "article_id")]);

    let mut view_args = args(&[("article_id", "1")]);
    assert!(guard.check(&fx.ctx(Some(&user)), &mut view_args).is_ok());

    assert_eq!(view_args.value("article_id"), None);
    let article = view_args.downcast::<Article>("article_id").unwrap();
    assert_eq!(article.id, 1);
    assert_eq!(article.author, "1");
}

#[test]
fn test_object_spec_handler_receives_object() {
    let fx = Fixture::new();
    let user = User::new("2");

    let resp = permission_required([("blog.delete_article", "article_id")]).call(
        &fx.ctx(Some(&user)),
        args(&[("article_id", "2")]),
        |args| {
            let article = args.downcast::<Article>("article_id").unwrap();
            format!("deleted {}", article.id)
        },
    );
    assert_eq!(resp.status(), StatusCode::OK);
}

#[test]
fn test_object_spec_denied() {
    let fx = Fixture::new();
    let user = User::new("2");
    let guard = permission_required([("blog.change_article", "article_id")]);

    assert_eq!(
        guard.check(&fx.ctx(Some(&user)), &mut args(&[("article_id", "1")])),
        Err(Rejection::Redirect("/accounts/login/?next=/test/".into()))
    );
}

#[test]
fn test_invalid_permission_is_denied() {
    let fx = Fixture::new();
    let user = User::new("1");

    for perm in ["blog_change_article", "blog.fake_perm", "a.blog.change_article"] {
        let guard = permission_required([(perm, "article_id")]).raise_exception(true);
        assert_eq!(
            guard.check(&fx.ctx(Some(&user)), &mut args(&[("article_id", "1")])),
            Err(Rejection::Forbidden),
            "{perm}"
        );
    }
}

#[test]
fn test_missing_object() {
    let fx = Fixture::new();
    let user = User::new("1");
    let guard = permission_required([("blog.change_article", "article_id")]);

    let result = guard.check(&fx.ctx(Some(&user)), &mut args(&[("article_id", "99")]));
    assert!(matches!(result, Err(Rejection::NotFound(_))));

    let resp = guard.call(&fx.ctx(Some(&user)), args(&[("article_id", "99")]), |_| "success");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[test]
fn test_missing_view_argument() {
    let fx = Fixture::new();
    let user = User::new("1");
    let guard = permission_required([("blog.change_article", "article_id")]);

    let resp = guard.call(&fx.ctx(Some(&user)), args(&[("id", "1")]), |_| "success");
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_multiple_specs() {
    let fx = Fixture::new();
    let user = User::new("1");
    let ctx = fx.ctx(Some(&user));

    let guard = permission_required([
        PermSpec::from("blog.add_article"),
        PermSpec::from(("blog.change_article", "article_id")),
        PermSpec::from(("blog.delete_article", "article_id")),
    ]);
    assert!(guard.check(&ctx, &mut args(&[("article_id", "1")])).is_ok());

    let guard = permission_required(["blog.add_article"])
        .and(("blog.change_article", "article_id"))
        .raise_exception(true);
    assert_eq!(
        guard.check(&ctx, &mut args(&[("article_id", "2")])),
        Err(Rejection::Forbidden)
    );
}

#[test]
fn test_no_specs_is_misconfigured() {
    let fx = Fixture::new();
    let guard = permission_required(Vec::<PermSpec>::new());
    assert!(matches!(
        guard.check(&fx.ctx(None), &mut ViewArgs::new()),
        Err(Rejection::ImproperlyConfigured(_))
    ));
}

// ── PermissionRequiredView ─────────────────────────────────────────────

struct Unconfigured;

impl PermissionRequiredView<User> for Unconfigured {}

struct EditArticle;

impl PermissionRequiredView<User> for EditArticle {
    fn permission_required(&self) -> Option<Vec<PermSpec>> {
        Some(vec![("blog.change_article", "article_id").into()])
    }
}

struct AddArticle;

impl PermissionRequiredView<User> for AddArticle {
    fn permission_required(&self) -> Option<Vec<PermSpec>> {
        Some(vec!["blog.add_article".into()])
    }

    fn login_url(&self) -> Option<String> {
        Some("/custom/login/".into())
    }
}

#[test]
fn test_view_without_permissions() {
    let fx = Fixture::new();
    let user = User::new("1");

    let result = Unconfigured.has_permission(&fx.ctx(Some(&user)), &mut ViewArgs::new());
    assert!(matches!(result, Err(Rejection::ImproperlyConfigured(_))));

    let resp = Unconfigured.dispatch(&fx.ctx(Some(&user)), ViewArgs::new(), |_| "success");
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_view_has_permission() {
    let fx = Fixture::new();
    let owner = User::new("1");
    let other = User::new("2");

    let mut view_args = args(&[("article_id", "1")]);
    assert_eq!(
        EditArticle.has_permission(&fx.ctx(Some(&owner)), &mut view_args),
        Ok(true)
    );
    assert!(view_args.downcast::<Article>("article_id").is_some());

    assert_eq!(
        EditArticle.has_permission(&fx.ctx(Some(&other)), &mut args(&[("article_id", "1")])),
        Ok(false)
    );
}

#[test]
fn test_view_dispatch() {
    let fx = Fixture::new();
    let user = User::new("3");

    let resp = AddArticle.dispatch(&fx.ctx(Some(&user)), ViewArgs::new(), |_| "success");
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        resp.headers()[header::LOCATION],
        "/custom/login/?next=/test/"
    );

    let user = User::new("1");
    let resp = AddArticle.dispatch(&fx.ctx(Some(&user)), ViewArgs::new(), |_| "success");
    assert_eq!(resp.status(), StatusCode::OK);
}
