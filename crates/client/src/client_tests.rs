#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use radmin_core::{Advertisement, ClientConfig, Filters, ListQuery, OperatingMode, Resource, User};
    use radmin_storage::{AdminStore, KeyValueStore, MemoryStore, PortalStore};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::client::{ApiClient, TokenSource};
    use crate::error::ClientError;
    use crate::interceptor::{AuthInterceptor, Navigator, RecordingNavigator, Sessions};

    struct Fixture {
        server: MockServer,
        sessions: Sessions,
        navigator: Arc<RecordingNavigator>,
        client: ApiClient,
    }

    fn user(name: &str) -> User {
        serde_json::from_value(json!({"id": 1, "username": name})).unwrap()
    }

    async fn setup() -> Fixture {
        let server = MockServer::start().await;
        let backend: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let sessions = Sessions {
            admin: Arc::new(AdminStore::open_admin(Arc::clone(&backend))),
            portal: Arc::new(PortalStore::open_portal(backend)),
        };
        let navigator = Arc::new(RecordingNavigator::new());
        let config = ClientConfig { api_url: server.uri(), ..ClientConfig::default() };
        let nav: Arc<dyn Navigator> = Arc::clone(&navigator) as Arc<dyn Navigator>;
        let client = ApiClient::admin(&config, sessions.clone(), nav).unwrap();
        Fixture { server, sessions, navigator, client }
    }

    fn page_body(ids: &[u32], total: u64) -> serde_json::Value {
        let rows: Vec<_> = ids.iter().map(|id| json!({"id": id})).collect();
        json!({"data": rows, "pagination": {"totalItems": total}})
    }

    #[tokio::test]
    async fn test_attaches_admin_bearer_token() {
        let fx = setup().await;
        fx.sessions.admin.login("admin-token", user("root"), None);

        Mock::given(method("GET"))
            .and(path("/users"))
            .and(header("Authorization", "Bearer admin-token"))
            .and(query_param("page", "2"))
            .and(query_param("pageSize", "10"))
            .and(query_param("organizationId", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&[11, 12], 12)))
            .expect(1)
            .mount(&fx.server)
            .await;

        let query = ListQuery {
            page: 2,
            page_size: 10,
            search: None,
            filters: Filters::new().organization_id(5),
        };
        let page = fx.client.list(Resource::Users.endpoint(), &query).await.unwrap();
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.pagination.total_pages, 2);
    }

    #[tokio::test]
    async fn test_no_header_without_token() {
        let fx = setup().await;
        Mock::given(method("GET"))
            .and(path("/nas"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&[], 0)))
            .mount(&fx.server)
            .await;

        fx.client.list("/nas", &ListQuery::default()).await.unwrap();
        let requests = fx.server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].headers.get("authorization").is_none());
        assert!(requests[0].url.query().unwrap_or("").find("search").is_none());
    }

    #[tokio::test]
    async fn test_401_with_token_forces_logout_of_both_stores() {
        let fx = setup().await;
        fx.sessions.admin.login("stale", user("root"), None);
        fx.sessions.portal.login("portal", user("guest"), None);

        Mock::given(method("GET"))
            .and(path("/vouchers"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "jwt expired"})))
            .mount(&fx.server)
            .await;

        let err = fx.client.list("/vouchers", &ListQuery::default()).await.unwrap_err();
        assert!(matches!(err, ClientError::SessionExpired));
        assert!(!fx.sessions.admin.is_authenticated());
        assert!(!fx.sessions.portal.is_authenticated());
        assert_eq!(fx.navigator.visits(), vec!["/login".to_owned()]);
    }

    #[tokio::test]
    async fn test_401_without_header_passes_through() {
        let fx = setup().await;
        fx.sessions.admin.login("admin-token", user("root"), None);

        Mock::given(method("POST"))
            .and(path("/portal/login"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid credentials"})),
            )
            .mount(&fx.server)
            .await;

        let err = fx.client.portal_login(&fx.sessions.portal, "guest", "bad").await.unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.user_message(), "Invalid credentials");
        assert!(fx.sessions.admin.is_authenticated());
        assert!(fx.navigator.visits().is_empty());
    }

    #[tokio::test]
    async fn test_401_with_empty_admin_store_passes_through() {
        let fx = setup().await;
        fx.sessions.portal.login("portal-token", user("guest"), None);
        let navigator: Arc<dyn Navigator> = Arc::clone(&fx.navigator) as Arc<dyn Navigator>;
        let client = ApiClient::builder(fx.server.uri())
            .tokens(TokenSource::Portal(Arc::clone(&fx.sessions.portal)))
            .interceptor(AuthInterceptor::new(fx.sessions.clone(), navigator))
            .build()
            .unwrap();

        Mock::given(method("GET"))
            .and(path("/portal/usage"))
            .and(header("Authorization", "Bearer portal-token"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&fx.server)
            .await;

        let err = client.send(reqwest::Method::GET, "/portal/usage", &[], None).await.unwrap_err();
        assert!(matches!(err, ClientError::HttpStatus { code: 401, .. }));
        assert!(fx.sessions.portal.is_authenticated());
        assert!(fx.navigator.visits().is_empty());
    }

    #[tokio::test]
    async fn test_other_statuses_are_not_rewritten() {
        let fx = setup().await;
        fx.sessions.admin.login("admin-token", user("root"), None);

        for (code, msg) in [(400, "bad"), (403, "forbidden org"), (404, "gone"), (422, "dup"), (500, "boom")] {
            Mock::given(method("DELETE"))
                .and(path(format!("/nas/{code}")))
                .respond_with(ResponseTemplate::new(code).set_body_json(json!({"message": msg})))
                .mount(&fx.server)
                .await;

            let err = fx.client.delete(Resource::Nas, &code.to_string()).await.unwrap_err();
            assert_eq!(err.status(), Some(code));
            assert_eq!(err.user_message(), msg);
        }
        assert!(fx.sessions.admin.is_authenticated());
        assert!(fx.navigator.visits().is_empty());
    }

    #[tokio::test]
    async fn test_network_failure_is_passed_through() {
        let backend: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let admin = Arc::new(AdminStore::open_admin(backend));
        admin.login("t", user("root"), None);
        let client = ApiClient::builder("http://127.0.0.1:1")
            .tokens(TokenSource::Admin(Arc::clone(&admin)))
            .build()
            .unwrap();

        let err = client.list("/users", &ListQuery::default()).await.unwrap_err();
        assert!(err.is_network(), "expected network error, got {err:?}");
        assert!(admin.is_authenticated());
    }

    #[tokio::test]
    async fn test_admin_login_starts_session() {
        let fx = setup().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .and(body_json(json!({"username": "root", "password": "pw"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token": "fresh",
                "user": {"id": 1, "username": "root"},
                "operatingMode": "AAA"
            })))
            .expect(1)
            .mount(&fx.server)
            .await;

        fx.client.admin_login(&fx.sessions.admin, "root", "pw").await.unwrap();
        assert_eq!(fx.sessions.admin.token().as_deref(), Some("fresh"));
        assert_eq!(fx.sessions.admin.operating_mode(), Some(OperatingMode::Aaa));
    }

    #[tokio::test]
    async fn test_portal_login_keeps_pending_ad() {
        let fx = setup().await;
        Mock::given(method("POST"))
            .and(path("/portal/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token": "p",
                "user": {"username": "guest"},
                "ad": {"id": 9, "title": "Promo"}
            })))
            .mount(&fx.server)
            .await;

        fx.client.portal_login(&fx.sessions.portal, "guest", "pw").await.unwrap();
        let ad: Option<Advertisement> = fx.sessions.portal.take_pending_ad();
        assert_eq!(ad.unwrap().title.as_deref(), Some("Promo"));
        assert!(!fx.sessions.admin.is_authenticated());
    }

    #[tokio::test]
    async fn test_operating_mode_only_set_after_successful_save() {
        let fx = setup().await;
        fx.sessions.admin.login("t", user("root"), Some(OperatingMode::Aaa));

        Mock::given(method("PUT"))
            .and(path("/settings"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "db down"})))
            .up_to_n_times(1)
            .mount(&fx.server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/settings"))
            .and(body_json(json!({"operatingMode": "Mikrotik"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": {"operatingMode": "Mikrotik"}})),
            )
            .mount(&fx.server)
            .await;

        let err = fx
            .client
            .save_operating_mode(&fx.sessions.admin, OperatingMode::Mikrotik)
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "db down");
        assert_eq!(fx.sessions.admin.operating_mode(), Some(OperatingMode::Aaa));

        let saved = fx
            .client
            .save_operating_mode(&fx.sessions.admin, OperatingMode::Mikrotik)
            .await
            .unwrap();
        assert_eq!(saved["operatingMode"], "Mikrotik");
        assert_eq!(fx.sessions.admin.operating_mode(), Some(OperatingMode::Mikrotik));
    }

    #[tokio::test]
    async fn test_profile_update_replaces_user_only() {
        let fx = setup().await;
        fx.sessions.admin.login("keep-me", user("root"), None);

        Mock::given(method("PUT"))
            .and(path("/auth/profile"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "user": {"id": 1, "username": "root", "email": "new@example.com"}
            })))
            .mount(&fx.server)
            .await;

        let updated = fx
            .client
            .update_profile(&fx.sessions.admin, &json!({"email": "new@example.com"}))
            .await
            .unwrap();
        assert_eq!(updated.extra["email"], "new@example.com");
        assert_eq!(fx.sessions.admin.token().as_deref(), Some("keep-me"));
        assert_eq!(fx.sessions.admin.user(), Some(updated));
    }
}
