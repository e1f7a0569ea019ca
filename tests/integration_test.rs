//! Integration tests for R2 Uploadr
//!
//! Wires configuration, the auth client, the credential store and the
//! upload pipeline together the way the CLI does.

#[cfg(test)]
mod tests {
    use r2_uploadr::auth::AuthClient;
    use r2_uploadr::config::ConfigLoader;
    use r2_uploadr::credentials::CredentialStore;
    use r2_uploadr::server::CredentialServer;
    use r2_uploadr::upload::{upload_file, LocalFile};
    use serial_test::serial;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    #[serial]
    async fn test_self_hosted_login_then_upload() {
        let storage_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/b1/notes.txt"))
            .and(header("content-type", "text/plain"))
            .respond_with(ResponseTemplate::new(200).insert_header("ETag", "\"stored\""))
            .expect(1)
            .mount(&storage_server)
            .await;

        std::env::set_var("R2_UPLOADR_TEST_SECRET", "s1");

        let yaml = format!(
            r#"
server:
  address: "127.0.0.1:0"
  credentials:
    cloudflareAccountId: a1
    cloudflareR2AccessKeyId: k1
    cloudflareR2SecretAccessKey: ${{R2_UPLOADR_TEST_SECRET}}
    cloudflareR2BucketName: b1
storage:
  endpoint: {}
"#,
            storage_server.uri()
        );
        let mut config = ConfigLoader::from_yaml(&yaml).unwrap();
        std::env::remove_var("R2_UPLOADR_TEST_SECRET");

        let server_config = config.server.clone().unwrap();
        assert_eq!(server_config.credentials.secret_access_key, "s1");

        let mut server = CredentialServer::new(server_config).unwrap();
        let addr = server.start().await.unwrap();
        config.auth.endpoint = format!("http://{}/api/upload", addr);

        // login
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("store"));
        let creds = AuthClient::new(&config.auth)
            .unwrap()
            .get_auth("key")
            .await
            .unwrap();
        store.login(&creds).unwrap();

        // upload with what the store hands back
        let loaded = store.load().unwrap().unwrap();
        let file_path = dir.path().join("notes.txt");
        std::fs::write(&file_path, b"# notes\n").unwrap();

        let result = upload_file(&LocalFile::new(&file_path), &loaded, &config.storage, None)
            .await
            .unwrap();
        assert_eq!(result.etag, "\"stored\"");
        assert_eq!(result.bytes_written, 8);

        store.logout().unwrap();
        assert!(store.load().unwrap().is_none());

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_failed_login_leaves_store_empty() {
        let auth_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/upload"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&auth_server)
            .await;

        let config = ConfigLoader::from_yaml(&format!(
            "auth:\n  endpoint: {}/api/upload\n",
            auth_server.uri()
        ))
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path());

        let result = AuthClient::new(&config.auth).unwrap().get_auth("key").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "Authentication failed: Forbidden"
        );
        assert!(store.load().unwrap().is_none());
    }
}
