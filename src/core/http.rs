use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::{redirect, Client};

use crate::core::config::InstallerConfig;

/// Shared client for both upstream hosts. Every request carries the
/// installer's user agent; per-request timeouts are set by the callers.
pub fn build_http_client(config: &InstallerConfig) -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(default_headers)
        .redirect(redirect::Policy::limited(config.packages.max_redirects))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::archive::extract::tests::zip_bytes;
    use crate::core::archive::ArchiveKind;
    use crate::core::catalog::CatalogEntry;
    use crate::core::error::InstallerError;
    use crate::core::sources::{PackageFetcher, ReleaseFetcher};
    use mockito::Matcher;

    const USER_AGENT: &str = "SA2ModInstaller/1.0";

    fn config(server: &mockito::Server) -> InstallerConfig {
        let mut config = InstallerConfig::default();
        config.packages.api_base = server.url();
        config.release.api_url = format!("{}/releases/latest", server.url());
        config
    }

    /// Serves `/Mod/{id}` pointing at `/hop/{id}/0`, then `hops` redirects
    /// ending at `/file/{id}`.
    async fn redirect_chain(server: &mut mockito::Server, id: u64, hops: usize) -> Vec<mockito::Mock> {
        let url = server.url();
        let mut mocks = vec![
            server
                .mock("GET", format!("/Mod/{id}").as_str())
                .match_query(Matcher::Any)
                .match_header("user-agent", USER_AGENT)
                .with_status(200)
                .with_header("content-type", "application/json")
                .with_body(format!(
                    r#"{{"_aFiles":[{{"_sDownloadUrl":"{url}/hop/{id}/0"}}]}}"#
                ))
                .create_async()
                .await,
        ];
        for hop in 0..hops {
            let next = if hop + 1 == hops {
                format!("/file/{id}")
            } else {
                format!("/hop/{id}/{}", hop + 1)
            };
            mocks.push(
                server
                    .mock("GET", format!("/hop/{id}/{hop}").as_str())
                    .match_header("user-agent", USER_AGENT)
                    .with_status(302)
                    .with_header("location", &next)
                    .create_async()
                    .await,
            );
        }
        mocks.push(
            server
                .mock("GET", format!("/file/{id}").as_str())
                .match_header("user-agent", USER_AGENT)
                .with_status(200)
                .with_body(zip_bytes(&[("mod.ini", b"Name=Render Fix".as_slice())]))
                .create_async()
                .await,
        );
        mocks
    }

    #[tokio::test]
    async fn package_downloads_follow_short_redirect_chains() {
        let mut server = mockito::Server::new_async().await;
        let _chain = redirect_chain(&mut server, 21, 3).await;
        let config = config(&server);
        let fetcher = PackageFetcher::new(build_http_client(&config).unwrap(), config.packages.clone());

        let entry = CatalogEntry::new("render_fix", "Render Fix").with_game_banana_id(21);
        let classified = fetcher.fetch_item(&entry).await.unwrap();
        assert_eq!(classified.kind, ArchiveKind::Zip);
    }

    #[tokio::test]
    async fn redirect_chains_past_the_limit_fail() {
        let mut server = mockito::Server::new_async().await;
        let _chain = redirect_chain(&mut server, 22, 7).await;
        let config = config(&server);
        assert!(7 > config.packages.max_redirects);
        let fetcher = PackageFetcher::new(build_http_client(&config).unwrap(), config.packages.clone());

        let entry = CatalogEntry::new("render_fix", "Render Fix").with_game_banana_id(22);
        let err = fetcher.fetch_item(&entry).await.unwrap_err();
        match err {
            InstallerError::Http(e) => assert!(e.is_redirect(), "unexpected error: {e}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn release_requests_carry_the_user_agent() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();
        let _release = server
            .mock("GET", "/releases/latest")
            .match_header("user-agent", USER_AGENT)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(
                r#"{{"tag_name":"v1.0","assets":[{{"name":"SAModManager.exe","size":4,"browser_download_url":"{url}/assets/manager.exe"}}]}}"#
            ))
            .create_async()
            .await;
        let _asset = server
            .mock("GET", "/assets/manager.exe")
            .match_header("user-agent", USER_AGENT)
            .match_header("accept-encoding", "identity")
            .with_status(200)
            .with_body(b"MZ\x90\x00")
            .create_async()
            .await;
        let config = config(&server);
        let fetcher = ReleaseFetcher::new(build_http_client(&config).unwrap(), config.release.clone());

        let asset = fetcher.fetch_latest_manager_asset().await.unwrap();
        assert_eq!(asset.name.as_deref(), Some("SAModManager.exe"));
        assert_eq!(asset.bytes, b"MZ\x90\x00".to_vec());
    }
}
