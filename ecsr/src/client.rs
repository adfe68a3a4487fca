use crate::endpoint::Endpoint;
use crate::error::Error;
use crate::schema::{DataResponse, DetailsRequest, ItemDetail, ItemReference, SearchQuery};
use crate::session::{Session, CSRF_HEADER};
use crate::Result;
use log::{debug, warn};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";

enum DetailsReply {
    Details(Vec<ItemDetail>),
    Forbidden,
}

pub struct Client {
    client: reqwest::Client,
    base_url: Url,
    csrf_on_search: bool,
}

impl Client {
    /// `base_url` may carry a path prefix; endpoints are joined below it.
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        Ok(Self {
            client: reqwest::Client::builder().user_agent(USER_AGENT).build()?,
            base_url,
            csrf_on_search: true,
        })
    }

    /// Whether search requests carry the CSRF header. On by default.
    pub fn with_csrf_on_search(mut self, enabled: bool) -> Self {
        self.csrf_on_search = enabled;
        self
    }

    fn url(&self, endpoint: Endpoint) -> Result<Url> {
        Ok(self.base_url.join(&endpoint.to_string())?)
    }

    /// Primes a session by posting an empty details query and capturing the
    /// CSRF token the server hands back. The response status is irrelevant;
    /// the catalog answers the first call with 403 and the token.
    pub async fn acquire_session(&self) -> Result<Session> {
        let response = self
            .client
            .post(self.url(Endpoint::ItemDetails)?)
            .json(&DetailsRequest { items: &[] })
            .send()
            .await?;

        if !response.status().is_success() {
            debug!("Priming request returned {}", response.status());
        }

        response
            .headers()
            .get(CSRF_HEADER)
            .filter(|token| !token.is_empty())
            .cloned()
            .map(Session::from)
            .ok_or(Error::MissingCsrfToken)
    }

    pub async fn search_items(
        &self,
        session: &Session,
        query: &SearchQuery,
    ) -> Result<Vec<ItemReference>> {
        let mut url = self.url(Endpoint::SearchItems)?;
        url.set_query(Some(&serde_qs::to_string(query)?));

        let mut request = self.client.get(url);
        if self.csrf_on_search {
            request = session.authorize(request);
        }

        let response = request.send().await?;
        Ok(parse::<DataResponse<ItemReference>>(response).await?.data)
    }

    /// Fetches full records for `items`.
    ///
    /// A 403 triggers one session refresh and one retry. If the retry is
    /// forbidden too, or no fresh token can be had, the result is empty.
    pub async fn fetch_details(
        &self,
        session: &mut Session,
        items: &[ItemReference],
    ) -> Result<Vec<ItemDetail>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        if let DetailsReply::Details(details) = self.post_details(session, items).await? {
            return Ok(details);
        }

        warn!("Details request forbidden, refreshing CSRF token");
        *session = match self.acquire_session().await {
            Ok(fresh) => fresh,
            Err(Error::MissingCsrfToken) => {
                warn!("Couldn't refresh CSRF token, skipping details");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        match self.post_details(session, items).await? {
            DetailsReply::Details(details) => Ok(details),
            DetailsReply::Forbidden => {
                warn!("Details request still forbidden after CSRF refresh");
                Ok(Vec::new())
            }
        }
    }

    async fn post_details(
        &self,
        session: &Session,
        items: &[ItemReference],
    ) -> Result<DetailsReply> {
        let request = self
            .client
            .post(self.url(Endpoint::ItemDetails)?)
            .json(&DetailsRequest { items });

        let response = session.authorize(request).send().await?;

        if response.status() == StatusCode::FORBIDDEN {
            return Ok(DetailsReply::Forbidden);
        }

        let details = parse::<DataResponse<ItemDetail>>(response).await?.data;
        Ok(DetailsReply::Details(details))
    }
}

async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
    if response.status().is_success() {
        Ok(response.json().await?)
    } else {
        Err(Error::Response(response.status(), response.text().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ItemId;
    use mockito::{Matcher, Server};
    use serde_json::json;

    const DETAILS_PATH: &str = "/apisite/catalog/v1/catalog/items/details";
    const SEARCH_PATH: &str = "/apisite/catalog/v1/search/items";

    fn reference(id: i64) -> ItemReference {
        ItemReference {
            item_type: json!("Asset"),
            id: ItemId::Number(id),
        }
    }

    fn details_body(id: i64) -> String {
        json!({"data": [{
            "name": "Cool Hat",
            "id": id,
            "price": 50,
            "creatorName": "ROBLOX",
            "itemRestrictions": ["Limited"]
        }]})
        .to_string()
    }

    #[tokio::test]
    async fn acquire_session_reads_token_from_forbidden_response() {
        let mut server = Server::new_async().await;
        let prime = server
            .mock("POST", DETAILS_PATH)
            .match_body(Matcher::Json(json!({"items": []})))
            .with_status(403)
            .with_header(CSRF_HEADER, "token-1")
            .create_async()
            .await;

        let client = Client::new(&server.url()).unwrap();
        let session = client.acquire_session().await.unwrap();

        assert_eq!(session.csrf_token(), "token-1");
        prime.assert_async().await;
    }

    #[tokio::test]
    async fn acquire_session_without_token_fails() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", DETAILS_PATH)
            .with_status(200)
            .create_async()
            .await;

        let client = Client::new(&server.url()).unwrap();
        let result = client.acquire_session().await;

        assert!(matches!(result, Err(Error::MissingCsrfToken)));
    }

    #[tokio::test]
    async fn acquire_session_with_empty_token_fails() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", DETAILS_PATH)
            .with_status(403)
            .with_header(CSRF_HEADER, "")
            .create_async()
            .await;

        let client = Client::new(&server.url()).unwrap();
        let result = client.acquire_session().await;

        assert!(matches!(result, Err(Error::MissingCsrfToken)));
    }

    #[tokio::test]
    async fn base_url_path_prefix_is_kept() {
        let mut server = Server::new_async().await;
        let prime = server
            .mock("POST", format!("/proxy{DETAILS_PATH}").as_str())
            .with_status(403)
            .with_header(CSRF_HEADER, "token-1")
            .create_async()
            .await;

        let client = Client::new(&format!("{}/proxy", server.url())).unwrap();
        client.acquire_session().await.unwrap();

        prime.assert_async().await;
    }

    #[tokio::test]
    async fn search_sends_query_and_csrf_header() {
        let mut server = Server::new_async().await;
        let search = server
            .mock("GET", SEARCH_PATH)
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("category".into(), "Featured".into()),
                Matcher::UrlEncoded("limit".into(), "28".into()),
                Matcher::UrlEncoded("sortType".into(), "0".into()),
            ]))
            .match_header(CSRF_HEADER, "token-1")
            .with_body(
                json!({"data": [{"itemType": "Asset", "id": 1}, {"itemType": "Asset", "id": 2}]})
                    .to_string(),
            )
            .create_async()
            .await;

        let client = Client::new(&server.url()).unwrap();
        let session = Session::new("token-1").unwrap();
        let items = client
            .search_items(&session, &SearchQuery::new("Featured", 28))
            .await
            .unwrap();

        assert_eq!(items, vec![reference(1), reference(2)]);
        search.assert_async().await;
    }

    #[tokio::test]
    async fn search_can_skip_csrf_header() {
        let mut server = Server::new_async().await;
        let search = server
            .mock("GET", SEARCH_PATH)
            .match_query(Matcher::Any)
            .match_header(CSRF_HEADER, Matcher::Missing)
            .with_body(json!({"data": []}).to_string())
            .create_async()
            .await;

        let client = Client::new(&server.url())
            .unwrap()
            .with_csrf_on_search(false);
        let session = Session::new("token-1").unwrap();
        let items = client
            .search_items(&session, &SearchQuery::new("Featured", 28))
            .await
            .unwrap();

        assert!(items.is_empty());
        search.assert_async().await;
    }

    #[tokio::test]
    async fn search_server_error_is_reported() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", SEARCH_PATH)
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = Client::new(&server.url()).unwrap();
        let session = Session::new("token-1").unwrap();
        let result = client
            .search_items(&session, &SearchQuery::new("Featured", 28))
            .await;

        match result {
            Err(Error::Response(status, text)) => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(text, "boom");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_details_with_no_items_skips_network() {
        let mut server = Server::new_async().await;
        let details = server
            .mock("POST", DETAILS_PATH)
            .expect(0)
            .create_async()
            .await;

        let client = Client::new(&server.url()).unwrap();
        let mut session = Session::new("token-1").unwrap();
        let result = client.fetch_details(&mut session, &[]).await.unwrap();

        assert!(result.is_empty());
        details.assert_async().await;
    }

    #[tokio::test]
    async fn fetch_details_refreshes_token_after_forbidden() {
        let mut server = Server::new_async().await;
        let stale = server
            .mock("POST", DETAILS_PATH)
            .match_header(CSRF_HEADER, "stale")
            .with_status(403)
            .create_async()
            .await;
        let prime = server
            .mock("POST", DETAILS_PATH)
            .match_header(CSRF_HEADER, Matcher::Missing)
            .with_status(403)
            .with_header(CSRF_HEADER, "fresh")
            .create_async()
            .await;
        let fresh = server
            .mock("POST", DETAILS_PATH)
            .match_header(CSRF_HEADER, "fresh")
            .match_body(Matcher::Json(json!({"items": [{"itemType": "Asset", "id": 2}]})))
            .with_body(details_body(2))
            .create_async()
            .await;

        let client = Client::new(&server.url()).unwrap();
        let mut session = Session::new("stale").unwrap();
        let details = client
            .fetch_details(&mut session, &[reference(2)])
            .await
            .unwrap();

        assert_eq!(details.len(), 1);
        assert_eq!(details[0].id, ItemId::Number(2));
        assert_eq!(session.csrf_token(), "fresh");
        stale.assert_async().await;
        prime.assert_async().await;
        fresh.assert_async().await;
    }

    #[tokio::test]
    async fn fetch_details_gives_up_after_second_forbidden() {
        let mut server = Server::new_async().await;
        let prime = server
            .mock("POST", DETAILS_PATH)
            .match_body(Matcher::Json(json!({"items": []})))
            .with_status(403)
            .with_header(CSRF_HEADER, "fresh")
            .expect(1)
            .create_async()
            .await;
        let details = server
            .mock("POST", DETAILS_PATH)
            .match_body(Matcher::Json(json!({"items": [{"itemType": "Asset", "id": 2}]})))
            .with_status(403)
            .expect(2)
            .create_async()
            .await;

        let client = Client::new(&server.url()).unwrap();
        let mut session = Session::new("stale").unwrap();
        let result = client
            .fetch_details(&mut session, &[reference(2)])
            .await
            .unwrap();

        assert!(result.is_empty());
        prime.assert_async().await;
        details.assert_async().await;
    }

    #[tokio::test]
    async fn fetch_details_without_fresh_token_is_empty() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", DETAILS_PATH)
            .match_body(Matcher::Json(json!({"items": []})))
            .with_status(403)
            .create_async()
            .await;
        let details = server
            .mock("POST", DETAILS_PATH)
            .match_body(Matcher::Json(json!({"items": [{"itemType": "Asset", "id": 2}]})))
            .with_status(403)
            .expect(1)
            .create_async()
            .await;

        let client = Client::new(&server.url()).unwrap();
        let mut session = Session::new("stale").unwrap();
        let result = client
            .fetch_details(&mut session, &[reference(2)])
            .await
            .unwrap();

        assert!(result.is_empty());
        assert_eq!(session.csrf_token(), "stale");
        details.assert_async().await;
    }

    #[tokio::test]
    async fn fetch_details_other_errors_propagate() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", DETAILS_PATH)
            .with_status(502)
            .create_async()
            .await;

        let client = Client::new(&server.url()).unwrap();
        let mut session = Session::new("token-1").unwrap();
        let result = client.fetch_details(&mut session, &[reference(2)]).await;

        assert!(matches!(
            result,
            Err(Error::Response(status, _)) if status == StatusCode::BAD_GATEWAY
        ));
    }
}
