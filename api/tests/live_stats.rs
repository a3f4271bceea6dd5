use datagolf_api::client::{ApiError, DataGolfApi};
use datagolf_api::secret::StaticSecretStore;
use datagolf_api::{ALL_STATS, Cell, EXPECTED_COLUMNS, StatsQuery};
use mockito::Matcher;

const PATH: &str = "/preds/live-tournament-stats";

const FEED_CSV: &str = "\
event_name,last_updated,stat_display,position,player_name,dg_id,stat_round,course,total,round,thru,sg_putt,sg_arg,sg_app,sg_ott,sg_t2g,sg_bs,sg_total,distance,accuracy,gir,prox_fw,prox_rgh,extra_col
Masters Tournament,2024-04-14 22:01:22 UTC,value,1,\"Scheffler, Scottie\",18417,event_avg,Augusta National,-11,-4,F,0.52,0.31,1.45,0.88,2.64,,3.16,301.2,0.71,0.78,31.4,45.1,ignored
,,,2,\"Aberg, Ludvig\",23950,event_avg,Augusta National,-7,-3,F,0.10,-0.22,1.02,1.11,1.91,,2.01,310.5,0.64,0.69,,52.0,ignored
,,,T3,\"Homa, Max\",8793,event_avg,Augusta National,-4,E,16,n/a,0.40,0.35,0.22,0.97,,0.97,295.0,0.69,0.64,33.2,48.7,ignored
";

fn api_for(server: &mockito::Server) -> DataGolfApi {
    DataGolfApi::new()
        .with_base_url(server.url())
        .with_secrets(StaticSecretStore::api_key("test-key"))
}

#[tokio::test]
async fn fetch_sends_expected_query_and_normalizes() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", PATH)
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("key".into(), "test-key".into()),
            Matcher::UrlEncoded("file_format".into(), "csv".into()),
            Matcher::UrlEncoded("display".into(), "value".into()),
            Matcher::UrlEncoded("stats".into(), ALL_STATS.join(",")),
        ]))
        .with_status(200)
        .with_header("content-type", "text/csv")
        .with_body(FEED_CSV)
        .create_async()
        .await;

    let table = api_for(&server)
        .fetch_live_stats(&StatsQuery::default())
        .await
        .expect("fetch should succeed");
    mock.assert_async().await;

    let names: Vec<&str> = EXPECTED_COLUMNS.iter().map(|(n, _)| *n).collect();
    assert_eq!(table.column_names(), names);
    assert_eq!(table.num_rows(), 3);

    // Missing from the response: present but null.
    assert_eq!(table.column("scrambling").unwrap().values.null_count(), 3);
    assert!(table.column("extra_col").is_none());

    // Identifier columns inherit the first row.
    for row in 0..3 {
        assert_eq!(table.cell(row, "event_name"), Some(Cell::Text("Masters Tournament")));
        assert_eq!(table.cell(row, "stat_display"), Some(Cell::Text("value")));
    }

    // Coercion: text-ish numeric cells become null.
    assert_eq!(table.cell(0, "stat_round"), None);
    assert_eq!(table.cell(0, "thru"), None);
    assert_eq!(table.cell(2, "thru"), Some(Cell::Number(16.0)));
    assert_eq!(table.cell(2, "round"), None);
    assert_eq!(table.cell(2, "sg_putt"), None);
    assert_eq!(table.cell(1, "prox_fw"), None);
    assert_eq!(table.cell(2, "position"), Some(Cell::Text("T3")));
    assert_eq!(table.cell(0, "dg_id"), Some(Cell::Number(18417.0)));
    assert!(table.last_updated_at().is_some());
}

#[tokio::test]
async fn fetch_passes_custom_display_and_stats() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", PATH)
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("display".into(), "rank".into()),
            Matcher::UrlEncoded("stats".into(), "sg_putt,gir".into()),
        ]))
        .with_status(200)
        .with_body("player_name,sg_putt,gir\nScottie Scheffler,4,12\n")
        .create_async()
        .await;

    let query = StatsQuery::default()
        .with_display("rank")
        .with_stats(["sg_putt", "gir"]);
    let table = api_for(&server).fetch_live_stats(&query).await.unwrap();
    mock.assert_async().await;

    assert_eq!(table.num_columns(), 24);
    assert_eq!(table.cell(0, "gir"), Some(Cell::Number(12.0)));
    assert_eq!(table.column("event_name").unwrap().values.null_count(), 1);
}

#[tokio::test]
async fn server_error_degrades_to_empty_table() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", PATH)
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let table = api_for(&server)
        .fetch_live_stats(&StatsQuery::default())
        .await
        .expect("HTTP errors must not surface");
    mock.assert_async().await;

    assert!(table.is_empty());
    assert_eq!(table.num_columns(), 0);
    assert_eq!(table.num_rows(), 0);
}

#[tokio::test]
async fn client_error_degrades_to_empty_table() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", PATH)
        .match_query(Matcher::Any)
        .with_status(403)
        .create_async()
        .await;

    let table = api_for(&server)
        .fetch_live_stats(&StatsQuery::default())
        .await
        .unwrap();
    assert!(table.is_empty());
}

#[tokio::test]
async fn connection_refused_degrades_to_empty_table() {
    let api = DataGolfApi::new()
        .with_base_url("http://127.0.0.1:1")
        .with_secrets(StaticSecretStore::api_key("test-key"));

    let table = api.fetch_live_stats(&StatsQuery::default()).await.unwrap();
    assert!(table.is_empty());
}

#[tokio::test]
async fn latin1_player_name_still_normalizes() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(b"event_name,player_name,gir\nMasters,\xc5berg,0.7\n,Rahm,0.6\n".as_slice())
        .create_async()
        .await;

    let table = api_for(&server)
        .fetch_live_stats(&StatsQuery::default())
        .await
        .expect("stray bytes must not fail the fetch");

    assert_eq!(table.num_columns(), 24);
    assert_eq!(table.num_rows(), 2);
    assert_eq!(table.cell(0, "player_name"), Some(Cell::Text("\u{FFFD}berg")));
    assert_eq!(table.cell(1, "player_name"), Some(Cell::Text("Rahm")));
    assert_eq!(table.cell(1, "event_name"), Some(Cell::Text("Masters")));
    assert_eq!(table.cell(1, "gir"), Some(Cell::Number(0.6)));
}

#[tokio::test]
async fn missing_secret_skips_the_request() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", PATH)
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let api = DataGolfApi::new()
        .with_base_url(server.url())
        .with_secrets(StaticSecretStore::new());
    let err = api.fetch_live_stats(&StatsQuery::default()).await.unwrap_err();
    mock.assert_async().await;

    assert!(matches!(err, ApiError::MissingSecret(_)));
}
