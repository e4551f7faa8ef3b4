use std::sync::{Arc, Mutex};

use async_graphql::Request;
use async_trait::async_trait;
use ispyb_graphql::{
    auth::Identity,
    db::{
        DataCollectionParent, Repository, TimeWindow,
        error::Result,
        local::{BUNDLED_FIXTURE, LocalRepository},
        model::{
            AutoProcessingRow, ContainerRow, DataCollectionRow, PermissionGrant, ProposalName,
            ProposalRow, SampleRow, ScalingStatisticsRow, ScanType, Visit, VisitName,
        },
    },
    graphql::{RequestContext, schema},
    pagination::PageRequest,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{Value, json};
use url::Url;

const MEMBER: &str = "vxn01537";
const ADMIN: &str = "mxs21644";
const OUTSIDER: &str = "qqq99999";
const LOGIN_URL: &str = "https://auth.example.ac.uk/login";

/// Runs `query` against `repository` and returns the serialized response.
async fn execute_on(repository: Arc<dyn Repository>, login: Option<&str>, query: &str) -> Value {
    let context = RequestContext::new(
        repository,
        login.map(Identity::new),
        Some(Url::parse(LOGIN_URL).unwrap()),
    );

    let response = schema().execute(Request::new(query).data(context)).await;

    serde_json::to_value(&response).unwrap()
}

/// Runs `query` against the bundled snapshot.
async fn execute(login: Option<&str>, query: &str) -> Value {
    execute_on(Arc::new(LocalRepository::bundled().unwrap()), login, query).await
}

/// `(path, code)` of every error in a response.
fn error_codes(response: &Value) -> Vec<(Value, Value)> {
    response["errors"]
        .as_array()
        .map(|errors| {
            errors
                .iter()
                .map(|e| (e["path"].clone(), e["extensions"]["code"].clone()))
                .collect()
        })
        .unwrap_or_default()
}

fn dcids(connection: &Value) -> Vec<u64> {
    connection["edges"]
        .as_array()
        .unwrap()
        .iter()
        .map(|edge| edge["node"]["dcid"].as_u64().unwrap())
        .collect()
}

#[rstest]
#[tokio::test]
async fn visit_scan_types() {
    let response = execute(
        Some(MEMBER),
        r#"{
            visit(name: "cm14451-1") {
                name
                sessionId
                gridScans: dataCollections(scanType: GRID) { edges { node { dcid } } }
                rotationScans: dataCollections(scanType: ROTATION) { edges { node { dcid } } }
            }
        }"#,
    )
    .await;

    assert_eq!(error_codes(&response), []);

    let visit = &response["data"]["visit"];
    assert_eq!(visit["name"], json!("cm14451-1"));
    assert_eq!(visit["sessionId"], json!(55167));
    assert_eq!(dcids(&visit["gridScans"]), [6_017_405]);
    assert_eq!(dcids(&visit["rotationScans"]), [993_677, 1_002_287]);
}

#[rstest]
#[tokio::test]
async fn data_collection_details() {
    let response = execute(
        Some(ADMIN),
        r"{
            dataCollection(dcid: 993677) {
                dcid
                filename
                rotationAxis
                omegaStart
                phiStart
                sample { name crystalId }
                autoProcessings {
                    program
                    spaceGroup
                    unitCell { alpha }
                    mergingStatistics(shell: OVERALL) { shell }
                }
            }
        }",
    )
    .await;

    assert_eq!(error_codes(&response), []);

    let data_collection = &response["data"]["dataCollection"];
    assert_eq!(
        data_collection["filename"],
        json!("/dls/i03/data/2016/cm14451-1/20160114/tlys_jan_4/tlys_jan_4_1_####.cbf")
    );
    assert_eq!(data_collection["rotationAxis"], json!("Omega"));
    assert_eq!(data_collection["omegaStart"], json!(45.0));
    assert_eq!(data_collection["phiStart"], Value::Null);
    assert_eq!(
        data_collection["sample"],
        json!({"name": "tlys_jan_4", "crystalId": 310_037})
    );

    let auto_processings = data_collection["autoProcessings"].as_array().unwrap();
    assert_eq!(auto_processings.len(), 8);
    assert_eq!(
        auto_processings[1],
        json!({
            "program": "xia2 3dii",
            "spaceGroup": "P 43 21 2",
            "unitCell": {"alpha": 90.0},
            "mergingStatistics": {"shell": "OVERALL"}
        })
    );
}

#[rstest]
#[tokio::test]
async fn proposal_samples_are_ordered_by_id() {
    let response = execute(
        Some(MEMBER),
        r#"{
            proposal(name: "cm14451") {
                proposalId
                samples { name dataCollections(scanType: ROTATION) { edges { node { dcid } } } }
            }
        }"#,
    )
    .await;

    assert_eq!(error_codes(&response), []);

    let proposal = &response["data"]["proposal"];
    assert_eq!(proposal["proposalId"], json!(37027));

    let samples = proposal["samples"].as_array().unwrap();
    let names: Vec<&str> = samples.iter().map(|s| s["name"].as_str().unwrap()).collect();
    assert_eq!(
        names,
        ["tlys_jan_4", "thau8", "thau88", "thau99", "XPDF-1", "XPDF-2"]
    );
    assert_eq!(dcids(&samples[0]["dataCollections"]), [993_677]);
    assert!(samples[1..].iter().all(|s| dcids(&s["dataCollections"]).is_empty()));
}

#[rstest]
#[tokio::test]
async fn following_end_cursors_walks_every_collection() {
    let mut seen = Vec::new();
    let mut after: Option<String> = None;

    loop {
        let after_argument = after
            .as_ref()
            .map(|cursor| format!(r#", after: "{cursor}""#))
            .unwrap_or_default();
        let query = format!(
            r#"{{
                proposal(name: "cm14451") {{
                    dataCollections(first: 2{after_argument}) {{
                        edges {{ cursor node {{ dcid }} }}
                        pageInfo {{ hasNextPage hasPreviousPage startCursor endCursor }}
                    }}
                }}
            }}"#
        );

        let response = execute(Some(MEMBER), &query).await;
        assert_eq!(error_codes(&response), []);

        let connection = &response["data"]["proposal"]["dataCollections"];
        let page = dcids(connection);
        let page_info = &connection["pageInfo"];

        assert_eq!(page_info["hasPreviousPage"], json!(false));
        assert_eq!(
            page_info["endCursor"],
            page.last().map_or(Value::Null, |dcid| json!(dcid.to_string()))
        );
        if let (Some(first), Some(previous)) = (page.first(), seen.last()) {
            assert!(first > previous);
        }
        seen.extend(page);

        if page_info["hasNextPage"] == json!(false) {
            break;
        }
        after = page_info["endCursor"].as_str().map(ToString::to_string);
    }

    assert_eq!(
        seen,
        [993_677, 1_002_287, 1_052_494, 1_052_503, 1_066_786, 6_017_405]
    );
}

#[rstest]
#[case(r#"{ proposal(name: "cm014451") { name proposalId } }"#, "proposal")]
#[case(r#"{ visit(name: "cm014451-01") { name sessionId } }"#, "visit")]
#[tokio::test]
async fn zero_padded_names_find_the_stored_record(#[case] query: &str, #[case] field: &str) {
    let response = execute(Some(MEMBER), query).await;

    assert_eq!(error_codes(&response), []);
    assert!(
        response["data"][field]["name"]
            .as_str()
            .unwrap()
            .starts_with("cm14451")
    );
}

#[rstest]
#[tokio::test]
async fn beamline_for_admins() {
    let response = execute(
        Some(ADMIN),
        r#"{
            beamline(name: "i03") {
                name
                visits(startTime: "2016-01-01T00:00:00", endTime: "2016-12-31T00:00:00") { name }
                dataCollections(scanType: SCREENING) { edges { node { dcid } } }
            }
        }"#,
    )
    .await;

    assert_eq!(error_codes(&response), []);

    let beamline = &response["data"]["beamline"];
    assert_eq!(
        beamline["visits"],
        json!([{"name": "cm14451-1"}, {"name": "cm14451-2"}])
    );
    assert_eq!(dcids(&beamline["dataCollections"]), [1_052_494, 1_066_786]);
}

#[rstest]
#[tokio::test]
async fn unauthenticated_requests_are_sent_to_log_in() {
    let response = execute(None, r#"{ proposal(name: "cm14451") { name } }"#).await;

    assert_eq!(response["data"]["proposal"], Value::Null);
    assert_eq!(
        error_codes(&response),
        [(json!(["proposal"]), json!("LOGIN_REQUIRED"))]
    );
    assert_eq!(
        response["errors"][0]["extensions"]["loginUrl"],
        json!(LOGIN_URL)
    );
}

#[rstest]
#[case(OUTSIDER, r#"{ proposal(name: "cm14451") { name } }"#, "proposal")]
#[case(MEMBER, r#"{ beamline(name: "i03") { name } }"#, "beamline")]
#[case(ADMIN, r#"{ proposal(name: "cm14451") { name } }"#, "proposal")]
#[case(MEMBER, r#"{ proposal(name: "cm99999") { name } }"#, "proposal")]
#[case(OUTSIDER, "{ sample(sampleId: 374695) { name } }", "sample")]
#[tokio::test]
async fn forbidden(#[case] login: &str, #[case] query: &str, #[case] field: &str) {
    let response = execute(Some(login), query).await;

    assert_eq!(response["data"][field], Value::Null);
    assert_eq!(error_codes(&response), [(json!([field]), json!("FORBIDDEN"))]);
}

#[rstest]
#[case(r#"{ proposal(name: "CM14451") { name } }"#, json!(["proposal"]))]
#[case(r#"{ visit(name: "cm14451") { name } }"#, json!(["visit"]))]
#[case(
    r#"{ proposal(name: "cm14451") { dataCollections(after: "abc") { edges { cursor } } } }"#,
    json!(["proposal", "dataCollections"])
)]
#[case(
    r#"{ proposal(name: "cm14451") { dataCollections(first: -1) { edges { cursor } } } }"#,
    json!(["proposal", "dataCollections"])
)]
#[tokio::test]
async fn bad_user_input(#[case] query: &str, #[case] path: Value) {
    let response = execute(Some(MEMBER), query).await;

    assert_eq!(error_codes(&response), [(path, json!("BAD_USER_INPUT"))]);
}

#[rstest]
#[tokio::test]
async fn inverted_time_window_fails_only_its_field() {
    let response = execute(
        Some(ADMIN),
        r#"{
            beamline(name: "i03") {
                name
                visits(startTime: "2016-02-01T00:00:00", endTime: "2016-01-01T00:00:00") { name }
            }
        }"#,
    )
    .await;

    assert_eq!(response["data"]["beamline"]["name"], json!("i03"));
    assert_eq!(response["data"]["beamline"]["visits"], Value::Null);
    assert_eq!(
        error_codes(&response),
        [(json!(["beamline", "visits"]), json!("BAD_USER_INPUT"))]
    );
}

#[rstest]
#[tokio::test]
async fn one_failing_root_field_keeps_its_siblings() {
    let response = execute(
        Some(MEMBER),
        r#"{
            proposal(name: "cm14451") { name }
            visit(name: "cm14451-2") { name }
        }"#,
    )
    .await;

    assert_eq!(response["data"]["proposal"], json!({"name": "cm14451"}));
    assert_eq!(response["data"]["visit"], Value::Null);
    assert_eq!(
        error_codes(&response),
        [(json!(["visit"]), json!("FORBIDDEN"))]
    );
}

#[rstest]
#[tokio::test]
async fn dangling_sample_nulls_only_its_field() {
    let mut fixture: Value = serde_json::from_str(BUNDLED_FIXTURE).unwrap();
    for data_collection in fixture["data_collections"].as_array_mut().unwrap() {
        if data_collection["data_collection_id"] == json!(1_002_287) {
            data_collection["sample_id"] = json!(424_242);
        }
    }
    let repository = LocalRepository::from_json(&fixture.to_string()).unwrap();

    let response = execute_on(
        Arc::new(repository),
        Some(MEMBER),
        r#"{
            visit(name: "cm14451-1") {
                dataCollections(first: 2) {
                    edges { node { dcid sample { name } } }
                    pageInfo { hasNextPage endCursor }
                }
            }
        }"#,
    )
    .await;

    assert_eq!(
        error_codes(&response),
        [(
            json!(["visit", "dataCollections", "edges", 1, "node", "sample"]),
            json!("NOT_FOUND")
        )]
    );

    let connection = &response["data"]["visit"]["dataCollections"];
    assert_eq!(
        connection["edges"],
        json!([
            {"node": {"dcid": 993_677, "sample": {"name": "tlys_jan_4"}}},
            {"node": {"dcid": 1_002_287, "sample": null}},
        ])
    );
    assert_eq!(
        connection["pageInfo"],
        json!({"hasNextPage": true, "endCursor": "1002287"})
    );
}

/// Delegates to the bundled snapshot, recording which operations were called.
struct CountingRepository {
    inner: LocalRepository,
    calls: Mutex<Vec<&'static str>>,
}
impl CountingRepository {
    fn new() -> Self {
        Self {
            inner: LocalRepository::bundled().unwrap(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, operation: &'static str) {
        self.calls.lock().unwrap().push(operation);
    }

    fn count(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|called| **called == operation)
            .count()
    }
}

#[async_trait]
impl Repository for CountingRepository {
    async fn proposal(&self, name: &ProposalName) -> Result<ProposalRow> {
        self.record("proposal");
        self.inner.proposal(name).await
    }

    async fn visit(&self, name: &VisitName) -> Result<Visit> {
        self.record("visit");
        self.inner.visit(name).await
    }

    async fn visit_by_id(&self, session_id: u32) -> Result<Visit> {
        self.record("visit_by_id");
        self.inner.visit_by_id(session_id).await
    }

    async fn data_collection_ids(
        &self,
        parent: DataCollectionParent<'_>,
        scan_type: Option<ScanType>,
        page: PageRequest,
    ) -> Result<Vec<u32>> {
        self.record("data_collection_ids");
        self.inner.data_collection_ids(parent, scan_type, page).await
    }

    async fn data_collections(&self, ids: &[u32]) -> Result<Vec<DataCollectionRow>> {
        self.record("data_collections");
        self.inner.data_collections(ids).await
    }

    async fn samples(&self, ids: &[u32]) -> Result<Vec<SampleRow>> {
        self.record("samples");
        self.inner.samples(ids).await
    }

    async fn proposal_samples(&self, proposal_id: u32) -> Result<Vec<SampleRow>> {
        self.record("proposal_samples");
        self.inner.proposal_samples(proposal_id).await
    }

    async fn sample_proposal_id(&self, sample_id: u32) -> Result<Option<u32>> {
        self.record("sample_proposal_id");
        self.inner.sample_proposal_id(sample_id).await
    }

    async fn containers(&self, ids: &[u32]) -> Result<Vec<ContainerRow>> {
        self.record("containers");
        self.inner.containers(ids).await
    }

    async fn auto_processing_results(&self, dcids: &[u32]) -> Result<Vec<Vec<AutoProcessingRow>>> {
        self.record("auto_processing_results");
        self.inner.auto_processing_results(dcids).await
    }

    async fn merging_statistics(
        &self,
        auto_proc_ids: &[u32],
    ) -> Result<Vec<Vec<ScalingStatisticsRow>>> {
        self.record("merging_statistics");
        self.inner.merging_statistics(auto_proc_ids).await
    }

    async fn beamline_visits(&self, beamline: &str, window: TimeWindow) -> Result<Vec<Visit>> {
        self.record("beamline_visits");
        self.inner.beamline_visits(beamline, window).await
    }

    async fn proposal_has_person(&self, proposal_id: u32, login: &str) -> Result<bool> {
        self.record("proposal_has_person");
        self.inner.proposal_has_person(proposal_id, login).await
    }

    async fn session_has_person(&self, session_id: u32, login: &str) -> Result<bool> {
        self.record("session_has_person");
        self.inner.session_has_person(session_id, login).await
    }

    async fn permissions(&self, login: &str) -> Result<Vec<PermissionGrant>> {
        self.record("permissions");
        self.inner.permissions(login).await
    }
}

#[rstest]
#[tokio::test]
async fn nested_fields_are_fetched_once_per_entity_type() {
    let repository = Arc::new(CountingRepository::new());

    let response = execute_on(
        Arc::clone(&repository) as Arc<dyn Repository>,
        Some(MEMBER),
        r#"{
            proposal(name: "cm14451") {
                dataCollections {
                    edges {
                        node {
                            autoProcessings { program mergingStatistics(shell: OVERALL) { dMin } }
                            sample { name container { code } }
                        }
                    }
                }
            }
        }"#,
    )
    .await;

    assert_eq!(error_codes(&response), []);
    assert_eq!(
        response["data"]["proposal"]["dataCollections"]["edges"]
            .as_array()
            .unwrap()
            .len(),
        6
    );

    for operation in [
        "data_collection_ids",
        "data_collections",
        "auto_processing_results",
        "merging_statistics",
        "samples",
        "containers",
    ] {
        assert_eq!(repository.count(operation), 1, "{operation}");
    }
}
