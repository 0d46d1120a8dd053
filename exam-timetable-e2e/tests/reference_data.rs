use exam_timetable_client::{ReferenceDataClient, ReferenceDataError, ResourceKind};
use exam_timetable_e2e::{FakeBackend, TestServer};

async fn setup() -> (FakeBackend, TestServer, ReferenceDataClient) {
    let backend = FakeBackend::new();
    let server = TestServer::spawn(backend.router()).await.unwrap();
    let client = ReferenceDataClient::new(server.url());
    (backend, server, client)
}

#[tokio::test]
async fn create_update_and_list() {
    let (backend, server, client) = setup().await;

    client
        .create(ResourceKind::Invigilators, "  Dr. X  ")
        .await
        .unwrap();
    let records = client.list(ResourceKind::Invigilators).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "Dr. X");

    client
        .update(ResourceKind::Invigilators, records[0].id, " Dr. Y ")
        .await
        .unwrap();
    assert_eq!(
        client
            .find(ResourceKind::Invigilators, records[0].id)
            .await
            .unwrap()
            .map(|record| record.name),
        Some("Dr. Y".to_owned())
    );
    // venues are a separate list
    assert!(client.list(ResourceKind::Venues).await.unwrap().is_empty());
    assert_eq!(backend.records(ResourceKind::Invigilators).len(), 1);

    server.stop().await;
}

#[tokio::test]
async fn deleted_records_are_gone_from_the_next_list() {
    let (backend, server, client) = setup().await;
    let kept = backend.seed(ResourceKind::Venues, "D01");
    let deleted = backend.seed(ResourceKind::Venues, "D02");

    client.delete(ResourceKind::Venues, deleted).await.unwrap();

    let ids: Vec<i64> = client
        .list(ResourceKind::Venues)
        .await
        .unwrap()
        .into_iter()
        .map(|record| record.id)
        .collect();
    assert_eq!(ids, [kept]);

    server.stop().await;
}

#[tokio::test]
async fn failures_name_the_resource() {
    let (_backend, server, client) = setup().await;

    let error = client
        .update(ResourceKind::Venues, 42, "D09")
        .await
        .unwrap_err();
    assert!(matches!(error, ReferenceDataError::Save { .. }));
    assert_eq!(error.to_string(), "Failed to save venue");

    let error = client
        .delete(ResourceKind::Invigilators, 42)
        .await
        .unwrap_err();
    assert_eq!(error.to_string(), "Failed to delete invigilator");

    server.stop().await;
}

#[tokio::test]
async fn blank_names_are_refused_locally() {
    let (backend, server, client) = setup().await;
    let error = client
        .create(ResourceKind::Venues, "   ")
        .await
        .unwrap_err();
    assert!(matches!(error, ReferenceDataError::EmptyName));
    assert!(backend.records(ResourceKind::Venues).is_empty());
    server.stop().await;
}
