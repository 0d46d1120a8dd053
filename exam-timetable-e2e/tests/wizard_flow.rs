use exam_timetable_client::{
    DocxFile, FlowVariant, NameInput, ProxyClient, ResourceKind, Step, Wizard,
};
use exam_timetable_e2e::fake_backend::FAKE_PDF;
use exam_timetable_e2e::{build_test_client, TestStack, TimetableReply};
use http::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use http::StatusCode;
use reqwest::multipart::{Form, Part};
use serde_json::json;

fn filled_wizard(variant: FlowVariant) -> Wizard {
    let mut wizard = Wizard::new(variant);
    wizard
        .choose_file(DocxFile::new("schedule.docx", "PK"))
        .unwrap();
    wizard
        .set_invigilators(NameInput::Text("Dr. A, Dr. B".to_owned()))
        .unwrap();
    if variant.collects_venues() {
        wizard
            .set_venues(NameInput::Text("D01".to_owned()))
            .unwrap();
    }
    wizard
}

#[tokio::test]
async fn wizard_submits_through_the_proxy() {
    let stack = TestStack::start(true).await.unwrap();
    let proxy = ProxyClient::with_client(build_test_client().unwrap(), stack.url());

    let mut wizard = filled_wizard(FlowVariant::WithVenues);
    let artifact = wizard.submit(&proxy).await.unwrap();
    assert_eq!(artifact.bytes.as_ref(), FAKE_PDF);
    assert_eq!(artifact.file_name(), "exam-timetable.pdf");
    assert_eq!(wizard.step(), Step::Done);
}

#[tokio::test]
async fn wizard_shows_the_backend_message() {
    let stack = TestStack::start(true).await.unwrap();
    stack.backend.set_reply(TimetableReply::Json {
        status: StatusCode::BAD_REQUEST,
        body: json!({ "detail": [{ "msg": "Invalid schedule format" }] }),
    });
    let proxy = ProxyClient::with_client(build_test_client().unwrap(), stack.url());

    let mut wizard = filled_wizard(FlowVariant::WithVenues);
    let error = wizard.submit(&proxy).await.unwrap_err();
    assert_eq!(error.to_string(), "Invalid schedule format");
    assert_eq!(wizard.error(), Some("Invalid schedule format"));
    assert!(wizard.artifact().is_none());

    // unexpected bodies fall back to the generic message
    stack.backend.set_reply(TimetableReply::Json {
        status: StatusCode::BAD_REQUEST,
        body: json!({ "message": "nope" }),
    });
    let error = wizard.submit(&proxy).await.unwrap_err();
    assert_eq!(error.to_string(), "Failed to generate timetable");
    assert_eq!(stack.backend.uploads().len(), 2);
}

fn session_cookie(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with("wizardSession="))
        .and_then(|value| value.split(';').next())
        .map(ToOwned::to_owned)
}

#[tokio::test]
async fn browser_flow_with_picked_records() {
    let stack = TestStack::start(true).await.unwrap();
    let doe = stack.backend.seed(ResourceKind::Invigilators, "Dr. John Doe");
    let smith = stack.backend.seed(ResourceKind::Invigilators, "Dr. Jane Smith");
    stack.backend.seed(ResourceKind::Invigilators, "Dr. Unused");
    let hall = stack.backend.seed(ResourceKind::Venues, "Main Hall");
    let client = build_test_client().unwrap();
    let url = stack.url();

    let response = client.get(format!("{url}/")).send().await.unwrap();
    let cookie = session_cookie(&response).unwrap();

    let response = client
        .post(format!("{url}/wizard/upload"))
        .header(COOKIE, &cookie)
        .multipart(
            Form::new()
                .part(
                    "docx_file",
                    Part::bytes(b"PK".to_vec()).file_name("schedule.docx"),
                )
                .text("action", "next"),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/");

    let page = client
        .get(format!("{url}/"))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Dr. Jane Smith"));
    assert!(page.contains("Dr. Unused"));

    let step_form = |step: &str| {
        client
            .post(format!("{url}/wizard/{step}"))
            .header(COOKIE, &cookie)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
    };
    let response = step_form("invigilators")
        .body(format!("names=&record={smith}&record={doe}&action=next"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let response = step_form("venues")
        .body(format!("names=&record={hall}&action=generate"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let uploads = stack.backend.uploads();
    assert_eq!(uploads.len(), 1);
    // picked records keep the list order
    assert_eq!(
        uploads[0].invigilators.as_deref(),
        Some("Dr. John Doe, Dr. Jane Smith")
    );
    assert_eq!(uploads[0].venues.as_deref(), Some("Main Hall"));

    let response = client
        .get(format!("{url}/timetable.pdf"))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], "application/pdf");
    assert_eq!(response.bytes().await.unwrap().as_ref(), FAKE_PDF);

    let response = client
        .post(format!("{url}/wizard/reset"))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let response = client
        .get(format!("{url}/timetable.pdf"))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_pages_edit_the_backend_lists() {
    let stack = TestStack::start(true).await.unwrap();
    let client = build_test_client().unwrap();
    let url = stack.url();
    let cookie = "isAuthenticated=true; userEmail=admin@venue.com";
    let post = |path: &str, body: &str| {
        client
            .post(format!("{url}{path}"))
            .header(COOKIE, cookie)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body.to_owned())
    };

    let response = post("/admin/venues", "name=++Main+Hall++").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/admin?tab=venues");
    let venues = stack.backend.records(ResourceKind::Venues);
    assert_eq!(venues.len(), 1);
    assert_eq!(venues[0].name, "Main Hall");

    let id = venues[0].id;
    let response = post(&format!("/admin/venues/{id}"), "name=D01")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(stack.backend.records(ResourceKind::Venues)[0].name, "D01");

    let page = client
        .get(format!("{url}/admin/venues/{id}/delete"))
        .header(COOKIE, cookie)
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Are you sure you want to delete this venue?"));

    let response = post(&format!("/admin/venues/{id}/delete"), "confirm=yes")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(stack.backend.records(ResourceKind::Venues).is_empty());

    let page = client
        .get(format!("{url}/admin?tab=venues"))
        .header(COOKIE, cookie)
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(!page.contains("D01"));
}
