use once_cell::sync::Lazy;
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use study_calendar::notify::LogNotifier;
use study_calendar::page::Document;
use study_calendar::sync::HttpStatusApi;
use study_calendar::{CalendarView, Status};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct DayDetail {
    day_id: i64,
    date: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct UpdateResponse {
    ok: bool,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MonthSummary {
    year: i32,
    month: u32,
    counts: BTreeMap<String, u32>,
    planned_days: u32,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("study_calendar_http_{}_{}.json", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/summary")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let data_path = unique_data_path();
    let child = Command::new(env!("CARGO_BIN_EXE_study_calendar"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", data_path)
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

async fn day_detail(client: &Client, base_url: &str, day_id: i64) -> DayDetail {
    client
        .get(format!("{base_url}/day/{day_id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn http_status_update_is_stored() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let before = day_detail(&client, &server.base_url, 20010102).await;
    assert_eq!(before.date, "2001-01-02");
    assert_eq!(before.status, "none");

    let response: UpdateResponse = client
        .post(format!("{}/day/status", server.base_url))
        .json(&serde_json::json!({ "day_id": 20010102, "status": "partial" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(response.ok);
    assert!(response.error.is_none());

    let after = day_detail(&client, &server.base_url, 20010102).await;
    assert_eq!(after.day_id, 20010102);
    assert_eq!(after.status, "partial");
}

#[tokio::test]
async fn http_status_update_rejects_bad_input() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let cases = [
        serde_json::json!({ "day_id": 20010103, "status": "bogus" }),
        serde_json::json!({ "day_id": 20010230, "status": "done" }),
        serde_json::json!({ "status": "done" }),
    ];
    for body in cases {
        let response = client
            .post(format!("{}/day/status", server.base_url))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
        let response: UpdateResponse = response.json().await.unwrap();
        assert!(!response.ok);
        assert!(response.error.is_some_and(|message| !message.is_empty()));
    }

    let unchanged = day_detail(&client, &server.base_url, 20010103).await;
    assert_eq!(unchanged.status, "none");
}

#[tokio::test]
async fn http_summary_counts_month() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    client
        .post(format!("{}/day/status", server.base_url))
        .json(&serde_json::json!({ "day_id": 20000215, "status": "done" }))
        .send()
        .await
        .unwrap();

    let summary: MonthSummary = client
        .get(format!("{}/api/summary?year=2000&month=2", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!((summary.year, summary.month), (2000, 2));
    assert_eq!(summary.counts["done"], 1);
    assert_eq!(summary.counts["none"], 28);
    assert_eq!(summary.planned_days, 1);
}

#[tokio::test]
async fn http_calendar_page_click_cycles_status() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let html = client
        .get(format!("{}/calendar/2001/5", server.base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    let document = Document::parse(&html);
    assert_eq!(document.cells().count(), 31);

    let api = HttpStatusApi::new(&server.base_url).unwrap();
    let view = CalendarView::mount(document, api, LogNotifier);
    let target = {
        let document = view.document();
        let document = document.lock().await;
        document
            .cell_by_day(study_calendar::models::DayId(20010507))
            .unwrap()
    };

    view.click(target).unwrap();
    let shared = view.document();
    let faults = view.teardown().await.unwrap();
    assert!(faults.is_empty());

    let document = shared.lock().await;
    let cell = document.cell(target).unwrap();
    assert_eq!(cell.status, Some(Status::Planned));
    assert_eq!(cell.class_name(), "day planned");

    let stored = day_detail(&client, &server.base_url, 20010507).await;
    assert_eq!(stored.status, "planned");
}

#[tokio::test]
async fn http_plan_schedule_drives_day_status() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let created: serde_json::Value = client
        .post(format!("{}/plan/create", server.base_url))
        .json(&serde_json::json!({ "title": "Algebra", "subject": "math" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(created["ok"], true);
    let plan_id = created["plan_id"].as_u64().unwrap();

    let saved: serde_json::Value = client
        .post(format!("{}/plan/{plan_id}/daily", server.base_url))
        .json(&serde_json::json!({ "daily_plans": [
            { "date": "2003-04-01", "description": "chapter 1" },
            { "date": "2003-04-02", "description": "chapter 2", "status": "done" },
            { "date": "2003-04-03", "description": "" }
        ] }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(saved["count"], 2);

    let scheduled = day_detail(&client, &server.base_url, 20030401).await;
    assert_eq!(scheduled.status, "planned");
    let free = day_detail(&client, &server.base_url, 20030403).await;
    assert_eq!(free.status, "none");

    // A click on a scheduled day moves the task along with the day.
    let response: UpdateResponse = client
        .post(format!("{}/day/status", server.base_url))
        .json(&serde_json::json!({ "day_id": 20030401, "status": "done" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(response.ok);

    let schedule: serde_json::Value = client
        .get(format!("{}/plan/{plan_id}/daily", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let statuses: Vec<_> = schedule["daily_plans"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["status"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(statuses, vec!["done", "done"]);

    let summary: serde_json::Value = client
        .get(format!(
            "{}/api/summary?year=2003&month=4&plan_id={plan_id}",
            server.base_url
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(summary["counts"]["done"], 2);
    assert_eq!(summary["plans"]["total_assigned"], 2);
    assert_eq!(summary["plans"]["completion_rate"], 100);

    let html = client
        .get(format!("{}/calendar/2003/4?plan_id={plan_id}", server.base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains(&format!("data-plan-id=\"{plan_id}\"")));

    let missing = client
        .post(format!("{}/plan/999999/delete", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);

    let deleted: UpdateResponse = client
        .post(format!("{}/plan/{plan_id}/delete", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(deleted.ok);
    // The click itself stays recorded on the day.
    let after = day_detail(&client, &server.base_url, 20030401).await;
    assert_eq!(after.status, "done");
    let unscheduled = day_detail(&client, &server.base_url, 20030402).await;
    assert_eq!(unscheduled.status, "none");
}
